//! Image URL building
//!
//! Pure functions from (stored asset path, transform options) to a delivery
//! URL. No I/O, never fails: an empty path yields an empty string.

mod url_builder;

pub use url_builder::{Effects, Fit, ImageBackend, ImageOptions, ImageUrlBuilder, Quality};

/// Width of the display rendition attached to every painting
pub const DISPLAY_WIDTH: u32 = 1200;
