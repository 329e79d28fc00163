//! Painting catalog: normalization, caching and the read-side service

pub mod cache;
pub mod diagnostics;
pub mod normalizer;
pub mod painting;
pub mod service;

pub use cache::{CacheKey, CacheSlot, CatalogCache};
pub use diagnostics::{Diagnostics, ReadDiagnostic};
pub use normalizer::Normalizer;
pub use painting::{Painting, PaintingSet};
pub use service::CatalogService;
