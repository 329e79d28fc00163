//! Delivery URL rendering for Imagor and Cloudinary
//!
//! Options are always serialized in one fixed order so identical input gives
//! an identical URL:
//!
//! 1. resize (width x height)
//! 2. fit mode (`Fit::Inside` when a size is given without one)
//! 3. format
//! 4. quality
//! 5. effects: blur, sharpen, grayscale, brightness, contrast, rotate, flip, flop
//!
//! Imagor's path grammar fixes where each option sits (`fit-in/` precedes the
//! size, `smart/` follows it, the rest are `filters:`), so that backend places
//! them in grammar positions; the relative order of filters still follows the
//! list above. Cloudinary emits `w_,h_,c_,f_,q_` in one component followed by
//! one chained component per effect.
//!
//! A path that already carries an `http://` or `https://` scheme is used as
//! the source as-is instead of being placed under the storage root.

use gallery_common::config::{CloudinaryConfig, ImageBackendKind, ImageConfig};

/// How the image is fitted into the requested box
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fit {
    /// Fill the box, cropping the overflow
    Cover,
    /// Fit inside the box, padding allowed
    Contain,
    /// Fit inside the box preserving aspect ratio, never larger than the box
    Inside,
    /// Cover the box preserving aspect ratio, no cropping
    Outside,
    /// Stretch to exactly the box, ignoring aspect ratio
    Fill,
}

/// Output quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quality {
    /// Let the image service choose
    #[default]
    Auto,
    /// Explicit quality, 1-100
    Value(u8),
}

/// Optional effects, serialized after quality in field order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Effects {
    pub blur: Option<u32>,
    pub sharpen: Option<u32>,
    pub grayscale: bool,
    pub brightness: Option<i32>,
    pub contrast: Option<i32>,
    pub rotate: Option<u32>,
    /// Mirror vertically
    pub flip: bool,
    /// Mirror horizontally
    pub flop: bool,
}

/// Transform options for one rendition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageOptions {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fit: Option<Fit>,
    /// Output format; empty keeps the source format
    pub format: String,
    pub quality: Quality,
    pub effects: Effects,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            fit: None,
            format: "webp".to_string(),
            quality: Quality::Auto,
            effects: Effects::default(),
        }
    }
}

impl ImageOptions {
    /// Bounded to `width` pixels wide, default format and quality
    pub fn with_width(width: u32) -> Self {
        Self {
            width: Some(width),
            ..Self::default()
        }
    }

    /// No resize, no format conversion
    pub fn original() -> Self {
        Self {
            format: String::new(),
            ..Self::default()
        }
    }

    fn has_size(&self) -> bool {
        self.width.is_some() || self.height.is_some()
    }

    /// Explicit fit, or the aspect-preserving default when a size is requested
    fn effective_fit(&self) -> Option<Fit> {
        match self.fit {
            Some(fit) => Some(fit),
            None if self.has_size() => Some(Fit::Inside),
            None => None,
        }
    }
}

/// Image-serving backend and its base URLs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageBackend {
    Imagor {
        base_url: String,
        storage_url: String,
    },
    Cloudinary {
        cloud_name: String,
    },
}

/// Maps stored asset paths to delivery URLs for one backend
#[derive(Debug, Clone)]
pub struct ImageUrlBuilder {
    backend: ImageBackend,
}

impl ImageUrlBuilder {
    pub fn new(backend: ImageBackend) -> Self {
        Self { backend }
    }

    pub fn from_config(images: &ImageConfig, cloudinary: &CloudinaryConfig) -> Self {
        let backend = match images.backend {
            ImageBackendKind::Imagor => ImageBackend::Imagor {
                base_url: images.imagor_base_url.clone(),
                storage_url: images.storage_url.clone(),
            },
            ImageBackendKind::Cloudinary => ImageBackend::Cloudinary {
                cloud_name: cloudinary.cloud_name.clone(),
            },
        };
        Self::new(backend)
    }

    pub fn backend(&self) -> &ImageBackend {
        &self.backend
    }

    /// Delivery URL for `path` with `options`; empty string for an empty path
    pub fn build(&self, path: &str, options: &ImageOptions) -> String {
        let path = path.trim();
        if path.is_empty() {
            return String::new();
        }

        match &self.backend {
            ImageBackend::Imagor {
                base_url,
                storage_url,
            } => imagor_url(base_url, storage_url, path, options),
            ImageBackend::Cloudinary { cloud_name } => cloudinary_url(cloud_name, path, options),
        }
    }
}

fn is_absolute_url(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://")
}

fn imagor_url(base_url: &str, storage_url: &str, path: &str, options: &ImageOptions) -> String {
    let mut segments: Vec<String> = Vec::new();
    let fit = options.effective_fit();

    // Grammar: fit-in/ and stretch/ precede the size, smart/ follows it
    match fit {
        Some(Fit::Contain) | Some(Fit::Inside) | Some(Fit::Outside) => {
            segments.push("fit-in".to_string())
        }
        Some(Fit::Fill) => segments.push("stretch".to_string()),
        Some(Fit::Cover) | None => {}
    }

    let effects = &options.effects;
    if options.has_size() || effects.flip || effects.flop {
        segments.push(format!(
            "{}{}x{}{}",
            if effects.flop { "-" } else { "" },
            options.width.unwrap_or(0),
            if effects.flip { "-" } else { "" },
            options.height.unwrap_or(0),
        ));
    }

    if fit == Some(Fit::Cover) {
        segments.push("smart".to_string());
    }

    let mut filters: Vec<String> = Vec::new();
    if !options.format.is_empty() {
        filters.push(format!("format({})", options.format));
    }
    if let Quality::Value(q) = options.quality {
        filters.push(format!("quality({})", q));
    }
    if let Some(blur) = effects.blur {
        filters.push(format!("blur({})", blur));
    }
    if let Some(sharpen) = effects.sharpen {
        filters.push(format!("sharpen({})", sharpen));
    }
    if effects.grayscale {
        filters.push("grayscale()".to_string());
    }
    if let Some(brightness) = effects.brightness {
        filters.push(format!("brightness({})", brightness));
    }
    if let Some(contrast) = effects.contrast {
        filters.push(format!("contrast({})", contrast));
    }
    if let Some(rotate) = effects.rotate {
        filters.push(format!("rotate({})", rotate));
    }
    if !filters.is_empty() {
        segments.push(format!("filters:{}", filters.join(":")));
    }

    let source = if is_absolute_url(path) || storage_url.is_empty() {
        path.to_string()
    } else {
        format!(
            "{}/{}",
            storage_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    };
    segments.push(urlencoding::encode(&source).into_owned());

    format!("{}/unsafe/{}", base_url.trim_end_matches('/'), segments.join("/"))
}

fn cloudinary_url(cloud_name: &str, path: &str, options: &ImageOptions) -> String {
    let mut base: Vec<String> = Vec::new();

    if let Some(w) = options.width {
        base.push(format!("w_{}", w));
    }
    if let Some(h) = options.height {
        base.push(format!("h_{}", h));
    }
    if let Some(fit) = options.effective_fit() {
        let mode = match fit {
            Fit::Cover => "fill",
            Fit::Contain => "pad",
            Fit::Inside => "limit",
            Fit::Outside => "mfit",
            Fit::Fill => "scale",
        };
        base.push(format!("c_{}", mode));
    }
    if !options.format.is_empty() {
        base.push(format!("f_{}", options.format));
    }
    base.push(match options.quality {
        Quality::Auto => "q_auto".to_string(),
        Quality::Value(q) => format!("q_{}", q),
    });

    let mut components = vec![base.join(",")];
    let effects = &options.effects;
    if let Some(blur) = effects.blur {
        components.push(format!("e_blur:{}", blur));
    }
    if let Some(sharpen) = effects.sharpen {
        components.push(format!("e_sharpen:{}", sharpen));
    }
    if effects.grayscale {
        components.push("e_grayscale".to_string());
    }
    if let Some(brightness) = effects.brightness {
        components.push(format!("e_brightness:{}", brightness));
    }
    if let Some(contrast) = effects.contrast {
        components.push(format!("e_contrast:{}", contrast));
    }
    if let Some(rotate) = effects.rotate {
        components.push(format!("a_{}", rotate));
    }
    if effects.flip {
        components.push("a_vflip".to_string());
    }
    if effects.flop {
        components.push("a_hflip".to_string());
    }

    let (delivery, source) = if is_absolute_url(path) {
        ("fetch", urlencoding::encode(path).into_owned())
    } else {
        ("upload", path.trim_start_matches('/').to_string())
    };

    format!(
        "https://res.cloudinary.com/{}/image/{}/{}/{}",
        cloud_name,
        delivery,
        components.join("/"),
        source
    )
}
