//! Configuration loading
//!
//! Settings are resolved once at process start, in priority order:
//! 1. Command-line arguments (applied by the binary after `load`)
//! 2. Environment variables (`GALLERY_*`)
//! 3. TOML config file
//! 4. Built-in defaults
//!
//! A missing config file is not fatal: the service logs a warning and starts
//! with defaults. A config file that exists but does not parse is an error.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

/// Default HTTP port for the gallery service
pub const DEFAULT_PORT: u16 = 5780;

/// Folder under which all catalog assets live in the media store
pub const DEFAULT_ROOT_FOLDER: &str = "Tom van As Kunst";

/// Which backing store supplies painting metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Local relational store (SQLite rows)
    #[default]
    Sqlite,
    /// Object-tag store (Cloudinary tags + context fields)
    Cloudinary,
}

impl FromStr for SourceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(SourceKind::Sqlite),
            "cloudinary" => Ok(SourceKind::Cloudinary),
            other => Err(Error::Config(format!("Unknown metadata source: {}", other))),
        }
    }
}

/// Which image-serving backend renders delivery URLs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ImageBackendKind {
    #[default]
    Imagor,
    Cloudinary,
}

impl FromStr for ImageBackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "imagor" => Ok(ImageBackendKind::Imagor),
            "cloudinary" => Ok(ImageBackendKind::Cloudinary),
            other => Err(Error::Config(format!("Unknown image backend: {}", other))),
        }
    }
}

/// Image delivery settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub backend: ImageBackendKind,
    /// Base URL of the object storage bucket holding the originals
    pub storage_url: String,
    /// Base URL of the Imagor transformation service
    pub imagor_base_url: String,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            backend: ImageBackendKind::default(),
            storage_url: String::new(),
            imagor_base_url: "http://localhost:8080".to_string(),
        }
    }
}

/// Cloudinary account settings (object-tag store and delivery backend)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub api_base_url: String,
}

impl Default for CloudinaryConfig {
    fn default() -> Self {
        Self {
            cloud_name: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            api_base_url: "https://api.cloudinary.com".to_string(),
        }
    }
}

/// Catalog shaping settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Root collection prefix stripped during category derivation
    pub root_folder: String,
    /// Curated category list; when set it is served verbatim
    pub categories: Option<Vec<String>>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            root_folder: DEFAULT_ROOT_FOLDER.to_string(),
            categories: None,
        }
    }
}

/// Retry policy for backing-store calls
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub multiplier: f64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 200,
            multiplier: 2.0,
            max_delay_ms: 2000,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` takes precedence
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Complete service configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GalleryConfig {
    /// Path to the SQLite database file
    pub database_path: PathBuf,
    pub bind_address: String,
    pub port: u16,
    pub source: SourceKind,
    /// Plaintext admin password; unset means admin login always fails
    pub admin_password: Option<String>,
    pub images: ImageConfig,
    pub cloudinary: CloudinaryConfig,
    pub catalog: CatalogConfig,
    pub retry: RetryConfig,
    pub logging: LoggingConfig,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            bind_address: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            source: SourceKind::default(),
            admin_password: None,
            images: ImageConfig::default(),
            cloudinary: CloudinaryConfig::default(),
            catalog: CatalogConfig::default(),
            retry: RetryConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl GalleryConfig {
    /// Load configuration from TOML (if present) and the process environment.
    ///
    /// `explicit_path` must exist when given; the default location may be absent.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = match explicit_path {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::Config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                Self::from_toml_file(path)?
            }
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_toml_file(&path)?,
                Some(path) => {
                    warn!(
                        "No config file at {}, using built-in defaults",
                        path.display()
                    );
                    Self::default()
                }
                None => {
                    warn!("Could not determine config directory, using built-in defaults");
                    Self::default()
                }
            },
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a TOML config file
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse TOML text; absent keys fall back to defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Overlay `GALLERY_*` environment variables using the given lookup.
    ///
    /// Empty values are ignored so that `GALLERY_ADMIN_PASSWORD=` does not
    /// configure an empty password.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("GALLERY_DB_PATH") {
            self.database_path = PathBuf::from(v);
        }
        if let Some(v) = get("GALLERY_BIND") {
            self.bind_address = v;
        }
        if let Some(v) = get("GALLERY_PORT") {
            self.port = v
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("Invalid GALLERY_PORT: {}", v)))?;
        }
        if let Some(v) = get("GALLERY_SOURCE") {
            self.source = v.parse()?;
        }
        if let Some(v) = get("GALLERY_ADMIN_PASSWORD") {
            self.admin_password = Some(v);
        }
        if let Some(v) = get("GALLERY_IMAGE_BACKEND") {
            self.images.backend = v.parse()?;
        }
        if let Some(v) = get("GALLERY_IMAGE_STORAGE_URL") {
            self.images.storage_url = v;
        }
        if let Some(v) = get("GALLERY_IMAGOR_BASE_URL") {
            self.images.imagor_base_url = v;
        }
        if let Some(v) = get("GALLERY_CLOUDINARY_CLOUD_NAME") {
            self.cloudinary.cloud_name = v;
        }
        if let Some(v) = get("GALLERY_CLOUDINARY_API_KEY") {
            self.cloudinary.api_key = v;
        }
        if let Some(v) = get("GALLERY_CLOUDINARY_API_SECRET") {
            self.cloudinary.api_secret = v;
        }
        if let Some(v) = get("GALLERY_CLOUDINARY_API_BASE_URL") {
            self.cloudinary.api_base_url = v;
        }
        if let Some(v) = get("GALLERY_ROOT_FOLDER") {
            self.catalog.root_folder = v;
        }
        Ok(())
    }

    /// Configured admin password, or `Config` error when unset/blank
    pub fn admin_password(&self) -> Result<&str> {
        match self.admin_password.as_deref() {
            Some(p) if !p.trim().is_empty() => Ok(p),
            _ => Err(Error::Config(
                "Admin password not configured (set GALLERY_ADMIN_PASSWORD)".to_string(),
            )),
        }
    }

    /// Check that the selected source has the settings it needs
    pub fn validate(&self) -> Result<()> {
        if self.source == SourceKind::Cloudinary {
            let c = &self.cloudinary;
            if c.cloud_name.is_empty() || c.api_key.is_empty() || c.api_secret.is_empty() {
                return Err(Error::Config(
                    "Cloudinary source requires cloud_name, api_key and api_secret".to_string(),
                ));
            }
        }
        if self.images.backend == ImageBackendKind::Cloudinary
            && self.cloudinary.cloud_name.is_empty()
        {
            return Err(Error::Config(
                "Cloudinary image backend requires cloudinary.cloud_name".to_string(),
            ));
        }
        Ok(())
    }
}

/// Default TOML config location: `<config dir>/gallery/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("gallery").join("config.toml"))
}

/// Default database location: `<local data dir>/gallery/gallery.db`
fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("gallery"))
        .unwrap_or_else(|| PathBuf::from("./gallery_data"))
        .join("gallery.db")
}
