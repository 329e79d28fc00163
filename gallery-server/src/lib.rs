//! gallery-server library interface
//!
//! Exposes the catalog, admin and routing layers so the binaries and the
//! integration tests build the service the same way.

pub mod admin;
pub mod api;
pub mod catalog;
pub mod error;
pub mod imaging;
pub mod seed;
pub mod source;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use gallery_common::config::{GalleryConfig, SourceKind};
use gallery_common::db::init_database_pool;
use gallery_common::Result;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::admin::AdminService;
use crate::catalog::{CatalogService, Diagnostics, Normalizer};
use crate::imaging::ImageUrlBuilder;
use crate::source::{CloudinarySource, MetadataSource, RetryPolicy, RetryingSource, SqliteSource};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogService>,
    pub admin: Arc<AdminService>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(catalog: Arc<CatalogService>, admin: Arc<AdminService>) -> Self {
        Self {
            catalog,
            admin,
            startup_time: Utc::now(),
        }
    }

    /// Wire catalog and admin services over `source` using `config`
    pub fn from_config(config: &GalleryConfig, source: Arc<dyn MetadataSource>) -> Self {
        let normalizer = Normalizer::new(
            config.catalog.root_folder.clone(),
            ImageUrlBuilder::from_config(&config.images, &config.cloudinary),
        );
        let catalog = Arc::new(
            CatalogService::new(source, normalizer, Arc::new(Diagnostics::new()))
                .with_categories(config.catalog.categories.clone()),
        );
        let admin = Arc::new(AdminService::new(
            Arc::clone(&catalog),
            config.admin_password.clone(),
        ));
        Self::new(catalog, admin)
    }
}

/// Open the configured backing store, wrapped in the retry policy
pub async fn connect_source(config: &GalleryConfig) -> Result<Arc<dyn MetadataSource>> {
    let policy = RetryPolicy::from(&config.retry);

    let source: Arc<dyn MetadataSource> = match config.source {
        SourceKind::Sqlite => {
            info!("Database path: {}", config.database_path.display());
            let pool = init_database_pool(&config.database_path).await?;
            Arc::new(RetryingSource::new(SqliteSource::new(pool), policy))
        }
        SourceKind::Cloudinary => {
            info!(cloud_name = %config.cloudinary.cloud_name, "Using Cloudinary admin API");
            let inner = CloudinarySource::new(
                config.cloudinary.clone(),
                config.catalog.root_folder.clone(),
            );
            Arc::new(RetryingSource::new(inner, policy))
        }
    };

    info!(source = source.name(), "Backing store ready");
    Ok(source)
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::catalog_routes())
        .merge(api::admin_routes())
        .merge(api::health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
