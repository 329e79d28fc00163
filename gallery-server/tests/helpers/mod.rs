//! Shared fixtures for gallery-server integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use gallery_common::config::GalleryConfig;
use gallery_common::db::init_memory_pool;
use gallery_common::{Error, Result};
use gallery_server::seed::{import_rows, parse_rows};
use gallery_server::source::{MetadataSource, RawRecord, SqliteSource};
use gallery_server::AppState;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

pub const ROOT: &str = "Tom van As Kunst";
pub const ADMIN_PASSWORD: &str = "geheim";

/// p1: label 42, published NULL; p2: label 7, unpublished; p3: no label, published
pub const SEED_ROWS: &str = r#"[
    {"publicId": "p1", "destPath": "Tom van As Kunst/LANDSCHAPPEN - NEDERLAND/p1.jpg", "labelNumber": "42"},
    {"publicId": "p2", "destPath": "Tom van As Kunst/ATELIER WERK/p2.jpg", "labelNumber": "7", "published": false},
    {"publicId": "p3", "destPath": "Tom van As Kunst/ATELIER WERK/p3.jpg", "published": true}
]"#;

/// SQLite-backed source that counts list fetches and can be switched offline
pub struct CountingSource {
    inner: SqliteSource,
    pub fetches: AtomicUsize,
    pub offline: AtomicBool,
}

impl CountingSource {
    pub fn new(inner: SqliteSource) -> Self {
        Self {
            inner,
            fetches: AtomicUsize::new(0),
            offline: AtomicBool::new(false),
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Upstream("backing store offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl MetadataSource for CountingSource {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn fetch_records(&self) -> Result<Vec<RawRecord>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.fetch_records().await
    }

    async fn fetch_record(&self, id: &str) -> Result<Option<RawRecord>> {
        self.check()?;
        self.inner.fetch_record(id).await
    }

    async fn set_published(&self, id: &str, published: bool) -> Result<bool> {
        self.check()?;
        self.inner.set_published(id, published).await
    }

    async fn set_label_number(&self, id: &str, label_number: &str) -> Result<bool> {
        self.check()?;
        self.inner.set_label_number(id, label_number).await
    }

    async fn set_verified(&self, id: &str, verified: bool) -> Result<bool> {
        self.check()?;
        self.inner.set_verified(id, verified).await
    }

    async fn add_tag(&self, id: &str, tag: &str) -> Result<bool> {
        self.check()?;
        self.inner.add_tag(id, tag).await
    }

    async fn remove_tag(&self, id: &str, tag: &str) -> Result<bool> {
        self.check()?;
        self.inner.remove_tag(id, tag).await
    }
}

/// In-memory store holding the three seed paintings and a few tags
pub async fn seeded_source() -> SqliteSource {
    let pool = init_memory_pool().await.expect("Should open in-memory database");
    import_rows(&pool, parse_rows(SEED_ROWS).expect("Seed rows should parse"))
        .await
        .expect("Seed import should succeed");

    let source = SqliteSource::new(pool);
    for (id, tag) in [("p1", "olieverf"), ("p2", "schets"), ("p3", "aquarel")] {
        assert!(source.add_tag(id, tag).await.expect("Should add tag"));
    }
    source
}

pub fn test_config() -> GalleryConfig {
    let mut config = GalleryConfig::default();
    config.catalog.root_folder = ROOT.to_string();
    config.admin_password = Some(ADMIN_PASSWORD.to_string());
    config
}

/// App state over a counting source and the test config
pub async fn test_state_with(config: GalleryConfig) -> (Arc<CountingSource>, AppState) {
    let source = Arc::new(CountingSource::new(seeded_source().await));
    let state = AppState::from_config(&config, source.clone());
    (source, state)
}

pub async fn test_state() -> (Arc<CountingSource>, AppState) {
    test_state_with(test_config()).await
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn admin_get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("x-is-admin", "true")
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn extract_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

pub fn ids(body: &Value) -> Vec<String> {
    body.as_array()
        .expect("Should be an array")
        .iter()
        .map(|p| p["id"].as_str().unwrap_or_default().to_string())
        .collect()
}
