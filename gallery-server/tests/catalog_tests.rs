//! Catalog and admin service tests against the SQLite source

mod helpers;

use gallery_common::Error;
use gallery_server::source::{RetryPolicy, RetryingSource};
use gallery_server::AppState;
use helpers::*;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_set_published_round_trip() {
    let (_, state) = test_state().await;

    state.admin.set_published("p1", false).await.unwrap();

    let public = state.catalog.list_paintings(false, false).await;
    assert!(public.iter().all(|p| p.id != "p1"));

    let admin = state.catalog.list_paintings(false, true).await;
    assert!(admin.iter().any(|p| p.id == "p1" && !p.published));
}

#[tokio::test]
async fn test_public_list_is_exact_published_filter_of_admin_list() {
    let (_, state) = test_state().await;
    let public = state.catalog.list_paintings(false, false).await;
    let admin = state.catalog.list_paintings(false, true).await;

    let filtered: Vec<_> = admin.into_iter().filter(|p| p.published).collect();
    assert_eq!(public, filtered);
}

#[tokio::test]
async fn test_verify_label_mismatch() {
    let (_, state) = test_state().await;

    let result = state.admin.verify_label("p1", "99").await;
    assert!(matches!(result, Err(Error::Mismatch(_))));

    let p1 = state.catalog.get_painting("p1", true).await.unwrap();
    assert!(!p1.verified);
}

#[tokio::test]
async fn test_verify_label_unknown_painting() {
    let (_, state) = test_state().await;
    let result = state.admin.verify_label("nope", "1").await;
    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_painting_without_label_cannot_verify() {
    let (_, state) = test_state().await;
    let result = state.admin.verify_label("p3", "1").await;
    assert!(matches!(result, Err(Error::Mismatch(_))));
}

#[tokio::test]
async fn test_mutations_invalidate_cache() {
    let (source, state) = test_state().await;

    state.catalog.list_paintings(false, false).await;
    state.catalog.list_tags(false).await;
    assert_eq!(source.fetch_count(), 1);

    state.admin.add_tag("p3", "zee").await.unwrap();
    assert_eq!(
        state.catalog.list_tags(false).await,
        vec!["aquarel", "olieverf", "zee"]
    );
    assert_eq!(source.fetch_count(), 2);
}

#[tokio::test]
async fn test_failed_mutation_leaves_cache_populated() {
    let (source, state) = test_state().await;
    state.catalog.list_paintings(false, false).await;

    let result = state.admin.set_published("nope", false).await;
    assert!(matches!(result, Err(Error::NotFound(_))));
    assert!(state.catalog.cache().paintings.is_populated().await);

    source.set_offline(true);
    let result = state.admin.set_published("p1", false).await;
    assert!(matches!(result, Err(e) if e.is_upstream()));
    assert_eq!(state.catalog.list_paintings(false, false).await.len(), 2);
}

#[tokio::test]
async fn test_stale_cache_survives_failed_forced_refresh() {
    let (source, state) = test_state().await;
    let before = state.catalog.list_paintings(false, true).await;
    assert_eq!(before.len(), 3);

    source.set_offline(true);
    assert!(state.catalog.list_paintings(true, true).await.is_empty());
    assert_eq!(state.catalog.list_paintings(false, true).await, before);
    assert_eq!(
        state.catalog.diagnostics().last().unwrap().operation,
        "listPaintings"
    );
}

#[tokio::test]
async fn test_cached_lookup_matches_collection_shape() {
    let (_, state) = test_state().await;

    let fetched = state.catalog.get_painting("p2", true).await.unwrap();
    let listed = state.catalog.list_paintings(false, true).await;
    let cached = state.catalog.get_painting("p2", true).await.unwrap();

    assert_eq!(fetched, cached);
    assert_eq!(&cached, listed.iter().find(|p| p.id == "p2").unwrap());
}

#[tokio::test]
async fn test_retrying_source_recovers_from_transient_failure() {
    let counting = Arc::new(CountingSource::new(seeded_source().await));
    counting.set_offline(true);

    let policy = RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(20),
        multiplier: 2.0,
        max_delay: Duration::from_millis(100),
    };
    let retrying = Arc::new(RetryingSource::new(counting.clone(), policy));
    let state = AppState::from_config(&test_config(), retrying);

    let flipper = {
        let counting = counting.clone();
        tokio::spawn(async move {
            while counting.fetch_count() == 0 {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
            counting.set_offline(false);
        })
    };

    let paintings = state.catalog.list_paintings(false, false).await;
    flipper.await.unwrap();

    assert_eq!(paintings.len(), 2);
    assert!(counting.fetch_count() >= 2);
    assert!(state.catalog.diagnostics().last().is_none());
}
