//! Cloudinary source against a local mock of the Admin and Upload APIs

use axum::{
    extract::{Path, Query},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Form, Json, Router,
};
use gallery_common::config::CloudinaryConfig;
use gallery_server::catalog::Normalizer;
use gallery_server::imaging::{ImageBackend, ImageUrlBuilder};
use gallery_server::source::{CloudinarySource, MetadataSource};
use serde_json::{json, Value};
use std::collections::HashMap;

const ROOT: &str = "Tom van As Kunst";

fn resource(public_id: &str, tags: &[&str], custom: Value) -> Value {
    json!({
        "public_id": public_id,
        "format": "jpg",
        "width": 1600,
        "height": 1200,
        "created_at": "2024-03-01T12:00:00Z",
        "tags": tags,
        "context": { "custom": custom },
    })
}

async fn list_resources(headers: HeaderMap, Query(query): Query<HashMap<String, String>>) -> impl IntoResponse {
    if !headers.contains_key("authorization") {
        return (StatusCode::UNAUTHORIZED, Json(json!({}))).into_response();
    }

    let page = match query.get("next_cursor").map(String::as_str) {
        Some("page-2") => json!({
            "resources": [
                resource("Tom van As Kunst/ATELIER WERK/b", &["title:Avondlicht"], json!({"published": "false"})),
            ],
        }),
        _ => json!({
            "resources": [
                resource(
                    "Tom van As Kunst/LANDSCHAPPEN - NEDERLAND/a",
                    &["olieverf"],
                    json!({"label_number": "42", "caption": "Polder"}),
                ),
            ],
            "next_cursor": "page-2",
        }),
    };
    Json(page).into_response()
}

async fn get_resource(Path(id): Path<String>) -> impl IntoResponse {
    if id == "Tom van As Kunst/LANDSCHAPPEN - NEDERLAND/a" {
        Json(resource(&id, &[], json!({"label_number": "42"}))).into_response()
    } else {
        (StatusCode::NOT_FOUND, Json(json!({"error": {"message": "not found"}}))).into_response()
    }
}

const EMPTY_ROOT: &str = "Leeg";

async fn list_folders(Path(path): Path<String>) -> Json<Value> {
    if path == EMPTY_ROOT {
        return Json(json!({ "folders": [] }));
    }
    Json(json!({
        "folders": [
            {"name": "ATELIER WERK", "path": "Tom van As Kunst/ATELIER WERK"},
            {"name": "LANDSCHAPPEN - NEDERLAND", "path": "Tom van As Kunst/LANDSCHAPPEN - NEDERLAND"},
        ]
    }))
}

async fn tag_command(Form(form): Form<Vec<(String, String)>>) -> Json<Value> {
    let get = |key: &str| {
        form.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .unwrap_or_default()
    };
    assert_eq!(get("api_key"), "key");
    assert_eq!(get("signature").len(), 64);
    assert!(!get("timestamp").is_empty());

    let id = get("public_ids[]");
    let applied: Vec<String> = if id.ends_with("/a") { vec![id] } else { Vec::new() };
    Json(json!({ "public_ids": applied }))
}

async fn start_mock() -> CloudinarySource {
    start_mock_with_root(ROOT).await
}

async fn start_mock_with_root(root: &str) -> CloudinarySource {
    let app = Router::new()
        .route("/v1_1/demo/resources/image/upload", get(list_resources))
        .route("/v1_1/demo/resources/image/upload/*id", get(get_resource))
        .route("/v1_1/demo/folders/*path", get(list_folders))
        .route("/v1_1/demo/image/tags", post(tag_command))
        .route("/v1_1/demo/image/context", post(tag_command));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let config = CloudinaryConfig {
        cloud_name: "demo".to_string(),
        api_key: "key".to_string(),
        api_secret: "secret".to_string(),
        api_base_url: format!("http://{}", addr),
    };
    CloudinarySource::new(config, root)
}

#[tokio::test]
async fn test_fetch_records_follows_cursor() {
    let source = start_mock().await;
    let records = source.fetch_records().await.unwrap();
    assert_eq!(records.len(), 2);

    let normalizer = Normalizer::new(
        ROOT,
        ImageUrlBuilder::new(ImageBackend::Cloudinary {
            cloud_name: "demo".to_string(),
        }),
    );
    let paintings = normalizer.normalize_all(records);

    assert_eq!(paintings[0].title, "Nummer 42");
    assert_eq!(paintings[0].category, "LANDSCHAPPEN - NEDERLAND");
    assert!(paintings[0].published);
    assert_eq!(paintings[0].width, Some(1600));

    assert_eq!(paintings[1].title, "Avondlicht");
    assert_eq!(paintings[1].category, "ATELIER WERK");
    assert!(!paintings[1].published);
    assert!(paintings[1].tags.is_empty());
}

#[tokio::test]
async fn test_fetch_record_and_missing_record() {
    let source = start_mock().await;

    let found = source
        .fetch_record("Tom van As Kunst/LANDSCHAPPEN - NEDERLAND/a")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.label_number.as_deref(), Some("42"));

    let missing = source.fetch_record("Tom van As Kunst/nope").await.unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_categories_from_folder_listing() {
    let source = start_mock().await;
    let categories = source.fetch_categories().await.unwrap().unwrap();
    assert_eq!(categories, vec!["ATELIER WERK", "LANDSCHAPPEN - NEDERLAND"]);
}

#[tokio::test]
async fn test_empty_folder_listing_defers_to_derivation() {
    let source = start_mock_with_root(EMPTY_ROOT).await;
    assert_eq!(source.fetch_categories().await.unwrap(), None);
}

#[tokio::test]
async fn test_signed_writes_report_unknown_ids() {
    let source = start_mock().await;

    assert!(source
        .add_tag("Tom van As Kunst/LANDSCHAPPEN - NEDERLAND/a", "zee")
        .await
        .unwrap());
    assert!(source
        .set_published("Tom van As Kunst/LANDSCHAPPEN - NEDERLAND/a", false)
        .await
        .unwrap());
    assert!(!source.remove_tag("Tom van As Kunst/nope", "zee").await.unwrap());
}
