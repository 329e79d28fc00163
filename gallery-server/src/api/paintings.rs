//! Painting and taxonomy read routes
//!
//! Admin visibility comes from the `x-is-admin: true` header or from the
//! `/api/admin/...` route prefix.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::HeaderMap,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::catalog::Painting;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub const ADMIN_HEADER: &str = "x-is-admin";

fn admin_header(headers: &HeaderMap) -> bool {
    headers
        .get(ADMIN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|v| v == "true")
        .unwrap_or(false)
}

#[derive(Debug, Default, Deserialize)]
pub struct PaintingsQuery {
    /// Exact category filter
    pub category: Option<String>,
    /// Bypass the cache
    #[serde(default)]
    pub refresh: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct RefreshQuery {
    #[serde(default)]
    pub refresh: bool,
}

async fn paintings(state: &AppState, query: PaintingsQuery, admin: bool) -> Vec<Painting> {
    match query.category {
        Some(category) => {
            state
                .catalog
                .list_paintings_by_category(&category, query.refresh, admin)
                .await
        }
        None => state.catalog.list_paintings(query.refresh, admin).await,
    }
}

async fn painting(state: &AppState, id: &str, admin: bool) -> ApiResult<Json<Painting>> {
    state
        .catalog
        .get_painting(id, admin)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Painting with ID {} not found", id)))
}

/// GET /api/paintings
pub async fn list_paintings(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<PaintingsQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Painting>>> {
    let Query(query) = query?;
    Ok(Json(paintings(&state, query, admin_header(&headers)).await))
}

/// GET /api/paintings/:id
pub async fn get_painting(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<Painting>> {
    painting(&state, &id, admin_header(&headers)).await
}

/// GET /api/admin/paintings
pub async fn admin_list_paintings(
    State(state): State<AppState>,
    query: Result<Query<PaintingsQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Painting>>> {
    let Query(query) = query?;
    Ok(Json(paintings(&state, query, true).await))
}

/// GET /api/admin/paintings/:id
pub async fn admin_get_painting(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Painting>> {
    painting(&state, &id, true).await
}

/// GET /api/categories
pub async fn list_categories(
    State(state): State<AppState>,
    query: Result<Query<RefreshQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<String>>> {
    let Query(query) = query?;
    Ok(Json(state.catalog.list_categories(query.refresh).await))
}

/// GET /api/tags
pub async fn list_tags(
    State(state): State<AppState>,
    query: Result<Query<RefreshQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<String>>> {
    let Query(query) = query?;
    Ok(Json(state.catalog.list_tags(query.refresh).await))
}

/// Build catalog read routes
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/api/paintings", get(list_paintings))
        .route("/api/paintings/:id", get(get_painting))
        .route("/api/admin/paintings", get(admin_list_paintings))
        .route("/api/admin/paintings/:id", get(admin_get_painting))
        .route("/api/categories", get(list_categories))
        .route("/api/tags", get(list_tags))
}
