//! Admin mutation routes
//!
//! Success responses are `{success, message}`; failures go through
//! [`ApiError`].

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use gallery_common::Error;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ApiError, ApiResult};
use crate::source::RawFlag;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct MutationResponse {
    pub success: bool,
    pub message: String,
}

impl MutationResponse {
    fn ok(message: String) -> Json<Self> {
        Json(Self {
            success: true,
            message,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedRequest {
    pub image_id: Option<String>,
    /// `true`/`false`, or the strings `"true"`/`"false"`
    pub published: Option<RawFlag>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelRequest {
    pub image_id: Option<String>,
    pub label_number: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagRequest {
    pub image_id: Option<String>,
    pub tag: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PasswordRequest {
    pub password: Option<String>,
}

/// Present and non-blank, else 400 `"<field> is required"`
fn required(value: Option<String>, field: &str) -> ApiResult<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("{} is required", field)))
}

/// POST /api/admin/toggle-published
pub async fn toggle_published(
    State(state): State<AppState>,
    request: Result<Json<PublishedRequest>, JsonRejection>,
) -> ApiResult<Json<MutationResponse>> {
    let Json(request) = request?;
    let id = required(request.image_id, "imageId")?;
    let published = request
        .published
        .as_ref()
        .map(RawFlag::as_bool)
        .ok_or_else(|| ApiError::BadRequest("published is required".to_string()))?;

    state.admin.set_published(&id, published).await?;
    Ok(MutationResponse::ok(format!(
        "Image {} publish state changed to {}",
        id, published
    )))
}

/// POST /api/admin/update-label
pub async fn update_label(
    State(state): State<AppState>,
    request: Result<Json<LabelRequest>, JsonRejection>,
) -> ApiResult<Json<MutationResponse>> {
    let Json(request) = request?;
    let id = required(request.image_id, "imageId")?;
    let label = required(request.label_number, "labelNumber")?;

    state.admin.set_label_number(&id, &label).await?;
    Ok(MutationResponse::ok(format!(
        "Label number for image {} updated to {}",
        id, label
    )))
}

/// POST /api/admin/verify-label
pub async fn verify_label(
    State(state): State<AppState>,
    request: Result<Json<LabelRequest>, JsonRejection>,
) -> ApiResult<Json<MutationResponse>> {
    let Json(request) = request?;
    let id = required(request.image_id, "imageId")?;
    let label = required(request.label_number, "labelNumber")?;

    state.admin.verify_label(&id, &label).await?;
    Ok(MutationResponse::ok(format!(
        "Label number {} verified successfully for image {}",
        label, id
    )))
}

/// POST /api/admin/add-tag
pub async fn add_tag(
    State(state): State<AppState>,
    request: Result<Json<TagRequest>, JsonRejection>,
) -> ApiResult<Json<MutationResponse>> {
    let Json(request) = request?;
    let id = required(request.image_id, "imageId")?;
    let tag = required(request.tag, "tag")?;

    state.admin.add_tag(&id, &tag).await?;
    Ok(MutationResponse::ok(format!("Tag {} added successfully", tag)))
}

/// POST /api/admin/remove-tag
pub async fn remove_tag(
    State(state): State<AppState>,
    request: Result<Json<TagRequest>, JsonRejection>,
) -> ApiResult<Json<MutationResponse>> {
    let Json(request) = request?;
    let id = required(request.image_id, "imageId")?;
    let tag = required(request.tag, "tag")?;

    state.admin.remove_tag(&id, &tag).await?;
    Ok(MutationResponse::ok(format!("Tag {} removed successfully", tag)))
}

/// POST /api/admin/verify-password
///
/// Wrong password and missing configuration both answer `success: false`.
pub async fn verify_password(
    State(state): State<AppState>,
    request: Result<Json<PasswordRequest>, JsonRejection>,
) -> ApiResult<Json<MutationResponse>> {
    let Json(request) = request?;
    let password = request
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Password is required".to_string()))?;

    let (success, message) = match state.admin.verify_password(&password) {
        Ok(true) => (true, "Authentication successful"),
        Ok(false) => (false, "Invalid password"),
        Err(Error::Config(reason)) => {
            warn!(%reason, "Admin login attempted without a configured password");
            (false, "Admin authentication not properly configured")
        }
        Err(e) => return Err(e.into()),
    };

    Ok(Json(MutationResponse {
        success,
        message: message.to_string(),
    }))
}

/// POST /api/admin/clear-cache
pub async fn clear_cache(State(state): State<AppState>) -> Json<MutationResponse> {
    state.catalog.invalidate(None).await;
    MutationResponse::ok("Catalog cache cleared".to_string())
}

/// Build admin mutation routes
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin/toggle-published", post(toggle_published))
        .route("/api/admin/update-label", post(update_label))
        .route("/api/admin/verify-label", post(verify_label))
        .route("/api/admin/add-tag", post(add_tag))
        .route("/api/admin/remove-tag", post(remove_tag))
        .route("/api/admin/verify-password", post(verify_password))
        .route("/api/admin/clear-cache", post(clear_cache))
}
