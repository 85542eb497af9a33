use axum::{
    extract::{DefaultBodyLimit, Multipart, Query, State},
    routing::{delete, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::services::{self, UploadItem};
use crate::auth::extractors::AdminUser;
use crate::error::{ApiError, ApiResponse, ApiResult};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload_images))
        .route("/", delete(delete_image))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024)) // 20MB
}

#[derive(Debug, Serialize)]
pub struct UploadedImages {
    pub images: Vec<String>,
}

/// POST /api/image/upload (multipart `files[]`, admin).
/// The returned URLs are what create/update endpoints accept as `images`.
#[instrument(skip(state, mp))]
pub async fn upload_images(
    State(state): State<AppState>,
    AdminUser(admin_id): AdminUser,
    mut mp: Multipart,
) -> ApiResult<UploadedImages> {
    let mut files: Vec<UploadItem> = Vec::new();
    while let Ok(Some(field)) = mp.next_field().await {
        let name = field.name().map(|s| s.to_string());
        if name.as_deref() == Some("files") || name.as_deref() == Some("files[]") {
            let content_type = field
                .content_type()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "application/octet-stream".into());
            let body = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(e.to_string()))?;
            files.push(UploadItem { body, content_type });
        }
    }
    if files.is_empty() {
        return Err(ApiError::BadRequest("files[] is required".into()));
    }

    let images = services::upload_images(&state, "uploads", files).await?;
    info!(admin_id = %admin_id, count = images.len(), "images uploaded");
    Ok(ApiResponse::message_data(
        "Images uploaded successfully",
        UploadedImages { images },
    ))
}

#[derive(Debug, Deserialize)]
pub struct DeleteImageQuery {
    pub img: String,
}

/// DELETE /api/image?img=<url> (admin).
#[instrument(skip(state))]
pub async fn delete_image(
    State(state): State<AppState>,
    AdminUser(_admin_id): AdminUser,
    Query(q): Query<DeleteImageQuery>,
) -> ApiResult<()> {
    if q.img.is_empty() {
        return Err(ApiError::BadRequest("Image URL is required".into()));
    }
    if !services::delete_image_by_url(&state, &q.img).await? {
        return Err(ApiError::NotFound("Image not found".into()));
    }
    Ok(ApiResponse::message("Image deleted successfully"))
}
