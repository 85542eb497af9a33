use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::dto::{CategoryCounts, CreateCategoryRequest};
use super::repo::{self, Category, NewCategory};
use super::services::{build_tree, CategoryNode};
use crate::auth::extractors::AdminUser;
use crate::error::{ApiError, ApiResponse, ApiResult};
use crate::state::AppState;
use crate::uploads::services::delete_images_by_urls;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(category_tree).post(create_category))
        .route("/counts", get(category_counts))
        .route(
            "/:id",
            get(get_category).put(update_category).delete(delete_category),
        )
}

async fn resolved_parent(
    state: &AppState,
    payload: &CreateCategoryRequest,
) -> Result<Option<Category>, ApiError> {
    match payload.parent_id {
        None => Ok(None),
        Some(parent_id) => repo::find_by_id(&state.db, parent_id)
            .await?
            .map(Some)
            .ok_or_else(|| ApiError::NotFound("Parent category not found".into())),
    }
}

#[instrument(skip(state, payload))]
pub async fn create_category(
    State(state): State<AppState>,
    AdminUser(admin_id): AdminUser,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Category>>), ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Category name is required".into()));
    }
    let parent = resolved_parent(&state, &payload).await?;
    let parent_cat_name = match (&parent, payload.parent_cat_name.is_empty()) {
        (Some(p), true) => p.name.clone(),
        _ => payload.parent_cat_name,
    };

    let category = repo::insert(
        &state.db,
        &NewCategory {
            name: payload.name,
            images: payload.images,
            color: payload.color,
            parent_id: payload.parent_id,
            parent_cat_name,
            is_active: payload.is_active,
            sort_order: payload.sort_order,
        },
    )
    .await?;
    info!(admin_id = %admin_id, category_id = %category.id, "category created");
    Ok((
        StatusCode::CREATED,
        ApiResponse::message_data("Category created", category),
    ))
}

#[instrument(skip(state))]
pub async fn category_tree(State(state): State<AppState>) -> ApiResult<Vec<CategoryNode>> {
    let rows = repo::list_all(&state.db).await?;
    Ok(ApiResponse::data(build_tree(rows)))
}

#[instrument(skip(state))]
pub async fn category_counts(State(state): State<AppState>) -> ApiResult<CategoryCounts> {
    let category_count = repo::root_count(&state.db).await?;
    let sub_category_count = repo::sub_count(&state.db).await?;
    Ok(ApiResponse::data(CategoryCounts {
        category_count,
        sub_category_count,
    }))
}

#[instrument(skip(state))]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Category> {
    let category = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Category not found".into()))?;
    Ok(ApiResponse::data(category))
}

#[instrument(skip(state, payload))]
pub async fn update_category(
    State(state): State<AppState>,
    AdminUser(admin_id): AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateCategoryRequest>,
) -> ApiResult<Category> {
    resolved_parent(&state, &payload).await?;
    let category = repo::update(
        &state.db,
        id,
        &NewCategory {
            name: payload.name,
            images: payload.images,
            color: payload.color,
            parent_id: payload.parent_id,
            parent_cat_name: payload.parent_cat_name,
            is_active: payload.is_active,
            sort_order: payload.sort_order,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Category not found".into()))?;
    info!(admin_id = %admin_id, category_id = %id, "category updated");
    Ok(ApiResponse::message_data("Category updated", category))
}

/// Remote images go first so a storage failure aborts before any rows are
/// touched; the row deletes then happen in one transaction.
#[instrument(skip(state))]
pub async fn delete_category(
    State(state): State<AppState>,
    AdminUser(admin_id): AdminUser,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    let category = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Category not found".into()))?;
    let children = repo::list_children(&state.db, id).await?;

    delete_images_by_urls(&state, &category.images).await?;
    for child in &children {
        delete_images_by_urls(&state, &child.images).await?;
    }

    let mut tx = state.db.begin().await?;
    repo::delete_with_children_tx(&mut tx, id).await?;
    tx.commit().await?;

    info!(admin_id = %admin_id, category_id = %id, children = children.len(), "category deleted");
    Ok(ApiResponse::message("Category deleted"))
}
