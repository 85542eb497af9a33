use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::dto::{CreateSubCategoryRequest, SubCategoryList, SubCategoryListQuery};
use super::repo::{self, NewSubCategory, SubCategory};
use crate::auth::extractors::AdminUser;
use crate::categories::repo as categories_repo;
use crate::error::{ApiError, ApiResponse, ApiResult};
use crate::pagination::PageInfo;
use crate::state::AppState;
use crate::uploads::services::delete_image_by_url;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_subcategories).post(create_subcategory))
        .route("/category/:category_id", get(list_by_category))
        .route(
            "/:id",
            get(get_subcategory)
                .put(update_subcategory)
                .delete(delete_subcategory),
        )
}

#[instrument(skip(state, payload))]
pub async fn create_subcategory(
    State(state): State<AppState>,
    AdminUser(admin_id): AdminUser,
    Json(payload): Json<CreateSubCategoryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SubCategory>>), ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Subcategory name is required".into()));
    }
    if categories_repo::find_by_id(&state.db, payload.category_id)
        .await?
        .is_none()
    {
        return Err(ApiError::NotFound("Category not found".into()));
    }
    if repo::name_taken(&state.db, payload.category_id, &payload.name, None).await? {
        return Err(ApiError::BadRequest(
            "Subcategory with this name already exists in this category".into(),
        ));
    }

    let sub = repo::insert(
        &state.db,
        &NewSubCategory {
            name: payload.name,
            description: payload.description,
            category_id: payload.category_id,
            image: payload.image,
            is_active: payload.is_active,
            sort_order: payload.sort_order,
            meta_title: payload.meta_title,
            meta_description: payload.meta_description,
        },
    )
    .await?;
    categories_repo::adjust_sub_category_count(&state.db, sub.category_id, 1).await?;

    info!(admin_id = %admin_id, subcategory_id = %sub.id, "subcategory created");
    Ok((
        StatusCode::CREATED,
        ApiResponse::message_data("Subcategory created", sub),
    ))
}

#[instrument(skip(state))]
pub async fn list_subcategories(
    State(state): State<AppState>,
    Query(q): Query<SubCategoryListQuery>,
) -> ApiResult<SubCategoryList> {
    let page = q.page_query();
    let filter = q.filter();

    let total = repo::count(&state.db, &filter).await?;
    let info = PageInfo::new(&page, total);
    let subs = repo::list(&state.db, &filter, page.per_page, page.offset()).await?;
    Ok(ApiResponse::data(SubCategoryList::new(subs, info)))
}

#[instrument(skip(state))]
pub async fn list_by_category(
    State(state): State<AppState>,
    Path(category_id): Path<Uuid>,
) -> ApiResult<Vec<SubCategory>> {
    let subs = repo::list_by_category(&state.db, category_id).await?;
    Ok(ApiResponse::data(subs))
}

#[instrument(skip(state))]
pub async fn get_subcategory(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<SubCategory> {
    let sub = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Subcategory not found".into()))?;
    Ok(ApiResponse::data(sub))
}

#[instrument(skip(state, payload))]
pub async fn update_subcategory(
    State(state): State<AppState>,
    AdminUser(admin_id): AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateSubCategoryRequest>,
) -> ApiResult<SubCategory> {
    let existing = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Subcategory not found".into()))?;
    if categories_repo::find_by_id(&state.db, payload.category_id)
        .await?
        .is_none()
    {
        return Err(ApiError::NotFound("Category not found".into()));
    }
    if repo::name_taken(&state.db, payload.category_id, &payload.name, Some(id)).await? {
        return Err(ApiError::BadRequest(
            "Subcategory with this name already exists in this category".into(),
        ));
    }

    let moved = existing.category_id != payload.category_id;
    let sub = repo::update(
        &state.db,
        id,
        &NewSubCategory {
            name: payload.name,
            description: payload.description,
            category_id: payload.category_id,
            image: payload.image,
            is_active: payload.is_active,
            sort_order: payload.sort_order,
            meta_title: payload.meta_title,
            meta_description: payload.meta_description,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Subcategory not found".into()))?;

    if moved {
        categories_repo::adjust_sub_category_count(&state.db, existing.category_id, -1).await?;
        categories_repo::adjust_sub_category_count(&state.db, sub.category_id, 1).await?;
    }

    info!(admin_id = %admin_id, subcategory_id = %id, "subcategory updated");
    Ok(ApiResponse::message_data("Subcategory updated", sub))
}

#[instrument(skip(state))]
pub async fn delete_subcategory(
    State(state): State<AppState>,
    AdminUser(admin_id): AdminUser,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    let sub = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Subcategory not found".into()))?;

    let references = repo::product_reference_count(&state.db, id).await?;
    if references > 0 {
        return Err(ApiError::BadRequest(format!(
            "Cannot delete subcategory: {references} product(s) still reference it"
        )));
    }

    if !sub.image.is_empty() {
        delete_image_by_url(&state, &sub.image).await?;
    }
    repo::delete(&state.db, id).await?;
    categories_repo::adjust_sub_category_count(&state.db, sub.category_id, -1).await?;

    info!(admin_id = %admin_id, subcategory_id = %id, "subcategory deleted");
    Ok(ApiResponse::message("Subcategory deleted"))
}
