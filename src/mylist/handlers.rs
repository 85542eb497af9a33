use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use super::repo::{self, MylistItem, NewMylistItem};
use crate::auth::extractors::AuthUser;
use crate::error::{ApiError, ApiResponse, ApiResult};
use crate::products::repo as products_repo;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/add", post(add_to_mylist))
        .route("/", get(get_mylist))
        .route("/:id", axum::routing::delete(remove_item))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToMylistRequest {
    pub product_id: Uuid,
}

#[instrument(skip(state))]
pub async fn add_to_mylist(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<AddToMylistRequest>,
) -> Result<(StatusCode, Json<ApiResponse<MylistItem>>), ApiError> {
    let product = products_repo::find_by_id(&state.db, payload.product_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".into()))?;

    if repo::exists(&state.db, user_id, product.id).await? {
        return Err(ApiError::BadRequest("Product already in My List".into()));
    }

    let item = repo::insert(
        &state.db,
        &NewMylistItem {
            user_id,
            product_id: product.id,
            product_title: product.name,
            image: product.images.first().cloned().unwrap_or_default(),
            rating: product.rating,
            price: product.price,
            old_price: product.old_price,
            brand: product.brand,
            discount: product.discount,
        },
    )
    .await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::message_data("Product added to My List", item),
    ))
}

#[instrument(skip(state))]
pub async fn get_mylist(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Vec<MylistItem>> {
    let items = repo::list(&state.db, user_id).await?;
    Ok(ApiResponse::data(items))
}

#[instrument(skip(state))]
pub async fn remove_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    if !repo::delete(&state.db, user_id, id).await? {
        return Err(ApiError::NotFound("My List item not found".into()));
    }
    Ok(ApiResponse::message("Product removed from My List"))
}
