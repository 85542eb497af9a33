use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use super::repo::{self, CartItem, CartLine};
use crate::auth::extractors::AuthUser;
use crate::error::{ApiError, ApiResponse, ApiResult};
use crate::products::repo as products_repo;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/add", post(add_to_cart))
        .route("/", get(get_cart))
        .route("/:id", axum::routing::put(update_quantity).delete(remove_item))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: i32,
}

#[instrument(skip(state))]
pub async fn add_to_cart(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<AddToCartRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CartItem>>), ApiError> {
    if products_repo::find_by_id(&state.db, payload.product_id)
        .await?
        .is_none()
    {
        return Err(ApiError::NotFound("Product not found".into()));
    }

    let item = repo::upsert_add(&state.db, user_id, payload.product_id).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::message_data("Item added to cart", item),
    ))
}

#[instrument(skip(state))]
pub async fn get_cart(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Vec<CartLine>> {
    let items = repo::list(&state.db, user_id).await?;
    Ok(ApiResponse::data(items))
}

#[instrument(skip(state))]
pub async fn update_quantity(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateQuantityRequest>,
) -> ApiResult<CartItem> {
    if payload.quantity < 1 {
        return Err(ApiError::BadRequest("Quantity must be at least 1".into()));
    }
    let item = repo::update_quantity(&state.db, user_id, id, payload.quantity)
        .await?
        .ok_or_else(|| ApiError::NotFound("Cart item not found".into()))?;
    Ok(ApiResponse::message_data("Cart updated", item))
}

#[instrument(skip(state))]
pub async fn remove_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    if !repo::delete(&state.db, user_id, id).await? {
        return Err(ApiError::NotFound("Cart item not found".into()));
    }
    Ok(ApiResponse::message("Item removed from cart"))
}
