use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::dto::{
    CancelOrderRequest, CreateOrderRequest, OrderDetails, OrderList, OrderListQuery,
    UpdateStatusRequest,
};
use super::repo::{self, OrderStats};
use super::services;
use crate::auth::extractors::{AdminUser, AuthUser};
use crate::error::{ApiError, ApiResponse, ApiResult};
use crate::pagination::PageInfo;
use crate::state::AppState;
use crate::users::repo::User;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_my_orders).post(create_order))
        .route("/all", get(list_all_orders))
        .route("/stats", get(order_stats))
        .route("/:id", get(get_order))
        .route("/:id/status", put(update_status))
        .route("/:id/cancel", put(cancel_order))
}

#[instrument(skip(state, payload))]
pub async fn create_order(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<OrderDetails>>), ApiError> {
    let details = services::create_order(&state, user_id, payload).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::message_data("Order placed successfully", details),
    ))
}

#[instrument(skip(state))]
pub async fn list_my_orders(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<OrderListQuery>,
) -> ApiResult<OrderList> {
    let page = q.page_query();
    let total = repo::count_for_user(&state.db, user_id).await?;
    let info = PageInfo::new(&page, total);
    let orders = repo::list_for_user(&state.db, user_id, page.per_page, page.offset()).await?;
    Ok(ApiResponse::data(OrderList::new(orders, info)))
}

#[instrument(skip(state))]
pub async fn list_all_orders(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Query(q): Query<OrderListQuery>,
) -> ApiResult<OrderList> {
    let page = q.page_query();
    let filter = q.filter();
    let total = repo::count_all(&state.db, &filter).await?;
    let info = PageInfo::new(&page, total);
    let orders = repo::list_all(&state.db, &filter, page.per_page, page.offset()).await?;
    Ok(ApiResponse::data(OrderList::new(orders, info)))
}

#[instrument(skip(state))]
pub async fn order_stats(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> ApiResult<OrderStats> {
    let now = time::OffsetDateTime::now_utc();
    let stats = repo::stats(
        &state.db,
        services::start_of_day(now),
        services::start_of_month(now)?,
        services::start_of_year(now)?,
    )
    .await?;
    Ok(ApiResponse::data(stats))
}

#[instrument(skip(state))]
pub async fn get_order(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<OrderDetails> {
    let order = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Order not found".into()))?;

    if order.user_id != user_id {
        let caller = User::find_by_id(&state.db, user_id)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("User not found".into()))?;
        if caller.role != "ADMIN" {
            return Err(ApiError::Forbidden("Not allowed to view this order".into()));
        }
    }

    let details = services::populate(&state, order).await?;
    Ok(ApiResponse::data(details))
}

#[instrument(skip(state, payload))]
pub async fn update_status(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> ApiResult<OrderDetails> {
    let details = services::update_status(&state, id, &payload).await?;
    Ok(ApiResponse::message_data("Order status updated", details))
}

#[instrument(skip(state, payload))]
pub async fn cancel_order(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CancelOrderRequest>,
) -> ApiResult<OrderDetails> {
    let details = services::cancel_order(&state, user_id, id, &payload.reason).await?;
    Ok(ApiResponse::message_data("Order cancelled", details))
}
