use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::dto::{
    fill_distribution, rating_in_range, AdminReviewsQuery, CreateReviewRequest, HelpfulResponse,
    HelpfulVoteRequest, ModerateReviewRequest, ProductReviews, ProductReviewsQuery, ReviewList,
    UpdateReviewRequest,
};
use super::repo::{self, NewReview, Review, ReviewSort};
use crate::auth::extractors::{AdminUser, AuthUser};
use crate::error::{ApiError, ApiResponse, ApiResult};
use crate::pagination::PageInfo;
use crate::products::repo as products_repo;
use crate::state::AppState;
use crate::users::repo::User;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_review))
        .route("/product/:product_id", get(product_reviews))
        .route("/my", get(my_reviews))
        .route("/all", get(all_reviews))
        .route("/:id", put(update_review).delete(delete_review))
        .route("/:id/moderate", put(moderate_review))
        .route("/:id/helpful", post(mark_helpful))
}

#[instrument(skip(state, payload))]
pub async fn create_review(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Review>>), ApiError> {
    if !rating_in_range(payload.rating) {
        return Err(ApiError::BadRequest("Rating must be between 1 and 5".into()));
    }
    if products_repo::find_by_id(&state.db, payload.product_id)
        .await?
        .is_none()
    {
        return Err(ApiError::NotFound("Product not found".into()));
    }
    if repo::exists(&state.db, user_id, payload.product_id).await? {
        return Err(ApiError::BadRequest(
            "You have already reviewed this product".into(),
        ));
    }

    let verified = repo::has_purchased(&state.db, user_id, payload.product_id).await?;
    let mut tx = state.db.begin().await?;
    let review = repo::insert_tx(
        &mut tx,
        &NewReview {
            user_id,
            product_id: payload.product_id,
            rating: payload.rating,
            title: payload.title,
            comment: payload.comment,
            images: payload.images,
            verified,
        },
    )
    .await?;
    repo::recompute_product_rating_tx(&mut tx, review.product_id).await?;
    tx.commit().await?;

    info!(user_id = %user_id, review_id = %review.id, verified, "review created");
    Ok((
        StatusCode::CREATED,
        ApiResponse::message_data("Review submitted", review),
    ))
}

#[instrument(skip(state))]
pub async fn product_reviews(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Query(q): Query<ProductReviewsQuery>,
) -> ApiResult<ProductReviews> {
    let page = q.page_query();
    let sort = ReviewSort::parse(q.sort.as_deref());

    let total = repo::count_for_product(&state.db, product_id, q.rating).await?;
    let info = PageInfo::new(&page, total);
    let reviews = repo::list_for_product(
        &state.db,
        product_id,
        q.rating,
        sort,
        page.per_page,
        page.offset(),
    )
    .await?;
    let distribution = fill_distribution(&repo::rating_distribution(&state.db, product_id).await?);
    Ok(ApiResponse::data(ProductReviews::new(
        reviews,
        distribution,
        info,
    )))
}

#[instrument(skip(state))]
pub async fn my_reviews(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Vec<Review>> {
    let reviews = repo::list_for_user(&state.db, user_id).await?;
    Ok(ApiResponse::data(reviews))
}

#[instrument(skip(state))]
pub async fn all_reviews(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Query(q): Query<AdminReviewsQuery>,
) -> ApiResult<ReviewList> {
    let page = q.page_query();
    let filter = q.filter();
    let total = repo::count_all(&state.db, &filter).await?;
    let info = PageInfo::new(&page, total);
    let reviews = repo::list_all(&state.db, &filter, page.per_page, page.offset()).await?;
    Ok(ApiResponse::data(ReviewList::new(reviews, info)))
}

#[instrument(skip(state, payload))]
pub async fn update_review(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateReviewRequest>,
) -> ApiResult<Review> {
    let existing = repo::find_by_id(&state.db, id)
        .await?
        .filter(|r| r.user_id == user_id)
        .ok_or_else(|| ApiError::NotFound("Review not found".into()))?;

    let rating = payload.rating.unwrap_or(existing.rating);
    if !rating_in_range(rating) {
        return Err(ApiError::BadRequest("Rating must be between 1 and 5".into()));
    }
    let title = payload.title.unwrap_or(existing.title);
    let comment = payload.comment.unwrap_or(existing.comment);
    let images = payload.images.unwrap_or(existing.images);

    let mut tx = state.db.begin().await?;
    let review = repo::update_tx(&mut tx, id, rating, &title, &comment, &images)
        .await?
        .ok_or_else(|| ApiError::NotFound("Review not found".into()))?;
    repo::recompute_product_rating_tx(&mut tx, review.product_id).await?;
    tx.commit().await?;

    Ok(ApiResponse::message_data("Review updated", review))
}

#[instrument(skip(state))]
pub async fn delete_review(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    let review = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Review not found".into()))?;

    if review.user_id != user_id {
        let caller = User::find_by_id(&state.db, user_id)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("User not found".into()))?;
        if caller.role != "ADMIN" {
            return Err(ApiError::Forbidden(
                "Not allowed to delete this review".into(),
            ));
        }
    }

    let mut tx = state.db.begin().await?;
    repo::delete_tx(&mut tx, id).await?;
    repo::recompute_product_rating_tx(&mut tx, review.product_id).await?;
    tx.commit().await?;

    info!(review_id = %id, "review deleted");
    Ok(ApiResponse::message("Review deleted"))
}

#[instrument(skip(state, payload))]
pub async fn moderate_review(
    State(state): State<AppState>,
    AdminUser(admin_id): AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ModerateReviewRequest>,
) -> ApiResult<Review> {
    if !matches!(payload.status.as_str(), "PENDING" | "APPROVED" | "REJECTED") {
        return Err(ApiError::BadRequest(format!(
            "Invalid review status: {}",
            payload.status
        )));
    }

    let mut tx = state.db.begin().await?;
    let review = repo::moderate_tx(&mut tx, id, &payload.status, payload.admin_response.as_deref())
        .await?
        .ok_or_else(|| ApiError::NotFound("Review not found".into()))?;
    repo::recompute_product_rating_tx(&mut tx, review.product_id).await?;
    tx.commit().await?;

    info!(admin_id = %admin_id, review_id = %id, status = %review.status, "review moderated");
    Ok(ApiResponse::message_data("Review moderated", review))
}

#[instrument(skip(state, payload))]
pub async fn mark_helpful(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<HelpfulVoteRequest>,
) -> ApiResult<HelpfulResponse> {
    if repo::find_by_id(&state.db, id).await?.is_none() {
        return Err(ApiError::NotFound("Review not found".into()));
    }
    repo::upsert_helpful_vote(&state.db, id, user_id, payload.helpful).await?;
    let helpful_count = repo::helpful_count(&state.db, id).await?;
    Ok(ApiResponse::data(HelpfulResponse { helpful_count }))
}
