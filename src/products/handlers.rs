use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::dto::{CreateProductRequest, ProductCounts, ProductList, ProductListQuery};
use super::repo::{self, NewProduct, Product};
use crate::auth::extractors::AdminUser;
use crate::categories::repo as categories_repo;
use crate::error::{ApiError, ApiResponse, ApiResult};
use crate::pagination::PageInfo;
use crate::state::AppState;
use crate::uploads::services::delete_images_by_urls;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/featured", get(featured_products))
        .route("/counts", get(product_counts))
        .route("/:id", get(get_product).put(update_product).delete(delete_product))
}

impl CreateProductRequest {
    fn into_new_product(self) -> NewProduct {
        NewProduct {
            name: self.name,
            description: self.description,
            brand: self.brand,
            images: self.images,
            price: self.price,
            old_price: self.old_price,
            category_id: self.category,
            cat_name: self.cat_name,
            cat_id: self.cat_id,
            sub_cat_id: self.sub_cat_id,
            sub_cat_name: self.sub_cat_name,
            third_sub_cat_id: self.third_sub_cat_id,
            third_sub_cat_name: self.third_sub_cat_name,
            count_in_stock: self.count_in_stock,
            is_featured: self.is_featured,
            discount: self.discount,
            product_ram: self.product_ram,
            size: self.size,
            product_weight: self.product_weight,
            location: self.location,
        }
    }
}

#[instrument(skip(state, payload))]
pub async fn create_product(
    State(state): State<AppState>,
    AdminUser(admin_id): AdminUser,
    Json(payload): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Product>>), ApiError> {
    if categories_repo::find_by_id(&state.db, payload.category)
        .await?
        .is_none()
    {
        return Err(ApiError::NotFound("Invalid Category ID".into()));
    }
    if payload.images.is_empty() {
        return Err(ApiError::BadRequest(
            "No images found to create product".into(),
        ));
    }
    if payload.count_in_stock < 0 {
        return Err(ApiError::BadRequest("countInStock must be >= 0".into()));
    }

    let product = repo::insert(&state.db, &payload.into_new_product()).await?;
    info!(admin_id = %admin_id, product_id = %product.id, "product created");
    Ok((
        StatusCode::CREATED,
        ApiResponse::message_data("Product created successfully", product),
    ))
}

#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
    Query(q): Query<ProductListQuery>,
) -> ApiResult<ProductList> {
    let page = q.page_query();
    let filter = q.filter();

    let total = repo::count(&state.db, &filter).await?;
    let info = PageInfo::new(&page, total);
    if page.page > info.total_pages && info.total_pages != 0 {
        return Err(ApiError::NotFound("Page not found".into()));
    }

    let products = repo::list(&state.db, &filter, page.per_page, page.offset()).await?;
    Ok(ApiResponse::data(ProductList::new(products, info)))
}

#[instrument(skip(state))]
pub async fn featured_products(State(state): State<AppState>) -> ApiResult<Vec<Product>> {
    let products = repo::list_featured(&state.db, 20).await?;
    Ok(ApiResponse::data(products))
}

#[instrument(skip(state))]
pub async fn product_counts(State(state): State<AppState>) -> ApiResult<ProductCounts> {
    let total_products = repo::count_all(&state.db).await?;
    Ok(ApiResponse::data(ProductCounts { total_products }))
}

#[instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Product> {
    let product = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".into()))?;
    Ok(ApiResponse::data(product))
}

#[instrument(skip(state, payload))]
pub async fn update_product(
    State(state): State<AppState>,
    AdminUser(admin_id): AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateProductRequest>,
) -> ApiResult<Product> {
    if categories_repo::find_by_id(&state.db, payload.category)
        .await?
        .is_none()
    {
        return Err(ApiError::NotFound("Invalid Category ID".into()));
    }

    let product = repo::update(&state.db, id, &payload.into_new_product())
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".into()))?;
    info!(admin_id = %admin_id, product_id = %id, "product updated");
    Ok(ApiResponse::message_data(
        "Product updated successfully",
        product,
    ))
}

/// Remote images are removed first; a failure there leaves the product intact.
#[instrument(skip(state))]
pub async fn delete_product(
    State(state): State<AppState>,
    AdminUser(admin_id): AdminUser,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    let product = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".into()))?;

    delete_images_by_urls(&state, &product.images).await?;
    repo::delete(&state.db, id).await?;
    info!(admin_id = %admin_id, product_id = %id, "product deleted");
    Ok(ApiResponse::message("Product deleted successfully"))
}
