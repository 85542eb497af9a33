use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use time::OffsetDateTime;
use tracing::instrument;
use uuid::Uuid;

use super::repo::{self, Banner, HomeBanner, NewBanner, NewHomeBanner};
use crate::auth::extractors::AdminUser;
use crate::error::{ApiError, ApiResponse, ApiResult};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_banners).post(create_banner))
        .route("/active", get(active_banners))
        .route(
            "/:id",
            get(get_banner).put(update_banner).delete(delete_banner),
        )
}

pub fn home_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_home_banners).post(create_home_banner))
        .route("/active", get(active_home_banners))
        .route(
            "/:id",
            get(get_home_banner)
                .put(update_home_banner)
                .delete(delete_home_banner),
        )
}

fn default_link_type() -> String {
    "NONE".into()
}
fn default_position() -> String {
    "TOP".into()
}
fn default_button_text() -> String {
    "Shop Now".into()
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BannerRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub image: String,
    #[serde(default)]
    pub mobile_image: String,
    #[serde(default)]
    pub link: String,
    #[serde(default = "default_link_type")]
    pub link_type: String,
    #[serde(default = "default_position")]
    pub position: String,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub start_date: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub end_date: Option<OffsetDateTime>,
}

impl BannerRequest {
    fn validate(&self) -> Result<(), ApiError> {
        if self.title.trim().is_empty() {
            return Err(ApiError::BadRequest("Banner title is required".into()));
        }
        if self.image.trim().is_empty() {
            return Err(ApiError::BadRequest("Banner image is required".into()));
        }
        if !matches!(
            self.link_type.as_str(),
            "PRODUCT" | "CATEGORY" | "EXTERNAL" | "NONE"
        ) {
            return Err(ApiError::BadRequest("Invalid link type".into()));
        }
        if !matches!(
            self.position.as_str(),
            "TOP" | "MIDDLE" | "BOTTOM" | "SIDEBAR"
        ) {
            return Err(ApiError::BadRequest("Invalid banner position".into()));
        }
        Ok(())
    }

    fn into_new_banner(self) -> NewBanner {
        NewBanner {
            title: self.title,
            description: self.description,
            image: self.image,
            mobile_image: self.mobile_image,
            link: self.link,
            link_type: self.link_type,
            position: self.position,
            sort_order: self.sort_order,
            is_active: self.is_active,
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeBannerRequest {
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    pub image: String,
    #[serde(default)]
    pub mobile_image: String,
    #[serde(default)]
    pub link: String,
    #[serde(default = "default_button_text")]
    pub button_text: String,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub start_date: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub end_date: Option<OffsetDateTime>,
}

impl HomeBannerRequest {
    fn validate(&self) -> Result<(), ApiError> {
        if self.title.trim().is_empty() {
            return Err(ApiError::BadRequest("Banner title is required".into()));
        }
        if self.image.trim().is_empty() {
            return Err(ApiError::BadRequest("Banner image is required".into()));
        }
        Ok(())
    }

    fn into_new_banner(self) -> NewHomeBanner {
        NewHomeBanner {
            title: self.title,
            subtitle: self.subtitle,
            image: self.image,
            mobile_image: self.mobile_image,
            link: self.link,
            button_text: self.button_text,
            sort_order: self.sort_order,
            is_active: self.is_active,
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }
}

fn finalize_banners(banners: Vec<Banner>) -> Vec<Banner> {
    let now = OffsetDateTime::now_utc();
    banners.into_iter().map(|b| b.finalize(now)).collect()
}

fn finalize_home_banners(banners: Vec<HomeBanner>) -> Vec<HomeBanner> {
    let now = OffsetDateTime::now_utc();
    banners.into_iter().map(|b| b.finalize(now)).collect()
}

#[instrument(skip(state, payload))]
pub async fn create_banner(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Json(payload): Json<BannerRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Banner>>), ApiError> {
    payload.validate()?;
    let banner = repo::insert(&state.db, &payload.into_new_banner()).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::message_data("Banner created", banner.finalize(OffsetDateTime::now_utc())),
    ))
}

#[instrument(skip(state))]
pub async fn list_banners(State(state): State<AppState>) -> ApiResult<Vec<Banner>> {
    let banners = repo::list(&state.db).await?;
    Ok(ApiResponse::data(finalize_banners(banners)))
}

#[instrument(skip(state))]
pub async fn active_banners(State(state): State<AppState>) -> ApiResult<Vec<Banner>> {
    let banners = repo::list_active(&state.db).await?;
    Ok(ApiResponse::data(finalize_banners(banners)))
}

#[instrument(skip(state))]
pub async fn get_banner(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Banner> {
    let banner = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Banner not found".into()))?;
    Ok(ApiResponse::data(banner.finalize(OffsetDateTime::now_utc())))
}

#[instrument(skip(state, payload))]
pub async fn update_banner(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<BannerRequest>,
) -> ApiResult<Banner> {
    payload.validate()?;
    let banner = repo::update(&state.db, id, &payload.into_new_banner())
        .await?
        .ok_or_else(|| ApiError::NotFound("Banner not found".into()))?;
    Ok(ApiResponse::message_data(
        "Banner updated",
        banner.finalize(OffsetDateTime::now_utc()),
    ))
}

#[instrument(skip(state))]
pub async fn delete_banner(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    if !repo::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("Banner not found".into()));
    }
    Ok(ApiResponse::message("Banner deleted"))
}

#[instrument(skip(state, payload))]
pub async fn create_home_banner(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Json(payload): Json<HomeBannerRequest>,
) -> Result<(StatusCode, Json<ApiResponse<HomeBanner>>), ApiError> {
    payload.validate()?;
    let banner = repo::insert_home(&state.db, &payload.into_new_banner()).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::message_data(
            "Home banner created",
            banner.finalize(OffsetDateTime::now_utc()),
        ),
    ))
}

#[instrument(skip(state))]
pub async fn list_home_banners(State(state): State<AppState>) -> ApiResult<Vec<HomeBanner>> {
    let banners = repo::list_home(&state.db).await?;
    Ok(ApiResponse::data(finalize_home_banners(banners)))
}

#[instrument(skip(state))]
pub async fn active_home_banners(State(state): State<AppState>) -> ApiResult<Vec<HomeBanner>> {
    let banners = repo::list_home_active(&state.db).await?;
    Ok(ApiResponse::data(finalize_home_banners(banners)))
}

#[instrument(skip(state))]
pub async fn get_home_banner(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<HomeBanner> {
    let banner = repo::find_home_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Home banner not found".into()))?;
    Ok(ApiResponse::data(banner.finalize(OffsetDateTime::now_utc())))
}

#[instrument(skip(state, payload))]
pub async fn update_home_banner(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<HomeBannerRequest>,
) -> ApiResult<HomeBanner> {
    payload.validate()?;
    let banner = repo::update_home(&state.db, id, &payload.into_new_banner())
        .await?
        .ok_or_else(|| ApiError::NotFound("Home banner not found".into()))?;
    Ok(ApiResponse::message_data(
        "Home banner updated",
        banner.finalize(OffsetDateTime::now_utc()),
    ))
}

#[instrument(skip(state))]
pub async fn delete_home_banner(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    if !repo::delete_home(&state.db, id).await? {
        return Err(ApiError::NotFound("Home banner not found".into()));
    }
    Ok(ApiResponse::message("Home banner deleted"))
}
