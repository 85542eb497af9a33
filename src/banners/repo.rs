use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::services::currently_active;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Banner {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub image: String,
    pub mobile_image: String,
    pub link: String,
    pub link_type: String,
    pub position: String,
    pub sort_order: i32,
    pub is_active: bool,
    pub start_date: OffsetDateTime,
    pub end_date: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    #[sqlx(default)]
    pub is_currently_active: bool,
}

impl Banner {
    pub fn finalize(mut self, now: OffsetDateTime) -> Self {
        self.is_currently_active =
            currently_active(self.is_active, self.start_date, self.end_date, now);
        self
    }
}

const BANNER_COLS: &str = "id, title, description, image, mobile_image, link, link_type, \
     position, sort_order, is_active, start_date, end_date, created_at";

pub struct NewBanner {
    pub title: String,
    pub description: String,
    pub image: String,
    pub mobile_image: String,
    pub link: String,
    pub link_type: String,
    pub position: String,
    pub sort_order: i32,
    pub is_active: bool,
    pub start_date: Option<OffsetDateTime>,
    pub end_date: Option<OffsetDateTime>,
}

pub async fn insert(db: &PgPool, b: &NewBanner) -> anyhow::Result<Banner> {
    let banner = sqlx::query_as::<_, Banner>(&format!(
        "INSERT INTO banners
            (title, description, image, mobile_image, link, link_type, position,
             sort_order, is_active, start_date, end_date)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, COALESCE($10, now()), $11)
         RETURNING {BANNER_COLS}"
    ))
    .bind(&b.title)
    .bind(&b.description)
    .bind(&b.image)
    .bind(&b.mobile_image)
    .bind(&b.link)
    .bind(&b.link_type)
    .bind(&b.position)
    .bind(b.sort_order)
    .bind(b.is_active)
    .bind(b.start_date)
    .bind(b.end_date)
    .fetch_one(db)
    .await?;
    Ok(banner)
}

pub async fn update(db: &PgPool, id: Uuid, b: &NewBanner) -> anyhow::Result<Option<Banner>> {
    let banner = sqlx::query_as::<_, Banner>(&format!(
        "UPDATE banners SET
            title = $2, description = $3, image = $4, mobile_image = $5, link = $6,
            link_type = $7, position = $8, sort_order = $9, is_active = $10,
            start_date = COALESCE($11, start_date), end_date = $12
         WHERE id = $1
         RETURNING {BANNER_COLS}"
    ))
    .bind(id)
    .bind(&b.title)
    .bind(&b.description)
    .bind(&b.image)
    .bind(&b.mobile_image)
    .bind(&b.link)
    .bind(&b.link_type)
    .bind(&b.position)
    .bind(b.sort_order)
    .bind(b.is_active)
    .bind(b.start_date)
    .bind(b.end_date)
    .fetch_optional(db)
    .await?;
    Ok(banner)
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Banner>> {
    let banner = sqlx::query_as::<_, Banner>(&format!(
        "SELECT {BANNER_COLS} FROM banners WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(banner)
}

pub async fn list(db: &PgPool) -> anyhow::Result<Vec<Banner>> {
    let rows = sqlx::query_as::<_, Banner>(&format!(
        "SELECT {BANNER_COLS} FROM banners ORDER BY position, sort_order"
    ))
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn list_active(db: &PgPool) -> anyhow::Result<Vec<Banner>> {
    let rows = sqlx::query_as::<_, Banner>(&format!(
        "SELECT {BANNER_COLS} FROM banners
         WHERE is_active AND start_date <= now()
           AND (end_date IS NULL OR end_date >= now())
         ORDER BY sort_order"
    ))
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let done = sqlx::query("DELETE FROM banners WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(done.rows_affected() > 0)
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct HomeBanner {
    pub id: Uuid,
    pub title: String,
    pub subtitle: String,
    pub image: String,
    pub mobile_image: String,
    pub link: String,
    pub button_text: String,
    pub sort_order: i32,
    pub is_active: bool,
    pub start_date: OffsetDateTime,
    pub end_date: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    #[sqlx(default)]
    pub is_currently_active: bool,
}

impl HomeBanner {
    pub fn finalize(mut self, now: OffsetDateTime) -> Self {
        self.is_currently_active =
            currently_active(self.is_active, self.start_date, self.end_date, now);
        self
    }
}

const HOME_BANNER_COLS: &str = "id, title, subtitle, image, mobile_image, link, button_text, \
     sort_order, is_active, start_date, end_date, created_at";

pub struct NewHomeBanner {
    pub title: String,
    pub subtitle: String,
    pub image: String,
    pub mobile_image: String,
    pub link: String,
    pub button_text: String,
    pub sort_order: i32,
    pub is_active: bool,
    pub start_date: Option<OffsetDateTime>,
    pub end_date: Option<OffsetDateTime>,
}

pub async fn insert_home(db: &PgPool, b: &NewHomeBanner) -> anyhow::Result<HomeBanner> {
    let banner = sqlx::query_as::<_, HomeBanner>(&format!(
        "INSERT INTO home_banners
            (title, subtitle, image, mobile_image, link, button_text, sort_order,
             is_active, start_date, end_date)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, COALESCE($9, now()), $10)
         RETURNING {HOME_BANNER_COLS}"
    ))
    .bind(&b.title)
    .bind(&b.subtitle)
    .bind(&b.image)
    .bind(&b.mobile_image)
    .bind(&b.link)
    .bind(&b.button_text)
    .bind(b.sort_order)
    .bind(b.is_active)
    .bind(b.start_date)
    .bind(b.end_date)
    .fetch_one(db)
    .await?;
    Ok(banner)
}

pub async fn update_home(
    db: &PgPool,
    id: Uuid,
    b: &NewHomeBanner,
) -> anyhow::Result<Option<HomeBanner>> {
    let banner = sqlx::query_as::<_, HomeBanner>(&format!(
        "UPDATE home_banners SET
            title = $2, subtitle = $3, image = $4, mobile_image = $5, link = $6,
            button_text = $7, sort_order = $8, is_active = $9,
            start_date = COALESCE($10, start_date), end_date = $11
         WHERE id = $1
         RETURNING {HOME_BANNER_COLS}"
    ))
    .bind(id)
    .bind(&b.title)
    .bind(&b.subtitle)
    .bind(&b.image)
    .bind(&b.mobile_image)
    .bind(&b.link)
    .bind(&b.button_text)
    .bind(b.sort_order)
    .bind(b.is_active)
    .bind(b.start_date)
    .bind(b.end_date)
    .fetch_optional(db)
    .await?;
    Ok(banner)
}

pub async fn find_home_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<HomeBanner>> {
    let banner = sqlx::query_as::<_, HomeBanner>(&format!(
        "SELECT {HOME_BANNER_COLS} FROM home_banners WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(banner)
}

pub async fn list_home(db: &PgPool) -> anyhow::Result<Vec<HomeBanner>> {
    let rows = sqlx::query_as::<_, HomeBanner>(&format!(
        "SELECT {HOME_BANNER_COLS} FROM home_banners ORDER BY sort_order"
    ))
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn list_home_active(db: &PgPool) -> anyhow::Result<Vec<HomeBanner>> {
    let rows = sqlx::query_as::<_, HomeBanner>(&format!(
        "SELECT {HOME_BANNER_COLS} FROM home_banners
         WHERE is_active AND start_date <= now()
           AND (end_date IS NULL OR end_date >= now())
         ORDER BY sort_order"
    ))
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn delete_home(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let done = sqlx::query("DELETE FROM home_banners WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(done.rows_affected() > 0)
}
