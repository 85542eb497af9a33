use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MylistItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub product_title: String,
    pub image: String,
    pub rating: f64,
    pub price: f64,
    pub old_price: f64,
    pub brand: String,
    pub discount: f64,
    pub created_at: OffsetDateTime,
}

const MYLIST_COLS: &str = "id, user_id, product_id, product_title, image, rating, \
     price, old_price, brand, discount, created_at";

pub struct NewMylistItem {
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub product_title: String,
    pub image: String,
    pub rating: f64,
    pub price: f64,
    pub old_price: f64,
    pub brand: String,
    pub discount: f64,
}

pub async fn exists(db: &PgPool, user_id: Uuid, product_id: Uuid) -> anyhow::Result<bool> {
    let (found,): (bool,) = sqlx::query_as(
        "SELECT EXISTS (SELECT 1 FROM mylist_items WHERE user_id = $1 AND product_id = $2)",
    )
    .bind(user_id)
    .bind(product_id)
    .fetch_one(db)
    .await?;
    Ok(found)
}

pub async fn insert(db: &PgPool, item: &NewMylistItem) -> anyhow::Result<MylistItem> {
    let row = sqlx::query_as::<_, MylistItem>(&format!(
        "INSERT INTO mylist_items
            (user_id, product_id, product_title, image, rating, price, old_price, brand, discount)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         RETURNING {MYLIST_COLS}"
    ))
    .bind(item.user_id)
    .bind(item.product_id)
    .bind(&item.product_title)
    .bind(&item.image)
    .bind(item.rating)
    .bind(item.price)
    .bind(item.old_price)
    .bind(&item.brand)
    .bind(item.discount)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn list(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<MylistItem>> {
    let rows = sqlx::query_as::<_, MylistItem>(&format!(
        "SELECT {MYLIST_COLS} FROM mylist_items WHERE user_id = $1 ORDER BY created_at DESC"
    ))
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn delete(db: &PgPool, user_id: Uuid, item_id: Uuid) -> anyhow::Result<bool> {
    let done = sqlx::query("DELETE FROM mylist_items WHERE id = $1 AND user_id = $2")
        .bind(item_id)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(done.rows_affected() > 0)
}
