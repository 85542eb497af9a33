use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub created_at: OffsetDateTime,
}

/// Cart row joined with a snapshot of its product.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub product_title: String,
    pub image: String,
    pub price: f64,
    pub old_price: f64,
    pub discount: f64,
    pub brand: String,
    pub count_in_stock: i32,
    pub created_at: OffsetDateTime,
}

/// Existing (user, product) rows gain one unit; the unique index backs it.
pub async fn upsert_add(db: &PgPool, user_id: Uuid, product_id: Uuid) -> anyhow::Result<CartItem> {
    let item = sqlx::query_as::<_, CartItem>(
        "INSERT INTO cart_items (user_id, product_id, quantity)
         VALUES ($1, $2, 1)
         ON CONFLICT (user_id, product_id)
         DO UPDATE SET quantity = cart_items.quantity + 1
         RETURNING id, user_id, product_id, quantity, created_at",
    )
    .bind(user_id)
    .bind(product_id)
    .fetch_one(db)
    .await?;
    Ok(item)
}

pub async fn list(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<CartLine>> {
    let rows = sqlx::query_as::<_, CartLine>(
        "SELECT ci.id, ci.product_id, ci.quantity,
                p.name AS product_title,
                COALESCE(p.images[1], '') AS image,
                p.price, p.old_price, p.discount, p.brand, p.count_in_stock,
                ci.created_at
         FROM cart_items ci
         JOIN products p ON p.id = ci.product_id
         WHERE ci.user_id = $1
         ORDER BY ci.created_at DESC",
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn update_quantity(
    db: &PgPool,
    user_id: Uuid,
    item_id: Uuid,
    quantity: i32,
) -> anyhow::Result<Option<CartItem>> {
    let item = sqlx::query_as::<_, CartItem>(
        "UPDATE cart_items SET quantity = $3
         WHERE id = $1 AND user_id = $2
         RETURNING id, user_id, product_id, quantity, created_at",
    )
    .bind(item_id)
    .bind(user_id)
    .bind(quantity)
    .fetch_optional(db)
    .await?;
    Ok(item)
}

pub async fn delete(db: &PgPool, user_id: Uuid, item_id: Uuid) -> anyhow::Result<bool> {
    let done = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND user_id = $2")
        .bind(item_id)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(done.rows_affected() > 0)
}

pub async fn clear_tx(tx: &mut Transaction<'_, Postgres>, user_id: Uuid) -> anyhow::Result<()> {
    sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}
