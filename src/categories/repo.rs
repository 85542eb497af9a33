use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub images: Vec<String>,
    pub color: String,
    pub parent_id: Option<Uuid>,
    pub parent_cat_name: String,
    pub is_active: bool,
    pub sort_order: i32,
    pub sub_category_count: i32,
    pub created_at: OffsetDateTime,
}

const CATEGORY_COLS: &str = "id, name, images, color, parent_id, parent_cat_name, \
     is_active, sort_order, sub_category_count, created_at";

pub struct NewCategory {
    pub name: String,
    pub images: Vec<String>,
    pub color: String,
    pub parent_id: Option<Uuid>,
    pub parent_cat_name: String,
    pub is_active: bool,
    pub sort_order: i32,
}

pub async fn insert(db: &PgPool, c: &NewCategory) -> anyhow::Result<Category> {
    let category = sqlx::query_as::<_, Category>(&format!(
        "INSERT INTO categories
            (name, images, color, parent_id, parent_cat_name, is_active, sort_order)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING {CATEGORY_COLS}"
    ))
    .bind(&c.name)
    .bind(&c.images)
    .bind(&c.color)
    .bind(c.parent_id)
    .bind(&c.parent_cat_name)
    .bind(c.is_active)
    .bind(c.sort_order)
    .fetch_one(db)
    .await?;
    Ok(category)
}

pub async fn update(db: &PgPool, id: Uuid, c: &NewCategory) -> anyhow::Result<Option<Category>> {
    let category = sqlx::query_as::<_, Category>(&format!(
        "UPDATE categories SET
            name = $2, images = $3, color = $4, parent_id = $5, parent_cat_name = $6,
            is_active = $7, sort_order = $8
         WHERE id = $1
         RETURNING {CATEGORY_COLS}"
    ))
    .bind(id)
    .bind(&c.name)
    .bind(&c.images)
    .bind(&c.color)
    .bind(c.parent_id)
    .bind(&c.parent_cat_name)
    .bind(c.is_active)
    .bind(c.sort_order)
    .fetch_optional(db)
    .await?;
    Ok(category)
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Category>> {
    let category = sqlx::query_as::<_, Category>(&format!(
        "SELECT {CATEGORY_COLS} FROM categories WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(category)
}

/// One scan, ordered so the tree builder sees parents in a stable order.
pub async fn list_all(db: &PgPool) -> anyhow::Result<Vec<Category>> {
    let rows = sqlx::query_as::<_, Category>(&format!(
        "SELECT {CATEGORY_COLS} FROM categories ORDER BY sort_order, name"
    ))
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn list_children(db: &PgPool, parent_id: Uuid) -> anyhow::Result<Vec<Category>> {
    let rows = sqlx::query_as::<_, Category>(&format!(
        "SELECT {CATEGORY_COLS} FROM categories WHERE parent_id = $1 ORDER BY sort_order, name"
    ))
    .bind(parent_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn root_count(db: &PgPool) -> anyhow::Result<i64> {
    let (n,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM categories WHERE parent_id IS NULL")
            .fetch_one(db)
            .await?;
    Ok(n)
}

pub async fn sub_count(db: &PgPool) -> anyhow::Result<i64> {
    let (n,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM categories WHERE parent_id IS NOT NULL")
            .fetch_one(db)
            .await?;
    Ok(n)
}

/// Deletes the category inside the caller's transaction; descendants at any
/// depth follow through the parent_id cascade. Remote image cleanup happens
/// before this is called.
pub async fn delete_with_children_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> anyhow::Result<bool> {
    let done = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(&mut **tx)
        .await?;
    Ok(done.rows_affected() > 0)
}

pub async fn adjust_sub_category_count(
    db: &PgPool,
    id: Uuid,
    delta: i32,
) -> anyhow::Result<()> {
    sqlx::query(
        "UPDATE categories
         SET sub_category_count = GREATEST(sub_category_count + $2, 0)
         WHERE id = $1",
    )
    .bind(id)
    .bind(delta)
    .execute(db)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seed(db: &PgPool, name: &str, parent: Option<Uuid>) -> Uuid {
        let (id,): (Uuid,) = sqlx::query_as(
            "INSERT INTO categories (name, parent_id) VALUES ($1, $2) RETURNING id",
        )
        .bind(name)
        .bind(parent)
        .fetch_one(db)
        .await
        .unwrap();
        id
    }

    #[sqlx::test]
    async fn delete_reaches_grandchildren(pool: PgPool) {
        let root = seed(&pool, "Electronics", None).await;
        let child = seed(&pool, "Phones", Some(root)).await;
        seed(&pool, "Android", Some(child)).await;
        let other = seed(&pool, "Furniture", None).await;

        let mut tx = pool.begin().await.unwrap();
        assert!(delete_with_children_tx(&mut tx, root).await.unwrap());
        tx.commit().await.unwrap();

        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM categories")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(n, 1);
        assert!(find_by_id(&pool, other).await.unwrap().is_some());
    }
}
