use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub brand: String,
    pub images: Vec<String>,
    pub price: f64,
    pub old_price: f64,
    pub category_id: Option<Uuid>,
    pub cat_name: String,
    pub cat_id: String,
    pub sub_cat_id: String,
    pub sub_cat_name: String,
    pub third_sub_cat_id: String,
    pub third_sub_cat_name: String,
    pub count_in_stock: i32,
    pub rating: f64,
    pub is_featured: bool,
    pub discount: f64,
    pub product_ram: Vec<String>,
    pub size: Vec<String>,
    pub product_weight: f64,
    pub location: String,
    pub created_at: OffsetDateTime,
}

const PRODUCT_COLS: &str = "id, name, description, brand, images, price, old_price, category_id, \
     cat_name, cat_id, sub_cat_id, sub_cat_name, third_sub_cat_id, third_sub_cat_name, \
     count_in_stock, rating, is_featured, discount, product_ram, size, product_weight, \
     location, created_at";

/// Listing filters; every field is optional and ANDed together.
#[derive(Debug, Default)]
pub struct ProductFilter {
    pub location: Option<String>,
    pub category_id: Option<Uuid>,
    pub cat_name: Option<String>,
    pub sub_cat_id: Option<String>,
    pub sub_cat_name: Option<String>,
    pub third_sub_cat_id: Option<String>,
    pub third_sub_cat_name: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub is_featured: Option<bool>,
    pub min_rating: Option<f64>,
}

fn apply_filters<'a>(qb: &mut QueryBuilder<'a, Postgres>, f: &'a ProductFilter) {
    if let Some(location) = &f.location {
        if location != "All" {
            qb.push(" AND location = ").push_bind(location);
        }
    }
    if let Some(category_id) = &f.category_id {
        qb.push(" AND category_id = ").push_bind(category_id);
    }
    if let Some(cat_name) = &f.cat_name {
        qb.push(" AND cat_name ILIKE ").push_bind(cat_name);
    }
    if let Some(sub_cat_id) = &f.sub_cat_id {
        qb.push(" AND sub_cat_id = ").push_bind(sub_cat_id);
    }
    if let Some(sub_cat_name) = &f.sub_cat_name {
        qb.push(" AND sub_cat_name ILIKE ").push_bind(sub_cat_name);
    }
    if let Some(third_sub_cat_id) = &f.third_sub_cat_id {
        qb.push(" AND third_sub_cat_id = ").push_bind(third_sub_cat_id);
    }
    if let Some(third_sub_cat_name) = &f.third_sub_cat_name {
        qb.push(" AND third_sub_cat_name ILIKE ")
            .push_bind(third_sub_cat_name);
    }
    if let Some(min_price) = &f.min_price {
        qb.push(" AND price >= ").push_bind(min_price);
    }
    if let Some(max_price) = &f.max_price {
        qb.push(" AND price <= ").push_bind(max_price);
    }
    if let Some(is_featured) = &f.is_featured {
        qb.push(" AND is_featured = ").push_bind(is_featured);
    }
    if let Some(min_rating) = &f.min_rating {
        qb.push(" AND rating >= ").push_bind(min_rating);
    }
}

pub async fn list(
    db: &PgPool,
    filter: &ProductFilter,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<Product>> {
    let mut qb = QueryBuilder::<Postgres>::new(format!(
        "SELECT {PRODUCT_COLS} FROM products WHERE TRUE"
    ));
    apply_filters(&mut qb, filter);
    qb.push(" ORDER BY created_at DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
    let rows = qb.build_query_as::<Product>().fetch_all(db).await?;
    Ok(rows)
}

pub async fn count(db: &PgPool, filter: &ProductFilter) -> anyhow::Result<i64> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products WHERE TRUE");
    apply_filters(&mut qb, filter);
    let (n,): (i64,) = qb.build_query_as().fetch_one(db).await?;
    Ok(n)
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLS} FROM products WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(product)
}

pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub brand: String,
    pub images: Vec<String>,
    pub price: f64,
    pub old_price: f64,
    pub category_id: Uuid,
    pub cat_name: String,
    pub cat_id: String,
    pub sub_cat_id: String,
    pub sub_cat_name: String,
    pub third_sub_cat_id: String,
    pub third_sub_cat_name: String,
    pub count_in_stock: i32,
    pub is_featured: bool,
    pub discount: f64,
    pub product_ram: Vec<String>,
    pub size: Vec<String>,
    pub product_weight: f64,
    pub location: String,
}

pub async fn insert(db: &PgPool, p: &NewProduct) -> anyhow::Result<Product> {
    let product = sqlx::query_as::<_, Product>(&format!(
        "INSERT INTO products
            (name, description, brand, images, price, old_price, category_id, cat_name, cat_id,
             sub_cat_id, sub_cat_name, third_sub_cat_id, third_sub_cat_name, count_in_stock,
             is_featured, discount, product_ram, size, product_weight, location)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                 $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
         RETURNING {PRODUCT_COLS}"
    ))
    .bind(&p.name)
    .bind(&p.description)
    .bind(&p.brand)
    .bind(&p.images)
    .bind(p.price)
    .bind(p.old_price)
    .bind(p.category_id)
    .bind(&p.cat_name)
    .bind(&p.cat_id)
    .bind(&p.sub_cat_id)
    .bind(&p.sub_cat_name)
    .bind(&p.third_sub_cat_id)
    .bind(&p.third_sub_cat_name)
    .bind(p.count_in_stock)
    .bind(p.is_featured)
    .bind(p.discount)
    .bind(&p.product_ram)
    .bind(&p.size)
    .bind(p.product_weight)
    .bind(&p.location)
    .fetch_one(db)
    .await?;
    Ok(product)
}

pub async fn update(db: &PgPool, id: Uuid, p: &NewProduct) -> anyhow::Result<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(&format!(
        "UPDATE products SET
            name = $2, description = $3, brand = $4, images = $5, price = $6, old_price = $7,
            category_id = $8, cat_name = $9, cat_id = $10, sub_cat_id = $11, sub_cat_name = $12,
            third_sub_cat_id = $13, third_sub_cat_name = $14, count_in_stock = $15,
            is_featured = $16, discount = $17, product_ram = $18, size = $19,
            product_weight = $20, location = $21
         WHERE id = $1
         RETURNING {PRODUCT_COLS}"
    ))
    .bind(id)
    .bind(&p.name)
    .bind(&p.description)
    .bind(&p.brand)
    .bind(&p.images)
    .bind(p.price)
    .bind(p.old_price)
    .bind(p.category_id)
    .bind(&p.cat_name)
    .bind(&p.cat_id)
    .bind(&p.sub_cat_id)
    .bind(&p.sub_cat_name)
    .bind(&p.third_sub_cat_id)
    .bind(&p.third_sub_cat_name)
    .bind(p.count_in_stock)
    .bind(p.is_featured)
    .bind(p.discount)
    .bind(&p.product_ram)
    .bind(&p.size)
    .bind(p.product_weight)
    .bind(&p.location)
    .fetch_optional(db)
    .await?;
    Ok(product)
}

pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let done = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(done.rows_affected() > 0)
}

pub async fn count_all(db: &PgPool) -> anyhow::Result<i64> {
    let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
        .fetch_one(db)
        .await?;
    Ok(n)
}

pub async fn list_featured(db: &PgPool, limit: i64) -> anyhow::Result<Vec<Product>> {
    let rows = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLS} FROM products WHERE is_featured ORDER BY created_at DESC LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn count(db: &PgPool, sql: &str, id: Uuid) -> i64 {
        let (n,): (i64,) = sqlx::query_as(sql).bind(id).fetch_one(db).await.unwrap();
        n
    }

    // A product in carts, wishlists and reviews can still be deleted; those
    // rows go with it, while order history keeps its lines with a NULL
    // product reference.
    #[sqlx::test]
    async fn delete_cleans_dependents_and_keeps_order_history(pool: PgPool) {
        let (user,): (Uuid,) = sqlx::query_as(
            "INSERT INTO users (name, email, password_hash)
             VALUES ('Test Buyer', 'buyer@test.local', 'x') RETURNING id",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        let (product,): (Uuid,) = sqlx::query_as(
            "INSERT INTO products (name, price, count_in_stock)
             VALUES ('Widget', 10.0, 5) RETURNING id",
        )
        .fetch_one(&pool)
        .await
        .unwrap();

        sqlx::query("INSERT INTO cart_items (user_id, product_id) VALUES ($1, $2)")
            .bind(user)
            .bind(product)
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO mylist_items (user_id, product_id, product_title, image, rating, price)
             VALUES ($1, $2, 'Widget', '', 0, 10.0)",
        )
        .bind(user)
        .bind(product)
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO reviews (user_id, product_id, rating, title, comment)
             VALUES ($1, $2, 4, 'Solid', 'Does the job')",
        )
        .bind(user)
        .bind(product)
        .execute(&pool)
        .await
        .unwrap();
        let (order,): (Uuid,) =
            sqlx::query_as("INSERT INTO orders (user_id) VALUES ($1) RETURNING id")
                .bind(user)
                .fetch_one(&pool)
                .await
                .unwrap();
        sqlx::query(
            "INSERT INTO order_items (order_id, product_id, quantity, price, total_price)
             VALUES ($1, $2, 1, 10.0, 10.0)",
        )
        .bind(order)
        .bind(product)
        .execute(&pool)
        .await
        .unwrap();

        assert!(delete(&pool, product).await.unwrap());

        let q = "SELECT COUNT(*) FROM cart_items WHERE user_id = $1";
        assert_eq!(count(&pool, q, user).await, 0);
        let q = "SELECT COUNT(*) FROM mylist_items WHERE user_id = $1";
        assert_eq!(count(&pool, q, user).await, 0);
        let q = "SELECT COUNT(*) FROM reviews WHERE user_id = $1";
        assert_eq!(count(&pool, q, user).await, 0);

        let (kept,): (Option<Uuid>,) =
            sqlx::query_as("SELECT product_id FROM order_items WHERE order_id = $1")
                .bind(order)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(kept, None);
    }
}
