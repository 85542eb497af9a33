use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub rating: i32,
    pub title: String,
    pub comment: String,
    pub images: Vec<String>,
    pub verified: bool,
    pub status: String,
    pub admin_response: String,
    pub created_at: OffsetDateTime,
}

const REVIEW_COLS: &str = "id, user_id, product_id, rating, title, comment, images, \
     verified, status, admin_response, created_at";

/// Review joined with the reviewer's display name and avatar.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ReviewWithUser {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub rating: i32,
    pub title: String,
    pub comment: String,
    pub images: Vec<String>,
    pub verified: bool,
    pub status: String,
    pub admin_response: String,
    pub created_at: OffsetDateTime,
    pub user_name: String,
    pub user_avatar: String,
    pub helpful_count: i64,
}

const REVIEW_USER_COLS: &str = "r.id, r.user_id, r.product_id, r.rating, r.title, r.comment, \
     r.images, r.verified, r.status, r.admin_response, r.created_at, \
     u.name AS user_name, u.avatar AS user_avatar, \
     (SELECT COUNT(*) FROM review_votes v
       WHERE v.review_id = r.id AND v.helpful) AS helpful_count";

pub struct NewReview {
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub rating: i32,
    pub title: String,
    pub comment: String,
    pub images: Vec<String>,
    pub verified: bool,
}

/// Sort orders accepted by the product review listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReviewSort {
    #[default]
    Newest,
    Oldest,
    Rating,
}

impl ReviewSort {
    pub fn parse(s: Option<&str>) -> Self {
        match s {
            Some("oldest") => Self::Oldest,
            Some("rating") => Self::Rating,
            _ => Self::Newest,
        }
    }

    pub fn order_by(self) -> &'static str {
        match self {
            Self::Newest => "r.created_at DESC",
            Self::Oldest => "r.created_at ASC",
            Self::Rating => "r.rating DESC, r.created_at DESC",
        }
    }
}

pub async fn exists(db: &PgPool, user_id: Uuid, product_id: Uuid) -> anyhow::Result<bool> {
    let (found,): (bool,) = sqlx::query_as(
        "SELECT EXISTS (SELECT 1 FROM reviews WHERE user_id = $1 AND product_id = $2)",
    )
    .bind(user_id)
    .bind(product_id)
    .fetch_one(db)
    .await?;
    Ok(found)
}

/// A review is verified when the user has a non-cancelled order containing
/// the product.
pub async fn has_purchased(db: &PgPool, user_id: Uuid, product_id: Uuid) -> anyhow::Result<bool> {
    let (found,): (bool,) = sqlx::query_as(
        "SELECT EXISTS (
            SELECT 1 FROM order_items oi
            JOIN orders o ON o.id = oi.order_id
            WHERE o.user_id = $1 AND oi.product_id = $2 AND o.status <> 'CANCELLED'
        )",
    )
    .bind(user_id)
    .bind(product_id)
    .fetch_one(db)
    .await?;
    Ok(found)
}

pub async fn insert_tx(tx: &mut Transaction<'_, Postgres>, r: &NewReview) -> anyhow::Result<Review> {
    let review = sqlx::query_as::<_, Review>(&format!(
        "INSERT INTO reviews (user_id, product_id, rating, title, comment, images, verified)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING {REVIEW_COLS}"
    ))
    .bind(r.user_id)
    .bind(r.product_id)
    .bind(r.rating)
    .bind(&r.title)
    .bind(&r.comment)
    .bind(&r.images)
    .bind(r.verified)
    .fetch_one(&mut **tx)
    .await?;
    Ok(review)
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Review>> {
    let review = sqlx::query_as::<_, Review>(&format!(
        "SELECT {REVIEW_COLS} FROM reviews WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(review)
}

pub async fn update_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    rating: i32,
    title: &str,
    comment: &str,
    images: &[String],
) -> anyhow::Result<Option<Review>> {
    let review = sqlx::query_as::<_, Review>(&format!(
        "UPDATE reviews SET rating = $2, title = $3, comment = $4, images = $5
         WHERE id = $1
         RETURNING {REVIEW_COLS}"
    ))
    .bind(id)
    .bind(rating)
    .bind(title)
    .bind(comment)
    .bind(images)
    .fetch_optional(&mut **tx)
    .await?;
    Ok(review)
}

pub async fn delete_tx(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> anyhow::Result<bool> {
    let done = sqlx::query("DELETE FROM reviews WHERE id = $1")
        .bind(id)
        .execute(&mut **tx)
        .await?;
    Ok(done.rows_affected() > 0)
}

pub async fn moderate_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    status: &str,
    admin_response: Option<&str>,
) -> anyhow::Result<Option<Review>> {
    let review = sqlx::query_as::<_, Review>(&format!(
        "UPDATE reviews SET status = $2, admin_response = COALESCE($3, admin_response)
         WHERE id = $1
         RETURNING {REVIEW_COLS}"
    ))
    .bind(id)
    .bind(status)
    .bind(admin_response)
    .fetch_optional(&mut **tx)
    .await?;
    Ok(review)
}

pub async fn list_for_product(
    db: &PgPool,
    product_id: Uuid,
    min_rating: Option<i32>,
    sort: ReviewSort,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<ReviewWithUser>> {
    let mut qb = QueryBuilder::<Postgres>::new(format!(
        "SELECT {REVIEW_USER_COLS}
         FROM reviews r JOIN users u ON u.id = r.user_id
         WHERE r.status = 'APPROVED' AND r.product_id = "
    ));
    qb.push_bind(product_id);
    if let Some(rating) = min_rating {
        qb.push(" AND r.rating = ").push_bind(rating);
    }
    qb.push(format!(" ORDER BY {} LIMIT ", sort.order_by()))
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
    let rows = qb.build_query_as::<ReviewWithUser>().fetch_all(db).await?;
    Ok(rows)
}

pub async fn count_for_product(
    db: &PgPool,
    product_id: Uuid,
    min_rating: Option<i32>,
) -> anyhow::Result<i64> {
    let mut qb = QueryBuilder::<Postgres>::new(
        "SELECT COUNT(*) FROM reviews WHERE status = 'APPROVED' AND product_id = ",
    );
    qb.push_bind(product_id);
    if let Some(rating) = min_rating {
        qb.push(" AND rating = ").push_bind(rating);
    }
    let (n,): (i64,) = qb.build_query_as().fetch_one(db).await?;
    Ok(n)
}

/// APPROVED review counts per star value for one product.
pub async fn rating_distribution(db: &PgPool, product_id: Uuid) -> anyhow::Result<Vec<(i32, i64)>> {
    let rows: Vec<(i32, i64)> = sqlx::query_as(
        "SELECT rating, COUNT(*) FROM reviews
         WHERE product_id = $1 AND status = 'APPROVED'
         GROUP BY rating",
    )
    .bind(product_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn list_for_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Review>> {
    let rows = sqlx::query_as::<_, Review>(&format!(
        "SELECT {REVIEW_COLS} FROM reviews WHERE user_id = $1 ORDER BY created_at DESC"
    ))
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

#[derive(Debug, Default)]
pub struct ReviewFilter {
    pub status: Option<String>,
    pub search: Option<String>,
}

fn apply_filters<'a>(qb: &mut QueryBuilder<'a, Postgres>, f: &'a ReviewFilter) {
    if let Some(status) = &f.status {
        qb.push(" AND r.status = ").push_bind(status);
    }
    if let Some(search) = &f.search {
        qb.push(" AND (r.title ILIKE '%' || ")
            .push_bind(search)
            .push(" || '%' OR r.comment ILIKE '%' || ")
            .push_bind(search)
            .push(" || '%')");
    }
}

pub async fn list_all(
    db: &PgPool,
    filter: &ReviewFilter,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<ReviewWithUser>> {
    let mut qb = QueryBuilder::<Postgres>::new(format!(
        "SELECT {REVIEW_USER_COLS}
         FROM reviews r JOIN users u ON u.id = r.user_id
         WHERE TRUE"
    ));
    apply_filters(&mut qb, filter);
    qb.push(" ORDER BY r.created_at DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
    let rows = qb.build_query_as::<ReviewWithUser>().fetch_all(db).await?;
    Ok(rows)
}

pub async fn count_all(db: &PgPool, filter: &ReviewFilter) -> anyhow::Result<i64> {
    let mut qb =
        QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM reviews r WHERE TRUE");
    apply_filters(&mut qb, filter);
    let (n,): (i64,) = qb.build_query_as().fetch_one(db).await?;
    Ok(n)
}

/// Mean of APPROVED ratings rounded to one decimal; 0 when none remain.
pub async fn recompute_product_rating_tx(
    tx: &mut Transaction<'_, Postgres>,
    product_id: Uuid,
) -> anyhow::Result<()> {
    sqlx::query(
        "UPDATE products SET rating = COALESCE(
            (SELECT ROUND(AVG(rating)::numeric, 1)
             FROM reviews WHERE product_id = $1 AND status = 'APPROVED')::float8,
            0)
         WHERE id = $1",
    )
    .bind(product_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// One vote per user per review; a repeat vote overwrites the previous one,
/// so voting `helpful = false` retracts an earlier helpful vote.
pub async fn upsert_helpful_vote(
    db: &PgPool,
    review_id: Uuid,
    user_id: Uuid,
    helpful: bool,
) -> anyhow::Result<()> {
    sqlx::query(
        "INSERT INTO review_votes (review_id, user_id, helpful)
         VALUES ($1, $2, $3)
         ON CONFLICT (review_id, user_id) DO UPDATE SET helpful = EXCLUDED.helpful",
    )
    .bind(review_id)
    .bind(user_id)
    .bind(helpful)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn helpful_count(db: &PgPool, review_id: Uuid) -> anyhow::Result<i64> {
    let (n,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM review_votes WHERE review_id = $1 AND helpful",
    )
    .bind(review_id)
    .fetch_one(db)
    .await?;
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seed_user(db: &PgPool, name: &str) -> Uuid {
        let (id,): (Uuid,) = sqlx::query_as(
            "INSERT INTO users (name, email, password_hash)
             VALUES ($1, $2, 'x') RETURNING id",
        )
        .bind(name)
        .bind(format!("{}@test.local", Uuid::new_v4()))
        .fetch_one(db)
        .await
        .unwrap();
        id
    }

    #[sqlx::test]
    async fn repeat_helpful_vote_overwrites_previous(pool: PgPool) {
        let author = seed_user(&pool, "Author").await;
        let voter = seed_user(&pool, "Voter").await;
        let (product,): (Uuid,) = sqlx::query_as(
            "INSERT INTO products (name, price, count_in_stock)
             VALUES ('Widget', 10.0, 5) RETURNING id",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        let (review,): (Uuid,) = sqlx::query_as(
            "INSERT INTO reviews (user_id, product_id, rating, title, comment)
             VALUES ($1, $2, 4, 'Solid', 'Does the job') RETURNING id",
        )
        .bind(author)
        .bind(product)
        .fetch_one(&pool)
        .await
        .unwrap();

        upsert_helpful_vote(&pool, review, voter, true).await.unwrap();
        assert_eq!(helpful_count(&pool, review).await.unwrap(), 1);

        // Voting again with the opposite value retracts the earlier vote.
        upsert_helpful_vote(&pool, review, voter, false).await.unwrap();
        assert_eq!(helpful_count(&pool, review).await.unwrap(), 0);

        upsert_helpful_vote(&pool, review, voter, true).await.unwrap();
        assert_eq!(helpful_count(&pool, review).await.unwrap(), 1);
    }

    #[test]
    fn sort_parsing_defaults_to_newest() {
        assert_eq!(ReviewSort::parse(None), ReviewSort::Newest);
        assert_eq!(ReviewSort::parse(Some("newest")), ReviewSort::Newest);
        assert_eq!(ReviewSort::parse(Some("oldest")), ReviewSort::Oldest);
        assert_eq!(ReviewSort::parse(Some("rating")), ReviewSort::Rating);
        assert_eq!(ReviewSort::parse(Some("garbage")), ReviewSort::Newest);
    }

    #[test]
    fn sort_order_clauses() {
        assert!(ReviewSort::Newest.order_by().contains("DESC"));
        assert!(ReviewSort::Oldest.order_by().contains("ASC"));
        assert!(ReviewSort::Rating.order_by().starts_with("r.rating"));
    }
}
