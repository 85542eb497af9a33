use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SubCategory {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub category_id: Uuid,
    pub image: String,
    pub is_active: bool,
    pub sort_order: i32,
    pub meta_title: String,
    pub meta_description: String,
    pub created_at: OffsetDateTime,
}

const SUBCATEGORY_COLS: &str = "id, name, description, category_id, image, is_active, \
     sort_order, meta_title, meta_description, created_at";

pub struct NewSubCategory {
    pub name: String,
    pub description: String,
    pub category_id: Uuid,
    pub image: String,
    pub is_active: bool,
    pub sort_order: i32,
    pub meta_title: String,
    pub meta_description: String,
}

#[derive(Debug, Default)]
pub struct SubCategoryFilter {
    pub search: Option<String>,
    pub category_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

fn apply_filters<'a>(qb: &mut QueryBuilder<'a, Postgres>, f: &'a SubCategoryFilter) {
    if let Some(search) = &f.search {
        qb.push(" AND name ILIKE '%' || ")
            .push_bind(search)
            .push(" || '%'");
    }
    if let Some(category_id) = &f.category_id {
        qb.push(" AND category_id = ").push_bind(category_id);
    }
    if let Some(is_active) = &f.is_active {
        qb.push(" AND is_active = ").push_bind(is_active);
    }
}

pub async fn list(
    db: &PgPool,
    filter: &SubCategoryFilter,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<SubCategory>> {
    let mut qb = QueryBuilder::<Postgres>::new(format!(
        "SELECT {SUBCATEGORY_COLS} FROM subcategories WHERE TRUE"
    ));
    apply_filters(&mut qb, filter);
    qb.push(" ORDER BY created_at DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
    let rows = qb.build_query_as::<SubCategory>().fetch_all(db).await?;
    Ok(rows)
}

pub async fn count(db: &PgPool, filter: &SubCategoryFilter) -> anyhow::Result<i64> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM subcategories WHERE TRUE");
    apply_filters(&mut qb, filter);
    let (n,): (i64,) = qb.build_query_as().fetch_one(db).await?;
    Ok(n)
}

pub async fn list_by_category(db: &PgPool, category_id: Uuid) -> anyhow::Result<Vec<SubCategory>> {
    let rows = sqlx::query_as::<_, SubCategory>(&format!(
        "SELECT {SUBCATEGORY_COLS} FROM subcategories
         WHERE category_id = $1 AND is_active
         ORDER BY sort_order, name"
    ))
    .bind(category_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<SubCategory>> {
    let row = sqlx::query_as::<_, SubCategory>(&format!(
        "SELECT {SUBCATEGORY_COLS} FROM subcategories WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// Case-insensitive name check within one category, optionally excluding a
/// row (for updates).
pub async fn name_taken(
    db: &PgPool,
    category_id: Uuid,
    name: &str,
    exclude: Option<Uuid>,
) -> anyhow::Result<bool> {
    let (taken,): (bool,) = sqlx::query_as(
        "SELECT EXISTS (
            SELECT 1 FROM subcategories
            WHERE category_id = $1 AND LOWER(name) = LOWER($2)
              AND ($3::uuid IS NULL OR id <> $3)
        )",
    )
    .bind(category_id)
    .bind(name)
    .bind(exclude)
    .fetch_one(db)
    .await?;
    Ok(taken)
}

pub async fn insert(db: &PgPool, s: &NewSubCategory) -> anyhow::Result<SubCategory> {
    let row = sqlx::query_as::<_, SubCategory>(&format!(
        "INSERT INTO subcategories
            (name, description, category_id, image, is_active, sort_order,
             meta_title, meta_description)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         RETURNING {SUBCATEGORY_COLS}"
    ))
    .bind(&s.name)
    .bind(&s.description)
    .bind(s.category_id)
    .bind(&s.image)
    .bind(s.is_active)
    .bind(s.sort_order)
    .bind(&s.meta_title)
    .bind(&s.meta_description)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn update(db: &PgPool, id: Uuid, s: &NewSubCategory) -> anyhow::Result<Option<SubCategory>> {
    let row = sqlx::query_as::<_, SubCategory>(&format!(
        "UPDATE subcategories SET
            name = $2, description = $3, category_id = $4, image = $5, is_active = $6,
            sort_order = $7, meta_title = $8, meta_description = $9
         WHERE id = $1
         RETURNING {SUBCATEGORY_COLS}"
    ))
    .bind(id)
    .bind(&s.name)
    .bind(&s.description)
    .bind(s.category_id)
    .bind(&s.image)
    .bind(s.is_active)
    .bind(s.sort_order)
    .bind(&s.meta_title)
    .bind(&s.meta_description)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let done = sqlx::query("DELETE FROM subcategories WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(done.rows_affected() > 0)
}

/// Products reference subcategories by their textual id snapshot.
pub async fn product_reference_count(db: &PgPool, id: Uuid) -> anyhow::Result<i64> {
    let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products WHERE sub_cat_id = $1")
        .bind(id.to_string())
        .fetch_one(db)
        .await?;
    Ok(n)
}
