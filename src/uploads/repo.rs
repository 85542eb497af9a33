use anyhow::Context;
use sqlx::PgPool;

/// Remember the object-store key behind a hosted URL. Deletion later looks
/// the key up here instead of re-deriving it from the URL.
pub async fn insert_uploaded_image(db: &PgPool, url: &str, key: &str) -> anyhow::Result<()> {
    sqlx::query(
        "INSERT INTO uploaded_images (url, object_key) VALUES ($1, $2)
         ON CONFLICT (url) DO UPDATE SET object_key = EXCLUDED.object_key",
    )
    .bind(url)
    .bind(key)
    .execute(db)
    .await
    .context("insert uploaded image")?;
    Ok(())
}

pub async fn find_key_by_url(db: &PgPool, url: &str) -> anyhow::Result<Option<String>> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT object_key FROM uploaded_images WHERE url = $1")
            .bind(url)
            .fetch_optional(db)
            .await
            .context("find uploaded image key")?;
    Ok(row.map(|(k,)| k))
}

pub async fn delete_by_url(db: &PgPool, url: &str) -> anyhow::Result<bool> {
    let done = sqlx::query("DELETE FROM uploaded_images WHERE url = $1")
        .bind(url)
        .execute(db)
        .await
        .context("delete uploaded image")?;
    Ok(done.rows_affected() > 0)
}
