use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: String,
    pub phone: String,
    pub address_line1: String,
    pub address_line2: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub is_default: bool,
    pub address_type: String,
    pub created_at: OffsetDateTime,
}

const ADDRESS_COLS: &str = "id, user_id, full_name, phone, address_line1, address_line2, \
     city, state, postal_code, country, is_default, address_type, created_at";

pub struct NewAddress {
    pub full_name: String,
    pub phone: String,
    pub address_line1: String,
    pub address_line2: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub is_default: bool,
    pub address_type: String,
}

pub async fn clear_defaults_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
) -> anyhow::Result<()> {
    sqlx::query("UPDATE addresses SET is_default = FALSE WHERE user_id = $1 AND is_default")
        .bind(user_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

pub async fn insert_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    a: &NewAddress,
) -> anyhow::Result<Address> {
    let address = sqlx::query_as::<_, Address>(&format!(
        "INSERT INTO addresses
            (user_id, full_name, phone, address_line1, address_line2, city, state,
             postal_code, country, is_default, address_type)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
         RETURNING {ADDRESS_COLS}"
    ))
    .bind(user_id)
    .bind(&a.full_name)
    .bind(&a.phone)
    .bind(&a.address_line1)
    .bind(&a.address_line2)
    .bind(&a.city)
    .bind(&a.state)
    .bind(&a.postal_code)
    .bind(&a.country)
    .bind(a.is_default)
    .bind(&a.address_type)
    .fetch_one(&mut **tx)
    .await?;
    Ok(address)
}

pub async fn update_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    id: Uuid,
    a: &NewAddress,
) -> anyhow::Result<Option<Address>> {
    let address = sqlx::query_as::<_, Address>(&format!(
        "UPDATE addresses SET
            full_name = $3, phone = $4, address_line1 = $5, address_line2 = $6,
            city = $7, state = $8, postal_code = $9, country = $10,
            is_default = $11, address_type = $12
         WHERE id = $1 AND user_id = $2
         RETURNING {ADDRESS_COLS}"
    ))
    .bind(id)
    .bind(user_id)
    .bind(&a.full_name)
    .bind(&a.phone)
    .bind(&a.address_line1)
    .bind(&a.address_line2)
    .bind(&a.city)
    .bind(&a.state)
    .bind(&a.postal_code)
    .bind(&a.country)
    .bind(a.is_default)
    .bind(&a.address_type)
    .fetch_optional(&mut **tx)
    .await?;
    Ok(address)
}

pub async fn list(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Address>> {
    let rows = sqlx::query_as::<_, Address>(&format!(
        "SELECT {ADDRESS_COLS} FROM addresses
         WHERE user_id = $1
         ORDER BY is_default DESC, created_at DESC"
    ))
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn find_by_id(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<Option<Address>> {
    let address = sqlx::query_as::<_, Address>(&format!(
        "SELECT {ADDRESS_COLS} FROM addresses WHERE id = $1 AND user_id = $2"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(address)
}

/// Lookup without an ownership filter, used when rendering orders.
pub async fn find_any_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Address>> {
    let address = sqlx::query_as::<_, Address>(&format!(
        "SELECT {ADDRESS_COLS} FROM addresses WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(address)
}

pub async fn find_default(db: &PgPool, user_id: Uuid) -> anyhow::Result<Option<Address>> {
    let address = sqlx::query_as::<_, Address>(&format!(
        "SELECT {ADDRESS_COLS} FROM addresses WHERE user_id = $1 AND is_default"
    ))
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(address)
}

pub async fn set_default_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    id: Uuid,
) -> anyhow::Result<Option<Address>> {
    let address = sqlx::query_as::<_, Address>(&format!(
        "UPDATE addresses SET is_default = TRUE
         WHERE id = $1 AND user_id = $2
         RETURNING {ADDRESS_COLS}"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(&mut **tx)
    .await?;
    Ok(address)
}

pub async fn delete_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    id: Uuid,
) -> anyhow::Result<bool> {
    let done = sqlx::query("DELETE FROM addresses WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(&mut **tx)
        .await?;
    Ok(done.rows_affected() > 0)
}

/// Makes the newest remaining address the default after the default was
/// removed. No-op when the user has no addresses left.
pub async fn promote_newest_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
) -> anyhow::Result<()> {
    sqlx::query(
        "UPDATE addresses SET is_default = TRUE
         WHERE id = (
             SELECT id FROM addresses WHERE user_id = $1
             ORDER BY created_at DESC LIMIT 1
         )",
    )
    .bind(user_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(full_name: &str, is_default: bool) -> NewAddress {
        NewAddress {
            full_name: full_name.into(),
            phone: "555-0100".into(),
            address_line1: "1 Main St".into(),
            address_line2: String::new(),
            city: "Metropolis".into(),
            state: "NY".into(),
            postal_code: "10001".into(),
            country: "US".into(),
            is_default,
            address_type: "HOME".into(),
        }
    }

    // An address that appears on an order can still be deleted; the order
    // keeps its row with a NULL reference and the remaining address becomes
    // the default.
    #[sqlx::test]
    async fn deleting_ordered_default_promotes_remaining(pool: PgPool) {
        let (user,): (Uuid,) = sqlx::query_as(
            "INSERT INTO users (name, email, password_hash)
             VALUES ('Test Buyer', 'buyer@test.local', 'x') RETURNING id",
        )
        .fetch_one(&pool)
        .await
        .unwrap();

        let mut tx = pool.begin().await.unwrap();
        let first = insert_tx(&mut tx, user, &sample("First", true)).await.unwrap();
        let second = insert_tx(&mut tx, user, &sample("Second", false))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let (order,): (Uuid,) = sqlx::query_as(
            "INSERT INTO orders (user_id, shipping_address_id) VALUES ($1, $2) RETURNING id",
        )
        .bind(user)
        .bind(first.id)
        .fetch_one(&pool)
        .await
        .unwrap();

        let mut tx = pool.begin().await.unwrap();
        assert!(delete_tx(&mut tx, user, first.id).await.unwrap());
        promote_newest_tx(&mut tx, user).await.unwrap();
        tx.commit().await.unwrap();

        let (shipping,): (Option<Uuid>,) =
            sqlx::query_as("SELECT shipping_address_id FROM orders WHERE id = $1")
                .bind(order)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(shipping, None);

        let default = find_default(&pool, user).await.unwrap().unwrap();
        assert_eq!(default.id, second.id);
    }
}
