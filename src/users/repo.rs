use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub avatar: String,
    pub mobile: Option<String>,
    #[serde(skip_serializing)]
    pub refresh_token: String,
    pub verify_email: bool,
    pub last_login_date: Option<OffsetDateTime>,
    pub status: String,
    pub role: String,
    #[serde(skip_serializing)]
    pub otp: Option<String>,
    #[serde(skip_serializing)]
    pub otp_expiry: Option<OffsetDateTime>,
    #[serde(skip_serializing)]
    pub forgot_password_otp: Option<String>,
    #[serde(skip_serializing)]
    pub forgot_password_expiry: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

const USER_COLS: &str = "id, name, email, password_hash, avatar, mobile, refresh_token, \
     verify_email, last_login_date, status, role, otp, otp_expiry, \
     forgot_password_otp, forgot_password_expiry, created_at";

impl User {
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_otp(db: &PgPool, otp: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLS} FROM users WHERE otp = $1"
        ))
        .bind(otp)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn create(
        db: &PgPool,
        name: &str,
        email: &str,
        password_hash: &str,
        otp: &str,
        otp_expiry: OffsetDateTime,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (name, email, password_hash, otp, otp_expiry)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {USER_COLS}"
        ))
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(otp)
        .bind(otp_expiry)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    pub async fn set_refresh_token(db: &PgPool, id: Uuid, token: &str) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET refresh_token = $2 WHERE id = $1")
            .bind(id)
            .bind(token)
            .execute(db)
            .await?;
        Ok(())
    }

    pub async fn mark_verified(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE users SET verify_email = TRUE, otp = NULL, otp_expiry = NULL WHERE id = $1",
        )
        .bind(id)
        .execute(db)
        .await?;
        Ok(())
    }

    pub async fn stamp_login(db: &PgPool, id: Uuid, refresh_token: &str) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET last_login_date = now(), refresh_token = $2 WHERE id = $1")
            .bind(id)
            .bind(refresh_token)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Profile update. A changed email resets verification and arms a new OTP.
    #[allow(clippy::too_many_arguments)]
    pub async fn update_profile(
        db: &PgPool,
        id: Uuid,
        name: &str,
        email: &str,
        mobile: Option<&str>,
        password_hash: &str,
        verify_email: bool,
        otp: Option<&str>,
        otp_expiry: Option<OffsetDateTime>,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users
                SET name = $2, email = $3, mobile = $4, password_hash = $5,
                    verify_email = $6, otp = COALESCE($7, otp),
                    otp_expiry = COALESCE($8, otp_expiry)
              WHERE id = $1
              RETURNING {USER_COLS}"
        ))
        .bind(id)
        .bind(name)
        .bind(email)
        .bind(mobile)
        .bind(password_hash)
        .bind(verify_email)
        .bind(otp)
        .bind(otp_expiry)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    pub async fn set_forgot_otp(
        db: &PgPool,
        id: Uuid,
        otp: &str,
        expiry: OffsetDateTime,
    ) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE users SET forgot_password_otp = $2, forgot_password_expiry = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(otp)
        .bind(expiry)
        .execute(db)
        .await?;
        Ok(())
    }

    pub async fn clear_forgot_otp(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE users SET forgot_password_otp = NULL, forgot_password_expiry = NULL WHERE id = $1",
        )
        .bind(id)
        .execute(db)
        .await?;
        Ok(())
    }

    pub async fn set_password(db: &PgPool, id: Uuid, password_hash: &str) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(db)
            .await?;
        Ok(())
    }

    pub async fn set_avatar(db: &PgPool, id: Uuid, avatar_url: &str) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET avatar = $2 WHERE id = $1")
            .bind(id)
            .bind(avatar_url)
            .execute(db)
            .await?;
        Ok(())
    }
}
