use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::error::AppError;

/// Maps a user-facing username to the internal numeric id. Every write path
/// resolves through here first; no separate existence probe is needed.
#[instrument]
pub async fn resolve_user_id(pool: &Pool<Sqlite>, username: &str) -> Result<i64, AppError> {
    info!("Resolving username to user id");
    let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(pool)
        .await?;

    match row {
        Some((id,)) => Ok(id),
        _ => Err(AppError::IdentityNotFound(username.to_string())),
    }
}

#[instrument]
pub async fn user_exists_by_id(pool: &Pool<Sqlite>, user_id: i64) -> Result<bool, AppError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await?;

    Ok(count > 0)
}

#[instrument]
pub async fn user_exists_by_username(
    pool: &Pool<Sqlite>,
    username: &str,
) -> Result<bool, AppError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = ?")
        .bind(username)
        .fetch_one(pool)
        .await?;

    Ok(count > 0)
}

#[instrument]
pub async fn user_exists_by_email(pool: &Pool<Sqlite>, email: &str) -> Result<bool, AppError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = ?")
        .bind(email)
        .fetch_one(pool)
        .await?;

    Ok(count > 0)
}
