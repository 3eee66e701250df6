use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::db::identity::resolve_user_id;
use crate::error::AppError;
use crate::models::{DbSession, Session};

/// Inserts a session for a course. Callers are expected to have verified the
/// course id already; this function does not re-check it.
#[instrument(skip(pool))]
pub async fn create_session(
    pool: &Pool<Sqlite>,
    course_id: i64,
    start_time: &str,
    end_time: &str,
    owner_username: &str,
) -> Result<i64, AppError> {
    info!("Creating session");
    let user_id = resolve_user_id(pool, owner_username).await?;

    let res = sqlx::query(
        "INSERT INTO sessions (course_id, start_time, end_time, user_id) VALUES (?, ?, ?, ?)",
    )
    .bind(course_id)
    .bind(start_time)
    .bind(end_time)
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(res.last_insert_rowid())
}

/// Returns the affected row count; 0 means the id didn't match anything,
/// which callers treat as not-found rather than an error.
#[instrument(skip(pool))]
pub async fn update_session(
    pool: &Pool<Sqlite>,
    session_id: i64,
    course_id: i64,
    start_time: &str,
    end_time: &str,
) -> Result<u64, AppError> {
    info!("Updating session");
    let res = sqlx::query(
        "UPDATE sessions SET course_id = ?, start_time = ?, end_time = ? WHERE id = ?",
    )
    .bind(course_id)
    .bind(start_time)
    .bind(end_time)
    .bind(session_id)
    .execute(pool)
    .await?;

    Ok(res.rows_affected())
}

#[instrument]
pub async fn session_exists(pool: &Pool<Sqlite>, session_id: i64) -> Result<bool, AppError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions WHERE id = ?")
        .bind(session_id)
        .fetch_one(pool)
        .await?;

    Ok(count > 0)
}

#[instrument]
pub async fn get_sessions_by_course(
    pool: &Pool<Sqlite>,
    course_id: i64,
) -> Result<Vec<Session>, AppError> {
    info!("Fetching sessions for course");
    let rows = sqlx::query_as::<_, DbSession>("SELECT * FROM sessions WHERE course_id = ?")
        .bind(course_id)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(Session::from).collect())
}

#[instrument]
pub async fn delete_session_by_id(pool: &Pool<Sqlite>, session_id: i64) -> Result<u64, AppError> {
    info!("Deleting session");
    let res = sqlx::query("DELETE FROM sessions WHERE id = ?")
        .bind(session_id)
        .execute(pool)
        .await?;

    Ok(res.rows_affected())
}
