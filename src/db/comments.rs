use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::db::identity::resolve_user_id;
use crate::error::AppError;
use crate::models::{Comment, DbComment};

#[instrument(skip(pool, comment))]
pub async fn add_comment(
    pool: &Pool<Sqlite>,
    username: &str,
    course_id: i64,
    comment: &str,
) -> Result<i64, AppError> {
    info!("Adding comment");
    let user_id = resolve_user_id(pool, username).await?;

    let res = sqlx::query("INSERT INTO comments (user_id, course_id, comment) VALUES (?, ?, ?)")
        .bind(user_id)
        .bind(course_id)
        .bind(comment)
        .execute(pool)
        .await?;

    Ok(res.last_insert_rowid())
}

#[instrument]
pub async fn comment_exists(
    pool: &Pool<Sqlite>,
    user_id: i64,
    course_id: i64,
) -> Result<bool, AppError> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE user_id = ? AND course_id = ?")
            .bind(user_id)
            .bind(course_id)
            .fetch_one(pool)
            .await?;

    Ok(count > 0)
}

#[instrument]
pub async fn get_comments(pool: &Pool<Sqlite>, course_id: i64) -> Result<Vec<Comment>, AppError> {
    info!("Fetching comments for course");
    let rows = sqlx::query_as::<_, DbComment>("SELECT * FROM comments WHERE course_id = ?")
        .bind(course_id)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(Comment::from).collect())
}

/// Deletes a comment after confirming the user has commented on the course
/// at all. Returns false when there was nothing to delete.
#[instrument]
pub async fn delete_comment(
    pool: &Pool<Sqlite>,
    comment_id: i64,
    username: &str,
    course_id: i64,
) -> Result<bool, AppError> {
    info!("Deleting comment");
    let user_id = resolve_user_id(pool, username).await?;

    if !comment_exists(pool, user_id, course_id).await? {
        return Ok(false);
    }

    let res = sqlx::query("DELETE FROM comments WHERE id = ?")
        .bind(comment_id)
        .execute(pool)
        .await?;

    Ok(res.rows_affected() > 0)
}
