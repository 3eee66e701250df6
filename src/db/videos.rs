use chrono::Utc;
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::db::identity::resolve_user_id;
use crate::error::AppError;
use crate::models::{DbVideo, Video};

#[instrument]
pub async fn get_video(pool: &Pool<Sqlite>, video_id: i64) -> Result<Video, AppError> {
    info!("Fetching video");
    let row = sqlx::query_as::<_, DbVideo>("SELECT * FROM videos WHERE id = ?")
        .bind(video_id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(video) => Ok(Video::from(video)),
        _ => Err(AppError::NotFound(format!(
            "Video with id {} not found in database",
            video_id
        ))),
    }
}

#[instrument]
pub async fn video_exists(pool: &Pool<Sqlite>, video_id: i64) -> Result<bool, AppError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM videos WHERE id = ?")
        .bind(video_id)
        .fetch_one(pool)
        .await?;

    Ok(count > 0)
}

/// The URL stored on the course's placeholder video row, shown on the course
/// page.
#[instrument]
pub async fn get_course_video_url(
    pool: &Pool<Sqlite>,
    course_id: i64,
) -> Result<String, AppError> {
    info!("Fetching course video URL");
    let video_id: Option<(i64,)> = sqlx::query_as("SELECT video_id FROM courses WHERE id = ?")
        .bind(course_id)
        .fetch_optional(pool)
        .await?;

    let Some((video_id,)) = video_id else {
        return Err(AppError::CourseNotFound(course_id));
    };

    let url: Option<(String,)> = sqlx::query_as("SELECT url FROM videos WHERE id = ?")
        .bind(video_id)
        .fetch_optional(pool)
        .await?;

    match url {
        Some((url,)) => Ok(url),
        _ => Err(AppError::NotFound(format!(
            "Video with id {} not found in database",
            video_id
        ))),
    }
}

/// Attaches an upload to the uploader's first session. Users without any
/// session cannot upload.
#[instrument(skip(pool))]
pub async fn upload_video(
    pool: &Pool<Sqlite>,
    username: &str,
    title: &str,
    url: &str,
    duration: &str,
    description: &str,
) -> Result<i64, AppError> {
    info!("Uploading video");
    let user_id = resolve_user_id(pool, username).await?;

    let session: Option<(i64,)> = sqlx::query_as("SELECT id FROM sessions WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    let Some((session_id,)) = session else {
        return Err(AppError::NotFound(format!(
            "No session found for user '{}'",
            username
        )));
    };

    let upload_date = Utc::now().naive_utc();

    let res = sqlx::query(
        "INSERT INTO videos (session_id, title, url, duration, description, upload_date)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(session_id)
    .bind(title)
    .bind(url)
    .bind(duration)
    .bind(description)
    .bind(upload_date)
    .execute(pool)
    .await?;

    Ok(res.last_insert_rowid())
}

#[instrument]
pub async fn delete_video(pool: &Pool<Sqlite>, video_id: i64) -> Result<bool, AppError> {
    info!("Deleting video");
    let res = sqlx::query("DELETE FROM videos WHERE id = ?")
        .bind(video_id)
        .execute(pool)
        .await?;

    Ok(res.rows_affected() > 0)
}
