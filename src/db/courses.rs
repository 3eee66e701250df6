use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::db::identity::resolve_user_id;
use crate::error::AppError;
use crate::models::{Course, DbCourse};

/// Creates a course together with its empty placeholder video row. The two
/// inserts run in one transaction so a failure never leaves a dangling video.
#[instrument(skip(pool))]
pub async fn create_course(
    pool: &Pool<Sqlite>,
    name: &str,
    description: &str,
    image: &str,
    owner_username: &str,
) -> Result<Course, AppError> {
    info!("Creating course");
    let user_id = resolve_user_id(pool, owner_username).await?;

    let mut tx = pool.begin().await?;

    let video_res = sqlx::query("INSERT INTO videos (url) VALUES ('')")
        .execute(&mut *tx)
        .await?;
    let video_id = video_res.last_insert_rowid();

    let course_res = sqlx::query(
        "INSERT INTO courses (name, description, image, user_id, video_id) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(name)
    .bind(description)
    .bind(image)
    .bind(user_id)
    .bind(video_id)
    .execute(&mut *tx)
    .await?;

    let row = sqlx::query_as::<_, DbCourse>("SELECT * FROM courses WHERE id = ?")
        .bind(course_res.last_insert_rowid())
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(Course::from(row))
}

/// Precondition gate for every write that references a course id.
#[instrument]
pub async fn course_exists(pool: &Pool<Sqlite>, course_id: i64) -> Result<bool, AppError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM courses WHERE id = ?")
        .bind(course_id)
        .fetch_one(pool)
        .await?;

    Ok(count > 0)
}

#[instrument]
pub async fn get_course(pool: &Pool<Sqlite>, course_id: i64) -> Result<Course, AppError> {
    info!("Fetching course");
    let row = sqlx::query_as::<_, DbCourse>("SELECT * FROM courses WHERE id = ?")
        .bind(course_id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(course) => Ok(Course::from(course)),
        _ => Err(AppError::CourseNotFound(course_id)),
    }
}

#[instrument]
pub async fn get_all_courses(pool: &Pool<Sqlite>) -> Result<Vec<Course>, AppError> {
    info!("Fetching all courses");
    let rows = sqlx::query_as::<_, DbCourse>("SELECT * FROM courses ORDER BY name")
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(Course::from).collect())
}

/// Courses owned by a user, not courses they are enrolled in.
#[instrument]
pub async fn get_courses_by_owner(
    pool: &Pool<Sqlite>,
    username: &str,
) -> Result<Vec<Course>, AppError> {
    info!("Fetching courses by owner");
    let user_id = resolve_user_id(pool, username).await?;

    let rows = sqlx::query_as::<_, DbCourse>("SELECT * FROM courses WHERE user_id = ?")
        .bind(user_id)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(Course::from).collect())
}

/// Updates the course row and its placeholder video URL in one transaction.
/// Returns the affected row count and the previous image filename so the
/// caller can delete the replaced file from storage.
#[instrument(skip(pool))]
pub async fn update_course(
    pool: &Pool<Sqlite>,
    course_id: i64,
    name: &str,
    description: &str,
    image: &str,
    video_url: &str,
) -> Result<(u64, String), AppError> {
    info!("Updating course");

    if !course_exists(pool, course_id).await? {
        return Err(AppError::CourseNotFound(course_id));
    }

    let mut tx = pool.begin().await?;

    let (video_id, old_image): (i64, String) =
        sqlx::query_as("SELECT video_id, image FROM courses WHERE id = ?")
            .bind(course_id)
            .fetch_one(&mut *tx)
            .await?;

    sqlx::query("UPDATE videos SET url = ? WHERE id = ?")
        .bind(video_url)
        .bind(video_id)
        .execute(&mut *tx)
        .await?;

    let res = sqlx::query("UPDATE courses SET name = ?, description = ?, image = ? WHERE id = ?")
        .bind(name)
        .bind(description)
        .bind(image)
        .bind(course_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok((res.rows_affected(), old_image))
}

/// Deletes the course and its comments. Sessions, enrollments and the
/// placeholder video are left in place.
#[instrument]
pub async fn delete_course(pool: &Pool<Sqlite>, course_id: i64) -> Result<(), AppError> {
    info!("Deleting course");

    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM comments WHERE course_id = ?")
        .bind(course_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM courses WHERE id = ?")
        .bind(course_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(())
}

/// Case-insensitive substring match on course names. An empty result is not
/// an error.
#[instrument]
pub async fn search_courses_by_name(
    pool: &Pool<Sqlite>,
    name: &str,
) -> Result<Vec<Course>, AppError> {
    info!("Searching courses by name");
    let pattern = format!("%{}%", name);

    let rows = sqlx::query_as::<_, DbCourse>("SELECT * FROM courses WHERE name LIKE ?")
        .bind(pattern)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(Course::from).collect())
}
