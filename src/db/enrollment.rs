use chrono::Utc;
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::db::identity::resolve_user_id;
use crate::error::AppError;
use crate::models::{Course, DbCourse, DbEnrollment, Enrollment};

/// Time slot given to the session that enrollment materializes for the
/// enrolling user.
pub const DEFAULT_SESSION_START: &str = "09:00:00";
pub const DEFAULT_SESSION_END: &str = "10:30:00";

const ENROLLED_STATUS: &str = "enrolled";

/// A session row scoped to (user, course) is the user's personal enrollment
/// slot. No slot means not enrolled; otherwise the enrollment rows for that
/// slot decide.
#[instrument]
pub async fn check_enrolled(
    pool: &Pool<Sqlite>,
    username: &str,
    course_id: i64,
) -> Result<bool, AppError> {
    info!("Checking enrollment");
    let user_id = resolve_user_id(pool, username).await?;

    let slot: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM sessions WHERE user_id = ? AND course_id = ?")
            .bind(user_id)
            .bind(course_id)
            .fetch_optional(pool)
            .await?;

    let Some((session_id,)) = slot else {
        return Ok(false);
    };

    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM enrollments WHERE user_id = ? AND session_id = ?",
    )
    .bind(user_id)
    .bind(session_id)
    .fetch_one(pool)
    .await?;

    Ok(count > 0)
}

/// Enrolls a user in a course: materializes a fresh default-time session as
/// the user's personal slot, then inserts one enrollment row for EVERY
/// session under the course, the new slot included. The whole sequence runs
/// in a single transaction; a failure rolls back all of it.
///
/// Enrolling twice without withdrawing is allowed and produces a second slot
/// with overlapping enrollment rows.
#[instrument]
pub async fn enroll(pool: &Pool<Sqlite>, course_id: i64, username: &str) -> Result<(), AppError> {
    info!("Enrolling user in course");
    let user_id = resolve_user_id(pool, username).await?;

    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO sessions (course_id, start_time, end_time, user_id) VALUES (?, ?, ?, ?)",
    )
    .bind(course_id)
    .bind(DEFAULT_SESSION_START)
    .bind(DEFAULT_SESSION_END)
    .bind(user_id)
    .execute(&mut *tx)
    .await?;

    let session_ids: Vec<i64> = sqlx::query_scalar("SELECT id FROM sessions WHERE course_id = ?")
        .bind(course_id)
        .fetch_all(&mut *tx)
        .await?;

    let date = Utc::now().naive_utc();
    for session_id in session_ids {
        sqlx::query(
            "INSERT INTO enrollments (user_id, session_id, date, status) VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(session_id)
        .bind(date)
        .bind(ENROLLED_STATUS)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(())
}

/// Withdraws a user from a course. Every session the user is enrolled in
/// under the course is deleted outright together with the user's enrollment
/// rows, so the session disappears for all other enrollees as well. Returns
/// true when any row was deleted.
#[instrument]
pub async fn withdraw(
    pool: &Pool<Sqlite>,
    username: &str,
    course_id: i64,
) -> Result<bool, AppError> {
    info!("Withdrawing user from course");
    let user_id = resolve_user_id(pool, username).await?;

    let session_ids: Vec<i64> = sqlx::query_scalar(
        "SELECT s.id
         FROM sessions s
         JOIN enrollments e ON e.session_id = s.id
         WHERE s.course_id = ? AND e.user_id = ?",
    )
    .bind(course_id)
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    if session_ids.is_empty() {
        return Err(AppError::NoSessionsFound {
            username: username.to_string(),
            course_id,
        });
    }

    let mut tx = pool.begin().await?;

    let mut affected_rows = 0;
    for session_id in session_ids {
        let enrollments = sqlx::query("DELETE FROM enrollments WHERE session_id = ? AND user_id = ?")
            .bind(session_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        affected_rows += enrollments.rows_affected();

        let sessions = sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(session_id)
            .execute(&mut *tx)
            .await?;
        affected_rows += sessions.rows_affected();
    }

    tx.commit().await?;

    Ok(affected_rows > 0)
}

/// The raw enrollment rows a user holds, oldest first.
#[instrument]
pub async fn get_enrollments_by_user(
    pool: &Pool<Sqlite>,
    username: &str,
) -> Result<Vec<Enrollment>, AppError> {
    info!("Fetching enrollment records");
    let user_id = resolve_user_id(pool, username).await?;

    let rows = sqlx::query_as::<_, DbEnrollment>(
        "SELECT * FROM enrollments WHERE user_id = ? ORDER BY id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Enrollment::from).collect())
}

/// Courses the user is enrolled in, one entry per enrollment row. A course
/// with several sessions under it shows up once per session, matching what
/// enrollment inserted.
#[instrument]
pub async fn get_user_enrollments(
    pool: &Pool<Sqlite>,
    username: &str,
) -> Result<Vec<Course>, AppError> {
    info!("Fetching user enrollments");
    let user_id = resolve_user_id(pool, username).await?;

    let rows = sqlx::query_as::<_, DbCourse>(
        "SELECT c.id, c.name, c.description, c.image, c.user_id, c.video_id
         FROM courses c
         JOIN sessions s ON s.course_id = c.id
         JOIN enrollments e ON e.session_id = s.id
         WHERE e.user_id = ?",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Course::from).collect())
}
