use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::auth::{DbUser, User};
use crate::db::identity::{resolve_user_id, user_exists_by_id, user_exists_by_username};
use crate::error::AppError;

#[instrument(skip_all, fields(username))]
pub async fn register_user(
    pool: &Pool<Sqlite>,
    username: &str,
    email: &str,
    password: &str,
    profile_pic: &str,
) -> Result<User, AppError> {
    info!("Registering new user");

    if user_exists_by_username(pool, username).await? {
        return Err(AppError::Validation(format!(
            "Username '{}' already exists",
            username
        )));
    }

    let hashed_password = bcrypt::hash(password, bcrypt::DEFAULT_COST)?;

    let res = sqlx::query(
        "INSERT INTO users (username, email, password, profile_pic) VALUES (?, ?, ?, ?)",
    )
    .bind(username)
    .bind(email)
    .bind(hashed_password)
    .bind(profile_pic)
    .execute(pool)
    .await?;

    get_user(pool, res.last_insert_rowid()).await
}

#[instrument(skip_all, fields(username))]
pub async fn authenticate_user(
    pool: &Pool<Sqlite>,
    username: &str,
    password: &str,
) -> Result<Option<User>, AppError> {
    info!("Authenticating user");
    let row: Option<(i64, String)> =
        sqlx::query_as("SELECT id, password FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(pool)
            .await?;

    match row {
        Some((id, stored_hash)) => match bcrypt::verify(password, &stored_hash) {
            Ok(true) => Ok(Some(get_user(pool, id).await?)),
            _ => Ok(None),
        },
        _ => Ok(None),
    }
}

#[instrument]
pub async fn get_user(pool: &Pool<Sqlite>, id: i64) -> Result<User, AppError> {
    info!("Fetching user by ID");
    let row = sqlx::query_as::<_, DbUser>(
        "SELECT id, username, email, role, profile_pic FROM users WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(user) => Ok(User::from(user)),
        _ => Err(AppError::NotFound(format!(
            "User with id {} not found in database",
            id
        ))),
    }
}

#[instrument]
pub async fn get_user_profile(pool: &Pool<Sqlite>, username: &str) -> Result<User, AppError> {
    info!("Fetching user profile");
    let user_id = resolve_user_id(pool, username).await?;

    get_user(pool, user_id).await
}

#[instrument]
pub async fn update_username(
    pool: &Pool<Sqlite>,
    username: &str,
    new_username: &str,
) -> Result<(), AppError> {
    info!("Updating username");
    let user_id = resolve_user_id(pool, username).await?;

    let existing: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM users WHERE username = ? AND id != ?")
            .bind(new_username)
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

    if existing.is_some() {
        return Err(AppError::Validation("Username already exists".to_string()));
    }

    sqlx::query("UPDATE users SET username = ? WHERE id = ?")
        .bind(new_username)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}

#[instrument]
pub async fn update_email(
    pool: &Pool<Sqlite>,
    username: &str,
    new_email: &str,
) -> Result<(), AppError> {
    info!("Updating user email");
    let user_id = resolve_user_id(pool, username).await?;

    sqlx::query("UPDATE users SET email = ? WHERE id = ?")
        .bind(new_email)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}

#[instrument(skip_all, fields(username))]
pub async fn update_password(
    pool: &Pool<Sqlite>,
    username: &str,
    new_password: &str,
) -> Result<(), AppError> {
    info!("Updating user password");
    let user_id = resolve_user_id(pool, username).await?;

    let hashed_password = bcrypt::hash(new_password, bcrypt::DEFAULT_COST)?;

    sqlx::query("UPDATE users SET password = ? WHERE id = ?")
        .bind(hashed_password)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}

#[instrument]
pub async fn update_profile_pic(
    pool: &Pool<Sqlite>,
    username: &str,
    new_profile_pic: &str,
) -> Result<String, AppError> {
    info!("Updating profile picture");
    let user_id = resolve_user_id(pool, username).await?;

    let (old_pic,): (String,) = sqlx::query_as("SELECT profile_pic FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await?;

    sqlx::query("UPDATE users SET profile_pic = ? WHERE id = ?")
        .bind(new_profile_pic)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(old_pic)
}

#[instrument]
pub async fn update_user_role(
    pool: &Pool<Sqlite>,
    user_id: i64,
    role: &str,
) -> Result<(), AppError> {
    info!("Updating user role");
    sqlx::query("UPDATE users SET role = ? WHERE id = ?")
        .bind(role)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Deleting a user does not cascade. The delete is rejected while courses,
/// sessions, enrollments or comments still reference the user.
#[instrument]
pub async fn delete_user(pool: &Pool<Sqlite>, user_id: i64) -> Result<(), AppError> {
    info!("Deleting user");

    if !user_exists_by_id(pool, user_id).await? {
        return Err(AppError::NotFound(format!(
            "User with id {} not found in database",
            user_id
        )));
    }

    let dependents: i64 = sqlx::query_scalar(
        "SELECT (SELECT COUNT(*) FROM courses WHERE user_id = ?1)
              + (SELECT COUNT(*) FROM sessions WHERE user_id = ?1)
              + (SELECT COUNT(*) FROM enrollments WHERE user_id = ?1)
              + (SELECT COUNT(*) FROM comments WHERE user_id = ?1)",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    if dependents > 0 {
        return Err(AppError::Validation(format!(
            "User {} still has {} dependent records",
            user_id, dependents
        )));
    }

    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}
