use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::models::{ContactMessage, DbContactMessage};

#[instrument(skip(pool, message))]
pub async fn send_message(
    pool: &Pool<Sqlite>,
    email: &str,
    subject: &str,
    message: &str,
    username: &str,
) -> Result<i64, AppError> {
    info!("Storing contact message");
    let res = sqlx::query(
        "INSERT INTO contact_messages (email, subject, message, username) VALUES (?, ?, ?, ?)",
    )
    .bind(email)
    .bind(subject)
    .bind(message)
    .bind(username)
    .execute(pool)
    .await?;

    Ok(res.last_insert_rowid())
}

#[instrument]
pub async fn get_messages(pool: &Pool<Sqlite>) -> Result<Vec<ContactMessage>, AppError> {
    info!("Fetching contact messages");
    let rows = sqlx::query_as::<_, DbContactMessage>("SELECT * FROM contact_messages")
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(ContactMessage::from).collect())
}
