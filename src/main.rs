#[macro_use]
extern crate rocket;

mod api;
mod auth;
mod db;
mod env;
mod error;
mod models;
mod telemetry;
#[cfg(test)]
mod test;
mod validation;

use api::{
    api_add_comment, api_change_password, api_check_enrolled, api_create_course,
    api_create_session, api_delete_comment, api_delete_course, api_delete_session,
    api_delete_user, api_delete_video, api_enroll, api_get_all_courses, api_get_comments,
    api_get_contact_messages, api_get_course, api_get_course_sessions, api_get_course_video,
    api_get_enrollments, api_get_my_courses, api_get_profile, api_get_video, api_login,
    api_logout, api_me, api_me_unauthorized, api_register_user, api_search_courses,
    api_send_contact_message, api_update_course, api_update_email, api_update_profile_pic,
    api_update_session, api_update_user_role, api_update_username, api_upload_video,
    api_withdraw, health,
};
use auth::{forbidden_api, unauthorized_api};
use db::clean_expired_auth_sessions;
use env::load_environment;
use error::AppError;
use rocket::{Build, Rocket, tokio};
use telemetry::TelemetryFairing;
use telemetry::init_tracing;
use thiserror::Error;

use sqlx::SqlitePool;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Anyhow(anyhow::Error),
    #[error("{0}")]
    Figment(rocket::figment::Error),
    #[error("{0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Application error: {0}")]
    App(#[from] AppError),
}

impl From<anyhow::Error> for Error {
    fn from(value: anyhow::Error) -> Self {
        Error::Anyhow(value)
    }
}

impl From<rocket::figment::Error> for Error {
    fn from(value: rocket::figment::Error) -> Self {
        Error::Figment(value)
    }
}

#[launch]
async fn rocket() -> _ {
    if let Err(e) = load_environment() {
        eprintln!("Failed to load environment files: {}", e);
    }

    init_tracing();

    let database_url = std::env::var("DATABASE_URL").unwrap_or_default();

    let pool = SqlitePool::connect(&database_url)
        .await
        .expect("Failed to connect to SQLite database");

    let pool_clone = pool.clone();

    tokio::spawn(async move {
        tokio::time::sleep(tokio::time::Duration::from_secs(5)).await;

        loop {
            match clean_expired_auth_sessions(&pool_clone).await {
                Ok(count) => {
                    if count > 0 {
                        info!("Cleaned up {} expired login sessions", count);
                    }
                }
                Err(e) => {
                    error!("Failed to clean expired login sessions: {}", e);
                }
            }

            tokio::time::sleep(tokio::time::Duration::from_secs(3600)).await;
        }
    });

    info!("Running database migrations...");
    match sqlx::migrate!("./migrations").run(&pool).await {
        Ok(_) => info!("Migrations completed successfully"),
        Err(e) => {
            error!("Failed to run migrations: {}", e);
            panic!("Database migration failed: {}", e);
        }
    }

    init_rocket(pool).await
}

pub async fn init_rocket(pool: SqlitePool) -> Rocket<Build> {
    info!("Starting coursehub");

    rocket::build()
        .manage(pool)
        .mount(
            "/api",
            routes![
                api_register_user,
                api_login,
                api_logout,
                api_me,
                api_me_unauthorized,
                api_get_profile,
                api_update_username,
                api_update_email,
                api_change_password,
                api_update_profile_pic,
                api_get_all_courses,
                api_get_course,
                api_search_courses,
                api_get_my_courses,
                api_create_course,
                api_update_course,
                api_delete_course,
                api_get_course_sessions,
                api_create_session,
                api_update_session,
                api_delete_session,
                api_enroll,
                api_withdraw,
                api_get_enrollments,
                api_check_enrolled,
                api_get_comments,
                api_add_comment,
                api_delete_comment,
                api_get_course_video,
                api_get_video,
                api_upload_video,
                api_delete_video,
                api_send_contact_message,
                api_get_contact_messages,
                api_update_user_role,
                api_delete_user,
            ],
        )
        .register("/api", catchers![unauthorized_api, forbidden_api])
        .mount("/api", routes![health])
        .attach(TelemetryFairing)
}
