use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

#[derive(Debug, Serialize, Clone)]
pub struct Course {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub image: String,
    pub user_id: i64,
    pub video_id: i64,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbCourse {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub user_id: Option<i64>,
    pub video_id: Option<i64>,
}

impl From<DbCourse> for Course {
    fn from(course: DbCourse) -> Self {
        Self {
            id: course.id.unwrap_or_default(),
            name: course.name.unwrap_or_default(),
            description: course.description.unwrap_or_default(),
            image: course.image.unwrap_or_default(),
            user_id: course.user_id.unwrap_or_default(),
            video_id: course.video_id.unwrap_or_default(),
        }
    }
}

/// A scheduled offering of a course. Also doubles as a user's personal
/// enrollment slot: enrolling materializes a fresh session row for the
/// (user, course) pair, and withdrawal deletes every matched session.
#[derive(Debug, Serialize, Clone)]
pub struct Session {
    pub id: i64,
    pub course_id: i64,
    pub start_time: String,
    pub end_time: String,
    pub user_id: i64,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbSession {
    pub id: Option<i64>,
    pub course_id: Option<i64>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub user_id: Option<i64>,
}

impl From<DbSession> for Session {
    fn from(session: DbSession) -> Self {
        Self {
            id: session.id.unwrap_or_default(),
            course_id: session.course_id.unwrap_or_default(),
            start_time: session.start_time.unwrap_or_default(),
            end_time: session.end_time.unwrap_or_default(),
            user_id: session.user_id.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct Enrollment {
    pub id: i64,
    pub user_id: i64,
    pub session_id: i64,
    pub date: DateTime<Utc>,
    pub status: String,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbEnrollment {
    pub id: Option<i64>,
    pub user_id: Option<i64>,
    pub session_id: Option<i64>,
    pub date: Option<NaiveDateTime>,
    pub status: Option<String>,
}

impl From<DbEnrollment> for Enrollment {
    fn from(db: DbEnrollment) -> Self {
        Self {
            id: db.id.unwrap_or_default(),
            user_id: db.user_id.unwrap_or_default(),
            session_id: db.session_id.unwrap_or_default(),
            date: db
                .date
                .map(|dt| DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc))
                .unwrap_or_else(Utc::now),
            status: db.status.unwrap_or_default(),
        }
    }
}

/// Dual-use row: the empty placeholder every course points at through
/// `courses.video_id` (no session), or an upload attached to a session.
#[derive(Debug, Serialize, Clone)]
pub struct Video {
    pub id: i64,
    pub session_id: Option<i64>,
    pub title: String,
    pub url: String,
    pub duration: String,
    pub description: String,
    pub upload_date: Option<DateTime<Utc>>,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbVideo {
    pub id: Option<i64>,
    pub session_id: Option<i64>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub duration: Option<String>,
    pub description: Option<String>,
    pub upload_date: Option<NaiveDateTime>,
}

impl From<DbVideo> for Video {
    fn from(db: DbVideo) -> Self {
        Self {
            id: db.id.unwrap_or_default(),
            session_id: db.session_id,
            title: db.title.unwrap_or_default(),
            url: db.url.unwrap_or_default(),
            duration: db.duration.unwrap_or_default(),
            description: db.description.unwrap_or_default(),
            upload_date: db
                .upload_date
                .map(|dt| DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc)),
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct Comment {
    pub id: i64,
    pub user_id: i64,
    pub course_id: i64,
    pub comment: String,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbComment {
    pub id: Option<i64>,
    pub user_id: Option<i64>,
    pub course_id: Option<i64>,
    pub comment: Option<String>,
}

impl From<DbComment> for Comment {
    fn from(db: DbComment) -> Self {
        Self {
            id: db.id.unwrap_or_default(),
            user_id: db.user_id.unwrap_or_default(),
            course_id: db.course_id.unwrap_or_default(),
            comment: db.comment.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct ContactMessage {
    pub id: i64,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub username: String,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbContactMessage {
    pub id: Option<i64>,
    pub email: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
    pub username: Option<String>,
}

impl From<DbContactMessage> for ContactMessage {
    fn from(db: DbContactMessage) -> Self {
        Self {
            id: db.id.unwrap_or_default(),
            email: db.email.unwrap_or_default(),
            subject: db.subject.unwrap_or_default(),
            message: db.message.unwrap_or_default(),
            username: db.username.unwrap_or_default(),
        }
    }
}
