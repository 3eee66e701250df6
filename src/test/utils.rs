#[cfg(test)]
pub mod test_db {
    use crate::auth::Role;
    use crate::db::{create_course, create_session, register_user, update_user_role};
    use crate::error::AppError;
    use sqlx::{Pool, Sqlite, SqlitePool};
    use std::collections::HashMap;
    use std::sync::Once;

    static INIT: Once = Once::new();
    pub static STANDARD_PASSWORD: &str = "password123";

    #[derive(Default)]
    pub struct TestDbBuilder {
        users: Vec<TestUser>,
        courses: Vec<TestCourse>,
        sessions: Vec<TestSession>,
    }

    pub struct TestUser {
        pub username: String,
        pub role: Role,
        pub password: String,
    }

    pub struct TestCourse {
        pub name: String,
        pub description: String,
        pub image: String,
        pub owner_username: Option<String>,
    }

    pub struct TestSession {
        pub course_name: String,
        pub start_time: String,
        pub end_time: String,
        pub owner_username: Option<String>,
    }

    impl TestDbBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn student(mut self, username: &str) -> Self {
            self.users.push(TestUser {
                username: username.to_string(),
                role: Role::Student,
                password: STANDARD_PASSWORD.to_string(),
            });
            self
        }

        pub fn instructor(mut self, username: &str) -> Self {
            self.users.push(TestUser {
                username: username.to_string(),
                role: Role::Instructor,
                password: STANDARD_PASSWORD.to_string(),
            });
            self
        }

        pub fn admin(mut self, username: &str) -> Self {
            self.users.push(TestUser {
                username: username.to_string(),
                role: Role::Admin,
                password: STANDARD_PASSWORD.to_string(),
            });
            self
        }

        pub fn course(mut self, name: &str, owner_username: Option<&str>) -> Self {
            self.courses.push(TestCourse {
                name: name.to_string(),
                description: format!("{} course", name),
                image: String::new(),
                owner_username: owner_username.map(String::from),
            });
            self
        }

        pub fn course_with_image(
            mut self,
            name: &str,
            image: &str,
            owner_username: Option<&str>,
        ) -> Self {
            self.courses.push(TestCourse {
                name: name.to_string(),
                description: format!("{} course", name),
                image: image.to_string(),
                owner_username: owner_username.map(String::from),
            });
            self
        }

        pub fn session(
            mut self,
            course_name: &str,
            start_time: &str,
            end_time: &str,
            owner_username: Option<&str>,
        ) -> Self {
            self.sessions.push(TestSession {
                course_name: course_name.to_string(),
                start_time: start_time.to_string(),
                end_time: end_time.to_string(),
                owner_username: owner_username.map(String::from),
            });
            self
        }

        pub async fn build(self) -> Result<TestDb, AppError> {
            INIT.call_once(|| {
                let _ = env_logger::builder().is_test(true).try_init();
            });

            let pool = SqlitePool::connect("sqlite::memory:").await?;

            sqlx::migrate!("./migrations").run(&pool).await?;

            let mut user_id_map: HashMap<String, i64> = HashMap::new();
            let mut course_id_map: HashMap<String, i64> = HashMap::new();
            let mut session_ids: Vec<i64> = Vec::new();

            for user in &self.users {
                let email = format!("{}@example.com", user.username);
                let created =
                    register_user(&pool, &user.username, &email, &user.password, "").await?;

                if user.role != Role::Student {
                    update_user_role(&pool, created.id, user.role.as_str()).await?;
                }

                user_id_map.insert(user.username.clone(), created.id);
            }

            for course in &self.courses {
                let owner = match &course.owner_username {
                    Some(username) => Some(username.clone()),
                    None => self
                        .users
                        .iter()
                        .find(|u| matches!(u.role, Role::Instructor))
                        .or(self.users.first())
                        .map(|u| u.username.clone()),
                };

                if let Some(owner) = owner {
                    let created = create_course(
                        &pool,
                        &course.name,
                        &course.description,
                        &course.image,
                        &owner,
                    )
                    .await?;

                    course_id_map.insert(course.name.clone(), created.id);
                }
            }

            for session in &self.sessions {
                let course_id = course_id_map
                    .get(&session.course_name)
                    .copied()
                    .expect("Session references a course the builder doesn't know");

                let owner = match &session.owner_username {
                    Some(username) => username.clone(),
                    None => self
                        .users
                        .iter()
                        .find(|u| matches!(u.role, Role::Instructor))
                        .or(self.users.first())
                        .map(|u| u.username.clone())
                        .expect("Session requires at least one user"),
                };

                let session_id = create_session(
                    &pool,
                    course_id,
                    &session.start_time,
                    &session.end_time,
                    &owner,
                )
                .await?;

                session_ids.push(session_id);
            }

            Ok(TestDb {
                pool,
                user_id_map,
                course_id_map,
                session_ids,
            })
        }
    }

    pub struct TestDb {
        pub pool: Pool<Sqlite>,
        pub user_id_map: HashMap<String, i64>,
        pub course_id_map: HashMap<String, i64>,
        pub session_ids: Vec<i64>,
    }

    impl TestDb {
        pub fn user_id(&self, username: &str) -> Option<i64> {
            self.user_id_map.get(username).copied()
        }

        pub fn course_id(&self, name: &str) -> Option<i64> {
            self.course_id_map.get(name).copied()
        }

        pub async fn enrollment_rows(
            &self,
            username: &str,
        ) -> Result<Vec<crate::models::Enrollment>, AppError> {
            crate::db::get_enrollments_by_user(&self.pool, username).await
        }

        pub async fn comment_count(&self, course_id: i64) -> Result<i64, sqlx::Error> {
            sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE course_id = ?")
                .bind(course_id)
                .fetch_one(&self.pool)
                .await
        }

        pub async fn stored_password(&self, username: &str) -> Result<String, sqlx::Error> {
            sqlx::query_scalar("SELECT password FROM users WHERE username = ?")
                .bind(username)
                .fetch_one(&self.pool)
                .await
        }
    }
}

#[cfg(test)]
pub mod test_client {
    use super::test_db::TestDb;
    use rocket::http::{ContentType, Status};
    use rocket::local::asynchronous::Client;
    use serde_json::json;

    /// Builds a local client over the same in-memory pool the fixtures used.
    /// The tracked client keeps cookies, so a login carries over to later
    /// requests.
    pub async fn setup_test_client(test_db: &TestDb) -> Client {
        let rocket = crate::init_rocket(test_db.pool.clone()).await;

        Client::tracked(rocket)
            .await
            .expect("Failed to build test client")
    }

    pub async fn login_test_user(client: &Client, username: &str, password: &str) {
        let response = client
            .post("/api/login")
            .header(ContentType::JSON)
            .body(
                json!({
                    "username": username,
                    "password": password
                })
                .to_string(),
            )
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Ok, "Login request failed");
    }
}
