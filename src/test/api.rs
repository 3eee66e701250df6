#[cfg(test)]
mod tests {
    use crate::api::{EnrollResponse, EnrollmentStatusResponse, LoginResponse, UserData, WithdrawResponse};
    use crate::test::utils::test_client::{login_test_user, setup_test_client};
    use crate::test::utils::test_db::{STANDARD_PASSWORD, TestDbBuilder};
    use rocket::http::{ContentType, Cookie, Status};
    use serde_json::json;

    #[rocket::async_test]
    async fn test_login_api() {
        let test_db = TestDbBuilder::new()
            .student("alice")
            .build()
            .await
            .expect("Failed to build test database");
        let client = setup_test_client(&test_db).await;

        let response = client
            .post("/api/login")
            .header(ContentType::JSON)
            .body(
                json!({
                    "username": "alice",
                    "password": STANDARD_PASSWORD
                })
                .to_string(),
            )
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Ok);

        let body = response.into_string().await.unwrap();
        let login_response: LoginResponse = serde_json::from_str(&body).unwrap();

        assert!(login_response.success);
        assert!(login_response.user.is_some());
        assert_eq!(login_response.user.unwrap().username, "alice");

        let response = client
            .post("/api/login")
            .header(ContentType::JSON)
            .body(
                json!({
                    "username": "alice",
                    "password": "wrong_password"
                })
                .to_string(),
            )
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Ok);

        let body = response.into_string().await.unwrap();
        let login_response: LoginResponse = serde_json::from_str(&body).unwrap();

        assert!(!login_response.success);
        assert!(login_response.error.is_some());
    }

    #[rocket::async_test]
    async fn test_register_api() {
        let test_db = TestDbBuilder::new()
            .build()
            .await
            .expect("Failed to build test database");
        let client = setup_test_client(&test_db).await;

        let response = client
            .post("/api/register")
            .header(ContentType::JSON)
            .body(
                json!({
                    "username": "newcomer",
                    "email": "newcomer@example.com",
                    "password": "a-long-password"
                })
                .to_string(),
            )
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Created);

        let body = response.into_string().await.unwrap();
        let user: UserData = serde_json::from_str(&body).unwrap();
        assert_eq!(user.username, "newcomer");
        assert_eq!(user.role, "student");

        // Same username again conflicts.
        let response = client
            .post("/api/register")
            .header(ContentType::JSON)
            .body(
                json!({
                    "username": "newcomer",
                    "email": "other@example.com",
                    "password": "a-long-password"
                })
                .to_string(),
            )
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Conflict);
    }

    #[rocket::async_test]
    async fn test_auth_required_apis() {
        let test_db = TestDbBuilder::new()
            .build()
            .await
            .expect("Failed to build test database");
        let client = setup_test_client(&test_db).await;

        let endpoints = vec!["/api/me", "/api/enrollments", "/api/my-courses", "/api/profile"];

        for endpoint in endpoints {
            let response = client.get(endpoint).dispatch().await;
            assert_eq!(
                response.status(),
                Status::Unauthorized,
                "Endpoint {} did not require authentication",
                endpoint
            );
        }
    }

    #[rocket::async_test]
    async fn test_forged_session_token_rejected() {
        let test_db = TestDbBuilder::new()
            .student("alice")
            .build()
            .await
            .expect("Failed to build test database");
        let client = setup_test_client(&test_db).await;

        let forged_cookie = Cookie::build(("session_token", "fake_token")).build();

        let response = client
            .get("/api/me")
            .private_cookie(forged_cookie)
            .dispatch()
            .await;

        assert_eq!(
            response.status(),
            Status::Unauthorized,
            "Forged session token was accepted"
        );

        login_test_user(&client, "alice", STANDARD_PASSWORD).await;

        let response = client.get("/api/me").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
    }

    #[rocket::async_test]
    async fn test_enroll_withdraw_flow() {
        let test_db = TestDbBuilder::new()
            .instructor("grace")
            .student("alice")
            .course("Algorithms", Some("grace"))
            .build()
            .await
            .expect("Failed to build test database");
        let course_id = test_db.course_id("Algorithms").expect("Course not found");
        let client = setup_test_client(&test_db).await;

        login_test_user(&client, "alice", STANDARD_PASSWORD).await;

        let response = client
            .post(format!("/api/courses/{}/enroll", course_id))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);

        let body = response.into_string().await.unwrap();
        let enroll_response: EnrollResponse = serde_json::from_str(&body).unwrap();
        assert!(enroll_response.success);

        let response = client
            .get(format!("/api/courses/{}/enrollment", course_id))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);

        let body = response.into_string().await.unwrap();
        let status_response: EnrollmentStatusResponse = serde_json::from_str(&body).unwrap();
        assert!(status_response.enrolled);

        // Enrolling again without withdrawing is refused at the API layer.
        let response = client
            .post(format!("/api/courses/{}/enroll", course_id))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Conflict);

        let response = client
            .post(format!("/api/courses/{}/withdraw", course_id))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);

        let body = response.into_string().await.unwrap();
        let withdraw_response: WithdrawResponse = serde_json::from_str(&body).unwrap();
        assert!(withdraw_response.success);

        // A second withdrawal has nothing left to remove.
        let response = client
            .post(format!("/api/courses/{}/withdraw", course_id))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::NotFound);
    }

    #[rocket::async_test]
    async fn test_enroll_missing_course() {
        let test_db = TestDbBuilder::new()
            .student("alice")
            .build()
            .await
            .expect("Failed to build test database");
        let client = setup_test_client(&test_db).await;

        login_test_user(&client, "alice", STANDARD_PASSWORD).await;

        let response = client.post("/api/courses/999/enroll").dispatch().await;
        assert_eq!(response.status(), Status::NotFound);
    }

    #[rocket::async_test]
    async fn test_course_management_requires_instructor() {
        let test_db = TestDbBuilder::new()
            .instructor("grace")
            .student("alice")
            .build()
            .await
            .expect("Failed to build test database");
        let client = setup_test_client(&test_db).await;

        login_test_user(&client, "alice", STANDARD_PASSWORD).await;

        let course_body = json!({
            "name": "Unauthorized Course",
            "description": "",
            "image": ""
        })
        .to_string();

        let response = client
            .post("/api/courses")
            .header(ContentType::JSON)
            .body(&course_body)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Forbidden);

        login_test_user(&client, "grace", STANDARD_PASSWORD).await;

        let response = client
            .post("/api/courses")
            .header(ContentType::JSON)
            .body(
                json!({
                    "name": "Operating Systems",
                    "description": "Processes and scheduling",
                    "image": "os.png"
                })
                .to_string(),
            )
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Created);
    }

    #[rocket::async_test]
    async fn test_session_create_validates_times() {
        let test_db = TestDbBuilder::new()
            .instructor("grace")
            .course("Algorithms", Some("grace"))
            .build()
            .await
            .expect("Failed to build test database");
        let course_id = test_db.course_id("Algorithms").expect("Course not found");
        let client = setup_test_client(&test_db).await;

        login_test_user(&client, "grace", STANDARD_PASSWORD).await;

        let response = client
            .post(format!("/api/courses/{}/sessions", course_id))
            .header(ContentType::JSON)
            .body(
                json!({
                    "start_time": "not-a-time",
                    "end_time": "10:30:00"
                })
                .to_string(),
            )
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::UnprocessableEntity);

        let response = client
            .post(format!("/api/courses/{}/sessions", course_id))
            .header(ContentType::JSON)
            .body(
                json!({
                    "start_time": "09:00:00",
                    "end_time": "10:30:00"
                })
                .to_string(),
            )
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Created);
    }

    #[rocket::async_test]
    async fn test_contact_messages_are_admin_only() {
        let test_db = TestDbBuilder::new()
            .admin("root")
            .student("alice")
            .build()
            .await
            .expect("Failed to build test database");
        let client = setup_test_client(&test_db).await;

        let response = client
            .post("/api/contact")
            .header(ContentType::JSON)
            .body(
                json!({
                    "email": "visitor@example.com",
                    "subject": "Hello",
                    "message": "Is enrollment open?",
                    "username": "visitor"
                })
                .to_string(),
            )
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Created);

        login_test_user(&client, "alice", STANDARD_PASSWORD).await;
        let response = client.get("/api/admin/contact-messages").dispatch().await;
        assert_eq!(response.status(), Status::Forbidden);

        login_test_user(&client, "root", STANDARD_PASSWORD).await;
        let response = client.get("/api/admin/contact-messages").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
    }

    #[rocket::async_test]
    async fn test_health() {
        let test_db = TestDbBuilder::new()
            .build()
            .await
            .expect("Failed to build test database");
        let client = setup_test_client(&test_db).await;

        let response = client.get("/api/health").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(response.into_string().await.unwrap(), "OK");
    }
}
