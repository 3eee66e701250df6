#[cfg(test)]
mod tests {
    use crate::{
        db::{
            add_comment, comment_exists, delete_comment, get_comments, get_messages, send_message,
        },
        error::AppError,
        test::utils::test_db::TestDbBuilder,
    };
    use rocket::tokio;

    #[tokio::test]
    async fn test_add_and_list_comments() {
        let test_db = TestDbBuilder::new()
            .instructor("grace")
            .student("alice")
            .course("Algorithms", Some("grace"))
            .build()
            .await
            .expect("Failed to build test database");

        let pool = &test_db.pool;
        let course_id = test_db.course_id("Algorithms").expect("Course not found");
        let alice_id = test_db.user_id("alice").expect("User not found");

        let comment_id = add_comment(pool, "alice", course_id, "When does this start?")
            .await
            .expect("Failed to add comment");
        assert!(comment_id > 0);

        let comments = get_comments(pool, course_id)
            .await
            .expect("Failed to fetch comments");
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].user_id, alice_id);
        assert_eq!(comments[0].comment, "When does this start?");

        assert!(
            comment_exists(pool, alice_id, course_id)
                .await
                .expect("Probe failed")
        );
    }

    #[tokio::test]
    async fn test_comment_by_unknown_user() {
        let test_db = TestDbBuilder::new()
            .instructor("grace")
            .course("Algorithms", Some("grace"))
            .build()
            .await
            .expect("Failed to build test database");

        let course_id = test_db.course_id("Algorithms").expect("Course not found");

        let result = add_comment(&test_db.pool, "nobody", course_id, "hello").await;

        match result {
            Err(AppError::IdentityNotFound(username)) => assert_eq!(username, "nobody"),
            other => panic!("Expected IdentityNotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_delete_comment() {
        let test_db = TestDbBuilder::new()
            .instructor("grace")
            .student("alice")
            .course("Algorithms", Some("grace"))
            .build()
            .await
            .expect("Failed to build test database");

        let pool = &test_db.pool;
        let course_id = test_db.course_id("Algorithms").expect("Course not found");

        let comment_id = add_comment(pool, "alice", course_id, "First!")
            .await
            .expect("Failed to add comment");

        let deleted = delete_comment(pool, comment_id, "alice", course_id)
            .await
            .expect("Delete failed");
        assert!(deleted);

        let comments = get_comments(pool, course_id)
            .await
            .expect("Failed to fetch comments");
        assert!(comments.is_empty());

        // Nothing left to delete for this user and course.
        let deleted = delete_comment(pool, comment_id, "alice", course_id)
            .await
            .expect("Second delete should not error");
        assert!(!deleted);
    }

    #[tokio::test]
    async fn test_contact_messages_round_trip() {
        let test_db = TestDbBuilder::new()
            .build()
            .await
            .expect("Failed to build test database");

        let pool = &test_db.pool;

        send_message(
            pool,
            "visitor@example.com",
            "Enrollment question",
            "Can I join a course mid-term?",
            "visitor",
        )
        .await
        .expect("Failed to store message");

        let messages = get_messages(pool).await.expect("Failed to fetch messages");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].email, "visitor@example.com");
        assert_eq!(messages[0].subject, "Enrollment question");
        assert_eq!(messages[0].username, "visitor");
    }
}
