#[cfg(test)]
mod tests {
    use crate::{
        db::{
            delete_video, get_course_video_url, get_video, upload_video, video_exists,
        },
        error::AppError,
        test::utils::test_db::TestDbBuilder,
    };
    use rocket::tokio;

    #[tokio::test]
    async fn test_upload_requires_a_session() {
        let test_db = TestDbBuilder::new()
            .instructor("grace")
            .build()
            .await
            .expect("Failed to build test database");

        let result = upload_video(
            &test_db.pool,
            "grace",
            "Intro",
            "https://videos.example.com/intro.mp4",
            "00:12:30",
            "Course introduction",
        )
        .await;

        match result {
            Err(AppError::NotFound(msg)) => assert!(msg.contains("session")),
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_upload_attaches_to_uploader_session() {
        let test_db = TestDbBuilder::new()
            .instructor("grace")
            .course("Algorithms", Some("grace"))
            .session("Algorithms", "13:00:00", "14:30:00", Some("grace"))
            .build()
            .await
            .expect("Failed to build test database");

        let pool = &test_db.pool;
        let session_id = test_db.session_ids[0];

        let video_id = upload_video(
            pool,
            "grace",
            "Sorting",
            "https://videos.example.com/sorting.mp4",
            "00:48:00",
            "Merge sort and quicksort",
        )
        .await
        .expect("Upload failed");

        let video = get_video(pool, video_id).await.expect("Fetch failed");
        assert_eq!(video.session_id, Some(session_id));
        assert_eq!(video.title, "Sorting");
        assert_eq!(video.url, "https://videos.example.com/sorting.mp4");
        assert!(video.upload_date.is_some());
    }

    #[tokio::test]
    async fn test_delete_video_reports_outcome() {
        let test_db = TestDbBuilder::new()
            .instructor("grace")
            .course("Algorithms", Some("grace"))
            .session("Algorithms", "13:00:00", "14:30:00", Some("grace"))
            .build()
            .await
            .expect("Failed to build test database");

        let pool = &test_db.pool;

        let video_id = upload_video(pool, "grace", "Graphs", "https://v.example.com/g.mp4", "", "")
            .await
            .expect("Upload failed");

        assert!(video_exists(pool, video_id).await.expect("Probe failed"));

        assert!(delete_video(pool, video_id).await.expect("Delete failed"));
        assert!(!video_exists(pool, video_id).await.expect("Probe failed"));
        assert!(
            !delete_video(pool, video_id)
                .await
                .expect("Second delete should not error")
        );
    }

    #[tokio::test]
    async fn test_course_video_url_for_missing_course() {
        let test_db = TestDbBuilder::new()
            .build()
            .await
            .expect("Failed to build test database");

        let result = get_course_video_url(&test_db.pool, 9).await;

        match result {
            Err(AppError::CourseNotFound(id)) => assert_eq!(id, 9),
            other => panic!("Expected CourseNotFound, got {:?}", other),
        }
    }
}
