use super::Database;
use tempfile::NamedTempFile;

mod migrations;

/// Helper: create a fresh database with migrations applied
async fn setup_db() -> (Database, NamedTempFile) {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();
    (db, temp_file)
}

/// Helper: a NewVideo with sensible defaults
fn sample_video(video_id: &str) -> super::NewVideo {
    super::NewVideo {
        video_id: video_id.to_string(),
        title: format!("Video {video_id}"),
        video_url: format!("https://www.youtube.com/watch?v={video_id}"),
        description: "A test video".to_string(),
        published_at: 1_700_000_000,
        channel_id: "UC-test".to_string(),
        channel_title: "Test Channel".to_string(),
        thumbnails: Some(r#"{"default":{"url":"https://i.ytimg.com/t.jpg"}}"#.to_string()),
        view_count: 100,
        like_count: 10,
        comment_count: 5,
        duration_seconds: 240,
    }
}
