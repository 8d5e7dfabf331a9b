use super::setup_db;
use crate::db::Database;
use tempfile::NamedTempFile;

#[tokio::test]
async fn fresh_database_creates_schema() {
    let (db, _temp_file) = setup_db().await;

    // Both tables must exist and accept inserts
    let mut conn = db.pool.acquire().await.unwrap();

    let result = sqlx::query(
        r#"
        INSERT INTO videos (video_id, title, video_url, description, published_at,
                            channel_id, channel_title, created_at, updated_at)
        VALUES ('v1', 'Title', 'https://www.youtube.com/watch?v=v1', '', 0, 'c1', 'Channel', 0, 0)
        "#,
    )
    .execute(&mut *conn)
    .await;
    assert!(result.is_ok(), "Should insert into videos table");

    let result = sqlx::query(
        r#"
        INSERT INTO api_keys (key_value, quota_used, quota_limit, epoch_day, created_at)
        VALUES ('key-1', 0, 10000, '2024-01-01', 0)
        "#,
    )
    .execute(&mut *conn)
    .await;
    assert!(result.is_ok(), "Should insert into api_keys table");
}

#[tokio::test]
async fn schema_version_reaches_latest() {
    let (db, _temp_file) = setup_db().await;

    let version: i64 = sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
        .fetch_one(&db.pool)
        .await
        .unwrap();

    assert_eq!(version, 2, "All migrations should be recorded");
}

#[tokio::test]
async fn reopening_database_is_idempotent() {
    let temp_file = NamedTempFile::new().unwrap();

    // First open runs migrations
    let db = Database::new(temp_file.path()).await.unwrap();
    db.close().await;

    // Second open must not fail on already-applied migrations
    let db = Database::new(temp_file.path()).await.unwrap();

    let version: i64 = sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
        .fetch_one(&db.pool)
        .await
        .unwrap();
    assert_eq!(version, 2);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_version")
        .fetch_one(&db.pool)
        .await
        .unwrap();
    assert_eq!(count, 2, "Migrations must not be re-recorded on reopen");
}

#[tokio::test]
async fn video_id_is_unique() {
    let (db, _temp_file) = setup_db().await;
    let mut conn = db.pool.acquire().await.unwrap();

    sqlx::query(
        r#"
        INSERT INTO videos (video_id, title, video_url, description, published_at,
                            channel_id, channel_title, created_at, updated_at)
        VALUES ('dup', 'First', 'u', '', 0, 'c', 'C', 0, 0)
        "#,
    )
    .execute(&mut *conn)
    .await
    .unwrap();

    let result = sqlx::query(
        r#"
        INSERT INTO videos (video_id, title, video_url, description, published_at,
                            channel_id, channel_title, created_at, updated_at)
        VALUES ('dup', 'Second', 'u', '', 0, 'c', 'C', 0, 0)
        "#,
    )
    .execute(&mut *conn)
    .await;

    assert!(
        result.is_err(),
        "Plain insert of a duplicate video_id must violate the UNIQUE constraint"
    );
}
