//! Video upsert, listing, search, and stats queries.

use crate::error::DatabaseError;
use crate::{Error, Result};

use super::{Database, NewVideo, SearchSort, SortOrder, VideoFilter, VideoRow, VideoSort, VideoStats};

/// Escape LIKE wildcards in a user-supplied search term
///
/// `%` and `_` match anything in LIKE patterns; a literal backslash must be
/// doubled because it is the ESCAPE character.
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Build the WHERE fragment for a multi-term search
///
/// Every term must match (AND), and a term matches when it appears in the
/// title, description, or channel title (OR), case-insensitively.
fn search_conditions(term_count: usize) -> String {
    let clause = "(LOWER(title) LIKE ? ESCAPE '\\' \
                  OR LOWER(description) LIKE ? ESCAPE '\\' \
                  OR LOWER(channel_title) LIKE ? ESCAPE '\\')";
    std::iter::repeat_n(clause, term_count)
        .collect::<Vec<_>>()
        .join(" AND ")
}

const VIDEO_COLUMNS: &str = "id, video_id, title, video_url, description, published_at, \
                             channel_id, channel_title, thumbnails, view_count, like_count, \
                             comment_count, duration_seconds, created_at, updated_at";

impl Database {
    /// Insert or update a video record, keyed on the upstream video id
    ///
    /// Last write wins: every mapped field is overwritten with the latest
    /// value. `created_at` is preserved for existing rows; `updated_at` is
    /// refreshed on every call.
    pub async fn upsert_video(&self, video: &NewVideo) -> Result<()> {
        let now = chrono::Utc::now().timestamp();

        sqlx::query(
            r#"
            INSERT INTO videos (
                video_id, title, video_url, description, published_at,
                channel_id, channel_title, thumbnails, view_count, like_count,
                comment_count, duration_seconds, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(video_id) DO UPDATE SET
                title = excluded.title,
                video_url = excluded.video_url,
                description = excluded.description,
                published_at = excluded.published_at,
                channel_id = excluded.channel_id,
                channel_title = excluded.channel_title,
                thumbnails = excluded.thumbnails,
                view_count = excluded.view_count,
                like_count = excluded.like_count,
                comment_count = excluded.comment_count,
                duration_seconds = excluded.duration_seconds,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&video.video_id)
        .bind(&video.title)
        .bind(&video.video_url)
        .bind(&video.description)
        .bind(video.published_at)
        .bind(&video.channel_id)
        .bind(&video.channel_title)
        .bind(&video.thumbnails)
        .bind(video.view_count)
        .bind(video.like_count)
        .bind(video.comment_count)
        .bind(video.duration_seconds)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to upsert video {}: {}",
                video.video_id, e
            )))
        })?;

        Ok(())
    }

    /// Get a video by database row id
    pub async fn get_video(&self, id: i64) -> Result<Option<VideoRow>> {
        let row = sqlx::query_as::<_, VideoRow>(&format!(
            "SELECT {VIDEO_COLUMNS} FROM videos WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to get video: {}",
                e
            )))
        })?;

        Ok(row)
    }

    /// Get a video by upstream video id
    pub async fn get_video_by_video_id(&self, video_id: &str) -> Result<Option<VideoRow>> {
        let row = sqlx::query_as::<_, VideoRow>(&format!(
            "SELECT {VIDEO_COLUMNS} FROM videos WHERE video_id = ?"
        ))
        .bind(video_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to get video by video_id: {}",
                e
            )))
        })?;

        Ok(row)
    }

    /// List videos with filtering, sorting, and pagination
    pub async fn list_videos(
        &self,
        filter: &VideoFilter,
        sort: VideoSort,
        order: SortOrder,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<VideoRow>> {
        let mut sql = format!("SELECT {VIDEO_COLUMNS} FROM videos WHERE 1=1");
        if filter.channel_id.is_some() {
            sql.push_str(" AND channel_id = ?");
        }
        if filter.published_from.is_some() {
            sql.push_str(" AND published_at >= ?");
        }
        if filter.published_to.is_some() {
            sql.push_str(" AND published_at <= ?");
        }
        // Sort column and direction come from closed enums, not user input
        sql.push_str(&format!(
            " ORDER BY {} {} LIMIT ? OFFSET ?",
            sort.column(),
            order.sql()
        ));

        let mut query = sqlx::query_as::<_, VideoRow>(&sql);
        if let Some(channel_id) = &filter.channel_id {
            query = query.bind(channel_id);
        }
        if let Some(from) = filter.published_from {
            query = query.bind(from);
        }
        if let Some(to) = filter.published_to {
            query = query.bind(to);
        }
        let rows = query
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to list videos: {}",
                    e
                )))
            })?;

        Ok(rows)
    }

    /// Count videos matching a filter
    pub async fn count_videos(&self, filter: &VideoFilter) -> Result<i64> {
        let mut sql = String::from("SELECT COUNT(*) FROM videos WHERE 1=1");
        if filter.channel_id.is_some() {
            sql.push_str(" AND channel_id = ?");
        }
        if filter.published_from.is_some() {
            sql.push_str(" AND published_at >= ?");
        }
        if filter.published_to.is_some() {
            sql.push_str(" AND published_at <= ?");
        }

        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        if let Some(channel_id) = &filter.channel_id {
            query = query.bind(channel_id);
        }
        if let Some(from) = filter.published_from {
            query = query.bind(from);
        }
        if let Some(to) = filter.published_to {
            query = query.bind(to);
        }
        let count = query.fetch_one(&self.pool).await.map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to count videos: {}",
                e
            )))
        })?;

        Ok(count)
    }

    /// Search stored videos by substring terms
    ///
    /// Every term must appear in the title, description, or channel title
    /// (case-insensitive). `SearchSort::Relevance` orders by publication time
    /// descending.
    pub async fn search_videos(
        &self,
        terms: &[String],
        sort: SearchSort,
        order: SortOrder,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<VideoRow>> {
        if terms.is_empty() {
            return Ok(vec![]);
        }

        let order_by = match sort {
            SearchSort::Relevance => "published_at DESC".to_string(),
            SearchSort::PublishedAt => format!("published_at {}", order.sql()),
            SearchSort::ViewCount => format!("view_count {}", order.sql()),
        };
        let sql = format!(
            "SELECT {VIDEO_COLUMNS} FROM videos WHERE {} ORDER BY {} LIMIT ? OFFSET ?",
            search_conditions(terms.len()),
            order_by
        );

        let mut query = sqlx::query_as::<_, VideoRow>(&sql);
        for term in terms {
            let pattern = format!("%{}%", escape_like(&term.to_lowercase()));
            // One pattern per column in the OR group
            query = query.bind(pattern.clone()).bind(pattern.clone()).bind(pattern);
        }
        let rows = query
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to search videos: {}",
                    e
                )))
            })?;

        Ok(rows)
    }

    /// Count videos matching the given search terms
    pub async fn count_search_videos(&self, terms: &[String]) -> Result<i64> {
        if terms.is_empty() {
            return Ok(0);
        }

        let sql = format!(
            "SELECT COUNT(*) FROM videos WHERE {}",
            search_conditions(terms.len())
        );

        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        for term in terms {
            let pattern = format!("%{}%", escape_like(&term.to_lowercase()));
            query = query.bind(pattern.clone()).bind(pattern.clone()).bind(pattern);
        }
        let count = query.fetch_one(&self.pool).await.map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to count search results: {}",
                e
            )))
        })?;

        Ok(count)
    }

    /// Aggregate statistics over all stored videos
    pub async fn video_stats(&self) -> Result<VideoStats> {
        let row = sqlx::query_as::<_, (i64, i64, Option<i64>, Option<i64>)>(
            r#"
            SELECT COUNT(*), COUNT(DISTINCT channel_id), MAX(published_at), MIN(published_at)
            FROM videos
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to compute video stats: {}",
                e
            )))
        })?;

        Ok(VideoStats {
            total_videos: row.0,
            total_channels: row.1,
            latest_published_at: row.2,
            oldest_published_at: row.3,
        })
    }
}
