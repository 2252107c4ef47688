//! Database operations for `insights`, `tags` and `post_tags`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use stockfeed_core::{PostAnalysis, TagCategory};

use crate::{posts::set_post_sentiment_once, DbError};

/// A row from the `insights` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct InsightRow {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub insight_type: String,
    pub summary: String,
    pub quality_score: i32,
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
}

/// Persist the analysis of a post in a single transaction.
///
/// Inserts the insight (first write wins), upserts and links each tag, and
/// sets the post's sentiment if it has none. Returns `true` when the
/// sentiment was written by this call.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails; the whole batch is
/// rolled back.
pub async fn record_post_analysis(
    pool: &PgPool,
    post_id: i64,
    author_id: i64,
    analysis: &PostAnalysis,
) -> Result<bool, DbError> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO insights (post_id, author_id, insight_type, summary, quality_score, confidence) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         ON CONFLICT (post_id) DO NOTHING",
    )
    .bind(post_id)
    .bind(author_id)
    .bind(analysis.insight_type.as_str())
    .bind(&analysis.summary)
    .bind(analysis.quality_score)
    .bind(analysis.confidence)
    .execute(&mut *tx)
    .await?;

    for tag in &analysis.tags {
        let tag_id: i64 = sqlx::query_scalar(
            "INSERT INTO tags (name, category) VALUES ($1, $2) \
             ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name \
             RETURNING id",
        )
        .bind(tag)
        .bind(TagCategory::classify(tag).as_str())
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO post_tags (post_id, tag_id) VALUES ($1, $2) \
             ON CONFLICT (post_id, tag_id) DO NOTHING",
        )
        .bind(post_id)
        .bind(tag_id)
        .execute(&mut *tx)
        .await?;
    }

    let sentiment_written = set_post_sentiment_once(&mut *tx, post_id, analysis.sentiment).await?;

    tx.commit().await?;
    Ok(sentiment_written)
}

/// Returns the insight attached to a post, or `None`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_insight_for_post(
    pool: &PgPool,
    post_id: i64,
) -> Result<Option<InsightRow>, DbError> {
    let row = sqlx::query_as::<_, InsightRow>(
        "SELECT id, post_id, author_id, insight_type, summary, quality_score, confidence, created_at \
         FROM insights \
         WHERE post_id = $1",
    )
    .bind(post_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
