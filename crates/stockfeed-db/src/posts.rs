//! Database operations for the `posts` table.

use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};
use stockfeed_core::{AuthorRank, AuthorStanding, Sentiment, SignalPost};
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `posts` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostRow {
    pub id: i64,
    pub public_id: Uuid,
    pub author_id: i64,
    pub content: String,
    pub ticker: Option<String>,
    pub sentiment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A ticker post joined with its author's standing and optional insight
/// quality, as read by the signal aggregator.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TickerPostRow {
    pub id: i64,
    pub content: String,
    pub sentiment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub author_reputation_score: i32,
    pub author_rank: String,
    pub insight_quality_score: Option<i32>,
}

impl TickerPostRow {
    /// Convert into the domain type. An unrecognised stored sentiment is
    /// treated as not yet analyzed.
    #[must_use]
    pub fn into_signal_post(self) -> SignalPost {
        let sentiment = self.sentiment.as_deref().and_then(|raw| {
            raw.parse::<Sentiment>()
                .map_err(|e| {
                    tracing::warn!(post_id = self.id, error = %e, "ignoring stored sentiment");
                })
                .ok()
        });

        SignalPost {
            id: self.id,
            content: self.content,
            sentiment,
            created_at: self.created_at,
            author: AuthorStanding {
                reputation_score: self.author_reputation_score,
                rank: AuthorRank::from_db(&self.author_rank),
            },
            insight_quality: self.insight_quality_score,
        }
    }
}

/// A post as shown in the public feed.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FeedPostRow {
    pub id: i64,
    pub public_id: Uuid,
    pub content: String,
    pub ticker: Option<String>,
    pub sentiment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub author_username: String,
    pub author_display_name: Option<String>,
    pub author_rank: String,
    pub author_reputation_score: i32,
    pub insight_type: Option<String>,
    pub insight_summary: Option<String>,
    pub insight_quality_score: Option<i32>,
    pub insight_confidence: Option<f64>,
    pub tags: Vec<String>,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Insert a new post with no sentiment and return the stored row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_post(
    pool: &PgPool,
    author_id: i64,
    content: &str,
    ticker: Option<&str>,
) -> Result<PostRow, DbError> {
    let row = sqlx::query_as::<_, PostRow>(
        "INSERT INTO posts (author_id, content, ticker) \
         VALUES ($1, $2, $3) \
         RETURNING id, public_id, author_id, content, ticker, sentiment, created_at",
    )
    .bind(author_id)
    .bind(content)
    .bind(ticker)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Returns a single post by id, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_post(pool: &PgPool, post_id: i64) -> Result<Option<PostRow>, DbError> {
    let row = sqlx::query_as::<_, PostRow>(
        "SELECT id, public_id, author_id, content, ticker, sentiment, created_at \
         FROM posts \
         WHERE id = $1",
    )
    .bind(post_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Set a post's sentiment if it has none yet.
///
/// Returns `true` when the sentiment was written, `false` when the post
/// already carried one (or does not exist).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn set_post_sentiment_once<'e, E>(
    executor: E,
    post_id: i64,
    sentiment: Sentiment,
) -> Result<bool, DbError>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(
        "UPDATE posts SET sentiment = $2 \
         WHERE id = $1 AND sentiment IS NULL",
    )
    .bind(post_id)
    .bind(sentiment.as_str())
    .execute(executor)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// All posts for `ticker` created strictly after `since`, joined with the
/// author's standing and the insight quality score.
///
/// Ordered oldest first. No row limit.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_ticker_posts_since(
    pool: &PgPool,
    ticker: &str,
    since: DateTime<Utc>,
) -> Result<Vec<TickerPostRow>, DbError> {
    let rows = sqlx::query_as::<_, TickerPostRow>(
        "SELECT p.id, p.content, p.sentiment, p.created_at, \
                u.reputation_score AS author_reputation_score, \
                u.rank AS author_rank, \
                i.quality_score AS insight_quality_score \
         FROM posts p \
         JOIN users u ON u.id = p.author_id \
         LEFT JOIN insights i ON i.post_id = p.id \
         WHERE p.ticker = $1 AND p.created_at > $2 \
         ORDER BY p.created_at, p.id",
    )
    .bind(ticker)
    .bind(since)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Whether `author_id` has posted about `ticker` strictly after `since`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn has_recent_post_by_author(
    pool: &PgPool,
    author_id: i64,
    ticker: &str,
    since: DateTime<Utc>,
) -> Result<bool, DbError> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS ( \
             SELECT 1 FROM posts \
             WHERE author_id = $1 AND ticker = $2 AND created_at > $3 \
         )",
    )
    .bind(author_id)
    .bind(ticker)
    .bind(since)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// Newest posts across all tickers, with author, insight and tag names.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_recent_posts(pool: &PgPool, limit: i64) -> Result<Vec<FeedPostRow>, DbError> {
    let rows = sqlx::query_as::<_, FeedPostRow>(
        "SELECT p.id, p.public_id, p.content, p.ticker, p.sentiment, p.created_at, \
                u.username AS author_username, \
                u.display_name AS author_display_name, \
                u.rank AS author_rank, \
                u.reputation_score AS author_reputation_score, \
                i.insight_type, \
                i.summary AS insight_summary, \
                i.quality_score AS insight_quality_score, \
                i.confidence AS insight_confidence, \
                COALESCE( \
                    (SELECT array_agg(t.name ORDER BY t.name) \
                     FROM post_tags pt JOIN tags t ON t.id = pt.tag_id \
                     WHERE pt.post_id = p.id), \
                    ARRAY[]::TEXT[] \
                ) AS tags \
         FROM posts p \
         JOIN users u ON u.id = p.author_id \
         LEFT JOIN insights i ON i.post_id = p.id \
         ORDER BY p.created_at DESC, p.id DESC \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
