//! Seams between the aggregator and the outside world.
//!
//! The aggregator, the post analyzer, the market pulse and the expert desk
//! only ever talk to these traits. Production wiring injects [`PgPostStore`],
//! [`PgExpertStore`], [`stockfeed_market::QuoteClient`] and
//! [`crate::OllamaClient`]; tests inject in-memory fakes.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use stockfeed_core::{AuthorRank, SignalPost};
use stockfeed_market::{MarketQuote, QuoteClient};

use crate::error::SignalError;
use crate::experts::ExpertPost;

/// Reads the post corpus for one ticker.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Every post for `ticker` created strictly after `since`, with the
    /// author's standing and the optional insight quality attached.
    ///
    /// An empty window is `Ok(vec![])`, never an error.
    async fn find_posts(
        &self,
        ticker: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<SignalPost>, SignalError>;
}

/// Fetches a live quote for a symbol.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn quote(&self, symbol: &str) -> Result<MarketQuote, SignalError>;
}

/// Single-shot text completion.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Completes `prompt`, giving up after `timeout`.
    async fn generate(&self, prompt: &str, timeout: Duration) -> Result<String, SignalError>;
}

/// Identity of a bot author.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorProfile<'a> {
    pub username: &'a str,
    pub display_name: &'a str,
    pub bio: &'a str,
    pub reputation_score: i32,
    pub rank: AuthorRank,
}

/// Storage used by the expert desk.
#[async_trait]
pub trait ExpertStore: Send + Sync {
    /// Create or refresh the author and return its user id.
    async fn ensure_author(&self, profile: &AuthorProfile<'_>) -> Result<i64, SignalError>;

    /// Whether `author_id` already posted about `ticker` after `since`.
    async fn has_recent_post(
        &self,
        author_id: i64,
        ticker: &str,
        since: DateTime<Utc>,
    ) -> Result<bool, SignalError>;

    /// Store the post with its analysis and return the new post id.
    async fn publish(&self, author_id: i64, post: &ExpertPost) -> Result<i64, SignalError>;
}

/// Postgres-backed [`PostStore`].
#[derive(Debug, Clone)]
pub struct PgPostStore {
    pool: PgPool,
}

impl PgPostStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostStore for PgPostStore {
    async fn find_posts(
        &self,
        ticker: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<SignalPost>, SignalError> {
        let rows = stockfeed_db::list_ticker_posts_since(&self.pool, ticker, since).await?;
        Ok(rows
            .into_iter()
            .map(stockfeed_db::TickerPostRow::into_signal_post)
            .collect())
    }
}

#[async_trait]
impl QuoteProvider for QuoteClient {
    async fn quote(&self, symbol: &str) -> Result<MarketQuote, SignalError> {
        Ok(self.get_quote(symbol).await?)
    }
}

/// Postgres-backed [`ExpertStore`].
#[derive(Debug, Clone)]
pub struct PgExpertStore {
    pool: PgPool,
}

impl PgExpertStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExpertStore for PgExpertStore {
    async fn ensure_author(&self, profile: &AuthorProfile<'_>) -> Result<i64, SignalError> {
        let row = stockfeed_db::upsert_ranked_user(
            &self.pool,
            profile.username,
            profile.display_name,
            profile.bio,
            profile.reputation_score,
            profile.rank,
        )
        .await?;
        Ok(row.id)
    }

    async fn has_recent_post(
        &self,
        author_id: i64,
        ticker: &str,
        since: DateTime<Utc>,
    ) -> Result<bool, SignalError> {
        Ok(stockfeed_db::has_recent_post_by_author(&self.pool, author_id, ticker, since).await?)
    }

    async fn publish(&self, author_id: i64, post: &ExpertPost) -> Result<i64, SignalError> {
        let row =
            stockfeed_db::insert_post(&self.pool, author_id, &post.content, Some(&post.ticker))
                .await?;
        stockfeed_db::record_post_analysis(&self.pool, row.id, author_id, &post.analysis).await?;
        Ok(row.id)
    }
}
