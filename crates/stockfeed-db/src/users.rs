//! Database operations for the `users` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use stockfeed_core::AuthorRank;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `users` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub reputation_score: i32,
    pub rank: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user with their post count, for the analyst leaderboard.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AnalystRow {
    pub id: i64,
    pub username: String,
    pub display_name: Option<String>,
    pub rank: String,
    pub created_at: DateTime<Utc>,
    pub post_count: i64,
}

impl UserRow {
    #[must_use]
    pub fn author_rank(&self) -> AuthorRank {
        AuthorRank::from_db(&self.rank)
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Return the user with `username`, creating an ordinary member if none exists.
///
/// Existing users are returned untouched: rank and reputation are maintained
/// elsewhere.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn ensure_user(pool: &PgPool, username: &str) -> Result<UserRow, DbError> {
    let row = sqlx::query_as::<_, UserRow>(
        "INSERT INTO users (username) VALUES ($1) \
         ON CONFLICT (username) DO UPDATE SET username = EXCLUDED.username \
         RETURNING id, username, display_name, bio, reputation_score, rank, created_at, updated_at",
    )
    .bind(username)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Returns a single user by username, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_user_by_username(
    pool: &PgPool,
    username: &str,
) -> Result<Option<UserRow>, DbError> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, username, display_name, bio, reputation_score, rank, created_at, updated_at \
         FROM users \
         WHERE username = $1",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Insert or update a user with an explicit rank and reputation.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_ranked_user(
    pool: &PgPool,
    username: &str,
    display_name: &str,
    bio: &str,
    reputation_score: i32,
    rank: AuthorRank,
) -> Result<UserRow, DbError> {
    let row = sqlx::query_as::<_, UserRow>(
        "INSERT INTO users (username, display_name, bio, reputation_score, rank) \
         VALUES ($1, $2, $3, $4, $5) \
         ON CONFLICT (username) DO UPDATE SET \
             display_name = EXCLUDED.display_name, \
             bio = EXCLUDED.bio, \
             reputation_score = EXCLUDED.reputation_score, \
             rank = EXCLUDED.rank, \
             updated_at = NOW() \
         RETURNING id, username, display_name, bio, reputation_score, rank, created_at, updated_at",
    )
    .bind(username)
    .bind(display_name)
    .bind(bio)
    .bind(reputation_score)
    .bind(rank.as_str())
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// The `limit` longest-standing users, oldest account first, with how many
/// posts each has written.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_veteran_analysts(pool: &PgPool, limit: i64) -> Result<Vec<AnalystRow>, DbError> {
    let rows = sqlx::query_as::<_, AnalystRow>(
        "SELECT u.id, u.username, u.display_name, u.rank, u.created_at, \
                (SELECT COUNT(*) FROM posts p WHERE p.author_id = u.id) AS post_count \
         FROM users u \
         ORDER BY u.created_at, u.id \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
