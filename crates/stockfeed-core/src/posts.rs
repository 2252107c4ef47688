//! Post, author and sentiment domain types shared by the store and the
//! signal aggregator.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Coarse opinion polarity attached to a post once analysis has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Sentiment {
    Bullish,
    Bearish,
    Neutral,
}

impl Sentiment {
    /// The value stored in `posts.sentiment`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Sentiment::Bullish => "BULLISH",
            Sentiment::Bearish => "BEARISH",
            Sentiment::Neutral => "NEUTRAL",
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sentiment {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BULLISH" => Ok(Sentiment::Bullish),
            "BEARISH" => Ok(Sentiment::Bearish),
            "NEUTRAL" => Ok(Sentiment::Neutral),
            _ => Err(CoreError::InvalidSentiment(s.to_string())),
        }
    }
}

/// Author standing tier. Only `Expert` and `Oracle` carry extra weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthorRank {
    Member,
    Expert,
    Oracle,
}

impl AuthorRank {
    /// Read a rank from its stored form. Unknown values are ordinary members.
    #[must_use]
    pub fn from_db(raw: &str) -> Self {
        match raw.trim() {
            "Expert" => AuthorRank::Expert,
            "Oracle" => AuthorRank::Oracle,
            _ => AuthorRank::Member,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AuthorRank::Member => "Member",
            AuthorRank::Expert => "Expert",
            AuthorRank::Oracle => "Oracle",
        }
    }

    /// `true` for the elevated ranks whose posts form the expert consensus.
    #[must_use]
    pub fn is_expert(self) -> bool {
        matches!(self, AuthorRank::Expert | AuthorRank::Oracle)
    }
}

impl std::fmt::Display for AuthorRank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The slice of an author the aggregator reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorStanding {
    pub reputation_score: i32,
    pub rank: AuthorRank,
}

/// A post as loaded for signal aggregation: joined with its author's
/// standing and, when analysis produced one, its insight quality score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalPost {
    pub id: i64,
    pub content: String,
    pub sentiment: Option<Sentiment>,
    pub created_at: DateTime<Utc>,
    pub author: AuthorStanding,
    /// Insight quality score in `0..=100`, if an insight is attached.
    pub insight_quality: Option<i32>,
}

/// Normalize a user-supplied ticker: trim, drop a leading `$`, upper-case.
///
/// Returns `None` when nothing is left.
#[must_use]
pub fn normalize_ticker(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('$').unwrap_or(trimmed).trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_ascii_uppercase())
    }
}
