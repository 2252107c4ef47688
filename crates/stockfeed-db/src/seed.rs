use sqlx::PgPool;
use stockfeed_core::{AuthorRank, InsightType, PostAnalysis, Sentiment};

use crate::{insights::record_post_analysis, users::upsert_ranked_user, DbError};

struct SeedAuthor {
    username: &'static str,
    display_name: &'static str,
    bio: &'static str,
    reputation_score: i32,
    rank: AuthorRank,
}

struct SeedPost {
    author: usize,
    ticker: &'static str,
    content: &'static str,
    sentiment: Sentiment,
    insight_type: InsightType,
    summary: &'static str,
    quality_score: i32,
    confidence: f64,
    tags: &'static [&'static str],
}

const AUTHORS: &[SeedAuthor] = &[
    SeedAuthor {
        username: "MarketOracle",
        display_name: "Market Oracle",
        bio: "Long-horizon macro and momentum calls.",
        reputation_score: 950,
        rank: AuthorRank::Oracle,
    },
    SeedAuthor {
        username: "TechAnalyst",
        display_name: "Tech Sector Expert",
        bio: "Semiconductors and EV names.",
        reputation_score: 880,
        rank: AuthorRank::Expert,
    },
];

const POSTS: &[SeedPost] = &[
    SeedPost {
        author: 0,
        ticker: "NVDA",
        content: "NVDA keeps defending the 140 area while datacenter orders stay strong. Adding on dips.",
        sentiment: Sentiment::Bullish,
        insight_type: InsightType::Technical,
        summary: "Support holding, demand tailwind",
        quality_score: 92,
        confidence: 0.85,
        tags: &["Tech", "AI"],
    },
    SeedPost {
        author: 0,
        ticker: "TSLA",
        content: "TSLA looks stretched here. Expecting a pullback toward the 200-day before any new leg up.",
        sentiment: Sentiment::Bearish,
        insight_type: InsightType::Technical,
        summary: "Overextended, mean reversion likely",
        quality_score: 88,
        confidence: 0.75,
        tags: &["High Risk"],
    },
    SeedPost {
        author: 1,
        ticker: "NIO",
        content: "NIO deliveries came in ahead of estimates and share gains in China look durable.",
        sentiment: Sentiment::Bullish,
        insight_type: InsightType::Fundamental,
        summary: "Delivery beat, share gains",
        quality_score: 85,
        confidence: 0.78,
        tags: &["Earnings"],
    },
    SeedPost {
        author: 1,
        ticker: "SOFI",
        content: "SOFI clearing its consolidation range as money rotates back into fintech.",
        sentiment: Sentiment::Bullish,
        insight_type: InsightType::Technical,
        summary: "Range breakout, sector rotation",
        quality_score: 82,
        confidence: 0.72,
        tags: &["Finance"],
    },
    SeedPost {
        author: 0,
        ticker: "PLTR",
        content: "PLTR is sitting right under resistance. Waiting for a confirmed close above 25.",
        sentiment: Sentiment::Neutral,
        insight_type: InsightType::Technical,
        summary: "At resistance, needs confirmation",
        quality_score: 78,
        confidence: 0.68,
        tags: &["Tech"],
    },
];

/// Upsert the demo expert authors and give each trending ticker one analyzed
/// post.
///
/// Posts are only inserted when the same author has no post with identical
/// content, so repeated runs are idempotent. Returns the number of posts
/// inserted by this call.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_demo_data(pool: &PgPool) -> Result<usize, DbError> {
    let mut author_ids = Vec::with_capacity(AUTHORS.len());
    for author in AUTHORS {
        let row = upsert_ranked_user(
            pool,
            author.username,
            author.display_name,
            author.bio,
            author.reputation_score,
            author.rank,
        )
        .await?;
        author_ids.push(row.id);
    }

    let mut inserted = 0usize;
    for post in POSTS {
        let author_id = author_ids[post.author];

        let post_id: Option<i64> = sqlx::query_scalar(
            "INSERT INTO posts (author_id, content, ticker) \
             SELECT $1, $2, $3 \
             WHERE NOT EXISTS ( \
                 SELECT 1 FROM posts WHERE author_id = $1 AND content = $2 \
             ) \
             RETURNING id",
        )
        .bind(author_id)
        .bind(post.content)
        .bind(post.ticker)
        .fetch_optional(pool)
        .await?;

        let Some(post_id) = post_id else {
            tracing::debug!(ticker = post.ticker, "seed post already present");
            continue;
        };

        let analysis = PostAnalysis {
            tags: post.tags.iter().map(ToString::to_string).collect(),
            sentiment: post.sentiment,
            quality_score: post.quality_score,
            insight_type: post.insight_type,
            summary: post.summary.to_string(),
            confidence: post.confidence,
        };
        record_post_analysis(pool, post_id, author_id, &analysis).await?;
        inserted += 1;
    }

    tracing::info!(authors = AUTHORS.len(), posts = inserted, "seeded demo data");
    Ok(inserted)
}
