//! Post publishing and the recent-post feed.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stockfeed_core::PostAnalysis;
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

const MAX_CONTENT_CHARS: usize = 5000;

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct CreatePostRequest {
    pub author: String,
    pub content: String,
    #[serde(default)]
    pub ticker: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct PostsQuery {
    pub limit: Option<i64>,
}

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(super) struct CreatedPost {
    pub id: Uuid,
    pub author: String,
    pub content: String,
    pub ticker: Option<String>,
    pub sentiment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub analysis: PostAnalysis,
}

#[derive(Debug, Serialize)]
pub(super) struct PostAuthor {
    pub username: String,
    pub display_name: Option<String>,
    pub rank: String,
    pub reputation_score: i32,
}

#[derive(Debug, Serialize)]
pub(super) struct PostInsight {
    pub insight_type: String,
    pub summary: String,
    pub quality_score: i32,
    pub confidence: f64,
}

#[derive(Debug, Serialize)]
pub(super) struct FeedPost {
    pub id: Uuid,
    pub content: String,
    pub ticker: Option<String>,
    pub sentiment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub author: PostAuthor,
    pub insight: Option<PostInsight>,
    pub tags: Vec<String>,
}

impl From<stockfeed_db::FeedPostRow> for FeedPost {
    fn from(row: stockfeed_db::FeedPostRow) -> Self {
        let insight = match (
            row.insight_type,
            row.insight_summary,
            row.insight_quality_score,
            row.insight_confidence,
        ) {
            (Some(insight_type), Some(summary), Some(quality_score), Some(confidence)) => {
                Some(PostInsight {
                    insight_type,
                    summary,
                    quality_score,
                    confidence,
                })
            }
            _ => None,
        };

        Self {
            id: row.public_id,
            content: row.content,
            ticker: row.ticker,
            sentiment: row.sentiment,
            created_at: row.created_at,
            author: PostAuthor {
                username: row.author_username,
                display_name: row.author_display_name,
                rank: stockfeed_core::AuthorRank::from_db(&row.author_rank)
                    .as_str()
                    .to_string(),
                reputation_score: row.author_reputation_score,
            },
            insight,
            tags: row.tags,
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/posts: store the post, analyze it, record the analysis.
pub(super) async fn create_post(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CreatedPost>>), ApiError> {
    let rid = &req_id.0;

    let content = body.content.trim();
    if content.is_empty() || content.chars().count() > MAX_CONTENT_CHARS {
        return Err(ApiError::new(
            rid,
            "validation_error",
            format!("content must be 1-{MAX_CONTENT_CHARS} characters"),
        ));
    }
    let author = body.author.trim();
    if author.is_empty() {
        return Err(ApiError::new(rid, "validation_error", "author is required"));
    }
    let ticker = body
        .ticker
        .as_deref()
        .and_then(stockfeed_core::normalize_ticker);

    let user = stockfeed_db::ensure_user(&state.pool, author)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    let post = stockfeed_db::insert_post(&state.pool, user.id, content, ticker.as_deref())
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    let analysis = state.analyzer.analyze(content).await;

    stockfeed_db::record_post_analysis(&state.pool, post.id, user.id, &analysis)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    let stored = stockfeed_db::get_post(&state.pool, post.id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::new(rid, "not_found", "post disappeared after insert"))?;

    tracing::info!(
        post_id = stored.id,
        author = %user.username,
        ticker = ?stored.ticker,
        sentiment = %analysis.sentiment,
        "post published"
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: CreatedPost {
                id: stored.public_id,
                author: user.username,
                content: stored.content,
                ticker: stored.ticker,
                sentiment: stored.sentiment,
                created_at: stored.created_at,
                analysis,
            },
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// GET /api/v1/posts?limit=N: newest posts first.
pub(super) async fn list_posts(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<PostsQuery>,
) -> Result<Json<ApiResponse<Vec<FeedPost>>>, ApiError> {
    let rows = stockfeed_db::list_recent_posts(&state.pool, normalize_limit(query.limit))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(FeedPost::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}
