//! Analyst leaderboard.

use axum::{extract::State, Extension, Json};
use serde::Serialize;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

const LEADERBOARD_SIZE: i64 = 3;
const BASE_ACCURACY: i64 = 85;
const MAX_POST_BONUS: i64 = 10;
const MAX_ACCURACY: i64 = 99;

#[derive(Debug, Serialize)]
pub(super) struct AnalystItem {
    pub username: String,
    pub display_name: Option<String>,
    pub rank: String,
    pub post_count: i64,
    pub accuracy: i64,
    pub rank_display: String,
}

/// Displayed accuracy for the analyst at leaderboard `position` (0-based):
/// 85, plus 2 per post up to 10, plus a seniority bonus, capped at 99.
pub(super) fn accuracy(post_count: i64, position: usize) -> i64 {
    let position = i64::try_from(position).unwrap_or(LEADERBOARD_SIZE);
    let seniority = (LEADERBOARD_SIZE - position).max(0) * 2;
    let post_bonus = post_count.saturating_mul(2).min(MAX_POST_BONUS);
    (BASE_ACCURACY + post_bonus + seniority).min(MAX_ACCURACY)
}

/// GET /api/v1/analysts
pub(super) async fn list_analysts(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<AnalystItem>>>, ApiError> {
    let rows = stockfeed_db::list_veteran_analysts(&state.pool, LEADERBOARD_SIZE)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .enumerate()
        .map(|(position, row)| AnalystItem {
            accuracy: accuracy(row.post_count, position),
            rank_display: format!("#{}", position + 1),
            username: row.username,
            display_name: row.display_name,
            rank: row.rank,
            post_count: row.post_count,
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
