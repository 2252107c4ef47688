//! Expert desk trigger.

use axum::{extract::State, Extension, Json};
use serde::Deserialize;
use stockfeed_signals::SyncReport;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Default, Deserialize)]
pub(super) struct SyncRequest {
    #[serde(default)]
    pub tickers: Vec<String>,
}

/// POST /api/v1/experts/sync
///
/// An empty `tickers` list covers the default watchlist.
pub(super) async fn sync_experts(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<SyncRequest>,
) -> Result<Json<ApiResponse<SyncReport>>, ApiError> {
    let data = state.experts.sync(&body.tickers).await.map_err(|e| {
        tracing::error!(error = %e, "expert sync failed");
        ApiError::new(req_id.0.clone(), "internal_error", "Failed to sync expert posts")
    })?;

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
