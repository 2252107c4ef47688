use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;
use stockfeed_signals::SignalResult;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct SignalQuery {
    pub ticker: Option<String>,
}

/// GET /api/v1/signals?ticker=XYZ
///
/// The aggregator absorbs its own failures, so the only error here is a
/// missing ticker.
pub(super) async fn get_signal(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<SignalQuery>,
) -> Result<Json<ApiResponse<SignalResult>>, ApiError> {
    let ticker = query
        .ticker
        .as_deref()
        .and_then(stockfeed_core::normalize_ticker)
        .ok_or_else(|| ApiError::new(req_id.0.clone(), "bad_request", "Ticker is required"))?;

    let data = state.signals.get_signal(&ticker).await;

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
