use axum::{extract::State, Extension, Json};
use stockfeed_signals::PulseReport;

use crate::middleware::RequestId;

use super::{ApiResponse, AppState, ResponseMeta};

/// GET /api/v1/market/pulse
pub(super) async fn get_market_pulse(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<PulseReport>> {
    let data = state.pulse.report().await;
    Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    })
}
