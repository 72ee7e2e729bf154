use axum::Json;
use axum::extract::State;

use crate::dto::{ResetBucketsRequest, StatusResponse};
use crate::state::AppState;

pub async fn reset_buckets_handler(
    State(state): State<AppState>,
    Json(payload): Json<ResetBucketsRequest>,
) -> Json<StatusResponse> {
    let report = state
        .access_list_service
        .reset_attempt_budget(payload.login.as_str(), payload.ip.as_str())
        .await;

    Json(StatusResponse::from(report))
}
