use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use crate::dto::{HealthResponse, TrackerHealth};
use crate::state::AppState;

pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let tracker = match state.attempt_tracker.ping().await {
        Ok(()) => TrackerHealth {
            backend: state.tracker_backend.as_str(),
            status: "ok",
            detail: None,
        },
        Err(error) => TrackerHealth {
            backend: state.tracker_backend.as_str(),
            status: "error",
            detail: Some(error.to_string()),
        },
    };

    let ready = tracker.status == "ok";
    let (http_status, status) = if ready {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        http_status,
        Json(HealthResponse {
            status,
            ready,
            tracker,
        }),
    )
}
