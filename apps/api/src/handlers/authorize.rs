use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use bfguard_domain::DecisionReason;
use tracing::info;

use crate::dto::{AuthorizeRequest, StatusResponse};
use crate::state::AppState;

/// Decides one login attempt.
///
/// Denials are answered with 200. A failed backend check is answered with 503.
pub async fn authorize_handler(
    State(state): State<AppState>,
    Json(payload): Json<AuthorizeRequest>,
) -> (StatusCode, Json<StatusResponse>) {
    let outcome = state
        .authorization_service
        .authorize(
            payload.login.as_str(),
            payload.password.as_str(),
            payload.ip.as_str(),
        )
        .await;

    info!(
        allowed = outcome.decision.allowed(),
        reason = outcome.decision.reason().as_str(),
        "authorization decided"
    );

    let status = if outcome.decision.reason() == DecisionReason::CheckError {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (status, Json(StatusResponse::from(&outcome)))
}
