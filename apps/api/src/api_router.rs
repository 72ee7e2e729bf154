use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

pub fn build_router(app_state: AppState) -> Router {
    let api_routes = Router::new()
        .route(
            "/api/authorize",
            post(handlers::authorize::authorize_handler),
        )
        .route(
            "/api/buckets/reset",
            post(handlers::buckets::reset_buckets_handler),
        )
        .route(
            "/api/allow-list",
            get(handlers::access_lists::list_allow_list_handler)
                .post(handlers::access_lists::add_to_allow_list_handler)
                .delete(handlers::access_lists::remove_from_allow_list_handler),
        )
        .route(
            "/api/deny-list",
            get(handlers::access_lists::list_deny_list_handler)
                .post(handlers::access_lists::add_to_deny_list_handler)
                .delete(handlers::access_lists::remove_from_deny_list_handler),
        );

    Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
