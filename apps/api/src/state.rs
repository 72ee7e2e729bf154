use std::sync::Arc;

use bfguard_application::{AccessListService, AttemptTracker, AuthorizationService};

use crate::api_config::TrackerBackend;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub authorization_service: AuthorizationService,
    pub access_list_service: AccessListService,
    pub attempt_tracker: Arc<dyn AttemptTracker>,
    pub tracker_backend: TrackerBackend,
}
