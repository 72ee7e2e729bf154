use std::sync::Arc;

use bfguard_application::{AccessListService, AuthorizationService, SubnetRegistry};
use bfguard_core::AppError;
use bfguard_infrastructure::InMemorySubnetRegistry;

use crate::api_config::ApiConfig;
use crate::state::AppState;

use super::redis::build_redis_client;

mod trackers;

pub fn build_app_state(config: &ApiConfig) -> Result<AppState, AppError> {
    let redis_client = config
        .redis_url
        .as_deref()
        .map(build_redis_client)
        .transpose()?;

    let subnet_registry: Arc<dyn SubnetRegistry> = Arc::new(InMemorySubnetRegistry::new());
    let attempt_tracker = trackers::build_attempt_tracker(config, redis_client)?;

    Ok(AppState {
        authorization_service: AuthorizationService::new(
            subnet_registry.clone(),
            attempt_tracker.clone(),
            config.attempt_limits,
        ),
        access_list_service: AccessListService::new(subnet_registry, attempt_tracker.clone()),
        attempt_tracker,
        tracker_backend: config.tracker_backend,
    })
}
