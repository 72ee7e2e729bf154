use std::sync::Arc;

use bfguard_application::AttemptTracker;
use bfguard_core::{AppError, AppResult};
use bfguard_infrastructure::{CountdownAttemptTracker, RedisAttemptTracker};
use tracing::info;

use crate::api_config::{ApiConfig, TrackerBackend};

pub(super) fn build_attempt_tracker(
    config: &ApiConfig,
    redis_client: Option<redis::Client>,
) -> AppResult<Arc<dyn AttemptTracker>> {
    info!(backend = config.tracker_backend.as_str(), "building attempt tracker");

    match config.tracker_backend {
        TrackerBackend::Memory => Ok(Arc::new(
            CountdownAttemptTracker::new(config.attempt_limits).with_auto_seed(),
        )),
        TrackerBackend::Redis => {
            let redis_client = redis_client.ok_or_else(|| {
                AppError::Validation("REDIS_URL is required when TRACKER_BACKEND=redis".to_owned())
            })?;
            Ok(Arc::new(RedisAttemptTracker::new(
                redis_client,
                config.redis_key_prefix.as_str(),
                config.redis_timeout,
            )))
        }
    }
}
