use std::path::Path;

use bfguard_core::{AppError, AppResult};
use bfguard_domain::ReservedList;
use tracing::info;

use crate::api_config::ApiConfig;
use crate::state::AppState;

const ALLOW_LIST_FILE: &str = "allowlist_subnets.txt";
const DENY_LIST_FILE: &str = "denylist_subnets.txt";

const EMBEDDED_ALLOW_LIST: &str = include_str!("../../assets/allowlist_subnets.txt");
const EMBEDDED_DENY_LIST: &str = include_str!("../../assets/denylist_subnets.txt");

/// Loads the startup allow-list and deny-list into the registry.
///
/// Files under `SEED_LISTS_DIR` replace the embedded defaults.
pub async fn seed_access_lists(state: &AppState, config: &ApiConfig) -> AppResult<()> {
    let (allow, deny) = match config.seed_lists_dir.as_deref() {
        Some(directory) => (
            read_seed_file(&directory.join(ALLOW_LIST_FILE)).await?,
            read_seed_file(&directory.join(DENY_LIST_FILE)).await?,
        ),
        None => (
            EMBEDDED_ALLOW_LIST.to_owned(),
            EMBEDDED_DENY_LIST.to_owned(),
        ),
    };

    let allowed = state
        .access_list_service
        .seed(ReservedList::Allow, allow.as_str())
        .await?;
    let denied = state
        .access_list_service
        .seed(ReservedList::Deny, deny.as_str())
        .await?;

    info!(allowed, denied, "reserved subnet lists loaded");
    Ok(())
}

async fn read_seed_file(path: &Path) -> AppResult<String> {
    tokio::fs::read_to_string(path).await.map_err(|error| {
        AppError::Internal(format!(
            "failed to read seed file '{}': {error}",
            path.display()
        ))
    })
}
