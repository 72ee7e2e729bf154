mod redis;
mod seed;
mod state_builder;

pub use seed::seed_access_lists;
pub use state_builder::build_app_state;
