use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use bfguard_application::AttemptLimits;
use bfguard_core::{AppError, AppResult};
use tracing_subscriber::EnvFilter;

/// Backend selected for attempt budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerBackend {
    Memory,
    Redis,
}

impl TrackerBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Redis => "redis",
        }
    }
}

impl FromStr for TrackerBackend {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "redis" => Ok(Self::Redis),
            other => Err(AppError::Validation(format!(
                "TRACKER_BACKEND must be either 'memory' or 'redis', got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub api_host: String,
    pub api_port: u16,
    pub attempt_limits: AttemptLimits,
    pub tracker_backend: TrackerBackend,
    pub redis_url: Option<String>,
    pub redis_key_prefix: String,
    pub redis_timeout: Duration,
    pub seed_lists_dir: Option<PathBuf>,
}

impl ApiConfig {
    pub fn load() -> AppResult<Self> {
        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = parse_env_u16("API_PORT", 3001)?;

        let attempt_limits = AttemptLimits::new(
            parse_env_u32("ATTEMPTS_LOGIN_PER_MINUTE", 10)?,
            parse_env_u32("ATTEMPTS_PASSWORD_PER_MINUTE", 100)?,
            parse_env_u32("ATTEMPTS_IP_PER_MINUTE", 1000)?,
        )?;

        let tracker_backend = env::var("TRACKER_BACKEND")
            .unwrap_or_else(|_| "memory".to_owned())
            .parse::<TrackerBackend>()?;
        let redis_url = optional_non_empty_env("REDIS_URL");
        if tracker_backend == TrackerBackend::Redis && redis_url.is_none() {
            return Err(AppError::Validation(
                "REDIS_URL is required when TRACKER_BACKEND=redis".to_owned(),
            ));
        }

        let redis_key_prefix =
            optional_non_empty_env("REDIS_KEY_PREFIX").unwrap_or_else(|| "bfguard:attempts".to_owned());
        let redis_timeout_ms = parse_env_u64("REDIS_TIMEOUT_MS", 500)?;
        if redis_timeout_ms == 0 {
            return Err(AppError::Validation(
                "REDIS_TIMEOUT_MS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            api_host,
            api_port,
            attempt_limits,
            tracker_backend,
            redis_url,
            redis_key_prefix,
            redis_timeout: Duration::from_millis(redis_timeout_ms),
            seed_lists_dir: optional_non_empty_env("SEED_LISTS_DIR").map(PathBuf::from),
        })
    }

    pub fn socket_address(&self) -> AppResult<SocketAddr> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Validation(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn optional_non_empty_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn parse_env_u16(name: &str, default: u16) -> AppResult<u16> {
    match env::var(name) {
        Ok(value) => value.parse::<u16>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}

fn parse_env_u32(name: &str, default: u32) -> AppResult<u32> {
    match env::var(name) {
        Ok(value) => value.parse::<u32>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}

fn parse_env_u64(name: &str, default: u64) -> AppResult<u64> {
    match env::var(name) {
        Ok(value) => value.parse::<u64>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}
