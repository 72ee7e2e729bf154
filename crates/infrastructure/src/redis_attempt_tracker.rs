//! Redis-backed sliding-window attempt tracker.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use bfguard_application::{AttemptCheck, AttemptTracker};
use bfguard_core::{AppError, AppResult};
use bfguard_domain::AttemptKey;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Script};
use tracing::debug;

const WINDOW_MILLISECONDS: i64 = 60_000;

const CHECK_ATTEMPT_SCRIPT: &str = r#"
local key = KEYS[1]
local window = tonumber(ARGV[1])
local limit = tonumber(ARGV[2])
local member = ARGV[3]

local clock = redis.call('TIME')
local now = tonumber(clock[1]) * 1000 + math.floor(tonumber(clock[2]) / 1000)

redis.call('ZREMRANGEBYSCORE', key, '-inf', now - window)
local count = redis.call('ZCARD', key)

if count < limit then
  redis.call('ZADD', key, now, member)
  redis.call('PEXPIRE', key, window)
  return {1, limit - count - 1}
end

redis.call('PEXPIRE', key, window)
return {0, 0}
"#;

/// Redis implementation of the attempt tracker port.
///
/// Each key is a sorted set of attempt timestamps taken from the server
/// clock, so every instance sharing the server agrees on the window.
#[derive(Clone)]
pub struct RedisAttemptTracker {
    client: redis::Client,
    key_prefix: String,
    timeout: Duration,
}

impl RedisAttemptTracker {
    /// Creates a tracker with a configured Redis client, key prefix and
    /// per-call timeout.
    #[must_use]
    pub fn new(client: redis::Client, key_prefix: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            key_prefix: key_prefix.into(),
            timeout,
        }
    }

    fn key_for(&self, key: &AttemptKey) -> String {
        format!("{}:{}", self.key_prefix, key.storage_key())
    }

    async fn connection(&self) -> AppResult<MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| AppError::Unavailable(format!("failed to connect to redis: {error}")))
    }

    async fn bounded<T>(
        &self,
        operation: &str,
        call: impl Future<Output = AppResult<T>>,
    ) -> AppResult<T> {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| {
                AppError::Unavailable(format!(
                    "redis {operation} timed out after {} ms",
                    self.timeout.as_millis()
                ))
            })?
    }
}

#[async_trait]
impl AttemptTracker for RedisAttemptTracker {
    async fn check_and_decrement(
        &self,
        key: &AttemptKey,
        limit_per_minute: u32,
    ) -> AppResult<AttemptCheck> {
        let redis_key = self.key_for(key);
        let member = uuid::Uuid::new_v4().to_string();
        let script = Script::new(CHECK_ATTEMPT_SCRIPT);

        let (allowed, remaining): (i64, i64) = self
            .bounded("attempt check", async {
                let mut connection = self.connection().await?;
                script
                    .key(redis_key.as_str())
                    .arg(WINDOW_MILLISECONDS)
                    .arg(limit_per_minute)
                    .arg(member.as_str())
                    .invoke_async(&mut connection)
                    .await
                    .map_err(|error| {
                        AppError::Internal(format!("failed to record redis attempt: {error}"))
                    })
            })
            .await?;

        debug!(dimension = key.dimension().as_str(), allowed, remaining, "redis attempt check");

        Ok(AttemptCheck {
            allowed: allowed == 1,
            remaining: u32::try_from(remaining).unwrap_or(0),
        })
    }

    async fn reset(&self, key: &AttemptKey) -> AppResult<()> {
        let redis_key = self.key_for(key);

        self.bounded("attempt reset", async {
            let mut connection = self.connection().await?;
            connection
                .del::<_, i64>(redis_key.as_str())
                .await
                .map_err(|error| {
                    AppError::Internal(format!("failed to reset redis attempts: {error}"))
                })?;
            Ok(())
        })
        .await
    }

    async fn ping(&self) -> AppResult<()> {
        self.bounded("ping", async {
            let mut connection = self.connection().await?;
            redis::cmd("PING")
                .query_async::<String>(&mut connection)
                .await
                .map_err(|error| AppError::Unavailable(format!("redis ping failed: {error}")))?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bfguard_application::AttemptTracker;
    use bfguard_core::AppError;
    use bfguard_domain::AttemptKey;

    use super::RedisAttemptTracker;

    fn test_tracker() -> Option<RedisAttemptTracker> {
        let Ok(redis_url) = std::env::var("REDIS_URL") else {
            return None;
        };

        let client = match redis::Client::open(redis_url.as_str()) {
            Ok(client) => client,
            Err(error) => panic!("failed to parse REDIS_URL in test: {error}"),
        };

        Some(RedisAttemptTracker::new(
            client,
            format!("bfguard:test:{}", uuid::Uuid::new_v4()),
            Duration::from_secs(2),
        ))
    }

    #[tokio::test]
    async fn sliding_window_allows_exactly_limit_attempts() {
        let Some(tracker) = test_tracker() else {
            return;
        };
        let key = AttemptKey::login("alice");

        let mut outcomes = Vec::new();
        for _ in 0..5 {
            match tracker.check_and_decrement(&key, 3).await {
                Ok(check) => outcomes.push((check.allowed, check.remaining)),
                Err(error) => panic!("redis attempt check failed: {error}"),
            }
        }

        assert_eq!(
            outcomes,
            vec![(true, 2), (true, 1), (true, 0), (false, 0), (false, 0)]
        );
        assert!(tracker.reset(&key).await.is_ok());
    }

    #[tokio::test]
    async fn reset_restores_full_budget() {
        let Some(tracker) = test_tracker() else {
            return;
        };
        let key = AttemptKey::password("hunter2");

        for _ in 0..2 {
            assert!(tracker.check_and_decrement(&key, 2).await.is_ok());
        }
        assert!(matches!(
            tracker.check_and_decrement(&key, 2).await,
            Ok(check) if !check.allowed
        ));

        assert!(tracker.reset(&key).await.is_ok());

        assert!(matches!(
            tracker.check_and_decrement(&key, 2).await,
            Ok(check) if check.allowed
        ));
        assert!(tracker.reset(&key).await.is_ok());
    }

    #[tokio::test]
    async fn ping_reports_reachable_server() {
        let Some(tracker) = test_tracker() else {
            return;
        };

        assert!(tracker.ping().await.is_ok());
    }

    #[tokio::test]
    async fn unreachable_server_is_a_tracking_error() {
        let client = match redis::Client::open("redis://127.0.0.1:1/") {
            Ok(client) => client,
            Err(error) => panic!("static redis url must parse: {error}"),
        };
        let tracker = RedisAttemptTracker::new(client, "bfguard:test", Duration::from_millis(200));

        let result = tracker
            .check_and_decrement(&AttemptKey::login("alice"), 3)
            .await;

        assert!(matches!(result, Err(AppError::Unavailable(_))));
    }
}
