use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bfguard_application::{AttemptCheck, AttemptLimits, AttemptTracker};
use bfguard_core::{AppError, AppResult};
use bfguard_domain::AttemptKey;
use tokio::sync::Mutex;
use tokio::time::Instant;

const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy)]
struct Bucket {
    remaining: i64,
    limit: u32,
    window_started: Instant,
}

impl Bucket {
    fn full(limit: u32, now: Instant) -> Self {
        Self {
            remaining: i64::from(limit),
            limit,
            window_started: now,
        }
    }
}

#[derive(Debug)]
struct BucketTable {
    entries: HashMap<AttemptKey, Bucket>,
    last_sweep: Instant,
}

impl BucketTable {
    fn new(now: Instant) -> Self {
        Self {
            entries: HashMap::new(),
            last_sweep: now,
        }
    }

    /// Drops buckets whose window has elapsed, at most once per window.
    fn sweep_expired(&mut self, now: Instant, window: Duration) {
        if now.duration_since(self.last_sweep) < window {
            return;
        }

        self.entries
            .retain(|_, bucket| now.duration_since(bucket.window_started) < window);
        self.last_sweep = now;
    }
}

/// In-process attempt tracker holding one countdown bucket per key.
///
/// Buckets are refilled once their window has elapsed. In strict mode a key
/// must be seeded before it can be checked. With auto seeding, expired
/// buckets are evicted.
pub struct CountdownAttemptTracker {
    buckets: Mutex<BucketTable>,
    limits: AttemptLimits,
    window: Duration,
    auto_seed: bool,
}

impl CountdownAttemptTracker {
    /// Creates a strict tracker with a one-minute window.
    #[must_use]
    pub fn new(limits: AttemptLimits) -> Self {
        Self {
            buckets: Mutex::new(BucketTable::new(Instant::now())),
            limits,
            window: DEFAULT_WINDOW,
            auto_seed: false,
        }
    }

    /// Overrides the refill window.
    #[must_use]
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Seeds unknown keys on first check instead of failing.
    #[must_use]
    pub fn with_auto_seed(mut self) -> Self {
        self.auto_seed = true;
        self
    }

    /// Installs a full bucket of `limit` attempts for `key`.
    pub async fn seed(&self, key: AttemptKey, limit: u32) {
        self.buckets
            .lock()
            .await
            .entries
            .insert(key, Bucket::full(limit, Instant::now()));
    }
}

#[async_trait]
impl AttemptTracker for CountdownAttemptTracker {
    async fn check_and_decrement(
        &self,
        key: &AttemptKey,
        limit_per_minute: u32,
    ) -> AppResult<AttemptCheck> {
        let now = Instant::now();
        let mut table = self.buckets.lock().await;

        let bucket = if self.auto_seed {
            table.sweep_expired(now, self.window);
            table
                .entries
                .entry(key.clone())
                .or_insert_with(|| Bucket::full(limit_per_minute, now))
        } else {
            table.entries.get_mut(key).ok_or_else(|| {
                AppError::NotFound(format!("no attempt budget seeded for {}", key.dimension()))
            })?
        };

        if now.duration_since(bucket.window_started) >= self.window {
            *bucket = Bucket::full(bucket.limit, now);
        }

        bucket.remaining = (bucket.remaining - 1).max(-1);

        Ok(AttemptCheck {
            allowed: bucket.remaining >= 0,
            remaining: u32::try_from(bucket.remaining).unwrap_or(0),
        })
    }

    async fn reset(&self, key: &AttemptKey) -> AppResult<()> {
        let limit = self.limits.for_dimension(key.dimension());
        self.buckets
            .lock()
            .await
            .entries
            .insert(key.clone(), Bucket::full(limit, Instant::now()));
        Ok(())
    }
}
