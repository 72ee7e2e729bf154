use async_trait::async_trait;

use bfguard_core::AppResult;
use bfguard_domain::AttemptKey;

/// Tracker port answering whether one more attempt for a key is allowed.
///
/// Implementations must make `check_and_decrement` atomic per key: two
/// concurrent probes for the same key never observe the same remaining count.
#[async_trait]
pub trait AttemptTracker: Send + Sync {
    /// Consumes one attempt from the key's budget.
    ///
    /// `limit_per_minute` is the configured budget for the key's dimension.
    /// A backend failure is an error, distinct from an exhausted budget.
    async fn check_and_decrement(
        &self,
        key: &AttemptKey,
        limit_per_minute: u32,
    ) -> AppResult<AttemptCheck>;

    /// Restores the full budget of a key immediately.
    async fn reset(&self, key: &AttemptKey) -> AppResult<()>;

    /// Reports whether the backing store is reachable.
    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

/// Result of one budget probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptCheck {
    /// Whether the attempt fits in the budget.
    pub allowed: bool,
    /// Attempts left in the current window after this probe.
    pub remaining: u32,
}
