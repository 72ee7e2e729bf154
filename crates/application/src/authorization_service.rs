//! Brute-force check for login attempts.
//!
//! An attempt is first matched against the reserved subnet lists. Senders
//! that are not reserved are checked along three independent budgets (login,
//! password, source address) which run concurrently. The first exhausted
//! budget or tracker failure decides the request and cancels the remaining
//! checks.

use std::net::IpAddr;
use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use bfguard_core::{AppError, AppResult};
use bfguard_domain::{
    AttemptDimension, AuthorizationAttempt, Decision, DecisionReason, ReservedList,
};

use crate::{AttemptCheck, AttemptTracker, SubnetRegistry};

mod config;

pub use config::AttemptLimits;

/// Decision for one attempt plus the error that caused a check failure.
#[derive(Debug)]
pub struct AuthorizationOutcome {
    /// Final verdict.
    pub decision: Decision,
    /// Set when validation failed or a backend could not be consulted.
    pub error: Option<AppError>,
}

impl AuthorizationOutcome {
    fn decided(decision: Decision) -> Self {
        Self {
            decision,
            error: None,
        }
    }

    fn failed(reason: DecisionReason, error: AppError) -> Self {
        Self {
            decision: Decision::deny(reason),
            error: Some(error),
        }
    }
}

/// Result published by one budget check task.
struct BudgetCheck {
    dimension: AttemptDimension,
    result: AppResult<AttemptCheck>,
}

/// Application service deciding whether an authorization attempt may proceed.
#[derive(Clone)]
pub struct AuthorizationService {
    subnet_registry: Arc<dyn SubnetRegistry>,
    attempt_tracker: Arc<dyn AttemptTracker>,
    limits: AttemptLimits,
}

impl AuthorizationService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        subnet_registry: Arc<dyn SubnetRegistry>,
        attempt_tracker: Arc<dyn AttemptTracker>,
        limits: AttemptLimits,
    ) -> Self {
        Self {
            subnet_registry,
            attempt_tracker,
            limits,
        }
    }

    /// Returns the configured per-minute budgets.
    #[must_use]
    pub fn limits(&self) -> AttemptLimits {
        self.limits
    }

    /// Decides one authorization attempt from raw request fields.
    ///
    /// Allow-listed senders are never rate limited and deny-listed senders are
    /// rejected without touching any budget.
    pub async fn authorize(
        &self,
        login: &str,
        password: &str,
        source_ip: &str,
    ) -> AuthorizationOutcome {
        let attempt = match AuthorizationAttempt::new(login, password, source_ip) {
            Ok(attempt) => attempt,
            Err(error) => {
                debug!(%error, "rejected malformed authorization attempt");
                return AuthorizationOutcome::failed(DecisionReason::ValidationError, error);
            }
        };

        match self.reserved_list_decision(attempt.source_ip()).await {
            Ok(Some(decision)) => {
                debug!(
                    login = attempt.login(),
                    source_ip = %attempt.source_ip(),
                    reason = decision.reason().as_str(),
                    "reserved subnet decided authorization"
                );
                return AuthorizationOutcome::decided(decision);
            }
            Ok(None) => {}
            Err(error) => {
                warn!(%error, source_ip = %attempt.source_ip(), "reserved subnet lookup failed");
                return AuthorizationOutcome::failed(DecisionReason::CheckError, error);
            }
        }

        match self.check_attempt_budgets(&attempt).await {
            Ok(decision) => AuthorizationOutcome::decided(decision),
            Err(error) => {
                warn!(%error, login = attempt.login(), "attempt budget check failed");
                AuthorizationOutcome::failed(DecisionReason::CheckError, error)
            }
        }
    }

    async fn reserved_list_decision(&self, source_ip: IpAddr) -> AppResult<Option<Decision>> {
        if self
            .subnet_registry
            .contains(ReservedList::Allow, source_ip)
            .await?
        {
            return Ok(Some(Decision::allow(DecisionReason::AllowListed)));
        }

        if self
            .subnet_registry
            .contains(ReservedList::Deny, source_ip)
            .await?
        {
            return Ok(Some(Decision::deny(DecisionReason::DenyListed)));
        }

        Ok(None)
    }

    /// Runs the three budget checks concurrently and reduces them in arrival
    /// order. Every spawned check has finished or been aborted when this
    /// returns.
    async fn check_attempt_budgets(&self, attempt: &AuthorizationAttempt) -> AppResult<Decision> {
        let cancellation = CancellationToken::new();
        let mut checks = JoinSet::new();

        for key in attempt.attempt_keys() {
            let tracker = Arc::clone(&self.attempt_tracker);
            let limit = self.limits.for_dimension(key.dimension());
            let cancellation = cancellation.clone();

            checks.spawn(async move {
                let dimension = key.dimension();
                tokio::select! {
                    biased;
                    () = cancellation.cancelled() => None,
                    result = tracker.check_and_decrement(&key, limit) => {
                        Some(BudgetCheck { dimension, result })
                    }
                }
            });
        }

        let expected = checks.len();
        let mut admitted = 0_usize;

        let verdict = loop {
            let Some(joined) = checks.join_next().await else {
                break if admitted == expected {
                    Ok(Decision::allow(DecisionReason::Allowed))
                } else {
                    Err(AppError::Internal(format!(
                        "only {admitted} of {expected} attempt checks reported"
                    )))
                };
            };

            let check = match joined {
                Ok(Some(check)) => check,
                Ok(None) => continue,
                Err(error) => {
                    break Err(AppError::Internal(format!(
                        "attempt check task failed: {error}"
                    )));
                }
            };

            match check.result {
                Ok(AttemptCheck { allowed: true, .. }) => admitted += 1,
                Ok(AttemptCheck { allowed: false, .. }) => {
                    debug!(
                        dimension = check.dimension.as_str(),
                        login = attempt.login(),
                        source_ip = %attempt.source_ip(),
                        "attempt budget exhausted"
                    );
                    break Ok(Decision::deny(DecisionReason::LimitExceeded));
                }
                Err(error) => break Err(error),
            }
        };

        cancellation.cancel();
        checks.shutdown().await;

        verdict
    }
}

#[cfg(test)]
mod tests;
