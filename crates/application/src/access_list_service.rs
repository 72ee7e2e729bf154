//! Administration of the reserved subnet lists and attempt budgets.

use std::sync::Arc;

use tracing::{info, warn};

use bfguard_core::{AppError, AppResult};
use bfguard_domain::{
    AccessListOutcome, AttemptDimension, AttemptKey, ReservationError, ReservedList,
    ReservedSubnet, parse_source_ip,
};

use crate::{AttemptTracker, SubnetRegistry};

/// Outcome of one administrative operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessListReport {
    /// Result tag.
    pub outcome: AccessListOutcome,
    /// Human-readable context, such as the conflicting subnet.
    pub detail: Option<String>,
}

impl AccessListReport {
    fn new(outcome: AccessListOutcome) -> Self {
        Self {
            outcome,
            detail: None,
        }
    }

    fn with_detail(outcome: AccessListOutcome, detail: impl Into<String>) -> Self {
        Self {
            outcome,
            detail: Some(detail.into()),
        }
    }

    /// Returns whether the operation took effect.
    #[must_use]
    pub fn success(&self) -> bool {
        self.outcome.is_success()
    }
}

/// Application service for allow-list, deny-list and budget administration.
#[derive(Clone)]
pub struct AccessListService {
    subnet_registry: Arc<dyn SubnetRegistry>,
    attempt_tracker: Arc<dyn AttemptTracker>,
}

impl AccessListService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        subnet_registry: Arc<dyn SubnetRegistry>,
        attempt_tracker: Arc<dyn AttemptTracker>,
    ) -> Self {
        Self {
            subnet_registry,
            attempt_tracker,
        }
    }

    /// Reserves a subnet in `list`.
    ///
    /// Rejections are reported in the returned report. Only a registry
    /// failure is an error.
    pub async fn add_to_list(&self, list: ReservedList, cidr: &str) -> AppResult<AccessListReport> {
        let subnet = match ReservedSubnet::parse(cidr) {
            Ok(subnet) => subnet,
            Err(error) => return rejection_report(error),
        };

        match self.subnet_registry.add(list, subnet).await {
            Ok(()) => {
                info!(list = list.as_str(), %subnet, "subnet reserved");
                Ok(AccessListReport::with_detail(
                    AccessListOutcome::SubnetAdded,
                    subnet.to_string(),
                ))
            }
            Err(error) => rejection_report(error),
        }
    }

    /// Releases a subnet from `list`.
    pub async fn remove_from_list(
        &self,
        list: ReservedList,
        cidr: &str,
    ) -> AppResult<AccessListReport> {
        let subnet = match ReservedSubnet::parse(cidr) {
            Ok(subnet) => subnet,
            Err(error) => return rejection_report(error),
        };

        match self.subnet_registry.remove(list, subnet).await {
            Ok(()) => {
                info!(list = list.as_str(), %subnet, "subnet released");
                Ok(AccessListReport::with_detail(
                    AccessListOutcome::SubnetRemoved,
                    subnet.to_string(),
                ))
            }
            Err(error) => rejection_report(error),
        }
    }

    /// Returns the current entries of `list`.
    pub async fn list_subnets(&self, list: ReservedList) -> AppResult<Vec<ReservedSubnet>> {
        self.subnet_registry.snapshot(list).await
    }

    /// Restores the budgets of a login and a source address.
    ///
    /// Blank fields are skipped. Each field is handled on its own, so a
    /// malformed address or a failed reset does not stop the other reset.
    pub async fn reset_attempt_budget(&self, login: &str, ip: &str) -> AccessListReport {
        let has_login = !login.trim().is_empty();
        let has_ip = !ip.trim().is_empty();
        if !has_login && !has_ip {
            return AccessListReport::with_detail(
                AccessListOutcome::ValidationError,
                "login or ip is required",
            );
        }

        let mut keys = Vec::with_capacity(2);
        let mut failures = Vec::new();

        if has_login {
            keys.push(AttemptKey::login(login));
        }

        if has_ip {
            match parse_source_ip(ip) {
                Ok(address) => keys.push(AttemptKey::ip(address)),
                Err(error) => {
                    warn!(%error, "skipping reset of malformed source address");
                    failures.push(format!("{}: {error}", AttemptDimension::Ip));
                }
            }
        }

        for key in &keys {
            if let Err(error) = self.attempt_tracker.reset(key).await {
                warn!(dimension = key.dimension().as_str(), %error, "attempt budget reset failed");
                failures.push(format!("{}: {error}", key.dimension()));
            }
        }

        if failures.is_empty() {
            info!(keys = keys.len(), "attempt budgets reset");
            AccessListReport::new(AccessListOutcome::BucketsReset)
        } else {
            AccessListReport::with_detail(AccessListOutcome::ResetFailed, failures.join("; "))
        }
    }

    /// Loads newline-separated CIDRs into `list`.
    ///
    /// Blank lines and `#` comments are ignored and repeated entries are
    /// skipped. Any other rejection aborts the load. Returns the number of
    /// subnets added.
    pub async fn seed(&self, list: ReservedList, entries: &str) -> AppResult<usize> {
        let mut added = 0;

        for (index, line) in entries.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let subnet = ReservedSubnet::parse(line).map_err(|error| {
                AppError::Validation(format!("{list} seed line {}: {error}", index + 1))
            })?;

            match self.subnet_registry.add(list, subnet).await {
                Ok(()) => added += 1,
                Err(ReservationError::DuplicateInList { .. }) => {
                    warn!(list = list.as_str(), %subnet, "skipping repeated seed subnet");
                }
                Err(ReservationError::Store(error)) => return Err(error),
                Err(error) => {
                    return Err(AppError::Conflict(format!(
                        "{list} seed line {}: {error}",
                        index + 1
                    )));
                }
            }
        }

        info!(list = list.as_str(), added, "seeded reserved subnets");
        Ok(added)
    }
}

fn rejection_report(error: ReservationError) -> AppResult<AccessListReport> {
    let outcome = match &error {
        ReservationError::InvalidSubnet { .. } => Some(AccessListOutcome::InvalidSubnet),
        ReservationError::DuplicateInList { .. } => Some(AccessListOutcome::AlreadyReserved),
        ReservationError::ConflictsWithOtherList { list, .. } => {
            Some(AccessListOutcome::Intersects(list.opposite()))
        }
        ReservationError::NotReserved { .. } => Some(AccessListOutcome::NotReserved),
        ReservationError::Store(_) => None,
    };

    match outcome {
        Some(outcome) => Ok(AccessListReport::with_detail(outcome, error.to_string())),
        None => Err(error.into()),
    }
}
