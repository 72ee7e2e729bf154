use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::{Barrier, Mutex};

use bfguard_core::{AppError, AppResult};
use bfguard_domain::{
    AccessLists, AttemptDimension, AttemptKey, DecisionReason, ReservationError, ReservedList,
    ReservedSubnet,
};

use crate::{AttemptCheck, AttemptTracker, SubnetRegistry};

use super::{AttemptLimits, AuthorizationService};

const LOGIN: &str = "alice";
const PASSWORD: &str = "correct horse";
const SOURCE_IP: &str = "203.0.113.10";

#[derive(Default)]
struct FakeSubnetRegistry {
    lists: Mutex<AccessLists>,
    lookups: AtomicUsize,
    unavailable: bool,
}

impl FakeSubnetRegistry {
    fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl SubnetRegistry for FakeSubnetRegistry {
    async fn contains(&self, list: ReservedList, address: IpAddr) -> AppResult<bool> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.unavailable {
            return Err(AppError::Unavailable("registry offline".to_owned()));
        }
        Ok(self.lists.lock().await.contains(list, address))
    }

    async fn add(&self, list: ReservedList, subnet: ReservedSubnet) -> Result<(), ReservationError> {
        self.lists.lock().await.add(list, subnet)
    }

    async fn remove(
        &self,
        list: ReservedList,
        subnet: ReservedSubnet,
    ) -> Result<(), ReservationError> {
        self.lists.lock().await.remove(list, subnet)
    }

    async fn snapshot(&self, list: ReservedList) -> AppResult<Vec<ReservedSubnet>> {
        Ok(self.lists.lock().await.entries(list).to_vec())
    }
}

/// Tracker that seeds each key with the requested limit on first use.
#[derive(Default)]
struct FakeBudgetTracker {
    remaining: Mutex<HashMap<AttemptKey, i64>>,
    probes: AtomicUsize,
}

#[async_trait]
impl AttemptTracker for FakeBudgetTracker {
    async fn check_and_decrement(
        &self,
        key: &AttemptKey,
        limit_per_minute: u32,
    ) -> AppResult<AttemptCheck> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        let mut remaining = self.remaining.lock().await;
        let budget = remaining
            .entry(key.clone())
            .or_insert_with(|| i64::from(limit_per_minute));
        *budget -= 1;

        Ok(AttemptCheck {
            allowed: *budget >= 0,
            remaining: u32::try_from(*budget).unwrap_or(0),
        })
    }

    async fn reset(&self, key: &AttemptKey) -> AppResult<()> {
        self.remaining.lock().await.remove(key);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum Behavior {
    Allow,
    Deny,
    Fail,
    Hang,
}

/// Increments a counter when dropped, marking an abandoned check.
struct AbandonGuard(Arc<AtomicUsize>);

impl Drop for AbandonGuard {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Tracker with one scripted behavior per dimension.
///
/// Every probe waits on a shared barrier so all three checks are in flight
/// before any of them reports.
struct ScriptedTracker {
    behaviors: HashMap<AttemptDimension, Behavior>,
    started: Barrier,
    abandoned: Arc<AtomicUsize>,
}

impl ScriptedTracker {
    fn new(login: Behavior, password: Behavior, ip: Behavior) -> Self {
        Self {
            behaviors: HashMap::from([
                (AttemptDimension::Login, login),
                (AttemptDimension::Password, password),
                (AttemptDimension::Ip, ip),
            ]),
            started: Barrier::new(3),
            abandoned: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl AttemptTracker for ScriptedTracker {
    async fn check_and_decrement(
        &self,
        key: &AttemptKey,
        _limit_per_minute: u32,
    ) -> AppResult<AttemptCheck> {
        let behavior = self
            .behaviors
            .get(&key.dimension())
            .copied()
            .unwrap_or(Behavior::Allow);
        let guard = AbandonGuard(Arc::clone(&self.abandoned));
        self.started.wait().await;

        let result = match behavior {
            Behavior::Allow => Ok(AttemptCheck {
                allowed: true,
                remaining: 1,
            }),
            Behavior::Deny => Ok(AttemptCheck {
                allowed: false,
                remaining: 0,
            }),
            Behavior::Fail => Err(AppError::Unavailable("tracker offline".to_owned())),
            Behavior::Hang => std::future::pending().await,
        };

        std::mem::forget(guard);
        result
    }

    async fn reset(&self, _key: &AttemptKey) -> AppResult<()> {
        Ok(())
    }
}

fn limits(login: u32, password: u32, ip: u32) -> AttemptLimits {
    match AttemptLimits::new(login, password, ip) {
        Ok(limits) => limits,
        Err(error) => panic!("test limits must be valid: {error}"),
    }
}

fn subnet(value: &str) -> ReservedSubnet {
    match ReservedSubnet::parse(value) {
        Ok(subnet) => subnet,
        Err(error) => panic!("test subnet '{value}' must parse: {error}"),
    }
}

fn build_service(
    registry: Arc<FakeSubnetRegistry>,
    tracker: Arc<dyn AttemptTracker>,
    limits: AttemptLimits,
) -> AuthorizationService {
    AuthorizationService::new(registry, tracker, limits)
}

#[tokio::test]
async fn empty_login_is_rejected_without_backend_calls() {
    let registry = Arc::new(FakeSubnetRegistry::default());
    let tracker = Arc::new(FakeBudgetTracker::default());
    let service = build_service(registry.clone(), tracker.clone(), limits(5, 6, 6));

    let outcome = service.authorize("", "pw", "1.2.3.4").await;

    assert!(!outcome.decision.allowed());
    assert_eq!(outcome.decision.reason(), DecisionReason::ValidationError);
    assert!(matches!(outcome.error, Some(AppError::Validation(_))));
    assert_eq!(registry.lookups.load(Ordering::SeqCst), 0);
    assert_eq!(tracker.probes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn malformed_source_ip_is_a_validation_error() {
    let registry = Arc::new(FakeSubnetRegistry::default());
    let tracker = Arc::new(FakeBudgetTracker::default());
    let service = build_service(registry.clone(), tracker, limits(5, 6, 6));

    let outcome = service.authorize(LOGIN, PASSWORD, "300.1.1.1").await;

    assert_eq!(outcome.decision.reason(), DecisionReason::ValidationError);
    assert_eq!(registry.lookups.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn sixth_attempt_exceeds_login_limit() {
    let registry = Arc::new(FakeSubnetRegistry::default());
    let tracker = Arc::new(FakeBudgetTracker::default());
    let service = build_service(registry, tracker, limits(5, 6, 6));

    for attempt in 1..=5 {
        let outcome = service.authorize(LOGIN, PASSWORD, SOURCE_IP).await;
        assert!(outcome.decision.allowed(), "attempt {attempt} should pass");
        assert_eq!(outcome.decision.reason(), DecisionReason::Allowed);
        assert!(outcome.error.is_none());
    }

    let outcome = service.authorize(LOGIN, PASSWORD, SOURCE_IP).await;
    assert!(!outcome.decision.allowed());
    assert_eq!(outcome.decision.reason(), DecisionReason::LimitExceeded);
    assert!(outcome.error.is_none());
}

#[tokio::test]
async fn every_dimension_enforces_its_own_limit() {
    for dimension in AttemptDimension::all() {
        let limit = 3;
        let configured = match dimension {
            AttemptDimension::Login => limits(limit, 50, 50),
            AttemptDimension::Password => limits(50, limit, 50),
            AttemptDimension::Ip => limits(50, 50, limit),
        };
        let registry = Arc::new(FakeSubnetRegistry::default());
        let tracker = Arc::new(FakeBudgetTracker::default());
        let service = build_service(registry, tracker, configured);

        for _ in 0..limit {
            let outcome = service.authorize(LOGIN, PASSWORD, SOURCE_IP).await;
            assert!(outcome.decision.allowed(), "{dimension} limit reached early");
        }

        let outcome = service.authorize(LOGIN, PASSWORD, SOURCE_IP).await;
        assert_eq!(
            outcome.decision.reason(),
            DecisionReason::LimitExceeded,
            "{dimension} limit not enforced"
        );
    }
}

#[tokio::test]
async fn allow_listed_sender_skips_exhausted_budgets() {
    let registry = Arc::new(FakeSubnetRegistry::default());
    let tracker = Arc::new(FakeBudgetTracker::default());
    let service = build_service(registry.clone(), tracker.clone(), limits(1, 1, 1));

    assert!(service.authorize(LOGIN, PASSWORD, SOURCE_IP).await.decision.allowed());
    assert!(!service.authorize(LOGIN, PASSWORD, SOURCE_IP).await.decision.allowed());

    assert!(
        registry
            .add(ReservedList::Allow, subnet("203.0.113.0/24"))
            .await
            .is_ok()
    );
    let probes_before = tracker.probes.load(Ordering::SeqCst);

    let outcome = service.authorize(LOGIN, PASSWORD, SOURCE_IP).await;

    assert!(outcome.decision.allowed());
    assert_eq!(outcome.decision.reason(), DecisionReason::AllowListed);
    assert_eq!(tracker.probes.load(Ordering::SeqCst), probes_before);
}

#[tokio::test]
async fn deny_listed_sender_is_denied_with_full_budgets() {
    let registry = Arc::new(FakeSubnetRegistry::default());
    assert!(
        registry
            .add(ReservedList::Deny, subnet("203.0.113.0/28"))
            .await
            .is_ok()
    );
    let tracker = Arc::new(FakeBudgetTracker::default());
    let service = build_service(registry, tracker.clone(), limits(100, 100, 100));

    let outcome = service.authorize(LOGIN, PASSWORD, SOURCE_IP).await;

    assert!(!outcome.decision.allowed());
    assert_eq!(outcome.decision.reason(), DecisionReason::DenyListed);
    assert_eq!(tracker.probes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn registry_failure_is_reported_as_check_error() {
    let registry = Arc::new(FakeSubnetRegistry::unavailable());
    let tracker = Arc::new(FakeBudgetTracker::default());
    let service = build_service(registry, tracker.clone(), limits(5, 5, 5));

    let outcome = service.authorize(LOGIN, PASSWORD, SOURCE_IP).await;

    assert_eq!(outcome.decision.reason(), DecisionReason::CheckError);
    assert!(matches!(outcome.error, Some(AppError::Unavailable(_))));
    assert_eq!(tracker.probes.load(Ordering::SeqCst), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 3)]
async fn tracker_failure_cancels_outstanding_checks() {
    let scripts = [
        (Behavior::Fail, Behavior::Hang, Behavior::Hang),
        (Behavior::Hang, Behavior::Fail, Behavior::Hang),
        (Behavior::Hang, Behavior::Hang, Behavior::Fail),
    ];

    for (login, password, ip) in scripts {
        let tracker = Arc::new(ScriptedTracker::new(login, password, ip));
        let service = build_service(
            Arc::new(FakeSubnetRegistry::default()),
            tracker.clone(),
            limits(5, 5, 5),
        );

        let outcome = service.authorize(LOGIN, PASSWORD, SOURCE_IP).await;

        assert!(!outcome.decision.allowed());
        assert_eq!(outcome.decision.reason(), DecisionReason::CheckError);
        assert!(matches!(outcome.error, Some(AppError::Unavailable(_))));
        assert_eq!(tracker.abandoned.load(Ordering::SeqCst), 2);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 3)]
async fn exhausted_budget_cancels_outstanding_checks() {
    let tracker = Arc::new(ScriptedTracker::new(
        Behavior::Hang,
        Behavior::Deny,
        Behavior::Hang,
    ));
    let service = build_service(
        Arc::new(FakeSubnetRegistry::default()),
        tracker.clone(),
        limits(5, 5, 5),
    );

    let outcome = service.authorize(LOGIN, PASSWORD, SOURCE_IP).await;

    assert_eq!(outcome.decision.reason(), DecisionReason::LimitExceeded);
    assert!(outcome.error.is_none());
    assert_eq!(tracker.abandoned.load(Ordering::SeqCst), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 3)]
async fn denial_wins_over_slower_allowances() {
    let tracker = Arc::new(ScriptedTracker::new(
        Behavior::Allow,
        Behavior::Allow,
        Behavior::Deny,
    ));
    let service = build_service(
        Arc::new(FakeSubnetRegistry::default()),
        tracker.clone(),
        limits(5, 5, 5),
    );

    let outcome = service.authorize(LOGIN, PASSWORD, SOURCE_IP).await;

    assert_eq!(outcome.decision.reason(), DecisionReason::LimitExceeded);
    assert!(outcome.error.is_none());
}
