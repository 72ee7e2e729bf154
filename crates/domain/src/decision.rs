use serde::{Deserialize, Serialize};

use crate::ReservedList;

/// Why an authorization attempt was allowed or denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DecisionReason {
    /// Sender address is inside an allow-listed subnet.
    AllowListed,
    /// Sender address is inside a deny-listed subnet.
    DenyListed,
    /// All three attempt budgets admitted the attempt.
    Allowed,
    /// At least one attempt budget is exhausted.
    LimitExceeded,
    /// Request fields were empty or malformed.
    ValidationError,
    /// An attempt budget or access list could not be consulted.
    CheckError,
}

impl DecisionReason {
    /// Returns the stable transport tag.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AllowListed => "allow-listed",
            Self::DenyListed => "deny-listed",
            Self::Allowed => "allowed",
            Self::LimitExceeded => "limit-exceeded",
            Self::ValidationError => "validation-error",
            Self::CheckError => "check-error",
        }
    }

    /// Returns a human readable description.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::AllowListed => "sender is allow-listed",
            Self::DenyListed => "sender is deny-listed",
            Self::Allowed => "authorization allowed",
            Self::LimitExceeded => "limit of authorization attempts exceeded",
            Self::ValidationError => "request fields must be non-empty and well-formed",
            Self::CheckError => "error during brute force check",
        }
    }
}

/// Final allow/deny verdict for one authorization attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    allowed: bool,
    reason: DecisionReason,
}

impl Decision {
    /// Allowing decision.
    #[must_use]
    pub fn allow(reason: DecisionReason) -> Self {
        Self {
            allowed: true,
            reason,
        }
    }

    /// Denying decision.
    #[must_use]
    pub fn deny(reason: DecisionReason) -> Self {
        Self {
            allowed: false,
            reason,
        }
    }

    /// Returns whether the attempt may proceed.
    #[must_use]
    pub fn allowed(&self) -> bool {
        self.allowed
    }

    /// Returns the decision reason.
    #[must_use]
    pub fn reason(&self) -> DecisionReason {
        self.reason
    }
}

/// Result tags of administrative access-list and budget operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessListOutcome {
    /// Subnet appended to a list.
    SubnetAdded,
    /// Subnet removed from a list.
    SubnetRemoved,
    /// Requested budgets were restored.
    BucketsReset,
    /// Input is not valid CIDR notation.
    InvalidSubnet,
    /// Subnet already present in the target list.
    AlreadyReserved,
    /// Subnet overlaps an entry of the given list.
    Intersects(ReservedList),
    /// Subnet absent from the target list.
    NotReserved,
    /// At least one budget reset failed.
    ResetFailed,
    /// Request fields were empty.
    ValidationError,
}

impl AccessListOutcome {
    /// Returns the stable transport tag.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SubnetAdded => "subnet-added",
            Self::SubnetRemoved => "subnet-removed",
            Self::BucketsReset => "buckets-reset",
            Self::InvalidSubnet => "invalid-subnet",
            Self::AlreadyReserved => "already-reserved",
            Self::Intersects(ReservedList::Allow) => "intersects-allow-list",
            Self::Intersects(ReservedList::Deny) => "intersects-deny-list",
            Self::NotReserved => "not-reserved",
            Self::ResetFailed => "reset-failed",
            Self::ValidationError => "validation-error",
        }
    }

    /// Returns whether the operation took effect.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            Self::SubnetAdded | Self::SubnetRemoved | Self::BucketsReset
        )
    }
}
