use std::fmt::{Display, Formatter};
use std::net::IpAddr;
use std::str::FromStr;

use bfguard_core::AppError;
use ipnet::IpNet;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One of the two administrator-managed subnet lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservedList {
    /// Senders inside these subnets skip rate limiting and are always allowed.
    Allow,
    /// Senders inside these subnets are always denied.
    Deny,
}

impl ReservedList {
    /// Returns a stable label for this list.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allow => "allow-list",
            Self::Deny => "deny-list",
        }
    }

    /// Returns the list a subnet must not intersect when inserted into `self`.
    #[must_use]
    pub fn opposite(&self) -> Self {
        match self {
            Self::Allow => Self::Deny,
            Self::Deny => Self::Allow,
        }
    }
}

impl Display for ReservedList {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for ReservedList {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "allow" | "allow-list" => Ok(Self::Allow),
            "deny" | "deny-list" => Ok(Self::Deny),
            _ => Err(AppError::Validation(format!(
                "unknown reserved list '{value}', expected 'allow' or 'deny'"
            ))),
        }
    }
}

/// A CIDR network stored in canonical form.
///
/// Host bits are truncated on construction, so `10.0.0.5/24` and
/// `10.0.0.0/24` are the same subnet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReservedSubnet(IpNet);

impl ReservedSubnet {
    /// Parses CIDR notation into a canonical subnet.
    pub fn parse(value: &str) -> Result<Self, ReservationError> {
        let trimmed = value.trim();
        trimmed
            .parse::<IpNet>()
            .map(|network| Self(network.trunc()))
            .map_err(|error| ReservationError::InvalidSubnet {
                value: trimmed.to_owned(),
                reason: error.to_string(),
            })
    }

    /// Wraps an already parsed network.
    #[must_use]
    pub fn from_network(network: IpNet) -> Self {
        Self(network.trunc())
    }

    /// Returns the canonical network.
    #[must_use]
    pub fn network(&self) -> IpNet {
        self.0
    }

    /// Returns whether the address lies inside this subnet.
    ///
    /// IPv4-mapped IPv6 addresses are matched against IPv4 subnets.
    #[must_use]
    pub fn contains(&self, address: IpAddr) -> bool {
        self.0.contains(&address.to_canonical())
    }

    /// Returns whether the two subnets share any address.
    ///
    /// CIDR blocks either nest or are disjoint, so checking each base address
    /// against the other range covers equality and containment both ways.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.0.contains(&other.0.network()) || other.0.contains(&self.0.network())
    }
}

impl Display for ReservedSubnet {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl FromStr for ReservedSubnet {
    type Err = ReservationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

/// Failures reported by subnet reservation operations.
#[derive(Debug, Error)]
pub enum ReservationError {
    /// Input is not valid CIDR notation.
    #[error("invalid subnet '{value}': {reason}")]
    InvalidSubnet {
        /// Rejected input.
        value: String,
        /// Parser message.
        reason: String,
    },

    /// The same subnet is already present in the target list.
    #[error("subnet {subnet} is already reserved in the {list}")]
    DuplicateInList {
        /// Target list.
        list: ReservedList,
        /// Rejected subnet.
        subnet: ReservedSubnet,
    },

    /// The subnet equals, contains, or is contained by a subnet of the other list.
    #[error("subnet {subnet} intersects {conflicting} in the {}", .list.opposite())]
    ConflictsWithOtherList {
        /// Target list.
        list: ReservedList,
        /// Rejected subnet.
        subnet: ReservedSubnet,
        /// Entry of the opposite list that overlaps.
        conflicting: ReservedSubnet,
    },

    /// The subnet is not present in the target list.
    #[error("subnet {subnet} is not reserved in the {list}")]
    NotReserved {
        /// Target list.
        list: ReservedList,
        /// Requested subnet.
        subnet: ReservedSubnet,
    },

    /// Backing store failure.
    #[error(transparent)]
    Store(#[from] AppError),
}

impl From<ReservationError> for AppError {
    fn from(value: ReservationError) -> Self {
        match value {
            ReservationError::InvalidSubnet { .. } => Self::Validation(value.to_string()),
            ReservationError::DuplicateInList { .. }
            | ReservationError::ConflictsWithOtherList { .. } => Self::Conflict(value.to_string()),
            ReservationError::NotReserved { .. } => Self::NotFound(value.to_string()),
            ReservationError::Store(error) => error,
        }
    }
}

/// Allow-list and deny-list held together so one guard can cover both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessLists {
    allow: Vec<ReservedSubnet>,
    deny: Vec<ReservedSubnet>,
}

impl AccessLists {
    /// Creates empty lists.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the entries of one list in insertion order.
    #[must_use]
    pub fn entries(&self, list: ReservedList) -> &[ReservedSubnet] {
        match list {
            ReservedList::Allow => self.allow.as_slice(),
            ReservedList::Deny => self.deny.as_slice(),
        }
    }

    /// Returns whether any subnet of `list` contains the address.
    #[must_use]
    pub fn contains(&self, list: ReservedList, address: IpAddr) -> bool {
        self.entries(list)
            .iter()
            .any(|subnet| subnet.contains(address))
    }

    /// Appends a subnet to `list` if it does not overlap the opposite list
    /// and is not already present.
    pub fn add(&mut self, list: ReservedList, subnet: ReservedSubnet) -> Result<(), ReservationError> {
        if let Some(conflicting) = self
            .entries(list.opposite())
            .iter()
            .find(|existing| existing.intersects(&subnet))
        {
            return Err(ReservationError::ConflictsWithOtherList {
                list,
                subnet,
                conflicting: *conflicting,
            });
        }

        if self.entries(list).contains(&subnet) {
            return Err(ReservationError::DuplicateInList { list, subnet });
        }

        self.entries_mut(list).push(subnet);
        Ok(())
    }

    /// Removes a subnet from `list`. Remaining order is not preserved.
    pub fn remove(
        &mut self,
        list: ReservedList,
        subnet: ReservedSubnet,
    ) -> Result<(), ReservationError> {
        let entries = self.entries_mut(list);
        let Some(index) = entries.iter().position(|existing| existing == &subnet) else {
            return Err(ReservationError::NotReserved { list, subnet });
        };

        entries.swap_remove(index);
        Ok(())
    }

    fn entries_mut(&mut self, list: ReservedList) -> &mut Vec<ReservedSubnet> {
        match list {
            ReservedList::Allow => &mut self.allow,
            ReservedList::Deny => &mut self.deny,
        }
    }
}
