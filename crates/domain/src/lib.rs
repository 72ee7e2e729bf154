//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod access_list;
mod attempt;
mod decision;

pub use access_list::{AccessLists, ReservationError, ReservedList, ReservedSubnet};
pub use attempt::{AttemptDimension, AttemptKey, AuthorizationAttempt, parse_source_ip};
pub use decision::{AccessListOutcome, Decision, DecisionReason};
