//! Application services and ports.

#![forbid(unsafe_code)]

mod access_list_ports;
mod access_list_service;
mod attempt_ports;
mod authorization_service;

pub use access_list_ports::SubnetRegistry;
pub use access_list_service::{AccessListReport, AccessListService};
pub use attempt_ports::{AttemptCheck, AttemptTracker};
pub use authorization_service::{AttemptLimits, AuthorizationOutcome, AuthorizationService};
