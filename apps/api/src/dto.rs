use std::fmt::{Debug, Formatter};

use bfguard_application::{AccessListReport, AuthorizationOutcome};
use bfguard_domain::ReservedSubnet;
use serde::{Deserialize, Serialize};

/// Incoming authorization attempt.
#[derive(Deserialize)]
pub struct AuthorizeRequest {
    pub login: String,
    pub password: String,
    pub ip: String,
}

impl Debug for AuthorizeRequest {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("AuthorizeRequest")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .field("ip", &self.ip)
            .finish()
    }
}

/// Incoming budget reset. Either field may be omitted.
#[derive(Debug, Default, Deserialize)]
pub struct ResetBucketsRequest {
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub ip: String,
}

/// Incoming subnet for allow-list and deny-list mutations.
#[derive(Debug, Deserialize)]
pub struct SubnetRequest {
    pub cidr: String,
}

/// Uniform verdict payload for every mutating route.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub success: bool,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl From<&AuthorizationOutcome> for StatusResponse {
    fn from(outcome: &AuthorizationOutcome) -> Self {
        Self {
            success: outcome.decision.allowed(),
            message: outcome.decision.reason().as_str(),
            detail: outcome.error.as_ref().map(ToString::to_string),
        }
    }
}

impl From<AccessListReport> for StatusResponse {
    fn from(report: AccessListReport) -> Self {
        Self {
            success: report.success(),
            message: report.outcome.as_str(),
            detail: report.detail,
        }
    }
}

/// Entries of one reserved list.
#[derive(Debug, Serialize)]
pub struct SubnetListResponse {
    pub subnets: Vec<String>,
}

impl From<Vec<ReservedSubnet>> for SubnetListResponse {
    fn from(subnets: Vec<ReservedSubnet>) -> Self {
        Self {
            subnets: subnets.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Health response payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub ready: bool,
    pub tracker: TrackerHealth,
}

/// Attempt tracker health status.
#[derive(Debug, Serialize)]
pub struct TrackerHealth {
    pub backend: &'static str,
    pub status: &'static str,
    pub detail: Option<String>,
}
