//! bfguard administration client.

#![forbid(unsafe_code)]

use std::process::ExitCode;

use bfguard_core::{AppError, AppResult};
use bfguard_domain::ReservedList;
use clap::{Parser, Subcommand};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Command-line client for a running bfguard API.
#[derive(Debug, Parser)]
#[command(name = "bfguard", version, about = "Manage a bfguard brute-force guard")]
struct Cli {
    /// Base URL of the bfguard API.
    #[arg(
        long,
        env = "BFGUARD_API_URL",
        default_value = "http://127.0.0.1:3001",
        value_name = "URL"
    )]
    api_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check one login attempt.
    Authorize {
        login: String,
        password: String,
        ip: String,
    },
    /// Restore the attempt budgets of a login and/or an address.
    Reset {
        #[arg(long, default_value = "")]
        login: String,
        #[arg(long, default_value = "")]
        ip: String,
    },
    /// Manage the allow-list.
    Allow {
        #[command(subcommand)]
        action: ListAction,
    },
    /// Manage the deny-list.
    Deny {
        #[command(subcommand)]
        action: ListAction,
    },
}

#[derive(Debug, Subcommand)]
enum ListAction {
    /// Reserve a subnet.
    Add { cidr: String },
    /// Release a subnet.
    Remove { cidr: String },
    /// Print the reserved subnets.
    List,
}

#[derive(Debug, Serialize)]
struct AuthorizeRequest<'a> {
    login: &'a str,
    password: &'a str,
    ip: &'a str,
}

#[derive(Debug, Serialize)]
struct ResetBucketsRequest<'a> {
    login: &'a str,
    ip: &'a str,
}

#[derive(Debug, Serialize)]
struct SubnetRequest<'a> {
    cidr: &'a str,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    success: bool,
    message: String,
    detail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SubnetListResponse {
    subnets: Vec<String>,
}

struct ApiClient {
    http_client: reqwest::Client,
    base_url: String,
}

#[tokio::main]
async fn main() -> AppResult<ExitCode> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let client = ApiClient::new(cli.api_url.as_str());

    let response = match &cli.command {
        Command::Authorize {
            login,
            password,
            ip,
        } => {
            client
                .send(
                    Method::POST,
                    "/api/authorize",
                    &AuthorizeRequest {
                        login,
                        password,
                        ip,
                    },
                )
                .await?
        }
        Command::Reset { login, ip } => {
            client
                .send(
                    Method::POST,
                    "/api/buckets/reset",
                    &ResetBucketsRequest { login, ip },
                )
                .await?
        }
        Command::Allow { action } => client.list_action(ReservedList::Allow, action).await?,
        Command::Deny { action } => client.list_action(ReservedList::Deny, action).await?,
    };

    let Some(response) = response else {
        return Ok(ExitCode::SUCCESS);
    };

    match response.detail {
        Some(detail) => println!("{}: {detail}", response.message),
        None => println!("{}", response.message),
    }

    Ok(if response.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

impl ApiClient {
    fn new(base_url: &str) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    async fn list_action(
        &self,
        list: ReservedList,
        action: &ListAction,
    ) -> AppResult<Option<StatusResponse>> {
        let path = list_path(list);

        match action {
            ListAction::Add { cidr } => {
                self.send(Method::POST, path, &SubnetRequest { cidr })
                    .await
            }
            ListAction::Remove { cidr } => {
                self.send(Method::DELETE, path, &SubnetRequest { cidr })
                    .await
            }
            ListAction::List => {
                for subnet in self.list_subnets(path).await? {
                    println!("{subnet}");
                }
                Ok(None)
            }
        }
    }

    async fn send<T: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: &T,
    ) -> AppResult<Option<StatusResponse>> {
        let endpoint = format!("{}{path}", self.base_url);
        debug!(%method, endpoint = endpoint.as_str(), "calling bfguard api");

        let response = self
            .http_client
            .request(method, endpoint.as_str())
            .json(body)
            .send()
            .await
            .map_err(|error| AppError::Unavailable(format!("failed to call {endpoint}: {error}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<body unavailable>".to_owned());

        parse_status_response(body.as_str())
            .map(Some)
            .map_err(|error| {
                AppError::Internal(format!(
                    "{endpoint} returned status {}: {error}",
                    status.as_u16()
                ))
            })
    }

    async fn list_subnets(&self, path: &str) -> AppResult<Vec<String>> {
        let endpoint = format!("{}{path}", self.base_url);
        let response = self
            .http_client
            .get(endpoint.as_str())
            .send()
            .await
            .map_err(|error| AppError::Unavailable(format!("failed to call {endpoint}: {error}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_owned());
            return Err(AppError::Internal(format!(
                "{endpoint} returned status {}: {body}",
                status.as_u16()
            )));
        }

        let payload = response
            .json::<SubnetListResponse>()
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to parse {endpoint} response body: {error}"))
            })?;

        Ok(payload.subnets)
    }
}

fn list_path(list: ReservedList) -> &'static str {
    match list {
        ReservedList::Allow => "/api/allow-list",
        ReservedList::Deny => "/api/deny-list",
    }
}

/// Parses a verdict body, keeping the raw body in the error for non-verdict
/// responses such as server errors.
fn parse_status_response(body: &str) -> Result<StatusResponse, String> {
    serde_json::from_str::<StatusResponse>(body).map_err(|_| body.to_owned())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
