use std::fmt::{Debug, Display, Formatter};
use std::net::IpAddr;
use std::str::FromStr;

use bfguard_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

/// Independent axis along which authorization attempts are counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptDimension {
    /// Submitted login.
    Login,
    /// Submitted password.
    Password,
    /// Originating network address.
    Ip,
}

impl AttemptDimension {
    /// Returns a stable storage value for this dimension.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Password => "password",
            Self::Ip => "ip",
        }
    }

    /// Returns all dimensions in fan-out order.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[AttemptDimension] = &[
            AttemptDimension::Login,
            AttemptDimension::Password,
            AttemptDimension::Ip,
        ];

        ALL
    }
}

impl Display for AttemptDimension {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Key of one attempt budget.
///
/// The dimension travels with the value so a login that looks like an IP
/// address never shares a budget with that address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttemptKey {
    dimension: AttemptDimension,
    value: String,
}

impl AttemptKey {
    /// Key for a submitted login.
    #[must_use]
    pub fn login(login: &str) -> Self {
        Self {
            dimension: AttemptDimension::Login,
            value: login.to_owned(),
        }
    }

    /// Key for a submitted password.
    ///
    /// Only a SHA-256 digest of the password is kept.
    #[must_use]
    pub fn password(password: &str) -> Self {
        Self {
            dimension: AttemptDimension::Password,
            value: hash_secret(password),
        }
    }

    /// Key for an originating address.
    #[must_use]
    pub fn ip(address: IpAddr) -> Self {
        Self {
            dimension: AttemptDimension::Ip,
            value: address.to_canonical().to_string(),
        }
    }

    /// Returns the dimension of this key.
    #[must_use]
    pub fn dimension(&self) -> AttemptDimension {
        self.dimension
    }

    /// Returns the dimension-local value.
    #[must_use]
    pub fn value(&self) -> &str {
        self.value.as_str()
    }

    /// Returns `"{dimension}:{value}"`, suitable as a shared-store key suffix.
    #[must_use]
    pub fn storage_key(&self) -> String {
        format!("{}:{}", self.dimension.as_str(), self.value)
    }
}

impl Display for AttemptKey {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.storage_key().as_str())
    }
}

/// Validated inbound authorization attempt.
#[derive(Clone)]
pub struct AuthorizationAttempt {
    login: NonEmptyString,
    password: NonEmptyString,
    source_ip: IpAddr,
}

impl AuthorizationAttempt {
    /// Validates raw request fields.
    pub fn new(login: &str, password: &str, source_ip: &str) -> AppResult<Self> {
        let login = NonEmptyString::new(login)
            .map_err(|_| AppError::Validation("login must not be empty".to_owned()))?;
        let password = NonEmptyString::new(password)
            .map_err(|_| AppError::Validation("password must not be empty".to_owned()))?;
        let source_ip = parse_source_ip(source_ip)?;

        Ok(Self {
            login,
            password,
            source_ip,
        })
    }

    /// Returns the submitted login.
    #[must_use]
    pub fn login(&self) -> &str {
        self.login.as_str()
    }

    /// Returns the submitted password.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.as_str()
    }

    /// Returns the originating address.
    #[must_use]
    pub fn source_ip(&self) -> IpAddr {
        self.source_ip
    }

    /// Returns the three budget keys in fan-out order.
    #[must_use]
    pub fn attempt_keys(&self) -> [AttemptKey; 3] {
        [
            AttemptKey::login(self.login()),
            AttemptKey::password(self.password()),
            AttemptKey::ip(self.source_ip),
        ]
    }
}

impl Debug for AuthorizationAttempt {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("AuthorizationAttempt")
            .field("login", &self.login.as_str())
            .field("password", &"<redacted>")
            .field("source_ip", &self.source_ip)
            .finish()
    }
}

/// Parses a textual source address, folding IPv4-mapped IPv6 to IPv4.
pub fn parse_source_ip(value: &str) -> AppResult<IpAddr> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("ip must not be empty".to_owned()));
    }

    IpAddr::from_str(trimmed)
        .map(|address| address.to_canonical())
        .map_err(|error| AppError::Validation(format!("invalid ip '{trimmed}': {error}")))
}

fn hash_secret(raw: &str) -> String {
    use sha2::{Digest, Sha256};
    use std::fmt::Write;

    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    let result = hasher.finalize();

    result
        .iter()
        .fold(String::with_capacity(64), |mut acc, byte| {
            let _ = write!(acc, "{byte:02x}");
            acc
        })
}
