use bfguard_core::{AppError, AppResult};
use bfguard_domain::AttemptDimension;

/// Per-minute attempt budgets for the three dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptLimits {
    login: u32,
    password: u32,
    ip: u32,
}

impl AttemptLimits {
    /// Creates limits, rejecting zero budgets.
    pub fn new(login: u32, password: u32, ip: u32) -> AppResult<Self> {
        for (name, value) in [("login", login), ("password", password), ("ip", ip)] {
            if value == 0 {
                return Err(AppError::Validation(format!(
                    "{name} attempts per minute must be greater than zero"
                )));
            }
        }

        Ok(Self {
            login,
            password,
            ip,
        })
    }

    /// Returns the configured budget of one dimension.
    #[must_use]
    pub fn for_dimension(&self, dimension: AttemptDimension) -> u32 {
        match dimension {
            AttemptDimension::Login => self.login,
            AttemptDimension::Password => self.password,
            AttemptDimension::Ip => self.ip,
        }
    }
}
