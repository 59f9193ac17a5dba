// Rust guideline compliant 2026-10-18

//! Process configuration for the dashboard binary.
//!
//! Values come from the environment (`MONITOR_BIND_ADDR`,
//! `MONITOR_UPDATE_INTERVAL_SECS`), falling back to the builder defaults when a
//! variable is unset. The history capacity is fixed and not configurable.

use std::net::SocketAddr;
use std::time::Duration;

/// Listen address variable.
pub const ENV_BIND_ADDR: &str = "MONITOR_BIND_ADDR";
/// Updater interval variable, whole seconds.
pub const ENV_UPDATE_INTERVAL_SECS: &str = "MONITOR_UPDATE_INTERVAL_SECS";

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Errors raised while reading or validating the configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable could not be parsed.
    #[error("{var}: {reason}")]
    InvalidVar {
        /// Variable name.
        var: &'static str,
        /// Human-readable description of the problem.
        reason: String,
    },
    /// The assembled configuration is invalid.
    #[error("invalid dashboard configuration: {reason}")]
    InvalidConfig {
        /// Human-readable description of the problem.
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// DashboardConfig + builder
// ---------------------------------------------------------------------------

/// Runtime configuration of the dashboard process.
///
/// Construct via [`DashboardConfig::builder`] or [`DashboardConfig::from_env`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    /// Address the HTTP server listens on.
    pub bind_addr: SocketAddr,
    /// Delay between background metric snapshots.
    pub update_interval: Duration,
}

/// Builder for [`DashboardConfig`].
#[derive(Debug)]
pub struct DashboardConfigBuilder {
    config: DashboardConfig,
}

impl DashboardConfig {
    /// Create a builder.
    ///
    /// Default values: `bind_addr = 0.0.0.0:5000`, `update_interval = 5 s`.
    #[must_use]
    pub fn builder() -> DashboardConfigBuilder {
        DashboardConfigBuilder {
            config: Self {
                bind_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
                update_interval: Duration::from_secs(5),
            },
        }
    }

    /// Read the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable is malformed or the result is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read the configuration through `lookup`, which maps a variable name to
    /// its value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable is malformed or the result is invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut builder = Self::builder();
        if let Some(addr) = lookup(ENV_BIND_ADDR) {
            builder = builder.bind_addr(parse(ENV_BIND_ADDR, &addr)?);
        }
        if let Some(secs) = lookup(ENV_UPDATE_INTERVAL_SECS) {
            builder = builder.update_interval(Duration::from_secs(parse(ENV_UPDATE_INTERVAL_SECS, &secs)?));
        }
        builder.build()
    }
}

fn parse<T>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidVar { var, reason: format!("{raw:?}: {e}") })
}

impl DashboardConfigBuilder {
    /// Override the listen address.
    #[must_use]
    pub fn bind_addr(mut self, addr: SocketAddr) -> Self {
        self.config.bind_addr = addr;
        self
    }

    /// Override the background update interval.
    #[must_use]
    pub fn update_interval(mut self, interval: Duration) -> Self {
        self.config.update_interval = interval;
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidConfig`] when the interval is zero.
    #[must_use = "the Result must be checked; use ? or unwrap"]
    pub fn build(self) -> Result<DashboardConfig, ConfigError> {
        if self.config.update_interval.is_zero() {
            return Err(ConfigError::InvalidConfig { reason: "update interval must be > 0".to_owned() });
        }
        Ok(self.config)
    }
}
