//! Application configuration
//!
//! Each component owns an explicit configuration struct listing every option
//! it recognises together with its default. [`AppConfig`] bundles them and
//! [`AppConfig::validate`] checks them all before anything is constructed.

use crate::catalog::CatalogConfig;
use crate::downloader::config::SchedulerConfig;
use crate::postprocess::DispatcherConfig;
use crate::profile::ProfileConfig;

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Lower bound of a delay range exceeds the upper bound
    #[error("invalid delay range: {min_ms}ms > {max_ms}ms")]
    InvalidDelayRange {
        /// Lower bound in milliseconds
        min_ms: u128,
        /// Upper bound in milliseconds
        max_ms: u128,
    },

    /// Identity pool is too small to vary between calls
    #[error("identity pool needs at least {required} entries, got {actual}")]
    IdentityPoolTooSmall {
        /// Minimum pool size
        required: usize,
        /// Configured pool size
        actual: usize,
    },

    /// Throttling ceilings are zero or inverted
    #[error("invalid throttling ceiling: {0}")]
    InvalidRateCeiling(String),

    /// Retry policy cannot be honoured
    #[error("invalid retry policy: {0}")]
    InvalidRetryPolicy(String),

    /// Output template lacks a required placeholder
    #[error("output template {template:?} must contain {placeholder}")]
    MissingPlaceholder {
        /// Offending template
        template: String,
        /// Placeholder that must be present
        placeholder: &'static str,
    },

    /// Any other invalid value
    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        /// Option name
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },
}

/// Configuration for every component of the orchestrator.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Session profile generation
    pub profile: ProfileConfig,
    /// Catalog presentation and discovery pacing
    pub catalog: CatalogConfig,
    /// Download scheduling
    pub scheduler: SchedulerConfig,
    /// Post-download conversion
    pub dispatcher: DispatcherConfig,
}

impl AppConfig {
    /// Validate every component configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.profile.validate()?;
        self.catalog.validate()?;
        self.scheduler.validate()?;
        self.dispatcher.validate()?;
        Ok(())
    }
}
