//! Configuration loading using Figment.
//!
//! Configuration is loaded from:
//! 1. `config/gda.toml` (base configuration)
//! 2. Environment variables prefixed with `GDA_`, nested keys separated by `__`
//!    (e.g. `GDA_RELAY__MAX_CACHE_SIZE=250`)
//!
//! Every section has defaults, so an empty or missing file still yields a
//! usable configuration.
//!
//! # Example
//! ```no_run
//! use gda_events::config::GdaConfig;
//!
//! let config = GdaConfig::load()?;
//! println!("Cache holds {} points", config.relay.max_cache_size);
//! # Ok::<(), gda_events::error::GdaError>(())
//! ```

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{AppResult, GdaError};

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "config/gda.toml";

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "GDA_";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GdaConfig {
    /// Application settings
    #[serde(default)]
    pub application: ApplicationConfig,
    /// Scan data relay settings
    #[serde(default)]
    pub relay: RelayConfig,
    /// Rendezvous settings
    #[serde(default)]
    pub sync: SyncConfig,
}

/// Application-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Application name
    #[serde(default = "default_name")]
    pub name: String,
    /// Logging level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Scan data relay configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Maximum number of points retained for late subscribers
    #[serde(default = "default_max_cache_size")]
    pub max_cache_size: usize,
}

/// Rendezvous configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Default bound on every rendezvous wait, in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub default_timeout_ms: u64,
}

// Default value functions
fn default_name() -> String {
    "GDA Events".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_cache_size() -> usize {
    1000
}

fn default_timeout_ms() -> u64 {
    60_000
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            log_level: default_log_level(),
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            max_cache_size: default_max_cache_size(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: default_timeout_ms(),
        }
    }
}

impl SyncConfig {
    /// The default wait bound as a `Duration`.
    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }
}

impl GdaConfig {
    /// Load configuration from `config/gda.toml` and environment variables
    pub fn load() -> AppResult<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from a specific file path
    ///
    /// A missing file is not an error; defaults and environment still apply.
    pub fn load_from<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let config: Self = Figment::from(Serialized::defaults(GdaConfig::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> AppResult<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.application.log_level.to_lowercase().as_str()) {
            return Err(GdaError::Configuration(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.application.log_level,
                valid_levels.join(", ")
            )));
        }

        if self.relay.max_cache_size == 0 {
            return Err(GdaError::Configuration(
                "relay.max_cache_size must be at least 1".to_string(),
            ));
        }

        // An unbounded wait is not representable; zero would fail every wait.
        if self.sync.default_timeout_ms == 0 {
            return Err(GdaError::Configuration(
                "sync.default_timeout_ms must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
