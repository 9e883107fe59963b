//! Configuration module for the control plane.
//!
//! Provides layered configuration loading from a TOML file, environment
//! variables, and defaults.
//!
//! # Configuration Precedence
//!
//! 1. Environment variables (`TAILORPLANE_*`)
//! 2. Configuration file (TOML)
//! 3. Default values
//!
//! # Example
//!
//! ```rust
//! use tailorplane::config::PlaneConfig;
//!
//! let config = PlaneConfig::default();
//! assert_eq!(config.generation.max_retries, 3);
//!
//! let toml = r#"
//! [generation]
//! max_retries = 5
//! "#;
//! let config: PlaneConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.generation.max_retries, 5);
//! ```

pub mod error;
pub mod logging;

pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig};

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::invocation::GenerateOptions;

/// Generation-loop settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Total attempts per structured generation, including the first.
    pub max_retries: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self { max_retries: 3 }
    }
}

impl GenerationConfig {
    pub fn options(&self) -> GenerateOptions {
        GenerateOptions {
            max_retries: self.max_retries,
            ..GenerateOptions::default()
        }
    }
}

/// Budget defaults applied when the store has no global row yet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    /// System-wide platform spend cap in USD.
    pub global_cap_usd: f64,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            global_cap_usd: 250.0,
        }
    }
}

/// Unified configuration for the control plane.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PlaneConfig {
    pub generation: GenerationConfig,
    pub budget: BudgetConfig,
    pub logging: LoggingConfig,
}

impl PlaneConfig {
    /// Load configuration from a TOML file.
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply environment variable overrides.
    ///
    /// Supports TAILORPLANE_* environment variables for common settings.
    /// Invalid values are silently ignored (defaults are kept).
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(retries) = std::env::var("TAILORPLANE_MAX_RETRIES") {
            if let Ok(n) = retries.parse() {
                self.generation.max_retries = n;
            }
        }
        if let Ok(cap) = std::env::var("TAILORPLANE_GLOBAL_CAP_USD") {
            if let Ok(v) = cap.parse() {
                self.budget.global_cap_usd = v;
            }
        }
        if let Ok(level) = std::env::var("TAILORPLANE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("TAILORPLANE_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }
        self
    }
}
