//! Engine configuration.
//!
//! # Example Usage
//!
//! ```rust
//! use idp_engine::config::EngineConfig;
//!
//! let config = EngineConfig::builder()
//!     .blueprints_dir("/srv/blueprints")
//!     .watch(false)
//!     .build()
//!     .unwrap();
//! assert!(!config.watch);
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Environment variable naming the blueprint root directory.
pub const ENV_BLUEPRINTS_DIR: &str = "IDP_BLUEPRINTS_DIR";
/// Environment variable toggling the filesystem watcher.
pub const ENV_BLUEPRINTS_WATCH: &str = "IDP_BLUEPRINTS_WATCH";

/// Default blueprint root when nothing is configured.
pub const DEFAULT_BLUEPRINTS_DIR: &str = "/blueprints";
/// Path prefix marking instances fetched from an OCI registry.
pub const DEFAULT_OCI_PREFIX: &str = "oci://";

/// Errors raised while building or loading configuration.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Configuration validation failed: {message}")]
    ValidationError { message: String },

    #[error("Invalid value '{value}' for {variable}")]
    InvalidValue { variable: String, value: String },
}

/// Settings for the blueprint engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Root directory recursively scanned for blueprint files.
    pub blueprints_dir: PathBuf,
    /// Instance paths starting with this prefix are fetched remotely.
    pub oci_prefix: String,
    /// Whether the filesystem watcher should be started.
    pub watch: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            blueprints_dir: PathBuf::from(DEFAULT_BLUEPRINTS_DIR),
            oci_prefix: DEFAULT_OCI_PREFIX.to_string(),
            watch: true,
        }
    }
}

impl EngineConfig {
    /// Create a new builder starting from defaults.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::builder();

        if let Some(dir) = lookup(ENV_BLUEPRINTS_DIR) {
            builder = builder.blueprints_dir(dir);
        }
        if let Some(raw) = lookup(ENV_BLUEPRINTS_WATCH) {
            let watch = match raw.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ConfigurationError::InvalidValue {
                        variable: ENV_BLUEPRINTS_WATCH.to_string(),
                        value: raw,
                    });
                }
            };
            builder = builder.watch(watch);
        }

        builder.build()
    }

    /// Validate the configuration for consistency.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.blueprints_dir.as_os_str().is_empty() {
            return Err(ConfigurationError::ValidationError {
                message: "Blueprint directory cannot be empty".to_string(),
            });
        }
        if self.oci_prefix.is_empty() {
            return Err(ConfigurationError::ValidationError {
                message: "Remote blueprint prefix cannot be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Whether an instance path refers to a remotely fetched blueprint.
    pub fn is_remote_path(&self, path: &str) -> bool {
        path.starts_with(&self.oci_prefix)
    }
}

/// Builder for [`EngineConfig`].
#[derive(Debug, Clone, Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// Set the blueprint root directory.
    pub fn blueprints_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.blueprints_dir = dir.into();
        self
    }

    /// Set the remote path prefix.
    pub fn oci_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.oci_prefix = prefix.into();
        self
    }

    /// Enable or disable the filesystem watcher.
    pub fn watch(mut self, watch: bool) -> Self {
        self.config.watch = watch;
        self
    }

    /// Validate and build the configuration.
    pub fn build(self) -> Result<EngineConfig, ConfigurationError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
