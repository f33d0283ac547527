//! Configuration
//!
//! Layered configuration for a sync root, built with the `config` crate:
//! built-in defaults, the user's global file, the sync root's own file and
//! finally `FSMIRROR__SECTION__KEY` environment variables.

pub mod facade;
pub mod merge;
pub mod paths;
pub mod sources;

pub use facade::ConfigLoader;

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::sync::SyncConfig;
use crate::tree::FingerprintConfig;
use serde::{Deserialize, Serialize};

/// File name of the per-root configuration file.
pub const ROOT_CONFIG_FILE: &str = ".fsmirror.toml";

/// Complete configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MirrorConfig {
    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub fingerprint: FingerprintConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl MirrorConfig {
    /// Reject settings the reconciliation pass cannot work with.
    pub fn validate(&self) -> Result<(), ApiError> {
        let debris = &self.sync.debris_dir;
        if debris.is_empty() || debris == "." || debris == ".." || debris.contains(['/', '\\']) {
            return Err(ApiError::ConfigError(format!(
                "sync.debris_dir must be a single folder name, got {:?}",
                debris
            )));
        }
        if self.fingerprint.sample_size == 0 {
            return Err(ApiError::ConfigError(
                "fingerprint.sample_size must be greater than zero".to_string(),
            ));
        }
        if self.fingerprint.sample_count == 0 {
            return Err(ApiError::ConfigError(
                "fingerprint.sample_count must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Render as TOML, e.g. to seed a `.fsmirror.toml`.
    pub fn to_toml(&self) -> Result<String, ApiError> {
        toml::to_string_pretty(self)
            .map_err(|e| ApiError::ConfigError(format!("Failed to serialize config: {}", e)))
    }
}
