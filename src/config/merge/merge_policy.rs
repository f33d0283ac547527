//! Built-in defaults, registered as the lowest-precedence layer.

use crate::logging::LoggingConfig;
use crate::sync::SyncConfig;
use crate::tree::FingerprintConfig;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// Start a builder carrying every default value.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let sync = SyncConfig::default();
    let fingerprint = FingerprintConfig::default();
    let logging = LoggingConfig::default();

    Config::builder()
        .set_default("sync.debris_dir", sync.debris_dir)?
        .set_default("sync.require_fingerprint", sync.require_fingerprint)?
        .set_default("fingerprint.full_read_limit", fingerprint.full_read_limit)?
        .set_default("fingerprint.sample_count", fingerprint.sample_count as u64)?
        .set_default("fingerprint.sample_size", fingerprint.sample_size as u64)?
        .set_default("logging.enabled", logging.enabled)?
        .set_default("logging.level", logging.level)?
        .set_default("logging.format", logging.format)?
        .set_default("logging.output", logging.output)?
        .set_default("logging.color", logging.color)
}
