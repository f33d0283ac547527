//! Global config file source: `$XDG_CONFIG_HOME/fsmirror/config.toml`

use crate::config::paths::xdg_root;
use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File, FileFormat};
use tracing::debug;

/// Add the user's global config file, if one can be located.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    match xdg_root::global_config_file() {
        Ok(path) => {
            debug!(path = %path.display(), "Using global config file");
            Ok(builder.add_source(
                File::from(path)
                    .format(FileFormat::Toml)
                    .required(false),
            ))
        }
        Err(e) => {
            debug!(error = %e, "No global config location");
            Ok(builder)
        }
    }
}
