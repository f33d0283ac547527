//! Per-root config file source: `<sync root>/.fsmirror.toml`

use crate::config::ROOT_CONFIG_FILE;
use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File, FileFormat};
use std::path::Path;

pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    sync_root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let path = sync_root.join(ROOT_CONFIG_FILE);
    Ok(builder.add_source(
        File::from(path)
            .format(FileFormat::Toml)
            .required(false),
    ))
}
