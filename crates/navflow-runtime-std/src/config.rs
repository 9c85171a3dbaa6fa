use std::fs;
use std::io;
use std::path::Path;

use navflow_core::NavigatorConfig;

use crate::error::StdError;

/// Parses and validates a TOML navigator config. Missing fields keep their
/// defaults.
pub fn config_from_toml(source: &str) -> Result<NavigatorConfig, StdError> {
    let config: NavigatorConfig = toml::from_str(source)?;
    config.validate()?;
    Ok(config)
}

/// Reads `path` with [`config_from_toml`]. A missing file yields the default
/// config.
pub fn load_config(path: impl AsRef<Path>) -> Result<NavigatorConfig, StdError> {
    let path = path.as_ref();
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            log::debug!("no config at {path:?}, using defaults");
            return Ok(NavigatorConfig::default());
        }
        Err(err) => return Err(StdError::io(path, err)),
    };
    log::debug!("loading navigator config from {path:?}");
    config_from_toml(&source)
}
