use std::io;
use std::path::PathBuf;

use navflow_core::ConfigurationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StdError {
    #[error("i/o error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed state in {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("malformed config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error(transparent)]
    Config(#[from] ConfigurationError),
}

impl StdError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        StdError::Io {
            path: path.into(),
            source,
        }
    }
}
