//! On-disk [`PersistedState`].

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use navflow_core::PersistedState;

use crate::error::StdError;

/// A JSON file holding one persisted navigator state. Writes go to a
/// sibling temp file that is synced and renamed over the target, so a
/// reader sees either the old state or the new one.
#[derive(Clone, Debug)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, state: &PersistedState) -> Result<(), StdError> {
        let json = serde_json::to_vec_pretty(state).map_err(|source| StdError::Json {
            path: self.path.clone(),
            source,
        })?;
        let tmp_path = self.path.with_extension("tmp");
        let written = File::create(&tmp_path)
            .and_then(|mut file| {
                file.write_all(&json)?;
                file.sync_all()
            })
            .map_err(|err| StdError::io(&tmp_path, err))
            .and_then(|()| {
                fs::rename(&tmp_path, &self.path).map_err(|err| StdError::io(&self.path, err))
            });
        if let Err(err) = written {
            if let Err(cleanup) = fs::remove_file(&tmp_path) {
                if cleanup.kind() != io::ErrorKind::NotFound {
                    log::warn!("could not remove {tmp_path:?}: {cleanup}");
                }
            }
            return Err(err);
        }
        log::debug!(
            "saved {} frames and {} models to {:?}",
            state.history.len(),
            state.models.len(),
            self.path
        );
        Ok(())
    }

    /// `None` when nothing has been saved yet.
    pub fn load(&self) -> Result<Option<PersistedState>, StdError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                log::debug!("no saved state at {:?}", self.path);
                return Ok(None);
            }
            Err(err) => return Err(StdError::io(&self.path, err)),
        };
        let state = serde_json::from_slice(&bytes).map_err(|source| StdError::Json {
            path: self.path.clone(),
            source,
        })?;
        Ok(Some(state))
    }

    /// Deletes the saved state, if any.
    pub fn clear(&self) -> Result<(), StdError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StdError::io(&self.path, err)),
        }
    }
}
