//! Persisted navigator state and the key codec seam.
//!
//! The runtime never decides how a key is stored: hosts inject a
//! [`KeyCodec`] and pick the storage for [`PersistedState`], which is plain
//! serde data.

use serde::{Deserialize, Serialize};

use crate::error::{CodecError, RestoreError};
use crate::history::History;
use crate::key::Key;
use crate::scope::ScopeSnapshot;

/// Converts keys to and from bytes.
pub trait KeyCodec<K> {
    fn encode(&self, key: &K) -> Result<Vec<u8>, CodecError>;
    fn decode(&self, bytes: &[u8]) -> Result<K, CodecError>;
}

/// One key as produced by a [`KeyCodec`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedKey(pub Vec<u8>);

/// Everything a navigator needs to come back after a restart: the filtered
/// history frames, root first, and the persistable scoped models.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    pub history: Vec<EncodedKey>,
    pub models: ScopeSnapshot,
}

pub fn encode_history<K: Key>(
    history: &History<K>,
    codec: &dyn KeyCodec<K>,
) -> Result<Vec<EncodedKey>, CodecError> {
    history
        .frames_from_bottom()
        .map(|key| codec.encode(key).map(EncodedKey))
        .collect()
}

pub fn decode_history<K: Key>(
    frames: &[EncodedKey],
    codec: &dyn KeyCodec<K>,
) -> Result<History<K>, RestoreError> {
    let keys = frames
        .iter()
        .enumerate()
        .map(|(index, encoded)| {
            codec
                .decode(&encoded.0)
                .map_err(|source| RestoreError::Key { index, source })
        })
        .collect::<Result<Vec<K>, RestoreError>>()?;
    if keys.is_empty() {
        return Err(RestoreError::EmptyHistory);
    }
    Ok(History::of(keys))
}

#[cfg(test)]
#[path = "tests/persistence_tests.rs"]
mod tests;
