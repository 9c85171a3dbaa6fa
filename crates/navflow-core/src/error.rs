//! Error taxonomy for the navigation runtime.
//!
//! Misuse of the API surfaces immediately as a [`ConfigurationError`] or a
//! [`NavError::NotFound`]. Tearing down a user that is not registered is not an
//! error at all: duplicate teardown happens legitimately around restarts and is
//! tolerated by the scope manager.

use thiserror::Error;

use crate::key::{BindingTag, ScopeTag};

/// Programmer errors: malformed histories, unknown scopes, bad configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("history may not be empty")]
    EmptyHistory,
    #[error("no factory registered for scope `{0}`")]
    UnregisteredScope(ScopeTag),
    #[error("scope `{0}` registered twice")]
    DuplicateScope(ScopeTag),
    #[error("composite key nesting exceeds {limit} levels")]
    CompositeTooDeep { limit: usize },
    #[error("{key} not found in history")]
    KeyNotInHistory { key: String },
    #[error("model for scope `{scope}` binding `{binding}` is not a {expected}")]
    ModelTypeMismatch {
        scope: ScopeTag,
        binding: BindingTag,
        expected: &'static str,
    },
    #[error("invalid navigator config: {0}")]
    InvalidConfig(String),
}

/// Failure reported by a [`KeyCodec`](crate::KeyCodec) or a model payload decoder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CodecError {
    message: String,
}

impl CodecError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Reasons a persisted state could not be brought back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RestoreError {
    #[error("failed to decode history frame {index}: {source}")]
    Key { index: usize, source: CodecError },
    #[error("restored history is empty")]
    EmptyHistory,
    #[error("restored history is invalid: {0}")]
    InvalidHistory(ConfigurationError),
    #[error("no factory registered for saved scope `{0}`")]
    UnregisteredScope(ScopeTag),
    #[error("failed to restore model for scope `{scope}` binding `{binding}`: {source}")]
    Model {
        scope: ScopeTag,
        binding: BindingTag,
        source: CodecError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("no model exists for scope `{scope}` binding `{binding}`")]
    NotFound { scope: ScopeTag, binding: BindingTag },
    #[error("key codec failed: {0}")]
    Codec(#[from] CodecError),
    #[error("restore failed: {0}")]
    Restore(#[from] RestoreError),
    #[error("navigator was disposed")]
    Disposed,
}
