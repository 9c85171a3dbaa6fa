#![doc = r"Navigation history, traversal dispatch and scoped models for stack based UI flows."]

pub mod config;
pub mod error;
pub mod filter;
pub mod history;
pub mod key;
pub mod navigator;
pub mod persistence;
pub mod scope;
pub mod traversal;

#[cfg(test)]
mod test_support;

pub use config::NavigatorConfig;
pub use error::{CodecError, ConfigurationError, NavError, RestoreError};
pub use filter::{FilterChain, HistoryCallback, HistoryFilter, TransientKeyFilter};
pub use history::{History, HistoryBuilder};
pub use key::{BindingTag, Key, ScopeRelations, ScopeTag};
pub use navigator::{
    Dispatcher, DispatcherId, HistoryListenerRegistration, Navigator, NavigatorBuilder,
    NavigatorHandle, TraversalCompletion,
};
pub use persistence::{EncodedKey, KeyCodec, PersistedState};
pub use scope::{
    FnScopeFactory, ModelPayload, SavedModel, ScopeFactory, ScopeManager, ScopeManagerBuilder,
    ScopeSnapshot, ScopedModel,
};
pub use traversal::{Direction, FrameDiff, Traversal};
