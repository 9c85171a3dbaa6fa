//! Testing utilities for navflow hosts.

pub mod callback;
pub mod dispatchers;
pub mod keys;
pub mod models;

pub use callback::RecordingHistoryCallback;
pub use dispatchers::{ManualDispatcher, RecordingDispatcher};
pub use keys::TestKey;
pub use models::{Counter, CounterFactory, Ephemeral};

pub mod prelude {
    pub use crate::callback::*;
    pub use crate::dispatchers::*;
    pub use crate::keys::*;
    pub use crate::models::*;
}
