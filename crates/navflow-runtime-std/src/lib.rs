//! Standard runtime services backed by Rust's `std` library.
//!
//! `navflow-core` leaves key encoding and storage to the host. This crate
//! fills those seams with JSON: a [`JsonKeyCodec`] for any serde key, a
//! [`JsonScopeFactory`] for models persisted as JSON, a [`StateFile`] that
//! keeps a [`PersistedState`](navflow_core::PersistedState) on disk, and TOML
//! loading for [`NavigatorConfig`](navflow_core::NavigatorConfig).

mod codec;
mod config;
mod error;
mod model;
mod state_file;

pub use codec::JsonKeyCodec;
pub use config::{config_from_toml, load_config};
pub use error::StdError;
pub use model::{json_payload, JsonScopeFactory};
pub use state_file::StateFile;
