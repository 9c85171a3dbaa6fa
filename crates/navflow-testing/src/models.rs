//! Scoped models for tests.

use std::cell::Cell;
use std::rc::Rc;

use navflow_core::{CodecError, ModelPayload, ScopeFactory, ScopedModel};

/// A persistable integer.
#[derive(Debug, Default)]
pub struct Counter {
    value: Cell<i64>,
}

impl Counter {
    pub fn with_value(value: i64) -> Self {
        Self {
            value: Cell::new(value),
        }
    }

    pub fn get(&self) -> i64 {
        self.value.get()
    }

    pub fn set(&self, value: i64) {
        self.value.set(value);
    }

    pub fn increment(&self) -> i64 {
        let value = self.value.get() + 1;
        self.value.set(value);
        value
    }
}

impl ScopedModel for Counter {
    fn persist(&self) -> Option<ModelPayload> {
        Some(self.value.get().to_le_bytes().to_vec())
    }
}

/// Lives in memory only.
#[derive(Debug, Default)]
pub struct Ephemeral;

impl ScopedModel for Ephemeral {}

/// Builds and restores [`Counter`]s, counting fresh creations.
#[derive(Clone, Debug, Default)]
pub struct CounterFactory {
    created: Rc<Cell<usize>>,
}

impl CounterFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counters made by [`ScopeFactory::create`]; restores are not counted.
    pub fn created(&self) -> usize {
        self.created.get()
    }
}

impl ScopeFactory for CounterFactory {
    fn create(&self) -> Rc<dyn ScopedModel> {
        self.created.set(self.created.get() + 1);
        Rc::new(Counter::default())
    }

    fn restore(&self, payload: &[u8]) -> Result<Rc<dyn ScopedModel>, CodecError> {
        let bytes: [u8; 8] = payload
            .try_into()
            .map_err(|_| CodecError::new(format!("expected 8 bytes, got {}", payload.len())))?;
        Ok(Rc::new(Counter::with_value(i64::from_le_bytes(bytes))))
    }
}
