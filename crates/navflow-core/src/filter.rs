//! Hooks consulted when history is saved, restored, or runs out.

use crate::history::{History, HistoryBuilder};
use crate::key::Key;

/// Rewrites history on its way to and from persistence.
pub trait HistoryFilter<K: Key> {
    fn on_save_history(&self, history: &History<K>) -> History<K>;

    fn on_restore_history(&self, history: History<K>) -> History<K> {
        history
    }
}

/// Drops transient keys from the saved history, keeping order.
///
/// Filtering works frame by frame:
///
/// * a persistent frame is kept whole, components included, even when one of
///   those components is transient;
/// * a transient frame is replaced by its components, filtered the same way,
///   so a transient dialog persists as the screen underneath it.
///
/// A persistent composite therefore still flattens to a transient key after
/// saving. Keys that must never be persisted belong at the top level or
/// under transient composites.
#[derive(Clone, Copy, Debug, Default)]
pub struct TransientKeyFilter;

impl<K: Key> HistoryFilter<K> for TransientKeyFilter {
    fn on_save_history(&self, history: &History<K>) -> History<K> {
        let mut kept = Vec::with_capacity(history.len());
        for frame in history.frames_from_bottom() {
            retain_persistent(frame, &mut kept);
        }
        HistoryBuilder::new().push_all(kept).build()
    }
}

fn retain_persistent<K: Key>(key: &K, out: &mut Vec<K>) {
    if !key.is_transient() {
        out.push(key.clone());
        return;
    }
    for component in key.components() {
        retain_persistent(&component, out);
    }
}

/// Filters applied in registration order, on save and on restore alike.
pub struct FilterChain<K: Key> {
    filters: Vec<Box<dyn HistoryFilter<K>>>,
}

impl<K: Key> FilterChain<K> {
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// The chain navigators start with: only [`TransientKeyFilter`].
    pub fn standard() -> Self {
        Self::new().with(TransientKeyFilter)
    }

    pub fn with(mut self, filter: impl HistoryFilter<K> + 'static) -> Self {
        self.push(filter);
        self
    }

    pub fn push(&mut self, filter: impl HistoryFilter<K> + 'static) {
        self.filters.push(Box::new(filter));
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl<K: Key> Default for FilterChain<K> {
    fn default() -> Self {
        Self::standard()
    }
}

impl<K: Key> HistoryFilter<K> for FilterChain<K> {
    fn on_save_history(&self, history: &History<K>) -> History<K> {
        self.filters
            .iter()
            .fold(history.clone(), |current, filter| {
                filter.on_save_history(&current)
            })
    }

    fn on_restore_history(&self, history: History<K>) -> History<K> {
        self.filters
            .iter()
            .fold(history, |current, filter| filter.on_restore_history(current))
    }
}

/// Host hooks around persistence and the end of the flow.
pub trait HistoryCallback<K: Key> {
    /// Runs after the filter chain when state is saved.
    fn on_save_history(&self, history: History<K>) -> History<K> {
        history
    }

    /// Runs before the filter chain when state is restored.
    fn on_restore_history(&self, history: History<K>) -> History<K> {
        history
    }

    /// A backward traversal would have dropped below the minimum history
    /// size; the host should end the flow.
    fn on_history_cleared(&self) {}
}

#[cfg(test)]
#[path = "tests/filter_tests.rs"]
mod tests;
