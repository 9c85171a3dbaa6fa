use std::cell::{Cell, RefCell};
use std::rc::Rc;

use navflow_core::{History, HistoryCallback, Key};

/// Remembers every history handed to it and counts cleared flows.
pub struct RecordingHistoryCallback<K: Key> {
    saved: Rc<RefCell<Vec<History<K>>>>,
    restored: Rc<RefCell<Vec<History<K>>>>,
    cleared: Rc<Cell<usize>>,
}

impl<K: Key> RecordingHistoryCallback<K> {
    pub fn new() -> Self {
        Self {
            saved: Rc::default(),
            restored: Rc::default(),
            cleared: Rc::default(),
        }
    }

    pub fn saved(&self) -> Vec<History<K>> {
        self.saved.borrow().clone()
    }

    pub fn restored(&self) -> Vec<History<K>> {
        self.restored.borrow().clone()
    }

    pub fn cleared(&self) -> usize {
        self.cleared.get()
    }
}

impl<K: Key> Default for RecordingHistoryCallback<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Key> Clone for RecordingHistoryCallback<K> {
    fn clone(&self) -> Self {
        Self {
            saved: Rc::clone(&self.saved),
            restored: Rc::clone(&self.restored),
            cleared: Rc::clone(&self.cleared),
        }
    }
}

impl<K: Key> HistoryCallback<K> for RecordingHistoryCallback<K> {
    fn on_save_history(&self, history: History<K>) -> History<K> {
        self.saved.borrow_mut().push(history.clone());
        history
    }

    fn on_restore_history(&self, history: History<K>) -> History<K> {
        self.restored.borrow_mut().push(history.clone());
        history
    }

    fn on_history_cleared(&self) {
        self.cleared.set(self.cleared.get() + 1);
    }
}
