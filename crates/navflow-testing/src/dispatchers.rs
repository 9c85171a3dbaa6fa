//! Dispatchers that record what they are asked to render.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use navflow_core::{Dispatcher, History, Key, Traversal, TraversalCompletion};

/// Completes every traversal as soon as it arrives.
pub struct RecordingDispatcher<K: Key> {
    traversals: Rc<RefCell<Vec<Traversal<K>>>>,
}

impl<K: Key> RecordingDispatcher<K> {
    pub fn new() -> Self {
        Self {
            traversals: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn traversals(&self) -> Vec<Traversal<K>> {
        self.traversals.borrow().clone()
    }

    pub fn count(&self) -> usize {
        self.traversals.borrow().len()
    }

    pub fn last(&self) -> Option<Traversal<K>> {
        self.traversals.borrow().last().cloned()
    }

    pub fn last_destination(&self) -> Option<History<K>> {
        self.last().map(|traversal| traversal.destination().clone())
    }

    pub fn clear(&self) {
        self.traversals.borrow_mut().clear();
    }
}

impl<K: Key> Default for RecordingDispatcher<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Key> Clone for RecordingDispatcher<K> {
    fn clone(&self) -> Self {
        Self {
            traversals: Rc::clone(&self.traversals),
        }
    }
}

impl<K: Key> Dispatcher<K> for RecordingDispatcher<K> {
    fn dispatch(&self, traversal: Traversal<K>, completion: TraversalCompletion<K>) {
        log::trace!(
            "recording {:?} traversal to {:?}",
            traversal.direction(),
            traversal.destination()
        );
        self.traversals.borrow_mut().push(traversal);
        completion.complete();
    }
}

struct ManualState<K: Key> {
    traversals: Vec<Traversal<K>>,
    pending: VecDeque<TraversalCompletion<K>>,
}

/// Holds every completion until the test fires it.
pub struct ManualDispatcher<K: Key> {
    state: Rc<RefCell<ManualState<K>>>,
}

impl<K: Key> ManualDispatcher<K> {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(ManualState {
                traversals: Vec::new(),
                pending: VecDeque::new(),
            })),
        }
    }

    /// Completes the oldest held traversal. Returns `false` if none is held.
    pub fn fire(&self) -> bool {
        let completion = self.state.borrow_mut().pending.pop_front();
        match completion {
            Some(completion) => {
                completion.complete();
                true
            }
            None => false,
        }
    }

    /// Fires until nothing is held, including traversals dispatched by the
    /// completions themselves. Returns how many fired.
    pub fn fire_all(&self) -> usize {
        let mut fired = 0;
        while self.fire() {
            fired += 1;
        }
        fired
    }

    pub fn pending(&self) -> usize {
        self.state.borrow().pending.len()
    }

    pub fn traversals(&self) -> Vec<Traversal<K>> {
        self.state.borrow().traversals.clone()
    }

    pub fn count(&self) -> usize {
        self.state.borrow().traversals.len()
    }

    pub fn last(&self) -> Option<Traversal<K>> {
        self.state.borrow().traversals.last().cloned()
    }

    pub fn last_destination(&self) -> Option<History<K>> {
        self.last().map(|traversal| traversal.destination().clone())
    }

    /// Panics if a traversal is still waiting to be fired.
    pub fn assert_idle(&self) {
        let pending = self.pending();
        assert_eq!(pending, 0, "{pending} traversal(s) still pending");
    }
}

impl<K: Key> Default for ManualDispatcher<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Key> Clone for ManualDispatcher<K> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<K: Key> Dispatcher<K> for ManualDispatcher<K> {
    fn dispatch(&self, traversal: Traversal<K>, completion: TraversalCompletion<K>) {
        let mut state = self.state.borrow_mut();
        state.traversals.push(traversal);
        state.pending.push_back(completion);
    }
}
