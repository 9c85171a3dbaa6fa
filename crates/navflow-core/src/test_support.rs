//! Keys, models and dispatchers shared by the unit tests.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use crate::error::CodecError;
use crate::key::{Key, ScopeRelations};
use crate::persistence::KeyCodec;
use crate::scope::{ModelPayload, ScopeFactory, ScopedModel};
use crate::traversal::Traversal;
use crate::{Dispatcher, TraversalCompletion};

#[derive(Clone, Debug, PartialEq)]
pub struct Screen {
    name: &'static str,
    transient: bool,
    components: Vec<Screen>,
    relations: Vec<(&'static str, &'static str)>,
}

impl Screen {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            transient: false,
            components: Vec::new(),
            relations: Vec::new(),
        }
    }

    pub fn transient(mut self) -> Self {
        self.transient = true;
        self
    }

    pub fn over(mut self, component: Screen) -> Self {
        self.components.push(component);
        self
    }

    pub fn uses(mut self, scope: &'static str, binding: &'static str) -> Self {
        self.relations.push((scope, binding));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl Key for Screen {
    fn components(&self) -> Vec<Self> {
        self.components.clone()
    }

    fn is_transient(&self) -> bool {
        self.transient
    }

    fn scope_relations(&self) -> ScopeRelations {
        self.relations
            .iter()
            .fold(ScopeRelations::new(), |relations, (scope, binding)| {
                relations.with(*scope, *binding)
            })
    }
}

pub fn catalog() -> Screen {
    Screen::new("catalog")
}

pub fn detail() -> Screen {
    Screen::new("detail")
}

pub fn loading() -> Screen {
    Screen::new("loading")
}

pub fn error() -> Screen {
    Screen::new("error")
}

/// A screen sharing the `counter/shared` model.
pub fn two() -> Screen {
    Screen::new("two").uses("counter", "shared")
}

/// A transient dialog layered over [`two`], sharing its model.
pub fn dialog() -> Screen {
    Screen::new("dialog")
        .transient()
        .over(two())
        .uses("counter", "shared")
}

/// Top first, like reading a back stack.
pub fn names_from_top(history: &crate::History<Screen>) -> Vec<&'static str> {
    history.frames_from_top().map(Screen::name).collect()
}

/// Encodes screens by name. Only screens built by the helpers above decode.
pub struct NameCodec;

impl KeyCodec<Screen> for NameCodec {
    fn encode(&self, key: &Screen) -> Result<Vec<u8>, CodecError> {
        Ok(key.name.as_bytes().to_vec())
    }

    fn decode(&self, bytes: &[u8]) -> Result<Screen, CodecError> {
        let name = std::str::from_utf8(bytes).map_err(|err| CodecError::new(err.to_string()))?;
        match name {
            "catalog" => Ok(catalog()),
            "detail" => Ok(detail()),
            "loading" => Ok(loading()),
            "error" => Ok(error()),
            "two" => Ok(two()),
            "dialog" => Ok(dialog()),
            _ => Err(CodecError::new(format!("unknown screen {name}"))),
        }
    }
}

#[derive(Debug, Default)]
pub struct Counter {
    pub value: Cell<i32>,
}

impl ScopedModel for Counter {
    fn persist(&self) -> Option<ModelPayload> {
        Some(self.value.get().to_le_bytes().to_vec())
    }
}

#[derive(Debug, Default)]
pub struct Scratch;

impl ScopedModel for Scratch {}

/// Creates [`Counter`]s and counts how many it made.
#[derive(Clone, Default)]
pub struct CounterFactory {
    pub created: Rc<Cell<usize>>,
}

impl ScopeFactory for CounterFactory {
    fn create(&self) -> Rc<dyn ScopedModel> {
        self.created.set(self.created.get() + 1);
        Rc::new(Counter::default())
    }

    fn restore(&self, payload: &[u8]) -> Result<Rc<dyn ScopedModel>, CodecError> {
        let bytes: [u8; 4] = payload
            .try_into()
            .map_err(|_| CodecError::new("counter payload must be 4 bytes"))?;
        let counter = Counter::default();
        counter.value.set(i32::from_le_bytes(bytes));
        Ok(Rc::new(counter))
    }
}

struct RecorderState {
    traversals: Vec<Traversal<Screen>>,
    pending: VecDeque<TraversalCompletion<Screen>>,
    auto_complete: bool,
}

/// Records every traversal. Completes them immediately or holds them until
/// [`complete_next`](Self::complete_next).
#[derive(Clone)]
pub struct Recorder {
    state: Rc<RefCell<RecorderState>>,
}

impl Recorder {
    pub fn completing() -> Self {
        Self::with_auto_complete(true)
    }

    pub fn holding() -> Self {
        Self::with_auto_complete(false)
    }

    fn with_auto_complete(auto_complete: bool) -> Self {
        Self {
            state: Rc::new(RefCell::new(RecorderState {
                traversals: Vec::new(),
                pending: VecDeque::new(),
                auto_complete,
            })),
        }
    }

    pub fn count(&self) -> usize {
        self.state.borrow().traversals.len()
    }

    pub fn last(&self) -> Option<Traversal<Screen>> {
        self.state.borrow().traversals.last().cloned()
    }

    pub fn pending(&self) -> usize {
        self.state.borrow().pending.len()
    }

    /// Completes the oldest held traversal; `false` when none is held.
    pub fn complete_next(&self) -> bool {
        let completion = self.state.borrow_mut().pending.pop_front();
        match completion {
            Some(completion) => {
                completion.complete();
                true
            }
            None => false,
        }
    }

    pub fn complete_all(&self) -> usize {
        let mut completed = 0;
        while self.complete_next() {
            completed += 1;
        }
        completed
    }
}

impl Dispatcher<Screen> for Recorder {
    fn dispatch(&self, traversal: Traversal<Screen>, completion: TraversalCompletion<Screen>) {
        let auto_complete = {
            let mut state = self.state.borrow_mut();
            state.traversals.push(traversal);
            state.auto_complete
        };
        if auto_complete {
            completion.complete();
        } else {
            self.state.borrow_mut().pending.push_back(completion);
        }
    }
}
