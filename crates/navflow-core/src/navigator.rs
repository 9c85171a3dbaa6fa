//! The traversal engine.
//!
//! A [`Navigator`] holds the committed [`History`] and moves it forward one
//! traversal at a time:
//!
//! * a request validates its target and parks it as the queued target,
//!   replacing any target queued before it;
//! * when nothing is in flight and a [`Dispatcher`] is attached, the queued
//!   target is dispatched together with a [`TraversalCompletion`];
//! * completing the traversal commits the target, releases the scopes of
//!   frames that left, notifies history listeners and moves on to whatever is
//!   queued next.
//!
//! Dispatchers may call back into the navigator, and may complete
//! synchronously, from inside [`Dispatcher::dispatch`]. All work runs through
//! one pump loop that never holds a borrow across a dispatcher or listener
//! call, so such re-entrant chains are processed iteratively.
//!
//! Everything here is single threaded (`Rc`/`RefCell`), mirroring the UI
//! thread affinity of the hosts driving it.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::config::NavigatorConfig;
use crate::error::{ConfigurationError, NavError, RestoreError};
use crate::filter::{FilterChain, HistoryCallback, HistoryFilter};
use crate::history::History;
use crate::key::{BindingTag, Key, ScopeTag};
use crate::persistence::{decode_history, encode_history, KeyCodec, PersistedState};
use crate::scope::{ScopeManager, ScopedModel};
use crate::traversal::{FrameDiff, Traversal};

/// Renders traversals on behalf of a [`Navigator`].
pub trait Dispatcher<K: Key> {
    /// Render `traversal`, then call [`TraversalCompletion::complete`].
    ///
    /// The navigator does not commit the destination, nor dispatch anything
    /// else, until the completion fires. Completing may happen before this
    /// method returns or at any later point on the same thread.
    fn dispatch(&self, traversal: Traversal<K>, completion: TraversalCompletion<K>);
}

impl<K, F> Dispatcher<K> for F
where
    K: Key,
    F: Fn(Traversal<K>, TraversalCompletion<K>),
{
    fn dispatch(&self, traversal: Traversal<K>, completion: TraversalCompletion<K>) {
        self(traversal, completion)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DispatcherId(u64);

type TraversalId = u64;
type HistoryListener<K> = Rc<dyn Fn(&History<K>)>;

struct InFlight<K: Key> {
    id: TraversalId,
    /// `None` for bootstrap traversals, which commit nothing.
    target: Option<History<K>>,
    entering: Vec<K>,
    leaving: Vec<K>,
}

struct NavigatorState<K: Key> {
    history: History<K>,
    dispatcher: Option<(DispatcherId, Rc<dyn Dispatcher<K>>)>,
    /// Dispatcher that last received a traversal, and so shows `history`.
    rendered_by: Option<DispatcherId>,
    in_flight: Option<InFlight<K>>,
    queued: Option<History<K>>,
    completed: VecDeque<TraversalId>,
    pumping: bool,
    disposed: bool,
    next_traversal_id: TraversalId,
    next_dispatcher_id: u64,
}

impl<K: Key> NavigatorState<K> {
    /// The history the next relative request builds on.
    fn latest(&self) -> History<K> {
        if let Some(queued) = &self.queued {
            return queued.clone();
        }
        match &self.in_flight {
            Some(InFlight {
                target: Some(target),
                ..
            }) => target.clone(),
            _ => self.history.clone(),
        }
    }

    /// Whether `target` is what the traversal in flight will leave on screen.
    /// A bootstrap shows the committed history.
    fn in_flight_shows(&self, target: &History<K>) -> bool {
        match &self.in_flight {
            Some(InFlight {
                target: Some(in_flight),
                ..
            }) => in_flight == target,
            Some(InFlight { target: None, .. }) => self.history == *target,
            None => false,
        }
    }

    fn allocate_traversal_id(&mut self) -> TraversalId {
        let id = self.next_traversal_id;
        self.next_traversal_id += 1;
        id
    }
}

struct ListenerEntry<K: Key> {
    id: u64,
    listener: HistoryListener<K>,
}

pub(crate) struct NavigatorInner<K: Key> {
    config: NavigatorConfig,
    state: RefCell<NavigatorState<K>>,
    scopes: RefCell<ScopeManager<K>>,
    filters: FilterChain<K>,
    callback: RefCell<Option<Rc<dyn HistoryCallback<K>>>>,
    listeners: RefCell<Vec<ListenerEntry<K>>>,
    next_listener_id: Cell<u64>,
    restore_error: Option<RestoreError>,
}

enum Step<K: Key> {
    Commit {
        history: History<K>,
        leaving: Vec<K>,
    },
    Dispatch {
        dispatcher: Rc<dyn Dispatcher<K>>,
        traversal: Traversal<K>,
        entering: Vec<K>,
        completion: TraversalCompletion<K>,
    },
    Wait,
}

pub struct Navigator<K: Key> {
    inner: Rc<NavigatorInner<K>>,
}

impl<K: Key> Clone for Navigator<K> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<K: Key> Navigator<K> {
    pub fn builder(default_history: History<K>) -> NavigatorBuilder<K> {
        NavigatorBuilder::new(default_history)
    }

    /// A navigator with default configuration and no scopes.
    pub fn new(history: History<K>) -> Result<Self, NavError> {
        Self::builder(history).build()
    }

    pub fn downgrade(&self) -> NavigatorHandle<K> {
        NavigatorHandle(Rc::downgrade(&self.inner))
    }

    pub fn config(&self) -> &NavigatorConfig {
        &self.inner.config
    }

    /// The committed history. Requested targets only show up here once their
    /// traversal completes.
    pub fn history(&self) -> History<K> {
        self.inner.state.borrow().history.clone()
    }

    pub fn is_dispatching(&self) -> bool {
        self.inner.state.borrow().in_flight.is_some()
    }

    pub fn has_queued(&self) -> bool {
        self.inner.state.borrow().queued.is_some()
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.state.borrow().disposed
    }

    /// Why the persisted state handed to the builder was not used, if it
    /// wasn't.
    pub fn restore_error(&self) -> Option<&RestoreError> {
        self.inner.restore_error.as_ref()
    }

    pub fn set_history_callback(&self, callback: impl HistoryCallback<K> + 'static) {
        *self.inner.callback.borrow_mut() = Some(Rc::new(callback));
    }

    /// Attaches `dispatcher`, replacing the current one.
    ///
    /// With nothing in flight it receives the queued target right away, or a
    /// bootstrap traversal of the current history when nothing is queued. A
    /// traversal already in flight is not disturbed; the new dispatcher is
    /// brought up to date once it completes.
    ///
    /// A disposed navigator drops `dispatcher` and never calls it.
    pub fn set_dispatcher(&self, dispatcher: impl Dispatcher<K> + 'static) -> DispatcherId {
        let id = {
            let mut state = self.inner.state.borrow_mut();
            let id = DispatcherId(state.next_dispatcher_id);
            state.next_dispatcher_id += 1;
            if state.disposed {
                log::debug!("ignoring dispatcher {id:?}, navigator disposed");
                return id;
            }
            state.dispatcher = Some((id, Rc::new(dispatcher)));
            id
        };
        log::debug!("dispatcher {id:?} attached");
        self.pump();
        id
    }

    /// The attached dispatcher. Inside [`Dispatcher::dispatch`] this is the
    /// dispatcher being called.
    pub fn dispatcher_id(&self) -> Option<DispatcherId> {
        self.inner.state.borrow().dispatcher.as_ref().map(|(id, _)| *id)
    }

    /// Detaches the dispatcher `id`. A no-op if another one has replaced it.
    ///
    /// Nothing is dispatched until a dispatcher is attached again; requests
    /// keep queuing meanwhile.
    pub fn remove_dispatcher(&self, id: DispatcherId) {
        let mut state = self.inner.state.borrow_mut();
        if matches!(state.dispatcher, Some((current, _)) if current == id) {
            state.dispatcher = None;
            log::debug!("dispatcher {id:?} removed");
        }
    }

    /// Requests `history` as the new state.
    pub fn set_history(&self, history: History<K>) -> Result<(), NavError> {
        self.ensure_live()?;
        self.validate(&history)?;
        self.enqueue(history);
        Ok(())
    }

    pub fn push(&self, key: K) -> Result<(), NavError> {
        let target = self.latest()?.build_upon().push(key).build();
        self.set_history(target)
    }

    /// Pops up to `count` frames, never going below the configured minimum
    /// history size.
    ///
    /// When not a single frame can be popped the flow is over: the history
    /// callback's `on_history_cleared` runs and nothing is dispatched.
    pub fn pop(&self, count: usize) -> Result<(), NavError> {
        if count == 0 {
            return Ok(());
        }
        let latest = self.latest()?;
        let removable = latest.len().saturating_sub(self.inner.config.min_history_size);
        if removable == 0 {
            log::debug!("pop({count}) at {} frames clears the history", latest.len());
            self.notify_cleared();
            return Ok(());
        }
        if count > removable {
            log::debug!("pop({count}) clamped to {removable} frames");
        }
        let target = latest.build_upon().pop(count.min(removable)).build();
        self.set_history(target)
    }

    pub fn go_back(&self) -> Result<(), NavError> {
        self.pop(1)
    }

    pub fn replace_top(&self, key: K) -> Result<(), NavError> {
        let target = self.latest()?.build_upon().pop(1).push(key).build();
        self.set_history(target)
    }

    /// Replaces the whole history with `key`.
    pub fn replace_history(&self, key: K) -> Result<(), NavError> {
        self.set_history(History::single(key))
    }

    /// Makes `key` the top frame.
    ///
    /// Already on top: the history is dispatched again unchanged. Further
    /// down: frames above it are popped. Absent: it is pushed.
    pub fn set(&self, key: K) -> Result<(), NavError> {
        let latest = self.latest()?;
        let target = if latest.top() == Some(&key) {
            latest
        } else if latest.contains(&key) {
            latest.build_upon().pop_to(&key)?.build()
        } else {
            latest.build_upon().push(key).build()
        };
        self.set_history(target)
    }

    /// Calls `listener` with every newly committed history.
    pub fn on_history_changed(
        &self,
        listener: impl Fn(&History<K>) + 'static,
    ) -> HistoryListenerRegistration<K> {
        let id = self.inner.next_listener_id.get();
        self.inner.next_listener_id.set(id + 1);
        self.inner.listeners.borrow_mut().push(ListenerEntry {
            id,
            listener: Rc::new(listener),
        });
        HistoryListenerRegistration {
            navigator: Rc::downgrade(&self.inner),
            id: Some(id),
        }
    }

    pub fn model(
        &self,
        scope: &ScopeTag,
        binding: &BindingTag,
    ) -> Result<Rc<dyn ScopedModel>, NavError> {
        self.inner.scopes.borrow().model(scope, binding)
    }

    pub fn get_model<T: Any>(
        &self,
        scope: &ScopeTag,
        binding: &BindingTag,
    ) -> Result<Rc<T>, NavError> {
        self.inner.scopes.borrow().get_model(scope, binding)
    }

    /// Runs `f` against the scope manager. `f` must not call back into the
    /// navigator.
    pub fn with_scopes<R>(&self, f: impl FnOnce(&ScopeManager<K>) -> R) -> R {
        f(&self.inner.scopes.borrow())
    }

    /// Snapshot of the committed history, filtered for persistence, and of
    /// every persistable model.
    pub fn save_state(&self, codec: &dyn KeyCodec<K>) -> Result<PersistedState, NavError> {
        let history = self.history();
        let mut filtered = self.inner.filters.on_save_history(&history);
        let callback = self.inner.callback.borrow().clone();
        if let Some(callback) = callback {
            filtered = callback.on_save_history(filtered);
        }
        let frames = encode_history(&filtered, codec)?;
        let models = self.inner.scopes.borrow().save_models();
        log::debug!(
            "saved {} of {} frames and {} models",
            frames.len(),
            history.len(),
            models.len()
        );
        Ok(PersistedState {
            history: frames,
            models,
        })
    }

    /// Ends the flow: detaches the dispatcher, drops queued work and releases
    /// the scopes of every committed frame, and of the frames a traversal
    /// still in flight had set up.
    ///
    /// Afterwards requests fail with [`NavError::Disposed`] and the history
    /// stays as it was. Disposing twice is a no-op.
    pub fn dispose(&self) {
        let (frames, in_flight) = {
            let mut state = self.inner.state.borrow_mut();
            if state.disposed {
                return;
            }
            state.disposed = true;
            state.dispatcher = None;
            state.queued = None;
            let in_flight = state.in_flight.take().map(|in_flight| in_flight.entering);
            (state.history.flattened(), in_flight.unwrap_or_default())
        };
        let mut scopes = self.inner.scopes.borrow_mut();
        scopes.tear_down_frames(&in_flight);
        scopes.tear_down_frames(&frames);
        log::debug!("navigator disposed");
    }

    fn ensure_live(&self) -> Result<(), NavError> {
        if self.is_disposed() {
            return Err(NavError::Disposed);
        }
        Ok(())
    }

    fn latest(&self) -> Result<History<K>, NavError> {
        self.ensure_live()?;
        Ok(self.inner.state.borrow().latest())
    }

    fn validate(&self, history: &History<K>) -> Result<(), ConfigurationError> {
        validate_history(&self.inner.config, &self.inner.scopes.borrow(), history)
    }

    fn notify_cleared(&self) {
        let callback = self.inner.callback.borrow().clone();
        match callback {
            Some(callback) => callback.on_history_cleared(),
            None => log::debug!("history cleared with no callback set"),
        }
    }

    fn enqueue(&self, target: History<K>) {
        {
            let mut state = self.inner.state.borrow_mut();
            if state.in_flight_shows(&target) {
                log::trace!("request matches the traversal in flight: {target:?}");
                state.queued = None;
                return;
            }
            if let Some(superseded) = state.queued.replace(target) {
                log::trace!("superseded queued request {superseded:?}");
            }
        }
        self.pump();
    }

    fn on_traversal_completed(&self, id: TraversalId) {
        self.inner.state.borrow_mut().completed.push_back(id);
        self.pump();
    }

    fn pump(&self) {
        {
            let mut state = self.inner.state.borrow_mut();
            if state.pumping {
                return;
            }
            state.pumping = true;
        }
        let _guard = PumpGuard(&*self.inner);
        loop {
            match self.next_step() {
                Step::Commit { history, leaving } => self.commit(&history, &leaving),
                Step::Dispatch {
                    dispatcher,
                    traversal,
                    entering,
                    completion,
                } => {
                    if let Err(err) = self.inner.scopes.borrow_mut().set_up_frames(&entering) {
                        log::error!("scope setup failed for {traversal:?}: {err}");
                    }
                    dispatcher.dispatch(traversal, completion);
                }
                Step::Wait => break,
            }
        }
    }

    fn next_step(&self) -> Step<K> {
        let mut state = self.inner.state.borrow_mut();
        while let Some(id) = state.completed.pop_front() {
            let in_flight = match state.in_flight.take() {
                Some(in_flight) if in_flight.id == id => in_flight,
                other if state.disposed => {
                    log::debug!("traversal #{id} completed after dispose");
                    state.in_flight = other;
                    continue;
                }
                other => {
                    log::warn!("ignoring completion of traversal #{id}, not in flight");
                    state.in_flight = other;
                    continue;
                }
            };
            match in_flight.target {
                Some(target) => {
                    log::debug!("traversal #{id} completed, committing {target:?}");
                    state.history = target.clone();
                    return Step::Commit {
                        history: target,
                        leaving: in_flight.leaving,
                    };
                }
                None => log::debug!("bootstrap traversal #{id} completed"),
            }
        }

        if state.in_flight.is_some() {
            return Step::Wait;
        }
        let Some((dispatcher_id, dispatcher)) = state.dispatcher.clone() else {
            return Step::Wait;
        };
        if state.queued.is_none() && state.rendered_by == Some(dispatcher_id) {
            return Step::Wait;
        }
        let id = state.allocate_traversal_id();
        let completion = TraversalCompletion::new(Rc::downgrade(&self.inner), id);
        state.rendered_by = Some(dispatcher_id);

        let Some(target) = state.queued.take() else {
            log::debug!("bootstrapping {dispatcher_id:?} with traversal #{id}");
            state.in_flight = Some(InFlight {
                id,
                target: None,
                entering: Vec::new(),
                leaving: Vec::new(),
            });
            return Step::Dispatch {
                dispatcher,
                traversal: Traversal::bootstrap(state.history.clone()),
                entering: Vec::new(),
                completion,
            };
        };

        let diff = FrameDiff::between(&state.history, &target);
        let traversal = Traversal::new(state.history.clone(), target.clone());
        log::debug!(
            "dispatching traversal #{id} {:?} to {dispatcher_id:?}: {:?} -> {:?}",
            traversal.direction(),
            state.history,
            target
        );
        state.in_flight = Some(InFlight {
            id,
            target: Some(target),
            entering: diff.entering.clone(),
            leaving: diff.leaving,
        });
        Step::Dispatch {
            dispatcher,
            traversal,
            entering: diff.entering,
            completion,
        }
    }

    fn commit(&self, history: &History<K>, leaving: &[K]) {
        self.inner.scopes.borrow_mut().tear_down_frames(leaving);
        let listeners: Vec<HistoryListener<K>> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .map(|entry| Rc::clone(&entry.listener))
            .collect();
        for listener in listeners {
            listener(history);
        }
    }

    fn remove_listener(&self, id: u64) {
        self.inner
            .listeners
            .borrow_mut()
            .retain(|entry| entry.id != id);
    }
}

impl<K: Key> fmt::Debug for Navigator<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("Navigator")
            .field("history", &state.history)
            .field("dispatching", &state.in_flight.is_some())
            .field("queued", &state.queued)
            .finish()
    }
}

struct PumpGuard<'a, K: Key>(&'a NavigatorInner<K>);

impl<K: Key> Drop for PumpGuard<'_, K> {
    fn drop(&mut self) {
        if let Ok(mut state) = self.0.state.try_borrow_mut() {
            state.pumping = false;
        }
    }
}

fn validate_history<K: Key>(
    config: &NavigatorConfig,
    scopes: &ScopeManager<K>,
    history: &History<K>,
) -> Result<(), ConfigurationError> {
    if history.is_empty() {
        return Err(ConfigurationError::EmptyHistory);
    }
    history.check_depth(config.max_composite_depth)?;
    for frame in history.flattened() {
        scopes.validate(&frame)?;
    }
    Ok(())
}

/// Weak reference to a [`Navigator`], for dispatchers and listeners that
/// must not keep it alive.
pub struct NavigatorHandle<K: Key>(Weak<NavigatorInner<K>>);

impl<K: Key> NavigatorHandle<K> {
    pub fn upgrade(&self) -> Option<Navigator<K>> {
        self.0.upgrade().map(|inner| Navigator { inner })
    }
}

impl<K: Key> Clone for NavigatorHandle<K> {
    fn clone(&self) -> Self {
        Self(Weak::clone(&self.0))
    }
}

/// Signals that a dispatched traversal finished rendering.
///
/// Consumed by [`complete`](Self::complete), so a traversal completes at most
/// once. Dropping it without completing leaves the navigator dispatching for
/// good.
pub struct TraversalCompletion<K: Key> {
    navigator: Weak<NavigatorInner<K>>,
    id: TraversalId,
    done: bool,
}

impl<K: Key> TraversalCompletion<K> {
    fn new(navigator: Weak<NavigatorInner<K>>, id: TraversalId) -> Self {
        Self {
            navigator,
            id,
            done: false,
        }
    }

    pub fn complete(mut self) {
        self.done = true;
        if let Some(inner) = self.navigator.upgrade() {
            Navigator { inner }.on_traversal_completed(self.id);
        }
    }
}

impl<K: Key> Drop for TraversalCompletion<K> {
    fn drop(&mut self) {
        if !self.done && self.navigator.strong_count() > 0 {
            log::warn!(
                "traversal #{} dropped without completing; navigator stays dispatching",
                self.id
            );
        }
    }
}

impl<K: Key> fmt::Debug for TraversalCompletion<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraversalCompletion")
            .field("id", &self.id)
            .finish()
    }
}

/// Keeps a history listener registered until cancelled or dropped.
pub struct HistoryListenerRegistration<K: Key> {
    navigator: Weak<NavigatorInner<K>>,
    id: Option<u64>,
}

impl<K: Key> HistoryListenerRegistration<K> {
    pub fn cancel(mut self) {
        self.unregister();
    }

    fn unregister(&mut self) {
        if let Some(id) = self.id.take() {
            if let Some(inner) = self.navigator.upgrade() {
                Navigator { inner }.remove_listener(id);
            }
        }
    }
}

impl<K: Key> Drop for HistoryListenerRegistration<K> {
    fn drop(&mut self) {
        self.unregister();
    }
}

pub struct NavigatorBuilder<K: Key> {
    default_history: History<K>,
    config: NavigatorConfig,
    scopes: ScopeManager<K>,
    filters: FilterChain<K>,
    callback: Option<Rc<dyn HistoryCallback<K>>>,
    restore: Option<(PersistedState, Result<History<K>, RestoreError>)>,
}

impl<K: Key> NavigatorBuilder<K> {
    fn new(default_history: History<K>) -> Self {
        Self {
            default_history,
            config: NavigatorConfig::default(),
            scopes: ScopeManager::empty(),
            filters: FilterChain::standard(),
            callback: None,
            restore: None,
        }
    }

    pub fn config(mut self, config: NavigatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn scopes(mut self, scopes: ScopeManager<K>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Replaces the standard filter chain.
    pub fn filters(mut self, filters: FilterChain<K>) -> Self {
        self.filters = filters;
        self
    }

    pub fn history_callback(mut self, callback: impl HistoryCallback<K> + 'static) -> Self {
        self.callback = Some(Rc::new(callback));
        self
    }

    /// Starts from `state` instead of the default history. Keys are decoded
    /// right away; a state that cannot be used falls back to the default
    /// history when the navigator is built.
    pub fn restore(mut self, state: &PersistedState, codec: &dyn KeyCodec<K>) -> Self {
        let history = decode_history(&state.history, codec);
        self.restore = Some((state.clone(), history));
        self
    }

    pub fn build(self) -> Result<Navigator<K>, NavError> {
        let NavigatorBuilder {
            default_history,
            config,
            mut scopes,
            filters,
            callback,
            restore,
        } = self;
        config.validate()?;
        validate_history(&config, &scopes, &default_history)?;

        let mut restore_error = None;
        let mut history = default_history.clone();
        if let Some((state, decoded)) = restore {
            let restored = decoded.and_then(|restored| {
                let restored = match &callback {
                    Some(callback) => callback.on_restore_history(restored),
                    None => restored,
                };
                let restored = filters.on_restore_history(restored);
                validate_history(&config, &scopes, &restored)
                    .map_err(RestoreError::InvalidHistory)?;
                scopes.restore_models(&state.models)?;
                Ok(restored)
            });
            match restored {
                Ok(restored) => history = restored,
                Err(err) => {
                    log::warn!("falling back to default history {default_history:?}: {err}");
                    restore_error = Some(err);
                }
            }
        }

        scopes.set_up_frames(&history.flattened())?;
        scopes.release_unclaimed();
        log::debug!("navigator starting at {history:?}");

        Ok(Navigator {
            inner: Rc::new(NavigatorInner {
                config,
                state: RefCell::new(NavigatorState {
                    history,
                    dispatcher: None,
                    rendered_by: None,
                    in_flight: None,
                    queued: None,
                    completed: VecDeque::new(),
                    pumping: false,
                    disposed: false,
                    next_traversal_id: 1,
                    next_dispatcher_id: 1,
                }),
                scopes: RefCell::new(scopes),
                filters,
                callback: RefCell::new(callback),
                listeners: RefCell::new(Vec::new()),
                next_listener_id: Cell::new(1),
                restore_error,
            }),
        })
    }
}

#[cfg(test)]
#[path = "tests/navigator_tests.rs"]
mod tests;
