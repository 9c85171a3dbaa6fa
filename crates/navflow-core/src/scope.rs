//! Reference-counted shared models.
//!
//! The [`ScopeManager`] owns one table entry per `(ScopeTag, BindingTag)`
//! pair. An entry is created lazily by its scope's [`ScopeFactory`] when the
//! first key naming it is set up, and destroyed when the last such key is torn
//! down. Keys declare their scopes through
//! [`Key::scope_relations`](crate::Key::scope_relations); nothing is inferred
//! from types at runtime.
//!
//! Entries are kept in creation order so saved snapshots, and the order
//! models are recreated in, are deterministic across restarts.

use std::any::{type_name, Any};
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use ahash::RandomState;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{CodecError, ConfigurationError, NavError, RestoreError};
use crate::key::{BindingTag, Key, ScopeTag};

/// Opaque serialized form of a persistable model.
pub type ModelPayload = Vec<u8>;

/// Converts a shared model into `Rc<dyn Any>` for typed lookups.
pub trait AsAnyRc {
    fn into_any_rc(self: Rc<Self>) -> Rc<dyn Any>;
}

impl<T: Any> AsAnyRc for T {
    fn into_any_rc(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

/// A model shared by every key bound to the same scope entry.
///
/// Models are handed out as `Rc`, so mutable state lives behind interior
/// mutability.
pub trait ScopedModel: AsAnyRc {
    /// Serialized state to carry across a restart, or `None` when the model
    /// only lives in memory.
    fn persist(&self) -> Option<ModelPayload> {
        None
    }
}

/// Creates the models of one scope.
pub trait ScopeFactory {
    fn create(&self) -> Rc<dyn ScopedModel>;

    /// Rebuilds a model from a payload produced by [`ScopedModel::persist`].
    fn restore(&self, payload: &[u8]) -> Result<Rc<dyn ScopedModel>, CodecError> {
        let _ = payload;
        Err(CodecError::new("scope does not restore persisted models"))
    }
}

/// [`ScopeFactory`] backed by a closure. Its models are never restored.
pub struct FnScopeFactory<F> {
    create: F,
}

impl<F, M> FnScopeFactory<F>
where
    F: Fn() -> M,
    M: ScopedModel + 'static,
{
    pub fn new(create: F) -> Self {
        Self { create }
    }
}

impl<F, M> ScopeFactory for FnScopeFactory<F>
where
    F: Fn() -> M,
    M: ScopedModel + 'static,
{
    fn create(&self) -> Rc<dyn ScopedModel> {
        Rc::new((self.create)())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct EntryKey {
    scope: ScopeTag,
    binding: BindingTag,
}

struct ScopeEntry<K> {
    model: Rc<dyn ScopedModel>,
    users: Vec<K>,
}

/// One persisted model.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedModel {
    pub scope: ScopeTag,
    pub binding: BindingTag,
    pub payload: ModelPayload,
}

/// Persistable models in entry creation order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeSnapshot {
    models: Vec<SavedModel>,
}

impl ScopeSnapshot {
    pub fn iter(&self) -> std::slice::Iter<'_, SavedModel> {
        self.models.iter()
    }

    pub fn tags(&self) -> impl Iterator<Item = (&ScopeTag, &BindingTag)> {
        self.models.iter().map(|saved| (&saved.scope, &saved.binding))
    }

    pub fn payload(&self, scope: &ScopeTag, binding: &BindingTag) -> Option<&[u8]> {
        self.models
            .iter()
            .find(|saved| &saved.scope == scope && &saved.binding == binding)
            .map(|saved| saved.payload.as_slice())
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

pub struct ScopeManagerBuilder<K> {
    factories: IndexMap<ScopeTag, Box<dyn ScopeFactory>, RandomState>,
    duplicate: Option<ScopeTag>,
    _key: PhantomData<fn() -> K>,
}

impl<K: Key> ScopeManagerBuilder<K> {
    pub fn scope(
        mut self,
        tag: impl Into<ScopeTag>,
        factory: impl ScopeFactory + 'static,
    ) -> Self {
        let tag = tag.into();
        if self.factories.contains_key(&tag) {
            self.duplicate.get_or_insert(tag);
            return self;
        }
        self.factories.insert(tag, Box::new(factory));
        self
    }

    pub fn scope_fn<F, M>(self, tag: impl Into<ScopeTag>, create: F) -> Self
    where
        F: Fn() -> M + 'static,
        M: ScopedModel + 'static,
    {
        self.scope(tag, FnScopeFactory::new(create))
    }

    pub fn build(self) -> Result<ScopeManager<K>, ConfigurationError> {
        if let Some(tag) = self.duplicate {
            return Err(ConfigurationError::DuplicateScope(tag));
        }
        Ok(ScopeManager {
            factories: self.factories,
            entries: IndexMap::default(),
        })
    }
}

pub struct ScopeManager<K: Key> {
    factories: IndexMap<ScopeTag, Box<dyn ScopeFactory>, RandomState>,
    entries: IndexMap<EntryKey, ScopeEntry<K>, RandomState>,
}

impl<K: Key> ScopeManager<K> {
    pub fn builder() -> ScopeManagerBuilder<K> {
        ScopeManagerBuilder {
            factories: IndexMap::default(),
            duplicate: None,
            _key: PhantomData,
        }
    }

    /// A manager with no scopes; keys declaring relations are rejected.
    pub fn empty() -> Self {
        Self {
            factories: IndexMap::default(),
            entries: IndexMap::default(),
        }
    }

    pub fn is_registered(&self, scope: &ScopeTag) -> bool {
        self.factories.contains_key(scope)
    }

    /// Checks that every scope `key` names has a factory.
    pub fn validate(&self, key: &K) -> Result<(), ConfigurationError> {
        for (scope, _) in key.scope_relations().iter() {
            if !self.is_registered(scope) {
                return Err(ConfigurationError::UnregisteredScope(scope.clone()));
            }
        }
        Ok(())
    }

    /// Registers `key` as a user of each scope entry it names, creating
    /// missing entries. Nothing changes if any scope is unregistered.
    pub fn set_up(&mut self, key: &K) -> Result<(), ConfigurationError> {
        self.validate(key)?;
        for (scope, binding) in key.scope_relations().iter() {
            let entry_key = EntryKey {
                scope: scope.clone(),
                binding: binding.clone(),
            };
            let factory = self
                .factories
                .get(scope)
                .ok_or_else(|| ConfigurationError::UnregisteredScope(scope.clone()))?;
            let entry = self.entries.entry(entry_key).or_insert_with(|| {
                log::debug!("creating model {scope}/{binding}");
                ScopeEntry {
                    model: factory.create(),
                    users: Vec::new(),
                }
            });
            entry.users.push(key.clone());
        }
        Ok(())
    }

    /// Removes `key` from each scope entry it names, destroying entries left
    /// without users. Keys that are not registered are ignored.
    pub fn tear_down(&mut self, key: &K) {
        for (scope, binding) in key.scope_relations().iter() {
            let entry_key = EntryKey {
                scope: scope.clone(),
                binding: binding.clone(),
            };
            let Some(entry) = self.entries.get_mut(&entry_key) else {
                log::trace!("tear down of {key:?}: no model {scope}/{binding}");
                continue;
            };
            match entry.users.iter().position(|user| user == key) {
                Some(index) => {
                    entry.users.remove(index);
                }
                None => log::trace!("tear down of {key:?}: not a user of {scope}/{binding}"),
            }
            if entry.users.is_empty() {
                log::debug!("releasing model {scope}/{binding}");
                self.entries.shift_remove(&entry_key);
            }
        }
    }

    /// Sets up `frames` bottom to top. Validates every frame first.
    pub fn set_up_frames(&mut self, frames: &[K]) -> Result<(), ConfigurationError> {
        for frame in frames {
            self.validate(frame)?;
        }
        for frame in frames {
            self.set_up(frame)?;
        }
        Ok(())
    }

    /// Tears down `frames` top to bottom, mirroring [`set_up_frames`](Self::set_up_frames).
    pub fn tear_down_frames(&mut self, frames: &[K]) {
        for frame in frames.iter().rev() {
            self.tear_down(frame);
        }
    }

    pub fn model(
        &self,
        scope: &ScopeTag,
        binding: &BindingTag,
    ) -> Result<Rc<dyn ScopedModel>, NavError> {
        if !self.is_registered(scope) {
            return Err(ConfigurationError::UnregisteredScope(scope.clone()).into());
        }
        let entry_key = EntryKey {
            scope: scope.clone(),
            binding: binding.clone(),
        };
        self.entries
            .get(&entry_key)
            .map(|entry| Rc::clone(&entry.model))
            .ok_or_else(|| NavError::NotFound {
                scope: scope.clone(),
                binding: binding.clone(),
            })
    }

    pub fn get_model<T: Any>(
        &self,
        scope: &ScopeTag,
        binding: &BindingTag,
    ) -> Result<Rc<T>, NavError> {
        let model = self.model(scope, binding)?;
        model.into_any_rc().downcast::<T>().map_err(|_| {
            ConfigurationError::ModelTypeMismatch {
                scope: scope.clone(),
                binding: binding.clone(),
                expected: type_name::<T>(),
            }
            .into()
        })
    }

    pub fn contains(&self, scope: &ScopeTag, binding: &BindingTag) -> bool {
        self.entries.contains_key(&EntryKey {
            scope: scope.clone(),
            binding: binding.clone(),
        })
    }

    /// Number of registered users of an entry; 0 when it does not exist.
    pub fn users(&self, scope: &ScopeTag, binding: &BindingTag) -> usize {
        self.entries
            .get(&EntryKey {
                scope: scope.clone(),
                binding: binding.clone(),
            })
            .map_or(0, |entry| entry.users.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn save_models(&self) -> ScopeSnapshot {
        let models = self
            .entries
            .iter()
            .filter_map(|(entry_key, entry)| {
                entry.model.persist().map(|payload| SavedModel {
                    scope: entry_key.scope.clone(),
                    binding: entry_key.binding.clone(),
                    payload,
                })
            })
            .collect();
        ScopeSnapshot { models }
    }

    /// Recreates every saved entry with no users; they are claimed again by
    /// [`set_up`](Self::set_up) as screens come back. Live entries win over
    /// saved ones. Either every saved model is restored or none is.
    pub fn restore_models(&mut self, snapshot: &ScopeSnapshot) -> Result<(), RestoreError> {
        let mut restored = Vec::with_capacity(snapshot.len());
        for saved in snapshot.iter() {
            let entry_key = EntryKey {
                scope: saved.scope.clone(),
                binding: saved.binding.clone(),
            };
            if self.entries.contains_key(&entry_key) {
                log::trace!("keeping live model {}/{}", saved.scope, saved.binding);
                continue;
            }
            let factory = self
                .factories
                .get(&saved.scope)
                .ok_or_else(|| RestoreError::UnregisteredScope(saved.scope.clone()))?;
            let model = factory
                .restore(&saved.payload)
                .map_err(|source| RestoreError::Model {
                    scope: saved.scope.clone(),
                    binding: saved.binding.clone(),
                    source,
                })?;
            restored.push((entry_key, model));
        }
        for (entry_key, model) in restored {
            log::debug!("restored model {}/{}", entry_key.scope, entry_key.binding);
            self.entries.insert(
                entry_key,
                ScopeEntry {
                    model,
                    users: Vec::new(),
                },
            );
        }
        Ok(())
    }

    /// Drops restored entries that no key claimed.
    pub fn release_unclaimed(&mut self) {
        self.entries.retain(|entry_key, entry| {
            let claimed = !entry.users.is_empty();
            if !claimed {
                log::debug!(
                    "releasing unclaimed model {}/{}",
                    entry_key.scope,
                    entry_key.binding
                );
            }
            claimed
        });
    }

    /// Drops every entry, whatever its users.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<K: Key> fmt::Debug for ScopeManager<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeManager")
            .field("scopes", &self.factories.keys().collect::<Vec<_>>())
            .field(
                "entries",
                &self
                    .entries
                    .iter()
                    .map(|(entry_key, entry)| {
                        (&entry_key.scope, &entry_key.binding, entry.users.len())
                    })
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/scope_tests.rs"]
mod tests;
