//! Screen keys and the capabilities the runtime reads from them.
//!
//! A [`Key`] is an immutable value naming one logical screen. Besides value
//! equality the runtime asks three things of a key:
//!
//! * its [`components`](Key::components), when the key is a composite that
//!   layers several logical frames (a dialog over the screen it decorates);
//! * whether it [`is_transient`](Key::is_transient) and must be left out of
//!   persisted history;
//! * the [`ScopeRelations`] naming the shared models it keeps alive.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies one logical screen in a [`History`](crate::History).
pub trait Key: Clone + PartialEq + fmt::Debug + 'static {
    /// Keys layered underneath this one, outermost (container) first.
    ///
    /// Empty for plain keys. The flattened form of a composite is the
    /// flattened form of each component, in order, followed by the composite
    /// itself: `Dialog(Screen2)` flattens to `[Screen2, Dialog(Screen2)]`.
    fn components(&self) -> Vec<Self> {
        Vec::new()
    }

    /// Transient keys are dropped when history is persisted.
    fn is_transient(&self) -> bool {
        false
    }

    /// Shared scopes this key participates in, and its binding in each.
    fn scope_relations(&self) -> ScopeRelations {
        ScopeRelations::default()
    }
}

impl Key for String {}

impl Key for &'static str {}

/// Appends the flattened frames of `key` to `out`.
pub(crate) fn flatten_into<K: Key>(key: &K, out: &mut Vec<K>) {
    for component in key.components() {
        flatten_into(&component, out);
    }
    out.push(key.clone());
}

/// Returns `true` if `key` nests composites deeper than `limit` levels.
///
/// Stops descending at the limit, so self-referential composites terminate.
pub(crate) fn exceeds_depth<K: Key>(key: &K, limit: usize) -> bool {
    let components = key.components();
    if components.is_empty() {
        return false;
    }
    limit == 0
        || components
            .iter()
            .any(|component| exceeds_depth(component, limit - 1))
}

macro_rules! tag_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Cow<'static, str>);

        impl $name {
            pub const fn from_static(name: &'static str) -> Self {
                Self(Cow::Borrowed(name))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&'static str> for $name {
            fn from(name: &'static str) -> Self {
                Self(Cow::Borrowed(name))
            }
        }

        impl From<String> for $name {
            fn from(name: String) -> Self {
                Self(Cow::Owned(name))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:?})", stringify!($name), self.as_str())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

tag_type!(
    /// Names a scope: a family of shared models created by one factory.
    ScopeTag
);

tag_type!(
    /// Names one model instance within a scope.
    BindingTag
);

/// Ordered `(scope, binding)` pairs declared by a key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ScopeRelations {
    relations: Vec<(ScopeTag, BindingTag)>,
}

impl ScopeRelations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(scope: impl Into<ScopeTag>, binding: impl Into<BindingTag>) -> Self {
        Self::new().with(scope, binding)
    }

    pub fn with(mut self, scope: impl Into<ScopeTag>, binding: impl Into<BindingTag>) -> Self {
        self.relations.push((scope.into(), binding.into()));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ScopeTag, &BindingTag)> {
        self.relations.iter().map(|(scope, binding)| (scope, binding))
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }
}

impl FromIterator<(ScopeTag, BindingTag)> for ScopeRelations {
    fn from_iter<I: IntoIterator<Item = (ScopeTag, BindingTag)>>(iter: I) -> Self {
        Self {
            relations: iter.into_iter().collect(),
        }
    }
}
