//! Immutable navigation history and its builder.
//!
//! A [`History`] is an ordered stack of keys, root first. It never changes
//! once built: every push, pop or replace goes through a [`HistoryBuilder`]
//! and produces a new instance, so an outgoing history stays valid while a
//! traversal diffs it against the incoming one. Frames live in shared
//! storage, which makes cloning a history cheap.

use std::fmt;
use std::rc::Rc;

use crate::error::ConfigurationError;
use crate::key::{exceeds_depth, flatten_into, Key};

pub struct History<K: Key> {
    frames: Rc<[K]>,
}

impl<K: Key> History<K> {
    /// The empty sentinel. The navigator never accepts it as a target.
    pub fn empty() -> Self {
        Self {
            frames: Rc::from(Vec::new()),
        }
    }

    pub fn single(key: K) -> Self {
        Self::of([key])
    }

    pub fn of(keys: impl IntoIterator<Item = K>) -> Self {
        keys.into_iter().collect()
    }

    pub fn builder() -> HistoryBuilder<K> {
        HistoryBuilder::new()
    }

    /// A builder holding a copy of this history's frames.
    pub fn build_upon(&self) -> HistoryBuilder<K> {
        HistoryBuilder::from(self)
    }

    pub fn top(&self) -> Option<&K> {
        self.frames.last()
    }

    /// Returns the frame `index` positions below the top; 0 is the top.
    pub fn peek(&self, index: usize) -> Option<&K> {
        let position = self.frames.len().checked_sub(index)?.checked_sub(1)?;
        self.frames.get(position)
    }

    pub fn frames_from_bottom(&self) -> std::slice::Iter<'_, K> {
        self.frames.iter()
    }

    pub fn frames_from_top(&self) -> std::iter::Rev<std::slice::Iter<'_, K>> {
        self.frames.iter().rev()
    }

    pub fn as_slice(&self) -> &[K] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.frames.iter().any(|frame| frame == key)
    }

    /// The effective frame sequence used for diffing and equality: every
    /// composite replaced by its components followed by itself.
    pub fn flattened(&self) -> Vec<K> {
        let mut out = Vec::with_capacity(self.frames.len());
        for frame in self.frames.iter() {
            flatten_into(frame, &mut out);
        }
        out
    }

    pub(crate) fn check_depth(&self, limit: usize) -> Result<(), ConfigurationError> {
        if self.frames.iter().any(|frame| exceeds_depth(frame, limit)) {
            return Err(ConfigurationError::CompositeTooDeep { limit });
        }
        Ok(())
    }
}

impl<K: Key> Clone for History<K> {
    fn clone(&self) -> Self {
        Self {
            frames: Rc::clone(&self.frames),
        }
    }
}

impl<K: Key> PartialEq for History<K> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.frames, &other.frames) || self.flattened() == other.flattened()
    }
}

impl<K: Key> fmt::Debug for History<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.frames.iter()).finish()
    }
}

impl<K: Key> Default for History<K> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<K: Key> FromIterator<K> for History<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let frames: Vec<K> = iter.into_iter().collect();
        Self {
            frames: Rc::from(frames),
        }
    }
}

impl<'a, K: Key> IntoIterator for &'a History<K> {
    type Item = &'a K;
    type IntoIter = std::slice::Iter<'a, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}

/// Mutable staging area for a new [`History`]. Consumed by [`build`](Self::build).
#[derive(Clone)]
pub struct HistoryBuilder<K: Key> {
    frames: Vec<K>,
}

impl<K: Key> HistoryBuilder<K> {
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    pub fn push(mut self, key: K) -> Self {
        self.frames.push(key);
        self
    }

    /// Pushes every key in order; the last one becomes the top.
    pub fn push_all(mut self, keys: impl IntoIterator<Item = K>) -> Self {
        self.frames.extend(keys);
        self
    }

    /// Removes up to `count` frames from the top.
    ///
    /// Asking for more frames than the builder holds clamps: the builder ends
    /// up empty and the shortfall is logged.
    pub fn pop(mut self, count: usize) -> Self {
        let available = self.frames.len();
        if count > available {
            log::debug!("pop({count}) clamped to the {available} frames available");
        }
        self.frames.truncate(available.saturating_sub(count));
        self
    }

    pub fn pop_one(&mut self) -> Option<K> {
        self.frames.pop()
    }

    /// Pops until `key` is the top frame.
    pub fn pop_to(mut self, key: &K) -> Result<Self, ConfigurationError> {
        match self.frames.iter().rposition(|frame| frame == key) {
            Some(position) => {
                self.frames.truncate(position + 1);
                Ok(self)
            }
            None => Err(ConfigurationError::KeyNotInHistory {
                key: format!("{key:?}"),
            }),
        }
    }

    pub fn clear(mut self) -> Self {
        self.frames.clear();
        self
    }

    pub fn peek(&self) -> Option<&K> {
        self.frames.last()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn build(self) -> History<K> {
        History {
            frames: Rc::from(self.frames),
        }
    }
}

impl<K: Key> Default for HistoryBuilder<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Key> From<&History<K>> for HistoryBuilder<K> {
    fn from(history: &History<K>) -> Self {
        Self {
            frames: history.frames.to_vec(),
        }
    }
}

impl<K: Key> fmt::Debug for HistoryBuilder<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.frames.iter()).finish()
    }
}

#[cfg(test)]
#[path = "tests/history_tests.rs"]
mod tests;
