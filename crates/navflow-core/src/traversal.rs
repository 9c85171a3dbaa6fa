//! Direction and frame diff between two histories.
//!
//! Both are computed on flattened frames and are pure: the only asynchronous
//! part of a traversal is the dispatcher rendering it.

use crate::history::History;
use crate::key::Key;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Backward,
    Replace,
}

impl Direction {
    /// `Forward` when `origin` is a strict prefix of `destination`,
    /// `Backward` when `destination` is a strict prefix of `origin`,
    /// `Replace` otherwise (equal histories included).
    pub fn between<K: Key>(origin: &History<K>, destination: &History<K>) -> Self {
        Self::between_frames(&origin.flattened(), &destination.flattened())
    }

    pub(crate) fn between_frames<K: PartialEq>(origin: &[K], destination: &[K]) -> Self {
        if is_strict_prefix(origin, destination) {
            Direction::Forward
        } else if is_strict_prefix(destination, origin) {
            Direction::Backward
        } else {
            Direction::Replace
        }
    }
}

fn is_strict_prefix<K: PartialEq>(prefix: &[K], frames: &[K]) -> bool {
    prefix.len() < frames.len() && frames[..prefix.len()] == *prefix
}

/// Flattened frames shared by two histories, and the frames each side adds.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameDiff<K> {
    /// Length of the common flattened prefix.
    pub retained: usize,
    /// Origin frames above the common prefix, bottom to top.
    pub leaving: Vec<K>,
    /// Destination frames above the common prefix, bottom to top.
    pub entering: Vec<K>,
}

impl<K: Key> FrameDiff<K> {
    pub fn between(origin: &History<K>, destination: &History<K>) -> Self {
        let origin = origin.flattened();
        let mut destination = destination.flattened();
        let retained = origin
            .iter()
            .zip(destination.iter())
            .take_while(|(old, new)| old == new)
            .count();
        let leaving = origin[retained..].to_vec();
        let entering = destination.split_off(retained);
        Self {
            retained,
            leaving,
            entering,
        }
    }
}

/// One transition handed to a [`Dispatcher`](crate::Dispatcher).
#[derive(Clone, Debug)]
pub struct Traversal<K: Key> {
    origin: Option<History<K>>,
    destination: History<K>,
    direction: Direction,
}

impl<K: Key> Traversal<K> {
    pub(crate) fn new(origin: History<K>, destination: History<K>) -> Self {
        let direction = Direction::between(&origin, &destination);
        Self {
            origin: Some(origin),
            destination,
            direction,
        }
    }

    /// Brings a newly attached dispatcher up to date with `current`.
    pub(crate) fn bootstrap(current: History<K>) -> Self {
        Self {
            origin: None,
            destination: current,
            direction: Direction::Replace,
        }
    }

    /// `None` for bootstrap traversals.
    pub fn origin(&self) -> Option<&History<K>> {
        self.origin.as_ref()
    }

    pub fn destination(&self) -> &History<K> {
        &self.destination
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_bootstrap(&self) -> bool {
        self.origin.is_none()
    }

    pub fn diff(&self) -> FrameDiff<K> {
        match &self.origin {
            Some(origin) => FrameDiff::between(origin, &self.destination),
            None => FrameDiff {
                retained: 0,
                leaving: Vec::new(),
                entering: self.destination.flattened(),
            },
        }
    }
}

#[cfg(test)]
#[path = "tests/traversal_tests.rs"]
mod tests;
