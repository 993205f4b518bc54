//! Collaborator interfaces consumed by the control loop.
//!
//! Readers, players and libraries are device drivers or storage backends.
//! The core only talks to them through these traits, and every concrete
//! implementation is injected by construction.

use std::error::Error as StdError;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::TagId;

/// Boxed error from a backend the core knows nothing about.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// A playable library record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Opaque reference understood by the player.
    pub uri: String,
    /// Whether tracks should be played in random order.
    #[serde(default)]
    pub shuffle: bool,
}

impl Entry {
    pub fn new(uri: impl Into<String>, shuffle: bool) -> Self {
        Self {
            uri: uri.into(),
            shuffle,
        }
    }
}

/// A player command failed.
#[derive(Debug, Error)]
#[error("player {command} failed")]
pub struct PlayerError {
    /// The command that failed (`play`, `pause`, ...).
    pub command: &'static str,
    #[source]
    pub source: BoxError,
}

impl PlayerError {
    pub fn new(command: &'static str, source: impl Into<BoxError>) -> Self {
        Self {
            command,
            source: source.into(),
        }
    }
}

/// A library lookup failed.
#[derive(Debug, Error)]
#[error("library lookup for {tag_id} failed")]
pub struct LibraryError {
    pub tag_id: TagId,
    #[source]
    pub source: BoxError,
}

impl LibraryError {
    pub fn new(tag_id: TagId, source: impl Into<BoxError>) -> Self {
        Self {
            tag_id,
            source: source.into(),
        }
    }
}

/// Source of presence samples.
pub trait Reader {
    /// Returns the detected tag, or `None` when nothing is under the reader.
    fn poll(&mut self) -> Option<TagId>;
}

/// Audio output controlled by the loop.
///
/// Commands are fire-and-forget: the core neither retries them nor checks
/// that they took effect.
pub trait Player {
    fn play(&mut self, uri: &str, shuffle: bool) -> Result<(), PlayerError>;
    fn pause(&mut self) -> Result<(), PlayerError>;
    fn resume(&mut self) -> Result<(), PlayerError>;
    fn stop(&mut self) -> Result<(), PlayerError>;
}

/// Read-only lookup from tag to playable entry.
pub trait Library {
    /// Returns the entry for `tag_id`, or `None` for an unregistered tag.
    fn get_entry(&self, tag_id: &TagId) -> Result<Option<Entry>, LibraryError>;
}

impl<R: Reader + ?Sized> Reader for Box<R> {
    fn poll(&mut self) -> Option<TagId> {
        (**self).poll()
    }
}

impl<P: Player + ?Sized> Player for Box<P> {
    fn play(&mut self, uri: &str, shuffle: bool) -> Result<(), PlayerError> {
        (**self).play(uri, shuffle)
    }

    fn pause(&mut self) -> Result<(), PlayerError> {
        (**self).pause()
    }

    fn resume(&mut self) -> Result<(), PlayerError> {
        (**self).resume()
    }

    fn stop(&mut self) -> Result<(), PlayerError> {
        (**self).stop()
    }
}

impl<L: Library + ?Sized> Library for Box<L> {
    fn get_entry(&self, tag_id: &TagId) -> Result<Option<Entry>, LibraryError> {
        (**self).get_entry(tag_id)
    }
}

impl<L: Library + ?Sized> Library for &L {
    fn get_entry(&self, tag_id: &TagId) -> Result<Option<Entry>, LibraryError> {
        (**self).get_entry(tag_id)
    }
}

/// In-memory library, mostly useful for tests and demos.
impl Library for std::collections::HashMap<TagId, Entry> {
    fn get_entry(&self, tag_id: &TagId) -> Result<Option<Entry>, LibraryError> {
        Ok(self.get(tag_id).cloned())
    }
}
