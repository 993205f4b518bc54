//! JSON tag library for the jukebox.
//!
//! The library file maps tag IDs to discs:
//!
//! ```json
//! {
//!   "discs": {
//!     "04:f2:3d:76": {
//!       "uri": "spotify:album:1",
//!       "option": { "shuffle": true },
//!       "metadata": { "artist": "Zubi", "album": "Dear Z" }
//!     }
//!   }
//! }
//! ```
//!
//! The file may be edited while the jukebox runs. [`JsonLibrary`] re-reads it
//! on every lookup.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use jb_core::{Entry, Library, LibraryError, TagId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Library file errors.
#[derive(Debug, Error)]
pub enum LibraryFileError {
    /// The file exists but could not be read.
    #[error("failed to read library {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The file is not a valid library document.
    #[error("invalid library {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Playback options for a disc.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscOption {
    /// Play tracks in random order.
    #[serde(default)]
    pub shuffle: bool,
    /// Marks discs used to test a reader setup.
    #[serde(default)]
    pub is_test: bool,
}

/// Descriptive metadata, unused by playback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playlist: Option<String>,
}

/// A library record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disc {
    /// Path or URI of the media.
    pub uri: String,
    #[serde(default)]
    pub option: DiscOption,
    #[serde(default)]
    pub metadata: DiscMetadata,
}

impl From<&Disc> for Entry {
    fn from(disc: &Disc) -> Self {
        Self::new(disc.uri.clone(), disc.option.shuffle)
    }
}

/// The full library document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub discs: BTreeMap<String, Disc>,
}

impl Catalog {
    /// Returns the disc registered for `tag_id`.
    pub fn disc(&self, tag_id: &TagId) -> Option<&Disc> {
        self.discs.get(tag_id.as_str())
    }
}

/// Library backed by a JSON file.
#[derive(Debug, Clone)]
pub struct JsonLibrary {
    path: PathBuf,
}

impl JsonLibrary {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the library file.
    ///
    /// A missing file is an empty library.
    pub fn load(&self) -> Result<Catalog, LibraryFileError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::warn!(
                    path = %self.path.display(),
                    "library file not found, treating as empty"
                );
                return Ok(Catalog::default());
            }
            Err(source) => {
                return Err(LibraryFileError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        serde_json::from_str(&content).map_err(|source| LibraryFileError::Parse {
            path: self.path.clone(),
            source,
        })
    }
}

impl Library for JsonLibrary {
    fn get_entry(&self, tag_id: &TagId) -> Result<Option<Entry>, LibraryError> {
        let catalog = self
            .load()
            .map_err(|err| LibraryError::new(tag_id.clone(), err))?;
        let entry = catalog.disc(tag_id).map(Entry::from);
        tracing::debug!(%tag_id, found = entry.is_some(), "library lookup");
        Ok(entry)
    }
}
