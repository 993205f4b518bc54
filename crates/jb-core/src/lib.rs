//! Core control loop for the jukebox.
//!
//! This crate turns noisy presence samples from a tag reader into stable
//! playback commands:
//! - Classification: a pure mapping from the latest sample and the session
//!   history to one [`PlaybackAction`]
//! - Handling: driving the [`Player`] and [`Library`] collaborators for that
//!   action and computing the next [`PlaybackSession`]
//!
//! Readers, players and libraries are injected through the traits in
//! [`ports`]. Nothing here performs I/O of its own.

pub mod action;
mod event;
mod handler;
mod observer;
pub mod ports;
mod session;
mod types;

pub use action::{ActionClassifier, PlaybackAction, classify};
pub use event::TagEvent;
pub use handler::{CollaboratorError, HandlerError, TagEventHandler};
pub use observer::{NoopObserver, Transition, TransitionObserver};
pub use ports::{BoxError, Entry, Library, LibraryError, Player, PlayerError, Reader};
pub use session::PlaybackSession;
pub use types::{TagId, ValidationError};
