//! Observability hook for handler transitions.
//!
//! The core never touches global logging state. Callers that want to see
//! transitions inject an observer; the default does nothing.

use crate::action::PlaybackAction;
use crate::event::TagEvent;
use crate::session::PlaybackSession;

/// One handled tick.
#[derive(Debug, Clone, Copy)]
pub struct Transition<'a> {
    pub event: &'a TagEvent,
    pub action: PlaybackAction,
    pub before: &'a PlaybackSession,
    pub after: &'a PlaybackSession,
}

/// Receives every transition computed by the handler.
pub trait TransitionObserver {
    fn on_transition(&self, transition: &Transition<'_>);

    /// Called when a detected tag has no library entry.
    fn on_unregistered_tag(&self, _event: &TagEvent) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl TransitionObserver for NoopObserver {
    fn on_transition(&self, _transition: &Transition<'_>) {}
}
