//! Structured logging of control loop transitions.

use std::cell::RefCell;
use std::time::Duration;

use jb_core::{PlaybackAction, TagEvent, TagId, Transition, TransitionObserver};

/// Logs transitions through `tracing`.
///
/// Every tick is logged at debug level. A change of action or tag is logged
/// at info level, so that a steady `continue`, `idle` or a repeated `play`
/// of an unknown tag does not flood the log. An unregistered tag is warned
/// about once for as long as it stays on the reader.
#[derive(Debug, Default)]
pub struct TracingObserver {
    last: RefCell<Option<(PlaybackAction, Option<TagId>)>>,
    warned: RefCell<Option<TagId>>,
}

impl TracingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a transition and reports whether it differs from the previous one.
    fn note_transition(&self, action: PlaybackAction, tag: Option<&TagId>) -> bool {
        if action != PlaybackAction::Play {
            self.warned.replace(None);
        }
        let current = (action, tag.cloned());
        self.last.replace(Some(current.clone())).as_ref() != Some(&current)
    }

    /// Records an unregistered tag and reports whether it is new.
    fn note_unregistered(&self, tag: &TagId) -> bool {
        self.warned.replace(Some(tag.clone())).as_ref() != Some(tag)
    }
}

impl TransitionObserver for TracingObserver {
    fn on_transition(&self, transition: &Transition<'_>) {
        let action = transition.action;
        let tag = transition.event.tag_id.as_ref().map(ToString::to_string);
        let previous = transition
            .before
            .previous_tag
            .as_ref()
            .map(ToString::to_string);
        let awaiting_ms = millis(transition.after.awaiting);
        let removed_ms = millis(transition.after.tag_removed);

        tracing::debug!(
            %action,
            ?tag,
            ?previous,
            awaiting_ms,
            removed_ms,
            at = %transition.event.timestamp,
            "tick"
        );

        if self.note_transition(action, transition.event.tag_id.as_ref()) {
            tracing::info!(%action, ?tag, ?previous, awaiting_ms, removed_ms, "action");
        }
    }

    fn on_unregistered_tag(&self, event: &TagEvent) {
        let Some(tag) = &event.tag_id else {
            return;
        };
        if self.note_unregistered(tag) {
            tracing::warn!(%tag, "no library entry for tag");
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
