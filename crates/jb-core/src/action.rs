//! Per-tick action classification.
//!
//! Maps the latest [`TagEvent`] and the accumulated [`PlaybackSession`] to a
//! single [`PlaybackAction`]. Classification is pure: it performs no I/O and
//! never fails. Rules are evaluated in order and the first match wins:
//!
//! | # | tag         | condition                                      | action     |
//! |---|-------------|------------------------------------------------|------------|
//! | 1 | = previous  | not in pause phase, player not paused          | `Continue` |
//! | 2 | = previous  | `0 < awaiting < max_pause_duration`            | `Resume`   |
//! | 3 | any         |                                                | `Play`     |
//! | 4 | absent      | previous known, not paused, `removed < delay`  | `Waiting`  |
//! | 5 | absent      | previous known, not paused, `removed >= delay` | `Pause`    |
//! | 6 | absent      | previous known, `awaiting >= max`              | `Stop`     |
//! | 7 | absent      | otherwise                                      | `Idle`     |
//!
//! "Not paused" for rules 4 and 5 means `awaiting == 0`: the grace period and
//! the pause phase never overlap, so a session that has already paused goes
//! straight to `Idle` or `Stop` whatever its removal counter says.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::event::TagEvent;
use crate::session::PlaybackSession;

/// What the handler should do for the current tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackAction {
    /// The same tag is still present; nothing to do.
    Continue,
    /// The paused tag came back before the pause ceiling.
    Resume,
    /// A new tag (or a stale paused one) must start playing from scratch.
    Play,
    /// The tag is gone but the grace period has not elapsed.
    Waiting,
    /// The grace period elapsed; pause the player.
    Pause,
    /// Paused for too long; stop and forget the tag.
    Stop,
    /// Nothing to do while paused or with no tag history.
    Idle,
}

impl PlaybackAction {
    /// Lowercase name used in logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Continue => "continue",
            Self::Resume => "resume",
            Self::Play => "play",
            Self::Waiting => "waiting",
            Self::Pause => "pause",
            Self::Stop => "stop",
            Self::Idle => "idle",
        }
    }

    /// Whether the action issues a player command.
    #[must_use]
    pub const fn drives_player(&self) -> bool {
        matches!(self, Self::Resume | Self::Play | Self::Pause | Self::Stop)
    }
}

impl fmt::Display for PlaybackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classifies tag events with a fixed pair of thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionClassifier {
    pause_delay: Duration,
    max_pause_duration: Duration,
}

impl ActionClassifier {
    /// Creates a classifier.
    ///
    /// `pause_delay` is the grace period a tag may be absent before pausing;
    /// `max_pause_duration` is how long a pause may last before a hard stop.
    pub const fn new(pause_delay: Duration, max_pause_duration: Duration) -> Self {
        Self {
            pause_delay,
            max_pause_duration,
        }
    }

    pub const fn pause_delay(&self) -> Duration {
        self.pause_delay
    }

    pub const fn max_pause_duration(&self) -> Duration {
        self.max_pause_duration
    }

    /// Classifies `event` against `session`.
    pub fn classify(&self, event: &TagEvent, session: &PlaybackSession) -> PlaybackAction {
        classify(event, session, self.pause_delay, self.max_pause_duration)
    }
}

/// Classifies `event` against `session` using explicit thresholds.
pub fn classify(
    event: &TagEvent,
    session: &PlaybackSession,
    pause_delay: Duration,
    max_pause_duration: Duration,
) -> PlaybackAction {
    let awaiting = session.awaiting;
    let in_pause_phase = session.in_pause_phase();

    if let Some(tag) = &event.tag_id {
        let same_tag = session.previous_tag.as_ref() == Some(tag);
        if same_tag && !in_pause_phase && !session.is_paused {
            return PlaybackAction::Continue;
        }
        if same_tag && in_pause_phase && awaiting < max_pause_duration {
            return PlaybackAction::Resume;
        }
        return PlaybackAction::Play;
    }

    if session.previous_tag.is_none() {
        return PlaybackAction::Idle;
    }
    if !in_pause_phase {
        return if session.tag_removed < pause_delay {
            PlaybackAction::Waiting
        } else {
            PlaybackAction::Pause
        };
    }
    if awaiting >= max_pause_duration {
        return PlaybackAction::Stop;
    }
    PlaybackAction::Idle
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TagId;

    const PAUSE_DELAY: Duration = Duration::from_secs(3);
    const MAX_PAUSE: Duration = Duration::from_secs(50);

    fn classifier() -> ActionClassifier {
        ActionClassifier::new(PAUSE_DELAY, MAX_PAUSE)
    }

    fn tag(id: &str) -> TagId {
        TagId::new(id).unwrap()
    }

    fn seen(id: &str) -> TagEvent {
        TagEvent::new(Some(tag(id)))
    }

    fn nothing() -> TagEvent {
        TagEvent::new(None)
    }

    fn session(previous: Option<&str>, awaiting: f64, removed: f64) -> PlaybackSession {
        PlaybackSession {
            current_tag: previous.map(tag),
            previous_tag: previous.map(tag),
            awaiting: Duration::from_secs_f64(awaiting),
            tag_removed: Duration::from_secs_f64(removed),
            is_paused: awaiting > 0.0,
        }
    }

    #[test]
    fn continue_when_same_tag_and_not_paused() {
        let action = classifier().classify(&seen("id-1"), &session(Some("id-1"), 0.0, 0.0));
        assert_eq!(action, PlaybackAction::Continue);
    }

    #[test]
    fn resume_when_same_tag_within_pause_ceiling() {
        let action = classifier().classify(&seen("id-1"), &session(Some("id-1"), 20.0, 0.0));
        assert_eq!(action, PlaybackAction::Resume);
    }

    #[test]
    fn play_when_same_tag_but_paused_too_long() {
        for awaiting in [50.0, 100.0, 99_999.0] {
            let action =
                classifier().classify(&seen("id-1"), &session(Some("id-1"), awaiting, 0.0));
            assert_eq!(action, PlaybackAction::Play, "awaiting = {awaiting}");
        }
    }

    #[test]
    fn play_when_different_tag_regardless_of_counters() {
        for (awaiting, removed) in [(0.0, 0.0), (20.0, 0.0), (99_999.0, 0.0), (0.0, 2.0)] {
            let action =
                classifier().classify(&seen("id-1"), &session(Some("id-2"), awaiting, removed));
            assert_eq!(action, PlaybackAction::Play);
        }
    }

    #[test]
    fn play_when_first_tag_is_seen() {
        let action = classifier().classify(&seen("id-1"), &PlaybackSession::default());
        assert_eq!(action, PlaybackAction::Play);
    }

    #[test]
    fn play_when_same_tag_read_while_player_still_paused() {
        // An unregistered tag replaced the paused one without any player call.
        let session = PlaybackSession {
            is_paused: true,
            ..PlaybackSession::playing(tag("unknown"))
        };
        let action = classifier().classify(&seen("unknown"), &session);
        assert_eq!(action, PlaybackAction::Play);
    }

    #[test]
    fn waiting_when_tag_removed_within_grace_period() {
        let action = classifier().classify(&nothing(), &session(Some("id-1"), 0.0, 2.0));
        assert_eq!(action, PlaybackAction::Waiting);
    }

    #[test]
    fn pause_when_grace_period_elapsed() {
        for removed in [3.0, 5.0] {
            let action = classifier().classify(&nothing(), &session(Some("id-1"), 0.0, removed));
            assert_eq!(action, PlaybackAction::Pause, "removed = {removed}");
        }
    }

    #[test]
    fn idle_while_paused_within_ceiling() {
        let action = classifier().classify(&nothing(), &session(Some("id-1"), 20.0, 0.0));
        assert_eq!(action, PlaybackAction::Idle);
    }

    #[test]
    fn stop_when_paused_too_long() {
        let action = classifier().classify(&nothing(), &session(Some("id-1"), 100.0, 0.0));
        assert_eq!(action, PlaybackAction::Stop);
    }

    #[test]
    fn stop_takes_precedence_over_stale_removal_counter() {
        // Both counters past their thresholds: the pause phase wins.
        let action = classifier().classify(&nothing(), &session(Some("id-1"), 100.0, 10.0));
        assert_eq!(action, PlaybackAction::Stop);
    }

    #[test]
    fn idle_when_nothing_was_ever_played() {
        for awaiting in [0.0, 10.0, 99_999.0] {
            let action = classifier().classify(&nothing(), &session(None, awaiting, 0.0));
            assert_eq!(action, PlaybackAction::Idle, "awaiting = {awaiting}");
        }
    }

    #[test]
    fn free_function_matches_classifier() {
        let session = session(Some("id-1"), 0.0, 2.0);
        let event = nothing();
        assert_eq!(
            classify(&event, &session, PAUSE_DELAY, MAX_PAUSE),
            classifier().classify(&event, &session)
        );
    }

    #[test]
    fn action_display_is_lowercase() {
        assert_eq!(PlaybackAction::Waiting.to_string(), "waiting");
        assert_eq!(
            serde_json::to_string(&PlaybackAction::Resume).unwrap(),
            r#""resume""#
        );
    }
}
