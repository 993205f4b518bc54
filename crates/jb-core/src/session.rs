//! Playback session state threaded through the control loop.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::TagId;

/// Everything the classifier needs to remember between polls.
///
/// The session is a plain value: the handler consumes one and returns the
/// next, so transitions can be tested without a running loop.
///
/// `tag_removed` and `awaiting` count two disjoint phases. `tag_removed`
/// grows during the grace period after the tag disappears; once the pause is
/// issued it is reset and `awaiting` grows instead, until the tag returns or
/// the pause ceiling is reached.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackSession {
    /// The tag believed to be under the reader.
    pub current_tag: Option<TagId>,
    /// The tag that was current as of the previous event.
    pub previous_tag: Option<TagId>,
    /// Time spent paused, counted from the pause.
    pub awaiting: Duration,
    /// Time since the tag was last seen, before the pause is issued.
    pub tag_removed: Duration,
    /// Whether the player is understood to be paused.
    pub is_paused: bool,
}

impl PlaybackSession {
    /// A session that has just started playing `tag`.
    pub fn playing(tag: TagId) -> Self {
        Self {
            current_tag: Some(tag.clone()),
            previous_tag: Some(tag),
            ..Self::default()
        }
    }

    /// A session paused on `tag` for `awaiting`.
    pub fn paused(tag: TagId, awaiting: Duration) -> Self {
        Self {
            awaiting,
            is_paused: true,
            ..Self::playing(tag)
        }
    }

    /// Whether the session has already issued a pause and is counting towards a stop.
    pub fn in_pause_phase(&self) -> bool {
        !self.awaiting.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_session_is_empty() {
        let session = PlaybackSession::default();
        assert_eq!(session.current_tag, None);
        assert_eq!(session.previous_tag, None);
        assert_eq!(session.awaiting, Duration::ZERO);
        assert_eq!(session.tag_removed, Duration::ZERO);
        assert!(!session.is_paused);
        assert!(!session.in_pause_phase());
    }

    #[test]
    fn paused_session_tracks_tag_and_counter() {
        let tag = TagId::new("A").unwrap();
        let session = PlaybackSession::paused(tag.clone(), Duration::from_secs(10));

        assert_eq!(session.current_tag.as_ref(), Some(&tag));
        assert_eq!(session.previous_tag.as_ref(), Some(&tag));
        assert!(session.is_paused);
        assert!(session.in_pause_phase());
    }
}
