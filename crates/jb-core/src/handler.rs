//! Tag event handling: classify, drive the player, compute the next session.

use std::time::Duration;

use thiserror::Error;

use crate::action::{ActionClassifier, PlaybackAction};
use crate::event::TagEvent;
use crate::observer::{NoopObserver, Transition, TransitionObserver};
use crate::ports::{Library, LibraryError, Player, PlayerError};
use crate::session::PlaybackSession;

/// A collaborator call made while handling an event failed.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error(transparent)]
    Player(#[from] PlayerError),
    #[error(transparent)]
    Library(#[from] LibraryError),
}

/// Handling an event failed in a collaborator.
///
/// The core cannot tell whether a failed command took effect, so the error
/// carries the session computed as if it had. Callers that want to keep
/// polling continue from [`HandlerError::into_session`].
#[derive(Debug, Error)]
#[error("{action} action failed")]
pub struct HandlerError {
    pub action: PlaybackAction,
    pub session: Box<PlaybackSession>,
    #[source]
    pub source: CollaboratorError,
}

impl HandlerError {
    /// The next session, as if the failed call had succeeded.
    pub fn into_session(self) -> PlaybackSession {
        *self.session
    }
}

/// Drives a [`Player`] from tag events.
///
/// The handler owns its collaborators but not the session: each call to
/// [`execute`](Self::execute) takes the current session by value and returns
/// the next one.
pub struct TagEventHandler<P, L> {
    player: P,
    library: L,
    classifier: ActionClassifier,
    tick: Duration,
    observer: Box<dyn TransitionObserver>,
}

impl<P: Player, L: Library> TagEventHandler<P, L> {
    /// Creates a handler. `tick` is the polling interval of the outer loop;
    /// time counters advance by exactly this much per event.
    pub fn new(player: P, library: L, classifier: ActionClassifier, tick: Duration) -> Self {
        Self {
            player,
            library,
            classifier,
            tick,
            observer: Box::new(NoopObserver),
        }
    }

    /// Reports every transition to `observer`.
    #[must_use]
    pub fn with_observer(mut self, observer: impl TransitionObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    pub const fn player(&self) -> &P {
        &self.player
    }

    pub const fn library(&self) -> &L {
        &self.library
    }

    pub const fn classifier(&self) -> &ActionClassifier {
        &self.classifier
    }

    pub const fn tick(&self) -> Duration {
        self.tick
    }

    /// Handles one poll sample.
    pub fn execute(
        &mut self,
        event: &TagEvent,
        session: PlaybackSession,
    ) -> Result<PlaybackSession, HandlerError> {
        let action = self.classifier.classify(event, &session);
        let (next, outcome) = self.dispatch(action, event, &session);

        self.observer.on_transition(&Transition {
            event,
            action,
            before: &session,
            after: &next,
        });

        match outcome {
            Ok(()) => Ok(next),
            Err(source) => Err(HandlerError {
                action,
                session: Box::new(next),
                source,
            }),
        }
    }

    fn dispatch(
        &mut self,
        action: PlaybackAction,
        event: &TagEvent,
        session: &PlaybackSession,
    ) -> (PlaybackSession, Result<(), CollaboratorError>) {
        match action {
            PlaybackAction::Play => self.play(event, session),
            PlaybackAction::Resume => {
                let outcome = self.player.resume().map_err(CollaboratorError::from);
                let next = PlaybackSession {
                    current_tag: event.tag_id.clone(),
                    previous_tag: session.previous_tag.clone(),
                    awaiting: Duration::ZERO,
                    tag_removed: Duration::ZERO,
                    is_paused: false,
                };
                (next, outcome)
            }
            PlaybackAction::Continue => {
                let next = PlaybackSession {
                    current_tag: event.tag_id.clone(),
                    tag_removed: Duration::ZERO,
                    ..session.clone()
                };
                (next, Ok(()))
            }
            PlaybackAction::Waiting => {
                let next = PlaybackSession {
                    tag_removed: session.tag_removed + self.tick,
                    ..session.clone()
                };
                (next, Ok(()))
            }
            PlaybackAction::Pause => {
                // Still paused after an unregistered tag came and went.
                let outcome = if session.is_paused {
                    Ok(())
                } else {
                    self.player.pause().map_err(CollaboratorError::from)
                };
                let next = PlaybackSession {
                    awaiting: self.tick,
                    tag_removed: Duration::ZERO,
                    is_paused: true,
                    ..session.clone()
                };
                (next, outcome)
            }
            PlaybackAction::Stop => {
                let outcome = self.player.stop().map_err(CollaboratorError::from);
                (PlaybackSession::default(), outcome)
            }
            PlaybackAction::Idle => {
                let next = PlaybackSession {
                    awaiting: session.awaiting + self.tick,
                    ..session.clone()
                };
                (next, Ok(()))
            }
        }
    }

    fn play(
        &mut self,
        event: &TagEvent,
        session: &PlaybackSession,
    ) -> (PlaybackSession, Result<(), CollaboratorError>) {
        let Some(tag) = event.tag_id.clone() else {
            // The classifier only plays detected tags.
            return (session.clone(), Ok(()));
        };

        let mut is_paused = session.is_paused;
        let outcome = match self.library.get_entry(&tag) {
            Ok(Some(entry)) => {
                // The player was told to play, so it is no longer paused even
                // if the command fails.
                is_paused = false;
                self.player
                    .play(&entry.uri, entry.shuffle)
                    .map_err(CollaboratorError::from)
            }
            Ok(None) => {
                self.observer.on_unregistered_tag(event);
                Ok(())
            }
            Err(err) => Err(err.into()),
        };

        let next = PlaybackSession {
            current_tag: Some(tag.clone()),
            previous_tag: Some(tag),
            awaiting: Duration::ZERO,
            tag_removed: Duration::ZERO,
            is_paused,
        };
        (next, outcome)
    }
}
