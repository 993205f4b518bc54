//! The polling loop.

use std::time::Duration;

use jb_core::{Library, PlaybackSession, Player, Reader, TagEvent, TagEventHandler};

/// Polls `reader` and feeds every sample to `handler`.
///
/// Runs forever unless `max_ticks` is set. A failing player or library is
/// logged and the loop carries on with the session the handler reports, so
/// one bad command never stops the jukebox. `sleep` is called with the
/// handler's tick after every sample.
pub fn run_loop<R, P, L>(
    reader: &mut R,
    handler: &mut TagEventHandler<P, L>,
    max_ticks: Option<u64>,
    mut sleep: impl FnMut(Duration),
) -> PlaybackSession
where
    R: Reader + ?Sized,
    P: Player,
    L: Library,
{
    let tick = handler.tick();
    let mut session = PlaybackSession::default();
    let mut ticks = 0_u64;

    tracing::info!(tick = ?tick, "polling reader");
    while max_ticks.is_none_or(|max| ticks < max) {
        let event = TagEvent::new(reader.poll());
        session = match handler.execute(&event, session) {
            Ok(next) => next,
            Err(err) => {
                tracing::error!(action = %err.action, error = %err.source, "command failed");
                err.into_session()
            }
        };
        ticks += 1;
        sleep(tick);
    }

    tracing::debug!(ticks, "polling stopped");
    session
}
