//! Builds the reader and handler from configuration.

use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use jb_core::{ActionClassifier, Player, Reader, TagEventHandler};
use jb_library::JsonLibrary;

use crate::adapters::{DryrunPlayer, DryrunReader, NfcReader, SonosPlayer};
use crate::config::{Config, PlayerKind, ReaderKind, Timing};
use crate::observe::TracingObserver;

/// How long the dry-run reader waits for typed input on each poll.
const DRYRUN_READ_TIMEOUT: Duration = Duration::from_secs(1);

/// The handler type used by the binary.
pub type Handler = TagEventHandler<Box<dyn Player>, JsonLibrary>;

/// A fully wired jukebox.
pub struct Jukebox {
    pub reader: Box<dyn Reader>,
    pub handler: Handler,
}

/// Builds the player selected by `config`.
pub fn build_player(config: &Config) -> Result<Box<dyn Player>> {
    match config.player {
        PlayerKind::Dryrun => Ok(Box::new(DryrunPlayer::new(io::stdout()))),
        PlayerKind::Live => {
            let host = config
                .sonos_host
                .as_deref()
                .context("sonos player requires a host")?;
            Ok(Box::new(SonosPlayer::connect(host)?))
        }
    }
}

/// Builds the reader selected by `config`.
pub fn build_reader(config: &Config) -> Result<Box<dyn Reader>> {
    match config.reader {
        ReaderKind::Dryrun => Ok(Box::new(DryrunReader::stdin(DRYRUN_READ_TIMEOUT)?)),
        ReaderKind::Live => Ok(Box::new(NfcReader::open(&config.nfc_device)?)),
    }
}

/// Builds the handler around an already constructed player.
pub fn build_handler(config: &Config, timing: Timing, player: Box<dyn Player>) -> Handler {
    let library = JsonLibrary::new(&config.library_path);
    let classifier = ActionClassifier::new(timing.pause_delay, timing.max_pause_duration);
    TagEventHandler::new(player, library, classifier, timing.tick)
        .with_observer(TracingObserver::new())
}

/// Validates `config` and wires every collaborator.
pub fn build_jukebox(config: &Config) -> Result<Jukebox> {
    let timing = config.validate().context("invalid configuration")?;
    tracing::debug!(?timing, "validated timings");

    let player = build_player(config).context("failed to create player")?;
    let reader = build_reader(config).context("failed to create reader")?;
    let handler = build_handler(config, timing, player);

    Ok(Jukebox { reader, handler })
}
