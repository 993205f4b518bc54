//! Player backends.

use std::io::Write;

use anyhow::{Context, Result};
use jb_core::{Player, PlayerError};
use jb_sonos::SonosClient;
use tokio::runtime::Runtime;

/// Prints what a player would do.
#[derive(Debug)]
pub struct DryrunPlayer<W> {
    out: W,
}

impl<W: Write> DryrunPlayer<W> {
    pub fn new(mut out: W) -> Self {
        // Best effort; the player is usable even if the banner is lost.
        let _ = writeln!(out, "creating player");
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn say(&mut self, command: &'static str, line: &str) -> Result<(), PlayerError> {
        writeln!(self.out, "{line}")
            .and_then(|()| self.out.flush())
            .map_err(|err| PlayerError::new(command, err))
    }
}

impl<W: Write> Player for DryrunPlayer<W> {
    fn play(&mut self, uri: &str, shuffle: bool) -> Result<(), PlayerError> {
        let line = if shuffle {
            format!("random playback of {uri} on the player")
        } else {
            format!("playing {uri} on the player")
        };
        self.say("play", &line)
    }

    fn pause(&mut self) -> Result<(), PlayerError> {
        self.say("pause", "pausing player")
    }

    fn resume(&mut self) -> Result<(), PlayerError> {
        self.say("resume", "resuming player")
    }

    fn stop(&mut self) -> Result<(), PlayerError> {
        self.say("stop", "stopping player")
    }
}

/// Drives a Sonos speaker.
///
/// The control loop is synchronous, so each command is run to completion on
/// a private single-threaded runtime.
#[derive(Debug)]
pub struct SonosPlayer {
    client: SonosClient,
    runtime: Runtime,
    name: String,
}

impl SonosPlayer {
    /// Connects to the speaker at `host` and checks that it answers.
    pub fn connect(host: &str) -> Result<Self> {
        let client = SonosClient::new(host).context("failed to create sonos client")?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("failed to initialize tokio runtime")?;
        let name = runtime
            .block_on(client.zone_name())
            .with_context(|| format!("no sonos speaker answering at {host}"))?;
        tracing::info!(speaker = %name, url = client.base_url(), "found sonos speaker");
        Ok(Self {
            client,
            runtime,
            name,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Player for SonosPlayer {
    fn play(&mut self, uri: &str, shuffle: bool) -> Result<(), PlayerError> {
        tracing::info!(speaker = %self.name, uri, shuffle, "playing");
        self.runtime
            .block_on(self.client.play_uri(uri, shuffle))
            .map_err(|err| PlayerError::new("play", err))
    }

    fn pause(&mut self) -> Result<(), PlayerError> {
        tracing::info!(speaker = %self.name, "pausing");
        self.runtime
            .block_on(self.client.pause())
            .map_err(|err| PlayerError::new("pause", err))
    }

    fn resume(&mut self) -> Result<(), PlayerError> {
        tracing::info!(speaker = %self.name, "resuming");
        self.runtime
            .block_on(self.client.play())
            .map_err(|err| PlayerError::new("resume", err))
    }

    fn stop(&mut self) -> Result<(), PlayerError> {
        tracing::info!(speaker = %self.name, "stopping and clearing queue");
        self.runtime
            .block_on(self.client.clear_queue())
            .map_err(|err| PlayerError::new("stop", err))
    }
}
