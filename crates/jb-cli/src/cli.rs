//! Command-line argument definitions.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{Config, PlayerKind, ReaderKind};

/// Play music on speakers using NFC tags.
///
/// Polls a tag reader and plays the library entry registered for the tag
/// that is on it. Removing the tag pauses playback after a grace period;
/// putting it back resumes where it left off.
#[derive(Debug, Parser)]
#[command(name = "jukebox", version, about, long_about = None)]
pub struct Cli {
    /// Player to use.
    #[arg(value_enum)]
    pub player: Option<PlayerKind>,

    /// Reader to use.
    #[arg(value_enum)]
    pub reader: Option<ReaderKind>,

    /// Path to the library JSON file.
    #[arg(short, long)]
    pub library: Option<PathBuf>,

    /// Path to config file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// IP address or hostname of the Sonos speaker.
    #[arg(long)]
    pub sonos_host: Option<String>,

    /// Character device the NFC reader writes UIDs to.
    #[arg(long)]
    pub nfc_device: Option<PathBuf>,

    /// Longest pause, in seconds, before the queue is reset.
    #[arg(long, value_name = "SECONDS")]
    pub pause_duration: Option<f64>,

    /// Grace period, in seconds, before pausing when the tag is removed.
    #[arg(long, value_name = "SECONDS")]
    pub pause_delay: Option<f64>,

    /// Polling interval in milliseconds.
    #[arg(long, value_name = "MILLISECONDS")]
    pub tick_ms: Option<u64>,

    /// Exit after this many polls instead of running forever.
    #[arg(long, value_name = "COUNT", hide = true)]
    pub max_ticks: Option<u64>,
}

impl Cli {
    /// Applies flags on top of the loaded configuration.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(player) = self.player {
            config.player = player;
        }
        if let Some(reader) = self.reader {
            config.reader = reader;
        }
        if let Some(library) = &self.library {
            config.library_path.clone_from(library);
        }
        if let Some(host) = &self.sonos_host {
            config.sonos_host = Some(host.clone());
        }
        if let Some(device) = &self.nfc_device {
            config.nfc_device.clone_from(device);
        }
        if let Some(secs) = self.pause_duration {
            config.pause_duration_secs = secs;
        }
        if let Some(secs) = self.pause_delay {
            config.pause_delay_secs = secs;
        }
        if let Some(ms) = self.tick_ms {
            config.tick_ms = ms;
        }
        config.verbose |= self.verbose;
    }
}
