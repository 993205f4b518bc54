//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::ValueEnum;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_PAUSE_DURATION_SECS: f64 = 900.0;
const DEFAULT_PAUSE_DELAY_SECS: f64 = 1.0;
const DEFAULT_TICK_MS: u64 = 500;
const DEFAULT_NFC_DEVICE: &str = "/dev/ttyACM0";

/// Environment variables from older releases, still honoured.
const DEPRECATED_ENV: [(&str, &str); 2] = [
    ("LIBRARY_PATH", "JUKEBOX_LIBRARY_PATH"),
    ("SONOS_HOST", "JUKEBOX_SONOS_HOST"),
];

/// Which player backend to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PlayerKind {
    /// Print commands instead of playing anything.
    Dryrun,
    /// A networked Sonos speaker.
    #[serde(rename = "sonos", alias = "live")]
    #[value(name = "sonos", alias = "live")]
    Live,
}

/// Which reader backend to poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReaderKind {
    /// Tag IDs typed on stdin.
    Dryrun,
    /// An NFC reader emitting UIDs on a character device.
    #[serde(rename = "nfc", alias = "live")]
    #[value(name = "nfc", alias = "live")]
    Live,
}

/// Configuration errors found after loading.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// The Sonos player needs to know which speaker to talk to.
    #[error("sonos player requires --sonos-host or JUKEBOX_SONOS_HOST")]
    MissingSonosHost,
    /// A duration is negative or not a number.
    #[error("{field} must be a non-negative number of seconds, got {value}")]
    InvalidDuration { field: &'static str, value: f64 },
    /// The polling interval must be positive.
    #[error("tick_ms must be greater than zero")]
    ZeroTick,
}

/// Validated timing parameters for the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub pause_delay: Duration,
    pub max_pause_duration: Duration,
    pub tick: Duration,
}

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the library JSON file.
    pub library_path: PathBuf,
    pub player: PlayerKind,
    pub reader: ReaderKind,
    /// IP address or hostname of the Sonos speaker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sonos_host: Option<String>,
    /// Character device the NFC reader writes UIDs to.
    pub nfc_device: PathBuf,
    /// Longest pause, in seconds, before the queue is reset.
    pub pause_duration_secs: f64,
    /// Grace period, in seconds, before pausing when the tag is removed.
    pub pause_delay_secs: f64,
    /// Polling interval in milliseconds.
    pub tick_ms: u64,
    #[serde(default)]
    pub verbose: bool,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("library_path", &self.library_path)
            .field("player", &self.player)
            .field("reader", &self.reader)
            .field("sonos_host", &self.sonos_host)
            .field("nfc_device", &self.nfc_device)
            .field("pause_duration_secs", &self.pause_duration_secs)
            .field("pause_delay_secs", &self.pause_delay_secs)
            .field("tick_ms", &self.tick_ms)
            .finish_non_exhaustive()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            library_path: default_library_path(),
            player: PlayerKind::Dryrun,
            reader: ReaderKind::Dryrun,
            sonos_host: None,
            nfc_device: PathBuf::from(DEFAULT_NFC_DEVICE),
            pause_duration_secs: DEFAULT_PAUSE_DURATION_SECS,
            pause_delay_secs: DEFAULT_PAUSE_DELAY_SECS,
            tick_ms: DEFAULT_TICK_MS,
            verbose: false,
        }
    }
}

impl Config {
    /// Loads configuration from default locations.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(None)
    }

    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        Self::figment(config_path).extract()
    }

    fn figment(config_path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Unprefixed variables from older releases
        figment = figment.merge(Env::raw().only(&DEPRECATED_ENV.map(|(old, _)| old)));

        // Load from environment variables (JUKEBOX_*)
        figment.merge(Env::prefixed("JUKEBOX_"))
    }

    /// Checks cross-field constraints and converts timings.
    pub fn validate(&self) -> Result<Timing, ConfigError> {
        if self.player == PlayerKind::Live
            && self
                .sonos_host
                .as_deref()
                .is_none_or(|host| host.trim().is_empty())
        {
            return Err(ConfigError::MissingSonosHost);
        }
        if self.tick_ms == 0 {
            return Err(ConfigError::ZeroTick);
        }

        Ok(Timing {
            pause_delay: seconds("pause_delay_secs", self.pause_delay_secs)?,
            max_pause_duration: seconds("pause_duration_secs", self.pause_duration_secs)?,
            tick: Duration::from_millis(self.tick_ms),
        })
    }
}

/// Returns the deprecated environment variables that are set, each with its
/// replacement.
///
/// Configuration is loaded before logging is set up, so callers report these
/// once the subscriber exists.
pub fn deprecated_env_in_use() -> Vec<(&'static str, &'static str)> {
    DEPRECATED_ENV
        .into_iter()
        .filter(|(old, _)| std::env::var_os(old).is_some())
        .collect()
}

fn seconds(field: &'static str, value: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(value).map_err(|_| ConfigError::InvalidDuration { field, value })
}

/// Returns the default library location, `~/.jukebox/library.json`.
pub fn default_library_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".jukebox")
        .join("library.json")
}

/// Returns the platform-specific config directory for the jukebox.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("jukebox"))
}

#[cfg(test)]
mod tests {
    use figment::Jail;

    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = Config::default();
        assert_eq!(config.player, PlayerKind::Dryrun);
        assert_eq!(config.reader, ReaderKind::Dryrun);
        assert!(config.library_path.ends_with(".jukebox/library.json"));
        assert_eq!(
            config.validate().unwrap(),
            Timing {
                pause_delay: Duration::from_secs(1),
                max_pause_duration: Duration::from_secs(900),
                tick: Duration::from_millis(500),
            }
        );
    }

    #[test]
    fn test_sonos_requires_host() {
        let config = Config {
            player: PlayerKind::Live,
            ..Config::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::MissingSonosHost));

        let config = Config {
            player: PlayerKind::Live,
            sonos_host: Some("192.168.1.100".to_string()),
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_negative_duration_is_rejected() {
        let config = Config {
            pause_delay_secs: -1.0,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDuration {
                field: "pause_delay_secs",
                ..
            })
        ));
    }

    #[test]
    fn test_zero_tick_is_rejected() {
        let config = Config {
            tick_ms: 0,
            ..Config::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroTick));
    }

    #[test]
    fn test_config_file_and_env_layering() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "jukebox.toml",
                r#"
                player = "sonos"
                reader = "nfc"
                sonos_host = "10.0.0.5"
                pause_duration_secs = 600
                "#,
            )?;
            jail.set_env("JUKEBOX_PAUSE_DELAY_SECS", "2");

            let config = Config::load_from(Some(Path::new("jukebox.toml")))?;
            assert_eq!(config.player, PlayerKind::Live);
            assert_eq!(config.reader, ReaderKind::Live);
            assert_eq!(config.sonos_host.as_deref(), Some("10.0.0.5"));
            assert!((config.pause_duration_secs - 600.0).abs() < f64::EPSILON);
            assert!((config.pause_delay_secs - 2.0).abs() < f64::EPSILON);
            Ok(())
        });
    }

    #[test]
    fn test_deprecated_env_is_honoured_but_prefixed_wins() {
        Jail::expect_with(|jail| {
            jail.set_env("SONOS_HOST", "old-host");
            let config = Config::load_from(None)?;
            assert_eq!(config.sonos_host.as_deref(), Some("old-host"));

            jail.set_env("JUKEBOX_SONOS_HOST", "new-host");
            let config = Config::load_from(None)?;
            assert_eq!(config.sonos_host.as_deref(), Some("new-host"));
            Ok(())
        });
    }

    #[test]
    fn test_deprecated_env_in_use() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            assert!(deprecated_env_in_use().is_empty());

            jail.set_env("LIBRARY_PATH", "/srv/library.json");
            assert_eq!(
                deprecated_env_in_use(),
                vec![("LIBRARY_PATH", "JUKEBOX_LIBRARY_PATH")]
            );
            Ok(())
        });
    }

    #[test]
    fn test_verbose_from_env() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            assert!(!Config::load_from(None)?.verbose);

            jail.set_env("JUKEBOX_VERBOSE", "true");
            assert!(Config::load_from(None)?.verbose);
            Ok(())
        });
    }

    #[test]
    fn test_live_aliases_are_accepted() {
        Jail::expect_with(|jail| {
            jail.set_env("JUKEBOX_PLAYER", "live");
            jail.set_env("JUKEBOX_READER", "live");
            let config = Config::load_from(None)?;
            assert_eq!(config.player, PlayerKind::Live);
            assert_eq!(config.reader, ReaderKind::Live);
            Ok(())
        });
    }
}
