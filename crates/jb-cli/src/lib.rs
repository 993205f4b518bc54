//! Jukebox CLI library.
//!
//! This crate wires readers, players and the JSON library around the core
//! control loop and provides the `jukebox` command-line interface.

pub mod adapters;
mod cli;
mod config;
mod observe;
mod run;
pub mod wiring;

pub use cli::Cli;
pub use config::{
    Config, ConfigError, PlayerKind, ReaderKind, Timing, default_library_path,
    deprecated_env_in_use,
};
pub use observe::TracingObserver;
pub use run::run_loop;
pub use wiring::{Jukebox, build_jukebox};
