use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use jb_cli::{Cli, Config, Jukebox, build_jukebox, deprecated_env_in_use, run_loop};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config =
        Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    cli.apply_overrides(&mut config);

    // Initialize tracing with verbose flag support
    let filter = if config.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Logs go to stderr so the dry-run player transcript stays clean on stdout
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    for (old, new) in deprecated_env_in_use() {
        tracing::warn!("the {old} environment variable is deprecated, use {new} instead");
    }
    tracing::debug!(?config, "loaded configuration");

    let Jukebox {
        mut reader,
        mut handler,
    } = build_jukebox(&config)?;

    run_loop(&mut *reader, &mut handler, cli.max_ticks, std::thread::sleep);
    Ok(())
}
