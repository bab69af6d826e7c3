mod cli;
mod display;
mod error;

use std::path::Path;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, RunCommand};
use covidtrack::config::Config;
use error::CovidtrackCliResult;
use log::debug;

const DEFAULT_LOGGING_LEVEL: &str = "warn";

#[tokio::main]
async fn main() -> Result<()> {
    // Set RUST_LOG to `DEFAULT_LOGGING_LEVEL` if not set
    let _ =
        std::env::var("RUST_LOG").map_err(|_| std::env::set_var("RUST_LOG", DEFAULT_LOGGING_LEVEL));
    pretty_env_logger::init_timed();
    let args = Cli::parse();
    debug!("args: {args:?}");
    let config = read_config()?;
    debug!("config: {config:?}");

    if let Some(command) = args.command {
        command.run(config).await?;
    }
    Ok(())
}

/// Linux: ~/.config/covidtrack/config.toml, macOS: ~/Library/Application Support/covidtrack/config.toml
fn read_config() -> CovidtrackCliResult<Config> {
    match dirs::config_dir() {
        Some(dir) => read_config_from_toml(dir.join("covidtrack").join("config.toml")),
        None => Ok(Config::default()),
    }
}

fn read_config_from_toml(file_path: impl AsRef<Path>) -> CovidtrackCliResult<Config> {
    match std::fs::read_to_string(file_path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Config::default()),
        Err(e) => Err(e.into()),
    }
}
