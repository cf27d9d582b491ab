//! Command-line interface for expanding_nim.

use clap::{Args, Parser, Subcommand};
use expanding_nim::{ClientConfig, ConfigError, Endpoint, StrategyKind};
use std::path::PathBuf;
use tracing::{debug, instrument};

/// Expanding Nim - participant client
#[derive(Parser, Debug)]
#[command(name = "expanding_nim")]
#[command(about = "Play Expanding Nim against an Arbiter", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Connect to the Arbiter and play one game
    Play(PlayerArgs),

    /// Print the resolved configuration as TOML
    ShowConfig(PlayerArgs),
}

/// Options shared by every command that needs a player configuration.
#[derive(Args, Debug, Clone)]
pub struct PlayerArgs {
    /// Player name
    #[arg(short, long)]
    pub name: Option<String>,

    /// Take the first move
    #[arg(short = 'f', long)]
    pub first: bool,

    /// Move selection: human, always-one or greedy
    #[arg(short, long)]
    pub strategy: Option<StrategyKind>,

    /// Path to a TOML config file; command-line options override it
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Invalid inputs tolerated per move (human strategy)
    #[arg(long)]
    pub max_input_attempts: Option<usize>,

    /// Arbiter address as host:port (port defaults to 9000)
    pub endpoint: Option<Endpoint>,
}

impl PlayerArgs {
    /// Merges the config file, if any, with the command-line overrides.
    #[instrument(skip(self))]
    pub fn resolve(&self) -> Result<ClientConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::from_file(path)?,
            None => {
                let name = self.name.clone().ok_or_else(|| {
                    ConfigError::new("A player name is required (-n NAME)".to_string())
                })?;
                let endpoint = self.endpoint.clone().ok_or_else(|| {
                    ConfigError::new("An Arbiter endpoint is required (HOST:PORT)".to_string())
                })?;
                ClientConfig::new(name, endpoint)
            }
        };

        if let Some(name) = &self.name {
            config = config.with_name(name.clone());
        }
        if let Some(endpoint) = &self.endpoint {
            config = config.with_endpoint(endpoint.clone());
        }
        if self.first {
            config = config.with_goes_first(true);
        }
        if let Some(strategy) = self.strategy {
            config = config.with_strategy(strategy);
        }
        if let Some(attempts) = self.max_input_attempts {
            config = config.with_max_input_attempts(attempts);
        }

        config.validate()?;
        debug!(?config, "Resolved configuration");
        Ok(config)
    }
}
