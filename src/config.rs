//! Client configuration: who to play as, where, and with which strategy.

use crate::protocol::{DEFAULT_MAX_FRAME_LEN, PlayerOrder};
use crate::strategy::StrategyKind;
use derive_getters::Getters;
use derive_more::{Display, Error};
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, instrument};

/// Port the Arbiter listens on unless told otherwise.
pub const DEFAULT_PORT: u16 = 9000;

/// Address of the Arbiter, written `host:port`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    /// Creates an endpoint.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Host name or IP address.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// TCP port.
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl FromStr for Endpoint {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (host, port) = match s.rsplit_once(':') {
            // Bracketed IPv6, with or without a port.
            _ if s.starts_with('[') => match s[1..].split_once(']') {
                Some((host, "")) => (host, None),
                Some((host, rest)) => match rest.strip_prefix(':') {
                    Some(port) => (host, Some(port)),
                    None => return Err(ConfigError::new(format!("Invalid endpoint `{s}`"))),
                },
                None => return Err(ConfigError::new(format!("Invalid endpoint `{s}`"))),
            },
            Some((host, port)) => (host, Some(port)),
            None => (s, None),
        };

        if host.is_empty() {
            return Err(ConfigError::new(format!("Endpoint `{s}` has no host")));
        }
        let port = match port {
            Some(port) => port
                .parse::<u16>()
                .map_err(|e| ConfigError::new(format!("Invalid port in `{s}`: {e}")))?,
            None => DEFAULT_PORT,
        };
        Ok(Self::new(host, port))
    }
}

impl TryFrom<String> for Endpoint {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Endpoint> for String {
    fn from(endpoint: Endpoint) -> Self {
        endpoint.to_string()
    }
}

/// Everything the CLI needs to join a game.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Setters, Serialize, Deserialize)]
#[setters(prefix = "with_")]
pub struct ClientConfig {
    /// Player name announced at handshake.
    name: String,

    /// Whether this player takes the first move.
    #[serde(default)]
    goes_first: bool,

    /// Arbiter address.
    endpoint: Endpoint,

    /// How moves are chosen.
    #[serde(default)]
    strategy: StrategyKind,

    /// Frame length budget in bytes. Must be non-zero.
    #[serde(default = "default_max_frame_len")]
    #[setters(skip)]
    max_frame_len: usize,

    /// Invalid inputs tolerated per move before the human strategy gives up.
    #[serde(default = "default_max_input_attempts")]
    max_input_attempts: usize,
}

fn default_max_frame_len() -> usize {
    DEFAULT_MAX_FRAME_LEN
}

/// Default re-prompt budget for interactive input.
pub const DEFAULT_MAX_INPUT_ATTEMPTS: usize = 5;

fn default_max_input_attempts() -> usize {
    DEFAULT_MAX_INPUT_ATTEMPTS
}

impl ClientConfig {
    /// Creates a configuration with defaults for everything but name and endpoint.
    #[instrument(skip(name), fields(player_name = %name))]
    pub fn new(name: String, endpoint: Endpoint) -> Self {
        Self {
            name,
            goes_first: false,
            endpoint,
            strategy: StrategyKind::default(),
            max_frame_len: default_max_frame_len(),
            max_input_attempts: default_max_input_attempts(),
        }
    }

    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        config.validate()?;

        info!(player_name = %config.name, endpoint = %config.endpoint, "Config loaded successfully");
        Ok(config)
    }

    /// Sets the frame length budget, refusing zero.
    pub fn with_max_frame_len(mut self, max_frame_len: usize) -> Result<Self, ConfigError> {
        self.max_frame_len = max_frame_len;
        self.validate()?;
        Ok(self)
    }

    /// Checks the limits no game could be played with.
    #[instrument(skip(self))]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_frame_len == 0 {
            return Err(ConfigError::new(
                "max_frame_len must be greater than zero".to_string(),
            ));
        }
        if self.max_input_attempts == 0 {
            return Err(ConfigError::new(
                "max_input_attempts must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Renders the configuration as TOML.
    #[instrument(skip(self))]
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string(self)
            .map_err(|e| ConfigError::new(format!("Failed to render config: {}", e)))
    }

    /// Seat derived from `goes_first`.
    pub fn order(&self) -> PlayerOrder {
        PlayerOrder::from_goes_first(self.goes_first)
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
