//! Expanding Nim participant client.
//!
//! Connects to an Arbiter, performs the handshake and plays one game of
//! Expanding Nim with a pluggable strategy.
//!
//! # Architecture
//!
//! - **Protocol**: back-to-back JSON frames over a bounded reader
//! - **Session**: handshake and the turn-state machine
//! - **Strategy**: human input or algorithmic move selection
//! - **Driver**: loop alternating between the Arbiter and the strategy
//!
//! # Example
//!
//! ```no_run
//! use expanding_nim::{Driver, Endpoint, PlayerOrder, Session, StrategyKind};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let endpoint: Endpoint = "localhost:9000".parse()?;
//! let session = Session::open("Alice", PlayerOrder::First, &endpoint).await?;
//! let outcome = Driver::new(session, StrategyKind::Greedy.build(5)).run().await?;
//! println!("{}", outcome.outcome.reason);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod config;
mod driver;
mod error;
mod session;
mod strategy;

pub mod protocol;

// Crate-level exports - Configuration
pub use config::{ClientConfig, ConfigError, DEFAULT_MAX_INPUT_ATTEMPTS, DEFAULT_PORT, Endpoint};

// Crate-level exports - Errors
pub use error::{ConnectionError, ConnectionErrorKind, ProtocolViolation, SessionError};

// Crate-level exports - Session
pub use session::{Identity, Session, TurnState};

// Crate-level exports - Strategies
pub use strategy::{
    AlwaysOne, Greedy, HumanStrategy, InputError, Strategy, StrategyError, StrategyKind,
    parse_move,
};

// Crate-level exports - Driver
pub use driver::{Driver, DriverError, GameEvent, GameOutcome, Mover};

// Crate-level exports - Protocol types
pub use protocol::{
    DEFAULT_GAME_TIME, DEFAULT_INIT_MAX, DEFAULT_MAX_FRAME_LEN, GameParameters, Move, Outcome,
    PlayerOrder, Transport, TurnStatus,
};
