//! Strategy trait and implementations.

mod always_one;
mod greedy;
mod human;

pub use always_one::AlwaysOne;
pub use greedy::Greedy;
pub use human::{HumanStrategy, InputError, parse_move};

use crate::protocol::{GameParameters, Move, TurnStatus};
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString};
use tracing::instrument;

/// Trait for anything that can choose a move.
#[async_trait::async_trait]
pub trait Strategy: Send {
    /// Picks the next move.
    ///
    /// `last` is the most recent status, or `None` on the opening move.
    async fn decide(
        &mut self,
        params: &GameParameters,
        last: Option<&TurnStatus>,
    ) -> Result<Move, StrategyError>;

    /// Returns the strategy's display name.
    fn name(&self) -> &str;
}

/// Strategies selectable from the command line or config file.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// Read moves from standard input.
    #[default]
    Human,
    /// Always take one stone, never reset.
    AlwaysOne,
    /// Take as many stones as allowed.
    Greedy,
}

impl StrategyKind {
    /// Instantiates the strategy. `max_input_attempts` only matters for `Human`.
    #[instrument]
    pub fn build(self, max_input_attempts: usize) -> Box<dyn Strategy> {
        match self {
            StrategyKind::Human => Box::new(HumanStrategy::stdio(max_input_attempts)),
            StrategyKind::AlwaysOne => Box::new(AlwaysOne::new()),
            StrategyKind::Greedy => Box::new(Greedy::new()),
        }
    }
}

/// A strategy could not produce a move.
#[derive(Debug, Clone, Display, Error)]
#[display("Strategy error: {} at {}:{}", message, file, line)]
pub struct StrategyError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl StrategyError {
    /// Creates a new strategy error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

impl From<std::io::Error> for StrategyError {
    #[track_caller]
    fn from(err: std::io::Error) -> Self {
        Self::new(format!("Input error: {}", err))
    }
}
