//! Strategy that takes as much as the current maximum allows.

use super::{Strategy, StrategyError};
use crate::protocol::{GameParameters, Move, TurnStatus};
use tracing::debug;

/// Removes `min(current_max, stones_left)` stones, never resets.
///
/// Before any status has arrived the pile and limit come from the game
/// parameters.
#[derive(Debug, Clone)]
pub struct Greedy {
    name: String,
}

impl Greedy {
    /// Creates the strategy.
    pub fn new() -> Self {
        Self {
            name: "greedy".to_string(),
        }
    }

    /// Stones this strategy removes given the pile and the current limit.
    pub fn take(stones_left: u32, current_max: u32) -> u32 {
        stones_left.min(current_max).max(1)
    }
}

impl Default for Greedy {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Strategy for Greedy {
    async fn decide(
        &mut self,
        params: &GameParameters,
        last: Option<&TurnStatus>,
    ) -> Result<Move, StrategyError> {
        let (stones_left, current_max) = match last {
            Some(status) => (status.stones_left, status.current_max),
            None => (params.init_stones(), params.init_max()),
        };
        let num_stones = Self::take(stones_left, current_max);
        debug!(strategy = %self.name, stones_left, current_max, num_stones, "Greedy pick");
        Ok(Move::new(num_stones, false))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
