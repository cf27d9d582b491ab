//! Strategy that always removes a single stone.

use super::{Strategy, StrategyError};
use crate::protocol::{GameParameters, Move, TurnStatus};
use tracing::debug;

/// Takes one stone every turn and never resets.
#[derive(Debug, Clone)]
pub struct AlwaysOne {
    name: String,
}

impl AlwaysOne {
    /// Creates the strategy.
    pub fn new() -> Self {
        Self {
            name: "always-one".to_string(),
        }
    }
}

impl Default for AlwaysOne {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Strategy for AlwaysOne {
    async fn decide(
        &mut self,
        _params: &GameParameters,
        _last: Option<&TurnStatus>,
    ) -> Result<Move, StrategyError> {
        debug!(strategy = %self.name, "Taking one stone");
        Ok(Move::new(1, false))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
