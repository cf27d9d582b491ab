//! Game loop between a strategy and a session.

use crate::error::SessionError;
use crate::protocol::{GameParameters, Outcome, PlayerOrder, TurnStatus};
use crate::session::Session;
use crate::strategy::{Strategy, StrategyError};
use derive_more::{Display, Error};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

/// Whose move a status reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mover {
    /// This participant.
    Me,
    /// The other participant.
    Opponent,
}

/// Final result as seen by this participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameOutcome {
    /// Verdict from the Arbiter.
    pub outcome: Outcome,
    /// Our seat.
    pub me: PlayerOrder,
}

impl GameOutcome {
    /// Whether we won.
    pub fn won(&self) -> bool {
        self.outcome.winner == self.me
    }
}

/// Messages sent from the driver to whoever renders the game.
#[derive(Debug, Clone)]
pub enum GameEvent {
    /// Handshake done, loop about to start.
    Started {
        /// Our name.
        name: String,
        /// Our seat.
        order: PlayerOrder,
        /// Parameters from the Arbiter.
        params: GameParameters,
    },
    /// Strategy is choosing a move.
    Thinking {
        /// Strategy name.
        strategy: String,
    },
    /// A move was played.
    MovePlayed {
        /// Who played it.
        mover: Mover,
        /// Resulting status.
        status: TurnStatus,
    },
    /// Game ended.
    GameOver(GameOutcome),
}

/// Why the loop stopped without an outcome.
#[derive(Debug, Display, Error)]
pub enum DriverError {
    /// Session failed or was misused.
    #[display("{}", _0)]
    Session(SessionError),
    /// Strategy could not produce a move.
    #[display("{}", _0)]
    Strategy(StrategyError),
}

impl From<SessionError> for DriverError {
    fn from(err: SessionError) -> Self {
        DriverError::Session(err)
    }
}

impl From<StrategyError> for DriverError {
    fn from(err: StrategyError) -> Self {
        DriverError::Strategy(err)
    }
}

/// Plays one game: waits on the Arbiter when the opponent is due, asks the
/// strategy when we are.
pub struct Driver<S> {
    session: Session<S>,
    strategy: Box<dyn Strategy>,
    event_tx: Option<mpsc::UnboundedSender<GameEvent>>,
}

impl<S> Driver<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a driver.
    pub fn new(session: Session<S>, strategy: Box<dyn Strategy>) -> Self {
        Self {
            session,
            strategy,
            event_tx: None,
        }
    }

    /// Reports progress on `event_tx`.
    pub fn with_events(mut self, event_tx: mpsc::UnboundedSender<GameEvent>) -> Self {
        self.event_tx = Some(event_tx);
        self
    }

    /// Runs the game to completion and closes the session.
    ///
    /// The session is closed on every exit path.
    #[instrument(skip(self), fields(order = %self.session.order(), strategy = self.strategy.name()))]
    pub async fn run(mut self) -> Result<GameOutcome, DriverError> {
        info!("Starting game loop");
        let result = self.play().await;
        self.session.close().await;
        match &result {
            Ok(outcome) => info!(winner = %outcome.outcome.winner, won = outcome.won(), "Game loop finished"),
            Err(e) => warn!(error = %e, "Game loop aborted"),
        }
        result
    }

    async fn play(&mut self) -> Result<GameOutcome, DriverError> {
        self.emit(GameEvent::Started {
            name: self.session.identity().name().to_string(),
            order: self.session.order(),
            params: *self.session.params(),
        });

        let mut last: Option<TurnStatus> = None;
        loop {
            let (mover, status) = if self.session.is_my_turn() {
                self.emit(GameEvent::Thinking {
                    strategy: self.strategy.name().to_string(),
                });
                let mv = self
                    .strategy
                    .decide(self.session.params(), last.as_ref())
                    .await?;
                debug!(%mv, "Strategy chose move");
                let status = self.session.send_move(mv.num_stones, mv.reset).await?;
                (Mover::Me, status)
            } else {
                debug!("Waiting for opponent");
                let status = self.session.receive_move().await?;
                (Mover::Opponent, status)
            };

            self.emit(GameEvent::MovePlayed {
                mover,
                status: status.clone(),
            });

            // Finished statuses without a winner never leave the session.
            if let Some(verdict) = status.outcome() {
                let outcome = GameOutcome {
                    outcome: verdict,
                    me: self.session.order(),
                };
                self.emit(GameEvent::GameOver(outcome.clone()));
                return Ok(outcome);
            }
            last = Some(status);
        }
    }

    fn emit(&self, event: GameEvent) {
        if let Some(tx) = &self.event_tx {
            if tx.send(event).is_err() {
                debug!("Event receiver dropped");
            }
        }
    }
}
