//! Participant session: handshake plus the turn-state machine.

use crate::config::Endpoint;
use crate::error::{ConnectionError, ProtocolViolation, SessionError};
use crate::protocol::{
    GameParameters, Hello, MoveRequest, PlayerOrder, Transport, TurnStatus, codec,
};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::{debug, info, instrument, warn};

/// Who this participant is. Fixed for the life of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    name: String,
    order: PlayerOrder,
}

impl Identity {
    /// Player name sent at handshake.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Seat sent at handshake.
    pub fn order(&self) -> PlayerOrder {
        self.order
    }
}

/// Participant-local view of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    /// Game running; the given seat is expected to move next.
    InProgress {
        /// Seat to move.
        to_move: PlayerOrder,
    },
    /// A finished status was observed. Terminal.
    Finished,
    /// The transport failed; the session must not be reused.
    Faulted,
}

/// One participant's connection to the Arbiter.
///
/// Constructing a session performs the handshake, so a `Session` value is
/// always past `AWAITING_HANDSHAKE`. Every operation takes `&mut self`,
/// which keeps at most one request outstanding.
#[derive(Debug)]
pub struct Session<S = TcpStream> {
    identity: Identity,
    params: GameParameters,
    transport: Transport<S>,
    state: TurnState,
}

impl Session<TcpStream> {
    /// Connects to the Arbiter and performs the handshake.
    #[instrument(skip_all, fields(name = %name.as_ref(), %order, %endpoint))]
    pub async fn open(
        name: impl AsRef<str>,
        order: PlayerOrder,
        endpoint: &Endpoint,
    ) -> Result<Self, SessionError> {
        let transport = Self::connect(endpoint).await?;
        Self::handshake(transport, name.as_ref(), order).await
    }

    /// Connects with a custom frame budget and performs the handshake.
    #[instrument(skip_all, fields(name = %name.as_ref(), %order, %endpoint))]
    pub async fn open_with_limit(
        name: impl AsRef<str>,
        order: PlayerOrder,
        endpoint: &Endpoint,
        max_frame_len: usize,
    ) -> Result<Self, SessionError> {
        let transport = Self::connect(endpoint).await?.with_max_frame_len(max_frame_len);
        Self::handshake(transport, name.as_ref(), order).await
    }

    async fn connect(endpoint: &Endpoint) -> Result<Transport<TcpStream>, ConnectionError> {
        info!("Connecting to Arbiter");
        let stream = TcpStream::connect((endpoint.host(), endpoint.port()))
            .await
            .map_err(|e| {
                warn!(error = %e, "Connection failed");
                ConnectionError::from(e)
            })?;
        Ok(Transport::new(stream))
    }
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Sends `{name, order}` over an established transport and reads the
    /// game parameters from the single reply.
    #[instrument(skip_all, fields(name = %name.as_ref(), %order))]
    pub async fn handshake(
        mut transport: Transport<S>,
        name: impl AsRef<str>,
        order: PlayerOrder,
    ) -> Result<Self, SessionError> {
        let identity = Identity {
            name: name.as_ref().to_string(),
            order,
        };

        let hello = codec::to_frame(&Hello {
            name: identity.name.clone(),
            order,
        })?;
        transport.send(&hello).await?;

        let reply = transport.receive().await?;
        for field in ["init_stones", "init_resets"] {
            if !reply.contains_key(field) {
                warn!(field, "Handshake reply lacks mandatory field");
                return Err(ProtocolViolation::MissingHandshakeField { field }.into());
            }
        }
        let params: GameParameters = codec::from_frame(reply)?;

        info!(
            init_stones = params.init_stones(),
            init_resets = params.init_resets(),
            init_max = params.init_max(),
            game_time = params.game_time(),
            "Handshake complete"
        );

        Ok(Self {
            identity,
            params,
            transport,
            state: TurnState::InProgress {
                to_move: PlayerOrder::First,
            },
        })
    }

    /// Our name and seat.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Our seat.
    pub fn order(&self) -> PlayerOrder {
        self.identity.order
    }

    /// Parameters received at handshake.
    pub fn params(&self) -> &GameParameters {
        &self.params
    }

    /// Current state of the turn machine.
    pub fn state(&self) -> TurnState {
        self.state
    }

    /// Seat expected to move next; `None` once the game is over.
    pub fn current_player(&self) -> Option<PlayerOrder> {
        match self.state {
            TurnState::InProgress { to_move } => Some(to_move),
            TurnState::Finished | TurnState::Faulted => None,
        }
    }

    /// Whether we are expected to move next.
    pub fn is_my_turn(&self) -> bool {
        self.current_player() == Some(self.identity.order)
    }

    /// Whether a finished status has been observed.
    pub fn is_finished(&self) -> bool {
        self.state == TurnState::Finished
    }

    /// Sends our move and returns the status that results from it.
    ///
    /// Only valid while it is our turn.
    #[instrument(skip(self), fields(order = %self.identity.order))]
    pub async fn send_move(
        &mut self,
        num_stones: u32,
        reset: bool,
    ) -> Result<TurnStatus, SessionError> {
        let order = self.identity.order;
        match self.state {
            TurnState::InProgress { to_move } if to_move == order => {}
            TurnState::InProgress { to_move } => {
                warn!(expected = %to_move, "Move attempted out of turn");
                return Err(ProtocolViolation::NotYourTurn { expected: to_move }.into());
            }
            _ => return Err(self.closed_state_violation().into()),
        }
        if num_stones == 0 {
            return Err(ProtocolViolation::EmptyMove.into());
        }

        let request = codec::to_frame(&MoveRequest {
            order,
            num_stones,
            reset,
        })?;
        let result = self.exchange(Some(request)).await;
        let status = self.observe(result, order.opponent())?;
        info!(
            num_stones,
            reset,
            stones_left = status.stones_left,
            finished = status.finished,
            "Move played"
        );
        Ok(status)
    }

    /// Waits for the opponent's move and returns the resulting status.
    #[instrument(skip(self), fields(order = %self.identity.order))]
    pub async fn receive_move(&mut self) -> Result<TurnStatus, SessionError> {
        let order = self.identity.order;
        match self.state {
            TurnState::InProgress { to_move } if to_move != order => {}
            TurnState::InProgress { .. } => {
                warn!("Waiting for opponent while our own move is due");
                return Err(ProtocolViolation::AwaitingOwnMove { order }.into());
            }
            _ => return Err(self.closed_state_violation().into()),
        }

        let result = self.exchange(None).await;
        let status = self.observe(result, order)?;
        info!(
            stones_removed = status.stones_removed,
            reset_used = status.reset_used,
            stones_left = status.stones_left,
            finished = status.finished,
            "Opponent moved"
        );
        Ok(status)
    }

    /// Releases the connection. Idempotent.
    #[instrument(skip(self), fields(order = %self.identity.order))]
    pub async fn close(&mut self) {
        self.transport.close().await;
    }

    async fn exchange(&mut self, request: Option<codec::Frame>) -> Result<TurnStatus, ConnectionError> {
        if let Some(frame) = request {
            self.transport.send(&frame).await?;
        }
        let reply = self.transport.receive().await?;
        codec::from_frame(reply)
    }

    /// Applies a received status to the turn machine.
    fn observe(
        &mut self,
        result: Result<TurnStatus, ConnectionError>,
        next_if_running: PlayerOrder,
    ) -> Result<TurnStatus, SessionError> {
        match result {
            Ok(status) => {
                self.state = if status.finished {
                    info!(winner = ?status.winner, reason = ?status.reason, "Game finished");
                    TurnState::Finished
                } else {
                    TurnState::InProgress {
                        to_move: next_if_running,
                    }
                };
                debug!(state = ?self.state, "Turn state updated");
                Ok(status)
            }
            Err(e) => {
                warn!(error = %e, "Session faulted");
                self.state = TurnState::Faulted;
                Err(e.into())
            }
        }
    }

    fn closed_state_violation(&self) -> ProtocolViolation {
        match self.state {
            TurnState::Faulted => ProtocolViolation::SessionFaulted,
            _ => ProtocolViolation::GameFinished,
        }
    }
}
