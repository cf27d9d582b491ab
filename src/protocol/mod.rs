//! Participant ⇄ Arbiter wire protocol.

pub mod codec;
mod transport;
mod types;

pub use codec::Frame;
pub use transport::{DEFAULT_MAX_FRAME_LEN, Transport};
pub use types::{
    DEFAULT_GAME_TIME, DEFAULT_INIT_MAX, GameParameters, IncompleteStatus, InvalidOrder, Move,
    Outcome, PlayerOrder, TurnStatus,
};
pub(crate) use types::{Hello, MoveRequest};
