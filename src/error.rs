//! Error types for the session protocol.

use crate::protocol::PlayerOrder;
use derive_more::{Display, Error, From};
use tracing::instrument;

/// The concrete failure behind a [`ConnectionError`].
#[derive(Debug, Display, Error)]
pub enum ConnectionErrorKind {
    /// Reading from or writing to the stream failed.
    #[display("I/O failure: {}", _0)]
    Io(std::io::Error),

    /// Bytes were not valid JSON, or a field had the wrong type.
    #[display("Malformed frame: {}", _0)]
    Json(serde_json::Error),

    /// Frame decoded to something other than a JSON object.
    #[display("Frame is not a field mapping")]
    NotAnObject,

    /// Frame carried an array or object value.
    #[display("Field `{field}` is not a scalar")]
    NestedField {
        /// Offending field name.
        #[error(not(source))]
        field: String,
    },

    /// Frame did not complete within the byte budget.
    #[display("Frame exceeds {limit} bytes")]
    FrameTooLarge {
        /// Maximum frame length in bytes.
        #[error(not(source))]
        limit: usize,
    },

    /// Peer closed the stream in the middle of a frame.
    #[display("Stream ended after {bytes} bytes of an incomplete frame")]
    Truncated {
        /// Bytes received before end of stream.
        #[error(not(source))]
        bytes: usize,
    },

    /// Peer closed the stream, or the transport was already released.
    #[display("Connection closed")]
    Closed,
}

/// Transport or decode failure, normalized for the session layer.
#[derive(Debug, Display, Error)]
#[display("Connection error: {} at {}:{}", kind, file, line)]
pub struct ConnectionError {
    /// What went wrong.
    #[error(source)]
    pub kind: ConnectionErrorKind,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConnectionError {
    /// Creates a new connection error with caller location tracking.
    #[track_caller]
    #[instrument(skip(kind))]
    pub fn new(kind: ConnectionErrorKind) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// Returns the underlying failure.
    pub fn kind(&self) -> &ConnectionErrorKind {
        &self.kind
    }
}

impl From<std::io::Error> for ConnectionError {
    #[track_caller]
    fn from(err: std::io::Error) -> Self {
        Self::new(ConnectionErrorKind::Io(err))
    }
}

impl From<serde_json::Error> for ConnectionError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        Self::new(ConnectionErrorKind::Json(err))
    }
}

impl From<ConnectionErrorKind> for ConnectionError {
    #[track_caller]
    fn from(kind: ConnectionErrorKind) -> Self {
        Self::new(kind)
    }
}

/// A session operation was invoked in a state that does not allow it.
///
/// These are caller bugs or Arbiter contract breaches. They are raised
/// before any I/O happens.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum ProtocolViolation {
    /// `send_move` while the opponent is to move.
    #[display("Not your turn: waiting for {expected}")]
    NotYourTurn {
        /// Player whose move is expected.
        #[error(not(source))]
        expected: PlayerOrder,
    },

    /// `receive_move` while we are to move; the read would never complete.
    #[display("Cannot wait for the opponent: {order} is to move")]
    AwaitingOwnMove {
        /// Our own order.
        #[error(not(source))]
        order: PlayerOrder,
    },

    /// The game has already finished.
    #[display("Game is already over")]
    GameFinished,

    /// A previous transport failure left the session unusable.
    #[display("Session is unusable after a connection failure")]
    SessionFaulted,

    /// A move must remove at least one stone.
    #[display("A move must remove at least one stone")]
    EmptyMove,

    /// The handshake reply lacked a mandatory field.
    #[display("Handshake reply is missing `{field}`")]
    MissingHandshakeField {
        /// Name of the absent field.
        #[error(not(source))]
        field: &'static str,
    },
}

/// Error returned by [`Session`](crate::Session) operations.
#[derive(Debug, Display, Error, From)]
pub enum SessionError {
    /// Transport or decode failure.
    #[display("{}", _0)]
    Connection(ConnectionError),

    /// Operation not allowed in the current state.
    #[display("Protocol violation: {}", _0)]
    Protocol(ProtocolViolation),
}

impl SessionError {
    /// Returns the protocol violation, if that is what this error is.
    pub fn as_violation(&self) -> Option<&ProtocolViolation> {
        match self {
            SessionError::Protocol(violation) => Some(violation),
            SessionError::Connection(_) => None,
        }
    }

    /// Returns the connection error, if that is what this error is.
    pub fn as_connection(&self) -> Option<&ConnectionError> {
        match self {
            SessionError::Connection(err) => Some(err),
            SessionError::Protocol(_) => None,
        }
    }
}
