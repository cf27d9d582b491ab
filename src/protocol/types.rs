//! Wire-level domain types for Expanding Nim.

use derive_more::{Display, Error};
use derive_new::new;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::instrument;

/// Seat of a participant. The first player moves at game start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PlayerOrder {
    /// Order 0, moves first.
    First,
    /// Order 1, moves second.
    Second,
}

impl PlayerOrder {
    /// Picks the order from a "goes first" flag.
    pub fn from_goes_first(goes_first: bool) -> Self {
        if goes_first {
            PlayerOrder::First
        } else {
            PlayerOrder::Second
        }
    }

    /// Returns the other seat.
    pub fn opponent(self) -> Self {
        match self {
            PlayerOrder::First => PlayerOrder::Second,
            PlayerOrder::Second => PlayerOrder::First,
        }
    }

    /// Wire value (0 or 1).
    pub fn index(self) -> u8 {
        match self {
            PlayerOrder::First => 0,
            PlayerOrder::Second => 1,
        }
    }
}

impl std::fmt::Display for PlayerOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "player {}", self.index() + 1)
    }
}

/// Wire value outside `0..=1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
#[display("Invalid player order {value}, expected 0 or 1")]
pub struct InvalidOrder {
    /// Value received.
    #[error(not(source))]
    pub value: u8,
}

impl TryFrom<u8> for PlayerOrder {
    type Error = InvalidOrder;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PlayerOrder::First),
            1 => Ok(PlayerOrder::Second),
            value => Err(InvalidOrder { value }),
        }
    }
}

impl From<PlayerOrder> for u8 {
    fn from(order: PlayerOrder) -> Self {
        order.index()
    }
}

/// Initial stone count, reset budget and clock, fixed at handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameParameters {
    #[serde(deserialize_with = "positive")]
    init_stones: u32,
    init_resets: u32,
    #[serde(default = "default_init_max", deserialize_with = "positive")]
    init_max: u32,
    #[serde(default = "default_game_time", deserialize_with = "positive")]
    game_time: u64,
}

/// Default initial maximum take when the Arbiter omits it.
pub const DEFAULT_INIT_MAX: u32 = 3;

/// Default per-player time budget in seconds when the Arbiter omits it.
pub const DEFAULT_GAME_TIME: u64 = 120;

fn default_init_max() -> u32 {
    DEFAULT_INIT_MAX
}

fn default_game_time() -> u64 {
    DEFAULT_GAME_TIME
}

/// Rejects zero for counts that must be strictly positive.
fn positive<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default + PartialEq,
{
    let value = T::deserialize(deserializer)?;
    if value == T::default() {
        return Err(serde::de::Error::custom("must be greater than zero"));
    }
    Ok(value)
}

impl GameParameters {
    /// Creates game parameters.
    #[instrument]
    pub fn new(init_stones: u32, init_resets: u32, init_max: u32, game_time: u64) -> Self {
        Self {
            init_stones,
            init_resets,
            init_max,
            game_time,
        }
    }

    /// Stones on the table at game start.
    pub fn init_stones(&self) -> u32 {
        self.init_stones
    }

    /// Resets each player may use.
    pub fn init_resets(&self) -> u32 {
        self.init_resets
    }

    /// Maximum stones removable on the first move.
    pub fn init_max(&self) -> u32 {
        self.init_max
    }

    /// Per-player time budget in seconds.
    pub fn game_time(&self) -> u64 {
        self.game_time
    }
}

/// One player action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, new)]
pub struct Move {
    /// Stones to remove.
    pub num_stones: u32,
    /// Whether to spend a reset.
    pub reset: bool,
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "take {}", self.num_stones)?;
        if self.reset {
            write!(f, " with reset")?;
        }
        Ok(())
    }
}

/// First frame a participant sends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Hello {
    pub name: String,
    pub order: PlayerOrder,
}

/// Frame carrying a move to the Arbiter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct MoveRequest {
    pub order: PlayerOrder,
    pub num_stones: u32,
    pub reset: bool,
}

/// End-of-game verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    /// Winning seat.
    pub winner: PlayerOrder,
    /// Arbiter's explanation.
    pub reason: String,
}

/// Authoritative game state after a move, ours or the opponent's.
///
/// `winner` and `reason` are set exactly when `finished` is true. A finished
/// status may omit the counters on the wire; they read as zero then.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireTurnStatus", into = "WireTurnStatus")]
pub struct TurnStatus {
    /// Whether the game is over.
    pub finished: bool,
    /// Stones remaining.
    pub stones_left: u32,
    /// Maximum stones the next move may remove.
    pub current_max: u32,
    /// Whether the move used a reset.
    pub reset_used: bool,
    /// Stones the move removed.
    pub stones_removed: u32,
    /// Winning seat, when finished.
    pub winner: Option<PlayerOrder>,
    /// Why the game ended, when finished.
    pub reason: Option<String>,
}

impl TurnStatus {
    /// Builds the status of a game still in progress.
    pub fn in_progress(
        stones_left: u32,
        current_max: u32,
        reset_used: bool,
        stones_removed: u32,
    ) -> Self {
        Self {
            finished: false,
            stones_left,
            current_max,
            reset_used,
            stones_removed,
            winner: None,
            reason: None,
        }
    }

    /// Builds a terminal status.
    pub fn game_over(stones_left: u32, winner: PlayerOrder, reason: impl Into<String>) -> Self {
        Self {
            finished: true,
            stones_left,
            current_max: 0,
            reset_used: false,
            stones_removed: 0,
            winner: Some(winner),
            reason: Some(reason.into()),
        }
    }

    /// Verdict, if the game is over.
    pub fn outcome(&self) -> Option<Outcome> {
        if !self.finished {
            return None;
        }
        let winner = self.winner?;
        Some(Outcome {
            winner,
            reason: self.reason.clone().unwrap_or_default(),
        })
    }
}

/// Status as it travels on the wire, every field optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireTurnStatus {
    finished: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    stones_left: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    current_max: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reset_used: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    stones_removed: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    winner: Option<PlayerOrder>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

/// A status frame lacked a field its `finished` flag requires.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("Turn status with finished={finished} is missing `{field}`")]
pub struct IncompleteStatus {
    /// Value of the `finished` flag.
    #[error(not(source))]
    pub finished: bool,
    /// Missing field.
    #[error(not(source))]
    pub field: &'static str,
}

fn require<T>(value: Option<T>, finished: bool, field: &'static str) -> Result<T, IncompleteStatus> {
    value.ok_or(IncompleteStatus { finished, field })
}

impl TryFrom<WireTurnStatus> for TurnStatus {
    type Error = IncompleteStatus;

    fn try_from(wire: WireTurnStatus) -> Result<Self, Self::Error> {
        if wire.finished {
            Ok(Self {
                finished: true,
                stones_left: wire.stones_left.unwrap_or_default(),
                current_max: wire.current_max.unwrap_or_default(),
                reset_used: wire.reset_used.unwrap_or_default(),
                stones_removed: wire.stones_removed.unwrap_or_default(),
                winner: Some(require(wire.winner, true, "winner")?),
                reason: Some(require(wire.reason, true, "reason")?),
            })
        } else {
            // Verdict fields only exist on finished statuses.
            Ok(Self::in_progress(
                require(wire.stones_left, false, "stones_left")?,
                require(wire.current_max, false, "current_max")?,
                require(wire.reset_used, false, "reset_used")?,
                require(wire.stones_removed, false, "stones_removed")?,
            ))
        }
    }
}

impl From<TurnStatus> for WireTurnStatus {
    fn from(status: TurnStatus) -> Self {
        Self {
            finished: status.finished,
            stones_left: Some(status.stones_left),
            current_max: Some(status.current_max),
            reset_used: Some(status.reset_used),
            stones_removed: Some(status.stones_removed),
            winner: status.winner,
            reason: status.reason,
        }
    }
}
