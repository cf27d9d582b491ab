//! Human player that types moves on a line-oriented input.

use super::{Strategy, StrategyError};
use crate::protocol::{GameParameters, Move, TurnStatus};
use derive_more::{Display, Error};
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout,
};
use tracing::{debug, info, warn};

const PROMPT: &str = "Please enter your move: ";

/// Why a line of input is not a move.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum InputError {
    /// Nothing but whitespace.
    #[display("No move entered")]
    Empty,

    /// Stone count is not a number.
    #[display("`{token}` is not a stone count")]
    BadStones {
        /// Offending token.
        #[error(not(source))]
        token: String,
    },

    /// Stone count is zero.
    #[display("A move must remove at least one stone")]
    ZeroStones,

    /// Reset flag is not an integer.
    #[display("`{token}` is not a reset flag (use 0 or 1)")]
    BadReset {
        /// Offending token.
        #[error(not(source))]
        token: String,
    },

    /// More than two tokens.
    #[display("Expected `<stones> [reset]`, got extra input `{extra}`")]
    TrailingInput {
        /// First unexpected token.
        #[error(not(source))]
        extra: String,
    },
}

/// Parses `<stones> [reset]`.
///
/// The reset flag is an integer, non-zero meaning "use a reset". When it is
/// left out no reset is used.
pub fn parse_move(line: &str) -> Result<Move, InputError> {
    let mut tokens = line.split_whitespace();
    let stones = tokens.next().ok_or(InputError::Empty)?;
    let num_stones: u32 = stones.parse().map_err(|_| InputError::BadStones {
        token: stones.to_string(),
    })?;
    if num_stones == 0 {
        return Err(InputError::ZeroStones);
    }

    let reset = match tokens.next() {
        Some(flag) => {
            flag.parse::<i64>().map_err(|_| InputError::BadReset {
                token: flag.to_string(),
            })? != 0
        }
        None => false,
    };

    if let Some(extra) = tokens.next() {
        return Err(InputError::TrailingInput {
            extra: extra.to_string(),
        });
    }
    Ok(Move::new(num_stones, reset))
}

/// Prompts on `output` and reads moves from `input`.
///
/// Bad lines are answered with a short complaint and a fresh prompt, up to
/// `max_attempts` lines per move.
pub struct HumanStrategy<R, W> {
    name: String,
    input: R,
    output: W,
    max_attempts: usize,
}

impl HumanStrategy<BufReader<Stdin>, Stdout> {
    /// Human at the terminal.
    pub fn stdio(max_attempts: usize) -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout(), max_attempts)
    }
}

impl<R, W> HumanStrategy<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// Creates a human strategy over arbitrary streams.
    pub fn new(input: R, output: W, max_attempts: usize) -> Self {
        Self {
            name: "human".to_string(),
            input,
            output,
            max_attempts: max_attempts.max(1),
        }
    }

    async fn prompt(&mut self, text: &str) -> Result<(), StrategyError> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.flush().await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl<R, W> Strategy for HumanStrategy<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn decide(
        &mut self,
        _params: &GameParameters,
        _last: Option<&TurnStatus>,
    ) -> Result<Move, StrategyError> {
        for attempt in 1..=self.max_attempts {
            self.prompt(PROMPT).await?;

            let mut line = String::new();
            if self.input.read_line(&mut line).await? == 0 {
                warn!("Input closed while waiting for a move");
                return Err(StrategyError::new("Input closed before a move was entered"));
            }

            match parse_move(&line) {
                Ok(mv) => {
                    info!(attempt, %mv, "Move entered");
                    return Ok(mv);
                }
                Err(e) => {
                    debug!(attempt, error = %e, line = line.trim_end(), "Rejected input");
                    self.prompt(&format!("Invalid move string: {e}\n")).await?;
                }
            }
        }

        warn!(max_attempts = self.max_attempts, "Too many invalid moves");
        Err(StrategyError::new(format!(
            "No valid move after {} attempts",
            self.max_attempts
        )))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
