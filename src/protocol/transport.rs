//! Framed stream delimited by JSON value boundaries.

use super::codec::{self, Frame};
use crate::error::{ConnectionError, ConnectionErrorKind};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, instrument, trace, warn};

/// Largest frame accepted by default, in bytes.
pub const DEFAULT_MAX_FRAME_LEN: usize = 1024;

const TRAILER: u8 = b'\n';

/// Framed connection to the Arbiter.
///
/// The Arbiter writes bare JSON objects with no length prefix or delimiter,
/// so a frame ends where its closing brace ends. Bytes past that point stay
/// buffered for the next frame. Whitespace between objects is skipped, which
/// keeps line-oriented peers working too. Outgoing frames carry a trailing
/// `\n`, which any JSON reader treats as whitespace.
#[derive(Debug)]
pub struct Transport<S> {
    stream: Option<BufReader<S>>,
    pending: Vec<u8>,
    max_frame_len: usize,
}

impl<S> Transport<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps a connected stream.
    pub fn new(stream: S) -> Self {
        Self {
            stream: Some(BufReader::new(stream)),
            pending: Vec::new(),
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }

    /// Sets the frame length budget.
    pub fn with_max_frame_len(mut self, max_frame_len: usize) -> Self {
        self.max_frame_len = max_frame_len;
        self
    }

    /// Frame length budget in bytes.
    pub fn max_frame_len(&self) -> usize {
        self.max_frame_len
    }

    /// Whether [`close`](Self::close) has released the stream.
    pub fn is_closed(&self) -> bool {
        self.stream.is_none()
    }

    /// Writes one frame.
    #[instrument(skip(self, frame), fields(fields = frame.len()))]
    pub async fn send(&mut self, frame: &Frame) -> Result<(), ConnectionError> {
        let mut bytes = codec::encode(frame)?;
        if bytes.len() > self.max_frame_len {
            warn!(bytes = bytes.len(), limit = self.max_frame_len, "Refusing to send oversize frame");
            return Err(ConnectionError::new(ConnectionErrorKind::FrameTooLarge {
                limit: self.max_frame_len,
            }));
        }
        bytes.push(TRAILER);

        let stream = self.stream_mut()?;
        stream.write_all(&bytes).await?;
        stream.flush().await?;
        trace!(bytes = bytes.len(), "Frame sent");
        Ok(())
    }

    /// Blocks until one complete frame arrives.
    ///
    /// At most `max_frame_len + 1` bytes are buffered while a frame is
    /// incomplete.
    #[instrument(skip(self))]
    pub async fn receive(&mut self) -> Result<Frame, ConnectionError> {
        let limit = self.max_frame_len;
        loop {
            let blank = self
                .pending
                .iter()
                .take_while(|byte| byte.is_ascii_whitespace())
                .count();
            self.pending.drain(..blank);

            if !self.pending.is_empty() {
                match next_value(&self.pending) {
                    Ok(Some((value, used))) => {
                        self.pending.drain(..used);
                        trace!(bytes = used, buffered = self.pending.len(), "Frame received");
                        return codec::from_value(value);
                    }
                    Ok(None) => {}
                    Err(e) => {
                        warn!(error = %e, "Frame is not valid JSON");
                        self.pending.clear();
                        return Err(e.into());
                    }
                }
                if self.pending.len() > limit {
                    warn!(limit, "Frame exceeds byte budget");
                    return Err(ConnectionError::new(ConnectionErrorKind::FrameTooLarge { limit }));
                }
            }

            let Some(stream) = self.stream.as_mut() else {
                return Err(ConnectionError::new(ConnectionErrorKind::Closed));
            };
            let chunk = stream.fill_buf().await?;
            if chunk.is_empty() {
                if self.pending.is_empty() {
                    debug!("Peer closed the connection");
                    return Err(ConnectionError::new(ConnectionErrorKind::Closed));
                }
                warn!(bytes = self.pending.len(), "Connection closed mid-frame");
                return Err(ConnectionError::new(ConnectionErrorKind::Truncated {
                    bytes: self.pending.len(),
                }));
            }

            // pending.len() <= limit here, so there is always room for one byte.
            let taken = chunk.len().min(limit + 1 - self.pending.len());
            self.pending.extend_from_slice(&chunk[..taken]);
            stream.consume(taken);
        }
    }

    /// Shuts the stream down and releases it. Safe to call repeatedly.
    #[instrument(skip(self))]
    pub async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.shutdown().await {
                debug!(error = %e, "Shutdown failed, dropping stream anyway");
            }
            debug!("Transport closed");
        }
    }

    fn stream_mut(&mut self) -> Result<&mut BufReader<S>, ConnectionError> {
        self.stream
            .as_mut()
            .ok_or_else(|| ConnectionError::new(ConnectionErrorKind::Closed))
    }
}

/// Parses the first JSON value in `bytes`.
///
/// Returns `None` while the value is still incomplete, otherwise the value
/// and the number of bytes it spans.
fn next_value(bytes: &[u8]) -> Result<Option<(Value, usize)>, serde_json::Error> {
    let mut values = serde_json::Deserializer::from_slice(bytes).into_iter::<Value>();
    match values.next() {
        Some(Ok(value)) => Ok(Some((value, values.byte_offset()))),
        Some(Err(e)) if e.is_eof() => Ok(None),
        Some(Err(e)) => Err(e),
        None => Ok(None),
    }
}
