//! Flat field mapping ⇄ JSON text.
//!
//! A frame is one JSON object whose values are all scalars. Keys are kept
//! sorted, so encoding the same mapping always yields the same bytes.

use crate::error::{ConnectionError, ConnectionErrorKind};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{debug, instrument, warn};

/// One logical message: field name to scalar value.
pub type Frame = serde_json::Map<String, Value>;

/// Serializes a frame. Nested values are rejected.
#[instrument(skip(frame), fields(fields = frame.len()))]
pub fn encode(frame: &Frame) -> Result<Vec<u8>, ConnectionError> {
    ensure_flat(frame)?;
    let bytes = serde_json::to_vec(frame)?;
    debug!(bytes = bytes.len(), "Encoded frame");
    Ok(bytes)
}

/// Parses a frame. Anything other than a flat JSON object is an error.
#[instrument(skip(bytes), fields(bytes = bytes.len()))]
pub fn decode(bytes: &[u8]) -> Result<Frame, ConnectionError> {
    let value: Value = serde_json::from_slice(bytes).map_err(|e| {
        warn!(error = %e, "Frame is not valid JSON");
        ConnectionError::from(e)
    })?;
    from_value(value)
}

/// Accepts an already parsed JSON value as a frame if it is a flat object.
pub fn from_value(value: Value) -> Result<Frame, ConnectionError> {
    match value {
        Value::Object(frame) => {
            ensure_flat(&frame)?;
            Ok(frame)
        }
        other => {
            warn!(kind = value_kind(&other), "Frame is not an object");
            Err(ConnectionError::new(ConnectionErrorKind::NotAnObject))
        }
    }
}

/// Converts a message struct into a frame.
pub fn to_frame<T: Serialize>(message: &T) -> Result<Frame, ConnectionError> {
    match serde_json::to_value(message)? {
        Value::Object(frame) => Ok(frame),
        _ => Err(ConnectionError::new(ConnectionErrorKind::NotAnObject)),
    }
}

/// Reads a message struct out of a frame.
pub fn from_frame<T: DeserializeOwned>(frame: Frame) -> Result<T, ConnectionError> {
    Ok(serde_json::from_value(Value::Object(frame))?)
}

fn ensure_flat(frame: &Frame) -> Result<(), ConnectionError> {
    match frame
        .iter()
        .find(|(_, value)| matches!(value, Value::Array(_) | Value::Object(_)))
    {
        Some((field, _)) => Err(ConnectionError::new(ConnectionErrorKind::NestedField {
            field: field.clone(),
        })),
        None => Ok(()),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
