//! Response decoders.
//!
//! A decoder turns a raw JSON payload into a typed value. Malformed input is
//! not an error in the control-flow sense: decoders return a `DecodeFailure`
//! value and callers branch on it.

use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Why a payload did not match the expected shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct DecodeFailure {
    pub message: String,
    /// Position in the source text, when the failure came from parsing text.
    pub line: Option<usize>,
    pub column: Option<usize>,
}

impl DecodeFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: None,
            column: None,
        }
    }
}

impl From<serde_json::Error> for DecodeFailure {
    fn from(err: serde_json::Error) -> Self {
        // Positions are only meaningful when decoding from text; a `Value`
        // source reports line 0.
        let (line, column) = match err.line() {
            0 => (None, None),
            line => (Some(line), Some(err.column())),
        };
        Self {
            message: err.to_string(),
            line,
            column,
        }
    }
}

/// Validates a raw response payload into `Output`.
pub trait Decoder: Send + Sync {
    type Output;

    fn decode(&self, raw: &Value) -> Result<Self::Output, DecodeFailure>;
}

impl<T, F> Decoder for F
where
    F: Fn(&Value) -> Result<T, DecodeFailure> + Send + Sync,
{
    type Output = T;

    fn decode(&self, raw: &Value) -> Result<T, DecodeFailure> {
        self(raw)
    }
}

/// Serde-backed decoder for any `DeserializeOwned` type.
pub struct Json<T>(PhantomData<fn() -> T>);

impl<T> Json<T> {
    pub fn new() -> Self {
        Json(PhantomData)
    }
}

impl<T> Default for Json<T> {
    fn default() -> Self {
        Json::new()
    }
}

impl<T> Clone for Json<T> {
    fn clone(&self) -> Self {
        Json::new()
    }
}

impl<T> fmt::Debug for Json<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Json<{}>", std::any::type_name::<T>())
    }
}

impl<T: DeserializeOwned> Decoder for Json<T> {
    type Output = T;

    fn decode(&self, raw: &Value) -> Result<T, DecodeFailure> {
        T::deserialize(raw).map_err(DecodeFailure::from)
    }
}
