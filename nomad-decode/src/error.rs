//! Decoding error types.

use serde_json::Value;
use thiserror::Error;

/// Result type for decoding operations.
pub type Result<T> = std::result::Result<T, DecodeError>;

/// Raised when a payload violates the shape a record schema expects.
///
/// Missing and unknown keys never produce an error; only values that a codec
/// cannot interpret do.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// A record was decoded from something other than an object or null.
    #[error("{record} must be decoded from an object, found {found}")]
    NotAnObject {
        /// Record type name.
        record: &'static str,
        /// JSON kind that was supplied.
        found: &'static str,
    },

    /// A codec received a JSON value of the wrong kind.
    #[error("expected {expected}, found {found}")]
    Unexpected {
        /// What the codec accepts.
        expected: &'static str,
        /// JSON kind that was supplied.
        found: &'static str,
    },

    /// A value had the right kind but an unusable content.
    #[error("{0}")]
    Invalid(String),

    /// A field failed to decode. Nested failures chain through `source`.
    #[error("failed to decode {record}.{key}: {source}")]
    Field {
        /// Record type name.
        record: &'static str,
        /// Source key of the failing field.
        key: String,
        /// Underlying failure.
        #[source]
        source: Box<DecodeError>,
    },
}

impl DecodeError {
    /// Build an `Unexpected` error describing `found`.
    pub fn unexpected(expected: &'static str, found: &Value) -> Self {
        Self::Unexpected {
            expected,
            found: json_kind(found),
        }
    }
}

/// Human name for the kind of a JSON value.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Invalid(err.to_string())
    }
}
