//! Error taxonomy for the transport.

use std::fmt;

use nomad_decode::DecodeError;
use thiserror::Error;

/// Result type for transport operations.
pub type Result<T> = std::result::Result<T, Error>;

/// A non-2xx response: where it came from, its status and whatever error
/// strings the server supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpFailure {
    /// Address of the server that answered.
    pub address: String,
    /// HTTP status code.
    pub code: u16,
    /// Server-supplied diagnostics, possibly empty.
    pub errors: Vec<String>,
}

impl HttpFailure {
    pub fn new(address: impl Into<String>, code: u16, errors: Vec<String>) -> Self {
        Self {
            address: address.into(),
            code,
            errors,
        }
    }

    /// Whether any server-supplied error contains `needle`.
    pub fn mentions(&self, needle: &str) -> bool {
        self.errors.iter().any(|error| error.contains(needle))
    }
}

impl fmt::Display for HttpFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "The Nomad server at `{}' responded with a {}.\n\
             Any additional information the server supplied is shown below:\n",
            self.address, self.code
        )?;
        for error in &self.errors {
            write!(f, "\n  * {}", error.trim_end())?;
        }
        Ok(())
    }
}

/// Every failure a Nomad call can surface.
#[derive(Debug, Error)]
pub enum Error {
    /// The server was never reached, stopped answering, or redirected too
    /// many times. Never retried.
    #[error(
        "The Nomad server at `{address}' is not currently accepting connections. \
         Please ensure that the server is running and that your authentication \
         information is correct.\n\nThe original error was: {message}"
    )]
    Connection {
        /// Address that was being contacted.
        address: String,
        /// Description of the underlying failure.
        message: String,
    },

    /// A 4xx response. Never retried.
    #[error("{0}")]
    Client(HttpFailure),

    /// A 5xx response. Retried with backoff before surfacing.
    #[error("{0}")]
    Server(HttpFailure),

    /// TLS or proxy material that cannot be used to build a client.
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),

    /// A call rejected before any request was sent.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A successful response whose body does not match the expected record.
    #[error("Failed to decode response: {0}")]
    Decode(#[from] DecodeError),
}

impl Error {
    pub(crate) fn connection(address: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Connection {
            address: address.into(),
            message: message.to_string(),
        }
    }

    /// Only server failures are eligible for automatic retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Server(_))
    }

    /// Check if this is a transport-level failure.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }

    /// The HTTP failure details for client and server errors.
    pub fn failure(&self) -> Option<&HttpFailure> {
        match self {
            Self::Client(failure) | Self::Server(failure) => Some(failure),
            _ => None,
        }
    }

    /// Get the HTTP status code if the server answered.
    pub fn status_code(&self) -> Option<u16> {
        self.failure().map(|failure| failure.code)
    }

    /// Server-supplied error strings; empty when there are none.
    pub fn errors(&self) -> &[String] {
        self.failure()
            .map(|failure| failure.errors.as_slice())
            .unwrap_or(&[])
    }

    /// Address of the server involved, when the failure concerns one.
    pub fn address(&self) -> Option<&str> {
        match self {
            Self::Connection { address, .. } => Some(address),
            Self::Client(failure) | Self::Server(failure) => Some(&failure.address),
            _ => None,
        }
    }
}
