//! Raw responses and their classification.

use bytes::Bytes;
use http::{header, HeaderMap, StatusCode};
use nomad_decode::DecodeError;
use serde_json::Value;

use crate::error::{Error, HttpFailure, Result};

/// Status, headers and raw body of one HTTP exchange.
#[derive(Debug, Clone)]
pub struct ResponseEnvelope {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ResponseEnvelope {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Target of a redirect, when this is one.
    pub fn location(&self) -> Option<&str> {
        if !self.status.is_redirection() {
            return None;
        }
        self.headers
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
    }

    /// Get the response body as text.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Parse the body as JSON; an empty body is `null`.
    pub fn json(&self) -> Result<Value> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&self.body).map_err(|e| Error::Decode(DecodeError::from(e)))
    }

    /// Best-effort list of server-supplied errors. Understands
    /// `{"errors": [...]}`, a bare array of strings, a JSON string and plain
    /// text; anything else yields an empty list.
    pub fn error_list(&self) -> Vec<String> {
        match serde_json::from_slice::<Value>(&self.body) {
            Ok(Value::Object(object)) => match object.get("errors") {
                Some(Value::Array(items)) => strings(items),
                _ => Vec::new(),
            },
            Ok(Value::Array(items)) => strings(&items),
            Ok(Value::String(message)) => non_empty(&message),
            Ok(_) => Vec::new(),
            Err(_) => non_empty(&self.text()),
        }
    }

    /// Turn the response into parsed JSON or a classified error. `address`
    /// is recorded in the error.
    pub fn into_result(self, address: &str) -> Result<Value> {
        let status = self.status;
        if status.is_success() {
            return self.json();
        }
        let failure = HttpFailure::new(address, status.as_u16(), self.error_list());
        if status.is_server_error() {
            Err(Error::Server(failure))
        } else {
            Err(Error::Client(failure))
        }
    }
}

fn strings(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| item.as_str())
        .map(str::to_string)
        .collect()
}

fn non_empty(text: &str) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        Vec::new()
    } else {
        vec![text.to_string()]
    }
}
