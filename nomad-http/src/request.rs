//! Request bodies and per-call options.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::config::{ClientConfig, ProxySettings, TlsSettings};
use crate::retry::RetryPolicy;

/// A request body.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Body {
    /// No body.
    #[default]
    None,
    /// A pre-serialized payload sent verbatim.
    Raw(String),
    /// A JSON document serialized at send time.
    Json(Value),
}

impl Body {
    /// Serialize any value into a JSON body.
    pub fn json<T: Serialize>(value: &T) -> serde_json::Result<Self> {
        serde_json::to_value(value).map(Self::Json)
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Bytes on the wire, if any.
    pub fn to_bytes(&self) -> Option<Vec<u8>> {
        match self {
            Self::None => None,
            Self::Raw(raw) => Some(raw.clone().into_bytes()),
            Self::Json(value) => Some(value.to_string().into_bytes()),
        }
    }
}

impl From<Value> for Body {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<String> for Body {
    fn from(raw: String) -> Self {
        Self::Raw(raw)
    }
}

impl From<&str> for Body {
    fn from(raw: &str) -> Self {
        Self::Raw(raw.to_string())
    }
}

/// Per-call overrides. Unset fields inherit from the client configuration.
///
/// TLS and proxy overrides cannot be applied to the shared connection pool,
/// so a call carrying either uses a dedicated connection stack.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    pub token: Option<String>,
    pub timeout: Option<Duration>,
    pub open_timeout: Option<Duration>,
    pub read_timeout: Option<Duration>,
    pub ssl_timeout: Option<Duration>,
    pub tls: Option<TlsSettings>,
    pub proxy: Option<ProxySettings>,
    pub retry: Option<RetryPolicy>,
    /// Extra headers for this call.
    pub headers: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn open_timeout(mut self, timeout: Duration) -> Self {
        self.open_timeout = Some(timeout);
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    pub fn ssl_timeout(mut self, timeout: Duration) -> Self {
        self.ssl_timeout = Some(timeout);
        self
    }

    pub fn tls(mut self, tls: TlsSettings) -> Self {
        self.tls = Some(tls);
        self
    }

    pub fn proxy(mut self, proxy: ProxySettings) -> Self {
        self.proxy = Some(proxy);
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Whether this call needs its own connection stack.
    pub fn needs_dedicated_client(&self) -> bool {
        self.tls.is_some() || self.proxy.is_some()
    }

    /// The effective configuration for one call: every set override wins.
    ///
    /// A per-call `timeout` acts as the default for the other per-call
    /// timeouts before falling back to the client's values.
    pub fn merge(&self, config: &ClientConfig) -> ClientConfig {
        let mut effective = config.clone();
        if let Some(token) = &self.token {
            effective.token = Some(token.clone());
        }
        if let Some(timeout) = self.timeout {
            effective.timeout = Some(timeout);
        }
        effective.open_timeout = self.open_timeout.or(self.timeout).or(config.open_timeout);
        effective.read_timeout = self.read_timeout.or(self.timeout).or(config.read_timeout);
        effective.ssl_timeout = self.ssl_timeout.or(self.timeout).or(config.ssl_timeout);
        if let Some(tls) = &self.tls {
            effective.tls = tls.clone();
        }
        if let Some(proxy) = &self.proxy {
            effective.proxy = Some(proxy.clone());
        }
        if let Some(retry) = &self.retry {
            effective.retry = retry.clone();
        }
        effective
    }
}
