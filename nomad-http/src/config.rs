//! Client configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::env::{self, EnvSource, ProcessEnv};
use crate::error::Result;
use crate::retry::RetryPolicy;

/// Default address of a local agent.
pub const DEFAULT_ADDRESS: &str = "http://127.0.0.1:4646";
/// Default cipher string. Only its protocol floor is honored.
pub const DEFAULT_SSL_CIPHERS: &str = "TLSv1.2:!aNULL:!eNULL";
/// Default number of concurrent connections per host.
pub const DEFAULT_POOL_SIZE: usize = 16;

/// TLS material and verification policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsSettings {
    /// PEM holding the client certificate and its key. Preferred over
    /// `pem_file`.
    pub pem_contents: Option<String>,
    /// Path to a PEM holding the client certificate and its key.
    pub pem_file: Option<PathBuf>,
    /// Passphrase for an encrypted key. Encrypted keys are rejected.
    pub pem_passphrase: Option<String>,
    /// CA bundle used to verify the server.
    pub ca_cert: Option<PathBuf>,
    /// Directory of CA certificates (`*.pem`, `*.crt`).
    pub ca_path: Option<PathBuf>,
    /// Cipher string; a `TLSv1.3` token raises the minimum protocol version.
    pub ciphers: String,
    /// Verify the server certificate.
    pub verify: bool,
    /// Host name presented for SNI and certificate checks.
    pub server_name: Option<String>,
}

impl Default for TlsSettings {
    fn default() -> Self {
        Self {
            pem_contents: None,
            pem_file: None,
            pem_passphrase: None,
            ca_cert: None,
            ca_path: None,
            ciphers: DEFAULT_SSL_CIPHERS.to_string(),
            verify: true,
            server_name: None,
        }
    }
}

/// An HTTP proxy every request is routed through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxySettings {
    /// Proxy host, with or without a scheme.
    pub address: String,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl ProxySettings {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            port: None,
            username: None,
            password: None,
        }
    }

    /// The proxy URL handed to the HTTP stack.
    pub fn url(&self) -> String {
        let mut url = if self.address.contains("://") {
            self.address.clone()
        } else {
            format!("http://{}", self.address)
        };
        if let Some(port) = self.port {
            url = format!("{}:{}", url.trim_end_matches('/'), port);
        }
        url
    }
}

/// Transport configuration. Built once per client and read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base address of the Nomad agent.
    pub address: String,
    /// ACL token sent as `X-Nomad-Token`.
    pub token: Option<String>,
    pub tls: TlsSettings,
    pub proxy: Option<ProxySettings>,
    /// Fallback for any timeout left unset.
    pub timeout: Option<Duration>,
    /// Bounds waiting for a pool slot and opening the connection.
    pub open_timeout: Option<Duration>,
    /// Bounds one request/response exchange.
    pub read_timeout: Option<Duration>,
    /// Extends the connect budget to cover the TLS handshake.
    pub ssl_timeout: Option<Duration>,
    /// Concurrent connections per host.
    pub pool_size: usize,
    pub retry: RetryPolicy,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            token: None,
            tls: TlsSettings::default(),
            proxy: None,
            timeout: None,
            open_timeout: None,
            read_timeout: None,
            ssl_timeout: None,
            pool_size: DEFAULT_POOL_SIZE,
            retry: RetryPolicy::default(),
            user_agent: format!("nomad-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Resolve the configuration from `NOMAD_*` process environment
    /// variables.
    pub fn from_env() -> Result<Self> {
        Self::from_source(&ProcessEnv)
    }

    /// Resolve the configuration from any environment-like source.
    pub fn from_source(source: &(impl EnvSource + ?Sized)) -> Result<Self> {
        env::resolve(source)
    }

    pub fn effective_open_timeout(&self) -> Option<Duration> {
        self.open_timeout.or(self.timeout)
    }

    pub fn effective_read_timeout(&self) -> Option<Duration> {
        self.read_timeout.or(self.timeout)
    }

    pub fn effective_ssl_timeout(&self) -> Option<Duration> {
        self.ssl_timeout.or(self.timeout)
    }

    /// Budget for establishing a connection: the larger of the open and SSL
    /// timeouts.
    pub fn connect_timeout(&self) -> Option<Duration> {
        match (self.effective_open_timeout(), self.effective_ssl_timeout()) {
            (Some(open), Some(ssl)) => Some(open.max(ssl)),
            (open, ssl) => open.or(ssl),
        }
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Start from an existing configuration.
    pub fn from_config(config: ClientConfig) -> Self {
        Self { config }
    }

    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.config.address = address.into();
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.config.token = Some(token.into());
        self
    }

    pub fn tls(mut self, tls: TlsSettings) -> Self {
        self.config.tls = tls;
        self
    }

    /// Use an in-memory PEM for the client identity.
    pub fn pem_contents(mut self, pem: impl Into<String>) -> Self {
        self.config.tls.pem_contents = Some(pem.into());
        self
    }

    pub fn pem_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.tls.pem_file = Some(path.into());
        self
    }

    pub fn pem_passphrase(mut self, passphrase: impl Into<String>) -> Self {
        self.config.tls.pem_passphrase = Some(passphrase.into());
        self
    }

    pub fn ca_cert(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.tls.ca_cert = Some(path.into());
        self
    }

    pub fn ca_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.tls.ca_path = Some(path.into());
        self
    }

    pub fn ciphers(mut self, ciphers: impl Into<String>) -> Self {
        self.config.tls.ciphers = ciphers.into();
        self
    }

    pub fn verify(mut self, verify: bool) -> Self {
        self.config.tls.verify = verify;
        self
    }

    pub fn server_name(mut self, name: impl Into<String>) -> Self {
        self.config.tls.server_name = Some(name.into());
        self
    }

    pub fn proxy(mut self, proxy: ProxySettings) -> Self {
        self.config.proxy = Some(proxy);
        self
    }

    /// Set the default for every timeout that is not set explicitly.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    pub fn open_timeout(mut self, timeout: Duration) -> Self {
        self.config.open_timeout = Some(timeout);
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = Some(timeout);
        self
    }

    pub fn ssl_timeout(mut self, timeout: Duration) -> Self {
        self.config.ssl_timeout = Some(timeout);
        self
    }

    pub fn pool_size(mut self, size: usize) -> Self {
        self.config.pool_size = size;
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.config.retry = retry;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Build the configuration.
    pub fn build(self) -> ClientConfig {
        self.config
    }
}
