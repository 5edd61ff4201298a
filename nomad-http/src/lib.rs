//! # Nomad HTTP
//!
//! The transport under every Nomad API call: connection slots per host,
//! TLS and proxy setup, timeouts, redirect following, response
//! classification and retry with exponential backoff.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use nomad_http::{ClientConfig, NomadClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), nomad_http::Error> {
//!     let client = NomadClient::new(
//!         ClientConfig::builder()
//!             .address("http://127.0.0.1:4646")
//!             .token("b3b1f7a4-...")
//!             .build(),
//!     )?;
//!
//!     let leader = client.get("/v1/status/leader").await?;
//!     println!("leader: {leader}");
//!     Ok(())
//! }
//! ```
//!
//! ## Errors
//!
//! - [`Error::Connection`]: the server could not be reached, a timeout
//!   expired or redirects looped. Never retried.
//! - [`Error::Client`]: a 4xx response. Never retried.
//! - [`Error::Server`]: a 5xx response, retried per [`RetryPolicy`] and
//!   surfaced once retries run out.

mod client;
mod config;
mod env;
mod error;
mod pool;
mod request;
mod response;
pub mod retry;
mod tls;

pub use client::{NomadClient, MAX_REDIRECTS, TOKEN_HEADER};
pub use config::{
    ClientConfig, ClientConfigBuilder, ProxySettings, TlsSettings, DEFAULT_ADDRESS,
    DEFAULT_POOL_SIZE, DEFAULT_SSL_CIPHERS,
};
pub use env::{EnvSource, ProcessEnv};
pub use error::{Error, HttpFailure, Result};
pub use pool::{HostPool, MAX_TRACKED_HOSTS};
pub use request::{Body, RequestOptions};
pub use response::ResponseEnvelope;
pub use retry::RetryPolicy;
pub use tls::min_version;

pub use http::{HeaderMap, Method, StatusCode};
pub use url::Url;
