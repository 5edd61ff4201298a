//! # Nomad
//!
//! An async client for the HashiCorp Nomad HTTP API.
//!
//! The crate is a thin façade over its parts:
//!
//! - [`api`]: typed endpoint groups and the records they return
//! - [`http`]: the transport (connection slots, TLS, redirects, retry)
//! - [`decode`]: the declarative JSON-to-record engine
//! - [`units`]: nanosecond durations and bit-resolution sizes
//! - `log` (feature `log`): environment-driven tracing setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use nomad::Nomad;
//!
//! #[tokio::main]
//! async fn main() -> nomad::Result<()> {
//!     let nomad = Nomad::from_env()?;
//!
//!     println!("leader: {}", nomad.status().leader().await?);
//!     for alloc in nomad.allocations().list(None).await? {
//!         println!("{:?} {:?}", alloc.id, alloc.client_status);
//!     }
//!     Ok(())
//! }
//! ```

pub use nomad_api as api;
pub use nomad_decode as decode;
pub use nomad_http as http;
pub use nomad_units as units;

#[cfg(feature = "log")]
pub use nomad_log as log;

pub use nomad_api::{
    Agent, Alloc, Allocations, Eval, Evaluations, JobItem, JobVersion, Jobs, Nodes, NodeItem,
    Nomad, Regions, Status,
};
pub use nomad_http::{
    Body, ClientConfig, ClientConfigBuilder, Error, HttpFailure, NomadClient, RequestOptions,
    Result, RetryPolicy,
};
pub use nomad_units::{Duration, DurationUnit, Size, SizeUnit};

/// Common imports.
pub mod prelude {
    pub use crate::{ClientConfig, Duration, Error, Nomad, RequestOptions, Result, Size};
    pub use nomad_decode::Record;
}
