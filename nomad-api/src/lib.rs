//! # Nomad API
//!
//! Typed access to the Nomad HTTP API. Each endpoint group hangs off a
//! [`Nomad`] handle and returns records decoded from the server's JSON:
//! durations arrive as [`Duration`](nomad_units::Duration), sizes as
//! [`Size`](nomad_units::Size), blank strings as `None` and missing lists
//! as empty.
//!
//! ```rust,no_run
//! use nomad_api::Nomad;
//!
//! #[tokio::main]
//! async fn main() -> nomad_api::Result<()> {
//!     let nomad = Nomad::from_env()?;
//!
//!     for job in nomad.jobs().list(None).await? {
//!         println!("{:?} running={}", job.id, job.is_running());
//!     }
//!
//!     if let Some(node) = nomad.nodes().read("fb2170a8").await? {
//!         let memory = node.resources.and_then(|r| r.memory);
//!         println!("memory: {}", memory.unwrap_or_default());
//!     }
//!     Ok(())
//! }
//! ```

mod agent;
mod allocation;
mod evaluation;
mod job;
mod node;
mod operator;
mod path;
mod status;
mod system;

use nomad_http::{Body, Method, NomadClient, RequestOptions};
use serde_json::Value;

pub use agent::{Agent, AgentJoin, AgentMember, AgentMembers, AgentSelf, STATUS_ALIVE};
pub use allocation::{Alloc, Allocations};
pub use evaluation::{Eval, Evaluations, STATUS_COMPLETE};
pub use job::{
    JobArtifact, JobChildren, JobConstraint, JobCreate, JobDispatchPayload, JobEphemeralDisk,
    JobItem, JobLogConfig, JobParameterizedJob, JobPeriodic, JobRestartPolicy, JobService,
    JobServiceCheck, JobSummary, JobTask, JobTaskGroup, JobTaskGroupSummary, JobTemplate,
    JobUpdate, JobVault, JobVersion, Jobs, PAYLOAD_NONE, PAYLOAD_OPTIONAL, PAYLOAD_REQUIRED,
    STATUS_RUNNING,
};
pub use node::{Network, NodeEvaluation, NodeItem, Nodes, Port, Resources, Server, STATUS_READY};
pub use operator::{Operator, RaftConfiguration, RaftServer};
pub use status::{Regions, Status};
pub use system::{JobValidation, System, Validate};

pub use nomad_http::{ClientConfig, Error, Result};

/// Entry point to the typed API.
///
/// Cheap to clone; clones share the underlying connection slots.
#[derive(Debug, Clone)]
pub struct Nomad {
    client: NomadClient,
    options: RequestOptions,
}

impl Nomad {
    /// Wrap an existing transport.
    pub fn new(client: NomadClient) -> Self {
        Self {
            client,
            options: RequestOptions::default(),
        }
    }

    /// Build a handle from an explicit configuration.
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        Ok(Self::new(NomadClient::new(config)?))
    }

    /// Build a handle configured from the `NOMAD_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(NomadClient::from_env()?))
    }

    /// A handle whose calls all carry `options`.
    pub fn with_options(&self, options: RequestOptions) -> Self {
        Self {
            client: self.client.clone(),
            options,
        }
    }

    /// The underlying transport, for endpoints without a typed wrapper.
    pub fn client(&self) -> &NomadClient {
        &self.client
    }

    pub fn status(&self) -> Status<'_> {
        Status::new(self)
    }

    pub fn regions(&self) -> Regions<'_> {
        Regions::new(self)
    }

    pub fn jobs(&self) -> Jobs<'_> {
        Jobs::new(self)
    }

    pub fn nodes(&self) -> Nodes<'_> {
        Nodes::new(self)
    }

    pub fn allocations(&self) -> Allocations<'_> {
        Allocations::new(self)
    }

    pub fn evaluations(&self) -> Evaluations<'_> {
        Evaluations::new(self)
    }

    pub fn agent(&self) -> Agent<'_> {
        Agent::new(self)
    }

    pub fn operator(&self) -> Operator<'_> {
        Operator::new(self)
    }

    pub fn system(&self) -> System<'_> {
        System::new(self)
    }

    pub fn validate(&self) -> Validate<'_> {
        Validate::new(self)
    }

    pub(crate) async fn get(&self, path: &str) -> Result<Value> {
        self.send(Method::GET, path, Body::None).await
    }

    pub(crate) async fn send(&self, method: Method, path: &str, body: Body) -> Result<Value> {
        self.client.execute(method, path, body, &self.options).await
    }
}
