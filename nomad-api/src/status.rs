//! Cluster status and regions.

use nomad_http::Result;

use crate::path::scalar;
use crate::Nomad;

/// Status endpoints.
#[derive(Debug, Clone, Copy)]
pub struct Status<'a> {
    api: &'a Nomad,
}

impl<'a> Status<'a> {
    pub(crate) fn new(api: &'a Nomad) -> Self {
        Self { api }
    }

    /// RPC address of the current leader.
    pub async fn leader(&self) -> Result<String> {
        scalar(self.api.get("/v1/status/leader").await?)
    }

    /// RPC addresses of the raft peers.
    pub async fn peers(&self) -> Result<Vec<String>> {
        scalar(self.api.get("/v1/status/peers").await?)
    }
}

/// Region endpoints.
#[derive(Debug, Clone, Copy)]
pub struct Regions<'a> {
    api: &'a Nomad,
}

impl<'a> Regions<'a> {
    pub(crate) fn new(api: &'a Nomad) -> Self {
        Self { api }
    }

    /// Names of the regions the cluster knows about.
    pub async fn list(&self) -> Result<Vec<String>> {
        scalar(self.api.get("/v1/regions").await?)
    }
}
