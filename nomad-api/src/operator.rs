//! Raft cluster operations.

use nomad_decode::{record, Records, StringAsNil};
use nomad_http::{Body, Method, Result};

use crate::path::{repeated, required};
use crate::Nomad;

/// Operator endpoints.
#[derive(Debug, Clone, Copy)]
pub struct Operator<'a> {
    api: &'a Nomad,
}

impl<'a> Operator<'a> {
    pub(crate) fn new(api: &'a Nomad) -> Self {
        Self { api }
    }

    /// The servers registered in the raft subsystem.
    pub async fn raft_configuration(&self) -> Result<RaftConfiguration> {
        let json = self.api.get("/v1/operator/raft/configuration").await?;
        required(&json)
    }

    /// Remove stale peers from the raft configuration by address.
    pub async fn remove_raft_peer(&self, addresses: &[&str]) -> Result<()> {
        let path = repeated("/v1/operator/raft/peer", "address", addresses)?;
        self.api.send(Method::DELETE, &path, Body::None).await?;
        Ok(())
    }
}

record! {
    pub struct RaftConfiguration {
        index: Option<u64> = "Index",
        servers: Vec<RaftServer> = "Servers" => Records,
    }
}

record! {
    /// A server as seen by raft.
    pub struct RaftServer {
        /// Either the address or a UUID, depending on the server version.
        id: Option<String> = "ID" => StringAsNil,
        /// `"(unknown)"` for stale entries.
        node: Option<String> = "Node" => StringAsNil,
        address: Option<String> = "Address" => StringAsNil,
        leader: Option<bool> = "Leader",
        voter: Option<bool> = "Voter",
    }
}
