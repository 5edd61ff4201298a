//! The local agent: membership, configuration and server list.

use std::collections::BTreeMap;

use nomad_decode::{record, Nested, Records, StringAsNil, StringifyKeys};
use nomad_http::{Body, Method, Result};
use serde_json::Value;

use crate::path::{repeated, required, scalar};
use crate::Nomad;

/// Gossip status of a reachable member.
pub const STATUS_ALIVE: &str = "alive";

/// Agent endpoints.
#[derive(Debug, Clone, Copy)]
pub struct Agent<'a> {
    api: &'a Nomad,
}

impl<'a> Agent<'a> {
    pub(crate) fn new(api: &'a Nomad) -> Self {
        Self { api }
    }

    /// Members of the gossip pool known to the agent.
    pub async fn members(&self) -> Result<AgentMembers> {
        let json = self.api.get("/v1/agent/members").await?;
        required(&json)
    }

    /// The agent's configuration, member entry and runtime stats.
    pub async fn self_info(&self) -> Result<AgentSelf> {
        let json = self.api.get("/v1/agent/self").await?;
        required(&json)
    }

    /// Ask the agent to join the given gossip addresses.
    pub async fn join(&self, addresses: &[&str]) -> Result<AgentJoin> {
        let path = repeated("/v1/agent/join", "address", addresses)?;
        let json = self.api.send(Method::POST, &path, Body::None).await?;
        required(&json)
    }

    /// Force failed members into the left state.
    pub async fn force_leave(&self, nodes: &[&str]) -> Result<()> {
        let path = repeated("/v1/agent/force-leave", "node", nodes)?;
        self.api.send(Method::POST, &path, Body::None).await?;
        Ok(())
    }

    /// Servers the client agent currently talks to.
    pub async fn servers(&self) -> Result<Vec<String>> {
        let json = self.api.get("/v1/agent/servers").await?;
        if json.is_null() {
            return Ok(Vec::new());
        }
        scalar(json)
    }

    /// Replace the client agent's server list.
    pub async fn update_servers(&self, addresses: &[&str]) -> Result<()> {
        let path = repeated("/v1/agent/servers", "address", addresses)?;
        self.api.send(Method::POST, &path, Body::None).await?;
        Ok(())
    }
}

record! {
    pub struct AgentMembers {
        server_name: Option<String> = "ServerName" => StringAsNil,
        server_region: Option<String> = "ServerRegion" => StringAsNil,
        server_datacenter: Option<String> = "ServerDC" => StringAsNil,
        members: Vec<AgentMember> = "Members" => Records,
    }
}

record! {
    /// One member of the gossip pool.
    pub struct AgentMember {
        name: Option<String> = "Name" => StringAsNil,
        address: Option<String> = "Addr" => StringAsNil,
        port: Option<u16> = "Port",
        tags: BTreeMap<String, Value> = "Tags" => StringifyKeys,
        status: Option<String> = "Status" => StringAsNil,
        protocol_min: Option<u8> = "ProtocolMin",
        protocol_max: Option<u8> = "ProtocolMax",
        protocol_cur: Option<u8> = "ProtocolCur",
        delegate_min: Option<u8> = "DelegateMin",
        delegate_max: Option<u8> = "DelegateMax",
        delegate_cur: Option<u8> = "DelegateCur",
    }
}

impl AgentMember {
    pub fn is_alive(&self) -> bool {
        self.status.as_deref() == Some(STATUS_ALIVE)
    }
}

record! {
    pub struct AgentSelf {
        config: BTreeMap<String, Value> = "config" => StringifyKeys,
        member: Option<AgentMember> = "member" => Nested,
        stats: BTreeMap<String, Value> = "stats" => StringifyKeys,
    }
}

record! {
    /// Outcome of a join request.
    pub struct AgentJoin {
        error: Option<String> = "error" => StringAsNil,
        num_joined: Option<u64> = "num_joined",
    }
}

impl AgentJoin {
    /// Whether the agent reported no error.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}
