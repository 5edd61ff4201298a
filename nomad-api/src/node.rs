//! Client nodes.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use nomad_decode::{
    record, DateAsTimestamp, NanosecondsAsDuration, Nested, NilAsArray, Records, SizeInMegabits,
    SizeInMegabytes, StringAsNil, StringifyKeys,
};
use nomad_http::{Body, Method, Result};
use nomad_units::{Duration, Size};
use serde_json::Value;
use tracing::debug;

use crate::path::{list, optional, required, segment, with_query};
use crate::Nomad;

/// Status of a node accepting work.
pub const STATUS_READY: &str = "ready";

/// Error text the server returns, with a 500, for an unknown node.
const NODE_LOOKUP_FAILED: &str = "node lookup failed";

/// Node endpoints.
#[derive(Debug, Clone, Copy)]
pub struct Nodes<'a> {
    api: &'a Nomad,
}

impl<'a> Nodes<'a> {
    pub(crate) fn new(api: &'a Nomad) -> Self {
        Self { api }
    }

    /// List nodes, optionally only those whose ID starts with `prefix`.
    pub async fn list(&self, prefix: Option<&str>) -> Result<Vec<NodeItem>> {
        let json = self
            .api
            .get(&with_query("/v1/nodes", [("prefix", prefix)]))
            .await?;
        list(&json)
    }

    /// Read one node. An unknown node yields `None`.
    pub async fn read(&self, id: &str) -> Result<Option<NodeItem>> {
        match self.api.get(&format!("/v1/node/{}", segment(id))).await {
            Ok(json) => optional(&json),
            // Unknown nodes come back as a 500 rather than a 404.
            Err(e) if e.failure().is_some_and(|f| f.mentions(NODE_LOOKUP_FAILED)) => {
                debug!(node = id, "Node not found");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Create a new evaluation for the node.
    pub async fn evaluate(&self, id: &str) -> Result<NodeEvaluation> {
        let path = format!("/v1/node/{}/evaluate", segment(id));
        let json = self.api.send(Method::POST, &path, Body::None).await?;
        required(&json)
    }

    /// Toggle drain mode for the node.
    pub async fn drain(&self, id: &str, enable: bool) -> Result<NodeEvaluation> {
        let path = with_query(
            &format!("/v1/node/{}/drain", segment(id)),
            [("enable", Some(if enable { "true" } else { "false" }))],
        );
        let json = self.api.send(Method::POST, &path, Body::None).await?;
        required(&json)
    }
}

record! {
    /// A client node.
    pub struct NodeItem {
        id: Option<String> = "ID" => StringAsNil,
        secret_id: Option<String> = "SecretID" => StringAsNil,
        datacenter: Option<String> = "Datacenter" => StringAsNil,
        name: Option<String> = "Name" => StringAsNil,
        http_addr: Option<String> = "HTTPAddr" => StringAsNil,
        tls_enabled: Option<bool> = "TLSEnabled",
        attributes: BTreeMap<String, Value> = "Attributes" => StringifyKeys,
        resources: Option<Resources> = "Resources" => Nested,
        reserved: Option<Resources> = "Reserved" => Nested,
        links: BTreeMap<String, Value> = "Links" => StringifyKeys,
        meta: BTreeMap<String, Value> = "Meta" => StringifyKeys,
        node_class: Option<String> = "NodeClass" => StringAsNil,
        computed_class: Option<String> = "ComputedClass" => StringAsNil,
        drain: Option<bool> = "Drain",
        status: Option<String> = "Status" => StringAsNil,
        status_description: Option<String> = "StatusDescription" => StringAsNil,
        status_updated_at: Option<DateTime<Utc>> = "StatusUpdatedAt" => DateAsTimestamp,
        create_index: Option<u64> = "CreateIndex",
        modify_index: Option<u64> = "ModifyIndex",
    }
}

impl NodeItem {
    pub fn is_ready(&self) -> bool {
        self.status.as_deref() == Some(STATUS_READY)
    }
}

record! {
    /// Compute resources, either offered by a node or requested by a task.
    pub struct Resources {
        cpu: Option<u64> = "CPU",
        memory: Option<Size> = "MemoryMB" => SizeInMegabytes,
        disk: Option<Size> = "DiskMB" => SizeInMegabytes,
        iops: Option<u64> = "IOPS",
        networks: Vec<Network> = "Networks" => Records,
    }
}

record! {
    pub struct Network {
        device: Option<String> = "Device" => StringAsNil,
        cidr: Option<String> = "CIDR" => StringAsNil,
        ip: Option<String> = "IP" => StringAsNil,
        megabits: Option<Size> = "MBits" => SizeInMegabits,
        reserved_ports: Vec<Port> = "ReservedPorts" => Records,
        dynamic_ports: Vec<Port> = "DynamicPorts" => Records,
    }
}

record! {
    pub struct Port {
        label: Option<String> = "Label" => StringAsNil,
        value: Option<u16> = "Value",
    }
}

record! {
    /// Result of forcing a node evaluation or toggling drain.
    pub struct NodeEvaluation {
        heartbeat_ttl: Option<Duration> = "HeartbeatTTL" => NanosecondsAsDuration,
        eval_ids: Vec<String> = "EvalIDs" => NilAsArray,
        eval_create_index: Option<u64> = "EvalCreateIndex",
        node_modify_index: Option<u64> = "NodeModifyIndex",
        leader_rpc_addr: Option<String> = "LeaderRPCAddr" => StringAsNil,
        num_nodes: Option<u64> = "NumNodes",
        servers: Vec<Server> = "Servers" => Records,
        index: Option<u64> = "Index",
        last_contact: Option<i64> = "LastContact",
        known_leader: Option<bool> = "KnownLeader",
    }
}

record! {
    pub struct Server {
        rpc_advertise_addr: Option<String> = "RPCAdvertiseAddr" => StringAsNil,
        rpc_major_version: Option<u32> = "RPCMajorVersion",
        rpc_minor_version: Option<u32> = "RPCMinorVersion",
        datacenter: Option<String> = "Datacenter" => StringAsNil,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nomad_decode::decode;
    use serde_json::json;

    #[test]
    fn test_node_item() {
        let node: NodeItem = decode(&json!({
            "ID": "fb2170a8",
            "HTTPAddr": "10.0.0.4:4646",
            "Status": "ready",
            "StatusUpdatedAt": 1495000000,
            "Attributes": {"kernel.name": "linux"},
            "Resources": {
                "CPU": 2000,
                "MemoryMB": 1024,
                "DiskMB": 10000,
                "Networks": [{
                    "Device": "eth0",
                    "CIDR": "10.0.0.4/32",
                    "MBits": 1000,
                    "ReservedPorts": [{"Label": "ssh", "Value": 22}],
                    "DynamicPorts": null
                }]
            },
            "Reserved": null
        }))
        .unwrap()
        .unwrap();

        assert!(node.is_ready());
        assert_eq!(node.http_addr.as_deref(), Some("10.0.0.4:4646"));
        assert_eq!(node.status_updated_at.unwrap().timestamp(), 1_495_000_000);
        assert_eq!(node.attributes["kernel.name"], "linux");
        assert_eq!(node.reserved, None);

        let resources = node.resources.unwrap();
        assert_eq!(resources.memory.unwrap().gigabytes(), 1.024);
        let network = &resources.networks[0];
        assert_eq!(network.megabits.unwrap().megabits(), 1000.0);
        assert_eq!(network.reserved_ports[0].value, Some(22));
        assert!(network.dynamic_ports.is_empty());
    }

    #[test]
    fn test_node_evaluation() {
        let eval: NodeEvaluation = decode(&json!({
            "HeartbeatTTL": 15000000000u64,
            "EvalIDs": null,
            "Servers": [{"RPCAdvertiseAddr": "10.0.0.1:4647", "Datacenter": "dc1"}],
            "KnownLeader": true
        }))
        .unwrap()
        .unwrap();
        assert_eq!(eval.heartbeat_ttl.unwrap().seconds(), 15.0);
        assert!(eval.eval_ids.is_empty());
        assert_eq!(eval.servers[0].datacenter.as_deref(), Some("dc1"));
    }
}
