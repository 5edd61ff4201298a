//! Allocations: the placement of a task group on a node.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use nomad_decode::{
    record, NanosecondsAsTimestamp, Nested, RecordMap, StringAsNil, StringifyKeys,
};
use nomad_http::Result;
use serde_json::Value;

use crate::job::JobVersion;
use crate::node::Resources;
use crate::path::{list, optional, segment, with_query};
use crate::Nomad;

/// Allocation endpoints.
#[derive(Debug, Clone, Copy)]
pub struct Allocations<'a> {
    api: &'a Nomad,
}

impl<'a> Allocations<'a> {
    pub(crate) fn new(api: &'a Nomad) -> Self {
        Self { api }
    }

    /// List allocations, optionally only those whose ID starts with `prefix`.
    pub async fn list(&self, prefix: Option<&str>) -> Result<Vec<Alloc>> {
        let json = self
            .api
            .get(&with_query("/v1/allocations", [("prefix", prefix)]))
            .await?;
        list(&json)
    }

    /// Read one allocation.
    pub async fn read(&self, id: &str) -> Result<Option<Alloc>> {
        let json = self
            .api
            .get(&format!("/v1/allocation/{}", segment(id)))
            .await?;
        optional(&json)
    }
}

record! {
    /// An allocation. List entries carry a subset of these fields.
    pub struct Alloc {
        id: Option<String> = "ID" => StringAsNil,
        eval_id: Option<String> = "EvalID" => StringAsNil,
        name: Option<String> = "Name" => StringAsNil,
        node_id: Option<String> = "NodeID" => StringAsNil,
        job_id: Option<String> = "JobID" => StringAsNil,
        job: Option<JobVersion> = "Job" => Nested,
        task_group: Option<String> = "TaskGroup" => StringAsNil,
        resources: Option<Resources> = "Resources" => Nested,
        shared_resources: Option<Resources> = "SharedResources" => Nested,
        task_resources: BTreeMap<String, Resources> = "TaskResources" => RecordMap,
        metrics: BTreeMap<String, Value> = "Metrics" => StringifyKeys,
        desired_status: Option<String> = "DesiredStatus" => StringAsNil,
        desired_description: Option<String> = "DesiredDescription" => StringAsNil,
        client_status: Option<String> = "ClientStatus" => StringAsNil,
        client_description: Option<String> = "ClientDescription" => StringAsNil,
        task_states: BTreeMap<String, Value> = "TaskStates" => StringifyKeys,
        previous_allocation: Option<String> = "PreviousAllocation" => StringAsNil,
        create_index: Option<u64> = "CreateIndex",
        modify_index: Option<u64> = "ModifyIndex",
        alloc_modify_index: Option<u64> = "AllocModifyIndex",
        create_time: Option<DateTime<Utc>> = "CreateTime" => NanosecondsAsTimestamp,
    }
}
