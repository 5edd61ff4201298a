//! Evaluations: scheduler decisions triggered by job or node changes.

use std::collections::BTreeMap;

use nomad_decode::{record, NanosecondsAsDuration, StringAsNil, StringifyKeys};
use nomad_http::Result;
use nomad_units::Duration;
use serde_json::Value;

use crate::allocation::Alloc;
use crate::path::{list, optional, segment, with_query};
use crate::Nomad;

/// Status of an evaluation the scheduler has finished with.
pub const STATUS_COMPLETE: &str = "complete";

/// Evaluation endpoints.
#[derive(Debug, Clone, Copy)]
pub struct Evaluations<'a> {
    api: &'a Nomad,
}

impl<'a> Evaluations<'a> {
    pub(crate) fn new(api: &'a Nomad) -> Self {
        Self { api }
    }

    /// List evaluations, optionally only those whose ID starts with `prefix`.
    pub async fn list(&self, prefix: Option<&str>) -> Result<Vec<Eval>> {
        let json = self
            .api
            .get(&with_query("/v1/evaluations", [("prefix", prefix)]))
            .await?;
        list(&json)
    }

    /// Read one evaluation.
    pub async fn read(&self, id: &str) -> Result<Option<Eval>> {
        let json = self
            .api
            .get(&format!("/v1/evaluation/{}", segment(id)))
            .await?;
        optional(&json)
    }

    /// Allocations created or updated by the evaluation.
    pub async fn allocations_for(&self, id: &str) -> Result<Vec<Alloc>> {
        let json = self
            .api
            .get(&format!("/v1/evaluation/{}/allocations", segment(id)))
            .await?;
        list(&json)
    }
}

record! {
    pub struct Eval {
        id: Option<String> = "ID" => StringAsNil,
        priority: Option<i64> = "Priority",
        eval_type: Option<String> = "Type" => StringAsNil,
        triggered_by: Option<String> = "TriggeredBy" => StringAsNil,
        job_id: Option<String> = "JobID" => StringAsNil,
        job_modify_index: Option<u64> = "JobModifyIndex",
        node_id: Option<String> = "NodeID" => StringAsNil,
        node_modify_index: Option<u64> = "NodeModifyIndex",
        status: Option<String> = "Status" => StringAsNil,
        status_description: Option<String> = "StatusDescription" => StringAsNil,
        wait: Option<Duration> = "Wait" => NanosecondsAsDuration,
        next_eval: Option<String> = "NextEval" => StringAsNil,
        previous_eval: Option<String> = "PreviousEval" => StringAsNil,
        blocked_eval: Option<String> = "BlockedEval" => StringAsNil,
        failed_tg_allocs: BTreeMap<String, Value> = "FailedTGAllocs" => StringifyKeys,
        class_eligibility: BTreeMap<String, Value> = "ClassEligibility" => StringifyKeys,
        escaped_computed_class: Option<bool> = "EscapedComputedClass",
        annotate_plan: Option<bool> = "AnnotatePlan",
        queued_allocations: BTreeMap<String, Value> = "QueuedAllocations" => StringifyKeys,
        snapshot_index: Option<u64> = "SnapshotIndex",
        create_index: Option<u64> = "CreateIndex",
        modify_index: Option<u64> = "ModifyIndex",
    }
}

impl Eval {
    pub fn is_complete(&self) -> bool {
        self.status.as_deref() == Some(STATUS_COMPLETE)
    }
}
