//! Jobs: listing, registration and full job specifications.

use std::collections::BTreeMap;

use base64::Engine;
use nomad_decode::{
    record, ArrayOfStrings, NanosecondsAsDuration, Nested, RecordMap, Records, SizeInMegabytes,
    StringAsNil, StringifyKeys,
};
use nomad_http::{Body, Method, Result};
use nomad_units::{Duration, Size};
use serde_json::Value;

use crate::node::Resources;
use crate::path::{list, optional, required, segment, with_query};
use crate::Nomad;

/// Status of a job with allocations in flight.
pub const STATUS_RUNNING: &str = "running";

/// Job endpoints.
#[derive(Debug, Clone, Copy)]
pub struct Jobs<'a> {
    api: &'a Nomad,
}

impl<'a> Jobs<'a> {
    pub(crate) fn new(api: &'a Nomad) -> Self {
        Self { api }
    }

    /// List jobs, optionally only those whose ID starts with `prefix`.
    pub async fn list(&self, prefix: Option<&str>) -> Result<Vec<JobItem>> {
        let json = self
            .api
            .get(&with_query("/v1/jobs", [("prefix", prefix)]))
            .await?;
        list(&json)
    }

    /// Register a job. `contents` is either a JSON document or its raw text.
    pub async fn create(&self, contents: impl Into<Body>) -> Result<JobCreate> {
        let json = self.api.send(Method::POST, "/v1/jobs", contents.into()).await?;
        required(&json)
    }

    /// Read the latest version of the job with the given ID.
    pub async fn read(&self, id: &str) -> Result<Option<JobVersion>> {
        let json = self.api.get(&format!("/v1/job/{}", segment(id))).await?;
        optional(&json)
    }
}

record! {
    /// One entry of the job list.
    pub struct JobItem {
        id: Option<String> = "ID" => StringAsNil,
        parent_id: Option<String> = "ParentID" => StringAsNil,
        name: Option<String> = "Name" => StringAsNil,
        job_type: Option<String> = "Type" => StringAsNil,
        priority: Option<i64> = "Priority",
        periodic: Option<bool> = "Periodic",
        parameterized: Option<bool> = "ParameterizedJob",
        stop: Option<bool> = "Stop",
        status: Option<String> = "Status" => StringAsNil,
        status_description: Option<String> = "StatusDescription" => StringAsNil,
        job_summary: Option<JobSummary> = "JobSummary" => Nested,
        create_index: Option<u64> = "CreateIndex",
        modify_index: Option<u64> = "ModifyIndex",
        job_modify_index: Option<u64> = "JobModifyIndex",
    }
}

impl JobItem {
    pub fn is_running(&self) -> bool {
        self.status.as_deref() == Some(STATUS_RUNNING)
    }
}

record! {
    /// Allocation counts per task group.
    pub struct JobSummary {
        job_id: Option<String> = "JobID" => StringAsNil,
        summary: BTreeMap<String, JobTaskGroupSummary> = "Summary" => RecordMap,
        children: Option<JobChildren> = "Children" => Nested,
        create_index: Option<u64> = "CreateIndex",
        modify_index: Option<u64> = "ModifyIndex",
    }
}

record! {
    pub struct JobTaskGroupSummary {
        queued: Option<u64> = "Queued",
        complete: Option<u64> = "Complete",
        failed: Option<u64> = "Failed",
        running: Option<u64> = "Running",
        starting: Option<u64> = "Starting",
        lost: Option<u64> = "Lost",
    }
}

record! {
    /// Child job counts of a periodic or parameterized job.
    pub struct JobChildren {
        pending: Option<u64> = "Pending",
        running: Option<u64> = "Running",
        dead: Option<u64> = "Dead",
    }
}

record! {
    /// Result of registering a job.
    pub struct JobCreate {
        eval_id: Option<String> = "EvalID" => StringAsNil,
        eval_create_index: Option<u64> = "EvalCreateIndex",
        job_modify_index: Option<u64> = "JobModifyIndex",
        warnings: Option<String> = "Warnings" => StringAsNil,
        index: Option<u64> = "Index",
        last_contact: Option<i64> = "LastContact",
        known_leader: Option<bool> = "KnownLeader",
    }
}

record! {
    /// A full job specification at one version.
    pub struct JobVersion {
        stop: Option<bool> = "Stop",
        id: Option<String> = "ID" => StringAsNil,
        parent_id: Option<String> = "ParentID" => StringAsNil,
        name: Option<String> = "Name" => StringAsNil,
        job_type: Option<String> = "Type" => StringAsNil,
        priority: Option<i64> = "Priority",
        all_at_once: Option<bool> = "AllAtOnce",
        region: Option<String> = "Region" => StringAsNil,
        datacenters: Vec<String> = "Datacenters" => ArrayOfStrings,
        constraints: Vec<JobConstraint> = "Constraints" => Records,
        groups: Vec<JobTaskGroup> = "TaskGroups" => Records,
        update: Option<JobUpdate> = "Update" => Nested,
        periodic: Option<JobPeriodic> = "Periodic" => Nested,
        parameterized_job: Option<JobParameterizedJob> = "ParameterizedJob" => Nested,
        /// Base64 dispatch payload as sent by the server.
        payload_raw: Option<String> = "Payload" => StringAsNil,
        meta: BTreeMap<String, Value> = "Meta" => StringifyKeys,
        vault_token: Option<String> = "VaultToken" => StringAsNil,
        stable: Option<bool> = "Stable",
        status: Option<String> = "Status" => StringAsNil,
        status_description: Option<String> = "StatusDescription" => StringAsNil,
        version: Option<u64> = "Version",
        create_index: Option<u64> = "CreateIndex",
        modify_index: Option<u64> = "ModifyIndex",
        job_modify_index: Option<u64> = "JobModifyIndex",
    }
}

impl JobVersion {
    pub fn is_running(&self) -> bool {
        self.status.as_deref() == Some(STATUS_RUNNING)
    }

    /// The decoded dispatch payload. `None` when absent or not valid base64.
    pub fn payload(&self) -> Option<Vec<u8>> {
        let raw = self.payload_raw.as_deref()?;
        base64::engine::general_purpose::STANDARD.decode(raw).ok()
    }
}

record! {
    pub struct JobConstraint {
        l_target: Option<String> = "LTarget" => StringAsNil,
        r_target: Option<String> = "RTarget" => StringAsNil,
        operand: Option<String> = "Operand" => StringAsNil,
    }
}

record! {
    /// A group of tasks placed together on one node.
    pub struct JobTaskGroup {
        name: Option<String> = "Name" => StringAsNil,
        count: Option<u64> = "Count",
        constraints: Vec<JobConstraint> = "Constraints" => Records,
        tasks: Vec<JobTask> = "Tasks" => Records,
        restart_policy: Option<JobRestartPolicy> = "RestartPolicy" => Nested,
        ephemeral_disk: Option<JobEphemeralDisk> = "EphemeralDisk" => Nested,
        update: Option<JobUpdate> = "Update" => Nested,
        meta: BTreeMap<String, Value> = "Meta" => StringifyKeys,
    }
}

record! {
    /// Rolling update strategy.
    pub struct JobUpdate {
        stagger: Option<Duration> = "Stagger" => NanosecondsAsDuration,
        max_parallel: Option<u64> = "MaxParallel",
        health_check: Option<String> = "HealthCheck" => StringAsNil,
        min_healthy_time: Option<Duration> = "MinHealthyTime" => NanosecondsAsDuration,
        healthy_deadline: Option<Duration> = "HealthyDeadline" => NanosecondsAsDuration,
        auto_revert: Option<bool> = "AutoRevert",
        canary: Option<u64> = "Canary",
    }
}

record! {
    pub struct JobPeriodic {
        enabled: Option<bool> = "Enabled",
        spec: Option<String> = "Spec" => StringAsNil,
        spec_type: Option<String> = "SpecType" => StringAsNil,
        prohibit_overlap: Option<bool> = "ProhibitOverlap",
        timezone: Option<String> = "TimeZone" => StringAsNil,
    }
}

/// Dispatch payload requirement values.
pub const PAYLOAD_REQUIRED: &str = "required";
pub const PAYLOAD_OPTIONAL: &str = "optional";
pub const PAYLOAD_NONE: &str = "none";

record! {
    /// Dispatch contract of a parameterized job.
    pub struct JobParameterizedJob {
        payload: Option<String> = "Payload" => StringAsNil,
        meta_required: Vec<String> = "MetaRequired" => ArrayOfStrings,
        meta_optional: Vec<String> = "MetaOptional" => ArrayOfStrings,
    }
}

impl JobParameterizedJob {
    pub fn is_payload_required(&self) -> bool {
        self.payload.as_deref() == Some(PAYLOAD_REQUIRED)
    }

    pub fn is_payload_optional(&self) -> bool {
        self.payload.as_deref() == Some(PAYLOAD_OPTIONAL)
    }

    pub fn is_payload_none(&self) -> bool {
        self.payload.as_deref() == Some(PAYLOAD_NONE)
    }
}

record! {
    pub struct JobRestartPolicy {
        attempts: Option<u64> = "Attempts",
        interval: Option<Duration> = "Interval" => NanosecondsAsDuration,
        delay: Option<Duration> = "Delay" => NanosecondsAsDuration,
        mode: Option<String> = "Mode" => StringAsNil,
    }
}

record! {
    pub struct JobEphemeralDisk {
        sticky: Option<bool> = "Sticky",
        size: Option<Size> = "SizeMB" => SizeInMegabytes,
        migrate: Option<bool> = "Migrate",
    }
}

record! {
    /// A single unit of work run by a driver.
    pub struct JobTask {
        name: Option<String> = "Name" => StringAsNil,
        driver: Option<String> = "Driver" => StringAsNil,
        user: Option<String> = "User" => StringAsNil,
        config: BTreeMap<String, Value> = "Config" => StringifyKeys,
        constraints: Vec<JobConstraint> = "Constraints" => Records,
        env: BTreeMap<String, Value> = "Env" => StringifyKeys,
        services: Vec<JobService> = "Services" => Records,
        resources: Option<Resources> = "Resources" => Nested,
        meta: BTreeMap<String, Value> = "Meta" => StringifyKeys,
        kill_timeout: Option<Duration> = "KillTimeout" => NanosecondsAsDuration,
        log_config: Option<JobLogConfig> = "LogConfig" => Nested,
        artifacts: Vec<JobArtifact> = "Artifacts" => Records,
        vault: Option<JobVault> = "Vault" => Nested,
        templates: Vec<JobTemplate> = "Templates" => Records,
        dispatch_payload: Option<JobDispatchPayload> = "DispatchPayload" => Nested,
        leader: Option<bool> = "Leader",
    }
}

record! {
    pub struct JobLogConfig {
        max_files: Option<u64> = "MaxFiles",
        max_file_size: Option<Size> = "MaxFileSizeMB" => SizeInMegabytes,
    }
}

record! {
    /// A service registered for a task.
    pub struct JobService {
        name: Option<String> = "Name" => StringAsNil,
        tags: Vec<String> = "Tags" => ArrayOfStrings,
        port_label: Option<String> = "PortLabel" => StringAsNil,
        checks: Vec<JobServiceCheck> = "Checks" => Records,
    }
}

record! {
    /// A health check attached to a service.
    pub struct JobServiceCheck {
        name: Option<String> = "Name" => StringAsNil,
        check_type: Option<String> = "Type" => StringAsNil,
        command: Option<String> = "Command" => StringAsNil,
        args: Vec<String> = "Args" => ArrayOfStrings,
        path: Option<String> = "Path" => StringAsNil,
        protocol: Option<String> = "Protocol" => StringAsNil,
        port_label: Option<String> = "PortLabel" => StringAsNil,
        interval: Option<Duration> = "Interval" => NanosecondsAsDuration,
        timeout: Option<Duration> = "Timeout" => NanosecondsAsDuration,
        initial_status: Option<String> = "InitialStatus" => StringAsNil,
        tls_skip_verify: Option<bool> = "TLSSkipVerify",
    }
}

record! {
    pub struct JobArtifact {
        source: Option<String> = "GetterSource" => StringAsNil,
        options: BTreeMap<String, Value> = "GetterOptions" => StringifyKeys,
        destination: Option<String> = "RelativeDest" => StringAsNil,
    }
}

record! {
    pub struct JobVault {
        policies: Vec<String> = "Policies" => ArrayOfStrings,
        env: Option<bool> = "Env",
        change_mode: Option<String> = "ChangeMode" => StringAsNil,
        change_signal: Option<String> = "ChangeSignal" => StringAsNil,
    }
}

record! {
    pub struct JobTemplate {
        source: Option<String> = "SourcePath" => StringAsNil,
        destination: Option<String> = "DestPath" => StringAsNil,
        data: Option<String> = "EmbeddedTmpl" => StringAsNil,
        change_mode: Option<String> = "ChangeMode" => StringAsNil,
        change_signal: Option<String> = "ChangeSignal" => StringAsNil,
        splay: Option<Duration> = "Splay" => NanosecondsAsDuration,
        permissions: Option<String> = "Perms" => StringAsNil,
        left_delim: Option<String> = "LeftDelim" => StringAsNil,
        right_delim: Option<String> = "RightDelim" => StringAsNil,
        env: Option<bool> = "Envvars",
    }
}

record! {
    pub struct JobDispatchPayload {
        file: Option<String> = "File" => StringAsNil,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nomad_decode::{decode, Record};
    use serde_json::json;

    #[test]
    fn test_job_item() {
        let item: JobItem = decode(&json!({
            "ID": "example",
            "ParentID": "",
            "Type": "service",
            "Priority": 50,
            "Status": "running",
            "JobSummary": {
                "JobID": "example",
                "Summary": {"cache": {"Running": 1, "Queued": 0}},
                "Children": {"Pending": 0, "Running": 0, "Dead": 0}
            },
            "CreateIndex": 7
        }))
        .unwrap()
        .unwrap();

        assert_eq!(item.id.as_deref(), Some("example"));
        assert_eq!(item.parent_id, None);
        assert!(item.is_running());
        let summary = item.job_summary.unwrap();
        assert_eq!(summary.summary["cache"].running, Some(1));
        assert_eq!(summary.children.unwrap().dead, Some(0));
    }

    #[test]
    fn test_payload_is_base64() {
        let job: JobVersion = decode(&json!({"Payload": "aGVsbG8="})).unwrap().unwrap();
        assert_eq!(job.payload(), Some(b"hello".to_vec()));
        assert_eq!(JobVersion::default().payload(), None);
    }

    #[test]
    fn test_parameterized_job() {
        let job: JobParameterizedJob = decode(&json!({
            "Payload": "required",
            "MetaRequired": ["owner"],
            "MetaOptional": null
        }))
        .unwrap()
        .unwrap();
        assert!(job.is_payload_required());
        assert!(!job.is_payload_none());
        assert_eq!(job.meta_required, vec!["owner"]);
        assert!(job.meta_optional.is_empty());
    }

    #[test]
    fn test_renamed_fields() {
        let schema = JobVersion::SCHEMA;
        assert_eq!(schema.by_name("groups").unwrap().key, "TaskGroups");
        assert_eq!(schema.by_key("Type").unwrap().name, "job_type");
        assert!(!schema.by_key("AllAtOnce").unwrap().is_renamed());
    }
}
