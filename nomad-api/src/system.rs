//! Cluster maintenance and job validation.

use nomad_decode::{record, NilAsArray, StringAsNil};
use nomad_http::{Body, Method, Result};

use crate::path::required;
use crate::Nomad;

/// System maintenance endpoints.
#[derive(Debug, Clone, Copy)]
pub struct System<'a> {
    api: &'a Nomad,
}

impl<'a> System<'a> {
    pub(crate) fn new(api: &'a Nomad) -> Self {
        Self { api }
    }

    /// Start garbage collection of jobs, evaluations, allocations and nodes.
    /// Collection runs asynchronously on the server.
    pub async fn gc(&self) -> Result<()> {
        self.api.send(Method::PUT, "/v1/system/gc", Body::None).await?;
        Ok(())
    }

    /// Reconcile the summaries of all registered jobs.
    pub async fn reconcile_summaries(&self) -> Result<()> {
        self.api
            .send(Method::PUT, "/v1/system/reconcile/summaries", Body::None)
            .await?;
        Ok(())
    }
}

/// Validation endpoints.
#[derive(Debug, Clone, Copy)]
pub struct Validate<'a> {
    api: &'a Nomad,
}

impl<'a> Validate<'a> {
    pub(crate) fn new(api: &'a Nomad) -> Self {
        Self { api }
    }

    /// Validate a job document without registering it.
    pub async fn job(&self, payload: impl Into<Body>) -> Result<JobValidation> {
        let json = self
            .api
            .send(Method::POST, "/v1/validate/job", payload.into())
            .await?;
        required(&json)
    }
}

record! {
    pub struct JobValidation {
        driver_config_validated: Option<bool> = "DriverConfigValidated",
        validation_errors: Vec<String> = "ValidationErrors" => NilAsArray,
        error: Option<String> = "Error" => StringAsNil,
    }
}

impl JobValidation {
    /// Whether the server reported any problem with the job.
    pub fn is_errored(&self) -> bool {
        self.error.is_some() || !self.validation_errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nomad_decode::decode;
    use serde_json::json;

    #[test]
    fn test_validation_outcome() {
        let clean: JobValidation = decode(&json!({
            "DriverConfigValidated": true,
            "ValidationErrors": null,
            "Error": ""
        }))
        .unwrap()
        .unwrap();
        assert!(!clean.is_errored());

        let broken: JobValidation = decode(&json!({
            "ValidationErrors": ["1 error(s) occurred:\n\n* Missing job datacenters"],
            "Error": "1 error(s) occurred"
        }))
        .unwrap()
        .unwrap();
        assert!(broken.is_errored());
        assert_eq!(broken.validation_errors.len(), 1);
    }
}
