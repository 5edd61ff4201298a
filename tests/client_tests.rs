//! End-to-end use of the façade crate against a mock agent.

use std::time::Duration as StdDuration;

use nomad::prelude::*;
use nomad::RetryPolicy;
use serde_json::json;
use tokio_test::assert_ok;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn nomad_for(server: &MockServer, attempts: u32) -> Nomad {
    let config = ClientConfig::builder()
        .address(server.uri())
        .retry(RetryPolicy::new(attempts, StdDuration::from_millis(1), StdDuration::from_millis(2)))
        .build();
    assert_ok!(Nomad::with_config(config))
}

#[tokio::test]
async fn test_allocation_with_units() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/allocation/203266e5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ID": "203266e5",
            "ClientStatus": "running",
            "Resources": {"CPU": 500, "MemoryMB": 2048, "DiskMB": 300},
            "Job": {
                "ID": "example",
                "TaskGroups": [{
                    "Name": "cache",
                    "Tasks": [{"Name": "redis", "KillTimeout": 90000000000u64}]
                }]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let alloc = nomad_for(&server, 0)
        .allocations()
        .read("203266e5")
        .await
        .unwrap()
        .unwrap();

    let memory: Size = alloc.resources.as_ref().unwrap().memory.unwrap();
    assert_eq!(memory.gigabytes(), 2.048);
    assert_eq!(memory.to_string(), "2GB");

    let job = alloc.job.as_ref().unwrap();
    let kill: Duration = job.groups[0].tasks[0].kill_timeout.unwrap();
    assert_eq!(kill.to_human(), "1m30s");

    let again: nomad::Alloc = nomad::decode::decode(&alloc.to_structural_form())
        .unwrap()
        .unwrap();
    assert_eq!(again, alloc);
}

#[tokio::test]
async fn test_server_errors_surface_after_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/status/leader"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({"errors": ["no cluster leader"]})))
        .expect(3)
        .mount(&server)
        .await;

    let err = nomad_for(&server, 2).status().leader().await.unwrap_err();
    assert!(matches!(err, Error::Server(_)));
    assert_eq!(err.status_code(), Some(503));
    assert_eq!(err.errors(), ["no cluster leader".to_string()]);
    assert!(err.to_string().contains("responded with a 503"));
}

#[tokio::test]
async fn test_per_handle_options() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/regions"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Permission denied"))
        .expect(1)
        .mount(&server)
        .await;

    let nomad = nomad_for(&server, 2).with_options(RequestOptions::new().token("expired"));
    let err = nomad.regions().list().await.unwrap_err();
    assert!(matches!(err, Error::Client(_)));
    assert_eq!(err.errors(), ["Permission denied".to_string()]);
}
