//! Transport behavior against mock and raw TCP servers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use nomad_http::{
    Body, ClientConfig, Error, Method, NomadClient, ProxySettings, RequestOptions, RetryPolicy,
    TlsSettings,
};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_retry(attempts: u32) -> RetryPolicy {
    RetryPolicy::new(attempts, Duration::from_millis(1), Duration::from_millis(5))
}

fn client_for(server: &MockServer) -> NomadClient {
    NomadClient::new(
        ClientConfig::builder()
            .address(server.uri())
            .retry(fast_retry(2))
            .build(),
    )
    .unwrap()
}

#[tokio::test]
async fn test_get_returns_parsed_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/status/leader"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("127.0.0.1:4647")))
        .expect(1)
        .mount(&server)
        .await;

    let leader = assert_ok!(client_for(&server).get("/v1/status/leader").await);
    assert_eq!(leader, json!("127.0.0.1:4647"));
}

#[tokio::test]
async fn test_query_string_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/jobs"))
        .and(query_param("prefix", "web app"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let jobs = client_for(&server).get("/v1/jobs?prefix=web%20app").await.unwrap();
    assert_eq!(jobs, json!([]));
}

#[tokio::test]
async fn test_empty_body_is_null() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    assert_eq!(client_for(&server).delete("/v1/job/web").await.unwrap(), Value::Null);
}

#[tokio::test]
async fn test_token_and_json_body_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/jobs"))
        .and(header("X-Nomad-Token", "secret"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"Job": {"ID": "web"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"EvalID": "e1"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = NomadClient::new(
        ClientConfig::builder()
            .address(server.uri())
            .token("secret")
            .build(),
    )
    .unwrap();
    let reply = client.put("/v1/jobs", json!({"Job": {"ID": "web"}})).await.unwrap();
    assert_eq!(reply["EvalID"], "e1");
}

#[tokio::test]
async fn test_per_call_token_override() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("X-Nomad-Token", "other"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(true)))
        .expect(1)
        .mount(&server)
        .await;

    let options = RequestOptions::new().token("other");
    let reply = client_for(&server)
        .execute(Method::GET, "/v1/acl/token/self", Body::None, &options)
        .await
        .unwrap();
    assert_eq!(reply, json!(true));
}

#[tokio::test]
async fn test_redirect_replays_verb_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/old"))
        .respond_with(
            ResponseTemplate::new(307).insert_header("Location", "/v1/status/leader"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/status/leader"))
        .and(body_json(json!({"Ping": 1})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("127.0.0.1:4647")))
        .expect(1)
        .mount(&server)
        .await;

    let reply = client_for(&server).post("/v1/old", json!({"Ping": 1})).await.unwrap();
    assert_eq!(reply, json!("127.0.0.1:4647"));
}

#[tokio::test]
async fn test_redirect_to_another_server() {
    let target = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/status/leader"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("127.0.0.1:4647")))
        .expect(1)
        .mount(&target)
        .await;

    let origin = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(307)
                .insert_header("Location", format!("{}/v1/status/leader", target.uri()).as_str()),
        )
        .mount(&origin)
        .await;

    let reply = client_for(&origin).get("/v1/status/leader").await.unwrap();
    assert_eq!(reply, json!("127.0.0.1:4647"));
}

#[tokio::test]
async fn test_cross_origin_redirect_drops_credentials() {
    let target = MockServer::start().await;
    Mock::given(header("X-Nomad-Token", "secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("leaked")))
        .expect(0)
        .mount(&target)
        .await;
    Mock::given(header("X-Trace", "abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("leaked")))
        .expect(0)
        .mount(&target)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/status/leader"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("clean")))
        .expect(1)
        .mount(&target)
        .await;

    let origin = MockServer::start().await;
    Mock::given(header("X-Nomad-Token", "secret-token"))
        .and(header("X-Trace", "abc"))
        .respond_with(
            ResponseTemplate::new(307)
                .insert_header("Location", format!("{}/v1/status/leader", target.uri()).as_str()),
        )
        .expect(1)
        .mount(&origin)
        .await;

    let client = NomadClient::new(
        ClientConfig::builder()
            .address(origin.uri())
            .token("secret-token")
            .retry(fast_retry(1))
            .build(),
    )
    .unwrap();
    let options = RequestOptions::new().header("X-Trace", "abc");
    let reply = client
        .execute(Method::GET, "/v1/status/leader", Body::None, &options)
        .await
        .unwrap();
    assert_eq!(reply, json!("clean"));
}

#[tokio::test]
async fn test_same_origin_redirect_keeps_token() {
    let server = MockServer::start().await;
    Mock::given(path("/v1/agent/self"))
        .respond_with(ResponseTemplate::new(307).insert_header("Location", "/v1/status/leader"))
        .mount(&server)
        .await;
    Mock::given(path("/v1/status/leader"))
        .and(header("X-Nomad-Token", "secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("127.0.0.1:4647")))
        .expect(1)
        .mount(&server)
        .await;

    let client = NomadClient::new(
        ClientConfig::builder()
            .address(server.uri())
            .token("secret-token")
            .retry(fast_retry(1))
            .build(),
    )
    .unwrap();
    let reply = client.get("/v1/agent/self").await.unwrap();
    assert_eq!(reply, json!("127.0.0.1:4647"));
}

#[tokio::test]
async fn test_redirect_loop_is_a_connection_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/loop"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/loop"))
        .expect(1 + nomad_http::MAX_REDIRECTS as u64)
        .mount(&server)
        .await;

    let err = assert_err!(client_for(&server).get("/loop").await);
    assert!(err.is_connection());
    assert!(err.to_string().contains("too many redirects"));
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string("job not found"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server).get("/v1/job/missing").await.unwrap_err();
    match &err {
        Error::Client(failure) => {
            assert_eq!(failure.code, 404);
            assert_eq!(failure.address, server.uri());
            assert_eq!(failure.errors, vec!["job not found"]);
        }
        other => panic!("expected a client error, got {other:?}"),
    }
    assert!(err.to_string().contains("  * job not found"));
}

#[tokio::test]
async fn test_server_errors_retry_until_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .with_priority(1)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let reply = client_for(&server).get("/v1/agent/self").await.unwrap();
    assert_eq!(reply["ok"], true);
}

#[tokio::test]
async fn test_server_errors_surface_after_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({"errors": ["leader unknown"]})))
        .expect(3)
        .mount(&server)
        .await;

    let err = client_for(&server).get("/v1/status/leader").await.unwrap_err();
    assert!(matches!(err, Error::Server(_)));
    assert_eq!(err.status_code(), Some(503));
    assert_eq!(err.errors(), ["leader unknown"]);
}

#[tokio::test]
async fn test_connection_refused() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let address = format!("http://127.0.0.1:{port}");
    let client = NomadClient::new(ClientConfig::builder().address(&address).build()).unwrap();

    let err = client.get("/v1/status/leader").await.unwrap_err();
    match &err {
        Error::Connection { address: reported, .. } => assert_eq!(reported, &address),
        other => panic!("expected a connection error, got {other:?}"),
    }
    assert!(err.to_string().contains(&format!("`{address}'")));
}

#[tokio::test]
async fn test_read_timeout_is_a_connection_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let client = NomadClient::new(
        ClientConfig::builder()
            .address(format!("http://127.0.0.1:{port}"))
            .read_timeout(Duration::from_millis(50))
            .build(),
    )
    .unwrap();

    let err = client.get("/").await.unwrap_err();
    assert!(err.is_connection(), "unexpected error: {err:?}");
    server.abort();
}

#[tokio::test]
async fn test_exhausted_pool_fails_after_open_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!("slow"))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let client = NomadClient::new(
        ClientConfig::builder()
            .address(server.uri())
            .pool_size(1)
            .open_timeout(Duration::from_millis(50))
            .build(),
    )
    .unwrap();

    let slow = client.get("/v1/slow");
    let blocked = async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        client.get("/v1/slow").await
    };
    let (first, second) = tokio::join!(slow, blocked);

    assert_eq!(first.unwrap(), json!("slow"));
    let err = second.unwrap_err();
    assert!(err.is_connection());
    assert!(err.to_string().contains("waiting for a free connection"));
}

#[tokio::test]
async fn test_requests_go_through_proxy_with_credentials() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let proxy = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut head = Vec::new();
        let mut chunk = [0u8; 1024];
        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
            let read = socket.read(&mut chunk).await.unwrap();
            assert!(read > 0, "connection closed before the request head");
            head.extend_from_slice(&chunk[..read]);
        }
        socket
            .write_all(
                b"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 15\r\n\r\n\"10.0.0.1:4647\"",
            )
            .await
            .unwrap();
        String::from_utf8(head).unwrap()
    });

    let mut settings = ProxySettings::new("127.0.0.1");
    settings.port = Some(port);
    settings.username = Some("ops".into());
    settings.password = Some("secret".into());
    let client = NomadClient::new(
        ClientConfig::builder()
            .address("http://nomad.internal:4646")
            .proxy(settings)
            .retry(fast_retry(1))
            .build(),
    )
    .unwrap();

    let reply = client.get("/v1/status/leader").await.unwrap();
    assert_eq!(reply, json!("10.0.0.1:4647"));

    let head = proxy.await.unwrap().to_ascii_lowercase();
    assert!(
        head.starts_with("get http://nomad.internal:4646/v1/status/leader http/1.1\r\n"),
        "request was not in absolute form: {head}"
    );
    assert!(head.contains("proxy-authorization: basic b3bzonnly3jlda=="), "{head}");
}

/// Accept and drop every connection, counting them.
async fn counting_listener() -> (u16, Arc<AtomicUsize>, tokio::task::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let accepted = Arc::new(AtomicUsize::new(0));
    let counter = accepted.clone();
    let server = tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            drop(socket);
        }
    });
    (port, accepted, server)
}

#[tokio::test]
async fn test_server_name_connects_to_configured_host() {
    let (port, accepted, server) = counting_listener().await;
    let address = format!("https://127.0.0.1:{port}");
    let client = NomadClient::new(
        ClientConfig::builder()
            .address(&address)
            .server_name("nomad.test.invalid")
            .retry(fast_retry(1))
            .build(),
    )
    .unwrap();

    let err = client.get("/v1/status/leader").await.unwrap_err();
    assert!(err.is_connection(), "unexpected error: {err:?}");
    assert_eq!(err.address(), Some(address.as_str()));
    assert_eq!(accepted.load(Ordering::SeqCst), 1);

    // A per-call TLS override keeping the server name stays pinned too.
    let options = RequestOptions::new().tls(TlsSettings {
        verify: false,
        server_name: Some("nomad.test.invalid".into()),
        ..Default::default()
    });
    let err = client
        .execute(Method::GET, "/v1/status/leader", Body::None, &options)
        .await
        .unwrap_err();
    assert!(err.is_connection(), "unexpected error: {err:?}");
    assert_eq!(err.address(), Some(address.as_str()));
    assert_eq!(accepted.load(Ordering::SeqCst), 2);

    server.abort();
}

#[tokio::test]
async fn test_tls_override_without_server_name_uses_address() {
    let (port, accepted, server) = counting_listener().await;
    let address = format!("https://127.0.0.1:{port}");
    let client = NomadClient::new(
        ClientConfig::builder()
            .address(&address)
            .retry(fast_retry(1))
            .build(),
    )
    .unwrap();

    let options = RequestOptions::new().tls(TlsSettings {
        verify: false,
        ..Default::default()
    });
    let err = assert_err!(
        client
            .execute(Method::GET, "/v1/status/leader", Body::None, &options)
            .await
    );
    assert_eq!(err.address(), Some(address.as_str()));
    assert_eq!(accepted.load(Ordering::SeqCst), 1);

    server.abort();
}
