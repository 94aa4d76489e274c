//! End-to-end dispatch tests over the REST transport.
//!
//! These use wiremock to simulate the document store and dead local ports
//! to provoke connection-level failures.

use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use quarry_client::{CallOptions, Client, ClientError, Settings};

fn rest_client(hosts: Vec<String>) -> Client {
    let settings: Settings =
        serde_json::from_value(json!({ "rest": { "hosts": hosts } })).unwrap();
    Client::new(settings).unwrap()
}

fn authority(server: &MockServer) -> String {
    server.address().to_string()
}

// Nothing listens on the discard port; connects are refused immediately.
const DEAD_HOST: &str = "127.0.0.1:9";

#[tokio::test]
async fn get_returns_parsed_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/idx/person/brian"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_id": "brian",
            "exists": true,
            "_source": { "name": "Brian", "color": "blue" }
        })))
        .mount(&server)
        .await;

    let client = rest_client(vec![authority(&server)]);
    let response = client
        .get("/idx/person/brian", CallOptions::new())
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.body["_source"]["name"], "Brian");
}

#[tokio::test]
async fn query_parameters_are_url_encoded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/idx/_search"))
        .and(query_param("q", "name:brian"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "hits": [] })))
        .mount(&server)
        .await;

    let client = rest_client(vec![authority(&server)]);
    let response = client
        .get("/idx/_search", CallOptions::new().query("q", "name:brian"))
        .await
        .unwrap();

    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn post_forwards_the_serialized_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/idx/person/_search"))
        .and(body_string_contains("match_all"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "hits": { "total": 0 } })))
        .mount(&server)
        .await;

    let client = rest_client(vec![authority(&server)]);
    let response = client
        .post(
            "/idx/person/_search",
            CallOptions::with_body(json!({"query": {"match_all": {}}})),
        )
        .await
        .unwrap();

    assert_eq!(response.body["hits"]["total"], 0);
}

#[tokio::test]
async fn error_status_surfaces_with_code_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/idx/person/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "exists": false })))
        .mount(&server)
        .await;

    let client = rest_client(vec![authority(&server)]);
    let err = client
        .get("/idx/person/missing", CallOptions::new())
        .await
        .unwrap_err();

    match err {
        ClientError::HttpStatus { status, body } => {
            assert_eq!(status, 404);
            assert!(body.contains("exists"));
        }
        other => panic!("expected HttpStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn head_synthesizes_a_status_payload() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/idx/person/brian"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = rest_client(vec![authority(&server)]);
    let response = client
        .head("/idx/person/brian", CallOptions::new())
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.body, json!({ "statusCode": 200 }));
}

#[tokio::test]
async fn failover_rotates_to_the_next_host_and_stays_there() {
    let server = MockServer::start().await;
    // Both calls land on the healthy host: the first after one rotation,
    // the second because the cursor stays where the success happened.
    Mock::given(method("GET"))
        .and(path("/idx/person/brian"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "_id": "brian" })))
        .expect(2)
        .mount(&server)
        .await;

    let client = rest_client(vec![DEAD_HOST.to_string(), authority(&server)]);

    let first = client
        .get("/idx/person/brian", CallOptions::new())
        .await
        .unwrap();
    assert_eq!(first.status, 200);

    let second = client
        .get("/idx/person/brian", CallOptions::new())
        .await
        .unwrap();
    assert_eq!(second.status, 200);
}

#[tokio::test]
async fn exhausted_rotation_surfaces_a_connection_error() {
    let client = rest_client(vec![DEAD_HOST.to_string(), "127.0.0.1:10".to_string()]);
    let err = client
        .get("/idx/person/brian", CallOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Connection(_)));
}

#[tokio::test]
async fn pinned_host_never_fails_over() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/idx/person/brian"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "_id": "brian" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = rest_client(vec![authority(&server), DEAD_HOST.to_string()]);

    // Pinned to a dead host: the error surfaces instead of rotating to the
    // healthy configured host.
    let err = client
        .get(
            "/idx/person/brian",
            CallOptions::new().pin_host(DEAD_HOST),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Connection(_)));

    // The cursor never moved: an unpinned call still uses the first host.
    let response = client
        .get("/idx/person/brian", CallOptions::new())
        .await
        .unwrap();
    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn timeout_surfaces_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/idx/person/brian"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "_id": "brian" }))
                .set_delay(std::time::Duration::from_millis(500)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = rest_client(vec![authority(&server)]);
    let err = client
        .get(
            "/idx/person/brian",
            CallOptions::new().timeout_ms(50),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Timeout(50)));
}

#[tokio::test]
async fn timeout_during_body_read_is_a_timeout_and_never_rotates() {
    // A host that answers with headers, then stalls before the body.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let stalling = listener.local_addr().unwrap().to_string();
    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            let _ = socket
                .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 100\r\n\r\n")
                .await;
            tokio::time::sleep(std::time::Duration::from_secs(5)).await;
        }
    });

    // The healthy second host must never be consulted: a timeout is not a
    // failover trigger, wherever in the exchange it fires.
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/idx/person/brian"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "_id": "brian" })))
        .expect(0)
        .mount(&server)
        .await;

    let client = rest_client(vec![stalling, authority(&server)]);
    let err = client
        .get(
            "/idx/person/brian",
            CallOptions::new().timeout_ms(200),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Timeout(200)));
}

#[tokio::test]
async fn malformed_body_is_not_reinterpreted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/idx/person/brian"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let client = rest_client(vec![authority(&server)]);
    let err = client
        .get("/idx/person/brian", CallOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::MalformedResponse(_)));
}
