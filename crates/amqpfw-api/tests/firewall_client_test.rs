#![allow(clippy::unwrap_used)]
// Integration tests for `ApiClient` firewall endpoints using wiremock.

use std::time::Duration;

use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{basic_auth, body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use amqpfw_api::{ApiClient, Error, FirewallApi, RetryPolicy, Retrying, RuleParams};

// ── Helpers ─────────────────────────────────────────────────────────

const FIREWALL_PATH: &str = "/api/instances/42/security/firewall";

async fn setup() -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let client = ApiClient::with_client(
        &server.uri(),
        SecretString::from("test-key"),
        reqwest::Client::new(),
    )
    .unwrap();
    (server, client)
}

fn default_rule() -> RuleParams {
    RuleParams {
        services: vec!["AMQP".into()],
        ports: vec![5672],
        ip: "10.0.0.0/24".into(),
        description: Some("default".into()),
    }
}

// ── Happy-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_create_posts_full_rule_list_with_basic_auth() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(FIREWALL_PATH))
        .and(basic_auth("", "test-key"))
        .and(body_json(json!([{
            "services": ["AMQP"],
            "ports": [5672],
            "ip": "10.0.0.0/24",
            "description": "default"
        }])))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    client
        .create_firewall_settings(42, &[default_rule()])
        .await
        .unwrap();
}

#[tokio::test]
async fn test_read_decodes_rules() {
    let (server, client) = setup().await;

    let body = json!([
        {
            "services": ["AMQP", "AMQPS"],
            "ports": [],
            "ip": "10.56.72.0/24",
            "description": "office"
        },
        { "ip": "192.168.0.1/32" }
    ]);

    Mock::given(method("GET"))
        .and(path(FIREWALL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let rules = client.read_firewall_settings(42).await.unwrap();

    assert_eq!(rules.len(), 2);
    assert_eq!(rules[0].services, vec!["AMQP", "AMQPS"]);
    assert_eq!(rules[0].description.as_deref(), Some("office"));
    assert!(rules[1].services.is_empty());
    assert!(rules[1].ports.is_empty());
    assert_eq!(rules[1].ip, "192.168.0.1/32");
}

#[tokio::test]
async fn test_update_puts_replacement_list() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path(FIREWALL_PATH))
        .and(body_json(json!([{ "services": [], "ports": [], "ip": "0.0.0.0/0" }])))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let rule = RuleParams {
        services: vec![],
        ports: vec![],
        ip: "0.0.0.0/0".into(),
        description: None,
    };
    client.update_firewall_settings(42, &[rule]).await.unwrap();
}

#[tokio::test]
async fn test_delete() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path(FIREWALL_PATH))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.delete_firewall_settings(42).await.unwrap();
}

// ── Error tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_error_401_unauthorized() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = client.read_firewall_settings(42).await;

    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_error_404_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client.read_firewall_settings(42).await.unwrap_err();

    assert!(err.is_not_found(), "expected not found, got: {err:?}");
    match err {
        Error::NotFound { path } => assert_eq!(path, FIREWALL_PATH),
        other => panic!("expected NotFound, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_error_400_carries_server_message() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "error": "Invalid ip address" })),
        )
        .mount(&server)
        .await;

    let err = client
        .create_firewall_settings(42, &[default_rule()])
        .await
        .unwrap_err();

    match err {
        Error::Api { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Invalid ip address");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_error_429_reads_retry_after() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
        .mount(&server)
        .await;

    let err = client
        .update_firewall_settings(42, &[default_rule()])
        .await
        .unwrap_err();

    assert!(
        matches!(err, Error::RateLimited { retry_after_secs: 7 }),
        "expected RateLimited, got: {err:?}"
    );
}

#[tokio::test]
async fn test_malformed_body_keeps_raw_text() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    match client.read_firewall_settings(42).await {
        Err(Error::Deserialization { body, .. }) => assert_eq!(body, "not json"),
        other => panic!("expected Deserialization error, got: {other:?}"),
    }
}

// ── Retry decorator over HTTP ───────────────────────────────────────

fn fast_policy(max_retries: u32) -> RetryPolicy {
    RetryPolicy {
        max_retries,
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
    }
}

#[tokio::test]
async fn test_retrying_recovers_from_server_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(FIREWALL_PATH))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(FIREWALL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "ip": "0.0.0.0/0" }])))
        .expect(1)
        .mount(&server)
        .await;

    let api = Retrying::new(client, fast_policy(3));
    let rules = api.read_firewall_settings(42).await.unwrap();

    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].ip, "0.0.0.0/0");
}

#[tokio::test]
async fn test_retrying_does_not_retry_client_errors() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "error": "bad" })))
        .expect(1)
        .mount(&server)
        .await;

    let api = Retrying::new(client, fast_policy(3));
    let err = api
        .create_firewall_settings(42, &[default_rule()])
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(400));
}
