//! Integration tests using mock HTTP server
//!
//! Tests the full end-to-end flow: config → token exchange → API call →
//! envelope inspection and token refresh

use serde_json::json;
use std::io::Write;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use wecom::address_book::User;
use wecom::{ClientConfig, Credential, Error, HttpClient, Operation};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Helpers
// ============================================================================

fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig::builder("ww-corp", "corp-secret")
        .base_url(server.uri())
        .build()
}

fn token_body(token: &str) -> serde_json::Value {
    json!({
        "errcode": 0,
        "errmsg": "ok",
        "access_token": token,
        "expires_in": 7200
    })
}

async fn mount_token(server: &MockServer, token: &str, expected: u64) {
    Mock::given(method("GET"))
        .and(path("/cgi-bin/gettoken"))
        .and(query_param("corpid", "ww-corp"))
        .and(query_param("corpsecret", "corp-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body(token)))
        .expect(expected)
        .mount(server)
        .await;
}

// ============================================================================
// Token lifecycle
// ============================================================================

#[tokio::test]
async fn test_first_call_acquires_then_reuses_token() {
    let server = MockServer::start().await;
    mount_token(&server, "T1", 1).await;

    Mock::given(method("GET"))
        .and(path("/cgi-bin/department/list"))
        .and(query_param("access_token", "T1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errcode": 0,
            "errmsg": "ok",
            "department": [{"id": 1, "name": "总部", "parentid": 0, "order": 1}]
        })))
        .expect(3)
        .mount(&server)
        .await;

    let client = HttpClient::new(config_for(&server)).unwrap();
    for _ in 0..3 {
        let departments = client.address_book().department_list(1).await.unwrap();
        assert_eq!(departments[0].name, "总部");
    }
    assert_eq!(client.credential().await.token, "T1");
}

#[tokio::test]
async fn test_expired_token_is_refreshed_and_call_resent() {
    let server = MockServer::start().await;
    mount_token(&server, "FRESH", 1).await;

    Mock::given(method("POST"))
        .and(path("/cgi-bin/user/get"))
        .and(query_param("access_token", "STALE"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"errcode": 42001, "errmsg": "access_token expired"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/cgi-bin/user/get"))
        .and(query_param("access_token", "FRESH"))
        .and(query_param("userid", "zhangsan"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errcode": 0,
            "errmsg": "ok",
            "userid": "zhangsan",
            "name": "张三"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(config_for(&server)).unwrap();
    client
        .set_credential(Credential::expires_in("STALE", 7200))
        .await;

    let user = client.address_book().get_member("zhangsan").await.unwrap();

    assert_eq!(user.name.as_deref(), Some("张三"));
    assert_eq!(client.credential().await.token, "FRESH");
}

#[tokio::test]
async fn test_invalid_token_message_triggers_refresh() {
    let server = MockServer::start().await;
    mount_token(&server, "FRESH", 1).await;

    Mock::given(path("/cgi-bin/user/delete"))
        .and(query_param("access_token", "STALE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errcode": 40082,
            "errmsg": "invalid access_token, not latest"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(path("/cgi-bin/user/delete"))
        .and(query_param("access_token", "FRESH"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"errcode": 0, "errmsg": "deleted"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(config_for(&server)).unwrap();
    client.set_credential(Credential::new("STALE", None)).await;

    client.address_book().delete_member("lisi").await.unwrap();
}

#[tokio::test]
async fn test_persistent_rejection_stops_at_attempt_limit() {
    let server = MockServer::start().await;
    mount_token(&server, "T", 3).await;

    Mock::given(path("/cgi-bin/user/get"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"errcode": 42001, "errmsg": "access_token expired"})),
        )
        .expect(3)
        .mount(&server)
        .await;

    let client = HttpClient::new(config_for(&server)).unwrap();
    let err = client
        .address_book()
        .get_member("zhangsan")
        .await
        .unwrap_err();

    match err {
        Error::CredentialRefreshExhausted {
            attempts, errcode, ..
        } => {
            assert_eq!(attempts, 3);
            assert_eq!(errcode, 42001);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_business_error_is_not_retried() {
    let server = MockServer::start().await;
    mount_token(&server, "T1", 0).await;

    Mock::given(path("/cgi-bin/user/create"))
        .and(body_json(json!({"userid": "zhangsan", "name": "张三"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errcode": 60102,
            "errmsg": "userid existed"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(config_for(&server)).unwrap();
    client.set_credential(Credential::new("T1", None)).await;

    let err = client
        .address_book()
        .create_member(&User::new("zhangsan", "张三"))
        .await
        .unwrap_err();

    assert_eq!(err.errcode(), Some(60102));
    assert!(matches!(err, Error::Api { .. }));
}

#[tokio::test]
async fn test_token_exchange_call_is_sent_without_access_token() {
    let server = MockServer::start().await;
    mount_token(&server, "T1", 1).await;

    let client = HttpClient::new(config_for(&server)).unwrap();
    let response: serde_json::Value = client
        .execute(
            Operation::get("/cgi-bin/gettoken")
                .query("corpid", "ww-corp")
                .query("corpsecret", "corp-secret"),
        )
        .await
        .unwrap();

    assert_eq!(response["access_token"], "T1");
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0]
        .url
        .query_pairs()
        .all(|(key, _)| key != "access_token"));
}

// ============================================================================
// Concurrency & cancellation
// ============================================================================

#[tokio::test]
async fn test_concurrent_first_calls_share_one_exchange() {
    let server = MockServer::start().await;

    Mock::given(path("/cgi-bin/gettoken"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(token_body("SHARED"))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(path("/cgi-bin/department/list"))
        .and(query_param("access_token", "SHARED"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errcode": 0,
            "errmsg": "ok",
            "department": []
        })))
        .expect(8)
        .mount(&server)
        .await;

    let client = HttpClient::new(config_for(&server)).unwrap();
    let book = client.address_book();
    let calls = (0..8).map(|_| book.department_list(1));
    let results = futures::future::join_all(calls).await;

    assert!(results.iter().all(Result::is_ok));
}

#[tokio::test]
async fn test_cancellation_abandons_slow_call() {
    let server = MockServer::start().await;
    mount_token(&server, "T1", 0).await;

    Mock::given(path("/cgi-bin/user/get"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"errcode": 0, "errmsg": "ok", "userid": "slow"}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let client = HttpClient::new(config_for(&server)).unwrap();
    client.set_credential(Credential::new("T1", None)).await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let err = client
        .address_book()
        .with_cancellation(cancel)
        .get_member("slow")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Cancelled));
    assert!(started.elapsed() < Duration::from_secs(2));
}

// ============================================================================
// Transport failures
// ============================================================================

#[tokio::test]
async fn test_non_json_response_is_decode_error() {
    let server = MockServer::start().await;
    mount_token(&server, "T1", 0).await;

    Mock::given(path("/cgi-bin/user/get"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(config_for(&server)).unwrap();
    client.set_credential(Credential::new("T1", None)).await;

    let err = client
        .address_book()
        .get_member("zhangsan")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Decode { .. }));
}

#[tokio::test]
async fn test_token_endpoint_rejection() {
    let server = MockServer::start().await;

    Mock::given(path("/cgi-bin/gettoken"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"errcode": 40001, "errmsg": "invalid secret"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(path("/cgi-bin/user/get"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"errcode": 0})))
        .expect(0)
        .mount(&server)
        .await;

    let client = HttpClient::new(config_for(&server)).unwrap();
    let err = client
        .address_book()
        .get_member("zhangsan")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::AcquisitionFailed {
            errcode: Some(40001),
            ..
        }
    ));
}

// ============================================================================
// Configuration
// ============================================================================

#[tokio::test]
async fn test_client_from_yaml_file() {
    let server = MockServer::start().await;
    mount_token(&server, "FROM-FILE", 1).await;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "base_url: {}\nenterprise_id: ww-corp\nagent_secret: corp-secret\nmax_attempts: 2\nbackoff:\n  type: constant\n  initial_ms: 0",
        server.uri()
    )
    .unwrap();

    let config = ClientConfig::from_file(file.path()).unwrap();
    assert_eq!(config.max_attempts, 2);

    let client = HttpClient::new(config).unwrap();
    let credential = client.refresh_access_token().await.unwrap();
    assert_eq!(credential.token, "FROM-FILE");
    assert!(credential.expires_at.is_some());
}

#[test]
fn test_invalid_config_is_rejected() {
    let err = HttpClient::new(ClientConfig::new("", "secret")).unwrap_err();
    assert!(matches!(err, Error::MissingConfigField { .. }));

    let err = HttpClient::new(
        ClientConfig::builder("ww", "secret")
            .base_url("ftp://example.com")
            .build(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::Config { .. }));
}
