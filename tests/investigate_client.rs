//! Integration tests for the investigation API client against a mock server.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeDelta, TimeZone, Utc};
use crawlerbox::{Config, InvestigateClient, InvestigateError, QueryKind, TopDomains};
use log::Level;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use helpers::{init_log_capture, logs_for_current_thread};

fn client_for(server: &MockServer) -> InvestigateClient {
    let config = Config {
        investigate_url: server.uri(),
        investigate_token: Some("test-token".to_string()),
        timeout_seconds: 5,
        ..Default::default()
    };
    InvestigateClient::from_config(&config).expect("client should build")
}

async fn mount_json(server: &MockServer, route: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_pass_through_kinds_return_json_unmodified() {
    let server = MockServer::start().await;
    let security = json!({
        "dga_score": -47.5,
        "fastflux": false,
        "found": true,
        "geodiversity": [["IT", 0.5769], ["NL", 0.1538]],
        "attack": ""
    });
    let risk = json!({
        "risk_score": 19,
        "indicators": [{"indicator": "Lexical", "normalized_score": 61, "score": 0.615}]
    });
    let subdomains = json!([{"name": "mail.example.com", "firstSeen": 1700000000}]);
    let pdns = json!({"records": [{"rr": "1.2.3.4", "type": "A"}]});

    mount_json(&server, "/security/name/example.com", security.clone()).await;
    mount_json(&server, "/domains/risk-score/example.com", risk.clone()).await;
    mount_json(&server, "/subdomains/example.com", subdomains.clone()).await;
    mount_json(&server, "/pdns/raw/example.com", pdns.clone()).await;

    let client = client_for(&server);
    assert_eq!(
        client.security_info("example.com").await.unwrap(),
        Some(security)
    );
    assert_eq!(client.risk_score("example.com").await.unwrap(), Some(risk));
    assert_eq!(
        client.subdomains("example.com").await.unwrap(),
        Some(subdomains)
    );
    assert_eq!(client.passive_dns("example.com").await.unwrap(), Some(pdns));
}

#[tokio::test]
async fn test_bearer_token_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/security/name/example.com"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"found": true})))
        .expect(1)
        .mount(&server)
        .await;

    let result = client_for(&server)
        .invoke(QueryKind::SecurityInfo, "example.com")
        .await
        .unwrap();
    assert_eq!(result, Some(json!({"found": true})));
}

#[tokio::test]
async fn test_non_200_returns_none_and_logs_status_once() {
    init_log_capture();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let result = client_for(&server)
        .invoke(QueryKind::RiskScore, "example.com")
        .await
        .unwrap();
    assert_eq!(result, None);

    let errors: Vec<_> = logs_for_current_thread()
        .into_iter()
        .filter(|record| record.level == Level::Error)
        .collect();
    assert_eq!(errors.len(), 1, "expected exactly one error log: {errors:?}");
    assert!(errors[0].message.contains("403"));
}

#[tokio::test]
async fn test_non_200_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let result = client_for(&server).subdomains("example.com").await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_related_domains_unwraps_tb1() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "/links/name/example.com",
        json!({"tb1": [["a.com", 5], ["b.com", 2]], "found": true}),
    )
    .await;

    let result = client_for(&server)
        .related_domains("example.com")
        .await
        .unwrap();
    assert_eq!(result, Some(json!([["a.com", 5], ["b.com", 2]])));
}

#[tokio::test]
async fn test_related_domains_missing_key_is_an_error() {
    let server = MockServer::start().await;
    mount_json(&server, "/links/name/example.com", json!({"found": false})).await;

    let err = client_for(&server)
        .related_domains("example.com")
        .await
        .unwrap_err();
    assert!(matches!(err, InvestigateError::MissingKey("tb1")));
}

#[tokio::test]
async fn test_query_volume_reconstructs_hourly_series() {
    let server = MockServer::start().await;
    let t0 = Utc.with_ymd_and_hms(2024, 3, 18, 0, 0, 0).unwrap();
    mount_json(
        &server,
        "/domains/volume/example.com",
        json!({
            "dates": [t0.timestamp_millis(), (t0 + TimeDelta::hours(2)).timestamp_millis()],
            "queries": [10, 20, 30]
        }),
    )
    .await;

    let client = client_for(&server);
    let series = client
        .query_volume("example.com")
        .await
        .unwrap()
        .expect("200 response");
    assert_eq!(series.len(), 3);
    assert_eq!(series.get(&t0), Some(10));
    assert_eq!(series.get(&(t0 + TimeDelta::hours(1))), Some(20));
    assert_eq!(series.get(&(t0 + TimeDelta::hours(2))), Some(30));

    let value = client
        .invoke(QueryKind::QueryVolume, "example.com")
        .await
        .unwrap();
    assert_eq!(
        value,
        Some(json!({
            "2024-03-18T00:00:00Z": 10,
            "2024-03-18T01:00:00Z": 20,
            "2024-03-18T02:00:00Z": 30
        }))
    );
}

#[tokio::test]
async fn test_empty_query_volume_body_is_absent() {
    let server = MockServer::start().await;
    mount_json(&server, "/domains/volume/example.com", json!({})).await;

    let client = client_for(&server);
    assert!(client.query_volume("example.com").await.unwrap().is_none());
    assert_eq!(
        client
            .invoke(QueryKind::QueryVolume, "example.com")
            .await
            .unwrap(),
        None
    );
}

#[tokio::test]
async fn test_invalid_json_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .security_info("example.com")
        .await
        .unwrap_err();
    assert!(matches!(err, InvestigateError::Decode(_)));
}

#[tokio::test]
async fn test_transport_failure_is_an_error() {
    // Bind an ephemeral port and release it so nothing listens there
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let config = Config {
        investigate_url: format!("http://127.0.0.1:{port}"),
        investigate_token: Some("t".to_string()),
        timeout_seconds: 2,
        ..Default::default()
    };
    let err = InvestigateClient::from_config(&config)
        .unwrap()
        .risk_score("example.com")
        .await
        .unwrap_err();
    assert!(matches!(err, InvestigateError::Transport(_)));
}

#[tokio::test]
async fn test_top_domains_limit_suffix() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/topmillion"))
        .and(query_param("limit", "2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!(["google.com", "facebook.com"])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let result = client_for(&server).top_domains(Some(2)).await.unwrap();
    assert_eq!(result, Some(json!(["google.com", "facebook.com"])));
}

#[tokio::test]
async fn test_top_domains_zero_limit_sends_no_suffix() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/topmillion"))
        .and(query_param_is_missing("limit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["google.com"])))
        .expect(1)
        .mount(&server)
        .await;

    let result = client_for(&server).top_domains(Some(0)).await.unwrap();
    assert_eq!(result, Some(json!(["google.com"])));
}

#[tokio::test]
async fn test_top_domains_snapshot_is_lazy_and_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/topmillion"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["google.com"])))
        .expect(1)
        .mount(&server)
        .await;

    let top = TopDomains::new(client_for(&server), None, Duration::from_secs(3600));
    assert!(top.cached().await.is_none());
    assert!(server.received_requests().await.unwrap().is_empty());

    let first = top.get().await.unwrap().expect("snapshot");
    let second = top.get().await.unwrap().expect("snapshot");
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(*first, json!(["google.com"]));
}

#[tokio::test]
async fn test_top_domains_refresh_refetches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/topmillion"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["google.com"])))
        .expect(2)
        .mount(&server)
        .await;

    let top = TopDomains::new(client_for(&server), None, Duration::from_secs(3600));
    top.get().await.unwrap();
    top.refresh().await.unwrap();
    top.get().await.unwrap();
}

#[tokio::test]
async fn test_top_domains_stale_snapshot_is_refetched() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/topmillion"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["google.com"])))
        .expect(2)
        .mount(&server)
        .await;

    let top = TopDomains::new(client_for(&server), None, Duration::ZERO);
    top.get().await.unwrap();
    top.get().await.unwrap();
}

#[tokio::test]
async fn test_top_domains_failed_refresh_keeps_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/topmillion"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["google.com"])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/topmillion"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let top = TopDomains::new(client_for(&server), None, Duration::ZERO);
    top.get().await.unwrap();

    assert!(top.refresh().await.unwrap().is_none());
    assert_eq!(top.cached().await.as_deref(), Some(&json!(["google.com"])));

    // Stale and unrefreshable: the old snapshot is still served
    assert_eq!(
        top.get().await.unwrap().as_deref(),
        Some(&json!(["google.com"]))
    );
}

#[tokio::test]
async fn test_stale_snapshot_is_served_while_refetch_is_in_flight() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/topmillion"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["google.com"])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/topmillion"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!(["example.com"]))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let top = Arc::new(TopDomains::new(client_for(&server), None, Duration::ZERO));
    top.get().await.unwrap();

    let refetch = tokio::spawn({
        let top = Arc::clone(&top);
        async move { top.get().await }
    });
    tokio::time::sleep(Duration::from_millis(200)).await;

    let start = std::time::Instant::now();
    let stale = top.get().await.unwrap();
    assert!(start.elapsed() < Duration::from_secs(1));
    assert_eq!(stale.as_deref(), Some(&json!(["google.com"])));

    let fresh = refetch.await.unwrap().unwrap();
    assert_eq!(fresh.as_deref(), Some(&json!(["example.com"])));
    assert_eq!(top.cached().await.as_deref(), Some(&json!(["example.com"])));
}
