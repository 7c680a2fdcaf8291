//! Router tests driven through `tower::ServiceExt::oneshot`.

mod support;

use std::time::Duration;

use axum::http::StatusCode;
use support::{setup_test_app, setup_test_app_with};

#[tokio::test(flavor = "multi_thread")]
async fn lists_seeded_connectors() {
    let app = setup_test_app().await;

    let (status, body) = app.request("GET", "/api/connectors", None).await;

    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> =
        body.as_array().unwrap().iter().map(|c| c["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["sap-inbound", "sap-legacy", "sap-main"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn sync_returns_log_id_and_result() {
    let app = setup_test_app().await;

    let (status, body) = app
        .request("POST", "/api/connectors/sap-main/sync", Some(r#"{"direction":"inbound"}"#))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["logId"], body["result"]["runId"]);
    assert_eq!(body["result"]["status"], "completed");
    assert_eq!(body["result"]["recordsCreated"], 3);
    assert_eq!(app.ctx.products.count().await.unwrap(), 3);

    let (status, logs) = app.request("GET", "/api/connectors/sap-main/sync-logs?limit=5", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(logs.as_array().unwrap().len(), 1);
    assert_eq!(logs[0]["logId"], body["logId"]);

    let (status, stats) = app.request("GET", "/api/connectors/sap-main/sync-stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["totalRuns"], 1);
    assert_eq!(stats["totalCreated"], 3);
    assert_eq!(stats["successRate"], 100.0);
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_body_uses_connector_defaults() {
    let app = setup_test_app().await;

    let (status, body) = app.request("POST", "/api/connectors/sap-inbound/sync", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["direction"], "inbound");
}

#[tokio::test(flavor = "multi_thread")]
async fn sync_rejections_map_to_status_codes() {
    let app = setup_test_app().await;

    let (status, body) = app.request("POST", "/api/connectors/nope/sync", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "connector_not_found");

    let (status, body) = app.request("POST", "/api/connectors/sap-legacy/sync", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "connector_inactive");

    let (status, body) = app
        .request("POST", "/api/connectors/sap-inbound/sync", Some(r#"{"direction":"outbound"}"#))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "direction_not_allowed");

    let (status, body) =
        app.request("POST", "/api/connectors/sap-main/sync", Some("{not json")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "invalid_request");

    let (status, _) = app.request("GET", "/api/connectors/nope/sync-stats", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_trigger_for_same_connector_conflicts() {
    let app = setup_test_app().await;
    app.ctx.clients.simulated().set_latency(Duration::from_millis(300));

    let router = app.router.clone();
    let first = tokio::spawn(async move {
        use axum::body::Body;
        use axum::http::Request;
        use tower::ServiceExt;
        let request = Request::builder()
            .method("POST")
            .uri("/api/connectors/sap-main/sync")
            .body(Body::empty())
            .unwrap();
        router.oneshot(request).await.unwrap().status()
    });

    for _ in 0..100 {
        if app.ctx.orchestrator.is_running("sap-main") {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(app.ctx.orchestrator.is_running("sap-main"));

    let (status, body) = app.request("POST", "/api/connectors/sap-main/sync", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "already_running");

    // Other connectors are unaffected.
    let (status, _) = app.request("GET", "/api/connectors/sap-inbound/sync-stats", None).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(first.await.unwrap(), StatusCode::OK);
}

#[tokio::test(flavor = "multi_thread")]
async fn health_endpoints_report_and_persist() {
    let app = setup_test_app().await;

    let (status, _) = app.request("GET", "/api/connectors/sap-main/health", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, health) =
        app.request("POST", "/api/connectors/sap-main/health-check", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["consecutiveFailures"], 0);

    let (status, latest) = app.request("GET", "/api/connectors/sap-main/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(latest["status"], "healthy");

    let (status, summary) = app.request("GET", "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["overall"], "healthy");
    assert_eq!(summary["connectors"].as_array().unwrap().len(), 3);

    let (status, _) = app.request("POST", "/api/connectors/nope/health-check", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test(flavor = "multi_thread")]
async fn unhealthy_connector_is_refused_when_gate_is_blocking() {
    let app = setup_test_app_with(|config| config.sync.require_healthy = true).await;
    app.ctx.clients.simulated().set_offline(true);

    let (_, health) = app.request("POST", "/api/connectors/sap-main/health-check", None).await;
    assert_eq!(health["status"], "unhealthy");
    assert!(health["recommendation"].is_string());

    let (status, body) = app.request("POST", "/api/connectors/sap-main/sync", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "connector_unhealthy");
}

#[tokio::test(flavor = "multi_thread")]
async fn status_reports_database_and_background_state() {
    let app = setup_test_app().await;

    let (status, body) = app.request("GET", "/api/status", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], true);
    assert_eq!(body["healthMonitorRunning"], false);
}
