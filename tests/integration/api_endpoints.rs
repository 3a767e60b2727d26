//! Integration tests for API endpoints
//!
//! These tests verify that:
//! - All REST endpoints return correct responses over a real listener
//! - Alert configuration updates are visible to the evaluator
//! - Error handling is correct

use axum::http::StatusCode;
use serde_json::{Value, json};
use syspulse::alerts::{AlertConfig, AlertHistory};

use crate::helpers::{snapshot, spawn_test_server};

#[tokio::test]
async fn test_health_endpoint_returns_ok() {
    let server = spawn_test_server().await;

    let response = reqwest::get(server.url("/api/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json: Value = response.json().await.unwrap();
    assert_eq!(json["status"], "healthy");
    assert!(json["timestamp"].is_string());
    assert_eq!(json["features"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_version_endpoint() {
    let server = spawn_test_server().await;

    let json: Value = reqwest::get(server.url("/api/version"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(json["service"], "SysPulse Monitor");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_metrics_endpoint_serves_latest_snapshot() {
    let server = spawn_test_server().await;

    let response = reqwest::get(server.url("/api/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    server.hub.publish(snapshot(12.0, 34.0, 56.0)).await.unwrap();
    server.hub.publish(snapshot(21.0, 43.0, 65.0)).await.unwrap();

    let response = reqwest::get(server.url("/api/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json: Value = response.json().await.unwrap();
    assert_eq!(json["cpu"]["usage"], 21.0);
    assert_eq!(json["memory"]["usage"], 43.0);
    assert_eq!(json["disk"]["usage"], 65.0);
    assert_eq!(json["system"]["hostname"], "test-host");
}

#[tokio::test]
async fn test_clients_endpoint_without_connections() {
    let server = spawn_test_server().await;

    let json: Value = reqwest::get(server.url("/api/clients"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(json["connected_clients"], 0);
    assert!(json["timestamp"].is_string());
}

#[tokio::test]
async fn test_alert_config_roundtrip() {
    let server = spawn_test_server().await;
    let client = reqwest::Client::new();

    let config: AlertConfig = client
        .get(server.url("/api/alerts/config"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(config, AlertConfig::default());

    let response = client
        .post(server.url("/api/alerts/config"))
        .json(&json!({
            "cpu_threshold": 50.0,
            "ram_threshold": 60.0,
            "disk_threshold": 70.0,
            "enabled": true,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json: Value = response.json().await.unwrap();
    assert_eq!(json["status"], "updated");

    // the evaluator uses the new threshold right away
    let alerts = server.alerts.evaluate(&snapshot(55.0, 0.0, 0.0)).await;
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].threshold, 50.0);
}

#[tokio::test]
async fn test_invalid_config_rejected() {
    let server = spawn_test_server().await;
    let client = reqwest::Client::new();

    let response = client
        .post(server.url("/api/alerts/config"))
        .header("content-type", "application/json")
        .body("{\"cpu_threshold\": \"high\"}")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json: Value = response.json().await.unwrap();
    assert!(json["error"].is_string());

    assert_eq!(server.alerts.config().await, AlertConfig::default());
}

#[tokio::test]
async fn test_history_and_clear() {
    let server = spawn_test_server().await;
    let client = reqwest::Client::new();

    server.alerts.evaluate(&snapshot(95.0, 90.0, 10.0)).await;

    let history: AlertHistory = client
        .get(server.url("/api/alerts/history"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(history.alerts.len(), 2);
    assert_eq!(history.stats.active_alerts, 2);
    assert_eq!(history.stats.today_alerts, 2);

    let response = client
        .post(server.url("/api/alerts/clear"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let history: AlertHistory = client
        .get(server.url("/api/alerts/history"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(history.alerts.is_empty());
    assert_eq!(history.stats.active_alerts, 0);

    let alerts = server.alerts.evaluate(&snapshot(95.0, 90.0, 10.0)).await;
    assert_eq!(alerts.len(), 2);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let server = spawn_test_server().await;

    let response = reqwest::get(server.url("/api/nope")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
