//! Integration tests for the operations API endpoints
//!
//! Every endpoint runs against a deterministic in-memory ledger, so the
//! expected records and cursors are known up front.

use axum_test::TestServer;
use serde_json::Value;
use std::sync::Arc;
use optable::api::{build_api_router, ApiState};
use optable::config::FetchConfig;
use optable::source::{AnySource, MemorySource};

fn server_with(count: u64) -> TestServer {
    let source = AnySource::Memory(MemorySource::sample(count));
    let state = Arc::new(ApiState::new(source, FetchConfig::default()));
    TestServer::new(build_api_router(state)).expect("Failed to create test server")
}

fn ids(json: &Value) -> Vec<String> {
    json["records"]
        .as_array()
        .expect("records array")
        .iter()
        .map(|r| r["id"].as_str().unwrap_or_default().to_string())
        .collect()
}

#[tokio::test]
async fn test_health_and_types() {
    let server = server_with(10);

    let response = server.get("/api/health").await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["source"], "memory");
    assert!(json["timestamp"].is_string());

    let response = server.get("/api/operations/types").await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    let types = json["types"].as_array().expect("types array");
    assert!(types.iter().any(|t| t == "payment"));
    assert!(types.iter().any(|t| t == "create_account"));
}

#[tokio::test]
async fn test_unfiltered_paging_with_cursor() {
    let server = server_with(100);

    let response = server.get("/api/operations").await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(json["count"], 10);
    assert_eq!(json["cursor"], "0");
    assert_eq!(json["next_cursor"], "91");
    assert_eq!(json["possibly_more_data_available"], false);
    assert!(json["filter"].is_null());
    assert_eq!(ids(&json).first().map(String::as_str), Some("100"));

    // display records carry camelCase keys and a time column
    let first = &json["records"][0];
    assert!(first["pagingToken"].is_string());
    assert!(first["sourceAccount"].is_string());
    assert!(first["time"].is_string());

    let response = server
        .get("/api/operations")
        .add_query_param("cursor", "91")
        .await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(json["cursor"], "91");
    assert_eq!(ids(&json).first().map(String::as_str), Some("90"));
    assert_eq!(ids(&json).last().map(String::as_str), Some("81"));
}

#[tokio::test]
async fn test_type_filter_scans_to_exhaustion() {
    let server = server_with(100);

    let response = server
        .get("/api/operations")
        .add_query_param("opTypeFilter", "payment")
        .await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    // payments sit at 2, 29, 56 and 83 in the sample ledger
    assert_eq!(ids(&json), vec!["83", "56", "29", "2"]);
    assert_eq!(json["filter"], "payment");
    assert_eq!(json["total_fetched"], 100);
    assert_eq!(json["possibly_more_data_available"], false);
    assert!(json["next_cursor"].is_null());
}

#[tokio::test]
async fn test_type_filter_reports_cap() {
    let server = server_with(1_000);

    let response = server
        .get("/api/operations")
        .add_query_param("opTypeFilter", "no_such_type")
        .await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(json["total_fetched"], 400);
    assert_eq!(json["possibly_more_data_available"], true);
    assert_eq!(json["count"], 0);
    assert_eq!(json["next_cursor"], "601");
}

#[tokio::test]
async fn test_account_scope() {
    let server = server_with(50);
    let account = format!("G{:055}", 3);

    let response = server
        .get("/api/operations")
        .add_query_param("account", &account)
        .await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    let records = json["records"].as_array().expect("records array");
    assert!(!records.is_empty());
    assert!(records.iter().all(|r| r["sourceAccount"] == account.as_str()));
}

#[tokio::test]
async fn test_invalid_input_is_rejected() {
    let server = server_with(10);

    let response = server
        .get("/api/operations")
        .add_query_param("tx", "not-a-hash")
        .await;
    assert_eq!(response.status_code(), 400);
    let json: Value = response.json();
    assert!(json["error"].is_string());

    for limit in ["0", "500"] {
        let response = server
            .get("/api/operations")
            .add_query_param("limit", limit)
            .await;
        assert_eq!(response.status_code(), 400, "limit {}", limit);
    }
}

#[tokio::test]
async fn test_csv_export() {
    let server = server_with(30);

    let response = server.get("/api/operations/export.csv").await;
    assert_eq!(response.status_code(), 200);
    let body = response.text();
    let mut lines = body.lines();
    assert_eq!(
        lines.next(),
        Some("id,paging_token,type,source_account,transaction_hash,created_at,details")
    );
    assert_eq!(lines.count(), 30);
}

#[tokio::test]
async fn test_stats_count_requests() {
    let server = server_with(10);

    server.get("/api/health").await;
    server
        .get("/api/operations")
        .add_query_param("limit", "0")
        .await;

    let response = server.get("/api/stats").await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert!(json["total_requests"].as_u64().unwrap_or_default() >= 2);
    assert!(json["failed_requests"].as_u64().unwrap_or_default() >= 1);
    assert_eq!(json["source"], "memory");
}
