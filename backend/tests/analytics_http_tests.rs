//! End-to-end tests of the HTTP API over the in-memory repository.

#![cfg(feature = "http-server")]

mod support;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use irrigation_analytics::db::repositories::LocalRepository;
use irrigation_analytics::db::repository::FullRepository;
use irrigation_analytics::http::{create_router, AppState};

use support::{FARM_WITHOUT_HISTORY, FARM_WITH_HISTORY};

fn app(repo: &LocalRepository) -> Router {
    let repo = Arc::new(repo.clone()) as Arc<dyn FullRepository>;
    create_router(AppState::new(repo))
}

async fn get(app: &Router, uri: &str) -> (StatusCode, HeaderMap, Value) {
    let response = app
        .clone()
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, headers, body)
}

fn analytics_uri(farm_id: i64, query: &str) -> String {
    format!("/v1/farms/{}/irrigation/analytics?{}", farm_id, query)
}

fn dates(body: &Value) -> Vec<String> {
    body["time_series"]["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["date"].as_str().unwrap().to_string())
        .collect()
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn test_weekly_march_with_full_history() {
    let repo = support::scenario_repository();
    let (status, _, body) = get(
        &app(&repo),
        &analytics_uri(
            FARM_WITH_HISTORY,
            "start_date=2024-03-01&end_date=2024-03-31&aggregation=weekly",
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["farm_id"], 1);
    assert_eq!(body["farm_name"], "Finca Norte");
    assert_eq!(body["aggregation"], "weekly");
    assert_eq!(body["period"]["start"], "2024-03-01T00:00:00Z");
    assert_eq!(body["metrics"]["total_irrigation_events"], 36);
    assert_eq!(body["metrics"]["total_irrigation_volume_mm"], 324.0);

    assert_eq!(
        dates(&body),
        vec!["2024-02-26", "2024-03-04", "2024-03-11", "2024-03-18", "2024-03-25"]
    );
    assert_eq!(body["time_series"]["pagination"]["total_count"], 5);
    assert_eq!(body["time_series"]["pagination"]["total_pages"], 1);

    assert_eq!(body["same_period_-1"]["data_incomplete"], false);
    assert_eq!(body["same_period_-1"]["total_irrigation_events"], 36);
    assert!(body["same_period_-1"].get("note").is_none());
    assert_eq!(body["same_period_-2"]["data_incomplete"], false);
    assert_eq!(
        body["period_comparison"]["vs_same_period_-1"]["volume_change_percent"],
        0.0
    );
    assert_eq!(
        body["period_comparison"]["vs_same_period_-2"]["events_change_percent"],
        0.0
    );

    let sectors = body["sector_breakdown"].as_array().unwrap();
    assert_eq!(sectors.len(), 2);
    assert_eq!(sectors[0]["sector_id"], 1);
    assert_eq!(sectors[0]["sector_name"], "North Block");
    assert_eq!(sectors[1]["sector_id"], 2);
}

#[tokio::test]
async fn test_missing_history_is_partial_content() {
    let repo = support::scenario_repository();
    let (status, _, body) = get(
        &app(&repo),
        &analytics_uri(
            FARM_WITHOUT_HISTORY,
            "start_date=2023-01-01&end_date=2023-01-31",
        ),
    )
    .await;

    assert_eq!(status, StatusCode::PARTIAL_CONTENT);
    assert_eq!(body["metrics"]["total_irrigation_events"], 36);

    let previous = &body["same_period_-1"];
    assert_eq!(previous["data_incomplete"], true);
    assert_eq!(previous["note"], "No data available for previous year (2022)");
    assert!(previous["total_irrigation_volume_mm"].is_null());
    assert!(previous["total_irrigation_events"].is_null());
    assert!(previous["average_efficiency"].is_null());
    assert!(previous["efficiency_range"].is_null());

    assert_eq!(
        body["same_period_-2"]["note"],
        "No data available for two years ago (2021)"
    );
    assert!(body["period_comparison"].get("vs_same_period_-1").is_none());
    assert!(body["period_comparison"].get("vs_same_period_-2").is_none());
}

#[tokio::test]
async fn test_empty_period_with_complete_history() {
    let repo = support::scenario_repository();
    let (status, _, body) = get(
        &app(&repo),
        &analytics_uri(FARM_WITH_HISTORY, "start_date=2020-01-01&end_date=2020-01-31"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["metrics"]["total_irrigation_events"], 0);
    assert_eq!(body["metrics"]["total_irrigation_volume_mm"], 0.0);
    assert!(body["metrics"]["average_efficiency"].is_null());
    assert!(body["metrics"]["efficiency_range"].is_null());
    assert_eq!(body["time_series"]["data"], Value::Array(vec![]));
    assert_eq!(body["time_series"]["pagination"]["total_pages"], 0);
    assert_eq!(body["sector_breakdown"], Value::Array(vec![]));

    let vs_previous = &body["period_comparison"]["vs_same_period_-1"];
    assert_eq!(vs_previous["volume_change_percent"], -100.0);
    assert!(vs_previous["efficiency_change_percent"].is_null());
}

#[tokio::test]
async fn test_unknown_aggregation_is_bad_request() {
    let repo = support::scenario_repository();
    let (status, _, body) = get(
        &app(&repo),
        &analytics_uri(FARM_WITH_HISTORY, "aggregation=yearly"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["error"].as_str().unwrap();
    for allowed in ["daily", "weekly", "monthly"] {
        assert!(message.contains(allowed), "{} missing from {}", allowed, message);
    }
}

#[tokio::test]
async fn test_unknown_farm_is_not_found() {
    let repo = support::scenario_repository();
    let (status, _, body) = get(&app(&repo), &analytics_uri(99_999_999, "")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "farm 99999999 not found");
}

#[tokio::test]
async fn test_consecutive_pages_are_contiguous() {
    let repo = support::scenario_repository();
    let app = app(&repo);
    let range = "start_date=2024-03-01&end_date=2024-03-31";

    let page = |query: &str| analytics_uri(FARM_WITH_HISTORY, &format!("{}&{}", range, query));

    let (_, _, first) = get(&app, &page("limit=5&page=1")).await;
    let (_, _, second) = get(&app, &page("limit=5&page=2")).await;
    let (_, _, all) = get(&app, &page("limit=all")).await;

    let first = dates(&first);
    let second = dates(&second);
    assert_eq!(first.len(), 5);
    assert_eq!(second.len(), 5);
    assert!(first.last().unwrap() < second.first().unwrap());

    let total_count = all["time_series"]["pagination"]["total_count"].as_i64().unwrap();
    assert_eq!(total_count, 28);
    assert_eq!(all["time_series"]["pagination"]["limit"], 10_000);

    let combined: Vec<String> = first.into_iter().chain(second).collect();
    assert_eq!(combined.len() as i64, total_count.min(10));
    assert_eq!(combined, dates(&all)[..10].to_vec());
}

// =============================================================================
// Validation
// =============================================================================

#[tokio::test]
async fn test_invalid_inputs_are_bad_request() {
    let repo = support::scenario_repository();
    let app = app(&repo);

    let cases = [
        ("/v1/farms/abc/irrigation/analytics", "invalid farm_id format"),
        ("/v1/farms/0/irrigation/analytics", "invalid farm_id format"),
        (
            "/v1/farms/1/irrigation/analytics?start_date=2024-13-01",
            "invalid start_date format; use YYYY-MM-DD",
        ),
        (
            "/v1/farms/1/irrigation/analytics?start_date=2024-03-01&end_date=31-03-2024",
            "invalid end_date format; use YYYY-MM-DD",
        ),
        (
            "/v1/farms/1/irrigation/analytics?start_date=2024-3-1&end_date=2024-3-31",
            "invalid start_date format; use YYYY-MM-DD",
        ),
        (
            "/v1/farms/1/irrigation/analytics?start_date=2024-03-01&end_date=%2B262142-12-31",
            "invalid end_date format; use YYYY-MM-DD",
        ),
        (
            "/v1/farms/1/irrigation/analytics?sector_id=north",
            "invalid sector_id format",
        ),
        (
            "/v1/farms/1/irrigation/analytics?start_date=2024-04-01&end_date=2024-03-01",
            "start_date must not be after end_date",
        ),
    ];

    for (uri, expected) in cases {
        let (status, _, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["error"], expected, "{}", uri);
    }
}

#[tokio::test]
async fn test_invalid_paging_is_coerced() {
    let repo = support::scenario_repository();
    let (status, _, body) = get(
        &app(&repo),
        &analytics_uri(
            FARM_WITH_HISTORY,
            "start_date=2024-03-01&end_date=2024-03-31&page=-3&limit=5000",
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let pagination = &body["time_series"]["pagination"];
    assert_eq!(pagination["page"], 1);
    assert_eq!(pagination["limit"], 1000);
    assert_eq!(pagination["total_pages"], 1);
}

#[tokio::test]
async fn test_repeated_query_keys_use_first_value() {
    let repo = support::scenario_repository();
    let (status, _, body) = get(
        &app(&repo),
        &analytics_uri(
            FARM_WITH_HISTORY,
            "start_date=2024-03-01&end_date=2024-03-31&page=2&page=1&limit=abc&limit=5",
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let pagination = &body["time_series"]["pagination"];
    assert_eq!(pagination["page"], 2);
    assert_eq!(pagination["limit"], 50);
    assert_eq!(pagination["total_count"], 28);
    assert!(dates(&body).is_empty());

    let (status, _, body) = get(
        &app(&repo),
        &analytics_uri(
            FARM_WITH_HISTORY,
            "start_date=2024-03-01&end_date=2024-03-31&start_date=bogus&aggregation=weekly&aggregation=yearly",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["aggregation"], "weekly");
}

#[tokio::test]
async fn test_sector_filter_narrows_breakdown() {
    let repo = support::scenario_repository();
    let (status, _, body) = get(
        &app(&repo),
        &analytics_uri(
            FARM_WITH_HISTORY,
            "start_date=2024-03-01&end_date=2024-03-31&sector_id=2&aggregation=monthly",
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let sectors = body["sector_breakdown"].as_array().unwrap();
    assert_eq!(sectors.len(), 1);
    assert_eq!(sectors[0]["sector_id"], 2);
    assert_eq!(sectors[0]["sector_name"], "South Block");
    assert_eq!(dates(&body), vec!["2024-03-01"]);
    assert_eq!(body["metrics"]["total_irrigation_events"], 36);
}

#[tokio::test]
async fn test_default_window() {
    let repo = support::scenario_repository();
    let (status, _, body) = get(&app(&repo), &analytics_uri(FARM_WITH_HISTORY, "")).await;

    assert!(status == StatusCode::OK || status == StatusCode::PARTIAL_CONTENT);
    assert_eq!(body["aggregation"], "daily");
    assert!(body["period"]["start"].as_str().unwrap().ends_with("T00:00:00Z"));
    assert_eq!(body["time_series"]["pagination"]["limit"], 50);
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn test_storage_failure_is_internal_error() {
    let repo = support::scenario_repository();
    repo.set_fail_queries(true);

    let (status, _, body) = get(
        &app(&repo),
        &analytics_uri(FARM_WITH_HISTORY, "start_date=2024-03-01&end_date=2024-03-31"),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "failed to fetch analytics");
}

// =============================================================================
// Health, sectors and request ids
// =============================================================================

#[tokio::test]
async fn test_health_reports_database_state() {
    let repo = support::scenario_repository();
    let app = app(&repo);

    let (status, _, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));

    repo.set_healthy(false);
    let (status, _, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["database"], "disconnected");
}

#[tokio::test]
async fn test_list_sectors() {
    let repo = support::scenario_repository();
    let app = app(&repo);

    let (status, _, body) = get(&app, "/v1/farms/1/sectors").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["farm_id"], 1);
    assert_eq!(body["total"], 2);
    assert_eq!(body["sectors"][0]["sector_name"], "North Block");

    let (status, _, body) = get(&app, "/v1/farms/42/sectors").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "farm 42 not found");

    let (status, _, _) = get(&app, "/v1/farms/x/sectors").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_request_id_header() {
    let repo = support::scenario_repository();
    let (_, headers, _) = get(&app(&repo), &analytics_uri(FARM_WITH_HISTORY, "")).await;

    let id = headers["x-request-id"].to_str().unwrap();
    assert!(uuid::Uuid::parse_str(id).is_ok());
}
