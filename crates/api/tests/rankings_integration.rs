//! Integration tests for the ranking endpoint.

mod common;

use axum::http::{Method, StatusCode};
use common::{candidate_json, create_test_app, create_test_app_with, json_request, send};
use matchmaker_api::config::Config;
use fake::Fake;
use serde_json::{json, Value};
use uuid::Uuid;

const CATEGORIES: [(&str, &str); 4] = [
    ("hiking", "outdoors"),
    ("jazz", "music"),
    ("chess", "games"),
    ("ramen", "food"),
];

fn pool(size: usize) -> Vec<Value> {
    (0..size)
        .map(|i| {
            let age: u32 = (20..60).fake();
            let distance: f64 = (0.5..80.0).fake();
            candidate_json(Uuid::new_v4(), age, distance, &CATEGORIES[..(i % 4) + 1])
        })
        .collect()
}

fn ranking_body(viewer_id: Uuid, candidates: Vec<Value>, limit: Option<usize>) -> Value {
    let mut body = json!({
        "viewer": candidate_json(viewer_id, 31, 0.0, &CATEGORIES[..2]),
        "candidates": candidates,
    });
    if let Some(limit) = limit {
        body["limit"] = json!(limit);
    }
    body
}

#[tokio::test]
async fn test_rankings_are_sorted_and_limited() {
    let app = create_test_app();
    let request = json_request(
        Method::POST,
        "/api/v1/rankings",
        ranking_body(Uuid::new_v4(), pool(40), Some(10)),
    );

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);

    let rankings = body["rankings"].as_array().unwrap();
    assert!(!rankings.is_empty());
    assert!(rankings.len() <= 10);
    assert_eq!(body["total"], rankings.len());

    let scores: Vec<f64> = rankings.iter().map(|r| r["score"].as_f64().unwrap()).collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));

    let first = &rankings[0];
    assert!(first["candidateId"].is_string());
    assert!(first["baseScore"].is_number());
    assert!(first["breakdown"]["modelPrediction"].is_number());
    // neutral predictor and string similarity are not degraded
    assert!(first.get("degraded").is_none());
}

#[tokio::test]
async fn test_viewer_is_never_ranked() {
    let app = create_test_app();
    let viewer_id = Uuid::new_v4();
    let mut candidates = pool(3);
    candidates.push(candidate_json(viewer_id, 31, 0.0, &CATEGORIES[..2]));

    let (status, body) = send(
        &app,
        json_request(Method::POST, "/api/v1/rankings", ranking_body(viewer_id, candidates, None)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["rankings"]
        .as_array()
        .unwrap()
        .iter()
        .all(|r| r["candidateId"] != viewer_id.to_string()));
}

#[tokio::test]
async fn test_repeated_requests_record_exposures() {
    let app = create_test_app();
    let viewer_id = Uuid::new_v4();
    let candidates = pool(12);

    for _ in 0..3 {
        let (status, _) = send(
            &app,
            json_request(
                Method::POST,
                "/api/v1/rankings",
                ranking_body(viewer_id, candidates.clone(), Some(5)),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let history = domain::store::ExposureStore::exposure_history(
        app.store.as_ref(),
        viewer_id,
        common::test_now() - chrono::Duration::days(1),
    )
    .await
    .unwrap();
    assert!(!history.is_empty());
}

#[tokio::test]
async fn test_empty_pool_returns_empty_list() {
    let app = create_test_app();
    let (status, body) = send(
        &app,
        json_request(Method::POST, "/api/v1/rankings", ranking_body(Uuid::new_v4(), vec![], None)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn test_zero_limit_is_rejected() {
    let app = create_test_app();
    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            "/api/v1/rankings",
            ranking_body(Uuid::new_v4(), pool(2), Some(0)),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_limit_is_bounded_by_configured_max() {
    let app = create_test_app();
    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            "/api/v1/rankings",
            ranking_body(Uuid::new_v4(), pool(2), Some(201)),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "limit must be between 1 and 200");

    let config = Config::load_for_test(&[("matching.ranking.max_limit", "300")]).unwrap();
    let app = create_test_app_with(config);
    let (status, _) = send(
        &app,
        json_request(
            Method::POST,
            "/api/v1/rankings",
            ranking_body(Uuid::new_v4(), pool(2), Some(250)),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_underage_candidate_reports_field_path() {
    let app = create_test_app();
    let candidates = vec![candidate_json(Uuid::new_v4(), 16, 3.0, &CATEGORIES[..1])];
    let (status, body) = send(
        &app,
        json_request(Method::POST, "/api/v1/rankings", ranking_body(Uuid::new_v4(), candidates, None)),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let details = body["details"].as_array().unwrap();
    assert_eq!(details.len(), 1);
    assert_eq!(details[0]["field"], "candidates[0].age");
    assert_eq!(body["message"], "Age must be between 18 and 120");
}

#[tokio::test]
async fn test_store_outage_fails_the_ranking() {
    let app = create_test_app();
    app.store.set_unavailable(true);
    let (status, _) = send(
        &app,
        json_request(Method::POST, "/api/v1/rankings", ranking_body(Uuid::new_v4(), pool(2), None)),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
