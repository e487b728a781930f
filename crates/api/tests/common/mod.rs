//! Common test utilities for integration tests.
//!
//! The router is wired over the in-memory store with a fixed clock and a
//! recording event sink, so tests need no database.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, TimeZone, Utc};
use domain::services::{FixedClock, RecordingMatchEventSink};
use domain::store::InMemoryStore;
use matchmaker_api::app::{router, AppState, Stores};
use matchmaker_api::config::Config;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryStore>,
    pub events: Arc<RecordingMatchEventSink>,
    pub clock: Arc<FixedClock>,
}

/// Noon UTC, far from a day boundary.
pub fn test_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
}

pub fn test_config() -> Config {
    Config::load_for_test(&[]).expect("Failed to load test config")
}

pub fn create_test_app() -> TestApp {
    create_test_app_with(test_config())
}

pub fn create_test_app_with(config: Config) -> TestApp {
    let store = Arc::new(InMemoryStore::new());
    let events = Arc::new(RecordingMatchEventSink::new());
    let clock = Arc::new(FixedClock::new(test_now()));

    let state = AppState::build(
        Arc::new(config),
        None,
        Stores::memory(store.clone()),
        events.clone(),
        clock.clone(),
    );

    TestApp {
        router: router(state),
        store,
        events,
        clock,
    }
}

pub fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn parse_response_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(Value::Null)
}

/// Send a request and return status and parsed JSON body.
pub async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, parse_response_body(response).await)
}

pub async fn pop(app: &TestApp, actor: Uuid, target: Uuid, pop_type: &str) -> (StatusCode, Value) {
    send(
        app,
        json_request(
            Method::POST,
            "/api/v1/pops",
            json!({ "actorId": actor, "targetId": target, "popType": pop_type }),
        ),
    )
    .await
}

/// Candidate payload in the wire format.
pub fn candidate_json(id: Uuid, age: u32, distance_km: f64, interests: &[(&str, &str)]) -> Value {
    json!({
        "id": id,
        "age": age,
        "distanceKm": distance_km,
        "interests": interests
            .iter()
            .map(|(name, category)| json!({ "name": name, "category": category }))
            .collect::<Vec<_>>(),
        "prompts": ["I spend weekends hiking and cooking"],
        "engagement": { "activeStreakDays": 12, "responseRate": 0.6, "profileCompletion": 0.8 },
        "verified": age % 2 == 0,
        "lifestyle": ["coffee"]
    })
}
