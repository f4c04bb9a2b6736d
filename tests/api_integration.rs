//! Integration tests for the HTTP surface.

#![cfg(feature = "api")]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::util::ServiceExt;

use panel_sim::api::{AppState, SharedState, router};
use panel_sim::config::ScenarioConfig;
use panel_sim::runner::{build_engine, run_headless};

/// Build the overload scenario, run it, and wrap it for the API.
fn build_api_state() -> SharedState {
    let mut scenario = ScenarioConfig::overload();
    scenario.simulation.ticks = 20;
    let mut engine = build_engine(&scenario, None).unwrap();
    let history = run_headless(&mut engine).results;
    AppState::new(engine, history)
}

async fn send(state: &SharedState, req: Request<Body>) -> (StatusCode, Value) {
    let resp = router(state.clone()).oneshot(req).await.unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn command(json: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/commands")
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

#[tokio::test]
async fn state_reflects_the_run() {
    let state = build_api_state();
    let (status, json) = send(&state, get("/state")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ticks_run"], 20);
    let load = json["simulation"]["total_load"].as_f64().unwrap();
    assert!((load - 23.333).abs() < 1e-3);
    let heat = json["panel"]["breakers"][0]["thermal_heat"].as_f64().unwrap();
    assert!((heat - 12.5).abs() < 1e-9);
}

#[tokio::test]
async fn full_telemetry_without_query() {
    let state = build_api_state();
    let (status, json) = send(&state, get("/telemetry")).await;
    assert_eq!(status, StatusCode::OK);
    let rows = json.as_array().unwrap();
    assert_eq!(rows.len(), 20);
    for key in ["tick", "sim_seconds", "total_load_amps", "max_heat", "trips"] {
        assert!(rows[0].get(key).is_some(), "missing key {key}");
    }
}

#[tokio::test]
async fn command_round_trip_changes_state() {
    let state = build_api_state();
    let kitchen = {
        let live = state.live.lock().await;
        live.engine.workspace().active_panel().breakers[0].id.clone()
    };

    let (status, json) = send(
        &state,
        command(serde_json::json!({"type": "rename_breaker", "breaker_id": kitchen, "name": "Galley"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["panel"]["breakers"][0]["name"], "Galley");

    let (status, json) = send(
        &state,
        command(serde_json::json!({"type": "resize_breaker", "breaker_id": kitchen, "rating": 30})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["panel"]["breakers"][0]["slots"], serde_json::json!([1, 3]));

    let (status, json) = send(&state, command(serde_json::json!({"type": "change_service_limit", "limit": 300}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json["error"].as_str().unwrap().contains("300"));
}

#[tokio::test]
async fn deleting_the_last_panel_is_rejected() {
    let state = build_api_state();
    let id = {
        let live = state.live.lock().await;
        live.engine.workspace().active_id().to_string()
    };
    let (status, json) = send(&state, command(serde_json::json!({"type": "delete_panel", "panel_id": id}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["error"], "Cannot delete the last panel.");

    let (_, panels) = send(&state, get("/panels")).await;
    assert_eq!(panels.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn malformed_command_is_a_client_error() {
    let state = build_api_state();
    let (status, _) = send(&state, command(serde_json::json!({"type": "explode"}))).await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn catalog_search_feeds_add_device() {
    let state = build_api_state();
    let (status, hits) = send(&state, get("/devices?q=hair")).await;
    assert_eq!(status, StatusCode::OK);
    let dryer = hits[0].clone();
    assert_eq!(dryer["name"], "Hair Dryer");

    let living_room = {
        let live = state.live.lock().await;
        live.engine.workspace().active_panel().breakers[1].id.clone()
    };
    let (status, json) = send(
        &state,
        command(serde_json::json!({
            "type": "add_device",
            "breaker_id": living_room,
            "run": 0,
            "component": 0,
            "device": dryer,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let devices = json["panel"]["breakers"][1]["runs"][0][0]["devices"]
        .as_array()
        .cloned()
        .unwrap_or_default();
    let added = devices.last().unwrap();
    assert_eq!(added["name"], "Hair Dryer");
    assert_eq!(added["watts"], 1800.0);
    assert_eq!(added["uid"], json["created_id"]);
}
