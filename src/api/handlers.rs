//! Request handlers for the API endpoints.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::types::{
    CommandResponse, DeviceQuery, ErrorResponse, PanelSummary, StateResponse, TelemetryQuery,
};
use super::{SharedState, sync_ticker};
use crate::catalog::{self, DeviceSpec};
use crate::panel::command::Command;
use crate::sim::types::TickResult;

/// `GET /state` → 200 + `StateResponse` JSON
pub async fn get_state(State(state): State<SharedState>) -> Json<StateResponse> {
    let live = state.live.lock().await;
    let ws = live.engine.workspace();
    Json(StateResponse {
        active_panel_id: ws.active_id().to_string(),
        panel: ws.active_panel().clone(),
        simulation: ws.simulation_state(),
        time_speed: ws.time_speed(),
        ticks_run: live.engine.ticks_run(),
    })
}

/// `GET /panels` → 200 + `Vec<PanelSummary>` JSON, in workspace order
pub async fn get_panels(State(state): State<SharedState>) -> Json<Vec<PanelSummary>> {
    let live = state.live.lock().await;
    let ws = live.engine.workspace();
    let active = ws.active_id();
    Json(
        ws.panels()
            .iter()
            .map(|p| PanelSummary::new(p, active))
            .collect(),
    )
}

/// Returns tick results, optionally filtered by tick range.
///
/// `GET /telemetry?from=N&to=M` → inclusive range
/// `GET /telemetry?from=10&to=5` → 400 + `ErrorResponse`
pub async fn get_telemetry(
    State(state): State<SharedState>,
    Query(query): Query<TelemetryQuery>,
) -> impl IntoResponse {
    let from = query.from.unwrap_or(0);
    let to = query.to.unwrap_or(usize::MAX);

    if from > to {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("`from` ({from}) must be <= `to` ({to})"),
            }),
        ));
    }

    let live = state.live.lock().await;
    let records: Vec<TickResult> = live
        .history
        .iter()
        .filter(|r| r.tick >= from && r.tick <= to)
        .cloned()
        .collect();
    Ok(Json(records))
}

/// `GET /devices?q=toaster` → catalog matches as `DeviceSpec` JSON, ready
/// to send back as the `device` of an `add_device` command.
pub async fn get_devices(Query(query): Query<DeviceQuery>) -> Json<Vec<DeviceSpec>> {
    let entries = match query.q.as_deref() {
        Some(q) if !q.trim().is_empty() => catalog::search(q),
        _ => catalog::common(),
    };
    Json(entries.iter().map(|e| e.spec()).collect())
}

/// Applies one command.
///
/// `POST /commands` → 200 + `CommandResponse`, or 422 + `ErrorResponse`
/// carrying the rejection reason.
pub async fn post_command(
    State(state): State<SharedState>,
    Json(command): Json<Command>,
) -> impl IntoResponse {
    let name = command.name().to_string();
    let mut live = state.live.lock().await;
    match live.engine.apply(command) {
        Ok(outcome) => {
            sync_ticker(&state, &mut live);
            Ok(Json(CommandResponse {
                command: name,
                created_id: outcome.created_id().map(str::to_string),
                panel: live.engine.workspace().active_panel().clone(),
            }))
        }
        Err(e) => Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::Request;
    use tower::util::ServiceExt;

    use super::*;
    use crate::api::{AppState, router};
    use crate::config::ScenarioConfig;
    use crate::runner::{build_engine, run_headless};
    use crate::sim::types::DEFAULT_HISTORY_LIMIT;

    fn make_test_state(ticks: usize) -> SharedState {
        make_capped_state(ticks, DEFAULT_HISTORY_LIMIT)
    }

    fn make_capped_state(ticks: usize, history_limit: usize) -> SharedState {
        let mut scenario = ScenarioConfig::starter();
        scenario.simulation.ticks = ticks;
        scenario.simulation.tick_interval_ms = 1;
        scenario.simulation.history_limit = history_limit;
        let mut engine = build_engine(&scenario, None).unwrap();
        let history = run_headless(&mut engine).results;
        AppState::new(engine, history)
    }

    async fn body_json(resp: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn post(json: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/commands")
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn state_returns_active_panel() {
        let app = router(make_test_state(4));
        let req = Request::builder()
            .uri("/state")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let json = body_json(resp).await;
        assert_eq!(json["panel"]["breakers"].as_array().map(Vec::len), Some(3));
        assert_eq!(json["time_speed"], 1);
        assert_eq!(json["ticks_run"], 4);
        assert!(json["simulation"]["total_load"].is_number());
    }

    #[tokio::test]
    async fn telemetry_range_filter() {
        let app = router(make_test_state(10));
        let req = Request::builder()
            .uri("/telemetry?from=2&to=4")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        let ticks: Vec<u64> = json
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|r| r["tick"].as_u64())
            .collect();
        assert_eq!(ticks, vec![2, 3, 4]);
    }

    #[tokio::test]
    async fn telemetry_rejects_inverted_range() {
        let app = router(make_test_state(2));
        let req = Request::builder()
            .uri("/telemetry?from=5&to=1")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(resp).await["error"].is_string());
    }

    #[tokio::test]
    async fn devices_search_and_common_list() {
        let app = router(make_test_state(1));
        let req = Request::builder()
            .uri("/devices?q=kettle")
            .body(Body::empty())
            .unwrap();
        let json = body_json(app.clone().oneshot(req).await.unwrap()).await;
        assert_eq!(json[0]["name"], "Electric Kettle");
        assert_eq!(json[0]["watts"], 1500.0);
        assert_eq!(json[0]["category"], "kitchen");

        let req = Request::builder().uri("/devices").body(Body::empty()).unwrap();
        let json = body_json(app.oneshot(req).await.unwrap()).await;
        assert_eq!(
            json.as_array().map(Vec::len),
            Some(catalog::common().len())
        );
    }

    #[tokio::test]
    async fn rejected_command_returns_422_with_reason() {
        let app = router(make_test_state(1));
        // Slot 1 already holds the kitchen breaker.
        let resp = app
            .oneshot(post(r#"{"type":"place_breaker","slot":1,"pole":"single"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            body_json(resp).await["error"],
            "Cannot install here. Slot 1 is occupied."
        );
    }

    #[tokio::test]
    async fn accepted_command_returns_panel_and_id() {
        let app = router(make_test_state(1));
        let resp = app
            .oneshot(post(r#"{"type":"place_breaker","slot":8,"pole":"double"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["command"], "place_breaker");
        assert!(json["created_id"].is_string());
        let slots = json["panel"]["breakers"]
            .as_array()
            .and_then(|b| b.last())
            .map(|b| b["slots"].clone());
        assert_eq!(slots, Some(serde_json::json!([8, 10])));
    }

    #[tokio::test]
    async fn history_keeps_only_the_latest_ticks() {
        let state = make_capped_state(10, 4);
        let req = Request::builder().uri("/telemetry").body(Body::empty()).unwrap();
        let json = body_json(router(state.clone()).oneshot(req).await.unwrap()).await;
        let ticks: Vec<u64> = json
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|r| r["tick"].as_u64())
            .collect();
        assert_eq!(ticks, vec![6, 7, 8, 9]);

        state.start_ticking().await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        state.stop_ticking().await;
        let live = state.live.lock().await;
        assert_eq!(live.history.len(), 4);
        assert!(live.history.back().map(|r| r.tick).unwrap_or(0) > 9);
    }

    #[tokio::test]
    async fn stopped_ticker_adds_nothing_and_holds_no_state() {
        let state = make_test_state(1);
        state.start_ticking().await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(std::sync::Arc::strong_count(&state), 1);

        state.stop_ticking().await;
        let len = state.live.lock().await.history.len();
        tokio::time::sleep(Duration::from_millis(20)).await;
        let live = state.live.lock().await;
        assert_eq!(live.history.len(), len);
        assert!(live.ticker.is_none());
        assert!(live.engine.scheduler().active_panel().is_none());
    }

    #[tokio::test]
    async fn ticker_follows_panel_selection() {
        let state = make_test_state(1);
        state.start_ticking().await;
        tokio::time::sleep(Duration::from_millis(30)).await;

        let resp = router(state.clone())
            .oneshot(post(r#"{"type":"add_panel"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let new_id = body_json(resp).await["created_id"]
            .as_str()
            .map(str::to_string)
            .unwrap();

        {
            let live = state.live.lock().await;
            assert!(live.history.len() > 1, "ticker should have produced ticks");
            assert_eq!(live.ticker.as_ref().map(|t| t.panel_id.clone()), Some(new_id.clone()));
            assert_eq!(live.engine.scheduler().active_panel(), Some(new_id.as_str()));
        }

        let resp = router(state.clone())
            .oneshot(Request::builder().uri("/panels").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let json = body_json(resp).await;
        let panels = json.as_array().unwrap();
        assert_eq!(panels.len(), 2);
        assert_eq!(panels[1]["active"], true);
        assert_eq!(panels[1]["name"], "New Panel");
    }
}
