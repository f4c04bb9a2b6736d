//! HTTP surface over a live workspace.
//!
//! Routes:
//! - `GET /state`: active panel, simulation state, and time speed
//! - `GET /panels`: panel summaries
//! - `GET /telemetry`: tick results with optional range filtering
//! - `GET /devices`: catalog search, or the common devices without `q`
//! - `POST /commands`: apply one command to the workspace
//!
//! All access goes through one async mutex. A background ticker advances
//! the active panel every `tick_interval`; switching or deleting the active
//! panel replaces it. Only the latest `history_limit` tick results are kept.

mod handlers;
mod types;

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Weak};

use axum::Router;
use axum::routing::{get, post};
use tokio::signal;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{info, warn};

use crate::sim::engine::Engine;
use crate::sim::types::TickResult;

pub use types::{
    CommandResponse, DeviceQuery, ErrorResponse, PanelSummary, StateResponse, TelemetryQuery,
};

/// Background task ticking one panel.
#[derive(Debug)]
struct Ticker {
    panel_id: String,
    handle: JoinHandle<()>,
}

/// Mutable server state guarded by [`AppState::live`].
#[derive(Debug)]
pub struct Live {
    pub engine: Engine,
    /// Most recent ticks, oldest first, at most `history_limit` long.
    pub history: VecDeque<TickResult>,
    ticker: Option<Ticker>,
}

impl Live {
    /// Appends a tick result, dropping the oldest past the engine's limit.
    pub fn record(&mut self, result: TickResult) {
        self.history.push_back(result);
        let limit = self.engine.config().history_limit.max(1);
        while self.history.len() > limit {
            self.history.pop_front();
        }
    }
}

/// Application state shared by every handler and the ticker.
#[derive(Debug)]
pub struct AppState {
    pub live: Mutex<Live>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// Wraps an engine. Nothing ticks until [`start_ticking`](Self::start_ticking).
    ///
    /// `history` is trimmed to the engine's `history_limit`.
    pub fn new(engine: Engine, history: Vec<TickResult>) -> SharedState {
        let mut live = Live {
            engine,
            history: VecDeque::with_capacity(history.len()),
            ticker: None,
        };
        for result in history {
            live.record(result);
        }
        Arc::new(Self {
            live: Mutex::new(live),
        })
    }

    /// Starts the background ticker for the active panel.
    pub async fn start_ticking(self: &Arc<Self>) {
        let mut live = self.live.lock().await;
        spawn_ticker(self, &mut live);
    }

    /// Aborts the ticker and deactivates the scheduler.
    pub async fn stop_ticking(&self) {
        let mut live = self.live.lock().await;
        if let Some(ticker) = live.ticker.take() {
            ticker.handle.abort();
            info!(panel = %ticker.panel_id, "ticker stopped");
        }
        live.engine.stop();
    }
}

/// Replaces the ticker when the active panel changed since it started.
///
/// Does nothing when no ticker is running.
fn sync_ticker(state: &SharedState, live: &mut Live) {
    let Some(ticker) = live.ticker.as_ref() else {
        return;
    };
    if ticker.panel_id != live.engine.workspace().active_id() {
        spawn_ticker(state, live);
    }
}

fn spawn_ticker(state: &SharedState, live: &mut Live) {
    if let Some(old) = live.ticker.take() {
        old.handle.abort();
        info!(panel = %old.panel_id, "ticker stopped");
    }

    let panel_id = live.engine.workspace().active_id().to_string();
    let period = live.engine.config().tick_interval;
    live.engine.start(std::time::Instant::now());

    // The task ends once the state is dropped.
    let weak: Weak<AppState> = Arc::downgrade(state);
    let id = panel_id.clone();
    let handle = tokio::spawn(async move {
        let mut interval = time::interval_at(time::Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let Some(state) = weak.upgrade() else {
                break;
            };
            let mut live = state.live.lock().await;
            if live.engine.workspace().active_id() != id {
                break;
            }
            let result = live.engine.step();
            live.record(result);
        }
    });

    info!(panel = %panel_id, period_ms = period.as_millis() as u64, "ticker started");
    live.ticker = Some(Ticker { panel_id, handle });
}

/// Builds the axum router with all API routes.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/state", get(handlers::get_state))
        .route("/panels", get(handlers::get_panels))
        .route("/telemetry", get(handlers::get_telemetry))
        .route("/devices", get(handlers::get_devices))
        .route("/commands", post(handlers::post_command))
        .with_state(state)
}

/// Starts the ticker, binds to `addr`, and serves until Ctrl+C or SIGTERM.
/// The ticker is stopped before returning.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind or the server fails.
pub async fn serve(state: SharedState, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    state.start_ticking().await;
    info!(%addr, "API server listening");
    let served = axum::serve(listener, router(Arc::clone(&state)))
        .with_graceful_shutdown(shutdown_signal())
        .await;
    state.stop_ticking().await;
    served
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! { _ = ctrl_c => {}, _ = terminate => {}, }
    info!("shutdown signal received");
}
