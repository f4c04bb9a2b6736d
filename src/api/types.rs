//! API response and query types.

use serde::{Deserialize, Serialize};

use crate::panel::types::{Panel, ServiceRating};
use crate::sim::types::{SimulationState, TimeSpeed};

/// Active panel and the output of the latest tick.
#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub active_panel_id: String,
    pub panel: Panel,
    pub simulation: SimulationState,
    pub time_speed: TimeSpeed,
    pub ticks_run: usize,
}

/// One entry of `GET /panels`.
#[derive(Debug, Serialize)]
pub struct PanelSummary {
    pub id: String,
    pub name: String,
    pub main_service_limit: ServiceRating,
    pub breaker_count: usize,
    pub main_power_on: bool,
    pub active: bool,
}

impl PanelSummary {
    pub fn new(panel: &Panel, active_id: &str) -> Self {
        Self {
            id: panel.id.clone(),
            name: panel.name.clone(),
            main_service_limit: panel.service,
            breaker_count: panel.breakers.len(),
            main_power_on: panel.main_power_on(),
            active: panel.id == active_id,
        }
    }
}

/// Result of an accepted command.
#[derive(Debug, Serialize)]
pub struct CommandResponse {
    pub command: String,
    /// Id of the breaker, component, device, or panel created, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_id: Option<String>,
    /// Active panel after the command.
    pub panel: Panel,
}

/// Query parameters for `GET /telemetry` (inclusive tick range).
#[derive(Debug, Deserialize)]
pub struct TelemetryQuery {
    pub from: Option<usize>,
    pub to: Option<usize>,
}

/// Query parameters for `GET /devices`.
#[derive(Debug, Deserialize)]
pub struct DeviceQuery {
    pub q: Option<String>,
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
