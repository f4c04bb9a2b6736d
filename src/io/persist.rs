//! Versioned JSON save and load of a workspace.
//!
//! Only durable fields are written. Breaker heat and component temperature
//! are transient; a loaded workspace starts cold (heat 0, 75 °F).

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::panel::slots::{SwapPolicy, check_layout};
use crate::panel::store::Workspace;
use crate::panel::types::{
    AMBIENT_TEMP_F, Breaker, Component, ComponentKind, Device, Panel, ServiceRating,
    pole_for_rating,
};
use crate::sim::types::TimeSpeed;

/// Format version written by [`PersistedState::capture`].
pub const FORMAT_VERSION: u32 = 1;

/// Failure to save or load a workspace.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid save file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported save format version {0} (expected {FORMAT_VERSION})")]
    UnsupportedVersion(u32),
    #[error("save file contains no panels")]
    Empty,
    #[error("panel {panel} in save file is invalid: {reason}")]
    InvalidPanel { panel: String, reason: String },
}

/// On-disk snapshot of a workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    pub version: u32,
    pub panels: Vec<StoredPanel>,
    pub selected_panel_id: Option<String>,
    pub time_speed: TimeSpeed,
    pub saved_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPanel {
    pub id: String,
    pub name: String,
    pub main_service_limit: ServiceRating,
    #[serde(default)]
    pub main_tripped: bool,
    #[serde(default)]
    pub main_manual_off: bool,
    #[serde(default)]
    pub breakers: Vec<StoredBreaker>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredBreaker {
    pub id: String,
    pub name: String,
    pub rating: u32,
    pub slots: Vec<u32>,
    pub on: bool,
    pub runs: Vec<Vec<StoredComponent>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredComponent {
    pub id: String,
    pub kind: ComponentKind,
    pub grounded: bool,
    #[serde(default)]
    pub is_on: bool,
    #[serde(default)]
    pub devices: Vec<Device>,
}

impl From<&Panel> for StoredPanel {
    fn from(p: &Panel) -> Self {
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            main_service_limit: p.service,
            main_tripped: p.main_tripped,
            main_manual_off: p.main_manual_off,
            breakers: p
                .breakers
                .iter()
                .map(|b| StoredBreaker {
                    id: b.id.clone(),
                    name: b.name.clone(),
                    rating: b.rating,
                    slots: b.slots.clone(),
                    on: b.on,
                    runs: b
                        .runs
                        .iter()
                        .map(|run| {
                            run.iter()
                                .map(|c| StoredComponent {
                                    id: c.id.clone(),
                                    kind: c.kind,
                                    grounded: c.grounded,
                                    is_on: c.is_on,
                                    devices: c.devices.clone(),
                                })
                                .collect()
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

impl From<StoredPanel> for Panel {
    fn from(p: StoredPanel) -> Self {
        let mut panel = Panel::new(p.id, p.name, p.main_service_limit);
        panel.main_tripped = p.main_tripped;
        panel.main_manual_off = p.main_manual_off;
        panel.breakers = p
            .breakers
            .into_iter()
            .map(|b| Breaker {
                id: b.id,
                name: b.name,
                rating: b.rating,
                slots: b.slots,
                thermal_heat: 0.0,
                on: b.on,
                runs: b
                    .runs
                    .into_iter()
                    .map(|run| {
                        run.into_iter()
                            .map(|c| Component {
                                id: c.id,
                                kind: c.kind,
                                grounded: c.grounded,
                                is_on: c.is_on,
                                temperature: AMBIENT_TEMP_F,
                                devices: c.devices,
                            })
                            .collect()
                    })
                    .collect(),
            })
            .collect();
        panel
    }
}

impl PersistedState {
    /// Snapshots the durable part of a workspace.
    pub fn capture(workspace: &Workspace) -> Self {
        Self {
            version: FORMAT_VERSION,
            panels: workspace.panels().iter().map(StoredPanel::from).collect(),
            selected_panel_id: Some(workspace.active_id().to_string()),
            time_speed: workspace.time_speed(),
            saved_at: Utc::now(),
        }
    }

    /// Rebuilds a workspace. Heat starts at 0 and temperatures at ambient.
    ///
    /// # Errors
    ///
    /// Rejects unknown format versions, snapshots without panels, and
    /// panels whose breakers break the slot-grid rules.
    pub fn restore(self, swap_policy: SwapPolicy, seed: u64) -> Result<Workspace, PersistError> {
        if self.version != FORMAT_VERSION {
            return Err(PersistError::UnsupportedVersion(self.version));
        }
        let panels = self
            .panels
            .into_iter()
            .map(|p| {
                let panel = Panel::from(p);
                check_panel(&panel).map(|()| panel)
            })
            .collect::<Result<Vec<Panel>, _>>()?;
        Workspace::from_panels(
            panels,
            self.selected_panel_id.as_deref(),
            self.time_speed,
            swap_policy,
            seed,
        )
        .ok_or(PersistError::Empty)
    }
}

/// A stored breaker must carry a supported rating, sit on `[s]` or
/// `[s, s + 2]` as that rating requires, and share no slot with another.
fn check_panel(panel: &Panel) -> Result<(), PersistError> {
    let invalid = |reason: String| PersistError::InvalidPanel {
        panel: panel.id.clone(),
        reason,
    };
    for b in &panel.breakers {
        let pole = pole_for_rating(b.rating)
            .map_err(|e| invalid(format!("breaker {}: {e}", b.id)))?;
        let expected = b.slots.first().and_then(|&s| pole.slots_from(s));
        if expected.as_deref() != Some(b.slots.as_slice()) {
            return Err(invalid(format!(
                "breaker {} holds slots {:?}, which a {} A breaker cannot occupy",
                b.id, b.slots, b.rating
            )));
        }
    }
    if let Some(v) = check_layout(&panel.breakers, panel.total_slots()).first() {
        return Err(invalid(format!("{v:?}")));
    }
    Ok(())
}

/// Serializes a workspace snapshot as pretty JSON.
///
/// # Errors
///
/// Returns `PersistError::Json` if serialization fails.
pub fn to_json(workspace: &Workspace) -> Result<String, PersistError> {
    Ok(serde_json::to_string_pretty(&PersistedState::capture(
        workspace,
    ))?)
}

/// Parses a snapshot and rebuilds the workspace.
///
/// # Errors
///
/// Returns `PersistError` for malformed JSON, unknown versions, or an
/// empty panel list.
pub fn from_json(json: &str, swap_policy: SwapPolicy, seed: u64) -> Result<Workspace, PersistError> {
    let state: PersistedState = serde_json::from_str(json)?;
    state.restore(swap_policy, seed)
}

/// Writes a workspace snapshot to `path`.
///
/// # Errors
///
/// Returns `PersistError` if serialization or the write fails.
pub fn save(workspace: &Workspace, path: &Path) -> Result<(), PersistError> {
    fs::write(path, to_json(workspace)?)?;
    info!(
        path = %path.display(),
        panels = workspace.panels().len(),
        "workspace saved"
    );
    Ok(())
}

/// Loads a workspace snapshot from `path`.
///
/// # Errors
///
/// Returns `PersistError` if the file cannot be read or is not a valid
/// snapshot.
pub fn load(path: &Path, swap_policy: SwapPolicy, seed: u64) -> Result<Workspace, PersistError> {
    let json = fs::read_to_string(path)?;
    let workspace = from_json(&json, swap_policy, seed)?;
    info!(
        path = %path.display(),
        panels = workspace.panels().len(),
        active = %workspace.active_id(),
        "workspace loaded"
    );
    Ok(workspace)
}
