//! TOML-based scenario configuration and preset definitions.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::catalog::{CatalogLookup, DeviceLookup, DeviceSpec};
use crate::panel::slots::{LayoutViolation, SwapPolicy, check_layout};
use crate::panel::store::{IdGen, Workspace};
use crate::panel::types::{
    Breaker, Component, ComponentKind, Device, Panel, ServiceRating, pole_for_rating,
};
use crate::sim::event::ScheduledCommand;
use crate::sim::types::{DEFAULT_HISTORY_LIMIT, SimConfig, TimeSpeed};

/// Top-level scenario configuration parsed from TOML.
///
/// All sections have defaults. Load from TOML with
/// [`ScenarioConfig::from_toml_file`] or start from a preset.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Tick count, speed, and seed.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Panel name, service, and main breaker state.
    #[serde(default)]
    pub panel: PanelConfig,
    /// Installed breakers.
    #[serde(default)]
    pub breakers: Vec<BreakerConfig>,
    /// Commands applied just before the given tick.
    #[serde(default)]
    pub commands: Vec<ScheduledCommand>,
}

/// Simulation timing and global parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Number of ticks in a headless run (must be > 0).
    pub ticks: usize,
    /// Speed multiplier: 1, 10, or 50.
    pub time_speed: u32,
    /// Wall-clock period between ticks in realtime and server modes (ms, > 0).
    pub tick_interval_ms: u64,
    /// Seed for id generation.
    pub seed: u64,
    /// Tick results kept by the API server; older ones are dropped (> 0).
    pub history_limit: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            ticks: 120,
            time_speed: 1,
            tick_interval_ms: 500,
            seed: 42,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

/// Panel-level parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PanelConfig {
    pub name: String,
    /// Main service limit: 100, 200, or 400 (A).
    pub service_limit: u32,
    pub swap_policy: SwapPolicy,
    /// Start with the main breaker switched off.
    pub main_manual_off: bool,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            name: "Main Panel".to_string(),
            service_limit: 200,
            swap_policy: SwapPolicy::BestEffort,
            main_manual_off: false,
        }
    }
}

/// One installed breaker.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BreakerConfig {
    /// Stable id, referenced by scripted commands. Generated when absent.
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    /// Ampere rating; double-pole ratings also take `slot + 2`.
    pub rating: u32,
    /// First (top) slot.
    pub slot: u32,
    #[serde(default = "default_true")]
    pub on: bool,
    /// Runs; an empty list installs one run with a single outlet.
    #[serde(default)]
    pub runs: Vec<RunConfig>,
}

/// One run of components.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    #[serde(default)]
    pub components: Vec<ComponentConfig>,
}

/// One outlet or switch.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComponentConfig {
    pub kind: ComponentKind,
    #[serde(default = "default_true")]
    pub grounded: bool,
    /// Switch position; ignored for outlets.
    #[serde(default)]
    pub on: bool,
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
}

/// One device. Without `watts` the name is resolved through the device
/// catalog, falling back to a generic 100 W device.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceConfig {
    pub name: String,
    #[serde(default)]
    pub watts: Option<f64>,
    #[serde(default = "default_true")]
    pub on: bool,
}

fn default_true() -> bool {
    true
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"breakers[1].slot"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

fn breaker(name: &str, rating: u32, slot: u32, runs: Vec<RunConfig>) -> BreakerConfig {
    BreakerConfig {
        id: None,
        name: name.to_string(),
        rating,
        slot,
        on: true,
        runs,
    }
}

fn outlet(devices: Vec<DeviceConfig>) -> ComponentConfig {
    ComponentConfig {
        kind: ComponentKind::Outlet,
        grounded: true,
        on: false,
        devices,
    }
}

fn device(name: &str, watts: f64) -> DeviceConfig {
    DeviceConfig {
        name: name.to_string(),
        watts: Some(watts),
        on: true,
    }
}

fn single_run(components: Vec<ComponentConfig>) -> Vec<RunConfig> {
    vec![RunConfig { components }]
}

impl ScenarioConfig {
    /// Kitchen, shed, and dryer circuits on a 200 A panel, all idle.
    pub fn starter() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            panel: PanelConfig::default(),
            breakers: vec![
                breaker("Kitchen", 20, 1, single_run(vec![outlet(Vec::new())])),
                breaker(
                    "Shed",
                    15,
                    2,
                    single_run(vec![ComponentConfig {
                        kind: ComponentKind::Switch,
                        grounded: true,
                        on: false,
                        devices: Vec::new(),
                    }]),
                ),
                breaker("Dryer (240V)", 30, 3, single_run(vec![outlet(Vec::new())])),
            ],
            commands: Vec::new(),
        }
    }

    /// A 15 A kitchen circuit driven to 150 % load until it trips.
    pub fn overload() -> Self {
        Self {
            simulation: SimulationConfig {
                ticks: 200,
                ..SimulationConfig::default()
            },
            panel: PanelConfig::default(),
            breakers: vec![
                breaker(
                    "Kitchen",
                    15,
                    1,
                    single_run(vec![
                        outlet(vec![device("Toaster (4-slice)", 1400.0)]),
                        outlet(vec![device("Microwave", 1000.0), device("Blender", 300.0)]),
                    ]),
                ),
                breaker(
                    "Living Room",
                    15,
                    2,
                    single_run(vec![outlet(vec![device("TV (55\" LED)", 100.0)])]),
                ),
            ],
            commands: Vec::new(),
        }
    }

    /// A 100 A service whose combined breaker load exceeds the main limit.
    pub fn main_trip() -> Self {
        let heavy = |name: &str, slot: u32, watts: f64| {
            breaker(name, 60, slot, single_run(vec![outlet(vec![device(name, watts)])]))
        };
        Self {
            simulation: SimulationConfig {
                ticks: 20,
                ..SimulationConfig::default()
            },
            panel: PanelConfig {
                service_limit: 100,
                ..PanelConfig::default()
            },
            breakers: vec![
                heavy("Range", 1, 6000.0),
                heavy("Water Heater", 2, 4500.0),
                heavy("Furnace", 5, 7200.0),
            ],
            commands: Vec::new(),
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["starter", "overload", "main_trip"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "starter" => Ok(Self::starter()),
            "overload" => Ok(Self::overload()),
            "main_trip" => Ok(Self::main_trip()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "scenario".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates all fields and returns every violation found.
    ///
    /// Returns an empty vector if the configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let s = &self.simulation;

        if s.ticks == 0 {
            errors.push(ConfigError {
                field: "simulation.ticks".into(),
                message: "must be > 0".into(),
            });
        }
        if let Err(e) = TimeSpeed::try_from(s.time_speed) {
            errors.push(ConfigError {
                field: "simulation.time_speed".into(),
                message: e.to_string(),
            });
        }
        if s.tick_interval_ms == 0 {
            errors.push(ConfigError {
                field: "simulation.tick_interval_ms".into(),
                message: "must be > 0".into(),
            });
        }
        if s.history_limit == 0 {
            errors.push(ConfigError {
                field: "simulation.history_limit".into(),
                message: "must be > 0".into(),
            });
        }

        let service = match ServiceRating::try_from(self.panel.service_limit) {
            Ok(service) => Some(service),
            Err(e) => {
                errors.push(ConfigError {
                    field: "panel.service_limit".into(),
                    message: e.to_string(),
                });
                None
            }
        };

        let mut seen_ids: HashMap<&str, usize> = HashMap::new();
        for (i, b) in self.breakers.iter().enumerate() {
            if let Err(e) = pole_for_rating(b.rating) {
                errors.push(ConfigError {
                    field: format!("breakers[{i}].rating"),
                    message: e.to_string(),
                });
            }
            if b.slot == 0 {
                errors.push(ConfigError {
                    field: format!("breakers[{i}].slot"),
                    message: "must be >= 1".into(),
                });
            }
            if let Some(id) = b.id.as_deref() {
                if let Some(first) = seen_ids.insert(id, i) {
                    errors.push(ConfigError {
                        field: format!("breakers[{i}].id"),
                        message: format!("duplicates breakers[{first}].id \"{id}\""),
                    });
                }
            }
        }

        if let Some(service) = service {
            let mut placed: Vec<Breaker> = Vec::new();
            for (i, b) in self.breakers.iter().enumerate() {
                let Ok(pole) = pole_for_rating(b.rating) else {
                    continue;
                };
                let Some(slots) = pole.slots_from(b.slot) else {
                    errors.push(ConfigError {
                        field: format!("breakers[{i}].slot"),
                        message: format!(
                            "slot {} is outside 1..={}",
                            b.slot,
                            service.total_slots()
                        ),
                    });
                    continue;
                };
                placed.push(Breaker {
                    id: format!("breakers[{i}]"),
                    name: b.name.clone(),
                    rating: b.rating,
                    slots,
                    thermal_heat: 0.0,
                    on: b.on,
                    runs: Vec::new(),
                });
            }
            for violation in check_layout(&placed, service.total_slots()) {
                let message = match violation {
                    LayoutViolation::OutOfBounds { slot, .. } => format!(
                        "slot {slot} is outside 1..={}",
                        service.total_slots()
                    ),
                    LayoutViolation::Overlap { slot } => {
                        format!("slot {slot} is claimed by more than one breaker")
                    }
                    other => format!("{other:?}"),
                };
                errors.push(ConfigError {
                    field: "breakers".into(),
                    message,
                });
            }
        }

        errors
    }

    /// Simulation configuration for this scenario.
    ///
    /// Call after [`validate`](Self::validate); an unsupported time speed
    /// falls back to 1x.
    pub fn sim_config(&self) -> SimConfig {
        let s = &self.simulation;
        let mut config = SimConfig::new(
            s.ticks.max(1),
            TimeSpeed::try_from(s.time_speed).unwrap_or_default(),
            s.seed,
        );
        config.tick_interval = Duration::from_millis(s.tick_interval_ms.max(1));
        config.history_limit = s.history_limit.max(1);
        config
    }

    /// Builds the workspace described by this scenario.
    ///
    /// Call after [`validate`](Self::validate); an unsupported service
    /// limit falls back to 200 A and unsupported ratings are skipped.
    pub fn build_workspace(&self) -> Workspace {
        let mut ids = IdGen::new(self.simulation.seed);
        let service =
            ServiceRating::try_from(self.panel.service_limit).unwrap_or(ServiceRating::Amps200);

        let mut panel = Panel::new(ids.next_id(), self.panel.name.clone(), service);
        panel.main_manual_off = self.panel.main_manual_off;
        panel.breakers = self
            .breakers
            .iter()
            .filter_map(|b| {
                let slots = pole_for_rating(b.rating).ok()?.slots_from(b.slot)?;
                let mut runs: Vec<Vec<Component>> = b
                    .runs
                    .iter()
                    .map(|run| {
                        run.components
                            .iter()
                            .map(|c| build_component(c, &mut ids, &CatalogLookup))
                            .collect()
                    })
                    .filter(|run: &Vec<Component>| !run.is_empty())
                    .collect();
                if runs.is_empty() {
                    runs.push(vec![Component::new(ids.next_id(), ComponentKind::Outlet)]);
                }
                Some(Breaker {
                    id: b.id.clone().unwrap_or_else(|| ids.next_id()),
                    name: b.name.clone(),
                    rating: b.rating,
                    slots,
                    thermal_heat: 0.0,
                    on: b.on,
                    runs,
                })
            })
            .collect();

        Workspace::new(
            panel,
            TimeSpeed::try_from(self.simulation.time_speed).unwrap_or_default(),
            self.panel.swap_policy,
            self.simulation.seed.wrapping_add(1),
        )
    }
}

fn build_component(
    c: &ComponentConfig,
    ids: &mut IdGen,
    lookup: &impl DeviceLookup,
) -> Component {
    let mut component = Component::new(ids.next_id(), c.kind);
    component.grounded = c.grounded;
    component.is_on = c.kind == ComponentKind::Switch && c.on;
    component.devices = c
        .devices
        .iter()
        .map(|d| {
            let spec = match d.watts {
                Some(watts) => DeviceSpec {
                    name: d.name.clone(),
                    watts,
                    category: None,
                },
                None => lookup.lookup(&d.name),
            };
            let mut device = Device::from_spec(ids.next_id(), spec);
            device.is_on = d.on;
            device
        })
        .collect();
    component
}
