//! Scenario loading and run drivers shared by the binary and tests.

use std::path::Path;
use std::thread;
use std::time::Instant;

use thiserror::Error;
use tracing::info;

use crate::cli::CliOptions;
use crate::config::{ConfigError, ScenarioConfig};
use crate::io::persist::{self, PersistError};
use crate::sim::engine::Engine;
use crate::sim::kpi::KpiReport;
use crate::sim::types::{TickResult, TimeSpeed};

/// Why a run could not be set up.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{}", join_errors(.0))]
    Invalid(Vec<ConfigError>),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

fn join_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Everything a finished run produced.
#[derive(Debug)]
pub struct RunOutput {
    pub results: Vec<TickResult>,
    pub kpi: KpiReport,
}

/// Resolves the scenario source and applies command-line overrides.
///
/// `--scenario` wins over `--preset`; with neither, the starter preset is used.
///
/// # Errors
///
/// Returns `RunError::Config` if the file or preset cannot be loaded.
pub fn load_scenario(opts: &CliOptions) -> Result<ScenarioConfig, RunError> {
    let mut scenario = if let Some(path) = opts.scenario.as_deref() {
        ScenarioConfig::from_toml_file(path)?
    } else if let Some(name) = opts.preset.as_deref() {
        ScenarioConfig::from_preset(name)?
    } else {
        ScenarioConfig::starter()
    };

    let s = &mut scenario.simulation;
    if let Some(seed) = opts.seed {
        s.seed = seed;
    }
    if let Some(ticks) = opts.ticks {
        s.ticks = ticks;
    }
    if let Some(speed) = opts.time_speed {
        s.time_speed = speed;
    }
    Ok(scenario)
}

/// Validates the scenario and builds an engine over it.
///
/// With `saved`, panels come from the snapshot and the scenario only
/// contributes simulation settings and scripted commands. The configured
/// time speed overrides the saved one only when it differs from 1x.
///
/// # Errors
///
/// Returns `RunError::Invalid` with every violation, or `RunError::Persist`
/// if the snapshot cannot be loaded.
pub fn build_engine(scenario: &ScenarioConfig, saved: Option<&Path>) -> Result<Engine, RunError> {
    let errors = scenario.validate();
    if !errors.is_empty() {
        return Err(RunError::Invalid(errors));
    }

    let config = scenario.sim_config();
    let workspace = match saved {
        Some(path) => {
            let mut ws = persist::load(path, scenario.panel.swap_policy, config.seed)?;
            if config.time_speed != TimeSpeed::X1 {
                ws.set_time_speed(config.time_speed);
            }
            ws
        }
        None => scenario.build_workspace(),
    };

    info!(
        panel = %workspace.active_id(),
        ticks = config.ticks,
        time_speed = %workspace.time_speed(),
        "engine ready"
    );
    Ok(Engine::new(config, workspace, scenario.commands.clone()))
}

/// Runs every configured tick as fast as possible.
pub fn run_headless(engine: &mut Engine) -> RunOutput {
    let results = engine.run();
    let kpi = KpiReport::from_results(&results);
    RunOutput { results, kpi }
}

/// Runs every configured tick paced by the wall-clock scheduler.
///
/// `on_tick` sees each result as it is produced.
pub fn run_realtime(engine: &mut Engine, mut on_tick: impl FnMut(&TickResult)) -> RunOutput {
    let total = engine.config().ticks;
    let mut results = Vec::with_capacity(total);

    engine.start(Instant::now());
    while results.len() < total {
        if let Some(wait) = engine.time_until_due(Instant::now()) {
            thread::sleep(wait);
        }
        if let Some(r) = engine.poll(Instant::now()) {
            on_tick(&r);
            results.push(r);
        }
    }
    engine.stop();

    let kpi = KpiReport::from_results(&results);
    RunOutput { results, kpi }
}
