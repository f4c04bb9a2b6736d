//! Per-tick orchestration over a panel, and the engine that drives it.
//!
//! [`tick`] is a pure function from a panel snapshot to the next snapshot.
//! [`Engine`] owns a [`Workspace`], applies scripted commands, commits each
//! tick to the active panel, and keeps the wall-clock [`Scheduler`] in step
//! with whichever panel is active.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::clock::{Clock, Scheduler};
use super::event::{ScheduledCommand, TripEvent, TripKind};
use super::load::breaker_load_amps;
use super::thermal::{next_breaker_heat, next_component_temp, tick_seconds};
use super::types::{SimConfig, SimulationState, TickResult};
use crate::error::PanelError;
use crate::panel::command::{Command, CommandOutcome};
use crate::panel::store::Workspace;
use crate::panel::types::{AMBIENT_TEMP_F, MAX_HEAT, Panel};
use crate::sim::load::component_load_watts;

/// Load ratio above which a breaker opens immediately.
pub const INSTANT_TRIP_RATIO: f64 = 10.0;

/// Result of advancing one panel by one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    /// The panel after the tick.
    pub panel: Panel,
    /// Sum of breaker loads on energized breakers, before this tick's trips (A).
    pub total_load_amps: f64,
    /// Trips in the order they were decided.
    pub trips: Vec<TripEvent>,
}

/// Advances every breaker and component of `panel` by one tick.
///
/// Breakers are processed in order. An energized breaker above
/// [`INSTANT_TRIP_RATIO`] opens at full heat and skips the gradual path;
/// otherwise heat advances and a breaker reaching [`MAX_HEAT`] opens.
/// Components on a breaker that tripped this tick keep their previous
/// temperature. The main check runs once, against the pre-trip total.
///
/// # Arguments
///
/// * `panel` - Snapshot to advance
/// * `time_speed` - Simulation speed multiplier
pub fn tick(panel: &Panel, time_speed: f64) -> TickOutcome {
    let main_on = panel.main_power_on();
    let mut next = panel.clone();
    let mut grand_total = 0.0;
    let mut trips = Vec::new();

    for breaker in &mut next.breakers {
        let energized = breaker.energized(main_on);
        let amps = breaker_load_amps(breaker, main_on);
        if energized {
            grand_total += amps;
        }
        let effective = if energized { amps } else { 0.0 };
        let load_ratio = effective / f64::from(breaker.rating);

        if energized && load_ratio > INSTANT_TRIP_RATIO {
            breaker.on = false;
            breaker.thermal_heat = MAX_HEAT;
            trips.push(TripEvent::breaker(TripKind::Instant, &breaker.id, amps));
            continue;
        }

        let heat = next_breaker_heat(breaker.thermal_heat, load_ratio, time_speed, energized);
        if heat >= MAX_HEAT && breaker.on {
            breaker.on = false;
            breaker.thermal_heat = MAX_HEAT;
            trips.push(TripEvent::breaker(TripKind::Thermal, &breaker.id, amps));
            continue;
        }
        breaker.thermal_heat = heat;

        for component in breaker.runs.iter_mut().flatten() {
            let watts = if energized {
                component_load_watts(component)
            } else {
                0.0
            };
            component.temperature =
                next_component_temp(component.kind, component.temperature, watts, time_speed);
        }
    }

    if main_on && grand_total > f64::from(next.service.amps()) {
        next.main_tripped = true;
        trips.push(TripEvent::main(grand_total));
    }

    TickOutcome {
        panel: next,
        total_load_amps: grand_total,
        trips,
    }
}

/// Builds the observable record for a committed tick.
fn summarize(tick: usize, sim_seconds: f64, outcome: &TickOutcome) -> TickResult {
    let panel = &outcome.panel;
    TickResult {
        tick,
        sim_seconds,
        total_load_amps: outcome.total_load_amps,
        main_power_on: panel.main_power_on(),
        main_tripped: panel.main_tripped,
        breakers_on: panel.breakers.iter().filter(|b| b.on).count(),
        max_heat: panel
            .breakers
            .iter()
            .map(|b| b.thermal_heat)
            .fold(0.0, f64::max),
        max_component_temp: panel
            .breakers
            .iter()
            .flat_map(|b| b.components())
            .map(|c| c.temperature)
            .fold(AMBIENT_TEMP_F, f64::max),
        trips: outcome.trips.clone(),
    }
}

/// Simulation engine owning the workspace, scripted commands, and scheduler.
#[derive(Debug)]
pub struct Engine {
    config: SimConfig,
    workspace: Workspace,
    schedule: Vec<ScheduledCommand>,
    scheduler: Scheduler,
    next_tick: usize,
    sim_seconds: f64,
}

impl Engine {
    /// Creates a new engine.
    ///
    /// # Arguments
    ///
    /// * `config` - Simulation configuration
    /// * `workspace` - Panels to simulate; only the active one ticks
    /// * `schedule` - Commands applied before their tick runs
    pub fn new(config: SimConfig, workspace: Workspace, schedule: Vec<ScheduledCommand>) -> Self {
        let scheduler = Scheduler::new(config.tick_interval);
        Self {
            config,
            workspace,
            schedule,
            scheduler,
            next_tick: 0,
            sim_seconds: 0.0,
        }
    }

    /// Applies scripted commands due now, then ticks the active panel.
    pub fn step(&mut self) -> TickResult {
        let t = self.next_tick;
        self.apply_scheduled(t);

        let speed = self.workspace.time_speed().multiplier();
        let outcome = tick(self.workspace.active_panel(), speed);
        for trip in &outcome.trips {
            match &trip.breaker_id {
                Some(id) => warn!(
                    tick = t,
                    breaker = %id,
                    kind = %trip.kind,
                    load_amps = trip.load_amps,
                    "breaker tripped"
                ),
                None => warn!(
                    tick = t,
                    load_amps = trip.load_amps,
                    "main breaker tripped"
                ),
            }
        }
        debug!(
            tick = t,
            total_load_amps = outcome.total_load_amps,
            "tick committed"
        );

        self.sim_seconds += tick_seconds(speed);
        let result = summarize(t, self.sim_seconds, &outcome);
        self.workspace
            .commit_tick(outcome.panel, outcome.total_load_amps);
        self.next_tick += 1;
        result
    }

    /// Runs `config.ticks` ticks and returns every result.
    pub fn run(&mut self) -> Vec<TickResult> {
        let mut results = Vec::with_capacity(self.config.ticks);
        let mut clock = Clock::new(self.config.ticks);
        clock.run(|_| results.push(self.step()));
        results
    }

    /// Applies one command to the workspace.
    ///
    /// When the command changes which panel is active, a running scheduler
    /// is moved to the new panel.
    ///
    /// # Errors
    ///
    /// Returns the rejection reason; the workspace is unchanged.
    pub fn apply(&mut self, command: Command) -> Result<CommandOutcome, PanelError> {
        let outcome = self.workspace.apply(command)?;
        self.sync_scheduler(Instant::now());
        Ok(outcome)
    }

    fn apply_scheduled(&mut self, t: usize) {
        let due: Vec<Command> = self
            .schedule
            .iter()
            .filter(|c| c.is_due(t))
            .map(|c| c.command.clone())
            .collect();
        for command in due {
            if self.apply(command).is_ok() {
                info!(tick = t, "scheduled command applied");
            }
        }
    }

    /// Starts wall-clock ticking for the active panel.
    pub fn start(&mut self, now: Instant) {
        let id = self.workspace.active_id().to_string();
        self.scheduler.activate(&id, now);
    }

    /// Stops wall-clock ticking.
    pub fn stop(&mut self) {
        self.scheduler.deactivate();
    }

    /// Runs one tick if the scheduler is due at `now`.
    pub fn poll(&mut self, now: Instant) -> Option<TickResult> {
        if self.scheduler.poll(now) {
            Some(self.step())
        } else {
            None
        }
    }

    /// Time left until the next scheduled tick, if the scheduler is running.
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.scheduler.time_until_due(now)
    }

    fn sync_scheduler(&mut self, now: Instant) {
        let active = self.workspace.active_id();
        match self.scheduler.active_panel() {
            Some(running) if running != active => {
                let id = active.to_string();
                self.scheduler.activate(&id, now);
            }
            _ => {}
        }
    }

    /// Returns the workspace.
    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Returns the observable output of the latest tick.
    pub fn state(&self) -> SimulationState {
        self.workspace.simulation_state()
    }

    /// Returns the simulation configuration.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Returns the scheduler.
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Number of ticks run so far.
    pub fn ticks_run(&self) -> usize {
        self.next_tick
    }
}
