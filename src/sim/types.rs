//! Core simulation types: configuration, time speed, and per-tick output.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::event::TripEvent;
use super::thermal::tick_seconds;
use crate::error::PanelError;

/// Default wall-clock period between ticks.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(500);

/// Tick results a long-running server keeps; one hour at the default interval.
pub const DEFAULT_HISTORY_LIMIT: usize = 7200;

/// Simulation speed multiplier.
///
/// Scales the simulated seconds elapsed per tick and the breaker heat
/// delta. It never changes the wall-clock tick rate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum TimeSpeed {
    #[default]
    X1,
    X10,
    X50,
}

impl TimeSpeed {
    /// Numeric multiplier fed into the thermal model.
    pub fn multiplier(self) -> f64 {
        match self {
            Self::X1 => 1.0,
            Self::X10 => 10.0,
            Self::X50 => 50.0,
        }
    }
}

impl TryFrom<u32> for TimeSpeed {
    type Error = PanelError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::X1),
            10 => Ok(Self::X10),
            50 => Ok(Self::X50),
            other => Err(PanelError::UnsupportedTimeSpeed(other)),
        }
    }
}

impl From<TimeSpeed> for u32 {
    fn from(speed: TimeSpeed) -> Self {
        match speed {
            TimeSpeed::X1 => 1,
            TimeSpeed::X10 => 10,
            TimeSpeed::X50 => 50,
        }
    }
}

impl fmt::Display for TimeSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x", u32::from(*self))
    }
}

/// Centralized simulation configuration.
///
/// # Examples
///
/// ```
/// use panel_sim::sim::types::{SimConfig, TimeSpeed};
///
/// let cfg = SimConfig::new(20, TimeSpeed::X10, 42);
/// assert_eq!(cfg.ticks, 20);
/// assert_eq!(cfg.sim_seconds_per_tick(), 5.0);
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct SimConfig {
    /// Number of ticks in a headless run.
    pub ticks: usize,
    /// Initial speed multiplier; commands may change it mid-run.
    pub time_speed: TimeSpeed,
    /// Wall-clock period between ticks in realtime and server modes.
    #[serde(with = "duration_ms")]
    pub tick_interval: Duration,
    /// Seed for id generation.
    pub seed: u64,
    /// Most recent tick results kept in server mode.
    pub history_limit: usize,
}

impl SimConfig {
    /// Creates a configuration with the default 500 ms tick interval.
    ///
    /// # Panics
    ///
    /// Panics if `ticks` is zero.
    pub fn new(ticks: usize, time_speed: TimeSpeed, seed: u64) -> Self {
        assert!(ticks > 0, "ticks must be > 0");
        Self {
            ticks,
            time_speed,
            tick_interval: DEFAULT_TICK_INTERVAL,
            seed,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    /// Simulated seconds covered by one tick at the initial speed.
    pub fn sim_seconds_per_tick(&self) -> f64 {
        tick_seconds(self.time_speed.multiplier())
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }
}

/// Observable output of the most recent tick. Never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SimulationState {
    /// Sum of breaker loads on energized breakers (A).
    pub total_load: f64,
}

/// Complete record of one tick on the active panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickResult {
    /// Tick index, starting at 0.
    pub tick: usize,
    /// Cumulative simulated seconds at the end of this tick.
    pub sim_seconds: f64,
    /// Published `SimulationState::total_load` (A).
    pub total_load_amps: f64,
    pub main_power_on: bool,
    pub main_tripped: bool,
    /// Breakers in the on position after the tick.
    pub breakers_on: usize,
    /// Highest breaker heat after the tick.
    pub max_heat: f64,
    /// Hottest component after the tick (°F).
    pub max_component_temp: f64,
    /// Trips that happened during this tick.
    pub trips: Vec<TripEvent>,
}

impl fmt::Display for TickResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let main = if self.main_tripped {
            "TRIPPED"
        } else if self.main_power_on {
            "on"
        } else {
            "off"
        };
        write!(
            f,
            "t={:>4} ({:>7.1}s) | load={:>7.2} A | main={:<7} | on={:>2} | \
             heat={:>5.1} | temp={:>5.1}°F",
            self.tick,
            self.sim_seconds,
            self.total_load_amps,
            main,
            self.breakers_on,
            self.max_heat,
            self.max_component_temp,
        )?;
        for trip in &self.trips {
            match &trip.breaker_id {
                Some(id) => write!(f, " | TRIP {} {id}", trip.kind)?,
                None => write!(f, " | TRIP main")?,
            }
        }
        Ok(())
    }
}
