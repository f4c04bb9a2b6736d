//! Trip records and scripted commands.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::panel::command::Command;

/// Why a breaker (or the main) was forced off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripKind {
    /// Load above ten times the rating; opens on the same tick.
    Instant,
    /// Accumulated heat reached 100.
    Thermal,
    /// Combined breaker load exceeded the service limit.
    Main,
}

impl fmt::Display for TripKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instant => f.write_str("instant"),
            Self::Thermal => f.write_str("thermal"),
            Self::Main => f.write_str("main"),
        }
    }
}

/// A forced transition to off that happened during one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripEvent {
    pub kind: TripKind,
    /// Tripped breaker, `None` for a main trip.
    pub breaker_id: Option<String>,
    /// Load through the breaker (or the whole panel) when it tripped (A).
    pub load_amps: f64,
}

impl TripEvent {
    /// Trip of a single breaker.
    pub fn breaker(kind: TripKind, breaker_id: &str, load_amps: f64) -> Self {
        Self {
            kind,
            breaker_id: Some(breaker_id.to_string()),
            load_amps,
        }
    }

    /// Trip of the main breaker.
    pub fn main(load_amps: f64) -> Self {
        Self {
            kind: TripKind::Main,
            breaker_id: None,
            load_amps,
        }
    }
}

/// A command applied to the workspace just before tick `at_tick` runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledCommand {
    pub at_tick: usize,
    pub command: Command,
}

impl ScheduledCommand {
    /// Returns `true` when this command is due on `tick`.
    pub fn is_due(&self, tick: usize) -> bool {
        self.at_tick == tick
    }
}
