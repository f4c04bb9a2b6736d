//! Core panel data model: panels, breakers, runs, components, and devices.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::PanelError;

/// Room temperature floor for component temperature (°F).
pub const AMBIENT_TEMP_F: f64 = 75.0;

/// Breaker heat at which a thermal trip occurs.
pub const MAX_HEAT: f64 = 100.0;

/// Supported breaker ratings and the number of poles each requires.
pub const BREAKER_RATINGS: [(u32, Pole); 7] = [
    (15, Pole::Single),
    (20, Pole::Single),
    (30, Pole::Double),
    (40, Pole::Double),
    (50, Pole::Double),
    (60, Pole::Double),
    (100, Pole::Double),
];

/// Returns the pole count required by a breaker rating.
///
/// # Errors
///
/// Returns [`PanelError::UnsupportedRating`] for ratings not in [`BREAKER_RATINGS`].
pub fn pole_for_rating(rating: u32) -> Result<Pole, PanelError> {
    BREAKER_RATINGS
        .iter()
        .find(|(r, _)| *r == rating)
        .map(|(_, pole)| *pole)
        .ok_or(PanelError::UnsupportedRating(rating))
}

/// Column of a slot: `1` for the odd (A) column, `0` for the even (B) column.
pub fn column(slot: u32) -> u32 {
    slot % 2
}

/// Main service rating. Determines both the main limit and the slot count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum ServiceRating {
    /// 100 A service, 20 slots.
    Amps100,
    /// 200 A service, 30 slots.
    Amps200,
    /// 400 A service, 40 slots.
    Amps400,
}

impl ServiceRating {
    /// Main breaker limit in amps.
    pub fn amps(self) -> u32 {
        match self {
            Self::Amps100 => 100,
            Self::Amps200 => 200,
            Self::Amps400 => 400,
        }
    }

    /// Number of breaker slots in a panel with this service.
    pub fn total_slots(self) -> u32 {
        match self {
            Self::Amps100 => 20,
            Self::Amps200 => 30,
            Self::Amps400 => 40,
        }
    }
}

impl TryFrom<u32> for ServiceRating {
    type Error = PanelError;

    fn try_from(amps: u32) -> Result<Self, Self::Error> {
        match amps {
            100 => Ok(Self::Amps100),
            200 => Ok(Self::Amps200),
            400 => Ok(Self::Amps400),
            other => Err(PanelError::UnsupportedServiceLimit(other)),
        }
    }
}

impl From<ServiceRating> for u32 {
    fn from(rating: ServiceRating) -> Self {
        rating.amps()
    }
}

/// How many vertically adjacent slots of one column a breaker occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pole {
    /// One slot, 120 V.
    Single,
    /// Two slots `[s, s + 2]`, 240 V.
    Double,
}

impl Pole {
    /// Number of slots occupied.
    pub fn count(self) -> usize {
        match self {
            Self::Single => 1,
            Self::Double => 2,
        }
    }

    /// Default rating for a freshly placed breaker of this pole count.
    pub fn default_rating(self) -> u32 {
        match self {
            Self::Single => 15,
            Self::Double => 30,
        }
    }

    /// Slot set starting at `start`: `[start]` or `[start, start + 2]`.
    ///
    /// `None` when the second slot would not fit in a `u32`.
    pub fn slots_from(self, start: u32) -> Option<Vec<u32>> {
        match self {
            Self::Single => Some(vec![start]),
            Self::Double => Some(vec![start, start.checked_add(2)?]),
        }
    }

    fn from_slot_count(n: usize) -> Self {
        if n >= 2 { Self::Double } else { Self::Single }
    }
}

/// Device grouping used by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceCategory {
    Lighting,
    Kitchen,
    Laundry,
    Hvac,
    Electronics,
    Tools,
    Personal,
    Plumbing,
    Outdoor,
    Other,
}

/// A load plugged into or wired to a component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub uid: String,
    pub name: String,
    /// Rated draw in watts. Non-finite values contribute nothing to load.
    pub watts: f64,
    pub is_on: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<DeviceCategory>,
}

/// Kind of wired component on a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Outlet,
    Switch,
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Outlet => f.write_str("outlet"),
            Self::Switch => f.write_str("switch"),
        }
    }
}

fn ambient() -> f64 {
    AMBIENT_TEMP_F
}

/// An outlet or switch on a run, hosting devices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub id: String,
    pub kind: ComponentKind,
    pub grounded: bool,
    /// Switch position. Outlets ignore it and always conduct.
    #[serde(default)]
    pub is_on: bool,
    /// Contact temperature in °F, always within `[75, 260]`.
    #[serde(default = "ambient")]
    pub temperature: f64,
    #[serde(default)]
    pub devices: Vec<Device>,
}

impl Component {
    /// Creates an empty, grounded component at ambient temperature.
    ///
    /// Switches start in the off position.
    pub fn new(id: String, kind: ComponentKind) -> Self {
        Self {
            id,
            kind,
            grounded: true,
            is_on: false,
            temperature: AMBIENT_TEMP_F,
            devices: Vec::new(),
        }
    }

    /// Whether the component passes current to its devices.
    pub fn conducts(&self) -> bool {
        match self.kind {
            ComponentKind::Outlet => true,
            ComponentKind::Switch => self.is_on,
        }
    }
}

/// A wiring branch off a breaker: an ordered chain of components.
pub type Run = Vec<Component>;

/// A circuit breaker occupying one or two slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breaker {
    pub id: String,
    pub name: String,
    /// Ampere rating; one of [`BREAKER_RATINGS`].
    pub rating: u32,
    /// Occupied slots, `[s]` or `[s, s + 2]`.
    pub slots: Vec<u32>,
    /// Overload accumulator in `[0, 100]`.
    #[serde(default)]
    pub thermal_heat: f64,
    pub on: bool,
    pub runs: Vec<Run>,
}

impl Breaker {
    /// Pole count implied by the occupied slots.
    pub fn pole(&self) -> Pole {
        Pole::from_slot_count(self.slots.len())
    }

    /// First (top) slot, or 0 for a breaker that holds no slots.
    pub fn first_slot(&self) -> u32 {
        self.slots.first().copied().unwrap_or(0)
    }

    /// Whether this breaker holds `slot`.
    pub fn occupies(&self, slot: u32) -> bool {
        self.slots.contains(&slot)
    }

    /// Iterates every component across every run.
    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.runs.iter().flatten()
    }

    /// Whether this breaker currently delivers power.
    pub fn energized(&self, main_power_on: bool) -> bool {
        self.on && main_power_on
    }
}

/// A panel: service rating, main breaker status, and installed breakers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Panel {
    pub id: String,
    pub name: String,
    #[serde(rename = "main_service_limit")]
    pub service: ServiceRating,
    #[serde(default)]
    pub main_tripped: bool,
    #[serde(default)]
    pub main_manual_off: bool,
    #[serde(default)]
    pub breakers: Vec<Breaker>,
}

impl Panel {
    /// Creates an empty panel with the main breaker on.
    pub fn new(id: String, name: impl Into<String>, service: ServiceRating) -> Self {
        Self {
            id,
            name: name.into(),
            service,
            main_tripped: false,
            main_manual_off: false,
            breakers: Vec::new(),
        }
    }

    /// Whether the main breaker is closed (neither tripped nor manually off).
    pub fn main_power_on(&self) -> bool {
        !self.main_tripped && !self.main_manual_off
    }

    /// Slot count of the panel.
    pub fn total_slots(&self) -> u32 {
        self.service.total_slots()
    }

    /// Finds a breaker by id.
    pub fn breaker(&self, id: &str) -> Option<&Breaker> {
        self.breakers.iter().find(|b| b.id == id)
    }

    /// Finds a breaker by id, mutably.
    pub fn breaker_mut(&mut self, id: &str) -> Option<&mut Breaker> {
        self.breakers.iter_mut().find(|b| b.id == id)
    }

    /// Returns the breaker holding `slot`, if any.
    pub fn slot_owner(&self, slot: u32) -> Option<&Breaker> {
        self.breakers.iter().find(|b| b.occupies(slot))
    }

    /// Highest occupied slot number, or 0 for an empty panel.
    pub fn max_occupied_slot(&self) -> u32 {
        self.breakers
            .iter()
            .flat_map(|b| b.slots.iter().copied())
            .max()
            .unwrap_or(0)
    }
}
