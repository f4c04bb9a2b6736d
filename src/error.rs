//! Rejection taxonomy for panel commands.
//!
//! Every variant describes a command that was refused without mutating the
//! workspace. Trips are state transitions, not errors, and never appear here.

use thiserror::Error;

/// A rejected panel command. The `Display` text is the reason shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PanelError {
    #[error("Cannot install here. Slot {slot} is out of bounds (1..={total_slots}).")]
    SlotOutOfBounds { slot: u32, total_slots: u32 },

    #[error("Cannot install here. Slot {slot} is occupied.")]
    SlotOccupied { slot: u32 },

    #[error("Cannot move breaker: Out of bounds.")]
    MoveOutOfBounds,

    #[error("Cannot move breaker: Multiple breakers in the way.")]
    MultipleBreakersInWay,

    #[error("Cannot swap: Not enough space for double-pole breaker.")]
    SwapNoRoom,

    #[error("Unsupported breaker rating: {0}A")]
    UnsupportedRating(u32),

    #[error("Cannot expand: No space at bottom of panel.")]
    NotEnoughSpaceToExpand,

    #[error("Cannot upgrade to {rating}A: Slot {slot} is occupied.")]
    ExpansionBlocked { rating: u32, slot: u32 },

    #[error(
        "Cannot reduce panel to {limit}A ({slots} slots). Please remove breakers from bottom slots first."
    )]
    ServiceLimitTooSmall { limit: u32, slots: u32 },

    #[error("Unsupported service limit: {0}A (expected 100, 200 or 400)")]
    UnsupportedServiceLimit(u32),

    #[error("Unsupported time speed: {0} (expected 1, 10 or 50)")]
    UnsupportedTimeSpeed(u32),

    #[error("Breaker \"{0}\" not found")]
    BreakerNotFound(String),

    #[error("Panel \"{0}\" not found")]
    PanelNotFound(String),

    #[error("Run {run} not found on breaker \"{breaker}\"")]
    RunNotFound { breaker: String, run: usize },

    #[error("Component {component} not found in run {run}")]
    ComponentNotFound { run: usize, component: usize },

    #[error("Device \"{0}\" not found")]
    DeviceNotFound(String),

    #[error("Component {component} in run {run} is not a switch")]
    NotASwitch { run: usize, component: usize },

    #[error("Cannot remove the only component on a breaker.")]
    LastComponent,

    #[error("Cannot delete the last panel.")]
    LastPanel,
}
