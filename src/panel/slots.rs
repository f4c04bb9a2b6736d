//! Slot allocation on the two-column breaker grid.
//!
//! Slots are numbered `1..=total_slots`; odd slots form column A and even
//! slots column B. A breaker only ever occupies slots of one column, and a
//! slot is held by at most one breaker.
//!
//! The allocator never mutates anything. Each `plan_*` method inspects a
//! snapshot of the installed breakers and returns either the new slot
//! assignment(s) or the reason the command is rejected, so the store can
//! write every affected breaker in one step.

use serde::{Deserialize, Serialize};

use super::types::{Breaker, Pole, column, pole_for_rating};
use crate::error::PanelError;

/// What to do when a displaced double-pole breaker cannot take the row
/// below the mover's old slot during a swap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapPolicy {
    /// Pair the mover's old slot with the displaced breaker's own second
    /// slot when that slot is still free and in the same column.
    #[default]
    BestEffort,
    /// Only ever assign `[s, s + 2]`; reject the swap otherwise.
    Strict,
}

/// New rating and slot set for a breaker after a resize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizePlan {
    pub rating: u32,
    pub slots: Vec<u32>,
}

/// Outcome of planning a move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MovePlan {
    /// Target equals the current first slot; nothing changes.
    Unchanged,
    /// Target slots were free.
    Relocate { slots: Vec<u32> },
    /// Exactly one breaker was in the way and trades places with the mover.
    Swap {
        slots: Vec<u32>,
        displaced_id: String,
        displaced_slots: Vec<u32>,
    },
}

/// Geometry-only planner for placing, resizing, and moving breakers.
#[derive(Debug, Clone, Copy)]
pub struct SlotAllocator {
    total_slots: u32,
    policy: SwapPolicy,
}

impl SlotAllocator {
    /// Creates an allocator for a grid of `total_slots` slots.
    pub fn new(total_slots: u32, policy: SwapPolicy) -> Self {
        Self {
            total_slots,
            policy,
        }
    }

    /// Number of slots in the grid.
    pub fn total_slots(&self) -> u32 {
        self.total_slots
    }

    fn in_bounds(&self, slot: u32) -> bool {
        (1..=self.total_slots).contains(&slot)
    }

    /// Plans a new breaker at `slot`.
    ///
    /// # Returns
    ///
    /// The slot set the new breaker will occupy.
    ///
    /// # Errors
    ///
    /// Rejects the placement if any required slot is out of bounds or held
    /// by an installed breaker.
    pub fn plan_place(
        &self,
        breakers: &[Breaker],
        slot: u32,
        pole: Pole,
    ) -> Result<Vec<u32>, PanelError> {
        let needed = pole.slots_from(slot).ok_or(PanelError::SlotOutOfBounds {
            slot,
            total_slots: self.total_slots,
        })?;
        for &s in &needed {
            if !self.in_bounds(s) {
                return Err(PanelError::SlotOutOfBounds {
                    slot: s,
                    total_slots: self.total_slots,
                });
            }
            if breakers.iter().any(|b| b.occupies(s)) {
                return Err(PanelError::SlotOccupied { slot: s });
            }
        }
        Ok(needed)
    }

    /// Plans a rating change, growing or shrinking the slot set as needed.
    ///
    /// Growing claims the slot one row below the first slot. Shrinking keeps
    /// only the first slot and always succeeds.
    ///
    /// # Errors
    ///
    /// Rejects unknown breakers, unsupported ratings, and growth into a slot
    /// that is out of bounds or held by another breaker.
    pub fn plan_resize(
        &self,
        breakers: &[Breaker],
        id: &str,
        rating: u32,
    ) -> Result<ResizePlan, PanelError> {
        let breaker = find(breakers, id)?;
        let wanted = pole_for_rating(rating)?;
        let start = breaker.first_slot();

        let slots = match (breaker.pole(), wanted) {
            (Pole::Single, Pole::Double) => {
                let next = start.saturating_add(2);
                if next > self.total_slots {
                    return Err(PanelError::NotEnoughSpaceToExpand);
                }
                if breakers.iter().any(|b| b.id != id && b.occupies(next)) {
                    return Err(PanelError::ExpansionBlocked { rating, slot: next });
                }
                vec![start, next]
            }
            (Pole::Double, Pole::Single) => vec![start],
            _ => breaker.slots.clone(),
        };

        Ok(ResizePlan { rating, slots })
    }

    /// Plans moving breaker `id` so that its first slot becomes `target`.
    ///
    /// A single occupant of the target slots is swapped into the mover's
    /// original first slot. More than one occupant is never rotated.
    ///
    /// # Errors
    ///
    /// Rejects unknown breakers, out-of-bounds targets, multiple occupants,
    /// and swaps that leave the displaced breaker nowhere to go.
    pub fn plan_move(
        &self,
        breakers: &[Breaker],
        id: &str,
        target: u32,
    ) -> Result<MovePlan, PanelError> {
        let moving = find(breakers, id)?;
        let original = moving.first_slot();
        if target == original {
            return Ok(MovePlan::Unchanged);
        }

        let slots = moving
            .pole()
            .slots_from(target)
            .ok_or(PanelError::MoveOutOfBounds)?;
        if slots.iter().any(|&s| !self.in_bounds(s)) {
            return Err(PanelError::MoveOutOfBounds);
        }

        let occupants: Vec<&Breaker> = breakers
            .iter()
            .filter(|b| b.id != id && slots.iter().any(|&s| b.occupies(s)))
            .collect();

        match occupants.as_slice() {
            [] => Ok(MovePlan::Relocate { slots }),
            [displaced] => {
                let displaced_slots = self.vacate(breakers, moving, displaced, &slots)?;
                Ok(MovePlan::Swap {
                    slots,
                    displaced_id: displaced.id.clone(),
                    displaced_slots,
                })
            }
            _ => Err(PanelError::MultipleBreakersInWay),
        }
    }

    /// Chooses where `displaced` goes once `moving` takes `taken`.
    fn vacate(
        &self,
        breakers: &[Breaker],
        moving: &Breaker,
        displaced: &Breaker,
        taken: &[u32],
    ) -> Result<Vec<u32>, PanelError> {
        let original = moving.first_slot();
        let free = |slot: u32| {
            self.in_bounds(slot)
                && !taken.contains(&slot)
                && !breakers
                    .iter()
                    .any(|b| b.id != moving.id && b.id != displaced.id && b.occupies(slot))
        };

        if !free(original) {
            return Err(PanelError::SwapNoRoom);
        }

        match displaced.pole() {
            Pole::Single => Ok(vec![original]),
            Pole::Double => {
                let below = original.saturating_add(2);
                if below > self.total_slots {
                    return Err(PanelError::SwapNoRoom);
                }
                if free(below) {
                    return Ok(vec![original, below]);
                }
                let kept = displaced.slots[1];
                let fallback_ok = self.policy == SwapPolicy::BestEffort
                    && kept != original
                    && column(kept) == column(original)
                    && free(kept);
                if fallback_ok {
                    tracing::debug!(
                        breaker = %displaced.id,
                        slots = ?[original, kept],
                        "swap fell back to displaced breaker's own second slot"
                    );
                    Ok(vec![original, kept])
                } else {
                    Err(PanelError::SwapNoRoom)
                }
            }
        }
    }
}

fn find<'a>(breakers: &'a [Breaker], id: &str) -> Result<&'a Breaker, PanelError> {
    breakers
        .iter()
        .find(|b| b.id == id)
        .ok_or_else(|| PanelError::BreakerNotFound(id.to_string()))
}

/// A violation of the slot-grid invariants found by [`check_layout`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutViolation {
    /// Breaker holds zero or more than two slots.
    BadSlotCount { breaker: String },
    /// Slot outside `1..=total_slots`.
    OutOfBounds { breaker: String, slot: u32 },
    /// Breaker spans both columns.
    MixedColumns { breaker: String },
    /// Two breakers hold the same slot.
    Overlap { slot: u32 },
}

/// Verifies bounds, single-column occupancy, and exclusive slot ownership.
///
/// # Returns
///
/// Every violation found; empty when the layout is valid.
pub fn check_layout(breakers: &[Breaker], total_slots: u32) -> Vec<LayoutViolation> {
    let mut violations = Vec::new();
    let mut owner: Vec<Option<&str>> = vec![None; total_slots as usize + 1];

    for b in breakers {
        if b.slots.is_empty() || b.slots.len() > 2 {
            violations.push(LayoutViolation::BadSlotCount {
                breaker: b.id.clone(),
            });
            continue;
        }
        if b.slots.iter().any(|&s| column(s) != column(b.slots[0])) {
            violations.push(LayoutViolation::MixedColumns {
                breaker: b.id.clone(),
            });
        }
        for &s in &b.slots {
            if s == 0 || s > total_slots {
                violations.push(LayoutViolation::OutOfBounds {
                    breaker: b.id.clone(),
                    slot: s,
                });
                continue;
            }
            match owner[s as usize] {
                Some(other) if other != b.id => {
                    violations.push(LayoutViolation::Overlap { slot: s });
                }
                _ => owner[s as usize] = Some(b.id.as_str()),
            }
        }
    }

    violations
}
