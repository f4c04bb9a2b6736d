//! Mutable panel store: a workspace of panels with one active panel.
//!
//! Every command validates fully before writing, so a rejected command
//! leaves the workspace exactly as it was.

use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::info;

use super::slots::{MovePlan, SlotAllocator, SwapPolicy};
use super::types::{Breaker, Component, ComponentKind, Device, Panel, Pole, ServiceRating};
use crate::catalog::DeviceSpec;
use crate::error::PanelError;
use crate::sim::types::{SimulationState, TimeSpeed};

/// Length of generated ids.
pub const ID_LEN: usize = 9;

const ID_ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Seeded generator of short base-36 ids.
#[derive(Debug, Clone)]
pub struct IdGen {
    rng: StdRng,
}

impl IdGen {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Returns a fresh id of [`ID_LEN`] lowercase base-36 characters.
    pub fn next_id(&mut self) -> String {
        (0..ID_LEN)
            .map(|_| char::from(ID_ALPHABET[self.rng.random_range(0..ID_ALPHABET.len())]))
            .collect()
    }
}

/// All panels, the active one, and the settings that apply across them.
#[derive(Debug, Clone)]
pub struct Workspace {
    panels: Vec<Panel>,
    /// Index into `panels`; always valid.
    active: usize,
    time_speed: TimeSpeed,
    swap_policy: SwapPolicy,
    ids: IdGen,
    state: SimulationState,
}

impl Workspace {
    /// Creates a workspace holding a single, active panel.
    pub fn new(panel: Panel, time_speed: TimeSpeed, swap_policy: SwapPolicy, seed: u64) -> Self {
        Self {
            panels: vec![panel],
            active: 0,
            time_speed,
            swap_policy,
            ids: IdGen::new(seed),
            state: SimulationState::default(),
        }
    }

    /// Rebuilds a workspace from stored panels.
    ///
    /// An unknown or missing `selected` id activates the first panel.
    /// Returns `None` when `panels` is empty.
    pub fn from_panels(
        panels: Vec<Panel>,
        selected: Option<&str>,
        time_speed: TimeSpeed,
        swap_policy: SwapPolicy,
        seed: u64,
    ) -> Option<Self> {
        if panels.is_empty() {
            return None;
        }
        let active = selected
            .and_then(|id| panels.iter().position(|p| p.id == id))
            .unwrap_or(0);
        Some(Self {
            panels,
            active,
            time_speed,
            swap_policy,
            ids: IdGen::new(seed),
            state: SimulationState::default(),
        })
    }

    // --- queries ---

    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    pub fn panel(&self, id: &str) -> Option<&Panel> {
        self.panels.iter().find(|p| p.id == id)
    }

    pub fn active_panel(&self) -> &Panel {
        &self.panels[self.active]
    }

    pub fn active_id(&self) -> &str {
        &self.panels[self.active].id
    }

    pub fn time_speed(&self) -> TimeSpeed {
        self.time_speed
    }

    pub fn swap_policy(&self) -> SwapPolicy {
        self.swap_policy
    }

    /// Output of the most recent tick.
    pub fn simulation_state(&self) -> SimulationState {
        self.state
    }

    /// Replaces the active panel with the result of a tick.
    pub(crate) fn commit_tick(&mut self, panel: Panel, total_load: f64) {
        let slot = &mut self.panels[self.active];
        if slot.id == panel.id {
            *slot = panel;
        }
        self.state = SimulationState { total_load };
    }

    fn panel_mut(&mut self) -> &mut Panel {
        &mut self.panels[self.active]
    }

    fn allocator(&self) -> SlotAllocator {
        SlotAllocator::new(self.active_panel().total_slots(), self.swap_policy)
    }

    fn breaker_mut(&mut self, id: &str) -> Result<&mut Breaker, PanelError> {
        self.panel_mut()
            .breaker_mut(id)
            .ok_or_else(|| PanelError::BreakerNotFound(id.to_string()))
    }

    fn component_mut(
        &mut self,
        id: &str,
        run: usize,
        component: usize,
    ) -> Result<&mut Component, PanelError> {
        self.breaker_mut(id)?
            .runs
            .get_mut(run)
            .ok_or_else(|| PanelError::RunNotFound {
                breaker: id.to_string(),
                run,
            })?
            .get_mut(component)
            .ok_or(PanelError::ComponentNotFound { run, component })
    }

    // --- breakers ---

    /// Installs a new breaker with the pole's default rating and one run
    /// holding one outlet.
    ///
    /// # Returns
    ///
    /// The new breaker's id.
    ///
    /// # Errors
    ///
    /// Rejects out-of-bounds or occupied slots.
    pub fn place_breaker(&mut self, slot: u32, pole: Pole) -> Result<String, PanelError> {
        let slots = self
            .allocator()
            .plan_place(&self.active_panel().breakers, slot, pole)?;
        let id = self.ids.next_id();
        let outlet = Component::new(self.ids.next_id(), ComponentKind::Outlet);
        let name = match pole {
            Pole::Single => "New Circuit",
            Pole::Double => "New 240V Circuit",
        };
        self.panel_mut().breakers.push(Breaker {
            id: id.clone(),
            name: name.to_string(),
            rating: pole.default_rating(),
            slots,
            thermal_heat: 0.0,
            on: true,
            runs: vec![vec![outlet]],
        });
        Ok(id)
    }

    /// Changes a breaker's rating, growing or shrinking its slots as needed.
    ///
    /// # Errors
    ///
    /// Rejects unknown breakers, unsupported ratings, and blocked growth.
    pub fn resize_breaker(&mut self, id: &str, rating: u32) -> Result<(), PanelError> {
        let plan = self
            .allocator()
            .plan_resize(&self.active_panel().breakers, id, rating)?;
        let breaker = self.breaker_mut(id)?;
        breaker.rating = plan.rating;
        breaker.slots = plan.slots;
        Ok(())
    }

    /// Moves a breaker so its first slot is `target`, swapping with a single
    /// occupant when needed. Both breakers change together or not at all.
    ///
    /// # Errors
    ///
    /// Rejects unknown breakers, out-of-bounds targets, more than one
    /// occupant, and swaps with no room for the displaced breaker.
    pub fn move_breaker(&mut self, id: &str, target: u32) -> Result<MovePlan, PanelError> {
        let plan = self
            .allocator()
            .plan_move(&self.active_panel().breakers, id, target)?;
        match &plan {
            MovePlan::Unchanged => {}
            MovePlan::Relocate { slots } => {
                self.breaker_mut(id)?.slots = slots.clone();
            }
            MovePlan::Swap {
                slots,
                displaced_id,
                displaced_slots,
            } => {
                for b in &mut self.panel_mut().breakers {
                    if b.id == id {
                        b.slots = slots.clone();
                    } else if b.id == *displaced_id {
                        b.slots = displaced_slots.clone();
                    }
                }
                info!(breaker = %id, displaced = %displaced_id, "breakers swapped");
            }
        }
        Ok(plan)
    }

    /// Removes a breaker and frees its slots.
    pub fn delete_breaker(&mut self, id: &str) -> Result<(), PanelError> {
        let breakers = &mut self.panel_mut().breakers;
        let index = breakers
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| PanelError::BreakerNotFound(id.to_string()))?;
        breakers.remove(index);
        Ok(())
    }

    /// Flips a breaker on or off. Either direction clears its heat.
    ///
    /// # Returns
    ///
    /// The new on/off position.
    pub fn toggle_breaker(&mut self, id: &str) -> Result<bool, PanelError> {
        let breaker = self.breaker_mut(id)?;
        breaker.on = !breaker.on;
        breaker.thermal_heat = 0.0;
        Ok(breaker.on)
    }

    pub fn rename_breaker(&mut self, id: &str, name: &str) -> Result<(), PanelError> {
        self.breaker_mut(id)?.name = name.to_string();
        Ok(())
    }

    // --- runs and components ---

    /// Appends a run holding one outlet.
    ///
    /// # Returns
    ///
    /// Index of the new run.
    pub fn add_run(&mut self, id: &str) -> Result<usize, PanelError> {
        self.breaker_mut(id)?;
        let outlet = Component::new(self.ids.next_id(), ComponentKind::Outlet);
        let breaker = self.breaker_mut(id)?;
        breaker.runs.push(vec![outlet]);
        Ok(breaker.runs.len() - 1)
    }

    /// Appends a component to a run. Switches start off.
    ///
    /// # Returns
    ///
    /// The new component's id.
    pub fn add_component(
        &mut self,
        id: &str,
        run: usize,
        kind: ComponentKind,
    ) -> Result<String, PanelError> {
        let breaker = self.breaker_mut(id)?;
        if run >= breaker.runs.len() {
            return Err(PanelError::RunNotFound {
                breaker: id.to_string(),
                run,
            });
        }
        let component_id = self.ids.next_id();
        self.breaker_mut(id)?.runs[run].push(Component::new(component_id.clone(), kind));
        Ok(component_id)
    }

    /// Removes a component. When it is the last one on its run the whole
    /// run goes instead; the last component of the last run stays.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::LastComponent`] for the breaker's only component.
    pub fn remove_component(
        &mut self,
        id: &str,
        run: usize,
        component: usize,
    ) -> Result<(), PanelError> {
        let breaker = self.breaker_mut(id)?;
        let run_len = breaker
            .runs
            .get(run)
            .map(Vec::len)
            .ok_or_else(|| PanelError::RunNotFound {
                breaker: id.to_string(),
                run,
            })?;
        if component >= run_len {
            return Err(PanelError::ComponentNotFound { run, component });
        }

        if run_len > 1 {
            breaker.runs[run].remove(component);
        } else if breaker.runs.len() > 1 {
            breaker.runs.remove(run);
        } else {
            return Err(PanelError::LastComponent);
        }
        Ok(())
    }

    /// Flips a switch.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::NotASwitch`] when the component is an outlet.
    pub fn toggle_switch(
        &mut self,
        id: &str,
        run: usize,
        component: usize,
    ) -> Result<bool, PanelError> {
        let c = self.component_mut(id, run, component)?;
        if c.kind != ComponentKind::Switch {
            return Err(PanelError::NotASwitch { run, component });
        }
        c.is_on = !c.is_on;
        Ok(c.is_on)
    }

    pub fn toggle_ground(
        &mut self,
        id: &str,
        run: usize,
        component: usize,
    ) -> Result<bool, PanelError> {
        let c = self.component_mut(id, run, component)?;
        c.grounded = !c.grounded;
        Ok(c.grounded)
    }

    // --- devices ---

    /// Attaches a finished device record to a component. New devices start on.
    ///
    /// # Returns
    ///
    /// The device's uid.
    pub fn add_device(
        &mut self,
        id: &str,
        run: usize,
        component: usize,
        spec: DeviceSpec,
    ) -> Result<String, PanelError> {
        self.component_mut(id, run, component)?;
        let uid = self.ids.next_id();
        self.component_mut(id, run, component)?
            .devices
            .push(Device::from_spec(uid.clone(), spec));
        Ok(uid)
    }

    pub fn toggle_device(
        &mut self,
        id: &str,
        run: usize,
        component: usize,
        uid: &str,
    ) -> Result<bool, PanelError> {
        let c = self.component_mut(id, run, component)?;
        let device = c
            .devices
            .iter_mut()
            .find(|d| d.uid == uid)
            .ok_or_else(|| PanelError::DeviceNotFound(uid.to_string()))?;
        device.is_on = !device.is_on;
        Ok(device.is_on)
    }

    pub fn remove_device(
        &mut self,
        id: &str,
        run: usize,
        component: usize,
        uid: &str,
    ) -> Result<(), PanelError> {
        let c = self.component_mut(id, run, component)?;
        let index = c
            .devices
            .iter()
            .position(|d| d.uid == uid)
            .ok_or_else(|| PanelError::DeviceNotFound(uid.to_string()))?;
        c.devices.remove(index);
        Ok(())
    }

    // --- main breaker and service ---

    /// Resets a tripped main (clearing every breaker's heat) or flips the
    /// manual off switch.
    ///
    /// # Returns
    ///
    /// Whether main power is on afterwards.
    pub fn toggle_main_power(&mut self) -> bool {
        let panel = self.panel_mut();
        if panel.main_tripped {
            panel.main_tripped = false;
            panel.main_manual_off = false;
            for b in &mut panel.breakers {
                b.thermal_heat = 0.0;
            }
            info!(panel = %panel.id, "main breaker reset");
        } else {
            panel.main_manual_off = !panel.main_manual_off;
        }
        panel.main_power_on()
    }

    /// Changes the service rating and with it the slot count.
    ///
    /// # Errors
    ///
    /// Rejects unsupported limits and limits whose slot count would strand
    /// an installed breaker.
    pub fn change_service_limit(&mut self, limit: u32) -> Result<(), PanelError> {
        let service = ServiceRating::try_from(limit)?;
        let slots = service.total_slots();
        if self.active_panel().max_occupied_slot() > slots {
            return Err(PanelError::ServiceLimitTooSmall { limit, slots });
        }
        self.panel_mut().service = service;
        Ok(())
    }

    pub fn set_time_speed(&mut self, speed: TimeSpeed) {
        self.time_speed = speed;
    }

    // --- panels ---

    /// Adds an empty 200 A panel named "New Panel" and makes it active.
    pub fn add_panel(&mut self) -> String {
        let id = self.ids.next_id();
        self.panels
            .push(Panel::new(id.clone(), "New Panel", ServiceRating::Amps200));
        self.active = self.panels.len() - 1;
        info!(panel = %id, "panel added");
        id
    }

    /// Deletes a panel. Deleting the active panel activates the first
    /// remaining one.
    ///
    /// # Errors
    ///
    /// Rejects unknown ids and the last remaining panel.
    pub fn delete_panel(&mut self, id: &str) -> Result<(), PanelError> {
        if self.panels.len() <= 1 {
            return Err(PanelError::LastPanel);
        }
        let index = self
            .panels
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| PanelError::PanelNotFound(id.to_string()))?;
        self.panels.remove(index);
        if index == self.active {
            self.active = 0;
        } else if index < self.active {
            self.active -= 1;
        }
        info!(panel = %id, active = %self.active_id(), "panel deleted");
        Ok(())
    }

    pub fn rename_panel(&mut self, id: &str, name: &str) -> Result<(), PanelError> {
        let panel = self
            .panels
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| PanelError::PanelNotFound(id.to_string()))?;
        panel.name = name.to_string();
        Ok(())
    }

    pub fn select_panel(&mut self, id: &str) -> Result<(), PanelError> {
        self.active = self
            .panels
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| PanelError::PanelNotFound(id.to_string()))?;
        info!(panel = %id, "panel selected");
        Ok(())
    }
}
