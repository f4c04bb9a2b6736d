//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use panel_sim::panel::slots::SwapPolicy;
use panel_sim::panel::store::Workspace;
use panel_sim::panel::types::{Breaker, Component, ComponentKind, Device, Panel, ServiceRating};
use panel_sim::sim::types::TimeSpeed;

/// An outlet carrying one switched-on device of `watts`.
pub fn outlet(id: &str, watts: f64) -> Component {
    let mut c = Component::new(format!("{id}-outlet"), ComponentKind::Outlet);
    c.devices.push(Device {
        uid: format!("{id}-device"),
        name: "Load".into(),
        watts,
        is_on: true,
        category: None,
    });
    c
}

/// A breaker at `slots` with one run holding one loaded outlet.
pub fn breaker(id: &str, rating: u32, slots: &[u32], watts: f64) -> Breaker {
    Breaker {
        id: id.into(),
        name: id.into(),
        rating,
        slots: slots.to_vec(),
        thermal_heat: 0.0,
        on: true,
        runs: vec![vec![outlet(id, watts)]],
    }
}

/// An idle single-pole 15 A breaker at `slot`.
pub fn single(id: &str, slot: u32) -> Breaker {
    breaker(id, 15, &[slot], 0.0)
}

/// An idle double-pole 30 A breaker at `[slot, slot + 2]`.
pub fn double(id: &str, slot: u32) -> Breaker {
    breaker(id, 30, &[slot, slot + 2], 0.0)
}

/// A panel with the main on.
pub fn panel(service: ServiceRating, breakers: Vec<Breaker>) -> Panel {
    let mut p = Panel::new("panel".into(), "Main Panel", service);
    p.breakers = breakers;
    p
}

/// A single-panel workspace at 1x with the default swap policy.
pub fn workspace(breakers: Vec<Breaker>) -> Workspace {
    Workspace::new(
        panel(ServiceRating::Amps200, breakers),
        TimeSpeed::X1,
        SwapPolicy::BestEffort,
        42,
    )
}

/// Slots of breaker `id` in the active panel.
pub fn slots_of(ws: &Workspace, id: &str) -> Option<Vec<u32>> {
    ws.active_panel().breaker(id).map(|b| b.slots.clone())
}
