//! End-to-end behavior of load, heat, trips, and moves on small panels.

mod common;

use common::{breaker, double, panel, single, slots_of, workspace};
use panel_sim::error::PanelError;
use panel_sim::panel::command::Command;
use panel_sim::panel::slots::MovePlan;
use panel_sim::panel::types::{MAX_HEAT, ServiceRating};
use panel_sim::sim::engine::{Engine, tick};
use panel_sim::sim::event::{ScheduledCommand, TripKind};
use panel_sim::sim::load::{breaker_load_amps, total_load_amps};
use panel_sim::sim::types::{SimConfig, TimeSpeed};

#[test]
fn twelve_hundred_watts_on_twenty_amps_draws_ten_amps() {
    let b = breaker("kitchen", 20, &[1], 1200.0);
    assert_eq!(breaker_load_amps(&b, true), 10.0);
}

#[test]
fn breaker_off_draws_nothing() {
    let mut b = breaker("kitchen", 20, &[1], 9_000.0);
    b.on = false;
    assert_eq!(breaker_load_amps(&b, true), 0.0);
}

#[test]
fn heat_rises_every_tick_at_150_percent_until_trip() {
    // 20 A rating, 3600 W -> 30 A, ratio 1.5
    let mut p = panel(ServiceRating::Amps200, vec![breaker("a", 20, &[1], 3600.0)]);
    let mut prev = 0.0;
    let mut tripped_at = None;
    for t in 0..400 {
        let out = tick(&p, 1.0);
        let heat = out.panel.breakers[0].thermal_heat;
        if !out.trips.is_empty() {
            assert_eq!(out.trips[0].kind, TripKind::Thermal);
            assert_eq!(heat, MAX_HEAT);
            tripped_at = Some(t);
            break;
        }
        assert!(heat > prev, "tick {t}: heat {heat} did not rise above {prev}");
        prev = heat;
        p = out.panel;
    }
    assert_eq!(tripped_at, Some(159));
}

#[test]
fn single_pole_move_onto_single_pole_swaps() {
    let mut ws = workspace(vec![single("a", 1), single("b", 2)]);
    let plan = ws.move_breaker("a", 2);
    assert!(matches!(plan, Ok(MovePlan::Swap { .. })));
    assert_eq!(slots_of(&ws, "a"), Some(vec![2]));
    assert_eq!(slots_of(&ws, "b"), Some(vec![1]));
}

#[test]
fn move_onto_two_breakers_is_rejected_unchanged() {
    let mut ws = workspace(vec![double("m", 2), double("x", 5), single("y", 9)]);
    let before = ws.active_panel().clone();
    // Target [7, 9] touches the lower half of x and all of y.
    assert_eq!(ws.move_breaker("m", 7), Err(PanelError::MultipleBreakersInWay));
    assert_eq!(ws.active_panel(), &before);
}

#[test]
fn move_to_own_slot_is_a_no_op() {
    let mut ws = workspace(vec![double("m", 2), single("x", 1)]);
    let before = ws.active_panel().clone();
    assert_eq!(ws.move_breaker("m", 2), Ok(MovePlan::Unchanged));
    assert_eq!(ws.active_panel(), &before);
}

#[test]
fn published_total_matches_on_breakers_and_zero_with_main_off() {
    let mut off = breaker("c", 20, &[3], 1200.0);
    off.on = false;
    let p = panel(
        ServiceRating::Amps200,
        vec![
            breaker("a", 20, &[1], 1200.0),
            breaker("b", 30, &[2, 4], 2400.0),
            off,
        ],
    );
    let expected = total_load_amps(&p.breakers, true);
    assert_eq!(expected, 30.0);
    assert_eq!(tick(&p, 1.0).total_load_amps, expected);

    let mut dark = p.clone();
    dark.main_manual_off = true;
    assert_eq!(tick(&dark, 1.0).total_load_amps, 0.0);
}

#[test]
fn main_trip_then_reset_clears_heat() {
    let mut ws = workspace(vec![
        breaker("range", 60, &[1, 3], 12_000.0),
        breaker("dryer", 60, &[2, 4], 13_200.0),
    ]);
    ws.change_service_limit(100).ok();
    let mut engine = Engine::new(SimConfig::new(3, TimeSpeed::X1, 1), ws, Vec::new());

    let first = engine.step();
    assert!(first.main_tripped);
    assert_eq!(first.trips.last().map(|t| t.kind), Some(TripKind::Main));
    let second = engine.step();
    assert_eq!(second.total_load_amps, 0.0);
    assert!(second.trips.is_empty());

    assert!(engine.apply(Command::ToggleMainPower).is_ok());
    let p = engine.workspace().active_panel();
    assert!(p.main_power_on());
    assert!(p.breakers.iter().all(|b| b.thermal_heat == 0.0));
}

#[test]
fn scripted_toggle_stops_heating() {
    let ws = workspace(vec![breaker("kitchen", 15, &[1], 2700.0)]);
    let schedule = vec![ScheduledCommand {
        at_tick: 5,
        command: Command::ToggleBreaker {
            breaker_id: "kitchen".into(),
        },
    }];
    let mut engine = Engine::new(SimConfig::new(10, TimeSpeed::X10, 1), ws, schedule);
    let results = engine.run();
    assert!(results[4].max_heat > 0.0);
    assert_eq!(results[5].total_load_amps, 0.0);
    assert_eq!(results[5].breakers_on, 0);
}
