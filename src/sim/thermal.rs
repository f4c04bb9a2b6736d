//! Breaker heat and component temperature models.
//!
//! Both are pure functions of the previous value and the tick inputs. The
//! breaker model is an abstract overload accumulator; the component model
//! is a lumped thermal-capacitance model of contact heating.

use super::load::LINE_VOLTAGE;
use crate::panel::types::{AMBIENT_TEMP_F, ComponentKind, MAX_HEAT};

/// Wall-clock seconds represented by one tick at speed 1.
pub const BASE_TICK_SECONDS: f64 = 0.5;

/// Upper bound for component temperature (insulation limit, °F).
pub const MAX_COMPONENT_TEMP_F: f64 = 260.0;

/// Time constant for cooling toward ambient (seconds).
pub const COOLING_TIME_CONSTANT_S: f64 = 90.0;

/// Contact resistance (ohms) by component kind.
pub fn contact_resistance(kind: ComponentKind) -> f64 {
    match kind {
        ComponentKind::Outlet => 0.035,
        ComponentKind::Switch => 0.05,
    }
}

/// Heat capacity (J/°F) by component kind. Outlets carry more thermal mass.
pub fn heat_capacity(kind: ComponentKind) -> f64 {
    match kind {
        ComponentKind::Outlet => 45.0,
        ComponentKind::Switch => 30.0,
    }
}

/// Advances breaker heat by one tick.
///
/// # Arguments
///
/// * `heat` - Previous heat in `[0, 100]`
/// * `load_ratio` - Effective amps divided by rating
/// * `time_speed` - Simulation speed multiplier
/// * `energized` - Breaker on and main on
///
/// # Returns
///
/// New heat, clamped to `[0, 100]`.
pub fn next_breaker_heat(heat: f64, load_ratio: f64, time_speed: f64, energized: bool) -> f64 {
    let delta = if !energized {
        -1.0 * time_speed
    } else if load_ratio > 1.0 {
        (load_ratio * load_ratio - 1.0) * 0.5 * time_speed
    } else {
        -0.5 * time_speed
    };
    (heat + delta).clamp(0.0, MAX_HEAT)
}

/// Simulated seconds that elapse in one tick.
pub fn tick_seconds(time_speed: f64) -> f64 {
    BASE_TICK_SECONDS * time_speed.max(1.0)
}

/// Advances a component's contact temperature by one tick.
///
/// Joule heating `I²R` over the tick is converted to a temperature rise by
/// the kind's heat capacity; cooling decays the excess over ambient with a
/// 90 s time constant.
///
/// # Arguments
///
/// * `kind` - Outlet or switch
/// * `previous` - Previous temperature (°F)
/// * `load_watts` - Present load through the component (0 when unpowered)
/// * `time_speed` - Simulation speed multiplier
///
/// # Returns
///
/// New temperature, clamped to `[75, 260]`.
pub fn next_component_temp(
    kind: ComponentKind,
    previous: f64,
    load_watts: f64,
    time_speed: f64,
) -> f64 {
    let amps = load_watts / LINE_VOLTAGE;
    let power_w = amps * amps * contact_resistance(kind);
    let dt = tick_seconds(time_speed);

    let heating = power_w * dt / heat_capacity(kind);
    let cooling = (previous - AMBIENT_TEMP_F) * dt / COOLING_TIME_CONSTANT_S;

    (previous + heating - cooling).clamp(AMBIENT_TEMP_F, MAX_COMPONENT_TEMP_F)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpowered_breaker_cools_at_full_rate() {
        assert_eq!(next_breaker_heat(50.0, 3.0, 1.0, false), 49.0);
        assert_eq!(next_breaker_heat(50.0, 0.0, 10.0, false), 40.0);
    }

    #[test]
    fn within_rating_cools_at_half_rate() {
        assert_eq!(next_breaker_heat(50.0, 1.0, 1.0, true), 49.5);
        assert_eq!(next_breaker_heat(50.0, 0.2, 10.0, true), 45.0);
    }

    #[test]
    fn overload_heats_superlinearly() {
        // 150%: (2.25 - 1) * 0.5 = 0.625
        assert!((next_breaker_heat(10.0, 1.5, 1.0, true) - 10.625).abs() < 1e-12);
        // 200%: (4 - 1) * 0.5 = 1.5
        assert!((next_breaker_heat(10.0, 2.0, 1.0, true) - 11.5).abs() < 1e-12);
    }

    #[test]
    fn heat_is_clamped() {
        assert_eq!(next_breaker_heat(0.2, 0.0, 50.0, false), 0.0);
        assert_eq!(next_breaker_heat(99.0, 5.0, 50.0, true), 100.0);
    }

    #[test]
    fn tick_seconds_never_below_base() {
        assert_eq!(tick_seconds(0.0), 0.5);
        assert_eq!(tick_seconds(1.0), 0.5);
        assert_eq!(tick_seconds(10.0), 5.0);
    }

    #[test]
    fn idle_component_stays_at_ambient() {
        let t = next_component_temp(ComponentKind::Outlet, AMBIENT_TEMP_F, 0.0, 1.0);
        assert_eq!(t, AMBIENT_TEMP_F);
    }

    #[test]
    fn loaded_component_heats() {
        // 1800 W → 15 A; 225 * 0.035 = 7.875 W; * 0.5 s / 45 = 0.0875 °F
        let t = next_component_temp(ComponentKind::Outlet, AMBIENT_TEMP_F, 1800.0, 1.0);
        assert!((t - (AMBIENT_TEMP_F + 0.0875)).abs() < 1e-9);
    }

    #[test]
    fn switch_heats_faster_than_outlet() {
        let outlet = next_component_temp(ComponentKind::Outlet, 100.0, 2400.0, 1.0);
        let switch = next_component_temp(ComponentKind::Switch, 100.0, 2400.0, 1.0);
        assert!(switch > outlet);
    }

    #[test]
    fn hot_component_cools_toward_ambient() {
        let t = next_component_temp(ComponentKind::Switch, 165.0, 0.0, 1.0);
        // cooling = 90 * 0.5 / 90 = 0.5
        assert!((t - 164.5).abs() < 1e-9);
    }

    #[test]
    fn component_temperature_is_clamped() {
        let hot = next_component_temp(ComponentKind::Switch, 259.0, 1.0e6, 50.0);
        assert_eq!(hot, MAX_COMPONENT_TEMP_F);
        let cold = next_component_temp(ComponentKind::Outlet, 60.0, 0.0, 1.0);
        assert_eq!(cold, AMBIENT_TEMP_F);
    }
}
