//! Electrical load computation from device wattage.

use crate::panel::types::{Breaker, Component};

/// Fixed line voltage used to convert watts to amps.
pub const LINE_VOLTAGE: f64 = 120.0;

/// Returns the wattage drawn through a component.
///
/// Sums the wattage of devices that are on. Non-finite wattage contributes
/// nothing. A switch in the off position gates its whole branch to zero.
///
/// # Arguments
///
/// * `component` - Outlet or switch with its devices
///
/// # Returns
///
/// Load in watts (W)
pub fn component_load_watts(component: &Component) -> f64 {
    if !component.conducts() {
        return 0.0;
    }
    component
        .devices
        .iter()
        .filter(|d| d.is_on && d.watts.is_finite())
        .map(|d| d.watts)
        .sum()
}

/// Returns the current drawn through a breaker.
///
/// Zero when the breaker is off or the main is off; otherwise the total
/// wattage of every component on every run divided by [`LINE_VOLTAGE`].
/// No rounding is applied.
///
/// # Arguments
///
/// * `breaker` - Breaker with its runs
/// * `main_power_on` - Whether the main breaker is closed
///
/// # Returns
///
/// Load in amps (A)
pub fn breaker_load_amps(breaker: &Breaker, main_power_on: bool) -> f64 {
    if !breaker.energized(main_power_on) {
        return 0.0;
    }
    let watts: f64 = breaker.components().map(component_load_watts).sum();
    watts / LINE_VOLTAGE
}

/// Returns the combined current of all breakers.
pub fn total_load_amps(breakers: &[Breaker], main_power_on: bool) -> f64 {
    breakers
        .iter()
        .map(|b| breaker_load_amps(b, main_power_on))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::types::{ComponentKind, Device};

    fn device(watts: f64, is_on: bool) -> Device {
        Device {
            uid: format!("d{watts}"),
            name: "Load".into(),
            watts,
            is_on,
            category: None,
        }
    }

    fn outlet(devices: Vec<Device>) -> Component {
        let mut c = Component::new("c".into(), ComponentKind::Outlet);
        c.devices = devices;
        c
    }

    fn breaker(runs: Vec<Vec<Component>>) -> Breaker {
        Breaker {
            id: "b".into(),
            name: "Kitchen".into(),
            rating: 20,
            slots: vec![1],
            thermal_heat: 0.0,
            on: true,
            runs,
        }
    }

    #[test]
    fn sums_only_devices_that_are_on() {
        let c = outlet(vec![device(100.0, true), device(50.0, false), device(25.0, true)]);
        assert_eq!(component_load_watts(&c), 125.0);
    }

    #[test]
    fn non_finite_wattage_is_ignored() {
        let c = outlet(vec![device(f64::NAN, true), device(f64::INFINITY, true), device(60.0, true)]);
        assert_eq!(component_load_watts(&c), 60.0);
    }

    #[test]
    fn switch_off_gates_branch() {
        let mut sw = Component::new("s".into(), ComponentKind::Switch);
        sw.devices = vec![device(500.0, true)];
        assert_eq!(component_load_watts(&sw), 0.0);
        sw.is_on = true;
        assert_eq!(component_load_watts(&sw), 500.0);
    }

    #[test]
    fn twelve_hundred_watts_is_ten_amps() {
        let b = breaker(vec![vec![outlet(vec![device(1200.0, true)])]]);
        assert_eq!(breaker_load_amps(&b, true), 10.0);
    }

    #[test]
    fn breaker_off_draws_nothing() {
        let mut b = breaker(vec![vec![outlet(vec![device(5000.0, true)])]]);
        b.on = false;
        assert_eq!(breaker_load_amps(&b, true), 0.0);
    }

    #[test]
    fn main_off_draws_nothing() {
        let b = breaker(vec![vec![outlet(vec![device(5000.0, true)])]]);
        assert_eq!(breaker_load_amps(&b, false), 0.0);
    }

    #[test]
    fn sums_across_runs() {
        let b = breaker(vec![
            vec![outlet(vec![device(600.0, true)])],
            vec![outlet(vec![device(600.0, true)]), outlet(vec![device(240.0, true)])],
        ]);
        assert_eq!(breaker_load_amps(&b, true), 12.0);
    }

    #[test]
    fn total_load_sums_breakers() {
        let a = breaker(vec![vec![outlet(vec![device(1200.0, true)])]]);
        let b = breaker(vec![vec![outlet(vec![device(2400.0, true)])]]);
        assert_eq!(total_load_amps(&[a.clone(), b.clone()], true), 30.0);
        assert_eq!(total_load_amps(&[a, b], false), 0.0);
    }
}
