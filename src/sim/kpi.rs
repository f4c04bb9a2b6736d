//! Post-hoc run summary computed from tick results.

use std::fmt;

use super::event::TripKind;
use super::types::TickResult;
use crate::panel::types::AMBIENT_TEMP_F;

/// Aggregate figures for a complete run.
///
/// Computed from `Vec<TickResult>` after the fact so the report always
/// agrees with the exported telemetry.
#[derive(Debug, Clone, PartialEq)]
pub struct KpiReport {
    /// Number of ticks summarized.
    pub ticks: usize,
    /// Simulated seconds at the end of the run.
    pub sim_seconds: f64,
    /// Highest published panel load (A).
    pub peak_load_amps: f64,
    /// Mean published panel load (A).
    pub mean_load_amps: f64,
    /// Highest breaker heat seen on any tick.
    pub peak_heat: f64,
    /// Hottest component temperature seen on any tick (°F).
    pub peak_component_temp: f64,
    pub instant_trips: usize,
    pub thermal_trips: usize,
    /// Tick of the first main trip, if any.
    pub main_trip_tick: Option<usize>,
    /// Ticks during which the main breaker delivered no power.
    pub ticks_without_power: usize,
}

impl KpiReport {
    /// Computes the summary from the full tick record.
    pub fn from_results(results: &[TickResult]) -> Self {
        let mut report = Self {
            ticks: results.len(),
            sim_seconds: results.last().map_or(0.0, |r| r.sim_seconds),
            peak_load_amps: 0.0,
            mean_load_amps: 0.0,
            peak_heat: 0.0,
            peak_component_temp: AMBIENT_TEMP_F,
            instant_trips: 0,
            thermal_trips: 0,
            main_trip_tick: None,
            ticks_without_power: 0,
        };
        if results.is_empty() {
            return report;
        }

        let mut load_sum = 0.0;
        for r in results {
            load_sum += r.total_load_amps;
            report.peak_load_amps = report.peak_load_amps.max(r.total_load_amps);
            report.peak_heat = report.peak_heat.max(r.max_heat);
            report.peak_component_temp = report.peak_component_temp.max(r.max_component_temp);
            if !r.main_power_on {
                report.ticks_without_power += 1;
            }
            for trip in &r.trips {
                match trip.kind {
                    TripKind::Instant => report.instant_trips += 1,
                    TripKind::Thermal => report.thermal_trips += 1,
                    TripKind::Main => {
                        report.main_trip_tick.get_or_insert(r.tick);
                    }
                }
            }
        }
        report.mean_load_amps = load_sum / results.len() as f64;
        report
    }
}

impl fmt::Display for KpiReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Run Summary ---")?;
        writeln!(
            f,
            "Ticks:                 {} ({:.1} s simulated)",
            self.ticks, self.sim_seconds
        )?;
        writeln!(f, "Peak load:             {:.2} A", self.peak_load_amps)?;
        writeln!(f, "Mean load:             {:.2} A", self.mean_load_amps)?;
        writeln!(f, "Peak breaker heat:     {:.1}", self.peak_heat)?;
        writeln!(f, "Peak component temp:   {:.1} °F", self.peak_component_temp)?;
        writeln!(
            f,
            "Breaker trips:         {} thermal, {} instant",
            self.thermal_trips, self.instant_trips
        )?;
        match self.main_trip_tick {
            Some(t) => writeln!(f, "Main trip:             tick {t}")?,
            None => writeln!(f, "Main trip:             none")?,
        }
        write!(f, "Ticks without power:   {}", self.ticks_without_power)
    }
}
