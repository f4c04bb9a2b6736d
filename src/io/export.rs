//! CSV export of per-tick telemetry.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::sim::types::TickResult;

/// Column header for tick telemetry.
const HEADER: &str = "tick,sim_seconds,total_load_amps,main_power_on,main_tripped,\
                       breakers_on,max_heat,max_component_temp_f,trips";

/// Exports tick results to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(results: &[TickResult], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(results, buf)
}

/// Writes tick results as CSV to any writer.
///
/// The `trips` column lists `kind:breaker_id` pairs (or `main`) separated
/// by `;`, empty when nothing tripped.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(results: &[TickResult], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(',').map(str::trim))?;

    for r in results {
        let trips: Vec<String> = r
            .trips
            .iter()
            .map(|t| match &t.breaker_id {
                Some(id) => format!("{}:{id}", t.kind),
                None => t.kind.to_string(),
            })
            .collect();
        wtr.write_record(&[
            r.tick.to_string(),
            format!("{:.1}", r.sim_seconds),
            format!("{:.4}", r.total_load_amps),
            r.main_power_on.to_string(),
            r.main_tripped.to_string(),
            r.breakers_on.to_string(),
            format!("{:.4}", r.max_heat),
            format!("{:.2}", r.max_component_temp),
            trips.join(";"),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
