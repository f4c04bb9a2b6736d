//! Panel simulator entry point: CLI wiring and run dispatch.

use std::process;

use panel_sim::cli::{CliAction, parse_args, print_usage};
use panel_sim::io::export::export_csv;
use panel_sim::io::persist;
use panel_sim::runner::{build_engine, load_scenario, run_headless, run_realtime};
use panel_sim::telemetry::init_tracing;

fn main() {
    let opts = match parse_args() {
        Ok(CliAction::Run(opts)) => opts,
        Ok(CliAction::Help) => {
            print_usage();
            return;
        }
        Err(e) => {
            eprintln!("error: {e}");
            print_usage();
            process::exit(1);
        }
    };

    init_tracing(opts.log_json);

    let mut engine = match load_scenario(&opts).and_then(|s| build_engine(&s, opts.load.as_deref()))
    {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };

    let output = if opts.realtime {
        run_realtime(&mut engine, |r| println!("{r}"))
    } else {
        let output = run_headless(&mut engine);
        for r in &output.results {
            println!("{r}");
        }
        output
    };

    println!("\n{}", output.kpi);

    if let Some(path) = opts.telemetry_out.as_deref() {
        if let Err(e) = export_csv(&output.results, path) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Telemetry written to {}", path.display());
    }

    if let Some(path) = opts.save.as_deref() {
        if let Err(e) = persist::save(engine.workspace(), path) {
            eprintln!("error: failed to save workspace: {e}");
            process::exit(1);
        }
    }

    if opts.serve {
        serve(engine, output.results, opts.port);
    }
}

#[cfg(feature = "api")]
fn serve(engine: panel_sim::sim::engine::Engine, history: Vec<panel_sim::sim::types::TickResult>, port: u16) {
    use std::net::SocketAddr;

    let state = panel_sim::api::AppState::new(engine, history);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("error: failed to create tokio runtime: {e}");
        process::exit(1);
    });
    if let Err(e) = rt.block_on(panel_sim::api::serve(state, addr)) {
        eprintln!("error: API server failed on {addr}: {e}");
        process::exit(1);
    }
}

#[cfg(not(feature = "api"))]
fn serve(_: panel_sim::sim::engine::Engine, _: Vec<panel_sim::sim::types::TickResult>, _: u16) {
    eprintln!("error: --serve requires building with `--features api`");
    process::exit(1);
}
