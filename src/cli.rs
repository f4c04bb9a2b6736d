//! Command-line argument parsing.

use std::env;
use std::path::PathBuf;

/// Default port for `--serve`.
pub const DEFAULT_PORT: u16 = 3000;

/// Parsed command-line options.
#[derive(Debug, Clone, PartialEq)]
pub struct CliOptions {
    pub scenario: Option<PathBuf>,
    pub preset: Option<String>,
    pub seed: Option<u64>,
    pub ticks: Option<usize>,
    pub time_speed: Option<u32>,
    pub telemetry_out: Option<PathBuf>,
    /// Load a saved workspace instead of building one from the scenario.
    pub load: Option<PathBuf>,
    /// Save the workspace after the run.
    pub save: Option<PathBuf>,
    /// Pace ticks by wall clock instead of running flat out.
    pub realtime: bool,
    pub log_json: bool,
    pub serve: bool,
    pub port: u16,
}

/// What the command line asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum CliAction {
    Run(CliOptions),
    Help,
}

/// Parses the process arguments.
///
/// # Errors
///
/// Returns a message describing the first invalid argument.
pub fn parse_args() -> Result<CliAction, String> {
    let args: Vec<String> = env::args().skip(1).collect();
    parse_args_from(args)
}

/// Parses an explicit argument list (without the program name).
///
/// # Errors
///
/// Returns a message describing the first invalid argument.
pub fn parse_args_from(args: Vec<String>) -> Result<CliAction, String> {
    let mut opts = CliOptions {
        scenario: None,
        preset: None,
        seed: None,
        ticks: None,
        time_speed: None,
        telemetry_out: None,
        load: None,
        save: None,
        realtime: false,
        log_json: false,
        serve: false,
        port: DEFAULT_PORT,
    };
    let mut port = None;

    let mut i = 0usize;
    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "--help" | "-h" => return Ok(CliAction::Help),
            "--realtime" => opts.realtime = true,
            "--log-json" => opts.log_json = true,
            "--serve" => opts.serve = true,
            _ => {
                i += 1;
                let value = args.next_or_err(i, flag)?;
                let duplicate = match flag {
                    "--scenario" => opts.scenario.replace(PathBuf::from(value)).is_some(),
                    "--preset" => opts.preset.replace(value.to_string()).is_some(),
                    "--seed" => opts.seed.replace(parse_number(flag, value)?).is_some(),
                    "--ticks" => opts.ticks.replace(parse_number(flag, value)?).is_some(),
                    "--time-speed" => opts
                        .time_speed
                        .replace(parse_number(flag, value)?)
                        .is_some(),
                    "--telemetry-out" => opts
                        .telemetry_out
                        .replace(PathBuf::from(value))
                        .is_some(),
                    "--load" => opts.load.replace(PathBuf::from(value)).is_some(),
                    "--save" => opts.save.replace(PathBuf::from(value)).is_some(),
                    "--port" => port.replace(parse_number(flag, value)?).is_some(),
                    other => return Err(format!("unknown argument: {other}")),
                };
                if duplicate {
                    return Err(format!("{flag} provided more than once"));
                }
            }
        }
        i += 1;
    }

    if opts.scenario.is_some() && opts.preset.is_some() {
        return Err(
            "arguments `--scenario` and `--preset` are mutually exclusive; choose one source"
                .to_string(),
        );
    }
    if let Some(port) = port {
        opts.port = port;
    }

    Ok(CliAction::Run(opts))
}

fn parse_number<T: std::str::FromStr>(flag: &str, value: &str) -> Result<T, String> {
    value
        .parse()
        .map_err(|_| format!("{flag} value \"{value}\" is not a valid number"))
}

trait SliceArgExt {
    fn next_or_err(&self, index: usize, flag: &str) -> Result<&str, String>;
}

impl SliceArgExt for [String] {
    fn next_or_err(&self, index: usize, flag: &str) -> Result<&str, String> {
        self.get(index)
            .map(String::as_str)
            .ok_or_else(|| format!("missing value for {flag}"))
    }
}

pub fn print_usage() {
    eprintln!("panel-sim: residential electrical panel simulator");
    eprintln!();
    eprintln!("Usage: panel-sim [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario <path>        Load scenario from TOML config file");
    eprintln!("  --preset <name>          Use a built-in preset (starter, overload, main_trip)");
    eprintln!("  --seed <u64>             Override id seed");
    eprintln!("  --ticks <n>              Override tick count");
    eprintln!("  --time-speed <1|10|50>   Override time speed");
    eprintln!("  --telemetry-out <path>   Export tick results to CSV");
    eprintln!("  --load <path>            Start from a saved workspace (JSON)");
    eprintln!("  --save <path>            Save the workspace after the run (JSON)");
    eprintln!("  --realtime               Pace ticks by the configured tick interval");
    eprintln!("  --log-json               Emit logs as JSON");
    eprintln!("  --serve                  Start the HTTP API (feature `api`)");
    eprintln!("  --port <u16>             API server port (default: {DEFAULT_PORT})");
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no --scenario or --preset is given, the starter preset is used.");
}
