//! Cross-Memory Boundary Sweep CLI.
//!
//! Runs the full sweep on the simulated platform and prints a summary.
//!
//! # Exit codes
//!
//! * `0`: every case passed.
//! * `1`: at least one case failed, or the configuration was invalid.
//! * `2`: a fatal link error halted the sweep.

use clap::{Parser, ValueEnum};
use std::io::Write;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use crossmem_sweep::config::Config;
use crossmem_sweep::report::{Console, NullConsole, StdoutConsole};
use crossmem_sweep::sim::Harness;

/// Format of the final summary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Progress lines and a statistics block.
    Text,
    /// The sweep report as JSON; progress lines are suppressed.
    Json,
}

/// Command-line arguments for the sweep.
#[derive(Parser, Debug)]
#[command(author, version, about = "Cross-memory boundary sweep engine")]
struct Args {
    /// TOML configuration; built-in defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Summary format.
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
}

/// Main entry point.
///
/// # Behavior
///
/// 1. **Configuration**: Parses arguments and loads the TOML configuration.
/// 2. **Initialization**: Builds the simulated system and every bus master.
/// 3. **Sweep**: Runs every configuration, master, and case.
/// 4. **Teardown**: Prints the summary and exits with the sweep's exit code.
fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match &args.config {
        Some(path) => Config::load(path),
        None => Ok(Config::default()),
    };
    let config = match config {
        Ok(c) => c,
        Err(e) => {
            eprintln!("[!] FATAL: {}", e);
            process::exit(1);
        }
    };

    let mut harness = match Harness::new(config) {
        Ok(h) => h,
        Err(e) => {
            eprintln!("[!] FATAL: {}", e);
            process::exit(1);
        }
    };

    let mut stdout = StdoutConsole;
    let mut quiet = NullConsole;
    let console: &mut dyn Console = match args.format {
        Format::Text => &mut stdout,
        Format::Json => &mut quiet,
    };

    let report = match harness.run(console) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("[!] FATAL: {}", e);
            process::exit(1);
        }
    };

    match args.format {
        Format::Text => report.print(),
        Format::Json => match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("[!] FATAL: {}", e);
                process::exit(1);
            }
        },
    }

    std::io::stdout().flush().ok();

    process::exit(report.exit_code());
}
