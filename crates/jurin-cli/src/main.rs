//! jurin: Command-line interface for capillary-rise post-processing.
//!
//! This tool extracts interface heights from simulation output written as
//! VTK XML time series and compares them with Jurin's law, suitable for
//! scripting and regression runs.
//!
//! # Logging
//!
//! Set the `RUST_LOG` environment variable to control log output:
//! - `RUST_LOG=jurin_post=info` - One line per run
//! - `RUST_LOG=jurin_post=debug` - Per-snapshot heights
//! - `RUST_LOG=jurin_post::timing=debug` - Performance timing
//! - `RUST_LOG=debug` - All debug output
//!
//! # Example
//!
//! ```bash
//! # deltaH over time with info logging
//! RUST_LOG=jurin_post=info jurin extract output/ --config jurin.toml
//!
//! # Compare three runs with the analytical solution
//! jurin compare out_30 out_45 out_60 --angle 30 --angle 45 --angle 60
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod commands;
mod output;

use commands::{analytical, compare, extract, info};

/// jurin - Post-processing for capillary-rise simulations.
///
/// Extract the meniscus rise from VTK output and compare it with Jurin's law.
#[derive(Parser)]
#[command(name = "jurin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format for results
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Suppress all non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Increase output verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for scripting
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the deltaH time series from a simulation output directory
    Extract {
        /// Directory holding the .pvd time index and .pvtu snapshots
        output_dir: PathBuf,

        /// TOML file with [physical] and [extraction] parameters
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Phase value separating the two fluids
        #[arg(long)]
        phase_limit: Option<f64>,

        /// Process snapshots in parallel
        #[arg(long)]
        parallel: bool,
    },

    /// Compute the analytical equilibrium deltaH (mm)
    Analytical {
        /// Contact angle in degrees (repeat for several angles)
        #[arg(long, short, required = true)]
        angle: Vec<f64>,

        /// TOML file with [physical] parameters
        #[arg(long, short)]
        config: Option<PathBuf>,
    },

    /// Compare the final deltaH of several runs with the analytical solution
    Compare {
        /// Output directories, one per contact angle
        #[arg(required = true)]
        output_dirs: Vec<PathBuf>,

        /// Contact angle of each run in degrees, in the same order
        #[arg(long, short, required = true)]
        angle: Vec<f64>,

        /// TOML file with [physical] and [extraction] parameters
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Phase value separating the two fluids
        #[arg(long)]
        phase_limit: Option<f64>,

        /// Process snapshots in parallel
        #[arg(long)]
        parallel: bool,
    },

    /// Display grid statistics of a snapshot
    Info {
        /// Snapshot file (.pvtu or .vtu) or time index (.pvd)
        input: PathBuf,
    },
}

/// Initialize the tracing subscriber based on verbosity level.
fn init_tracing(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    // RUST_LOG takes precedence over -v flags
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "warn",
            1 => "jurin_post=info",
            2 => "jurin_post=debug",
            _ => "trace",
        };
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    // Nicer panic reports in development builds
    #[cfg(debug_assertions)]
    miette::set_panic_hook();

    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Commands::Extract {
            output_dir,
            config,
            phase_limit,
            parallel,
        } => extract::run(output_dir, config.as_deref(), *phase_limit, *parallel, &cli),
        Commands::Analytical { angle, config } => analytical::run(angle, config.as_deref(), &cli),
        Commands::Compare {
            output_dirs,
            angle,
            config,
            phase_limit,
            parallel,
        } => compare::run(
            output_dirs,
            angle,
            config.as_deref(),
            *phase_limit,
            *parallel,
            &cli,
        ),
        Commands::Info { input } => info::run(input, &cli),
    };

    if let Err(e) = &result {
        if !cli.quiet {
            if let Some(jurin_err) = e.downcast_ref::<jurin_post::JurinError>() {
                eprintln!("{}: {}", "Error".red().bold(), jurin_err);
                eprintln!("  {}: {}", "Code".cyan(), jurin_err.code());
                eprintln!(
                    "  {}: {}",
                    "Suggestion".green(),
                    jurin_err.recovery_suggestion()
                );
                if let Some(location) = jurin_err.location() {
                    eprintln!("  {}: {}", "Location".yellow(), location);
                }
            } else {
                eprintln!("{}: {}", "Error".red().bold(), e);
                for cause in e.chain().skip(1) {
                    eprintln!("  {}: {}", "Caused by".yellow(), cause);
                }
            }
        }
        std::process::exit(1);
    }

    Ok(())
}
