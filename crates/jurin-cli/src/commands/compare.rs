//! jurin compare command - final deltaH of several runs against Jurin's law.
//!
//! Grid coordinates are taken to be millimetres, the unit of the analytical
//! value.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use colored::Colorize;
use jurin_post::{analytical_delta_h, extract_delta_h};
use serde::Serialize;

use crate::commands::{apply_overrides, load_params};
use crate::{Cli, OutputFormat, output};

#[derive(Serialize)]
struct RunComparison {
    output_dir: String,
    angle_degrees: f64,
    final_time: f64,
    simulated_mm: f64,
    analytical_mm: f64,
    /// |simulated - analytical| / |analytical|
    relative_error: f64,
}

pub fn run(
    output_dirs: &[PathBuf],
    angles: &[f64],
    config: Option<&Path>,
    phase_limit: Option<f64>,
    parallel: bool,
    cli: &Cli,
) -> Result<()> {
    if output_dirs.len() != angles.len() {
        bail!(
            "{} output directories but {} contact angles; give one --angle per directory",
            output_dirs.len(),
            angles.len()
        );
    }

    let mut params = load_params(config)?;
    apply_overrides(&mut params, phase_limit, parallel);

    let mut comparisons = Vec::with_capacity(output_dirs.len());
    for (dir, &angle) in output_dirs.iter().zip(angles) {
        output::info(
            &format!("Processing {} ({}°)...", dir.display(), angle),
            cli.format,
            cli.quiet,
        );

        let analytical_mm = analytical_delta_h(&params.physical, angle)
            .with_context(|| format!("No analytical solution at {} degrees", angle))?;
        let series = extract_delta_h(dir, &params.extraction)
            .with_context(|| format!("Failed to extract deltaH from {:?}", dir))?;
        let Some((final_time, simulated_mm)) = series.last() else {
            bail!("No snapshots in {:?}", dir);
        };

        comparisons.push(RunComparison {
            output_dir: dir.display().to_string(),
            angle_degrees: angle,
            final_time,
            simulated_mm,
            analytical_mm,
            relative_error: (simulated_mm - analytical_mm).abs() / analytical_mm.abs(),
        });
    }

    match cli.format {
        OutputFormat::Json => {
            output::print(&comparisons, cli.format, cli.quiet);
        }
        OutputFormat::Text => {
            if !cli.quiet {
                println!("{}", "Simulation vs. Jurin's law".bold().underline());
                println!(
                    "  {:>8}  {:>12}  {:>12}  {:>12}  {:>9}  {}",
                    "angle".bold(),
                    "t_final".bold(),
                    "simulated".bold(),
                    "analytical".bold(),
                    "error".bold(),
                    "run".bold()
                );
                for c in &comparisons {
                    let error = format!("{:>8.2}%", c.relative_error * 100.0);
                    let error = if c.relative_error <= 0.05 {
                        error.green()
                    } else {
                        error.yellow()
                    };
                    println!(
                        "  {:>7.2}°  {:>12.4}  {:>12.4}  {:>12.4}  {}  {}",
                        c.angle_degrees,
                        c.final_time,
                        c.simulated_mm,
                        c.analytical_mm,
                        error,
                        c.output_dir
                    );
                }
            }
        }
    }

    Ok(())
}
