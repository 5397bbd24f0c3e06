//! jurin analytical command - Jurin's law reference values.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use jurin_post::analytical_delta_h;
use serde::Serialize;

use crate::commands::load_params;
use crate::{Cli, OutputFormat, output};

#[derive(Serialize)]
struct AnalyticalResult {
    angle_degrees: f64,
    delta_h_mm: f64,
}

pub fn run(angles: &[f64], config: Option<&Path>, cli: &Cli) -> Result<()> {
    let params = load_params(config)?;

    let results = angles
        .iter()
        .map(|&angle| {
            analytical_delta_h(&params.physical, angle)
                .map(|delta_h_mm| AnalyticalResult {
                    angle_degrees: angle,
                    delta_h_mm,
                })
                .with_context(|| format!("No analytical solution at {} degrees", angle))
        })
        .collect::<Result<Vec<_>>>()?;

    match cli.format {
        OutputFormat::Json => {
            output::print(&results, cli.format, cli.quiet);
        }
        OutputFormat::Text => {
            if !cli.quiet {
                let p = &params.physical;
                println!("{}", "Analytical deltaH (Jurin's law)".bold().underline());
                println!(
                    "  {}: sigma = {} N/m, rho_l = {} kg/m³, g = {} m/s², r = {} m",
                    "Parameters".cyan(),
                    p.sigma,
                    p.rho_l,
                    p.g,
                    p.r
                );
                for result in &results {
                    println!(
                        "  {:>8.2}°  {:>12.6} mm",
                        result.angle_degrees, result.delta_h_mm
                    );
                }
            }
        }
    }

    Ok(())
}
