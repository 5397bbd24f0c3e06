//! jurin extract command - deltaH time series of one run.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use jurin_post::{HeightSeries, extract_delta_h};
use serde::Serialize;

use crate::commands::{apply_overrides, load_params};
use crate::{Cli, OutputFormat, output};

#[derive(Serialize)]
struct ExtractResult {
    output_dir: String,
    phase_limit: f64,
    field: String,
    snapshots: usize,
    #[serde(flatten)]
    series: HeightSeries,
}

pub fn run(
    output_dir: &Path,
    config: Option<&Path>,
    phase_limit: Option<f64>,
    parallel: bool,
    cli: &Cli,
) -> Result<()> {
    let mut params = load_params(config)?;
    apply_overrides(&mut params, phase_limit, parallel);

    output::info(
        &format!("Extracting interface heights from {}...", output_dir.display()),
        cli.format,
        cli.quiet,
    );

    let series = extract_delta_h(output_dir, &params.extraction)
        .with_context(|| format!("Failed to extract deltaH from {:?}", output_dir))?;

    let result = ExtractResult {
        output_dir: output_dir.display().to_string(),
        phase_limit: params.extraction.phase_limit,
        field: params.extraction.field.clone(),
        snapshots: series.len(),
        series,
    };

    match cli.format {
        OutputFormat::Json => {
            output::print(&result, cli.format, cli.quiet);
        }
        OutputFormat::Text => {
            if !cli.quiet {
                println!("{}", "Interface Heights".bold().underline());
                println!("  {}: {}", "Output".cyan(), result.output_dir);
                println!("  {}: {}", "Field".cyan(), result.field);
                println!("  {}: {}", "Phase limit".cyan(), result.phase_limit);
                println!("  {}: {}", "Snapshots".cyan(), result.snapshots);
                println!();
                println!(
                    "  {:>12}  {:>12}  {:>12}  {:>12}",
                    "time".bold(),
                    "meniscus".bold(),
                    "side".bold(),
                    "deltaH".bold()
                );
                let s = &result.series;
                for i in 0..s.len() {
                    println!(
                        "  {:>12.6}  {:>12.6}  {:>12.6}  {:>12.6}",
                        s.times[i], s.meniscus[i], s.side[i], s.delta_h[i]
                    );
                }
                if let Some((t, dh)) = s.last() {
                    println!();
                    output::success(
                        &format!("Final deltaH = {:.6} at t = {}", dh, t),
                        cli.format,
                        cli.quiet,
                    );
                }
            }
        }
    }

    Ok(())
}
