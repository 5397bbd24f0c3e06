//! jurin info command - display snapshot or time index statistics.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use jurin_post::{FieldLocation, UnstructuredGrid, VtkFormat, load_grid, read_pvd};
use serde::Serialize;

use crate::{Cli, OutputFormat, output};

#[derive(Serialize)]
struct GridInfo {
    path: String,
    points: usize,
    cells: usize,
    cell_kinds: BTreeMap<String, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bounds: Option<BoundsInfo>,
    fields: Vec<FieldInfo>,
}

#[derive(Serialize)]
struct BoundsInfo {
    min: [f64; 3],
    max: [f64; 3],
    dimensions: [f64; 3],
}

#[derive(Serialize)]
struct FieldInfo {
    name: String,
    location: &'static str,
    components: usize,
    min: f64,
    max: f64,
}

#[derive(Serialize)]
struct TimeIndexInfo {
    path: String,
    datasets: usize,
    times: Vec<f64>,
}

pub fn run(input: &Path, cli: &Cli) -> Result<()> {
    if VtkFormat::from_path(input) == Some(VtkFormat::Pvd) {
        return time_index_info(input, cli);
    }

    let grid =
        load_grid(input).with_context(|| format!("Failed to load snapshot from {:?}", input))?;
    let info = grid_info(input, &grid);

    match cli.format {
        OutputFormat::Json => {
            output::print(&info, cli.format, cli.quiet);
        }
        OutputFormat::Text => {
            if !cli.quiet {
                println!("{}", "Snapshot Information".bold().underline());
                println!("  {}: {}", "File".cyan(), info.path);
                println!("  {}: {}", "Points".cyan(), info.points);
                println!("  {}: {}", "Cells".cyan(), info.cells);
                for (kind, count) in &info.cell_kinds {
                    println!("    {}: {}", kind, count);
                }

                if let Some(ref b) = info.bounds {
                    println!(
                        "  {}: {:.4} x {:.4} x {:.4}",
                        "Dimensions".cyan(),
                        b.dimensions[0],
                        b.dimensions[1],
                        b.dimensions[2]
                    );
                    println!(
                        "  {}: ({:.4}, {:.4}, {:.4})",
                        "Min bounds".cyan(),
                        b.min[0],
                        b.min[1],
                        b.min[2]
                    );
                    println!(
                        "  {}: ({:.4}, {:.4}, {:.4})",
                        "Max bounds".cyan(),
                        b.max[0],
                        b.max[1],
                        b.max[2]
                    );
                }

                if !info.fields.is_empty() {
                    println!("  {}:", "Fields".cyan());
                    for f in &info.fields {
                        println!(
                            "    {} ({}, {} comp.): [{:.4}, {:.4}]",
                            f.name, f.location, f.components, f.min, f.max
                        );
                    }
                }
            }
        }
    }

    Ok(())
}

fn grid_info(input: &Path, grid: &UnstructuredGrid) -> GridInfo {
    let mut cell_kinds = BTreeMap::new();
    for cell in &grid.cells {
        *cell_kinds.entry(format!("{:?}", cell.kind)).or_insert(0) += 1;
    }

    let bounds = grid.bounds().map(|(min, max)| {
        let dims = max - min;
        BoundsInfo {
            min: [min.x, min.y, min.z],
            max: [max.x, max.y, max.z],
            dimensions: [dims.x, dims.y, dims.z],
        }
    });

    let fields = grid
        .point_data
        .iter()
        .map(|f| (f, FieldLocation::Point))
        .chain(grid.cell_data.iter().map(|f| (f, FieldLocation::Cell)))
        .map(|(field, location)| {
            let (min, max) = field
                .values
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                    (lo.min(v), hi.max(v))
                });
            FieldInfo {
                name: field.name.clone(),
                location: match location {
                    FieldLocation::Point => "point",
                    FieldLocation::Cell => "cell",
                },
                components: field.components,
                min,
                max,
            }
        })
        .collect();

    GridInfo {
        path: input.display().to_string(),
        points: grid.point_count(),
        cells: grid.cell_count(),
        cell_kinds,
        bounds,
        fields,
    }
}

fn time_index_info(input: &Path, cli: &Cli) -> Result<()> {
    let index =
        read_pvd(input).with_context(|| format!("Failed to read time index {:?}", input))?;
    let info = TimeIndexInfo {
        path: input.display().to_string(),
        datasets: index.steps.len(),
        times: index.time_values(),
    };

    match cli.format {
        OutputFormat::Json => {
            output::print(&info, cli.format, cli.quiet);
        }
        OutputFormat::Text => {
            if !cli.quiet {
                println!("{}", "Time Index".bold().underline());
                println!("  {}: {}", "File".cyan(), info.path);
                println!("  {}: {}", "Datasets".cyan(), info.datasets);
                println!("  {}: {}", "Distinct times".cyan(), info.times.len());
                if let (Some(first), Some(last)) = (info.times.first(), info.times.last()) {
                    println!("  {}: {} .. {}", "Range".cyan(), first, last);
                }
            }
        }
    }

    Ok(())
}
