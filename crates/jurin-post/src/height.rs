//! Interface-height extraction over a snapshot series.
//!
//! For every snapshot the phase field is sampled along the meniscus probe
//! line and along each side probe line. The interface height of a line is the
//! highest sample (along the vertical axis) whose phase value lies strictly
//! below the phase limit, i.e. the top of the fluid-1 column. Side heights are
//! averaged, and `delta_h = meniscus - side` is recorded per snapshot.
//!
//! # Example
//!
//! ```no_run
//! use jurin_post::{ExtractParams, extract_delta_h};
//! use std::path::Path;
//!
//! let series = extract_delta_h(Path::new("output"), &ExtractParams::with_phase_limit(0.5))?;
//! for (t, dh) in series.times.iter().zip(&series.delta_h) {
//!     println!("{t:.4} {dh:.6}");
//! }
//! # Ok::<(), jurin_post::JurinError>(())
//! ```

use std::path::Path;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{JurinError, JurinResult};
use crate::io::load_grid;
use crate::locate::CellLocator;
use crate::params::{Axis, ExtractParams};
use crate::probe::{LineSample, ProbeLine};
use crate::series::{SnapshotSeries, discover};
use crate::tracing_ext::{OperationTimer, log_grid_stats, log_progress, log_snapshot_heights};
use crate::types::UnstructuredGrid;

/// Interface heights found in a single snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotHeights {
    /// Height on the meniscus probe line.
    pub meniscus: f64,
    /// Height on each side probe line, in configuration order.
    pub side: Vec<f64>,
    /// Arithmetic mean of `side`.
    pub side_mean: f64,
}

impl SnapshotHeights {
    /// Height difference between the meniscus and the side reference.
    #[inline]
    pub fn delta_h(&self) -> f64 {
        self.meniscus - self.side_mean
    }
}

/// Heights of every snapshot of a run, index-aligned with the simulation times.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeightSeries {
    pub times: Vec<f64>,
    pub meniscus: Vec<f64>,
    pub side: Vec<f64>,
    pub delta_h: Vec<f64>,
}

impl HeightSeries {
    /// Number of snapshots in the series.
    #[inline]
    pub fn len(&self) -> usize {
        self.delta_h.len()
    }

    /// Whether the series is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.delta_h.is_empty()
    }

    /// The last recorded `(time, delta_h)` pair.
    pub fn last(&self) -> Option<(f64, f64)> {
        Some((*self.times.last()?, *self.delta_h.last()?))
    }
}

impl FromIterator<(f64, SnapshotHeights)> for HeightSeries {
    fn from_iter<I: IntoIterator<Item = (f64, SnapshotHeights)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(HeightSeries::default(), |mut series, (time, heights)| {
                series.times.push(time);
                series.meniscus.push(heights.meniscus);
                series.side.push(heights.side_mean);
                series.delta_h.push(heights.delta_h());
                series
            })
    }
}

/// Highest vertical coordinate among samples strictly below `phase_limit`.
///
/// Returns `None` when no sample qualifies. Samples outside the grid never
/// qualify.
pub fn interface_height(sample: &LineSample, phase_limit: f64, axis: Axis) -> Option<f64> {
    sample
        .below(phase_limit)
        .map(|p| axis.coord(&p.position))
        .fold(None, |best, h| match best {
            Some(b) if h <= b => Some(b),
            _ => Some(h),
        })
}

/// Extract the interface heights of one snapshot.
///
/// `index` is the snapshot's position in the series and is only used to
/// attribute errors. Grids whose cells or fields do not fit their points are
/// rejected with [`JurinError::InvalidGrid`].
pub fn snapshot_heights(
    grid: &UnstructuredGrid,
    params: &ExtractParams,
    index: usize,
) -> JurinResult<SnapshotHeights> {
    grid.check().map_err(|details| JurinError::InvalidGrid {
        snapshot: index,
        details,
    })?;
    let locator = CellLocator::new(grid);

    let line_height = |line: &ProbeLine| -> JurinResult<f64> {
        let sample = line
            .sample_with(grid, &locator, &params.field, params.resolution)
            .map_err(|e| e.at_snapshot(index))?;
        interface_height(&sample, params.phase_limit, params.vertical_axis).ok_or_else(|| {
            JurinError::empty_phase_region(index, line.name.as_str(), params.phase_limit)
        })
    };

    let meniscus = line_height(&params.meniscus)?;
    let side = params
        .side
        .iter()
        .map(&line_height)
        .collect::<JurinResult<Vec<f64>>>()?;
    if side.is_empty() {
        return Err(JurinError::invalid_parameter(
            "extraction.side",
            "at least one side probe line is required",
        ));
    }
    let side_mean = side.iter().sum::<f64>() / side.len() as f64;

    let heights = SnapshotHeights {
        meniscus,
        side,
        side_mean,
    };
    log_snapshot_heights(index, heights.meniscus, heights.side_mean, heights.delta_h());
    Ok(heights)
}

/// Extract heights from grids already held in memory.
///
/// `grids[i]` is the snapshot written at `times[i]`.
pub fn extract_from_grids(
    times: &[f64],
    grids: &[UnstructuredGrid],
    params: &ExtractParams,
) -> JurinResult<HeightSeries> {
    params.validate()?;
    if times.len() != grids.len() {
        return Err(JurinError::SnapshotCountMismatch {
            snapshots: grids.len(),
            times: times.len(),
        });
    }

    let heights = collect_ordered(grids, params.parallel, |index, grid| {
        snapshot_heights(grid, params, index)
    })?;

    Ok(times.iter().copied().zip(heights).collect())
}

/// Extract heights from every snapshot of a discovered series.
pub fn extract_series(series: &SnapshotSeries, params: &ExtractParams) -> JurinResult<HeightSeries> {
    params.validate()?;
    let _timer = OperationTimer::with_snapshots("extract_series", series.len());

    let total = series.len();
    let heights = collect_ordered(&series.snapshots, params.parallel, |index, path| {
        let grid = load_grid(path)?;
        log_grid_stats(&grid, "snapshot");
        let heights = snapshot_heights(&grid, params, index).map_err(|e| e.in_file(path))?;
        log_progress("extract_series", index + 1, total);
        Ok(heights)
    })?;

    let result: HeightSeries = series.times.iter().copied().zip(heights).collect();

    if let Some((t, dh)) = result.last() {
        info!(
            "Extracted {} snapshots, final deltaH = {:.6} at t = {}",
            result.len(),
            dh,
            t
        );
    }

    Ok(result)
}

/// Discover the snapshots in `output_path` and extract the `delta_h` series.
pub fn extract_delta_h(output_path: &Path, params: &ExtractParams) -> JurinResult<HeightSeries> {
    params.validate()?;
    debug!(
        "Extracting '{}' from {:?} (phase limit {}, {} side lines, parallel: {})",
        params.field,
        output_path,
        params.phase_limit,
        params.side.len(),
        params.parallel
    );
    let series = discover(output_path)?;
    extract_series(&series, params)
}

/// Map `f` over `items` keeping input order.
///
/// Sequential runs stop at the first error. Parallel runs evaluate every item
/// and then report the error of the lowest index, so both modes fail the same
/// way.
fn collect_ordered<T, R, F>(items: &[T], parallel: bool, f: F) -> JurinResult<Vec<R>>
where
    T: Sync,
    R: Send,
    F: Fn(usize, &T) -> JurinResult<R> + Sync,
{
    if parallel {
        let results: Vec<JurinResult<R>> = items
            .par_iter()
            .enumerate()
            .map(|(index, item)| f(index, item))
            .collect();
        results.into_iter().collect()
    } else {
        items
            .iter()
            .enumerate()
            .map(|(index, item)| f(index, item))
            .collect()
    }
}
