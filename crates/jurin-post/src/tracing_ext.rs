//! Tracing extensions for post-processing runs.
//!
//! Structured logging and timing for snapshot extraction, built on the
//! `tracing` ecosystem. Nothing is printed unless the application installs a
//! subscriber:
//!
//! ```rust,ignore
//! use tracing_subscriber::{fmt, prelude::*, EnvFilter};
//!
//! tracing_subscriber::registry()
//!     .with(fmt::layer())
//!     .with(EnvFilter::from_default_env())
//!     .init();
//!
//! // RUST_LOG=jurin_post=debug for per-snapshot output
//! ```
//!
//! # Log Levels
//!
//! - **INFO**: one line per run (discovery, totals, timing)
//! - **DEBUG**: one line per snapshot (heights, grid size)
//! - **TRACE**: per probe line detail

use std::time::Instant;
use tracing::{Span, debug, info, trace};

use crate::types::UnstructuredGrid;

/// A performance timer that logs duration on drop.
///
/// ```rust,ignore
/// let _timer = OperationTimer::new("extract_delta_h");
/// // ... do work ...
/// // duration logged here
/// ```
pub struct OperationTimer {
    name: &'static str,
    start: Instant,
    span: Span,
}

impl OperationTimer {
    /// Create a new operation timer.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!("jurin_operation", operation = name);
        debug!(target: "jurin_post::timing", operation = name, "Starting operation");
        Self {
            name,
            start: Instant::now(),
            span,
        }
    }

    /// Create a timer that also records how many snapshots it covers.
    pub fn with_snapshots(name: &'static str, snapshots: usize) -> Self {
        let span = tracing::info_span!("jurin_operation", operation = name, snapshots);
        debug!(
            target: "jurin_post::timing",
            operation = name,
            snapshots,
            "Starting operation"
        );
        Self {
            name,
            start: Instant::now(),
            span,
        }
    }

    /// Get the elapsed time.
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// Get the span for this timer.
    pub fn span(&self) -> &Span {
        &self.span
    }
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        info!(
            target: "jurin_post::timing",
            operation = self.name,
            elapsed_ms = format!("{:.2}", self.elapsed_ms()),
            "Operation completed"
        );
    }
}

/// Log grid statistics at debug level.
pub fn log_grid_stats(grid: &UnstructuredGrid, context: &str) {
    let (min, max) = grid.bounds().unwrap_or_default();
    let dims = max - min;

    debug!(
        target: "jurin_post::grid",
        context = context,
        points = grid.point_count(),
        cells = grid.cell_count(),
        fields = grid.field_names().join(","),
        dimensions = format!("{:.3} x {:.3} x {:.3}", dims.x, dims.y, dims.z),
        "Grid state"
    );
}

/// Log the heights found in one snapshot.
pub fn log_snapshot_heights(index: usize, meniscus: f64, side: f64, delta_h: f64) {
    debug!(
        target: "jurin_post::heights",
        snapshot = index,
        meniscus = format!("{:.6}", meniscus),
        side = format!("{:.6}", side),
        delta_h = format!("{:.6}", delta_h),
        "Snapshot heights"
    );
}

/// Log progress through a snapshot series.
pub fn log_progress(operation: &str, current: usize, total: usize) {
    let percent = if total > 0 {
        (current as f64 / total as f64 * 100.0) as u32
    } else {
        0
    };

    trace!(
        target: "jurin_post::progress",
        operation = operation,
        current = current,
        total = total,
        percent = percent,
        "Progress update"
    );
}
