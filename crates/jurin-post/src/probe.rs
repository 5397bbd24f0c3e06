//! Probe lines and field sampling along them.
//!
//! A probe line is a straight segment between two points. Sampling it at a
//! resolution of `n` yields `n + 1` equally spaced points including both
//! endpoints; each point carries the field value interpolated from the cell
//! that contains it, or no value when it lies outside the grid.
//!
//! # Example
//!
//! ```
//! use jurin_post::{Cell, CellKind, Field, ProbeLine, UnstructuredGrid};
//! use nalgebra::Point3;
//!
//! let mut grid = UnstructuredGrid::new();
//! grid.points = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! grid.cells.push(Cell::new(CellKind::Quad, vec![0, 1, 2, 3]));
//! grid.point_data.push(Field::scalar("phase_order", vec![0.0, 0.0, 1.0, 1.0]));
//!
//! let line = ProbeLine::new("meniscus", [0.5, 0.0, 0.0], [0.5, 1.0, 0.0]);
//! let sample = line.sample(&grid, "phase_order", 10).unwrap();
//! assert_eq!(sample.points.len(), 11);
//! ```

use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{JurinError, JurinResult};
use crate::locate::CellLocator;
use crate::types::UnstructuredGrid;

/// A named straight segment along which a field is sampled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeLine {
    /// Identifies the line in logs and errors.
    pub name: String,
    /// First endpoint.
    pub start: Point3<f64>,
    /// Second endpoint.
    pub end: Point3<f64>,
}

impl ProbeLine {
    /// Create a probe line from raw coordinates.
    pub fn new(name: impl Into<String>, start: [f64; 3], end: [f64; 3]) -> Self {
        Self {
            name: name.into(),
            start: Point3::from(start),
            end: Point3::from(end),
        }
    }

    /// Length of the segment.
    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }

    /// The `resolution + 1` equally spaced positions along the line.
    pub fn positions(&self, resolution: usize) -> Vec<Point3<f64>> {
        let n = resolution.max(1);
        let step = (self.end - self.start) / n as f64;
        (0..=n).map(|i| self.start + step * i as f64).collect()
    }

    /// Sample `field` along the line at `resolution` segments.
    pub fn sample(
        &self,
        grid: &UnstructuredGrid,
        field: &str,
        resolution: usize,
    ) -> JurinResult<LineSample> {
        let locator = CellLocator::new(grid);
        self.sample_with(grid, &locator, field, resolution)
    }

    /// Sample `field` along the line using a locator built once per grid.
    pub fn sample_with(
        &self,
        grid: &UnstructuredGrid,
        locator: &CellLocator<'_>,
        field: &str,
        resolution: usize,
    ) -> JurinResult<LineSample> {
        let (data, location) = grid
            .field(field)
            .ok_or_else(|| JurinError::missing_field(field))?;

        let points: Vec<SamplePoint> = self
            .positions(resolution)
            .into_iter()
            .map(|position| SamplePoint {
                value: locator.interpolate(data, location, &position),
                position,
            })
            .collect();

        trace!(
            line = self.name.as_str(),
            samples = points.len(),
            valid = points.iter().filter(|p| p.value.is_some()).count(),
            "Sampled probe line"
        );

        Ok(LineSample {
            line: self.name.clone(),
            points,
        })
    }
}

/// One sampled position on a probe line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplePoint {
    pub position: Point3<f64>,
    /// Interpolated value; `None` when the position lies outside the grid.
    pub value: Option<f64>,
}

/// The result of sampling one probe line.
#[derive(Debug, Clone, PartialEq)]
pub struct LineSample {
    pub line: String,
    pub points: Vec<SamplePoint>,
}

impl LineSample {
    /// Number of positions that fell inside the grid.
    pub fn valid_count(&self) -> usize {
        self.points.iter().filter(|p| p.value.is_some()).count()
    }

    /// Positions whose value lies strictly below `limit`.
    pub fn below(&self, limit: f64) -> impl Iterator<Item = &SamplePoint> {
        self.points
            .iter()
            .filter(move |p| p.value.is_some_and(|v| v < limit))
    }
}
