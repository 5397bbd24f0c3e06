//! Post-processing for capillary-rise (Jurin's law) simulations.
//!
//! This crate reads the time series written by a two-phase flow solver,
//! locates the fluid interface along fixed probe lines, and compares the
//! resulting rise height with the analytical equilibrium value.
//!
//! # Features
//!
//! - **Snapshot I/O**: VTK XML `.pvd` time collections, `.pvtu` parallel grids and
//!   their `.vtu` pieces, decoded with vtkio (ASCII, binary, zlib-compressed)
//! - **Probing**: sample a scalar field along a line through an unstructured grid
//!   of triangles, quads, tetrahedra and hexahedra (pixels and voxels included)
//! - **Height extraction**: meniscus and side interface heights per snapshot and
//!   their difference `delta_h` over time, sequentially or with rayon
//! - **Reference value**: Jurin's law with the meniscus-volume correction
//!
//! # Units
//!
//! Heights are reported in the grid's coordinate units. The analytical value is
//! computed from SI inputs and reported in **millimetres**.
//!
//! # Quick Start
//!
//! ```no_run
//! use jurin_post::{JurinParams, analytical_delta_h, extract_delta_h};
//! use std::path::Path;
//!
//! let params = JurinParams::from_toml_file("jurin.toml").unwrap();
//!
//! let series = extract_delta_h(Path::new("output/contact_angle_30"), &params.extraction).unwrap();
//! let reference = analytical_delta_h(&params.physical, 30.0).unwrap();
//!
//! if let Some((t, dh)) = series.last() {
//!     println!("t = {t}: deltaH = {dh:.4}, analytical = {reference:.4} mm");
//! }
//! ```
//!
//! ## Single Snapshot
//!
//! ```no_run
//! use jurin_post::{ExtractParams, load_grid, snapshot_heights};
//! use std::path::Path;
//!
//! let grid = load_grid(Path::new("output/jurin.12.pvtu")).unwrap();
//! let heights = snapshot_heights(&grid, &ExtractParams::default(), 12).unwrap();
//! println!("meniscus {:.4}, side {:.4}", heights.meniscus, heights.side_mean);
//! ```
//!
//! # Logging
//!
//! The library logs through `tracing`; see [`tracing_ext`] for targets and
//! levels. Nothing is printed unless a subscriber is installed.

mod error;
pub mod tracing_ext;
mod types;

#[cfg(test)]
mod edge_cases;

pub mod analytical;
pub mod height;
pub mod io;
pub mod locate;
pub mod params;
pub mod probe;
pub mod series;

// Re-export core types at crate root
pub use error::{ErrorCode, ErrorLocation, JurinError, JurinResult, RecoverySuggestion};
pub use types::{Cell, CellKind, Field, FieldLocation, UnstructuredGrid};

pub use analytical::analytical_delta_h;
pub use height::{
    HeightSeries, SnapshotHeights, extract_delta_h, extract_from_grids, extract_series,
    interface_height, snapshot_heights,
};
pub use io::{TimeIndex, TimeStep, VtkFormat, load_grid, parse_vtu, read_pvd, read_pvtu_sources};
pub use locate::CellLocator;
pub use params::{Axis, ExtractParams, JurinParams, PhysicalParams};
pub use probe::{LineSample, ProbeLine, SamplePoint};
pub use series::{SnapshotSeries, discover, natural_cmp};
