//! VTK XML file I/O: `.pvd` time collections, `.pvtu` parallel headers and
//! `.vtu` unstructured grid pieces.
//!
//! The time collection and the piece list are small XML documents read with
//! `quick_xml`. Pieces are decoded with `vtkio`, which handles every data
//! array encoding the solver writes (ASCII, base64 binary with or without
//! zlib compression, appended).

use std::fs;
use std::path::{Path, PathBuf};

use nalgebra::Point3;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::{debug, info, trace};
use vtkio::Vtk;
use vtkio::model::{
    Attribute, Cells, DataArray, DataSet, IOBuffer, Piece, UnstructuredGridPiece, VertexNumbers,
};

use crate::error::{JurinError, JurinResult};
use crate::types::{Cell, CellKind, Field, UnstructuredGrid};

/// Supported VTK XML file kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VtkFormat {
    /// Serial unstructured grid.
    Vtu,
    /// Parallel unstructured grid header referencing `.vtu` pieces.
    Pvtu,
    /// ParaView data collection (time index).
    Pvd,
}

impl VtkFormat {
    /// Detect format from file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .and_then(|ext| match ext.as_str() {
                "vtu" => Some(VtkFormat::Vtu),
                "pvtu" => Some(VtkFormat::Pvtu),
                "pvd" => Some(VtkFormat::Pvd),
                _ => None,
            })
    }
}

/// One `DataSet` entry of a `.pvd` collection.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeStep {
    pub time: f64,
    pub part: u32,
    pub file: PathBuf,
}

/// The contents of a `.pvd` collection, in file order.
#[derive(Debug, Clone, Default)]
pub struct TimeIndex {
    pub steps: Vec<TimeStep>,
}

impl TimeIndex {
    /// Distinct time values in ascending order.
    ///
    /// Collections that list several parts per time yield each time once.
    pub fn time_values(&self) -> Vec<f64> {
        let mut times: Vec<f64> = self.steps.iter().map(|s| s.time).collect();
        times.sort_by(f64::total_cmp);
        times.dedup();
        times
    }
}

/// Load an unstructured grid from a `.vtu` or `.pvtu` file.
///
/// Pieces of a `.pvtu` file are resolved relative to its directory and merged
/// into a single grid.
pub fn load_grid(path: &Path) -> JurinResult<UnstructuredGrid> {
    let grid = match VtkFormat::from_path(path) {
        Some(VtkFormat::Vtu) => load_vtu(path)?,
        Some(VtkFormat::Pvtu) => load_pvtu(path)?,
        _ => {
            return Err(JurinError::parse_error(
                path,
                "expected a .vtu or .pvtu file",
            ));
        }
    };

    debug!(
        "Loaded grid from {:?}: {} points, {} cells",
        path,
        grid.point_count(),
        grid.cell_count()
    );

    Ok(grid)
}

/// Read a `.pvd` time collection.
pub fn read_pvd(path: &Path) -> JurinResult<TimeIndex> {
    let xml = read_to_string(path)?;
    let mut reader = Reader::from_str(&xml);
    reader.config_mut().trim_text(true);

    let mut index = TimeIndex::default();
    let mut seen_root = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                match e.local_name().as_ref() {
                    b"VTKFile" => {
                        expect_file_type(e, "Collection", path)?;
                        seen_root = true;
                    }
                    b"DataSet" => {
                        let time = attr(e, b"timestep")
                            .map(|v| parse_number::<f64>(&v, path))
                            .transpose()?
                            .unwrap_or(0.0);
                        let part = attr(e, b"part")
                            .map(|v| parse_number::<u32>(&v, path))
                            .transpose()?
                            .unwrap_or(0);
                        let file = attr(e, b"file").ok_or_else(|| {
                            JurinError::parse_error(path, "DataSet without a file attribute")
                        })?;
                        index.steps.push(TimeStep {
                            time,
                            part,
                            file: PathBuf::from(file),
                        });
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(JurinError::parse_error(
                    path,
                    format!("XML parse error: {}", e),
                ));
            }
            _ => {}
        }
    }

    if !seen_root {
        return Err(JurinError::parse_error(path, "missing VTKFile element"));
    }

    info!(
        "Read time index {:?}: {} datasets, {} distinct times",
        path,
        index.steps.len(),
        index.time_values().len()
    );

    Ok(index)
}

/// Read the piece file names listed by a `.pvtu` header.
pub fn read_pvtu_sources(path: &Path) -> JurinResult<Vec<PathBuf>> {
    let xml = read_to_string(path)?;
    let mut reader = Reader::from_str(&xml);
    reader.config_mut().trim_text(true);

    let mut sources = Vec::new();
    let mut seen_root = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"VTKFile" => {
                    expect_file_type(e, "PUnstructuredGrid", path)?;
                    seen_root = true;
                }
                b"Piece" => {
                    let source = attr(e, b"Source").ok_or_else(|| {
                        JurinError::parse_error(path, "Piece without a Source attribute")
                    })?;
                    sources.push(PathBuf::from(source));
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(JurinError::parse_error(
                    path,
                    format!("XML parse error: {}", e),
                ));
            }
            _ => {}
        }
    }

    if !seen_root {
        return Err(JurinError::parse_error(path, "missing VTKFile element"));
    }
    if sources.is_empty() {
        return Err(JurinError::parse_error(path, "no Piece entries"));
    }

    Ok(sources)
}

fn load_pvtu(path: &Path) -> JurinResult<UnstructuredGrid> {
    let sources = read_pvtu_sources(path)?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));

    let mut grid = UnstructuredGrid::new();
    for source in sources {
        let piece_path = base.join(&source);
        trace!("Loading piece {:?}", piece_path);
        grid.append(load_vtu(&piece_path)?);
    }

    Ok(grid)
}

fn load_vtu(path: &Path) -> JurinResult<UnstructuredGrid> {
    let bytes = fs::read(path).map_err(|e| JurinError::io_read(path, e))?;
    parse_vtu(bytes, path)
}

/// Parse the contents of a `.vtu` file.
///
/// ASCII, base64 `binary` (optionally zlib-compressed) and appended data
/// arrays are all accepted. `path` is only used for error reporting.
pub fn parse_vtu(data: impl AsRef<[u8]>, path: &Path) -> JurinResult<UnstructuredGrid> {
    let vtk = Vtk::parse_xml(data.as_ref())
        .map_err(|e| JurinError::parse_error(path, format!("VTK XML error: {}", e)))?;

    let DataSet::UnstructuredGrid { pieces, .. } = vtk.data else {
        return Err(JurinError::parse_error(
            path,
            "VTKFile does not hold an UnstructuredGrid",
        ));
    };

    let mut grid = UnstructuredGrid::new();
    for (index, piece) in pieces.into_iter().enumerate() {
        let Piece::Inline(piece) = piece else {
            return Err(JurinError::parse_error(
                path,
                format!("piece {} is not stored inline", index),
            ));
        };
        grid.append(grid_from_piece(*piece, path)?);
    }

    Ok(grid)
}

fn grid_from_piece(piece: UnstructuredGridPiece, path: &Path) -> JurinResult<UnstructuredGrid> {
    let UnstructuredGridPiece {
        points,
        cells,
        data,
    } = piece;

    let coords = buffer_values(&points, "Points", path)?;
    if coords.len() % 3 != 0 {
        return Err(JurinError::parse_error(
            path,
            format!("{} point coordinates is not a multiple of 3", coords.len()),
        ));
    }
    let points: Vec<Point3<f64>> = coords
        .chunks_exact(3)
        .map(|c| Point3::new(c[0], c[1], c[2]))
        .collect();

    let Cells { cell_verts, types } = cells;
    let VertexNumbers::XML {
        connectivity,
        offsets,
    } = cell_verts
    else {
        return Err(JurinError::parse_error(
            path,
            "cells are not stored as connectivity and offsets",
        ));
    };
    if offsets.len() != types.len() {
        return Err(JurinError::parse_error(
            path,
            format!(
                "{} cell offsets but {} cell types",
                offsets.len(),
                types.len()
            ),
        ));
    }

    let mut grid_cells = Vec::with_capacity(types.len());
    let mut start = 0usize;
    for (i, (end, ty)) in offsets.into_iter().zip(types).enumerate() {
        let end = end as usize;
        if end < start || end > connectivity.len() {
            return Err(JurinError::parse_error(
                path,
                format!("cell {} has offset {} outside connectivity", i, end),
            ));
        }
        let ids = connectivity[start..end]
            .iter()
            .map(|&id| u32::try_from(id))
            .collect::<Result<Vec<u32>, _>>()
            .map_err(|_| {
                JurinError::parse_error(
                    path,
                    format!("cell {} has an out-of-range point index", i),
                )
            })?;
        grid_cells.push(Cell::new(CellKind::from_vtk(ty as u8), ids));
        start = end;
    }

    let point_data = fields_from(data.point, points.len(), path)?;
    let cell_data = fields_from(data.cell, grid_cells.len(), path)?;
    let grid = UnstructuredGrid {
        points,
        cells: grid_cells,
        point_data,
        cell_data,
    };
    grid.check().map_err(|details| JurinError::parse_error(path, details))?;

    Ok(grid)
}

/// Convert the data arrays of one attribute section to fields of `tuples`
/// tuples each.
fn fields_from(attributes: Vec<Attribute>, tuples: usize, path: &Path) -> JurinResult<Vec<Field>> {
    let mut fields = Vec::with_capacity(attributes.len());
    for attribute in attributes {
        // Field data blocks are not tied to points or cells
        let Attribute::DataArray(DataArray { name, data, .. }) = attribute else {
            continue;
        };
        let values = buffer_values(&data, &name, path)?;
        let components = if tuples == 0 { 1 } else { values.len() / tuples };
        if components == 0 || values.len() != components * tuples {
            return Err(JurinError::parse_error(
                path,
                format!(
                    "field '{}' has {} values for {} tuples",
                    name,
                    values.len(),
                    tuples
                ),
            ));
        }
        fields.push(Field {
            name,
            components,
            values,
        });
    }
    Ok(fields)
}

fn buffer_values(buffer: &IOBuffer, name: &str, path: &Path) -> JurinResult<Vec<f64>> {
    buffer.clone().cast_into::<f64>().ok_or_else(|| {
        JurinError::parse_error(
            path,
            format!("array '{}' cannot be converted to floating point", name),
        )
    })
}

fn read_to_string(path: &Path) -> JurinResult<String> {
    fs::read_to_string(path).map_err(|e| JurinError::io_read(path, e))
}

fn expect_file_type(e: &BytesStart, expected: &str, path: &Path) -> JurinResult<()> {
    match attr(e, b"type") {
        Some(ty) if ty == expected => Ok(()),
        Some(ty) => Err(JurinError::parse_error(
            path,
            format!("VTKFile type is '{}', expected '{}'", ty, expected),
        )),
        None => Err(JurinError::parse_error(path, "VTKFile without a type attribute")),
    }
}

fn attr(e: &BytesStart, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == name)
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

fn parse_number<T: std::str::FromStr>(value: &str, path: &Path) -> JurinResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| JurinError::parse_error(path, format!("invalid number '{}'", value)))
}
