//! Core snapshot data types.

use nalgebra::Point3;

/// VTK cell kinds understood by the probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellKind {
    Vertex,
    Line,
    Triangle,
    Pixel,
    Quad,
    Tetra,
    Voxel,
    Hexahedron,
    /// Any other VTK cell type. Kept so cell data stays aligned, never probed.
    Other(u8),
}

impl CellKind {
    /// Map a VTK cell type id to a cell kind.
    pub fn from_vtk(id: u8) -> Self {
        match id {
            1 => CellKind::Vertex,
            3 => CellKind::Line,
            5 => CellKind::Triangle,
            8 => CellKind::Pixel,
            9 => CellKind::Quad,
            10 => CellKind::Tetra,
            11 => CellKind::Voxel,
            12 => CellKind::Hexahedron,
            other => CellKind::Other(other),
        }
    }

    /// The VTK cell type id.
    pub fn vtk_id(self) -> u8 {
        match self {
            CellKind::Vertex => 1,
            CellKind::Line => 3,
            CellKind::Triangle => 5,
            CellKind::Pixel => 8,
            CellKind::Quad => 9,
            CellKind::Tetra => 10,
            CellKind::Voxel => 11,
            CellKind::Hexahedron => 12,
            CellKind::Other(id) => id,
        }
    }

    /// Number of points a cell of this kind references, if fixed.
    pub fn point_count(self) -> Option<usize> {
        match self {
            CellKind::Vertex => Some(1),
            CellKind::Line => Some(2),
            CellKind::Triangle => Some(3),
            CellKind::Pixel | CellKind::Quad | CellKind::Tetra => Some(4),
            CellKind::Voxel | CellKind::Hexahedron => Some(8),
            CellKind::Other(_) => None,
        }
    }

    /// Whether the probe can locate points inside cells of this kind.
    ///
    /// Vertex and line cells have no area, so a probe point never lies
    /// inside one.
    pub fn is_probeable(self) -> bool {
        !matches!(
            self,
            CellKind::Vertex | CellKind::Line | CellKind::Other(_)
        )
    }
}

/// A single cell: its kind and the indices of its points.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub kind: CellKind,
    pub points: Vec<u32>,
}

impl Cell {
    /// Create a new cell.
    pub fn new(kind: CellKind, points: Vec<u32>) -> Self {
        Self { kind, points }
    }
}

/// A named data array attached to points or cells.
///
/// Values are stored flat, `components` values per tuple.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub components: usize,
    pub values: Vec<f64>,
}

impl Field {
    /// Create a scalar field.
    pub fn scalar(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            components: 1,
            values,
        }
    }

    /// Number of tuples in the field.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len() / self.components.max(1)
    }

    /// Whether the field has no tuples.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// First component of tuple `i`, or `None` past the end of the field.
    #[inline]
    pub fn scalar_at(&self, i: usize) -> Option<f64> {
        self.values.get(i * self.components).copied()
    }
}

/// Where a field lives on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldLocation {
    Point,
    Cell,
}

/// An unstructured grid snapshot: points, cells and the data attached to them.
///
/// Parallel output is merged into a single grid: piece point indices are
/// shifted so that every cell refers into the shared `points` array.
#[derive(Debug, Clone, Default)]
pub struct UnstructuredGrid {
    pub points: Vec<Point3<f64>>,
    pub cells: Vec<Cell>,
    pub point_data: Vec<Field>,
    pub cell_data: Vec<Field>,
}

impl UnstructuredGrid {
    /// Create an empty grid.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of points.
    #[inline]
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Get the number of cells.
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Compute the axis-aligned bounding box.
    ///
    /// Returns `None` if the grid has no points.
    pub fn bounds(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = self.points.first()?;
        let mut min = *first;
        let mut max = *first;

        for p in &self.points[1..] {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            min.z = min.z.min(p.z);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
            max.z = max.z.max(p.z);
        }

        Some((min, max))
    }

    /// Look up a field by name, preferring point data over cell data.
    pub fn field(&self, name: &str) -> Option<(&Field, FieldLocation)> {
        self.point_data
            .iter()
            .find(|f| f.name == name)
            .map(|f| (f, FieldLocation::Point))
            .or_else(|| {
                self.cell_data
                    .iter()
                    .find(|f| f.name == name)
                    .map(|f| (f, FieldLocation::Cell))
            })
    }

    /// Names of all point and cell fields.
    pub fn field_names(&self) -> Vec<&str> {
        self.point_data
            .iter()
            .chain(self.cell_data.iter())
            .map(|f| f.name.as_str())
            .collect()
    }

    /// Check that every cell and field fits the grid.
    ///
    /// Returns a description of the first inconsistency: a cell with the
    /// wrong number of points for its kind, a cell referencing a missing
    /// point, or a field whose length does not match its points or cells.
    pub fn check(&self) -> Result<(), String> {
        for (i, cell) in self.cells.iter().enumerate() {
            if let Some(expected) = cell.kind.point_count()
                && expected != cell.points.len()
            {
                return Err(format!(
                    "cell {} of type {} has {} points, expected {}",
                    i,
                    cell.kind.vtk_id(),
                    cell.points.len(),
                    expected
                ));
            }
            if let Some(&bad) = cell
                .points
                .iter()
                .find(|&&id| id as usize >= self.points.len())
            {
                return Err(format!(
                    "cell {} references point {}, but the grid only has {} points",
                    i,
                    bad,
                    self.points.len()
                ));
            }
        }

        for (fields, count, owner) in [
            (&self.point_data, self.points.len(), "point"),
            (&self.cell_data, self.cells.len(), "cell"),
        ] {
            for field in fields {
                if field.components == 0 || field.values.len() != count * field.components {
                    return Err(format!(
                        "{} field '{}' has {} values for {} {}s of {} components",
                        owner,
                        field.name,
                        field.values.len(),
                        count,
                        owner,
                        field.components
                    ));
                }
            }
        }

        Ok(())
    }

    /// Append another grid (a parallel piece) to this one.
    ///
    /// Fields are matched by name; a field present on only one side is
    /// dropped because it would no longer cover every point or cell.
    pub fn append(&mut self, other: UnstructuredGrid) {
        if self.points.is_empty() && self.cells.is_empty() {
            *self = other;
            return;
        }

        let offset = self.points.len() as u32;
        self.points.extend(other.points);
        self.cells.extend(other.cells.into_iter().map(|mut cell| {
            for idx in &mut cell.points {
                *idx += offset;
            }
            cell
        }));

        merge_fields(&mut self.point_data, other.point_data);
        merge_fields(&mut self.cell_data, other.cell_data);
    }
}

fn merge_fields(ours: &mut Vec<Field>, mut theirs: Vec<Field>) {
    ours.retain_mut(|field| {
        match theirs
            .iter()
            .position(|t| t.name == field.name && t.components == field.components)
        {
            Some(pos) => {
                let other = theirs.swap_remove(pos);
                field.values.extend(other.values);
                true
            }
            None => false,
        }
    });
}
