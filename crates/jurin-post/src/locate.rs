//! Point location in unstructured grids.
//!
//! [`CellLocator`] buckets cells into a uniform grid of bins keyed by integer
//! coordinates, so a query only tests the cells whose bounding boxes overlap
//! the query point's bin. Each candidate cell is then tested exactly by
//! inverting its interpolation map; the resulting parametric weights are used
//! to interpolate point data.

use hashbrown::HashMap;
use nalgebra::{Matrix2, Matrix3, Point3, Vector2, Vector3};

use crate::types::{CellKind, Field, FieldLocation, UnstructuredGrid};

/// Parametric slack when deciding whether a point lies inside a cell.
const PARAM_TOLERANCE: f64 = 1e-6;

/// Relative slack for off-plane distance of 2-D cells (fraction of cell size).
const PLANE_TOLERANCE: f64 = 1e-6;

/// Newton iterations for bilinear/trilinear inversion.
const MAX_NEWTON_ITERATIONS: usize = 20;

/// Pixel/voxel point order mapped onto quad/hexahedron order.
const PIXEL_TO_QUAD: [usize; 4] = [0, 1, 3, 2];
const VOXEL_TO_HEX: [usize; 8] = [0, 1, 3, 2, 4, 5, 7, 6];

/// The cell containing a point and the interpolation weight of each cell point.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub cell: usize,
    pub weights: Vec<f64>,
}

/// Spatial index for locating the cell that contains a point.
pub struct CellLocator<'a> {
    grid: &'a UnstructuredGrid,
    bins: HashMap<(i64, i64, i64), Vec<usize>>,
    bounds: Vec<Option<(Point3<f64>, Point3<f64>)>>,
    origin: Point3<f64>,
    step: f64,
}

impl<'a> CellLocator<'a> {
    /// Build a locator over every probeable cell of `grid`.
    pub fn new(grid: &'a UnstructuredGrid) -> Self {
        let bounds: Vec<Option<(Point3<f64>, Point3<f64>)>> = grid
            .cells
            .iter()
            .map(|cell| cell_bounds(grid, &cell.points))
            .collect();

        let origin = grid
            .bounds()
            .map(|(min, _)| min)
            .unwrap_or_else(Point3::origin);

        // Bin size follows the mean cell extent so each bin holds a handful of cells
        let (sum, count) = grid
            .cells
            .iter()
            .zip(bounds.iter())
            .filter(|(cell, _)| cell.kind.is_probeable())
            .filter_map(|(_, b)| b.map(|(min, max)| (max - min).amax()))
            .filter(|extent| *extent > 0.0)
            .fold((0.0, 0usize), |(s, n), e| (s + e, n + 1));
        let step = if count > 0 { sum / count as f64 } else { 1.0 };

        let mut locator = Self {
            grid,
            bins: HashMap::new(),
            bounds,
            origin,
            step,
        };

        for (index, cell) in grid.cells.iter().enumerate() {
            if !cell.kind.is_probeable() {
                continue;
            }
            // Cells pointing past the point array are never located
            let Some((min, max)) = locator.bounds[index] else {
                continue;
            };
            let pad = (max - min).amax() * PARAM_TOLERANCE;
            let lo = locator.bin_of(&(min - Vector3::repeat(pad)));
            let hi = locator.bin_of(&(max + Vector3::repeat(pad)));
            for i in lo.0..=hi.0 {
                for j in lo.1..=hi.1 {
                    for k in lo.2..=hi.2 {
                        locator.bins.entry((i, j, k)).or_default().push(index);
                    }
                }
            }
        }

        locator
    }

    /// Number of non-empty bins.
    pub fn bin_count(&self) -> usize {
        self.bins.len()
    }

    fn bin_of(&self, p: &Point3<f64>) -> (i64, i64, i64) {
        let d = (p - self.origin) / self.step;
        (
            d.x.floor() as i64,
            d.y.floor() as i64,
            d.z.floor() as i64,
        )
    }

    /// Find the first cell (lowest index) containing `p`.
    pub fn locate(&self, p: &Point3<f64>) -> Option<Location> {
        let candidates = self.bins.get(&self.bin_of(p))?;

        candidates.iter().find_map(|&index| {
            let (min, max) = self.bounds[index]?;
            let pad = (max - min).amax() * PARAM_TOLERANCE;
            if p.x < min.x - pad
                || p.y < min.y - pad
                || p.z < min.z - pad
                || p.x > max.x + pad
                || p.y > max.y + pad
                || p.z > max.z + pad
            {
                return None;
            }

            let cell = &self.grid.cells[index];
            let corners: Vec<Point3<f64>> = cell
                .points
                .iter()
                .map(|&i| self.grid.points.get(i as usize).copied())
                .collect::<Option<_>>()?;

            cell_weights(cell.kind, &corners, p).map(|weights| Location {
                cell: index,
                weights,
            })
        })
    }

    /// Interpolate the first component of `field` at `p`.
    ///
    /// Point fields are interpolated with the cell's weights; cell fields
    /// take the containing cell's value. Returns `None` outside the grid.
    pub fn interpolate(
        &self,
        field: &Field,
        location: FieldLocation,
        p: &Point3<f64>,
    ) -> Option<f64> {
        let found = self.locate(p)?;
        match location {
            FieldLocation::Cell => field.scalar_at(found.cell),
            FieldLocation::Point => {
                let cell = &self.grid.cells[found.cell];
                cell.points
                    .iter()
                    .zip(found.weights.iter())
                    .map(|(&i, w)| field.scalar_at(i as usize).map(|v| w * v))
                    .sum()
            }
        }
    }
}

fn cell_bounds(grid: &UnstructuredGrid, ids: &[u32]) -> Option<(Point3<f64>, Point3<f64>)> {
    let (first, rest) = ids.split_first()?;
    let first = *grid.points.get(*first as usize)?;
    rest.iter().try_fold((first, first), |(min, max), &i| {
        let p = grid.points.get(i as usize)?;
        Some((min.inf(p), max.sup(p)))
    })
}

/// Interpolation weights of `p` inside a cell, in the cell's point order.
///
/// Returns `None` when `p` lies outside the cell or `corners` does not hold
/// one point per corner of `kind`.
pub fn cell_weights(kind: CellKind, corners: &[Point3<f64>], p: &Point3<f64>) -> Option<Vec<f64>> {
    if kind.point_count() != Some(corners.len()) {
        return None;
    }
    match kind {
        CellKind::Triangle => triangle_weights(corners, p).map(|w| w.to_vec()),
        CellKind::Quad => quad_weights([corners[0], corners[1], corners[2], corners[3]], p)
            .map(|w| w.to_vec()),
        CellKind::Pixel => {
            let quad = PIXEL_TO_QUAD.map(|i| corners[i]);
            let w = quad_weights(quad, p)?;
            let mut out = vec![0.0; 4];
            for (q, &i) in PIXEL_TO_QUAD.iter().enumerate() {
                out[i] = w[q];
            }
            Some(out)
        }
        CellKind::Tetra => tetra_weights(corners, p).map(|w| w.to_vec()),
        CellKind::Hexahedron => {
            let hex: [Point3<f64>; 8] = std::array::from_fn(|i| corners[i]);
            hex_weights(&hex, p).map(|w| w.to_vec())
        }
        CellKind::Voxel => {
            let hex = VOXEL_TO_HEX.map(|i| corners[i]);
            let w = hex_weights(&hex, p)?;
            let mut out = vec![0.0; 8];
            for (h, &i) in VOXEL_TO_HEX.iter().enumerate() {
                out[i] = w[h];
            }
            Some(out)
        }
        CellKind::Vertex | CellKind::Line | CellKind::Other(_) => None,
    }
}

fn inside_unit(t: f64) -> bool {
    (-PARAM_TOLERANCE..=1.0 + PARAM_TOLERANCE).contains(&t)
}

fn triangle_weights(c: &[Point3<f64>], p: &Point3<f64>) -> Option<[f64; 3]> {
    let e0 = c[1] - c[0];
    let e1 = c[2] - c[0];
    let d = p - c[0];

    let n = e0.cross(&e1);
    let area2 = n.norm();
    if area2 == 0.0 {
        return None;
    }
    let size = e0.norm().max(e1.norm());
    if (d.dot(&n) / area2).abs() > PLANE_TOLERANCE * size {
        return None;
    }

    let d00 = e0.dot(&e0);
    let d01 = e0.dot(&e1);
    let d11 = e1.dot(&e1);
    let d20 = d.dot(&e0);
    let d21 = d.dot(&e1);
    let denom = d00 * d11 - d01 * d01;

    let v = (d11 * d20 - d01 * d21) / denom;
    let w = (d00 * d21 - d01 * d20) / denom;
    let u = 1.0 - v - w;

    (inside_unit(u) && inside_unit(v) && inside_unit(w)).then_some([u, v, w])
}

fn bilinear(r: f64, s: f64) -> [f64; 4] {
    [(1.0 - r) * (1.0 - s), r * (1.0 - s), r * s, (1.0 - r) * s]
}

/// Bilinear inverse by Gauss-Newton in the quad's own tangent frame.
fn quad_weights(c: [Point3<f64>; 4], p: &Point3<f64>) -> Option<[f64; 4]> {
    let size = (c[2] - c[0]).norm().max((c[3] - c[1]).norm());
    if size == 0.0 {
        return None;
    }

    let mut rs = Vector2::new(0.5, 0.5);
    for _ in 0..MAX_NEWTON_ITERATIONS {
        let (r, s) = (rs.x, rs.y);
        let w = bilinear(r, s);
        let x = c.iter()
            .zip(w.iter())
            .fold(Vector3::zeros(), |acc, (q, wi)| acc + q.coords * *wi);
        let dr = (c[1] - c[0]) * (1.0 - s) + (c[2] - c[3]) * s;
        let ds = (c[3] - c[0]) * (1.0 - r) + (c[2] - c[1]) * r;
        let residual = p.coords - x;

        let jtj = Matrix2::new(dr.dot(&dr), dr.dot(&ds), ds.dot(&dr), ds.dot(&ds));
        let jtr = Vector2::new(dr.dot(&residual), ds.dot(&residual));
        let delta = jtj.try_inverse()? * jtr;
        rs += delta;

        if delta.amax() < 1e-12 {
            break;
        }
    }

    let w = bilinear(rs.x, rs.y);
    let x = c.iter()
        .zip(w.iter())
        .fold(Vector3::zeros(), |acc, (q, wi)| acc + q.coords * *wi);
    if (p.coords - x).norm() > PLANE_TOLERANCE * size {
        return None;
    }

    (inside_unit(rs.x) && inside_unit(rs.y)).then_some(w)
}

fn tetra_weights(c: &[Point3<f64>], p: &Point3<f64>) -> Option<[f64; 4]> {
    let m = Matrix3::from_columns(&[c[1] - c[0], c[2] - c[0], c[3] - c[0]]);
    let b = m.try_inverse()? * (p - c[0]);
    let a = 1.0 - b.x - b.y - b.z;

    (inside_unit(a) && inside_unit(b.x) && inside_unit(b.y) && inside_unit(b.z))
        .then_some([a, b.x, b.y, b.z])
}

fn trilinear(r: f64, s: f64, t: f64) -> [f64; 8] {
    let (rm, sm, tm) = (1.0 - r, 1.0 - s, 1.0 - t);
    [
        rm * sm * tm,
        r * sm * tm,
        r * s * tm,
        rm * s * tm,
        rm * sm * t,
        r * sm * t,
        r * s * t,
        rm * s * t,
    ]
}

/// Trilinear inverse by Newton iteration, VTK hexahedron point order.
fn hex_weights(c: &[Point3<f64>; 8], p: &Point3<f64>) -> Option<[f64; 8]> {
    let mut rst = Vector3::new(0.5, 0.5, 0.5);

    for _ in 0..MAX_NEWTON_ITERATIONS {
        let (r, s, t) = (rst.x, rst.y, rst.z);
        let (rm, sm, tm) = (1.0 - r, 1.0 - s, 1.0 - t);
        let w = trilinear(r, s, t);
        let x = c.iter()
            .zip(w.iter())
            .fold(Vector3::zeros(), |acc, (q, wi)| acc + q.coords * *wi);

        // Derivatives of the shape functions with respect to r, s and t
        let dwr = [
            -sm * tm, sm * tm, s * tm, -s * tm, -sm * t, sm * t, s * t, -s * t,
        ];
        let dws = [
            -rm * tm, -r * tm, r * tm, rm * tm, -rm * t, -r * t, r * t, rm * t,
        ];
        let dwt = [
            -rm * sm, -r * sm, -r * s, -rm * s, rm * sm, r * sm, r * s, rm * s,
        ];
        let column = |dw: &[f64; 8]| {
            c.iter()
                .zip(dw.iter())
                .fold(Vector3::zeros(), |acc, (q, d)| acc + q.coords * *d)
        };
        let jac = Matrix3::from_columns(&[column(&dwr), column(&dws), column(&dwt)]);

        let delta = jac.try_inverse()? * (p.coords - x);
        rst += delta;

        if delta.amax() < 1e-12 {
            break;
        }
    }

    (inside_unit(rst.x) && inside_unit(rst.y) && inside_unit(rst.z))
        .then(|| trilinear(rst.x, rst.y, rst.z))
}
