//! Edge case tests for interface extraction robustness.
//!
//! Unusual grids and probe placements: other cell shapes, cell-centred
//! fields, lines leaving the mesh, degenerate inputs.

#[cfg(test)]
mod tests {
    use crate::height::{extract_from_grids, snapshot_heights};
    use crate::locate::CellLocator;
    use crate::params::{Axis, ExtractParams};
    use crate::probe::ProbeLine;
    use crate::{Cell, CellKind, Field, JurinError, UnstructuredGrid};
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    const NX: u32 = 4;
    const NY: u32 = 8;

    fn node(i: u32, j: u32) -> u32 {
        j * (NX + 1) + i
    }

    fn lattice_points() -> Vec<Point3<f64>> {
        let mut points = Vec::new();
        for j in 0..=NY {
            for i in 0..=NX {
                points.push(Point3::new(i as f64, j as f64, 0.0));
            }
        }
        points
    }

    /// Point phase: 0 up to `heights[x]`, 1 above.
    fn step_phase(points: &[Point3<f64>], heights: [f64; 5]) -> Field {
        Field::scalar(
            "phase_order",
            points
                .iter()
                .map(|p| if p.y <= heights[p.x as usize] { 0.0 } else { 1.0 })
                .collect(),
        )
    }

    fn quad_block(heights: [f64; 5]) -> UnstructuredGrid {
        let mut grid = UnstructuredGrid::new();
        grid.points = lattice_points();
        for j in 0..NY {
            for i in 0..NX {
                grid.cells.push(Cell::new(
                    CellKind::Quad,
                    vec![node(i, j), node(i + 1, j), node(i + 1, j + 1), node(i, j + 1)],
                ));
            }
        }
        grid.point_data.push(step_phase(&grid.points, heights));
        grid
    }

    // ==================== Cell Shapes ====================

    #[test]
    fn test_triangle_grid_matches_quads() {
        let heights = [1.0, 5.0, 3.0, 3.0, 3.0];
        let mut grid = UnstructuredGrid::new();
        grid.points = lattice_points();
        for j in 0..NY {
            for i in 0..NX {
                let (a, b, c, d) = (node(i, j), node(i + 1, j), node(i + 1, j + 1), node(i, j + 1));
                grid.cells.push(Cell::new(CellKind::Triangle, vec![a, b, c]));
                grid.cells.push(Cell::new(CellKind::Triangle, vec![a, c, d]));
            }
        }
        grid.point_data.push(step_phase(&grid.points, heights));

        let params = ExtractParams::default();
        let tri = snapshot_heights(&grid, &params, 0).unwrap();
        let quad = snapshot_heights(&quad_block(heights), &params, 0).unwrap();
        assert_relative_eq!(tri.meniscus, quad.meniscus, epsilon = 1e-9);
        assert_relative_eq!(tri.delta_h(), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_pixel_grid() {
        let heights = [1.0, 4.0, 2.0, 2.0, 2.0];
        let mut grid = UnstructuredGrid::new();
        grid.points = lattice_points();
        for j in 0..NY {
            for i in 0..NX {
                grid.cells.push(Cell::new(
                    CellKind::Pixel,
                    vec![node(i, j), node(i + 1, j), node(i, j + 1), node(i + 1, j + 1)],
                ));
            }
        }
        grid.point_data.push(step_phase(&grid.points, heights));

        let result = snapshot_heights(&grid, &ExtractParams::default(), 0).unwrap();
        assert_relative_eq!(result.meniscus, 4.496, epsilon = 1e-9);
        assert_relative_eq!(result.delta_h(), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_hexahedron_slab() {
        let heights = [0.0, 5.0, 2.0, 2.0, 0.0];
        let mut grid = UnstructuredGrid::new();
        let layer = (NX + 1) * (NY + 1);
        for z in [0.0, 1.0] {
            for p in lattice_points() {
                grid.points.push(Point3::new(p.x, p.y, z));
            }
        }
        for j in 0..NY {
            for i in 0..NX {
                let base = [node(i, j), node(i + 1, j), node(i + 1, j + 1), node(i, j + 1)];
                let mut ids = base.to_vec();
                ids.extend(base.iter().map(|&n| n + layer));
                grid.cells.push(Cell::new(CellKind::Hexahedron, ids));
            }
        }
        grid.point_data.push(step_phase(&grid.points, heights));

        let mut params = ExtractParams::default();
        params.meniscus = ProbeLine::new("meniscus", [1.0, 0.0, 0.5], [1.0, 8.0, 0.5]);
        params.side = vec![ProbeLine::new("side", [2.0, 0.0, 0.5], [2.0, 8.0, 0.5])];

        let result = snapshot_heights(&grid, &params, 0).unwrap();
        assert_relative_eq!(result.meniscus, 5.496, epsilon = 1e-9);
        assert_relative_eq!(result.side_mean, 2.496, epsilon = 1e-9);
    }

    #[test]
    fn test_non_probeable_cells_are_ignored() {
        let mut grid = quad_block([1.0, 3.0, 1.0, 1.0, 1.0]);
        grid.cells.insert(0, Cell::new(CellKind::Vertex, vec![node(1, 7)]));
        grid.cells.insert(1, Cell::new(CellKind::Line, vec![node(1, 0), node(1, 8)]));

        let result = snapshot_heights(&grid, &ExtractParams::default(), 0).unwrap();
        assert_relative_eq!(result.delta_h(), 2.0, epsilon = 1e-9);
    }

    // ==================== Field Placement ====================

    #[test]
    fn test_cell_data_phase() {
        let heights = [3.0, 3.0, 1.0, 1.0, 1.0];
        let mut grid = quad_block(heights);
        grid.point_data.clear();
        let phase = (0..NY)
            .flat_map(|j| (0..NX).map(move |i| (i, j)))
            .map(|(i, j)| if (j as f64) < heights[i as usize] { 0.0 } else { 1.0 })
            .collect();
        grid.cell_data.push(Field::scalar("phase_order", phase));

        let mut params = ExtractParams::default();
        params.meniscus = ProbeLine::new("meniscus", [0.5, 0.0, 0.0], [0.5, 8.0, 0.0]);
        params.side = vec![ProbeLine::new("side", [2.5, 0.0, 0.0], [2.5, 8.0, 0.0])];

        // Boundary samples take the value of the lower cell
        let result = snapshot_heights(&grid, &params, 0).unwrap();
        assert_relative_eq!(result.meniscus, 3.0, epsilon = 1e-9);
        assert_relative_eq!(result.side_mean, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_missing_field() {
        let mut params = ExtractParams::default();
        params.field = "alpha".into();
        let err = snapshot_heights(&quad_block([1.0; 5]), &params, 3).unwrap_err();
        assert!(matches!(
            err,
            JurinError::MissingField { ref field, snapshot: Some(3), path: None } if field == "alpha"
        ));
        assert_eq!(err.to_string(), "field 'alpha' not found in snapshot 3");
    }

    // ==================== Probe Placement ====================

    #[test]
    fn test_line_extending_past_mesh() {
        let grid = quad_block([1.0, 5.0, 2.0, 2.0, 2.0]);
        let mut params = ExtractParams::default();
        params.resolution = 2000;
        params.meniscus = ProbeLine::new("meniscus", [1.0, 0.0, 0.0], [1.0, 16.0, 0.0]);

        let result = snapshot_heights(&grid, &params, 0).unwrap();
        assert_relative_eq!(result.meniscus, 5.496, epsilon = 1e-9);
    }

    #[test]
    fn test_line_outside_mesh() {
        let grid = quad_block([1.0; 5]);
        let mut params = ExtractParams::default();
        params.side = vec![ProbeLine::new("far", [10.0, 0.0, 0.0], [10.0, 8.0, 0.0])];

        let err = snapshot_heights(&grid, &params, 3).unwrap_err();
        assert!(matches!(
            err,
            JurinError::EmptyPhaseRegion { snapshot: 3, ref line, .. } if line == "far"
        ));
    }

    #[test]
    fn test_downward_line() {
        let grid = quad_block([1.0, 5.0, 2.0, 2.0, 2.0]);
        let mut params = ExtractParams::default();
        params.meniscus = ProbeLine::new("meniscus", [1.0, 8.0, 0.0], [1.0, 0.0, 0.0]);

        let result = snapshot_heights(&grid, &params, 0).unwrap();
        assert_relative_eq!(result.meniscus, 5.496, epsilon = 1e-9);
    }

    #[test]
    fn test_z_vertical_axis() {
        let mut grid = quad_block([0.0, 5.0, 1.0, 1.0, 1.0]);
        for p in grid.points.iter_mut() {
            *p = Point3::new(p.x, 0.0, p.y);
        }
        let mut params = ExtractParams::default();
        params.vertical_axis = Axis::Z;
        params.meniscus = ProbeLine::new("meniscus", [1.0, 0.0, 0.0], [1.0, 0.0, 8.0]);
        params.side = vec![ProbeLine::new("side", [2.0, 0.0, 0.0], [2.0, 0.0, 8.0])];

        let result = snapshot_heights(&grid, &params, 0).unwrap();
        assert_relative_eq!(result.delta_h(), 4.0, epsilon = 1e-9);
    }

    // ==================== Degenerate Inputs ====================

    #[test]
    fn test_empty_grid() {
        let mut grid = UnstructuredGrid::new();
        grid.point_data.push(Field::scalar("phase_order", Vec::new()));
        assert_eq!(CellLocator::new(&grid).bin_count(), 0);

        let err = snapshot_heights(&grid, &ExtractParams::default(), 0).unwrap_err();
        assert!(matches!(err, JurinError::EmptyPhaseRegion { .. }));
    }

    #[test]
    fn test_empty_series() {
        let series = extract_from_grids(&[], &[], &ExtractParams::default()).unwrap();
        assert!(series.is_empty());
        assert!(series.last().is_none());
    }

    #[test]
    fn test_phase_limit_at_extremes() {
        let grid = quad_block([1.0, 5.0, 2.0, 2.0, 2.0]);

        // Nothing lies below a limit under the field range
        let err = snapshot_heights(&grid, &ExtractParams::with_phase_limit(-0.5), 0).unwrap_err();
        assert!(matches!(err, JurinError::EmptyPhaseRegion { .. }));

        // Everything is below a limit above the field range
        let result = snapshot_heights(&grid, &ExtractParams::with_phase_limit(1.5), 0).unwrap();
        assert_relative_eq!(result.meniscus, 8.0, epsilon = 1e-9);
        assert_relative_eq!(result.delta_h(), 0.0, epsilon = 1e-9);
    }
}
