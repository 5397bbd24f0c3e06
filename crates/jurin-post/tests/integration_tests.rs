//! End-to-end integration tests for jurin-post.
//!
//! These tests write synthetic simulation output (a `.pvd` time index, one
//! `.pvtu` header per snapshot and its `.vtu` pieces) to a temporary
//! directory and run the full discover -> load -> probe -> extract pipeline.

use approx::assert_relative_eq;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use flate2::Compression;
use flate2::write::ZlibEncoder;
use jurin_post::{
    ErrorCode, ExtractParams, JurinError, JurinParams, analytical_delta_h, discover,
    extract_delta_h, load_grid, read_pvd,
};
use std::fmt::Write as _;
use std::fs;
use std::io::Write as _;
use std::path::Path;
use tempfile::TempDir;

const NX: usize = 4;
const NY: usize = 8;

/// Write one `.vtu` piece covering rows `rows.0..rows.1` of a 4 x 8 quad block.
///
/// Point phase is 0 up to `heights[x]` and 1 above.
fn piece_xml(rows: (usize, usize), heights: [f64; 5]) -> String {
    let (j0, j1) = rows;
    let n_points = (NX + 1) * (j1 - j0 + 1);
    let n_cells = NX * (j1 - j0);

    let mut points = String::new();
    let mut phase = String::new();
    for j in j0..=j1 {
        for i in 0..=NX {
            write!(points, "{} {} 0 ", i, j).unwrap();
            let value = if j as f64 <= heights[i] { 0.0 } else { 1.0 };
            write!(phase, "{} ", value).unwrap();
        }
    }

    let mut connectivity = String::new();
    let mut offsets = String::new();
    let mut types = String::new();
    for (c, (j, i)) in (0..j1 - j0)
        .flat_map(|j| (0..NX).map(move |i| (j, i)))
        .enumerate()
    {
        let a = j * (NX + 1) + i;
        let b = a + NX + 1;
        write!(connectivity, "{} {} {} {} ", a, a + 1, b + 1, b).unwrap();
        write!(offsets, "{} ", 4 * (c + 1)).unwrap();
        types.push_str("9 ");
    }

    format!(
        r#"<?xml version="1.0"?>
<VTKFile type="UnstructuredGrid" version="0.1" byte_order="LittleEndian">
  <UnstructuredGrid>
    <Piece NumberOfPoints="{n_points}" NumberOfCells="{n_cells}">
      <PointData Scalars="phase_order">
        <DataArray type="Float64" Name="phase_order" format="ascii">{phase}</DataArray>
      </PointData>
      <Points>
        <DataArray type="Float64" NumberOfComponents="3" format="ascii">{points}</DataArray>
      </Points>
      <Cells>
        <DataArray type="Int32" Name="connectivity" format="ascii">{connectivity}</DataArray>
        <DataArray type="Int32" Name="offsets" format="ascii">{offsets}</DataArray>
        <DataArray type="UInt8" Name="types" format="ascii">{types}</DataArray>
      </Cells>
    </Piece>
  </UnstructuredGrid>
</VTKFile>
"#
    )
}

/// zlib-compress `bytes` into one inline binary data array with a UInt32
/// block header, as deal.II writes its output by default.
fn zlib_array(bytes: &[u8]) -> String {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).unwrap();
    let packed = encoder.finish().unwrap();
    let len = bytes.len() as u32;
    let header: Vec<u8> = [1, len, len, packed.len() as u32]
        .iter()
        .flat_map(|v| v.to_le_bytes())
        .collect();
    format!("{}{}", STANDARD.encode(header), STANDARD.encode(packed))
}

/// The same piece as [`piece_xml`], with compressed binary Float32/Int32 arrays.
fn binary_piece_xml(rows: (usize, usize), heights: [f64; 5]) -> String {
    let (j0, j1) = rows;
    let n_points = (NX + 1) * (j1 - j0 + 1);
    let n_cells = NX * (j1 - j0);

    let mut points = Vec::new();
    let mut phase = Vec::new();
    for j in j0..=j1 {
        for i in 0..=NX {
            for c in [i as f32, j as f32, 0.0] {
                points.extend_from_slice(&c.to_le_bytes());
            }
            let value: f32 = if j as f64 <= heights[i] { 0.0 } else { 1.0 };
            phase.extend_from_slice(&value.to_le_bytes());
        }
    }

    let mut connectivity = Vec::new();
    let mut offsets = Vec::new();
    for c in 0..n_cells {
        let (j, i) = (c / NX, c % NX);
        let a = (j * (NX + 1) + i) as i32;
        let b = a + NX as i32 + 1;
        for id in [a, a + 1, b + 1, b] {
            connectivity.extend_from_slice(&id.to_le_bytes());
        }
        offsets.extend_from_slice(&(4 * (c as i32 + 1)).to_le_bytes());
    }
    let types = vec![9u8; n_cells];

    let (phase, points) = (zlib_array(&phase), zlib_array(&points));
    let (connectivity, offsets, types) = (
        zlib_array(&connectivity),
        zlib_array(&offsets),
        zlib_array(&types),
    );

    format!(
        r#"<?xml version="1.0"?>
<VTKFile type="UnstructuredGrid" version="0.1" byte_order="LittleEndian" header_type="UInt32" compressor="vtkZLibDataCompressor">
  <UnstructuredGrid>
    <Piece NumberOfPoints="{n_points}" NumberOfCells="{n_cells}">
      <PointData Scalars="phase_order">
        <DataArray type="Float32" Name="phase_order" format="binary">{phase}</DataArray>
      </PointData>
      <Points>
        <DataArray type="Float32" NumberOfComponents="3" format="binary">{points}</DataArray>
      </Points>
      <Cells>
        <DataArray type="Int32" Name="connectivity" format="binary">{connectivity}</DataArray>
        <DataArray type="Int32" Name="offsets" format="binary">{offsets}</DataArray>
        <DataArray type="UInt8" Name="types" format="binary">{types}</DataArray>
      </Cells>
    </Piece>
  </UnstructuredGrid>
</VTKFile>
"#
    )
}

fn pvtu_xml(pieces: &[String]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0"?>
<VTKFile type="PUnstructuredGrid" version="0.1" byte_order="LittleEndian">
  <PUnstructuredGrid GhostLevel="0">
    <PPointData Scalars="phase_order">
      <PDataArray type="Float64" Name="phase_order"/>
    </PPointData>
    <PPoints>
      <PDataArray type="Float64" NumberOfComponents="3"/>
    </PPoints>
"#,
    );
    for piece in pieces {
        writeln!(xml, r#"    <Piece Source="{}"/>"#, piece).unwrap();
    }
    xml.push_str("  </PUnstructuredGrid>\n</VTKFile>\n");
    xml
}

fn pvd_xml(times: &[f64]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\"?>\n<VTKFile type=\"Collection\" version=\"0.1\">\n  <Collection>\n",
    );
    for (i, t) in times.iter().enumerate() {
        writeln!(
            xml,
            r#"    <DataSet timestep="{}" group="" part="0" file="jurin.{}.pvtu"/>"#,
            t, i
        )
        .unwrap();
    }
    xml.push_str("  </Collection>\n</VTKFile>\n");
    xml
}

/// Write a simulation run: one snapshot per entry, split into two pieces.
fn write_run(dir: &Path, snapshots: &[(f64, [f64; 5])]) {
    write_run_with(dir, snapshots, piece_xml);
}

fn write_run_with(
    dir: &Path,
    snapshots: &[(f64, [f64; 5])],
    piece: fn((usize, usize), [f64; 5]) -> String,
) {
    let times: Vec<f64> = snapshots.iter().map(|(t, _)| *t).collect();
    fs::write(dir.join("jurin.pvd"), pvd_xml(&times)).unwrap();

    let pieces_dir = dir.join("jurin");
    fs::create_dir_all(&pieces_dir).unwrap();

    for (index, (_, heights)) in snapshots.iter().enumerate() {
        let mut names = Vec::new();
        for (p, rows) in [(0, NY / 2), (NY / 2, NY)].into_iter().enumerate() {
            let name = format!("jurin_{}_{}.vtu", index, p);
            fs::write(pieces_dir.join(&name), piece(rows, *heights)).unwrap();
            names.push(format!("jurin/{}", name));
        }
        fs::write(dir.join(format!("jurin.{}.pvtu", index)), pvtu_xml(&names)).unwrap();
    }
}

fn rising_run(dir: &Path, count: usize) {
    let snapshots: Vec<(f64, [f64; 5])> = (0..count)
        .map(|k| (k as f64 * 0.25, [0.0, 1.0 + k as f64, 1.0, 1.0, 1.0]))
        .collect();
    write_run(dir, &snapshots);
}

// =============================================================================
// Full pipeline
// =============================================================================

#[test]
fn test_extract_rising_meniscus() {
    let dir = TempDir::new().unwrap();
    rising_run(dir.path(), 6);

    let series = extract_delta_h(dir.path(), &ExtractParams::default()).unwrap();

    assert_eq!(series.len(), 6);
    assert_eq!(series.times.len(), 6);
    assert_eq!(series.times, vec![0.0, 0.25, 0.5, 0.75, 1.0, 1.25]);
    for (k, dh) in series.delta_h.iter().enumerate() {
        assert!((dh - k as f64).abs() < 1e-9, "snapshot {}: {}", k, dh);
    }
    assert!(series.delta_h.windows(2).all(|w| w[1] >= w[0]));
}

#[test]
fn test_compressed_binary_pieces() {
    let snapshots: Vec<(f64, [f64; 5])> = (0..4)
        .map(|k| (k as f64 * 0.25, [0.0, 1.0 + k as f64, 1.0, 1.0, 1.0]))
        .collect();
    let ascii = TempDir::new().unwrap();
    let binary = TempDir::new().unwrap();
    write_run(ascii.path(), &snapshots);
    write_run_with(binary.path(), &snapshots, binary_piece_xml);

    let grid = load_grid(&binary.path().join("jurin.0.pvtu")).expect("should load");
    assert_eq!(grid.point_count(), 50);
    assert_eq!(grid.cell_count(), 32);

    let params = ExtractParams::default();
    let expected = extract_delta_h(ascii.path(), &params).unwrap();
    let series = extract_delta_h(binary.path(), &params).expect("should extract");
    assert_eq!(series, expected);
    assert_relative_eq!(series.delta_h[3], 3.0, epsilon = 1e-9);
}

#[test]
fn test_natural_order_beyond_ten_snapshots() {
    // Lexical order would put jurin.10 before jurin.2
    let snapshots: Vec<(f64, [f64; 5])> = (0..12)
        .map(|k| (k as f64, [0.0, (k % 7) as f64, 0.0, 0.0, 0.0]))
        .collect();
    let dir = TempDir::new().unwrap();
    write_run(dir.path(), &snapshots);

    let series = extract_delta_h(dir.path(), &ExtractParams::default()).unwrap();
    assert_eq!(series.len(), 12);
    for (k, dh) in series.delta_h.iter().enumerate() {
        assert!((dh - (k % 7) as f64).abs() < 1e-9, "snapshot {}: {}", k, dh);
    }
}

#[test]
fn test_parallel_matches_sequential() {
    let dir = TempDir::new().unwrap();
    rising_run(dir.path(), 5);

    let sequential = extract_delta_h(dir.path(), &ExtractParams::default()).unwrap();
    let params = ExtractParams {
        parallel: true,
        ..Default::default()
    };
    let parallel = extract_delta_h(dir.path(), &params).unwrap();

    assert_eq!(sequential, parallel);
}

#[test]
fn test_identical_snapshots() {
    let dir = TempDir::new().unwrap();
    let snapshots: Vec<(f64, [f64; 5])> = (0..4)
        .map(|k| (k as f64, [2.0, 6.0, 3.0, 3.0, 3.0]))
        .collect();
    write_run(dir.path(), &snapshots);

    let series = extract_delta_h(dir.path(), &ExtractParams::default()).unwrap();
    assert!(series.delta_h.iter().all(|&dh| dh == series.delta_h[0]));
    assert!((series.delta_h[0] - 3.0).abs() < 1e-9);
}

#[test]
fn test_two_side_lines_from_config() {
    let dir = TempDir::new().unwrap();
    write_run(dir.path(), &[(0.0, [0.0, 6.0, 2.0, 4.0, 0.0])]);

    let params = JurinParams::from_toml(
        r#"
        [[extraction.side]]
        name = "left"
        start = [2.0, 0.0, 0.0]
        end = [2.0, 8.0, 0.0]

        [[extraction.side]]
        name = "right"
        start = [3.0, 0.0, 0.0]
        end = [3.0, 8.0, 0.0]
        "#,
    )
    .unwrap();

    let series = extract_delta_h(dir.path(), &params.extraction).unwrap();
    // Sides at 2.496 and 4.496 average to 3.496; meniscus at 6.496
    assert!((series.side[0] - 3.496).abs() < 1e-9);
    assert!((series.delta_h[0] - 3.0).abs() < 1e-9);
}

#[test]
fn test_merged_pieces() {
    let dir = TempDir::new().unwrap();
    rising_run(dir.path(), 1);

    let grid = load_grid(&dir.path().join("jurin.0.pvtu")).unwrap();
    assert_eq!(grid.cell_count(), NX * NY);
    // The shared row is written by both pieces
    assert_eq!(grid.point_count(), 2 * (NX + 1) * (NY / 2 + 1));
    let (min, max) = grid.bounds().unwrap();
    assert_eq!((min.y, max.y), (0.0, NY as f64));

    let index = read_pvd(&dir.path().join("jurin.pvd")).unwrap();
    assert_eq!(index.steps.len(), 1);
}

// =============================================================================
// Failure modes
// =============================================================================

#[test]
fn test_empty_phase_region_names_snapshot() {
    let dir = TempDir::new().unwrap();
    // Snapshot 2 is dry on the meniscus line: nothing below the limit
    write_run(
        dir.path(),
        &[
            (0.0, [0.0, 2.0, 1.0, 1.0, 1.0]),
            (0.1, [0.0, 3.0, 1.0, 1.0, 1.0]),
            (0.2, [0.0, -1.0, 1.0, 1.0, 1.0]),
        ],
    );

    let err = extract_delta_h(dir.path(), &ExtractParams::default()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::EmptyPhaseRegion);
    match err {
        JurinError::EmptyPhaseRegion { snapshot, line, .. } => {
            assert_eq!(snapshot, 2);
            assert_eq!(line, "meniscus");
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_missing_field_names_file() {
    let dir = TempDir::new().unwrap();
    rising_run(dir.path(), 2);

    let params = ExtractParams {
        field: "alpha".into(),
        ..Default::default()
    };
    let err = extract_delta_h(dir.path(), &params).unwrap_err();
    assert_eq!(err.code(), ErrorCode::MissingField);
    assert!(err.to_string().contains("jurin.0.pvtu"));
}

#[test]
fn test_missing_piece() {
    let dir = TempDir::new().unwrap();
    rising_run(dir.path(), 2);
    fs::remove_file(dir.path().join("jurin").join("jurin_1_0.vtu")).unwrap();

    let err = extract_delta_h(dir.path(), &ExtractParams::default()).unwrap_err();
    assert!(matches!(err, JurinError::IoRead { .. }));
}

#[test]
fn test_snapshot_count_mismatch() {
    let dir = TempDir::new().unwrap();
    rising_run(dir.path(), 3);
    fs::write(dir.path().join("jurin.pvd"), pvd_xml(&[0.0, 0.1])).unwrap();

    let err = discover(dir.path()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::SnapshotCountMismatch);
}

#[test]
fn test_invalid_params_checked_before_io() {
    let params = ExtractParams {
        resolution: 0,
        ..Default::default()
    };
    let err = extract_delta_h(Path::new("/nonexistent/run"), &params).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidParameter);
}

#[test]
fn test_missing_directory() {
    let err = extract_delta_h(Path::new("/nonexistent/run"), &ExtractParams::default()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InputNotFound);
}

// =============================================================================
// Comparison with the analytical solution
// =============================================================================

#[test]
fn test_final_delta_h_and_reference() {
    let dir = TempDir::new().unwrap();
    write_run(dir.path(), &[(0.0, [0.0, 5.0, 1.0, 1.0, 1.0])]);

    let params = JurinParams::default();
    let series = extract_delta_h(dir.path(), &params.extraction).unwrap();
    let reference = analytical_delta_h(&params.physical, 0.0).unwrap();

    let (_, dh) = series.last().unwrap();
    assert!((dh - 4.0).abs() < 1e-9);
    assert!((reference - 14.163850967529509).abs() < 1e-9);
}
