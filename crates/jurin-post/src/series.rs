//! Discovery of a simulation output directory.
//!
//! An output directory holds one `.pvd` time index and the `.pvtu` snapshot
//! headers written at each output time. Snapshots are ordered by a natural
//! sort of their file names, so `out.10.pvtu` follows `out.9.pvtu`.

use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{JurinError, JurinResult};
use crate::io::read_pvd;

/// The snapshot files of one simulation run, aligned with their times.
#[derive(Debug, Clone)]
pub struct SnapshotSeries {
    /// The output directory.
    pub directory: PathBuf,
    /// Path of the `.pvd` time index.
    pub time_index: PathBuf,
    /// Simulation times, ascending.
    pub times: Vec<f64>,
    /// Snapshot headers, naturally sorted; `snapshots[i]` was written at `times[i]`.
    pub snapshots: Vec<PathBuf>,
}

impl SnapshotSeries {
    /// Number of snapshots in the series.
    #[inline]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Whether the series has no snapshots.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Iterate over `(time, snapshot path)` pairs in time order.
    pub fn iter(&self) -> impl Iterator<Item = (f64, &Path)> {
        self.times
            .iter()
            .copied()
            .zip(self.snapshots.iter().map(PathBuf::as_path))
    }
}

/// Locate the time index and the snapshot files of an output directory.
pub fn discover(output_path: &Path) -> JurinResult<SnapshotSeries> {
    if !output_path.is_dir() {
        return Err(JurinError::input_not_found(output_path, "output directory"));
    }

    let entries = fs::read_dir(output_path).map_err(|e| JurinError::io_read(output_path, e))?;

    let mut pvd_files = Vec::new();
    let mut snapshot_names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| JurinError::io_read(output_path, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(".pvd") {
            pvd_files.push(entry.path());
        } else if name.contains("pvtu") {
            snapshot_names.push(name);
        }
    }

    let time_index = match pvd_files.len() {
        0 => {
            return Err(JurinError::input_not_found(output_path, "time index (.pvd)"));
        }
        1 => pvd_files.remove(0),
        count => {
            return Err(JurinError::AmbiguousTimeIndex {
                path: output_path.to_path_buf(),
                count,
            });
        }
    };

    if snapshot_names.is_empty() {
        return Err(JurinError::input_not_found(
            output_path,
            "snapshot files (*.pvtu)",
        ));
    }

    snapshot_names.sort_by(|a, b| natural_cmp(a, b));
    snapshot_names.dedup();
    let snapshots: Vec<PathBuf> = snapshot_names
        .iter()
        .map(|name| output_path.join(name))
        .collect();

    let times = read_pvd(&time_index)?.time_values();
    if times.len() != snapshots.len() {
        return Err(JurinError::SnapshotCountMismatch {
            snapshots: snapshots.len(),
            times: times.len(),
        });
    }

    info!(
        "Discovered {} snapshots in {:?} (t = {} .. {})",
        snapshots.len(),
        output_path,
        times.first().copied().unwrap_or_default(),
        times.last().copied().unwrap_or_default()
    );
    debug!("Time index: {:?}", time_index);

    Ok(SnapshotSeries {
        directory: output_path.to_path_buf(),
        time_index,
        times,
        snapshots,
    })
}

/// Compare two file names the way a file browser orders them.
///
/// Digit runs compare by numeric value, other runs compare case-insensitively.
/// Names that compare equal by those rules fall back to plain byte order.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut xs = Chunks::new(a);
    let mut ys = Chunks::new(b);

    loop {
        match (xs.next(), ys.next()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = match (x, y) {
                    (Chunk::Digits(x), Chunk::Digits(y)) => cmp_digits(x, y),
                    (Chunk::Text(x), Chunk::Text(y)) => x
                        .chars()
                        .flat_map(char::to_lowercase)
                        .cmp(y.chars().flat_map(char::to_lowercase)),
                    (Chunk::Digits(_), Chunk::Text(_)) => Ordering::Less,
                    (Chunk::Text(_), Chunk::Digits(_)) => Ordering::Greater,
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

fn cmp_digits(x: &str, y: &str) -> Ordering {
    let x = x.trim_start_matches('0');
    let y = y.trim_start_matches('0');
    x.len().cmp(&y.len()).then_with(|| x.cmp(y))
}

#[derive(Debug, Clone, Copy)]
enum Chunk<'a> {
    Digits(&'a str),
    Text(&'a str),
}

/// Splits a string into alternating runs of ASCII digits and everything else.
struct Chunks<'a> {
    rest: &'a str,
}

impl<'a> Chunks<'a> {
    fn new(s: &'a str) -> Self {
        Self { rest: s }
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Chunk<'a>> {
        let first = self.rest.chars().next()?;
        let digits = first.is_ascii_digit();
        let end = self
            .rest
            .char_indices()
            .find(|(_, c)| c.is_ascii_digit() != digits)
            .map(|(i, _)| i)
            .unwrap_or(self.rest.len());
        let (head, tail) = self.rest.split_at(end);
        self.rest = tail;
        Some(if digits {
            Chunk::Digits(head)
        } else {
            Chunk::Text(head)
        })
    }
}
