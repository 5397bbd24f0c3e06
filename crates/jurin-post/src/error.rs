//! Error types for snapshot post-processing with rich diagnostics.
//!
//! This module provides:
//! - Machine-readable error codes for programmatic handling
//! - Context about where the failure happened (file, snapshot, probe line)
//! - Recovery suggestions for common issues
//! - Terminal display via miette
//!
//! # Error Codes
//!
//! Each error has a unique code in the format `JURIN-XXXX`:
//! - `JURIN-1xxx`: I/O errors (locating, reading, parsing files)
//! - `JURIN-2xxx`: Data errors (missing fields, misaligned series)
//! - `JURIN-3xxx`: Extraction errors (interface not found)
//! - `JURIN-4xxx`: Parameter errors (domain, configuration)
//!
//! # Example
//!
//! ```
//! use jurin_post::{ErrorCode, JurinError};
//!
//! let err = JurinError::empty_phase_region(3, "meniscus", 0.5);
//! assert_eq!(err.code(), ErrorCode::EmptyPhaseRegion);
//! assert_eq!(err.code().as_str(), "JURIN-3001");
//! ```

use miette::Diagnostic;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for post-processing operations.
pub type JurinResult<T> = Result<T, JurinError>;

/// Machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // I/O errors (1xxx)
    /// JURIN-1001: Required input file not found
    InputNotFound = 1001,
    /// JURIN-1002: Failed to read file
    IoRead = 1002,
    /// JURIN-1003: Failed to parse file contents
    ParseError = 1003,
    /// JURIN-1004: More than one time index file
    AmbiguousTimeIndex = 1004,

    // Data errors (2xxx)
    /// JURIN-2001: Field missing from a snapshot
    MissingField = 2001,
    /// JURIN-2002: Snapshot count differs from time count
    SnapshotCountMismatch = 2002,
    /// JURIN-2003: Cells or fields do not fit the grid's points
    InvalidGrid = 2003,

    // Extraction errors (3xxx)
    /// JURIN-3001: No probe point below the phase limit
    EmptyPhaseRegion = 3001,

    // Parameter errors (4xxx)
    /// JURIN-4001: Input outside the formula's domain
    DomainError = 4001,
    /// JURIN-4002: Invalid parameter value
    InvalidParameter = 4002,
    /// JURIN-4003: Configuration file could not be loaded
    Config = 4003,
}

impl ErrorCode {
    /// Returns the error code as a string in the format `JURIN-XXXX`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InputNotFound => "JURIN-1001",
            ErrorCode::IoRead => "JURIN-1002",
            ErrorCode::ParseError => "JURIN-1003",
            ErrorCode::AmbiguousTimeIndex => "JURIN-1004",
            ErrorCode::MissingField => "JURIN-2001",
            ErrorCode::SnapshotCountMismatch => "JURIN-2002",
            ErrorCode::InvalidGrid => "JURIN-2003",
            ErrorCode::EmptyPhaseRegion => "JURIN-3001",
            ErrorCode::DomainError => "JURIN-4001",
            ErrorCode::InvalidParameter => "JURIN-4002",
            ErrorCode::Config => "JURIN-4003",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Recovery suggestions for post-processing errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoverySuggestion {
    /// Check the simulation output directory.
    CheckOutputDirectory { checks: Vec<String> },
    /// Re-run the simulation output step with different settings.
    ReexportOutput { setting: String },
    /// Adjust parameters for the operation.
    AdjustParameters { parameters: Vec<(String, String)> },
    /// No automatic recovery available.
    None,
}

impl std::fmt::Display for RecoverySuggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecoverySuggestion::CheckOutputDirectory { checks } => {
                write!(f, "Check the output directory for: {}", checks.join(", "))
            }
            RecoverySuggestion::ReexportOutput { setting } => {
                write!(f, "Re-run the simulation output with {}", setting)
            }
            RecoverySuggestion::AdjustParameters { parameters } => {
                let params: Vec<String> = parameters
                    .iter()
                    .map(|(k, v)| format!("{} = {}", k, v))
                    .collect();
                write!(f, "Try adjusting: {}", params.join(", "))
            }
            RecoverySuggestion::None => write!(f, "No automatic recovery available"),
        }
    }
}

/// Where an error happened.
#[derive(Debug, Clone)]
pub enum ErrorLocation {
    /// A file on disk.
    File { path: PathBuf },
    /// One snapshot of the series.
    Snapshot { index: usize },
    /// A probe line within one snapshot of the series.
    Probe { snapshot: usize, line: String },
}

impl std::fmt::Display for ErrorLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorLocation::File { path } => write!(f, "{}", path.display()),
            ErrorLocation::Snapshot { index } => write!(f, "snapshot {}", index),
            ErrorLocation::Probe { snapshot, line } => {
                write!(f, "snapshot {}, probe line '{}'", snapshot, line)
            }
        }
    }
}

/// Errors that can occur while post-processing simulation output.
#[derive(Debug, Error, Diagnostic)]
pub enum JurinError {
    /// A required input file is missing.
    #[error("{what} not found in {path}")]
    #[diagnostic(
        code(jurin::io::not_found),
        help("The output directory must hold one .pvd time index and at least one .pvtu snapshot")
    )]
    InputNotFound { path: PathBuf, what: String },

    /// Error reading from a file.
    #[error("failed to read {path}")]
    #[diagnostic(
        code(jurin::io::read),
        help("Check that the file exists and is readable. Try: ls -la {}", path.display())
    )]
    IoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed file contents.
    #[error("failed to parse {path}: {details}")]
    #[diagnostic(
        code(jurin::parse::error),
        help("The file may be truncated or written by an incompatible VTK writer.")
    )]
    ParseError { path: PathBuf, details: String },

    /// More than one `.pvd` file in the output directory.
    #[error("expected exactly one .pvd file in {path}, found {count}")]
    #[diagnostic(
        code(jurin::io::ambiguous_time_index),
        help("Move stale .pvd files out of the output directory")
    )]
    AmbiguousTimeIndex { path: PathBuf, count: usize },

    /// The requested field is absent from a snapshot.
    #[error("field '{field}' not found in {}", field_source(.snapshot, .path))]
    #[diagnostic(
        code(jurin::data::missing_field),
        help("Check the field name in the [extraction] section of the configuration")
    )]
    MissingField {
        field: String,
        snapshot: Option<usize>,
        path: Option<PathBuf>,
    },

    /// The number of snapshots does not match the number of recorded times.
    #[error("found {snapshots} snapshot files but {times} time values in the time index")]
    #[diagnostic(
        code(jurin::data::count_mismatch),
        help("The .pvd file and the .pvtu files come from different runs or a run was interrupted")
    )]
    SnapshotCountMismatch { snapshots: usize, times: usize },

    /// A grid whose cells or fields reference data it does not hold.
    #[error("inconsistent grid in snapshot {snapshot}: {details}")]
    #[diagnostic(
        code(jurin::data::invalid_grid),
        help("Grids built in memory must match what a VTU piece would hold")
    )]
    InvalidGrid { snapshot: usize, details: String },

    /// No point on a probe line lies in the fluid-1 region.
    #[error(
        "no sample on probe line '{line}' of snapshot {snapshot} has a phase value below {phase_limit}"
    )]
    #[diagnostic(
        code(jurin::extract::empty_phase_region),
        help("The snapshot may be malformed or the phase limit miscalibrated")
    )]
    EmptyPhaseRegion {
        snapshot: usize,
        line: String,
        phase_limit: f64,
    },

    /// A formula was evaluated outside its domain.
    #[error("domain error: {details}")]
    #[diagnostic(code(jurin::params::domain))]
    DomainError { details: String },

    /// A parameter has an unusable value.
    #[error("invalid parameter '{name}': {details}")]
    #[diagnostic(code(jurin::params::invalid))]
    InvalidParameter { name: String, details: String },

    /// The configuration file could not be read or deserialized.
    #[error("failed to load configuration from {path}: {details}")]
    #[diagnostic(
        code(jurin::params::config),
        help("See the [physical] and [extraction] tables in the documentation")
    )]
    Config { path: PathBuf, details: String },
}

impl JurinError {
    /// Returns the machine-readable error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            JurinError::InputNotFound { .. } => ErrorCode::InputNotFound,
            JurinError::IoRead { .. } => ErrorCode::IoRead,
            JurinError::ParseError { .. } => ErrorCode::ParseError,
            JurinError::AmbiguousTimeIndex { .. } => ErrorCode::AmbiguousTimeIndex,
            JurinError::MissingField { .. } => ErrorCode::MissingField,
            JurinError::SnapshotCountMismatch { .. } => ErrorCode::SnapshotCountMismatch,
            JurinError::InvalidGrid { .. } => ErrorCode::InvalidGrid,
            JurinError::EmptyPhaseRegion { .. } => ErrorCode::EmptyPhaseRegion,
            JurinError::DomainError { .. } => ErrorCode::DomainError,
            JurinError::InvalidParameter { .. } => ErrorCode::InvalidParameter,
            JurinError::Config { .. } => ErrorCode::Config,
        }
    }

    /// Returns a recovery suggestion for this error.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self {
            JurinError::InputNotFound { .. } => RecoverySuggestion::CheckOutputDirectory {
                checks: vec!["a .pvd file".into(), "*.pvtu snapshot files".into()],
            },
            JurinError::IoRead { .. } => RecoverySuggestion::CheckOutputDirectory {
                checks: vec!["file permissions".into(), "dangling piece references".into()],
            },
            JurinError::ParseError { .. } => RecoverySuggestion::ReexportOutput {
                setting: "the VTU output format".into(),
            },
            JurinError::AmbiguousTimeIndex { .. } => RecoverySuggestion::CheckOutputDirectory {
                checks: vec!["leftover .pvd files".into()],
            },
            JurinError::MissingField { .. } => RecoverySuggestion::AdjustParameters {
                parameters: vec![("extraction.field".into(), "phase_order".into())],
            },
            JurinError::SnapshotCountMismatch { .. } => RecoverySuggestion::CheckOutputDirectory {
                checks: vec!["snapshots from other runs".into(), "truncated time index".into()],
            },
            JurinError::InvalidGrid { .. } => RecoverySuggestion::None,
            JurinError::EmptyPhaseRegion { .. } => RecoverySuggestion::AdjustParameters {
                parameters: vec![
                    ("extraction.phase_limit".into(), "a value inside the field range".into()),
                    ("extraction probe lines".into(), "endpoints inside the mesh".into()),
                ],
            },
            JurinError::DomainError { .. } => RecoverySuggestion::AdjustParameters {
                parameters: vec![("angle".into(), "any value except 90 degrees".into())],
            },
            JurinError::InvalidParameter { name, .. } => RecoverySuggestion::AdjustParameters {
                parameters: vec![(name.clone(), "a finite, positive value".into())],
            },
            JurinError::Config { .. } => RecoverySuggestion::None,
        }
    }

    /// Returns location information if available.
    pub fn location(&self) -> Option<ErrorLocation> {
        match self {
            JurinError::InputNotFound { path, .. }
            | JurinError::IoRead { path, .. }
            | JurinError::ParseError { path, .. }
            | JurinError::AmbiguousTimeIndex { path, .. }
            | JurinError::Config { path, .. } => Some(ErrorLocation::File { path: path.clone() }),
            JurinError::MissingField {
                path: Some(path), ..
            } => Some(ErrorLocation::File { path: path.clone() }),
            JurinError::MissingField {
                snapshot: Some(index),
                ..
            }
            | JurinError::InvalidGrid {
                snapshot: index, ..
            } => Some(ErrorLocation::Snapshot { index: *index }),
            JurinError::EmptyPhaseRegion { snapshot, line, .. } => Some(ErrorLocation::Probe {
                snapshot: *snapshot,
                line: line.clone(),
            }),
            _ => None,
        }
    }

    // Constructor helpers for common error patterns

    /// Create an InputNotFound error.
    pub fn input_not_found(path: impl Into<PathBuf>, what: impl Into<String>) -> Self {
        JurinError::InputNotFound {
            path: path.into(),
            what: what.into(),
        }
    }

    /// Create an IoRead error.
    pub fn io_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        JurinError::IoRead {
            path: path.into(),
            source,
        }
    }

    /// Create a ParseError.
    pub fn parse_error(path: impl Into<PathBuf>, details: impl Into<String>) -> Self {
        JurinError::ParseError {
            path: path.into(),
            details: details.into(),
        }
    }

    /// Create a MissingField error for a grid not yet tied to a snapshot.
    pub fn missing_field(field: impl Into<String>) -> Self {
        JurinError::MissingField {
            field: field.into(),
            snapshot: None,
            path: None,
        }
    }

    /// Create an EmptyPhaseRegion error.
    pub fn empty_phase_region(snapshot: usize, line: impl Into<String>, phase_limit: f64) -> Self {
        JurinError::EmptyPhaseRegion {
            snapshot,
            line: line.into(),
            phase_limit,
        }
    }

    /// Create a DomainError.
    pub fn domain_error(details: impl Into<String>) -> Self {
        JurinError::DomainError {
            details: details.into(),
        }
    }

    /// Create an InvalidParameter error.
    pub fn invalid_parameter(name: impl Into<String>, details: impl Into<String>) -> Self {
        JurinError::InvalidParameter {
            name: name.into(),
            details: details.into(),
        }
    }

    /// Attributes an error raised while processing one snapshot to it.
    ///
    /// Line-level helpers do not know which snapshot they run on.
    pub(crate) fn at_snapshot(self, index: usize) -> Self {
        match self {
            JurinError::EmptyPhaseRegion {
                line, phase_limit, ..
            } => JurinError::EmptyPhaseRegion {
                snapshot: index,
                line,
                phase_limit,
            },
            JurinError::MissingField { field, path, .. } => JurinError::MissingField {
                field,
                snapshot: Some(index),
                path,
            },
            other => other,
        }
    }

    /// Names the file a snapshot-level error was raised on.
    pub(crate) fn in_file(self, file: &Path) -> Self {
        match self {
            JurinError::MissingField {
                field, snapshot, ..
            } => JurinError::MissingField {
                field,
                snapshot,
                path: Some(file.to_path_buf()),
            },
            other => other,
        }
    }
}

fn field_source(snapshot: &Option<usize>, path: &Option<PathBuf>) -> String {
    match (snapshot, path) {
        (Some(index), Some(path)) => format!("{} (snapshot {})", path.display(), index),
        (None, Some(path)) => path.display().to_string(),
        (Some(index), None) => format!("snapshot {}", index),
        (None, None) => "grid".to_string(),
    }
}
