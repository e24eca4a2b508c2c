//! # Error Types
//!
//! Structured error types for shaft_core. A refused load case or a malformed
//! geometry request is reported with enough context to point the caller at
//! the offending field.
//!
//! Bound violations of shaft subsections are deliberately *not* errors: they
//! are reported as [`BoundViolation`](crate::geometry::BoundViolation) records
//! so the geometry model stays editable while the user iterates.
//!
//! ## Example
//!
//! ```rust
//! use shaft_core::errors::{CalcError, CalcResult};
//!
//! fn validate_length(length_mm: f64) -> CalcResult<()> {
//!     if length_mm <= 0.0 {
//!         return Err(CalcError::invalid_input(
//!             "shaft_length_mm",
//!             length_mm.to_string(),
//!             "Shaft length must be positive",
//!         ));
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for shaft_core operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Structured error type for calculation operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CalcError {
    /// An input value is invalid (out of range, not finite, etc.)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// Axial coordinates are not ordered the way the support layout requires
    #[error("Invalid load order: {reason}")]
    InvalidLoadOrder { reason: String },

    /// Geometry makes the reaction formula divide by zero
    #[error("Degenerate geometry: {reason}")]
    DegenerateGeometry { reason: String },

    /// Region name does not match any shaft region
    #[error("Unknown shaft region: {name}")]
    UnknownRegion { name: String },

    /// Subsection index outside the region's subsection list
    #[error("Subsection {index} not found in region '{region}' ({count} defined)")]
    SubsectionNotFound {
        region: String,
        index: usize,
        count: usize,
    },

    /// Region whose subsection count is dictated by the load case
    #[error("Subsection count of region '{region}' is fixed by the number of eccentrics")]
    FixedSubsectionCount { region: String },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// File is locked by another user/process
    #[error("File locked: '{path}' is locked by {locked_by} since {locked_at}")]
    FileLocked {
        path: String,
        locked_by: String,
        locked_at: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },
}

impl CalcError {
    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidLoadOrder error
    pub fn invalid_load_order(reason: impl Into<String>) -> Self {
        CalcError::InvalidLoadOrder {
            reason: reason.into(),
        }
    }

    /// Create a DegenerateGeometry error
    pub fn degenerate_geometry(reason: impl Into<String>) -> Self {
        CalcError::DegenerateGeometry {
            reason: reason.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileLocked error
    pub fn file_locked(path: impl Into<String>, locked_by: impl Into<String>, locked_at: impl Into<String>) -> Self {
        CalcError::FileLocked {
            path: path.into(),
            locked_by: locked_by.into(),
            locked_at: locked_at.into(),
        }
    }

    /// Check if this is a recoverable error (e.g., can retry)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CalcError::FileLocked { .. })
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CalcError::InvalidInput { .. } => "INVALID_INPUT",
            CalcError::InvalidLoadOrder { .. } => "INVALID_LOAD_ORDER",
            CalcError::DegenerateGeometry { .. } => "DEGENERATE_GEOMETRY",
            CalcError::UnknownRegion { .. } => "UNKNOWN_REGION",
            CalcError::SubsectionNotFound { .. } => "SUBSECTION_NOT_FOUND",
            CalcError::FixedSubsectionCount { .. } => "FIXED_SUBSECTION_COUNT",
            CalcError::FileError { .. } => "FILE_ERROR",
            CalcError::FileLocked { .. } => "FILE_LOCKED",
            CalcError::SerializationError { .. } => "SERIALIZATION_ERROR",
            CalcError::VersionMismatch { .. } => "VERSION_MISMATCH",
        }
    }
}
