//! # Error Types
//!
//! Structured error types for anchor_core. Every variant carries enough
//! context (anchor field, row number, offending value) for a caller to point
//! the user at the exact input that needs fixing.
//!
//! Two groups behave differently at runtime:
//!
//! - **Per-anchor domain errors** (`InvalidGeometry`, `InvalidSafetyFactor`,
//!   `InvalidInput`) abort the evaluation of one anchor only. The pipeline in
//!   [`crate::calculations`] records them and keeps going.
//! - **Import-time errors** (`MalformedRecord`, `MalformedPayload`) are never
//!   fatal. The importer skips the row or falls back to defaults and hands
//!   the error back as a diagnostic.
//!
//! ## Example
//!
//! ```rust
//! use anchor_core::errors::{CalcError, CalcResult};
//!
//! fn validate_spacing(spacing_m: f64) -> CalcResult<()> {
//!     if spacing_m <= 0.0 {
//!         return Err(CalcError::invalid_spacing(spacing_m));
//!     }
//!     Ok(())
//! }
//!
//! assert_eq!(validate_spacing(0.0).unwrap_err().error_code(), "INVALID_SPACING");
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for anchor_core operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Structured error type for calculation and interchange operations.
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

    /// A required field is missing
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// Anchor geometry cannot be used in a formula (e.g. zero free length)
    #[error("Invalid geometry for '{field}': {value} - {reason}")]
    InvalidGeometry {
        field: String,
        value: String,
        reason: String,
    },

    /// Safety factor is zero or negative
    #[error("Invalid safety factor: {value} - must be greater than zero")]
    InvalidSafetyFactor { value: String },

    /// Anchor spacing is zero or negative
    #[error("Invalid anchor spacing: {value} m - must be greater than zero")]
    InvalidSpacing { value: String },

    /// An imported row was rejected
    #[error("Malformed record at row {row}: '{field}' - {reason}")]
    MalformedRecord {
        row: usize,
        field: String,
        reason: String,
    },

    /// The structured project payload could not be parsed
    #[error("Malformed project payload: {reason}")]
    MalformedPayload { reason: String },

    /// A reinforcement-area expression could not be parsed or evaluated
    #[error("Invalid expression '{expression}' at position {position}: {reason}")]
    InvalidExpression {
        expression: String,
        position: usize,
        reason: String,
    },

    /// Section designation not found in a catalogue
    #[error("Section not found: {designation}")]
    SectionNotFound { designation: String },

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

    /// JSON/CSV serialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Generic internal error (should be rare)
    #[error("Internal error: {message}")]
    Internal { message: String },
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

    /// Create a MissingField error
    pub fn missing_field(field: impl Into<String>) -> Self {
        CalcError::MissingField {
            field: field.into(),
        }
    }

    /// Create an InvalidGeometry error
    pub fn invalid_geometry(field: impl Into<String>, value: f64, reason: impl Into<String>) -> Self {
        CalcError::InvalidGeometry {
            field: field.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidSafetyFactor error
    pub fn invalid_safety_factor(value: f64) -> Self {
        CalcError::InvalidSafetyFactor {
            value: value.to_string(),
        }
    }

    /// Create an InvalidSpacing error
    pub fn invalid_spacing(value: f64) -> Self {
        CalcError::InvalidSpacing {
            value: value.to_string(),
        }
    }

    /// Create a MalformedRecord error
    pub fn malformed_record(row: usize, field: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::MalformedRecord {
            row,
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a MalformedPayload error
    pub fn malformed_payload(reason: impl Into<String>) -> Self {
        CalcError::MalformedPayload {
            reason: reason.into(),
        }
    }

    /// Create an InvalidExpression error
    pub fn invalid_expression(expression: impl Into<String>, position: usize, reason: impl Into<String>) -> Self {
        CalcError::InvalidExpression {
            expression: expression.into(),
            position,
            reason: reason.into(),
        }
    }

    /// Create a SectionNotFound error
    pub fn section_not_found(designation: impl Into<String>) -> Self {
        CalcError::SectionNotFound {
            designation: designation.into(),
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

    /// Check if this error was (or can be) recovered from locally
    ///
    /// Locks can be retried later; import errors only drop a row or a payload.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CalcError::FileLocked { .. }
                | CalcError::MalformedRecord { .. }
                | CalcError::MalformedPayload { .. }
        )
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CalcError::InvalidInput { .. } => "INVALID_INPUT",
            CalcError::MissingField { .. } => "MISSING_FIELD",
            CalcError::InvalidGeometry { .. } => "INVALID_GEOMETRY",
            CalcError::InvalidSafetyFactor { .. } => "INVALID_SAFETY_FACTOR",
            CalcError::InvalidSpacing { .. } => "INVALID_SPACING",
            CalcError::MalformedRecord { .. } => "MALFORMED_RECORD",
            CalcError::MalformedPayload { .. } => "MALFORMED_PAYLOAD",
            CalcError::InvalidExpression { .. } => "INVALID_EXPRESSION",
            CalcError::SectionNotFound { .. } => "SECTION_NOT_FOUND",
            CalcError::FileError { .. } => "FILE_ERROR",
            CalcError::FileLocked { .. } => "FILE_LOCKED",
            CalcError::SerializationError { .. } => "SERIALIZATION_ERROR",
            CalcError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

impl From<csv::Error> for CalcError {
    fn from(e: csv::Error) -> Self {
        CalcError::SerializationError {
            reason: e.to_string(),
        }
    }
}

impl From<serde_json::Error> for CalcError {
    fn from(e: serde_json::Error) -> Self {
        CalcError::SerializationError {
            reason: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = CalcError::invalid_geometry("free_length_m", 0.0, "Free length must be positive");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"type\":\"InvalidGeometry\""));
        let roundtrip: CalcError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(CalcError::missing_field("bond").error_code(), "MISSING_FIELD");
        assert_eq!(CalcError::invalid_safety_factor(0.0).error_code(), "INVALID_SAFETY_FACTOR");
        assert_eq!(CalcError::malformed_record(3, "bond", "missing").error_code(), "MALFORMED_RECORD");
        assert_eq!(CalcError::section_not_found("CHS 1x1").error_code(), "SECTION_NOT_FOUND");
    }

    #[test]
    fn test_recoverable_kinds() {
        assert!(CalcError::malformed_payload("bad json").is_recoverable());
        assert!(CalcError::malformed_record(2, "x1", "missing").is_recoverable());
        assert!(!CalcError::invalid_spacing(0.0).is_recoverable());
    }

    #[test]
    fn test_error_display_carries_context() {
        let error = CalcError::malformed_record(4, "bond", "missing value");
        assert_eq!(error.to_string(), "Malformed record at row 4: 'bond' - missing value");
    }
}
