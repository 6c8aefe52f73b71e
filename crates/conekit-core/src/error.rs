//! Error handling for ConeKit
//!
//! Crate-specific errors live next to the code that raises them
//! (`ToolpathError`, `SettingsError`). This module holds the errors raised
//! by the shared unit helpers.
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Unit error type
///
/// Raised when a unit name in a job file cannot be recognized.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UnitError {
    /// Unknown length unit
    #[error("Unknown length unit: {unit}")]
    UnknownLength {
        /// The unrecognized unit name.
        unit: String,
    },

    /// Unknown temperature unit
    #[error("Unknown temperature unit: {unit}")]
    UnknownTemperature {
        /// The unrecognized unit name.
        unit: String,
    },
}
