//! Error types for the toolpath crate.
//!
//! Shape selection and parameter validation errors are fatal: they are
//! raised before any geometry is produced. Degenerate geometry and spiral
//! step clamping are recovered from inside the walkers and only surface
//! here if a hard limit is exceeded.

use thiserror::Error;

/// Errors that can occur while synthesizing a toolpath.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolpathError {
    /// The shape id does not name a known nose-cone profile.
    #[error("Invalid shape: {0}")]
    InvalidShape(String),

    /// The shape parameter is outside the documented domain of its profile.
    #[error("Shape parameter for {shape} out of range: {value} (valid: {min}..={max})")]
    InvalidShapeParameter {
        shape: String,
        value: f64,
        min: f64,
        max: f64,
    },

    /// A numeric run parameter is invalid.
    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// A walk could not be subdivided (zero arc length or zero radius).
    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// The spiral walk exceeded its step budget without reaching the apex.
    #[error("Spiral did not terminate after {steps} steps")]
    NonTerminatingSpiral { steps: usize },

    /// The event sink refused an event.
    #[error("Sink error: {0}")]
    Sink(String),
}

impl ToolpathError {
    /// Shorthand for a parameter error.
    pub fn invalid(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    /// True for errors raised before any geometry was produced.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidShape(_)
                | Self::InvalidShapeParameter { .. }
                | Self::InvalidParameter { .. }
        )
    }
}

impl From<std::io::Error> for ToolpathError {
    fn from(err: std::io::Error) -> Self {
        Self::Sink(err.to_string())
    }
}

/// Result type alias for toolpath operations.
pub type ToolpathResult<T> = Result<T, ToolpathError>;
