//! Error types for the settings crate.
//!
//! Covers reading and writing job files, unit names, and validation of the
//! values a job file carries.

use conekit_core::UnitError;
use conekit_toolpath::ToolpathError;
use std::io;
use thiserror::Error;

/// Errors that can occur while loading, saving or validating a job.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML deserialization error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("TOML error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// The job file extension is neither `.json` nor `.toml`.
    #[error("Unsupported job file format: {0}")]
    UnsupportedFormat(String),

    /// A job value is invalid.
    #[error("Invalid setting '{key}': {reason}")]
    InvalidSetting { key: String, reason: String },

    /// A unit name could not be recognized.
    #[error(transparent)]
    UnknownUnit(#[from] UnitError),

    /// The engine rejected the job (unknown shape, parameter out of range).
    #[error(transparent)]
    Toolpath(#[from] ToolpathError),
}

impl SettingsError {
    pub fn invalid(key: &str, reason: impl Into<String>) -> Self {
        Self::InvalidSetting {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for settings operations.
pub type SettingsResult<T> = Result<T, SettingsError>;
