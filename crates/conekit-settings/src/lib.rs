//! ConeKit Settings Crate
//!
//! Loads job files, normalizes their units and turns them into the
//! parameters consumed by the toolpath engine and the G-code emitter.

pub mod config;
pub mod error;

pub use config::{
    ConeSettings, JobConfig, MachineSettings, NormalizedJob, PrintSettings, UnitSettings,
};
pub use error::{SettingsError, SettingsResult};
