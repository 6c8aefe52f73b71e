//! # ConeKit Core
//!
//! Core types and utilities shared by the ConeKit crates: the 3D point used
//! by every toolpath stage, unit conversion for job files, and unit errors.

pub mod error;
pub mod geometry;
pub mod units;

pub use error::UnitError;
pub use geometry::Point3;
pub use units::{format_length, LengthUnit, TemperatureUnit};
