//! # ConeKit Toolpath
//!
//! Toolpath engine for spiral-vase rocket nose cones printed on FDM printers.
//!
//! ## Stages
//!
//! - **Profiles**: radius functions for conic, Haack, tangent ogive,
//!   parabolic, elliptical and power-series nose cones
//! - **Circle Walker**: chord subdivision of rings and helical turns
//! - **Spiral Walker**: one continuous helix from the shoulder to the apex
//! - **Extrusion**: cumulative filament feed with apex tapering
//! - **Builder**: the run state machine, emitting toolpath events
//!
//! ## Output
//!
//! Events go to any [`ToolpathSink`]. [`GcodeEmitter`] renders them as
//! Marlin G-code.

pub mod builder;
pub mod circle;
pub mod error;
pub mod event;
pub mod extrusion;
pub mod gcode;
pub mod profile;
pub mod spiral;

pub use builder::{ConeParameters, RunSummary, ToolpathBuilder};
pub use circle::CircleWalker;
pub use error::{ToolpathError, ToolpathResult};
pub use event::{RunPhase, ToolpathEvent, ToolpathSink};
pub use extrusion::ExtrusionAccountant;
pub use gcode::{EmitterSettings, GcodeEmitter};
pub use profile::{ConeProfile, ShapeKind};
pub use spiral::{SpiralCursor, SpiralPoint, SpiralWalker};
