//! Extrusion accounting
//!
//! Converts travel distance into filament feed with a constant
//! cross-section model: the bead laid down is `layer_height * wall_thickness`
//! and the filament pushed in is `pi * (d / 2)^2`, so every millimeter of
//! travel consumes `bead / filament` millimeters of filament.
//!
//! Within [`TAPER_START_MM`] of the apex the programmed bead would be wider
//! than the remaining cone, so the bead area is divided by
//! `4 / remaining + 0.5`. The ratio is 1 at the taper start and grows
//! without bound at the tip; `remaining` is floored at
//! [`MIN_REMAINING_MM`] so the apex itself stays finite.

use crate::error::{ToolpathError, ToolpathResult};
use conekit_core::Point3;
use std::f64::consts::PI;
use tracing::debug;

/// Distance from the apex at which extrusion starts tapering
pub const TAPER_START_MM: f64 = 8.0;

/// Smallest remaining distance used in the taper ratio
pub const MIN_REMAINING_MM: f64 = 1e-3;

/// Owns the cumulative filament feed `e` for one run
#[derive(Debug, Clone)]
pub struct ExtrusionAccountant {
    filament_area: f64,
    bead_area: f64,
    total: f64,
    apex_clamped: bool,
}

impl ExtrusionAccountant {
    pub fn new(
        filament_diameter: f64,
        layer_height: f64,
        wall_thickness: f64,
    ) -> ToolpathResult<Self> {
        for (name, value) in [
            ("filament_diameter", filament_diameter),
            ("layer_height", layer_height),
            ("wall_thickness", wall_thickness),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ToolpathError::invalid(name, "must be positive"));
            }
        }
        Ok(Self {
            filament_area: PI * (filament_diameter / 2.0).powi(2),
            bead_area: layer_height * wall_thickness,
            total: 0.0,
            apex_clamped: false,
        })
    }

    /// Filament cross-section in mm²
    pub fn filament_cross_section(&self) -> f64 {
        self.filament_area
    }

    /// Nominal bead cross-section in mm²
    pub fn nominal_bead_cross_section(&self) -> f64 {
        self.bead_area
    }

    /// Divisor applied to the bead area at `remaining` mm from the apex
    pub fn taper_ratio(remaining: f64) -> f64 {
        if remaining >= TAPER_START_MM {
            return 1.0;
        }
        4.0 / remaining.max(MIN_REMAINING_MM) + 0.5
    }

    /// Bead cross-section at `remaining` mm from the apex
    pub fn bead_cross_section(&self, remaining: f64) -> f64 {
        self.bead_area / Self::taper_ratio(remaining)
    }

    /// Filament length per unit of travel away from the tip
    pub fn nominal_ratio(&self) -> f64 {
        self.bead_area / self.filament_area
    }

    /// Filament length per unit of travel at `remaining` mm from the apex
    pub fn tapered_ratio(&self, remaining: f64) -> f64 {
        self.bead_cross_section(remaining) / self.filament_area
    }

    /// Cumulative feed so far
    pub fn total(&self) -> f64 {
        self.total
    }

    /// Filament volume consumed so far, in mm³
    pub fn volume(&self) -> f64 {
        self.total * self.filament_area
    }

    /// Account for a printed segment at nominal width; returns the new cumulative feed
    pub fn feed(&mut self, from: &Point3, to: &Point3) -> f64 {
        self.advance(self.nominal_ratio() * from.distance_to(to))
    }

    /// Account for a printed segment ending `remaining` mm below the apex
    pub fn feed_tapered(&mut self, from: &Point3, to: &Point3, remaining: f64) -> f64 {
        if remaining < MIN_REMAINING_MM && !self.apex_clamped {
            debug!(remaining, "taper ratio clamped at apex");
            self.apex_clamped = true;
        }
        self.advance(self.tapered_ratio(remaining) * from.distance_to(to))
    }

    fn advance(&mut self, delta: f64) -> f64 {
        if delta.is_finite() && delta > 0.0 {
            self.total += delta;
        }
        self.total
    }
}
