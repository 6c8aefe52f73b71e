//! Circular walker
//!
//! Splits a full or partial circle (optionally rising in Z, i.e. one turn of
//! a helix) into straight chords no longer than the print resolution.
//!
//! The step count is computed once from the total sweep and every point is
//! interpolated from the sweep end points, never accumulated, so the last
//! point lands exactly on the requested end angle and height.

use crate::error::{ToolpathError, ToolpathResult};
use conekit_core::Point3;
use tracing::warn;

/// Walks circles of a fixed radius around a fixed center
#[derive(Debug, Clone, Copy)]
pub struct CircleWalker {
    center: (f64, f64),
    radius: f64,
    resolution: f64,
}

impl CircleWalker {
    /// Create a walker; `resolution` is the maximum chord length in mm
    pub fn new(center: (f64, f64), radius: f64, resolution: f64) -> Self {
        Self {
            center,
            radius,
            resolution,
        }
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Point on the circle at `angle_deg`, lifted to `z`
    pub fn point_at(&self, angle_deg: f64, z: f64) -> Point3 {
        Point3::on_circle(self.center, self.radius, angle_deg, z)
    }

    /// Number of chords needed for a sweep of `span_deg` degrees rising by `rise` mm.
    ///
    /// Uses the helical arc length so that chords stay within the resolution
    /// even when Z changes along the sweep.
    pub fn subdivisions(&self, span_deg: f64, rise: f64) -> ToolpathResult<usize> {
        let planar = self.radius * span_deg.to_radians().abs();
        let length = (planar * planar + rise * rise).sqrt();
        if !length.is_finite() || self.resolution <= 0.0 {
            return Err(ToolpathError::DegenerateGeometry(format!(
                "cannot subdivide arc of length {length} at resolution {}",
                self.resolution
            )));
        }
        let steps = (length / self.resolution).ceil() as usize;
        if steps == 0 {
            return Err(ToolpathError::DegenerateGeometry(format!(
                "zero-length arc (radius {:.4} mm, sweep {span_deg} deg)",
                self.radius
            )));
        }
        Ok(steps)
    }

    /// Points along an arc from `start_deg` to `end_deg`, excluding the start
    /// point, with Z interpolated from `z_start` to `z_end`.
    ///
    /// A degenerate arc collapses to a single direct move to the end point.
    pub fn arc(&self, start_deg: f64, end_deg: f64, z_start: f64, z_end: f64) -> Vec<Point3> {
        let steps = match self.subdivisions(end_deg - start_deg, z_end - z_start) {
            Ok(steps) => steps,
            Err(err) => {
                warn!(%err, "falling back to a single direct move");
                return vec![self.point_at(end_deg, z_end)];
            }
        };

        (1..=steps)
            .map(|i| {
                let t = i as f64 / steps as f64;
                let angle = start_deg * (1.0 - t) + end_deg * t;
                let z = z_start * (1.0 - t) + z_end * t;
                self.point_at(angle, z)
            })
            .collect()
    }

    /// One flat closed ring starting and ending at `start_deg`
    pub fn full_circle(&self, start_deg: f64, z: f64) -> Vec<Point3> {
        self.arc(start_deg, start_deg + 360.0, z, z)
    }

    /// One helical turn from `start_deg`, rising from `z_start` to `z_end`
    pub fn helix_turn(&self, start_deg: f64, z_start: f64, z_end: f64) -> Vec<Point3> {
        self.arc(start_deg, start_deg + 360.0, z_start, z_end)
    }
}
