//! Cartesian point type shared by every toolpath stage.

use std::fmt;

/// A point in machine coordinates (millimeters)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point3 {
    /// X-axis position
    pub x: f64,
    /// Y-axis position
    pub y: f64,
    /// Z-axis position
    pub z: f64,
}

impl Point3 {
    /// Create a point from its three coordinates
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        debug_assert!(
            x.is_finite() && y.is_finite() && z.is_finite(),
            "Point3 coordinates must be finite: x={x}, y={y}, z={z}"
        );
        Self { x, y, z }
    }

    /// Point on a horizontal circle around `center`, at `angle_deg` measured
    /// counter-clockwise from +X, lifted to height `z`.
    pub fn on_circle(center: (f64, f64), radius: f64, angle_deg: f64, z: f64) -> Self {
        let theta = angle_deg.to_radians();
        Self::new(
            center.0 + radius * theta.cos(),
            center.1 + radius * theta.sin(),
            z,
        )
    }

    /// Euclidean distance in 3D
    pub fn distance_to(&self, other: &Point3) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dz = other.z - self.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Same point at a different height
    pub fn with_z(self, z: f64) -> Self {
        Self { z, ..self }
    }

    /// Coordinates as a tuple
    pub fn as_tuple(&self) -> (f64, f64, f64) {
        (self.x, self.y, self.z)
    }
}

impl fmt::Display for Point3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3}, {:.3})", self.x, self.y, self.z)
    }
}
