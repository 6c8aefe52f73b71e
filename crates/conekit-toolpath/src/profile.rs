//! Nose-cone profile functions.
//!
//! Every profile maps an axial position `x` to the outer radius of the cone.
//! `x` is measured from the apex: `x = 0` is the tip and `x = L` is the
//! shoulder where the cone meets the cylindrical base. With that convention
//! every profile satisfies `radius(0) = 0` and `radius(L) = R` (the blunt
//! tangent ogive with `L < R` is the one exception, its tip stays open).
//!
//! The elliptical profile is usually written with `x` measured from the
//! base; it is mirrored here so all six shapes share one orientation.

use crate::error::{ToolpathError, ToolpathResult};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

/// Closed set of supported nose-cone shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    /// Straight cone
    Conic,
    /// Haack series, parameter `C` (0 = Von Karman, 1/3 = LV-Haack)
    Haack,
    /// Tangent ogive
    TangentOgive,
    /// Parabolic series, parameter `K`
    Parabolic,
    /// Half ellipse
    Elliptical,
    /// Power series, exponent `n`
    PowerSeries,
}

impl ShapeKind {
    /// All shapes, in declaration order
    pub const ALL: [ShapeKind; 6] = [
        ShapeKind::Conic,
        ShapeKind::Haack,
        ShapeKind::TangentOgive,
        ShapeKind::Parabolic,
        ShapeKind::Elliptical,
        ShapeKind::PowerSeries,
    ];

    /// Canonical id used in job files
    pub fn id(&self) -> &'static str {
        match self {
            Self::Conic => "conic",
            Self::Haack => "haack",
            Self::TangentOgive => "tangent_ogive",
            Self::Parabolic => "parabolic",
            Self::Elliptical => "elliptical",
            Self::PowerSeries => "power_series",
        }
    }

    /// Inclusive domain of the shape parameter, `None` if the shape ignores it
    pub fn parameter_range(&self) -> Option<(f64, f64)> {
        match self {
            Self::Haack => Some((0.0, 2.0 / 3.0)),
            Self::Parabolic | Self::PowerSeries => Some((0.0, 1.0)),
            Self::Conic | Self::TangentOgive | Self::Elliptical => None,
        }
    }

    /// Check a shape parameter against this shape's domain
    pub fn validate_parameter(&self, value: f64) -> ToolpathResult<()> {
        let Some((min, max)) = self.parameter_range() else {
            return Ok(());
        };
        if !value.is_finite() || value < min - 1e-9 || value > max + 1e-9 {
            return Err(ToolpathError::InvalidShapeParameter {
                shape: self.id().to_string(),
                value,
                min,
                max,
            });
        }
        Ok(())
    }

    /// Outer radius at axial distance `x` from the apex.
    ///
    /// * `x` - distance from the tip, expected in `[0, length]`
    /// * `length` - cone length `L`
    /// * `base_radius` - radius `R` at the shoulder
    /// * `parameter` - shape parameter (`C`, `K` or `n`), ignored where unused
    pub fn radius(&self, x: f64, length: f64, base_radius: f64, parameter: f64) -> f64 {
        let (l, r) = (length, base_radius);
        match self {
            Self::Conic => x * r / l,
            Self::Haack => {
                let theta = (1.0 - 2.0 * x / l).acos();
                let area = theta - (2.0 * theta).sin() / 2.0 + parameter * theta.sin().powi(3);
                r / PI.sqrt() * area.max(0.0).sqrt()
            }
            Self::TangentOgive => {
                let rho = (r * r + l * l) / (2.0 * r);
                let from_base = l - x;
                (rho * rho - from_base * from_base).max(0.0).sqrt() + r - rho
            }
            Self::Parabolic => {
                let t = x / l;
                r * (2.0 * t - parameter * t * t) / (2.0 - parameter)
            }
            Self::Elliptical => {
                let from_base = l - x;
                r * (1.0 - from_base * from_base / (l * l)).max(0.0).sqrt()
            }
            Self::PowerSeries => r * (x / l).powf(parameter),
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Conic => write!(f, "Conic"),
            Self::Haack => write!(f, "Haack"),
            Self::TangentOgive => write!(f, "Tangent Ogive"),
            Self::Parabolic => write!(f, "Parabolic"),
            Self::Elliptical => write!(f, "Elliptical"),
            Self::PowerSeries => write!(f, "Power Series"),
        }
    }
}

impl FromStr for ShapeKind {
    type Err = ToolpathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "conic" | "cone" => Ok(Self::Conic),
            "haack" | "vonkarman" => Ok(Self::Haack),
            "tangentogive" | "ogive" => Ok(Self::TangentOgive),
            "parabolic" => Ok(Self::Parabolic),
            "elliptical" | "ellipse" => Ok(Self::Elliptical),
            "powerseries" | "power" => Ok(Self::PowerSeries),
            _ => Err(ToolpathError::InvalidShape(s.to_string())),
        }
    }
}

/// A validated profile bound to concrete cone dimensions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConeProfile {
    shape: ShapeKind,
    length: f64,
    base_radius: f64,
    parameter: f64,
}

impl ConeProfile {
    /// Bind a shape to a cone of the given length and shoulder radius
    pub fn new(
        shape: ShapeKind,
        length: f64,
        base_radius: f64,
        parameter: f64,
    ) -> ToolpathResult<Self> {
        if !(length.is_finite() && length > 0.0) {
            return Err(ToolpathError::invalid("cone_length", "must be positive"));
        }
        if !(base_radius.is_finite() && base_radius > 0.0) {
            return Err(ToolpathError::invalid("base_radius", "must be positive"));
        }
        shape.validate_parameter(parameter)?;
        Ok(Self {
            shape,
            length,
            base_radius,
            parameter,
        })
    }

    pub fn shape(&self) -> ShapeKind {
        self.shape
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn base_radius(&self) -> f64 {
        self.base_radius
    }

    pub fn parameter(&self) -> f64 {
        self.parameter
    }

    /// Radius at distance `x` from the apex; `x` is clamped to `[0, L]`
    pub fn radius_at(&self, x: f64) -> f64 {
        let x = x.clamp(0.0, self.length);
        let r = self
            .shape
            .radius(x, self.length, self.base_radius, self.parameter);
        if r.is_finite() {
            r.max(0.0)
        } else {
            0.0
        }
    }
}
