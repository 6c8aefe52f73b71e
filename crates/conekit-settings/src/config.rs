//! Job file handling for ConeKit
//!
//! A job file describes one nose cone and how to print it. It is organized
//! into sections:
//! - Units (length and temperature units used by every other section)
//! - Cone geometry (shape, dimensions, base height)
//! - Print settings (layers, resolution, material, temperatures, speeds)
//! - Machine (build plate size)
//!
//! Files are JSON or TOML, chosen by extension. Every section has defaults,
//! so a job file only needs the values that differ.

use crate::error::{SettingsError, SettingsResult};
use conekit_core::{LengthUnit, TemperatureUnit};
use conekit_toolpath::{ConeParameters, EmitterSettings, ShapeKind};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Hottest nozzle or bed temperature accepted, in Celsius
pub const MAX_TEMPERATURE_C: f64 = 400.0;

/// Units used by the values of a job file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitSettings {
    /// `mm`, `cm` or `in`
    pub length: String,
    /// `C` or `F`
    pub temperature: String,
}

impl Default for UnitSettings {
    fn default() -> Self {
        Self {
            length: LengthUnit::default().to_string(),
            temperature: TemperatureUnit::default().to_string(),
        }
    }
}

/// Cone geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConeSettings {
    /// Shape id, e.g. `haack` or `tangent_ogive`
    pub shape: String,
    /// Shape parameter (`C` for Haack, `K` for parabolic, `n` for power series)
    pub shape_parameter: f64,
    /// Outer diameter at the shoulder
    pub diameter: f64,
    /// Cone height divided by diameter
    pub height_ratio: f64,
    /// Printed wall thickness
    pub wall_thickness: f64,
    /// Height of the cylindrical base; 0 prints the cone only
    pub base_height: f64,
}

impl Default for ConeSettings {
    fn default() -> Self {
        Self {
            shape: ShapeKind::Haack.id().to_string(),
            shape_parameter: 0.0,
            diameter: 40.0,
            height_ratio: 3.0,
            wall_thickness: 0.8,
            base_height: 10.0,
        }
    }
}

/// Print settings; speeds are in length units per second
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrintSettings {
    pub layer_height: f64,
    /// Maximum chord length
    pub resolution: f64,
    pub filament_diameter: f64,
    /// Brim width; a skirt is printed when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brim_width: Option<f64>,
    pub nozzle_temperature: f64,
    pub bed_temperature: f64,
    pub print_speed: f64,
    pub first_layer_speed: f64,
    pub travel_speed: f64,
    pub retract_length: f64,
    pub retract_speed: f64,
}

impl Default for PrintSettings {
    fn default() -> Self {
        Self {
            layer_height: 0.2,
            resolution: 0.5,
            filament_diameter: 1.75,
            brim_width: None,
            nozzle_temperature: 210.0,
            bed_temperature: 60.0,
            print_speed: 30.0,
            first_layer_speed: 15.0,
            travel_speed: 120.0,
            retract_length: 2.0,
            retract_speed: 35.0,
        }
    }
}

/// Printer bed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineSettings {
    pub bed_width: f64,
    pub bed_depth: f64,
}

impl Default for MachineSettings {
    fn default() -> Self {
        Self {
            bed_width: 220.0,
            bed_depth: 220.0,
        }
    }
}

/// A job normalized to millimeters and Celsius
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedJob {
    pub cone: ConeParameters,
    pub emitter: EmitterSettings,
}

/// Complete job file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    pub units: UnitSettings,
    pub cone: ConeSettings,
    pub print: PrintSettings,
    pub machine: MachineSettings,
}

impl JobConfig {
    /// Create a job with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a job from file (JSON or TOML) and validate it
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let content = std::fs::read_to_string(path)?;

        let job: Self = match Format::of(path)? {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };
        debug!(path = %path.display(), shape = %job.cone.shape, "loaded job file");

        job.validate()?;
        Ok(job)
    }

    /// Save the job to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match Format::of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        std::fs::write(path, content)?;
        debug!(path = %path.display(), "saved job file");
        Ok(())
    }

    /// Validate the job without keeping the normalized result
    pub fn validate(&self) -> SettingsResult<()> {
        self.normalize().map(|_| ())
    }

    pub fn length_unit(&self) -> SettingsResult<LengthUnit> {
        Ok(self.units.length.parse()?)
    }

    pub fn temperature_unit(&self) -> SettingsResult<TemperatureUnit> {
        Ok(self.units.temperature.parse()?)
    }

    /// Convert to millimeters and Celsius and check every value
    pub fn normalize(&self) -> SettingsResult<NormalizedJob> {
        let length = self.length_unit()?;
        let temperature = self.temperature_unit()?;
        let shape: ShapeKind = self.cone.shape.parse()?;

        let c = &self.cone;
        let p = &self.print;
        let m = &self.machine;

        let mm = |key: &str, value: f64| -> SettingsResult<f64> {
            if !(value.is_finite() && value > 0.0) {
                return Err(SettingsError::invalid(key, format!("must be positive, got {value}")));
            }
            Ok(length.to_mm(value))
        };
        let mm_or_zero = |key: &str, value: f64| -> SettingsResult<f64> {
            if !(value.is_finite() && value >= 0.0) {
                return Err(SettingsError::invalid(key, format!("must not be negative, got {value}")));
            }
            Ok(length.to_mm(value))
        };
        let celsius = |key: &str, value: f64| -> SettingsResult<f64> {
            let converted = temperature.to_celsius(value);
            if !(converted.is_finite() && (0.0..=MAX_TEMPERATURE_C).contains(&converted)) {
                return Err(SettingsError::invalid(
                    key,
                    format!("{converted:.1} C is outside 0..={MAX_TEMPERATURE_C} C"),
                ));
            }
            Ok(converted)
        };

        if !c.shape_parameter.is_finite() {
            return Err(SettingsError::invalid("cone.shape_parameter", "must be finite"));
        }
        if !(c.height_ratio.is_finite() && c.height_ratio > 0.0) {
            return Err(SettingsError::invalid("cone.height_ratio", "must be positive"));
        }

        let diameter = mm("cone.diameter", c.diameter)?;
        let wall_thickness = mm("cone.wall_thickness", c.wall_thickness)?;
        if wall_thickness >= diameter {
            return Err(SettingsError::invalid(
                "cone.wall_thickness",
                "must be smaller than the diameter",
            ));
        }
        let layer_height = mm("print.layer_height", p.layer_height)?;
        let filament_diameter = mm("print.filament_diameter", p.filament_diameter)?;

        let cone = ConeParameters {
            shape,
            shape_parameter: c.shape_parameter,
            diameter,
            height_ratio: c.height_ratio,
            wall_thickness,
            base_height: mm_or_zero("cone.base_height", c.base_height)?,
            layer_height,
            resolution: mm("print.resolution", p.resolution)?,
            filament_diameter,
            brim_width: p
                .brim_width
                .map(|w| mm_or_zero("print.brim_width", w))
                .transpose()?,
            bed_width: mm("machine.bed_width", m.bed_width)?,
            bed_depth: mm("machine.bed_depth", m.bed_depth)?,
        };
        cone.validate()?;

        let emitter = EmitterSettings {
            nozzle_temperature: celsius("print.nozzle_temperature", p.nozzle_temperature)?,
            bed_temperature: celsius("print.bed_temperature", p.bed_temperature)?,
            print_speed: mm("print.print_speed", p.print_speed)?,
            first_layer_speed: mm("print.first_layer_speed", p.first_layer_speed)?,
            travel_speed: mm("print.travel_speed", p.travel_speed)?,
            retract_length: mm_or_zero("print.retract_length", p.retract_length)?,
            retract_speed: mm("print.retract_speed", p.retract_speed)?,
            bed_width: cone.bed_width,
            bed_depth: cone.bed_depth,
            layer_height,
            wall_thickness,
            filament_diameter,
        };

        Ok(NormalizedJob { cone, emitter })
    }
}

enum Format {
    Json,
    Toml,
}

impl Format {
    fn of(path: &Path) -> SettingsResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            other => Err(SettingsError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }
}
