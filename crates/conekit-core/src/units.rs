//! Unit conversion utilities
//!
//! Job files may be written in millimeters, centimeters or inches, and in
//! Celsius or Fahrenheit. Everything downstream of the settings loader works
//! in millimeters and Celsius only.

use crate::error::UnitError;
use std::fmt;
use std::str::FromStr;

const MM_PER_INCH: f64 = 25.4;
const MM_PER_CM: f64 = 10.0;

/// Length unit used by a job file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthUnit {
    /// Millimeters
    Millimeter,
    /// Centimeters
    Centimeter,
    /// Inches
    Inch,
}

impl Default for LengthUnit {
    fn default() -> Self {
        Self::Millimeter
    }
}

impl fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Millimeter => write!(f, "mm"),
            Self::Centimeter => write!(f, "cm"),
            Self::Inch => write!(f, "in"),
        }
    }
}

impl FromStr for LengthUnit {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mm" | "millimeter" | "millimeters" => Ok(Self::Millimeter),
            "cm" | "centimeter" | "centimeters" => Ok(Self::Centimeter),
            "in" | "inch" | "inches" => Ok(Self::Inch),
            _ => Err(UnitError::UnknownLength {
                unit: s.to_string(),
            }),
        }
    }
}

impl LengthUnit {
    /// Convert a value in this unit to millimeters
    pub fn to_mm(self, value: f64) -> f64 {
        match self {
            Self::Millimeter => value,
            Self::Centimeter => value * MM_PER_CM,
            Self::Inch => value * MM_PER_INCH,
        }
    }

    /// Convert a value in millimeters to this unit
    pub fn from_mm(self, value_mm: f64) -> f64 {
        match self {
            Self::Millimeter => value_mm,
            Self::Centimeter => value_mm / MM_PER_CM,
            Self::Inch => value_mm / MM_PER_INCH,
        }
    }
}

/// Temperature unit used by a job file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureUnit {
    /// Degrees Celsius
    Celsius,
    /// Degrees Fahrenheit
    Fahrenheit,
}

impl Default for TemperatureUnit {
    fn default() -> Self {
        Self::Celsius
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Celsius => write!(f, "C"),
            Self::Fahrenheit => write!(f, "F"),
        }
    }
}

impl FromStr for TemperatureUnit {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "c" | "celsius" => Ok(Self::Celsius),
            "f" | "fahrenheit" => Ok(Self::Fahrenheit),
            _ => Err(UnitError::UnknownTemperature {
                unit: s.to_string(),
            }),
        }
    }
}

impl TemperatureUnit {
    /// Convert a temperature in this unit to Celsius
    pub fn to_celsius(self, value: f64) -> f64 {
        match self {
            Self::Celsius => value,
            Self::Fahrenheit => (value - 32.0) * 5.0 / 9.0,
        }
    }
}

/// Format a millimeter length for display in the given unit
pub fn format_length(value_mm: f64, unit: LengthUnit) -> String {
    format!("{:.3} {}", unit.from_mm(value_mm), unit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_conversion() {
        assert_eq!(LengthUnit::Millimeter.to_mm(12.5), 12.5);
        assert_eq!(LengthUnit::Centimeter.to_mm(1.5), 15.0);
        assert!((LengthUnit::Inch.to_mm(2.0) - 50.8).abs() < 1e-12);
        assert!((LengthUnit::Inch.from_mm(25.4) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_temperature_conversion() {
        assert_eq!(TemperatureUnit::Celsius.to_celsius(210.0), 210.0);
        assert!((TemperatureUnit::Fahrenheit.to_celsius(212.0) - 100.0).abs() < 1e-12);
        assert!((TemperatureUnit::Fahrenheit.to_celsius(32.0)).abs() < 1e-12);
    }

    #[test]
    fn test_parse_units() {
        assert_eq!("MM".parse::<LengthUnit>().unwrap(), LengthUnit::Millimeter);
        assert_eq!(" inches ".parse::<LengthUnit>().unwrap(), LengthUnit::Inch);
        assert_eq!("f".parse::<TemperatureUnit>().unwrap(), TemperatureUnit::Fahrenheit);
        assert!("furlong".parse::<LengthUnit>().is_err());
        assert!("kelvin".parse::<TemperatureUnit>().is_err());
    }

    #[test]
    fn test_format_length() {
        assert_eq!(format_length(25.4, LengthUnit::Inch), "1.000 in");
        assert_eq!(format_length(10.0, LengthUnit::Millimeter), "10.000 mm");
    }
}
