//! Toolpath events and sinks.
//!
//! The builder does not format machine commands itself. It hands an ordered
//! stream of events to a [`ToolpathSink`], which may collect them, render
//! G-code, or both.

use crate::error::ToolpathResult;
use conekit_core::Point3;
use std::fmt;

/// Stages of a run, in the only order they can occur
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RunPhase {
    Priming,
    Skirt,
    Brim,
    Cylinder,
    Cone,
    LiftOff,
    Done,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Priming => write!(f, "PRIMING"),
            Self::Skirt => write!(f, "SKIRT"),
            Self::Brim => write!(f, "BRIM"),
            Self::Cylinder => write!(f, "CYLINDER"),
            Self::Cone => write!(f, "CONE"),
            Self::LiftOff => write!(f, "LIFT-OFF"),
            Self::Done => write!(f, "DONE"),
        }
    }
}

/// One step of the generated toolpath
#[derive(Debug, Clone, PartialEq)]
pub enum ToolpathEvent {
    /// Non-printing travel
    Move(Point3),
    /// Printing move; `e` is the cumulative filament feed after the move
    Print { to: Point3, e: f64 },
    /// Start of a global layer (annotation only)
    LayerMarker(u32),
    /// Part-cooling fan PWM duty, 0-255
    FanSpeed(u8),
    /// Entry into a run stage
    Phase(RunPhase),
    /// Terminal failure; nothing before it is valid output
    Fail(String),
}

impl ToolpathEvent {
    /// Fan duty as a percentage, for `FanSpeed` events
    pub fn fan_percent(&self) -> Option<f64> {
        match self {
            Self::FanSpeed(pwm) => Some(*pwm as f64 * 100.0 / 255.0),
            _ => None,
        }
    }

    pub fn is_print(&self) -> bool {
        matches!(self, Self::Print { .. })
    }
}

/// Consumer of toolpath events
pub trait ToolpathSink {
    /// Accept the next event, in order
    fn accept(&mut self, event: ToolpathEvent) -> ToolpathResult<()>;
}

impl ToolpathSink for Vec<ToolpathEvent> {
    fn accept(&mut self, event: ToolpathEvent) -> ToolpathResult<()> {
        self.push(event);
        Ok(())
    }
}

impl<S: ToolpathSink + ?Sized> ToolpathSink for &mut S {
    fn accept(&mut self, event: ToolpathEvent) -> ToolpathResult<()> {
        (**self).accept(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fan_percent() {
        assert_eq!(ToolpathEvent::FanSpeed(255).fan_percent(), Some(100.0));
        assert_eq!(ToolpathEvent::FanSpeed(0).fan_percent(), Some(0.0));
        assert_eq!(ToolpathEvent::LayerMarker(3).fan_percent(), None);
    }

    #[test]
    fn test_phase_order() {
        assert!(RunPhase::Priming < RunPhase::Skirt);
        assert!(RunPhase::Cylinder < RunPhase::Cone);
        assert!(RunPhase::LiftOff < RunPhase::Done);
        assert_eq!(RunPhase::LiftOff.to_string(), "LIFT-OFF");
    }

    fn feed<S: ToolpathSink>(mut sink: S) {
        sink.accept(ToolpathEvent::Phase(RunPhase::Priming)).unwrap();
        sink.accept(ToolpathEvent::LayerMarker(0)).unwrap();
    }

    #[test]
    fn test_vec_sink_collects_in_order() {
        let mut events: Vec<ToolpathEvent> = Vec::new();
        feed(&mut events);
        assert_eq!(
            events,
            vec![
                ToolpathEvent::Phase(RunPhase::Priming),
                ToolpathEvent::LayerMarker(0)
            ]
        );
    }
}
