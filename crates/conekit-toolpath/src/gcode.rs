//! Marlin G-code emitter
//!
//! Renders the toolpath event stream as Marlin-flavoured G-code. The builder
//! knows nothing about machine commands; heating, priming, retraction and
//! shutdown are all added here in response to `Phase` events.

use crate::error::{ToolpathError, ToolpathResult};
use crate::event::{RunPhase, ToolpathEvent, ToolpathSink};
use crate::extrusion::ExtrusionAccountant;
use conekit_core::Point3;
use std::io::Write;
use tracing::{debug, warn};

/// Machine and material settings used for rendering (millimeters, Celsius, mm/s)
#[derive(Debug, Clone, PartialEq)]
pub struct EmitterSettings {
    pub nozzle_temperature: f64,
    pub bed_temperature: f64,
    /// Print speed after the first layer
    pub print_speed: f64,
    pub first_layer_speed: f64,
    pub travel_speed: f64,
    pub retract_length: f64,
    pub retract_speed: f64,
    pub bed_width: f64,
    pub bed_depth: f64,
    /// Used for the priming lines
    pub layer_height: f64,
    /// Used for the priming lines
    pub wall_thickness: f64,
    pub filament_diameter: f64,
}

impl Default for EmitterSettings {
    fn default() -> Self {
        Self {
            nozzle_temperature: 210.0,
            bed_temperature: 60.0,
            print_speed: 30.0,
            first_layer_speed: 15.0,
            travel_speed: 120.0,
            retract_length: 2.0,
            retract_speed: 35.0,
            bed_width: 220.0,
            bed_depth: 220.0,
            layer_height: 0.2,
            wall_thickness: 0.8,
            filament_diameter: 1.75,
        }
    }
}

/// Distance of the priming lines from the left bed edge
const PRIME_X: f64 = 5.0;

/// Streams G-code for a toolpath into any writer
pub struct GcodeEmitter<W: Write> {
    out: W,
    settings: EmitterSettings,
    phase: Option<RunPhase>,
    layer: u32,
    feed_rate: Option<f64>,
    last_e: f64,
    lines: usize,
    finished: bool,
    failed: bool,
}

impl<W: Write> GcodeEmitter<W> {
    pub fn new(out: W, settings: EmitterSettings) -> Self {
        Self {
            out,
            settings,
            phase: None,
            layer: 0,
            feed_rate: None,
            last_e: 0.0,
            lines: 0,
            finished: false,
            failed: false,
        }
    }

    /// True once the `Done` phase has been written
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// True if a `Fail` event was received
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Number of lines written so far
    pub fn lines_written(&self) -> usize {
        self.lines
    }

    /// Flush and return the underlying writer
    pub fn into_inner(mut self) -> ToolpathResult<W> {
        self.out.flush()?;
        Ok(self.out)
    }

    fn line(&mut self, text: &str) -> ToolpathResult<()> {
        writeln!(self.out, "{text}")?;
        self.lines += 1;
        Ok(())
    }

    /// `F` word in mm/min, only when the feed rate changes
    fn feed_word(&mut self, mm_per_s: f64) -> String {
        let per_minute = mm_per_s * 60.0;
        if self.feed_rate == Some(per_minute) {
            return String::new();
        }
        self.feed_rate = Some(per_minute);
        format!(" F{per_minute:.0}")
    }

    fn print_speed(&self) -> f64 {
        match self.phase {
            Some(RunPhase::Skirt | RunPhase::Brim) => self.settings.first_layer_speed,
            _ if self.layer == 0 => self.settings.first_layer_speed,
            _ => self.settings.print_speed,
        }
    }

    fn start_block(&mut self) -> ToolpathResult<()> {
        let s = self.settings.clone();
        self.line(&format!(
            "; generated by conekit {}",
            env!("CARGO_PKG_VERSION")
        ))?;
        self.line(&format!(
            "; nozzle {:.0} C, bed {:.0} C, layer height {:.3} mm",
            s.nozzle_temperature, s.bed_temperature, s.layer_height
        ))?;
        self.line("G21 ; millimeters")?;
        self.line("G90 ; absolute positioning")?;
        self.line("M82 ; absolute extrusion")?;
        self.line(&format!("M140 S{:.0}", s.bed_temperature))?;
        self.line(&format!("M104 S{:.0}", s.nozzle_temperature))?;
        self.line("G28 ; home all axes")?;
        self.line(&format!("M190 S{:.0} ; wait for bed", s.bed_temperature))?;
        self.line(&format!("M109 S{:.0} ; wait for nozzle", s.nozzle_temperature))?;
        self.line("G92 E0")
    }

    /// Two parallel lines along the left edge to prime the nozzle
    fn priming_lines(&mut self) -> ToolpathResult<()> {
        let s = self.settings.clone();
        let mut extrusion =
            ExtrusionAccountant::new(s.filament_diameter, s.layer_height, s.wall_thickness)?;
        let y_start = s.bed_depth * 0.1;
        let y_end = s.bed_depth * 0.9;
        let corners = [
            Point3::new(PRIME_X, y_start, s.layer_height),
            Point3::new(PRIME_X, y_end, s.layer_height),
            Point3::new(PRIME_X + 0.5, y_end, s.layer_height),
            Point3::new(PRIME_X + 0.5, y_start, s.layer_height),
        ];

        self.line("; priming")?;
        let travel = self.feed_word(s.travel_speed);
        self.line(&format!(
            "G0 X{:.3} Y{:.3} Z{:.3}{travel}",
            corners[0].x, corners[0].y, corners[0].z
        ))?;
        for pair in corners.windows(2) {
            let e = extrusion.feed(&pair[0], &pair[1]);
            let feed = self.feed_word(s.first_layer_speed);
            self.line(&format!(
                "G1 X{:.3} Y{:.3} E{e:.5}{feed}",
                pair[1].x, pair[1].y
            ))?;
        }
        self.line("G92 E0")
    }

    fn end_block(&mut self) -> ToolpathResult<()> {
        self.line("; end")?;
        self.line("M107 ; fan off")?;
        self.line("M104 S0 ; nozzle off")?;
        self.line("M140 S0 ; bed off")?;
        self.line("M84 ; motors off")?;
        self.out.flush()?;
        Ok(())
    }

    fn enter_phase(&mut self, phase: RunPhase) -> ToolpathResult<()> {
        if self.finished || self.failed {
            return Err(ToolpathError::Sink(format!(
                "phase {phase} received after the run ended"
            )));
        }
        self.phase = Some(phase);
        match phase {
            RunPhase::Priming => {
                self.start_block()?;
                self.priming_lines()
            }
            RunPhase::LiftOff => {
                self.line("; LIFT-OFF")?;
                // Nothing extruded, nothing to pull back
                if self.last_e <= 0.0 || self.settings.retract_length <= 0.0 {
                    return Ok(());
                }
                let e = self.last_e - self.settings.retract_length;
                let feed = self.feed_word(self.settings.retract_speed);
                self.line(&format!("G1 E{e:.5}{feed} ; retract"))
            }
            RunPhase::Done => {
                self.end_block()?;
                self.finished = true;
                debug!(lines = self.lines, "G-code complete");
                Ok(())
            }
            other => self.line(&format!("; {other}")),
        }
    }
}

impl<W: Write> ToolpathSink for GcodeEmitter<W> {
    fn accept(&mut self, event: ToolpathEvent) -> ToolpathResult<()> {
        match event {
            ToolpathEvent::Phase(phase) => self.enter_phase(phase),
            ToolpathEvent::Move(to) => {
                let feed = self.feed_word(self.settings.travel_speed);
                self.line(&format!("G0 X{:.3} Y{:.3} Z{:.3}{feed}", to.x, to.y, to.z))
            }
            ToolpathEvent::Print { to, e } => {
                self.last_e = e;
                let feed = self.feed_word(self.print_speed());
                self.line(&format!(
                    "G1 X{:.3} Y{:.3} Z{:.3} E{e:.5}{feed}",
                    to.x, to.y, to.z
                ))
            }
            ToolpathEvent::LayerMarker(layer) => {
                self.layer = layer;
                self.line(&format!(";LAYER:{layer}"))?;
                self.line(&format!("M117 Layer {layer}"))
            }
            ToolpathEvent::FanSpeed(pwm) => self.line(&format!("M106 S{pwm}")),
            ToolpathEvent::Fail(reason) => {
                warn!(%reason, "writing aborted G-code");
                self.failed = true;
                self.line(&format!("; ABORTED: {reason}"))?;
                self.line("M104 S0")?;
                self.line("M140 S0")?;
                self.out.flush()?;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(events: Vec<ToolpathEvent>) -> String {
        let mut emitter = GcodeEmitter::new(Vec::new(), EmitterSettings::default());
        for event in events {
            emitter.accept(event).unwrap();
        }
        String::from_utf8(emitter.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_start_block_and_priming() {
        let gcode = render(vec![ToolpathEvent::Phase(RunPhase::Priming)]);
        assert!(gcode.contains("G21"));
        assert!(gcode.contains("M82"));
        assert!(gcode.contains("M109 S210"));
        assert!(gcode.contains("M190 S60"));
        assert!(gcode.contains("; priming"));
        assert!(gcode.trim_end().ends_with("G92 E0"));
    }

    #[test]
    fn test_moves_and_prints_formatting() {
        let gcode = render(vec![
            ToolpathEvent::Move(Point3::new(120.0, 110.0, 0.2)),
            ToolpathEvent::Print {
                to: Point3::new(119.99, 110.5, 0.2),
                e: 0.0123456,
            },
        ]);
        let lines: Vec<&str> = gcode.lines().collect();
        assert_eq!(lines[0], "G0 X120.000 Y110.000 Z0.200 F7200");
        assert_eq!(lines[1], "G1 X119.990 Y110.500 Z0.200 E0.01235 F900");
    }

    #[test]
    fn test_feed_rate_is_modal() {
        let gcode = render(vec![
            ToolpathEvent::Print {
                to: Point3::new(1.0, 0.0, 0.2),
                e: 0.1,
            },
            ToolpathEvent::Print {
                to: Point3::new(2.0, 0.0, 0.2),
                e: 0.2,
            },
        ]);
        assert_eq!(gcode.matches(" F").count(), 1);
    }

    #[test]
    fn test_first_layer_then_print_speed() {
        let gcode = render(vec![
            ToolpathEvent::LayerMarker(0),
            ToolpathEvent::Print {
                to: Point3::new(1.0, 0.0, 0.2),
                e: 0.1,
            },
            ToolpathEvent::LayerMarker(1),
            ToolpathEvent::Print {
                to: Point3::new(2.0, 0.0, 0.4),
                e: 0.2,
            },
        ]);
        assert!(gcode.contains(";LAYER:0\nM117 Layer 0\n"));
        assert!(gcode.contains("E0.10000 F900"));
        assert!(gcode.contains("E0.20000 F1800"));
    }

    #[test]
    fn test_lift_off_retracts_and_done_shuts_down() {
        let gcode = render(vec![
            ToolpathEvent::Print {
                to: Point3::new(1.0, 0.0, 0.2),
                e: 5.0,
            },
            ToolpathEvent::Phase(RunPhase::LiftOff),
            ToolpathEvent::Phase(RunPhase::Done),
        ]);
        assert!(gcode.contains("G1 E3.00000 F2100 ; retract"));
        assert!(gcode.contains("M104 S0"));
        assert!(gcode.contains("M84"));
    }

    #[test]
    fn test_lift_off_without_prints_skips_retract() {
        let mut emitter = GcodeEmitter::new(Vec::new(), EmitterSettings::default());
        emitter.accept(ToolpathEvent::Phase(RunPhase::LiftOff)).unwrap();
        assert_eq!(emitter.lines_written(), 1);
        emitter.accept(ToolpathEvent::Phase(RunPhase::Done)).unwrap();

        let gcode = String::from_utf8(emitter.into_inner().unwrap()).unwrap();
        assert!(gcode.contains("; LIFT-OFF"));
        assert!(!gcode.contains("retract"));
        assert!(!gcode.contains("E-"));
    }

    #[test]
    fn test_fan_and_fail() {
        let mut emitter = GcodeEmitter::new(Vec::new(), EmitterSettings::default());
        emitter.accept(ToolpathEvent::FanSpeed(170)).unwrap();
        emitter
            .accept(ToolpathEvent::Fail("Invalid shape: Bogus".to_string()))
            .unwrap();
        assert!(emitter.is_failed());
        assert!(!emitter.is_finished());
        assert!(emitter
            .accept(ToolpathEvent::Phase(RunPhase::Done))
            .is_err());
        let gcode = String::from_utf8(emitter.into_inner().unwrap()).unwrap();
        assert!(gcode.starts_with("M106 S170\n"));
        assert!(gcode.contains("; ABORTED: Invalid shape: Bogus"));
    }
}
