//! Toolpath builder
//!
//! Drives a complete run through its stages:
//!
//! ```text
//! Priming -> Skirt | Brim -> Cylinder (0..n layers) -> Cone (spiral) -> LiftOff -> Done
//! ```
//!
//! There are no backward transitions. Any error aborts the run, emits a
//! single `Fail` event and leaves the output invalid as a whole.

use crate::circle::CircleWalker;
use crate::error::{ToolpathError, ToolpathResult};
use crate::event::{RunPhase, ToolpathEvent, ToolpathSink};
use crate::extrusion::ExtrusionAccountant;
use crate::profile::{ConeProfile, ShapeKind};
use crate::spiral::SpiralWalker;
use conekit_core::Point3;
use tracing::{debug, error, info, warn};

/// Skirt ring offsets from the wall radius, outermost first
pub const SKIRT_OFFSETS_MM: [f64; 2] = [8.0, 6.0];

/// Brim ring pitch as a fraction of the wall thickness
pub const BRIM_PITCH_FACTOR: f64 = 0.7;

/// Height the nozzle rises after the last printed point
pub const LIFT_HEIGHT_MM: f64 = 10.0;

/// Fan duty for the first global layers; held at the last value afterwards
pub const FAN_RAMP: [u8; 3] = [85, 170, 255];

/// Normalized inputs of a run (millimeters)
#[derive(Debug, Clone, PartialEq)]
pub struct ConeParameters {
    /// Nose-cone shape
    pub shape: ShapeKind,
    /// Shape parameter (`C`, `K` or `n`)
    pub shape_parameter: f64,
    /// Outer diameter of the cone shoulder and cylindrical base
    pub diameter: f64,
    /// Cone height divided by wall diameter
    pub height_ratio: f64,
    /// Printed wall thickness (bead width)
    pub wall_thickness: f64,
    /// Height of the cylindrical base below the cone
    pub base_height: f64,
    /// Layer height
    pub layer_height: f64,
    /// Maximum chord length
    pub resolution: f64,
    /// Filament diameter
    pub filament_diameter: f64,
    /// Brim width; a skirt is printed when absent
    pub brim_width: Option<f64>,
    /// Build plate width, used to center the part
    pub bed_width: f64,
    /// Build plate depth, used to center the part
    pub bed_depth: f64,
}

impl Default for ConeParameters {
    fn default() -> Self {
        Self {
            shape: ShapeKind::Haack,
            shape_parameter: 0.0,
            diameter: 40.0,
            height_ratio: 3.0,
            wall_thickness: 0.8,
            base_height: 10.0,
            layer_height: 0.2,
            resolution: 0.5,
            filament_diameter: 1.75,
            brim_width: None,
            bed_width: 220.0,
            bed_depth: 220.0,
        }
    }
}

impl ConeParameters {
    /// Check every numeric input and the shape parameter domain
    pub fn validate(&self) -> ToolpathResult<()> {
        let positive = [
            ("diameter", self.diameter),
            ("height_ratio", self.height_ratio),
            ("wall_thickness", self.wall_thickness),
            ("layer_height", self.layer_height),
            ("resolution", self.resolution),
            ("filament_diameter", self.filament_diameter),
            ("bed_width", self.bed_width),
            ("bed_depth", self.bed_depth),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ToolpathError::invalid(name, format!("must be positive, got {value}")));
            }
        }
        if !(self.base_height.is_finite() && self.base_height >= 0.0) {
            return Err(ToolpathError::invalid("base_height", "must not be negative"));
        }
        if let Some(brim) = self.brim_width {
            if !(brim.is_finite() && brim >= 0.0) {
                return Err(ToolpathError::invalid("brim_width", "must not be negative"));
            }
        }
        if self.wall_thickness >= self.diameter {
            return Err(ToolpathError::invalid(
                "wall_thickness",
                "must be smaller than the diameter",
            ));
        }
        self.shape.validate_parameter(self.shape_parameter)
    }

    /// Radius of the wall centerline
    pub fn wall_radius(&self) -> f64 {
        (self.diameter - self.wall_thickness) / 2.0
    }

    /// Height of the cone above the cylindrical base
    pub fn cone_height(&self) -> f64 {
        self.height_ratio * self.wall_radius() * 2.0
    }

    /// Number of helical layers in the cylindrical base
    pub fn cylinder_layer_count(&self) -> u32 {
        (self.base_height / self.layer_height).round() as u32
    }

    /// Z of the cone shoulder, where the spiral starts
    pub fn shoulder_z(&self) -> f64 {
        self.layer_height * (self.cylinder_layer_count() + 1) as f64
    }

    /// Center of the build plate
    pub fn center(&self) -> (f64, f64) {
        (self.bed_width / 2.0, self.bed_depth / 2.0)
    }

    /// Distance between brim ring centerlines
    pub fn brim_pitch(&self) -> f64 {
        BRIM_PITCH_FACTOR * self.wall_thickness
    }

    /// Number of brim rings, `None` when no brim is configured
    pub fn brim_ring_count(&self) -> Option<u32> {
        self.brim_width.map(|width| {
            ((width / 2.0 + self.wall_thickness / 2.0) / self.brim_pitch()).floor() as u32
        })
    }

    /// The cone profile bound to these dimensions
    pub fn profile(&self) -> ToolpathResult<ConeProfile> {
        ConeProfile::new(
            self.shape,
            self.cone_height(),
            self.wall_radius(),
            self.shape_parameter,
        )
    }

    /// Estimated number of global layers (cylinder plus spiral turns)
    pub fn estimated_layers(&self) -> u32 {
        self.cylinder_layer_count() + (self.cone_height() / self.layer_height).ceil() as u32
    }
}

/// Statistics of a completed run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    /// Global layers started
    pub layers: u32,
    /// Helical layers in the cylindrical base
    pub cylinder_layers: u32,
    /// Printing moves emitted
    pub print_moves: usize,
    /// Travel moves emitted
    pub travel_moves: usize,
    /// Total printed path length
    pub path_length_mm: f64,
    /// Final cumulative filament feed
    pub filament_length_mm: f64,
    /// Filament volume consumed
    pub filament_volume_mm3: f64,
    /// Height of the cone above the base
    pub cone_height_mm: f64,
}

/// Mutable cursor of one run: position, cumulative feed and counters
#[derive(Debug)]
struct ToolState {
    position: Option<Point3>,
    extrusion: ExtrusionAccountant,
    resolution: f64,
    last_layer: Option<u32>,
    summary: RunSummary,
}

impl ToolState {
    fn new(params: &ConeParameters) -> ToolpathResult<Self> {
        Ok(Self {
            position: None,
            extrusion: ExtrusionAccountant::new(
                params.filament_diameter,
                params.layer_height,
                params.wall_thickness,
            )?,
            resolution: params.resolution,
            last_layer: None,
            summary: RunSummary {
                cylinder_layers: params.cylinder_layer_count(),
                cone_height_mm: params.cone_height(),
                ..Default::default()
            },
        })
    }

    fn travel_to<S: ToolpathSink>(&mut self, sink: &mut S, to: Point3) -> ToolpathResult<()> {
        if self.position == Some(to) {
            return Ok(());
        }
        self.position = Some(to);
        self.summary.travel_moves += 1;
        sink.accept(ToolpathEvent::Move(to))
    }

    fn print_to<S: ToolpathSink>(
        &mut self,
        sink: &mut S,
        to: Point3,
        remaining: Option<f64>,
    ) -> ToolpathResult<()> {
        let Some(from) = self.position else {
            return self.travel_to(sink, to);
        };
        let distance = from.distance_to(&to);
        if distance <= f64::EPSILON {
            return Ok(());
        }
        if distance > self.resolution + 1e-6 {
            debug!(distance, resolution = self.resolution, "printed chord longer than resolution");
        }
        let e = match remaining {
            Some(remaining) => self.extrusion.feed_tapered(&from, &to, remaining),
            None => self.extrusion.feed(&from, &to),
        };
        self.position = Some(to);
        self.summary.print_moves += 1;
        self.summary.path_length_mm += distance;
        sink.accept(ToolpathEvent::Print { to, e })
    }

    fn enter_layer<S: ToolpathSink>(&mut self, sink: &mut S, index: u32) -> ToolpathResult<()> {
        if self.last_layer.is_some_and(|last| index <= last) {
            return Ok(());
        }
        self.last_layer = Some(index);
        self.summary.layers = index + 1;
        sink.accept(ToolpathEvent::LayerMarker(index))?;
        if let Some(&pwm) = FAN_RAMP.get(index as usize) {
            sink.accept(ToolpathEvent::FanSpeed(pwm))?;
        }
        Ok(())
    }

    fn finish(mut self) -> RunSummary {
        self.summary.filament_length_mm = self.extrusion.total();
        self.summary.filament_volume_mm3 = self.extrusion.volume();
        self.summary
    }
}

/// Synthesizes the full toolpath of a nose cone
#[derive(Debug, Clone)]
pub struct ToolpathBuilder {
    params: ConeParameters,
    profile: ConeProfile,
}

impl ToolpathBuilder {
    /// Validate parameters and prepare a builder; nothing is emitted yet
    pub fn new(params: ConeParameters) -> ToolpathResult<Self> {
        params.validate()?;
        let profile = params.profile()?;

        let (cx, cy) = params.center();
        let reach = params.wall_radius() + params.wall_thickness / 2.0 + outer_ring_offset(&params);
        if cx - reach < 0.0 || cy - reach < 0.0 {
            warn!(
                reach,
                bed_width = params.bed_width,
                bed_depth = params.bed_depth,
                "part does not fit on the build plate"
            );
        }

        Ok(Self { params, profile })
    }

    pub fn params(&self) -> &ConeParameters {
        &self.params
    }

    pub fn profile(&self) -> &ConeProfile {
        &self.profile
    }

    /// Run all stages into `sink`.
    ///
    /// On failure a `Fail` event is sent before the error is returned.
    pub fn run<S: ToolpathSink>(&self, sink: &mut S) -> ToolpathResult<RunSummary> {
        match self.run_stages(sink) {
            Ok(summary) => Ok(summary),
            Err(err) => {
                error!(%err, "toolpath run aborted");
                // The sink may be the thing that failed; the original error wins.
                let _ = sink.accept(ToolpathEvent::Fail(err.to_string()));
                Err(err)
            }
        }
    }

    /// Run all stages and collect the events
    pub fn events(&self) -> ToolpathResult<Vec<ToolpathEvent>> {
        let mut events = Vec::new();
        self.run(&mut events)?;
        Ok(events)
    }

    fn run_stages<S: ToolpathSink>(&self, sink: &mut S) -> ToolpathResult<RunSummary> {
        let p = &self.params;
        let mut state = ToolState::new(p)?;
        info!(
            shape = %p.shape,
            diameter = p.diameter,
            cone_height = p.cone_height(),
            cylinder_layers = p.cylinder_layer_count(),
            "starting toolpath run"
        );

        info!("priming");
        sink.accept(ToolpathEvent::Phase(RunPhase::Priming))?;

        self.first_layer_rings(sink, &mut state)?;
        self.cylinder(sink, &mut state)?;
        self.cone(sink, &mut state)?;
        self.lift_off(sink, &mut state)?;

        sink.accept(ToolpathEvent::Phase(RunPhase::Done))?;
        let summary = state.finish();
        info!(
            layers = summary.layers,
            print_moves = summary.print_moves,
            filament_mm = summary.filament_length_mm,
            "toolpath complete"
        );
        Ok(summary)
    }

    fn first_layer_rings<S: ToolpathSink>(
        &self,
        sink: &mut S,
        state: &mut ToolState,
    ) -> ToolpathResult<()> {
        let p = &self.params;
        let r = p.wall_radius();
        let z = p.layer_height;

        let (phase, radii): (RunPhase, Vec<f64>) = match p.brim_ring_count() {
            Some(rings) if rings > 0 => {
                let pitch = p.brim_pitch();
                (
                    RunPhase::Brim,
                    (1..=rings).rev().map(|k| r + k as f64 * pitch).collect(),
                )
            }
            Some(_) => {
                warn!("brim width too small for a single ring, printing a skirt instead");
                (RunPhase::Skirt, SKIRT_OFFSETS_MM.iter().map(|o| r + o).collect())
            }
            None => (RunPhase::Skirt, SKIRT_OFFSETS_MM.iter().map(|o| r + o).collect()),
        };

        info!(%phase, rings = radii.len(), "first layer rings");
        sink.accept(ToolpathEvent::Phase(phase))?;
        state.enter_layer(sink, 0)?;

        for radius in radii {
            let walker = CircleWalker::new(p.center(), radius, p.resolution);
            state.travel_to(sink, walker.point_at(0.0, z))?;
            for point in walker.full_circle(0.0, z) {
                state.print_to(sink, point, None)?;
            }
        }
        Ok(())
    }

    fn cylinder<S: ToolpathSink>(&self, sink: &mut S, state: &mut ToolState) -> ToolpathResult<()> {
        let p = &self.params;
        let layers = p.cylinder_layer_count();
        let walker = CircleWalker::new(p.center(), p.wall_radius(), p.resolution);

        state.travel_to(sink, walker.point_at(0.0, p.layer_height))?;
        if layers == 0 {
            return Ok(());
        }

        info!(layers, radius = walker.radius(), "cylindrical base");
        sink.accept(ToolpathEvent::Phase(RunPhase::Cylinder))?;
        for layer in 0..layers {
            state.enter_layer(sink, layer)?;
            let z_start = p.layer_height * (layer + 1) as f64;
            let z_end = z_start + p.layer_height;
            debug!(layer, z_start, "cylinder layer");
            for point in walker.helix_turn(0.0, z_start, z_end) {
                state.print_to(sink, point, None)?;
            }
        }
        Ok(())
    }

    fn cone<S: ToolpathSink>(&self, sink: &mut S, state: &mut ToolState) -> ToolpathResult<()> {
        let p = &self.params;
        let first_layer = p.cylinder_layer_count();
        let walker = SpiralWalker::new(
            self.profile,
            p.center(),
            p.shoulder_z(),
            p.layer_height,
            p.resolution,
        )?;

        info!(
            shape = %self.profile.shape(),
            parameter = self.profile.parameter(),
            base_radius = self.profile.base_radius(),
            height = walker.cone_height(),
            "spiral cone"
        );
        sink.accept(ToolpathEvent::Phase(RunPhase::Cone))?;
        state.enter_layer(sink, first_layer)?;

        let mut started = false;
        for point in walker {
            let point = point?;
            if !started {
                state.travel_to(sink, point.position)?;
                started = true;
                continue;
            }
            if point.wrapped {
                let layer = first_layer + point.cursor.completed_turns;
                if point.cursor.completed_turns % 25 == 0 {
                    debug!(layer, cone_z = point.cursor.cone_z, radius = point.radius, "spiral progress");
                }
                state.enter_layer(sink, layer)?;
            }
            state.print_to(sink, point.position, Some(point.remaining))?;
        }
        Ok(())
    }

    fn lift_off<S: ToolpathSink>(&self, sink: &mut S, state: &mut ToolState) -> ToolpathResult<()> {
        info!("lift-off");
        sink.accept(ToolpathEvent::Phase(RunPhase::LiftOff))?;
        let Some(last) = state.position else {
            return Ok(());
        };
        let raised = last.with_z(last.z + LIFT_HEIGHT_MM);
        state.travel_to(sink, raised)?;
        state.travel_to(sink, Point3::new(0.0, self.params.bed_depth, raised.z))
    }
}

fn outer_ring_offset(params: &ConeParameters) -> f64 {
    match params.brim_ring_count() {
        Some(rings) if rings > 0 => rings as f64 * params.brim_pitch(),
        _ => SKIRT_OFFSETS_MM[0],
    }
}
