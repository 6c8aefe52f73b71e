//! Spiral walker
//!
//! Prints the cone as one continuous helix instead of stacked closed rings,
//! so there is no seam where one layer ends and the next begins. Height is a
//! pure function of progress around the helix:
//!
//! ```text
//! cone_z = layer_height * completed_turns + layer_height * spiral_angle / 360
//! ```
//!
//! The angular step is chosen from the radius at the current height so the
//! chord between consecutive points stays close to the print resolution.
//! As the radius shrinks towards the apex the angular step grows, up to one
//! full turn per step. Steps whose chord still exceeds the resolution (steep
//! profile sections) are shrunk until they fit, down to a minimum angle that
//! guarantees forward progress. A chord that is still too long at that point
//! (very steep tips) is split into straight pieces of at most the resolution.

use crate::error::{ToolpathError, ToolpathResult};
use crate::profile::ConeProfile;
use conekit_core::Point3;
use std::collections::VecDeque;
use std::f64::consts::PI;
use tracing::{debug, warn};

/// Largest angular step, reached when the radius is (near) zero at the apex
pub const MAX_ANGULAR_STEP_DEG: f64 = 360.0;

/// Smallest angular step; guarantees forward progress on steep profiles
pub const MIN_ANGULAR_STEP_DEG: f64 = 1e-3;

/// Chord refinement attempts per step
const MAX_REFINEMENTS: usize = 24;

/// Heights closer than this to the apex snap onto it
const APEX_SNAP: f64 = 1e-9;

/// Progress of the helical walk
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpiralCursor {
    /// Angle within the current turn, in `[0, 360)`
    pub spiral_angle: f64,
    /// Full turns completed so far
    pub completed_turns: u32,
    /// Height above the shoulder of the cone
    pub cone_z: f64,
}

impl SpiralCursor {
    /// Cursor at the shoulder, angle zero
    pub fn start() -> Self {
        Self {
            spiral_angle: 0.0,
            completed_turns: 0,
            cone_z: 0.0,
        }
    }

    /// Height implied by turns and angle
    pub fn height_for(completed_turns: u32, spiral_angle: f64, layer_height: f64) -> f64 {
        layer_height * completed_turns as f64 + layer_height * spiral_angle / 360.0
    }

    /// Cursor after turning by `step_deg`, wrapping into the next turn
    pub fn advanced(&self, step_deg: f64, layer_height: f64) -> Self {
        let mut spiral_angle = self.spiral_angle + step_deg;
        let mut completed_turns = self.completed_turns;
        while spiral_angle >= 360.0 {
            spiral_angle -= 360.0;
            completed_turns += 1;
        }
        Self {
            spiral_angle,
            completed_turns,
            cone_z: Self::height_for(completed_turns, spiral_angle, layer_height),
        }
    }
}

/// One point produced by the spiral walk
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpiralPoint {
    /// Machine position of the point
    pub position: Point3,
    /// Cone radius at this height
    pub radius: f64,
    /// Cursor after reaching this point
    pub cursor: SpiralCursor,
    /// Distance left to the apex
    pub remaining: f64,
    /// True if this step completed a turn
    pub wrapped: bool,
}

/// Walks the cone surface from the shoulder to the apex as a single helix
#[derive(Debug, Clone)]
pub struct SpiralWalker {
    profile: ConeProfile,
    center: (f64, f64),
    base_z: f64,
    layer_height: f64,
    resolution: f64,
    cursor: SpiralCursor,
    last: Option<Point3>,
    pending: VecDeque<SpiralPoint>,
    finished: bool,
    steps: usize,
    max_steps: usize,
    min_clamp_reported: bool,
    max_clamp_reported: bool,
}

impl SpiralWalker {
    /// Create a walker for `profile`, with the shoulder at height `base_z`.
    pub fn new(
        profile: ConeProfile,
        center: (f64, f64),
        base_z: f64,
        layer_height: f64,
        resolution: f64,
    ) -> ToolpathResult<Self> {
        if !(layer_height.is_finite() && layer_height > 0.0) {
            return Err(ToolpathError::invalid("layer_height", "must be positive"));
        }
        if !(resolution.is_finite() && resolution > 0.0) {
            return Err(ToolpathError::invalid("resolution", "must be positive"));
        }
        let turns = (profile.length() / layer_height).ceil() as usize + 1;
        let per_turn = (360.0 / MIN_ANGULAR_STEP_DEG) as usize;
        Ok(Self {
            profile,
            center,
            base_z,
            layer_height,
            resolution,
            cursor: SpiralCursor::start(),
            last: None,
            pending: VecDeque::new(),
            finished: false,
            steps: 0,
            max_steps: turns.saturating_mul(per_turn),
            min_clamp_reported: false,
            max_clamp_reported: false,
        })
    }

    /// Total height of the cone
    pub fn cone_height(&self) -> f64 {
        self.profile.length()
    }

    pub fn cursor(&self) -> SpiralCursor {
        self.cursor
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Radius of the cone at a given height above the shoulder
    pub fn radius_at_height(&self, cone_z: f64) -> f64 {
        self.profile.radius_at(self.profile.length() - cone_z)
    }

    /// Angular step that keeps the chord at the resolution for radius `radius`
    pub fn nominal_step(&self, radius: f64) -> f64 {
        let circumference = 2.0 * PI * radius;
        if circumference <= f64::EPSILON {
            return MAX_ANGULAR_STEP_DEG;
        }
        (360.0 / (circumference / self.resolution))
            .clamp(MIN_ANGULAR_STEP_DEG, MAX_ANGULAR_STEP_DEG)
    }

    /// Terminal cursor sitting exactly at the cone height
    fn apex_cursor(&self) -> SpiralCursor {
        let height = self.cone_height();
        let turns_exact = height / self.layer_height;
        let completed_turns =
            ((turns_exact + APEX_SNAP).floor() as u32).max(self.cursor.completed_turns);
        let spiral_angle = ((turns_exact - completed_turns as f64) * 360.0).max(0.0);
        SpiralCursor {
            spiral_angle,
            completed_turns,
            cone_z: height,
        }
    }

    fn point_for(&self, cursor: &SpiralCursor) -> (Point3, f64) {
        let radius = self.radius_at_height(cursor.cone_z);
        let position = Point3::on_circle(
            self.center,
            radius,
            cursor.spiral_angle,
            self.base_z + cursor.cone_z,
        );
        (position, radius)
    }

    fn emit(&mut self, cursor: SpiralCursor, wrapped: bool) -> SpiralPoint {
        let (position, radius) = self.point_for(&cursor);
        self.cursor = cursor;
        self.last = Some(position);
        SpiralPoint {
            position,
            radius,
            cursor,
            remaining: (self.cone_height() - cursor.cone_z).max(0.0),
            wrapped,
        }
    }

    /// Queue `pieces` evenly spaced points on the straight chord from the
    /// current point to `target` and return the first one.
    fn split_chord(&mut self, from: Point3, target: SpiralCursor, pieces: usize) -> SpiralPoint {
        let (to, _) = self.point_for(&target);
        let start = self.cursor;
        let sweep = (target.completed_turns - start.completed_turns) as f64 * 360.0
            + target.spiral_angle
            - start.spiral_angle;
        let height = self.cone_height();

        let mut turns = start.completed_turns;
        for i in 1..=pieces {
            let t = i as f64 / pieces as f64;
            let (cursor, position) = if i == pieces {
                (target, to)
            } else {
                (
                    start.advanced(sweep * t, self.layer_height),
                    Point3::new(
                        from.x * (1.0 - t) + to.x * t,
                        from.y * (1.0 - t) + to.y * t,
                        from.z * (1.0 - t) + to.z * t,
                    ),
                )
            };
            self.pending.push_back(SpiralPoint {
                position,
                radius: (position.x - self.center.0).hypot(position.y - self.center.1),
                cursor,
                remaining: (height - cursor.cone_z).max(0.0),
                wrapped: cursor.completed_turns > turns,
            });
            turns = turns.max(cursor.completed_turns);
        }

        // Non-empty: `pieces` is at least one
        self.next_pending().unwrap_or_else(|| self.emit(target, false))
    }

    fn next_pending(&mut self) -> Option<SpiralPoint> {
        let point = self.pending.pop_front()?;
        self.cursor = point.cursor;
        self.last = Some(point.position);
        Some(point)
    }

    /// Advance the walk by one chord.
    ///
    /// The first call returns the starting point at the shoulder; the last
    /// point returned sits exactly at the cone height.
    pub fn next_point(&mut self) -> ToolpathResult<Option<SpiralPoint>> {
        if self.finished {
            return Ok(None);
        }
        if let Some(point) = self.next_pending() {
            return Ok(Some(point));
        }
        let Some(last) = self.last else {
            return Ok(Some(self.emit(SpiralCursor::start(), false)));
        };

        let height = self.cone_height();
        if self.cursor.cone_z >= height {
            self.finished = true;
            return Ok(None);
        }

        self.steps += 1;
        if self.steps > self.max_steps {
            return Err(ToolpathError::NonTerminatingSpiral { steps: self.steps });
        }

        let radius = self.radius_at_height(self.cursor.cone_z);
        let mut step = self.nominal_step(radius);
        if step >= MAX_ANGULAR_STEP_DEG && !self.max_clamp_reported {
            debug!(radius, cone_z = self.cursor.cone_z, "angular step clamped near apex");
            self.max_clamp_reported = true;
        }

        let to_apex = (height - self.cursor.cone_z) / self.layer_height * 360.0;
        let mut candidate = self.cursor;
        for _ in 0..MAX_REFINEMENTS {
            candidate = if step >= to_apex {
                self.apex_cursor()
            } else {
                let next = self.cursor.advanced(step, self.layer_height);
                if height - next.cone_z <= APEX_SNAP {
                    self.apex_cursor()
                } else {
                    next
                }
            };

            let (position, _) = self.point_for(&candidate);
            let chord = last.distance_to(&position);
            if chord <= self.resolution {
                break;
            }
            if step <= MIN_ANGULAR_STEP_DEG {
                if !self.min_clamp_reported {
                    warn!(
                        chord,
                        resolution = self.resolution,
                        cone_z = candidate.cone_z,
                        "spiral chord exceeds resolution at minimum angular step, splitting it"
                    );
                    self.min_clamp_reported = true;
                }
                break;
            }
            step = (step * 0.9 * self.resolution / chord).max(MIN_ANGULAR_STEP_DEG);
        }

        let (target, _) = self.point_for(&candidate);
        let chord = last.distance_to(&target);
        if chord > self.resolution {
            let pieces = (chord / self.resolution).ceil() as usize;
            debug!(chord, pieces, cone_z = candidate.cone_z, "splitting steep spiral chord");
            return Ok(Some(self.split_chord(last, candidate, pieces)));
        }

        let wrapped = candidate.completed_turns > self.cursor.completed_turns;
        Ok(Some(self.emit(candidate, wrapped)))
    }
}

impl Iterator for SpiralWalker {
    type Item = ToolpathResult<SpiralPoint>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_point().transpose()
    }
}
