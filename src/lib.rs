//! # ConeKit
//!
//! Spiral-vase G-code generator for 3D printing rocket nose cones.
//!
//! ## Architecture
//!
//! ConeKit is organized as a workspace with multiple crates:
//!
//! 1. **conekit-core** - Points, units, unit errors
//! 2. **conekit-toolpath** - Profiles, walkers, extrusion, run state machine, G-code emitter
//! 3. **conekit-settings** - Job files, unit normalization, validation
//! 4. **conekit** - Command-line binary that ties the crates together
//!
//! ## Pipeline
//!
//! A job file is loaded and normalized to millimeters and Celsius, the
//! builder walks skirt or brim, cylindrical base and spiral cone, and the
//! emitter streams the events as Marlin G-code. Files are written to a
//! temporary file next to the target and only moved into place once the
//! run has completed.

use anyhow::Context;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

pub use conekit_core::{LengthUnit, Point3, TemperatureUnit};
pub use conekit_settings::{JobConfig, NormalizedJob, SettingsError};
pub use conekit_toolpath::{
    ConeParameters, EmitterSettings, GcodeEmitter, RunPhase, RunSummary, ShapeKind,
    ToolpathBuilder, ToolpathError, ToolpathEvent, ToolpathSink,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging
///
/// Sets up structured logging with:
/// - stderr output, so G-code can be written to stdout
/// - RUST_LOG environment variable support, overriding `verbosity`
/// - JSON lines instead of pretty output when `json` is set
pub fn init_logging(verbosity: u8, json: bool) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        let fmt_layer = fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .context("failed to initialize logging")?;
    } else {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true)
            .with_line_number(true)
            .pretty();

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .context("failed to initialize logging")?;
    }

    Ok(())
}

/// Run a job into any sink.
///
/// A job that cannot be normalized still produces a single `Fail` event, so
/// the sink never sees a partial toolpath without a reason.
pub fn run_job<S: ToolpathSink>(job: &JobConfig, sink: &mut S) -> anyhow::Result<RunSummary> {
    let normalized = match job.normalize() {
        Ok(normalized) => normalized,
        Err(err) => {
            let _ = sink.accept(ToolpathEvent::Fail(err.to_string()));
            return Err(err).context("invalid job");
        }
    };
    run_normalized(normalized.cone, sink)
}

/// Render a job as G-code into `out`
pub fn write_gcode<W: Write>(job: &JobConfig, out: W) -> anyhow::Result<RunSummary> {
    let normalized = job.normalize().context("invalid job")?;
    let mut emitter = GcodeEmitter::new(out, normalized.emitter);
    let summary = run_normalized(normalized.cone, &mut emitter)?;
    emitter.into_inner().context("failed to flush G-code")?;
    Ok(summary)
}

/// Render a job as G-code into the file at `path`.
///
/// The G-code goes to a temporary file in the same directory, which only
/// replaces `path` after the run completes. A failed run leaves no file.
pub fn generate_to_path(job: &JobConfig, path: &Path) -> anyhow::Result<RunSummary> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temporary file in {}", dir.display()))?;

    let summary = write_gcode(job, BufWriter::new(temp.as_file_mut()))?;

    temp.persist(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "G-code written");
    Ok(summary)
}

fn run_normalized<S: ToolpathSink>(
    cone: ConeParameters,
    sink: &mut S,
) -> anyhow::Result<RunSummary> {
    let builder = match ToolpathBuilder::new(cone) {
        Ok(builder) => builder,
        Err(err) => {
            let _ = sink.accept(ToolpathEvent::Fail(err.to_string()));
            return Err(err).context("invalid cone parameters");
        }
    };
    let summary = builder.run(sink).context("toolpath generation failed")?;
    info!(
        layers = summary.layers,
        filament_mm = summary.filament_length_mm,
        "toolpath generated"
    );
    Ok(summary)
}
