//! ConeKit CLI
//!
//! Usage:
//!   conekit generate <JOB> [-o <OUTPUT>]
//!   conekit check <JOB>
//!   conekit init <PATH>

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use conekit::{
    generate_to_path, init_logging, write_gcode, JobConfig, LengthUnit, RunSummary, BUILD_DATE,
    VERSION,
};
use conekit_core::format_length;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use tracing::info;

/// Spiral-vase G-code generator for rocket nose cones
#[derive(Parser, Debug)]
#[command(name = "conekit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Log as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate G-code for a job file
    Generate {
        /// Job file (.json or .toml)
        #[arg(value_name = "JOB")]
        job: PathBuf,

        /// Output G-code file (default: stdout)
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,
    },

    /// Validate a job file and show the derived geometry
    Check {
        /// Job file (.json or .toml)
        #[arg(value_name = "JOB")]
        job: PathBuf,
    },

    /// Write a job file with default values
    Init {
        /// Path of the new job file (.json or .toml)
        #[arg(value_name = "PATH")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_json)?;
    info!(version = VERSION, build_date = BUILD_DATE, "conekit starting");

    match cli.command {
        Commands::Generate { job, output } => generate(&job, output.as_deref()),
        Commands::Check { job } => check(&job),
        Commands::Init { path, force } => init(&path, force),
    }
}

fn load(path: &Path) -> Result<JobConfig> {
    JobConfig::load_from_file(path).with_context(|| format!("failed to load {}", path.display()))
}

fn generate(job_path: &Path, output: Option<&Path>) -> Result<()> {
    let job = load(job_path)?;
    let summary = match output {
        Some(path) => generate_to_path(&job, path)?,
        None => write_gcode(&job, BufWriter::new(io::stdout().lock()))?,
    };
    print_summary(&summary, job.length_unit()?);
    Ok(())
}

fn print_summary(summary: &RunSummary, unit: LengthUnit) {
    eprintln!("Layers:          {}", summary.layers);
    eprintln!("Cylinder layers: {}", summary.cylinder_layers);
    eprintln!("Cone height:     {}", format_length(summary.cone_height_mm, unit));
    eprintln!("Print moves:     {}", summary.print_moves);
    eprintln!("Travel moves:    {}", summary.travel_moves);
    eprintln!("Path length:     {}", format_length(summary.path_length_mm, unit));
    eprintln!("Filament:        {:.1} mm", summary.filament_length_mm);
    eprintln!("Filament volume: {:.2} cm3", summary.filament_volume_mm3 / 1000.0);
}

fn check(job_path: &Path) -> Result<()> {
    let job = load(job_path)?;
    let unit = job.length_unit()?;
    let cone = job.normalize()?.cone;

    println!("Job:             {}", job_path.display());
    println!("Shape:           {} ({})", cone.shape, cone.shape_parameter);
    println!("Wall radius:     {}", format_length(cone.wall_radius(), unit));
    println!("Cone height:     {}", format_length(cone.cone_height(), unit));
    println!("Cylinder layers: {}", cone.cylinder_layer_count());
    match cone.brim_ring_count() {
        Some(rings) if rings > 0 => println!("Brim rings:      {rings}"),
        _ => println!("Skirt rings:     2"),
    }
    println!("Layers (est.):   {}", cone.estimated_layers());
    Ok(())
}

fn init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    JobConfig::new()
        .save_to_file(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}
