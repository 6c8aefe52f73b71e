// Job file tests
// Round trips through JSON and TOML on disk, and rejection of bad files.

use conekit_settings::{JobConfig, SettingsError};
use conekit_toolpath::{ShapeKind, ToolpathError};
use std::fs;
use tempfile::TempDir;

fn sample_job() -> JobConfig {
    let mut job = JobConfig::new();
    job.cone.shape = "tangent_ogive".to_string();
    job.cone.diameter = 30.0;
    job.cone.height_ratio = 2.5;
    job.print.brim_width = Some(5.0);
    job
}

#[test]
fn test_json_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cone.json");

    let job = sample_job();
    job.save_to_file(&path).unwrap();
    let loaded = JobConfig::load_from_file(&path).unwrap();
    assert_eq!(loaded, job);
}

#[test]
fn test_toml_round_trip_without_brim() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cone.toml");

    let mut job = sample_job();
    job.print.brim_width = None;
    job.save_to_file(&path).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("[cone]"));
    assert!(!text.contains("brim_width"));

    let loaded = JobConfig::load_from_file(&path).unwrap();
    assert_eq!(loaded, job);
    assert_eq!(
        loaded.normalize().unwrap().cone.shape,
        ShapeKind::TangentOgive
    );
}

#[test]
fn test_centimeter_job_from_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cm.toml");
    fs::write(
        &path,
        r#"
[units]
length = "cm"

[cone]
shape = "conic"
diameter = 2.1
wall_thickness = 0.1
height_ratio = 2.75
base_height = 0.0

[print]
layer_height = 0.02
resolution = 0.05
filament_diameter = 0.175

[machine]
bed_width = 22.0
bed_depth = 22.0
"#,
    )
    .unwrap();

    let job = JobConfig::load_from_file(&path).unwrap();
    let cone = job.normalize().unwrap().cone;
    assert!((cone.wall_radius() - 10.0).abs() < 1e-9);
    assert!((cone.cone_height() - 55.0).abs() < 1e-9);
    assert_eq!(cone.cylinder_layer_count(), 0);
    assert!((cone.bed_width - 220.0).abs() < 1e-9);
}

#[test]
fn test_bogus_shape_rejected_on_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bogus.json");
    fs::write(&path, r#"{ "cone": { "shape": "Bogus" } }"#).unwrap();

    match JobConfig::load_from_file(&path) {
        Err(SettingsError::Toolpath(ToolpathError::InvalidShape(id))) => assert_eq!(id, "Bogus"),
        other => panic!("expected InvalidShape, got {other:?}"),
    }
}

#[test]
fn test_unsupported_extension() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cone.yaml");
    fs::write(&path, "cone: {}").unwrap();
    assert!(matches!(
        JobConfig::load_from_file(&path),
        Err(SettingsError::UnsupportedFormat(_))
    ));
    assert!(matches!(
        JobConfig::new().save_to_file(&path),
        Err(SettingsError::UnsupportedFormat(_))
    ));
}

#[test]
fn test_malformed_json() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "{ \"cone\": ").unwrap();
    assert!(matches!(
        JobConfig::load_from_file(&path),
        Err(SettingsError::Json(_))
    ));
}
