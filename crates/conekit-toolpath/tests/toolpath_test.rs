use conekit_core::Point3;
use conekit_toolpath::{
    CircleWalker, ConeParameters, ConeProfile, EmitterSettings, GcodeEmitter, RunPhase, ShapeKind,
    SpiralWalker, ToolpathBuilder, ToolpathError, ToolpathEvent,
};
use proptest::prelude::*;

fn conic_cone() -> ConeParameters {
    ConeParameters {
        shape: ShapeKind::Conic,
        shape_parameter: 0.0,
        diameter: 21.0,
        height_ratio: 2.75,
        wall_thickness: 1.0,
        base_height: 0.0,
        layer_height: 0.2,
        resolution: 0.5,
        filament_diameter: 1.75,
        brim_width: None,
        bed_width: 220.0,
        bed_depth: 220.0,
    }
}

fn tuples(events: &[ToolpathEvent]) -> Vec<(f64, f64, f64, f64)> {
    events
        .iter()
        .filter_map(|e| match e {
            ToolpathEvent::Print { to, e } => Some((to.x, to.y, to.z, *e)),
            _ => None,
        })
        .collect()
}

#[test]
fn test_conic_end_to_end() {
    let builder = ToolpathBuilder::new(conic_cone()).unwrap();
    assert_eq!(builder.params().cylinder_layer_count(), 0);

    let profile = *builder.profile();
    let points: Vec<_> = SpiralWalker::new(profile, (110.0, 110.0), 0.2, 0.2, 0.5)
        .unwrap()
        .map(|p| p.unwrap())
        .collect();
    let first = points.first().unwrap();
    let last = points.last().unwrap();
    assert_eq!(first.cursor.cone_z, 0.0);
    assert!((first.radius - 10.0).abs() < 1e-9);
    assert_eq!(last.cursor.cone_z, 55.0);
    assert!(last.radius < 1e-6);

    let events = builder.events().unwrap();
    assert_eq!(events.last(), Some(&ToolpathEvent::Phase(RunPhase::Done)));
    assert!(!events.iter().any(|e| matches!(e, ToolpathEvent::Fail(_))));

    // The last printed point is the apex, centered on the plate
    let (x, y, z, _) = *tuples(&events).last().unwrap();
    assert!((x - 110.0).abs() < 1e-6);
    assert!((y - 110.0).abs() < 1e-6);
    assert!((z - 55.2).abs() < 1e-9);
}

#[test]
fn test_runs_are_deterministic() {
    let params = ConeParameters {
        shape: ShapeKind::TangentOgive,
        base_height: 1.0,
        brim_width: Some(3.0),
        ..conic_cone()
    };
    let a = ToolpathBuilder::new(params.clone()).unwrap().events().unwrap();
    let b = ToolpathBuilder::new(params).unwrap().events().unwrap();
    assert_eq!(tuples(&a), tuples(&b));
    assert_eq!(a, b);
}

#[test]
fn test_unknown_shape_fails_before_printing() {
    let err = "Bogus".parse::<ShapeKind>().unwrap_err();
    assert_eq!(err, ToolpathError::InvalidShape("Bogus".to_string()));
    assert!(err.is_validation_error());
}

#[test]
fn test_every_shape_completes() {
    for shape in ShapeKind::ALL {
        let shape_parameter = match shape {
            ShapeKind::Haack => 1.0 / 3.0,
            ShapeKind::Parabolic => 0.75,
            ShapeKind::PowerSeries => 0.5,
            _ => 0.0,
        };
        let params = ConeParameters {
            shape,
            shape_parameter,
            height_ratio: 1.5,
            base_height: 0.6,
            ..conic_cone()
        };
        let summary = ToolpathBuilder::new(params)
            .unwrap()
            .run(&mut Vec::new())
            .unwrap();
        assert_eq!(summary.cylinder_layers, 3, "{shape}");
        assert!(summary.filament_length_mm > 0.0, "{shape}");
        assert!(summary.layers >= 3 + 150, "{shape}");
    }
}

#[test]
fn test_steep_power_series_tip_stays_within_resolution() {
    let mut params = conic_cone();
    params.shape = ShapeKind::PowerSeries;
    params.shape_parameter = 0.01;
    let events = ToolpathBuilder::new(params).unwrap().events().unwrap();
    assert_eq!(events.last(), Some(&ToolpathEvent::Phase(RunPhase::Done)));

    let mut in_cone = false;
    let mut last: Option<Point3> = None;
    let mut prints = 0;
    for event in &events {
        match event {
            ToolpathEvent::Phase(phase) => in_cone = *phase == RunPhase::Cone,
            ToolpathEvent::Move(to) if in_cone => last = Some(*to),
            ToolpathEvent::Print { to, .. } if in_cone => {
                let from = last.unwrap();
                let chord = from.distance_to(to);
                assert!(chord <= 0.5 + 1e-9, "chord {chord} ending at {to}");
                last = Some(*to);
                prints += 1;
            }
            _ => {}
        }
    }
    assert!(prints > 0);
    let apex = last.unwrap();
    assert!((apex.x - 110.0).abs() < 1e-6);
    assert!((apex.z - 55.2).abs() < 1e-9);
}

#[test]
fn test_doubled_wall_doubles_cylinder_feed() {
    let cylinder_feed = |wall: f64| {
        let params = ConeParameters {
            wall_thickness: wall,
            diameter: 20.0 + wall,
            base_height: 2.0,
            ..conic_cone()
        };
        let events = ToolpathBuilder::new(params).unwrap().events().unwrap();
        let mut in_cylinder = false;
        let mut first = None;
        let mut last = 0.0;
        for event in &events {
            match event {
                ToolpathEvent::Phase(phase) => in_cylinder = *phase == RunPhase::Cylinder,
                ToolpathEvent::Print { e, .. } if in_cylinder => {
                    if first.is_none() {
                        first = Some(*e);
                    }
                    last = *e;
                }
                _ => {}
            }
        }
        last - first.unwrap()
    };
    let thin = cylinder_feed(1.0);
    let thick = cylinder_feed(2.0);
    assert!((thick / thin - 2.0).abs() < 1e-9);
}

#[test]
fn test_gcode_emitter_renders_full_run() {
    let builder = ToolpathBuilder::new(ConeParameters {
        base_height: 0.4,
        ..conic_cone()
    })
    .unwrap();
    let mut emitter = GcodeEmitter::new(Vec::new(), EmitterSettings::default());
    let summary = builder.run(&mut emitter).unwrap();
    assert!(emitter.is_finished());
    let gcode = String::from_utf8(emitter.into_inner().unwrap()).unwrap();

    assert_eq!(gcode.matches(";LAYER:").count() as u32, summary.layers);
    assert_eq!(
        gcode
            .lines()
            .filter(|l| l.starts_with("G1 X") && l.contains(" Z"))
            .count(),
        summary.print_moves
    );
    assert!(gcode.contains("M106 S85"));
    assert!(gcode.contains("M106 S255"));
    assert!(gcode.trim_end().ends_with("M84 ; motors off"));
}

proptest! {
    #[test]
    fn prop_circle_lands_on_end_angle(
        radius in 0.5f64..80.0,
        resolution in 0.05f64..3.0,
        start in -180.0f64..180.0,
        span in 1.0f64..720.0,
    ) {
        let walker = CircleWalker::new((0.0, 0.0), radius, resolution);
        let points = walker.arc(start, start + span, 0.0, 0.0);
        let last = *points.last().unwrap();
        let expected = walker.point_at(start + span, 0.0);
        prop_assert!(last.distance_to(&expected) < 1e-9 * radius.max(1.0));

        let mut prev = walker.point_at(start, 0.0);
        let mut total = 0.0;
        for p in &points {
            let chord = prev.distance_to(p);
            prop_assert!(chord <= resolution + 1e-9);
            total += chord;
            prev = *p;
        }
        let n = points.len() as f64;
        let chord = 2.0 * radius * (span.to_radians() / (2.0 * n)).sin();
        prop_assert!((total - n * chord).abs() < 1e-6 * radius);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_spiral_terminates_monotonically(
        radius in 2.0f64..30.0,
        length in 2.0f64..40.0,
        layer_height in 0.1f64..0.4,
        resolution in 0.2f64..1.5,
        shape_index in 0usize..6,
    ) {
        let shape = ShapeKind::ALL[shape_index];
        let parameter = match shape {
            ShapeKind::Haack => 1.0 / 3.0,
            _ => 0.5,
        };
        let profile = ConeProfile::new(shape, length, radius, parameter).unwrap();
        let walker = SpiralWalker::new(profile, (100.0, 100.0), 0.0, layer_height, resolution).unwrap();

        let mut last_z = -1.0;
        let mut last: Option<Point3> = None;
        for point in walker {
            let point = point.unwrap();
            prop_assert!(point.cursor.cone_z >= last_z);
            last_z = point.cursor.cone_z;
            last = Some(point.position);
        }
        prop_assert_eq!(last_z, length);
        prop_assert!((last.unwrap().z - length).abs() < 1e-9);
    }
}
