//! End-to-end runs through the public API: analysis, geometry edits,
//! bearings and project files.

use shaft_core::calculations::bearings::BearingInput;
use shaft_core::calculations::shaft_analysis::{analyze, PointLoad, ShaftLoadCase, ShaftMaterial};
use shaft_core::file_io::{load_project, save_project};
use shaft_core::geometry::{Bound, GeometryModel, RegionKind};
use shaft_core::project::ShaftProject;
use shaft_core::session::DesignSession;

const TOL: f64 = 1e-9;

fn material() -> ShaftMaterial {
    ShaftMaterial::new("C45", 200.0, 2.0)
}

fn simple_case() -> ShaftLoadCase {
    ShaftLoadCase::simply_supported(500.0, 200.0, 20.0, 0.0, 10_000.0, 500.0, 2.0, material())
}

#[test]
fn simply_supported_reactions() {
    let result = analyze(&simple_case()).unwrap();

    assert!((result.reaction_a_n - 400.0).abs() < TOL);
    assert!((result.reaction_b_n - 400.0).abs() < TOL);
    assert!((result.eccentric_diameter_mm - result.shaft_diameter_mm - 4.0).abs() < TOL);
}

#[test]
fn two_support_reactions() {
    let case = ShaftLoadCase::two_support(
        400.0,
        0.0,
        400.0,
        vec![PointLoad::new(100.0, 5000.0), PointLoad::new(300.0, -5000.0)],
        500.0,
        2.0,
        material(),
    );
    let result = analyze(&case).unwrap();

    assert!((result.reaction_b_n - 2500.0).abs() < TOL);
    assert!((result.reaction_a_n + 2500.0).abs() < TOL);
}

#[test]
fn oversized_subsection_is_rejected_and_list_unchanged() {
    let case = simple_case();
    let result = analyze(&case).unwrap();
    let mut model = GeometryModel::new(result.frame(&case));
    model.set_subsection_attributes(RegionKind::Eccentrics, 0, 16.0, 60.0).unwrap();
    model.set_subsection_attributes(RegionKind::Eccentrics, 1, 16.0, 60.0).unwrap();

    // After region spans 228..500
    assert!(model.append_subsection(RegionKind::AfterEccentrics, 200.0, 45.0).unwrap().accepted);
    let before = model.subsection_count(RegionKind::AfterEccentrics);

    let report = model.append_subsection(RegionKind::AfterEccentrics, 100.0, 45.0).unwrap();
    assert!(!report.accepted);
    assert!(matches!(report.violations[0].bound, Bound::Span { .. }));
    assert_eq!(model.subsection_count(RegionKind::AfterEccentrics), before);
    assert!(model.meets_limits());
}

#[test]
fn removing_middle_subsection_renumbers_and_replaces() {
    let case = simple_case();
    let result = analyze(&case).unwrap();
    let mut model = GeometryModel::new(result.frame(&case));
    model.set_subsection_attributes(RegionKind::Eccentrics, 0, 16.0, 60.0).unwrap();
    model.set_subsection_attributes(RegionKind::Eccentrics, 1, 16.0, 60.0).unwrap();

    for (length, diameter) in [(20.0, 50.0), (30.0, 45.0), (40.0, 40.0)] {
        assert!(model
            .append_subsection(RegionKind::BeforeEccentrics, length, diameter)
            .unwrap()
            .accepted);
    }
    model.remove_subsection(RegionKind::BeforeEccentrics, 1).unwrap();

    let placements = model.compute_placements();
    let before = placements.region(RegionKind::BeforeEccentrics);
    assert_eq!(before.iter().map(|p| p.index).collect::<Vec<_>>(), vec![0, 1]);
    // Stacked backward from the first eccentric edge at 192 mm
    assert!((before[0].end_mm() - 192.0).abs() < TOL);
    assert!((before[1].end_mm() - 172.0).abs() < TOL);
    assert!((before[1].length_mm - 40.0).abs() < TOL);
    assert!((before[1].diameter_mm - 40.0).abs() < TOL);
}

#[test]
fn full_session_round_trips_through_project_file() {
    let mut session = DesignSession::default();
    session.on_inputs_changed(simple_case().with_label("IS-1")).unwrap();
    session.on_subsection_edited(RegionKind::Eccentrics, 0, 16.0, 60.0).unwrap();
    session.on_subsection_edited(RegionKind::Eccentrics, 1, 16.0, 60.0).unwrap();
    session
        .on_subsection_appended(RegionKind::AfterEccentrics, 120.0, 45.0)
        .unwrap();
    assert!(session.can_proceed());

    let mut project = ShaftProject::new("Integration", "CD-100");
    project.set_bearings(BearingInput::new(1000.0));
    project.capture(&session);

    let path = std::env::temp_dir().join(format!("shaft_core_workflow_{}.csd", std::process::id()));
    save_project(&project, &path).unwrap();
    let loaded = load_project(&path).unwrap();
    let _ = std::fs::remove_file(&path);

    let reopened = loaded.open_session().unwrap();
    assert_eq!(reopened.analysis(), session.analysis());
    assert_eq!(reopened.geometry(), session.geometry());
    assert!(reopened.can_proceed());

    let bearings = reopened.bearings(loaded.bearings.as_ref().unwrap()).unwrap();
    assert!(bearings.central_required_kn > 0.0);
}
