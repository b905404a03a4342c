//! Dispatcher lifecycle over the public API.
//!
//! These tests drive [`PackageGenerator`] the way an embedding host would:
//! a request tag, a flat parameter map and a target component, with every
//! outcome read back through the design itself.

use epgen::model::BuildState;
use epgen::{Config, Design, PackageGenerator, ParameterSet};

fn logs() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init()
        .ok();
}

fn generator() -> PackageGenerator {
    PackageGenerator::new(Config::default())
}

#[test]
fn create_patch_and_rebuild_one_family() {
    logs();
    let mut design = Design::new("SOIC127P1030X265-20");
    let root = design.root();
    let gen = generator();

    // Create from engineering defaults.
    assert!(gen
        .generate(&mut design, "soic", &ParameterSet::new(), root)
        .unwrap());
    assert_eq!(design.parameters.len(), 12);
    let created = design.component(root).unwrap();
    assert!(created.build_state.is_created());
    assert_eq!(created.history.active_body_count(), 21);
    let history_len = created.history.len();

    // A span change is absorbed by the driven dimensions.
    assert!(gen
        .generate(&mut design, "soic", &ParameterSet::new().with("E", 1.2), root)
        .unwrap());
    let patched = design.component(root).unwrap();
    assert_eq!(patched.history.len(), history_len);
    assert!((design.parameters.value_of("param_E").unwrap() - 1.2).abs() < 1e-12);

    // A pin count change rebuilds the rows with the fresh value.
    assert!(gen
        .generate(&mut design, "soic", &ParameterSet::new().with("DPins", 8.0), root)
        .unwrap());
    let rebuilt = design.component(root).unwrap();
    assert_eq!(rebuilt.history.active_body_count(), 9);
    match &rebuilt.build_state {
        BuildState::Created { structural, .. } => {
            assert!((structural["DPins"] - 8.0).abs() < 1e-12);
        }
        BuildState::Uninitialized => panic!("expected a recorded build"),
    }
}

#[test]
fn package_type_switch_replaces_the_build() {
    logs();
    let mut design = Design::new("switch");
    let root = design.root();
    let gen = generator();

    assert!(gen
        .generate(&mut design, "chip", &ParameterSet::new(), root)
        .unwrap());
    assert!(gen
        .generate(&mut design, "soic", &ParameterSet::new(), root)
        .unwrap());

    let component = design.component(root).unwrap();
    match &component.build_state {
        BuildState::Created { package_type, .. } => assert_eq!(package_type, "soic"),
        BuildState::Uninitialized => panic!("expected a recorded build"),
    }
    // The previous family's parameters are gone; only the new set remains.
    assert_eq!(design.parameters.len(), 12);
    assert_eq!(component.history.active_body_count(), 21);
}

#[test]
fn through_hole_families_register_the_board_thickness() {
    logs();
    let mut design = Design::new("axial");
    let root = design.root();

    assert!(generator()
        .generate(&mut design, "axial_resistor", &ParameterSet::new(), root)
        .unwrap());
    let thickness = design.parameters.value_of("board_thickness").unwrap();
    assert!((thickness - 0.16).abs() < 1e-12);
}

#[test]
fn configured_board_thickness_flows_into_the_table() {
    logs();
    let mut config = Config::default();
    config.generator.board_thickness = 1.2;
    let mut design = Design::new("axial");
    let root = design.root();

    assert!(PackageGenerator::new(config)
        .generate(&mut design, "axial_resistor", &ParameterSet::new(), root)
        .unwrap());
    let thickness = design.parameters.value_of("board_thickness").unwrap();
    assert!((thickness - 0.12).abs() < 1e-12);
}

#[test]
fn non_parametric_config_builds_without_parameters() {
    logs();
    let mut config = Config::default();
    config.generator.parametric = false;
    let mut design = Design::new("direct");
    let root = design.root();
    let gen = PackageGenerator::new(config);

    assert!(gen
        .generate(&mut design, "soic", &ParameterSet::new(), root)
        .unwrap());
    assert!(gen
        .generate(&mut design, "soic", &ParameterSet::new(), root)
        .unwrap());

    assert!(design.parameters.is_empty());
    let component = design.component(root).unwrap();
    assert_eq!(component.history.active_body_count(), 21);
}

#[test]
fn unknown_tag_is_soft_and_misdirected_component_is_hard() {
    logs();
    let mut design = Design::new("errors");
    let root = design.root();
    let gen = generator();

    assert!(!gen
        .generate(&mut design, "sot99", &ParameterSet::new(), root)
        .unwrap());
    assert_eq!(design.total_body_count(), 0);

    let missing = epgen::ComponentId(9);
    let err = gen
        .generate(&mut design, "soic", &ParameterSet::new(), missing)
        .unwrap_err();
    assert!(matches!(err, epgen::GenerateError::UnsupportedState { .. }));
}
