//! Catalogue-wide generation sweeps.
//!
//! Every family must build from its engineering defaults and survive an
//! identical refresh without growing its feature history. Family-specific
//! geometry is asserted next to each builder; these sweeps guard the
//! catalogue as a whole.

use epgen::generator::packages::PackageType;
use epgen::model::BuildState;
use epgen::{Config, Design, PackageGenerator, ParameterSet};

fn build(design: &mut Design, tag: &str) {
    let root = design.root();
    let built = PackageGenerator::new(Config::default())
        .generate(design, tag, &ParameterSet::new(), root)
        .unwrap_or_else(|e| panic!("{tag}: {e}"));
    assert!(built, "{tag}: tag missing from the catalogue");
}

#[test]
fn every_family_builds_from_engineering_defaults() {
    for ty in PackageType::ALL {
        let mut design = Design::new(ty.tag());
        build(&mut design, ty.tag());

        let component = design.component(design.root()).unwrap();
        assert!(
            component.history.active_body_count() > 0,
            "{ty}: no bodies generated"
        );
        assert!(
            !design.parameters.is_empty(),
            "{ty}: no parameters registered"
        );
        match &component.build_state {
            BuildState::Created { package_type, .. } => assert_eq!(package_type, ty.tag()),
            BuildState::Uninitialized => panic!("{ty}: build not recorded"),
        }
    }
}

#[test]
fn every_family_survives_an_identical_refresh() {
    for ty in PackageType::ALL {
        let mut design = Design::new(ty.tag());
        build(&mut design, ty.tag());
        let (history_len, bodies) = {
            let component = design.component(design.root()).unwrap();
            (component.history.len(), component.history.active_body_count())
        };

        build(&mut design, ty.tag());

        let component = design.component(design.root()).unwrap();
        assert_eq!(component.history.len(), history_len, "{ty}: history grew");
        assert_eq!(
            component.history.active_body_count(),
            bodies,
            "{ty}: body count drifted"
        );
    }
}

#[test]
fn every_family_tears_down_cleanly_on_a_type_switch() {
    // Chain through the whole catalogue in one design; each switch must
    // replace the previous family's build completely.
    let mut design = Design::new("carousel");
    for ty in PackageType::ALL {
        build(&mut design, ty.tag());
        let component = design.component(design.root()).unwrap();
        match &component.build_state {
            BuildState::Created { package_type, .. } => assert_eq!(package_type, ty.tag()),
            BuildState::Uninitialized => panic!("{ty}: build not recorded"),
        }
        assert!(
            component.history.active_body_count() > 0,
            "{ty}: no bodies after switch"
        );
    }
}
