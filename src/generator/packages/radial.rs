//! Radial inductor: a drum core standing on two wire leads.
//!
//! The drum is a cylinder revolve with the winding waist cut back five
//! per cent between the two flanges, so every dimension rides on an
//! expression and the refresh path only repaints. A polarized part sinks
//! a pin-one dimple into the top flange; the cut is always recorded and
//! toggled by suppression.

use std::f64::consts::PI;

use crate::error::GenerateResult;
use crate::generator::context::BuildContext;
use crate::generator::feature_ops::{recolour_indexed, Arg};
use crate::generator::framework::{FlagSpec, OptionalFeature, PackageBuilder, ParamSpec, Resolved};
use crate::generator::packages::PackageType;
use crate::generator::sketch_ops;
use crate::model::material::{Appearance, Finish, Material};
use crate::model::{BasePlane, FeatureKey, Point2, SketchPlane};

const BODY: FeatureKey = FeatureKey("body");
const PIN_ONE: FeatureKey = FeatureKey("pin_one");

/// Waist cut fraction of the drum radius.
const WAIST: f64 = 0.05;

fn lead_finish() -> Finish {
    Finish::of(Material::CopperAlloy).with_appearance(Appearance::NickelPolished)
}

pub struct RadialInductor;

impl PackageBuilder for RadialInductor {
    fn package_type(&self) -> PackageType {
        PackageType::RadialInductor
    }

    fn params(&self) -> &'static [ParamSpec] {
        const PARAMS: &[ParamSpec] = &[
            ParamSpec::length("A", 1.1, "body height"),
            ParamSpec::length("D", 1.0, "body diameter"),
            ParamSpec::length("e", 0.508, "pitch"),
            ParamSpec::length("b", 0.065, "terminal width"),
        ];
        PARAMS
    }

    fn flags(&self) -> &'static [FlagSpec] {
        const FLAGS: &[FlagSpec] = &[FlagSpec::detail("isPolarized")];
        FLAGS
    }

    fn optional_features(&self) -> &'static [OptionalFeature] {
        const OPTIONAL: &[OptionalFeature] = &[OptionalFeature::when_set("isPolarized", PIN_ONE)];
        OPTIONAL
    }

    fn uses_board_thickness(&self) -> bool {
        true
    }

    fn create(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let a = resolved.dim("A");
        let d = resolved.dim("D");
        let pitch = resolved.dim("e");
        let b = resolved.dim("b");
        let rgb = resolved.rgb();
        let board = ctx.board_thickness;

        let mut ops = ctx.ops();

        // Drum core: cylinder minus the waist between the flanges.
        let body_sketch = ops.sketch("BodySketch", SketchPlane::offset_from(BasePlane::Xz, 0.0));
        sketch_ops::center_rectangle(
            ops.sketch_mut(body_sketch),
            Point2::new(d / 4.0, a / 2.0),
            d / 2.0,
            a,
        );
        sketch_ops::center_rectangle(
            ops.sketch_mut(body_sketch),
            Point2::new(d / 2.0 * (1.0 - WAIST / 2.0), a / 2.0),
            WAIST * d / 2.0,
            a / 2.0,
        );
        let drum_profile = ops.rect(Arg::expr(d / 2.0, "param_D/2"), Arg::expr(a, "param_A"))?;
        let drum = ops.revolve(
            "Inductor",
            drum_profile,
            Arg::expr(d / 4.0, "param_D/4"),
            360.0,
            "Inductor",
            Finish::body().with_rgb(rgb),
        )?;
        let waist_profile = ops.rect(
            Arg::expr(WAIST * d / 2.0, "0.05 * param_D/2"),
            Arg::expr(a / 2.0, "param_A/2"),
        )?;
        ops.revolve_cut(
            "Waist",
            waist_profile,
            Arg::expr(d / 2.0 * 0.975, "param_D/2 * 0.975"),
            360.0,
            drum.body,
        )?;
        // Rounds the four flange rims; the concave waist corners keep
        // their blend out of the volume.
        ops.fillet(
            "RimFillet",
            drum.body,
            Arg::expr(d / 2.0 * 0.1, "param_D/2 * 0.1"),
            Arg::expr(4.0 * PI * d, "4 * 3.141592653589793 * param_D"),
        )?;

        // Wire leads through the board.
        let lead_sketch = ops.sketch("TerminalSketch", SketchPlane::offset_from(BasePlane::Xy, 0.0));
        sketch_ops::center_circle(ops.sketch_mut(lead_sketch), Point2::new(pitch / 2.0, 0.0), b);
        let lead_profile = ops.circle(Arg::expr(b / 2.0, "param_b/2"))?;
        let lead = ops.extrude(
            "Terminal",
            lead_profile,
            Arg::expr(
                -1.2f64.mul_add(board, 0.0002),
                "-1.2 * board_thickness - 0.0002",
            ),
            "Terminal",
            lead_finish(),
        )?;
        ops.mirror("TerminalMirror", &[lead.feature], BasePlane::Yz);

        // Pin-one dimple in the top flange.
        ops.plane("PinOnePlaneXy", BasePlane::Xy, Arg::expr(a, "param_A"))?;
        let pin_sketch = ops.sketch("PinOneSketch", SketchPlane::offset_from(BasePlane::Xy, a));
        sketch_ops::center_circle(
            ops.sketch_mut(pin_sketch),
            Point2::new(d * 0.3, 0.0),
            d * 0.1,
        );
        let pin_profile = ops.circle(Arg::expr(d * 0.05, "0.1 * param_D/2"))?;
        let pin_one = ops.extrude_cut(
            "PinOne",
            pin_profile,
            Arg::expr(-d * 0.05, "param_D/2 * -0.1"),
            drum.body,
        )?;

        ops.index(BODY, drum.feature);
        ops.index(PIN_ONE, pin_one);
        ops.commit()
    }

    fn update(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        recolour_indexed(ctx.component(), BODY, resolved.rgb())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::generator::framework::drive;
    use crate::generator::params::ParameterSet;
    use crate::model::material::Rgb;
    use crate::model::{Component, Design};

    fn run(design: &mut Design, params: &ParameterSet) {
        let root = design.root();
        let config = Config::default();
        let mut ctx = BuildContext::new(design, root, &config).unwrap();
        drive(&mut ctx, &RadialInductor, params).unwrap();
    }

    fn drum_volume(d: f64, a: f64) -> f64 {
        let shell = 2.0 * PI * (d / 4.0) * (d / 2.0 * a);
        let waist = 2.0 * PI * (d / 2.0 * 0.975) * (WAIST * d / 2.0 * a / 2.0);
        let r = d / 2.0 * 0.1;
        shell - waist - (1.0 - PI / 4.0) * r * r * (4.0 * PI * d)
    }

    fn body_volume(component: &Component, name: &str) -> f64 {
        component
            .history
            .active_bodies()
            .find(|(_, body)| body.name == name)
            .map(|(_, body)| body.volume)
            .unwrap()
    }

    #[test]
    fn drum_core_on_two_leads() {
        let mut design = Design::new("inductor");
        run(&mut design, &ParameterSet::new());

        assert!(design.parameters.contains("board_thickness"));
        let component = design.component(design.root()).unwrap();
        assert_eq!(component.history.active_body_count(), 3);
        assert!((body_volume(component, "Inductor") - drum_volume(1.0, 1.1)).abs() < 1e-12);

        let lead = PI * (0.065 / 2.0) * (0.065 / 2.0) * (1.2 * 0.16 + 0.0002);
        assert!((body_volume(component, "Terminal") - lead).abs() < 1e-12);
    }

    #[test]
    fn polarity_sinks_the_pin_one_dimple() {
        let mut design = Design::new("inductor");
        run(&mut design, &ParameterSet::new());
        let before = design.component(design.root()).unwrap().history.len();

        run(&mut design, &ParameterSet::new().with("isPolarized", true));
        let component = design.component(design.root()).unwrap();
        assert_eq!(component.history.len(), before);
        // the dimple is a cut, so the body count holds
        assert_eq!(component.history.active_body_count(), 3);
        let dimple = PI * 0.05 * 0.05 * 0.05;
        let expected = drum_volume(1.0, 1.1) - dimple;
        assert!((body_volume(component, "Inductor") - expected).abs() < 1e-12);

        run(&mut design, &ParameterSet::new().with("isPolarized", false));
        let component = design.component(design.root()).unwrap();
        assert!((body_volume(component, "Inductor") - drum_volume(1.0, 1.1)).abs() < 1e-12);
    }

    #[test]
    fn diameter_update_rides_the_expressions() {
        let mut design = Design::new("inductor");
        run(&mut design, &ParameterSet::new());
        run(
            &mut design,
            &ParameterSet::new().with("D", 1.2).with("color_r", 160.0),
        );

        let component = design.component(design.root()).unwrap();
        assert!((body_volume(component, "Inductor") - drum_volume(1.2, 1.1)).abs() < 1e-12);

        let (_, body) = component
            .history
            .active_bodies()
            .find(|(_, body)| body.name == "Inductor")
            .unwrap();
        assert_eq!(body.finish.rgb, Some(Rgb::new(160, 10, 10)));
    }
}
