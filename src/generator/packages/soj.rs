//! SOJ: a small-outline body on two rows of J-formed leads.
//!
//! Both rows extrude from one section sketch. The wide shoulder riser
//! leaves the body side at mid height; the half-turn hook that curls
//! under the seating plane is narrower and joins into the same copper
//! body, one body per pin.

use crate::error::GenerateResult;
use crate::generator::context::BuildContext;
use crate::generator::feature_ops::{set_indexed_area, Arg};
use crate::generator::framework::{PackageBuilder, ParamSpec, Resolved};
use crate::generator::packages::PackageType;
use crate::generator::sketch_ops;
use crate::model::material::{Appearance, Finish, Material};
use crate::model::{BasePlane, FeatureKey, Point2, SketchPlane};

const PIN_SIDE: FeatureKey = FeatureKey("pin_side");
const PIN_HOOK: FeatureKey = FeatureKey("pin_hook");

/// J-lead stock, fixed for the family.
const TERMINAL_THICKNESS: f64 = 0.02;

fn lead_finish() -> Finish {
    Finish::of(Material::CopperAlloy).with_appearance(Appearance::NickelPolished)
}

pub struct Soj;

impl PackageBuilder for Soj {
    fn package_type(&self) -> PackageType {
        PackageType::Soj
    }

    fn params(&self) -> &'static [ParamSpec] {
        const PARAMS: &[ParamSpec] = &[
            ParamSpec::length("A", 0.356, "body height"),
            ParamSpec::length("A1", 0.101, "body offset"),
            ParamSpec::length("E", 0.866, "span"),
            ParamSpec::length("E1", 0.752, "body width"),
            ParamSpec::length("E2", 0.68, "pin width"),
            ParamSpec::length("D", 1.28, "body length"),
            ParamSpec::length("e", 0.127, "pitch"),
            ParamSpec::length("b", 0.0435, "terminal length"),
            ParamSpec::count("DPins", 20, "pins"),
        ];
        PARAMS
    }

    fn create(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let a = resolved.dim("A");
        let a1 = resolved.dim("A1");
        let span = resolved.dim("E");
        let e1 = resolved.dim("E1");
        let e2 = resolved.dim("E2");
        let d = resolved.dim("D");
        let pitch = resolved.dim("e");
        let b = resolved.dim("b");
        let pins = resolved.count("DPins");
        let front = (pins / 2).max(1);

        let mid = (a + a1) / 2.0;
        let row = (front - 1) as f64 * pitch / 2.0;

        let mut ops = ctx.ops();

        ops.plane(
            "PinPathPlaneXz",
            BasePlane::Xz,
            Arg::expr(row, "((param_DPins/2 - 1)*param_e)/2"),
        )?;
        let sketch = ops.sketch("PinPathSketch", SketchPlane::offset_from(BasePlane::Xz, row));
        let (hook_area, riser_area) = sketch_ops::jlead_outline(
            ops.sketch_mut(sketch),
            span,
            e1,
            e2,
            mid,
            TERMINAL_THICKNESS,
        );

        // Shoulder first so the hook has a body to weld onto.
        let riser_profile = ops.area(riser_area);
        let side = ops.extrude(
            "PinBodySide",
            riser_profile,
            Arg::expr(2.0 * b, "param_b * 2"),
            "PinBodySide",
            lead_finish(),
        )?;
        let hook_profile = ops.area(hook_area);
        let hook = ops.extrude_join(
            "PinBodyBottom",
            hook_profile,
            Arg::expr(b, "param_b"),
            side.body,
        )?;

        ops.plane("BodyPlaneXy", BasePlane::Xy, Arg::expr(a1, "param_A1"))?;
        let body_sketch = ops.sketch("BodySketch", SketchPlane::offset_from(BasePlane::Xy, a1));
        sketch_ops::center_rectangle(ops.sketch_mut(body_sketch), Point2::new(0.0, 0.0), e1, d);
        let profile = ops.rect(Arg::expr(e1, "param_E1"), Arg::expr(d, "param_D"))?;
        let body = ops.extrude(
            "Body",
            profile,
            Arg::expr(a - a1, "param_A - param_A1"),
            "Body",
            Finish::body(),
        )?;

        let slab = a - a1 - TERMINAL_THICKNESS;
        let perimeter = Arg::expr(2.0 * (e1 + d), "(param_E1 + param_D) * 2");
        ops.chamfer(
            "BodyChamferTop",
            body.body,
            Arg::expr(slab / 2.0, "(param_A - param_A1 - 0.02)/2"),
            Arg::expr(0.2 * slab, "0.2*(param_A - param_A1 - 0.02)"),
            perimeter,
        )?;
        ops.chamfer(
            "BodyChamferBottom",
            body.body,
            Arg::expr(0.2 * slab, "0.2*(param_A - param_A1 - 0.02)"),
            Arg::expr(slab / 2.0, "(param_A - param_A1 - 0.02)/2"),
            perimeter,
        )?;

        ops.mirror_and_pattern(
            "Pin",
            side.feature,
            BasePlane::Yz,
            front,
            Arg::expr(-pitch, "-param_e"),
        )?;

        ops.pin_one_mark(
            body.body,
            Arg::expr(a, "param_A"),
            Arg::expr(0.1 * a, "param_A/10"),
            d,
            e1,
        )?;

        ops.index(PIN_SIDE, side.feature);
        ops.index(PIN_HOOK, hook);
        ops.commit()
    }

    fn update(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let a = resolved.dim("A");
        let a1 = resolved.dim("A1");
        let span = resolved.dim("E");
        let e1 = resolved.dim("E1");
        let e2 = resolved.dim("E2");
        let mid = (a + a1) / 2.0;

        let component = ctx.component();
        set_indexed_area(
            component,
            PIN_SIDE,
            sketch_ops::jlead_riser_area(span, e1, e2, mid, TERMINAL_THICKNESS),
        )?;
        set_indexed_area(
            component,
            PIN_HOOK,
            sketch_ops::jlead_hook_area(span, e2, TERMINAL_THICKNESS),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::generator::framework::drive;
    use crate::generator::params::ParameterSet;
    use crate::model::Design;
    use std::f64::consts::PI;

    fn run(design: &mut Design, params: &ParameterSet) {
        let root = design.root();
        let config = Config::default();
        let mut ctx = BuildContext::new(design, root, &config).unwrap();
        drive(&mut ctx, &Soj, params).unwrap();
    }

    fn pin_volume(design: &Design) -> f64 {
        let component = design.component(design.root()).unwrap();
        let feature = component.indexed(PIN_SIDE).unwrap();
        let body = component.history.get(feature).unwrap().bodies[0];
        component.history.body(body).unwrap().volume
    }

    #[test]
    fn twenty_pins_share_one_welded_section() {
        let mut design = Design::new("soj");
        run(&mut design, &ParameterSet::new());

        let component = design.component(design.root()).unwrap();
        // body + 10 pins a row
        assert_eq!(component.history.active_body_count(), 21);

        let r = (0.866 - 0.68) / 2.0;
        let hook = PI / 2.0 * (r * r - (r - 0.02) * (r - 0.02));
        let mid = (0.356 + 0.101) / 2.0;
        let riser = 0.02 * (mid + 0.02 - r) + 0.02 * ((0.866 - 0.752) / 2.0 - 0.02);
        let expected = riser * 2.0 * 0.0435 + hook * 0.0435;
        assert!((pin_volume(&design) - expected).abs() < 1e-12);
    }

    #[test]
    fn span_parameters_register_as_given() {
        let mut design = Design::new("soj");
        run(&mut design, &ParameterSet::new());

        assert!((design.parameters.value_of("param_E").unwrap() - 0.866).abs() < 1e-12);
        assert!((design.parameters.value_of("param_E2").unwrap() - 0.68).abs() < 1e-12);
        assert!((design.parameters.value_of("param_DPins").unwrap() - 20.0).abs() < 1e-12);
    }

    #[test]
    fn body_height_update_regrows_the_riser() {
        let mut design = Design::new("soj");
        run(&mut design, &ParameterSet::new());
        let before = design.component(design.root()).unwrap().history.len();

        run(&mut design, &ParameterSet::new().with("A", 0.5));
        let component = design.component(design.root()).unwrap();
        assert_eq!(component.history.len(), before);

        let r = (0.866 - 0.68) / 2.0;
        let hook = PI / 2.0 * (r * r - (r - 0.02) * (r - 0.02));
        let mid = (0.5 + 0.101) / 2.0;
        let riser = 0.02 * (mid + 0.02 - r) + 0.02 * ((0.866 - 0.752) / 2.0 - 0.02);
        let expected = riser * 2.0 * 0.0435 + hook * 0.0435;
        assert!((pin_volume(&design) - expected).abs() < 1e-12);
    }
}
