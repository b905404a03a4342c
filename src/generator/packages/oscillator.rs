//! Oscillators: a cornered metal-can body on L-formed or J-formed leads.
//!
//! The L variant seats corner castellations: each lead is a foot slice
//! under the body welded to a riser climbing the casting side, and the
//! two pieces pattern separately. The J variant shares the small-outline
//! J-lead section and extrudes both its profiles symmetrically about the
//! row plane.

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

pub struct OscillatorL;

impl PackageBuilder for OscillatorL {
    fn package_type(&self) -> PackageType {
        PackageType::OscillatorL
    }

    fn params(&self) -> &'static [ParamSpec] {
        const PARAMS: &[ParamSpec] = &[
            ParamSpec::length("A", 0.47, "body height"),
            ParamSpec::length("b", 0.08, "terminal width"),
            ParamSpec::length("D", 1.42, "body length"),
            ParamSpec::length("E", 0.98, "terminal span"),
            ParamSpec::length("E1", 0.915, "body width"),
            ParamSpec::length("E2", 0.762, "terminal gap"),
            ParamSpec::length("e", 0.508, "pin pitch"),
            ParamSpec::count("DPins", 4, "pins"),
        ];
        PARAMS
    }

    fn create(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let a = resolved.dim("A");
        let b = resolved.dim("b");
        let d = resolved.dim("D");
        let span = resolved.dim("E");
        let e1 = resolved.dim("E1");
        let e2 = resolved.dim("E2");
        let pitch = resolved.dim("e");
        let front = (resolved.count("DPins") / 2).max(1);

        let feet = (span - e1) / 2.0;
        let box_height = a - feet;
        let box_chamfer = box_height / 2.0;
        let row = (front - 1) as f64 * pitch / 2.0;

        let mut ops = ctx.ops();

        // Cast body hangs from its top plane down to the feet.
        ops.plane("BodyOffset", BasePlane::Xy, Arg::expr(a, "param_A"))?;
        let body_sketch = ops.sketch("BodySketch", SketchPlane::offset_from(BasePlane::Xy, a));
        sketch_ops::center_rectangle(ops.sketch_mut(body_sketch), Point2::new(0.0, 0.0), e1, d);
        let body_profile = ops.rect(Arg::expr(e1, "param_E1"), Arg::expr(d, "param_D"))?;
        let body = ops.extrude(
            "Body",
            body_profile,
            Arg::expr(-box_height, "-param_A + param_E/2 - param_E1/2"),
            "Body",
            Finish::body(),
        )?;

        let perimeter = Arg::expr(2.0 * (e1 + d), "(param_E1 + param_D) * 2");
        ops.chamfer(
            "BodyChamferTop",
            body.body,
            Arg::expr(box_chamfer / 2.0, "(param_A/2 - param_E/4 + param_E1/4)/2"),
            Arg::expr(box_chamfer, "(param_A/2 - param_E/4 + param_E1/4)"),
            perimeter,
        )?;
        ops.chamfer(
            "BodyChamferBottom",
            body.body,
            Arg::expr(box_chamfer, "(param_A/2 - param_E/4 + param_E1/4)"),
            Arg::expr(box_chamfer / 2.0, "(param_A/2 - param_E/4 + param_E1/4)/2"),
            perimeter,
        )?;

        // Pin-1 rebate inside the chamfered corner.
        let mark_radius = e1 / 20.0;
        let mark_center = Point2::new(
            -e1 / 2.0 + 2.0 * box_chamfer + mark_radius,
            d / 2.0 - box_chamfer - mark_radius,
        );
        sketch_ops::center_circle(ops.sketch_mut(body_sketch), mark_center, e1 / 10.0);
        let mark_profile = ops.circle(Arg::expr(mark_radius, "param_E1/20"))?;
        ops.extrude_cut("Pin1", mark_profile, Arg::lit(-0.05), body.body)?;

        // Corner lead: a foot slice under the body and a riser up the side.
        let pin_sketch = ops.sketch("PinSketch", SketchPlane::offset_from(BasePlane::Xy, 0.0));
        sketch_ops::center_rectangle(
            ops.sketch_mut(pin_sketch),
            Point2::new(e2 / 2.0 + (span - e2) / 4.0, row),
            (span - e2) / 2.0,
            b,
        );
        sketch_ops::vertical_split(ops.sketch_mut(pin_sketch), e1 / 2.0, row + b / 2.0);

        let foot_profile = ops.rect(
            Arg::expr((e1 - e2) / 2.0, "(param_E1 - param_E2)/2"),
            Arg::expr(b, "param_b"),
        )?;
        let foot = ops.extrude(
            "Terminal",
            foot_profile,
            Arg::expr(feet, "(param_E - param_E1)/2"),
            "Terminal",
            lead_finish(),
        )?;
        let riser_profile = ops.rect(
            Arg::expr(feet, "(param_E - param_E1)/2"),
            Arg::expr(b, "param_b"),
        )?;
        let riser = ops.extrude(
            "TerminalSide",
            riser_profile,
            Arg::expr(
                feet + box_height / 2.0,
                "param_E/4 - param_E1/4 + param_A/2",
            ),
            "TerminalSide",
            lead_finish(),
        )?;

        ops.mirror_and_pattern(
            "Terminal",
            foot.feature,
            BasePlane::Yz,
            front,
            Arg::expr(-pitch, "-param_e"),
        )?;
        ops.mirror_and_pattern(
            "TerminalSide",
            riser.feature,
            BasePlane::Yz,
            front,
            Arg::expr(-pitch, "-param_e"),
        )?;

        ops.commit()
    }
}

pub struct OscillatorJ;

impl PackageBuilder for OscillatorJ {
    fn package_type(&self) -> PackageType {
        PackageType::OscillatorJ
    }

    fn params(&self) -> &'static [ParamSpec] {
        const PARAMS: &[ParamSpec] = &[
            ParamSpec::length("A", 0.356, "body height"),
            ParamSpec::length("A1", 0.1, "body offset"),
            ParamSpec::length("E", 0.96, "span"),
            ParamSpec::length("E1", 0.86, "body width"),
            ParamSpec::length("E2", 0.763, "pin width"),
            ParamSpec::length("D", 1.4, "body length"),
            ParamSpec::length("e", 0.508, "pitch"),
            ParamSpec::length("b", 0.05, "terminal length"),
            ParamSpec::count("DPins", 4, "pins"),
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
        let front = (resolved.count("DPins") / 2).max(1);

        let mid = (a + a1) / 2.0;
        let row = (front - 1) as f64 * pitch / 2.0;

        let mut ops = ctx.ops();

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

        // One symmetric extrude carries both profiles of the section.
        let riser_profile = ops.area(riser_area);
        let side = ops.extrude(
            "PinBodySide",
            riser_profile,
            Arg::expr(b, "param_b"),
            "PinBodySide",
            lead_finish(),
        )?;
        let hook_profile = ops.area(hook_area);
        let hook = ops.extrude_join("PinBodyBottom", hook_profile, Arg::expr(b, "param_b"), side.body)?;

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

    fn run(design: &mut Design, builder: &dyn PackageBuilder, params: &ParameterSet) {
        let root = design.root();
        let config = Config::default();
        let mut ctx = BuildContext::new(design, root, &config).unwrap();
        drive(&mut ctx, builder, params).unwrap();
    }

    fn body_volume(design: &Design, name: &str) -> f64 {
        let component = design.component(design.root()).unwrap();
        component
            .history
            .active_bodies()
            .find(|(_, body)| body.name == name)
            .map(|(_, body)| body.volume)
            .unwrap()
    }

    #[test]
    fn l_leads_split_into_foot_and_riser() {
        let mut design = Design::new("oscillator");
        run(&mut design, &OscillatorL, &ParameterSet::new());

        let component = design.component(design.root()).unwrap();
        // body + 4 feet + 4 risers
        assert_eq!(component.history.active_body_count(), 9);

        let feet: f64 = (0.98 - 0.915) / 2.0;
        let foot = (0.915 - 0.762) / 2.0 * 0.08 * feet;
        assert!((body_volume(&design, "Terminal") - foot).abs() < 1e-12);

        let riser = feet * 0.08 * (feet + (0.47 - feet) / 2.0);
        assert!((body_volume(&design, "TerminalSide") - riser).abs() < 1e-12);
    }

    #[test]
    fn l_body_wears_chamfers_and_pin_one_rebate() {
        let mut design = Design::new("oscillator");
        run(&mut design, &OscillatorL, &ParameterSet::new());

        let feet: f64 = (0.98 - 0.915) / 2.0;
        let box_height = 0.47 - feet;
        let chamfer = box_height / 2.0;
        let perimeter = 2.0 * (0.915 + 1.42);
        let mark = PI * (0.915 / 20.0) * (0.915 / 20.0) * 0.05;
        let expected = 0.915 * 1.42 * box_height
            - 2.0 * (chamfer / 2.0 * chamfer / 2.0) * perimeter
            - mark;
        assert!((body_volume(&design, "Body") - expected).abs() < 1e-12);
    }

    #[test]
    fn l_span_update_regrows_the_feet() {
        let mut design = Design::new("oscillator");
        run(&mut design, &OscillatorL, &ParameterSet::new());
        let before = design.component(design.root()).unwrap().history.len();

        run(&mut design, &OscillatorL, &ParameterSet::new().with("E", 1.0));
        let component = design.component(design.root()).unwrap();
        assert_eq!(component.history.len(), before);

        let feet: f64 = (1.0 - 0.915) / 2.0;
        let riser = feet * 0.08 * (feet + (0.47 - feet) / 2.0);
        assert!((body_volume(&design, "TerminalSide") - riser).abs() < 1e-12);
    }

    #[test]
    fn j_pins_share_one_welded_section() {
        let mut design = Design::new("oscillator");
        run(&mut design, &OscillatorJ, &ParameterSet::new());

        let component = design.component(design.root()).unwrap();
        // body + 4 pins
        assert_eq!(component.history.active_body_count(), 5);

        let r = (0.96 - 0.763) / 2.0;
        let hook = PI / 2.0 * (r * r - (r - 0.02) * (r - 0.02));
        let mid = (0.356 + 0.1) / 2.0;
        let riser = 0.02 * (mid + 0.02 - r) + 0.02 * ((0.96 - 0.86) / 2.0 - 0.02);
        let expected = (riser + hook) * 0.05;
        assert!((body_volume(&design, "PinBodySide") - expected).abs() < 1e-12);
    }

    #[test]
    fn j_height_update_keeps_history() {
        let mut design = Design::new("oscillator");
        run(&mut design, &OscillatorJ, &ParameterSet::new());
        let before = design.component(design.root()).unwrap().history.len();

        run(&mut design, &OscillatorJ, &ParameterSet::new().with("A", 0.4));
        let component = design.component(design.root()).unwrap();
        assert_eq!(component.history.len(), before);

        let r = (0.96 - 0.763) / 2.0;
        let hook = PI / 2.0 * (r * r - (r - 0.02) * (r - 0.02));
        let mid = (0.4 + 0.1) / 2.0;
        let riser = 0.02 * (mid + 0.02 - r) + 0.02 * ((0.96 - 0.86) / 2.0 - 0.02);
        let expected = (riser + hook) * 0.05;
        assert!((body_volume(&design, "PinBodySide") - expected).abs() < 1e-12);
    }
}
