//! PLCC: a square-shouldered chip carrier with J-leads on all four
//! sides.
//!
//! Each side reuses the SOJ section: a shoulder riser extruded wide
//! and a narrower hook welded on. Rows along the D edges wrap the E
//! span and rows along the E edges wrap the D span, so the two
//! sketches swap dimension families.

use crate::error::GenerateResult;
use crate::generator::context::BuildContext;
use crate::generator::feature_ops::{set_indexed_area, Arg};
use crate::generator::framework::{PackageBuilder, ParamSpec, Resolved};
use crate::generator::packages::PackageType;
use crate::generator::sketch_ops;
use crate::model::material::{Appearance, Finish, Material};
use crate::model::{BasePlane, FeatureKey, Point2, SketchPlane};

const DPIN_SIDE: FeatureKey = FeatureKey("dpin_side");
const DPIN_HOOK: FeatureKey = FeatureKey("dpin_hook");
const EPIN_SIDE: FeatureKey = FeatureKey("epin_side");
const EPIN_HOOK: FeatureKey = FeatureKey("epin_hook");

/// J-lead stock, fixed for the family.
const TERMINAL_THICKNESS: f64 = 0.02;

fn lead_finish() -> Finish {
    Finish::of(Material::CopperAlloy).with_appearance(Appearance::NickelPolished)
}

pub struct Plcc;

impl PackageBuilder for Plcc {
    fn package_type(&self) -> PackageType {
        PackageType::Plcc
    }

    fn params(&self) -> &'static [ParamSpec] {
        const PARAMS: &[ParamSpec] = &[
            ParamSpec::length("A", 0.357, "body height"),
            ParamSpec::length("A1", 0.051, "body offset"),
            ParamSpec::length("E", 1.2445, "E side span"),
            ParamSpec::length("E1", 1.15, "body width"),
            ParamSpec::length("E2", 1.06, "E side weld space"),
            ParamSpec::length("D", 1.2445, "D side span"),
            ParamSpec::length("D1", 1.15, "body length"),
            ParamSpec::length("D2", 1.06, "D side weld space"),
            ParamSpec::length("e", 0.127, "pitch"),
            ParamSpec::length("b", 0.043, "terminal length"),
            ParamSpec::count("DPins", 14, "D side pins"),
            ParamSpec::count("EPins", 14, "E side pins"),
        ];
        PARAMS
    }

    fn create(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let a = resolved.dim("A");
        let a1 = resolved.dim("A1");
        let e_span = resolved.dim("E");
        let e1 = resolved.dim("E1");
        let e2 = resolved.dim("E2");
        let d_span = resolved.dim("D");
        let d1 = resolved.dim("D1");
        let d2 = resolved.dim("D2");
        let pitch = resolved.dim("e");
        let b = resolved.dim("b");
        let d_pins = resolved.count("DPins");
        let e_pins = resolved.count("EPins");
        let front_d = (d_pins / 2).max(1);
        let front_e = (e_pins / 2).max(1);

        let mid = (a + a1) / 2.0;
        let row_d = (front_d - 1) as f64 * pitch / 2.0;
        let row_e = (front_e - 1) as f64 * pitch / 2.0;

        let mut ops = ctx.ops();

        ops.plane(
            "DpinPathPlaneXz",
            BasePlane::Xz,
            Arg::expr(row_d, "((param_DPins/2 - 1)*param_e)/2"),
        )?;
        let d_sketch = ops.sketch(
            "DpinPathSketch",
            SketchPlane::offset_from(BasePlane::Xz, row_d),
        );
        let (d_hook_area, d_riser_area) = sketch_ops::jlead_outline(
            ops.sketch_mut(d_sketch),
            e_span,
            e1,
            e2,
            mid,
            TERMINAL_THICKNESS,
        );
        let d_riser = ops.area(d_riser_area);
        let d_side = ops.extrude(
            "DpinBodySide",
            d_riser,
            Arg::expr(2.0 * b, "param_b * 2"),
            "DpinBodySide",
            lead_finish(),
        )?;
        let d_hook = ops.extrude_join(
            "DpinBodyBottom",
            ops.area(d_hook_area),
            Arg::expr(b, "param_b"),
            d_side.body,
        )?;

        ops.plane(
            "EpinPathPlaneXz",
            BasePlane::Xz,
            Arg::expr(-row_e, "-((param_EPins/2 - 1)*param_e)/2"),
        )?;
        let e_sketch = ops.sketch(
            "EpinPathSketch",
            SketchPlane::offset_from(BasePlane::Xz, -row_e),
        );
        let (e_hook_area, e_riser_area) = sketch_ops::jlead_outline(
            ops.sketch_mut(e_sketch),
            d_span,
            d1,
            d2,
            mid,
            TERMINAL_THICKNESS,
        );
        let e_riser = ops.area(e_riser_area);
        let e_side = ops.extrude(
            "EpinBodySide",
            e_riser,
            Arg::expr(2.0 * b, "param_b * 2"),
            "EpinBodySide",
            lead_finish(),
        )?;
        let e_hook = ops.extrude_join(
            "EpinBodyBottom",
            ops.area(e_hook_area),
            Arg::expr(b, "param_b"),
            e_side.body,
        )?;

        ops.plane("BodyPlaneXy", BasePlane::Xy, Arg::expr(a1, "param_A1"))?;
        let body_sketch = ops.sketch("BodySketch", SketchPlane::offset_from(BasePlane::Xy, a1));
        sketch_ops::center_rectangle(ops.sketch_mut(body_sketch), Point2::new(0.0, 0.0), e1, d1);
        let profile = ops.rect(Arg::expr(e1, "param_E1"), Arg::expr(d1, "param_D1"))?;
        let body = ops.extrude(
            "Body",
            profile,
            Arg::expr(a - a1, "param_A - param_A1"),
            "Body",
            Finish::body(),
        )?;

        let slab = a - a1 - TERMINAL_THICKNESS;
        let perimeter = Arg::expr(2.0 * (e1 + d1), "(param_E1 + param_D1) * 2");
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
            "Dpin",
            d_side.feature,
            BasePlane::Xz,
            front_d,
            Arg::expr(pitch, "param_e"),
        )?;
        ops.mirror_and_pattern(
            "Epin",
            e_side.feature,
            BasePlane::Yz,
            front_e,
            Arg::expr(pitch, "param_e"),
        )?;

        // Mark sits off-centre near the pin-1 edge of the lid.
        ops.plane("PinOneMarkPlaneXy", BasePlane::Xy, Arg::expr(a, "param_A"))?;
        let mark_sketch = ops.sketch(
            "PinOneMarkSketch",
            SketchPlane::offset_from(BasePlane::Xy, a),
        );
        let mark_radius = e_span / 30.0;
        sketch_ops::center_circle(
            ops.sketch_mut(mark_sketch),
            Point2::new(-(d_span / 2.0 - e_span / 10.0 - mark_radius), -0.1),
            2.0 * mark_radius,
        );
        let mark_profile = ops.circle(Arg::expr(mark_radius, "param_E/30"))?;
        ops.extrude_cut("PinOneMark", mark_profile, Arg::lit(-0.1 * a), body.body)?;

        ops.index(DPIN_SIDE, d_side.feature);
        ops.index(DPIN_HOOK, d_hook);
        ops.index(EPIN_SIDE, e_side.feature);
        ops.index(EPIN_HOOK, e_hook);
        ops.commit()
    }

    fn update(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let a = resolved.dim("A");
        let a1 = resolved.dim("A1");
        let e_span = resolved.dim("E");
        let e1 = resolved.dim("E1");
        let e2 = resolved.dim("E2");
        let d_span = resolved.dim("D");
        let d1 = resolved.dim("D1");
        let d2 = resolved.dim("D2");
        let mid = (a + a1) / 2.0;

        let component = ctx.component();
        set_indexed_area(
            component,
            DPIN_SIDE,
            sketch_ops::jlead_riser_area(e_span, e1, e2, mid, TERMINAL_THICKNESS),
        )?;
        set_indexed_area(
            component,
            DPIN_HOOK,
            sketch_ops::jlead_hook_area(e_span, e2, TERMINAL_THICKNESS),
        )?;
        set_indexed_area(
            component,
            EPIN_SIDE,
            sketch_ops::jlead_riser_area(d_span, d1, d2, mid, TERMINAL_THICKNESS),
        )?;
        set_indexed_area(
            component,
            EPIN_HOOK,
            sketch_ops::jlead_hook_area(d_span, d2, TERMINAL_THICKNESS),
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

    fn run(design: &mut Design, params: &ParameterSet) {
        let root = design.root();
        let config = Config::default();
        let mut ctx = BuildContext::new(design, root, &config).unwrap();
        drive(&mut ctx, &Plcc, params).unwrap();
    }

    fn indexed_volume(design: &Design, key: FeatureKey) -> f64 {
        let component = design.component(design.root()).unwrap();
        let feature = component.indexed(key).unwrap();
        let body = component.history.get(feature).unwrap().bodies[0];
        component.history.body(body).unwrap().volume
    }

    fn jlead_volume(span: f64, body_width: f64, weld: f64, mid: f64, b: f64) -> f64 {
        let riser = sketch_ops::jlead_riser_area(span, body_width, weld, mid, TERMINAL_THICKNESS);
        let hook = sketch_ops::jlead_hook_area(span, weld, TERMINAL_THICKNESS);
        riser * 2.0 * b + hook * b
    }

    #[test]
    fn four_sides_of_welded_jleads() {
        let mut design = Design::new("plcc");
        run(&mut design, &ParameterSet::new());

        let component = design.component(design.root()).unwrap();
        // body + 7 pins a row on four rows
        assert_eq!(component.history.active_body_count(), 29);

        let mid = (0.357 + 0.051) / 2.0;
        let expected = jlead_volume(1.2445, 1.15, 1.06, mid, 0.043);
        assert!((indexed_volume(&design, DPIN_SIDE) - expected).abs() < 1e-12);
        assert!((indexed_volume(&design, EPIN_SIDE) - expected).abs() < 1e-12);
    }

    #[test]
    fn both_span_families_register() {
        let mut design = Design::new("plcc");
        run(&mut design, &ParameterSet::new());

        assert!((design.parameters.value_of("param_D2").unwrap() - 1.06).abs() < 1e-12);
        assert!((design.parameters.value_of("param_EPins").unwrap() - 14.0).abs() < 1e-12);
    }

    #[test]
    fn d_span_update_feeds_the_e_edge_rows() {
        let mut design = Design::new("plcc");
        run(&mut design, &ParameterSet::new());

        run(&mut design, &ParameterSet::new().with("D", 1.3));

        let mid = (0.357 + 0.051) / 2.0;
        // Rows along the E edges wrap the D span; the D-edge rows keep
        // wrapping E.
        let widened = jlead_volume(1.3, 1.15, 1.06, mid, 0.043);
        let unchanged = jlead_volume(1.2445, 1.15, 1.06, mid, 0.043);
        assert!((indexed_volume(&design, EPIN_SIDE) - widened).abs() < 1e-12);
        assert!((indexed_volume(&design, DPIN_SIDE) - unchanged).abs() < 1e-12);
    }
}
