//! DIP: a dual in-line through-hole body on formed copper legs.
//!
//! Every leg shares one bent path that leaves the body at mid height,
//! turns down through a small fillet and runs to the seating plane.
//! Interior legs carry a wide shoulder at the top of that path; the
//! four corner legs keep a narrower shoulder so the row ends flush
//! with the body. Below the board each leg is a straight post with a
//! chamfered tip.

use crate::error::GenerateResult;
use crate::generator::context::BuildContext;
use crate::generator::feature_ops::{set_indexed_path_length, Arg};
use crate::generator::framework::{PackageBuilder, ParamSpec, Resolved};
use crate::generator::packages::PackageType;
use crate::generator::sketch_ops;
use crate::model::material::{Appearance, Finish, Material};
use crate::model::{BasePlane, FeatureKey, Point2, SketchPlane};
use std::f64::consts::FRAC_PI_2;

const MIDDLE_PIN: FeatureKey = FeatureKey("middle_pin");
const SIDE_PIN: FeatureKey = FeatureKey("side_pin");

fn lead_finish() -> Finish {
    Finish::of(Material::CopperAlloy).with_appearance(Appearance::NickelPolished)
}

/// Length of the common leg path. Straight reach out of the body,
/// straight drop from mid body to the seating plane, and a fillet no
/// larger than either leg in place of the corner.
fn pin_path_length(a: f64, a1: f64, span: f64, body_width: f64, c: f64) -> f64 {
    let reach = (span - body_width) / 2.0;
    let drop = (a + a1) / 2.0;
    let bend = c.min(reach);
    reach + drop + bend * (FRAC_PI_2 - 2.0)
}

pub struct Dip;

impl PackageBuilder for Dip {
    fn package_type(&self) -> PackageType {
        PackageType::Dip
    }

    fn params(&self) -> &'static [ParamSpec] {
        const PARAMS: &[ParamSpec] = &[
            ParamSpec::length("A", 0.508, "body height"),
            ParamSpec::length("A1", 0.038, "body offset"),
            ParamSpec::length("E", 0.762, "span"),
            ParamSpec::length("E1", 0.66, "body width"),
            ParamSpec::length("D", 1.969, "body length"),
            ParamSpec::length("e", 0.254, "pitch"),
            ParamSpec::length("b", 0.053, "terminal length"),
            ParamSpec::length("L", 0.24, "terminal width"),
            ParamSpec::length("c", 0.02, "terminal thickness"),
            ParamSpec::count("DPins", 16, "pins"),
        ];
        PARAMS
    }

    fn create(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let a = resolved.dim("A");
        let a1 = resolved.dim("A1");
        let span = resolved.dim("E");
        let e1 = resolved.dim("E1");
        let d = resolved.dim("D");
        let pitch = resolved.dim("e");
        let b = resolved.dim("b");
        let post = resolved.dim("L");
        let c = resolved.dim("c");
        let pins = resolved.count("DPins");
        let front = pins / 2;

        let reach = (span - e1) / 2.0;
        let drop = (a + a1) / 2.0;
        let bend = c.min(reach);
        let path = pin_path_length(a, a1, span, e1, c);

        let mut ops = ctx.ops();

        ops.plane("BodyPlaneXy", BasePlane::Xy, Arg::expr(a1, "param_A1"))?;
        let sketch = ops.sketch("BodySketch", SketchPlane::offset_from(BasePlane::Xy, a1));
        sketch_ops::center_rectangle(ops.sketch_mut(sketch), Point2::new(0.0, 0.0), e1, d);
        let profile = ops.rect(Arg::expr(e1, "param_E1"), Arg::expr(d, "param_D"))?;
        let body = ops.extrude(
            "Body",
            profile,
            Arg::expr(a - a1, "param_A - param_A1"),
            "Body",
            Finish::body(),
        )?;

        let slab = (a - a1 - c) / 2.0;
        let perimeter = Arg::expr(2.0 * (e1 + d), "(param_E1 + param_D) * 2");
        ops.chamfer(
            "BodyChamferTop",
            body.body,
            Arg::expr(slab, "(param_A - param_A1 - param_c)/2"),
            Arg::expr(a / 10.0, "param_A/10"),
            perimeter,
        )?;
        ops.chamfer(
            "BodyChamferBottom",
            body.body,
            Arg::expr(a / 10.0, "param_A/10"),
            Arg::expr(slab, "(param_A - param_A1 - param_c)/2"),
            perimeter,
        )?;

        // One path for every leg, drawn once on the section plane.
        let path_sketch = ops.sketch("PinPathSketch", SketchPlane::offset_from(BasePlane::Xz, 0.0));
        let sk = ops.sketch_mut(path_sketch);
        sk.add_line(
            Point2::new(-e1 / 2.0, drop),
            Point2::new(-e1 / 2.0 - reach + bend, drop),
        );
        sk.add_arc(
            Point2::new(-e1 / 2.0 - reach + bend, drop - bend),
            bend,
            FRAC_PI_2,
            FRAC_PI_2,
        );
        sk.add_line(
            Point2::new(-e1 / 2.0 - reach, drop - bend),
            Point2::new(-e1 / 2.0 - reach, 0.0),
        );

        ops.plane("MiddlePinPlaneYz", BasePlane::Yz, Arg::expr(-e1 / 2.0, "-param_E1/2"))?;
        let middle_sketch = ops.sketch(
            "MiddlePinTopSketch",
            SketchPlane::offset_from(BasePlane::Yz, -e1 / 2.0),
        );
        sketch_ops::center_rectangle(
            ops.sketch_mut(middle_sketch),
            Point2::new(-drop, pitch / 2.0),
            c,
            3.0 * b,
        );
        let middle_profile = ops.rect(Arg::expr(c, "param_c"), Arg::expr(3.0 * b, "param_b*3"))?;
        let middle = ops.sweep(
            "MiddlePinTop",
            middle_profile,
            Arg::lit(path),
            "MiddlePinTop",
            lead_finish(),
        )?;

        let corner_row = -pitch / 2.0 * (front.max(1) - 1) as f64;
        let side_sketch = ops.sketch(
            "SidePinTopSketch",
            SketchPlane::offset_from(BasePlane::Yz, -e1 / 2.0),
        );
        sketch_ops::center_rectangle(
            ops.sketch_mut(side_sketch),
            Point2::new(-drop, corner_row + b / 2.0),
            c,
            2.0 * b,
        );
        let side_profile = ops.rect(Arg::expr(c, "param_c"), Arg::expr(2.0 * b, "param_b*2"))?;
        let side = ops.sweep(
            "SidePinTop",
            side_profile,
            Arg::lit(path),
            "SidePinTop",
            lead_finish(),
        )?;

        let post_sketch =
            ops.sketch("PinBottomSketch", SketchPlane::offset_from(BasePlane::Xy, 0.0));
        sketch_ops::center_rectangle(
            ops.sketch_mut(post_sketch),
            Point2::new(-span / 2.0, corner_row),
            c,
            b,
        );
        let post_profile = ops.rect(Arg::expr(c, "param_c"), Arg::expr(b, "param_b"))?;
        let pin_bottom = ops.extrude(
            "PinBottom",
            post_profile,
            Arg::expr(-post, "-param_L"),
            "PinBottom",
            lead_finish(),
        )?;
        ops.chamfer(
            "PinBottomChamfer",
            pin_bottom.body,
            Arg::expr(b / 3.0, "param_b/3"),
            Arg::expr(2.0 * b / 3.0, "param_b*2/3"),
            Arg::expr(2.0 * c, "param_c * 2"),
        )?;
        ops.mirror_and_pattern(
            "PinBottom",
            pin_bottom.feature,
            BasePlane::Yz,
            front.max(1),
            Arg::expr(pitch, "param_e"),
        )?;

        // The corner shoulder reflects to the other three corners.
        let across = ops.mirror("SidePinTopMirrorXz", &[side.feature], BasePlane::Xz);
        let opposite = ops.mirror("SidePinTopMirrorBoth", &[across], BasePlane::Yz);
        let beside = ops.mirror("SidePinTopMirrorYz", &[side.feature], BasePlane::Yz);

        let (mid_mirror, mid_pattern) = ops.mirror_and_pattern(
            "MiddlePinTop",
            middle.feature,
            BasePlane::Yz,
            front.saturating_sub(2).max(1),
            Arg::expr(pitch, "param_e"),
        )?;

        ops.plane("PinOneMarkPlaneXy", BasePlane::Xy, Arg::expr(a, "param_A"))?;
        let mark_sketch = ops.sketch(
            "PinOneMarkSketch",
            SketchPlane::offset_from(BasePlane::Xy, a),
        );
        sketch_ops::center_circle(
            ops.sketch_mut(mark_sketch),
            Point2::new(0.0, d / 2.0 - 0.03),
            2.0 * e1 / 7.0,
        );
        let mark_profile = ops.circle(Arg::expr(e1 / 7.0, "param_E1/7"))?;
        ops.extrude_cut("PinOneMark", mark_profile, Arg::lit(-a / 4.0), body.body)?;

        // Two pins per row leaves no interior legs; one leaves no
        // corner legs either.
        if pins <= 4 {
            let history = &mut ops.component().history;
            history.set_suppressed(middle.feature, true);
            history.set_suppressed(mid_mirror, true);
            history.set_suppressed(mid_pattern, true);
        }
        if pins <= 2 {
            let history = &mut ops.component().history;
            history.set_suppressed(side.feature, true);
            history.set_suppressed(across, true);
            history.set_suppressed(opposite, true);
            history.set_suppressed(beside, true);
        }

        ops.index(MIDDLE_PIN, middle.feature);
        ops.index(SIDE_PIN, side.feature);
        ops.commit()
    }

    fn update(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let a = resolved.dim("A");
        let a1 = resolved.dim("A1");
        let span = resolved.dim("E");
        let e1 = resolved.dim("E1");
        let c = resolved.dim("c");
        let path = pin_path_length(a, a1, span, e1, c);

        let component = ctx.component();
        set_indexed_path_length(component, MIDDLE_PIN, path)?;
        set_indexed_path_length(component, SIDE_PIN, path)
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
        drive(&mut ctx, &Dip, params).unwrap();
    }

    fn indexed_volume(design: &Design, key: FeatureKey) -> f64 {
        let component = design.component(design.root()).unwrap();
        let feature = component.indexed(key).unwrap();
        let body = component.history.get(feature).unwrap().bodies[0];
        component.history.body(body).unwrap().volume
    }

    #[test]
    fn sixteen_legs_with_corner_shoulders() {
        let mut design = Design::new("dip");
        run(&mut design, &ParameterSet::new());

        let component = design.component(design.root()).unwrap();
        // body + 12 interior shoulders + 4 corner shoulders + 16 posts
        assert_eq!(component.history.active_body_count(), 33);

        let path = pin_path_length(0.508, 0.038, 0.762, 0.66, 0.02);
        assert!((indexed_volume(&design, MIDDLE_PIN) - 0.02 * 3.0 * 0.053 * path).abs() < 1e-12);
        assert!((indexed_volume(&design, SIDE_PIN) - 0.02 * 2.0 * 0.053 * path).abs() < 1e-12);
    }

    #[test]
    fn post_volume_loses_the_tip_chamfer() {
        let mut design = Design::new("dip");
        run(&mut design, &ParameterSet::new());

        let component = design.component(design.root()).unwrap();
        let (_, post) = component
            .history
            .active_bodies()
            .find(|(_, body)| body.name == "PinBottom")
            .unwrap();
        let expected = 0.02 * 0.053 * 0.24 - 2.0 * 0.053 * 0.053 * 0.02 / 9.0;
        assert!((post.volume - expected).abs() < 1e-12);
    }

    #[test]
    fn four_pin_body_keeps_only_corner_legs() {
        let mut design = Design::new("dip");
        run(&mut design, &ParameterSet::new().with("DPins", 4.0));

        let component = design.component(design.root()).unwrap();
        // body + 4 corner shoulders + 4 posts, interior shoulders suppressed
        assert_eq!(component.history.active_body_count(), 9);
    }

    #[test]
    fn body_height_update_stretches_the_leg_path() {
        let mut design = Design::new("dip");
        run(&mut design, &ParameterSet::new());
        let before = design.component(design.root()).unwrap().history.len();

        run(&mut design, &ParameterSet::new().with("A", 0.6));
        let component = design.component(design.root()).unwrap();
        assert_eq!(component.history.len(), before);

        let path = pin_path_length(0.6, 0.038, 0.762, 0.66, 0.02);
        assert!((indexed_volume(&design, MIDDLE_PIN) - 0.02 * 3.0 * 0.053 * path).abs() < 1e-12);
    }
}
