//! BGA: a two-tier moulded body over a full grid of solder balls.
//!
//! The mould is split into a slightly inset top tier and a full-size mid
//! tier so the step shows in silhouette. Balls are spheres sitting half
//! proud of the seating plane, patterned in both directions from the
//! corner ball. Tier heights derive from the ball diameter through a
//! threshold rule, so the update path re-measures them the way the
//! no-lead stock does.

use crate::error::GenerateResult;
use crate::generator::context::BuildContext;
use crate::generator::feature_ops::{set_indexed_area, set_indexed_distance, Arg};
use crate::generator::framework::{PackageBuilder, ParamSpec, Resolved};
use crate::generator::packages::PackageType;
use crate::generator::sketch_ops;
use crate::model::material::{Finish, Material, Rgb};
use crate::model::{BasePlane, FeatureKey, Point2, SketchPlane};
use std::f64::consts::PI;

const TOP_BODY: FeatureKey = FeatureKey("top_body");
const MID_BODY: FeatureKey = FeatureKey("mid_body");
const BALL: FeatureKey = FeatureKey("ball");

/// Mould inset of the top tier against the mid tier.
const TIER_INSET: f64 = 0.01;
/// Balls keep this much of their diameter inside the body.
const BALL_SINK: f64 = 0.01;
/// Diameter below which the ball sits half-sunk instead.
const BALL_THRESHOLD: f64 = 0.015;

const MID_BODY_GREEN: Rgb = Rgb::new(0, 77, 26);

/// Heights of the top and mid tiers. Large balls keep a fixed sink into
/// the body; small ones sink to their equator.
fn tier_heights(a: f64, b: f64) -> (f64, f64) {
    let ball_rise = if b > BALL_THRESHOLD { b - BALL_SINK } else { b / 2.0 };
    let mid = (a - ball_rise) * 2.0 / 3.0;
    (mid / 2.0, mid)
}

pub struct Bga;

impl PackageBuilder for Bga {
    fn package_type(&self) -> PackageType {
        PackageType::Bga
    }

    fn params(&self) -> &'static [ParamSpec] {
        const PARAMS: &[ParamSpec] = &[
            ParamSpec::length("A", 0.1, "body height"),
            ParamSpec::length("b", 0.03, "ball diameter"),
            ParamSpec::length("D", 0.62, "body length"),
            ParamSpec::length("E", 0.62, "body width"),
            ParamSpec::length("d", 0.05, "horizontal ball pitch"),
            ParamSpec::length("e", 0.05, "vertical ball pitch"),
            ParamSpec::count("DPins", 11, "vertical balls"),
            ParamSpec::count("EPins", 11, "horizontal balls"),
        ];
        PARAMS
    }

    fn create(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let a = resolved.dim("A");
        let b = resolved.dim("b");
        let d = resolved.dim("D");
        let e_w = resolved.dim("E");
        let d_pitch = resolved.dim("d");
        let e_pitch = resolved.dim("e");
        let d_balls = resolved.count("DPins");
        let e_balls = resolved.count("EPins");
        let (top, mid) = tier_heights(a, b);

        let mut ops = ctx.ops();

        // Top tier, inset all round, hanging from the body top.
        ops.plane("TopBodyPlaneXy", BasePlane::Xy, Arg::expr(a, "param_A"))?;
        let top_sketch = ops.sketch("TopBodySketch", SketchPlane::offset_from(BasePlane::Xy, a));
        sketch_ops::center_rectangle(
            ops.sketch_mut(top_sketch),
            Point2::new(0.0, 0.0),
            e_w - TIER_INSET,
            d - TIER_INSET,
        );
        let top_profile = ops.rect(
            Arg::expr(e_w - TIER_INSET, "param_E - 0.01"),
            Arg::expr(d - TIER_INSET, "param_D - 0.01"),
        )?;
        let top_body = ops.extrude("TopBody", top_profile, Arg::lit(-top), "TopBody", Finish::body())?;

        // Printed pin-1 dot, sized off the ball diameter.
        let mark_center = Point2::new(-e_w / 2.0 + 0.03, d / 2.0 - 0.03);
        ops.sketch_mut(top_sketch).add_circle(mark_center, b / 2.0);
        let mark_profile = ops.circle(Arg::expr(b / 2.0, "param_b/2"))?;
        ops.extrude_cut("PinOneMark", mark_profile, Arg::lit(-0.005), top_body.body)?;

        let mid_plane = a - top;
        ops.plane("MidBodyPlaneXy", BasePlane::Xy, Arg::lit(mid_plane))?;
        let mid_sketch =
            ops.sketch("MidBodySketch", SketchPlane::offset_from(BasePlane::Xy, mid_plane));
        sketch_ops::center_rectangle(ops.sketch_mut(mid_sketch), Point2::new(0.0, 0.0), e_w, d);
        let mid_profile = ops.rect(Arg::expr(e_w, "param_E"), Arg::expr(d, "param_D"))?;
        let mid_body = ops.extrude(
            "MidBody",
            mid_profile,
            Arg::lit(-mid),
            "MidBody",
            Finish::body().with_rgb(MID_BODY_GREEN),
        )?;

        // Corner ball revolved from its half-disc, then gridded. The
        // grid walks back across both pitches from the far corner.
        let pad_e = f64::from(e_balls.max(1) - 1) * e_pitch / 2.0;
        let pad_d = f64::from(d_balls.max(1) - 1) * d_pitch / 2.0;
        ops.plane("BallPlaneXy", BasePlane::Xy, Arg::expr(b / 2.0, "param_b/2"))?;
        let ball_sketch =
            ops.sketch("BallSketch", SketchPlane::offset_from(BasePlane::Xy, b / 2.0));
        ops.sketch_mut(ball_sketch)
            .add_circle(Point2::new(pad_e, pad_d), b / 2.0);
        let ball = ops.revolve(
            "Ball",
            ops.area(PI * b * b / 8.0),
            Arg::expr(2.0 * b / (3.0 * PI), "2 * param_b / (3 * 3.141592653589793)"),
            360.0,
            "Ball",
            Finish::of(Material::LeadSolder),
        )?;
        ops.pattern(
            "PinPattern",
            &[ball.feature],
            e_balls,
            Arg::expr(-e_pitch, "-param_e"),
            d_balls,
            Arg::expr(-d_pitch, "-param_d"),
        )?;

        ops.index(TOP_BODY, top_body.feature);
        ops.index(MID_BODY, mid_body.feature);
        ops.index(BALL, ball.feature);
        ops.commit()
    }

    fn update(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let b = resolved.dim("b");
        let (top, mid) = tier_heights(resolved.dim("A"), b);
        let component = ctx.component();
        set_indexed_distance(component, TOP_BODY, -top)?;
        set_indexed_distance(component, MID_BODY, -mid)?;
        set_indexed_area(component, BALL, PI * b * b / 8.0)
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
        drive(&mut ctx, &Bga, params).unwrap();
    }

    fn indexed_volume(design: &Design, key: FeatureKey) -> f64 {
        let component = design.component(design.root()).unwrap();
        let feature = component.indexed(key).unwrap();
        let body = component.history.get(feature).unwrap().bodies[0];
        component.history.body(body).unwrap().volume
    }

    #[test]
    fn full_grid_of_spherical_balls() {
        let mut design = Design::new("bga");
        run(&mut design, &ParameterSet::new());

        let component = design.component(design.root()).unwrap();
        // two tiers + 11 x 11 balls
        assert_eq!(component.history.active_body_count(), 123);

        // revolved half-disc comes out as the sphere of diameter b
        let sphere = PI * 0.03_f64.powi(3) / 6.0;
        assert!((indexed_volume(&design, BALL) - sphere).abs() < 1e-12);
    }

    #[test]
    fn tier_heights_follow_the_ball_diameter() {
        let mut design = Design::new("bga");
        run(&mut design, &ParameterSet::new());

        // b = 0.03 rises b - 0.01, leaving 0.08 for the mould tiers
        let mid = 0.08 * 2.0 / 3.0;
        let top = mid / 2.0;
        let mark = PI * 0.015 * 0.015 * 0.005;
        assert!((indexed_volume(&design, TOP_BODY) - (0.61 * 0.61 * top - mark)).abs() < 1e-9);
        assert!((indexed_volume(&design, MID_BODY) - 0.62 * 0.62 * mid).abs() < 1e-9);
    }

    #[test]
    fn small_balls_sink_to_their_equator_on_update() {
        let mut design = Design::new("bga");
        run(&mut design, &ParameterSet::new());
        let before = design.component(design.root()).unwrap().history.len();

        run(&mut design, &ParameterSet::new().with("b", 0.012));
        let component = design.component(design.root()).unwrap();
        assert_eq!(component.history.len(), before);

        let sphere = PI * 0.012_f64.powi(3) / 6.0;
        assert!((indexed_volume(&design, BALL) - sphere).abs() < 1e-12);

        // equator rule: mould gets A - b/2
        let mid = (0.1 - 0.006) * 2.0 / 3.0;
        assert!((indexed_volume(&design, MID_BODY) - 0.62 * 0.62 * mid).abs() < 1e-9);
    }
}
