//! Corner-concave: a ceramic oscillator body with quarter-round
//! castellations bitten out of each corner.
//!
//! The four terminals sit in the bites as thin gold-plated copper
//! slabs under the body; an aluminium lid with filleted corners caps
//! the stack. Pin count is fixed at four, one per corner.

use crate::error::GenerateResult;
use crate::generator::context::BuildContext;
use crate::generator::feature_ops::{set_indexed_area, Arg};
use crate::generator::framework::{PackageBuilder, ParamSpec, Resolved};
use crate::generator::packages::PackageType;
use crate::generator::sketch_ops;
use crate::model::material::{Appearance, Finish, Material};
use crate::model::{BasePlane, FeatureKey, Point2, SketchPlane};
use std::f64::consts::PI;

const BODY: FeatureKey = FeatureKey("body");
const TERMINAL: FeatureKey = FeatureKey("terminal");

/// Terminal slab under the body, fixed thickness.
const TERMINAL_THICKNESS: f64 = 0.001;
const LID_FILLET: f64 = 0.02;

/// Radius of the corner bite.
fn corner_radius(d: f64, d1: f64) -> f64 {
    (d - d1) / 10.0
}

/// Body footprint: the full rectangle minus four quarter-round bites.
fn body_area(d: f64, e: f64, d1: f64) -> f64 {
    let r = corner_radius(d, d1);
    d * e - PI * r * r
}

/// One terminal: the corner quadrant of the margin, minus its bite.
fn terminal_area(d: f64, e: f64, d1: f64, e1: f64) -> f64 {
    let r = corner_radius(d, d1);
    (d - d1) / 2.0 * ((e - e1) / 2.0) - PI * r * r / 4.0
}

pub struct CornerConcave;

impl PackageBuilder for CornerConcave {
    fn package_type(&self) -> PackageType {
        PackageType::CornerConcave
    }

    fn params(&self) -> &'static [ParamSpec] {
        const PARAMS: &[ParamSpec] = &[
            ParamSpec::length("A", 0.2, "body height"),
            ParamSpec::length("D", 0.65, "body length"),
            ParamSpec::length("D1", 0.3, "inner body length"),
            ParamSpec::length("E", 0.4, "body width"),
            ParamSpec::length("E1", 0.15, "inner body width"),
        ];
        PARAMS
    }

    fn create(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let a = resolved.dim("A");
        let d = resolved.dim("D");
        let d1 = resolved.dim("D1");
        let e = resolved.dim("E");
        let e1 = resolved.dim("E1");
        let bite = corner_radius(d, d1);

        let mut ops = ctx.ops();

        ops.plane("BodyOffset", BasePlane::Xy, Arg::lit(TERMINAL_THICKNESS))?;
        let body_sketch = ops.sketch(
            "BodySketch",
            SketchPlane::offset_from(BasePlane::Xy, TERMINAL_THICKNESS),
        );
        let sk = ops.sketch_mut(body_sketch);
        sketch_ops::center_rectangle(sk, Point2::new(0.0, 0.0), d, e);
        for corner in [
            Point2::new(d / 2.0, e / 2.0),
            Point2::new(d / 2.0, -e / 2.0),
            Point2::new(-d / 2.0, -e / 2.0),
            Point2::new(-d / 2.0, e / 2.0),
        ] {
            sketch_ops::center_circle(sk, corner, 2.0 * bite);
        }
        let body_profile = ops.area(body_area(d, e, d1));
        let body = ops.extrude(
            "Body",
            body_profile,
            Arg::expr(0.8 * a - TERMINAL_THICKNESS, "0.8 * param_A - 0.001"),
            "Body",
            Finish::of(Material::Ceramic),
        )?;

        ops.plane("TopBodyOffset", BasePlane::Xy, Arg::expr(a, "param_A"))?;
        let lid_sketch = ops.sketch("TopBodySketch", SketchPlane::offset_from(BasePlane::Xy, a));
        sketch_ops::center_rectangle(
            ops.sketch_mut(lid_sketch),
            Point2::new(0.0, 0.0),
            0.9 * d,
            0.9 * e,
        );
        let lid_profile = ops.rounded_rect(
            Arg::expr(0.9 * d, "param_D * 0.9"),
            Arg::expr(0.9 * e, "param_E * 0.9"),
            Arg::lit(LID_FILLET),
        )?;
        let lid = ops.extrude(
            "TopBody",
            lid_profile,
            Arg::expr(-0.2 * a, "-0.2 * param_A"),
            "TopBody",
            Finish::of(Material::Aluminium),
        )?;

        let terminal_sketch =
            ops.sketch("TerminalSketch", SketchPlane::offset_from(BasePlane::Xy, 0.0));
        let sk = ops.sketch_mut(terminal_sketch);
        sketch_ops::center_rectangle(
            sk,
            Point2::new(d1 / 2.0 + (d - d1) / 4.0, e1 / 2.0 + (e - e1) / 4.0),
            (d - d1) / 2.0,
            (e - e1) / 2.0,
        );
        sketch_ops::center_circle(sk, Point2::new(d / 2.0, e / 2.0), 2.0 * bite);
        let terminal_profile = ops.area(terminal_area(d, e, d1, e1));
        let terminal = ops.extrude(
            "Terminal",
            terminal_profile,
            Arg::lit(TERMINAL_THICKNESS),
            "Terminal",
            Finish::of(Material::CopperAlloy).with_appearance(Appearance::GoldPolished),
        )?;

        let beside = ops.mirror("TerminalMirrorYz", &[terminal.feature], BasePlane::Yz);
        ops.mirror("TerminalMirrorXz", &[terminal.feature], BasePlane::Xz);
        ops.mirror("TerminalMirrorBoth", &[beside], BasePlane::Xz);

        // Marker dot on the lid towards the pin-1 corner.
        let mark_radius = d.max(e) / 50.0;
        let mark_sketch = ops.sketch("PinOneMarkSketch", SketchPlane::offset_from(BasePlane::Xy, a));
        sketch_ops::center_circle(
            ops.sketch_mut(mark_sketch),
            Point2::new(
                -d / 2.0 + 0.1 * d + 2.0 * mark_radius,
                -e / 2.0 + 0.1 * e + 2.0 * mark_radius,
            ),
            2.0 * mark_radius,
        );
        let mark_profile = ops.circle(Arg::expr(mark_radius, "param_D/50"))?;
        ops.extrude_cut("PinOneMark", mark_profile, Arg::lit(-0.01), lid.body)?;

        ops.index(BODY, body.feature);
        ops.index(TERMINAL, terminal.feature);
        ops.commit()
    }

    fn update(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let d = resolved.dim("D");
        let d1 = resolved.dim("D1");
        let e = resolved.dim("E");
        let e1 = resolved.dim("E1");

        let component = ctx.component();
        set_indexed_area(component, BODY, body_area(d, e, d1))?;
        set_indexed_area(component, TERMINAL, terminal_area(d, e, d1, e1))
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
        drive(&mut ctx, &CornerConcave, params).unwrap();
    }

    fn indexed_volume(design: &Design, key: FeatureKey) -> f64 {
        let component = design.component(design.root()).unwrap();
        let feature = component.indexed(key).unwrap();
        let body = component.history.get(feature).unwrap().bodies[0];
        component.history.body(body).unwrap().volume
    }

    #[test]
    fn four_corner_terminals_under_a_lidded_body() {
        let mut design = Design::new("cornerconcave");
        run(&mut design, &ParameterSet::new());

        let component = design.component(design.root()).unwrap();
        // body + lid + 4 terminals
        assert_eq!(component.history.active_body_count(), 6);

        let expected = terminal_area(0.65, 0.4, 0.3, 0.15) * TERMINAL_THICKNESS;
        assert!((indexed_volume(&design, TERMINAL) - expected).abs() < 1e-12);
        let body = body_area(0.65, 0.4, 0.3) * (0.8 * 0.2 - TERMINAL_THICKNESS);
        assert!((indexed_volume(&design, BODY) - body).abs() < 1e-12);
    }

    #[test]
    fn lid_loses_the_marker_dot() {
        let mut design = Design::new("cornerconcave");
        run(&mut design, &ParameterSet::new());

        let component = design.component(design.root()).unwrap();
        let (_, lid) = component
            .history
            .active_bodies()
            .find(|(_, body)| body.name == "TopBody")
            .unwrap();
        let area = 0.9 * 0.65 * (0.9 * 0.4) - (4.0 - PI) * LID_FILLET * LID_FILLET;
        let mark = PI * (0.65 / 50.0) * (0.65 / 50.0) * 0.01;
        assert!((lid.volume - (area * 0.2 * 0.2 - mark)).abs() < 1e-12);
    }

    #[test]
    fn inner_length_update_regrows_the_bites() {
        let mut design = Design::new("cornerconcave");
        run(&mut design, &ParameterSet::new());

        run(&mut design, &ParameterSet::new().with("D1", 0.35));
        let expected = terminal_area(0.65, 0.4, 0.35, 0.15) * TERMINAL_THICKNESS;
        assert!((indexed_volume(&design, TERMINAL) - expected).abs() < 1e-12);
    }
}
