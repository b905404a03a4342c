//! QFN: leadless lands on all four sides of a moulded body.
//!
//! Each land is a flat pad with a rounded inner end, paired with a
//! slightly taller side piece that carries the plating up the body edge.
//! The body itself hangs from its top plane down to the land stock, so
//! the pads show underneath. An optional exposed thermal pad sits in the
//! centre.

use crate::error::GenerateResult;
use crate::generator::context::BuildContext;
use crate::generator::feature_ops::{set_indexed_area, Arg};
use crate::generator::framework::{
    FlagSpec, OptionalFeature, PackageBuilder, ParamSpec, Resolved,
};
use crate::generator::packages::PackageType;
use crate::generator::sketch_ops;
use crate::model::feature::ProfileSpec;
use crate::model::material::{Appearance, Finish, Material};
use crate::model::{BasePlane, Dim, FeatureKey, Point2, SketchPlane};
use std::f64::consts::PI;

const TERMINAL_D: FeatureKey = FeatureKey("terminal_d");
const TERMINAL_SIDE_D: FeatureKey = FeatureKey("terminal_side_d");
const TERMINAL_E: FeatureKey = FeatureKey("terminal_e");
const TERMINAL_SIDE_E: FeatureKey = FeatureKey("terminal_side_e");
const THERMAL_PAD: FeatureKey = FeatureKey("thermal_pad");

const TERMINAL_THICKNESS: f64 = 0.005;
/// How far the side plating runs up past the land stock.
const SIDE_RISE: f64 = 0.01;
/// Printed pin-1 dot: fixed size, shallow cut.
const MARK_RADIUS: f64 = 0.015;
const MARK_DEPTH: f64 = 0.01;

/// Land area: a rectangle whose inner end is a semicircle.
fn land_area(length: f64, width: f64) -> f64 {
    (length - width / 2.0) * width + PI * (width / 2.0) * (width / 2.0) / 2.0
}

fn lead_finish() -> Finish {
    Finish::of(Material::CopperAlloy).with_appearance(Appearance::NickelPolished)
}

pub struct Qfn;

impl PackageBuilder for Qfn {
    fn package_type(&self) -> PackageType {
        PackageType::Qfn
    }

    fn params(&self) -> &'static [ParamSpec] {
        const PARAMS: &[ParamSpec] = &[
            ParamSpec::length("e", 0.05, "pin pitch"),
            ParamSpec::length("L", 0.04, "pin length"),
            ParamSpec::length("b", 0.03, "pin width"),
            ParamSpec::length("D", 0.51, "body length"),
            ParamSpec::length("E", 0.41, "body width"),
            ParamSpec::length("A", 0.1, "body height"),
            ParamSpec::count("DPins", 16, "D side pins"),
            ParamSpec::count("EPins", 12, "E side pins"),
            ParamSpec::length("D1", 0.32, "thermal pad length"),
            ParamSpec::length("E1", 0.42, "thermal pad width"),
        ];
        PARAMS
    }

    fn flags(&self) -> &'static [FlagSpec] {
        const FLAGS: &[FlagSpec] = &[FlagSpec::detail("thermal")];
        FLAGS
    }

    fn optional_features(&self) -> &'static [OptionalFeature] {
        const OPTIONAL: &[OptionalFeature] = &[OptionalFeature::when_set("thermal", THERMAL_PAD)];
        OPTIONAL
    }

    fn create(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let pitch = resolved.dim("e");
        let land = resolved.dim("L");
        let b = resolved.dim("b");
        let d = resolved.dim("D");
        let e_w = resolved.dim("E");
        let a = resolved.dim("A");
        let d_side = resolved.count("DPins") / 2;
        let e_side = resolved.count("EPins") / 2;
        let tt = TERMINAL_THICKNESS;

        let mut ops = ctx.ops();

        // Body hangs from its top plane down to the land stock.
        ops.plane("BodyPlaneXy", BasePlane::Xy, Arg::expr(a, "param_A"))?;
        let body_sketch = ops.sketch("BodySketch", SketchPlane::offset_from(BasePlane::Xy, a));
        sketch_ops::center_rectangle(ops.sketch_mut(body_sketch), Point2::new(0.0, 0.0), d, e_w);
        let profile = ops.rect(Arg::expr(d, "param_D"), Arg::expr(e_w, "param_E"))?;
        let body = ops.extrude(
            "Body",
            profile,
            Arg::expr(-a + tt, "-param_A + 0.005"),
            "Body",
            Finish::body(),
        )?;
        ops.chamfer(
            "BodyChamfer",
            body.body,
            Arg::expr(0.1 * (a - tt), "0.1 * (param_A - 0.005)"),
            Arg::expr(0.1 * (a - tt), "0.1 * (param_A - 0.005)"),
            Arg::expr(2.0 * (d + e_w), "(param_D + param_E) * 2"),
        )?;

        // Printed pin-1 dot in the body top, fixed size.
        let mark_center = Point2::new(-d / 2.0 + 0.03, e_w / 2.0 - 0.03);
        ops.sketch_mut(body_sketch).add_circle(mark_center, MARK_RADIUS);
        let mark_profile = ProfileSpec::Circle {
            radius: Dim::literal(MARK_RADIUS),
        };
        ops.extrude_cut("PinOneMark", mark_profile, Arg::lit(-MARK_DEPTH), body.body)?;

        // D-side land and its taller side piece share one outline.
        let d_row = f64::from(d_side.max(1) - 1) * pitch / 2.0;
        let d_sketch = ops.sketch("TerminalDSketch", SketchPlane::offset_from(BasePlane::Xy, 0.0));
        sketch_ops::center_rectangle(
            ops.sketch_mut(d_sketch),
            Point2::new(d / 2.0 + 0.0001 - land / 2.0, d_row),
            land,
            b,
        );
        sketch_ops::semicircle(
            ops.sketch_mut(d_sketch),
            Point2::new(d / 2.0 - land + b / 2.0, d_row),
            b / 2.0,
        );
        let area = land_area(land, b);
        let terminal_d = ops.extrude(
            "TerminalD",
            ops.area(area),
            Arg::lit(tt),
            "TerminalD",
            lead_finish(),
        )?;
        let side_d = ops.extrude(
            "TerminalSideD",
            ops.area(area),
            Arg::lit(tt + SIDE_RISE),
            "TerminalSideD",
            lead_finish(),
        )?;
        ops.mirror_and_pattern(
            "TerminalD",
            terminal_d.feature,
            BasePlane::Yz,
            d_side,
            Arg::expr(-pitch, "-param_e"),
        )?;
        ops.mirror_and_pattern(
            "TerminalSideD",
            side_d.feature,
            BasePlane::Yz,
            d_side,
            Arg::expr(-pitch, "-param_e"),
        )?;

        let e_row = f64::from(e_side.max(1) - 1) * pitch / 2.0;
        let e_sketch = ops.sketch("TerminalESketch", SketchPlane::offset_from(BasePlane::Xy, 0.0));
        sketch_ops::center_rectangle(
            ops.sketch_mut(e_sketch),
            Point2::new(e_row, e_w / 2.0 + 0.0001 - land / 2.0),
            b,
            land,
        );
        sketch_ops::semicircle(
            ops.sketch_mut(e_sketch),
            Point2::new(e_row, e_w / 2.0 - land + b / 2.0),
            b / 2.0,
        );
        let terminal_e = ops.extrude(
            "TerminalE",
            ops.area(area),
            Arg::lit(tt),
            "TerminalE",
            lead_finish(),
        )?;
        let side_e = ops.extrude(
            "TerminalSideE",
            ops.area(area),
            Arg::lit(tt + SIDE_RISE),
            "TerminalSideE",
            lead_finish(),
        )?;
        ops.mirror_and_pattern(
            "TerminalE",
            terminal_e.feature,
            BasePlane::Xz,
            e_side,
            Arg::expr(-pitch, "-param_e"),
        )?;
        ops.mirror_and_pattern(
            "TerminalSideE",
            side_e.feature,
            BasePlane::Xz,
            e_side,
            Arg::expr(-pitch, "-param_e"),
        )?;

        let thermal = ops.thermal_pad(
            Arg::expr(resolved.dim("E1"), "param_E1"),
            Arg::expr(resolved.dim("D1"), "param_D1"),
            Arg::lit(tt),
            Arg::lit(0.0),
        )?;

        ops.index(TERMINAL_D, terminal_d.feature);
        ops.index(TERMINAL_SIDE_D, side_d.feature);
        ops.index(TERMINAL_E, terminal_e.feature);
        ops.index(TERMINAL_SIDE_E, side_e.feature);
        ops.index(THERMAL_PAD, thermal.feature);
        ops.commit()
    }

    fn update(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let area = land_area(resolved.dim("L"), resolved.dim("b"));
        let component = ctx.component();
        set_indexed_area(component, TERMINAL_D, area)?;
        set_indexed_area(component, TERMINAL_SIDE_D, area)?;
        set_indexed_area(component, TERMINAL_E, area)?;
        set_indexed_area(component, TERMINAL_SIDE_E, area)
    }
}
