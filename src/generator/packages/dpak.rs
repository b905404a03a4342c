//! DPAK: a power package built sideways against the YZ plane.
//!
//! The moulded slab stands on edge with a gull-wing row in front and a
//! bare tab pin reaching out the back. The middle front pin can be
//! truncated, which is common on two-lead regulators, so the cut is kept
//! in the history and suppressed while the flag is clear.

use crate::error::{GenerateError, GenerateResult};
use crate::generator::context::BuildContext;
use crate::generator::feature_ops::{set_indexed_area, Arg};
use crate::generator::framework::{
    FlagSpec, OptionalFeature, PackageBuilder, ParamSpec, Resolved,
};
use crate::generator::packages::PackageType;
use crate::generator::params::ParameterSet;
use crate::generator::sketch_ops;
use crate::model::material::Finish;
use crate::model::{BasePlane, FeatureKey, Point2, SketchPlane};

const COMMON_PIN: FeatureKey = FeatureKey("common_pin");
const TRUNCATE: FeatureKey = FeatureKey("truncate");

/// JEDEC nominal lead-frame thickness, also the cap for requests.
const TERMINAL_THICKNESS: f64 = 0.02;

/// How far the lead reaches from tip to its seat inside the mould.
fn lead_reach(span: f64, body_width: f64, pad_length: f64) -> f64 {
    span - body_width - pad_length
}

pub struct Dpak;

impl PackageBuilder for Dpak {
    fn package_type(&self) -> PackageType {
        PackageType::Dpak
    }

    fn params(&self) -> &'static [ParamSpec] {
        const PARAMS: &[ParamSpec] = &[
            ParamSpec::length("A", 0.2, "body height"),
            ParamSpec::length("A1", 0.0, "body offset"),
            ParamSpec::length("E", 1.054, "span"),
            ParamSpec::length("E1", 0.7015, "body width"),
            ParamSpec::length("D", 0.8395, "body length"),
            ParamSpec::length("e", 0.254, "pitch"),
            ParamSpec::length("b", 0.071, "terminal length"),
            ParamSpec::length("b1", 0.559, "tab width"),
            ParamSpec::length("L", 0.0915, "terminal width"),
            ParamSpec::length("L1", 0.101, "thermal pad length"),
            ParamSpec::length("E2", 0.649, "thermal pad width"),
            ParamSpec::length("terminalThickness", TERMINAL_THICKNESS, "terminal thickness"),
            ParamSpec::count("DPins", 6, "pins"),
        ];
        PARAMS
    }

    fn flags(&self) -> &'static [FlagSpec] {
        const FLAGS: &[FlagSpec] = &[FlagSpec::detail("truncatedFlag")];
        FLAGS
    }

    fn optional_features(&self) -> &'static [OptionalFeature] {
        const OPTIONAL: &[OptionalFeature] =
            &[OptionalFeature::when_set("truncatedFlag", TRUNCATE)];
        OPTIONAL
    }

    fn derive(&self, resolved: &mut Resolved, params: &ParameterSet) {
        resolved.set_dim(
            "terminalThickness",
            params.terminal_thickness(TERMINAL_THICKNESS),
        );
    }

    fn create(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let a = resolved.dim("A");
        let span = resolved.dim("E");
        let body_w = resolved.dim("E1");
        let d = resolved.dim("D");
        let pitch = resolved.dim("e");
        let b = resolved.dim("b");
        let b1 = resolved.dim("b1");
        let foot = resolved.dim("L");
        let l1 = resolved.dim("L1");
        let e2 = resolved.dim("E2");
        let tt = resolved.dim("terminalThickness");
        let front = resolved.count("DPins").saturating_sub(1).max(1);
        let reach = lead_reach(span, body_w, l1);

        let mut ops = ctx.ops();

        // Slab on edge: the sketch holds height and length, the extrude
        // carries the body width.
        let body_off = span / 2.0 - body_w - l1;
        ops.plane(
            "BodyPlaneYz",
            BasePlane::Yz,
            Arg::expr(body_off, "param_E/2 - param_E1 - param_L1"),
        )?;
        let body_sketch = ops.sketch("BodySketch", SketchPlane::offset_from(BasePlane::Yz, body_off));
        sketch_ops::center_rectangle(ops.sketch_mut(body_sketch), Point2::new(-a / 2.0, 0.0), a, d);
        let body_profile = ops.rect(Arg::expr(a, "param_A"), Arg::expr(d, "param_D"))?;
        let body = ops.extrude(
            "Body",
            body_profile,
            Arg::expr(body_w, "param_E1"),
            "Body",
            Finish::body(),
        )?;
        ops.chamfer(
            "Chamfer1",
            body.body,
            Arg::expr(a - tt, "param_A - param_terminalThickness"),
            Arg::expr(a / 5.0, "param_A/5"),
            Arg::expr(d, "param_D"),
        )?;
        ops.chamfer(
            "Chamfer2",
            body.body,
            Arg::expr((a - tt) / 2.0, "(param_A - param_terminalThickness)/2"),
            Arg::expr(a / 10.0, "param_A/10"),
            Arg::expr(2.0 * d, "param_D * 2"),
        )?;

        // Front row: one gull lead at the row top, patterned down.
        let row = pitch / 2.0 * f64::from(front - 1);
        ops.plane(
            "FrontPinPlaneXz",
            BasePlane::Xz,
            Arg::expr(row, "param_e/2 * (param_DPins - 2)"),
        )?;
        let pin_sketch =
            ops.sketch("FrontPinSketch", SketchPlane::offset_from(BasePlane::Xz, row));
        let area = sketch_ops::gullwing_outline(
            ops.sketch_mut(pin_sketch),
            Point2::new(span / 2.0 - reach, 0.0),
            1.0,
            reach,
            a / 2.0 + tt / 2.0,
            tt,
            foot,
        );
        let common = ops.extrude(
            "CommonPin",
            ops.area(area),
            Arg::expr(b, "param_b"),
            "CommonPin",
            Finish::terminal(),
        )?;
        let pattern = ops.pattern(
            "PinPattern",
            &[common.feature],
            front,
            Arg::expr(-pitch, "-param_e"),
            1,
            Arg::lit(0.0),
        )?;

        // Tab pin out the back, chamfered at its free end.
        let tab_off = span / 2.0 - e2;
        ops.plane("TabPinPlaneYz", BasePlane::Yz, Arg::expr(tab_off, "param_E/2 - param_E2"))?;
        let tab_sketch =
            ops.sketch("TabPinSketch", SketchPlane::offset_from(BasePlane::Yz, tab_off));
        sketch_ops::center_rectangle(
            ops.sketch_mut(tab_sketch),
            Point2::new((-tt + 0.0002) / 2.0, 0.0),
            tt,
            b1,
        );
        let tab_profile = ops.rect(Arg::expr(tt, "param_terminalThickness"), Arg::expr(b1, "param_b1"))?;
        let tab = ops.extrude(
            "TabPin",
            tab_profile,
            Arg::expr(e2, "param_E2"),
            "TabPin",
            Finish::terminal(),
        )?;
        ops.chamfer(
            "TabChamfer",
            tab.body,
            Arg::expr(e2 / 10.0, "param_E2/10"),
            Arg::expr(e2 / 10.0, "param_E2/10"),
            Arg::expr(2.0 * b1, "param_b1 * 2"),
        )?;

        // Truncation cut over the middle front pin. Always present so the
        // flag can toggle it without rebuilding.
        let middle = if front >= 2 {
            let index = (front / 2 - 1) as usize;
            let component = ops.component();
            let body = component
                .history
                .get(pattern)
                .and_then(|record| record.bodies.get(index).copied());
            let name = component.name.clone();
            body.ok_or_else(|| GenerateError::structural_mismatch(TRUNCATE.0, name))?
        } else {
            common.body
        };
        let trunc_sketch =
            ops.sketch("TruncateSketch", SketchPlane::offset_from(BasePlane::Xy, 0.0));
        sketch_ops::center_rectangle(
            ops.sketch_mut(trunc_sketch),
            Point2::new(-span / 2.0, 0.0),
            1.5 * reach,
            b,
        );
        let truncate = ops.extrude_cut(
            "Truncate",
            ops.area(0.75 * reach * b),
            Arg::expr(tt, "param_terminalThickness"),
            middle,
        )?;

        // Printed pin-1 dot floats on its own plane ahead of the mould
        // face and dimples the body.
        let mark_off = body_off + a / 10.0 + d / 10.0;
        ops.plane(
            "PinOneMarkPlaneYz",
            BasePlane::Yz,
            Arg::expr(mark_off, "param_E/2 - param_E1 - param_L1 + param_A/10 + param_D/10"),
        )?;
        let mark_sketch =
            ops.sketch("PinOneMarkSketch", SketchPlane::offset_from(BasePlane::Yz, mark_off));
        ops.sketch_mut(mark_sketch).add_circle(
            Point2::new(d / 2.0 - a / 10.0 - d / 10.0, 0.9 * a),
            d / 20.0,
        );
        let mark_profile = ops.circle(Arg::expr(d / 20.0, "param_D/20"))?;
        ops.extrude_cut("PinOneMark", mark_profile, Arg::expr(-a / 10.0, "-param_A/10"), body.body)?;

        ops.index(COMMON_PIN, common.feature);
        ops.index(TRUNCATE, truncate);
        ops.commit()
    }

    fn update(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let reach = lead_reach(
            resolved.dim("E"),
            resolved.dim("E1"),
            resolved.dim("L1"),
        );
        let tt = resolved.dim("terminalThickness");
        let b = resolved.dim("b");
        let component = ctx.component();
        set_indexed_area(component, COMMON_PIN, tt * reach)?;
        set_indexed_area(component, TRUNCATE, 0.75 * reach * b)
    }
}
