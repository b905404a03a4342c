//! Chip arrays: strips of passive elements sharing one ceramic block.
//!
//! Three variants. The convex form shrinks the body by a terminal length
//! per side and stands separate tin prisms in the margin; the flat forms
//! keep a full-width body, bite a seat for every terminal out of it and
//! drop tin slabs into the seats. A castellated slab loses the half-bore
//! drilled through the package edge, a flat slab keeps it filled. Seat
//! and slab profiles are irregular, so updates patch their areas.

use crate::error::GenerateResult;
use crate::generator::context::BuildContext;
use crate::generator::feature_ops::{recolour_indexed, set_indexed_area, Arg};
use crate::generator::framework::{FlagSpec, PackageBuilder, ParamSpec, Resolved};
use crate::generator::packages::PackageType;
use crate::generator::sketch_ops;
use crate::model::material::{Finish, Material};
use crate::model::{BasePlane, FeatureKey, Point2, Sketch, SketchPlane};
use std::f64::consts::FRAC_PI_2;

const BODY: FeatureKey = FeatureKey("body");
const END_GAP: FeatureKey = FeatureKey("end_gap");
const END_LEAD: FeatureKey = FeatureKey("end_lead");
const SIDE_GAP: FeatureKey = FeatureKey("side_gap");
const SIDE_LEAD: FeatureKey = FeatureKey("side_lead");

/// Radius of the half-bore through a castellated terminal.
fn bore_radius(terminal_width: f64) -> f64 {
    (terminal_width - 0.02) / 2.0
}

/// One terminal slab footprint; castellated slabs lose the half-bore.
fn lead_area(width: f64, length: f64, flat: bool) -> f64 {
    let r = bore_radius(width);
    if flat {
        width * length
    } else {
        FRAC_PI_2.mul_add(-(r * r), width * length)
    }
}

/// Draws one side-row terminal seat: a rectangle flush with the body
/// edge and the half-bore circle centred on that edge, at the top end
/// of the pin row.
fn draw_side_seat(sketch: &mut Sketch, body_width: f64, length: f64, width: f64, row_end: f64) {
    sketch_ops::center_rectangle(
        sketch,
        Point2::new(body_width / 2.0 - length / 2.0, row_end),
        length,
        width,
    );
    sketch_ops::semicircle(
        sketch,
        Point2::new(body_width / 2.0, row_end),
        bore_radius(width),
    );
}

pub struct ChipArray2SideConvex;

impl PackageBuilder for ChipArray2SideConvex {
    fn package_type(&self) -> PackageType {
        PackageType::ChipArray2SideConvex
    }

    fn params(&self) -> &'static [ParamSpec] {
        const PARAMS: &[ParamSpec] = &[
            ParamSpec::length("e", 0.064, "pin pitch"),
            ParamSpec::count("DPins", 10, "total pins"),
            ParamSpec::length("A", 0.07, "body height"),
            ParamSpec::length("b", 0.04, "terminal width"),
            ParamSpec::length("b1", 0.055, "end terminal width"),
            ParamSpec::length("D", 0.34, "body length"),
            ParamSpec::length("E", 0.24, "body width"),
            ParamSpec::length("L", 0.055, "terminal length"),
        ];
        PARAMS
    }

    fn create(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let e = resolved.dim("e");
        let pins = resolved.count("DPins");
        let a = resolved.dim("A");
        let b = resolved.dim("b");
        let b1 = resolved.dim("b1");
        let d = resolved.dim("D");
        let e_wid = resolved.dim("E");
        let l = resolved.dim("L");
        let rgb = resolved.rgb();
        let row = f64::from(pins / 2);

        let mut ops = ctx.ops();

        ops.plane("BodyOffset", BasePlane::Xy, Arg::lit(0.0005))?;
        let body_sketch = ops.sketch("BodySketch", SketchPlane::offset_from(BasePlane::Xy, 0.0005));
        sketch_ops::center_rectangle(
            ops.sketch_mut(body_sketch),
            Point2::new(0.0, 0.0),
            e_wid - 2.0 * l,
            d,
        );
        let body_profile = ops.rect(
            Arg::expr(2.0f64.mul_add(-l, e_wid), "param_E - 2 * param_L"),
            Arg::expr(d, "param_D"),
        )?;
        let body = ops.extrude(
            "Body",
            body_profile,
            Arg::expr(a - 0.001, "param_A - 0.001"),
            "ChipBody",
            Finish::of(Material::Ceramic).with_rgb(rgb),
        )?;

        // Corner terminals, one pitch row in from each body end.
        let end_sketch = ops.sketch("EndPinSketch", SketchPlane::offset_from(BasePlane::Xy, 0.0));
        sketch_ops::center_rectangle(
            ops.sketch_mut(end_sketch),
            Point2::new(e_wid / 2.0 - l / 2.0, (row - 1.0) * e / 2.0),
            l,
            b1,
        );
        let end_profile = ops.rect(Arg::expr(l, "param_L"), Arg::expr(b1, "param_b1"))?;
        let end = ops.extrude(
            "EndTerminal",
            end_profile,
            Arg::expr(a, "param_A"),
            "EndTerminal",
            Finish::terminal(),
        )?;
        ops.mirror_and_pattern(
            "EndTerminal",
            end.feature,
            BasePlane::Xz,
            2,
            Arg::expr(-(e_wid - l), "-param_E + param_L"),
        )?;

        let mid_sketch = ops.sketch("MidPinSketch", SketchPlane::offset_from(BasePlane::Xy, 0.0));
        sketch_ops::center_rectangle(
            ops.sketch_mut(mid_sketch),
            Point2::new(e_wid / 2.0 - l / 2.0, (row - 3.0) * e / 2.0),
            l,
            b,
        );
        let mid_profile = ops.rect(Arg::expr(l, "param_L"), Arg::expr(b, "param_b"))?;
        let mid = ops.extrude(
            "MidTerminal",
            mid_profile,
            Arg::expr(a, "param_A"),
            "MidTerminal",
            Finish::terminal(),
        )?;
        let (across, repeat) = ops.mirror_and_pattern(
            "MidTerminal",
            mid.feature,
            BasePlane::Yz,
            (pins / 2).saturating_sub(2).max(1),
            Arg::expr(-e, "-param_e"),
        )?;

        // Four pins leave nothing between the corner terminals.
        if pins <= 4 {
            let history = &mut ops.component().history;
            history.set_suppressed(mid.feature, true);
            history.set_suppressed(across, true);
            history.set_suppressed(repeat, true);
        }

        ops.index(BODY, body.feature);
        ops.commit()
    }

    fn update(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        recolour_indexed(ctx.component(), BODY, resolved.rgb())
    }
}

pub struct ChipArray2SideFlat;

impl PackageBuilder for ChipArray2SideFlat {
    fn package_type(&self) -> PackageType {
        PackageType::ChipArray2SideFlat
    }

    fn params(&self) -> &'static [ParamSpec] {
        const PARAMS: &[ParamSpec] = &[
            ParamSpec::length("e", 0.127, "pin pitch"),
            ParamSpec::count("DPins", 8, "total pins"),
            ParamSpec::length("A", 0.07, "body height"),
            ParamSpec::length("b", 0.095, "terminal width"),
            ParamSpec::length("D", 0.538, "body length"),
            ParamSpec::length("E", 0.24, "body width"),
            ParamSpec::length("L", 0.055, "terminal length"),
        ];
        PARAMS
    }

    fn flags(&self) -> &'static [FlagSpec] {
        const FLAGS: &[FlagSpec] = &[FlagSpec::detail("isFlatLead")];
        FLAGS
    }

    fn create(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let e = resolved.dim("e");
        let pins = resolved.count("DPins");
        let a = resolved.dim("A");
        let b = resolved.dim("b");
        let d = resolved.dim("D");
        let e_wid = resolved.dim("E");
        let l = resolved.dim("L");
        let flat = resolved.flag("isFlatLead");
        let rgb = resolved.rgb();
        let row_end = (f64::from(pins / 2) - 1.0) * e / 2.0;

        let mut ops = ctx.ops();

        ops.plane("BodyOffset", BasePlane::Xy, Arg::lit(0.0005))?;
        let body_sketch = ops.sketch("BodySketch", SketchPlane::offset_from(BasePlane::Xy, 0.0005));
        sketch_ops::center_rectangle(
            ops.sketch_mut(body_sketch),
            Point2::new(0.0, 0.0),
            e_wid - 0.005,
            d,
        );
        let body_profile = ops.rect(
            Arg::expr(e_wid - 0.005, "param_E - 0.005"),
            Arg::expr(d, "param_D"),
        )?;
        let body = ops.extrude(
            "Body",
            body_profile,
            Arg::expr(a - 0.001, "param_A - 0.001"),
            "ChipBody",
            Finish::of(Material::Ceramic).with_rgb(rgb),
        )?;

        let pin_sketch = ops.sketch("PinSketchVert", SketchPlane::offset_from(BasePlane::Xy, 0.0));
        draw_side_seat(ops.sketch_mut(pin_sketch), e_wid, l, b, row_end);

        // One cut carries every seat on both sides.
        let seats = ops.area(f64::from(pins) * b * l);
        let gap = ops.extrude_cut("GapVert", seats, Arg::expr(a, "param_A"), body.body)?;

        let lead_profile = ops.area(lead_area(b, l, flat));
        let lead = ops.extrude(
            "LeadVertJoin",
            lead_profile,
            Arg::expr(a, "param_A"),
            "Terminal",
            Finish::terminal(),
        )?;
        ops.mirror_and_pattern(
            "LeadVert",
            lead.feature,
            BasePlane::Yz,
            (pins / 2).max(1),
            Arg::expr(-e, "-param_e"),
        )?;

        ops.index(BODY, body.feature);
        ops.index(SIDE_GAP, gap);
        ops.index(SIDE_LEAD, lead.feature);
        ops.commit()
    }

    fn update(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let pins = resolved.count("DPins");
        let b = resolved.dim("b");
        let l = resolved.dim("L");
        let flat = resolved.flag("isFlatLead");

        let component = ctx.component();
        set_indexed_area(component, SIDE_GAP, f64::from(pins) * b * l)?;
        set_indexed_area(component, SIDE_LEAD, lead_area(b, l, flat))?;
        recolour_indexed(component, BODY, resolved.rgb())
    }
}

pub struct ChipArray4SideFlat;

impl PackageBuilder for ChipArray4SideFlat {
    fn package_type(&self) -> PackageType {
        PackageType::ChipArray4SideFlat
    }

    fn params(&self) -> &'static [ParamSpec] {
        const PARAMS: &[ParamSpec] = &[
            ParamSpec::length("e", 0.08, "pin pitch"),
            ParamSpec::count("DPins", 12, "total pins"),
            ParamSpec::length("A", 0.07, "body height"),
            ParamSpec::length("b", 0.055, "side terminal width"),
            ParamSpec::length("b1", 0.065, "end terminal width"),
            ParamSpec::length("D", 0.538, "body length"),
            ParamSpec::length("E", 0.24, "body width"),
            ParamSpec::length("L", 0.055, "side terminal length"),
            ParamSpec::length("L1", 0.05, "end terminal length"),
        ];
        PARAMS
    }

    fn flags(&self) -> &'static [FlagSpec] {
        const FLAGS: &[FlagSpec] = &[FlagSpec::detail("isFlatLead")];
        FLAGS
    }

    fn create(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let e = resolved.dim("e");
        let pins = resolved.count("DPins");
        let a = resolved.dim("A");
        let b = resolved.dim("b");
        let b1 = resolved.dim("b1");
        let d = resolved.dim("D");
        let e_wid = resolved.dim("E");
        let l = resolved.dim("L");
        let l1 = resolved.dim("L1");
        let flat = resolved.flag("isFlatLead");
        let rgb = resolved.rgb();
        // Two pins sit on the body ends, the rest split across the sides.
        let side = pins.saturating_sub(2);
        let row_end = (f64::from(side / 2) - 1.0) * e / 2.0;

        let mut ops = ctx.ops();

        ops.plane("BodyOffset", BasePlane::Xy, Arg::lit(0.0005))?;
        let body_sketch = ops.sketch("BodySketch", SketchPlane::offset_from(BasePlane::Xy, 0.0005));
        sketch_ops::center_rectangle(
            ops.sketch_mut(body_sketch),
            Point2::new(0.0, 0.0),
            e_wid - 0.0005,
            d,
        );
        let body_profile = ops.rect(
            Arg::expr(e_wid - 0.0005, "param_E - 0.0005"),
            Arg::expr(d, "param_D"),
        )?;
        let body = ops.extrude(
            "Body",
            body_profile,
            Arg::expr(a - 0.001, "param_A - 0.001"),
            "ChipBody",
            Finish::of(Material::Ceramic).with_rgb(rgb),
        )?;

        // End terminals, one per short edge.
        let hori_sketch = ops.sketch("PinSketchHori", SketchPlane::offset_from(BasePlane::Xy, 0.0));
        {
            let sk = ops.sketch_mut(hori_sketch);
            sketch_ops::center_rectangle(sk, Point2::new(0.0, d / 2.0 - l1 / 2.0), b1, l1);
            sketch_ops::center_circle(sk, Point2::new(0.0, d / 2.0), b1 - 0.02);
        }
        let end_seats = ops.area(2.0 * b1 * l1);
        let end_gap = ops.extrude_cut("GapHori", end_seats, Arg::expr(a, "param_A"), body.body)?;
        let end_profile = ops.area(lead_area(b1, l1, flat));
        let end = ops.extrude(
            "LeadHoriJoin",
            end_profile,
            Arg::expr(a, "param_A"),
            "EndTerminal",
            Finish::terminal(),
        )?;
        ops.mirror("MirrorHori", &[end.feature], BasePlane::Xz);

        let vert_sketch = ops.sketch("PinSketchVert", SketchPlane::offset_from(BasePlane::Xy, 0.0));
        draw_side_seat(ops.sketch_mut(vert_sketch), e_wid, l, b, row_end);
        let side_seats = ops.area(f64::from(side) * b * l);
        let side_gap = ops.extrude_cut("GapVert", side_seats, Arg::expr(a, "param_A"), body.body)?;
        let lead_profile = ops.area(lead_area(b, l, flat));
        let lead = ops.extrude(
            "LeadVertJoin",
            lead_profile,
            Arg::expr(a, "param_A"),
            "SideTerminal",
            Finish::terminal(),
        )?;
        let (across, repeat) = ops.mirror_and_pattern(
            "LeadVert",
            lead.feature,
            BasePlane::Yz,
            (side / 2).max(1),
            Arg::expr(-e, "-param_e"),
        )?;

        // Two pins means end terminals only.
        if side < 2 {
            let history = &mut ops.component().history;
            history.set_suppressed(lead.feature, true);
            history.set_suppressed(across, true);
            history.set_suppressed(repeat, true);
        }

        ops.index(BODY, body.feature);
        ops.index(END_GAP, end_gap);
        ops.index(END_LEAD, end.feature);
        ops.index(SIDE_GAP, side_gap);
        ops.index(SIDE_LEAD, lead.feature);
        ops.commit()
    }

    fn update(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let side = resolved.count("DPins").saturating_sub(2);
        let b = resolved.dim("b");
        let b1 = resolved.dim("b1");
        let l = resolved.dim("L");
        let l1 = resolved.dim("L1");
        let flat = resolved.flag("isFlatLead");

        let component = ctx.component();
        set_indexed_area(component, END_GAP, 2.0 * b1 * l1)?;
        set_indexed_area(component, END_LEAD, lead_area(b1, l1, flat))?;
        set_indexed_area(component, SIDE_GAP, f64::from(side) * b * l)?;
        set_indexed_area(component, SIDE_LEAD, lead_area(b, l, flat))?;
        recolour_indexed(component, BODY, resolved.rgb())
    }
}
