//! Pin headers: grids of square gold-plated posts in a PBT strip.
//!
//! The straight header runs every post vertically through the body and
//! chamfers both tips. The right-angle header sweeps one bent path per
//! row and patterns the row along the strip; every row rides the same
//! path from its own seat. The socket variants keep only the tails
//! below the board and bore a countersunk socket for every grid
//! position, one cut carrying the whole grid. V-notches between
//! positions and the end-face chamfers take one fifth of the tightest
//! grid dimension.

use crate::error::GenerateResult;
use crate::generator::context::BuildContext;
use crate::generator::feature_ops::{set_indexed_area, Arg};
use crate::generator::framework::{PackageBuilder, ParamSpec, Resolved};
use crate::generator::packages::PackageType;
use crate::generator::sketch_ops;
use crate::model::material::{Appearance, Finish, Material};
use crate::model::{BasePlane, FeatureKey, Point2, SketchPlane};

const SOCKET: FeatureKey = FeatureKey("socket");

/// Offset that centres the pin grid on the design origin.
const GRID_CENTRE: &str = "(-param_D + param_d * (param_DPins - 1))/2";

/// Full bent path of a right-angle pin, tail tip to post tip.
const BENT_PATH: &str = "param_L3 + param_e * (param_EPins - 1) + (param_E - param_e * (param_EPins - 1))/2 \
     + param_e * (param_EPins - 1) + param_L + param_L1 + param_L2";

/// The same path without the mating post, for the socket tails.
const BENT_TAIL: &str = "param_L3 + param_e * (param_EPins - 1) + (param_E - param_e * (param_EPins - 1))/2 \
     + param_e * (param_EPins - 1) + param_L + param_L1";

fn pin_finish() -> Finish {
    Finish::of(Material::CopperAlloy).with_appearance(Appearance::GoldPolished)
}

/// One socket bore: a square shaft whose mouth opens at 45 degrees over
/// the last seven tenths of a terminal width.
fn socket_volume(b: f64, depth: f64) -> f64 {
    let mouth = 0.7 * b;
    let rim = b + 2.0 * mouth;
    b * b * (depth - mouth) + mouth / 3.0 * (b * b + rim * rim + b * rim)
}

/// Footprint that lets one cut over the full depth carry every bore in
/// the grid.
fn socket_grid_area(b: f64, depth: f64, positions: u32) -> f64 {
    f64::from(positions) * socket_volume(b, depth) / depth
}

pub struct HeaderStraight;

impl PackageBuilder for HeaderStraight {
    fn package_type(&self) -> PackageType {
        PackageType::HeaderStraight
    }

    fn params(&self) -> &'static [ParamSpec] {
        const PARAMS: &[ParamSpec] = &[
            ParamSpec::length("E", 0.556, "body length"),
            ParamSpec::length("d", 0.254, "pitch along D"),
            ParamSpec::length("D", 1.016, "lead span"),
            ParamSpec::length("e", 0.254, "pitch along E"),
            ParamSpec::length("b", 0.064, "terminal thickness"),
            ParamSpec::length("L", 0.254, "body height"),
            ParamSpec::length("L1", 0.3, "terminal tail length"),
            ParamSpec::length("L2", 0.584, "terminal post length"),
            ParamSpec::count("DPins", 4, "pins along D"),
            ParamSpec::count("EPins", 2, "pins along E"),
        ];
        PARAMS
    }

    fn create(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let body_len = resolved.dim("E");
        let pitch_d = resolved.dim("d");
        let span = resolved.dim("D");
        let pitch_e = resolved.dim("e");
        let b = resolved.dim("b");
        let height = resolved.dim("L");
        let l1 = resolved.dim("L1");
        let l2 = resolved.dim("L2");
        let dpins = resolved.count("DPins");
        let epins = resolved.count("EPins");

        let rows_e = pitch_e * f64::from(epins.saturating_sub(1));
        let pad_d = (span - pitch_d * f64::from(dpins.saturating_sub(1))) / 2.0;
        let pad_e = body_len - rows_e;
        let chamfer = pitch_e.min(pitch_d).min(body_len).min(height) / 5.0;
        let perimeter = 2.0 * (body_len + height);

        let mut ops = ctx.ops();

        ops.plane("BodyPlaneYz", BasePlane::Yz, Arg::expr(-pad_d, GRID_CENTRE))?;
        ops.plane("PinPlaneXy", BasePlane::Xy, Arg::expr(-l1, "-param_L1"))?;
        ops.plane("BodySlotPlaneXy", BasePlane::Xy, Arg::expr(height, "param_L"))?;

        // Posts first; the body wraps them afterwards.
        let pin_sketch = ops.sketch("PinSketch", SketchPlane::offset_from(BasePlane::Xy, -l1));
        sketch_ops::center_rectangle(ops.sketch_mut(pin_sketch), Point2::new(0.0, 0.0), b, b);
        let pin_profile = ops.rect(Arg::expr(b, "param_b"), Arg::expr(b, "param_b"))?;
        let pin = ops.extrude(
            "Pin",
            pin_profile,
            Arg::expr(height + l1 + l2, "param_L + param_L1 + param_L2"),
            "Pin",
            pin_finish(),
        )?;
        let tip = Arg::expr(4.0 * b, "param_b * 4");
        ops.chamfer(
            "PinTailChamfer",
            pin.body,
            Arg::expr(b / 4.0, "param_b/4"),
            Arg::expr(b / 1.5, "param_b/1.5"),
            tip,
        )?;
        ops.chamfer(
            "PinPostChamfer",
            pin.body,
            Arg::expr(b / 4.0, "param_b/4"),
            Arg::expr(b / 1.5, "param_b/1.5"),
            tip,
        )?;
        ops.pattern(
            "PinPattern",
            &[pin.feature],
            dpins,
            Arg::expr(pitch_d, "param_d"),
            epins,
            Arg::expr(-pitch_e, "-param_e"),
        )?;

        let body_sketch = ops.sketch("BodySketch", SketchPlane::offset_from(BasePlane::Yz, -pad_d));
        sketch_ops::center_rectangle(
            ops.sketch_mut(body_sketch),
            Point2::new(-height / 2.0, -rows_e / 2.0),
            height,
            body_len,
        );
        let body_profile = ops.rect(Arg::expr(height, "param_L"), Arg::expr(body_len, "param_E"))?;
        let body = ops.extrude(
            "Body",
            body_profile,
            Arg::expr(span, "param_D"),
            "Body",
            Finish::of(Material::PbtPlastic),
        )?;
        let edge = Arg::expr(perimeter, "(param_E + param_L) * 2");
        ops.chamfer(
            "BodyChamferTop",
            body.body,
            Arg::expr(chamfer, "param_d/5"),
            Arg::expr(chamfer, "param_d/5"),
            edge,
        )?;
        ops.chamfer(
            "BodyChamferBottom",
            body.body,
            Arg::expr(chamfer, "param_d/5"),
            Arg::expr(chamfer, "param_d/5"),
            edge,
        )?;

        let slot_sketch = ops.sketch(
            "BodySlotSketch",
            SketchPlane::offset_from(BasePlane::Xy, height),
        );
        sketch_ops::polygon(
            ops.sketch_mut(slot_sketch),
            &[
                Point2::new(pitch_d / 2.0 - chamfer, -body_len + pad_e / 2.0),
                Point2::new(pitch_d / 2.0 + chamfer, -body_len + pad_e / 2.0),
                Point2::new(pitch_d / 2.0, -body_len + pad_e / 2.0 + chamfer),
            ],
        );
        // One sweep round the body section carries the notch between
        // every pin pair.
        let notches = ops.area(f64::from(dpins.saturating_sub(1)) * chamfer * chamfer);
        ops.sweep_cut("BodySlot", notches, edge, body.body)?;

        ops.commit()
    }
}

pub struct HeaderRightAngle;

impl PackageBuilder for HeaderRightAngle {
    fn package_type(&self) -> PackageType {
        PackageType::HeaderRightAngle
    }

    fn params(&self) -> &'static [ParamSpec] {
        const PARAMS: &[ParamSpec] = &[
            ParamSpec::length("E", 0.556, "body length"),
            ParamSpec::length("d", 0.254, "pitch along D"),
            ParamSpec::length("D", 1.016, "lead span"),
            ParamSpec::length("e", 0.254, "pitch along E"),
            ParamSpec::length("b", 0.064, "terminal thickness"),
            ParamSpec::length("L", 0.254, "body height"),
            ParamSpec::length("L1", 0.152, "terminal tail length"),
            ParamSpec::length("L2", 0.584, "terminal post length"),
            ParamSpec::length("L3", 0.24, "tail length below right angle body"),
            ParamSpec::count("DPins", 4, "pins along D"),
            ParamSpec::count("EPins", 2, "pins along E"),
        ];
        PARAMS
    }

    fn create(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let body_len = resolved.dim("E");
        let pitch_d = resolved.dim("d");
        let span = resolved.dim("D");
        let pitch_e = resolved.dim("e");
        let b = resolved.dim("b");
        let height = resolved.dim("L");
        let l1 = resolved.dim("L1");
        let l2 = resolved.dim("L2");
        let l3 = resolved.dim("L3");
        let dpins = resolved.count("DPins");
        let epins = resolved.count("EPins");

        let rows_e = pitch_e * f64::from(epins.saturating_sub(1));
        let pad_d = (span - pitch_d * f64::from(dpins.saturating_sub(1))) / 2.0;
        let pad_e = body_len - rows_e;
        let chamfer = pitch_e.min(pitch_d).min(body_len).min(height) / 5.0;
        let perimeter = 2.0 * (body_len + height);
        let reach = l3 + rows_e + pad_e / 2.0;
        let drop = rows_e + height + l1 + l2;

        let mut ops = ctx.ops();

        ops.plane("BodyPlaneYz", BasePlane::Yz, Arg::expr(-pad_d, GRID_CENTRE))?;
        ops.plane("PinPlaneXy", BasePlane::Xy, Arg::expr(-l1, "-param_L1"))?;
        ops.plane("PinPathPlaneYz", BasePlane::Yz, Arg::expr(-pad_d, GRID_CENTRE))?;
        ops.plane("BodySlotPlaneXy", BasePlane::Xy, Arg::expr(body_len, "param_E"))?;

        let path_sketch = ops.sketch(
            "PinPathSketch",
            SketchPlane::offset_from(BasePlane::Yz, -pad_d),
        );
        let sk = ops.sketch_mut(path_sketch);
        sk.add_line(
            Point2::new(l3, 0.0),
            Point2::new(-(rows_e + pad_e / 2.0), 0.0),
        );
        sk.add_line(
            Point2::new(-(rows_e + pad_e / 2.0), 0.0),
            Point2::new(-(rows_e + pad_e / 2.0), -drop),
        );

        let pin_sketch = ops.sketch("PinSketch", SketchPlane::offset_from(BasePlane::Xy, -l1));
        for row in 0..epins.max(1) {
            let seat = -pitch_e * f64::from(row);
            sketch_ops::center_rectangle(ops.sketch_mut(pin_sketch), Point2::new(0.0, seat), b, b);
            let name = format!("PinRow{}", row + 1);
            let profile = ops.rect(Arg::expr(b, "param_b"), Arg::expr(b, "param_b"))?;
            let pin = ops.sweep(
                &name,
                profile,
                Arg::expr(reach + drop, BENT_PATH),
                &name,
                pin_finish(),
            )?;
            // Wide fillet at the knee, tight one at the heel.
            ops.fillet(
                &format!("{name}BendFillet"),
                pin.body,
                Arg::lit(1.5 * b),
                Arg::lit(b),
            )?;
            ops.fillet(
                &format!("{name}BendCorner"),
                pin.body,
                Arg::lit(b / 2.0),
                Arg::lit(b),
            )?;
            ops.chamfer(
                &format!("{name}TailChamfer"),
                pin.body,
                Arg::expr(b / 4.0, "param_b/4"),
                Arg::expr(b / 1.5, "param_b/1.5"),
                Arg::expr(4.0 * b, "param_b * 4"),
            )?;
            ops.chamfer(
                &format!("{name}PostChamfer"),
                pin.body,
                Arg::expr(b / 4.0, "param_b/4"),
                Arg::expr(b / 1.5, "param_b/1.5"),
                Arg::expr(4.0 * b, "param_b * 4"),
            )?;
            ops.pattern(
                &format!("{name}Pattern"),
                &[pin.feature],
                dpins,
                Arg::expr(pitch_d, "param_d"),
                1,
                Arg::lit(0.0),
            )?;
        }

        let body_sketch = ops.sketch("BodySketch", SketchPlane::offset_from(BasePlane::Yz, -pad_d));
        sketch_ops::center_rectangle(
            ops.sketch_mut(body_sketch),
            Point2::new(-body_len / 2.0, -(height / 2.0 + l1 + rows_e)),
            body_len,
            height,
        );
        let body_profile = ops.rect(Arg::expr(body_len, "param_E"), Arg::expr(height, "param_L"))?;
        let body = ops.extrude(
            "Body",
            body_profile,
            Arg::expr(span, "param_D"),
            "Body",
            Finish::of(Material::PbtPlastic),
        )?;
        let edge = Arg::expr(perimeter, "(param_E + param_L) * 2");
        ops.chamfer("BodyChamferTop", body.body, Arg::lit(chamfer), Arg::lit(chamfer), edge)?;
        ops.chamfer(
            "BodyChamferBottom",
            body.body,
            Arg::lit(chamfer),
            Arg::lit(chamfer),
            edge,
        )?;

        let slot_sketch = ops.sketch(
            "BodySlotSketch",
            SketchPlane::offset_from(BasePlane::Xy, body_len),
        );
        sketch_ops::polygon(
            ops.sketch_mut(slot_sketch),
            &[
                Point2::new(pitch_d / 2.0 - chamfer, -body_len + pad_e / 2.0),
                Point2::new(pitch_d / 2.0 + chamfer, -body_len + pad_e / 2.0),
                Point2::new(pitch_d / 2.0, -body_len + pad_e / 2.0 - chamfer),
            ],
        );
        let notches = ops.area(f64::from(dpins.saturating_sub(1)) * chamfer * chamfer);
        ops.sweep_cut("BodySlot", notches, edge, body.body)?;

        ops.commit()
    }
}

pub struct HeaderStraightSocket;

impl PackageBuilder for HeaderStraightSocket {
    fn package_type(&self) -> PackageType {
        PackageType::HeaderStraightSocket
    }

    fn params(&self) -> &'static [ParamSpec] {
        const PARAMS: &[ParamSpec] = &[
            ParamSpec::length("E", 0.556, "body length"),
            ParamSpec::length("d", 0.254, "pitch along D"),
            ParamSpec::length("D", 1.016, "lead span"),
            ParamSpec::length("e", 0.254, "pitch along E"),
            ParamSpec::length("b", 0.1, "terminal thickness"),
            ParamSpec::length("L", 0.254, "body height"),
            ParamSpec::length("L1", 0.3, "terminal tail length"),
            ParamSpec::count("DPins", 4, "pins along D"),
            ParamSpec::count("EPins", 2, "pins along E"),
        ];
        PARAMS
    }

    fn create(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let body_len = resolved.dim("E");
        let pitch_d = resolved.dim("d");
        let span = resolved.dim("D");
        let pitch_e = resolved.dim("e");
        let b = resolved.dim("b");
        let height = resolved.dim("L");
        let l1 = resolved.dim("L1");
        let dpins = resolved.count("DPins");
        let epins = resolved.count("EPins");

        let rows_e = pitch_e * f64::from(epins.saturating_sub(1));
        let pad_d = (span - pitch_d * f64::from(dpins.saturating_sub(1))) / 2.0;

        let mut ops = ctx.ops();

        ops.plane("BodyPlaneYz", BasePlane::Yz, Arg::expr(-pad_d, GRID_CENTRE))?;
        ops.plane("PinPlaneXy", BasePlane::Xy, Arg::expr(-l1, "-param_L1"))?;
        ops.plane(
            "BodySlotPlaneXy",
            BasePlane::Xy,
            Arg::expr(height - 0.7 * b, "param_L - param_b*0.7"),
        )?;

        // Only the tail shows; the driven length seats it a quarter
        // terminal into the body.
        let pin_sketch = ops.sketch("PinSketch", SketchPlane::offset_from(BasePlane::Xy, -l1));
        sketch_ops::center_rectangle(ops.sketch_mut(pin_sketch), Point2::new(0.0, 0.0), b, b);
        let pin_profile = ops.rect(Arg::expr(b, "param_b"), Arg::expr(b, "param_b"))?;
        let pin = ops.extrude(
            "Pin",
            pin_profile,
            Arg::expr(l1, "param_L1 + param_b/4"),
            "Pin",
            pin_finish(),
        )?;
        ops.chamfer(
            "PinTailChamfer",
            pin.body,
            Arg::expr(b / 4.0, "param_b/4"),
            Arg::expr(b / 1.5, "param_b/1.5"),
            Arg::expr(4.0 * b, "param_b * 4"),
        )?;
        ops.pattern(
            "PinPattern",
            &[pin.feature],
            dpins,
            Arg::expr(pitch_d, "param_d"),
            epins,
            Arg::expr(-pitch_e, "-param_e"),
        )?;

        let body_sketch = ops.sketch("BodySketch", SketchPlane::offset_from(BasePlane::Yz, -pad_d));
        sketch_ops::center_rectangle(
            ops.sketch_mut(body_sketch),
            Point2::new(-height / 2.0, -rows_e / 2.0),
            height,
            body_len,
        );
        let body_profile = ops.rect(Arg::expr(height, "param_L"), Arg::expr(body_len, "param_E"))?;
        let body = ops.extrude(
            "Body",
            body_profile,
            Arg::expr(span, "param_D"),
            "Body",
            Finish::of(Material::PbtPlastic),
        )?;

        let socket_sketch = ops.sketch(
            "PinSocketSketch",
            SketchPlane::offset_from(BasePlane::Xy, height - 0.7 * b),
        );
        sketch_ops::center_rectangle(ops.sketch_mut(socket_sketch), Point2::new(0.0, 0.0), b, b);
        // One cut bores the whole grid down the body height.
        let bores = ops.area(socket_grid_area(b, height, dpins * epins));
        let socket = ops.extrude_cut("PinSocket", bores, Arg::expr(height, "param_L"), body.body)?;

        ops.index(SOCKET, socket);
        ops.commit()
    }

    fn update(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let b = resolved.dim("b");
        let height = resolved.dim("L");
        let positions = resolved.count("DPins") * resolved.count("EPins");
        set_indexed_area(
            ctx.component(),
            SOCKET,
            socket_grid_area(b, height, positions),
        )
    }
}

pub struct HeaderRightAngleSocket;

impl PackageBuilder for HeaderRightAngleSocket {
    fn package_type(&self) -> PackageType {
        PackageType::HeaderRightAngleSocket
    }

    fn params(&self) -> &'static [ParamSpec] {
        const PARAMS: &[ParamSpec] = &[
            ParamSpec::length("E", 0.556, "body length"),
            ParamSpec::length("d", 0.254, "pitch along D"),
            ParamSpec::length("D", 1.016, "lead span"),
            ParamSpec::length("e", 0.254, "pitch along E"),
            ParamSpec::length("b", 0.1, "terminal thickness"),
            ParamSpec::length("L", 0.254, "body height"),
            ParamSpec::length("L1", 0.152, "terminal tail length"),
            ParamSpec::length("L3", 0.24, "tail length below right angle body"),
            ParamSpec::count("DPins", 4, "pins along D"),
            ParamSpec::count("EPins", 2, "pins along E"),
        ];
        PARAMS
    }

    fn create(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let body_len = resolved.dim("E");
        let pitch_d = resolved.dim("d");
        let span = resolved.dim("D");
        let pitch_e = resolved.dim("e");
        let b = resolved.dim("b");
        let height = resolved.dim("L");
        let l1 = resolved.dim("L1");
        let l3 = resolved.dim("L3");
        let dpins = resolved.count("DPins");
        let epins = resolved.count("EPins");

        let rows_e = pitch_e * f64::from(epins.saturating_sub(1));
        let pad_d = (span - pitch_d * f64::from(dpins.saturating_sub(1))) / 2.0;
        let pad_e = body_len - rows_e;
        let reach = l3 + rows_e + pad_e / 2.0;
        let drop = rows_e + height + l1;

        let mut ops = ctx.ops();

        ops.plane("BodyPlaneYz", BasePlane::Yz, Arg::expr(-pad_d, GRID_CENTRE))?;
        ops.plane("PinPlaneXy", BasePlane::Xy, Arg::expr(-l1, "-param_L1"))?;
        ops.plane("PinPathPlaneYz", BasePlane::Yz, Arg::expr(-pad_d, GRID_CENTRE))?;
        ops.plane(
            "PinSocketPlaneXz",
            BasePlane::Xz,
            Arg::expr(-(body_len - 0.7 * b), "-param_E + param_b*0.7"),
        )?;

        let path_sketch = ops.sketch(
            "PinPathSketch",
            SketchPlane::offset_from(BasePlane::Yz, -pad_d),
        );
        let sk = ops.sketch_mut(path_sketch);
        sk.add_line(
            Point2::new(l3, 0.0),
            Point2::new(-(rows_e + pad_e / 2.0), 0.0),
        );
        sk.add_line(
            Point2::new(-(rows_e + pad_e / 2.0), 0.0),
            Point2::new(-(rows_e + pad_e / 2.0), -drop),
        );

        let pin_sketch = ops.sketch("PinSketch", SketchPlane::offset_from(BasePlane::Xy, -l1));
        for row in 0..epins.max(1) {
            let seat = -pitch_e * f64::from(row);
            sketch_ops::center_rectangle(ops.sketch_mut(pin_sketch), Point2::new(0.0, seat), b, b);
            let name = format!("PinRow{}", row + 1);
            let profile = ops.rect(Arg::expr(b, "param_b"), Arg::expr(b, "param_b"))?;
            let pin = ops.sweep(
                &name,
                profile,
                Arg::expr(reach + drop, BENT_TAIL),
                &name,
                pin_finish(),
            )?;
            ops.fillet(
                &format!("{name}BendFillet"),
                pin.body,
                Arg::lit(1.5 * b),
                Arg::lit(b),
            )?;
            ops.fillet(
                &format!("{name}BendCorner"),
                pin.body,
                Arg::lit(b / 2.0),
                Arg::lit(b),
            )?;
            ops.chamfer(
                &format!("{name}TailChamfer"),
                pin.body,
                Arg::expr(b / 4.0, "param_b/4"),
                Arg::expr(b / 1.5, "param_b/1.5"),
                Arg::expr(4.0 * b, "param_b * 4"),
            )?;
            ops.pattern(
                &format!("{name}Pattern"),
                &[pin.feature],
                dpins,
                Arg::expr(pitch_d, "param_d"),
                1,
                Arg::lit(0.0),
            )?;
        }

        let body_sketch = ops.sketch("BodySketch", SketchPlane::offset_from(BasePlane::Yz, -pad_d));
        sketch_ops::center_rectangle(
            ops.sketch_mut(body_sketch),
            Point2::new(-body_len / 2.0, -(height / 2.0 + l1 + rows_e)),
            body_len,
            height,
        );
        let body_profile = ops.rect(Arg::expr(body_len, "param_E"), Arg::expr(height, "param_L"))?;
        let body = ops.extrude(
            "Body",
            body_profile,
            Arg::expr(span, "param_D"),
            "Body",
            Finish::of(Material::PbtPlastic),
        )?;

        // Bores run horizontally into the mating face, the full body
        // length deep.
        let socket_sketch = ops.sketch(
            "PinSocketSketch",
            SketchPlane::offset_from(BasePlane::Xz, -(body_len - 0.7 * b)),
        );
        sketch_ops::center_rectangle(
            ops.sketch_mut(socket_sketch),
            Point2::new(0.0, -(l1 + rows_e + height / 2.0)),
            b,
            b,
        );
        let bores = ops.area(socket_grid_area(b, body_len, dpins * epins));
        let socket = ops.extrude_cut("PinSocket", bores, Arg::expr(body_len, "param_E"), body.body)?;

        ops.index(SOCKET, socket);
        ops.commit()
    }

    fn update(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let b = resolved.dim("b");
        let body_len = resolved.dim("E");
        let positions = resolved.count("DPins") * resolved.count("EPins");
        set_indexed_area(
            ctx.component(),
            SOCKET,
            socket_grid_area(b, body_len, positions),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::generator::framework::drive;
    use crate::generator::params::ParameterSet;
    use crate::model::{Component, Design};
    use std::f64::consts::FRAC_PI_4;

    fn run(design: &mut Design, builder: &dyn PackageBuilder, params: &ParameterSet) {
        let root = design.root();
        let config = Config::default();
        let mut ctx = BuildContext::new(design, root, &config).unwrap();
        drive(&mut ctx, builder, params).unwrap();
    }

    fn body_volume(component: &Component, name: &str) -> f64 {
        component
            .history
            .active_bodies()
            .find(|(_, body)| body.name == name)
            .map(|(_, body)| body.volume)
            .unwrap()
    }

    /// Shave of one tip chamfer on a square post of side `b`.
    fn tip_chamfer(b: f64) -> f64 {
        b / 4.0 * (b / 1.5) / 2.0 * (4.0 * b)
    }

    /// Shave of the knee and heel fillets on one bent pin.
    fn bend_fillets(b: f64) -> f64 {
        (1.0 - FRAC_PI_4) * b * ((1.5 * b).powi(2) + (b / 2.0).powi(2))
    }

    #[test]
    fn straight_grid_runs_a_post_through_every_position() {
        let mut design = Design::new("header straight");
        run(&mut design, &HeaderStraight, &ParameterSet::new());

        assert_eq!(design.parameters.len(), 10);
        let component = design.component(design.root()).unwrap();
        // 4 x 2 posts + body
        assert_eq!(component.history.active_body_count(), 9);

        let pin = 0.064 * 0.064 * (0.254 + 0.3 + 0.584) - 2.0 * tip_chamfer(0.064);
        assert!((body_volume(component, "Pin") - pin).abs() < 1e-12);

        let chamfer = 0.254 / 5.0;
        let perimeter = 2.0 * (0.556 + 0.254);
        let body = 0.556 * 0.254 * 1.016
            - chamfer * chamfer * perimeter
            - 3.0 * chamfer * chamfer * perimeter;
        assert!((body_volume(component, "Body") - body).abs() < 1e-12);
    }

    #[test]
    fn straight_post_stretch_rides_the_expressions() {
        let mut design = Design::new("header straight");
        run(&mut design, &HeaderStraight, &ParameterSet::new());
        let before = design.component(design.root()).unwrap().history.len();

        run(
            &mut design,
            &HeaderStraight,
            &ParameterSet::new().with("L2", 0.7),
        );
        let component = design.component(design.root()).unwrap();
        assert_eq!(component.history.len(), before);
        assert_eq!(design.parameters.value_of("param_L2"), Some(0.7));

        let pin = 0.064 * 0.064 * (0.254 + 0.3 + 0.7) - 2.0 * tip_chamfer(0.064);
        assert!((body_volume(component, "Pin") - pin).abs() < 1e-12);
    }

    #[test]
    fn right_angle_rows_share_one_bent_path() {
        let mut design = Design::new("header right angle");
        run(&mut design, &HeaderRightAngle, &ParameterSet::new());

        assert_eq!(design.parameters.len(), 11);
        let component = design.component(design.root()).unwrap();
        assert_eq!(component.history.active_body_count(), 9);

        let b = 0.064;
        let reach = 0.24 + 0.254 + (0.556 - 0.254) / 2.0;
        let drop = 0.254 + 0.254 + 0.152 + 0.584;
        let pin = b * b * (reach + drop) - bend_fillets(b) - 2.0 * tip_chamfer(b);
        assert!((body_volume(component, "PinRow1") - pin).abs() < 1e-12);
        assert!((body_volume(component, "PinRow2") - pin).abs() < 1e-12);

        let chamfer = 0.254 / 5.0;
        let perimeter = 2.0 * (0.556 + 0.254);
        let body = 0.556 * 0.254 * 1.016
            - chamfer * chamfer * perimeter
            - 3.0 * chamfer * chamfer * perimeter;
        assert!((body_volume(component, "Body") - body).abs() < 1e-12);
    }

    #[test]
    fn right_angle_extra_row_rebuilds_the_grid() {
        let mut design = Design::new("header right angle");
        run(&mut design, &HeaderRightAngle, &ParameterSet::new());
        run(
            &mut design,
            &HeaderRightAngle,
            &ParameterSet::new().with("EPins", 3.0),
        );

        assert_eq!(design.parameters.value_of("param_EPins"), Some(3.0));
        let component = design.component(design.root()).unwrap();
        // 4 x 3 pins + body
        assert_eq!(component.history.active_body_count(), 13);

        let b = 0.064;
        let rows = 0.254 * 2.0;
        let reach = 0.24 + rows + (0.556 - rows) / 2.0;
        let drop = rows + 0.254 + 0.152 + 0.584;
        let pin = b * b * (reach + drop) - bend_fillets(b) - 2.0 * tip_chamfer(b);
        assert!((body_volume(component, "PinRow3") - pin).abs() < 1e-12);
    }

    #[test]
    fn socket_mouth_tapers_into_the_bore() {
        let mut design = Design::new("header socket");
        run(&mut design, &HeaderStraightSocket, &ParameterSet::new());

        assert_eq!(design.parameters.len(), 9);
        let component = design.component(design.root()).unwrap();
        assert_eq!(component.history.active_body_count(), 9);

        let pin = 0.1 * 0.1 * (0.3 + 0.025) - tip_chamfer(0.1);
        assert!((body_volume(component, "Pin") - pin).abs() < 1e-12);

        let body = 0.556 * 0.254 * 1.016 - 8.0 * socket_volume(0.1, 0.254);
        assert!((body_volume(component, "Body") - body).abs() < 1e-12);
    }

    #[test]
    fn socket_depth_update_redrills_the_grid() {
        let mut design = Design::new("header socket");
        run(&mut design, &HeaderStraightSocket, &ParameterSet::new());
        let before = design.component(design.root()).unwrap().history.len();

        run(
            &mut design,
            &HeaderStraightSocket,
            &ParameterSet::new().with("L", 0.32),
        );
        let component = design.component(design.root()).unwrap();
        assert_eq!(component.history.len(), before);

        let body = 0.556 * 0.32 * 1.016 - 8.0 * socket_volume(0.1, 0.32);
        assert!((body_volume(component, "Body") - body).abs() < 1e-12);
    }

    #[test]
    fn right_angle_socket_bores_the_mating_face() {
        let mut design = Design::new("header ra socket");
        run(&mut design, &HeaderRightAngleSocket, &ParameterSet::new());

        assert_eq!(design.parameters.len(), 10);
        let component = design.component(design.root()).unwrap();
        assert_eq!(component.history.active_body_count(), 9);

        let b = 0.1;
        let reach = 0.24 + 0.254 + (0.556 - 0.254) / 2.0;
        let drop = 0.254 + 0.254 + 0.152;
        let pin = b * b * (reach + drop) - bend_fillets(b) - tip_chamfer(b);
        assert!((body_volume(component, "PinRow1") - pin).abs() < 1e-12);

        let body = 0.556 * 0.254 * 1.016 - 8.0 * socket_volume(0.1, 0.556);
        assert!((body_volume(component, "Body") - body).abs() < 1e-12);
    }
}
