//! Crystals: the surface-mount resonator and the through-hole HC49 can.
//!
//! Both outlines are stadiums, a rectangle capped by two semicircles.
//! The surface-mount part seats a drawn-metal lid on a ceramic base
//! between two copper lands; the HC49 stands a tall can on its welded
//! base flange and drops two wire leads through the board. Stadium
//! profiles carry their area directly, so the update path re-derives
//! the areas instead of leaning on expressions.

use std::f64::consts::PI;

use crate::error::GenerateResult;
use crate::generator::context::BuildContext;
use crate::generator::feature_ops::{set_indexed_area, Arg};
use crate::generator::framework::{PackageBuilder, ParamSpec, Resolved};
use crate::generator::packages::PackageType;
use crate::generator::sketch_ops;
use crate::model::material::{Appearance, Finish, Material};
use crate::model::{BasePlane, FeatureKey, Point2, SketchPlane};

const LID_WALL: FeatureKey = FeatureKey("lid_wall");
const LID_PLATE: FeatureKey = FeatureKey("lid_plate");
const CAN: FeatureKey = FeatureKey("can");
const FLANGE: FeatureKey = FeatureKey("flange");

/// Land thickness of the surface-mount terminals.
const TERMINAL_THICKNESS: f64 = 0.03;
/// Sheet-metal wall of the surface-mount lid.
const WALL: f64 = 0.005;
/// Base flange lip the HC49 can is welded onto.
const FLANGE_LIP: f64 = 0.02;

fn land_finish() -> Finish {
    Finish::of(Material::CopperAlloy).with_appearance(Appearance::NickelPolished)
}

/// Lid stadium of the surface-mount part: end-to-end length and cap
/// radius, both snug inside the base outline.
fn lid_stadium(d1: f64, e: f64) -> (f64, f64) {
    (0.9f64.mul_add(d1, 0.1 * e), 0.45 * e)
}

pub struct Crystal;

impl PackageBuilder for Crystal {
    fn package_type(&self) -> PackageType {
        PackageType::Crystal
    }

    fn params(&self) -> &'static [ParamSpec] {
        const PARAMS: &[ParamSpec] = &[
            ParamSpec::length("b", 0.079, "terminal width"),
            ParamSpec::length("L", 0.416, "terminal length"),
            ParamSpec::length("D2", 0.488, "terminal gap"),
            ParamSpec::length("E", 0.5, "body width"),
            ParamSpec::length("D1", 1.17, "body length"),
            ParamSpec::length("A", 0.45, "body height"),
        ];
        PARAMS
    }

    fn create(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let b = resolved.dim("b");
        let l = resolved.dim("L");
        let d2 = resolved.dim("D2");
        let e = resolved.dim("E");
        let d1 = resolved.dim("D1");
        let a = resolved.dim("A");

        let mut ops = ctx.ops();

        // Ceramic base, floated a hair over the seating plane.
        ops.plane("BasePlaneXy", BasePlane::Xy, Arg::lit(0.0001))?;
        let base_sketch = ops.sketch("BaseSketch", SketchPlane::offset_from(BasePlane::Xy, 0.0001));
        sketch_ops::center_rectangle(ops.sketch_mut(base_sketch), Point2::new(0.0, 0.0), d1, e);
        let base_profile = ops.rect(Arg::expr(d1, "param_D1"), Arg::expr(e, "param_E"))?;
        ops.extrude(
            "Base",
            base_profile,
            Arg::expr(a / 4.0, "param_A/4"),
            "Base",
            Finish::of(Material::Ceramic),
        )?;

        // The lid is a thin wall ring with a plate let into its mouth.
        let (lid_length, lid_radius) = lid_stadium(d1, e);
        ops.plane("LidPlaneXy", BasePlane::Xy, Arg::expr(a / 4.0, "param_A/4"))?;
        let lid_sketch = ops.sketch("LidSketch", SketchPlane::offset_from(BasePlane::Xy, a / 4.0));
        sketch_ops::stadium(ops.sketch_mut(lid_sketch), Point2::new(0.0, 0.0), lid_length, lid_radius);
        let plate_area = sketch_ops::stadium(
            ops.sketch_mut(lid_sketch),
            Point2::new(0.0, 0.0),
            lid_length - 2.0 * WALL,
            lid_radius - WALL,
        );

        let wall_area = sketch_ops::stadium_area(lid_length, lid_radius) - plate_area;
        let wall_profile = ops.area(wall_area);
        let wall = ops.extrude(
            "LidWall",
            wall_profile,
            Arg::expr(a * 3.0 / 4.0, "param_A * 3/4"),
            "LidWall",
            Finish::of(Material::Aluminium),
        )?;
        let plate_profile = ops.area(plate_area);
        let plate = ops.extrude(
            "LidPlate",
            plate_profile,
            Arg::expr(a * 3.0 / 4.0 * 0.1, "param_A * 3/4 * 0.1"),
            "LidPlate",
            Finish::of(Material::Aluminium),
        )?;

        let half_straight = lid_length / 2.0 - lid_radius;
        ops.fillet(
            "LidFillet",
            wall.body,
            Arg::lit(0.03),
            Arg::expr(
                2.0f64.mul_add(PI * lid_radius, 4.0 * half_straight),
                "2 * 3.141592653589793 * 0.45 * param_E + 4 * (0.45 * param_D1 - 0.4 * param_E)",
            ),
        )?;

        // Copper lands either side of the terminal gap.
        let land_sketch = ops.sketch("TerminalSketch", SketchPlane::offset_from(BasePlane::Xy, 0.0));
        sketch_ops::center_rectangle(
            ops.sketch_mut(land_sketch),
            Point2::new(d2 / 2.0 + l / 2.0, 0.0),
            l,
            b,
        );
        let land_profile = ops.rect(Arg::expr(l, "param_L"), Arg::expr(b, "param_b"))?;
        let land = ops.extrude(
            "Terminal",
            land_profile,
            Arg::lit(TERMINAL_THICKNESS),
            "Terminal",
            land_finish(),
        )?;
        ops.mirror("TerminalMirror", &[land.feature], BasePlane::Yz);

        ops.index(LID_WALL, wall.feature);
        ops.index(LID_PLATE, plate.feature);
        ops.commit()
    }

    fn update(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let (lid_length, lid_radius) = lid_stadium(resolved.dim("D1"), resolved.dim("E"));
        let plate_area = sketch_ops::stadium_area(lid_length - 2.0 * WALL, lid_radius - WALL);
        let component = ctx.component();
        set_indexed_area(
            component,
            LID_WALL,
            sketch_ops::stadium_area(lid_length, lid_radius) - plate_area,
        )?;
        set_indexed_area(component, LID_PLATE, plate_area)
    }
}

pub struct CrystalHc49;

impl PackageBuilder for CrystalHc49 {
    fn package_type(&self) -> PackageType {
        PackageType::CrystalHc49
    }

    fn params(&self) -> &'static [ParamSpec] {
        const PARAMS: &[ParamSpec] = &[
            ParamSpec::length("b", 0.06, "terminal width"),
            ParamSpec::length("D", 1.12, "body length"),
            ParamSpec::length("E", 0.485, "body width"),
            ParamSpec::length("A", 0.35, "body height"),
            ParamSpec::length("e", 0.488, "pitch"),
        ];
        PARAMS
    }

    fn uses_board_thickness(&self) -> bool {
        true
    }

    fn create(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let b = resolved.dim("b");
        let d = resolved.dim("D");
        let e = resolved.dim("E");
        let a = resolved.dim("A");
        let pitch = resolved.dim("e");
        let board = ctx.board_thickness;

        let mut ops = ctx.ops();

        let body_sketch = ops.sketch("BodySketch", SketchPlane::offset_from(BasePlane::Xy, 0.0));
        let can_area =
            sketch_ops::stadium(ops.sketch_mut(body_sketch), Point2::new(0.0, 0.0), d, e / 2.0);
        let flange_area = sketch_ops::stadium(
            ops.sketch_mut(body_sketch),
            Point2::new(0.0, 0.0),
            d + 2.0 * FLANGE_LIP,
            e / 2.0 + FLANGE_LIP,
        );

        let can_profile = ops.area(can_area);
        let can = ops.extrude(
            "Can",
            can_profile,
            Arg::expr(a, "param_A"),
            "Can",
            Finish::of(Material::Aluminium),
        )?;
        let flange_profile = ops.area(flange_area);
        let flange = ops.extrude(
            "Flange",
            flange_profile,
            Arg::expr(e * 0.1, "param_E * 0.1"),
            "Flange",
            Finish::of(Material::Aluminium),
        )?;

        // Drawn lips round off at a twentieth of the width.
        ops.fillet(
            "CanFillet",
            can.body,
            Arg::expr(e * 0.05, "param_E * 0.05"),
            Arg::expr(
                PI.mul_add(e, 2.0 * (d - e)),
                "3.141592653589793 * param_E + 2 * (param_D - param_E)",
            ),
        )?;
        ops.fillet(
            "FlangeFillet",
            flange.body,
            Arg::expr(e * 0.05, "param_E * 0.05"),
            Arg::expr(
                PI.mul_add(e + 2.0 * FLANGE_LIP, 2.0 * (d - e)),
                "3.141592653589793 * (param_E + 0.04) + 2 * (param_D - param_E)",
            ),
        )?;

        let lead_sketch = ops.sketch("TerminalSketch", SketchPlane::offset_from(BasePlane::Xy, 0.0));
        sketch_ops::center_circle(ops.sketch_mut(lead_sketch), Point2::new(pitch / 2.0, 0.0), b);
        let lead_profile = ops.circle(Arg::expr(b / 2.0, "param_b/2"))?;
        let lead = ops.extrude(
            "Terminal",
            lead_profile,
            Arg::expr(-1.2 * board, "-1.2 * board_thickness"),
            "Terminal",
            land_finish(),
        )?;
        ops.mirror("TerminalMirror", &[lead.feature], BasePlane::Yz);

        ops.index(CAN, can.feature);
        ops.index(FLANGE, flange.feature);
        ops.commit()
    }

    fn update(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let d = resolved.dim("D");
        let e = resolved.dim("E");
        let component = ctx.component();
        set_indexed_area(component, CAN, sketch_ops::stadium_area(d, e / 2.0))?;
        set_indexed_area(
            component,
            FLANGE,
            sketch_ops::stadium_area(d + 2.0 * FLANGE_LIP, e / 2.0 + FLANGE_LIP),
        )
    }
}
