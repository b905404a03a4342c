//! DFN: flat no-lead discretes with two, three or four bottom terminals.
//!
//! The terminals are bare pads on the seating plane and the body hangs
//! from its top plane down onto them, so the pad stock sets the body
//! extent. Stock thickness follows the body height rather than a
//! parameter, which is why the update path re-measures the extents
//! instead of leaning on expressions.

use crate::error::GenerateResult;
use crate::generator::context::BuildContext;
use crate::generator::feature_ops::{set_indexed_distance, Arg, BodyRef, Ops};
use crate::generator::framework::{PackageBuilder, ParamSpec, Resolved};
use crate::generator::packages::PackageType;
use crate::generator::sketch_ops;
use crate::model::material::{Appearance, Finish, Material};
use crate::model::{BasePlane, FeatureKey, Point2, SketchPlane};

const TERMINAL: FeatureKey = FeatureKey("terminal");
const TERMINAL_ODD: FeatureKey = FeatureKey("terminal_odd");
const TERMINAL_EVEN: FeatureKey = FeatureKey("terminal_even");
const BODY: FeatureKey = FeatureKey("body");

/// Pad stock thins out under low bodies.
fn terminal_stock(a: f64) -> f64 {
    if a < 0.05 {
        0.002
    } else {
        0.005
    }
}

fn lead_finish() -> Finish {
    Finish::of(Material::CopperAlloy).with_appearance(Appearance::NickelPolished)
}

/// Body slab hanging from its top plane down to the pad stock. The
/// extent chases the stock height, so it stays a literal and update
/// pushes the re-measured value back in.
fn hanging_body(ops: &mut Ops<'_>, a: f64, d: f64, e_w: f64, stock: f64) -> GenerateResult<BodyRef> {
    ops.plane("BodyPlaneXy", BasePlane::Xy, Arg::expr(a, "param_A"))?;
    let sketch = ops.sketch("BodySketch", SketchPlane::offset_from(BasePlane::Xy, a));
    sketch_ops::center_rectangle(ops.sketch_mut(sketch), Point2::new(0.0, 0.0), d, e_w);
    let profile = ops.rect(Arg::expr(d, "param_D"), Arg::expr(e_w, "param_E"))?;
    ops.extrude("Body", profile, Arg::lit(-(a - stock)), "Body", Finish::body())
}

pub struct Dfn2;

impl PackageBuilder for Dfn2 {
    fn package_type(&self) -> PackageType {
        PackageType::Dfn2
    }

    fn params(&self) -> &'static [ParamSpec] {
        const PARAMS: &[ParamSpec] = &[
            ParamSpec::length("A", 0.3, "body height"),
            ParamSpec::length("E", 0.65, "body width"),
            ParamSpec::length("D", 1.05, "body length"),
            ParamSpec::length("e", 0.65, "pitch"),
            ParamSpec::length("b", 0.54, "terminal width"),
            ParamSpec::length("L", 0.28, "terminal length"),
        ];
        PARAMS
    }

    fn create(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let a = resolved.dim("A");
        let e_w = resolved.dim("E");
        let d = resolved.dim("D");
        let pitch = resolved.dim("e");
        let b = resolved.dim("b");
        let land = resolved.dim("L");
        let stock = terminal_stock(a);

        let mut ops = ctx.ops();

        let sketch = ops.sketch("TerminalSketch", SketchPlane::offset_from(BasePlane::Xy, 0.0));
        sketch_ops::center_rectangle(
            ops.sketch_mut(sketch),
            Point2::new(pitch / 2.0, 0.0),
            land,
            b,
        );
        let profile = ops.rect(Arg::expr(land, "param_L"), Arg::expr(b, "param_b"))?;
        let terminal = ops.extrude("Terminal", profile, Arg::lit(stock), "Terminal", lead_finish())?;
        ops.mirror("TerminalMirror", &[terminal.feature], BasePlane::Yz);

        let body = hanging_body(&mut ops, a, d, e_w, stock)?;

        ops.index(TERMINAL, terminal.feature);
        ops.index(BODY, body.feature);
        ops.commit()
    }

    fn update(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let a = resolved.dim("A");
        let stock = terminal_stock(a);
        let component = ctx.component();
        set_indexed_distance(component, TERMINAL, stock)?;
        set_indexed_distance(component, BODY, -(a - stock))
    }
}

pub struct Dfn3;

impl PackageBuilder for Dfn3 {
    fn package_type(&self) -> PackageType {
        PackageType::Dfn3
    }

    fn params(&self) -> &'static [ParamSpec] {
        const PARAMS: &[ParamSpec] = &[
            ParamSpec::length("A", 0.04, "body height"),
            ParamSpec::length("E", 0.065, "body width"),
            ParamSpec::length("D", 0.105, "body length"),
            ParamSpec::length("e", 0.035, "vertical pin pitch"),
            ParamSpec::length("b", 0.02, "normal terminal width"),
            ParamSpec::length("L", 0.03, "normal terminal length"),
            ParamSpec::length("d", 0.065, "horizontal pin pitch"),
            ParamSpec::length("b1", 0.03, "odd terminal width"),
            ParamSpec::length("L1", 0.055, "odd terminal length"),
        ];
        PARAMS
    }

    fn create(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let a = resolved.dim("A");
        let e_w = resolved.dim("E");
        let d = resolved.dim("D");
        let e_pitch = resolved.dim("e");
        let b = resolved.dim("b");
        let land = resolved.dim("L");
        let d_pitch = resolved.dim("d");
        let b1 = resolved.dim("b1");
        let l1 = resolved.dim("L1");
        let stock = terminal_stock(a);

        let mut ops = ctx.ops();

        // The odd pad stands alone on one side, long axis across.
        let odd_sketch =
            ops.sketch("TerminalOddSketch", SketchPlane::offset_from(BasePlane::Xy, 0.0));
        sketch_ops::center_rectangle(
            ops.sketch_mut(odd_sketch),
            Point2::new(d_pitch / 2.0, 0.0),
            b1,
            l1,
        );
        let odd_profile = ops.rect(Arg::expr(b1, "param_b1"), Arg::expr(l1, "param_L1"))?;
        let odd = ops.extrude(
            "TerminalOdd",
            odd_profile,
            Arg::lit(stock),
            "TerminalOdd",
            lead_finish(),
        )?;

        let even_sketch =
            ops.sketch("TerminalEvenSketch", SketchPlane::offset_from(BasePlane::Xy, 0.0));
        sketch_ops::center_rectangle(
            ops.sketch_mut(even_sketch),
            Point2::new(-d_pitch / 2.0, e_pitch / 2.0),
            land,
            b,
        );
        let even_profile = ops.rect(Arg::expr(land, "param_L"), Arg::expr(b, "param_b"))?;
        let even = ops.extrude(
            "TerminalEven",
            even_profile,
            Arg::lit(stock),
            "TerminalEven",
            lead_finish(),
        )?;
        ops.mirror("TerminalEvenMirror", &[even.feature], BasePlane::Xz);

        let body = hanging_body(&mut ops, a, d, e_w, stock)?;

        ops.index(TERMINAL_ODD, odd.feature);
        ops.index(TERMINAL_EVEN, even.feature);
        ops.index(BODY, body.feature);
        ops.commit()
    }

    fn update(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let a = resolved.dim("A");
        let stock = terminal_stock(a);
        let component = ctx.component();
        set_indexed_distance(component, TERMINAL_ODD, stock)?;
        set_indexed_distance(component, TERMINAL_EVEN, stock)?;
        set_indexed_distance(component, BODY, -(a - stock))
    }
}

pub struct Dfn4;

impl PackageBuilder for Dfn4 {
    fn package_type(&self) -> PackageType {
        PackageType::Dfn4
    }

    fn params(&self) -> &'static [ParamSpec] {
        const PARAMS: &[ParamSpec] = &[
            ParamSpec::length("A", 0.04, "body height"),
            ParamSpec::length("E", 0.08, "body width"),
            ParamSpec::length("D", 0.125, "body length"),
            ParamSpec::length("e", 0.045, "vertical pin pitch"),
            ParamSpec::length("b", 0.028, "normal terminal width"),
            ParamSpec::length("L", 0.04, "normal terminal length"),
            ParamSpec::length("d", 0.075, "horizontal pin pitch"),
        ];
        PARAMS
    }

    fn create(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let a = resolved.dim("A");
        let e_w = resolved.dim("E");
        let d = resolved.dim("D");
        let e_pitch = resolved.dim("e");
        let b = resolved.dim("b");
        let land = resolved.dim("L");
        let d_pitch = resolved.dim("d");
        let stock = terminal_stock(a);

        let mut ops = ctx.ops();

        let sketch = ops.sketch("TerminalSketch", SketchPlane::offset_from(BasePlane::Xy, 0.0));
        sketch_ops::center_rectangle(
            ops.sketch_mut(sketch),
            Point2::new(d_pitch / 2.0, e_pitch / 2.0),
            land,
            b,
        );
        let profile = ops.rect(Arg::expr(land, "param_L"), Arg::expr(b, "param_b"))?;
        let terminal = ops.extrude("Terminal", profile, Arg::lit(stock), "Terminal", lead_finish())?;
        ops.mirror_and_pattern(
            "Terminal",
            terminal.feature,
            BasePlane::Xz,
            2,
            Arg::expr(-d_pitch, "-param_d"),
        )?;

        let body = hanging_body(&mut ops, a, d, e_w, stock)?;

        ops.index(TERMINAL, terminal.feature);
        ops.index(BODY, body.feature);
        ops.commit()
    }

    fn update(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let a = resolved.dim("A");
        let stock = terminal_stock(a);
        let component = ctx.component();
        set_indexed_distance(component, TERMINAL, stock)?;
        set_indexed_distance(component, BODY, -(a - stock))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::generator::framework::{drive, PackageBuilder};
    use crate::generator::params::ParameterSet;
    use crate::model::Design;

    fn run(design: &mut Design, builder: &dyn PackageBuilder, params: &ParameterSet) {
        let root = design.root();
        let config = Config::default();
        let mut ctx = BuildContext::new(design, root, &config).unwrap();
        drive(&mut ctx, builder, params).unwrap();
    }

    fn indexed_volume(design: &Design, key: FeatureKey) -> f64 {
        let component = design.component(design.root()).unwrap();
        let feature = component.indexed(key).unwrap();
        let body = component.history.get(feature).unwrap().bodies[0];
        component.history.body(body).unwrap().volume
    }

    #[test]
    fn two_terminal_stock_follows_the_tall_body() {
        let mut design = Design::new("dfn2");
        run(&mut design, &Dfn2, &ParameterSet::new());

        let component = design.component(design.root()).unwrap();
        assert_eq!(component.history.active_body_count(), 3);

        // A = 0.3 sits above the threshold, so pads are 0.005 thick.
        assert!((indexed_volume(&design, TERMINAL) - 0.28 * 0.54 * 0.005).abs() < 1e-12);
        assert!((indexed_volume(&design, BODY) - 1.05 * 0.65 * 0.295).abs() < 1e-9);
    }

    #[test]
    fn low_body_thins_the_stock_on_update() {
        let mut design = Design::new("dfn2");
        run(&mut design, &Dfn2, &ParameterSet::new());
        run(&mut design, &Dfn2, &ParameterSet::new().with("A", 0.04));

        // A = 0.04 drops below the threshold, so pads thin to 0.002 and
        // the body extent follows.
        assert!((indexed_volume(&design, TERMINAL) - 0.28 * 0.54 * 0.002).abs() < 1e-12);
        assert!((indexed_volume(&design, BODY) - 1.05 * 0.65 * 0.038).abs() < 1e-9);
    }

    #[test]
    fn three_terminal_pads_split_odd_and_even() {
        let mut design = Design::new("dfn3");
        run(&mut design, &Dfn3, &ParameterSet::new());

        let component = design.component(design.root()).unwrap();
        // odd pad + even pad + its mirror + body
        assert_eq!(component.history.active_body_count(), 4);

        assert!((indexed_volume(&design, TERMINAL_ODD) - 0.03 * 0.055 * 0.002).abs() < 1e-12);
        assert!((indexed_volume(&design, TERMINAL_EVEN) - 0.03 * 0.02 * 0.002).abs() < 1e-12);
    }

    #[test]
    fn four_terminal_grid_mirrors_and_patterns() {
        let mut design = Design::new("dfn4");
        run(&mut design, &Dfn4, &ParameterSet::new());

        let component = design.component(design.root()).unwrap();
        // pad, mirror, two pattern copies, body
        assert_eq!(component.history.active_body_count(), 5);
        assert!((indexed_volume(&design, TERMINAL) - 0.04 * 0.028 * 0.002).abs() < 1e-12);
    }
}
