//! Brass standoffs: a hex, round or square barrel picked by the `body`
//! text, bored and tapped from metric designations such as `M2.5x0.45`.
//! The female family threads one or both ends of a single bore; the
//! male-female family pairs a tapped bore with a threaded post hanging
//! below the barrel.

use std::f64::consts::FRAC_PI_4;

use crate::error::GenerateResult;
use crate::generator::context::BuildContext;
use crate::generator::feature_ops::{
    set_indexed_area, set_indexed_distance, set_indexed_thread, set_indexed_thread_length, Arg,
    BodyRef, Ops,
};
use crate::generator::framework::{
    FlagSpec, OptionalFeature, PackageBuilder, ParamSpec, Resolved, TextSpec,
};
use crate::generator::packages::PackageType;
use crate::generator::params::ParameterSet;
use crate::generator::sketch_ops;
use crate::generator::threads;
use crate::model::material::{Finish, Material};
use crate::model::{BasePlane, FeatureKey, Point2, SketchPlane};

const BODY: FeatureKey = FeatureKey("body");
const TOP_HOLE: FeatureKey = FeatureKey("top_hole");
const TOP_THREAD: FeatureKey = FeatureKey("top_thread");
const BOTTOM_HOLE: FeatureKey = FeatureKey("bottom_hole");
const BOTTOM_THREAD: FeatureKey = FeatureKey("bottom_thread");
const INNER_THREAD: FeatureKey = FeatureKey("inner_thread");
const POST_THREAD: FeatureKey = FeatureKey("post_thread");

/// Hexagon over flats `e`; the circumradius is `e / sqrt(3)`.
fn hex_points(e: f64) -> [Point2; 6] {
    let r = e / 3f64.sqrt();
    [
        Point2::new(r, 0.0),
        Point2::new(r / 2.0, e / 2.0),
        Point2::new(-r / 2.0, e / 2.0),
        Point2::new(-r, 0.0),
        Point2::new(-r / 2.0, -e / 2.0),
        Point2::new(r / 2.0, -e / 2.0),
    ]
}

/// Barrel cross-section for the chosen shape. Anything but `round` or
/// `square` lands on the hex default.
fn barrel_area(shape: &str, e: f64) -> f64 {
    match shape {
        "round" => FRAC_PI_4 * e * e,
        "square" => e * e,
        _ => 3f64.sqrt() / 2.0 * e * e,
    }
}

/// All three barrel outlines are drawn up front; the `body` text picks
/// which one the extrude consumes, and an update re-picks without a
/// rebuild.
fn barrel_sketches(ops: &mut Ops<'_>, e: f64) {
    let hex = ops.sketch("SketchHexBody", SketchPlane::offset_from(BasePlane::Xy, 0.0));
    sketch_ops::polygon(ops.sketch_mut(hex), &hex_points(e));
    let round = ops.sketch("SketchRoundBody", SketchPlane::offset_from(BasePlane::Xy, 0.0));
    sketch_ops::center_circle(ops.sketch_mut(round), Point2::new(0.0, 0.0), e);
    let square = ops.sketch(
        "SketchSquareBody",
        SketchPlane::offset_from(BasePlane::Xy, 0.0),
    );
    sketch_ops::center_rectangle(ops.sketch_mut(square), Point2::new(0.0, 0.0), e, e);
}

fn barrel_body(ops: &mut Ops<'_>, shape: &str, e: f64, a: f64) -> GenerateResult<BodyRef> {
    ops.extrude(
        "Body",
        ops.area(barrel_area(shape, e)),
        Arg::expr(a, "param_A"),
        "Standoff",
        Finish::of(Material::Brass),
    )
}

pub struct FemaleStandoff;

impl FemaleStandoff {
    /// Bore depth for the current switch state. Partial threads stop a
    /// hair past the thread length; every other state drills through.
    fn bore_depth(resolved: &Resolved) -> f64 {
        if resolved.flag("partial") {
            resolved.dim("L") + 0.001
        } else {
            resolved.dim("A")
        }
    }

    fn thread_length(resolved: &Resolved) -> f64 {
        if resolved.flag("partial") {
            resolved.dim("L")
        } else {
            resolved.dim("A")
        }
    }
}

impl PackageBuilder for FemaleStandoff {
    fn package_type(&self) -> PackageType {
        PackageType::FemaleStandoff
    }

    fn params(&self) -> &'static [ParamSpec] {
        const PARAMS: &[ParamSpec] = &[
            ParamSpec::length("A", 1.0, "body height"),
            ParamSpec::length("E", 0.5, "body width"),
            ParamSpec::length("L", 0.2, "partial thread length"),
            ParamSpec::length("b", 0.2, "non threaded hole diameter"),
        ];
        PARAMS
    }

    fn flags(&self) -> &'static [FlagSpec] {
        const FLAGS: &[FlagSpec] = &[FlagSpec::detail("thread"), FlagSpec::detail("partial")];
        FLAGS
    }

    fn texts(&self) -> &'static [TextSpec] {
        const TEXTS: &[TextSpec] = &[
            TextSpec::new("body", "hex"),
            TextSpec::new("threadType", "ISO Metric profile"),
            TextSpec::new("threadDesignation", "M2.5x0.45"),
        ];
        TEXTS
    }

    fn optional_features(&self) -> &'static [OptionalFeature] {
        const OPTIONAL: &[OptionalFeature] = &[
            OptionalFeature::when_set("thread", TOP_THREAD),
            OptionalFeature::when_set("partial", BOTTOM_HOLE),
            OptionalFeature::when_set("partial", BOTTOM_THREAD),
        ];
        OPTIONAL
    }

    fn derive(&self, resolved: &mut Resolved, _params: &ParameterSet) {
        // A partial thread only exists on a threaded standoff.
        let partial = resolved.flag("thread") && resolved.flag("partial");
        resolved.set_flag("partial", partial);
    }

    fn create(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let a = resolved.dim("A");
        let e = resolved.dim("E");
        let l = resolved.dim("L");
        let b = resolved.dim("b");
        let spec = threads::parse(resolved.text("threadDesignation"))?;

        let mut ops = ctx.ops();
        barrel_sketches(&mut ops, e);
        let body = barrel_body(&mut ops, resolved.text("body"), e, a)?;

        // Bore from the top face, flat bottomed.
        ops.plane("TopPlane", BasePlane::Xy, Arg::expr(a, "param_A"))?;
        let bore_sketch = ops.sketch("BoreSketch", SketchPlane::offset_from(BasePlane::Xy, a));
        sketch_ops::center_circle(ops.sketch_mut(bore_sketch), Point2::new(0.0, 0.0), b);
        let top_hole = ops.extrude_cut(
            "TopHole",
            ops.circle(Arg::expr(b / 2.0, "param_b/2"))?,
            Arg::lit(Self::bore_depth(resolved)),
            body.body,
        )?;
        let top_thread = ops.thread(
            "TopThread",
            body.body,
            &spec,
            Arg::lit(Self::thread_length(resolved)),
            false,
        )?;

        // The partial state mirrors the bore about the waist; the pair is
        // built outright and suppressed while unused.
        ops.plane("MirrorPlane", BasePlane::Xy, Arg::expr(a / 2.0, "param_A/2"))?;
        let bottom_hole = ops.extrude_cut(
            "BottomHole",
            ops.circle(Arg::expr(b / 2.0, "param_b/2"))?,
            Arg::lit(l + 0.001),
            body.body,
        )?;
        let bottom_thread = ops.thread("BottomThread", body.body, &spec, Arg::lit(l), false)?;

        ops.index(BODY, body.feature);
        ops.index(TOP_HOLE, top_hole);
        ops.index(TOP_THREAD, top_thread);
        ops.index(BOTTOM_HOLE, bottom_hole);
        ops.index(BOTTOM_THREAD, bottom_thread);
        ops.commit()
    }

    fn update(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let e = resolved.dim("E");
        let l = resolved.dim("L");
        let spec = threads::parse(resolved.text("threadDesignation"))?;
        let depth = Self::bore_depth(resolved);
        let length = Self::thread_length(resolved);
        let area = barrel_area(resolved.text("body"), e);

        let component = ctx.component();
        set_indexed_area(component, BODY, area)?;
        set_indexed_distance(component, TOP_HOLE, depth)?;
        set_indexed_distance(component, BOTTOM_HOLE, l + 0.001)?;
        set_indexed_thread(component, TOP_THREAD, &spec)?;
        set_indexed_thread_length(component, TOP_THREAD, length)?;
        set_indexed_thread(component, BOTTOM_THREAD, &spec)?;
        set_indexed_thread_length(component, BOTTOM_THREAD, l)
    }
}

pub struct MaleFemaleStandoff;

impl PackageBuilder for MaleFemaleStandoff {
    fn package_type(&self) -> PackageType {
        PackageType::MaleFemaleStandoff
    }

    fn params(&self) -> &'static [ParamSpec] {
        const PARAMS: &[ParamSpec] = &[
            ParamSpec::length("A", 1.0, "body height"),
            ParamSpec::length("E", 0.5, "body width"),
            ParamSpec::length("L", 0.2, "inner thread length"),
            ParamSpec::length("L1", 0.8, "post thread length"),
        ];
        PARAMS
    }

    fn texts(&self) -> &'static [TextSpec] {
        const TEXTS: &[TextSpec] = &[
            TextSpec::new("body", "hex"),
            TextSpec::new("innerThreadType", "ISO Metric profile"),
            TextSpec::new("innerThreadDesignation", "M2.5x0.45"),
            TextSpec::new("postThreadType", "ISO Metric profile"),
            TextSpec::new("postThreadDesignation", "M2.6x0.45"),
        ];
        TEXTS
    }

    fn create(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let a = resolved.dim("A");
        let e = resolved.dim("E");
        let l = resolved.dim("L");
        let l1 = resolved.dim("L1");
        let inner = threads::parse(resolved.text("innerThreadDesignation"))?;
        let post = threads::parse(resolved.text("postThreadDesignation"))?;

        let mut ops = ctx.ops();
        barrel_sketches(&mut ops, e);
        let body = barrel_body(&mut ops, resolved.text("body"), e, a)?;

        // The bore takes its diameter from the inner designation, frozen
        // at create; later designation changes re-cut threads only.
        ops.plane("TopPlane", BasePlane::Xy, Arg::expr(a, "param_A"))?;
        let bore_sketch = ops.sketch("BoreSketch", SketchPlane::offset_from(BasePlane::Xy, a));
        sketch_ops::center_circle(
            ops.sketch_mut(bore_sketch),
            Point2::new(0.0, 0.0),
            inner.major_diameter,
        );
        ops.extrude_cut(
            "InnerHole",
            ops.circle(Arg::lit(inner.major_diameter / 2.0))?,
            Arg::expr(l + 0.001, "param_L + 0.001"),
            body.body,
        )?;
        let inner_thread = ops.thread(
            "InnerThread",
            body.body,
            &inner,
            Arg::expr(l, "param_L"),
            false,
        )?;

        // Threaded post hanging below the barrel.
        let post_sketch = ops.sketch("SketchPostBody", SketchPlane::offset_from(BasePlane::Xy, 0.0));
        sketch_ops::center_circle(
            ops.sketch_mut(post_sketch),
            Point2::new(0.0, 0.0),
            post.major_diameter,
        );
        let post_body = ops.extrude(
            "Post",
            ops.circle(Arg::lit(post.major_diameter / 2.0))?,
            Arg::expr(-l1, "-param_L1"),
            "Post",
            Finish::of(Material::Brass),
        )?;
        let post_thread = ops.thread(
            "PostThread",
            post_body.body,
            &post,
            Arg::expr(l1, "param_L1"),
            false,
        )?;

        ops.index(BODY, body.feature);
        ops.index(INNER_THREAD, inner_thread);
        ops.index(POST_THREAD, post_thread);
        ops.commit()
    }

    fn update(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let e = resolved.dim("E");
        let inner = threads::parse(resolved.text("innerThreadDesignation"))?;
        let post = threads::parse(resolved.text("postThreadDesignation"))?;
        let area = barrel_area(resolved.text("body"), e);

        let component = ctx.component();
        set_indexed_area(component, BODY, area)?;
        set_indexed_thread(component, INNER_THREAD, &inner)?;
        set_indexed_thread(component, POST_THREAD, &post)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::generator::framework::drive;
    use crate::model::{Component, Design};
    use std::f64::consts::PI;

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

    fn hex_barrel(e: f64, a: f64) -> f64 {
        3f64.sqrt() / 2.0 * e * e * a
    }

    #[test]
    fn plain_standoff_drills_straight_through() {
        let mut design = Design::new("female standoff");
        run(&mut design, &FemaleStandoff, &ParameterSet::new());

        assert_eq!(design.parameters.len(), 4);
        let component = design.component(design.root()).unwrap();
        assert_eq!(component.history.active_body_count(), 1);

        let expected = hex_barrel(0.5, 1.0) - PI * 0.1 * 0.1 * 1.0;
        assert!((body_volume(component, "Standoff") - expected).abs() < 1e-12);
    }

    #[test]
    fn partial_threads_leave_solid_waist() {
        let mut design = Design::new("female standoff");
        run(&mut design, &FemaleStandoff, &ParameterSet::new());

        run(
            &mut design,
            &FemaleStandoff,
            &ParameterSet::new().with("thread", true).with("partial", true),
        );
        let component = design.component(design.root()).unwrap();

        let bore = PI * 0.1 * 0.1 * (0.2 + 0.001);
        let expected = hex_barrel(0.5, 1.0) - 2.0 * bore;
        assert!((body_volume(component, "Standoff") - expected).abs() < 1e-12);
    }

    #[test]
    fn partial_without_thread_still_drills_through() {
        let mut design = Design::new("female standoff");
        run(
            &mut design,
            &FemaleStandoff,
            &ParameterSet::new().with("partial", true),
        );
        let component = design.component(design.root()).unwrap();

        let expected = hex_barrel(0.5, 1.0) - PI * 0.1 * 0.1 * 1.0;
        assert!((body_volume(component, "Standoff") - expected).abs() < 1e-12);
    }

    #[test]
    fn body_text_swaps_barrel_section_in_place() {
        let mut design = Design::new("female standoff");
        run(&mut design, &FemaleStandoff, &ParameterSet::new());
        let before = design.component(design.root()).unwrap().history.len();

        run(
            &mut design,
            &FemaleStandoff,
            &ParameterSet::new().with("body", "round"),
        );
        let component = design.component(design.root()).unwrap();
        assert_eq!(component.history.len(), before);

        let expected = FRAC_PI_4 * 0.25 * 1.0 - PI * 0.1 * 0.1 * 1.0;
        assert!((body_volume(component, "Standoff") - expected).abs() < 1e-12);
    }

    #[test]
    fn male_female_hangs_a_threaded_post() {
        let mut design = Design::new("male female standoff");
        run(&mut design, &MaleFemaleStandoff, &ParameterSet::new());

        assert_eq!(design.parameters.len(), 4);
        let component = design.component(design.root()).unwrap();
        assert_eq!(component.history.active_body_count(), 2);

        // M2.5 bore, M2.6 post.
        let barrel = hex_barrel(0.5, 1.0) - PI * 0.125 * 0.125 * (0.2 + 0.001);
        assert!((body_volume(component, "Standoff") - barrel).abs() < 1e-12);
        let post = PI * 0.13 * 0.13 * 0.8;
        assert!((body_volume(component, "Post") - post).abs() < 1e-12);
    }

    #[test]
    fn designation_change_recuts_threads_not_bores() {
        let mut design = Design::new("male female standoff");
        run(&mut design, &MaleFemaleStandoff, &ParameterSet::new());
        let before = design.component(design.root()).unwrap().history.len();

        run(
            &mut design,
            &MaleFemaleStandoff,
            &ParameterSet::new().with("innerThreadDesignation", "M3x0.5"),
        );
        let component = design.component(design.root()).unwrap();
        assert_eq!(component.history.len(), before);

        // The drilled diameter stays as created.
        let barrel = hex_barrel(0.5, 1.0) - PI * 0.125 * 0.125 * (0.2 + 0.001);
        assert!((body_volume(component, "Standoff") - barrel).abs() < 1e-12);
    }
}
