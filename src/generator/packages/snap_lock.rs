//! Snap lock: a one-piece nylon rivet that spaces a board off a
//! chassis. A turned drum spans the gap, a shank runs through the
//! mounting hole on each face, and a split conical latch springs
//! open past the far side. The whole part is a single body of
//! revolution with an expansion slot cut through both latches.

use crate::error::GenerateResult;
use crate::generator::context::BuildContext;
use crate::generator::feature_ops::{set_indexed_area, Arg};
use crate::generator::framework::{PackageBuilder, ParamSpec, Resolved};
use crate::generator::packages::PackageType;
use crate::generator::sketch_ops;
use crate::model::material::{Finish, Material};
use crate::model::{BasePlane, FeatureKey, Point2, SketchPlane};

const TAPER: FeatureKey = FeatureKey("taper");
const GAP: FeatureKey = FeatureKey("gap");

/// Half-section corners of the turned outline, axis along sketch x.
/// The drum spans `[-A, 0]`; a shank, a collar and a cone hang off
/// each end in mirror image.
fn section_points(a: f64, a1: f64, e: f64, e1: f64, l1: f64, b: f64) -> [Point2; 14] {
    [
        Point2::new(0.0, b / 2.0),
        Point2::new(0.0, e / 2.0),
        Point2::new(-a, e / 2.0),
        Point2::new(-a, b / 2.0),
        Point2::new(-a - a1, b / 2.0),
        Point2::new(-a - a1, e1 / 2.0),
        Point2::new(-a - a1 - l1 / 5.0, e1 / 2.0),
        Point2::new(-a - a1 - l1, b / 2.0),
        Point2::new(-a - a1 - l1, 0.0),
        Point2::new(a1 + l1, 0.0),
        Point2::new(a1 + l1, b / 2.0),
        Point2::new(a1 + l1 / 5.0, e1 / 2.0),
        Point2::new(a1, e1 / 2.0),
        Point2::new(a1, b / 2.0),
    ]
}

/// Trapezoid sections of the two latch cones taken together, and the
/// centroid radius they share. Each cone tapers from the collar
/// radius to the shank radius over four fifths of the lock height.
fn taper_section(e1: f64, b: f64, l1: f64) -> (f64, f64) {
    let area = 2.0 * l1 * (e1 + b) / 5.0;
    let centroid = (e1 * e1 + e1 * b + b * b) / (6.0 * (e1 + b));
    (area, centroid)
}

/// Slot silhouette over both latches. The round reliefs at the slot
/// roots sit inside the rectangles and add nothing.
fn gap_area(a1: f64, l1: f64, b: f64) -> f64 {
    2.0 * b / 3.0 * (a1 + l1)
}

pub struct SnapLock;

impl PackageBuilder for SnapLock {
    fn package_type(&self) -> PackageType {
        PackageType::SnapLock
    }

    fn params(&self) -> &'static [ParamSpec] {
        const PARAMS: &[ParamSpec] = &[
            ParamSpec::length("A", 0.8128, "body height"),
            ParamSpec::length("A1", 0.16, "board thickness"),
            ParamSpec::length("E", 0.46, "body diameter"),
            ParamSpec::length("E1", 0.38, "lock diameter"),
            ParamSpec::length("L1", 0.2, "lock height"),
            ParamSpec::length("b", 0.318, "mounting hole diameter"),
        ];
        PARAMS
    }

    fn create(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let a = resolved.dim("A");
        let a1 = resolved.dim("A1");
        let e = resolved.dim("E");
        let e1 = resolved.dim("E1");
        let l1 = resolved.dim("L1");
        let b = resolved.dim("b");

        let mut ops = ctx.ops();

        let body_sketch = ops.sketch("BodySketch", SketchPlane::offset_from(BasePlane::Yz, 0.0));
        sketch_ops::polygon(
            ops.sketch_mut(body_sketch),
            &section_points(a, a1, e, e1, l1, b),
        );

        let drum_profile = ops.rect(Arg::expr(a, "param_A"), Arg::expr(e / 2.0, "param_E/2"))?;
        let drum = ops.revolve(
            "Body",
            drum_profile,
            Arg::expr(e / 4.0, "param_E/4"),
            360.0,
            "SnapLock",
            Finish::of(Material::Nylon),
        )?;

        // Both faces carry the same shank and latch; one feature covers each pair.
        let shank_profile = ops.rect(
            Arg::expr(2.0 * a1, "param_A1 * 2"),
            Arg::expr(b / 2.0, "param_b/2"),
        )?;
        ops.revolve_join(
            "Shank",
            shank_profile,
            Arg::expr(b / 4.0, "param_b/4"),
            360.0,
            drum.body,
        )?;
        let collar_profile = ops.rect(
            Arg::expr(2.0 * l1 / 5.0, "param_L1 * 2/5"),
            Arg::expr(e1 / 2.0, "param_E1/2"),
        )?;
        ops.revolve_join(
            "LockCollar",
            collar_profile,
            Arg::expr(e1 / 4.0, "param_E1/4"),
            360.0,
            drum.body,
        )?;
        let (taper_area, taper_centroid) = taper_section(e1, b, l1);
        let taper = ops.revolve_join(
            "LockTaper",
            ops.area(taper_area),
            Arg::expr(
                taper_centroid,
                "(param_E1 * param_E1 + param_E1 * param_b + param_b * param_b) / (6 * (param_E1 + param_b))",
            ),
            360.0,
            drum.body,
        )?;

        // Expansion slot through each latch, a round relief at the root.
        let gap_sketch = ops.sketch("GapSketch", SketchPlane::offset_from(BasePlane::Xz, 0.0));
        sketch_ops::center_rectangle(
            ops.sketch_mut(gap_sketch),
            Point2::new(0.0, -a - (a1 + l1) / 2.0),
            b / 3.0,
            a1 + l1,
        );
        sketch_ops::center_circle(
            ops.sketch_mut(gap_sketch),
            Point2::new(0.0, -a - b / 6.0),
            b / 3.0,
        );
        sketch_ops::center_rectangle(
            ops.sketch_mut(gap_sketch),
            Point2::new(0.0, (a1 + l1) / 2.0),
            b / 3.0,
            a1 + l1,
        );
        sketch_ops::center_circle(ops.sketch_mut(gap_sketch), Point2::new(0.0, b / 6.0), b / 3.0);
        // Symmetric cut; the distance clears the widest turned diameter.
        let gap = ops.extrude_cut(
            "GapExtrude",
            ops.area(gap_area(a1, l1, b)),
            Arg::expr(e1 + b, "param_E1 + param_b"),
            drum.body,
        )?;

        ops.index(TAPER, taper);
        ops.index(GAP, gap);
        ops.commit()
    }

    fn update(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let a1 = resolved.dim("A1");
        let e1 = resolved.dim("E1");
        let l1 = resolved.dim("L1");
        let b = resolved.dim("b");
        let (taper_area, _) = taper_section(e1, b, l1);
        let component = ctx.component();
        set_indexed_area(component, TAPER, taper_area)?;
        set_indexed_area(component, GAP, gap_area(a1, l1, b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::generator::framework::drive;
    use crate::generator::params::ParameterSet;
    use crate::model::{Component, Design};
    use std::f64::consts::PI;

    fn run(design: &mut Design, params: &ParameterSet) {
        let root = design.root();
        let config = Config::default();
        let mut ctx = BuildContext::new(design, root, &config).unwrap();
        drive(&mut ctx, &SnapLock, params).unwrap();
    }

    fn body_volume(component: &Component, name: &str) -> f64 {
        component
            .history
            .active_bodies()
            .find(|(_, body)| body.name == name)
            .map(|(_, body)| body.volume)
            .unwrap()
    }

    /// Solid of revolution for the full outline, minus the slot.
    fn lock_volume(a: f64, a1: f64, e: f64, e1: f64, l1: f64, b: f64) -> f64 {
        let drum = PI / 4.0 * e * e * a;
        let shanks = PI / 2.0 * b * b * a1;
        let collars = PI / 10.0 * e1 * e1 * l1;
        let tapers = 2.0 * PI * l1 * (e1 * e1 + e1 * b + b * b) / 15.0;
        drum + shanks + collars + tapers - gap_area(a1, l1, b) * (e1 + b)
    }

    #[test]
    fn lock_turns_one_body_with_latched_ends() {
        let mut design = Design::new("snap lock");
        run(&mut design, &ParameterSet::new());

        assert_eq!(design.parameters.len(), 6);
        let component = design.component(design.root()).unwrap();
        assert_eq!(component.history.active_body_count(), 1);

        let expected = lock_volume(0.8128, 0.16, 0.46, 0.38, 0.2, 0.318);
        assert!((body_volume(component, "SnapLock") - expected).abs() < 1e-12);
    }

    #[test]
    fn taller_latch_reslots_the_cut() {
        let mut design = Design::new("snap lock");
        run(&mut design, &ParameterSet::new());
        let before = design.component(design.root()).unwrap().history.len();

        run(&mut design, &ParameterSet::new().with("L1", 0.26));
        let component = design.component(design.root()).unwrap();
        assert_eq!(component.history.len(), before);
        assert_eq!(design.parameters.value_of("param_L1"), Some(0.26));

        let expected = lock_volume(0.8128, 0.16, 0.46, 0.38, 0.26, 0.318);
        assert!((body_volume(component, "SnapLock") - expected).abs() < 1e-12);
    }

    #[test]
    fn wider_hole_rescales_shank_and_slot() {
        let mut design = Design::new("snap lock");
        run(&mut design, &ParameterSet::new());
        run(&mut design, &ParameterSet::new().with("b", 0.4));

        let component = design.component(design.root()).unwrap();
        let expected = lock_volume(0.8128, 0.16, 0.46, 0.38, 0.2, 0.4);
        assert!((body_volume(component, "SnapLock") - expected).abs() < 1e-12);
    }
}
