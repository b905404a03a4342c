//! SON: a small-outline no-lead body with lands on two sides only.
//!
//! Cut-down QFN. Same rounded-end lands and side plating, but the rows
//! sit on the E faces alone and the side piece height follows the body.

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

const TERMINAL: FeatureKey = FeatureKey("terminal");
const TERMINAL_SIDE: FeatureKey = FeatureKey("terminal_side");
const THERMAL_PAD: FeatureKey = FeatureKey("thermal_pad");

const TERMINAL_THICKNESS: f64 = 0.005;
/// Printed pin-1 dot, fixed diameter 0.015.
const MARK_RADIUS: f64 = 0.0075;

/// Land area: a rectangle whose inner end is a semicircle.
fn land_area(length: f64, width: f64) -> f64 {
    (length - width / 2.0) * width + PI * (width / 2.0) * (width / 2.0) / 2.0
}

fn lead_finish() -> Finish {
    Finish::of(Material::CopperAlloy).with_appearance(Appearance::NickelPolished)
}

pub struct Son;

impl PackageBuilder for Son {
    fn package_type(&self) -> PackageType {
        PackageType::Son
    }

    fn params(&self) -> &'static [ParamSpec] {
        const PARAMS: &[ParamSpec] = &[
            ParamSpec::length("A", 0.08, "body height"),
            ParamSpec::length("b", 0.03, "terminal width"),
            ParamSpec::length("D", 0.41, "body length"),
            ParamSpec::length("E", 0.31, "body width"),
            ParamSpec::length("e", 0.05, "pin pitch"),
            ParamSpec::length("L", 0.05, "terminal length"),
            ParamSpec::length("D2", 0.34, "thermal pad length"),
            ParamSpec::length("E2", 0.15, "thermal pad width"),
            ParamSpec::count("DPins", 14, "pins"),
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
        let a = resolved.dim("A");
        let b = resolved.dim("b");
        let d = resolved.dim("D");
        let e_w = resolved.dim("E");
        let pitch = resolved.dim("e");
        let land = resolved.dim("L");
        let pins = resolved.count("DPins") / 2;
        let tt = TERMINAL_THICKNESS;

        let mut ops = ctx.ops();

        // Body hangs from its top plane down to the land stock.
        ops.plane("BodyPlaneXy", BasePlane::Xy, Arg::expr(a, "param_A"))?;
        let body_sketch = ops.sketch("BodySketch", SketchPlane::offset_from(BasePlane::Xy, a));
        sketch_ops::center_rectangle(ops.sketch_mut(body_sketch), Point2::new(0.0, 0.0), e_w, d);
        let profile = ops.rect(Arg::expr(e_w, "param_E"), Arg::expr(d, "param_D"))?;
        let body = ops.extrude(
            "Body",
            profile,
            Arg::expr(-a + tt, "-param_A + 0.005"),
            "Body",
            Finish::body(),
        )?;
        // Chamfer cut at a tenth of the height, then driven off the
        // terminal width.
        ops.chamfer(
            "BodyChamfer",
            body.body,
            Arg::expr(0.1 * a, "param_b/2"),
            Arg::expr(0.1 * a, "param_b/2"),
            Arg::expr(2.0 * (e_w + d), "(param_E + param_D) * 2"),
        )?;

        let mark_center = Point2::new(
            -e_w / 2.0 + 0.2 * a + 0.015,
            d / 2.0 - 0.2 * a - 0.015,
        );
        ops.sketch_mut(body_sketch).add_circle(mark_center, MARK_RADIUS);
        let mark_profile = ProfileSpec::Circle {
            radius: Dim::literal(MARK_RADIUS),
        };
        ops.extrude_cut(
            "PinOneMark",
            mark_profile,
            Arg::expr(-0.1 * a, "-0.1 * param_A"),
            body.body,
        )?;

        // One land outline serves both the pad and its side plating.
        let row = f64::from(pins.max(1) - 1) * pitch / 2.0;
        let land_sketch =
            ops.sketch("TerminalSketch", SketchPlane::offset_from(BasePlane::Xy, 0.0));
        sketch_ops::center_rectangle(
            ops.sketch_mut(land_sketch),
            Point2::new(e_w / 2.0 + 0.0001 - land / 2.0, row),
            land,
            b,
        );
        sketch_ops::semicircle(
            ops.sketch_mut(land_sketch),
            Point2::new(e_w / 2.0 - land + b / 2.0, row),
            b / 2.0,
        );
        let area = land_area(land, b);
        let side = ops.extrude(
            "TerminalSide",
            ops.area(area),
            Arg::expr((a - tt) / 5.0, "(param_A - 0.005)/5"),
            "TerminalSide",
            lead_finish(),
        )?;
        let terminal = ops.extrude(
            "Terminal",
            ops.area(area),
            Arg::lit(tt),
            "Terminal",
            lead_finish(),
        )?;
        ops.mirror_and_pattern(
            "Terminal",
            terminal.feature,
            BasePlane::Yz,
            pins,
            Arg::expr(-pitch, "-param_e"),
        )?;
        ops.mirror_and_pattern(
            "TerminalSide",
            side.feature,
            BasePlane::Yz,
            pins,
            Arg::expr(-pitch, "-param_e"),
        )?;

        let thermal = ops.thermal_pad(
            Arg::expr(resolved.dim("E2"), "param_E2"),
            Arg::expr(resolved.dim("D2"), "param_D2"),
            Arg::lit(tt),
            Arg::lit(0.0),
        )?;

        ops.index(TERMINAL, terminal.feature);
        ops.index(TERMINAL_SIDE, side.feature);
        ops.index(THERMAL_PAD, thermal.feature);
        ops.commit()
    }

    fn update(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let area = land_area(resolved.dim("L"), resolved.dim("b"));
        let component = ctx.component();
        set_indexed_area(component, TERMINAL, area)?;
        set_indexed_area(component, TERMINAL_SIDE, area)
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
        drive(&mut ctx, &Son, params).unwrap();
    }

    fn indexed_volume(design: &Design, key: FeatureKey) -> f64 {
        let component = design.component(design.root()).unwrap();
        let feature = component.indexed(key).unwrap();
        let body = component.history.get(feature).unwrap().bodies[0];
        component.history.body(body).unwrap().volume
    }

    #[test]
    fn two_rows_of_lands_with_side_plating() {
        let mut design = Design::new("son");
        run(&mut design, &ParameterSet::new());

        let component = design.component(design.root()).unwrap();
        // body + 2 bodies per pin on 14 positions, thermal suppressed
        assert_eq!(component.history.active_body_count(), 29);

        let area = land_area(0.05, 0.03);
        assert!((indexed_volume(&design, TERMINAL) - area * 0.005).abs() < 1e-12);
        let side = (0.08 - 0.005) / 5.0;
        assert!((indexed_volume(&design, TERMINAL_SIDE) - area * side).abs() < 1e-12);
    }

    #[test]
    fn body_dimensions_register_as_given() {
        let mut design = Design::new("son");
        run(&mut design, &ParameterSet::new());

        assert!((design.parameters.value_of("param_D").unwrap() - 0.41).abs() < 1e-12);
        assert!((design.parameters.value_of("param_E").unwrap() - 0.31).abs() < 1e-12);
        assert!((design.parameters.value_of("param_DPins").unwrap() - 14.0).abs() < 1e-12);
    }

    #[test]
    fn terminal_length_update_reshapes_both_rows() {
        let mut design = Design::new("son");
        run(&mut design, &ParameterSet::new());
        let before = design.component(design.root()).unwrap().history.len();

        run(&mut design, &ParameterSet::new().with("L", 0.06));
        let component = design.component(design.root()).unwrap();
        assert_eq!(component.history.len(), before);

        let area = land_area(0.06, 0.03);
        assert!((indexed_volume(&design, TERMINAL) - area * 0.005).abs() < 1e-12);
    }

    #[test]
    fn thermal_pad_suppression_follows_the_flag() {
        let mut design = Design::new("son");
        run(&mut design, &ParameterSet::new().with("thermal", true));
        assert_eq!(
            design
                .component(design.root())
                .unwrap()
                .history
                .active_body_count(),
            30
        );

        run(&mut design, &ParameterSet::new().with("thermal", false));
        assert_eq!(
            design
                .component(design.root())
                .unwrap()
                .history
                .active_body_count(),
            29
        );
    }
}
