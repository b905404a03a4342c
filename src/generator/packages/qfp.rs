//! QFP: gull-wing leads on all four body sides.
//!
//! The D-side rows are one mirrored-and-patterned lead, the E-side rows
//! another, each on its own row plane. Both rows share the pitch, the
//! land length and the lead width; only the spans differ. An optional
//! exposed thermal pad sits under the body centre.

use crate::error::GenerateResult;
use crate::generator::context::BuildContext;
use crate::generator::feature_ops::{set_indexed_area, set_indexed_radius, Arg};
use crate::generator::framework::{
    FlagSpec, OptionalFeature, PackageBuilder, ParamSpec, Resolved,
};
use crate::generator::packages::PackageType;
use crate::generator::params::ParameterSet;
use crate::generator::sketch_ops;
use crate::model::material::{Appearance, Finish, Material};
use crate::model::{BasePlane, FeatureKey, Point2, SketchPlane};

const FRONT_PIN: FeatureKey = FeatureKey("front_pin");
const LEFT_PIN: FeatureKey = FeatureKey("left_pin");
const THERMAL_PAD: FeatureKey = FeatureKey("thermal_pad");
const PIN_ONE_MARK: FeatureKey = FeatureKey("pin_one_mark");

const TERMINAL_THICKNESS: f64 = 0.02;

fn lead_finish() -> Finish {
    Finish::of(Material::CopperAlloy).with_appearance(Appearance::NickelPolished)
}

pub struct Qfp;

impl PackageBuilder for Qfp {
    fn package_type(&self) -> PackageType {
        PackageType::Qfp
    }

    fn params(&self) -> &'static [ParamSpec] {
        const PARAMS: &[ParamSpec] = &[
            ParamSpec::length("A", 0.12, "body height"),
            ParamSpec::length("A1", 0.005, "body offset"),
            ParamSpec::length("E", 1.31, "span"),
            ParamSpec::length("E1", 1.02, "body width"),
            ParamSpec::length("D", 1.31, "span"),
            ParamSpec::length("D1", 1.02, "body length"),
            ParamSpec::length("e", 0.05, "pitch"),
            ParamSpec::length("b", 0.027, "terminal width"),
            ParamSpec::length("L", 0.103, "terminal land"),
            ParamSpec::length("D2", 0.7, "thermal pad length"),
            ParamSpec::length("E2", 0.7, "thermal pad width"),
            ParamSpec::length("terminalThickness", TERMINAL_THICKNESS, "terminal thickness"),
            ParamSpec::count("DPins", 32, "D side pins"),
            ParamSpec::count("EPins", 32, "E side pins"),
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

    fn derive(&self, resolved: &mut Resolved, _params: &ParameterSet) {
        // The lead frame stock is fixed for this family.
        resolved.set_dim("terminalThickness", TERMINAL_THICKNESS);
    }

    fn create(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let a = resolved.dim("A");
        let a1 = resolved.dim("A1");
        let e_span = resolved.dim("E");
        let e1 = resolved.dim("E1");
        let d_span = resolved.dim("D");
        let d1 = resolved.dim("D1");
        let pitch = resolved.dim("e");
        let b = resolved.dim("b");
        let land = resolved.dim("L");
        let tt = resolved.dim("terminalThickness");
        let front = resolved.count("DPins") / 2;
        let left = resolved.count("EPins") / 2;

        let mut ops = ctx.ops();

        ops.plane("BodyPlaneXy", BasePlane::Xy, Arg::expr(a1, "param_A1"))?;
        let body_sketch = ops.sketch("BodySketch", SketchPlane::offset_from(BasePlane::Xy, a1));
        sketch_ops::center_rectangle(ops.sketch_mut(body_sketch), Point2::new(0.0, 0.0), e1, d1);
        let profile = ops.rect(Arg::expr(e1, "param_E1"), Arg::expr(d1, "param_D1"))?;
        let body = ops.extrude(
            "Body",
            profile,
            Arg::expr(a - a1, "param_A - param_A1"),
            "Body",
            Finish::body(),
        )?;

        let slab = a - a1 - tt;
        let edges = Arg::expr(2.0 * (e1 + d1), "(param_E1 + param_D1) * 2");
        ops.chamfer(
            "BodyChamferTop",
            body.body,
            Arg::expr(slab / 2.0, "(param_A - param_A1 - param_terminalThickness)/2"),
            Arg::expr(0.2 * slab, "param_A/10"),
            edges,
        )?;
        ops.chamfer(
            "BodyChamferBottom",
            body.body,
            Arg::expr(0.2 * slab, "param_A/10"),
            Arg::expr(slab / 2.0, "(param_A - param_A1 - param_terminalThickness)/2"),
            edges,
        )?;

        let height = (a + a1) / 2.0 + tt / 2.0;

        let front_offset = pitch / 2.0 * f64::from(front.max(1) - 1);
        ops.plane(
            "FrontPinPlaneXz",
            BasePlane::Xz,
            Arg::expr(front_offset, "param_e/2 * (param_DPins/2-1)"),
        )?;
        let front_sketch = ops.sketch(
            "FrontPinSketch",
            SketchPlane::offset_from(BasePlane::Xz, front_offset),
        );
        let front_area = sketch_ops::gullwing_outline(
            ops.sketch_mut(front_sketch),
            Point2::new(e1 / 2.0, 0.0),
            1.0,
            (e_span - e1) / 2.0,
            height,
            tt,
            land,
        );
        let front_profile = ops.area(front_area);
        let front_pin = ops.extrude(
            "FrontPin",
            front_profile,
            Arg::expr(b, "param_b"),
            "FrontPin",
            lead_finish(),
        )?;
        ops.mirror_and_pattern(
            "FrontPin",
            front_pin.feature,
            BasePlane::Yz,
            front,
            Arg::expr(-pitch, "-param_e"),
        )?;

        // The E-side lead is drawn the same way, then its row runs along
        // the other axis.
        let left_offset = -pitch / 2.0 * f64::from(left.max(1) - 1);
        ops.plane(
            "LeftPinPlaneXz",
            BasePlane::Xz,
            Arg::expr(left_offset, "-param_e/2 * (param_EPins/2-1)"),
        )?;
        let left_sketch = ops.sketch(
            "LeftPinSketch",
            SketchPlane::offset_from(BasePlane::Xz, left_offset),
        );
        let left_area = sketch_ops::gullwing_outline(
            ops.sketch_mut(left_sketch),
            Point2::new(d1 / 2.0, 0.0),
            1.0,
            (d_span - d1) / 2.0,
            height,
            tt,
            land,
        );
        let left_profile = ops.area(left_area);
        let left_pin = ops.extrude(
            "LeftPin",
            left_profile,
            Arg::expr(b, "param_b"),
            "LeftPin",
            lead_finish(),
        )?;
        ops.mirror_and_pattern(
            "LeftPin",
            left_pin.feature,
            BasePlane::Xz,
            left,
            Arg::expr(-pitch, "-param_e"),
        )?;

        let pad_thickness = if a1 == 0.0 { tt } else { a1 };
        let thermal = ops.thermal_pad(
            Arg::expr(resolved.dim("E2"), "param_E2"),
            Arg::expr(resolved.dim("D2"), "param_D2"),
            Arg::lit(pad_thickness),
            Arg::lit(0.0),
        )?;

        let mark = ops.pin_one_mark(
            body.body,
            Arg::expr(a, "param_A"),
            Arg::expr(0.1 * a, "param_A/10"),
            d1,
            e1,
        )?;

        ops.index(FRONT_PIN, front_pin.feature);
        ops.index(LEFT_PIN, left_pin.feature);
        ops.index(THERMAL_PAD, thermal.feature);
        ops.index(PIN_ONE_MARK, mark);
        ops.commit()
    }

    fn update(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let tt = resolved.dim("terminalThickness");
        let component = ctx.component();
        set_indexed_area(
            component,
            FRONT_PIN,
            tt * (resolved.dim("E") - resolved.dim("E1")) / 2.0,
        )?;
        set_indexed_area(
            component,
            LEFT_PIN,
            tt * (resolved.dim("D") - resolved.dim("D1")) / 2.0,
        )?;
        set_indexed_radius(component, PIN_ONE_MARK, resolved.dim("E1") / 20.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::generator::framework::drive;
    use crate::model::Design;

    fn run(design: &mut Design, params: &ParameterSet) {
        let root = design.root();
        let config = Config::default();
        let mut ctx = BuildContext::new(design, root, &config).unwrap();
        drive(&mut ctx, &Qfp, params).unwrap();
    }

    #[test]
    fn four_sided_rows_count_out_to_sixty_four_leads() {
        let mut design = Design::new("qfp");
        run(&mut design, &ParameterSet::new());

        let component = design.component(design.root()).unwrap();
        // body + 32 + 32 leads; thermal pad suppressed
        assert_eq!(component.history.active_body_count(), 65);
        assert_eq!(design.parameters.len(), 14);
    }

    #[test]
    fn lead_volume_tracks_both_spans() {
        let mut design = Design::new("qfp");
        run(&mut design, &ParameterSet::new());

        let component = design.component(design.root()).unwrap();
        let front = component.indexed(FRONT_PIN).unwrap();
        let body = component.history.get(front).unwrap().bodies[0];
        let expected = 0.02 * ((1.31 - 1.02) / 2.0) * 0.027;
        assert!((component.history.body(body).unwrap().volume - expected).abs() < 1e-12);

        run(&mut design, &ParameterSet::new().with("D", 1.5));
        let component = design.component(design.root()).unwrap();
        let left = component.indexed(LEFT_PIN).unwrap();
        let body = component.history.get(left).unwrap().bodies[0];
        let expected = 0.02 * ((1.5 - 1.02) / 2.0) * 0.027;
        assert!((component.history.body(body).unwrap().volume - expected).abs() < 1e-12);
    }

    #[test]
    fn thermal_pad_toggles_without_touching_the_rows() {
        let mut design = Design::new("qfp");
        run(&mut design, &ParameterSet::new());
        run(&mut design, &ParameterSet::new().with("thermal", true));

        let component = design.component(design.root()).unwrap();
        assert_eq!(component.history.active_body_count(), 66);

        run(&mut design, &ParameterSet::new().with("thermal", false));
        let component = design.component(design.root()).unwrap();
        assert_eq!(component.history.active_body_count(), 65);
    }

    #[test]
    fn uneven_side_counts_rebuild_each_row() {
        let mut design = Design::new("qfp");
        run(&mut design, &ParameterSet::new());
        run(
            &mut design,
            &ParameterSet::new().with("DPins", 16.0).with("EPins", 8.0),
        );

        let component = design.component(design.root()).unwrap();
        assert_eq!(component.history.active_body_count(), 25);
    }
}
