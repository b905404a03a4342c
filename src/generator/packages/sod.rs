//! Small-outline diodes: the gull-wing SOD and the flat-lead SODFL.
//!
//! Both are two-terminal bodies with a printed polarity band near the
//! cathode end. SOD forms its leads down from the body midline and
//! mirrors one lead across the body; SODFL seats flat pads under each
//! end, usually of different lengths, so the two pins are modelled
//! separately rather than mirrored.

use crate::error::GenerateResult;
use crate::generator::context::BuildContext;
use crate::generator::feature_ops::{set_indexed_area, Arg};
use crate::generator::framework::{PackageBuilder, ParamSpec, Resolved};
use crate::generator::packages::PackageType;
use crate::generator::params::ParameterSet;
use crate::generator::sketch_ops;
use crate::model::material::Finish;
use crate::model::{BasePlane, FeatureKey, Point2, SketchPlane};

const PIN: FeatureKey = FeatureKey("pin");

/// Printed band thickness; a decal, so it never scales.
const BAND_RELIEF: f64 = 0.0002;

pub struct Sod;

impl PackageBuilder for Sod {
    fn package_type(&self) -> PackageType {
        PackageType::Sod
    }

    fn params(&self) -> &'static [ParamSpec] {
        const PARAMS: &[ParamSpec] = &[
            ParamSpec::length("A", 0.127, "body height"),
            ParamSpec::length("A1", 0.02, "body offset"),
            ParamSpec::length("E", 0.16, "body width"),
            ParamSpec::length("D", 0.375, "span"),
            ParamSpec::length("D1", 0.27, "body length"),
            ParamSpec::length("b", 0.065, "terminal width"),
            ParamSpec::length("L", 0.0285, "terminal length"),
            ParamSpec::length("terminalThickness", 0.015, "terminal thickness"),
        ];
        PARAMS
    }

    fn derive(&self, resolved: &mut Resolved, params: &ParameterSet) {
        let cap = params.length("c", 0.015);
        resolved.set_dim("terminalThickness", params.terminal_thickness(cap));
        // Chamfer angle; read at build time, never registered.
        resolved.set_dim("deg", params.length("deg", 8.0));
    }

    fn create(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let a = resolved.dim("A");
        let a1 = resolved.dim("A1");
        let width = resolved.dim("E");
        let d = resolved.dim("D");
        let d1 = resolved.dim("D1");
        let b = resolved.dim("b");
        let foot = resolved.dim("L");
        let tt = resolved.dim("terminalThickness");
        let deg = resolved.dim("deg");

        let mut ops = ctx.ops();

        ops.plane("BodyPlaneXy", BasePlane::Xy, Arg::expr(a1, "param_A1"))?;
        let body_sketch = ops.sketch("BodySketch", SketchPlane::offset_from(BasePlane::Xy, a1));
        sketch_ops::center_rectangle(ops.sketch_mut(body_sketch), Point2::new(0.0, 0.0), d1, width);
        let profile = ops.rect(Arg::expr(d1, "param_D1"), Arg::expr(width, "param_E"))?;
        let body = ops.extrude(
            "Body",
            profile,
            Arg::expr(a - a1, "param_A - param_A1"),
            "Body",
            Finish::body(),
        )?;

        // Two edges per face slope down towards the leads.
        let steep = (a - a1 - tt) / 2.0;
        let shallow = (deg.to_radians()).tan() * steep;
        let edges = Arg::expr(2.0 * width, "param_E * 2");
        ops.chamfer(
            "BodyChamferTop",
            body.body,
            Arg::expr(steep, "(param_A - param_A1 - param_terminalThickness)/2"),
            Arg::expr(shallow, "param_A/10"),
            edges,
        )?;
        ops.chamfer(
            "BodyChamferBottom",
            body.body,
            Arg::expr(shallow, "param_A/10"),
            Arg::expr(steep, "(param_A - param_A1 - param_terminalThickness)/2"),
            edges,
        )?;

        // Cathode band, one body-length sixth in from the end.
        let band = d1 / 6.0;
        ops.plane("PolarityBandPlaneXy", BasePlane::Xy, Arg::expr(a, "param_A"))?;
        let band_sketch =
            ops.sketch("PolarityBandSketch", SketchPlane::offset_from(BasePlane::Xy, a));
        sketch_ops::two_point_rectangle(
            ops.sketch_mut(band_sketch),
            Point2::new(-d1 / 2.0 + band, -width / 2.0),
            Point2::new(-d1 / 2.0 + band + band.min(1.0), width / 2.0),
        );
        let band_profile = ops.rect(Arg::expr(band.min(1.0), "param_D1/6"), Arg::expr(width, "param_E"))?;
        ops.extrude(
            "PolarityBand",
            band_profile,
            Arg::lit(BAND_RELIEF),
            "PolarityBand",
            Finish::body(),
        )?;

        let pin_sketch = ops.sketch("PinSketch", SketchPlane::offset_from(BasePlane::Xz, 0.0));
        let area = sketch_ops::gullwing_outline(
            ops.sketch_mut(pin_sketch),
            Point2::new(d1 / 2.0, 0.0),
            1.0,
            (d - d1) / 2.0,
            (a + a1) / 2.0 + tt / 2.0,
            tt,
            foot,
        );
        let lead_profile = ops.area(area);
        let pin = ops.extrude("Pin1", lead_profile, Arg::expr(b, "param_b"), "Pin1", Finish::terminal())?;
        ops.mirror("Pin1Mirror", &[pin.feature], BasePlane::Yz);

        ops.index(PIN, pin.feature);
        ops.commit()
    }

    fn update(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let area = resolved.dim("terminalThickness")
            * (resolved.dim("D") - resolved.dim("D1"))
            / 2.0;
        set_indexed_area(ctx.component(), PIN, area)
    }
}

pub struct Sodfl;

impl PackageBuilder for Sodfl {
    fn package_type(&self) -> PackageType {
        PackageType::Sodfl
    }

    fn params(&self) -> &'static [ParamSpec] {
        const PARAMS: &[ParamSpec] = &[
            ParamSpec::length("A", 0.05, "body height"),
            ParamSpec::length("E", 0.08, "body width"),
            ParamSpec::length("D", 0.16, "span"),
            ParamSpec::length("D1", 0.12, "body length"),
            ParamSpec::length("b", 0.03, "terminal width"),
            ParamSpec::length("b1", 0.02, "odd terminal width"),
            ParamSpec::length("L", 0.02, "terminal length"),
            ParamSpec::length("L1", 0.03, "odd terminal length"),
            ParamSpec::length("terminalThickness", 0.015, "terminal thickness"),
        ];
        PARAMS
    }

    fn derive(&self, resolved: &mut Resolved, params: &ParameterSet) {
        let cap = params.length("c", 0.015);
        resolved.set_dim("terminalThickness", params.terminal_thickness(cap));
    }

    fn create(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let a = resolved.dim("A");
        let width = resolved.dim("E");
        let d = resolved.dim("D");
        let d1 = resolved.dim("D1");
        let b = resolved.dim("b");
        let b1 = resolved.dim("b1");
        let l = resolved.dim("L");
        let l1 = resolved.dim("L1");
        let tt = resolved.dim("terminalThickness");

        let mut ops = ctx.ops();

        // The body floats a hair above the pads.
        ops.plane("BodyPlaneXy", BasePlane::Xy, Arg::lit(0.0001))?;
        let body_sketch = ops.sketch("BodySketch", SketchPlane::offset_from(BasePlane::Xy, 0.0001));
        sketch_ops::center_rectangle(ops.sketch_mut(body_sketch), Point2::new(0.0, 0.0), d1, width);
        let profile = ops.rect(Arg::expr(d1, "param_D1"), Arg::expr(width, "param_E"))?;
        let body = ops.extrude(
            "Body",
            profile,
            Arg::expr(a - 0.0001, "param_A - 0.0001"),
            "Body",
            Finish::body(),
        )?;
        ops.chamfer(
            "BodyChamfer",
            body.body,
            Arg::expr(a / 10.0, "param_A/10"),
            Arg::expr(a - tt, "param_A-param_terminalThickness"),
            Arg::expr(2.0 * (d1 + width), "(param_D1 + param_E) * 2"),
        )?;

        // Cathode band, inset past the chamfer so it stays on the flat top.
        let inset = a / 10.0;
        let band = (d1 / 5.0).min(1.0);
        ops.plane("PolarityBandPlaneXy", BasePlane::Xy, Arg::expr(a, "param_A"))?;
        let band_sketch =
            ops.sketch("PolarityBandSketch", SketchPlane::offset_from(BasePlane::Xy, a));
        sketch_ops::two_point_rectangle(
            ops.sketch_mut(band_sketch),
            Point2::new(-d1 / 2.0 + inset, -width / 2.0 + inset),
            Point2::new(-d1 / 2.0 + inset + band, width / 2.0 - inset),
        );
        let band_profile = ops.rect(
            Arg::expr(band, "param_D1/5"),
            Arg::expr(width - a / 5.0, "param_E-param_A/5"),
        )?;
        ops.extrude(
            "PolarityBand",
            band_profile,
            Arg::lit(BAND_RELIEF),
            "PolarityBand",
            Finish::body(),
        )?;

        // Flat pads under each end; widths usually differ, so no mirror.
        let pin_sketch = ops.sketch("PinSketch", SketchPlane::offset_from(BasePlane::Xz, 0.0));
        sketch_ops::center_rectangle(
            ops.sketch_mut(pin_sketch),
            Point2::new(-d / 2.0 + l / 2.0, -tt / 2.0),
            l,
            tt,
        );
        sketch_ops::center_rectangle(
            ops.sketch_mut(pin_sketch),
            Point2::new(d / 2.0 - l1 / 2.0, -tt / 2.0),
            l1,
            tt,
        );
        let pad = ops.rect(Arg::expr(l, "param_L"), Arg::expr(tt, "param_terminalThickness"))?;
        ops.extrude("Pin1", pad, Arg::expr(b, "param_b"), "Pin1", Finish::terminal())?;
        let odd_pad = ops.rect(Arg::expr(l1, "param_L1"), Arg::expr(tt, "param_terminalThickness"))?;
        ops.extrude("Pin2", odd_pad, Arg::expr(b1, "param_b1"), "Pin2", Finish::terminal())?;

        ops.commit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::generator::framework::drive;
    use crate::model::Design;

    fn run(design: &mut Design, builder: &dyn PackageBuilder, params: &ParameterSet) {
        let root = design.root();
        let config = Config::default();
        let mut ctx = BuildContext::new(design, root, &config).unwrap();
        drive(&mut ctx, builder, params).unwrap();
    }

    fn named_volume(design: &Design, name: &str) -> f64 {
        let component = design.component(design.root()).unwrap();
        component
            .history
            .active_bodies()
            .find(|(_, body)| body.name == name)
            .map(|(_, body)| body.volume)
            .unwrap()
    }

    #[test]
    fn sod_mirrors_one_formed_lead() {
        let mut design = Design::new("sod");
        run(&mut design, &Sod, &ParameterSet::new());

        let component = design.component(design.root()).unwrap();
        // body, band, lead and its mirror copy
        assert_eq!(component.history.active_body_count(), 4);

        let expected = 0.015 * ((0.375 - 0.27) / 2.0) * 0.065;
        assert!((named_volume(&design, "Pin1") - expected).abs() < 1e-12);
    }

    #[test]
    fn sod_span_change_reshapes_the_leads_in_place() {
        let mut design = Design::new("sod");
        run(&mut design, &Sod, &ParameterSet::new());
        let before = design.component(design.root()).unwrap().history.len();

        run(&mut design, &Sod, &ParameterSet::new().with("D", 0.45));
        let component = design.component(design.root()).unwrap();
        assert_eq!(component.history.len(), before);

        let expected = 0.015 * ((0.45 - 0.27) / 2.0) * 0.065;
        assert!((named_volume(&design, "Pin1") - expected).abs() < 1e-12);
    }

    #[test]
    fn sod_accepts_thinner_terminal_stock_only() {
        let mut design = Design::new("sod");
        run(
            &mut design,
            &Sod,
            &ParameterSet::new().with("terminalThickness", 0.01),
        );
        let thin = 0.01 * ((0.375 - 0.27) / 2.0) * 0.065;
        assert!((named_volume(&design, "Pin1") - thin).abs() < 1e-12);

        let mut design = Design::new("sod");
        run(
            &mut design,
            &Sod,
            &ParameterSet::new().with("terminalThickness", 0.03),
        );
        let capped = 0.015 * ((0.375 - 0.27) / 2.0) * 0.065;
        assert!((named_volume(&design, "Pin1") - capped).abs() < 1e-12);
    }

    #[test]
    fn sodfl_pads_carry_their_own_widths() {
        let mut design = Design::new("sodfl");
        run(&mut design, &Sodfl, &ParameterSet::new());

        let component = design.component(design.root()).unwrap();
        assert_eq!(component.history.active_body_count(), 4);

        assert!((named_volume(&design, "Pin1") - 0.02 * 0.015 * 0.03).abs() < 1e-12);
        assert!((named_volume(&design, "Pin2") - 0.03 * 0.015 * 0.02).abs() < 1e-12);
    }

    #[test]
    fn sodfl_band_shrinks_with_the_body_top() {
        let mut design = Design::new("sodfl");
        run(&mut design, &Sodfl, &ParameterSet::new());
        run(&mut design, &Sodfl, &ParameterSet::new().with("E", 0.1));

        let expected = (0.12 / 5.0) * (0.1 - 0.05 / 5.0) * 0.0002;
        assert!((named_volume(&design, "PolarityBand") - expected).abs() < 1e-12);
    }
}
