//! Molded body: a two-terminal chip, tantalum-capacitor style.
//!
//! Tin wrap-around terminals: a foot under each end of the body and a
//! riser hugging the end face up to half height. The top edge is
//! chamfered all round and a polarity stripe can sit near the anode
//! end of the lid.

use crate::error::GenerateResult;
use crate::generator::context::BuildContext;
use crate::generator::feature_ops::Arg;
use crate::generator::framework::{
    FlagSpec, OptionalFeature, PackageBuilder, ParamSpec, Resolved,
};
use crate::generator::packages::PackageType;
use crate::generator::params::ParameterSet;
use crate::generator::sketch_ops;
use crate::model::material::{Appearance, Finish};
use crate::model::{BasePlane, FeatureKey, Point2, SketchPlane};

const BAND: FeatureKey = FeatureKey("band");

/// Terminal stock cap; thinner values are honoured, thicker clamped.
const TERMINAL_THICKNESS: f64 = 0.015;
/// Printed band thickness; a decal, so it never scales.
const BAND_RELIEF: f64 = 0.0002;
const BAND_WIDTH: f64 = 0.15;

pub struct MoldedBody;

impl PackageBuilder for MoldedBody {
    fn package_type(&self) -> PackageType {
        PackageType::MoldedBody
    }

    fn params(&self) -> &'static [ParamSpec] {
        const PARAMS: &[ParamSpec] = &[
            ParamSpec::length("A", 0.43, "body height"),
            ParamSpec::length("b", 0.25, "normal terminal width"),
            ParamSpec::length("b1", 0.25, "odd terminal width"),
            ParamSpec::length("D", 0.76, "body length"),
            ParamSpec::length("E", 0.46, "body width"),
            ParamSpec::length("L", 0.16, "normal terminal length"),
            ParamSpec::length("L1", 0.16, "odd terminal length"),
        ];
        PARAMS
    }

    fn flags(&self) -> &'static [FlagSpec] {
        const FLAGS: &[FlagSpec] = &[FlagSpec::detail("isPolarized")];
        FLAGS
    }

    fn optional_features(&self) -> &'static [OptionalFeature] {
        const OPTIONAL: &[OptionalFeature] = &[OptionalFeature::when_set("isPolarized", BAND)];
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
        let b = resolved.dim("b");
        let b1 = resolved.dim("b1");
        let d = resolved.dim("D");
        let e = resolved.dim("E");
        let l = resolved.dim("L");
        let l1 = resolved.dim("L1");
        let tt = resolved.dim("terminalThickness");
        let s = 0.05 * a;

        let mut ops = ctx.ops();

        ops.plane("BodyOffset", BasePlane::Xy, Arg::lit(tt))?;
        let body_sketch = ops.sketch("BodySketch", SketchPlane::offset_from(BasePlane::Xy, tt));
        sketch_ops::center_rectangle(ops.sketch_mut(body_sketch), Point2::new(0.0, 0.0), d, e);
        let body_profile = ops.rect(Arg::expr(d, "param_D"), Arg::expr(e, "param_E"))?;
        let body = ops.extrude(
            "Body",
            body_profile,
            Arg::expr(a - tt, "param_A - 0.015"),
            "Body",
            Finish::body(),
        )?;
        ops.chamfer(
            "BodyChamfer",
            body.body,
            Arg::expr(a / 2.0 - TERMINAL_THICKNESS, "param_A/2 - 0.015"),
            Arg::expr(s, "0.05 * param_A"),
            Arg::expr(2.0 * (d + e), "(param_D + param_E) * 2"),
        )?;

        // Odd terminal wraps the +X end: a foot reaching in under the
        // body, a riser up the end face.
        let odd_sketch = ops.sketch("OddPinSketch", SketchPlane::offset_from(BasePlane::Xy, 0.0));
        let sk = ops.sketch_mut(odd_sketch);
        sketch_ops::center_rectangle(
            sk,
            Point2::new(d / 2.0 - l1 / 2.0 + tt, 0.0),
            l1,
            b1,
        );
        sk.add_line(Point2::new(d / 2.0, b1 / 2.0), Point2::new(d / 2.0, -b1 / 2.0));
        let odd_foot_profile = ops.rect(
            Arg::expr(l1 - tt, "param_L1 - 0.015"),
            Arg::expr(b1, "param_b1"),
        )?;
        ops.extrude(
            "OddTerminalHori",
            odd_foot_profile,
            Arg::lit(tt),
            "OddTerminalHori",
            Finish::terminal(),
        )?;
        let odd_riser_profile = ops.rect(Arg::lit(tt), Arg::expr(b1, "param_b1"))?;
        ops.extrude(
            "OddTerminalVert",
            odd_riser_profile,
            Arg::expr(a / 2.0 + tt, "param_A/2 + 0.015"),
            "OddTerminalVert",
            Finish::terminal(),
        )?;

        let even_sketch = ops.sketch("EvenPinSketch", SketchPlane::offset_from(BasePlane::Xy, 0.0));
        let sk = ops.sketch_mut(even_sketch);
        sketch_ops::center_rectangle(
            sk,
            Point2::new(-d / 2.0 + l / 2.0 - tt, 0.0),
            l,
            b,
        );
        sk.add_line(Point2::new(-d / 2.0, b / 2.0), Point2::new(-d / 2.0, -b / 2.0));
        let even_foot_profile = ops.rect(
            Arg::expr(l - tt, "param_L - 0.015"),
            Arg::expr(b, "param_b"),
        )?;
        ops.extrude(
            "EvenTerminalHori",
            even_foot_profile,
            Arg::lit(tt),
            "EvenTerminalHori",
            Finish::terminal(),
        )?;
        let even_riser_profile = ops.rect(Arg::lit(tt), Arg::expr(b, "param_b"))?;
        ops.extrude(
            "EvenTerminalVert",
            even_riser_profile,
            Arg::expr(a / 2.0 + tt, "param_A/2 + 0.015"),
            "EvenTerminalVert",
            Finish::terminal(),
        )?;

        // Polarity stripe on the lid near the anode end.
        ops.plane("BandOffset", BasePlane::Xy, Arg::expr(a, "param_A"))?;
        let band_sketch = ops.sketch("BandSketch", SketchPlane::offset_from(BasePlane::Xy, a));
        let sk = ops.sketch_mut(band_sketch);
        sketch_ops::center_rectangle(
            sk,
            Point2::new(0.0, 0.0),
            d - 0.1 * a,
            e - 0.1 * a,
        );
        sk.add_line(
            Point2::new(-d / 2.0 + s + BAND_WIDTH, e / 2.0 - s),
            Point2::new(-d / 2.0 + s + BAND_WIDTH, -e / 2.0 + s),
        );
        let band_profile = ops.rect(
            Arg::lit(BAND_WIDTH),
            Arg::expr(e - 0.1 * a, "param_E - 0.1 * param_A"),
        )?;
        let band = ops.extrude(
            "Band",
            band_profile,
            Arg::lit(BAND_RELIEF),
            "Band",
            Finish::body().with_appearance(Appearance::AluminiumPolished),
        )?;

        ops.index(BAND, band.feature);
        ops.commit()
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
        drive(&mut ctx, &MoldedBody, params).unwrap();
    }

    fn named_volume(design: &Design, name: &str) -> f64 {
        let component = design.component(design.root()).unwrap();
        component
            .history
            .active_bodies()
            .find(|(_, body)| body.name == name)
            .unwrap()
            .1
            .volume
    }

    #[test]
    fn wraparound_terminals_on_both_ends() {
        let mut design = Design::new("molded");
        run(&mut design, &ParameterSet::new());

        let component = design.component(design.root()).unwrap();
        // body + foot and riser per end, band suppressed
        assert_eq!(component.history.active_body_count(), 5);

        let foot = (0.16 - 0.015) * 0.25 * 0.015;
        assert!((named_volume(&design, "OddTerminalHori") - foot).abs() < 1e-12);
        let riser = 0.015 * 0.25 * (0.43 / 2.0 + 0.015);
        assert!((named_volume(&design, "EvenTerminalVert") - riser).abs() < 1e-12);
    }

    #[test]
    fn chamfer_rings_the_lid() {
        let mut design = Design::new("molded");
        run(&mut design, &ParameterSet::new());

        let slab = 0.76 * 0.46 * (0.43 - 0.015);
        let chamfer = (0.43 / 2.0 - 0.015) * (0.05 * 0.43) / 2.0 * 2.0 * (0.76 + 0.46);
        assert!((named_volume(&design, "Body") - (slab - chamfer)).abs() < 1e-12);
    }

    #[test]
    fn polarity_stripe_follows_the_flag() {
        let mut design = Design::new("molded");
        run(&mut design, &ParameterSet::new().with("isPolarized", true));

        let component = design.component(design.root()).unwrap();
        assert_eq!(component.history.active_body_count(), 6);
        let band = BAND_WIDTH * (0.46 - 0.1 * 0.43) * BAND_RELIEF;
        assert!((named_volume(&design, "Band") - band).abs() < 1e-12);

        run(&mut design, &ParameterSet::new().with("isPolarized", false));
        let component = design.component(design.root()).unwrap();
        assert_eq!(component.history.active_body_count(), 5);
    }

    #[test]
    fn terminal_length_update_reshapes_the_feet() {
        let mut design = Design::new("molded");
        run(&mut design, &ParameterSet::new());
        let before = design.component(design.root()).unwrap().history.len();

        run(&mut design, &ParameterSet::new().with("L", 0.2));
        let component = design.component(design.root()).unwrap();
        assert_eq!(component.history.len(), before);

        let foot = (0.2 - 0.015) * 0.25 * 0.015;
        assert!((named_volume(&design, "EvenTerminalHori") - foot).abs() < 1e-12);
    }
}
