//! SOIC and SOP gull-wing dual packages.
//!
//! The canonical dual-row surface mount family: a body raised on its offset
//! plane with top and bottom face chamfers, one gull-wing lead mirrored
//! across the row axis and patterned down both rows, the pin-1 mark cut and
//! an always-present thermal pad toggled by suppression.
//!
//! Update calls patch the two literals an expression cannot carry, the lead
//! cross-section area and the pin-1 mark radius; everything else follows the
//! driven dimensions.

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
const PIN_ONE_MARK: FeatureKey = FeatureKey("pin_one_mark");
const THERMAL_PAD: FeatureKey = FeatureKey("thermal_pad");

/// Lead frame metal thickness; fixed for the family, registered so the
/// chamfer expressions can reference it.
const TERMINAL_THICKNESS: f64 = 0.02;

pub struct Soic;

impl PackageBuilder for Soic {
    fn package_type(&self) -> PackageType {
        PackageType::Soic
    }

    fn params(&self) -> &'static [ParamSpec] {
        const PARAMS: &[ParamSpec] = &[
            ParamSpec::length("A", 0.265, "body height"),
            ParamSpec::length("A1", 0.025, "body offset"),
            ParamSpec::length("E", 1.065, "span"),
            ParamSpec::length("E1", 0.76, "body width"),
            ParamSpec::length("D", 1.3, "body length"),
            ParamSpec::length("e", 0.127, "pitch"),
            ParamSpec::length("b", 0.051, "terminal length"),
            ParamSpec::length("L", 0.0835, "terminal width"),
            ParamSpec::length("D2", 0.861, "thermal pad length"),
            ParamSpec::length("E2", 0.48, "thermal pad width"),
            ParamSpec::length("terminalThickness", TERMINAL_THICKNESS, "terminal thickness"),
            ParamSpec::count("DPins", 20, "pins"),
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
        // The lead frame thickness is not caller-adjustable.
        resolved.set_dim("terminalThickness", TERMINAL_THICKNESS);
    }

    fn create(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let a = resolved.dim("A");
        let a1 = resolved.dim("A1");
        let span = resolved.dim("E");
        let e1 = resolved.dim("E1");
        let d = resolved.dim("D");
        let pitch = resolved.dim("e");
        let b = resolved.dim("b");
        let l = resolved.dim("L");
        let d2 = resolved.dim("D2");
        let e2 = resolved.dim("E2");
        let tt = resolved.dim("terminalThickness");
        let pins = resolved.count("DPins");
        let thermal = resolved.flag("thermal");

        let mut ops = ctx.ops();

        // Body on its offset plane, chamfered top and bottom.
        ops.plane("BodyPlaneXy", BasePlane::Xy, Arg::expr(a1, "param_A1"))?;
        let body_sketch = ops.sketch("BodySketch", SketchPlane::offset_from(BasePlane::Xy, a1));
        sketch_ops::center_rectangle(ops.sketch_mut(body_sketch), Point2::new(0.0, 0.0), d, e1);
        let body_profile = ops.rect(Arg::expr(d, "param_D"), Arg::expr(e1, "param_E1"))?;
        let body = ops.extrude(
            "Body",
            body_profile,
            Arg::expr(a - a1, "param_A - param_A1"),
            "Body",
            Finish::body(),
        )?;

        let slab = a - a1 - tt;
        let perimeter = Arg::expr(2.0 * (d + e1), "(param_D + param_E1) * 2");
        ops.chamfer(
            "BodyChamferTop",
            body.body,
            Arg::expr(
                slab.abs() / 2.0,
                "abs((param_A - param_A1 - param_terminalThickness)/2)",
            ),
            Arg::expr(
                (0.2 * slab).abs(),
                "abs(0.2*(param_A - param_A1 - param_terminalThickness))",
            ),
            perimeter,
        )?;
        ops.chamfer(
            "BodyChamferBottom",
            body.body,
            Arg::expr(
                (0.2 * slab).abs(),
                "abs(0.2*(param_A - param_A1 - param_terminalThickness))",
            ),
            Arg::expr(
                slab.abs() / 2.0,
                "abs((param_A - param_A1 - param_terminalThickness)/2)",
            ),
            perimeter,
        )?;

        // One gull-wing lead at the far end of the front row.
        let row_offset = pitch / 2.0 * (f64::from(pins) / 2.0 - 1.0);
        ops.plane(
            "FrontPinPlaneXz",
            BasePlane::Xz,
            Arg::expr(row_offset, "param_e/2 * (param_DPins/2 - 1)"),
        )?;
        let pin_sketch = ops.sketch(
            "FrontPinSketch",
            SketchPlane::offset_from(BasePlane::Xz, row_offset),
        );
        let area = sketch_ops::gullwing_outline(
            ops.sketch_mut(pin_sketch),
            Point2::new(e1 / 2.0, 0.0),
            1.0,
            (span - e1) / 2.0,
            (a + a1) / 2.0 + tt / 2.0,
            tt,
            l,
        );
        let profile = ops.area(area);
        let front_pin = ops.extrude(
            "FrontPin",
            profile,
            Arg::expr(b, "param_b"),
            "FrontPin",
            Finish::of(Material::CopperAlloy).with_appearance(Appearance::NickelPolished),
        )?;
        ops.mirror_and_pattern(
            "FrontPin",
            front_pin.feature,
            BasePlane::Yz,
            pins / 2,
            Arg::expr(-pitch, "-param_e"),
        )?;

        let mark = ops.pin_one_mark(
            body.body,
            Arg::expr(a, "param_A"),
            Arg::expr(0.1 * a, "param_A/10"),
            d,
            e1,
        )?;

        // Kept in the history whether or not the flag is set.
        let pad_thickness = if thermal { tt } else { a1 };
        let pad = ops.thermal_pad(
            Arg::expr(e2, "param_E2"),
            Arg::expr(d2, "param_D2"),
            Arg::lit(pad_thickness),
            Arg::lit(0.0),
        )?;

        ops.index(FRONT_PIN, front_pin.feature);
        ops.index(PIN_ONE_MARK, mark);
        ops.index(THERMAL_PAD, pad.feature);
        ops.commit()
    }

    fn update(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let tt = resolved.dim("terminalThickness");
        let reach = (resolved.dim("E") - resolved.dim("E1")) / 2.0;
        let component = ctx.component();
        set_indexed_area(component, FRONT_PIN, tt * reach)?;
        set_indexed_radius(component, PIN_ONE_MARK, resolved.dim("E1") / 20.0)
    }
}
