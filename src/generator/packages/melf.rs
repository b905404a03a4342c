//! MELF: a cylindrical body between two tinned end caps.
//!
//! The body is two concentric cylinders, a metallised core under a thin
//! sleeve. A polarized part swaps the sleeve for clear glass and reveals
//! the cathode band near one end; the band is always modelled and merely
//! suppressed otherwise, so toggling polarity never rebuilds.

use crate::error::GenerateResult;
use crate::generator::context::BuildContext;
use crate::generator::feature_ops::{recolour_indexed, refinish_indexed, Arg};
use crate::generator::framework::{FlagSpec, OptionalFeature, PackageBuilder, ParamSpec, Resolved};
use crate::generator::packages::PackageType;
use crate::generator::params::ParameterSet;
use crate::generator::sketch_ops;
use crate::model::material::{Appearance, Finish, Material, Rgb};
use crate::model::{BasePlane, FeatureKey, Point2, SketchPlane};

const INNER_BODY: FeatureKey = FeatureKey("inner_body");
const OUTER_BODY: FeatureKey = FeatureKey("outer_body");
const BAND: FeatureKey = FeatureKey("band");

/// Core and sleeve diameters as fractions of the terminal diameter.
const CORE_RATIO: f64 = 0.77;
const SLEEVE_RATIO: f64 = 0.8;

fn sleeve_finish(polarized: bool) -> Finish {
    if polarized {
        Finish::of(Material::Glass).with_appearance(Appearance::GlassClear)
    } else {
        Finish::of(Material::Ceramic)
    }
}

pub struct Melf;

impl PackageBuilder for Melf {
    fn package_type(&self) -> PackageType {
        PackageType::Melf
    }

    fn params(&self) -> &'static [ParamSpec] {
        const PARAMS: &[ParamSpec] = &[
            ParamSpec::length("E", 0.16, "body width"),
            ParamSpec::length("D", 0.37, "body length"),
            ParamSpec::length("L", 0.05, "band width"),
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

    fn create(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let e = resolved.dim("E");
        let d = resolved.dim("D");
        let l = resolved.dim("L");
        let rgb = resolved.rgb();
        let polarized = resolved.flag("isPolarized");

        let mut ops = ctx.ops();

        // Core and sleeve share an end plane inset by one cap.
        ops.plane("BodyPlaneYz", BasePlane::Yz, Arg::expr(d / 2.0 - l, "param_D/2 - param_L"))?;
        let body_sketch = ops.sketch("BodySketch", SketchPlane::offset_from(BasePlane::Yz, d / 2.0 - l));
        sketch_ops::center_circle(ops.sketch_mut(body_sketch), Point2::new(0.0, 0.0), e * CORE_RATIO);
        sketch_ops::center_circle(ops.sketch_mut(body_sketch), Point2::new(0.0, 0.0), e * SLEEVE_RATIO);

        let core = ops.circle(Arg::expr(e * CORE_RATIO / 2.0, "param_E * 0.77 / 2"))?;
        let inner = ops.extrude(
            "InnerBody",
            core,
            Arg::expr(-(d - 2.0 * l), "-(param_D - 2 * param_L)"),
            "InnerBody",
            Finish::of(Material::Ceramic)
                .with_appearance(Appearance::AluminiumPolished)
                .with_rgb(rgb),
        )?;
        let sleeve = ops.ring(
            Arg::expr(e * SLEEVE_RATIO / 2.0, "param_E * 0.8 / 2"),
            Arg::expr(e * CORE_RATIO / 2.0, "param_E * 0.77 / 2"),
        )?;
        let outer = ops.extrude(
            "OuterBody",
            sleeve,
            Arg::expr(-(d - 2.0 * l), "-(param_D - 2 * param_L)"),
            "OuterBody",
            sleeve_finish(polarized),
        )?;

        ops.plane("TerminalPlaneYz", BasePlane::Yz, Arg::expr(d / 2.0, "param_D/2"))?;
        let terminal_sketch =
            ops.sketch("TerminalSketch", SketchPlane::offset_from(BasePlane::Yz, d / 2.0));
        sketch_ops::center_circle(ops.sketch_mut(terminal_sketch), Point2::new(0.0, 0.0), e);
        let cap = ops.circle(Arg::expr(e / 2.0, "param_E / 2"))?;
        let terminal = ops.extrude(
            "Terminal",
            cap,
            Arg::expr(-l, "-param_L"),
            "Terminal",
            Finish::terminal(),
        )?;
        ops.mirror("TerminalMirror", &[terminal.feature], BasePlane::Yz);

        // Cathode band, a thin sleeve-on-sleeve near the negative end.
        let band_offset = -d / 2.0 + l + (d - 2.0 * l) * 0.1;
        ops.plane(
            "BandPlaneYz",
            BasePlane::Yz,
            Arg::expr(band_offset, "-param_D/2 + param_L + (param_D - 2 * param_L) * 0.1"),
        )?;
        let band_sketch = ops.sketch("BandSketch", SketchPlane::offset_from(BasePlane::Yz, band_offset));
        sketch_ops::center_circle(
            ops.sketch_mut(band_sketch),
            Point2::new(0.0, 0.0),
            e * CORE_RATIO + 0.0003,
        );
        let band_profile = ops.circle(Arg::expr(
            (e * CORE_RATIO + 0.0003) / 2.0,
            "(param_E * 0.77 + 0.0003) / 2",
        ))?;
        let band = ops.extrude(
            "Band",
            band_profile,
            Arg::expr((d - 2.0 * l) * 0.2, "(param_D - 2 * param_L) * 0.2"),
            "Band",
            Finish::of(Material::PbtPlastic).with_rgb(Rgb::new(10, 10, 10)),
        )?;

        ops.index(INNER_BODY, inner.feature);
        ops.index(OUTER_BODY, outer.feature);
        ops.index(BAND, band.feature);
        ops.commit()
    }

    fn update(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let component = ctx.component();
        refinish_indexed(component, OUTER_BODY, sleeve_finish(resolved.flag("isPolarized")))?;
        recolour_indexed(component, INNER_BODY, resolved.rgb())
    }
}
