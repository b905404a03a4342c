//! Electrolytic capacitors: the surface-mount V-chip and the radial can.
//!
//! Both are drawn-aluminium cans with a crimp groove rolled near the
//! seating end, modelled as a rectangle revolve minus a half-disc cut at
//! the groove. The V-chip sits on a moulded base plate whose two clipped
//! corners mark the negative terminal; the radial part stands on wire
//! leads and reveals a grey stripe with three dashes when polarized.

use std::f64::consts::{FRAC_PI_2, PI};

use crate::error::GenerateResult;
use crate::generator::context::BuildContext;
use crate::generator::feature_ops::{recolour_indexed, set_indexed_area, Arg};
use crate::generator::framework::{FlagSpec, OptionalFeature, PackageBuilder, ParamSpec, Resolved};
use crate::generator::packages::PackageType;
use crate::generator::sketch_ops;
use crate::model::material::{Appearance, Finish, Material, Rgb};
use crate::model::{BasePlane, FeatureKey, Point2, SketchPlane};

const BASE: FeatureKey = FeatureKey("base");
const CAN: FeatureKey = FeatureKey("can");
const CRIMP: FeatureKey = FeatureKey("crimp");
const MARKER: FeatureKey = FeatureKey("marker");
const BAND: FeatureKey = FeatureKey("band");
const BAND_MARKER: FeatureKey = FeatureKey("band_marker");
const BAND_MARKER_PATTERN: FeatureKey = FeatureKey("band_marker_pattern");

/// Stripe sleeve standing off the can wall.
const BAND_OFFSET: f64 = 0.002;

fn lead_finish() -> Finish {
    Finish::of(Material::CopperAlloy).with_appearance(Appearance::NickelPolished)
}

/// Crimp groove cut: half-disc area and its revolve centroid for a can
/// of diameter `d`. The groove diameter is a tenth of the can's and its
/// flat side lies on the wall, so the bulge centroid sits `4r/3π`
/// inside it.
fn crimp_cut(d: f64) -> (f64, f64) {
    let r = d / 20.0;
    (FRAC_PI_2 * r * r, d / 2.0 - d / (15.0 * PI))
}

/// Base plate of the V-chip: a square with the two corners on the
/// negative side clipped at forty-five degrees.
fn base_points(d1: f64) -> [Point2; 6] {
    [
        Point2::new(-d1 / 4.0, -d1 / 2.0),
        Point2::new(d1 / 2.0, -d1 / 2.0),
        Point2::new(d1 / 2.0, d1 / 2.0),
        Point2::new(-d1 / 4.0, d1 / 2.0),
        Point2::new(-d1 / 2.0, d1 / 4.0),
        Point2::new(-d1 / 2.0, -d1 / 4.0),
    ]
}

fn base_area(d1: f64) -> f64 {
    d1 * d1 * 15.0 / 16.0
}

/// Polarity segment on the V-chip top: disc radius and chord offset.
fn marker_segment(d1: f64) -> (f64, f64) {
    ((d1 - 0.6) / 2.0, (d1 / 2.0 - 0.3) * 0.55)
}

pub struct Ecap;

impl PackageBuilder for Ecap {
    fn package_type(&self) -> PackageType {
        PackageType::Ecap
    }

    fn params(&self) -> &'static [ParamSpec] {
        const PARAMS: &[ParamSpec] = &[
            ParamSpec::length("A", 1.05, "body height"),
            ParamSpec::length("D1", 1.05, "body length"),
            ParamSpec::length("b", 0.11, "terminal width"),
            ParamSpec::length("D2", 0.48, "terminal gap"),
            ParamSpec::length("L", 0.37, "terminal length"),
        ];
        PARAMS
    }

    fn create(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let a = resolved.dim("A");
        let d1 = resolved.dim("D1");
        let b = resolved.dim("b");
        let d2 = resolved.dim("D2");
        let l = resolved.dim("L");

        let mut ops = ctx.ops();

        // Moulded base plate, floated a lead thickness over the board.
        ops.plane("BasePlaneXy", BasePlane::Xy, Arg::expr(b / 8.0, "param_b/8"))?;
        let base_sketch = ops.sketch("BaseSketch", SketchPlane::offset_from(BasePlane::Xy, b / 8.0));
        sketch_ops::polygon(ops.sketch_mut(base_sketch), &base_points(d1));
        let base_profile = ops.area(base_area(d1));
        let base = ops.extrude(
            "LowerBody",
            base_profile,
            Arg::expr(a / 8.0, "param_A/8"),
            "LowerBody",
            Finish::of(Material::Ceramic),
        )?;

        // Formed terminals folded under the base.
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
            Arg::expr(b / 4.0, "param_b/4"),
            "Terminal",
            lead_finish(),
        )?;
        ops.mirror("TerminalMirror", &[land.feature], BasePlane::Yz);

        // The can is a rectangle revolve with the crimp groove cut out.
        let body_sketch = ops.sketch("BodySketch", SketchPlane::offset_from(BasePlane::Xz, 0.0));
        let can_height = a - (b / 8.0 + a / 8.0);
        sketch_ops::center_rectangle(
            ops.sketch_mut(body_sketch),
            Point2::new(d1 / 4.0, b / 8.0 + a / 8.0 + can_height / 2.0),
            d1 / 2.0,
            can_height,
        );
        sketch_ops::center_circle(
            ops.sketch_mut(body_sketch),
            Point2::new(d1 / 2.0, a / 4.0 + b / 8.0),
            d1 / 10.0,
        );
        let can_profile = ops.rect(
            Arg::expr(d1 / 2.0, "param_D1/2"),
            Arg::expr(can_height, "param_A - (param_b/8 + param_A/8)"),
        )?;
        let can = ops.revolve(
            "UpperBody",
            can_profile,
            Arg::expr(d1 / 4.0, "param_D1/4"),
            360.0,
            "UpperBody",
            Finish::of(Material::Aluminium),
        )?;
        let (crimp_area, crimp_radius) = crimp_cut(d1);
        let crimp = ops.revolve_cut(
            "Crimp",
            ops.area(crimp_area),
            Arg::expr(
                crimp_radius,
                "param_D1/2 - param_D1/(15 * 3.141592653589793)",
            ),
            360.0,
            can.body,
        )?;
        ops.fillet(
            "BottomFillet",
            can.body,
            Arg::lit(0.03),
            Arg::expr(PI * d1, "3.141592653589793 * param_D1"),
        )?;

        // Negative stripe on the lid.
        ops.plane("MarkerPlaneXy", BasePlane::Xy, Arg::expr(a, "param_A"))?;
        let marker_sketch =
            ops.sketch("MarkerSketch", SketchPlane::offset_from(BasePlane::Xy, a));
        let (radius, chord) = marker_segment(d1);
        let segment = sketch_ops::circular_segment(
            ops.sketch_mut(marker_sketch),
            Point2::new(0.0, 0.0),
            radius,
            chord,
        );
        let marker = ops.extrude(
            "Marker",
            ops.area(segment),
            Arg::lit(0.001),
            "Marker",
            Finish::body(),
        )?;

        ops.index(BASE, base.feature);
        ops.index(CRIMP, crimp);
        ops.index(MARKER, marker.feature);
        ops.commit()
    }

    fn update(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let d1 = resolved.dim("D1");
        let (crimp_area, _) = crimp_cut(d1);
        let (radius, chord) = marker_segment(d1);
        let component = ctx.component();
        set_indexed_area(component, BASE, base_area(d1))?;
        set_indexed_area(component, CRIMP, crimp_area)?;
        set_indexed_area(component, MARKER, sketch_ops::segment_area(radius, chord))
    }
}

pub struct RadialEcap;

impl RadialEcap {
    /// Stripe skin between the can wall and its offset, following the
    /// crimp groove on both sides.
    fn band_area(d: f64, a: f64) -> f64 {
        let r1 = d / 20.0;
        let r2 = d / 20.0 - 0.001;
        BAND_OFFSET.mul_add(a, FRAC_PI_2 * (r1 * r1 - r2 * r2))
    }

    /// One polarity dash: a hair-thin rectangle on the stripe.
    fn dash_area(d: f64, a: f64) -> f64 {
        0.0001 * (0.9f64.mul_add(a, -(3.0 * d / 20.0)) * 0.8 / 3.0)
    }
}

impl PackageBuilder for RadialEcap {
    fn package_type(&self) -> PackageType {
        PackageType::RadialEcap
    }

    fn params(&self) -> &'static [ParamSpec] {
        const PARAMS: &[ParamSpec] = &[
            ParamSpec::length("D", 1.0, "body length"),
            ParamSpec::length("A", 1.1, "body height"),
            ParamSpec::length("b", 0.065, "terminal width"),
            ParamSpec::length("e", 0.508, "pitch"),
        ];
        PARAMS
    }

    fn flags(&self) -> &'static [FlagSpec] {
        const FLAGS: &[FlagSpec] = &[FlagSpec::detail("isPolarized")];
        FLAGS
    }

    fn default_rgb(&self) -> Rgb {
        Rgb::new(24, 37, 248)
    }

    fn optional_features(&self) -> &'static [OptionalFeature] {
        const OPTIONAL: &[OptionalFeature] = &[
            OptionalFeature::when_set("isPolarized", BAND),
            OptionalFeature::when_set("isPolarized", BAND_MARKER),
            OptionalFeature::when_set("isPolarized", BAND_MARKER_PATTERN),
        ];
        OPTIONAL
    }

    fn uses_board_thickness(&self) -> bool {
        true
    }

    fn create(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let d = resolved.dim("D");
        let a = resolved.dim("A");
        let b = resolved.dim("b");
        let pitch = resolved.dim("e");
        let rgb = resolved.rgb();
        let board = ctx.board_thickness;

        let mut ops = ctx.ops();

        // Can wall with the crimp groove, plus the stripe skin offset
        // from it, share one sketch.
        let body_sketch = ops.sketch("BodySketch", SketchPlane::offset_from(BasePlane::Xz, 0.0));
        sketch_ops::center_rectangle(
            ops.sketch_mut(body_sketch),
            Point2::new(d / 4.0, a / 2.0),
            d / 2.0,
            a,
        );
        sketch_ops::center_circle(
            ops.sketch_mut(body_sketch),
            Point2::new(d / 2.0, d / 10.0 + a / 10.0),
            d / 10.0,
        );
        let can_profile = ops.rect(Arg::expr(d / 2.0, "param_D/2"), Arg::expr(a, "param_A"))?;
        let can = ops.revolve(
            "RadialBody",
            can_profile,
            Arg::expr(d / 4.0, "param_D/4"),
            360.0,
            "RadialBody",
            Finish::of(Material::Aluminium).with_rgb(rgb),
        )?;
        let (crimp_area, crimp_radius) = crimp_cut(d);
        let crimp = ops.revolve_cut(
            "Crimp",
            ops.area(crimp_area),
            Arg::expr(crimp_radius, "param_D/2 - param_D/(15 * 3.141592653589793)"),
            360.0,
            can.body,
        )?;

        let band = ops.revolve(
            "Band",
            ops.area(Self::band_area(d, a)),
            Arg::expr(d / 2.0 + 0.001, "param_D/2 + 0.001"),
            18.0,
            "Band",
            Finish::of(Material::Aluminium).with_rgb(Rgb::new(190, 190, 190)),
        )?;

        // Recessed lid inside the rolled top lip.
        ops.plane("TopGapPlaneXy", BasePlane::Xy, Arg::expr(a, "param_A"))?;
        let gap_sketch = ops.sketch("TopGapSketch", SketchPlane::offset_from(BasePlane::Xy, a));
        sketch_ops::center_circle(
            ops.sketch_mut(gap_sketch),
            Point2::new(0.0, 0.0),
            11.0 * d / 15.0,
        );
        let gap_profile = ops.circle(Arg::expr(11.0 * d / 30.0, "(param_D - 8 * param_D/30)/2"))?;
        ops.extrude_cut("TopGap", gap_profile, Arg::lit(-0.01), can.body)?;

        // Wire leads through the board.
        let lead_sketch = ops.sketch("TerminalSketch", SketchPlane::offset_from(BasePlane::Xy, 0.0));
        sketch_ops::center_circle(ops.sketch_mut(lead_sketch), Point2::new(pitch / 2.0, 0.0), b);
        let lead_profile = ops.circle(Arg::expr(b / 2.0, "param_b/2"))?;
        let lead = ops.extrude(
            "Terminal",
            lead_profile,
            Arg::expr(
                -1.2f64.mul_add(board, 0.0002),
                "-1.2 * board_thickness - 0.0002",
            ),
            "Terminal",
            lead_finish(),
        )?;
        ops.mirror("TerminalMirror", &[lead.feature], BasePlane::Yz);

        // Three minus dashes spread down the stripe.
        let marker_sketch =
            ops.sketch("MarkerSketch", SketchPlane::offset_from(BasePlane::Xz, 0.0));
        let dash_height = 0.9f64.mul_add(a, -(3.0 * d / 20.0)) * 0.8 / 3.0;
        sketch_ops::center_rectangle(
            ops.sketch_mut(marker_sketch),
            Point2::new(
                d / 2.0 + 0.0021,
                a - a / 10.0 - 3.0 * d / 20.0 - d / 30.0 - dash_height / 2.0,
            ),
            0.0001,
            dash_height,
        );
        let marker = ops.revolve(
            "Marker",
            ops.area(Self::dash_area(d, a)),
            Arg::expr(d / 2.0 + 0.0021, "param_D/2 + 0.0021"),
            6.0,
            "Marker",
            Finish::of(Material::Aluminium),
        )?;
        let spread = a - d / 15.0 - 3.0 * d / 20.0 - a / 10.0 - dash_height;
        let pattern = ops.pattern(
            "MarkerPattern",
            &[marker.feature],
            3,
            Arg::expr(
                spread / 2.0,
                "(param_A - param_D/15 - 3/20 * param_D - param_A/10 - 0.8/3 * (0.9 * param_A - 3/20 * param_D))/2",
            ),
            1,
            Arg::lit(0.0),
        )?;

        ops.index(CAN, can.feature);
        ops.index(CRIMP, crimp);
        ops.index(BAND, band.feature);
        ops.index(BAND_MARKER, marker.feature);
        ops.index(BAND_MARKER_PATTERN, pattern);
        ops.commit()
    }

    fn update(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let d = resolved.dim("D");
        let a = resolved.dim("A");
        let rgb = resolved.rgb();
        let (crimp_area, _) = crimp_cut(d);
        let component = ctx.component();
        set_indexed_area(component, CRIMP, crimp_area)?;
        set_indexed_area(component, BAND, Self::band_area(d, a))?;
        set_indexed_area(component, BAND_MARKER, Self::dash_area(d, a))?;
        recolour_indexed(component, CAN, rgb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::generator::framework::drive;
    use crate::generator::params::ParameterSet;
    use crate::model::{Component, Design};

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

    #[test]
    fn base_plate_loses_its_negative_corners() {
        let mut design = Design::new("ecap");
        run(&mut design, &Ecap, &ParameterSet::new());

        let component = design.component(design.root()).unwrap();
        // base, two terminals, can, marker
        assert_eq!(component.history.active_body_count(), 5);

        let expected = 1.05 * 1.05 * 15.0 / 16.0 * (1.05 / 8.0);
        assert!((body_volume(component, "LowerBody") - expected).abs() < 1e-12);
    }

    #[test]
    fn can_revolve_carries_crimp_and_rim_fillet() {
        let mut design = Design::new("ecap");
        run(&mut design, &Ecap, &ParameterSet::new());

        let component = design.component(design.root()).unwrap();
        let height: f64 = 1.05 - (0.11 / 8.0 + 1.05 / 8.0);
        let shell = 2.0 * PI * (1.05 / 4.0) * (1.05 / 2.0 * height);
        let crimp_r: f64 = 1.05 / 20.0;
        let crimp =
            2.0 * PI * (1.05 / 2.0 - 1.05 / (15.0 * PI)) * (FRAC_PI_2 * crimp_r * crimp_r);
        let fillet = (1.0 - PI / 4.0) * 0.03 * 0.03 * (PI * 1.05);
        let expected = shell - crimp - fillet;
        assert!((body_volume(component, "UpperBody") - expected).abs() < 1e-12);
    }

    #[test]
    fn length_update_redraws_the_polarity_segment() {
        let mut design = Design::new("ecap");
        run(&mut design, &Ecap, &ParameterSet::new());
        let before = design.component(design.root()).unwrap().history.len();

        run(&mut design, &Ecap, &ParameterSet::new().with("D1", 1.2));
        let component = design.component(design.root()).unwrap();
        assert_eq!(component.history.len(), before);

        let expected = sketch_ops::segment_area(0.3, 0.165) * 0.001;
        assert!((body_volume(component, "Marker") - expected).abs() < 1e-12);
        let base = 1.2 * 1.2 * 15.0 / 16.0 * (1.05 / 8.0);
        assert!((body_volume(component, "LowerBody") - base).abs() < 1e-12);
    }

    #[test]
    fn radial_can_minus_crimp_and_top_gap() {
        let mut design = Design::new("radial ecap");
        run(&mut design, &RadialEcap, &ParameterSet::new());

        assert!(design.parameters.contains("board_thickness"));
        let component = design.component(design.root()).unwrap();
        // can and two leads; polarity details stay suppressed
        assert_eq!(component.history.active_body_count(), 3);

        let shell = 2.0 * PI * 0.25 * (0.5 * 1.1);
        let crimp_r: f64 = 1.0 / 20.0;
        let crimp = 2.0 * PI * (0.5 - 1.0 / (15.0 * PI)) * (FRAC_PI_2 * crimp_r * crimp_r);
        let gap = PI * (11.0 / 30.0) * (11.0 / 30.0) * 0.01;
        let expected = shell - crimp - gap;
        assert!((body_volume(component, "RadialBody") - expected).abs() < 1e-12);

        let lead = PI * (0.065 / 2.0) * (0.065 / 2.0) * (1.2 * 0.16 + 0.0002);
        assert!((body_volume(component, "Terminal") - lead).abs() < 1e-12);
    }

    #[test]
    fn polarity_reveals_stripe_and_dashes() {
        let mut design = Design::new("radial ecap");
        run(&mut design, &RadialEcap, &ParameterSet::new());
        let before = design.component(design.root()).unwrap().history.len();

        run(
            &mut design,
            &RadialEcap,
            &ParameterSet::new().with("isPolarized", true),
        );
        let component = design.component(design.root()).unwrap();
        assert_eq!(component.history.len(), before);
        // stripe, dash, two patterned dashes join the three default bodies
        assert_eq!(component.history.active_body_count(), 7);

        let expected = 2.0 * PI * 0.501 * RadialEcap::band_area(1.0, 1.1) * (18.0 / 360.0);
        assert!((body_volume(component, "Band") - expected).abs() < 1e-12);

        run(
            &mut design,
            &RadialEcap,
            &ParameterSet::new().with("isPolarized", false),
        );
        let component = design.component(design.root()).unwrap();
        assert_eq!(component.history.active_body_count(), 3);
    }

    #[test]
    fn colour_channels_repaint_the_can() {
        let mut design = Design::new("radial ecap");
        run(&mut design, &RadialEcap, &ParameterSet::new());
        run(
            &mut design,
            &RadialEcap,
            &ParameterSet::new()
                .with("color_r", 200.0)
                .with("color_g", 10.0)
                .with("color_b", 10.0),
        );

        let component = design.component(design.root()).unwrap();
        let (_, body) = component
            .history
            .active_bodies()
            .find(|(_, body)| body.name == "RadialBody")
            .unwrap();
        assert_eq!(body.finish.rgb, Some(Rgb::new(200, 10, 10)));
    }
}
