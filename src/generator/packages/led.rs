//! LEDs: the through-hole round lamp and the surface-mount chip LED.
//!
//! The lamp merges a flat-bottomed disc, a cylinder and a hemispherical
//! dome into one tinted body with an emissive sphere buried at its
//! focus. The chip LED is three slabs, tin over ceramic over tin, under
//! a tapered translucent case with an emissive die on the chip. Lead
//! shape on the lamp is structural: swapping round for ribbon leads
//! rebuilds the component.

use std::f64::consts::PI;

use crate::error::GenerateResult;
use crate::generator::context::BuildContext;
use crate::generator::feature_ops::{
    recolour_indexed, refinish_indexed, set_indexed_area, set_indexed_radius, Arg,
};
use crate::generator::framework::{FlagSpec, PackageBuilder, ParamSpec, Resolved};
use crate::generator::packages::PackageType;
use crate::generator::params::ParameterSet;
use crate::generator::sketch_ops;
use crate::model::material::{Appearance, Finish, Material, Rgb};
use crate::model::{BasePlane, FeatureKey, Point2, SketchPlane};

const BODY: FeatureKey = FeatureKey("body");
const DOME: FeatureKey = FeatureKey("dome");
const LIGHT: FeatureKey = FeatureKey("light_source");
const CASE: FeatureKey = FeatureKey("glass_case");
const ODD_FILLET: FeatureKey = FeatureKey("odd_fillet");
const EVEN_FILLET: FeatureKey = FeatureKey("even_fillet");

/// Die brightness shared by both families.
const LUMINANCE: f64 = 50000.0;

fn lead_finish() -> Finish {
    Finish::of(Material::CopperAlloy).with_appearance(Appearance::NickelPolished)
}

fn light_finish(rgb: Rgb) -> Finish {
    Finish::of(Material::Ceramic).with_rgb(rgb).emissive(LUMINANCE)
}

pub struct RadialRoundLed;

impl RadialRoundLed {
    /// Disc with the cathode flat: a chord at ninety per cent of the
    /// radius clips one side.
    fn flat_disc_area(d: f64) -> f64 {
        let r = d / 2.0;
        PI * r * r - sketch_ops::segment_area(r, 0.45 * d)
    }
}

impl PackageBuilder for RadialRoundLed {
    fn package_type(&self) -> PackageType {
        PackageType::RadialRoundLed
    }

    fn params(&self) -> &'static [ParamSpec] {
        const PARAMS: &[ParamSpec] = &[
            ParamSpec::length("D", 0.565, "body diameter"),
            ParamSpec::length("A", 0.86, "body height"),
            ParamSpec::length("A1", 0.0, "body offset"),
            ParamSpec::length("b", 0.06, "lead diameter"),
            ParamSpec::length("c", 0.05, "lead thickness"),
            ParamSpec::length("e", 0.254, "pitch"),
        ];
        PARAMS
    }

    fn flags(&self) -> &'static [FlagSpec] {
        // Lead cross-section swaps the terminal sketch outright.
        const FLAGS: &[FlagSpec] = &[FlagSpec::structural("isRectangularTerminal")];
        FLAGS
    }

    fn default_rgb(&self) -> Rgb {
        Rgb::new(220, 0, 0)
    }

    fn uses_board_thickness(&self) -> bool {
        true
    }

    fn create(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let d = resolved.dim("D");
        let a = resolved.dim("A");
        let a1 = resolved.dim("A1");
        let b = resolved.dim("b");
        let c = resolved.dim("c");
        let pitch = resolved.dim("e");
        let rectangular = resolved.flag("isRectangularTerminal");
        let rgb = resolved.rgb();
        let board = ctx.board_thickness;

        let mut ops = ctx.ops();

        // Flanged base disc with the cathode flat.
        ops.plane("LowerBodyPlaneXy", BasePlane::Xy, Arg::expr(a1, "param_A1"))?;
        let lower_sketch =
            ops.sketch("LowerBodySketch", SketchPlane::offset_from(BasePlane::Xy, a1));
        sketch_ops::center_circle(ops.sketch_mut(lower_sketch), Point2::new(0.0, 0.0), d);
        sketch_ops::vertical_split(ops.sketch_mut(lower_sketch), 0.45 * d, 0.225 * d);
        let lower = ops.extrude(
            "LowerBody",
            ops.area(Self::flat_disc_area(d)),
            Arg::expr(0.2 * a, "param_A * 0.2"),
            "Led",
            Finish::of(Material::TransparentPlastic).with_rgb(rgb),
        )?;

        // Main barrel joins onto the base.
        let mid_offset = 0.2f64.mul_add(a, a1);
        ops.plane(
            "MidBodyPlaneXy",
            BasePlane::Xy,
            Arg::expr(mid_offset, "param_A1 + 0.2 * param_A"),
        )?;
        let mid_sketch = ops.sketch("MidBodySketch", SketchPlane::offset_from(BasePlane::Xy, mid_offset));
        sketch_ops::center_circle(ops.sketch_mut(mid_sketch), Point2::new(0.0, 0.0), 0.9 * d);
        let barrel = ops.circle(Arg::expr(0.45 * d, "param_D * 0.9 / 2"))?;
        ops.extrude_join(
            "MidBody",
            barrel,
            Arg::expr(
                0.8f64.mul_add(a, -(0.45 * d)),
                "0.8 * param_A - 0.9 * param_D/2",
            ),
            lower.body,
        )?;

        // Emissive sphere at the focus: a half-disc swung full circle.
        let light_offset = 0.5f64.mul_add(a, a1);
        ops.plane(
            "LightSourcePlaneXy",
            BasePlane::Xy,
            Arg::expr(light_offset, "param_A1 + 0.5 * param_A"),
        )?;
        let light_sketch =
            ops.sketch("LightSourceSketch", SketchPlane::offset_from(BasePlane::Xy, light_offset));
        sketch_ops::center_circle(ops.sketch_mut(light_sketch), Point2::new(0.0, 0.0), 0.1 * d);
        sketch_ops::vertical_split(ops.sketch_mut(light_sketch), 0.0, 0.05 * d);
        let light_r = 0.05 * d;
        let light = ops.revolve(
            "LightSource",
            ops.area(PI * light_r * light_r / 2.0),
            Arg::expr(
                0.2 * d / (3.0 * PI),
                "0.2 * param_D / (3 * 3.141592653589793)",
            ),
            360.0,
            "LightSource",
            light_finish(rgb),
        )?;

        // Dome: a half-disc swung half a turn joins as the lens.
        let dome_r = 0.45 * d;
        let top_offset = a1 + a - dome_r;
        ops.plane(
            "TopBodyPlaneXy",
            BasePlane::Xy,
            Arg::expr(top_offset, "param_A1 + param_A - 0.9 * param_D/2"),
        )?;
        let top_sketch = ops.sketch("TopBodySketch", SketchPlane::offset_from(BasePlane::Xy, top_offset));
        sketch_ops::center_circle(ops.sketch_mut(top_sketch), Point2::new(0.0, 0.0), 0.9 * d);
        sketch_ops::vertical_split(ops.sketch_mut(top_sketch), 0.0, dome_r);
        let dome = ops.revolve_join(
            "TopBody",
            ops.area(PI * dome_r * dome_r / 2.0),
            Arg::expr(0.6 * d / PI, "0.6 * param_D / 3.141592653589793"),
            180.0,
            lower.body,
        )?;

        // Leads, round or ribbon, drop from the body offset through the
        // board.
        ops.plane("TerminalPlaneXy", BasePlane::Xy, Arg::expr(a1, "param_A1"))?;
        let lead_sketch = ops.sketch("TerminalSketch", SketchPlane::offset_from(BasePlane::Xy, a1));
        let lead_profile = if rectangular {
            sketch_ops::center_rectangle(
                ops.sketch_mut(lead_sketch),
                Point2::new(pitch / 2.0, 0.0),
                b,
                c,
            );
            ops.rect(Arg::expr(b, "param_b"), Arg::expr(c, "param_c"))?
        } else {
            sketch_ops::center_circle(ops.sketch_mut(lead_sketch), Point2::new(pitch / 2.0, 0.0), b);
            ops.circle(Arg::expr(b / 2.0, "param_b/2"))?
        };
        let lead = ops.extrude(
            "Terminal",
            lead_profile,
            Arg::expr(
                -1.2f64.mul_add(board, a1),
                "-1.2 * board_thickness - param_A1",
            ),
            "Terminal",
            lead_finish(),
        )?;
        ops.mirror("TerminalMirror", &[lead.feature], BasePlane::Yz);

        ops.index(BODY, lower.feature);
        ops.index(DOME, dome);
        ops.index(LIGHT, light.feature);
        ops.commit()
    }

    fn update(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let d = resolved.dim("D");
        let rgb = resolved.rgb();
        let dome_r = 0.45 * d;
        let light_r = 0.05 * d;
        let component = ctx.component();
        set_indexed_area(component, BODY, Self::flat_disc_area(d))?;
        set_indexed_area(component, DOME, PI * dome_r * dome_r / 2.0)?;
        set_indexed_area(component, LIGHT, PI * light_r * light_r / 2.0)?;
        refinish_indexed(component, LIGHT, light_finish(rgb))?;
        recolour_indexed(component, BODY, rgb)
    }
}

pub struct ChipLed;

impl ChipLed {
    /// Tapered case between the chip top and the lens rim: full body
    /// width at the seam, eighty-five per cent at the top.
    fn case_area(d: f64, e: f64, l: f64, l1: f64) -> f64 {
        (d - l - l1) * e * 0.925
    }

    fn fillet_radius(l: f64) -> f64 {
        (0.08 * l).min(0.004)
    }
}

impl PackageBuilder for ChipLed {
    fn package_type(&self) -> PackageType {
        PackageType::ChipLed
    }

    fn params(&self) -> &'static [ParamSpec] {
        const PARAMS: &[ParamSpec] = &[
            ParamSpec::length("A", 0.07, "body height"),
            ParamSpec::length("A1", 0.035, "chip height"),
            ParamSpec::length("E", 0.18, "body width"),
            ParamSpec::length("D", 0.34, "body length"),
            ParamSpec::length("L", 0.075, "normal terminal width"),
            ParamSpec::length("L1", 0.075, "odd terminal width"),
        ];
        PARAMS
    }

    fn default_rgb(&self) -> Rgb {
        Rgb::new(220, 0, 0)
    }

    fn derive(&self, resolved: &mut Resolved, _params: &ParameterSet) {
        // Terminals may not overlap; grow the body instead.
        let caps = resolved.dim("L") + resolved.dim("L1");
        if resolved.dim("D") < caps + 0.01 {
            resolved.set_dim("D", caps + 0.01);
        }
    }

    fn create(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let a = resolved.dim("A");
        let a1 = resolved.dim("A1");
        let e_body = resolved.dim("E");
        let d = resolved.dim("D");
        let l = resolved.dim("L");
        let l1 = resolved.dim("L1");
        let rgb = resolved.rgb();

        let mut ops = ctx.ops();

        // One sketch split into three slabs by the terminal lines.
        let body_sketch = ops.sketch("BodySketch", SketchPlane::offset_from(BasePlane::Xy, 0.0));
        sketch_ops::center_rectangle(ops.sketch_mut(body_sketch), Point2::new(0.0, 0.0), d, e_body);
        sketch_ops::vertical_split(ops.sketch_mut(body_sketch), d / 2.0 - l1, e_body / 2.0);
        sketch_ops::vertical_split(ops.sketch_mut(body_sketch), -d / 2.0 + l, e_body / 2.0);

        let odd_profile = ops.rect(Arg::expr(l1, "param_L1"), Arg::expr(e_body, "param_E"))?;
        let odd = ops.extrude(
            "OddPin",
            odd_profile,
            Arg::expr(a1, "param_A1"),
            "OddPin",
            Finish::of(Material::Tin),
        )?;
        let even_profile = ops.rect(Arg::expr(l, "param_L"), Arg::expr(e_body, "param_E"))?;
        let even = ops.extrude(
            "EvenPin",
            even_profile,
            Arg::expr(a1, "param_A1"),
            "EvenPin",
            Finish::of(Material::Tin),
        )?;
        let chip_profile = ops.rect(
            Arg::expr(d - l - l1, "param_D - param_L - param_L1"),
            Arg::expr(e_body, "param_E"),
        )?;
        ops.extrude(
            "ChipBody",
            chip_profile,
            Arg::expr(a1, "param_A1"),
            "ChipBody",
            Finish::of(Material::Ceramic),
        )?;

        let radius = Self::fillet_radius(l);
        let odd_fillet = ops.fillet(
            "OddPinFillet",
            odd.body,
            Arg::lit(radius),
            Arg::expr(
                4.0 * (l1 + e_body) + 4.0 * a1,
                "4 * (param_L1 + param_E) + 4 * param_A1",
            ),
        )?;
        let even_fillet = ops.fillet(
            "EvenPinFillet",
            even.body,
            Arg::lit(radius),
            Arg::expr(
                4.0 * (l + e_body) + 4.0 * a1,
                "4 * (param_L + param_E) + 4 * param_A1",
            ),
        )?;

        // Translucent case lofted from the chip top to the lens rim.
        ops.plane("CasePlaneXy", BasePlane::Xy, Arg::expr(a1, "param_A1"))?;
        let case_sketch = ops.sketch("CaseSketch", SketchPlane::offset_from(BasePlane::Xy, a1));
        sketch_ops::center_rectangle(
            ops.sketch_mut(case_sketch),
            Point2::new(0.0, 0.0),
            0.9 * d,
            0.85 * e_body,
        );
        let case = ops.extrude(
            "LedGlassCase",
            ops.area(Self::case_area(d, e_body, l, l1)),
            Arg::expr(a - a1, "param_A - param_A1"),
            "LedGlassCase",
            Finish::of(Material::TransparentPlastic).with_rgb(rgb),
        )?;

        // Emissive die centred between the terminals.
        ops.plane("LightPlaneXy", BasePlane::Xy, Arg::expr(a1, "param_A1"))?;
        let light_sketch = ops.sketch("LightSketch", SketchPlane::offset_from(BasePlane::Xy, a1));
        sketch_ops::center_rectangle(
            ops.sketch_mut(light_sketch),
            Point2::new((l - l1) / 2.0, 0.0),
            d / 10.0,
            e_body / 10.0,
        );
        let light_profile = ops.rect(Arg::expr(d / 10.0, "param_D/10"), Arg::expr(e_body / 10.0, "param_E/10"))?;
        let light = ops.extrude(
            "LedLight",
            light_profile,
            Arg::expr(a1 / 10.0, "param_A1/10"),
            "LedLight",
            light_finish(rgb),
        )?;

        ops.index(CASE, case.feature);
        ops.index(LIGHT, light.feature);
        ops.index(ODD_FILLET, odd_fillet);
        ops.index(EVEN_FILLET, even_fillet);
        ops.commit()
    }

    fn update(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let d = resolved.dim("D");
        let e_body = resolved.dim("E");
        let l = resolved.dim("L");
        let l1 = resolved.dim("L1");
        let rgb = resolved.rgb();
        let component = ctx.component();
        set_indexed_area(component, CASE, Self::case_area(d, e_body, l, l1))?;
        set_indexed_radius(component, ODD_FILLET, Self::fillet_radius(l))?;
        set_indexed_radius(component, EVEN_FILLET, Self::fillet_radius(l))?;
        refinish_indexed(component, LIGHT, light_finish(rgb))?;
        recolour_indexed(component, CASE, rgb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::generator::framework::drive;
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

    fn lamp_volume(d: f64, a: f64) -> f64 {
        let barrel_r = 0.45 * d;
        let base = RadialRoundLed::flat_disc_area(d) * 0.2 * a;
        let barrel = PI * barrel_r * barrel_r * (0.8 * a - barrel_r);
        let dome = 2.0 / 3.0 * PI * barrel_r * barrel_r * barrel_r;
        base + barrel + dome
    }

    #[test]
    fn lamp_merges_base_barrel_and_dome() {
        let mut design = Design::new("led");
        run(&mut design, &RadialRoundLed, &ParameterSet::new());

        assert!(design.parameters.contains("board_thickness"));
        let component = design.component(design.root()).unwrap();
        // merged lamp, light source, two leads
        assert_eq!(component.history.active_body_count(), 4);
        assert!((body_volume(component, "Led") - lamp_volume(0.565, 0.86)).abs() < 1e-12);

        let light_r: f64 = 0.05 * 0.565;
        let light = 4.0 / 3.0 * PI * light_r * light_r * light_r;
        assert!((body_volume(component, "LightSource") - light).abs() < 1e-12);

        let lead = PI * 0.03 * 0.03 * (1.2 * 0.16);
        assert!((body_volume(component, "Terminal") - lead).abs() < 1e-12);
    }

    #[test]
    fn lead_shape_swap_rebuilds_the_lamp() {
        let mut design = Design::new("led");
        run(&mut design, &RadialRoundLed, &ParameterSet::new());
        let before = design.component(design.root()).unwrap().history.len();

        run(
            &mut design,
            &RadialRoundLed,
            &ParameterSet::new().with("isRectangularTerminal", true),
        );
        let component = design.component(design.root()).unwrap();
        assert_eq!(component.history.len(), before);
        assert_eq!(component.history.active_body_count(), 4);

        let ribbon = 0.06 * 0.05 * (1.2 * 0.16);
        assert!((body_volume(component, "Terminal") - ribbon).abs() < 1e-12);
    }

    #[test]
    fn diameter_update_reshapes_the_lamp() {
        let mut design = Design::new("led");
        run(&mut design, &RadialRoundLed, &ParameterSet::new());
        let before = design.component(design.root()).unwrap().history.len();

        run(&mut design, &RadialRoundLed, &ParameterSet::new().with("D", 0.6));
        let component = design.component(design.root()).unwrap();
        assert_eq!(component.history.len(), before);
        assert!((body_volume(component, "Led") - lamp_volume(0.6, 0.86)).abs() < 1e-12);
    }

    #[test]
    fn chip_led_stacks_three_slabs_under_glass() {
        let mut design = Design::new("chip led");
        run(&mut design, &ChipLed, &ParameterSet::new());

        let component = design.component(design.root()).unwrap();
        assert_eq!(component.history.active_body_count(), 5);

        let r: f64 = 0.004;
        let shave = (1.0 - PI / 4.0) * r * r * (4.0 * (0.075 + 0.18) + 4.0 * 0.035);
        let odd = 0.075 * 0.18 * 0.035 - shave;
        assert!((body_volume(component, "OddPin") - odd).abs() < 1e-12);

        let mid = (0.34 - 0.15) * 0.18 * 0.035;
        assert!((body_volume(component, "ChipBody") - mid).abs() < 1e-12);

        let case = 0.925 * (0.34 - 0.15) * 0.18 * (0.07 - 0.035);
        assert!((body_volume(component, "LedGlassCase") - case).abs() < 1e-12);
    }

    #[test]
    fn oversize_terminal_grows_the_body() {
        let mut design = Design::new("chip led");
        run(&mut design, &ChipLed, &ParameterSet::new().with("L1", 0.4));

        let component = design.component(design.root()).unwrap();
        // D grows to L + L1 + 0.01, leaving a sliver of ceramic
        let mid = 0.01 * 0.18 * 0.035;
        assert!((body_volume(component, "ChipBody") - mid).abs() < 1e-12);
    }

    #[test]
    fn colour_update_relights_the_die() {
        let mut design = Design::new("chip led");
        run(&mut design, &ChipLed, &ParameterSet::new());
        run(
            &mut design,
            &ChipLed,
            &ParameterSet::new().with("color_g", 200.0).with("D", 0.4),
        );

        let component = design.component(design.root()).unwrap();
        let case = 0.925 * (0.4 - 0.15) * 0.18 * (0.07 - 0.035);
        assert!((body_volume(component, "LedGlassCase") - case).abs() < 1e-12);

        let (_, die) = component
            .history
            .active_bodies()
            .find(|(_, body)| body.name == "LedLight")
            .unwrap();
        assert_eq!(die.finish.rgb, Some(Rgb::new(220, 200, 0)));
        assert_eq!(die.finish.luminance, Some(LUMINANCE));
    }
}
