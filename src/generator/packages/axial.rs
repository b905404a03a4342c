//! Axial through-hole passives: resistor, diode, fuse and the polarized
//! electrolytic capacitor.
//!
//! One construction carries the family. The barrel is a half rectangle
//! revolved about the body axis, which sits half a width below the
//! overall height, and each wire lead is a circle swept out of the
//! barrel end along a run, a bend and a drop through the board, then
//! mirrored for its partner. Families differ in what they add to the
//! barrel: the diode wears a suppressible cathode sleeve near one end,
//! the fuse steps its metal caps down to a thinner glass tube, and the
//! capacitor rolls a groove into the wall behind the positive end.

use std::f64::consts::{FRAC_PI_2, PI};

use crate::error::GenerateResult;
use crate::generator::context::BuildContext;
use crate::generator::feature_ops::{recolour_indexed, set_indexed_area, Arg, BodyRef, Ops};
use crate::generator::framework::{FlagSpec, OptionalFeature, PackageBuilder, ParamSpec, Resolved};
use crate::generator::packages::PackageType;
use crate::generator::params::ParameterSet;
use crate::generator::sketch_ops;
use crate::model::material::{Appearance, Finish, Material, Rgb};
use crate::model::{BasePlane, FeatureKey, Point2, SketchId, SketchPlane};

const BODY: FeatureKey = FeatureKey("body");
const BAND: FeatureKey = FeatureKey("band");
const GROOVE: FeatureKey = FeatureKey("groove");

/// Shared dimension table of the 0.85 barrel families.
const AXIAL_PARAMS: &[ParamSpec] = &[
    ParamSpec::length("A", 0.25, "body height"),
    ParamSpec::length("D", 0.85, "body length"),
    ParamSpec::length("E", 0.25, "body width"),
    ParamSpec::length("b", 0.06, "terminal width"),
    ParamSpec::length("R", 0.05, "bend radius"),
    ParamSpec::length("e", 1.05, "pin pitch"),
];

fn lead_finish() -> Finish {
    Finish::of(Material::CopperAlloy).with_appearance(Appearance::NickelPolished)
}

/// A missing pitch falls back to the bend jig: one straight length and
/// one bend allowance either side of the barrel.
fn pitch_from_jig(resolved: &mut Resolved, params: &ParameterSet) {
    if params.contains("e") {
        return;
    }
    if let Some(l1) = params.length_opt("L1") {
        resolved.set_dim("e", 2.0 * (l1 + resolved.dim("R")) + resolved.dim("D"));
    }
}

/// Cylindrical barrel: the half profile below the axis revolved a full
/// turn. Returns the profile sketch so callers can draw into it.
fn barrel(
    ops: &mut Ops<'_>,
    resolved: &Resolved,
    body_name: &str,
    finish: Finish,
) -> GenerateResult<(SketchId, BodyRef)> {
    let a = resolved.dim("A");
    let d = resolved.dim("D");
    let e_wid = resolved.dim("E");

    let body_sketch = ops.sketch("BodySketch", SketchPlane::offset_from(BasePlane::Xz, 0.0));
    sketch_ops::center_rectangle(
        ops.sketch_mut(body_sketch),
        Point2::new(0.0, a - 3.0 * e_wid / 4.0),
        d,
        e_wid / 2.0,
    );
    let profile = ops.rect(Arg::expr(e_wid / 2.0, "param_E/2"), Arg::expr(d, "param_D"))?;
    let body = ops.revolve(
        "Body",
        profile,
        Arg::expr(e_wid / 4.0, "param_E/4"),
        360.0,
        body_name,
        finish,
    )?;
    Ok((body_sketch, body))
}

/// Both wire leads: a circle of the terminal diameter swept along the
/// run-bend-drop path from the barrel end, mirrored for the far side.
/// The path is drawn into the body sketch; its length stays bound to
/// the pitch, height and board thickness.
fn wire_leads(
    ops: &mut Ops<'_>,
    body_sketch: SketchId,
    resolved: &Resolved,
    board: f64,
) -> GenerateResult<()> {
    let a = resolved.dim("A");
    let d = resolved.dim("D");
    let e_wid = resolved.dim("E");
    let b = resolved.dim("b");
    let r = resolved.dim("R");
    let pitch = resolved.dim("e");

    ops.plane("PinProOffset", BasePlane::Yz, Arg::expr(d / 2.0, "param_D/2"))?;
    let pin_sketch = ops.sketch("PinSketch", SketchPlane::offset_from(BasePlane::Yz, d / 2.0));
    sketch_ops::center_circle(
        ops.sketch_mut(pin_sketch),
        Point2::new(-(a - e_wid / 2.0), 0.0),
        b,
    );

    let length = sketch_ops::axial_lead_path(
        ops.sketch_mut(body_sketch),
        d,
        pitch,
        a - e_wid / 2.0,
        1.2f64.mul_add(board, a / 2.0),
        r,
    );
    let lead_profile = ops.circle(Arg::expr(b / 2.0, "param_b/2"))?;
    let lead = ops.sweep(
        "Pin",
        lead_profile,
        Arg::expr(
            length,
            "param_e/2 - param_D/2 + param_A/2 + board_thickness * 1.2 + param_R * (3.141592653589793/2 - 2)",
        ),
        "Pin",
        lead_finish(),
    )?;
    ops.mirror("PinMirror", &[lead.feature], BasePlane::Yz);
    Ok(())
}

pub struct AxialResistor;

impl PackageBuilder for AxialResistor {
    fn package_type(&self) -> PackageType {
        PackageType::AxialResistor
    }

    fn params(&self) -> &'static [ParamSpec] {
        AXIAL_PARAMS
    }

    fn default_rgb(&self) -> Rgb {
        Rgb::new(192, 192, 192)
    }

    fn uses_board_thickness(&self) -> bool {
        true
    }

    fn derive(&self, resolved: &mut Resolved, params: &ParameterSet) {
        pitch_from_jig(resolved, params);
    }

    fn create(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let rgb = resolved.rgb();
        let board = ctx.board_thickness;
        let mut ops = ctx.ops();
        let (body_sketch, body) = barrel(
            &mut ops,
            resolved,
            "Resistor",
            Finish::body().with_rgb(rgb),
        )?;
        wire_leads(&mut ops, body_sketch, resolved, board)?;
        ops.index(BODY, body.feature);
        ops.commit()
    }

    fn update(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        recolour_indexed(ctx.component(), BODY, resolved.rgb())
    }
}

pub struct AxialDiode;

impl PackageBuilder for AxialDiode {
    fn package_type(&self) -> PackageType {
        PackageType::AxialDiode
    }

    fn params(&self) -> &'static [ParamSpec] {
        AXIAL_PARAMS
    }

    fn flags(&self) -> &'static [FlagSpec] {
        const FLAGS: &[FlagSpec] = &[FlagSpec::detail("isPolarized")];
        FLAGS
    }

    fn default_rgb(&self) -> Rgb {
        Rgb::new(30, 30, 30)
    }

    fn optional_features(&self) -> &'static [OptionalFeature] {
        const OPTIONAL: &[OptionalFeature] = &[OptionalFeature::when_set("isPolarized", BAND)];
        OPTIONAL
    }

    fn uses_board_thickness(&self) -> bool {
        true
    }

    fn derive(&self, resolved: &mut Resolved, params: &ParameterSet) {
        pitch_from_jig(resolved, params);
    }

    fn create(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let d = resolved.dim("D");
        let e_wid = resolved.dim("E");
        let rgb = resolved.rgb();
        let board = ctx.board_thickness;

        let mut ops = ctx.ops();
        let (body_sketch, body) =
            barrel(&mut ops, resolved, "Diode", Finish::body().with_rgb(rgb))?;

        // Cathode sleeve over the last eighth of the barrel.
        ops.plane("SplitOffset", BasePlane::Yz, Arg::expr(-3.0 * d / 8.0, "-param_D*3/8"))?;
        let band_sketch = ops.sketch(
            "BandSketch",
            SketchPlane::offset_from(BasePlane::Yz, -3.0 * d / 8.0),
        );
        sketch_ops::center_circle(
            ops.sketch_mut(band_sketch),
            Point2::new(0.0, 0.0),
            e_wid + 0.0005,
        );
        let band_profile = ops.ring(
            Arg::expr((e_wid + 0.0005) / 2.0, "(param_E + 0.0005) / 2"),
            Arg::expr(e_wid / 2.0, "param_E / 2"),
        )?;
        let band = ops.extrude(
            "Band",
            band_profile,
            Arg::expr(-d / 8.0, "-param_D/8"),
            "Band",
            Finish::body().with_rgb(Rgb::new(128, 128, 128)),
        )?;

        wire_leads(&mut ops, body_sketch, resolved, board)?;
        ops.index(BODY, body.feature);
        ops.index(BAND, band.feature);
        ops.commit()
    }

    fn update(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        recolour_indexed(ctx.component(), BODY, resolved.rgb())
    }
}

pub struct AxialFuse;

impl PackageBuilder for AxialFuse {
    fn package_type(&self) -> PackageType {
        PackageType::AxialFuse
    }

    fn params(&self) -> &'static [ParamSpec] {
        AXIAL_PARAMS
    }

    fn uses_board_thickness(&self) -> bool {
        true
    }

    fn derive(&self, resolved: &mut Resolved, params: &ParameterSet) {
        pitch_from_jig(resolved, params);
    }

    fn create(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let a = resolved.dim("A");
        let d = resolved.dim("D");
        let e_wid = resolved.dim("E");
        let board = ctx.board_thickness;
        let h = a - e_wid / 2.0;

        let mut ops = ctx.ops();

        // Stepped half profile: caps at the full radius over the outer
        // eighths, a step ring at 0.95, the glass tube at 0.85 between.
        let body_sketch = ops.sketch("BodySketch", SketchPlane::offset_from(BasePlane::Xz, 0.0));
        sketch_ops::polygon(
            ops.sketch_mut(body_sketch),
            &[
                Point2::new(-d / 2.0, h),
                Point2::new(d / 2.0, h),
                Point2::new(d / 2.0, h - e_wid / 2.0),
                Point2::new(3.0 * d / 8.0, h - e_wid / 2.0),
                Point2::new(3.0 * d / 8.0, h - 0.475 * e_wid),
                Point2::new(d / 4.0, h - 0.475 * e_wid),
                Point2::new(d / 4.0, h - 0.425 * e_wid),
                Point2::new(-d / 4.0, h - 0.425 * e_wid),
                Point2::new(-d / 4.0, h - 0.475 * e_wid),
                Point2::new(-3.0 * d / 8.0, h - 0.475 * e_wid),
                Point2::new(-3.0 * d / 8.0, h - e_wid / 2.0),
                Point2::new(-d / 2.0, h - e_wid / 2.0),
            ],
        );

        let finish = Finish::of(Material::Glass).with_appearance(Appearance::AluminiumPolished);
        let tube_profile = ops.rect(
            Arg::expr(0.85 * e_wid / 2.0, "0.85 * param_E/2"),
            Arg::expr(d / 2.0, "param_D/2"),
        )?;
        let tube = ops.revolve(
            "CentreTube",
            tube_profile,
            Arg::expr(0.85 * e_wid / 4.0, "0.85 * param_E/4"),
            360.0,
            "Fuse",
            finish,
        )?;
        for n in 1..=2 {
            let step_profile = ops.rect(
                Arg::expr(0.95 * e_wid / 2.0, "0.95 * param_E/2"),
                Arg::expr(d / 8.0, "param_D/8"),
            )?;
            ops.revolve_join(
                &format!("EndStep{n}"),
                step_profile,
                Arg::expr(0.95 * e_wid / 4.0, "0.95 * param_E/4"),
                360.0,
                tube.body,
            )?;
            let cap_profile = ops.rect(
                Arg::expr(e_wid / 2.0, "param_E/2"),
                Arg::expr(d / 8.0, "param_D/8"),
            )?;
            ops.revolve_join(
                &format!("EndCap{n}"),
                cap_profile,
                Arg::expr(e_wid / 4.0, "param_E/4"),
                360.0,
                tube.body,
            )?;
        }

        wire_leads(&mut ops, body_sketch, resolved, board)?;
        ops.commit()
    }
}

pub struct AxialPolarizedCapacitor;

/// Half-disc notch rolled into the wall; its flat side lies on the
/// barrel surface, so the bulge centroid sits `4r/3π` inside it.
fn groove_cut(e_wid: f64) -> (f64, f64) {
    let r = e_wid / 8.0;
    (FRAC_PI_2 * r * r, e_wid / 2.0 - e_wid / (6.0 * PI))
}

impl PackageBuilder for AxialPolarizedCapacitor {
    fn package_type(&self) -> PackageType {
        PackageType::AxialPolarizedCapacitor
    }

    fn params(&self) -> &'static [ParamSpec] {
        const PARAMS: &[ParamSpec] = &[
            ParamSpec::length("A", 0.25, "body height"),
            ParamSpec::length("D", 1.0, "body length"),
            ParamSpec::length("E", 0.25, "body width"),
            ParamSpec::length("b", 0.06, "terminal width"),
            ParamSpec::length("R", 0.05, "bend radius"),
            ParamSpec::length("e", 1.2, "pin pitch"),
        ];
        PARAMS
    }

    fn default_rgb(&self) -> Rgb {
        Rgb::new(94, 208, 254)
    }

    fn uses_board_thickness(&self) -> bool {
        true
    }

    fn derive(&self, resolved: &mut Resolved, params: &ParameterSet) {
        pitch_from_jig(resolved, params);
    }

    fn create(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let a = resolved.dim("A");
        let d = resolved.dim("D");
        let e_wid = resolved.dim("E");
        let rgb = resolved.rgb();
        let board = ctx.board_thickness;

        let mut ops = ctx.ops();
        let (body_sketch, body) = barrel(
            &mut ops,
            resolved,
            "Capacitor",
            Finish::of(Material::Ceramic).with_rgb(rgb),
        )?;

        // Rolled groove a quarter length behind the positive end.
        sketch_ops::semicircle(
            ops.sketch_mut(body_sketch),
            Point2::new(-d / 4.0, a - e_wid),
            e_wid / 8.0,
        );
        let (groove_area, groove_radius) = groove_cut(e_wid);
        let groove = ops.revolve_cut(
            "Groove",
            ops.area(groove_area),
            Arg::expr(
                groove_radius,
                "param_E/2 - param_E / (6 * 3.141592653589793)",
            ),
            360.0,
            body.body,
        )?;

        wire_leads(&mut ops, body_sketch, resolved, board)?;
        ops.index(BODY, body.feature);
        ops.index(GROOVE, groove);
        ops.commit()
    }

    fn update(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let (groove_area, _) = groove_cut(resolved.dim("E"));
        let component = ctx.component();
        set_indexed_area(component, GROOVE, groove_area)?;
        recolour_indexed(component, BODY, resolved.rgb())
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

    fn lead_length(pitch: f64, d: f64, a: f64, r: f64) -> f64 {
        (pitch - d) / 2.0 + (a / 2.0 + 1.2 * 0.16) + r * (FRAC_PI_2 - 2.0)
    }

    #[test]
    fn resistor_is_a_cylinder_on_two_bent_leads() {
        let mut design = Design::new("axial resistor");
        run(&mut design, &AxialResistor, &ParameterSet::new());

        assert!(design.parameters.contains("board_thickness"));
        let component = design.component(design.root()).unwrap();
        assert_eq!(component.history.active_body_count(), 3);

        let body = PI * 0.125 * 0.125 * 0.85;
        assert!((body_volume(component, "Resistor") - body).abs() < 1e-12);
        let lead = PI * 0.03 * 0.03 * lead_length(1.05, 0.85, 0.25, 0.05);
        assert!((body_volume(component, "Pin") - lead).abs() < 1e-12);
    }

    #[test]
    fn diode_band_waits_on_polarity() {
        let mut design = Design::new("axial diode");
        run(&mut design, &AxialDiode, &ParameterSet::new());
        let before = design.component(design.root()).unwrap().history.len();
        assert_eq!(
            design
                .component(design.root())
                .unwrap()
                .history
                .active_body_count(),
            3
        );

        run(
            &mut design,
            &AxialDiode,
            &ParameterSet::new().with("isPolarized", true),
        );
        let component = design.component(design.root()).unwrap();
        assert_eq!(component.history.len(), before);
        assert_eq!(component.history.active_body_count(), 4);

        let outer: f64 = (0.25 + 0.0005) / 2.0;
        let expected = PI * (outer * outer - 0.125 * 0.125) * (0.85 / 8.0);
        assert!((body_volume(component, "Band") - expected).abs() < 1e-12);

        run(
            &mut design,
            &AxialDiode,
            &ParameterSet::new().with("isPolarized", false),
        );
        let component = design.component(design.root()).unwrap();
        assert_eq!(component.history.active_body_count(), 3);
    }

    #[test]
    fn pitch_falls_back_to_the_bend_jig() {
        let mut design = Design::new("axial diode");
        run(
            &mut design,
            &AxialDiode,
            &ParameterSet::new().with("L1", 0.07),
        );
        let pitch = design.parameters.value_of("param_e").unwrap();
        assert!((pitch - 1.09).abs() < 1e-12);
    }

    #[test]
    fn fuse_caps_step_down_to_the_glass_tube() {
        let mut design = Design::new("axial fuse");
        run(&mut design, &AxialFuse, &ParameterSet::new());

        let component = design.component(design.root()).unwrap();
        assert_eq!(component.history.active_body_count(), 3);

        let tube_r: f64 = 0.85 * 0.125;
        let step_r: f64 = 0.95 * 0.125;
        let cap_r: f64 = 0.125;
        let expected = PI
            * (tube_r * tube_r * (0.85 / 2.0)
                + 2.0 * step_r * step_r * (0.85 / 8.0)
                + 2.0 * cap_r * cap_r * (0.85 / 8.0));
        assert!((body_volume(component, "Fuse") - expected).abs() < 1e-12);
    }

    #[test]
    fn capacitor_groove_follows_a_width_change() {
        let mut design = Design::new("axial cap");
        run(&mut design, &AxialPolarizedCapacitor, &ParameterSet::new());
        let before = design.component(design.root()).unwrap().history.len();

        let shell = PI * 0.125 * 0.125 * 1.0;
        let (area, radius) = groove_cut(0.25);
        let groove = 2.0 * PI * radius * area;
        let component = design.component(design.root()).unwrap();
        assert!((body_volume(component, "Capacitor") - (shell - groove)).abs() < 1e-12);

        // Stretching the barrel leaves the groove ring untouched.
        run(
            &mut design,
            &AxialPolarizedCapacitor,
            &ParameterSet::new().with("D", 1.2),
        );
        let component = design.component(design.root()).unwrap();
        assert_eq!(component.history.len(), before);
        let stretched = PI * 0.125 * 0.125 * 1.2;
        assert!((body_volume(component, "Capacitor") - (stretched - groove)).abs() < 1e-12);
    }
}
