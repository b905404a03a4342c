//! Small-outline transistor family: SOT23, SOT143, SOT223 and the flat
//! lead SOTFL.
//!
//! These are asymmetric dual-row packages. The pin count splits into a
//! front and a back row, the odd pin sitting alone when the count is odd,
//! so the two rows are independent patterns rather than a mirror. Rows of
//! exactly two pins spread to double pitch. SOT143 carries one wide
//! terminal at the front corner and SOT223 a single wide tab opposite its
//! common row; SOTFL trades the gull wing for a flat lead flush with the
//! seating plane.

use crate::error::GenerateResult;
use crate::generator::context::BuildContext;
use crate::generator::feature_ops::{
    set_indexed_area, set_indexed_radius, Arg, BodyRef, Ops,
};
use crate::generator::framework::{PackageBuilder, ParamSpec, Resolved};
use crate::generator::packages::PackageType;
use crate::generator::params::ParameterSet;
use crate::generator::sketch_ops;
use crate::model::material::Finish;
use crate::model::{BasePlane, FeatureKey, Point2, SketchPlane};

const FRONT_PIN: FeatureKey = FeatureKey("front_pin");
const BACK_PIN: FeatureKey = FeatureKey("back_pin");
const COMMON_PIN: FeatureKey = FeatureKey("common_pin");
const ODD_PIN: FeatureKey = FeatureKey("odd_pin");
const PIN_ONE_MARK: FeatureKey = FeatureKey("pin_one_mark");

/// Nominal lead-frame thickness for the gull-wing variants.
const GULL_THICKNESS: f64 = 0.013;
/// Nominal terminal thickness for the flat-lead variant.
const FLAT_THICKNESS: f64 = 0.0275;

/// Front and back row sizes; the odd pin lands in the back row.
const fn rows(pins: u32) -> (u32, u32) {
    let front = pins / 2;
    (front, pins - front)
}

/// Rows of exactly two pins sit at double pitch. The front pitch derives
/// from the back pitch unless the caller supplied it.
fn derive_row_pitches(resolved: &mut Resolved, params: &ParameterSet) {
    let (front, back) = rows(resolved.count("DPins"));
    let pitch = resolved.dim("e");
    if !params.contains("e1") {
        resolved.set_dim("e1", if front == 2 { 2.0 * pitch } else { pitch });
    }
    if back == 2 {
        resolved.set_dim("e", 2.0 * pitch);
    }
}

/// Body slab on its offset plane with the shared top and bottom chamfers.
fn chamfered_body(
    ops: &mut Ops<'_>,
    a: f64,
    a1: f64,
    e1: f64,
    d: f64,
    tt: f64,
) -> GenerateResult<BodyRef> {
    ops.plane("BodyPlaneXy", BasePlane::Xy, Arg::expr(a1, "param_A1"))?;
    let sketch = ops.sketch("BodySketch", SketchPlane::offset_from(BasePlane::Xy, a1));
    sketch_ops::center_rectangle(ops.sketch_mut(sketch), Point2::new(0.0, 0.0), e1, d);
    let profile = ops.rect(Arg::expr(e1, "param_E1"), Arg::expr(d, "param_D"))?;
    let body = ops.extrude(
        "Body",
        profile,
        Arg::expr(a - a1, "param_A - param_A1"),
        "Body",
        Finish::body(),
    )?;

    let slab = a - a1 - tt;
    let perimeter = Arg::expr(2.0 * (e1 + d), "(param_E1 + param_D) * 2");
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
    Ok(body)
}

/// One gull-wing lead on its own row plane. `direction` is +1 for the
/// back row and -1 for the front row, which faces the other way.
#[allow(clippy::too_many_arguments)]
fn gull_pin(
    ops: &mut Ops<'_>,
    name: &str,
    row_offset: f64,
    direction: f64,
    span: f64,
    e1: f64,
    a: f64,
    a1: f64,
    tt: f64,
    foot: f64,
    width: Arg<'_>,
) -> GenerateResult<BodyRef> {
    let plane = format!("{name}PlaneXz");
    ops.plane(&plane, BasePlane::Xz, Arg::lit(row_offset))?;
    let sketch = ops.sketch(
        &format!("{name}Sketch"),
        SketchPlane::offset_from(BasePlane::Xz, row_offset),
    );
    let area = sketch_ops::gullwing_outline(
        ops.sketch_mut(sketch),
        Point2::new(direction * e1 / 2.0, 0.0),
        direction,
        (span - e1) / 2.0,
        (a + a1) / 2.0 + tt / 2.0,
        tt,
        foot,
    );
    let profile = ops.area(area);
    ops.extrude(name, profile, width, name, Finish::terminal())
}

pub struct Sot23;

impl PackageBuilder for Sot23 {
    fn package_type(&self) -> PackageType {
        PackageType::Sot23
    }

    fn params(&self) -> &'static [ParamSpec] {
        const PARAMS: &[ParamSpec] = &[
            ParamSpec::length("A", 0.117, "body height"),
            ParamSpec::length("A1", 0.01, "body offset"),
            ParamSpec::length("E", 0.24, "span"),
            ParamSpec::length("E1", 0.13, "body width"),
            ParamSpec::length("D", 0.29, "body length"),
            ParamSpec::length("e", 0.095, "pitch"),
            ParamSpec::length("e1", 0.095, "pitch"),
            ParamSpec::length("b", 0.044, "terminal length"),
            ParamSpec::length("L", 0.05, "terminal width"),
            ParamSpec::count("DPins", 6, "pins"),
            ParamSpec::length("terminalThickness", GULL_THICKNESS, "terminal thickness"),
        ];
        PARAMS
    }

    fn derive(&self, resolved: &mut Resolved, params: &ParameterSet) {
        resolved.set_dim("terminalThickness", params.terminal_thickness(GULL_THICKNESS));
        derive_row_pitches(resolved, params);
    }

    fn create(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let a = resolved.dim("A");
        let a1 = resolved.dim("A1");
        let span = resolved.dim("E");
        let e1 = resolved.dim("E1");
        let d = resolved.dim("D");
        let tt = resolved.dim("terminalThickness");
        let foot = resolved.dim("L");
        let b = resolved.dim("b");
        let (front, back) = rows(resolved.count("DPins"));

        let mut ops = ctx.ops();
        let body = chamfered_body(&mut ops, a, a1, e1, d, tt)?;

        let front_pin = gull_pin(
            &mut ops,
            "FrontPin",
            resolved.dim("e1") * f64::from(front.max(1) - 1) / 2.0,
            -1.0,
            span,
            e1,
            a,
            a1,
            tt,
            foot,
            Arg::expr(b, "param_b"),
        )?;
        ops.pattern(
            "PinPattern1",
            &[front_pin.feature],
            front,
            Arg::expr(resolved.dim("e1"), "param_e1"),
            1,
            Arg::lit(0.0),
        )?;

        let back_pin = gull_pin(
            &mut ops,
            "BackPin",
            resolved.dim("e") * f64::from(back - 1) / 2.0,
            1.0,
            span,
            e1,
            a,
            a1,
            tt,
            foot,
            Arg::expr(b, "param_b"),
        )?;
        ops.pattern(
            "PinPattern2",
            &[back_pin.feature],
            back,
            Arg::expr(-resolved.dim("e"), "-param_e"),
            1,
            Arg::lit(0.0),
        )?;

        let mark = ops.pin_one_mark(
            body.body,
            Arg::expr(a, "param_A"),
            Arg::expr(0.1 * a, "param_A/10"),
            d,
            e1,
        )?;

        ops.index(FRONT_PIN, front_pin.feature);
        ops.index(BACK_PIN, back_pin.feature);
        ops.index(PIN_ONE_MARK, mark);
        ops.commit()
    }

    fn update(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let area = resolved.dim("terminalThickness")
            * (resolved.dim("E") - resolved.dim("E1"))
            / 2.0;
        let component = ctx.component();
        set_indexed_area(component, FRONT_PIN, area)?;
        set_indexed_area(component, BACK_PIN, area)?;
        set_indexed_radius(component, PIN_ONE_MARK, resolved.dim("E1") / 20.0)
    }
}

/// SOT143: the SOT23 layout with one wide terminal at the front corner.
pub struct Sot143;

impl PackageBuilder for Sot143 {
    fn package_type(&self) -> PackageType {
        PackageType::Sot143
    }

    fn params(&self) -> &'static [ParamSpec] {
        const PARAMS: &[ParamSpec] = &[
            ParamSpec::length("A", 0.117, "body height"),
            ParamSpec::length("A1", 0.01, "body offset"),
            ParamSpec::length("E", 0.24, "span"),
            ParamSpec::length("E1", 0.13, "body width"),
            ParamSpec::length("D", 0.29, "body length"),
            ParamSpec::length("e", 0.095, "pitch"),
            ParamSpec::length("e1", 0.095, "pitch"),
            ParamSpec::length("b", 0.044, "terminal length"),
            ParamSpec::length("b1", 0.08, "terminal length"),
            ParamSpec::length("L", 0.05, "terminal width"),
            ParamSpec::count("DPins", 4, "pins"),
            ParamSpec::length("terminalThickness", GULL_THICKNESS, "terminal thickness"),
        ];
        PARAMS
    }

    fn derive(&self, resolved: &mut Resolved, params: &ParameterSet) {
        resolved.set_dim("terminalThickness", params.terminal_thickness(GULL_THICKNESS));
        derive_row_pitches(resolved, params);
    }

    fn create(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let a = resolved.dim("A");
        let a1 = resolved.dim("A1");
        let span = resolved.dim("E");
        let e1 = resolved.dim("E1");
        let d = resolved.dim("D");
        let tt = resolved.dim("terminalThickness");
        let foot = resolved.dim("L");
        let (front, back) = rows(resolved.count("DPins"));

        let mut ops = ctx.ops();
        let body = chamfered_body(&mut ops, a, a1, e1, d, tt)?;

        // The wide terminal takes the first front position.
        let odd_pin = gull_pin(
            &mut ops,
            "OddPin",
            resolved.dim("e1") * f64::from(front.max(1) - 1) / 2.0,
            -1.0,
            span,
            e1,
            a,
            a1,
            tt,
            foot,
            Arg::expr(resolved.dim("b1"), "param_b1"),
        )?;

        if front > 1 {
            let front_pin = gull_pin(
                &mut ops,
                "FrontPin",
                resolved.dim("e1") * f64::from(front - 1) / 2.0 - resolved.dim("e1"),
                -1.0,
                span,
                e1,
                a,
                a1,
                tt,
                foot,
                Arg::expr(resolved.dim("b"), "param_b"),
            )?;
            ops.pattern(
                "PinPattern1",
                &[front_pin.feature],
                front - 1,
                Arg::expr(-resolved.dim("e1"), "-param_e1"),
                1,
                Arg::lit(0.0),
            )?;
            ops.index(FRONT_PIN, front_pin.feature);
        }

        let back_pin = gull_pin(
            &mut ops,
            "BackPin",
            resolved.dim("e") * f64::from(back - 1) / 2.0,
            1.0,
            span,
            e1,
            a,
            a1,
            tt,
            foot,
            Arg::expr(resolved.dim("b"), "param_b"),
        )?;
        ops.pattern(
            "PinPattern2",
            &[back_pin.feature],
            back,
            Arg::expr(-resolved.dim("e"), "-param_e"),
            1,
            Arg::lit(0.0),
        )?;

        let mark = ops.pin_one_mark(
            body.body,
            Arg::expr(a, "param_A"),
            Arg::expr(0.1 * a, "param_A/10"),
            d,
            e1,
        )?;

        ops.index(ODD_PIN, odd_pin.feature);
        ops.index(BACK_PIN, back_pin.feature);
        ops.index(PIN_ONE_MARK, mark);
        ops.commit()
    }

    fn update(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let area = resolved.dim("terminalThickness")
            * (resolved.dim("E") - resolved.dim("E1"))
            / 2.0;
        let (front, _) = rows(resolved.count("DPins"));
        let component = ctx.component();
        set_indexed_area(component, ODD_PIN, area)?;
        if front > 1 {
            set_indexed_area(component, FRONT_PIN, area)?;
        }
        set_indexed_area(component, BACK_PIN, area)?;
        set_indexed_radius(component, PIN_ONE_MARK, resolved.dim("E1") / 20.0)
    }
}

/// SOT223: a single-row package with one wide tab opposite the common row.
pub struct Sot223;

impl PackageBuilder for Sot223 {
    fn package_type(&self) -> PackageType {
        PackageType::Sot223
    }

    fn params(&self) -> &'static [ParamSpec] {
        const PARAMS: &[ParamSpec] = &[
            ParamSpec::length("A", 0.1, "body height"),
            ParamSpec::length("A1", 0.01, "body offset"),
            ParamSpec::length("E", 0.7, "span"),
            ParamSpec::length("E1", 0.35, "body width"),
            ParamSpec::length("D", 0.65, "body length"),
            ParamSpec::length("e", 0.2, "pitch"),
            ParamSpec::length("b", 0.07, "terminal length"),
            ParamSpec::length("b1", 0.3, "terminal length"),
            ParamSpec::length("L", 0.09, "tab width"),
            ParamSpec::count("DPins", 4, "pins"),
            ParamSpec::length("terminalThickness", GULL_THICKNESS, "terminal thickness"),
        ];
        PARAMS
    }

    fn derive(&self, resolved: &mut Resolved, params: &ParameterSet) {
        resolved.set_dim("terminalThickness", params.terminal_thickness(GULL_THICKNESS));
    }

    fn create(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let a = resolved.dim("A");
        let a1 = resolved.dim("A1");
        let span = resolved.dim("E");
        let e1 = resolved.dim("E1");
        let d = resolved.dim("D");
        let tt = resolved.dim("terminalThickness");
        let foot = resolved.dim("L");
        let pitch = resolved.dim("e");
        let common = resolved.count("DPins").saturating_sub(1).max(1);

        let mut ops = ctx.ops();
        chamfered_body(&mut ops, a, a1, e1, d, tt)?;

        let common_pin = gull_pin(
            &mut ops,
            "CommonPin",
            pitch / 2.0 * f64::from(common - 1),
            -1.0,
            span,
            e1,
            a,
            a1,
            tt,
            foot,
            Arg::expr(resolved.dim("b"), "param_b"),
        )?;
        ops.pattern(
            "PinPattern",
            &[common_pin.feature],
            common,
            Arg::expr(-pitch, "-param_e"),
            1,
            Arg::lit(0.0),
        )?;

        let odd_pin = gull_pin(
            &mut ops,
            "OddPin",
            0.0,
            1.0,
            span,
            e1,
            a,
            a1,
            tt,
            foot,
            Arg::expr(resolved.dim("b1"), "param_b1"),
        )?;

        ops.index(COMMON_PIN, common_pin.feature);
        ops.index(ODD_PIN, odd_pin.feature);
        ops.commit()
    }

    fn update(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let area = resolved.dim("terminalThickness")
            * (resolved.dim("E") - resolved.dim("E1"))
            / 2.0;
        let component = ctx.component();
        set_indexed_area(component, COMMON_PIN, area)?;
        set_indexed_area(component, ODD_PIN, area)
    }
}

/// SOTFL: flat leads flush with the seating plane instead of gull wings.
pub struct Sotfl;

impl PackageBuilder for Sotfl {
    fn package_type(&self) -> PackageType {
        PackageType::Sotfl
    }

    fn params(&self) -> &'static [ParamSpec] {
        const PARAMS: &[ParamSpec] = &[
            ParamSpec::length("A", 0.05, "body height"),
            ParamSpec::length("E", 0.17, "span"),
            ParamSpec::length("E1", 0.13, "body width"),
            ParamSpec::length("D", 0.17, "body length"),
            ParamSpec::length("e", 0.05, "pitch"),
            ParamSpec::length("e1", 0.05, "pitch"),
            ParamSpec::length("b", 0.03, "terminal length"),
            ParamSpec::length("L", 0.045, "terminal width"),
            ParamSpec::count("DPins", 3, "pins"),
            ParamSpec::length("terminalThickness", FLAT_THICKNESS, "terminal thickness"),
        ];
        PARAMS
    }

    fn derive(&self, resolved: &mut Resolved, params: &ParameterSet) {
        resolved.set_dim("terminalThickness", params.terminal_thickness(FLAT_THICKNESS));
        derive_row_pitches(resolved, params);
    }

    fn create(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let a = resolved.dim("A");
        let span = resolved.dim("E");
        let e1 = resolved.dim("E1");
        let d = resolved.dim("D");
        let tt = resolved.dim("terminalThickness");
        let l = resolved.dim("L");
        let b = resolved.dim("b");
        let (front, back) = rows(resolved.count("DPins"));

        let mut ops = ctx.ops();
        ops.plane("BodyPlaneXy", BasePlane::Xy, Arg::lit(0.0))?;
        let body_sketch = ops.sketch("BodySketch", SketchPlane::offset_from(BasePlane::Xy, 0.0));
        sketch_ops::center_rectangle(ops.sketch_mut(body_sketch), Point2::new(0.0, 0.0), e1, d);
        let profile = ops.rect(Arg::expr(e1, "param_E1"), Arg::expr(d, "param_D"))?;
        let body = ops.extrude(
            "Body",
            profile,
            Arg::expr(a - 0.0001, "param_A - 0.0001"),
            "Body",
            Finish::body(),
        )?;
        ops.chamfer(
            "BodyChamferTop",
            body.body,
            Arg::expr(a / 10.0, "param_A/10"),
            Arg::expr(a - tt, "param_A - param_terminalThickness"),
            Arg::expr(2.0 * (e1 + d), "(param_E1 + param_D) * 2"),
        )?;

        let flat_pin = |ops: &mut Ops<'_>, name: &str, offset: f64| -> GenerateResult<BodyRef> {
            ops.plane(&format!("{name}PlaneXz"), BasePlane::Xz, Arg::lit(offset))?;
            let sketch = ops.sketch(
                &format!("{name}Sketch"),
                SketchPlane::offset_from(BasePlane::Xz, offset),
            );
            sketch_ops::center_rectangle(
                ops.sketch_mut(sketch),
                Point2::new(span / 2.0 - l / 2.0, -tt / 2.0),
                l,
                tt,
            );
            let profile = ops.rect(
                Arg::expr(l, "param_L"),
                Arg::expr(tt, "param_terminalThickness"),
            )?;
            ops.extrude(name, profile, Arg::expr(b, "param_b"), name, Finish::terminal())
        };

        let front_pin = flat_pin(
            &mut ops,
            "FrontPin",
            resolved.dim("e1") * f64::from(front.max(1) - 1) / 2.0,
        )?;
        ops.pattern(
            "PinPattern1",
            &[front_pin.feature],
            front,
            Arg::expr(-resolved.dim("e1"), "-param_e1"),
            1,
            Arg::lit(0.0),
        )?;
        let back_pin = flat_pin(
            &mut ops,
            "BackPin",
            resolved.dim("e") * f64::from(back - 1) / 2.0,
        )?;
        ops.pattern(
            "PinPattern2",
            &[back_pin.feature],
            back,
            Arg::expr(-resolved.dim("e"), "-param_e"),
            1,
            Arg::lit(0.0),
        )?;

        let mark = ops.pin_one_mark(
            body.body,
            Arg::expr(a, "param_A"),
            Arg::expr(0.1 * a, "param_A/10"),
            d,
            e1,
        )?;

        ops.index(FRONT_PIN, front_pin.feature);
        ops.index(BACK_PIN, back_pin.feature);
        ops.index(PIN_ONE_MARK, mark);
        ops.commit()
    }

    fn update(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        // Flat leads are plain rectangles; the expressions carry them.
        set_indexed_radius(ctx.component(), PIN_ONE_MARK, resolved.dim("E1") / 20.0)
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

    fn body_volume(design: &Design, key: FeatureKey) -> f64 {
        let component = design.component(design.root()).unwrap();
        let feature = component.indexed(key).unwrap();
        let body = component.history.get(feature).unwrap().bodies[0];
        component.history.body(body).unwrap().volume
    }

    #[test]
    fn sot23_splits_six_pins_three_and_three() {
        let mut design = Design::new("sot");
        run(&mut design, &Sot23, &ParameterSet::new());

        let component = design.component(design.root()).unwrap();
        assert_eq!(component.history.active_body_count(), 7);

        let expected = 0.013 * ((0.24 - 0.13) / 2.0) * 0.044;
        assert!((body_volume(&design, FRONT_PIN) - expected).abs() < 1e-12);
        assert!((body_volume(&design, BACK_PIN) - expected).abs() < 1e-12);
    }

    #[test]
    fn sot23_two_pin_back_row_doubles_its_pitch() {
        let mut design = Design::new("sot");
        run(&mut design, &Sot23, &ParameterSet::new().with("DPins", 3.0));

        // front 1, back 2: body + 3 leads
        let component = design.component(design.root()).unwrap();
        assert_eq!(component.history.active_body_count(), 4);
        let e = design.parameters.value_of("param_e").unwrap();
        assert!((e - 0.19).abs() < 1e-12);
        let e1 = design.parameters.value_of("param_e1").unwrap();
        assert!((e1 - 0.095).abs() < 1e-12);
    }

    #[test]
    fn sot223_gives_the_tab_its_own_width() {
        let mut design = Design::new("sot");
        run(&mut design, &Sot223, &ParameterSet::new());

        let component = design.component(design.root()).unwrap();
        // body + 3 common pins + tab
        assert_eq!(component.history.active_body_count(), 5);
        let expected = 0.013 * ((0.7 - 0.35) / 2.0) * 0.3;
        assert!((body_volume(&design, ODD_PIN) - expected).abs() < 1e-12);
    }

    #[test]
    fn sot143_wide_terminal_sits_beside_a_normal_one() {
        let mut design = Design::new("sot");
        run(&mut design, &Sot143, &ParameterSet::new());

        let component = design.component(design.root()).unwrap();
        // body + wide pin + 1 front + 2 back
        assert_eq!(component.history.active_body_count(), 5);
        let wide = body_volume(&design, ODD_PIN);
        let normal = body_volume(&design, FRONT_PIN);
        assert!(wide > normal);
        // Double pitch on both two-pin rows.
        let e1 = design.parameters.value_of("param_e1").unwrap();
        assert!((e1 - 0.19).abs() < 1e-12);
    }

    #[test]
    fn sotfl_leads_are_plain_rectangles() {
        let mut design = Design::new("sot");
        run(&mut design, &Sotfl, &ParameterSet::new());

        let component = design.component(design.root()).unwrap();
        // body + 1 front + 2 back
        assert_eq!(component.history.active_body_count(), 4);
        let expected = 0.045 * 0.0275 * 0.03;
        assert!((body_volume(&design, FRONT_PIN) - expected).abs() < 1e-12);

        // A span change moves lead positions, not their volume.
        run(&mut design, &Sotfl, &ParameterSet::new().with("E", 0.2));
        assert!((body_volume(&design, FRONT_PIN) - expected).abs() < 1e-12);
    }
}
