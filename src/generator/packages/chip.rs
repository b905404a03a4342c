//! Two-terminal chip resistors and capacitors.
//!
//! The smallest family: one sketch split into three profiles by two vertical
//! lines, extruded to the body height as a ceramic centre flanked by two tin
//! end caps. The end caps get a light corner fillet. A colour refresh is the
//! only cosmetic the update path patches; everything else is carried by the
//! driven dimensions.

use crate::error::GenerateResult;
use crate::generator::context::BuildContext;
use crate::generator::feature_ops::{recolour_indexed, Arg};
use crate::generator::framework::{PackageBuilder, ParamSpec, Resolved};
use crate::generator::packages::PackageType;
use crate::generator::params::ParameterSet;
use crate::generator::sketch_ops;
use crate::model::material::{Finish, Material};
use crate::model::{BasePlane, FeatureKey, Point2, SketchPlane};

const BODY: FeatureKey = FeatureKey("chip_body");

/// End-cap corner fillet, capped at 40 micrometres.
fn fillet_radius(terminal_width: f64) -> f64 {
    (0.08 * terminal_width).min(0.004)
}

pub struct Chip;

impl PackageBuilder for Chip {
    fn package_type(&self) -> PackageType {
        PackageType::Chip
    }

    fn params(&self) -> &'static [ParamSpec] {
        const PARAMS: &[ParamSpec] = &[
            ParamSpec::length("A", 0.07, "body height"),
            ParamSpec::length("E", 0.18, "body width"),
            ParamSpec::length("D", 0.34, "body length"),
            ParamSpec::length("L", 0.075, "normal terminal width"),
            ParamSpec::length("L1", 0.075, "odd terminal width"),
        ];
        PARAMS
    }

    fn derive(&self, resolved: &mut Resolved, _params: &ParameterSet) {
        // End caps may not overlap; grow the body instead.
        let caps = resolved.dim("L") + resolved.dim("L1");
        if resolved.dim("D") < caps {
            resolved.set_dim("D", caps + 0.01);
        }
    }

    fn create(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        let a = resolved.dim("A");
        let e = resolved.dim("E");
        let d = resolved.dim("D");
        let l = resolved.dim("L");
        let l1 = resolved.dim("L1");
        let rgb = resolved.rgb();

        let mut ops = ctx.ops();
        let sketch = ops.sketch("BodySketch", SketchPlane::offset_from(BasePlane::Xy, 0.0));
        {
            let sketch = ops.sketch_mut(sketch);
            sketch_ops::center_rectangle(sketch, Point2::new(0.0, 0.0), d, e);
            sketch_ops::vertical_split(sketch, d / 2.0 - l1, e / 2.0);
            sketch_ops::vertical_split(sketch, -d / 2.0 + l, e / 2.0);
        }

        let height = Arg::expr(a, "param_A");
        let odd_profile = ops.rect(Arg::expr(l1, "param_L1"), Arg::expr(e, "param_E"))?;
        let odd = ops.extrude("OddTerminal", odd_profile, height, "Terminal1", Finish::terminal())?;
        let even_profile = ops.rect(Arg::expr(l, "param_L"), Arg::expr(e, "param_E"))?;
        let even = ops.extrude("EvenTerminal", even_profile, height, "Terminal2", Finish::terminal())?;
        let body_profile = ops.rect(
            Arg::expr(d - l - l1, "param_D - param_L - param_L1"),
            Arg::expr(e, "param_E"),
        )?;
        let body = ops.extrude(
            "Body",
            body_profile,
            height,
            "ChipBody",
            Finish::of(Material::Ceramic).with_rgb(rgb),
        )?;

        let radius = fillet_radius(l);
        let edges = Arg::expr(4.0 * a, "param_A * 4");
        ops.fillet("OddTerminalFillet", odd.body, Arg::lit(radius), edges)?;
        ops.fillet("EvenTerminalFillet", even.body, Arg::lit(radius), edges)?;

        ops.index(BODY, body.feature);
        ops.commit()
    }

    fn update(&self, ctx: &mut BuildContext<'_>, resolved: &Resolved) -> GenerateResult<()> {
        recolour_indexed(ctx.component(), BODY, resolved.rgb())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::generator::framework::drive;
    use crate::model::material::Rgb;
    use crate::model::Design;
    use std::f64::consts::PI;

    fn run(design: &mut Design, params: &ParameterSet) {
        let root = design.root();
        let config = Config::default();
        let mut ctx = BuildContext::new(design, root, &config).unwrap();
        drive(&mut ctx, &Chip, params).unwrap();
    }

    #[test]
    fn three_bodies_and_five_parameters() {
        let mut design = Design::new("chip");
        run(&mut design, &ParameterSet::new());

        assert_eq!(design.parameters.len(), 5);
        for key in ["param_A", "param_E", "param_D", "param_L", "param_L1"] {
            assert!(design.parameters.contains(key), "missing {key}");
        }

        let component = design.component(design.root()).unwrap();
        assert_eq!(component.history.active_body_count(), 3);

        let fillet = (1.0 - PI / 4.0) * 0.004 * 0.004 * (4.0 * 0.07);
        let expected = 0.34 * 0.18 * 0.07 - 2.0 * fillet;
        assert!((component.history.total_volume() - expected).abs() < 1e-9);
    }

    #[test]
    fn body_grows_when_end_caps_overlap() {
        let mut design = Design::new("chip");
        run(
            &mut design,
            &ParameterSet::new()
                .with("D", 0.1)
                .with("L", 0.075)
                .with("L1", 0.075),
        );

        // 0.075 + 0.075 + 0.01
        let d = design.parameters.value_of("param_D").unwrap();
        assert!((d - 0.16).abs() < 1e-12);
    }

    #[test]
    fn colour_refresh_leaves_geometry_alone() {
        let mut design = Design::new("chip");
        run(&mut design, &ParameterSet::new());
        let before = design.component(design.root()).unwrap().history.len();

        run(
            &mut design,
            &ParameterSet::new()
                .with("color_r", 120.0)
                .with("color_g", 30.0)
                .with("color_b", 15.0),
        );

        let component = design.component(design.root()).unwrap();
        assert_eq!(component.history.len(), before);
        let body = crate::generator::feature_ops::indexed_body(component, BODY).unwrap();
        assert_eq!(
            component.history.body(body).unwrap().finish.rgb,
            Some(Rgb::new(120, 30, 15))
        );
    }

    #[test]
    fn height_update_rescales_every_solid() {
        let mut design = Design::new("chip");
        run(&mut design, &ParameterSet::new());
        run(&mut design, &ParameterSet::new().with("A", 0.14));

        let component = design.component(design.root()).unwrap();
        let fillet = (1.0 - PI / 4.0) * 0.004 * 0.004 * (4.0 * 0.14);
        let expected = 0.34 * 0.18 * 0.14 - 2.0 * fillet;
        assert!((component.history.total_volume() - expected).abs() < 1e-9);
    }
}
