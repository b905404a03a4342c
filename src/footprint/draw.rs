//! Land-pattern drawing.
//!
//! Turns parsed package elements into sketch curves using the same 2D
//! vocabulary the solid builders draw with. Every coordinate arrives in
//! millimetres and is converted to the document unit on the way in.
//! Silkscreen and legend primitives are filtered against [`LayerSet`];
//! pads always draw.

use std::f64::consts::FRAC_PI_2;

use crate::generator::sketch_ops;
use crate::model::sketch::{Point2, Sketch, SketchCurve, SketchText};
use crate::model::units::mm;

use super::xml::{
    LayerSet, LegendText, PadShape, SilkCircle, SilkWire, SmdPad, TextAlign, ThruHolePad,
};

/// Advance width of one glyph relative to the cap height. Legend text is
/// centred with this estimate; no font metrics are consulted.
const GLYPH_ASPECT: f64 = 0.6;

/// Draws a surface-mount pad: a circle when a square pad is fully rounded,
/// a rounded rectangle when a roundness is given, a plain rectangle
/// otherwise.
pub fn smd_pad(sketch: &mut Sketch, pad: &SmdPad) {
    let centre = Point2::new(mm(pad.x), mm(pad.y));
    let (w, h) = (mm(pad.dx), mm(pad.dy));

    match pad.roundness {
        // Circular pads arrive as fully rounded squares.
        Some(100) if (pad.dx - pad.dy).abs() < f64::EPSILON => {
            sketch_ops::center_circle(sketch, centre, w);
        }
        Some(roundness) => {
            let fillet = (w.min(h) / 2.0) * f64::from(roundness) / 100.0;
            let tail = sketch.curves.len();
            sketch_ops::rounded_rectangle(sketch, centre, w, h, fillet);
            if let Some(degrees) = pad.rotation {
                rotate_curves(&mut sketch.curves[tail..], centre, degrees);
            }
        }
        None => diagonal_rectangle(sketch, centre, w, h, pad.rotation),
    }
}

/// Draws a through-hole pad: a drill outline when the drill diameter is
/// non-zero, plus a square or round land.
pub fn thru_hole_pad(sketch: &mut Sketch, pad: &ThruHolePad) {
    let centre = Point2::new(mm(pad.x), mm(pad.y));
    let drill = mm(pad.drill);
    let land = mm(pad.diameter);

    if drill > 0.0 {
        sketch_ops::center_circle(sketch, centre, drill);
    }
    match pad.shape {
        PadShape::Square => diagonal_rectangle(sketch, centre, land, land, pad.rotation),
        PadShape::Round => sketch_ops::center_circle(sketch, centre, land),
    }
}

/// Draws a silkscreen wire: a straight line, or the circular arc that
/// subtends the wire's curve angle between its endpoints.
pub fn silk_wire(sketch: &mut Sketch, wire: &SilkWire) {
    if !LayerSet::is_drawn(wire.layer) {
        return;
    }
    let p1 = Point2::new(mm(wire.x1), mm(wire.y1));
    let p2 = Point2::new(mm(wire.x2), mm(wire.y2));

    match wire.curve {
        None => sketch.add_line(p1, p2),
        Some(degrees) => {
            // The arc is anchored at the second endpoint and swept back to
            // the first; a negative angle flips it across the chord.
            let arc_angle = degrees.to_radians();
            let chord = p1.distance_to(&p2);
            let chord_angle = (p1.y - p2.y).atan2(p1.x - p2.x);
            let radius = chord / (2.0 * (arc_angle / 2.0).sin());
            let to_centre = FRAC_PI_2 - arc_angle / 2.0 - chord_angle;
            let centre = Point2::new(
                radius.mul_add(to_centre.cos(), p2.x),
                radius.mul_add(-to_centre.sin(), p2.y),
            );
            let start = (p2.y - centre.y).atan2(p2.x - centre.x);
            sketch.add_arc(centre, radius.abs(), start, -arc_angle);
        }
    }
}

/// Draws a silkscreen circle.
pub fn silk_circle(sketch: &mut Sketch, circle: &SilkCircle) {
    if !LayerSet::is_drawn(circle.layer) {
        return;
    }
    sketch.add_circle(Point2::new(mm(circle.x), mm(circle.y)), mm(circle.radius));
}

/// Draws a legend text entry, anchored per its alignment and centred
/// horizontally on its estimated width.
pub fn legend_text(sketch: &mut Sketch, text: &LegendText) {
    if !LayerSet::is_drawn(text.layer) {
        return;
    }
    let height = mm(text.size);
    let mut y = mm(text.y);
    if text.align == TextAlign::TopCenter {
        y -= height;
    }
    let width = GLYPH_ASPECT * height * text.value.chars().count() as f64;
    sketch.add_text(SketchText {
        text: text.value.clone(),
        height,
        position: Point2::new(mm(text.x) - width / 2.0, y),
    });
}

/// Axis-aligned rectangle spanned by two diagonal corners, the corners
/// turned by the rotation first. Quarter turns swap the side lengths;
/// anything else shrinks the diagonal, matching the host's two-point
/// rectangle under the same transform.
fn diagonal_rectangle(
    sketch: &mut Sketch,
    centre: Point2,
    width: f64,
    height: f64,
    rotation: Option<f64>,
) {
    let mut a = Point2::new(centre.x - width / 2.0, centre.y - height / 2.0);
    let mut b = Point2::new(centre.x + width / 2.0, centre.y + height / 2.0);
    if let Some(degrees) = rotation {
        a = rotated(a, centre, degrees);
        b = rotated(b, centre, degrees);
    }
    sketch_ops::two_point_rectangle(sketch, a, b);
}

/// Rotates `point` about `origin`, degrees counterclockwise.
fn rotated(point: Point2, origin: Point2, degrees: f64) -> Point2 {
    let (sin, cos) = degrees.to_radians().sin_cos();
    let dx = point.x - origin.x;
    let dy = point.y - origin.y;
    Point2::new(
        dx.mul_add(cos, dy.mul_add(-sin, origin.x)),
        dx.mul_add(sin, dy.mul_add(cos, origin.y)),
    )
}

/// Rigidly rotates a run of curves about `origin`.
fn rotate_curves(curves: &mut [SketchCurve], origin: Point2, degrees: f64) {
    for curve in curves {
        match curve {
            SketchCurve::Line { start, end } => {
                *start = rotated(*start, origin, degrees);
                *end = rotated(*end, origin, degrees);
            }
            SketchCurve::Arc {
                center,
                start_angle,
                ..
            } => {
                *center = rotated(*center, origin, degrees);
                *start_angle += degrees.to_radians();
            }
            SketchCurve::Circle { center, .. } => {
                *center = rotated(*center, origin, degrees);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use super::*;
    use crate::model::sketch::SketchPlane;

    fn sketch() -> Sketch {
        Sketch::new("Pad", SketchPlane::default())
    }

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    fn bounds(sketch: &Sketch) -> (f64, f64, f64, f64) {
        let mut b = (f64::MAX, f64::MIN, f64::MAX, f64::MIN);
        for curve in &sketch.curves {
            if let SketchCurve::Line { start, end } = curve {
                for p in [start, end] {
                    b.0 = b.0.min(p.x);
                    b.1 = b.1.max(p.x);
                    b.2 = b.2.min(p.y);
                    b.3 = b.3.max(p.y);
                }
            }
        }
        b
    }

    #[test]
    fn fully_rounded_square_pad_is_one_circle() {
        let mut s = sketch();
        smd_pad(
            &mut s,
            &SmdPad {
                x: 1.0,
                y: -1.0,
                dx: 0.5,
                dy: 0.5,
                rotation: None,
                roundness: Some(100),
            },
        );
        assert_eq!(s.curve_count(), 1);
        let (centre, radius) = s.circles().next().unwrap();
        assert!(approx_eq(radius, 0.025));
        assert!(approx_eq(centre.x, 0.1));
        assert!(approx_eq(centre.y, -0.1));
    }

    #[test]
    fn fully_rounded_oblong_pad_stays_a_rounded_rectangle() {
        let mut s = sketch();
        smd_pad(
            &mut s,
            &SmdPad {
                x: 0.0,
                y: 0.0,
                dx: 1.0,
                dy: 0.5,
                rotation: None,
                roundness: Some(100),
            },
        );
        assert_eq!(s.line_count(), 4);
        assert_eq!(s.arc_count(), 4);
    }

    #[test]
    fn rounded_pad_fillets_scale_with_roundness() {
        let mut s = sketch();
        smd_pad(
            &mut s,
            &SmdPad {
                x: 0.0,
                y: 0.0,
                dx: 1.0,
                dy: 0.6,
                rotation: None,
                roundness: Some(50),
            },
        );
        assert_eq!(s.line_count(), 4);
        assert_eq!(s.arc_count(), 4);
        for curve in &s.curves {
            if let SketchCurve::Arc { radius, sweep, .. } = curve {
                // Half of the short half-side: 0.3 mm -> 0.015 cm.
                assert!(approx_eq(*radius, 0.015));
                assert!(approx_eq(*sweep, FRAC_PI_2));
            }
        }
    }

    #[test]
    fn rotated_rounded_pad_turns_rigidly() {
        let mut flat = sketch();
        let mut turned = sketch();
        let pad = SmdPad {
            x: 2.0,
            y: 0.0,
            dx: 1.0,
            dy: 0.6,
            rotation: None,
            roundness: Some(40),
        };
        smd_pad(&mut flat, &pad);
        smd_pad(
            &mut turned,
            &SmdPad {
                rotation: Some(90.0),
                ..pad
            },
        );

        // Rotating the flat drawing by hand reproduces the turned one.
        let origin = Point2::new(0.2, 0.0);
        rotate_curves(&mut flat.curves, origin, 90.0);
        for (a, b) in flat.curves.iter().zip(&turned.curves) {
            match (a, b) {
                (
                    SketchCurve::Line { start, end },
                    SketchCurve::Line {
                        start: ts,
                        end: te,
                    },
                ) => {
                    assert!(approx_eq(start.x, ts.x) && approx_eq(start.y, ts.y));
                    assert!(approx_eq(end.x, te.x) && approx_eq(end.y, te.y));
                }
                (
                    SketchCurve::Arc {
                        center,
                        start_angle,
                        ..
                    },
                    SketchCurve::Arc {
                        center: tc,
                        start_angle: ta,
                        ..
                    },
                ) => {
                    assert!(approx_eq(center.x, tc.x) && approx_eq(center.y, tc.y));
                    assert!(approx_eq(*start_angle, *ta));
                }
                _ => panic!("curve kinds diverged"),
            }
        }
    }

    #[test]
    fn plain_pad_quarter_turn_swaps_the_sides() {
        let mut s = sketch();
        smd_pad(
            &mut s,
            &SmdPad {
                x: 0.0,
                y: 0.0,
                dx: 1.0,
                dy: 0.5,
                rotation: Some(90.0),
                roundness: None,
            },
        );
        assert_eq!(s.line_count(), 4);
        let (min_x, max_x, min_y, max_y) = bounds(&s);
        assert!(approx_eq(max_x - min_x, 0.05));
        assert!(approx_eq(max_y - min_y, 0.1));
    }

    #[test]
    fn square_land_matches_the_pad_diameter() {
        let mut s = sketch();
        thru_hole_pad(
            &mut s,
            &ThruHolePad {
                x: 0.0,
                y: 0.0,
                drill: 0.6,
                diameter: 1.2,
                shape: PadShape::Square,
                rotation: None,
            },
        );
        assert_eq!(s.circle_count(), 1);
        assert_eq!(s.line_count(), 4);
        let (_, radius) = s.circles().next().unwrap();
        assert!(approx_eq(radius, 0.03));
        let (min_x, max_x, min_y, max_y) = bounds(&s);
        assert!(approx_eq(max_x - min_x, 0.12));
        assert!(approx_eq(max_y - min_y, 0.12));
    }

    #[test]
    fn zero_drill_skips_the_drill_outline() {
        let mut s = sketch();
        thru_hole_pad(
            &mut s,
            &ThruHolePad {
                x: 0.0,
                y: 0.0,
                drill: 0.0,
                diameter: 1.0,
                shape: PadShape::Round,
                rotation: None,
            },
        );
        assert_eq!(s.curve_count(), 1);
        let (_, radius) = s.circles().next().unwrap();
        assert!(approx_eq(radius, 0.05));
    }

    #[test]
    fn curved_wire_subtends_its_angle() {
        let mut s = sketch();
        silk_wire(
            &mut s,
            &SilkWire {
                x1: 0.0,
                y1: 0.0,
                x2: 1.0,
                y2: 0.0,
                layer: 21,
                curve: Some(90.0),
            },
        );
        assert_eq!(s.arc_count(), 1);
        let SketchCurve::Arc {
            center,
            radius,
            start_angle,
            sweep,
        } = &s.curves[0]
        else {
            panic!("expected an arc");
        };
        assert!(approx_eq(center.x, 0.05));
        assert!(approx_eq(center.y, 0.05));
        assert!(approx_eq(*radius, 0.1 / (2.0 * (FRAC_PI_2 / 2.0).sin())));
        assert!(approx_eq(*sweep, -FRAC_PI_2));
        // The sweep lands on the first endpoint.
        let end = Point2::new(
            radius.mul_add((start_angle + sweep).cos(), center.x),
            radius.mul_add((start_angle + sweep).sin(), center.y),
        );
        assert!(end.distance_to(&Point2::new(0.0, 0.0)) < 1e-12);
    }

    #[test]
    fn negative_curve_bows_the_other_way() {
        let mut up = sketch();
        let mut down = sketch();
        let wire = SilkWire {
            x1: 0.0,
            y1: 0.0,
            x2: 1.0,
            y2: 0.0,
            layer: 21,
            curve: Some(90.0),
        };
        silk_wire(&mut up, &wire);
        silk_wire(
            &mut down,
            &SilkWire {
                curve: Some(-90.0),
                ..wire
            },
        );
        let (SketchCurve::Arc { center: a, .. }, SketchCurve::Arc { center: b, .. }) =
            (&up.curves[0], &down.curves[0])
        else {
            panic!("expected arcs");
        };
        assert!(approx_eq(a.y, -b.y));
        assert!(approx_eq(a.x, b.x));
    }

    #[test]
    fn off_layer_silkscreen_is_skipped() {
        let mut s = sketch();
        silk_wire(
            &mut s,
            &SilkWire {
                x1: 0.0,
                y1: 0.0,
                x2: 1.0,
                y2: 0.0,
                layer: 22,
                curve: None,
            },
        );
        silk_circle(
            &mut s,
            &SilkCircle {
                x: 0.0,
                y: 0.0,
                radius: 1.0,
                layer: 39,
            },
        );
        assert_eq!(s.curve_count(), 0);

        silk_circle(
            &mut s,
            &SilkCircle {
                x: 0.0,
                y: 0.0,
                radius: 1.0,
                layer: 21,
            },
        );
        assert_eq!(s.circle_count(), 1);
    }

    #[test]
    fn top_aligned_text_drops_by_its_height() {
        let mut s = sketch();
        legend_text(
            &mut s,
            &LegendText {
                x: 0.0,
                y: 2.0,
                size: 1.0,
                layer: 25,
                align: TextAlign::TopCenter,
                value: ">NAME".to_string(),
            },
        );
        let text = &s.texts[0];
        assert!(approx_eq(text.height, 0.1));
        assert!(approx_eq(text.position.y, 0.1));
        // Centred on x with five glyphs of estimated width.
        assert!(approx_eq(text.position.x, -(0.6 * 0.1 * 5.0) / 2.0));
    }

    #[test]
    fn bottom_aligned_text_keeps_its_anchor_height() {
        let mut s = sketch();
        legend_text(
            &mut s,
            &LegendText {
                x: 0.0,
                y: -1.5,
                size: 0.5,
                layer: 27,
                align: TextAlign::BottomCenter,
                value: ">VALUE".to_string(),
            },
        );
        assert!(approx_eq(s.texts[0].position.y, -0.15));
    }
}
