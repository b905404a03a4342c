//! 2D sketch primitives.
//!
//! Builders draw package outlines through these helpers so every family
//! produces the same curve vocabulary: centre-point rectangles, diameter
//! circles, rounded corners, and the two lead cross-sections that surface
//! mount families share. Helpers append curves to an existing [`Sketch`]
//! and, where the outline is irregular, hand back its enclosed area for
//! the solid feature that consumes it.
//!
//! Lead cross-sections use vertical offsetting, so a strip of thickness
//! `t` following a path of horizontal reach `s` encloses exactly `t * s`.
//! That keeps areas exact under the shoelace rule and makes lead volumes
//! reproducible from the inputs alone.

use std::f64::consts::{FRAC_PI_2, PI};

use crate::model::sketch::{Point2, Sketch, SketchText};

/// Lead-frame draft angle from vertical, radians.
const LEAD_SLOPE: f64 = 12.0 * PI / 180.0;

/// Four lines forming a rectangle centred on `center`.
pub fn center_rectangle(sketch: &mut Sketch, center: Point2, width: f64, height: f64) {
    let hw = width.abs() / 2.0;
    let hh = height.abs() / 2.0;
    let a = Point2::new(center.x - hw, center.y - hh);
    let b = Point2::new(center.x + hw, center.y - hh);
    let c = Point2::new(center.x + hw, center.y + hh);
    let d = Point2::new(center.x - hw, center.y + hh);
    sketch.add_line(a, b);
    sketch.add_line(b, c);
    sketch.add_line(c, d);
    sketch.add_line(d, a);
}

/// Four lines forming the rectangle spanned by two opposite corners.
pub fn two_point_rectangle(sketch: &mut Sketch, corner_a: Point2, corner_b: Point2) {
    let center = Point2::new((corner_a.x + corner_b.x) / 2.0, (corner_a.y + corner_b.y) / 2.0);
    center_rectangle(
        sketch,
        center,
        corner_b.x - corner_a.x,
        corner_b.y - corner_a.y,
    );
}

/// A circle given by centre and diameter, matching how package tables
/// quote terminal and ball sizes.
pub fn center_circle(sketch: &mut Sketch, center: Point2, diameter: f64) {
    sketch.add_circle(center, diameter.abs() / 2.0);
}

/// A rectangle with four rounded corners: four lines and four 90 degree
/// arcs. The radius is clamped to half the shorter side.
pub fn rounded_rectangle(sketch: &mut Sketch, center: Point2, width: f64, height: f64, radius: f64) {
    let hw = width.abs() / 2.0;
    let hh = height.abs() / 2.0;
    let r = radius.abs().min(hw).min(hh);
    let (cx, cy) = (center.x, center.y);

    sketch.add_line(
        Point2::new(cx - hw + r, cy - hh),
        Point2::new(cx + hw - r, cy - hh),
    );
    sketch.add_line(
        Point2::new(cx + hw, cy - hh + r),
        Point2::new(cx + hw, cy + hh - r),
    );
    sketch.add_line(
        Point2::new(cx + hw - r, cy + hh),
        Point2::new(cx - hw + r, cy + hh),
    );
    sketch.add_line(
        Point2::new(cx - hw, cy + hh - r),
        Point2::new(cx - hw, cy - hh + r),
    );

    sketch.add_arc(Point2::new(cx + hw - r, cy - hh + r), r, -FRAC_PI_2, FRAC_PI_2);
    sketch.add_arc(Point2::new(cx + hw - r, cy + hh - r), r, 0.0, FRAC_PI_2);
    sketch.add_arc(Point2::new(cx - hw + r, cy + hh - r), r, FRAC_PI_2, FRAC_PI_2);
    sketch.add_arc(Point2::new(cx - hw + r, cy - hh + r), r, PI, FRAC_PI_2);
}

/// A vertical line at `x` spanning `y` symmetric about zero. Splits a
/// centred rectangle into separate profiles, the chip terminal trick.
pub fn vertical_split(sketch: &mut Sketch, x: f64, half_height: f64) {
    sketch.add_line(Point2::new(x, -half_height), Point2::new(x, half_height));
}

/// A horizontal line at `y` spanning `x` symmetric about zero.
pub fn horizontal_split(sketch: &mut Sketch, y: f64, half_width: f64) {
    sketch.add_line(Point2::new(-half_width, y), Point2::new(half_width, y));
}

/// A closed polygon from `points` in order. Returns the enclosed area.
pub fn polygon(sketch: &mut Sketch, points: &[Point2]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    for window in points.windows(2) {
        sketch.add_line(window[0], window[1]);
    }
    sketch.add_line(points[points.len() - 1], points[0]);
    crate::model::sketch::polygon_area(points)
}

/// A semicircular region: one arc and its chord. Returns the enclosed
/// area. Revolving this about the chord produces a ball.
pub fn semicircle(sketch: &mut Sketch, center: Point2, radius: f64) -> f64 {
    let r = radius.abs();
    sketch.add_arc(center, r, 0.0, PI);
    sketch.add_line(
        Point2::new(center.x + r, center.y),
        Point2::new(center.x - r, center.y),
    );
    PI * r * r / 2.0
}

/// A stadium: two semicircular caps joined by straight sides, the
/// outline of metal crystal cans and lids. `length` is end to end, so
/// the straight section spans `length - 2 * radius`. Returns the
/// enclosed area.
pub fn stadium(sketch: &mut Sketch, center: Point2, length: f64, radius: f64) -> f64 {
    let r = radius.abs();
    let c = (length.abs() / 2.0 - r).max(0.0);
    sketch.add_line(
        Point2::new(center.x - c, center.y + r),
        Point2::new(center.x + c, center.y + r),
    );
    sketch.add_arc(Point2::new(center.x + c, center.y), r, -FRAC_PI_2, PI);
    sketch.add_line(
        Point2::new(center.x + c, center.y - r),
        Point2::new(center.x - c, center.y - r),
    );
    sketch.add_arc(Point2::new(center.x - c, center.y), r, FRAC_PI_2, PI);
    stadium_area(length, radius)
}

/// Area of the stadium outline `stadium` draws.
pub fn stadium_area(length: f64, radius: f64) -> f64 {
    let r = radius.abs();
    let c = (length.abs() / 2.0 - r).max(0.0);
    PI.mul_add(r * r, 4.0 * c * r)
}

/// A circular segment: the slice of a disc beyond a vertical chord
/// `offset` right of the centre, the shape of a polarity stripe on a
/// capacitor top. One arc and the chord. Returns the enclosed area.
pub fn circular_segment(sketch: &mut Sketch, center: Point2, radius: f64, offset: f64) -> f64 {
    let r = radius.abs();
    let h = offset.clamp(-r, r);
    let half_chord = (r * r - h * h).sqrt();
    let theta = (h / r).acos();
    sketch.add_arc(center, r, -theta, 2.0 * theta);
    sketch.add_line(
        Point2::new(center.x + h, center.y + half_chord),
        Point2::new(center.x + h, center.y - half_chord),
    );
    segment_area(radius, offset)
}

/// Area of the segment outline `circular_segment` draws.
pub fn segment_area(radius: f64, offset: f64) -> f64 {
    let r = radius.abs();
    let h = offset.clamp(-r, r);
    (r * r).mul_add((h / r).acos(), -h * (r * r - h * h).sqrt())
}

/// Side outline of a gull-wing lead, drawn from the toe tip towards the
/// body. `span` is the horizontal reach, `height` the shoulder top above
/// the seating plane, `thickness` the lead metal thickness. Returns the
/// enclosed area, which is `thickness * span` by construction.
///
/// `direction` is `1.0` for a lead reaching in +X and `-1.0` for -X.
pub fn gullwing_outline(
    sketch: &mut Sketch,
    origin: Point2,
    direction: f64,
    span: f64,
    height: f64,
    thickness: f64,
    foot: f64,
) -> f64 {
    let span = span.abs();
    let thickness = thickness.abs().min(height.abs());
    let rise = (height.abs() - thickness).max(0.0);
    let run = (rise * LEAD_SLOPE.tan()).min(span);
    let foot = foot.abs().min(span - run);
    let sign: f64 = if direction < 0.0 { -1.0 } else { 1.0 };

    let at = |x: f64, y: f64| Point2::new(sign.mul_add(x, origin.x), origin.y + y);
    let points = [
        at(0.0, 0.0),
        at(foot, 0.0),
        at(foot + run, rise),
        at(span, rise),
        at(span, rise + thickness),
        at(foot + run, rise + thickness),
        at(foot, thickness),
        at(0.0, thickness),
    ];
    polygon(sketch, &points)
}

/// Section of a J-lead, drawn as the two profiles the lead extrudes
/// from: a half-turn hook hugging the seating plane and an L-shaped
/// riser that climbs the outer face and shoulders into the body side
/// at `mid_height`. The profiles stay separate because the hook is
/// extruded narrower than the shoulder. Returns `(hook_area,
/// riser_area)`.
pub fn jlead_outline(
    sketch: &mut Sketch,
    span: f64,
    body_width: f64,
    weld_space: f64,
    mid_height: f64,
    thickness: f64,
) -> (f64, f64) {
    let t = thickness.abs();
    let outer = ((span - weld_space) / 2.0).abs().max(t);
    let inner = outer - t;
    let center = Point2::new(weld_space / 2.0, outer);

    // Hook: two half-turns under the centre line, closed by the stubs
    // the riser does not cover.
    sketch.add_arc(center, outer, PI, PI);
    sketch.add_arc(center, inner, PI, PI);
    sketch.add_line(
        Point2::new(center.x - outer, outer),
        Point2::new(center.x - inner, outer),
    );
    sketch.add_line(
        Point2::new(center.x + inner, outer),
        Point2::new(center.x + outer, outer),
    );

    // Riser: outer face on the span, shoulder arm back to the body.
    let top = mid_height + t;
    sketch.add_line(Point2::new(span / 2.0, outer), Point2::new(span / 2.0, top));
    sketch.add_line(
        Point2::new(span / 2.0 - t, outer),
        Point2::new(span / 2.0 - t, mid_height),
    );
    sketch.add_line(
        Point2::new(span / 2.0, top),
        Point2::new(body_width / 2.0, top),
    );
    sketch.add_line(
        Point2::new(span / 2.0 - t, mid_height),
        Point2::new(body_width / 2.0, mid_height),
    );
    sketch.add_line(
        Point2::new(body_width / 2.0, mid_height),
        Point2::new(body_width / 2.0, top),
    );

    (
        jlead_hook_area(span, weld_space, thickness),
        jlead_riser_area(span, body_width, weld_space, mid_height, thickness),
    )
}

/// Area of the hook profile `jlead_outline` draws.
pub fn jlead_hook_area(span: f64, weld_space: f64, thickness: f64) -> f64 {
    let t = thickness.abs();
    let outer = ((span - weld_space) / 2.0).abs().max(t);
    let inner = outer - t;
    PI / 2.0 * (outer * outer - inner * inner)
}

/// Area of the riser profile `jlead_outline` draws.
pub fn jlead_riser_area(
    span: f64,
    body_width: f64,
    weld_space: f64,
    mid_height: f64,
    thickness: f64,
) -> f64 {
    let t = thickness.abs();
    let outer = ((span - weld_space) / 2.0).abs().max(t);
    t * (mid_height + t - outer) + t * ((span - body_width) / 2.0 - t)
}

/// Centre-line path of one formed axial lead: out from the barrel end at
/// the exit height, a quarter bend, then straight down past the board.
/// The partner lead is the mirrored copy of the sweep that follows this.
/// Returns the path length.
pub fn axial_lead_path(
    sketch: &mut Sketch,
    body_width: f64,
    span: f64,
    height: f64,
    drop: f64,
    bend_radius: f64,
) -> f64 {
    let run = (span.abs() - body_width.abs()) / 2.0;
    let drop = drop.abs();
    let r = bend_radius.abs().min(run).min(drop);

    sketch.add_line(
        Point2::new(body_width / 2.0, height),
        Point2::new(span / 2.0 - r, height),
    );
    sketch.add_arc(Point2::new(span / 2.0 - r, height - r), r, 0.0, FRAC_PI_2);
    sketch.add_line(
        Point2::new(span / 2.0, height - r),
        Point2::new(span / 2.0, height - drop),
    );

    FRAC_PI_2.mul_add(r, run - r) + (drop - r)
}

/// A text annotation, e.g. the polarity legend on an electrolytic body.
pub fn annotation(sketch: &mut Sketch, text: impl Into<String>, height: f64, position: Point2) {
    sketch.add_text(SketchText {
        text: text.into(),
        height,
        position,
    });
}
