//! Sketches: 2D curve collections on a construction plane.
//!
//! A sketch holds the curves a feature consumes (extrude, revolve, sweep) or
//! that stand on their own as drawn output (footprint pad and silkscreen
//! art). Profiles are the closed regions of a sketch; the generator works
//! with analytic profile areas rather than a full region solver, which is
//! enough to derive body volumes and drive the regeneration checks.

use serde::{Deserialize, Serialize};

/// A point in sketch coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2 {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Point2 {
    /// Creates a point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance_to(&self, other: &Self) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// The base construction plane a sketch sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BasePlane {
    /// The XY plane (board plane).
    #[default]
    Xy,
    /// The XZ plane.
    Xz,
    /// The YZ plane.
    Yz,
}

/// A sketch plane: a base plane plus a normal offset.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SketchPlane {
    /// The base construction plane.
    pub base: BasePlane,
    /// Offset along the plane normal, internal units.
    pub offset: f64,
}

impl SketchPlane {
    /// A plane at the given offset above the base.
    #[must_use]
    pub const fn offset_from(base: BasePlane, offset: f64) -> Self {
        Self { base, offset }
    }
}

/// One curve in a sketch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SketchCurve {
    /// A straight segment.
    Line {
        /// Start point.
        start: Point2,
        /// End point.
        end: Point2,
    },
    /// A circular arc swept from `start_angle` by `sweep`, radians.
    /// Negative sweep runs clockwise.
    Arc {
        /// Arc centre.
        center: Point2,
        /// Arc radius.
        radius: f64,
        /// Angle of the start point, radians from +X.
        start_angle: f64,
        /// Signed sweep angle, radians.
        sweep: f64,
    },
    /// A full circle.
    Circle {
        /// Circle centre.
        center: Point2,
        /// Circle radius.
        radius: f64,
    },
}

impl SketchCurve {
    /// Arc length of the curve.
    #[must_use]
    pub fn length(&self) -> f64 {
        match self {
            Self::Line { start, end } => start.distance_to(end),
            Self::Arc { radius, sweep, .. } => radius * sweep.abs(),
            Self::Circle { radius, .. } => std::f64::consts::TAU * radius,
        }
    }
}

/// A text entry in a sketch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SketchText {
    /// The text content.
    pub text: String,
    /// Cap height, internal units.
    pub height: f64,
    /// Position of the lower-left corner after alignment.
    pub position: Point2,
}

/// A closed region of a sketch with a known area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Enclosed area, internal units squared.
    pub area: f64,
}

impl Profile {
    /// Profile of a plain rectangle.
    #[must_use]
    pub fn rectangle(width: f64, height: f64) -> Self {
        Self {
            area: (width * height).abs(),
        }
    }

    /// Profile of a rectangle with four rounded corners.
    #[must_use]
    pub fn rounded_rectangle(width: f64, height: f64, radius: f64) -> Self {
        let r = radius.abs().min(width.abs() / 2.0).min(height.abs() / 2.0);
        Self {
            area: (width * height).abs() - (4.0 - std::f64::consts::PI) * r * r,
        }
    }

    /// Profile of a circle.
    #[must_use]
    pub fn circle(radius: f64) -> Self {
        Self {
            area: std::f64::consts::PI * radius * radius,
        }
    }

    /// Profile of a simple polygon given its vertices in order.
    #[must_use]
    pub fn polygon(points: &[Point2]) -> Self {
        Self {
            area: polygon_area(points),
        }
    }

    /// Profile with an explicitly computed area.
    #[must_use]
    pub const fn with_area(area: f64) -> Self {
        Self { area }
    }
}

/// Shoelace area of a simple polygon.
#[must_use]
pub fn polygon_area(points: &[Point2]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0;
    for i in 0..points.len() {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        twice_area += a.x.mul_add(b.y, -(b.x * a.y));
    }
    (twice_area / 2.0).abs()
}

/// A named sketch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sketch {
    /// Display name.
    pub name: String,
    /// The plane the sketch sits on.
    pub plane: SketchPlane,
    /// Curves in draw order.
    pub curves: Vec<SketchCurve>,
    /// Text entries.
    pub texts: Vec<SketchText>,
    /// Closed profiles available to features.
    pub profiles: Vec<Profile>,
}

impl Sketch {
    /// Creates an empty sketch on a plane.
    #[must_use]
    pub fn new(name: impl Into<String>, plane: SketchPlane) -> Self {
        Self {
            name: name.into(),
            plane,
            curves: Vec::new(),
            texts: Vec::new(),
            profiles: Vec::new(),
        }
    }

    /// Appends a line between two points.
    pub fn add_line(&mut self, start: Point2, end: Point2) {
        self.curves.push(SketchCurve::Line { start, end });
    }

    /// Appends an arc.
    pub fn add_arc(&mut self, center: Point2, radius: f64, start_angle: f64, sweep: f64) {
        self.curves.push(SketchCurve::Arc {
            center,
            radius,
            start_angle,
            sweep,
        });
    }

    /// Appends a full circle.
    pub fn add_circle(&mut self, center: Point2, radius: f64) {
        self.curves.push(SketchCurve::Circle { center, radius });
    }

    /// Appends a text entry.
    pub fn add_text(&mut self, text: SketchText) {
        self.texts.push(text);
    }

    /// Registers a closed profile and returns its index.
    pub fn add_profile(&mut self, profile: Profile) -> usize {
        self.profiles.push(profile);
        self.profiles.len() - 1
    }

    /// Removes every curve, text and profile, keeping the sketch itself.
    pub fn clear(&mut self) {
        self.curves.clear();
        self.texts.clear();
        self.profiles.clear();
    }

    /// Total number of curves.
    #[must_use]
    pub fn curve_count(&self) -> usize {
        self.curves.len()
    }

    /// Number of full circles among the curves.
    #[must_use]
    pub fn circle_count(&self) -> usize {
        self.curves
            .iter()
            .filter(|c| matches!(c, SketchCurve::Circle { .. }))
            .count()
    }

    /// Number of straight segments among the curves.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.curves
            .iter()
            .filter(|c| matches!(c, SketchCurve::Line { .. }))
            .count()
    }

    /// Number of arcs among the curves.
    #[must_use]
    pub fn arc_count(&self) -> usize {
        self.curves
            .iter()
            .filter(|c| matches!(c, SketchCurve::Arc { .. }))
            .count()
    }

    /// The circles in draw order, as (centre, radius) pairs.
    pub fn circles(&self) -> impl Iterator<Item = (Point2, f64)> + '_ {
        self.curves.iter().filter_map(|c| match c {
            SketchCurve::Circle { center, radius } => Some((*center, *radius)),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn polygon_area_shoelace() {
        let square = [
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 2.0),
            Point2::new(0.0, 2.0),
        ];
        assert!(approx_eq(polygon_area(&square), 4.0));
        // Winding direction does not change the magnitude.
        let reversed: Vec<_> = square.iter().rev().copied().collect();
        assert!(approx_eq(polygon_area(&reversed), 4.0));
    }

    #[test]
    fn rounded_rectangle_area() {
        // Radius zero degenerates to the plain rectangle.
        assert!(approx_eq(
            Profile::rounded_rectangle(2.0, 1.0, 0.0).area,
            2.0
        ));
        // Full rounding of a square degenerates to the inscribed circle.
        let p = Profile::rounded_rectangle(2.0, 2.0, 1.0);
        assert!(approx_eq(p.area, std::f64::consts::PI));
    }

    #[test]
    fn curve_counting() {
        let mut sketch = Sketch::new("Pad", SketchPlane::default());
        sketch.add_circle(Point2::default(), 0.025);
        sketch.add_line(Point2::new(0.0, 0.0), Point2::new(1.0, 0.0));
        sketch.add_arc(Point2::default(), 1.0, 0.0, std::f64::consts::PI);
        assert_eq!(sketch.curve_count(), 3);
        assert_eq!(sketch.circle_count(), 1);
        assert_eq!(sketch.line_count(), 1);
        assert_eq!(sketch.arc_count(), 1);
        sketch.clear();
        assert_eq!(sketch.curve_count(), 0);
    }

    #[test]
    fn arc_length() {
        let arc = SketchCurve::Arc {
            center: Point2::default(),
            radius: 2.0,
            start_angle: 0.0,
            sweep: -std::f64::consts::FRAC_PI_2,
        };
        assert!(approx_eq(arc.length(), std::f64::consts::PI));
    }
}
