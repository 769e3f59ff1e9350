//! Drawing model
//!
//! A drawing is an ordered list of curves. Every curve exposes all of its
//! points (end points, control points, arc centers) through [`Curve::points`]
//! and [`Curve::points_mut`], so bounds and transforms never need to know
//! which kind of curve they are looking at.
//!
//! Bounds are measured over [`Curve::extent_points`] instead: an arc center
//! is not traced, but the arc can bulge past both of its end points.

use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};
use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// Start angle and signed sweep (radians) of an arc.
///
/// Counter-clockwise sweeps are positive. An arc whose end equals its start
/// is a full circle.
pub fn arc_angles(start: Point, end: Point, center: Point, clockwise: bool) -> (f64, f64) {
    let start_angle = (start.y - center.y).atan2(start.x - center.x);
    let end_angle = (end.y - center.y).atan2(end.x - center.x);

    let mut sweep = end_angle - start_angle;
    if clockwise && sweep >= 0.0 {
        sweep -= TAU;
    } else if !clockwise && sweep <= 0.0 {
        sweep += TAU;
    }
    (start_angle, sweep)
}

/// A 2D point in millimetres
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// A geometric primitive of a drawing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Curve {
    /// Straight segment
    Line { start: Point, end: Point },
    /// Circular arc around `center`
    Arc {
        start: Point,
        end: Point,
        center: Point,
        clockwise: bool,
    },
    /// Cubic Bézier segment
    Cubic {
        start: Point,
        control1: Point,
        control2: Point,
        end: Point,
    },
}

impl Curve {
    pub fn line(start: Point, end: Point) -> Self {
        Curve::Line { start, end }
    }

    pub fn arc(start: Point, end: Point, center: Point, clockwise: bool) -> Self {
        Curve::Arc {
            start,
            end,
            center,
            clockwise,
        }
    }

    pub fn cubic(start: Point, control1: Point, control2: Point, end: Point) -> Self {
        Curve::Cubic {
            start,
            control1,
            control2,
            end,
        }
    }

    /// Where the pen starts tracing this curve
    pub fn start(&self) -> Point {
        match self {
            Curve::Line { start, .. } | Curve::Arc { start, .. } | Curve::Cubic { start, .. } => {
                *start
            }
        }
    }

    /// Where the pen stops tracing this curve
    pub fn end(&self) -> Point {
        match self {
            Curve::Line { end, .. } | Curve::Arc { end, .. } | Curve::Cubic { end, .. } => *end,
        }
    }

    /// All points of the curve, including control points and arc centers
    pub fn points(&self) -> SmallVec<[Point; 4]> {
        match self {
            Curve::Line { start, end } => smallvec![*start, *end],
            Curve::Arc {
                start, end, center, ..
            } => smallvec![*start, *end, *center],
            Curve::Cubic {
                start,
                control1,
                control2,
                end,
            } => smallvec![*start, *control1, *control2, *end],
        }
    }

    /// Points whose bounding box contains everything the curve traces.
    ///
    /// Lines and cubics use their end and control points (a cubic lies inside
    /// its control hull). Arcs use their end points plus every axis extreme
    /// of the circle that falls inside the sweep.
    pub fn extent_points(&self) -> SmallVec<[Point; 6]> {
        match *self {
            Curve::Arc {
                start,
                end,
                center,
                clockwise,
            } => {
                let mut points: SmallVec<[Point; 6]> = smallvec![start, end];
                let radius = start.distance_to(&center);
                let (start_angle, sweep) = arc_angles(start, end, center, clockwise);
                let extremes = [
                    (0.0, radius, 0.0),
                    (FRAC_PI_2, 0.0, radius),
                    (PI, -radius, 0.0),
                    (PI + FRAC_PI_2, 0.0, -radius),
                ];
                for (axis_angle, dx, dy) in extremes {
                    let travelled = if clockwise {
                        (start_angle - axis_angle).rem_euclid(TAU)
                    } else {
                        (axis_angle - start_angle).rem_euclid(TAU)
                    };
                    if travelled <= sweep.abs() {
                        points.push(Point::new(center.x + dx, center.y + dy));
                    }
                }
                points
            }
            _ => self.points().into_iter().collect(),
        }
    }

    /// Mutable access to every point of the curve
    pub fn points_mut(&mut self) -> SmallVec<[&mut Point; 4]> {
        match self {
            Curve::Line { start, end } => smallvec![start, end],
            Curve::Arc {
                start, end, center, ..
            } => smallvec![start, end, center],
            Curve::Cubic {
                start,
                control1,
                control2,
                end,
            } => smallvec![start, control1, control2, end],
        }
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }
}

/// An ordered sequence of curves, mutated in place by the fit transform
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Drawing {
    curves: Vec<Curve>,
}

impl Drawing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_curves(curves: Vec<Curve>) -> Self {
        Self { curves }
    }

    pub fn push(&mut self, curve: Curve) {
        self.curves.push(curve);
    }

    pub fn curves(&self) -> &[Curve] {
        &self.curves
    }

    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    /// Iterate every point of every curve
    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        self.curves.iter().flat_map(|c| c.points())
    }

    /// Bounding box over the traced extent of every curve.
    ///
    /// An empty drawing yields the degenerate box `((0,0),(0,0))`.
    pub fn bounds(&self) -> Bounds {
        let mut points = self.curves.iter().flat_map(|c| c.extent_points());
        let Some(first) = points.next() else {
            return Bounds::default();
        };

        points.fold(Bounds::new(first, first), |mut b, p| {
            b.min.x = b.min.x.min(p.x);
            b.min.y = b.min.y.min(p.y);
            b.max.x = b.max.x.max(p.x);
            b.max.y = b.max.y.max(p.y);
            b
        })
    }

    /// Shift every point by `(dx, dy)`
    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.for_each_point_mut(|p| {
            p.x += dx;
            p.y += dy;
        });
    }

    /// Multiply every coordinate by `factor` (about the origin)
    pub fn scale(&mut self, factor: f64) {
        self.for_each_point_mut(|p| {
            p.x *= factor;
            p.y *= factor;
        });
    }

    /// Flip the drawing vertically about the horizontal line `y = axis_y`
    pub fn mirror_y(&mut self, axis_y: f64) {
        self.for_each_point_mut(|p| p.y = 2.0 * axis_y - p.y);
        // Mirroring reverses the winding of arcs
        for curve in &mut self.curves {
            if let Curve::Arc { clockwise, .. } = curve {
                *clockwise = !*clockwise;
            }
        }
    }

    fn for_each_point_mut(&mut self, mut f: impl FnMut(&mut Point)) {
        for curve in &mut self.curves {
            for p in curve.points_mut() {
                f(p);
            }
        }
    }
}

impl FromIterator<Curve> for Drawing {
    fn from_iter<T: IntoIterator<Item = Curve>>(iter: T) -> Self {
        Self {
            curves: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Drawing {
        Drawing::from_curves(vec![
            Curve::line(Point::new(0.0, 0.0), Point::new(10.0, 5.0)),
            Curve::cubic(
                Point::new(10.0, 5.0),
                Point::new(12.0, -3.0),
                Point::new(20.0, 8.0),
                Point::new(15.0, 2.0),
            ),
            Curve::arc(
                Point::new(15.0, 2.0),
                Point::new(15.0, 6.0),
                Point::new(15.0, 4.0),
                false,
            ),
        ])
    }

    #[test]
    fn test_empty_drawing_bounds() {
        let drawing = Drawing::new();
        assert_eq!(drawing.bounds(), Bounds::default());
    }

    #[test]
    fn test_bounds_include_control_points() {
        let b = sample().bounds();
        assert_eq!(b.min, Point::new(0.0, -3.0));
        assert_eq!(b.max, Point::new(20.0, 8.0));
    }

    #[test]
    fn test_translate_moves_every_point() {
        let mut drawing = sample();
        drawing.translate(5.0, -2.0);
        let b = drawing.bounds();
        assert_eq!(b.min, Point::new(5.0, -5.0));
        assert_eq!(b.max, Point::new(25.0, 6.0));

        if let Curve::Arc { center, .. } = &drawing.curves()[2] {
            assert_eq!(*center, Point::new(20.0, 2.0));
        } else {
            panic!("expected arc");
        }
    }

    #[test]
    fn test_translate_then_scale_is_not_scale_then_translate() {
        let mut a = sample();
        a.translate(1.0, 1.0);
        a.scale(2.0);

        let mut b = sample();
        b.scale(2.0);
        b.translate(1.0, 1.0);

        assert_ne!(a.bounds(), b.bounds());
    }

    #[test]
    fn test_arc_bounds_follow_the_sweep() {
        let below = Drawing::from_curves(vec![Curve::arc(
            Point::new(0.0, 0.0),
            Point::new(200.0, 0.0),
            Point::new(100.0, 0.0),
            false,
        )]);
        let b = below.bounds();
        assert_eq!(b.min, Point::new(0.0, -100.0));
        assert_eq!(b.max, Point::new(200.0, 0.0));

        let above = Drawing::from_curves(vec![Curve::arc(
            Point::new(0.0, 0.0),
            Point::new(200.0, 0.0),
            Point::new(100.0, 0.0),
            true,
        )]);
        let b = above.bounds();
        assert_eq!(b.min, Point::new(0.0, 0.0));
        assert!((b.max.y - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_full_circle_bounds() {
        let circle = Drawing::from_curves(vec![Curve::arc(
            Point::new(15.0, 10.0),
            Point::new(15.0, 10.0),
            Point::new(10.0, 10.0),
            true,
        )]);
        let b = circle.bounds();
        assert!((b.min.x - 5.0).abs() < 1e-9);
        assert!((b.min.y - 5.0).abs() < 1e-9);
        assert!((b.max.x - 15.0).abs() < 1e-9);
        assert!((b.max.y - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_shallow_arc_ignores_far_center() {
        // 2 mm bulge on a radius of 1000 mm
        let arc = Curve::arc(
            Point::new(-63.0, 998.0),
            Point::new(63.0, 998.0),
            Point::new(0.0, 0.0),
            true,
        );
        let b = Drawing::from_curves(vec![arc]).bounds();
        assert!(b.min.y > 990.0);
        assert!(b.max.y > 999.9 && b.max.y < 1000.0);
    }

    #[test]
    fn test_mirror_y_flips_arc_direction() {
        let mut drawing = sample();
        drawing.mirror_y(0.0);
        let b = drawing.bounds();
        assert_eq!(b.min.y, -8.0);
        assert_eq!(b.max.y, 3.0);
        assert!(matches!(
            drawing.curves()[2],
            Curve::Arc {
                clockwise: true,
                ..
            }
        ));
    }
}
