//! Curve flattening
//!
//! Converts arcs and cubic Béziers into straight segments for controllers
//! that only receive linear moves.

use lyon::geom::{point, CubicBezierSegment};
use plotterkit_core::{arc_angles, Curve, Point};

/// Default maximum segment length in mm
pub const DEFAULT_SEGMENT_LENGTH_MM: f64 = 0.1;

/// Flatten a curve into the points a tool visits after its start point.
///
/// The last returned point is always exactly the curve's end point so runs
/// of connected curves chain without drift.
pub fn flatten_curve(curve: &Curve, segment_length: f64) -> Vec<Point> {
    match *curve {
        Curve::Line { end, .. } => vec![end],
        Curve::Arc {
            start,
            end,
            center,
            clockwise,
        } => flatten_arc(start, end, center, clockwise, segment_length),
        Curve::Cubic {
            start,
            control1,
            control2,
            end,
        } => flatten_cubic(start, control1, control2, end, segment_length),
    }
}

fn segment_count(length: f64, segment_length: f64) -> usize {
    if !length.is_finite() || segment_length <= 0.0 {
        return 1;
    }
    ((length / segment_length).ceil() as usize).max(1)
}

fn flatten_arc(
    start: Point,
    end: Point,
    center: Point,
    clockwise: bool,
    segment_length: f64,
) -> Vec<Point> {
    let radius = start.distance_to(&center);
    if radius <= f64::EPSILON {
        return vec![end];
    }

    let (start_angle, sweep) = arc_angles(start, end, center, clockwise);

    let count = segment_count(radius * sweep.abs(), segment_length);
    let mut points: Vec<Point> = (1..count)
        .map(|i| {
            let angle = start_angle + sweep * (i as f64 / count as f64);
            Point::new(center.x + radius * angle.cos(), center.y + radius * angle.sin())
        })
        .collect();
    points.push(end);
    points
}

fn flatten_cubic(
    start: Point,
    control1: Point,
    control2: Point,
    end: Point,
    segment_length: f64,
) -> Vec<Point> {
    let segment = CubicBezierSegment {
        from: point(start.x, start.y),
        ctrl1: point(control1.x, control1.y),
        ctrl2: point(control2.x, control2.y),
        to: point(end.x, end.y),
    };

    // The control polygon is never shorter than the curve
    let hull_length =
        start.distance_to(&control1) + control1.distance_to(&control2) + control2.distance_to(&end);
    let count = segment_count(hull_length, segment_length);

    let mut points: Vec<Point> = (1..count)
        .map(|i| {
            let p = segment.sample(i as f64 / count as f64);
            Point::new(p.x, p.y)
        })
        .collect();
    points.push(end);
    points
}
