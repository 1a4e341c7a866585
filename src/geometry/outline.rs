//! Outline geometry over UFO points
//!
//! Converts point lists to kurbo paths and implements the few outline
//! operations the object model needs (bounds, winding direction, reversal).

use kurbo::{BezPath, Point, Rect};

use crate::objects::point::{UfoPoint, UfoPointType};

/// A contour is open when it starts with a move point
pub fn is_closed(points: &[UfoPoint]) -> bool {
    points
        .first()
        .is_some_and(|point| point.point_type != UfoPointType::Move)
}

fn midpoint(a: Point, b: Point) -> Point {
    Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

/// Append the segment ending at `end`, consuming the pending control points
fn push_segment(path: &mut BezPath, pending: &mut Vec<Point>, end: Point, point_type: UfoPointType) {
    match point_type {
        UfoPointType::Move => path.move_to(end),
        UfoPointType::Line | UfoPointType::OffCurve => path.line_to(end),
        UfoPointType::Curve => match pending.len() {
            0 => path.line_to(end),
            1 => path.quad_to(pending[0], end),
            count => path.curve_to(pending[count - 2], pending[count - 1], end),
        },
        UfoPointType::QCurve => {
            // consecutive quadratic controls imply on-curve points between them
            for (index, control) in pending.iter().enumerate() {
                let segment_end = match pending.get(index + 1) {
                    Some(next) => midpoint(*control, *next),
                    None => end,
                };
                path.quad_to(*control, segment_end);
            }
            if pending.is_empty() {
                path.line_to(end);
            }
        }
    }
    pending.clear();
}

/// Convert UFO points to a kurbo path.
///
/// Closed contours start at their first on-curve point and wrap around to
/// it; control points in front of it belong to the closing segment.
pub fn to_bezpath(points: &[UfoPoint]) -> BezPath {
    let mut path = BezPath::new();
    let Some(first) = points.first() else {
        return path;
    };
    let mut pending: Vec<Point> = Vec::new();

    if !is_closed(points) {
        path.move_to(first.position());
        for point in &points[1..] {
            if point.is_on_curve() {
                push_segment(&mut path, &mut pending, point.position(), point.point_type);
            } else {
                pending.push(point.position());
            }
        }
        return path;
    }

    let Some(start) = points.iter().position(UfoPoint::is_on_curve) else {
        // all quadratic controls, every on-curve point is implied
        let controls: Vec<Point> = points.iter().map(UfoPoint::position).collect();
        let last = controls[controls.len() - 1];
        path.move_to(midpoint(last, controls[0]));
        for (index, control) in controls.iter().enumerate() {
            let next = controls[(index + 1) % controls.len()];
            path.quad_to(*control, midpoint(*control, next));
        }
        path.close_path();
        return path;
    };

    let origin = &points[start];
    path.move_to(origin.position());
    for offset in 1..=points.len() {
        let point = &points[(start + offset) % points.len()];
        if point.is_on_curve() {
            push_segment(&mut path, &mut pending, point.position(), point.point_type);
        } else {
            pending.push(point.position());
        }
    }
    path.close_path();
    path
}

/// Bounds of every point, control points included
pub fn control_bounds(points: &[UfoPoint]) -> Option<Rect> {
    let mut positions = points.iter().map(UfoPoint::position);
    let first = positions.next()?;
    Some(positions.fold(Rect::from_points(first, first), |bounds, point| {
        bounds.union_pt(point)
    }))
}

/// Signed area of the point polygon. Positive is counter-clockwise with the
/// y axis pointing up.
pub fn signed_area(points: &[UfoPoint]) -> f64 {
    let count = points.len();
    if count < 3 {
        return 0.0;
    }
    let twice_area: f64 = (0..count)
        .map(|index| {
            let current = &points[index];
            let next = &points[(index + 1) % count];
            current.x * next.y - next.x * current.y
        })
        .sum();
    twice_area / 2.0
}

pub fn is_clockwise(points: &[UfoPoint]) -> bool {
    signed_area(points) < 0.0
}

/// Reverse the drawing direction of a contour.
///
/// Segment types live on the segment's end point, so every on-curve point
/// takes over the type of the next on-curve point before the order is
/// flipped. Closed contours keep their start point; the new start of an open
/// contour becomes a move.
pub fn reversed(points: &[UfoPoint]) -> Vec<UfoPoint> {
    let closed = is_closed(points);
    let on_curve: Vec<usize> = points
        .iter()
        .enumerate()
        .filter(|(_, point)| point.is_on_curve())
        .map(|(index, _)| index)
        .collect();

    let mut result = points.to_vec();
    for (position, &index) in on_curve.iter().enumerate() {
        let next = if closed {
            Some(on_curve[(position + 1) % on_curve.len()])
        } else {
            on_curve.get(position + 1).copied()
        };
        result[index].point_type = match next {
            Some(next) => points[next].point_type,
            None => UfoPointType::Move,
        };
    }

    result.reverse();
    if closed {
        result.rotate_right(1);
    }
    result
}
