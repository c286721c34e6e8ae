//! Planar calculator: closed-form projections on flat coordinates.

use crate::envelope::Envelope;
use crate::point::Point;
use crate::polyline::Polyline;
use crate::sweep;
use crate::topology::{normalize_bearing, TopologyCalculator};

/// Default planar precision: one micro-unit.
const DEFAULT_PRECISION: f64 = 1e-6;

#[derive(Debug, Clone, Copy)]
pub struct EuclideanCalculator {
    precision: f64,
}

impl EuclideanCalculator {
    pub fn new(precision: f64) -> Self {
        Self { precision }
    }
}

impl Default for EuclideanCalculator {
    fn default() -> Self {
        Self::new(DEFAULT_PRECISION)
    }
}

impl TopologyCalculator for EuclideanCalculator {
    fn precision(&self) -> f64 {
        self.precision
    }

    fn distance(&self, p: &Point, q: &Point) -> f64 {
        (p.x - q.x).hypot(p.y - q.y)
    }

    fn initial_bearing(&self, p: &Point, q: &Point) -> f64 {
        // atan2(dx, dy): clockwise from the +y axis, matching compass
        // bearings on geographic axes
        normalize_bearing(f64::atan2(q.x - p.x, q.y - p.y).to_degrees())
    }

    fn destination(&self, p: &Point, bearing_deg: f64, distance: f64) -> Point {
        let rad = bearing_deg.to_radians();
        Point::new(p.x + distance * rad.sin(), p.y + distance * rad.cos())
    }

    fn on_track_closest_point(&self, a: &Point, b: &Point, p: &Point) -> Point {
        let abx = b.x - a.x;
        let aby = b.y - a.y;
        let len_sq = abx * abx + aby * aby;
        if len_sq == 0.0 {
            return *a;
        }
        // parametric projection r = AC.AB / |AB|^2, clamped to the segment
        let r = ((p.x - a.x) * abx + (p.y - a.y) * aby) / len_sq;
        if r <= 0.0 {
            *a
        } else if r >= 1.0 {
            *b
        } else {
            Point::new(a.x + r * abx, a.y + r * aby)
        }
    }

    fn intersection(&self, a: &Polyline, b: &Polyline) -> Vec<Point> {
        sweep::polyline_intersections(a, b, self.precision)
    }

    fn search_envelope(&self, center: &Point, radius: f64) -> Envelope {
        Envelope::new(
            center.x - radius,
            center.y - radius,
            center.x + radius,
            center.y + radius,
        )
    }
}

/// Signed perpendicular distance from `p` to the infinite line through
/// `a`→`b`; positive to the right of the direction of travel.
pub fn signed_line_distance(a: &Point, b: &Point, p: &Point) -> f64 {
    let len = (b.x - a.x).hypot(b.y - a.y);
    if len == 0.0 {
        return (p.x - a.x).hypot(p.y - a.y);
    }
    let s = ((a.y - p.y) * (b.x - a.x) - (a.x - p.x) * (b.y - a.y)) / (len * len);
    s * len
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calc() -> EuclideanCalculator {
        EuclideanCalculator::default()
    }

    #[test]
    fn test_distance() {
        let d = calc().distance(&Point::new(0.0, 0.0), &Point::new(3.0, 4.0));
        assert_eq!(d, 5.0);
    }

    #[test]
    fn test_bearing_cardinal_directions() {
        let c = calc();
        let o = Point::new(0.0, 0.0);
        assert_eq!(c.initial_bearing(&o, &Point::new(0.0, 1.0)), 0.0);
        assert_eq!(c.initial_bearing(&o, &Point::new(1.0, 0.0)), 90.0);
        assert_eq!(c.initial_bearing(&o, &Point::new(0.0, -1.0)), 180.0);
        assert_eq!(c.initial_bearing(&o, &Point::new(-1.0, 0.0)), 270.0);
    }

    #[test]
    fn test_destination_round_trip() {
        let c = calc();
        let o = Point::new(2.0, 3.0);
        let q = c.destination(&o, 135.0, 2.0_f64.sqrt());
        assert!(q.equals_with_tolerance(&Point::new(3.0, 2.0), 1e-12));
        assert!((c.initial_bearing(&o, &q) - 135.0).abs() < 1e-9);
    }

    #[test]
    fn test_on_track_projection_and_clamping() {
        let c = calc();
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        let mid = c.on_track_closest_point(&a, &b, &Point::new(4.0, 3.0));
        assert_eq!(mid, Point::new(4.0, 0.0));
        // beyond either endpoint clamps
        assert_eq!(c.on_track_closest_point(&a, &b, &Point::new(-2.0, 1.0)), a);
        assert_eq!(c.on_track_closest_point(&a, &b, &Point::new(12.0, 1.0)), b);
    }

    #[test]
    fn test_along_track_distance_bounds() {
        let c = calc();
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert_eq!(c.along_track_distance(&a, &b, &Point::new(7.0, 5.0)), 7.0);
        assert_eq!(c.along_track_distance(&a, &b, &Point::new(-3.0, 0.0)), 0.0);
        assert_eq!(c.along_track_distance(&a, &b, &Point::new(15.0, 0.0)), 10.0);
    }

    #[test]
    fn test_degenerate_segment() {
        let c = calc();
        let a = Point::new(1.0, 1.0);
        assert_eq!(c.on_track_closest_point(&a, &a, &Point::new(5.0, 5.0)), a);
    }

    #[test]
    fn test_signed_line_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(0.0, 10.0);
        assert!((signed_line_distance(&a, &b, &Point::new(2.0, 5.0)) - 2.0).abs() < 1e-12);
        assert!((signed_line_distance(&a, &b, &Point::new(-2.0, 5.0)) + 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_polyline_distance() {
        let c = calc();
        let line = Polyline::new(vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
        ]);
        assert!((c.distance_to_polyline(&Point::new(5.0, 2.0), &line) - 2.0).abs() < 1e-12);
        assert!((c.distance_to_polyline(&Point::new(12.0, 5.0), &line) - 2.0).abs() < 1e-12);
    }
}
