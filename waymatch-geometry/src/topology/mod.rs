//! Topology calculators.
//!
//! A calculator gives the geometry kernel its metric: distances, bearings,
//! the direct problem, on-track projection and polyline intersection. Two
//! implementations exist, planar ([`EuclideanCalculator`]) and WGS-84
//! ([`GeoidalCalculator`]); hot paths are written generically so the choice
//! monomorphises away.

mod euclidean;
mod geoidal;

pub use euclidean::EuclideanCalculator;
pub use geoidal::GeoidalCalculator;

use std::cmp::Ordering;

use crate::envelope::Envelope;
use crate::point::Point;
use crate::polyline::Polyline;

pub trait TopologyCalculator {
    /// Tolerance under which two points are the same point: the equality
    /// bound of predicates and the early-exit bound of nearest-neighbour
    /// search. Metres for the geoidal calculator, coordinate units for the
    /// planar one.
    fn precision(&self) -> f64;

    fn distance(&self, p: &Point, q: &Point) -> f64;

    /// Initial bearing from `p` to `q` in degrees, normalised to `[0, 360)`.
    fn initial_bearing(&self, p: &Point, q: &Point) -> f64;

    /// Direct problem: the point reached from `p` on the given initial
    /// bearing after `distance`.
    fn destination(&self, p: &Point, bearing_deg: f64, distance: f64) -> Point;

    /// The point of segment `a`→`b` closest to `p`, clamped to the segment.
    fn on_track_closest_point(&self, a: &Point, b: &Point, p: &Point) -> Point;

    /// Distance from `a` to the foot of the perpendicular from `p` on
    /// `a`→`b`. Non-negative and at most `distance(a, b)`.
    fn along_track_distance(&self, a: &Point, b: &Point, p: &Point) -> f64 {
        let on_track = self.on_track_closest_point(a, b, p);
        self.distance(a, &on_track)
    }

    /// All crossing points between the two polylines.
    fn intersection(&self, a: &Polyline, b: &Polyline) -> Vec<Point>;

    /// Coordinate-space box guaranteed to cover everything within
    /// `radius` of `center`; the coarse filter ahead of exact distance
    /// tests in index-backed searches.
    fn search_envelope(&self, center: &Point, radius: f64) -> Envelope;

    /// Order with tolerance: points within `precision()` compare equal,
    /// otherwise lexicographically by x then y.
    fn compare(&self, p: &Point, q: &Point) -> Ordering {
        if p.equals_with_tolerance(q, self.precision()) {
            Ordering::Equal
        } else {
            p.lex_cmp(q)
        }
    }

    /// Minimum distance from `p` to any segment of the polyline.
    fn distance_to_polyline(&self, p: &Point, polyline: &Polyline) -> f64 {
        let points = polyline.points();
        match points.len() {
            0 => f64::INFINITY,
            1 => self.distance(p, &points[0]),
            _ => points
                .windows(2)
                .map(|w| {
                    let on_track = self.on_track_closest_point(&w[0], &w[1], p);
                    self.distance(p, &on_track)
                })
                .fold(f64::INFINITY, f64::min),
        }
    }
}

/// Normalise a bearing in degrees to `[0, 360)`.
pub fn normalize_bearing(deg: f64) -> f64 {
    let norm = deg.rem_euclid(360.0);
    // rem_euclid(360) can return 360.0 for tiny negative inputs
    if norm >= 360.0 {
        0.0
    } else {
        norm
    }
}

/// Absolute difference between two bearings, in `[0, 180]`.
pub fn bearing_difference(a: f64, b: f64) -> f64 {
    let diff = (a - b).rem_euclid(360.0);
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_bearing() {
        assert_eq!(normalize_bearing(0.0), 0.0);
        assert_eq!(normalize_bearing(-90.0), 270.0);
        assert_eq!(normalize_bearing(720.5), 0.5);
    }

    #[test]
    fn test_bearing_difference_wraps() {
        assert_eq!(bearing_difference(350.0, 10.0), 20.0);
        assert_eq!(bearing_difference(10.0, 350.0), 20.0);
        assert_eq!(bearing_difference(90.0, 270.0), 180.0);
    }
}
