//! WGS-84 calculator.
//!
//! Distances, azimuths and the direct problem are delegated to the geodesic
//! solvers in the `geo` crate. On-track projection has no closed form on the
//! ellipsoid and is found iteratively: cross-track and along-track distances
//! from the spherical right-triangle relations, then a step along the track
//! bearing, repeated until the along-track correction drops below the
//! calculator precision.

use geo::{Bearing, Destination, Distance, Geodesic, Haversine};

use crate::envelope::Envelope;
use crate::point::Point;
use crate::polyline::Polyline;
use crate::topology::{bearing_difference, normalize_bearing, TopologyCalculator};

/// Default geodetic precision: 0.1 m.
const DEFAULT_PRECISION_M: f64 = 0.1;

/// Mean Earth radius in metres, matching the haversine solver.
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Metres per degree of latitude, and of longitude at the equator.
const LATITUDE_DEGREE_METERS: f64 = 110_574.0;
const LONGITUDE_DEGREE_METERS: f64 = 111_320.0;

/// Iteration caps. The projection normally converges in 3-5 steps; the caps
/// only bound adversarial inputs (near-antipodal segments).
const MAX_PROJECTION_ITERATIONS: usize = 50;
const MAX_INTERSECTION_ROUNDS: usize = 10;

#[derive(Debug, Clone, Copy)]
pub struct GeoidalCalculator {
    precision: f64,
}

impl GeoidalCalculator {
    pub fn new(precision: f64) -> Self {
        Self { precision }
    }

    fn gp(p: &Point) -> geo::Point<f64> {
        geo::Point::new(p.x, p.y)
    }

    fn from_gp(p: geo::Point<f64>) -> Point {
        Point::new(p.x(), p.y())
    }

    /// Angular great-circle distance in radians.
    fn angular_distance(p: &Point, q: &Point) -> f64 {
        Haversine::distance(Self::gp(p), Self::gp(q)) / EARTH_RADIUS_M
    }

    /// One projection of `p` onto the track through `start`→`b`: the signed
    /// along-track correction in metres, measured at `start`.
    fn along_track_step(start: &Point, b: &Point, p: &Point, first: bool) -> f64 {
        let bearing_to_p = Geodesic::bearing(Self::gp(start), Self::gp(p));
        let bearing_to_b = Geodesic::bearing(Self::gp(start), Self::gp(b));
        let d_sp = Self::angular_distance(start, p);
        let delta = (bearing_to_p - bearing_to_b).to_radians();
        let xtd = (d_sp.sin() * delta.sin()).asin();

        let atd = if first {
            // half-angle form, stable when the cross-track leg is large
            let ratio = ((std::f64::consts::FRAC_PI_2 + xtd) / 2.0).sin()
                / ((std::f64::consts::FRAC_PI_2 - xtd) / 2.0).sin();
            2.0 * (ratio * ((d_sp - xtd) / 2.0).tan()).atan()
        } else {
            (delta.cos() * d_sp.tan()).atan()
        };
        atd * EARTH_RADIUS_M
    }

    /// Candidate crossings of the two great circles through the segments,
    /// from the cross product of their plane normals. Both antipodes are
    /// returned; the caller keeps whichever is on-track.
    fn great_circle_candidates(a1: &Point, a2: &Point, b1: &Point, b2: &Point) -> Vec<Point> {
        let n1 = cross(&to_unit(a1), &to_unit(a2));
        let n2 = cross(&to_unit(b1), &to_unit(b2));
        let i = cross(&n1, &n2);
        let len = (i[0] * i[0] + i[1] * i[1] + i[2] * i[2]).sqrt();
        if len < 1e-15 {
            // coplanar circles: collinear segments, no transversal crossing
            return Vec::new();
        }
        let unit = [i[0] / len, i[1] / len, i[2] / len];
        let first = from_unit(&unit);
        let second = from_unit(&[-unit[0], -unit[1], -unit[2]]);
        vec![first, second]
    }
}

impl Default for GeoidalCalculator {
    fn default() -> Self {
        Self::new(DEFAULT_PRECISION_M)
    }
}

impl TopologyCalculator for GeoidalCalculator {
    fn precision(&self) -> f64 {
        self.precision
    }

    fn distance(&self, p: &Point, q: &Point) -> f64 {
        Geodesic::distance(Self::gp(p), Self::gp(q))
    }

    fn initial_bearing(&self, p: &Point, q: &Point) -> f64 {
        normalize_bearing(Geodesic::bearing(Self::gp(p), Self::gp(q)))
    }

    fn destination(&self, p: &Point, bearing_deg: f64, distance: f64) -> Point {
        Self::from_gp(Geodesic::destination(Self::gp(p), bearing_deg, distance))
    }

    fn on_track_closest_point(&self, a: &Point, b: &Point, p: &Point) -> Point {
        if self.distance(a, b) <= self.precision {
            return *a;
        }

        let mut on_track = *a;
        let mut damping = 1.0;
        let mut previous = f64::INFINITY;
        let mut before_previous = f64::INFINITY;

        for iteration in 0..MAX_PROJECTION_ITERATIONS {
            if self.distance(&on_track, p) <= self.precision {
                break;
            }
            let atd = Self::along_track_step(&on_track, b, p, iteration == 0);
            if atd.abs() < self.precision {
                break;
            }
            // the same correction recurring two steps apart is a ping-pong
            // around the foot; halve the step to break the cycle
            if (atd - before_previous).abs() < self.precision * 1e-3 {
                damping *= 0.5;
            }
            before_previous = previous;
            previous = atd;

            let track_bearing = self.initial_bearing(&on_track, b);
            on_track = self.destination(&on_track, track_bearing, atd * damping);
        }

        // the foot may fall beyond an endpoint: seen from that endpoint it
        // then lies opposite the other endpoint
        if bearing_difference(
            self.initial_bearing(a, &on_track),
            self.initial_bearing(a, b),
        ) > 90.0
        {
            return *a;
        }
        if bearing_difference(
            self.initial_bearing(b, &on_track),
            self.initial_bearing(b, a),
        ) > 90.0
        {
            return *b;
        }
        on_track
    }

    fn along_track_distance(&self, a: &Point, b: &Point, p: &Point) -> f64 {
        let on_track = self.on_track_closest_point(a, b, p);
        self.distance(a, &on_track)
    }

    fn intersection(&self, a: &Polyline, b: &Polyline) -> Vec<Point> {
        let mut crossings: Vec<Point> = Vec::new();
        let pa = a.points();
        let pb = b.points();
        for sa in pa.windows(2) {
            for sb in pb.windows(2) {
                for candidate in Self::great_circle_candidates(&sa[0], &sa[1], &sb[0], &sb[1]) {
                    let mut x = candidate;
                    // alternate projections onto both segments until the
                    // point settles; a true crossing is a fixed point of both
                    for _ in 0..MAX_INTERSECTION_ROUNDS {
                        let on_b = self.on_track_closest_point(&sb[0], &sb[1], &x);
                        let on_a = self.on_track_closest_point(&sa[0], &sa[1], &on_b);
                        let moved = self.distance(&on_a, &x);
                        x = on_a;
                        if moved <= self.precision {
                            break;
                        }
                    }
                    let off_a = self.distance(&x, &self.on_track_closest_point(&sa[0], &sa[1], &x));
                    let off_b = self.distance(&x, &self.on_track_closest_point(&sb[0], &sb[1], &x));
                    if off_a <= self.precision
                        && off_b <= self.precision
                        && !crossings
                            .iter()
                            .any(|c| self.distance(c, &x) <= self.precision)
                    {
                        crossings.push(x);
                    }
                }
            }
        }
        crossings
    }

    fn search_envelope(&self, center: &Point, radius: f64) -> Envelope {
        let lat_radius = radius / LATITUDE_DEGREE_METERS;
        let lon_radius =
            radius / (LONGITUDE_DEGREE_METERS * center.y.to_radians().cos().max(0.01));
        Envelope::new(
            center.x - lon_radius,
            center.y - lat_radius,
            center.x + lon_radius,
            center.y + lat_radius,
        )
    }
}

fn cross(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn to_unit(p: &Point) -> [f64; 3] {
    let lon = p.x.to_radians();
    let lat = p.y.to_radians();
    [lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin()]
}

fn from_unit(v: &[f64; 3]) -> Point {
    let lat = v[2].asin();
    let lon = v[1].atan2(v[0]);
    Point::new(lon.to_degrees(), lat.to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calc() -> GeoidalCalculator {
        GeoidalCalculator::default()
    }

    // Treviso plain, the reference network area of the integration suites
    const A: Point = Point::new(12.159747628109386, 45.66132709541773);
    const B: Point = Point::new(12.238140517207398, 45.65897415921759);

    #[test]
    fn test_distance_is_metric() {
        let c = calc();
        assert_eq!(c.distance(&A, &A), 0.0);
        let d = c.distance(&A, &B);
        assert!((c.distance(&B, &A) - d).abs() < 1e-6);
        // ~6.1 km between the two reference nodes
        assert!(d > 5_000.0 && d < 7_000.0, "unexpected distance {d}");
    }

    #[test]
    fn test_destination_round_trip() {
        let c = calc();
        let bearing = 37.5;
        let q = c.destination(&A, bearing, 2_000.0);
        assert!((c.distance(&A, &q) - 2_000.0).abs() < 0.01);
        let back = c.initial_bearing(&q, &A);
        let diff = bearing_difference(back, normalize_bearing(bearing + 180.0));
        assert!(diff < 1e-4, "reverse bearing off by {diff} deg");
    }

    #[test]
    fn test_on_track_point_of_perpendicular_fix() {
        let c = calc();
        // drop a point ~500 m north of the midpoint of A-B
        let mid = c.destination(&A, c.initial_bearing(&A, &B), c.distance(&A, &B) / 2.0);
        let p = c.destination(&mid, 0.0, 500.0);
        let on_track = c.on_track_closest_point(&A, &B, &p);
        assert!(c.distance(&on_track, &mid) < 1.0);
        // the on-track point is on the segment and closer than the fix
        assert!(c.distance(&p, &on_track) < 520.0);
    }

    #[test]
    fn test_on_track_clamps_to_endpoints() {
        let c = calc();
        let behind = c.destination(&A, normalize_bearing(c.initial_bearing(&A, &B) + 180.0), 800.0);
        assert_eq!(c.on_track_closest_point(&A, &B, &behind), A);
        let beyond = c.destination(&B, c.initial_bearing(&A, &B), 800.0);
        assert_eq!(c.on_track_closest_point(&A, &B, &beyond), B);
    }

    #[test]
    fn test_along_track_bounds() {
        let c = calc();
        let length = c.distance(&A, &B);
        let p = c.destination(&A, c.initial_bearing(&A, &B), length * 0.25);
        let atd = c.along_track_distance(&A, &B, &p);
        assert!((atd - length * 0.25).abs() < 1.0);
        assert!(atd >= 0.0 && atd <= length);
    }

    #[test]
    fn test_crossing_segments_intersect() {
        let c = calc();
        // two transversal segments through the same neighbourhood
        let line1 = Polyline::new(vec![Point::new(12.0, 45.6), Point::new(12.4, 45.7)]);
        let line2 = Polyline::new(vec![Point::new(12.2, 45.5), Point::new(12.2, 45.8)]);
        let crossings = c.intersection(&line1, &line2);
        assert_eq!(crossings.len(), 1);
        let x = crossings[0];
        assert!((x.x - 12.2).abs() < 1e-3);
        assert!(x.y > 45.6 && x.y < 45.7);
    }

    #[test]
    fn test_disjoint_segments_do_not_intersect() {
        let c = calc();
        let line1 = Polyline::new(vec![Point::new(12.0, 45.6), Point::new(12.1, 45.6)]);
        let line2 = Polyline::new(vec![Point::new(12.0, 45.8), Point::new(12.1, 45.8)]);
        assert!(c.intersection(&line1, &line2).is_empty());
    }
}
