//! Randomized property checks over the geometry kernel and utilities.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use waymatch_geometry::hull::{convex_hull, orientation};
use waymatch_geometry::select::select_by;
use waymatch_geometry::sweep::{intersect, segment_intersections, Segment};
use waymatch_geometry::{
    simplify::simplify, Envelope, EuclideanCalculator, GeoidalCalculator, Point, Polyline,
    TopologyCalculator,
};

fn random_points(seed: u64, count: usize, span: f64) -> Vec<Point> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| Point::new(rng.gen_range(-span..span), rng.gen_range(-span..span)))
        .collect()
}

#[test]
fn polyline_construction_is_duplicate_free() {
    let mut rng = StdRng::seed_from_u64(5);
    for _ in 0..50 {
        // draw from a tiny grid so repeats are common
        let points: Vec<Point> = (0..rng.gen_range(0..30))
            .map(|_| {
                Point::new(
                    rng.gen_range(0..3) as f64,
                    rng.gen_range(0..3) as f64,
                )
            })
            .collect();
        let line = Polyline::new(points);
        for pair in line.points().windows(2) {
            assert_ne!(pair[0], pair[1]);
        }
    }
}

#[test]
fn polyline_reverse_is_an_involution() {
    for seed in 0..20 {
        let line = Polyline::new(random_points(seed, 12, 50.0));
        assert_eq!(line.reverse().reverse(), line);
    }
}

#[test]
fn envelope_expansion_is_monotonic_and_idempotent() {
    let mut rng = StdRng::seed_from_u64(9);
    let mut env = Envelope::from_point(&Point::new(0.0, 0.0));
    for _ in 0..200 {
        let p = Point::new(rng.gen_range(-1e4..1e4), rng.gen_range(-1e4..1e4));
        let before = env.area();
        env.expand_to_include(p.x, p.y);
        assert!(env.area() >= before);
        assert!(env.contains_point(&p));
        // a second expansion by a contained point changes nothing
        let frozen = env;
        env.expand_to_include(p.x, p.y);
        assert_eq!(env, frozen);
    }
}

#[test]
fn simplification_stays_within_tolerance_on_the_ellipsoid() {
    let calc = GeoidalCalculator::default();
    // a wandering 30-point track near Treviso
    let mut rng = StdRng::seed_from_u64(31);
    let mut lon = 12.2;
    let mut lat = 45.66;
    let mut points = Vec::new();
    for _ in 0..30 {
        points.push(Point::new(lon, lat));
        lon += rng.gen_range(0.001..0.004);
        lat += rng.gen_range(-0.002..0.002);
    }
    let line = Polyline::new(points);
    let tolerance = 120.0;
    let simplified = simplify(&line, tolerance, &calc).unwrap();
    assert!(simplified.len() <= line.len());
    for p in line.points() {
        assert!(calc.distance_to_polyline(p, &simplified) <= tolerance + 0.5);
    }
}

#[test]
fn hull_contains_every_input_point() {
    for seed in 0..10 {
        let points = random_points(seed * 7 + 1, 60, 100.0);
        let hull = convex_hull(&points);
        assert!(hull.len() >= 3);
        // convexity: consecutive hull turns are all counter-clockwise
        for i in 0..hull.len() {
            let a = &hull[i];
            let b = &hull[(i + 1) % hull.len()];
            let c = &hull[(i + 2) % hull.len()];
            assert_eq!(orientation(a, b, c), std::cmp::Ordering::Greater);
        }
        // containment: no input point lies right of any hull edge
        for p in &points {
            for i in 0..hull.len() {
                let a = &hull[i];
                let b = &hull[(i + 1) % hull.len()];
                assert_ne!(
                    orientation(a, b, p),
                    std::cmp::Ordering::Less,
                    "point {p} outside hull edge {a} -> {b}"
                );
            }
        }
    }
}

#[test]
fn quick_select_places_the_statistic() {
    let mut rng = StdRng::seed_from_u64(77);
    for _ in 0..30 {
        let mut values: Vec<i64> = (0..rng.gen_range(1..200))
            .map(|_| rng.gen_range(-1000..1000))
            .collect();
        let mut sorted = values.clone();
        sorted.sort_unstable();
        let k = rng.gen_range(0..values.len());
        let hi = values.len() - 1;
        select_by(&mut values, 0, hi, k, &mut |a, b| a.cmp(b));
        assert_eq!(values[k], sorted[k]);
    }
}

#[test]
fn sweep_agrees_with_pairwise_tests() {
    let mut rng = StdRng::seed_from_u64(123);
    for round in 0..20 {
        let segments: Vec<Segment> = (0..25)
            .map(|_| {
                let a = Point::new(rng.gen_range(0.0..100.0), rng.gen_range(0.0..100.0));
                let b = Point::new(
                    a.x + rng.gen_range(-30.0..30.0),
                    a.y + rng.gen_range(-30.0..30.0),
                );
                Segment::new(a, b)
            })
            .collect();

        let mut expected: Vec<(usize, usize)> = Vec::new();
        for i in 0..segments.len() {
            for j in i + 1..segments.len() {
                if intersect(&segments[i], &segments[j]).is_some() {
                    expected.push((i, j));
                }
            }
        }
        let mut got: Vec<(usize, usize)> = segment_intersections(&segments)
            .into_iter()
            .map(|c| (c.first, c.second))
            .collect();
        got.sort_unstable();
        expected.sort_unstable();
        assert_eq!(got, expected, "round {round}");
    }
}

#[test]
fn euclidean_and_geoidal_projections_agree_on_tiny_scales() {
    // at metre scale the ellipsoid is flat; the two calculators must
    // project to nearly the same parameter along the segment
    let euclidean = EuclideanCalculator::default();
    let geoidal = GeoidalCalculator::default();
    let a = Point::new(12.2000, 45.6600);
    let b = Point::new(12.2008, 45.6600);
    let p = Point::new(12.2003, 45.66004);

    let fe = euclidean.on_track_closest_point(&a, &b, &p);
    let fg = geoidal.on_track_closest_point(&a, &b, &p);
    assert!(geoidal.distance(&fe, &fg) < 1.0, "feet disagree: {fe} vs {fg}");
}
