//! Ramer-Douglas-Peucker polyline simplification.
//!
//! Iterative with an explicit span stack; recursion depth on pathological
//! inputs would be O(n). Perpendicular distances come from the topology
//! calculator's on-track projection, so tolerance is metres under the
//! geoidal calculator and coordinate units under the planar one.

use waymatch_common::{Error, Result};

use crate::polyline::Polyline;
use crate::topology::TopologyCalculator;

/// Simplify `line` so that every dropped point is within `tolerance` of the
/// chord replacing it.
pub fn simplify<C: TopologyCalculator + ?Sized>(
    line: &Polyline,
    tolerance: f64,
    calc: &C,
) -> Result<Polyline> {
    if !(tolerance > 0.0) {
        return Err(Error::bad_argument(format!(
            "simplification tolerance must be positive, got {tolerance}"
        )));
    }
    let points = line.points();
    if points.len() <= 2 {
        return Ok(line.clone());
    }

    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[points.len() - 1] = true;

    let mut spans: Vec<(usize, usize)> = vec![(0, points.len() - 1)];
    while let Some((start, end)) = spans.pop() {
        if end - start < 2 {
            continue;
        }
        let mut farthest = start;
        let mut max_distance = 0.0;
        for i in start + 1..end {
            let foot = calc.on_track_closest_point(&points[start], &points[end], &points[i]);
            let d = calc.distance(&points[i], &foot);
            if d > max_distance {
                max_distance = d;
                farthest = i;
            }
        }
        if max_distance > tolerance {
            keep[farthest] = true;
            spans.push((start, farthest));
            spans.push((farthest, end));
        }
    }

    Ok(Polyline::new(
        points
            .iter()
            .zip(&keep)
            .filter_map(|(p, &k)| k.then_some(*p))
            .collect(),
    ))
}
