//! Graham-scan convex hull with a robust orientation predicate.
//!
//! The predicate runs a fast floating-point filter first and falls back to
//! an error-free expansion of the determinant only when the estimated
//! rounding error could flip the sign.

use std::cmp::Ordering;

use crate::point::Point;

/// `ccwerrboundA`: relative error bound of the naive 2x2 determinant.
const CCW_ERROR_BOUND: f64 = 3.330_669_073_875_471_6e-16;

/// Orientation of `c` relative to the directed line `a`→`b`.
/// Positive = counter-clockwise (left turn), negative = clockwise,
/// zero = collinear.
pub fn orientation(a: &Point, b: &Point, c: &Point) -> Ordering {
    let detleft = (b.x - a.x) * (c.y - a.y);
    let detright = (b.y - a.y) * (c.x - a.x);
    let det = detleft - detright;

    let detsum = detleft.abs() + detright.abs();
    if det.abs() >= CCW_ERROR_BOUND * detsum {
        return det.partial_cmp(&0.0).unwrap_or(Ordering::Equal);
    }
    orientation_exact(a, b, c)
}

/// Exact sign of the determinant of the rounded coordinate differences,
/// via two-product / two-sum error-free transformations.
fn orientation_exact(a: &Point, b: &Point, c: &Point) -> Ordering {
    let (lh, ll) = two_product(b.x - a.x, c.y - a.y);
    let (rh, rl) = two_product(b.y - a.y, c.x - a.x);
    // det = (lh + ll) - (rh + rl), accumulated without losing the residues
    let (s1, e1) = two_sum(lh, -rh);
    let (s2, e2) = two_sum(ll, -rl);
    let total = s1 + (e1 + (s2 + e2));
    total.partial_cmp(&0.0).unwrap_or(Ordering::Equal)
}

fn two_product(a: f64, b: f64) -> (f64, f64) {
    let p = a * b;
    (p, a.mul_add(b, -p))
}

fn two_sum(a: f64, b: f64) -> (f64, f64) {
    let s = a + b;
    let bv = s - a;
    let av = s - bv;
    (s, (a - av) + (b - bv))
}

/// Convex hull of a point set, counter-clockwise starting from the pivot
/// (lowest y, then lowest x). Interior and collinear boundary points are
/// dropped. Degenerate inputs return what hull exists: the deduplicated
/// points for fewer than three distinct inputs, a two-point "hull" for a
/// fully collinear set.
pub fn convex_hull(points: &[Point]) -> Vec<Point> {
    let mut distinct: Vec<Point> = points.to_vec();
    distinct.sort_by(|p, q| p.lex_cmp(q));
    distinct.dedup();
    if distinct.len() < 3 {
        return distinct;
    }

    let pivot_idx = distinct
        .iter()
        .enumerate()
        .min_by(|(_, p), (_, q)| p.y.total_cmp(&q.y).then_with(|| p.x.total_cmp(&q.x)))
        .map(|(i, _)| i)
        .unwrap_or(0);
    let pivot = distinct.swap_remove(pivot_idx);

    // polar-angle order around the pivot; collinear ties farthest first
    distinct.sort_by(|p, q| match orientation(&pivot, p, q) {
        Ordering::Greater => Ordering::Less,
        Ordering::Less => Ordering::Greater,
        Ordering::Equal => pivot.distance_sq(q).total_cmp(&pivot.distance_sq(p)),
    });
    // of each collinear run through the pivot only the farthest can be a
    // hull vertex; the rest would poison the scan
    distinct.dedup_by(|next, kept| orientation(&pivot, kept, next) == Ordering::Equal);

    let mut stack: Vec<Point> = Vec::with_capacity(distinct.len() + 1);
    stack.push(pivot);
    for p in distinct {
        while stack.len() >= 2
            && orientation(&stack[stack.len() - 2], &stack[stack.len() - 1], &p)
                != Ordering::Greater
        {
            stack.pop();
        }
        stack.push(p);
    }
    stack
}
