//! Sweep-line segment intersection.
//!
//! Bentley-Ottmann shape: events ordered by x then y, a status structure
//! ordered by the y of each active segment at the sweep position, neighbour
//! tests on entry, exit and crossing-induced swaps. Pairs are reported once
//! through a seen set, so coincident events cannot duplicate or loop.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::hull::orientation;
use crate::point::Point;
use crate::polyline::Polyline;

/// A sweep segment, normalised so that `start` is not to the right of `end`
/// (ties on x broken by y).
#[derive(Debug, Clone, Copy)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

impl Segment {
    pub fn new(a: Point, b: Point) -> Self {
        if a.lex_cmp(&b) == Ordering::Greater {
            Self { start: b, end: a }
        } else {
            Self { start: a, end: b }
        }
    }

    /// y of the segment at sweep position `x`; a vertical segment answers
    /// with its lower end.
    fn y_at(&self, x: f64) -> f64 {
        let dx = self.end.x - self.start.x;
        if dx == 0.0 {
            return self.start.y;
        }
        let t = ((x - self.start.x) / dx).clamp(0.0, 1.0);
        self.start.y + t * (self.end.y - self.start.y)
    }

    fn contains_collinear(&self, p: &Point) -> bool {
        p.x >= self.start.x.min(self.end.x)
            && p.x <= self.start.x.max(self.end.x)
            && p.y >= self.start.y.min(self.end.y)
            && p.y <= self.start.y.max(self.end.y)
    }
}

/// A reported crossing between segments `first` and `second` (indexes into
/// the caller's segment list, `first < second`).
#[derive(Debug, Clone, Copy)]
pub struct Crossing {
    pub point: Point,
    pub first: usize,
    pub second: usize,
}

#[derive(Debug, Clone, Copy)]
enum EventKind {
    Enter(usize),
    Cross(usize, usize),
    Exit(usize),
}

#[derive(Debug, Clone, Copy)]
struct Event {
    x: f64,
    y: f64,
    kind: EventKind,
}

impl Event {
    fn rank(&self) -> u8 {
        match self.kind {
            EventKind::Enter(_) => 0,
            EventKind::Cross(..) => 1,
            EventKind::Exit(_) => 2,
        }
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Event {}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        self.x
            .total_cmp(&other.x)
            .then_with(|| self.y.total_cmp(&other.y))
            .then_with(|| self.rank().cmp(&other.rank()))
    }
}

/// All crossing points between the segments, pairs reported once.
pub fn segment_intersections(segments: &[Segment]) -> Vec<Crossing> {
    let mut events: BinaryHeap<Reverse<Event>> = BinaryHeap::with_capacity(segments.len() * 2);
    for (i, s) in segments.iter().enumerate() {
        events.push(Reverse(Event {
            x: s.start.x,
            y: s.start.y,
            kind: EventKind::Enter(i),
        }));
        events.push(Reverse(Event {
            x: s.end.x,
            y: s.end.y,
            kind: EventKind::Exit(i),
        }));
    }

    let mut status: Vec<usize> = Vec::new();
    let mut seen: Vec<(usize, usize)> = Vec::new();
    let mut crossings: Vec<Crossing> = Vec::new();

    while let Some(Reverse(event)) = events.pop() {
        let sweep_x = event.x;
        match event.kind {
            EventKind::Enter(i) => {
                let key = (segments[i].y_at(sweep_x), i);
                let pos = status
                    .binary_search_by(|&j| {
                        (segments[j].y_at(sweep_x), j)
                            .partial_cmp(&key)
                            .unwrap_or(Ordering::Equal)
                    })
                    .unwrap_or_else(|p| p);
                status.insert(pos, i);
                if pos > 0 {
                    test_pair(
                        segments, status[pos - 1], i, sweep_x, &mut seen, &mut crossings,
                        &mut events,
                    );
                }
                if pos + 1 < status.len() {
                    test_pair(
                        segments, i, status[pos + 1], sweep_x, &mut seen, &mut crossings,
                        &mut events,
                    );
                }
            }
            EventKind::Exit(i) => {
                if let Some(pos) = status.iter().position(|&j| j == i) {
                    status.remove(pos);
                    if pos > 0 && pos < status.len() {
                        test_pair(
                            segments, status[pos - 1], status[pos], sweep_x, &mut seen,
                            &mut crossings, &mut events,
                        );
                    }
                }
            }
            EventKind::Cross(i, j) => {
                let (Some(pi), Some(pj)) = (
                    status.iter().position(|&s| s == i),
                    status.iter().position(|&s| s == j),
                ) else {
                    continue;
                };
                status.swap(pi, pj);
                let (lo, hi) = (pi.min(pj), pi.max(pj));
                if lo > 0 {
                    test_pair(
                        segments, status[lo - 1], status[lo], sweep_x, &mut seen,
                        &mut crossings, &mut events,
                    );
                }
                if hi + 1 < status.len() {
                    test_pair(
                        segments, status[hi], status[hi + 1], sweep_x, &mut seen,
                        &mut crossings, &mut events,
                    );
                }
            }
        }
    }
    crossings
}

#[allow(clippy::too_many_arguments)]
fn test_pair(
    segments: &[Segment],
    i: usize,
    j: usize,
    sweep_x: f64,
    seen: &mut Vec<(usize, usize)>,
    crossings: &mut Vec<Crossing>,
    events: &mut BinaryHeap<Reverse<Event>>,
) {
    if i == j {
        return;
    }
    let pair = (i.min(j), i.max(j));
    if seen.contains(&pair) {
        return;
    }
    let Some(point) = intersect(&segments[i], &segments[j]) else {
        return;
    };
    seen.push(pair);
    crossings.push(Crossing {
        point,
        first: pair.0,
        second: pair.1,
    });
    // a crossing ahead of the sweep reorders the status there
    if point.x > sweep_x {
        events.push(Reverse(Event {
            x: point.x,
            y: point.y,
            kind: EventKind::Cross(i, j),
        }));
    }
}

/// Intersection point of two closed segments, or `None`. Touching at an
/// endpoint counts; collinear overlap reports one representative point.
pub fn intersect(a: &Segment, b: &Segment) -> Option<Point> {
    let o1 = orientation(&a.start, &a.end, &b.start);
    let o2 = orientation(&a.start, &a.end, &b.end);
    let o3 = orientation(&b.start, &b.end, &a.start);
    let o4 = orientation(&b.start, &b.end, &a.end);

    // proper crossing: each segment straddles the other's line
    if ((o1 == Ordering::Greater && o2 == Ordering::Less)
        || (o1 == Ordering::Less && o2 == Ordering::Greater))
        && ((o3 == Ordering::Greater && o4 == Ordering::Less)
            || (o3 == Ordering::Less && o4 == Ordering::Greater))
    {
        let d1x = a.end.x - a.start.x;
        let d1y = a.end.y - a.start.y;
        let d2x = b.end.x - b.start.x;
        let d2y = b.end.y - b.start.y;
        let denom = d1x * d2y - d1y * d2x;
        let t = ((b.start.x - a.start.x) * d2y - (b.start.y - a.start.y) * d2x) / denom;
        return Some(Point::new(a.start.x + t * d1x, a.start.y + t * d1y));
    }

    // improper: an endpoint lying on the other segment
    if o1 == Ordering::Equal && a.contains_collinear(&b.start) {
        return Some(b.start);
    }
    if o2 == Ordering::Equal && a.contains_collinear(&b.end) {
        return Some(b.end);
    }
    if o3 == Ordering::Equal && b.contains_collinear(&a.start) {
        return Some(a.start);
    }
    if o4 == Ordering::Equal && b.contains_collinear(&a.end) {
        return Some(a.end);
    }
    None
}

/// Crossing points between two polylines, deduplicated within `tolerance`.
pub fn polyline_intersections(a: &Polyline, b: &Polyline, tolerance: f64) -> Vec<Point> {
    let mut segments: Vec<Segment> = Vec::new();
    for w in a.points().windows(2) {
        segments.push(Segment::new(w[0], w[1]));
    }
    let first_of_b = segments.len();
    for w in b.points().windows(2) {
        segments.push(Segment::new(w[0], w[1]));
    }

    let mut points: Vec<Point> = Vec::new();
    for crossing in segment_intersections(&segments) {
        // only pairs spanning the two polylines
        if crossing.second < first_of_b || crossing.first >= first_of_b {
            continue;
        }
        if !points
            .iter()
            .any(|p| p.equals_with_tolerance(&crossing.point, tolerance))
        {
            points.push(crossing.point);
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(ax: f64, ay: f64, bx: f64, by: f64) -> Segment {
        Segment::new(Point::new(ax, ay), Point::new(bx, by))
    }

    #[test]
    fn test_proper_crossing() {
        let p = intersect(&seg(0.0, 0.0, 2.0, 2.0), &seg(0.0, 2.0, 2.0, 0.0)).unwrap();
        assert!(p.equals_with_tolerance(&Point::new(1.0, 1.0), 1e-12));
    }

    #[test]
    fn test_touching_endpoint() {
        let p = intersect(&seg(0.0, 0.0, 1.0, 1.0), &seg(1.0, 1.0, 2.0, 0.0)).unwrap();
        assert_eq!(p, Point::new(1.0, 1.0));
    }

    #[test]
    fn test_parallel_disjoint() {
        assert!(intersect(&seg(0.0, 0.0, 1.0, 0.0), &seg(0.0, 1.0, 1.0, 1.0)).is_none());
        // collinear but separated
        assert!(intersect(&seg(0.0, 0.0, 1.0, 0.0), &seg(2.0, 0.0, 3.0, 0.0)).is_none());
    }

    #[test]
    fn test_sweep_reports_each_pair_once() {
        // three segments through one neighbourhood, two crossings
        let segments = vec![
            seg(0.0, 0.0, 4.0, 4.0),
            seg(0.0, 4.0, 4.0, 0.0),
            seg(0.0, 3.0, 4.0, 3.0),
        ];
        let crossings = segment_intersections(&segments);
        assert_eq!(crossings.len(), 3);
        let mut pairs: Vec<_> = crossings.iter().map(|c| (c.first, c.second)).collect();
        pairs.sort_unstable();
        pairs.dedup();
        assert_eq!(pairs.len(), 3);
    }

    #[test]
    fn test_vertical_segment() {
        let p = intersect(&seg(1.0, -1.0, 1.0, 1.0), &seg(0.0, 0.0, 2.0, 0.0)).unwrap();
        assert!(p.equals_with_tolerance(&Point::new(1.0, 0.0), 1e-12));
    }

    #[test]
    fn test_polyline_intersections() {
        let a = Polyline::new(vec![
            Point::new(0.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(2.0, 2.0),
        ]);
        let b = Polyline::new(vec![Point::new(1.0, -1.0), Point::new(1.0, 1.0)]);
        let points = polyline_intersections(&a, &b, 1e-9);
        assert_eq!(points.len(), 1);
        assert!(points[0].equals_with_tolerance(&Point::new(1.0, 0.0), 1e-9));
        // crossings inside a single polyline are not reported
        let self_cross = Polyline::new(vec![
            Point::new(0.0, 0.0),
            Point::new(2.0, 2.0),
            Point::new(2.0, 0.0),
            Point::new(0.0, 2.0),
        ]);
        assert!(polyline_intersections(&self_cross, &Polyline::empty(), 1e-9).is_empty());
    }
}
