//! Ordered point sequences.

use serde::{Deserialize, Serialize};

use crate::envelope::Envelope;
use crate::point::Point;
use crate::topology::TopologyCalculator;

/// An immutable ordered sequence of points. Construction removes
/// *consecutive* duplicates, so the joint level is always duplicate-free;
/// non-adjacent repeats (loops) are preserved.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<Point>,
}

impl Polyline {
    pub fn new(points: Vec<Point>) -> Self {
        let mut deduped: Vec<Point> = Vec::with_capacity(points.len());
        for p in points {
            if deduped.last() != Some(&p) {
                deduped.push(p);
            }
        }
        Self { points: deduped }
    }

    pub fn empty() -> Self {
        Self { points: Vec::new() }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn start(&self) -> Option<&Point> {
        self.points.first()
    }

    pub fn end(&self) -> Option<&Point> {
        self.points.last()
    }

    pub fn is_closed(&self) -> bool {
        self.points.len() >= 3 && self.points.first() == self.points.last()
    }

    pub fn envelope(&self) -> Envelope {
        Envelope::from_points(self.points.iter())
    }

    /// Out-of-place reversal.
    pub fn reverse(&self) -> Polyline {
        let mut points = self.points.clone();
        points.reverse();
        Polyline { points }
    }

    /// Concatenate `other` after `self`; a duplicated joint is coalesced.
    pub fn append(&self, other: &Polyline) -> Polyline {
        let mut points = self.points.clone();
        points.extend_from_slice(&other.points);
        Polyline::new(points)
    }

    /// Concatenate `other` before `self`; a duplicated joint is coalesced.
    pub fn prepend(&self, other: &Polyline) -> Polyline {
        other.append(self)
    }

    pub fn length<C: TopologyCalculator + ?Sized>(&self, calc: &C) -> f64 {
        self.points
            .windows(2)
            .map(|w| calc.distance(&w[0], &w[1]))
            .sum()
    }

    /// The on-track point of the polyline closest to `p`. `None` on an
    /// empty polyline; a single-point polyline returns that point.
    pub fn closest_point<C: TopologyCalculator + ?Sized>(
        &self,
        p: &Point,
        calc: &C,
    ) -> Option<Point> {
        self.closest_point_indexed(p, calc).map(|(_, q)| q)
    }

    /// Distance from the start of the polyline to the foot of the
    /// perpendicular from `p`. Non-negative and bounded by the length.
    pub fn along_track_distance<C: TopologyCalculator + ?Sized>(
        &self,
        p: &Point,
        calc: &C,
    ) -> f64 {
        let Some((segment, on_track)) = self.closest_point_indexed(p, calc) else {
            return 0.0;
        };
        let prefix: f64 = self.points[..=segment]
            .windows(2)
            .map(|w| calc.distance(&w[0], &w[1]))
            .sum();
        prefix + calc.distance(&self.points[segment], &on_track)
    }

    /// Split at the vertex nearest to `at`. The cut vertex is shared by both
    /// halves. An empty polyline splits into two empty halves.
    pub fn cut_on_node<C: TopologyCalculator + ?Sized>(
        &self,
        at: &Point,
        calc: &C,
    ) -> (Polyline, Polyline) {
        if self.points.is_empty() {
            return (Polyline::empty(), Polyline::empty());
        }
        let mut nearest = 0usize;
        let mut best = f64::INFINITY;
        for (i, p) in self.points.iter().enumerate() {
            let d = calc.distance(p, at);
            if d < best {
                best = d;
                nearest = i;
            }
        }
        (
            Polyline::new(self.points[..=nearest].to_vec()),
            Polyline::new(self.points[nearest..].to_vec()),
        )
    }

    /// Split at the on-track point nearest to `at`, creating a shared cut
    /// vertex on the interior of a segment when needed.
    pub fn cut_hard<C: TopologyCalculator + ?Sized>(
        &self,
        at: &Point,
        calc: &C,
    ) -> (Polyline, Polyline) {
        let Some((segment, cut)) = self.closest_point_indexed(at, calc) else {
            return (Polyline::empty(), Polyline::empty());
        };
        let mut head = self.points[..=segment].to_vec();
        head.push(cut);
        let mut tail = vec![cut];
        tail.extend_from_slice(&self.points[segment + 1..]);
        (Polyline::new(head), Polyline::new(tail))
    }

    /// Closest on-track point together with the index of the segment start
    /// vertex it lies on.
    fn closest_point_indexed<C: TopologyCalculator + ?Sized>(
        &self,
        p: &Point,
        calc: &C,
    ) -> Option<(usize, Point)> {
        match self.points.len() {
            0 => None,
            1 => Some((0, self.points[0])),
            _ => {
                let mut best: Option<(usize, Point)> = None;
                let mut best_dist = f64::INFINITY;
                for (i, w) in self.points.windows(2).enumerate() {
                    let q = calc.on_track_closest_point(&w[0], &w[1], p);
                    let d = calc.distance(p, &q);
                    if d < best_dist {
                        best_dist = d;
                        best = Some((i, q));
                    }
                }
                best
            }
        }
    }
}

impl std::fmt::Display for Polyline {
    /// WKT `LINESTRING` form; NaN ordinates are emitted as `NaN`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.points.is_empty() {
            return write!(f, "LINESTRING EMPTY");
        }
        write!(f, "LINESTRING (")?;
        for (i, p) in self.points.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} {}", p.x, p.y)?;
        }
        write!(f, ")")
    }
}
