//! Point k-d tree.
//!
//! Cyclic axis selection, bulk construction by quick-select medians, and a
//! best-first nearest-neighbour descent that prunes on the splitting-plane
//! distance and exits early once the best candidate is within the index
//! precision. Nodes live in an arena; child links are slots.

use waymatch_common::{Error, Result};
use waymatch_geometry::select::select_by;
use waymatch_geometry::{Point, Region};

#[derive(Debug)]
struct KdNode {
    point: Point,
    left: Option<u32>,
    right: Option<u32>,
}

#[derive(Debug)]
pub struct KdTree {
    nodes: Vec<KdNode>,
    root: Option<u32>,
    dimensions: usize,
    precision: f64,
}

impl KdTree {
    /// `dimensions` must match the stored points (1 or 2); `precision` is
    /// the tolerant-equality bound and the nearest-neighbour early exit.
    pub fn new(dimensions: usize, precision: f64) -> Result<Self> {
        if !(1..=2).contains(&dimensions) {
            return Err(Error::bad_argument(format!(
                "k-d tree supports 1 or 2 dimensions, got {dimensions}"
            )));
        }
        if !(precision >= 0.0) {
            return Err(Error::bad_argument(format!(
                "k-d tree precision must be non-negative, got {precision}"
            )));
        }
        Ok(Self {
            nodes: Vec::new(),
            root: None,
            dimensions,
            precision,
        })
    }

    /// Balanced bulk build: iterative frames, median of each frame by
    /// quick-select on the frame's axis.
    pub fn from_points(dimensions: usize, precision: f64, mut points: Vec<Point>) -> Result<Self> {
        let mut tree = Self::new(dimensions, precision)?;
        if points.is_empty() {
            return Ok(tree);
        }
        tree.nodes.reserve(points.len());

        enum Side {
            Root,
            Left(u32),
            Right(u32),
        }
        // (begin, end) is half-open; axis cycles per level
        let mut frames: Vec<(usize, usize, usize, Side)> =
            vec![(0, points.len(), 0, Side::Root)];
        while let Some((begin, end, axis, side)) = frames.pop() {
            if begin >= end {
                continue;
            }
            let median = begin + (end - begin) / 2;
            select_by(&mut points, begin, end - 1, median, &mut |a, b| {
                a.ordinate(axis)
                    .total_cmp(&b.ordinate(axis))
                    .then_with(|| a.lex_cmp(b))
            });
            let slot = tree.nodes.len() as u32;
            tree.nodes.push(KdNode {
                point: points[median],
                left: None,
                right: None,
            });
            match side {
                Side::Root => tree.root = Some(slot),
                Side::Left(parent) => tree.nodes[parent as usize].left = Some(slot),
                Side::Right(parent) => tree.nodes[parent as usize].right = Some(slot),
            }
            let next_axis = (axis + 1) % tree.dimensions;
            frames.push((begin, median, next_axis, Side::Left(slot)));
            frames.push((median + 1, end, next_axis, Side::Right(slot)));
        }
        Ok(tree)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn precision(&self) -> f64 {
        self.precision
    }

    pub fn insert(&mut self, point: Point) {
        let slot = self.nodes.len() as u32;
        let Some(mut node) = self.root else {
            self.nodes.push(KdNode {
                point,
                left: None,
                right: None,
            });
            self.root = Some(slot);
            return;
        };
        let mut axis = 0;
        loop {
            let go_left =
                point.ordinate(axis) < self.nodes[node as usize].point.ordinate(axis);
            let next = if go_left {
                self.nodes[node as usize].left
            } else {
                self.nodes[node as usize].right
            };
            match next {
                Some(child) => {
                    node = child;
                    axis = (axis + 1) % self.dimensions;
                }
                None => {
                    self.nodes.push(KdNode {
                        point,
                        left: None,
                        right: None,
                    });
                    if go_left {
                        self.nodes[node as usize].left = Some(slot);
                    } else {
                        self.nodes[node as usize].right = Some(slot);
                    }
                    return;
                }
            }
        }
    }

    /// Tolerant membership: any stored point within `precision` per axis.
    pub fn contains(&self, point: &Point) -> bool {
        let mut stack: Vec<(u32, usize)> = self.root.map(|r| (r, 0)).into_iter().collect();
        while let Some((node, axis)) = stack.pop() {
            let stored = &self.nodes[node as usize].point;
            if stored.equals_with_tolerance(point, self.precision) {
                return true;
            }
            let delta = point.ordinate(axis) - stored.ordinate(axis);
            let next_axis = (axis + 1) % self.dimensions;
            // the tolerance band can straddle the splitting plane
            if delta < self.precision {
                if let Some(left) = self.nodes[node as usize].left {
                    stack.push((left, next_axis));
                }
            }
            if delta > -self.precision {
                if let Some(right) = self.nodes[node as usize].right {
                    stack.push((right, next_axis));
                }
            }
        }
        false
    }

    /// Closest stored point to `target`; distance ties resolve to the
    /// lexicographically smaller point. Best-first: the preferred half is
    /// pushed once, the other half only when the splitting plane is closer
    /// than the current best.
    pub fn nearest_neighbour(&self, target: &Point) -> Option<Point> {
        let root = self.root?;
        let mut best: Option<Point> = None;
        let mut best_sq = f64::INFINITY;
        let precision_sq = self.precision * self.precision;

        let mut stack: Vec<(u32, usize)> = vec![(root, 0)];
        while let Some((node, axis)) = stack.pop() {
            let stored = self.nodes[node as usize].point;
            let d_sq = stored.distance_sq(target);
            let improves = d_sq < best_sq
                || (d_sq == best_sq
                    && best
                        .as_ref()
                        .map(|b| stored.lex_cmp(b) == std::cmp::Ordering::Less)
                        .unwrap_or(true));
            if improves {
                best_sq = d_sq;
                best = Some(stored);
                if best_sq <= precision_sq {
                    break;
                }
            }

            let delta = target.ordinate(axis) - stored.ordinate(axis);
            let (preferred, other) = if delta < 0.0 {
                (self.nodes[node as usize].left, self.nodes[node as usize].right)
            } else {
                (self.nodes[node as usize].right, self.nodes[node as usize].left)
            };
            let next_axis = (axis + 1) % self.dimensions;
            // push the far half first so the preferred one is explored next
            if delta * delta < best_sq {
                if let Some(far) = other {
                    stack.push((far, next_axis));
                }
            }
            if let Some(near) = preferred {
                stack.push((near, next_axis));
            }
        }
        best
    }

    /// All stored points inside `region`, classical axis-pruned descent.
    pub fn range_query(&self, region: &Region) -> Vec<Point> {
        let mut found = Vec::new();
        let mut stack: Vec<(u32, usize)> = self.root.map(|r| (r, 0)).into_iter().collect();
        while let Some((node, axis)) = stack.pop() {
            let stored = &self.nodes[node as usize].point;
            if region.contains_point(stored) {
                found.push(*stored);
            }
            let (low, high) = if axis == 0 {
                (region.x(), region.max_x())
            } else {
                (region.y(), region.max_y())
            };
            let ordinate = stored.ordinate(axis);
            let next_axis = (axis + 1) % self.dimensions;
            if ordinate >= low {
                if let Some(left) = self.nodes[node as usize].left {
                    stack.push((left, next_axis));
                }
            }
            if ordinate <= high {
                if let Some(right) = self.nodes[node as usize].right {
                    stack.push((right, next_axis));
                }
            }
        }
        found
    }

    /// All stored points, in arena order.
    pub fn points(&self) -> Vec<Point> {
        self.nodes.iter().map(|n| n.point).collect()
    }
}
