//! Succinct k-d tree.
//!
//! The same logical tree as [`KdTree`](crate::KdTree) stored without child
//! pointers: node `i` has children `2i+1` and `2i+2` in level order. A
//! word-addressed presence bitset mirrors a sparse node→point map — the
//! tree may be arbitrarily unbalanced, so node indexes are sparse and can
//! overflow the address space; insertion past that depth fails with
//! `MaximumTreeDepth` and the caller is expected to `rebalance()`.

use rustc_hash::FxHashMap;
use waymatch_common::{Error, Result};
use waymatch_geometry::select::select_by;
use waymatch_geometry::{Point, Region};

const ROOT: u64 = 0;

#[derive(Debug, Default)]
pub struct SuccinctKdTree {
    /// Presence bitset, addressed in 64-bit words.
    structure: FxHashMap<u64, u64>,
    /// Node index → stored point; a key exists iff its bit is set.
    data: FxHashMap<u64, Point>,
    dimensions: usize,
    precision: f64,
    size: usize,
}

impl SuccinctKdTree {
    pub fn new(dimensions: usize, precision: f64) -> Result<Self> {
        if !(1..=2).contains(&dimensions) {
            return Err(Error::bad_argument(format!(
                "succinct k-d tree supports 1 or 2 dimensions, got {dimensions}"
            )));
        }
        if !(precision >= 0.0) {
            return Err(Error::bad_argument(format!(
                "succinct k-d tree precision must be non-negative, got {precision}"
            )));
        }
        Ok(Self {
            dimensions,
            precision,
            ..Self::default()
        })
    }

    /// Balanced bulk build; places each frame's median at its implicit slot.
    pub fn from_points(dimensions: usize, precision: f64, mut points: Vec<Point>) -> Result<Self> {
        let mut tree = Self::new(dimensions, precision)?;
        tree.place_balanced(&mut points)?;
        Ok(tree)
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    fn is_present(&self, index: u64) -> bool {
        self.structure
            .get(&(index / 64))
            .is_some_and(|word| word & (1 << (index % 64)) != 0)
    }

    fn set_present(&mut self, index: u64) {
        *self.structure.entry(index / 64).or_insert(0) |= 1 << (index % 64);
    }

    /// Children of `i` are `2i+1`, `2i+2`; `None` past the address space.
    fn child(index: u64, right: bool) -> Option<u64> {
        index
            .checked_mul(2)
            .and_then(|v| v.checked_add(if right { 2 } else { 1 }))
    }

    pub fn insert(&mut self, point: Point) -> Result<()> {
        let mut index = ROOT;
        let mut axis = 0;
        loop {
            if !self.is_present(index) {
                self.set_present(index);
                self.data.insert(index, point);
                self.size += 1;
                return Ok(());
            }
            let stored = self.data[&index];
            let right = point.ordinate(axis) >= stored.ordinate(axis);
            match Self::child(index, right) {
                Some(child) => {
                    index = child;
                    axis = (axis + 1) % self.dimensions;
                }
                None => return Err(Error::MaximumTreeDepth(index)),
            }
        }
    }

    pub fn contains(&self, point: &Point) -> bool {
        let mut stack: Vec<(u64, usize)> = vec![(ROOT, 0)];
        while let Some((index, axis)) = stack.pop() {
            if !self.is_present(index) {
                continue;
            }
            let stored = &self.data[&index];
            if stored.equals_with_tolerance(point, self.precision) {
                return true;
            }
            let delta = point.ordinate(axis) - stored.ordinate(axis);
            let next_axis = (axis + 1) % self.dimensions;
            if delta < self.precision {
                if let Some(left) = Self::child(index, false) {
                    stack.push((left, next_axis));
                }
            }
            if delta > -self.precision {
                if let Some(right) = Self::child(index, true) {
                    stack.push((right, next_axis));
                }
            }
        }
        false
    }

    /// Same best-first search as the pointer tree, over implicit children.
    pub fn nearest_neighbour(&self, target: &Point) -> Option<Point> {
        if self.size == 0 {
            return None;
        }
        let mut best: Option<Point> = None;
        let mut best_sq = f64::INFINITY;
        let precision_sq = self.precision * self.precision;

        let mut stack: Vec<(u64, usize)> = vec![(ROOT, 0)];
        while let Some((index, axis)) = stack.pop() {
            if !self.is_present(index) {
                continue;
            }
            let stored = self.data[&index];
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
            let next_axis = (axis + 1) % self.dimensions;
            let (preferred, other) = (Self::child(index, delta >= 0.0), Self::child(index, delta < 0.0));
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

    pub fn range_query(&self, region: &Region) -> Vec<Point> {
        let mut found = Vec::new();
        let mut stack: Vec<(u64, usize)> = vec![(ROOT, 0)];
        while let Some((index, axis)) = stack.pop() {
            if !self.is_present(index) {
                continue;
            }
            let stored = &self.data[&index];
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
                if let Some(left) = Self::child(index, false) {
                    stack.push((left, next_axis));
                }
            }
            if ordinate <= high {
                if let Some(right) = Self::child(index, true) {
                    stack.push((right, next_axis));
                }
            }
        }
        found
    }

    /// Extract every point, clear both structures and re-build balanced.
    /// The deep lopsided paths that exhaust the address space become
    /// logarithmic again.
    pub fn rebalance(&mut self) -> Result<()> {
        let mut points: Vec<Point> = self.data.values().copied().collect();
        points.sort_by(|a, b| a.lex_cmp(b));
        self.structure.clear();
        self.data.clear();
        self.size = 0;
        self.place_balanced(&mut points)
    }

    fn place_balanced(&mut self, points: &mut [Point]) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }
        let n = points.len();
        let mut frames: Vec<(usize, usize, usize, u64)> = vec![(0, n, 0, ROOT)];
        while let Some((begin, end, axis, index)) = frames.pop() {
            if begin >= end {
                continue;
            }
            let median = begin + (end - begin) / 2;
            select_by(points, begin, end - 1, median, &mut |a, b| {
                a.ordinate(axis)
                    .total_cmp(&b.ordinate(axis))
                    .then_with(|| a.lex_cmp(b))
            });
            self.set_present(index);
            self.data.insert(index, points[median]);
            self.size += 1;
            let next_axis = (axis + 1) % self.dimensions;
            let (Some(left), Some(right)) = (Self::child(index, false), Self::child(index, true))
            else {
                return Err(Error::MaximumTreeDepth(index));
            };
            frames.push((begin, median, next_axis, left));
            frames.push((median + 1, end, next_axis, right));
        }
        Ok(())
    }

    /// All stored points, level order.
    pub fn points(&self) -> Vec<Point> {
        let mut indexed: Vec<(u64, Point)> = self.data.iter().map(|(i, p)| (*i, *p)).collect();
        indexed.sort_by_key(|(i, _)| *i);
        indexed.into_iter().map(|(_, p)| p).collect()
    }
}
