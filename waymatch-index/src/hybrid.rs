//! Hybrid point index.
//!
//! An outer region index partitions the plane into *boundary* cells; every
//! boundary cell owns a terminal k-d tree holding the points that fell into
//! it. The outer index only ever answers "which cell", the terminal trees
//! answer the point queries. Terminal trees are owned by this layer and
//! addressed through the slot tag each boundary region carries, so deleting
//! a region from the outer index leaks nothing.

use log::trace;
use waymatch_common::{Error, Result};
use waymatch_geometry::{Point, Region};

use crate::kdtree::KdTree;
use crate::region_tree::RegionTree;

#[derive(Debug)]
pub struct HybridPointIndex<T: RegionTree> {
    outer: T,
    terminals: Vec<KdTree>,
    cell_width: f64,
    cell_height: f64,
    precision: f64,
    size: usize,
}

impl<T: RegionTree> HybridPointIndex<T> {
    /// `cell_width`/`cell_height` size the boundary cells created around
    /// first points; `precision` seeds the terminal trees.
    pub fn new(outer: T, cell_width: f64, cell_height: f64, precision: f64) -> Result<Self> {
        if !(cell_width > 0.0) || !(cell_height > 0.0) {
            return Err(Error::bad_argument(format!(
                "hybrid cell size must be positive, got {cell_width} x {cell_height}"
            )));
        }
        Ok(Self {
            outer,
            terminals: Vec::new(),
            cell_width,
            cell_height,
            precision,
            size: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// The boundary cell containing `point`, if one exists.
    fn boundary_cell(&self, point: &Point) -> Option<Region> {
        let probe = Region::new(point.x, point.y, 0.0, 0.0);
        self.outer
            .query(&probe)
            .into_iter()
            .find(|r| r.is_boundary() && r.contains_point(point))
    }

    fn terminal_of(&self, cell: &Region) -> &KdTree {
        let slot = cell.terminal().expect("boundary cell without terminal tree");
        &self.terminals[slot as usize]
    }

    pub fn insert(&mut self, point: Point) -> Result<()> {
        if let Some(cell) = self.boundary_cell(&point) {
            let slot = cell.terminal().expect("boundary cell without terminal tree");
            self.terminals[slot as usize].insert(point);
            self.size += 1;
            return Ok(());
        }
        // no boundary cell here yet: create one around the point and seed
        // its terminal tree
        let mut cell = Region::new(
            point.x - self.cell_width / 2.0,
            point.y - self.cell_height / 2.0,
            self.cell_width,
            self.cell_height,
        );
        cell.mark_boundary();
        let slot = self.terminals.len() as u32;
        cell.set_terminal(slot);
        let mut terminal = KdTree::new(2, self.precision)?;
        terminal.insert(point);
        self.terminals.push(terminal);
        self.outer.insert(cell)?;
        self.size += 1;
        trace!("hybrid index opened boundary cell {slot} at {point}");
        Ok(())
    }

    pub fn contains(&self, point: &Point) -> bool {
        self.boundary_cell(point)
            .map(|cell| self.terminal_of(&cell).contains(point))
            .unwrap_or(false)
    }

    /// Nearest stored point, dispatched to the boundary cell under the
    /// target. `None` when no cell covers the target.
    pub fn nearest_neighbour(&self, point: &Point) -> Option<Point> {
        let cell = self.boundary_cell(point)?;
        self.terminal_of(&cell).nearest_neighbour(point)
    }

    /// Points inside `region`, gathered from every intersecting boundary
    /// cell's terminal tree.
    pub fn query(&self, region: &Region) -> Vec<Point> {
        let mut found = Vec::new();
        for cell in self.outer.query(region) {
            if !cell.is_boundary() {
                continue;
            }
            found.extend(self.terminal_of(&cell).range_query(region));
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quadtree::RegionQuadTree;
    use crate::rtree::{RTree, RTreeOptions};

    fn quad_outer() -> RegionQuadTree {
        RegionQuadTree::new(Region::new(0.0, 0.0, 100.0, 100.0), 4).unwrap()
    }

    #[test]
    fn test_insert_dispatches_to_cells() {
        let mut index = HybridPointIndex::new(quad_outer(), 10.0, 10.0, 1e-6).unwrap();
        index.insert(Point::new(5.0, 5.0)).unwrap();
        index.insert(Point::new(6.0, 6.0)).unwrap(); // same cell
        index.insert(Point::new(50.0, 50.0)).unwrap(); // new cell
        assert_eq!(index.len(), 3);
        assert_eq!(index.terminals.len(), 2);
        assert!(index.contains(&Point::new(6.0, 6.0)));
        assert!(!index.contains(&Point::new(5.5, 5.5)));
    }

    #[test]
    fn test_nearest_within_cell() {
        let mut index = HybridPointIndex::new(quad_outer(), 20.0, 20.0, 1e-6).unwrap();
        for p in [
            Point::new(10.0, 10.0),
            Point::new(12.0, 10.0),
            Point::new(18.0, 14.0),
        ] {
            index.insert(p).unwrap();
        }
        let nearest = index.nearest_neighbour(&Point::new(11.4, 10.0)).unwrap();
        assert_eq!(nearest, Point::new(12.0, 10.0));
        // far outside every cell
        assert!(index.nearest_neighbour(&Point::new(90.0, 90.0)).is_none());
    }

    #[test]
    fn test_query_spans_cells() {
        let mut index = HybridPointIndex::new(quad_outer(), 10.0, 10.0, 1e-6).unwrap();
        for i in 0..10 {
            index.insert(Point::new(i as f64 * 8.0 + 1.0, 40.0)).unwrap();
        }
        let mut hits = index.query(&Region::new(0.0, 35.0, 40.0, 10.0));
        hits.sort_by(|a, b| a.lex_cmp(b));
        assert_eq!(hits.len(), 5); // x = 1, 9, 17, 25, 33
        assert!(hits.iter().all(|p| p.x <= 40.0));
    }

    #[test]
    fn test_works_over_rtree_outer() {
        let outer = RTree::new(RTreeOptions::default()).unwrap();
        let mut index = HybridPointIndex::new(outer, 5.0, 5.0, 1e-6).unwrap();
        for i in 0..25 {
            index
                .insert(Point::new((i % 5) as f64 * 7.0, (i / 5) as f64 * 7.0))
                .unwrap();
        }
        assert_eq!(index.len(), 25);
        for i in 0..25 {
            assert!(index.contains(&Point::new((i % 5) as f64 * 7.0, (i / 5) as f64 * 7.0)));
        }
    }

    #[test]
    fn test_rejects_bad_cell_size() {
        assert!(HybridPointIndex::new(quad_outer(), 0.0, 1.0, 1e-6).is_err());
        assert!(HybridPointIndex::new(quad_outer(), 1.0, -1.0, 1e-6).is_err());
    }
}
