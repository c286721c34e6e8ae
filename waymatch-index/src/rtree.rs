//! Dynamic R-tree.
//!
//! Guttman structure on an arena of `u32`-addressed nodes: `choose_leaf`
//! descends by least enlargement, overflow splits with the linear
//! pick-seeds heuristic, `adjust_tree` propagates tightening and splits to
//! the root, and removal condenses under-full nodes by reinserting their
//! load from the top. Parent links are arena slots, never owning
//! references.

use log::debug;
use waymatch_common::{Error, Result};
use waymatch_geometry::Region;

use crate::region_tree::RegionTree;

/// Fill bounds per node (root excepted, which may hold fewer).
#[derive(Debug, Clone, Copy)]
pub struct RTreeOptions {
    pub min_objects: usize,
    pub max_objects: usize,
}

impl Default for RTreeOptions {
    fn default() -> Self {
        Self {
            min_objects: 2,
            max_objects: 8,
        }
    }
}

#[derive(Debug, Default)]
struct RNode {
    /// MBR of the children (inner) or entries (leaf); kept exact by
    /// `tighten`.
    region: Region,
    parent: Option<u32>,
    children: Vec<u32>,
    entries: Vec<Region>,
    leaf: bool,
}

#[derive(Debug)]
pub struct RTree {
    nodes: Vec<RNode>,
    root: u32,
    options: RTreeOptions,
    size: usize,
    free: Vec<u32>,
}

impl RTree {
    pub fn new(options: RTreeOptions) -> Result<Self> {
        if options.min_objects < 1 || options.max_objects < 2 * options.min_objects {
            return Err(Error::bad_argument(format!(
                "r-tree fill bounds want 1 <= min and 2*min <= max, got {}..{}",
                options.min_objects, options.max_objects
            )));
        }
        Ok(Self {
            nodes: vec![RNode {
                region: Region::null(),
                leaf: true,
                ..RNode::default()
            }],
            root: 0,
            options,
            size: 0,
            free: Vec::new(),
        })
    }

    pub fn len(&self) -> usize {
        self.size
    }

    fn alloc(&mut self, node: RNode) -> u32 {
        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot as usize] = node;
                slot
            }
            None => {
                self.nodes.push(node);
                (self.nodes.len() - 1) as u32
            }
        }
    }

    fn load_of(&self, node: u32) -> usize {
        let n = &self.nodes[node as usize];
        if n.leaf {
            n.entries.len()
        } else {
            n.children.len()
        }
    }

    /// Recompute `node.region` as the exact MBR of its load.
    fn tighten(&mut self, node: u32) {
        let mut mbr = Region::null();
        if self.nodes[node as usize].leaf {
            for entry in &self.nodes[node as usize].entries {
                mbr.expand_to_include(entry);
            }
        } else {
            let children = self.nodes[node as usize].children.clone();
            for child in children {
                mbr.expand_to_include(&self.nodes[child as usize].region);
            }
        }
        self.nodes[node as usize].region = mbr;
    }

    /// Descend by minimum enlargement, ties on smaller area.
    fn choose_leaf(&self, region: &Region) -> u32 {
        let mut node = self.root;
        while !self.nodes[node as usize].leaf {
            let mut best = node;
            let mut best_cost = (f64::INFINITY, f64::INFINITY);
            for &child in &self.nodes[node as usize].children {
                let child_region = &self.nodes[child as usize].region;
                let mut grown = child_region.clone();
                grown.expand_to_include(region);
                let enlargement = grown.euclidean_area() - child_region.euclidean_area();
                let cost = (enlargement, child_region.euclidean_area());
                if cost < best_cost {
                    best_cost = cost;
                    best = child;
                }
            }
            node = best;
        }
        node
    }

    /// Linear pick-seeds over the node's load: the pair with the greatest
    /// normalised separation on either axis.
    fn pick_seeds(regions: &[Region]) -> (usize, usize) {
        let mut best_pair = (0, 1);
        let mut best_separation = f64::NEG_INFINITY;
        for axis in 0..2 {
            let (lo, hi): (fn(&Region) -> f64, fn(&Region) -> f64) = if axis == 0 {
                (Region::x, Region::max_x)
            } else {
                (Region::y, Region::max_y)
            };
            // entry with the highest low side and entry with the lowest
            // high side; width of the whole set normalises
            let mut highest_low = 0;
            let mut lowest_high = 0;
            let mut min_lo = f64::INFINITY;
            let mut max_hi = f64::NEG_INFINITY;
            for (i, r) in regions.iter().enumerate() {
                if lo(r) > lo(&regions[highest_low]) {
                    highest_low = i;
                }
                if hi(r) < hi(&regions[lowest_high]) {
                    lowest_high = i;
                }
                min_lo = min_lo.min(lo(r));
                max_hi = max_hi.max(hi(r));
            }
            let width = max_hi - min_lo;
            if width <= 0.0 || highest_low == lowest_high {
                continue;
            }
            let separation = (lo(&regions[highest_low]) - hi(&regions[lowest_high])).abs() / width;
            if separation > best_separation {
                best_separation = separation;
                best_pair = (highest_low.min(lowest_high), highest_low.max(lowest_high));
            }
        }
        best_pair
    }

    /// Distribute indices into two groups seeded at `seeds`; each goes to
    /// the group whose MBR needs least enlargement, ties by smaller area
    /// then smaller count. Fill bounds are honoured.
    fn distribute(
        &self,
        regions: &[Region],
        seeds: (usize, usize),
    ) -> (Vec<usize>, Vec<usize>) {
        let total = regions.len();
        let mut first = vec![seeds.0];
        let mut second = vec![seeds.1];
        let mut first_mbr = regions[seeds.0].clone();
        let mut second_mbr = regions[seeds.1].clone();

        for i in 0..total {
            if i == seeds.0 || i == seeds.1 {
                continue;
            }
            let remaining = total - i; // pessimistic, only used for the floor
            if first.len() + remaining <= self.options.min_objects {
                first.push(i);
                first_mbr.expand_to_include(&regions[i]);
                continue;
            }
            if second.len() + remaining <= self.options.min_objects {
                second.push(i);
                second_mbr.expand_to_include(&regions[i]);
                continue;
            }

            let mut first_grown = first_mbr.clone();
            first_grown.expand_to_include(&regions[i]);
            let mut second_grown = second_mbr.clone();
            second_grown.expand_to_include(&regions[i]);
            let first_cost = first_grown.euclidean_area() - first_mbr.euclidean_area();
            let second_cost = second_grown.euclidean_area() - second_mbr.euclidean_area();

            let to_first = first_cost < second_cost
                || (first_cost == second_cost
                    && (first_mbr.euclidean_area() < second_mbr.euclidean_area()
                        || (first_mbr.euclidean_area() == second_mbr.euclidean_area()
                            && first.len() <= second.len())));
            if to_first {
                first.push(i);
                first_mbr = first_grown;
            } else {
                second.push(i);
                second_mbr = second_grown;
            }
        }
        (first, second)
    }

    /// Split an over-full node in place; returns the new sibling.
    fn split_node(&mut self, node: u32) -> u32 {
        let leaf = self.nodes[node as usize].leaf;
        let sibling = self.alloc(RNode {
            region: Region::null(),
            parent: self.nodes[node as usize].parent,
            leaf,
            ..RNode::default()
        });

        if leaf {
            let entries = std::mem::take(&mut self.nodes[node as usize].entries);
            let seeds = Self::pick_seeds(&entries);
            let (first, second) = self.distribute(&entries, seeds);
            let pick = |idx: &[usize]| -> Vec<Region> {
                idx.iter().map(|&i| entries[i].clone()).collect()
            };
            self.nodes[node as usize].entries = pick(&first);
            self.nodes[sibling as usize].entries = pick(&second);
        } else {
            let children = std::mem::take(&mut self.nodes[node as usize].children);
            let child_regions: Vec<Region> = children
                .iter()
                .map(|&c| self.nodes[c as usize].region.clone())
                .collect();
            let seeds = Self::pick_seeds(&child_regions);
            let (first, second) = self.distribute(&child_regions, seeds);
            let pick = |idx: &[usize]| -> Vec<u32> { idx.iter().map(|&i| children[i]).collect() };
            self.nodes[node as usize].children = pick(&first);
            let second_children = pick(&second);
            for &c in &second_children {
                self.nodes[c as usize].parent = Some(sibling);
            }
            self.nodes[sibling as usize].children = second_children;
        }
        self.tighten(node);
        self.tighten(sibling);
        sibling
    }

    /// Walk up from `node`, tightening MBRs and absorbing a pending split.
    fn adjust_tree(&mut self, mut node: u32, mut split: Option<u32>) {
        loop {
            self.tighten(node);
            let parent = self.nodes[node as usize].parent;
            match parent {
                None => {
                    if let Some(sibling) = split {
                        // the root split: both survivors move under a new one
                        let new_root = self.alloc(RNode {
                            region: Region::null(),
                            parent: None,
                            children: vec![node, sibling],
                            entries: Vec::new(),
                            leaf: false,
                        });
                        self.nodes[node as usize].parent = Some(new_root);
                        self.nodes[sibling as usize].parent = Some(new_root);
                        self.root = new_root;
                        self.tighten(new_root);
                        debug!("r-tree grew a new root (slot {new_root})");
                    }
                    return;
                }
                Some(parent) => {
                    if let Some(sibling) = split {
                        self.nodes[parent as usize].children.push(sibling);
                        self.nodes[sibling as usize].parent = Some(parent);
                        split = if self.nodes[parent as usize].children.len()
                            > self.options.max_objects
                        {
                            Some(self.split_node(parent))
                        } else {
                            None
                        };
                    }
                    node = parent;
                }
            }
        }
    }

    /// Leaf holding an entry equal to `region`, by intersection descent.
    fn find_leaf(&self, region: &Region) -> Option<u32> {
        let mut stack = vec![self.root];
        while let Some(node) = stack.pop() {
            let n = &self.nodes[node as usize];
            if !n.region.intersects(region) {
                continue;
            }
            if n.leaf {
                if n.entries.iter().any(|e| e == region) {
                    return Some(node);
                }
            } else {
                stack.extend(n.children.iter().copied());
            }
        }
        None
    }

    /// Remove under-full nodes on the path from `leaf` to the root and
    /// reinsert their orphaned load from the top.
    fn condense_tree(&mut self, leaf: u32) {
        let mut node = leaf;
        let mut orphans: Vec<Region> = Vec::new();
        while let Some(parent) = self.nodes[node as usize].parent {
            if self.load_of(node) < self.options.min_objects {
                self.nodes[parent as usize]
                    .children
                    .retain(|&c| c != node);
                self.collect_entries(node, &mut orphans);
                self.release_subtree(node);
            } else {
                self.tighten(node);
            }
            node = parent;
        }
        self.tighten(self.root);

        // root of a single inner child collapses onto that child
        if !self.nodes[self.root as usize].leaf
            && self.nodes[self.root as usize].children.len() == 1
        {
            let only = self.nodes[self.root as usize].children[0];
            self.free.push(self.root);
            self.nodes[only as usize].parent = None;
            self.root = only;
        }

        if !orphans.is_empty() {
            debug!("r-tree condense reinserts {} entries", orphans.len());
            self.size -= orphans.len();
            for region in orphans {
                self.insert_entry(region);
            }
        }
    }

    fn collect_entries(&self, node: u32, into: &mut Vec<Region>) {
        let mut stack = vec![node];
        while let Some(n) = stack.pop() {
            let current = &self.nodes[n as usize];
            into.extend(current.entries.iter().cloned());
            stack.extend(current.children.iter().copied());
        }
    }

    fn release_subtree(&mut self, node: u32) {
        let mut stack = vec![node];
        while let Some(n) = stack.pop() {
            stack.extend(self.nodes[n as usize].children.iter().copied());
            self.nodes[n as usize] = RNode::default();
            self.free.push(n);
        }
    }

    fn insert_entry(&mut self, region: Region) {
        let leaf = self.choose_leaf(&region);
        self.nodes[leaf as usize].entries.push(region);
        self.size += 1;
        let split = if self.nodes[leaf as usize].entries.len() > self.options.max_objects {
            Some(self.split_node(leaf))
        } else {
            None
        };
        self.adjust_tree(leaf, split);
    }
}

impl RegionTree for RTree {
    fn is_empty(&self) -> bool {
        self.size == 0
    }

    fn insert(&mut self, region: Region) -> Result<()> {
        if region.is_null() {
            return Err(Error::bad_argument("cannot index the null region"));
        }
        self.insert_entry(region);
        Ok(())
    }

    fn remove(&mut self, region: &Region) -> Result<bool> {
        let Some(leaf) = self.find_leaf(region) else {
            return Ok(false);
        };
        let entries = &mut self.nodes[leaf as usize].entries;
        let Some(pos) = entries.iter().position(|e| e == region) else {
            return Ok(false);
        };
        entries.remove(pos);
        self.size -= 1;
        self.condense_tree(leaf);
        Ok(true)
    }

    fn query(&self, region: &Region) -> Vec<Region> {
        let mut found = Vec::new();
        let mut stack = vec![self.root];
        while let Some(node) = stack.pop() {
            let n = &self.nodes[node as usize];
            if !n.region.intersects(region) {
                continue;
            }
            if n.leaf {
                found.extend(n.entries.iter().filter(|e| e.intersects(region)).cloned());
            } else {
                stack.extend(n.children.iter().copied());
            }
        }
        found
    }
}
