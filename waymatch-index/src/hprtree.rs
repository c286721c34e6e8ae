//! Hilbert-packed R-tree.
//!
//! Build-once, read-many. `insert` collects `(envelope, item)` pairs;
//! `build()` sorts them by the Hilbert code of their envelope midpoint and
//! packs them bottom-up into fixed-capacity layers. Node MBRs live in one
//! flat `f64` array, four values per node, with `layer_start_index`
//! recording each layer's node offset. Any mutation after `build()` fails
//! with `BuildLocked`.

use log::debug;
use waymatch_common::{Error, Result};
use waymatch_geometry::hilbert::{unit_to_hilbert, HPR_HILBERT_ORDER};
use waymatch_geometry::{Envelope, Region};

use crate::region_tree::RegionTree;

/// Default fan-out of a packed node.
pub const DEFAULT_NODE_CAPACITY: usize = 16;

#[derive(Debug)]
pub struct HprTree<T> {
    items: Vec<(Envelope, T)>,
    /// Four doubles per node: min_x, min_y, max_x, max_y.
    node_bounds: Vec<f64>,
    /// Node offset of each layer, leaf layer first; a final entry holds the
    /// total node count.
    layer_start_index: Vec<usize>,
    node_capacity: usize,
    extent: Envelope,
    built: bool,
}

impl<T> HprTree<T> {
    pub fn new() -> Self {
        Self::with_node_capacity(DEFAULT_NODE_CAPACITY)
    }

    pub fn with_node_capacity(node_capacity: usize) -> Self {
        Self {
            items: Vec::new(),
            node_bounds: Vec::new(),
            layer_start_index: Vec::new(),
            node_capacity: node_capacity.max(2),
            extent: Envelope::NULL,
            built: false,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    pub fn insert(&mut self, envelope: Envelope, item: T) -> Result<()> {
        if self.built {
            return Err(Error::BuildLocked("hpr-tree insert after build"));
        }
        self.extent.expand_to_include_envelope(&envelope);
        self.items.push((envelope, item));
        Ok(())
    }

    /// Sort by Hilbert code and pack the layers. Idempotent; the second
    /// call is a no-op rather than an error.
    pub fn build(&mut self) {
        if self.built {
            return;
        }
        self.built = true;
        if self.items.is_empty() {
            return;
        }

        let extent = self.extent;
        let width = extent.width().max(f64::MIN_POSITIVE);
        let height = extent.height().max(f64::MIN_POSITIVE);
        self.items.sort_by_key(|(env, _)| {
            let mid = env.center();
            unit_to_hilbert(
                HPR_HILBERT_ORDER,
                (mid.x - extent.min_x) / width,
                (mid.y - extent.min_y) / height,
            )
        });

        // layer sizes bottom-up until a single root node
        let mut layer_sizes: Vec<usize> = Vec::new();
        let mut level_items = self.items.len();
        loop {
            let nodes = level_items.div_ceil(self.node_capacity);
            layer_sizes.push(nodes);
            if nodes == 1 {
                break;
            }
            level_items = nodes;
        }

        self.layer_start_index = Vec::with_capacity(layer_sizes.len() + 1);
        let mut offset = 0;
        for &size in &layer_sizes {
            self.layer_start_index.push(offset);
            offset += size;
        }
        self.layer_start_index.push(offset);
        self.node_bounds = vec![f64::NAN; offset * 4];

        // leaf layer over the items, upper layers over the layer below
        for node in 0..layer_sizes[0] {
            let start = node * self.node_capacity;
            let end = (start + self.node_capacity).min(self.items.len());
            let mut mbr = Envelope::NULL;
            for (env, _) in &self.items[start..end] {
                mbr.expand_to_include_envelope(env);
            }
            self.store_bounds(node, &mbr);
        }
        for layer in 1..layer_sizes.len() {
            let below_start = self.layer_start_index[layer - 1];
            let below_len = layer_sizes[layer - 1];
            for node in 0..layer_sizes[layer] {
                let start = node * self.node_capacity;
                let end = (start + self.node_capacity).min(below_len);
                let mut mbr = Envelope::NULL;
                for child in start..end {
                    mbr.expand_to_include_envelope(&self.load_bounds(below_start + child));
                }
                self.store_bounds(self.layer_start_index[layer] + node, &mbr);
            }
        }
        debug!(
            "hpr-tree built: {} items, {} layers, {} nodes",
            self.items.len(),
            layer_sizes.len(),
            offset
        );
    }

    /// Items whose envelope intersects the probe. Before `build()` this
    /// degrades to a linear scan.
    pub fn query(&self, probe: &Envelope) -> Vec<&T> {
        let mut found = Vec::new();
        if !self.built || self.layer_start_index.is_empty() {
            for (env, item) in &self.items {
                if env.intersects(probe) {
                    found.push(item);
                }
            }
            return found;
        }

        let layers = self.layer_start_index.len() - 1;
        // (layer, node offset within layer), starting at the root layer
        let mut stack: Vec<(usize, usize)> = vec![(layers - 1, 0)];
        while let Some((layer, node)) = stack.pop() {
            let bounds = self.load_bounds(self.layer_start_index[layer] + node);
            if !bounds.intersects(probe) {
                continue;
            }
            if layer == 0 {
                let start = node * self.node_capacity;
                let end = (start + self.node_capacity).min(self.items.len());
                for (env, item) in &self.items[start..end] {
                    if env.intersects(probe) {
                        found.push(item);
                    }
                }
            } else {
                let below_len =
                    self.layer_start_index[layer] - self.layer_start_index[layer - 1];
                let start = node * self.node_capacity;
                let end = (start + self.node_capacity).min(below_len);
                for child in start..end {
                    stack.push((layer - 1, child));
                }
            }
        }
        found
    }

    fn store_bounds(&mut self, node: usize, mbr: &Envelope) {
        let at = node * 4;
        self.node_bounds[at] = mbr.min_x;
        self.node_bounds[at + 1] = mbr.min_y;
        self.node_bounds[at + 2] = mbr.max_x;
        self.node_bounds[at + 3] = mbr.max_y;
    }

    fn load_bounds(&self, node: usize) -> Envelope {
        let at = node * 4;
        Envelope::new(
            self.node_bounds[at],
            self.node_bounds[at + 1],
            self.node_bounds[at + 2],
            self.node_bounds[at + 3],
        )
    }
}

impl<T> Default for HprTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn region_envelope(region: &Region) -> Envelope {
    Envelope::new(region.x(), region.y(), region.max_x(), region.max_y())
}

/// Region-tree facade over the packed tree. Removal is not part of the
/// packed design: it fails with `BuildLocked` whether built or not.
impl RegionTree for HprTree<Region> {
    fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn insert(&mut self, region: Region) -> Result<()> {
        let envelope = region_envelope(&region);
        HprTree::insert(self, envelope, region)
    }

    fn remove(&mut self, _region: &Region) -> Result<bool> {
        Err(Error::BuildLocked("hpr-tree does not support removal"))
    }

    fn query(&self, region: &Region) -> Vec<Region> {
        HprTree::query(self, &region_envelope(region))
            .into_iter()
            .filter(|r| r.intersects(region))
            .cloned()
            .collect()
    }
}
