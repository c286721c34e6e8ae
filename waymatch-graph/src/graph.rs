//! Near-line-merge graph.
//!
//! Nodes are coordinate clusters: any two endpoints whose great-circle
//! distance is within the snap threshold collapse onto the same node. The
//! graph is built incrementally edge by edge and read-only during a match.

use log::debug;
use rustc_hash::FxHashMap;
use waymatch_common::{Error, Result};
use waymatch_geometry::{Point, Polyline, TopologyCalculator};

pub type NodeId = u32;
pub type EdgeId = u32;

#[derive(Debug, Clone)]
pub struct Edge {
    /// Caller-visible label, e.g. `E3` or `E3-rev` for the reverse twin.
    pub id: String,
    pub from: NodeId,
    pub to: NodeId,
    pub polyline: Polyline,
}

#[derive(Debug)]
pub struct NearLineMergeGraph<C> {
    calculator: C,
    snap_threshold: f64,
    node_points: Vec<Point>,
    edges: Vec<Edge>,
    outgoing: Vec<Vec<EdgeId>>,
    by_label: FxHashMap<String, EdgeId>,
}

impl<C: TopologyCalculator> NearLineMergeGraph<C> {
    pub fn new(calculator: C, snap_threshold: f64) -> Result<Self> {
        if !(snap_threshold >= 0.0) {
            return Err(Error::bad_argument(format!(
                "snap threshold must be non-negative, got {snap_threshold}"
            )));
        }
        Ok(Self {
            calculator,
            snap_threshold,
            node_points: Vec::new(),
            edges: Vec::new(),
            outgoing: Vec::new(),
            by_label: FxHashMap::default(),
        })
    }

    pub fn calculator(&self) -> &C {
        &self.calculator
    }

    pub fn node_count(&self) -> usize {
        self.node_points.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn node_point(&self, node: NodeId) -> &Point {
        &self.node_points[node as usize]
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Point)> {
        self.node_points
            .iter()
            .enumerate()
            .map(|(i, p)| (i as NodeId, p))
    }

    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> {
        self.edges.iter().enumerate().map(|(i, e)| (i as EdgeId, e))
    }

    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id as usize]
    }

    pub fn edge_by_label(&self, label: &str) -> Option<EdgeId> {
        self.by_label.get(label).copied()
    }

    pub fn outgoing_edges(&self, node: NodeId) -> &[EdgeId] {
        &self.outgoing[node as usize]
    }

    /// The cluster node for `point`: an existing node within the snap
    /// threshold, or a fresh one.
    fn merge_node(&mut self, point: &Point) -> NodeId {
        let found = self
            .node_points
            .iter()
            .position(|p| self.calculator.distance(p, point) <= self.snap_threshold);
        match found {
            Some(node) => node as NodeId,
            None => {
                self.node_points.push(*point);
                self.outgoing.push(Vec::new());
                (self.node_points.len() - 1) as NodeId
            }
        }
    }

    /// Add a directed edge; endpoints snap to existing nodes within the
    /// threshold. The polyline needs at least two points. Duplicate labels
    /// are rejected.
    pub fn add_approximate_direct_edge(
        &mut self,
        label: impl Into<String>,
        polyline: Polyline,
    ) -> Result<EdgeId> {
        let label = label.into();
        if polyline.len() < 2 {
            return Err(Error::bad_argument(format!(
                "edge '{label}' needs a polyline with at least 2 points"
            )));
        }
        if self.by_label.contains_key(&label) {
            return Err(Error::bad_argument(format!("duplicate edge label '{label}'")));
        }
        let start = *polyline.start().expect("length checked");
        let end = *polyline.end().expect("length checked");
        let from = self.merge_node(&start);
        let to = self.merge_node(&end);

        let edge_id = self.edges.len() as EdgeId;
        self.outgoing[from as usize].push(edge_id);
        self.by_label.insert(label.clone(), edge_id);
        self.edges.push(Edge {
            id: label,
            from,
            to,
            polyline,
        });
        debug!(
            "graph: edge {} ({} -> {}), {} nodes total",
            edge_id,
            from,
            to,
            self.node_points.len()
        );
        Ok(edge_id)
    }

    /// Add `label` and its reverse twin `label-rev`.
    pub fn add_bidirectional_edge(
        &mut self,
        label: impl Into<String>,
        polyline: Polyline,
    ) -> Result<(EdgeId, EdgeId)> {
        let label = label.into();
        let reverse = polyline.reverse();
        let forward_id = self.add_approximate_direct_edge(label.clone(), polyline)?;
        let reverse_id = self.add_approximate_direct_edge(format!("{label}-rev"), reverse)?;
        Ok((forward_id, reverse_id))
    }

    /// Is `second` an out-edge of `first`'s head node?
    pub fn are_consecutive(&self, first: EdgeId, second: EdgeId) -> bool {
        self.edges[first as usize].to == self.edges[second as usize].from
    }

    /// Do the two edges touch at any endpoint?
    pub fn share_node(&self, a: EdgeId, b: EdgeId) -> bool {
        let ea = &self.edges[a as usize];
        let eb = &self.edges[b as usize];
        ea.from == eb.from || ea.from == eb.to || ea.to == eb.from || ea.to == eb.to
    }

    /// Is `b` the reverse twin of `a` (same span, opposite direction)?
    pub fn is_reverse_of(&self, a: EdgeId, b: EdgeId) -> bool {
        let ea = &self.edges[a as usize];
        let eb = &self.edges[b as usize];
        ea.from == eb.to && ea.to == eb.from && ea.polyline == eb.polyline.reverse()
    }

    pub fn edge_length(&self, id: EdgeId) -> f64 {
        self.edges[id as usize].polyline.length(&self.calculator)
    }
}
