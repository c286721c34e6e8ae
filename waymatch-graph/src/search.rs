//! Shortest-path search over the road graph.
//!
//! One engine serves both modes: Dijkstra, and A* when the query carries a
//! goal heuristic (great-circle distance to the target node, admissible on
//! a metric graph). Costs are metres of polyline length.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use rustc_hash::FxHashMap;
use waymatch_geometry::TopologyCalculator;

use crate::graph::{EdgeId, NearLineMergeGraph, NodeId};

/// Search parameters. `max_cost` prunes any route longer than the bound.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathQuery {
    pub use_heuristic: bool,
    pub max_cost: Option<f64>,
}

/// Total-ordered f64 priority for the heap.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Priority(f64);

impl Eq for Priority {}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Priority {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Cheapest edge sequence from `from` to `to`, with its length in metres.
/// `None` when unreachable or every route exceeds `max_cost`.
pub fn shortest_path<C: TopologyCalculator>(
    graph: &NearLineMergeGraph<C>,
    from: NodeId,
    to: NodeId,
    query: PathQuery,
) -> Option<(f64, Vec<EdgeId>)> {
    if from == to {
        return Some((0.0, Vec::new()));
    }
    let goal = *graph.node_point(to);
    let heuristic = |node: NodeId| -> f64 {
        if query.use_heuristic {
            graph.calculator().distance(graph.node_point(node), &goal)
        } else {
            0.0
        }
    };

    let mut dist: FxHashMap<NodeId, f64> = FxHashMap::default();
    let mut arrived_by: FxHashMap<NodeId, EdgeId> = FxHashMap::default();
    let mut heap: BinaryHeap<Reverse<(Priority, NodeId)>> = BinaryHeap::new();

    dist.insert(from, 0.0);
    heap.push(Reverse((Priority(heuristic(from)), from)));

    while let Some(Reverse((_, node))) = heap.pop() {
        let node_cost = dist[&node];
        if node == to {
            // walk the arrival edges back to the source
            let mut route = Vec::new();
            let mut at = to;
            while at != from {
                let edge = arrived_by[&at];
                route.push(edge);
                at = graph.edge(edge).from;
            }
            route.reverse();
            return Some((node_cost, route));
        }

        for &edge_id in graph.outgoing_edges(node) {
            let edge = graph.edge(edge_id);
            let next_cost = node_cost + graph.edge_length(edge_id);
            if let Some(bound) = query.max_cost {
                if next_cost > bound {
                    continue;
                }
            }
            let better = dist
                .get(&edge.to)
                .map(|&known| next_cost < known)
                .unwrap_or(true);
            if better {
                dist.insert(edge.to, next_cost);
                arrived_by.insert(edge.to, edge_id);
                heap.push(Reverse((Priority(next_cost + heuristic(edge.to)), edge.to)));
            }
        }
    }
    None
}
