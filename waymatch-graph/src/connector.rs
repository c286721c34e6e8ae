//! Route stitching.
//!
//! The decoder yields one winning edge per observation, possibly with
//! gaps (null states) and repeats. The connector compresses repeats,
//! drops the gaps, and bridges consecutive winners that do not touch in
//! the graph with a shortest-path search between them.

use log::debug;
use waymatch_common::{Error, Result};
use waymatch_geometry::{Polyline, TopologyCalculator};

use crate::graph::{EdgeId, NearLineMergeGraph};
use crate::search::{shortest_path, PathQuery};

/// Build a connected edge route out of per-observation winners.
///
/// Consecutive equal winners collapse to one traversal; already-adjacent
/// pairs are never bridged. A pair with no route between them at all
/// fails with `BadArgument` naming the edges.
pub fn connect_route<C: TopologyCalculator>(
    graph: &NearLineMergeGraph<C>,
    winners: &[Option<EdgeId>],
    max_route_length: Option<f64>,
) -> Result<Vec<EdgeId>> {
    let mut route: Vec<EdgeId> = Vec::new();
    for winner in winners.iter().flatten() {
        let winner = *winner;
        let Some(&previous) = route.last() else {
            route.push(winner);
            continue;
        };
        if previous == winner {
            continue;
        }
        if graph.are_consecutive(previous, winner) {
            route.push(winner);
            continue;
        }
        let from = graph.edge(previous).to;
        let to = graph.edge(winner).from;
        let query = PathQuery {
            use_heuristic: true,
            max_cost: max_route_length,
        };
        let Some((cost, bridge)) = shortest_path(graph, from, to, query) else {
            return Err(Error::bad_argument(format!(
                "no route between winning edges '{}' and '{}'",
                graph.edge(previous).id,
                graph.edge(winner).id
            )));
        };
        debug!(
            "bridged '{}' -> '{}' with {} edges ({cost:.1} m)",
            graph.edge(previous).id,
            graph.edge(winner).id,
            bridge.len()
        );
        // the bridge may begin with edges already walked
        for edge in bridge {
            if route.last() != Some(&edge) {
                route.push(edge);
            }
        }
        route.push(winner);
    }
    Ok(route)
}

/// Concatenate the polylines of a connected route, coalescing joints.
pub fn route_polyline<C: TopologyCalculator>(
    graph: &NearLineMergeGraph<C>,
    route: &[EdgeId],
) -> Polyline {
    let mut line = Polyline::empty();
    for &edge in route {
        line = line.append(&graph.edge(edge).polyline);
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use waymatch_geometry::{EuclideanCalculator, Point};

    fn pl(coords: &[(f64, f64)]) -> Polyline {
        Polyline::new(coords.iter().map(|&(x, y)| Point::new(x, y)).collect())
    }

    /// A chain a -> b -> c -> d of unit steps.
    fn chain() -> NearLineMergeGraph<EuclideanCalculator> {
        let mut g = NearLineMergeGraph::new(EuclideanCalculator::default(), 0.01).unwrap();
        g.add_approximate_direct_edge("ab", pl(&[(0.0, 0.0), (1.0, 0.0)])).unwrap();
        g.add_approximate_direct_edge("bc", pl(&[(1.0, 0.0), (2.0, 0.0)])).unwrap();
        g.add_approximate_direct_edge("cd", pl(&[(2.0, 0.0), (3.0, 0.0)])).unwrap();
        g
    }

    fn id(g: &NearLineMergeGraph<EuclideanCalculator>, label: &str) -> EdgeId {
        g.edge_by_label(label).unwrap()
    }

    #[test]
    fn test_gap_is_bridged() {
        let g = chain();
        let winners = vec![Some(id(&g, "ab")), None, Some(id(&g, "cd"))];
        let route = connect_route(&g, &winners, None).unwrap();
        let labels: Vec<&str> = route.iter().map(|&e| g.edge(e).id.as_str()).collect();
        assert_eq!(labels, vec!["ab", "bc", "cd"]);
    }

    #[test]
    fn test_consecutive_pairs_untouched() {
        let g = chain();
        let winners = vec![
            Some(id(&g, "ab")),
            Some(id(&g, "ab")),
            Some(id(&g, "bc")),
            Some(id(&g, "bc")),
        ];
        let route = connect_route(&g, &winners, None).unwrap();
        assert_eq!(route, vec![id(&g, "ab"), id(&g, "bc")]);
    }

    #[test]
    fn test_every_consecutive_pair_shares_a_node() {
        let g = chain();
        let winners = vec![Some(id(&g, "ab")), Some(id(&g, "cd"))];
        let route = connect_route(&g, &winners, None).unwrap();
        for pair in route.windows(2) {
            assert!(g.are_consecutive(pair[0], pair[1]));
        }
    }

    #[test]
    fn test_unbridgeable_gap_is_an_error() {
        let mut g = chain();
        // an island edge far away, not connected to the chain
        g.add_approximate_direct_edge("island", pl(&[(100.0, 100.0), (101.0, 100.0)]))
            .unwrap();
        let winners = vec![Some(id(&g, "ab")), Some(id(&g, "island"))];
        assert!(connect_route(&g, &winners, None).is_err());
    }

    #[test]
    fn test_route_polyline_joins() {
        let g = chain();
        let route = vec![id(&g, "ab"), id(&g, "bc")];
        let line = route_polyline(&g, &route);
        assert_eq!(
            line.points(),
            &[Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(2.0, 0.0)]
        );
    }

    #[test]
    fn test_empty_and_all_null() {
        let g = chain();
        assert!(connect_route(&g, &[], None).unwrap().is_empty());
        assert!(connect_route(&g, &[None, None], None).unwrap().is_empty());
    }
}
