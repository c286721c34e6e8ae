//! Shortest-path behaviour on the Treviso-plain reference network, under
//! the WGS-84 calculator.

use waymatch_geometry::{GeoidalCalculator, Point, Polyline, TopologyCalculator};
use waymatch_graph::{connect_route, shortest_path, NearLineMergeGraph, PathQuery};

const N11: (f64, f64) = (12.159747628109386, 45.66132709541773);
const N12: (f64, f64) = (12.238140517207398, 45.65897415921759);
const N22: (f64, f64) = (12.242949896905884, 45.69828882177029);
const N23: (f64, f64) = (12.200627355552967, 45.732876303059044);
const N32: (f64, f64) = (12.343946870589775, 45.65931029901404);
const N42: (f64, f64) = (12.25545428412434, 45.61054896081151);
const N52: (f64, f64) = (12.297776825477285, 45.7345547621876);
const N62: (f64, f64) = (12.322785599913317, 45.610885391198394);

fn build() -> NearLineMergeGraph<GeoidalCalculator> {
    let mut graph = NearLineMergeGraph::new(GeoidalCalculator::default(), 10.0).unwrap();
    let edges: [(&str, &[(f64, f64)]); 6] = [
        ("E0", &[N11, N12]),
        ("E1", &[N12, N22, N23]),
        ("E2", &[N12, N32]),
        ("E3", &[N12, N42]),
        ("E4", &[N32, N52]),
        ("E5", &[N32, N62]),
    ];
    for (label, coords) in edges {
        let line = Polyline::new(coords.iter().map(|&(x, y)| Point::new(x, y)).collect());
        graph.add_bidirectional_edge(label, line).unwrap();
    }
    graph
}

fn node_at(graph: &NearLineMergeGraph<GeoidalCalculator>, coords: (f64, f64)) -> u32 {
    let p = Point::new(coords.0, coords.1);
    graph
        .nodes()
        .find(|(_, q)| graph.calculator().distance(&p, q) < 1.0)
        .map(|(id, _)| id)
        .expect("reference node present")
}

#[test]
fn snapping_merges_the_junction_nodes() {
    let graph = build();
    // 8 distinct coordinates; every shared endpoint collapsed
    assert_eq!(graph.node_count(), 8);
    assert_eq!(graph.edge_count(), 12);
    let junction = node_at(&graph, N12);
    // out-edges at the central junction: E1, E2, E3 and the reverse of E0
    assert_eq!(graph.outgoing_edges(junction).len(), 4);
}

#[test]
fn west_to_east_route_runs_through_the_junction() {
    let graph = build();
    let from = node_at(&graph, N11);
    let to = node_at(&graph, N32);
    let (cost, route) = shortest_path(&graph, from, to, PathQuery::default()).unwrap();
    let labels: Vec<&str> = route.iter().map(|&e| graph.edge(e).id.as_str()).collect();
    assert_eq!(labels, vec!["E0", "E2"]);

    let calc = graph.calculator();
    let direct = calc.distance(&Point::new(N11.0, N11.1), &Point::new(N32.0, N32.1));
    // the route length is bounded below by the geodesic and not absurdly
    // above it on this near-straight corridor
    assert!(cost >= direct);
    assert!(cost < direct * 1.1, "route {cost} m vs geodesic {direct} m");
}

#[test]
fn heuristic_search_matches_dijkstra_everywhere() {
    let graph = build();
    let nodes = [N11, N12, N22, N23, N32, N42, N52, N62];
    for &a in &nodes {
        for &b in &nodes {
            let from = node_at(&graph, a);
            let to = node_at(&graph, b);
            let plain = shortest_path(&graph, from, to, PathQuery::default());
            let informed = shortest_path(
                &graph,
                from,
                to,
                PathQuery {
                    use_heuristic: true,
                    max_cost: None,
                },
            );
            match (plain, informed) {
                (Some((c1, _)), Some((c2, _))) => {
                    assert!((c1 - c2).abs() < 1e-6, "{a:?} -> {b:?}: {c1} vs {c2}")
                }
                (None, None) => {}
                other => panic!("{a:?} -> {b:?}: reachability disagrees: {other:?}"),
            }
        }
    }
}

#[test]
fn connector_bridges_across_the_junction() {
    let graph = build();
    let e0 = graph.edge_by_label("E0").unwrap();
    let e4 = graph.edge_by_label("E4").unwrap();
    // E0 ends at N12, E4 starts at N32: the bridge is E2
    let route = connect_route(&graph, &[Some(e0), None, Some(e4)], None).unwrap();
    let labels: Vec<&str> = route.iter().map(|&e| graph.edge(e).id.as_str()).collect();
    assert_eq!(labels, vec!["E0", "E2", "E4"]);
    for pair in route.windows(2) {
        assert!(graph.are_consecutive(pair[0], pair[1]));
    }
}
