//! Road graph for waymatch.
//!
//! A [`NearLineMergeGraph`] clusters edge endpoints within a snap threshold
//! into shared nodes, indexes edges adjacency-out, and stays immutable
//! while a match runs. Shortest-path search (Dijkstra and A*) and the
//! winning-edge route stitcher live alongside it.

pub mod connector;
pub mod graph;
pub mod search;

pub use connector::{connect_route, route_polyline};
pub use graph::{Edge, EdgeId, NearLineMergeGraph, NodeId};
pub use search::{shortest_path, PathQuery};
