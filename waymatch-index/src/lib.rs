//! In-memory spatial indexes.
//!
//! Every region index implements the shared [`RegionTree`] contract; the
//! point indexes (k-d tree, succinct k-d tree and their hybrid composition)
//! share query semantics with it. All structures are single-threaded:
//! build or mutate from one thread, then share freely once terminal
//! (the Hilbert-packed tree after `build()` is the only structure with an
//! enforced terminal state).
//!
//! Trees are arenas of plain nodes addressed by `u32` slots; parent links
//! are slot indexes, so ownership is flat and traversal cannot cycle.

pub mod bplustree;
pub mod hprtree;
pub mod hybrid;
pub mod kdtree;
pub mod quadtree;
pub mod region_tree;
pub mod rtree;
pub mod succinct;

pub use bplustree::BPlusTree;
pub use hprtree::HprTree;
pub use hybrid::HybridPointIndex;
pub use kdtree::KdTree;
pub use quadtree::RegionQuadTree;
pub use region_tree::RegionTree;
pub use rtree::{RTree, RTreeOptions};
pub use succinct::SuccinctKdTree;
