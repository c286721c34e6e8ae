//! The contract shared by every region index.

use waymatch_common::Result;
use waymatch_geometry::Region;

/// A spatial index over [`Region`] values.
///
/// `query` returns every stored region intersecting the probe, in no
/// particular order. Implementations are not internally synchronised;
/// callers serialise mutation.
pub trait RegionTree {
    fn is_empty(&self) -> bool;

    fn insert(&mut self, region: Region) -> Result<()>;

    /// Remove the first stored region equal to `region`. Returns whether
    /// anything was removed.
    fn remove(&mut self, region: &Region) -> Result<bool>;

    /// Does any stored region intersect `region`?
    fn intersects(&self, region: &Region) -> bool {
        !self.query(region).is_empty()
    }

    /// Is a region equal to `region` stored?
    fn contains(&self, region: &Region) -> bool {
        self.query(region).iter().any(|r| r == region)
    }

    fn query(&self, region: &Region) -> Vec<Region>;
}
