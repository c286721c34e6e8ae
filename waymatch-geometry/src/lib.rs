//! Geometry kernel for waymatch.
//!
//! Immutable value types (`Point`, `Polyline`, `Region`, `Envelope`), the
//! topology calculators that give them metric meaning (planar and WGS-84),
//! and the geometric utilities the spatial indexes and the matcher lean on:
//! Ramer-Douglas-Peucker simplification, Graham-scan convex hull, sweep-line
//! segment intersection, quick-select and the Hilbert curve encoder.
//!
//! Nothing in this crate allocates in hot paths beyond result values, and
//! nothing holds global state: a [`GeometryFactory`] carries the calculator
//! and is passed explicitly.

pub mod envelope;
pub mod factory;
pub mod hilbert;
pub mod hull;
pub mod point;
pub mod polyline;
pub mod region;
pub mod select;
pub mod simplify;
pub mod sweep;
pub mod topology;
pub mod wkt;

pub use envelope::Envelope;
pub use factory::GeometryFactory;
pub use point::Point;
pub use polyline::Polyline;
pub use region::Region;
pub use topology::{EuclideanCalculator, GeoidalCalculator, TopologyCalculator};
