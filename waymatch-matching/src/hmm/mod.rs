//! The hidden-Markov model behind the decoders.
//!
//! States are candidate edges per observation. All probabilities are
//! carried as negative logs, so composition is addition and decoding is
//! minimisation; infinity forbids. The sign convention is shared by the
//! initial, emission and transition calculators — decoders only ever add.

mod emission;
mod initial;
mod transition;

pub use emission::{BayesianEmissionCalculator, EmissionCalculator, GaussianEmissionCalculator};
pub use initial::{InitialCalculator, UniformInitialCalculator};
pub use transition::{
    ConnectedGraphFactor, DirectionFactor, NoUTurnFactor, TopologicalFactor, TransitionFactor,
    TransitionLeg, TransitionModel,
};

use waymatch_geometry::Point;
use waymatch_graph::EdgeId;

/// A candidate state: one road edge explaining one observation.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub edge: EdgeId,
    /// Perpendicular distance from the observation to the edge polyline.
    pub distance: f64,
    /// The on-track point the observation snaps to.
    pub position: Point,
}
