//! HMM map matching.
//!
//! Observations in, road-edge sequence out. Candidates per observation come
//! from a Hilbert-packed index over the graph's edges; emission, transition
//! and initial probabilities are composed in negative-log space; a Viterbi
//! trellis (top-k) or a best-first A* expansion decodes the most likely
//! edge sequence; the route connector bridges whatever the decoder left
//! disconnected.

pub mod astar;
pub mod config;
pub mod hmm;
pub mod io;
pub mod matcher;
pub mod observation;
pub mod viterbi;

pub use config::{EmissionModel, MatchConfig, TransitionPluginKind};
pub use matcher::{MapMatcher, MatchOutcome, MatchedPath};
pub use observation::{validate_observations, IdentityFilter, Observation, ObservationFilter};
