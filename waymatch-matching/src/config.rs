//! Match configuration.

use serde::Deserialize;
use waymatch_common::{Error, Result};

/// Transition factors, applied in list order. A factor answering infinity
/// forbids the pair outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransitionPluginKind {
    /// Edge connectivity: 0 for the same edge, 1 for touching edges,
    /// infinite for disjoint ones.
    Topological,
    /// Prune pairs whose shortest route through the graph exceeds
    /// `connected_graph_threshold`.
    ConnectedGraph,
    /// Penalise edges pointing against the observed direction of travel.
    Direction,
    /// Keep `edge -> edge.reverse()` out unless nothing else survives.
    NoUTurn,
}

/// Emission probability model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EmissionModel {
    /// Gaussian on the perpendicular distance, `observation_std_dev` wide.
    Gaussian,
    /// Normalised inverse distance over the candidate set.
    Bayesian,
}

/// Options of a match call.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MatchConfig {
    /// Candidate retention radius around each observation, metres.
    pub observation_radius: f64,
    /// Gaussian emission sigma, metres.
    pub observation_std_dev: f64,
    /// Node-merge threshold for graph building, metres.
    pub snap_threshold: f64,
    /// Upper bound on the total matched route length, metres.
    pub max_route_length: Option<f64>,
    /// How many decoded paths the Viterbi matcher returns.
    pub top_k_paths: usize,
    /// Transition factors, in application order.
    pub plugins: Vec<TransitionPluginKind>,
    pub emission: EmissionModel,
    /// Neg-log penalty of an observation with no candidate in radius.
    pub unmatched_penalty: f64,
    /// Route-length bound of the connected-graph factor, metres.
    pub connected_graph_threshold: f64,
    /// Neg-log penalty of a forbidden-but-unavoidable U-turn.
    pub u_turn_penalty: f64,
    /// A* remaining-cost density, neg-log per metre of great-circle
    /// distance still to cover. Zero keeps the heuristic trivially
    /// admissible.
    pub heuristic_density: f64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            observation_radius: 100.0,
            observation_std_dev: 5.0,
            snap_threshold: 10.0,
            max_route_length: None,
            top_k_paths: 1,
            plugins: vec![
                TransitionPluginKind::Topological,
                TransitionPluginKind::Direction,
                TransitionPluginKind::NoUTurn,
            ],
            emission: EmissionModel::Bayesian,
            unmatched_penalty: 12.0,
            connected_graph_threshold: 5_000.0,
            u_turn_penalty: 30.0,
            heuristic_density: 0.0,
        }
    }
}

impl MatchConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.observation_radius > 0.0) {
            return Err(Error::bad_argument(format!(
                "observation radius must be positive, got {}",
                self.observation_radius
            )));
        }
        if !(self.observation_std_dev > 0.0) {
            return Err(Error::bad_argument(format!(
                "observation std dev must be positive, got {}",
                self.observation_std_dev
            )));
        }
        if !(self.snap_threshold >= 0.0) {
            return Err(Error::bad_argument(format!(
                "snap threshold must be non-negative, got {}",
                self.snap_threshold
            )));
        }
        if self.top_k_paths < 1 {
            return Err(Error::bad_argument("top_k_paths must be at least 1"));
        }
        if let Some(bound) = self.max_route_length {
            if !(bound > 0.0) {
                return Err(Error::bad_argument(format!(
                    "max route length must be positive, got {bound}"
                )));
            }
        }
        Ok(())
    }

    pub fn with_radius(mut self, metres: f64) -> Self {
        self.observation_radius = metres;
        self
    }

    pub fn with_emission(mut self, emission: EmissionModel) -> Self {
        self.emission = emission;
        self
    }

    pub fn with_std_dev(mut self, metres: f64) -> Self {
        self.observation_std_dev = metres;
        self
    }

    pub fn with_top_k(mut self, k: usize) -> Self {
        self.top_k_paths = k;
        self
    }

    pub fn with_plugins(mut self, plugins: Vec<TransitionPluginKind>) -> Self {
        self.plugins = plugins;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(MatchConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validation_catches_bad_values() {
        assert!(MatchConfig::default().with_radius(0.0).validate().is_err());
        assert!(MatchConfig::default().with_std_dev(-1.0).validate().is_err());
        assert!(MatchConfig::default().with_top_k(0).validate().is_err());
    }

    #[test]
    fn test_deserializes_from_json() {
        let config: MatchConfig = serde_json::from_str(
            r#"{
                "observationRadius": 50.0,
                "observationStdDev": 8.0,
                "topKPaths": 3,
                "plugins": ["topological", "noUTurn"],
                "emission": "gaussian"
            }"#,
        )
        .unwrap();
        assert_eq!(config.observation_radius, 50.0);
        assert_eq!(config.top_k_paths, 3);
        assert_eq!(
            config.plugins,
            vec![TransitionPluginKind::Topological, TransitionPluginKind::NoUTurn]
        );
        assert_eq!(config.emission, EmissionModel::Gaussian);
        // untouched fields keep their defaults
        assert_eq!(config.unmatched_penalty, 12.0);
    }
}
