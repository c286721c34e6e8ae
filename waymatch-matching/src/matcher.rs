//! Matching facade.
//!
//! Owns the candidate index (a Hilbert-packed tree over the graph's edge
//! envelopes — the graph is immutable during matching, so the build-once
//! index is the right shape), turns observations into decoder steps, runs
//! the requested decoder and stitches the winning edges into a connected
//! route.

use log::debug;
use waymatch_common::{CancelToken, Error, Result};
use waymatch_geometry::{Point, Polyline, TopologyCalculator};
use waymatch_graph::{connect_route, route_polyline, EdgeId, NearLineMergeGraph};
use waymatch_index::HprTree;

use crate::astar;
use crate::config::{EmissionModel, MatchConfig};
use crate::hmm::{
    BayesianEmissionCalculator, Candidate, EmissionCalculator, GaussianEmissionCalculator,
    TransitionModel, UniformInitialCalculator,
};
use crate::observation::{validate_observations, Observation};
use crate::viterbi;

/// One decoder input step: the observation and its scored candidates.
#[derive(Debug)]
pub struct DecoderStep {
    pub observation: Point,
    pub candidates: Vec<Candidate>,
    /// Neg-log emission per candidate, parallel to `candidates`.
    pub emissions: Vec<f64>,
}

/// A decoded path: per-observation winning edges (`None` where the
/// observation stayed unmatched) and the total neg-log score.
#[derive(Debug, Clone)]
pub struct MatchedPath {
    pub score: f64,
    pub winners: Vec<Option<EdgeId>>,
}

/// A full match result: the decoded paths (best first) and the connected
/// route of the best one.
#[derive(Debug)]
pub struct MatchOutcome {
    pub paths: Vec<MatchedPath>,
    pub route: Vec<EdgeId>,
    pub route_geometry: Polyline,
}

pub struct MapMatcher<'g, C: TopologyCalculator> {
    graph: &'g NearLineMergeGraph<C>,
    config: MatchConfig,
    index: HprTree<EdgeId>,
    transition: TransitionModel<C>,
}

impl<'g, C: TopologyCalculator> MapMatcher<'g, C> {
    pub fn new(graph: &'g NearLineMergeGraph<C>, config: MatchConfig) -> Result<Self> {
        config.validate()?;
        if graph.is_empty() {
            return Err(Error::NoGraph);
        }
        let mut index = HprTree::new();
        for (id, edge) in graph.edges() {
            index.insert(edge.polyline.envelope(), id)?;
        }
        index.build();
        let transition = TransitionModel::from_plugins(
            &config.plugins,
            config.connected_graph_threshold,
            config.u_turn_penalty,
        );
        debug!(
            "matcher ready: {} edges indexed, plugins {:?}",
            graph.edge_count(),
            transition.factor_names()
        );
        Ok(Self {
            graph,
            config,
            index,
            transition,
        })
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Candidate edges within the observation radius, closest first;
    /// distance ties order by edge label for reproducibility.
    pub fn candidates(&self, observation: &Point) -> Vec<Candidate> {
        let calc = self.graph.calculator();
        let probe = calc.search_envelope(observation, self.config.observation_radius);
        let mut found: Vec<Candidate> = self
            .index
            .query(&probe)
            .into_iter()
            .filter_map(|&edge| {
                let polyline = &self.graph.edge(edge).polyline;
                let position = polyline.closest_point(observation, calc)?;
                let distance = calc.distance(observation, &position);
                (distance <= self.config.observation_radius).then_some(Candidate {
                    edge,
                    distance,
                    position,
                })
            })
            .collect();
        found.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| self.graph.edge(a.edge).id.cmp(&self.graph.edge(b.edge).id))
        });
        found
    }

    fn steps(&self, observations: &[Observation]) -> Vec<DecoderStep> {
        observations
            .iter()
            .map(|o| {
                let candidates = self.candidates(&o.point);
                let distances: Vec<f64> = candidates.iter().map(|c| c.distance).collect();
                let emissions = match self.config.emission {
                    EmissionModel::Gaussian => {
                        GaussianEmissionCalculator::new(self.config.observation_std_dev)
                            .emissions(&distances)
                    }
                    EmissionModel::Bayesian => BayesianEmissionCalculator.emissions(&distances),
                };
                DecoderStep {
                    observation: o.point,
                    candidates,
                    emissions,
                }
            })
            .collect()
    }

    /// Trellis decoding; returns `top_k_paths` paths, best first, with the
    /// best path's connected route.
    pub fn match_viterbi(
        &self,
        observations: &[Observation],
        token: &CancelToken,
    ) -> Result<MatchOutcome> {
        validate_observations(observations)?;
        let steps = self.steps(observations);
        let paths = viterbi::decode_top_k(
            self.graph,
            &self.transition,
            &UniformInitialCalculator,
            &steps,
            self.config.top_k_paths,
            self.config.unmatched_penalty,
            token,
        )?;
        self.finish(paths)
    }

    /// Best-first decoding; returns the single best path and its route.
    pub fn match_astar(
        &self,
        observations: &[Observation],
        token: &CancelToken,
    ) -> Result<MatchOutcome> {
        validate_observations(observations)?;
        let steps = self.steps(observations);
        let best = astar::decode_best(
            self.graph,
            &self.transition,
            &UniformInitialCalculator,
            &steps,
            self.config.unmatched_penalty,
            self.config.heuristic_density,
            token,
        )?;
        self.finish(vec![best])
    }

    fn finish(&self, paths: Vec<MatchedPath>) -> Result<MatchOutcome> {
        let Some(best) = paths.first() else {
            return Err(Error::bad_argument("decoder produced no path"));
        };
        let route = connect_route(self.graph, &best.winners, self.config.max_route_length)?;
        let route_geometry = route_polyline(self.graph, &route);
        Ok(MatchOutcome {
            route,
            route_geometry,
            paths,
        })
    }

    /// Mean distance from each matched observation to its winning edge, a
    /// cheap quality figure for the caller.
    pub fn mean_position_error(&self, steps_of: &[Observation], path: &MatchedPath) -> f64 {
        let calc = self.graph.calculator();
        let mut total = 0.0;
        let mut matched = 0usize;
        for (observation, winner) in steps_of.iter().zip(&path.winners) {
            if let Some(edge) = winner {
                total += calc.distance_to_polyline(&observation.point, &self.graph.edge(*edge).polyline);
                matched += 1;
            }
        }
        if matched == 0 {
            0.0
        } else {
            total / matched as f64
        }
    }
}
