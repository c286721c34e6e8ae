//! Transition probability plug-ins.
//!
//! Each factor contributes an additive negative-log cost for a candidate
//! pair; the model sums them in plug-in order and stops early once a factor
//! answers infinity.

use waymatch_geometry::topology::bearing_difference;
use waymatch_geometry::{Point, TopologyCalculator};
use waymatch_graph::{shortest_path, NearLineMergeGraph, PathQuery};

use crate::config::TransitionPluginKind;
use crate::hmm::Candidate;

/// The observation pair a transition spans.
#[derive(Debug, Clone, Copy)]
pub struct TransitionLeg {
    pub from_observation: Point,
    pub to_observation: Point,
}

pub trait TransitionFactor<C: TopologyCalculator> {
    fn cost(
        &self,
        graph: &NearLineMergeGraph<C>,
        leg: &TransitionLeg,
        from: &Candidate,
        to: &Candidate,
    ) -> f64;

    fn name(&self) -> &'static str;
}

/// Topological connectivity: same edge is free, touching edges cost one
/// unit, disjoint edges are forbidden.
#[derive(Debug, Clone, Copy, Default)]
pub struct TopologicalFactor;

impl<C: TopologyCalculator> TransitionFactor<C> for TopologicalFactor {
    fn cost(
        &self,
        graph: &NearLineMergeGraph<C>,
        _leg: &TransitionLeg,
        from: &Candidate,
        to: &Candidate,
    ) -> f64 {
        if from.edge == to.edge {
            0.0
        } else if graph.share_node(from.edge, to.edge) {
            1.0
        } else {
            f64::INFINITY
        }
    }

    fn name(&self) -> &'static str {
        "topological"
    }
}

/// Prunes pairs whose cheapest route through the graph exceeds the
/// caller-supplied threshold.
#[derive(Debug, Clone, Copy)]
pub struct ConnectedGraphFactor {
    pub threshold: f64,
}

impl<C: TopologyCalculator> TransitionFactor<C> for ConnectedGraphFactor {
    fn cost(
        &self,
        graph: &NearLineMergeGraph<C>,
        _leg: &TransitionLeg,
        from: &Candidate,
        to: &Candidate,
    ) -> f64 {
        if from.edge == to.edge || graph.are_consecutive(from.edge, to.edge) {
            return 0.0;
        }
        let query = PathQuery {
            use_heuristic: true,
            max_cost: Some(self.threshold),
        };
        match shortest_path(graph, graph.edge(from.edge).to, graph.edge(to.edge).from, query) {
            Some(_) => 0.0,
            None => f64::INFINITY,
        }
    }

    fn name(&self) -> &'static str {
        "connectedGraph"
    }
}

/// Penalises edge pairs pointing against the observed direction of
/// travel. Both endpoints of the transition count: each edge whose
/// travel bearing contradicts the observation-to-observation bearing by
/// more than a quarter turn contributes, scaling linearly up to half of
/// `penalty` when fully opposed.
#[derive(Debug, Clone, Copy)]
pub struct DirectionFactor {
    pub penalty: f64,
}

impl Default for DirectionFactor {
    fn default() -> Self {
        Self { penalty: 4.0 }
    }
}

impl DirectionFactor {
    fn misalignment<C: TopologyCalculator>(
        &self,
        graph: &NearLineMergeGraph<C>,
        observed: f64,
        edge: waymatch_graph::EdgeId,
    ) -> f64 {
        let edge = graph.edge(edge);
        let travel = graph
            .calculator()
            .initial_bearing(graph.node_point(edge.from), graph.node_point(edge.to));
        let diff = bearing_difference(observed, travel);
        if diff <= 90.0 {
            0.0
        } else {
            (diff - 90.0) / 90.0 * self.penalty / 2.0
        }
    }
}

impl<C: TopologyCalculator> TransitionFactor<C> for DirectionFactor {
    fn cost(
        &self,
        graph: &NearLineMergeGraph<C>,
        leg: &TransitionLeg,
        from: &Candidate,
        to: &Candidate,
    ) -> f64 {
        let calc = graph.calculator();
        if calc.distance(&leg.from_observation, &leg.to_observation) <= calc.precision() {
            // no observed movement, no direction to contradict
            return 0.0;
        }
        let observed = calc.initial_bearing(&leg.from_observation, &leg.to_observation);
        self.misalignment(graph, observed, from.edge)
            + self.misalignment(graph, observed, to.edge)
    }

    fn name(&self) -> &'static str {
        "direction"
    }
}

/// Keeps `edge -> edge.reverse()` out of the path unless nothing else
/// survives: the cost is large but finite, so a U-turn still beats a dead
/// end.
#[derive(Debug, Clone, Copy)]
pub struct NoUTurnFactor {
    pub penalty: f64,
}

impl<C: TopologyCalculator> TransitionFactor<C> for NoUTurnFactor {
    fn cost(
        &self,
        graph: &NearLineMergeGraph<C>,
        _leg: &TransitionLeg,
        from: &Candidate,
        to: &Candidate,
    ) -> f64 {
        if graph.is_reverse_of(from.edge, to.edge) {
            self.penalty
        } else {
            0.0
        }
    }

    fn name(&self) -> &'static str {
        "noUTurn"
    }
}

/// Ordered composition of the configured factors.
pub struct TransitionModel<C: TopologyCalculator> {
    factors: Vec<Box<dyn TransitionFactor<C>>>,
}

impl<C: TopologyCalculator> TransitionModel<C> {
    pub fn from_plugins(
        plugins: &[TransitionPluginKind],
        connected_graph_threshold: f64,
        u_turn_penalty: f64,
    ) -> Self {
        let factors: Vec<Box<dyn TransitionFactor<C>>> = plugins
            .iter()
            .map(|kind| -> Box<dyn TransitionFactor<C>> {
                match kind {
                    TransitionPluginKind::Topological => Box::new(TopologicalFactor),
                    TransitionPluginKind::ConnectedGraph => Box::new(ConnectedGraphFactor {
                        threshold: connected_graph_threshold,
                    }),
                    TransitionPluginKind::Direction => Box::new(DirectionFactor::default()),
                    TransitionPluginKind::NoUTurn => Box::new(NoUTurnFactor {
                        penalty: u_turn_penalty,
                    }),
                }
            })
            .collect();
        Self { factors }
    }

    /// Summed neg-log cost of the pair; infinity as soon as any factor
    /// forbids it.
    pub fn cost(
        &self,
        graph: &NearLineMergeGraph<C>,
        leg: &TransitionLeg,
        from: &Candidate,
        to: &Candidate,
    ) -> f64 {
        let mut total = 0.0;
        for factor in &self.factors {
            let cost = factor.cost(graph, leg, from, to);
            if cost.is_infinite() {
                return f64::INFINITY;
            }
            total += cost;
        }
        total
    }

    pub fn factor_names(&self) -> Vec<&'static str> {
        self.factors.iter().map(|f| f.name()).collect()
    }
}
