//! Best-first decoder.
//!
//! Explores `(observation, candidate)` states ordered by accumulated
//! neg-log cost plus an admissible estimate of what is left: great-circle
//! distance from the current observation to the last one, scaled by the
//! configured density (neg-log per metre; zero keeps the heuristic at
//! zero). Reaches the same optimum as the Viterbi trellis when the density
//! is admissible, usually visiting far fewer states.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use log::debug;
use rustc_hash::FxHashMap;
use waymatch_common::{CancelToken, Error, Result};
use waymatch_geometry::TopologyCalculator;
use waymatch_graph::NearLineMergeGraph;

use crate::hmm::{InitialCalculator, TransitionLeg, TransitionModel};
use crate::matcher::{DecoderStep, MatchedPath};

/// Total-ordered f64 for the frontier.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Priority(f64);

impl Eq for Priority {}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Priority {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// `(step, entry)` state key; entry indexes the step's candidates, with
/// the one-past-the-end slot standing in for the null state.
type StateKey = (usize, usize);

#[allow(clippy::too_many_arguments)]
pub fn decode_best<C: TopologyCalculator>(
    graph: &NearLineMergeGraph<C>,
    transition: &TransitionModel<C>,
    initial: &dyn InitialCalculator,
    steps: &[DecoderStep],
    unmatched_penalty: f64,
    heuristic_density: f64,
    token: &CancelToken,
) -> Result<MatchedPath> {
    let last = steps.len() - 1;
    let goal_point = steps[last].observation;
    let calc = graph.calculator();
    let estimate = |step: usize| -> f64 {
        heuristic_density * calc.distance(&steps[step].observation, &goal_point)
    };

    let entries_at = |step: usize| -> Vec<Option<usize>> {
        if steps[step].candidates.is_empty() {
            vec![None]
        } else {
            (0..steps[step].candidates.len()).map(Some).collect()
        }
    };
    let emission_of = |step: usize, entry: Option<usize>| -> f64 {
        match entry {
            Some(c) => steps[step].emissions[c],
            None => unmatched_penalty,
        }
    };
    let key_of = |step: usize, entry: Option<usize>| -> StateKey {
        (step, entry.unwrap_or(steps[step].candidates.len()))
    };

    let mut best_g: FxHashMap<StateKey, f64> = FxHashMap::default();
    let mut came_from: FxHashMap<StateKey, StateKey> = FxHashMap::default();
    let mut frontier: BinaryHeap<Reverse<(Priority, usize, usize)>> = BinaryHeap::new();

    let priors = initial.initial(steps[0].candidates.len());
    for entry in entries_at(0) {
        let g = match entry {
            Some(c) => priors[c] + steps[0].emissions[c],
            None => unmatched_penalty,
        };
        if g.is_finite() {
            let key = key_of(0, entry);
            best_g.insert(key, g);
            frontier.push(Reverse((Priority(g + estimate(0)), key.0, key.1)));
        }
    }

    let mut expansions = 0usize;
    while let Some(Reverse((_, step, entry_slot))) = frontier.pop() {
        token.check()?;
        let key = (step, entry_slot);
        let g = best_g[&key];

        if step == last {
            debug!("a-star: goal after {expansions} expansions, score {g}");
            return Ok(MatchedPath {
                score: g,
                winners: reconstruct(steps, &came_from, key),
            });
        }
        expansions += 1;

        let entry = slot_to_entry(steps, step, entry_slot);
        let leg = TransitionLeg {
            from_observation: steps[step].observation,
            to_observation: steps[step + 1].observation,
        };
        for next_entry in entries_at(step + 1) {
            let emit = emission_of(step + 1, next_entry);
            if emit.is_infinite() {
                continue;
            }
            let trans = match (entry, next_entry) {
                (Some(pc), Some(cc)) => transition.cost(
                    graph,
                    &leg,
                    &steps[step].candidates[pc],
                    &steps[step + 1].candidates[cc],
                ),
                _ => 0.0,
            };
            if trans.is_infinite() {
                continue;
            }
            let next_g = g + trans + emit;
            let next_key = key_of(step + 1, next_entry);
            let better = best_g
                .get(&next_key)
                .map(|&known| next_g < known)
                .unwrap_or(true);
            if better {
                best_g.insert(next_key, next_g);
                came_from.insert(next_key, key);
                frontier.push(Reverse((
                    Priority(next_g + estimate(step + 1)),
                    next_key.0,
                    next_key.1,
                )));
            }
        }
    }

    Err(Error::bad_argument(
        "no decodable path: every candidate sequence is forbidden by the transition plugins",
    ))
}

fn slot_to_entry(steps: &[DecoderStep], step: usize, slot: usize) -> Option<usize> {
    if slot < steps[step].candidates.len() {
        Some(slot)
    } else {
        None
    }
}

fn reconstruct(
    steps: &[DecoderStep],
    came_from: &FxHashMap<StateKey, StateKey>,
    goal: StateKey,
) -> Vec<Option<waymatch_graph::EdgeId>> {
    let mut winners = vec![None; steps.len()];
    let mut at = goal;
    loop {
        let (step, slot) = at;
        winners[step] = slot_to_entry(steps, step, slot).map(|c| steps[step].candidates[c].edge);
        match came_from.get(&at) {
            Some(&prev) => at = prev,
            None => break,
        }
    }
    winners
}
