//! Trellis decoder.
//!
//! Classical Viterbi over the candidate states of each observation,
//! extended to keep the K best scored predecessors per state, which makes
//! the final argmin enumeration the K best paths overall. An observation
//! with no candidates contributes a *null* state that carries the penalty
//! configured for unmatched observations. A candidate whose transitions
//! from every live predecessor are all forbidden is simply unreachable;
//! when that starves the whole trellis the decode fails, exactly as the
//! best-first decoder does on the same inputs.
//!
//! Determinism: every sort breaks score ties on the predecessor's edge
//! label, so equal-probability paths resolve the same way on every run.

use log::debug;
use waymatch_common::{CancelToken, Error, Result};
use waymatch_geometry::TopologyCalculator;
use waymatch_graph::NearLineMergeGraph;

use crate::hmm::{InitialCalculator, TransitionLeg, TransitionModel};
use crate::matcher::{DecoderStep, MatchedPath};

/// One scored way of reaching a trellis entry.
#[derive(Debug, Clone, Copy)]
struct PathNode {
    score: f64,
    /// `(entry, rank)` at the previous step; `None` at step zero.
    prev: Option<(usize, usize)>,
}

/// A state at one step: a candidate, or the null state of an empty step.
#[derive(Debug)]
struct Entry {
    /// Index into the step's candidate list; `None` is the null state.
    candidate: Option<usize>,
    paths: Vec<PathNode>,
}

pub fn decode_top_k<C: TopologyCalculator>(
    graph: &NearLineMergeGraph<C>,
    transition: &TransitionModel<C>,
    initial: &dyn InitialCalculator,
    steps: &[DecoderStep],
    top_k: usize,
    unmatched_penalty: f64,
    token: &CancelToken,
) -> Result<Vec<MatchedPath>> {
    let mut trellis: Vec<Vec<Entry>> = Vec::with_capacity(steps.len());

    for (i, step) in steps.iter().enumerate() {
        token.check()?;
        let mut entries = new_entries(step);

        if i == 0 {
            let priors = initial.initial(step.candidates.len());
            for entry in &mut entries {
                let score = match entry.candidate {
                    Some(c) => priors[c] + step.emissions[c],
                    None => unmatched_penalty,
                };
                if score.is_finite() {
                    entry.paths.push(PathNode { score, prev: None });
                }
            }
        } else {
            let previous = &trellis[i - 1];
            let leg = TransitionLeg {
                from_observation: steps[i - 1].observation,
                to_observation: step.observation,
            };

            for entry in &mut entries {
                let emit = match entry.candidate {
                    Some(c) => step.emissions[c],
                    None => unmatched_penalty,
                };
                if emit.is_infinite() {
                    continue;
                }
                let mut reached: Vec<(PathNode, String)> = Vec::new();
                for (k, prev_entry) in previous.iter().enumerate() {
                    let trans = match (prev_entry.candidate, entry.candidate) {
                        (Some(pc), Some(cc)) => transition.cost(
                            graph,
                            &leg,
                            &steps[i - 1].candidates[pc],
                            &step.candidates[cc],
                        ),
                        // a null endpoint constrains nothing
                        _ => 0.0,
                    };
                    if trans.is_infinite() {
                        continue;
                    }
                    let prev_label = prev_entry
                        .candidate
                        .map(|pc| graph.edge(steps[i - 1].candidates[pc].edge).id.clone())
                        .unwrap_or_default();
                    for (r, path) in prev_entry.paths.iter().enumerate() {
                        reached.push((
                            PathNode {
                                score: path.score + trans + emit,
                                prev: Some((k, r)),
                            },
                            prev_label.clone(),
                        ));
                    }
                }
                reached.sort_by(|(a, la), (b, lb)| {
                    a.score
                        .total_cmp(&b.score)
                        .then_with(|| la.cmp(lb))
                        .then_with(|| a.prev.cmp(&b.prev))
                });
                entry.paths = reached
                    .into_iter()
                    .take(top_k)
                    .map(|(node, _)| node)
                    .collect();
            }
        }
        trellis.push(entries);
    }

    // rank every terminal (entry, rank) pair and walk the K best back
    let last = trellis.len() - 1;
    let mut terminals: Vec<(f64, String, usize, usize)> = Vec::new();
    for (e, entry) in trellis[last].iter().enumerate() {
        let label = entry
            .candidate
            .map(|c| graph.edge(steps[last].candidates[c].edge).id.clone())
            .unwrap_or_default();
        for (r, path) in entry.paths.iter().enumerate() {
            terminals.push((path.score, label.clone(), e, r));
        }
    }
    terminals.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)).then(a.3.cmp(&b.3)));
    if terminals.is_empty() {
        return Err(Error::bad_argument(
            "no decodable path: every candidate sequence is forbidden by the transition plugins",
        ));
    }

    let mut results = Vec::new();
    for (score, _, entry, rank) in terminals.into_iter().take(top_k) {
        results.push(MatchedPath {
            score,
            winners: backtrack(&trellis, steps, entry, rank),
        });
    }
    debug!(
        "viterbi: {} steps decoded, best score {:?}",
        steps.len(),
        results.first().map(|p| p.score)
    );
    Ok(results)
}

fn new_entries(step: &DecoderStep) -> Vec<Entry> {
    if step.candidates.is_empty() {
        vec![Entry {
            candidate: None,
            paths: Vec::new(),
        }]
    } else {
        (0..step.candidates.len())
            .map(|c| Entry {
                candidate: Some(c),
                paths: Vec::new(),
            })
            .collect()
    }
}

fn backtrack(
    trellis: &[Vec<Entry>],
    steps: &[DecoderStep],
    entry: usize,
    rank: usize,
) -> Vec<Option<waymatch_graph::EdgeId>> {
    let mut winners = vec![None; trellis.len()];
    let mut at = Some((trellis.len() - 1, entry, rank));
    while let Some((i, e, r)) = at {
        let node = &trellis[i][e];
        winners[i] = node.candidate.map(|c| steps[i].candidates[c].edge);
        at = node.paths[r].prev.map(|(pe, pr)| (i - 1, pe, pr));
    }
    winners
}
