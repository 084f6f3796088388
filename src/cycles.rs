//! Cycle Detector: enumerates simple directed cycles bounded by length,
//! realizes them against actual transactions, and scores them.

use crate::graph::TransactionGraph;
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, instrument, warn};

/// Hard backstop on DFS steps explored per detection run, independent of
/// any user-facing configuration key (spec §5: "implementations SHOULD
/// enforce an enumeration budget").
const MAX_CYCLE_DFS_STEPS: usize = 2_000_000;

#[derive(Debug, Clone, Copy)]
pub struct CycleDetectorParams {
    pub min_length: usize,
    pub max_length: usize,
    pub time_window_hours: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CycleFinding {
    /// Ordered account ids forming the loop; cycle[0] is the
    /// lexicographically smallest member. Closure back to cycle[0] is implicit.
    pub cycle: Vec<String>,
    pub length: usize,
    pub total_amount: f64,
    pub representative_transactions: Vec<Transaction>,
    pub time_span_hours: f64,
    pub edge_amounts: Vec<f64>,
    pub risk_score: f64,
}

/// Result of a cycle detection pass, including whether the enumeration
/// budget was exhausted before the full graph was explored.
pub struct CycleDetectionOutcome {
    pub findings: Vec<CycleFinding>,
    pub enumeration_aborted: bool,
}

pub struct CycleDetector;

impl CycleDetector {
    #[instrument(skip(graph))]
    pub fn detect(graph: &TransactionGraph, params: CycleDetectorParams) -> CycleDetectionOutcome {
        let (raw_cycles, aborted) = Self::enumerate_cycles(graph, params);
        debug!(candidates = raw_cycles.len(), aborted, "cycles enumerated");

        let mut findings: Vec<CycleFinding> = raw_cycles
            .into_iter()
            .filter_map(|cycle| Self::realize(graph, &cycle, params))
            .collect();

        findings.sort_by(|a, b| {
            b.risk_score
                .partial_cmp(&a.risk_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.length.cmp(&b.length))
                .then_with(|| a.cycle[0].cmp(&b.cycle[0]))
        });

        if aborted {
            warn!("cycle enumeration budget exhausted; returning partial results");
        }

        CycleDetectionOutcome {
            findings,
            enumeration_aborted: aborted,
        }
    }

    /// Bounded DFS, rooted at each account in ascending order and
    /// restricted to nodes >= the root, so every simple cycle is produced
    /// exactly once already rotated to start at its smallest member.
    fn enumerate_cycles(
        graph: &TransactionGraph,
        params: CycleDetectorParams,
    ) -> (Vec<Vec<String>>, bool) {
        let mut results: Vec<Vec<String>> = Vec::new();
        let mut steps = 0usize;
        let mut aborted = false;

        'roots: for root in graph.accounts() {
            let root = root.to_string();
            let mut visited: HashSet<String> = HashSet::new();
            visited.insert(root.clone());
            let mut path: Vec<String> = vec![root.clone()];

            if !Self::dfs(
                graph,
                &root,
                &root,
                &mut path,
                &mut visited,
                params,
                &mut steps,
                &mut results,
            ) {
                aborted = true;
                break 'roots;
            }
        }

        (results, aborted)
    }

    /// Returns `false` if the DFS budget was exhausted (caller should stop).
    #[allow(clippy::too_many_arguments)]
    fn dfs(
        graph: &TransactionGraph,
        root: &str,
        current: &str,
        path: &mut Vec<String>,
        visited: &mut HashSet<String>,
        params: CycleDetectorParams,
        steps: &mut usize,
        results: &mut Vec<Vec<String>>,
    ) -> bool {
        for neighbor in graph.out_neighbors(current) {
            *steps += 1;
            if *steps > MAX_CYCLE_DFS_STEPS {
                return false;
            }

            if neighbor < root {
                continue;
            }

            if neighbor == root {
                if path.len() >= params.min_length {
                    results.push(path.clone());
                }
                continue;
            }

            if visited.contains(neighbor) {
                continue;
            }
            if path.len() == params.max_length {
                continue;
            }

            let neighbor = neighbor.to_string();
            visited.insert(neighbor.clone());
            path.push(neighbor.clone());
            let ok = Self::dfs(graph, root, &neighbor, path, visited, params, steps, results);
            path.pop();
            visited.remove(&neighbor);

            if !ok {
                return false;
            }
        }
        true
    }

    fn realize(
        graph: &TransactionGraph,
        cycle: &[String],
        params: CycleDetectorParams,
    ) -> Option<CycleFinding> {
        let length = cycle.len();
        if length > params.max_length || length < params.min_length {
            return None;
        }

        let mut representatives: Vec<Transaction> = Vec::with_capacity(length);
        for i in 0..length {
            let from = &cycle[i];
            let to = &cycle[(i + 1) % length];
            let candidates = graph.transactions_between(from, to);
            if candidates.is_empty() {
                return None;
            }
            let representative = candidates
                .iter()
                .max_by(|a, b| {
                    a.timestamp
                        .cmp(&b.timestamp)
                        .then_with(|| a.transaction_id.cmp(&b.transaction_id))
                })
                .unwrap()
                .clone();
            representatives.push(representative);
        }

        let min_ts = representatives.iter().map(|t| t.timestamp).min().unwrap();
        let max_ts = representatives.iter().map(|t| t.timestamp).max().unwrap();
        let time_span_hours = (max_ts - min_ts).num_seconds() as f64 / 3600.0;

        if time_span_hours > params.time_window_hours {
            return None;
        }

        let edge_amounts: Vec<f64> = representatives.iter().map(|t| t.amount).collect();
        let total_amount: f64 = edge_amounts.iter().sum();
        let risk_score = Self::score(total_amount, &edge_amounts, time_span_hours, length);

        Some(CycleFinding {
            cycle: cycle.to_vec(),
            length,
            total_amount,
            representative_transactions: representatives,
            time_span_hours,
            edge_amounts,
            risk_score,
        })
    }

    fn score(total_amount: f64, edge_amounts: &[f64], time_span_hours: f64, length: usize) -> f64 {
        let amount_factor = (total_amount / 100_000.0).min(1.0);

        let variation_factor = if edge_amounts.len() > 1 {
            let mean = edge_amounts.iter().sum::<f64>() / edge_amounts.len() as f64;
            if mean > 0.0 {
                let variance = edge_amounts
                    .iter()
                    .map(|a| (a - mean).powi(2))
                    .sum::<f64>()
                    / edge_amounts.len() as f64;
                let stddev = variance.sqrt();
                (1.0 - stddev / mean).max(0.0)
            } else {
                0.0
            }
        } else {
            0.0
        };

        let time_factor = (1.0 - time_span_hours / 72.0).max(0.0);
        let length_factor = (length as f64 / 10.0).min(1.0);

        let score = 0.30 * amount_factor + 0.25 * variation_factor + 0.25 * time_factor + 0.20 * length_factor;
        score.clamp(0.0, 1.0)
    }
}
