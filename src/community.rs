//! Community partitioning over the undirected projection of the transaction
//! graph, via deterministic synchronous label propagation.
//!
//! `spec.md` leaves the partitioning algorithm unspecified beyond
//! "modularity-optimizing... must be deterministic... ties broken by
//! account id lexicographic order". Label propagation satisfies that
//! contract without pulling in a full Louvain implementation.

use crate::graph::TransactionGraph;
use std::collections::{HashMap, HashSet};

const MAX_ITERATIONS: usize = 100;

/// Returns disjoint account subsets covering every node in the graph.
/// Each inner `Vec<String>` is sorted; the outer list is sorted by each
/// community's smallest member id.
pub fn partition(graph: &TransactionGraph) -> Vec<Vec<String>> {
    let accounts = graph.accounts();
    if accounts.is_empty() {
        return Vec::new();
    }

    let undirected: HashMap<&str, Vec<&str>> = accounts
        .iter()
        .map(|&a| {
            let mut neighbors: HashSet<&str> = HashSet::new();
            neighbors.extend(graph.out_neighbors(a));
            neighbors.extend(graph.in_neighbors(a));
            neighbors.remove(a);
            let mut neighbors: Vec<&str> = neighbors.into_iter().collect();
            neighbors.sort_unstable();
            (a, neighbors)
        })
        .collect();

    let mut labels: HashMap<&str, &str> = accounts.iter().map(|&a| (a, a)).collect();

    for _ in 0..MAX_ITERATIONS {
        let mut next_labels = labels.clone();
        let mut changed = false;

        for &account in &accounts {
            let neighbors = &undirected[account];
            if neighbors.is_empty() {
                continue;
            }

            let mut counts: HashMap<&str, usize> = HashMap::new();
            for &neighbor in neighbors {
                *counts.entry(labels[neighbor]).or_insert(0) += 1;
            }

            let best_label = counts
                .into_iter()
                .max_by(|(label_a, count_a), (label_b, count_b)| {
                    count_a.cmp(count_b).then_with(|| label_b.cmp(label_a))
                })
                .map(|(label, _)| label)
                .unwrap();

            if best_label != labels[account] {
                next_labels.insert(account, best_label);
                changed = true;
            }
        }

        labels = next_labels;
        if !changed {
            break;
        }
    }

    let mut groups: HashMap<&str, Vec<String>> = HashMap::new();
    for &account in &accounts {
        groups
            .entry(labels[account])
            .or_default()
            .push(account.to_string());
    }

    let mut communities: Vec<Vec<String>> = groups.into_values().collect();
    for community in &mut communities {
        community.sort_unstable();
    }
    communities.sort_by(|a, b| a[0].cmp(&b[0]));
    communities
}
