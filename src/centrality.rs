//! Centrality services: degree, betweenness (Brandes), and PageRank (power
//! iteration) over a `TransactionGraph` snapshot.

use crate::graph::TransactionGraph;
use std::collections::HashMap;

const PAGERANK_DAMPING: f64 = 0.85;
const PAGERANK_TOLERANCE: f64 = 1e-6;
const PAGERANK_MAX_ITERATIONS: usize = 100;

/// degree_centrality(v) = (in_degree(v) + out_degree(v)) / (2*(N-1)), 0 when N <= 1.
pub fn degree_centrality(graph: &TransactionGraph) -> HashMap<String, f64> {
    let n = graph.node_count();
    let mut result = HashMap::new();
    for account in graph.accounts() {
        let value = if n <= 1 {
            0.0
        } else {
            (graph.in_degree(account) + graph.out_degree(account)) as f64 / (2.0 * (n - 1) as f64)
        };
        result.insert(account.to_string(), value);
    }
    result
}

/// Betweenness centrality via Brandes' algorithm for unweighted directed
/// graphs, normalized by the number of ordered (source, target) pairs that
/// could route through a given vertex: (N-1)*(N-2).
pub fn betweenness_centrality(graph: &TransactionGraph) -> HashMap<String, f64> {
    let accounts = graph.accounts();
    let n = accounts.len();
    let mut centrality: HashMap<&str, f64> = accounts.iter().map(|&a| (a, 0.0)).collect();

    for &s in &accounts {
        let mut stack: Vec<&str> = Vec::new();
        let mut predecessors: HashMap<&str, Vec<&str>> = HashMap::new();
        let mut sigma: HashMap<&str, f64> = accounts.iter().map(|&a| (a, 0.0)).collect();
        let mut dist: HashMap<&str, i64> = accounts.iter().map(|&a| (a, -1)).collect();
        sigma.insert(s, 1.0);
        dist.insert(s, 0);

        let mut queue: std::collections::VecDeque<&str> = std::collections::VecDeque::new();
        queue.push_back(s);

        while let Some(v) = queue.pop_front() {
            stack.push(v);
            for w in graph.out_neighbors(v) {
                if dist[w] < 0 {
                    dist.insert(w, dist[v] + 1);
                    queue.push_back(w);
                }
                if dist[w] == dist[v] + 1 {
                    *sigma.get_mut(w).unwrap() += sigma[v];
                    predecessors.entry(w).or_default().push(v);
                }
            }
        }

        let mut delta: HashMap<&str, f64> = accounts.iter().map(|&a| (a, 0.0)).collect();
        while let Some(w) = stack.pop() {
            if let Some(preds) = predecessors.get(w) {
                for &v in preds {
                    let contribution = (sigma[v] / sigma[w]) * (1.0 + delta[w]);
                    *delta.get_mut(v).unwrap() += contribution;
                }
            }
            if w != s {
                *centrality.get_mut(w).unwrap() += delta[w];
            }
        }
    }

    let normalizer = if n > 2 {
        ((n - 1) * (n - 2)) as f64
    } else {
        0.0
    };

    centrality
        .into_iter()
        .map(|(k, v)| {
            let normalized = if normalizer > 0.0 { v / normalizer } else { 0.0 };
            (k.to_string(), normalized)
        })
        .collect()
}

/// PageRank via power iteration, damping 0.85, dangling mass redistributed
/// uniformly, stopping at tolerance 1e-6 or after 100 iterations.
pub fn pagerank(graph: &TransactionGraph) -> HashMap<String, f64> {
    let accounts = graph.accounts();
    let n = accounts.len();
    if n == 0 {
        return HashMap::new();
    }

    let mut rank: HashMap<&str, f64> = accounts.iter().map(|&a| (a, 1.0 / n as f64)).collect();

    for _ in 0..PAGERANK_MAX_ITERATIONS {
        let dangling_mass: f64 = accounts
            .iter()
            .filter(|&&a| graph.out_degree(a) == 0)
            .map(|&a| rank[a])
            .sum();

        let mut next_rank: HashMap<&str, f64> = HashMap::with_capacity(n);
        for &a in &accounts {
            let incoming: f64 = graph
                .in_neighbors(a)
                .iter()
                .map(|&b| rank[b] / graph.out_degree(b).max(1) as f64)
                .sum();
            let value = (1.0 - PAGERANK_DAMPING) / n as f64
                + PAGERANK_DAMPING * (incoming + dangling_mass / n as f64);
            next_rank.insert(a, value);
        }

        let delta: f64 = accounts
            .iter()
            .map(|&a| (next_rank[a] - rank[a]).abs())
            .sum();
        rank = next_rank;
        if delta < PAGERANK_TOLERANCE {
            break;
        }
    }

    rank.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}
