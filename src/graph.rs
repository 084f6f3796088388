//! Graph Builder: projects a filtered transaction set into a directed graph
//! of accounts with aggregated edge weights, while retaining full
//! per-pair transaction multiplicity for later realization.

use crate::error::DetectionError;
use crate::transaction::{Transaction, TransactionFilter};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument};

/// Aggregate weight carried by one directed (sender, receiver) edge.
#[derive(Debug, Clone, Copy)]
pub struct EdgeWeight {
    pub total_amount: f64,
    pub count: usize,
}

/// An immutable directed-multigraph snapshot of accounts and aggregated flow.
///
/// Built once per detection run; detectors only read it.
pub struct TransactionGraph {
    graph: DiGraph<String, EdgeWeight>,
    node_index: HashMap<String, NodeIndex>,
    pair_transactions: HashMap<(String, String), Vec<Transaction>>,
    self_loop_accounts: HashSet<String>,
}

impl TransactionGraph {
    fn empty() -> Self {
        Self {
            graph: DiGraph::new(),
            node_index: HashMap::new(),
            pair_transactions: HashMap::new(),
            self_loop_accounts: HashSet::new(),
        }
    }

    fn node_id(&mut self, account_id: &str) -> NodeIndex {
        if let Some(idx) = self.node_index.get(account_id) {
            return *idx;
        }
        let idx = self.graph.add_node(account_id.to_string());
        self.node_index.insert(account_id.to_string(), idx);
        idx
    }

    /// Distinct account ids, in lexicographic order (deterministic iteration
    /// for every centrality/community/detector pass).
    pub fn accounts(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.node_index.keys().map(|s| s.as_str()).collect();
        ids.sort_unstable();
        ids
    }

    pub fn node_count(&self) -> usize {
        self.node_index.len()
    }

    pub fn has_account(&self, account_id: &str) -> bool {
        self.node_index.contains_key(account_id)
    }

    /// Outgoing neighbor ids of `account_id`, sorted lexicographically.
    pub fn out_neighbors(&self, account_id: &str) -> Vec<&str> {
        let Some(&idx) = self.node_index.get(account_id) else {
            return Vec::new();
        };
        let mut neighbors: Vec<&str> = self
            .graph
            .edges(idx)
            .map(|e| self.graph[e.target()].as_str())
            .collect();
        neighbors.sort_unstable();
        neighbors.dedup();
        neighbors
    }

    /// Incoming neighbor ids of `account_id`, sorted lexicographically.
    pub fn in_neighbors(&self, account_id: &str) -> Vec<&str> {
        let Some(&idx) = self.node_index.get(account_id) else {
            return Vec::new();
        };
        let mut neighbors: Vec<&str> = self
            .graph
            .edges_directed(idx, petgraph::Direction::Incoming)
            .map(|e| self.graph[e.source()].as_str())
            .collect();
        neighbors.sort_unstable();
        neighbors.dedup();
        neighbors
    }

    pub fn out_degree(&self, account_id: &str) -> usize {
        self.out_neighbors(account_id).len()
    }

    pub fn in_degree(&self, account_id: &str) -> usize {
        self.in_neighbors(account_id).len()
    }

    pub fn edge_weight(&self, sender: &str, receiver: &str) -> Option<EdgeWeight> {
        let &from = self.node_index.get(sender)?;
        let &to = self.node_index.get(receiver)?;
        self.graph
            .edges(from)
            .find(|e| e.target() == to)
            .map(|e| *e.weight())
    }

    /// All transactions with sender = `sender`, receiver = `receiver`.
    pub fn transactions_between(&self, sender: &str, receiver: &str) -> &[Transaction] {
        self.pair_transactions
            .get(&(sender.to_string(), receiver.to_string()))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// All transactions with `account_id` as receiver.
    pub fn inbound(&self, account_id: &str) -> Vec<&Transaction> {
        self.pair_transactions
            .iter()
            .filter(|((_, to), _)| to == account_id)
            .flat_map(|(_, txs)| txs.iter())
            .collect()
    }

    /// All transactions with `account_id` as sender.
    pub fn outbound(&self, account_id: &str) -> Vec<&Transaction> {
        self.pair_transactions
            .iter()
            .filter(|((from, _), _)| from == account_id)
            .flat_map(|(_, txs)| txs.iter())
            .collect()
    }

    pub fn is_self_loop_account(&self, account_id: &str) -> bool {
        self.self_loop_accounts.contains(account_id)
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

/// Builds `TransactionGraph` snapshots from a transaction sequence.
pub struct GraphBuilder;

impl GraphBuilder {
    #[instrument(skip(transactions))]
    pub fn build(
        transactions: &[Transaction],
        filter: &TransactionFilter,
    ) -> Result<TransactionGraph, DetectionError> {
        filter.validate()?;

        let mut g = TransactionGraph::empty();

        for transaction in transactions.iter().filter(|t| filter.admits(t)) {
            let from = transaction.sender_id.clone();
            let to = transaction.receiver_id.clone();

            if from == to {
                g.self_loop_accounts.insert(from.clone());
            }

            let from_idx = g.node_id(&from);
            let to_idx = g.node_id(&to);

            let existing_edge = g.graph.find_edge(from_idx, to_idx);
            match existing_edge {
                Some(edge_idx) => {
                    let weight = &mut g.graph[edge_idx];
                    weight.total_amount += transaction.amount;
                    weight.count += 1;
                }
                None => {
                    g.graph.add_edge(
                        from_idx,
                        to_idx,
                        EdgeWeight {
                            total_amount: transaction.amount,
                            count: 1,
                        },
                    );
                }
            }

            g.pair_transactions
                .entry((from, to))
                .or_default()
                .push(transaction.clone());
        }

        debug!(
            nodes = g.node_count(),
            edges = g.edge_count(),
            "graph built"
        );

        Ok(g)
    }
}
