//! Anomaly Detector: hub, burst, and isolated-community network findings,
//! composed from the centrality and community services.

use crate::centrality::{betweenness_centrality, degree_centrality, pagerank};
use crate::community::partition;
use crate::graph::TransactionGraph;
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, instrument};

#[derive(Debug, Clone, Copy)]
pub struct AnomalyDetectorParams {
    pub degree_threshold: f64,
    pub burst_threshold: usize,
    pub burst_window_hours: f64,
    pub isolation_threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HubPayload {
    pub account_id: String,
    pub degree_centrality: f64,
    pub betweenness_centrality: f64,
    pub pagerank: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BurstPayload {
    pub account_id: String,
    pub num_transactions: usize,
    pub window_hours: f64,
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommunityPayload {
    pub members: Vec<String>,
    pub internal_ratio: f64,
    pub internal_transaction_count: usize,
    pub external_transaction_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum AnomalyKind {
    Hub(HubPayload),
    Burst(BurstPayload),
    IsolatedCommunity(CommunityPayload),
}

impl AnomalyKind {
    /// Ordinal used for tie-breaking sort: hub < burst < isolated_community.
    fn ordinal(&self) -> u8 {
        match self {
            AnomalyKind::Hub(_) => 0,
            AnomalyKind::Burst(_) => 1,
            AnomalyKind::IsolatedCommunity(_) => 2,
        }
    }

    /// Secondary sort key: account id for hub/burst, community size for isolated_community.
    fn tiebreak_key(&self) -> String {
        match self {
            AnomalyKind::Hub(p) => p.account_id.clone(),
            AnomalyKind::Burst(p) => p.account_id.clone(),
            AnomalyKind::IsolatedCommunity(p) => format!("{:020}", p.members.len()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkAnomaly {
    pub kind: AnomalyKind,
    pub risk_score: f64,
}

pub struct AnomalyDetector;

impl AnomalyDetector {
    #[instrument(skip(graph, transactions))]
    pub fn detect(
        graph: &TransactionGraph,
        transactions: &[Transaction],
        params: AnomalyDetectorParams,
    ) -> Vec<NetworkAnomaly> {
        let mut anomalies = Vec::new();
        anomalies.extend(Self::detect_hubs(graph, params));
        anomalies.extend(Self::detect_bursts(transactions, params));
        anomalies.extend(Self::detect_isolated_communities(graph, transactions, params));

        debug!(count = anomalies.len(), "network anomalies found");

        anomalies.sort_by(|a, b| {
            b.risk_score
                .partial_cmp(&a.risk_score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.kind.ordinal().cmp(&b.kind.ordinal()))
                .then_with(|| a.kind.tiebreak_key().cmp(&b.kind.tiebreak_key()))
        });

        anomalies
    }

    fn detect_hubs(graph: &TransactionGraph, params: AnomalyDetectorParams) -> Vec<NetworkAnomaly> {
        let degree = degree_centrality(graph);
        if degree.is_empty() {
            return Vec::new();
        }

        let values: Vec<f64> = degree.values().copied().collect();
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
        let stddev = variance.sqrt();

        let dynamic_threshold = params.degree_threshold.max(mean + 2.0 * stddev);

        let betweenness = betweenness_centrality(graph);
        let pr = pagerank(graph);

        let mut accounts: Vec<&str> = graph.accounts();
        accounts.sort_unstable();

        accounts
            .into_iter()
            .filter_map(|account| {
                let d = degree[account];
                if d <= dynamic_threshold {
                    return None;
                }
                let b = betweenness[account];
                let p = pr[account];

                let z_score_factor = if stddev > 0.0 {
                    (((d - mean) / stddev).max(0.0)).min(5.0) / 5.0
                } else {
                    0.0
                };
                let betweenness_factor = (b * 10.0).min(1.0);
                let pagerank_factor = (p * 10.0).min(1.0);

                let risk_score =
                    (0.40 * z_score_factor + 0.30 * betweenness_factor + 0.30 * pagerank_factor)
                        .clamp(0.0, 1.0);

                Some(NetworkAnomaly {
                    kind: AnomalyKind::Hub(HubPayload {
                        account_id: account.to_string(),
                        degree_centrality: d,
                        betweenness_centrality: b,
                        pagerank: p,
                    }),
                    risk_score,
                })
            })
            .collect()
    }

    fn detect_bursts(transactions: &[Transaction], params: AnomalyDetectorParams) -> Vec<NetworkAnomaly> {
        use std::collections::BTreeMap;

        let mut by_sender: BTreeMap<&str, Vec<&Transaction>> = BTreeMap::new();
        for t in transactions {
            by_sender.entry(t.sender_id.as_str()).or_default().push(t);
        }

        let mut results = Vec::new();

        for (sender, mut txs) in by_sender {
            if txs.len() < params.burst_threshold {
                continue;
            }
            txs.sort_by(|a, b| {
                a.timestamp
                    .cmp(&b.timestamp)
                    .then_with(|| a.transaction_id.cmp(&b.transaction_id))
            });

            let window_millis = (params.burst_window_hours * 3_600_000.0) as i64;

            for start in 0..txs.len() {
                let window_end = txs[start].timestamp + chrono::Duration::milliseconds(window_millis);
                let window: Vec<Transaction> = txs[start..]
                    .iter()
                    .take_while(|t| t.timestamp <= window_end)
                    .map(|t| (*t).clone())
                    .collect();

                if window.len() >= params.burst_threshold {
                    let num_transactions = window.len();
                    let density_factor =
                        ((num_transactions as f64 / params.burst_window_hours.max(1e-9)) / 20.0).min(1.0);
                    let count_factor =
                        (num_transactions as f64 / (params.burst_threshold as f64 * 2.0)).min(1.0);
                    let risk_score = (0.50 * count_factor + 0.50 * density_factor).clamp(0.0, 1.0);

                    results.push(NetworkAnomaly {
                        kind: AnomalyKind::Burst(BurstPayload {
                            account_id: sender.to_string(),
                            num_transactions,
                            window_hours: params.burst_window_hours,
                            transactions: window,
                        }),
                        risk_score,
                    });
                    break;
                }
            }
        }

        results
    }

    fn detect_isolated_communities(
        graph: &TransactionGraph,
        transactions: &[Transaction],
        params: AnomalyDetectorParams,
    ) -> Vec<NetworkAnomaly> {
        let communities = partition(graph);

        communities
            .into_iter()
            .filter(|c| c.len() >= 3)
            .filter_map(|members| {
                let member_set: std::collections::HashSet<&str> =
                    members.iter().map(|s| s.as_str()).collect();

                let mut internal = 0usize;
                let mut external = 0usize;
                for t in transactions {
                    let sender_in = member_set.contains(t.sender_id.as_str());
                    let receiver_in = member_set.contains(t.receiver_id.as_str());
                    if sender_in && receiver_in {
                        internal += 1;
                    } else if sender_in || receiver_in {
                        external += 1;
                    }
                }

                if internal + external == 0 {
                    return None;
                }

                let internal_ratio = internal as f64 / (internal + external) as f64;
                if internal_ratio < params.isolation_threshold {
                    return None;
                }

                let size_factor = (members.len() as f64 / 20.0).min(1.0);
                let risk_score = (0.60 * internal_ratio + 0.40 * size_factor).clamp(0.0, 1.0);

                Some(NetworkAnomaly {
                    kind: AnomalyKind::IsolatedCommunity(CommunityPayload {
                        members,
                        internal_ratio,
                        internal_transaction_count: internal,
                        external_transaction_count: external,
                    }),
                    risk_score,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;
    use crate::transaction::TransactionFilter;
    use chrono::{Duration, Utc};

    fn default_params() -> AnomalyDetectorParams {
        AnomalyDetectorParams {
            degree_threshold: 0.1,
            burst_threshold: 20,
            burst_window_hours: 2.0,
            isolation_threshold: 0.7,
        }
    }

    fn tx(id: &str, from: &str, to: &str, amount: f64, minutes_offset: i64) -> Transaction {
        Transaction {
            transaction_id: id.to_string(),
            sender_id: from.to_string(),
            receiver_id: to.to_string(),
            amount,
            timestamp: Utc::now() + Duration::minutes(minutes_offset),
            metadata: None,
        }
    }

    #[test]
    fn star_graph_flags_only_the_hub() {
        let txs: Vec<Transaction> = (0..100)
            .map(|i| tx(&format!("t{i}"), &format!("leaf{i}"), "HUB", 100.0, i))
            .collect();
        let graph = GraphBuilder::build(&txs, &TransactionFilter::default()).unwrap();
        let anomalies = AnomalyDetector::detect(&graph, &txs, default_params());

        let hubs: Vec<_> = anomalies
            .iter()
            .filter(|a| matches!(a.kind, AnomalyKind::Hub(_)))
            .collect();
        assert_eq!(hubs.len(), 1);
        if let AnomalyKind::Hub(ref p) = hubs[0].kind {
            assert_eq!(p.account_id, "HUB");
        }
    }

    #[test]
    fn burst_of_outbound_transactions_is_flagged_once() {
        let txs: Vec<Transaction> = (0..25)
            .map(|i| tx(&format!("t{i}"), "B", &format!("dest{i}"), 100.0, i * 2))
            .collect();
        let graph = GraphBuilder::build(&txs, &TransactionFilter::default()).unwrap();
        let anomalies = AnomalyDetector::detect(&graph, &txs, default_params());

        let bursts: Vec<_> = anomalies
            .iter()
            .filter(|a| matches!(a.kind, AnomalyKind::Burst(_)))
            .collect();
        assert_eq!(bursts.len(), 1);
        if let AnomalyKind::Burst(ref p) = bursts[0].kind {
            assert!(p.num_transactions >= 20);
        }
    }

    #[test]
    fn isolated_community_requires_minimum_size() {
        let txs = vec![tx("1", "A", "B", 100.0, 0), tx("2", "B", "A", 100.0, 1)];
        let graph = GraphBuilder::build(&txs, &TransactionFilter::default()).unwrap();
        let anomalies = AnomalyDetector::detect(&graph, &txs, default_params());
        assert!(!anomalies
            .iter()
            .any(|a| matches!(a.kind, AnomalyKind::IsolatedCommunity(_))));
    }
}
