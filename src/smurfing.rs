//! Smurfing Detector: per-pivot-account sliding-window analysis of
//! sub-threshold inbound transfers.

use crate::graph::TransactionGraph;
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

#[derive(Debug, Clone, Copy)]
pub struct SmurfingDetectorParams {
    pub threshold: f64,
    pub min_transactions: usize,
    pub time_window_hours: f64,
    pub amount_ratio: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SmurfingFinding {
    pub pivot_account: String,
    pub total_amount: f64,
    pub num_transactions: usize,
    pub avg_amount: f64,
    pub contributing_transactions: Vec<Transaction>,
    pub coefficient_of_variation: f64,
    pub risk_score: f64,
}

pub struct SmurfingDetector;

impl SmurfingDetector {
    #[instrument(skip(graph))]
    pub fn detect(
        graph: &TransactionGraph,
        params: SmurfingDetectorParams,
    ) -> Vec<SmurfingFinding> {
        let mut findings: Vec<SmurfingFinding> = graph
            .accounts()
            .into_iter()
            .filter_map(|account| Self::detect_for_pivot(graph, account, params))
            .collect();

        debug!(pivots = findings.len(), "smurfing pivots found");

        findings.sort_by(|a, b| {
            b.risk_score
                .partial_cmp(&a.risk_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        findings
    }

    fn detect_for_pivot(
        graph: &TransactionGraph,
        pivot: &str,
        params: SmurfingDetectorParams,
    ) -> Option<SmurfingFinding> {
        let mut inbound: Vec<Transaction> = graph
            .inbound(pivot)
            .into_iter()
            .filter(|t| t.amount < params.threshold)
            .cloned()
            .collect();

        if inbound.len() < params.min_transactions {
            return None;
        }

        inbound.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.transaction_id.cmp(&b.transaction_id))
        });

        let mut best: Option<(Vec<Transaction>, f64)> = None;

        for start in 0..inbound.len() {
            let window_millis = (params.time_window_hours * 3_600_000.0) as i64;
            let window_end_time = inbound[start].timestamp + chrono::Duration::milliseconds(window_millis);

            let window: Vec<Transaction> = inbound[start..]
                .iter()
                .take_while(|t| t.timestamp <= window_end_time)
                .cloned()
                .collect();

            if window.len() < params.min_transactions {
                continue;
            }

            let amounts: Vec<f64> = window.iter().map(|t| t.amount).collect();
            let mean = amounts.iter().sum::<f64>() / amounts.len() as f64;
            let cv = if mean > 0.0 {
                let variance =
                    amounts.iter().map(|a| (a - mean).powi(2)).sum::<f64>() / amounts.len() as f64;
                variance.sqrt() / mean
            } else {
                f64::INFINITY
            };

            if cv > 1.0 - params.amount_ratio {
                continue;
            }

            let accept = match &best {
                None => true,
                Some((current, current_cv)) => {
                    window.len() > current.len()
                        || (window.len() == current.len()
                            && (cv < *current_cv
                                || (cv == *current_cv
                                    && window[0].timestamp < current[0].timestamp)))
                }
            };

            if accept {
                best = Some((window, cv));
            }
        }

        let (window, cv) = best?;
        let amounts: Vec<f64> = window.iter().map(|t| t.amount).collect();
        let total_amount: f64 = amounts.iter().sum();
        let num_transactions = window.len();
        let avg_amount = total_amount / num_transactions as f64;
        let risk_score = Self::score(num_transactions, total_amount, avg_amount, cv, params.threshold);

        Some(SmurfingFinding {
            pivot_account: pivot.to_string(),
            total_amount,
            num_transactions,
            avg_amount,
            contributing_transactions: window,
            coefficient_of_variation: cv,
            risk_score,
        })
    }

    fn score(num_transactions: usize, total_amount: f64, avg_amount: f64, cv: f64, threshold: f64) -> f64 {
        let count_factor = (num_transactions as f64 / 20.0).min(1.0);
        let amount_factor = (total_amount / 200_000.0).min(1.0);
        let proximity_factor = if threshold > 0.0 {
            (1.0 - avg_amount / threshold).max(0.0)
        } else {
            0.0
        };
        let variation_factor = (1.0 - cv).max(0.0);

        let score =
            0.30 * count_factor + 0.30 * amount_factor + 0.20 * proximity_factor + 0.20 * variation_factor;
        score.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;
    use crate::transaction::TransactionFilter;
    use chrono::{Duration, Utc};

    fn default_params() -> SmurfingDetectorParams {
        SmurfingDetectorParams {
            threshold: 10_000.0,
            min_transactions: 5,
            time_window_hours: 48.0,
            amount_ratio: 0.8,
        }
    }

    fn tx(id: &str, from: &str, to: &str, amount: f64, hours_offset: i64) -> Transaction {
        Transaction {
            transaction_id: id.to_string(),
            sender_id: from.to_string(),
            receiver_id: to.to_string(),
            amount,
            timestamp: Utc::now() + Duration::hours(hours_offset),
            metadata: None,
        }
    }

    #[test]
    fn smurfing_pivot_is_detected() {
        let amounts = [9000.0, 9100.0, 9200.0, 9300.0, 9400.0, 9450.0, 9480.0, 9500.0];
        let txs: Vec<Transaction> = amounts
            .iter()
            .enumerate()
            .map(|(i, &amount)| tx(&format!("t{i}"), &format!("X{i}"), "P", amount, i as i64 * 5))
            .collect();

        let graph = GraphBuilder::build(&txs, &TransactionFilter::default()).unwrap();
        let findings = SmurfingDetector::detect(&graph, default_params());

        assert_eq!(findings.len(), 1);
        let finding = &findings[0];
        assert_eq!(finding.pivot_account, "P");
        assert_eq!(finding.num_transactions, 8);
        assert!(finding.coefficient_of_variation < 0.2);
    }

    #[test]
    fn below_min_transactions_yields_no_finding() {
        let amounts = [9000.0, 9100.0, 9200.0, 9300.0];
        let txs: Vec<Transaction> = amounts
            .iter()
            .enumerate()
            .map(|(i, &amount)| tx(&format!("t{i}"), &format!("X{i}"), "P", amount, i as i64 * 5))
            .collect();

        let graph = GraphBuilder::build(&txs, &TransactionFilter::default()).unwrap();
        let findings = SmurfingDetector::detect(&graph, default_params());
        assert!(findings.is_empty());
    }

    #[test]
    fn amounts_at_or_above_threshold_are_excluded() {
        let txs = vec![
            tx("1", "A", "P", 10_000.0, 0),
            tx("2", "B", "P", 10_500.0, 1),
            tx("3", "C", "P", 11_000.0, 2),
            tx("4", "D", "P", 12_000.0, 3),
            tx("5", "E", "P", 9_000.0, 4),
        ];
        let graph = GraphBuilder::build(&txs, &TransactionFilter::default()).unwrap();
        let findings = SmurfingDetector::detect(&graph, default_params());
        assert!(findings.is_empty());
    }
}
