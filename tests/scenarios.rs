//! End-to-end scenarios driven through the public `DetectionCoordinator` API.

use chrono::{DateTime, Duration, Utc};
use std::sync::Once;
use transaction_graph_fraud_detector::{
    AnomalyKind, CycleOverrides, DetectionCoordinator, SmurfingOverrides, Transaction,
    TransactionFilter,
};

static TRACING_INIT: Once = Once::new();

/// Installs a test-scoped subscriber so `#[instrument]` spans and
/// `info!`/`debug!`/`warn!` events from the coordinator and detectors are
/// visible when a scenario is run with `cargo test -- --nocapture`.
fn init_tracing() {
    TRACING_INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .init();
    });
}

fn base_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn tx(id: &str, from: &str, to: &str, amount: f64, hours_offset: i64) -> Transaction {
    Transaction {
        transaction_id: id.to_string(),
        sender_id: from.to_string(),
        receiver_id: to.to_string(),
        amount,
        timestamp: base_time() + Duration::hours(hours_offset),
        metadata: None,
    }
}

fn coordinator_with(transactions: Vec<Transaction>) -> DetectionCoordinator {
    init_tracing();
    let mut coordinator = DetectionCoordinator::default();
    coordinator.load(transactions);
    coordinator.build_graph(TransactionFilter::default()).unwrap();
    coordinator
}

#[test]
fn three_account_cycle_scenario() {
    let coordinator = coordinator_with(vec![
        tx("1", "A", "B", 10000.0, 0),
        tx("2", "B", "C", 10000.0, 1),
        tx("3", "C", "A", 10000.0, 2),
    ]);

    let outcome = coordinator.detect_cycles(CycleOverrides::default()).unwrap();
    assert_eq!(outcome.findings.len(), 1);

    let finding = &outcome.findings[0];
    assert_eq!(finding.cycle, vec!["A", "B", "C"]);
    assert_eq!(finding.length, 3);
    assert_eq!(finding.total_amount, 30000.0);
    assert!((finding.time_span_hours - 2.0).abs() < 1e-9);
    // 0.30*0.30 + 0.25*1.0 + 0.25*(1 - 2/72) + 0.20*0.30 = 0.643055...
    assert!((finding.risk_score - 0.6431).abs() < 0.001);
}

#[test]
fn cycle_too_slow_is_discarded_scenario() {
    let coordinator = coordinator_with(vec![
        tx("1", "A", "B", 10000.0, 0),
        tx("2", "B", "C", 10000.0, 30),
        tx("3", "C", "A", 10000.0, 80),
    ]);

    let outcome = coordinator.detect_cycles(CycleOverrides::default()).unwrap();
    assert!(outcome.findings.is_empty());
}

#[test]
fn smurfing_pivot_scenario() {
    let amounts = [9000.0, 9100.0, 9200.0, 9300.0, 9400.0, 9450.0, 9480.0, 9500.0];
    let txs: Vec<Transaction> = amounts
        .iter()
        .enumerate()
        .map(|(i, &amount)| tx(&format!("t{i}"), &format!("X{i}"), "P", amount, i as i64 * 5))
        .collect();
    let coordinator = coordinator_with(txs);

    let findings = coordinator
        .detect_smurfing(SmurfingOverrides::default())
        .unwrap();
    assert_eq!(findings.len(), 1);

    let finding = &findings[0];
    assert_eq!(finding.pivot_account, "P");
    assert_eq!(finding.num_transactions, 8);
    assert!((finding.avg_amount - 9250.0).abs() < 5.0);
    assert!(finding.coefficient_of_variation < 0.05);
}

#[test]
fn sub_count_smurfing_scenario() {
    let amounts = [9000.0, 9100.0, 9200.0, 9300.0];
    let txs: Vec<Transaction> = amounts
        .iter()
        .enumerate()
        .map(|(i, &amount)| tx(&format!("t{i}"), &format!("X{i}"), "P", amount, i as i64 * 5))
        .collect();
    let coordinator = coordinator_with(txs);

    let findings = coordinator
        .detect_smurfing(SmurfingOverrides::default())
        .unwrap();
    assert!(findings.is_empty());
}

#[test]
fn hub_scenario() {
    let txs: Vec<Transaction> = (0..100)
        .map(|i| tx(&format!("t{i}"), &format!("leaf{i}"), "H", 100.0, i))
        .collect();
    let coordinator = coordinator_with(txs);

    let anomalies = coordinator
        .detect_anomalies(Default::default())
        .unwrap();
    let hubs: Vec<_> = anomalies
        .iter()
        .filter(|a| matches!(a.kind, AnomalyKind::Hub(_)))
        .collect();

    assert_eq!(hubs.len(), 1);
    match &hubs[0].kind {
        AnomalyKind::Hub(payload) => {
            assert_eq!(payload.account_id, "H");
            assert!((payload.degree_centrality - 0.5).abs() < 0.05);
        }
        _ => unreachable!(),
    }
    assert!(!anomalies
        .iter()
        .any(|a| matches!(&a.kind, AnomalyKind::Hub(p) if p.account_id == "leaf0")));
}

#[test]
fn burst_scenario() {
    let txs: Vec<Transaction> = (0..25)
        .map(|i| {
            Transaction {
                transaction_id: format!("t{i}"),
                sender_id: "B".to_string(),
                receiver_id: format!("dest{i}"),
                amount: 100.0,
                timestamp: base_time() + Duration::minutes(i * 2),
                metadata: None,
            }
        })
        .collect();
    let coordinator = coordinator_with(txs);

    let anomalies = coordinator
        .detect_anomalies(Default::default())
        .unwrap();
    let bursts: Vec<_> = anomalies
        .iter()
        .filter(|a| matches!(a.kind, AnomalyKind::Burst(_)))
        .collect();

    assert_eq!(bursts.len(), 1);
    match &bursts[0].kind {
        AnomalyKind::Burst(payload) => {
            assert_eq!(payload.account_id, "B");
            assert!(payload.num_transactions >= 20);
        }
        _ => unreachable!(),
    }
}

#[test]
fn detect_all_is_deterministic_across_runs() {
    let coordinator = coordinator_with(vec![
        tx("1", "A", "B", 10000.0, 0),
        tx("2", "B", "C", 10000.0, 1),
        tx("3", "C", "A", 10000.0, 2),
        tx("4", "D", "E", 50.0, 10),
    ]);

    let first = coordinator.detect_all().unwrap();
    let second = coordinator.detect_all().unwrap();
    assert_eq!(first, second);
}
