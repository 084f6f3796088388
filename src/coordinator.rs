//! Detection Coordinator: owns configuration and the last-built graph,
//! orchestrates the three detectors, and assembles the result set.

use crate::anomaly::{AnomalyDetector, AnomalyDetectorParams, NetworkAnomaly};
use crate::config::{ConfigKey, ConfigValue, DetectionConfig};
use crate::cycles::{CycleDetectionOutcome, CycleDetector, CycleDetectorParams, CycleFinding};
use crate::error::DetectionError;
use crate::graph::{GraphBuilder, TransactionGraph};
use crate::smurfing::{SmurfingDetector, SmurfingDetectorParams, SmurfingFinding};
use crate::transaction::{Transaction, TransactionFilter};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Totals and high-risk counts (risk_score > 0.7) over a completed run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultSummary {
    pub total_cycles: usize,
    pub total_smurfing: usize,
    pub total_anomalies: usize,
    pub high_risk_cycles: usize,
    pub high_risk_smurfing: usize,
    pub high_risk_anomalies: usize,
}

const HIGH_RISK_THRESHOLD: f64 = 0.7;

impl ResultSummary {
    fn from_findings(
        cycles: &[CycleFinding],
        smurfing: &[SmurfingFinding],
        anomalies: &[NetworkAnomaly],
    ) -> Self {
        Self {
            total_cycles: cycles.len(),
            total_smurfing: smurfing.len(),
            total_anomalies: anomalies.len(),
            high_risk_cycles: cycles.iter().filter(|f| f.risk_score > HIGH_RISK_THRESHOLD).count(),
            high_risk_smurfing: smurfing
                .iter()
                .filter(|f| f.risk_score > HIGH_RISK_THRESHOLD)
                .count(),
            high_risk_anomalies: anomalies
                .iter()
                .filter(|f| f.risk_score > HIGH_RISK_THRESHOLD)
                .count(),
        }
    }
}

/// The three ordered finding lists and summary produced by a detection run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultSet {
    pub cycles: Vec<CycleFinding>,
    pub smurfing: Vec<SmurfingFinding>,
    pub network_anomalies: Vec<NetworkAnomaly>,
    pub summary: ResultSummary,
    pub cycle_enumeration_aborted: bool,
}

/// Per-call overrides for the cycle detector; unset fields fall back to
/// the coordinator's configured defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct CycleOverrides {
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub time_window_hours: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SmurfingOverrides {
    pub threshold: Option<f64>,
    pub min_transactions: Option<usize>,
    pub time_window_hours: Option<f64>,
    pub amount_ratio: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AnomalyOverrides {
    pub degree_threshold: Option<f64>,
    pub burst_threshold: Option<usize>,
    pub burst_window_hours: Option<f64>,
    pub isolation_threshold: Option<f64>,
}

/// Orchestrates the detection engine over a loaded transaction set.
pub struct DetectionCoordinator {
    config: DetectionConfig,
    transactions: Vec<Transaction>,
    graph: Option<TransactionGraph>,
}

impl DetectionCoordinator {
    pub fn new(config: DetectionConfig) -> Self {
        Self {
            config,
            transactions: Vec::new(),
            graph: None,
        }
    }

    /// Replace the transaction store. `transactions` is trusted to already
    /// be validated by the caller (schema checking is out of scope here).
    pub fn load(&mut self, transactions: Vec<Transaction>) {
        info!(count = transactions.len(), "transactions loaded");
        self.transactions = transactions;
        self.graph = None;
    }

    #[instrument(skip(self))]
    pub fn build_graph(&mut self, filter: TransactionFilter) -> Result<(), DetectionError> {
        let graph = GraphBuilder::build(&self.transactions, &filter)?;
        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "graph (re)built"
        );
        self.graph = Some(graph);
        Ok(())
    }

    fn graph(&self) -> Result<&TransactionGraph, DetectionError> {
        self.graph.as_ref().ok_or(DetectionError::GraphNotBuilt)
    }

    #[instrument(skip(self, overrides))]
    pub fn detect_cycles(
        &self,
        overrides: CycleOverrides,
    ) -> Result<CycleDetectionOutcome, DetectionError> {
        let graph = self.graph()?;
        let params = CycleDetectorParams {
            min_length: overrides.min_length.unwrap_or(self.config.cycle_min_length),
            max_length: overrides.max_length.unwrap_or(self.config.cycle_max_length),
            time_window_hours: overrides
                .time_window_hours
                .unwrap_or(self.config.cycle_time_window_hours),
        };
        let outcome = CycleDetector::detect(graph, params);
        info!(findings = outcome.findings.len(), "cycle detection complete");
        Ok(outcome)
    }

    #[instrument(skip(self, overrides))]
    pub fn detect_smurfing(
        &self,
        overrides: SmurfingOverrides,
    ) -> Result<Vec<SmurfingFinding>, DetectionError> {
        let graph = self.graph()?;
        let params = SmurfingDetectorParams {
            threshold: overrides.threshold.unwrap_or(self.config.smurfing_threshold),
            min_transactions: overrides
                .min_transactions
                .unwrap_or(self.config.smurfing_min_transactions),
            time_window_hours: overrides
                .time_window_hours
                .unwrap_or(self.config.smurfing_time_window_hours),
            amount_ratio: overrides
                .amount_ratio
                .unwrap_or(self.config.smurfing_amount_ratio),
        };
        let findings = SmurfingDetector::detect(graph, params);
        info!(findings = findings.len(), "smurfing detection complete");
        Ok(findings)
    }

    #[instrument(skip(self, overrides))]
    pub fn detect_anomalies(
        &self,
        overrides: AnomalyOverrides,
    ) -> Result<Vec<NetworkAnomaly>, DetectionError> {
        let graph = self.graph()?;
        let params = AnomalyDetectorParams {
            degree_threshold: overrides
                .degree_threshold
                .unwrap_or(self.config.anomaly_degree_threshold),
            burst_threshold: overrides
                .burst_threshold
                .unwrap_or(self.config.anomaly_burst_threshold),
            burst_window_hours: overrides
                .burst_window_hours
                .unwrap_or(self.config.anomaly_burst_window_hours),
            isolation_threshold: overrides
                .isolation_threshold
                .unwrap_or(self.config.anomaly_isolation_threshold),
        };
        let anomalies = AnomalyDetector::detect(graph, &self.transactions, params);
        info!(findings = anomalies.len(), "anomaly detection complete");
        Ok(anomalies)
    }

    #[instrument(skip(self))]
    pub fn detect_all(&self) -> Result<ResultSet, DetectionError> {
        let cycle_outcome = self.detect_cycles(CycleOverrides::default())?;
        let smurfing = self.detect_smurfing(SmurfingOverrides::default())?;
        let anomalies = self.detect_anomalies(AnomalyOverrides::default())?;

        let summary = ResultSummary::from_findings(&cycle_outcome.findings, &smurfing, &anomalies);

        Ok(ResultSet {
            cycles: cycle_outcome.findings,
            smurfing,
            network_anomalies: anomalies,
            summary,
            cycle_enumeration_aborted: cycle_outcome.enumeration_aborted,
        })
    }

    pub fn get_config(&self, key: &str) -> Result<ConfigValue, DetectionError> {
        let key = ConfigKey::parse(key)?;
        Ok(self.config.get(key))
    }

    pub fn set_config(&mut self, key: &str, value: ConfigValue) -> Result<(), DetectionError> {
        let key = ConfigKey::parse(key)?;
        self.config.set(key, value);
        Ok(())
    }
}

impl Default for DetectionCoordinator {
    fn default() -> Self {
        Self::new(DetectionConfig::default())
    }
}
