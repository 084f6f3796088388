//! # Transaction Graph Fraud Detector
//!
//! A batch detection engine over a finite corpus of directed monetary
//! transfers. It identifies three families of suspicious structural
//! patterns:
//!
//! - **Cycles**: closed transfer loops suggestive of layering.
//! - **Smurfing**: many sub-threshold transfers converging on a pivot
//!   account over a short window (structuring).
//! - **Network anomalies**: unusually central accounts (hubs), temporal
//!   bursts of outbound activity, and tightly inward-connected account
//!   clusters (isolated communities).
//!
//! Each finding carries a normalized risk score in `[0, 1]`.
//!
//! File parsing, input validation, synthetic-data generation, report
//! formatting, and the command-line entry point are out of scope: this
//! crate consumes an already-validated `Vec<Transaction>` and produces a
//! structured `ResultSet`.
//!
//! The engine is single-threaded and non-blocking: a detection run is a
//! pure function of (transactions, graph snapshot, configuration). The
//! [`DetectionCoordinator`] is not reentrant — do not drive `build_graph`,
//! `detect_*`, or `set_config` concurrently on the same instance.

pub mod anomaly;
pub mod centrality;
pub mod community;
pub mod config;
pub mod coordinator;
pub mod cycles;
pub mod error;
pub mod graph;
pub mod smurfing;
pub mod transaction;

pub use anomaly::{AnomalyDetector, AnomalyDetectorParams, AnomalyKind, NetworkAnomaly};
pub use centrality::{betweenness_centrality, degree_centrality, pagerank};
pub use community::partition as community_partition;
pub use config::{ConfigKey, ConfigValue, DetectionConfig};
pub use coordinator::{
    AnomalyOverrides, CycleOverrides, DetectionCoordinator, ResultSet, ResultSummary,
    SmurfingOverrides,
};
pub use cycles::{CycleDetectionOutcome, CycleDetector, CycleDetectorParams, CycleFinding};
pub use error::DetectionError;
pub use graph::{EdgeWeight, GraphBuilder, TransactionGraph};
pub use smurfing::{SmurfingDetector, SmurfingDetectorParams, SmurfingFinding};
pub use transaction::{Transaction, TransactionFilter};
