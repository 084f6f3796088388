//! The transaction store: the validated record type this engine operates on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An immutable, validated transfer record.
///
/// Fields beyond the ones the engine reasons about (currency, channel, ...)
/// are preserved in `metadata` but never inspected by the core — schema
/// checking is the ingest collaborator's job, not this crate's.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub transaction_id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub amount: f64,
    pub timestamp: DateTime<Utc>,
    pub metadata: Option<HashMap<String, String>>,
}

impl Transaction {
    /// True if this transaction is a self-loop (sender == receiver).
    pub fn is_self_loop(&self) -> bool {
        self.sender_id == self.receiver_id
    }
}

/// Filters applied by the graph builder before projecting transactions.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
    pub date_start: Option<DateTime<Utc>>,
    pub date_end: Option<DateTime<Utc>>,
}

impl TransactionFilter {
    /// Validate that bounds are not contradictory.
    pub(crate) fn validate(&self) -> Result<(), crate::DetectionError> {
        if let (Some(min), Some(max)) = (self.min_amount, self.max_amount) {
            if min > max {
                return Err(crate::DetectionError::InvalidFilter(format!(
                    "min_amount {} exceeds max_amount {}",
                    min, max
                )));
            }
        }
        if let (Some(start), Some(end)) = (self.date_start, self.date_end) {
            if start > end {
                return Err(crate::DetectionError::InvalidFilter(format!(
                    "date_start {} is after date_end {}",
                    start, end
                )));
            }
        }
        Ok(())
    }

    pub(crate) fn admits(&self, transaction: &Transaction) -> bool {
        if let Some(min) = self.min_amount {
            if transaction.amount < min {
                return false;
            }
        }
        if let Some(max) = self.max_amount {
            if transaction.amount > max {
                return false;
            }
        }
        if let Some(start) = self.date_start {
            if transaction.timestamp < start {
                return false;
            }
        }
        if let Some(end) = self.date_end {
            if transaction.timestamp > end {
                return false;
            }
        }
        true
    }
}
