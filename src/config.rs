//! Detection configuration: the complete enumerated parameter set from
//! spec §6, plus the string-keyed accessors the coordinator's
//! `get_config`/`set_config` contract requires.

use crate::error::DetectionError;
use serde::{Deserialize, Serialize};

/// Process-local, immutable-during-a-run configuration. Mirrors the
/// teacher crate's `ValidatorConfig`: a plain struct with a `Default` impl.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DetectionConfig {
    pub cycle_min_length: usize,
    pub cycle_max_length: usize,
    pub cycle_time_window_hours: f64,
    pub smurfing_threshold: f64,
    pub smurfing_min_transactions: usize,
    pub smurfing_time_window_hours: f64,
    pub smurfing_amount_ratio: f64,
    pub anomaly_degree_threshold: f64,
    pub anomaly_burst_threshold: usize,
    pub anomaly_burst_window_hours: f64,
    pub anomaly_isolation_threshold: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            cycle_min_length: 3,
            cycle_max_length: 10,
            cycle_time_window_hours: 72.0,
            smurfing_threshold: 10_000.0,
            smurfing_min_transactions: 5,
            smurfing_time_window_hours: 48.0,
            smurfing_amount_ratio: 0.8,
            anomaly_degree_threshold: 0.1,
            anomaly_burst_threshold: 20,
            anomaly_burst_window_hours: 2.0,
            anomaly_isolation_threshold: 0.7,
        }
    }
}

/// The complete enumerated set of parameter keys from spec §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    CycleMinLength,
    CycleMaxLength,
    CycleTimeWindowHours,
    SmurfingThreshold,
    SmurfingMinTransactions,
    SmurfingTimeWindowHours,
    SmurfingAmountRatio,
    AnomalyDegreeThreshold,
    AnomalyBurstThreshold,
    AnomalyBurstWindowHours,
    AnomalyIsolationThreshold,
}

impl ConfigKey {
    /// Parses the string form of a key, failing with `UnknownParameter`
    /// when it falls outside the enumerated set (the boundary a caller
    /// driving this off an external config file would hit).
    pub fn parse(key: &str) -> Result<Self, DetectionError> {
        match key {
            "cycle_min_length" => Ok(Self::CycleMinLength),
            "cycle_max_length" => Ok(Self::CycleMaxLength),
            "cycle_time_window_hours" => Ok(Self::CycleTimeWindowHours),
            "smurfing_threshold" => Ok(Self::SmurfingThreshold),
            "smurfing_min_transactions" => Ok(Self::SmurfingMinTransactions),
            "smurfing_time_window_hours" => Ok(Self::SmurfingTimeWindowHours),
            "smurfing_amount_ratio" => Ok(Self::SmurfingAmountRatio),
            "anomaly_degree_threshold" => Ok(Self::AnomalyDegreeThreshold),
            "anomaly_burst_threshold" => Ok(Self::AnomalyBurstThreshold),
            "anomaly_burst_window_hours" => Ok(Self::AnomalyBurstWindowHours),
            "anomaly_isolation_threshold" => Ok(Self::AnomalyIsolationThreshold),
            other => Err(DetectionError::UnknownParameter(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CycleMinLength => "cycle_min_length",
            Self::CycleMaxLength => "cycle_max_length",
            Self::CycleTimeWindowHours => "cycle_time_window_hours",
            Self::SmurfingThreshold => "smurfing_threshold",
            Self::SmurfingMinTransactions => "smurfing_min_transactions",
            Self::SmurfingTimeWindowHours => "smurfing_time_window_hours",
            Self::SmurfingAmountRatio => "smurfing_amount_ratio",
            Self::AnomalyDegreeThreshold => "anomaly_degree_threshold",
            Self::AnomalyBurstThreshold => "anomaly_burst_threshold",
            Self::AnomalyBurstWindowHours => "anomaly_burst_window_hours",
            Self::AnomalyIsolationThreshold => "anomaly_isolation_threshold",
        }
    }
}

/// A typed configuration value as read or written through the keyed API.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ConfigValue {
    Usize(usize),
    F64(f64),
}

impl DetectionConfig {
    pub fn get(&self, key: ConfigKey) -> ConfigValue {
        match key {
            ConfigKey::CycleMinLength => ConfigValue::Usize(self.cycle_min_length),
            ConfigKey::CycleMaxLength => ConfigValue::Usize(self.cycle_max_length),
            ConfigKey::CycleTimeWindowHours => ConfigValue::F64(self.cycle_time_window_hours),
            ConfigKey::SmurfingThreshold => ConfigValue::F64(self.smurfing_threshold),
            ConfigKey::SmurfingMinTransactions => {
                ConfigValue::Usize(self.smurfing_min_transactions)
            }
            ConfigKey::SmurfingTimeWindowHours => {
                ConfigValue::F64(self.smurfing_time_window_hours)
            }
            ConfigKey::SmurfingAmountRatio => ConfigValue::F64(self.smurfing_amount_ratio),
            ConfigKey::AnomalyDegreeThreshold => ConfigValue::F64(self.anomaly_degree_threshold),
            ConfigKey::AnomalyBurstThreshold => ConfigValue::Usize(self.anomaly_burst_threshold),
            ConfigKey::AnomalyBurstWindowHours => {
                ConfigValue::F64(self.anomaly_burst_window_hours)
            }
            ConfigKey::AnomalyIsolationThreshold => {
                ConfigValue::F64(self.anomaly_isolation_threshold)
            }
        }
    }

    pub fn set(&mut self, key: ConfigKey, value: ConfigValue) {
        match (key, value) {
            (ConfigKey::CycleMinLength, ConfigValue::Usize(v)) => self.cycle_min_length = v,
            (ConfigKey::CycleMaxLength, ConfigValue::Usize(v)) => self.cycle_max_length = v,
            (ConfigKey::CycleTimeWindowHours, ConfigValue::F64(v)) => {
                self.cycle_time_window_hours = v
            }
            (ConfigKey::SmurfingThreshold, ConfigValue::F64(v)) => self.smurfing_threshold = v,
            (ConfigKey::SmurfingMinTransactions, ConfigValue::Usize(v)) => {
                self.smurfing_min_transactions = v
            }
            (ConfigKey::SmurfingTimeWindowHours, ConfigValue::F64(v)) => {
                self.smurfing_time_window_hours = v
            }
            (ConfigKey::SmurfingAmountRatio, ConfigValue::F64(v)) => {
                self.smurfing_amount_ratio = v
            }
            (ConfigKey::AnomalyDegreeThreshold, ConfigValue::F64(v)) => {
                self.anomaly_degree_threshold = v
            }
            (ConfigKey::AnomalyBurstThreshold, ConfigValue::Usize(v)) => {
                self.anomaly_burst_threshold = v
            }
            (ConfigKey::AnomalyBurstWindowHours, ConfigValue::F64(v)) => {
                self.anomaly_burst_window_hours = v
            }
            (ConfigKey::AnomalyIsolationThreshold, ConfigValue::F64(v)) => {
                self.anomaly_isolation_threshold = v
            }
            // A type mismatch (e.g. setting a usize key with an F64 value)
            // leaves the field untouched rather than silently coercing.
            _ => {}
        }
    }
}
