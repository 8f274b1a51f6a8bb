//! Long-form readings and their fault annotations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One sensor reading at one point in time (a row of the long table)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub timestamp: DateTime<Utc>,
    /// Name of the wide-table column the value came from
    pub sensor_id: String,
    /// `None` when the source cell was empty, `NaN`, or not a number
    pub value: Option<f64>,
}

impl Reading {
    pub fn new(timestamp: DateTime<Utc>, sensor_id: impl Into<String>, value: Option<f64>) -> Self {
        Self {
            timestamp,
            sensor_id: sensor_id.into(),
            value,
        }
    }
}

/// Band a reading falls into relative to its thresholds
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FaultType {
    #[serde(rename = "Very Low")]
    VeryLow,
    Low,
    Normal,
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
    /// Value was missing, so no band applies
    Unknown,
}

impl FaultType {
    /// Every variant, in band order with `Unknown` last
    pub const ALL: [FaultType; 6] = [
        FaultType::VeryLow,
        FaultType::Low,
        FaultType::Normal,
        FaultType::High,
        FaultType::VeryHigh,
        FaultType::Unknown,
    ];

    /// Fixed severity for this band
    pub fn severity(self) -> Severity {
        match self {
            FaultType::VeryLow | FaultType::VeryHigh => Severity::Critical,
            FaultType::Low | FaultType::High => Severity::Warning,
            FaultType::Normal | FaultType::Unknown => Severity::None,
        }
    }

    /// True for the four out-of-band categories
    pub fn is_fault(self) -> bool {
        !matches!(self, FaultType::Normal | FaultType::Unknown)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FaultType::VeryLow => "Very Low",
            FaultType::Low => "Low",
            FaultType::Normal => "Normal",
            FaultType::High => "High",
            FaultType::VeryHigh => "Very High",
            FaultType::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for FaultType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse urgency tag derived from [`FaultType`]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    None = 0,
    Warning = 1,
    Critical = 2,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::None, Severity::Warning, Severity::Critical];

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::None => "None",
            Severity::Warning => "Warning",
            Severity::Critical => "Critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reading annotated by the classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedReading {
    #[serde(flatten)]
    pub reading: Reading,
    pub fault_type: FaultType,
    pub severity: Severity,
}

impl ClassifiedReading {
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.reading.timestamp
    }

    pub fn sensor_id(&self) -> &str {
        &self.reading.sensor_id
    }

    pub fn value(&self) -> Option<f64> {
        self.reading.value
    }
}
