//! Classifier: threshold bands to fault type and severity
//!
//! Stateless. Every call is a pure function of the readings and the
//! threshold configuration the classifier was built with.

use tracing::info;

use crate::config::ThresholdConfig;
use crate::error::Result;
use crate::types::{ClassifiedReading, FaultType, Reading, Severity};

/// Validated threshold configuration ready to classify readings
#[derive(Debug, Clone)]
pub struct Classifier {
    thresholds: ThresholdConfig,
}

impl Classifier {
    /// Build a classifier, rejecting any threshold set that is not finite
    /// and strictly increasing (`InvalidThreshold`).
    pub fn new(thresholds: &ThresholdConfig) -> Result<Self> {
        thresholds.default.validate("default")?;
        for (sensor, t) in &thresholds.sensors {
            t.validate(sensor)?;
        }
        Ok(Self {
            thresholds: thresholds.clone(),
        })
    }

    pub fn thresholds(&self) -> &ThresholdConfig {
        &self.thresholds
    }

    /// Fault type and severity for one value of `sensor_id`.
    ///
    /// A missing value is `Unknown`/`None`, never `Normal`.
    pub fn classify_value(&self, sensor_id: &str, value: Option<f64>) -> (FaultType, Severity) {
        let fault = match value {
            Some(v) if v.is_finite() => self
                .thresholds
                .for_sensor(sensor_id)
                .band(v, self.thresholds.edges),
            _ => FaultType::Unknown,
        };
        (fault, fault.severity())
    }

    pub fn classify_reading(&self, reading: Reading) -> ClassifiedReading {
        let (fault_type, severity) = self.classify_value(&reading.sensor_id, reading.value);
        ClassifiedReading {
            reading,
            fault_type,
            severity,
        }
    }

    /// Annotate every reading, preserving order
    pub fn classify(&self, readings: &[Reading]) -> Vec<ClassifiedReading> {
        let classified: Vec<ClassifiedReading> = readings
            .iter()
            .cloned()
            .map(|r| self.classify_reading(r))
            .collect();

        let unknown = classified
            .iter()
            .filter(|c| c.fault_type == FaultType::Unknown)
            .count();
        let faults = classified.iter().filter(|c| c.fault_type.is_fault()).count();
        info!(
            readings = classified.len(),
            faults,
            unknown,
            edges = %self.thresholds.edges,
            "Fault classification complete"
        );

        classified
    }

    /// Recompute annotations on an already classified table.
    ///
    /// With unchanged thresholds the result equals the input.
    pub fn reclassify(&self, table: &[ClassifiedReading]) -> Vec<ClassifiedReading> {
        table
            .iter()
            .map(|c| self.classify_reading(c.reading.clone()))
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
