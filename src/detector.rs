//! End-to-end run: wide CSV to classified long table

use std::path::Path;

use crate::classify::Classifier;
use crate::config::DetectorConfig;
use crate::error::Result;
use crate::ingest;
use crate::reshape::{ReshapeReport, Reshaper};
use crate::types::{ClassifiedReading, WideTable};

/// Outcome of one detection run
#[derive(Debug, Clone)]
pub struct DetectionRun {
    pub readings: Vec<ClassifiedReading>,
    pub report: ReshapeReport,
}

/// Reshaper and classifier built from one config
#[derive(Debug, Clone)]
pub struct FaultDetector {
    reshaper: Reshaper,
    classifier: Classifier,
}

impl FaultDetector {
    /// Fails with `InvalidThreshold` before any input is read
    pub fn from_config(config: &DetectorConfig) -> Result<Self> {
        Ok(Self {
            reshaper: Reshaper::new(config.schema.clone()),
            classifier: Classifier::new(&config.thresholds)?,
        })
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn process_table(&self, table: &WideTable) -> Result<DetectionRun> {
        let reshaped = self.reshaper.reshape(table)?;
        let readings = self.classifier.classify(&reshaped.readings);
        Ok(DetectionRun {
            readings,
            report: reshaped.report,
        })
    }

    pub fn process_file(&self, path: impl AsRef<Path>) -> Result<DetectionRun> {
        let table = ingest::load_wide_csv(path)?;
        self.process_table(&table)
    }
}
