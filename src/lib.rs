//! sensor-faults: sensor CSV ingest and threshold fault classification
//!
//! Pipeline stages, each usable on its own:
//!
//! - **Ingest**: wide CSV to `WideTable`
//! - **Reshaper**: wide table to long `(timestamp, sensor, value)` readings
//! - **Classifier**: threshold bands to `FaultType` and `Severity`
//! - **Filter / Summary / Export**: selection, fault distribution, CSV output
//! - **Reading Store**: embedded persistence for classified readings

pub mod classify;
pub mod config;
pub mod detector;
pub mod error;
pub mod export;
pub mod filter;
pub mod ingest;
pub mod reading_store;
pub mod reshape;
pub mod summary;
pub mod types;

pub use classify::Classifier;
pub use config::{ConfigError, DetectorConfig};
pub use detector::{DetectionRun, FaultDetector};
pub use error::DetectorError;
pub use filter::{DateRange, ReadingFilter};
pub use reading_store::{ReadingStore, StorageError, StorageStats};
pub use reshape::{ReshapeOutput, ReshapeReport, Reshaper};
pub use summary::FaultSummary;

pub use types::{
    BandEdges, ClassifiedReading, FaultType, Reading, Severity, Thresholds, WideTable,
};
