//! Detector Configuration Module
//!
//! Provides per-run configuration loaded from TOML files: classification
//! thresholds, the expected input schema, and the reading store location.
//!
//! ## Loading Order
//!
//! 1. `SENSOR_FAULTS_CONFIG` environment variable (path to TOML file)
//! 2. `detector_config.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! The config is an ordinary value. Load it once and pass it to the
//! pipeline stages that need it:
//!
//! ```ignore
//! let config = DetectorConfig::load();
//! let classifier = Classifier::new(&config.thresholds)?;
//! ```

mod detector_config;
pub mod defaults;
pub mod validation;

pub use detector_config::*;
