//! System-wide default constants.
//!
//! Centralises the built-in values used when no config file is present.
//! Grouped by subsystem for easy discovery.

// ============================================================================
// Classification
// ============================================================================

/// Values below this are `Very Low`.
pub const VERY_LOW_MAX: f64 = 20.0;

/// Values below this (and at or above `VERY_LOW_MAX`) are `Low`.
pub const LOW_MAX: f64 = 40.0;

/// Upper edge of the `Normal` band.
pub const HIGH_MIN: f64 = 80.0;

/// Upper edge of the `High` band; anything above is `Very High`.
pub const VERY_HIGH_MIN: f64 = 99.0;

// ============================================================================
// Input Schema
// ============================================================================

/// Name of the timestamp column in the wide CSV.
pub const TIMESTAMP_COLUMN: &str = "Timestamp";

/// Columns that are neither timestamp nor sensor (e.g. a ground-truth label).
pub const IGNORED_COLUMNS: &[&str] = &["Fault"];

/// Maximum number of per-row parse failures logged individually.
pub const MAX_LOGGED_ROW_ERRORS: usize = 10;

// ============================================================================
// Storage
// ============================================================================

/// Default on-disk location of the reading store.
pub const STORE_PATH: &str = "./data/sensor_faults.db";

// ============================================================================
// Config Discovery
// ============================================================================

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "SENSOR_FAULTS_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "detector_config.toml";

// ============================================================================
// CLI Output
// ============================================================================

/// Rows of the classified table printed by `classify` unless overridden.
pub const PREVIEW_ROWS: usize = 100;
