//! Detector Configuration - thresholds, input schema and storage as TOML values
//!
//! Each struct implements `Default` with the built-in values from
//! [`super::defaults`], so an empty or missing file behaves exactly like the
//! hardcoded pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults;
use super::validation::ValidationWarning;
use crate::types::{BandEdges, Thresholds};

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for one detector run.
///
/// Load with `DetectorConfig::load()` which searches:
/// 1. `$SENSOR_FAULTS_CONFIG` env var
/// 2. `./detector_config.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Expected layout of the wide input table
    #[serde(default)]
    pub schema: SchemaConfig,

    /// Fault band cut points
    #[serde(default)]
    pub thresholds: ThresholdConfig,

    /// Reading store location
    #[serde(default)]
    pub storage: StorageConfig,
}

impl DetectorConfig {
    /// Load configuration using the standard search order:
    /// 1. `$SENSOR_FAULTS_CONFIG` environment variable
    /// 2. `./detector_config.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        // 1. Check env var
        if let Ok(path) = std::env::var(defaults::CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded detector config from {}", defaults::CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", defaults::CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", defaults::CONFIG_ENV_VAR);
            }
        }

        // 2. Check ./detector_config.toml
        let local = PathBuf::from(defaults::LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded detector config from ./{}", defaults::LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", defaults::LOCAL_CONFIG_FILE);
                }
            }
        }

        // 3. Defaults
        info!("No {} found, using built-in defaults", defaults::LOCAL_CONFIG_FILE);
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate a TOML document. Unknown keys only warn.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let (config, warnings) = Self::parse_toml(contents)?;
        for w in &warnings {
            warn!("{}", w);
        }
        Ok(config)
    }

    /// Like [`Self::from_toml_str`] but hands the non-fatal warnings
    /// (unknown keys, overrides outside the schema) back instead of logging them.
    pub fn parse_toml(contents: &str) -> Result<(Self, Vec<ValidationWarning>), ConfigError> {
        let mut warnings = super::validation::validate_unknown_keys(contents);

        let config: Self = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        warnings.extend(super::validation::validate_threshold_overrides(&config));
        Ok((config, warnings))
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Save config to a file.
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        info!(path = %path.display(), "Detector config saved");
        Ok(())
    }

    /// Validate the whole config for internal consistency.
    ///
    /// Rules:
    /// - Every threshold set is finite and strictly increasing
    /// - The timestamp column name is non-empty
    /// - Declared sensors are unique and don't collide with the timestamp
    ///   or ignored columns
    /// - The store path is non-empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        if let Err(e) = self.thresholds.default.validate("default") {
            errors.push(e.to_string());
        }
        for (sensor, t) in &self.thresholds.sensors {
            if let Err(e) = t.validate(sensor) {
                errors.push(e.to_string());
            }
        }

        let mut override_ids = std::collections::HashSet::new();
        for sensor in self.thresholds.sensors.keys() {
            if !override_ids.insert(sensor.trim().to_lowercase()) {
                errors.push(format!(
                    "thresholds.sensors has more than one override matching '{sensor}' (ids ignore case)"
                ));
            }
        }

        let s = &self.schema;
        if s.timestamp_column.trim().is_empty() {
            errors.push("schema.timestamp_column must not be empty".to_string());
        }

        let mut seen = std::collections::HashSet::new();
        for sensor in &s.sensors {
            let key = sensor.trim().to_lowercase();
            if key.is_empty() {
                errors.push("schema.sensors contains an empty name".to_string());
                continue;
            }
            if !seen.insert(key.clone()) {
                errors.push(format!("schema.sensors lists '{sensor}' more than once"));
            }
            if key == s.timestamp_column.trim().to_lowercase() {
                errors.push(format!(
                    "schema.sensors contains the timestamp column '{sensor}'"
                ));
            }
            if s.ignored_columns.iter().any(|c| c.trim().to_lowercase() == key) {
                errors.push(format!(
                    "schema.sensors contains '{sensor}' which is also in ignored_columns"
                ));
            }
        }

        if self.storage.path.as_os_str().is_empty() {
            errors.push("storage.path must not be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Schema
// ============================================================================

/// Declared layout of the wide table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Header of the timestamp column (matched case-insensitively)
    #[serde(default = "default_timestamp_column")]
    pub timestamp_column: String,

    /// Expected sensor columns. Empty means every remaining column is a sensor.
    #[serde(default)]
    pub sensors: Vec<String>,

    /// Columns skipped entirely (labels, notes)
    #[serde(default = "default_ignored_columns")]
    pub ignored_columns: Vec<String>,
}

fn default_timestamp_column() -> String {
    defaults::TIMESTAMP_COLUMN.to_string()
}

fn default_ignored_columns() -> Vec<String> {
    defaults::IGNORED_COLUMNS.iter().map(|s| (*s).to_string()).collect()
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            timestamp_column: default_timestamp_column(),
            sensors: Vec::new(),
            ignored_columns: default_ignored_columns(),
        }
    }
}

// ============================================================================
// Thresholds
// ============================================================================

/// Cut points applied by the classifier
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Boundary treatment shared by all threshold sets
    #[serde(default)]
    pub edges: BandEdges,

    /// Applied to every sensor without an override
    #[serde(default)]
    pub default: Thresholds,

    /// Per-sensor overrides keyed by sensor id.
    ///
    /// Fields omitted from an override fall back to the built-in defaults,
    /// not to `[thresholds.default]`.
    #[serde(default)]
    pub sensors: BTreeMap<String, Thresholds>,
}

impl ThresholdConfig {
    /// Thresholds that apply to `sensor_id`.
    ///
    /// Matched like column headers: exact id first, then ignoring case and
    /// surrounding whitespace.
    pub fn for_sensor(&self, sensor_id: &str) -> &Thresholds {
        self.sensors
            .get(sensor_id)
            .or_else(|| {
                let wanted = sensor_id.trim();
                self.sensors
                    .iter()
                    .find(|(id, _)| id.trim().eq_ignore_ascii_case(wanted))
                    .map(|(_, t)| t)
            })
            .unwrap_or(&self.default)
    }
}

// ============================================================================
// Storage
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory of the embedded reading store
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

fn default_store_path() -> PathBuf {
    PathBuf::from(defaults::STORE_PATH)
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = DetectorConfig::default();
        assert!(config.validate().is_ok(), "Default config must always validate");
    }

    #[test]
    fn test_empty_toml_produces_defaults() {
        let config: DetectorConfig = toml::from_str("").expect("empty TOML should parse");
        assert_eq!(config, DetectorConfig::default());
        assert_eq!(config.thresholds.default.very_low_max, 20.0);
        assert_eq!(config.thresholds.default.very_high_min, 99.0);
        assert_eq!(config.schema.timestamp_column, "Timestamp");
        assert_eq!(config.schema.ignored_columns, vec!["Fault".to_string()]);
        assert_eq!(config.thresholds.edges, BandEdges::ClosedNormal);
    }

    #[test]
    fn test_partial_toml_override() {
        let toml_str = r#"
[schema]
sensors = ["Sensor_1", "Sensor_2"]

[thresholds]
edges = "lower_inclusive"

[thresholds.default]
very_high_min = 100.0

[thresholds.sensors.Sensor_2]
very_low_max = 5.0
low_max = 10.0
high_min = 50.0
very_high_min = 60.0
"#;
        let config = DetectorConfig::from_toml_str(toml_str).expect("partial TOML should parse");
        assert_eq!(config.schema.sensors.len(), 2);
        assert_eq!(config.thresholds.edges, BandEdges::LowerInclusive);
        assert_eq!(config.thresholds.default.very_high_min, 100.0);
        // Non-overridden values retain defaults
        assert_eq!(config.thresholds.default.low_max, 40.0);
        assert_eq!(config.thresholds.for_sensor("Sensor_2").high_min, 50.0);
        assert_eq!(config.thresholds.for_sensor("Sensor_1").high_min, 80.0);
    }

    #[test]
    fn test_validation_catches_inverted_thresholds() {
        let toml_str = r#"
[thresholds.default]
very_low_max = 50.0
low_max = 40.0
"#;
        let err = DetectorConfig::from_toml_str(toml_str).unwrap_err();
        match err {
            ConfigError::Validation(errors) => {
                assert_eq!(errors.len(), 1);
                assert!(errors[0].contains("very_low_max"));
            }
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[test]
    fn test_validation_catches_bad_override() {
        let mut config = DetectorConfig::default();
        config
            .thresholds
            .sensors
            .insert("Sensor_9".to_string(), Thresholds::new(1.0, 2.0, 3.0, 3.0));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Sensor_9"));
    }

    #[test]
    fn test_validation_catches_schema_collisions() {
        let mut config = DetectorConfig::default();
        config.schema.sensors = vec![
            "Sensor_1".to_string(),
            "sensor_1".to_string(),
            "Timestamp".to_string(),
            "Fault".to_string(),
        ];
        match config.validate() {
            Err(ConfigError::Validation(errors)) => assert_eq!(errors.len(), 3),
            other => panic!("expected validation errors, got {other:?}"),
        }
    }

    #[test]
    fn test_override_lookup_ignores_case() {
        let mut config = ThresholdConfig::default();
        let pressure = Thresholds::new(100.0, 200.0, 300.0, 400.0);
        config.sensors.insert("Sensor_1".to_string(), pressure);
        assert_eq!(config.for_sensor("Sensor_1"), &pressure);
        assert_eq!(config.for_sensor("SENSOR_1"), &pressure);
        assert_eq!(config.for_sensor(" sensor_1 "), &pressure);
        assert_eq!(config.for_sensor("Sensor_2"), &Thresholds::default());
    }

    #[test]
    fn test_validation_catches_overrides_differing_only_by_case() {
        let mut config = DetectorConfig::default();
        config
            .thresholds
            .sensors
            .insert("Sensor_1".to_string(), Thresholds::new(1.0, 2.0, 3.0, 4.0));
        config
            .thresholds
            .sensors
            .insert("SENSOR_1".to_string(), Thresholds::new(5.0, 6.0, 7.0, 8.0));
        match config.validate() {
            Err(ConfigError::Validation(errors)) => assert_eq!(errors.len(), 1),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_toml_returns_warnings() {
        let toml_str = r#"
[schema]
sensors = ["Sensor_1"]

[thresholds.defualt]
low_max = 30.0

[thresholds.sensors.Sensor_7]
high_min = 90.0
"#;
        let (_, warnings) = DetectorConfig::parse_toml(toml_str).unwrap();
        let fields: Vec<&str> = warnings.iter().map(|w| w.field.as_str()).collect();
        assert!(fields.contains(&"thresholds.defualt"));
        assert!(fields.contains(&"thresholds.sensors.Sensor_7"));
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = DetectorConfig::default();
        config.schema.sensors = vec!["Sensor_1".to_string()];
        config
            .thresholds
            .sensors
            .insert("Sensor_1".to_string(), Thresholds::new(1.0, 2.0, 3.0, 4.0));
        let text = config.to_toml().unwrap();
        let back = DetectorConfig::from_toml_str(&text).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("detector_config.toml");
        let config = DetectorConfig::default();
        config.save_to_file(&path).unwrap();
        let loaded = DetectorConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = DetectorConfig::load_from_file(Path::new("/nonexistent/detector.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_, _)));
    }
}
