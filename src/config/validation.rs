//! Config validation: unknown-key detection with Levenshtein suggestions
//! and cross-section consistency checks.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Warnings never break existing configs.

use std::collections::HashSet;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Placeholder segment standing in for any sensor id under `thresholds.sensors`.
const SENSOR_WILDCARD: &str = "*";

/// Returns the complete set of valid dotted key paths for DetectorConfig.
///
/// Maintained manually to match the struct hierarchy in detector_config.rs.
/// Per-sensor override tables appear as `thresholds.sensors.*`.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [schema]
        "schema",
        "schema.timestamp_column",
        "schema.sensors",
        "schema.ignored_columns",
        // [thresholds]
        "thresholds",
        "thresholds.edges",
        // [thresholds.default]
        "thresholds.default",
        "thresholds.default.very_low_max",
        "thresholds.default.low_max",
        "thresholds.default.high_min",
        "thresholds.default.very_high_min",
        // [thresholds.sensors.<id>]
        "thresholds.sensors",
        "thresholds.sensors.*",
        "thresholds.sensors.*.very_low_max",
        "thresholds.sensors.*.low_max",
        "thresholds.sensors.*.high_min",
        "thresholds.sensors.*.very_high_min",
        // [storage]
        "storage",
        "storage.path",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// For example, a table `{ a = { b = 1, c = 2 } }` yields:
/// `["a", "a.b", "a.c"]`. Sensor ids directly under `thresholds.sensors`
/// are replaced by `*` so they match the known-key table.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let segment = if prefix == "thresholds.sensors" {
                SENSOR_WILDCARD
            } else {
                k.as_str()
            };
            let path = if prefix.is_empty() {
                segment.to_string()
            } else {
                format!("{prefix}.{segment}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
///
/// Ties resolve to the lexicographically smallest key so output is stable.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    let mut best: Option<(&str, usize)> = None;
    for &k in known {
        let dist = levenshtein(unknown, k);
        if dist > 3 {
            continue;
        }
        best = match best {
            Some((bk, bd)) if bd < dist || (bd == dist && bk < k) => Some((bk, bd)),
            _ => Some((k, dist)),
        };
    }
    best.map(|(k, _)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// This does NOT fail on unknown keys, it only warns.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(), // parse errors are handled by serde later
    };

    let known = known_config_keys();
    let found = walk_toml_keys(&value, "");
    let mut warnings = Vec::new();

    for key in &found {
        if !known.contains(key.as_str()) {
            let suggestion = suggest_correction(key, &known);
            let message = format!("Unknown config key '{key}'");
            warnings.push(ValidationWarning {
                field: key.clone(),
                message,
                suggestion,
            });
        }
    }

    warnings
}

// ============================================================================
// Cross-Section Checks
// ============================================================================

/// Warn about threshold overrides that can never apply.
///
/// With a declared sensor list, an override for a sensor outside that list is
/// dead configuration (usually a misspelt sensor id).
pub fn validate_threshold_overrides(config: &super::DetectorConfig) -> Vec<ValidationWarning> {
    let declared = &config.schema.sensors;
    if declared.is_empty() {
        return Vec::new();
    }

    config
        .thresholds
        .sensors
        .keys()
        .filter(|id| {
            !declared
                .iter()
                .any(|d| d.trim().eq_ignore_ascii_case(id.trim()))
        })
        .map(|id| {
            let suggestion = declared
                .iter()
                .map(|d| (d, levenshtein(id, d)))
                .filter(|(_, dist)| *dist <= 3)
                .min_by_key(|(_, dist)| *dist)
                .map(|(d, _)| d.clone());
            ValidationWarning {
                field: format!("thresholds.sensors.{id}"),
                message: format!("Threshold override for '{id}' which is not in schema.sensors"),
                suggestion,
            }
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
