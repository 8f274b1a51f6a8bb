//! Fault band thresholds and boundary treatment

use serde::{Deserialize, Serialize};

use crate::config::defaults;
use crate::error::DetectorError;

use super::FaultType;

/// Four cut points splitting the value axis into five contiguous bands.
///
/// Must be finite and strictly increasing:
/// `very_low_max < low_max < high_min < very_high_min`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub very_low_max: f64,
    pub low_max: f64,
    pub high_min: f64,
    pub very_high_min: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            very_low_max: defaults::VERY_LOW_MAX,
            low_max: defaults::LOW_MAX,
            high_min: defaults::HIGH_MIN,
            very_high_min: defaults::VERY_HIGH_MIN,
        }
    }
}

impl Thresholds {
    pub fn new(very_low_max: f64, low_max: f64, high_min: f64, very_high_min: f64) -> Self {
        Self {
            very_low_max,
            low_max,
            high_min,
            very_high_min,
        }
    }

    /// Check the cut points are finite and strictly increasing.
    ///
    /// `scope` names the threshold set in the error (`"default"` or a sensor id).
    pub fn validate(&self, scope: &str) -> Result<(), DetectorError> {
        let cuts = [
            ("very_low_max", self.very_low_max),
            ("low_max", self.low_max),
            ("high_min", self.high_min),
            ("very_high_min", self.very_high_min),
        ];

        // NaN/Inf comparisons silently pass, catch them explicitly
        if let Some((name, v)) = cuts.iter().find(|(_, v)| !v.is_finite()) {
            return Err(DetectorError::InvalidThreshold {
                scope: scope.to_string(),
                reason: format!("{name} must be finite (got {v})"),
            });
        }

        for pair in cuts.windows(2) {
            let (lo_name, lo) = pair[0];
            let (hi_name, hi) = pair[1];
            if lo >= hi {
                return Err(DetectorError::InvalidThreshold {
                    scope: scope.to_string(),
                    reason: format!("{lo_name} ({lo}) must be < {hi_name} ({hi})"),
                });
            }
        }

        Ok(())
    }

    /// Place a present value into its band.
    ///
    /// Assumes `validate` has passed. NaN is never passed here; the caller maps
    /// missing values to [`FaultType::Unknown`].
    pub fn band(&self, value: f64, edges: BandEdges) -> FaultType {
        match edges {
            BandEdges::ClosedNormal => {
                if value < self.very_low_max {
                    FaultType::VeryLow
                } else if value < self.low_max {
                    FaultType::Low
                } else if value <= self.high_min {
                    FaultType::Normal
                } else if value <= self.very_high_min {
                    FaultType::High
                } else {
                    FaultType::VeryHigh
                }
            }
            BandEdges::LowerInclusive => {
                if value < self.very_low_max {
                    FaultType::VeryLow
                } else if value < self.low_max {
                    FaultType::Low
                } else if value < self.high_min {
                    FaultType::Normal
                } else if value < self.very_high_min {
                    FaultType::High
                } else {
                    FaultType::VeryHigh
                }
            }
        }
    }
}

/// How values that land exactly on a cut point are assigned
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BandEdges {
    /// `Normal` is closed on both ends; `High` owns `very_high_min`
    #[default]
    ClosedNormal,
    /// Every band owns its lower edge and excludes its upper edge
    LowerInclusive,
}

impl std::fmt::Display for BandEdges {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BandEdges::ClosedNormal => write!(f, "closed_normal"),
            BandEdges::LowerInclusive => write!(f, "lower_inclusive"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_thresholds() -> Thresholds {
        Thresholds::new(20.0, 40.0, 80.0, 100.0)
    }

    #[test]
    fn test_default_thresholds_validate() {
        assert!(Thresholds::default().validate("default").is_ok());
    }

    #[test]
    fn test_closed_normal_edges() {
        let t = reference_thresholds();
        let e = BandEdges::ClosedNormal;
        assert_eq!(t.band(19.999, e), FaultType::VeryLow);
        assert_eq!(t.band(20.0, e), FaultType::Low);
        assert_eq!(t.band(40.0, e), FaultType::Normal);
        assert_eq!(t.band(80.0, e), FaultType::Normal);
        assert_eq!(t.band(80.001, e), FaultType::High);
        assert_eq!(t.band(100.0, e), FaultType::High);
        assert_eq!(t.band(100.001, e), FaultType::VeryHigh);
    }

    #[test]
    fn test_lower_inclusive_edges() {
        let t = reference_thresholds();
        let e = BandEdges::LowerInclusive;
        assert_eq!(t.band(20.0, e), FaultType::Low);
        assert_eq!(t.band(40.0, e), FaultType::Normal);
        assert_eq!(t.band(80.0, e), FaultType::High);
        assert_eq!(t.band(100.0, e), FaultType::VeryHigh);
    }

    #[test]
    fn test_equal_cut_points_rejected() {
        let t = Thresholds::new(20.0, 40.0, 40.0, 100.0);
        let err = t.validate("Sensor_1").unwrap_err();
        assert!(matches!(err, DetectorError::InvalidThreshold { ref scope, .. } if scope == "Sensor_1"));
        assert!(err.to_string().contains("low_max"));
    }

    #[test]
    fn test_non_finite_rejected() {
        let t = Thresholds::new(f64::NAN, 40.0, 80.0, 100.0);
        assert!(t.validate("default").is_err());
        let t = Thresholds::new(20.0, 40.0, 80.0, f64::INFINITY);
        assert!(t.validate("default").is_err());
    }

    #[test]
    fn test_band_edges_toml_names() {
        #[derive(Deserialize)]
        struct Wrapper {
            edges: BandEdges,
        }
        let w: Wrapper = toml::from_str("edges = \"lower_inclusive\"").unwrap();
        assert_eq!(w.edges, BandEdges::LowerInclusive);
    }
}
