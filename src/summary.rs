//! Fault distribution and severity breakdown
//!
//! Readings with a missing value (`Unknown`) are counted separately and
//! never contribute to fault or severity counts.

use std::collections::BTreeMap;
use std::fmt;

use crate::types::{ClassifiedReading, FaultType, Severity};

/// Per-sensor count of each classified fault type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SensorFaultCounts {
    pub sensor_id: String,
    pub counts: BTreeMap<FaultType, usize>,
}

impl SensorFaultCounts {
    pub fn count(&self, fault: FaultType) -> usize {
        self.counts.get(&fault).copied().unwrap_or(0)
    }

    /// Readings outside the `Normal` band
    pub fn fault_total(&self) -> usize {
        self.counts
            .iter()
            .filter(|(f, _)| f.is_fault())
            .map(|(_, n)| n)
            .sum()
    }

    pub fn classified_total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn severity_count(&self, severity: Severity) -> usize {
        self.counts
            .iter()
            .filter(|(f, _)| f.severity() == severity)
            .map(|(_, n)| n)
            .sum()
    }
}

/// Aggregates over a classified table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaultSummary {
    /// One entry per sensor, in first-seen order
    pub per_sensor: Vec<SensorFaultCounts>,
    pub severity_counts: BTreeMap<Severity, usize>,
    /// Readings excluded because their value was missing
    pub unknown_count: usize,
    pub total_classified: usize,
}

impl FaultSummary {
    pub fn from_readings(table: &[ClassifiedReading]) -> Self {
        let mut summary = Self::default();
        let mut index: BTreeMap<&str, usize> = BTreeMap::new();

        for r in table {
            let slot = *index.entry(r.sensor_id()).or_insert_with(|| {
                summary.per_sensor.push(SensorFaultCounts {
                    sensor_id: r.sensor_id().to_string(),
                    counts: BTreeMap::new(),
                });
                summary.per_sensor.len() - 1
            });

            if r.fault_type == FaultType::Unknown {
                summary.unknown_count += 1;
                continue;
            }

            *summary.per_sensor[slot].counts.entry(r.fault_type).or_insert(0) += 1;
            *summary.severity_counts.entry(r.severity).or_insert(0) += 1;
            summary.total_classified += 1;
        }

        summary
    }

    pub fn severity(&self, severity: Severity) -> usize {
        self.severity_counts.get(&severity).copied().unwrap_or(0)
    }

    /// Sensor with the most out-of-band readings. Ties go to the sensor
    /// seen first; `None` when nothing is out of band.
    pub fn most_faulty_sensor(&self) -> Option<(&str, usize)> {
        self.per_sensor
            .iter()
            .map(|s| (s.sensor_id.as_str(), s.fault_total()))
            .filter(|(_, n)| *n > 0)
            .fold(None, |best, cur| match best {
                Some((_, n)) if n >= cur.1 => best,
                _ => Some(cur),
            })
    }
}

/// Plain-text tables for terminal output
impl fmt::Display for FaultSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bands = [
            FaultType::VeryLow,
            FaultType::Low,
            FaultType::Normal,
            FaultType::High,
            FaultType::VeryHigh,
        ];

        writeln!(f, "Fault distribution per sensor")?;
        write!(f, "{:<20}", "Sensor")?;
        for b in bands {
            write!(f, "{:>10}", b.as_str())?;
        }
        writeln!(f, "{:>10}", "Faults")?;
        for s in &self.per_sensor {
            write!(f, "{:<20}", s.sensor_id)?;
            for b in bands {
                write!(f, "{:>10}", s.count(b))?;
            }
            writeln!(f, "{:>10}", s.fault_total())?;
        }

        writeln!(f)?;
        writeln!(f, "Sensor-level summary")?;
        writeln!(
            f,
            "{:<20}{:>10}{:>10}{:>10}{:>10}",
            "Sensor", "Readings", "Critical", "Warning", "Normal"
        )?;
        for s in &self.per_sensor {
            writeln!(
                f,
                "{:<20}{:>10}{:>10}{:>10}{:>10}",
                s.sensor_id,
                s.classified_total(),
                s.severity_count(Severity::Critical),
                s.severity_count(Severity::Warning),
                s.severity_count(Severity::None)
            )?;
        }

        writeln!(f)?;
        match self.most_faulty_sensor() {
            Some((id, n)) => writeln!(f, "Sensor with most faults: {id} ({n} faults)")?,
            None => writeln!(f, "No faults detected")?,
        }

        writeln!(f)?;
        writeln!(f, "Severity breakdown")?;
        for sev in Severity::ALL {
            writeln!(f, "  {:<10}{:>8}", sev.as_str(), self.severity(sev))?;
        }
        if self.unknown_count > 0 {
            writeln!(
                f,
                "  {:<10}{:>8}  (missing values, not counted)",
                "Unknown", self.unknown_count
            )?;
        }
        Ok(())
    }
}
