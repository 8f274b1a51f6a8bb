//! Date-range and sensor selection over a classified table

use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::HashSet;

use crate::error::{DetectorError, Result};
use crate::types::ClassifiedReading;

/// Inclusive range of calendar dates (UTC)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Fails with `InvalidDateRange` when `start` is after `end`.
    /// A single-day range (`start == end`) is allowed.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(DetectorError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        let day = ts.date_naive();
        day >= self.start && day <= self.end
    }

    /// Range covering every reading in `table`, or `None` when it is empty
    pub fn spanning(table: &[ClassifiedReading]) -> Option<Self> {
        let (first, last) = time_span(table)?;
        Some(Self {
            start: first.date_naive(),
            end: last.date_naive(),
        })
    }

    /// Default selection: the last `DEFAULT_WINDOW_DAYS` of data, or the
    /// whole span when the data covers less than that.
    pub fn default_window(table: &[ClassifiedReading]) -> Option<Self> {
        let full = Self::spanning(table)?;
        let window_start = full.end - Duration::days(DEFAULT_WINDOW_DAYS);
        Some(Self {
            start: window_start.max(full.start),
            end: full.end,
        })
    }
}

/// Days covered by [`DateRange::default_window`]
pub const DEFAULT_WINDOW_DAYS: i64 = 7;

/// Selection applied before summaries and export.
///
/// `None` fields select everything.
#[derive(Debug, Clone, Default)]
pub struct ReadingFilter {
    pub date_range: Option<DateRange>,
    pub sensors: Option<Vec<String>>,
}

impl ReadingFilter {
    pub fn matches(&self, reading: &ClassifiedReading) -> bool {
        if let Some(range) = &self.date_range {
            if !range.contains(reading.timestamp()) {
                return false;
            }
        }
        match &self.sensors {
            Some(sensors) => sensors.iter().any(|s| s == reading.sensor_id()),
            None => true,
        }
    }

    /// Matching readings, in their original order
    pub fn apply(&self, table: &[ClassifiedReading]) -> Vec<ClassifiedReading> {
        let out: Vec<ClassifiedReading> = table.iter().filter(|r| self.matches(r)).cloned().collect();
        tracing::debug!(input = table.len(), kept = out.len(), "Filter applied");
        out
    }
}

/// Distinct sensor ids in first-seen order
pub fn available_sensors(table: &[ClassifiedReading]) -> Vec<String> {
    let mut seen = HashSet::new();
    table
        .iter()
        .filter(|r| seen.insert(r.sensor_id()))
        .map(|r| r.sensor_id().to_string())
        .collect()
}

/// Earliest and latest timestamp
pub fn time_span(table: &[ClassifiedReading]) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let first = table.iter().map(ClassifiedReading::timestamp).min()?;
    let last = table.iter().map(ClassifiedReading::timestamp).max()?;
    Some((first, last))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FaultType, Reading, Severity};
    use chrono::TimeZone;

    fn row(day: u32, hour: u32, sensor: &str) -> ClassifiedReading {
        ClassifiedReading {
            reading: Reading::new(
                Utc.with_ymd_and_hms(2025, 1, day, hour, 0, 0).unwrap(),
                sensor,
                Some(50.0),
            ),
            fault_type: FaultType::Normal,
            severity: Severity::None,
        }
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    #[test]
    fn test_date_range_rejects_reversed() {
        assert!(matches!(
            DateRange::new(date(5), date(1)),
            Err(DetectorError::InvalidDateRange { .. })
        ));
        assert!(DateRange::new(date(1), date(1)).is_ok());
    }

    #[test]
    fn test_date_range_is_inclusive_by_day() {
        let range = DateRange::new(date(2), date(3)).unwrap();
        assert!(!range.contains(row(1, 23, "a").timestamp()));
        assert!(range.contains(row(2, 0, "a").timestamp()));
        assert!(range.contains(row(3, 23, "a").timestamp()));
        assert!(!range.contains(row(4, 0, "a").timestamp()));
    }

    #[test]
    fn test_filter_by_date_and_sensor() {
        let table = vec![row(1, 0, "a"), row(2, 0, "a"), row(2, 0, "b"), row(3, 0, "b")];
        let filter = ReadingFilter {
            date_range: Some(DateRange::new(date(2), date(3)).unwrap()),
            sensors: Some(vec!["b".to_string()]),
        };
        let out = filter.apply(&table);
        assert_eq!(out, vec![row(2, 0, "b"), row(3, 0, "b")]);
    }

    #[test]
    fn test_default_filter_keeps_everything() {
        let table = vec![row(1, 0, "a"), row(2, 0, "b")];
        assert_eq!(ReadingFilter::default().apply(&table), table);
    }

    #[test]
    fn test_available_sensors_first_seen_order() {
        let table = vec![row(1, 0, "b"), row(1, 0, "a"), row(2, 0, "b")];
        assert_eq!(available_sensors(&table), vec!["b", "a"]);
    }

    #[test]
    fn test_spanning_range() {
        let table = vec![row(3, 5, "a"), row(1, 10, "a"), row(2, 0, "a")];
        let range = DateRange::spanning(&table).unwrap();
        assert_eq!((range.start(), range.end()), (date(1), date(3)));
        assert!(DateRange::spanning(&[]).is_none());
    }

    #[test]
    fn test_default_window_is_last_week() {
        let long = vec![row(1, 0, "a"), row(20, 0, "a")];
        let range = DateRange::default_window(&long).unwrap();
        assert_eq!((range.start(), range.end()), (date(13), date(20)));

        let short = vec![row(1, 0, "a"), row(4, 0, "a")];
        let range = DateRange::default_window(&short).unwrap();
        assert_eq!((range.start(), range.end()), (date(1), date(4)));
    }
}
