//! Reshaper: wide table to long readings
//!
//! Produces one [`Reading`] per (timestamp, sensor) pair. Rows whose
//! timestamp cannot be parsed are dropped and counted, never silently lost.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::{info, warn};

use crate::config::{defaults, SchemaConfig};
use crate::error::{DetectorError, Result};
use crate::types::{Reading, WideTable};

/// Diagnostics for one reshape pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReshapeReport {
    /// Data rows in the wide table
    pub input_rows: usize,
    /// Rows dropped because the timestamp did not parse
    pub dropped_rows: usize,
    /// Sensor columns, in header order
    pub sensor_ids: Vec<String>,
    /// Cells that produced a missing value (includes `invalid_cells`)
    pub missing_values: usize,
    /// Non-empty cells that were not numbers
    pub invalid_cells: usize,
}

impl ReshapeReport {
    /// Rows that produced readings
    pub fn kept_rows(&self) -> usize {
        self.input_rows - self.dropped_rows
    }
}

/// Long readings plus the diagnostics describing how they were produced
#[derive(Debug, Clone)]
pub struct ReshapeOutput {
    /// Row-major: all sensors of the first kept row, then the next row
    pub readings: Vec<Reading>,
    pub report: ReshapeReport,
}

/// Converts wide tables to long readings according to a declared schema
#[derive(Debug, Clone, Default)]
pub struct Reshaper {
    schema: SchemaConfig,
}

/// Resolved column positions for one table
struct ColumnPlan {
    timestamp: usize,
    sensors: Vec<(usize, String)>,
}

impl Reshaper {
    pub fn new(schema: SchemaConfig) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &SchemaConfig {
        &self.schema
    }

    /// Reshape a wide table into long readings.
    ///
    /// Fails with `MissingColumn` when the timestamp column (or a declared
    /// sensor) is absent, `SchemaMismatch` when a declared schema meets
    /// unexpected columns, and `EmptyInput` when there are no rows, no
    /// sensor columns, or no row with a parseable timestamp.
    pub fn reshape(&self, table: &WideTable) -> Result<ReshapeOutput> {
        let plan = self.plan_columns(table)?;

        if table.is_empty() {
            return Err(DetectorError::EmptyInput("table has no data rows".to_string()));
        }

        let mut report = ReshapeReport {
            input_rows: table.row_count(),
            sensor_ids: plan.sensors.iter().map(|(_, id)| id.clone()).collect(),
            ..Default::default()
        };
        let mut readings = Vec::with_capacity(table.row_count() * plan.sensors.len());

        for row in &table.rows {
            let raw_ts = row.cells[plan.timestamp].as_str();
            let timestamp = match parse_timestamp(raw_ts) {
                Some(ts) => ts,
                None => {
                    if report.dropped_rows < defaults::MAX_LOGGED_ROW_ERRORS {
                        let e = DetectorError::UnparseableTimestamp {
                            line: row.line,
                            raw: raw_ts.to_string(),
                        };
                        warn!(error = %e, "Dropping row");
                    }
                    report.dropped_rows += 1;
                    continue;
                }
            };

            for (idx, sensor_id) in &plan.sensors {
                let cell = row.cells[*idx].as_str();
                let value = parse_value(cell);
                if value.is_none() {
                    report.missing_values += 1;
                    if !is_missing_marker(cell) {
                        if report.invalid_cells < defaults::MAX_LOGGED_ROW_ERRORS {
                            warn!(line = row.line, sensor = %sensor_id, cell = %cell, "Non-numeric cell treated as missing");
                        }
                        report.invalid_cells += 1;
                    }
                }
                readings.push(Reading::new(timestamp, sensor_id.clone(), value));
            }
        }

        if report.kept_rows() == 0 {
            return Err(DetectorError::EmptyInput(format!(
                "all {} rows have unparseable timestamps",
                report.input_rows
            )));
        }

        if report.dropped_rows > 0 {
            warn!(
                dropped = report.dropped_rows,
                input = report.input_rows,
                "Rows dropped for unparseable timestamps"
            );
        }
        info!(
            rows = report.kept_rows(),
            sensors = report.sensor_ids.len(),
            readings = readings.len(),
            missing = report.missing_values,
            "Reshape complete"
        );

        Ok(ReshapeOutput { readings, report })
    }

    /// Locate the timestamp column and the sensor columns
    fn plan_columns(&self, table: &WideTable) -> Result<ColumnPlan> {
        let schema = &self.schema;
        let timestamp = table
            .column_index(&schema.timestamp_column)
            .ok_or_else(|| DetectorError::MissingColumn {
                column: schema.timestamp_column.clone(),
            })?;

        let is_ignored = |name: &str| {
            schema
                .ignored_columns
                .iter()
                .any(|c| c.trim().eq_ignore_ascii_case(name.trim()))
        };
        let is_declared = |name: &str| {
            schema
                .sensors
                .iter()
                .any(|s| s.trim().eq_ignore_ascii_case(name.trim()))
        };

        if !schema.sensors.is_empty() {
            if let Some(missing) = schema
                .sensors
                .iter()
                .find(|s| table.column_index(s.as_str()).is_none())
            {
                return Err(DetectorError::MissingColumn {
                    column: missing.clone(),
                });
            }

            let unexpected: Vec<String> = table
                .header
                .iter()
                .enumerate()
                .filter(|(i, h)| *i != timestamp && !is_declared(h.as_str()) && !is_ignored(h.as_str()))
                .map(|(_, h)| h.clone())
                .collect();
            if !unexpected.is_empty() {
                return Err(DetectorError::SchemaMismatch { unexpected });
            }
        }

        let sensors: Vec<(usize, String)> = table
            .header
            .iter()
            .enumerate()
            .filter(|(i, h)| *i != timestamp && !is_ignored(h.as_str()))
            .map(|(i, h)| (i, h.clone()))
            .collect();

        if sensors.is_empty() {
            return Err(DetectorError::EmptyInput("no sensor columns".to_string()));
        }

        if schema.sensors.is_empty() {
            info!(
                sensors = %sensors.iter().map(|(_, s)| s.as_str()).collect::<Vec<_>>().join(", "),
                "No sensors declared, using every non-timestamp column"
            );
        }

        Ok(ColumnPlan { timestamp, sensors })
    }
}

// ============================================================================
// Cell Parsing
// ============================================================================

/// Cells that mean "no reading" rather than a malformed value
fn is_missing_marker(cell: &str) -> bool {
    let s = cell.trim();
    s.is_empty()
        || s == "-"
        || ["nan", "null", "na", "n/a", "none"]
            .iter()
            .any(|m| s.eq_ignore_ascii_case(m))
}

/// Parse a sensor cell. Missing markers, non-numbers and non-finite
/// values all become `None`, never zero.
pub fn parse_value(cell: &str) -> Option<f64> {
    if is_missing_marker(cell) {
        return None;
    }
    cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse the common timestamp formats to UTC.
///
/// Naive values (no offset) are taken as UTC. Bare dates are midnight.
/// 8- and 14-digit integers that form a valid calendar date are read as
/// `YYYYMMDD[HHMMSS]`. Other integers are Unix epoch seconds, or
/// milliseconds when larger than 10^10.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim().trim_matches('"');

    if s.is_empty() || s.eq_ignore_ascii_case("nan") {
        return None;
    }

    // Compact dates: YYYYMMDD, YYYYMMDDHHMMSS
    if s.bytes().all(|b| b.is_ascii_digit()) {
        let compact = match s.len() {
            8 => NaiveDate::parse_from_str(s, "%Y%m%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0)),
            14 => NaiveDateTime::parse_from_str(s, "%Y%m%d%H%M%S").ok(),
            _ => None,
        };
        if let Some(dt) = compact {
            return Some(dt.and_utc());
        }
    }

    // Unix epoch (numeric)
    if let Ok(epoch) = s.parse::<i64>() {
        return if epoch > 10_000_000_000 {
            DateTime::from_timestamp_millis(epoch)
        } else {
            DateTime::from_timestamp(epoch, 0)
        };
    }

    // Float epoch seconds
    if let Ok(epoch_f) = s.parse::<f64>() {
        if epoch_f > 1_000_000_000.0 && epoch_f.is_finite() {
            return DateTime::from_timestamp_millis((epoch_f * 1000.0).round() as i64);
        }
        return None;
    }

    // ISO 8601 / RFC 3339 with offset
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%:z", "%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M:%S%.f%:z"] {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    // Without offset (assume UTC)
    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.fZ",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::read_wide_csv;
    use chrono::{Datelike, Timelike};

    fn table(csv: &str) -> WideTable {
        read_wide_csv(csv.as_bytes()).unwrap()
    }

    fn schema_with(sensors: &[&str]) -> SchemaConfig {
        SchemaConfig {
            sensors: sensors.iter().map(|s| (*s).to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_compact_dates() {
        let d = parse_timestamp("20250101").unwrap();
        assert_eq!((d.year(), d.month(), d.day(), d.hour()), (2025, 1, 1, 0));

        let dt = parse_timestamp("20250304123015").unwrap();
        assert_eq!((dt.month(), dt.day(), dt.hour(), dt.minute(), dt.second()), (3, 4, 12, 30, 15));

        // Not a calendar date, still an epoch value
        let epoch = parse_timestamp("99999999").unwrap();
        assert_eq!(epoch.year(), 1973);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let minute = parse_timestamp("2025-01-01 00:01").unwrap();
        assert_eq!((minute.hour(), minute.minute()), (0, 1));

        let secs = parse_timestamp("2025-01-01 12:30:15").unwrap();
        assert_eq!(secs.second(), 15);

        let iso = parse_timestamp("2025-01-01T12:30:15Z").unwrap();
        assert_eq!(iso, secs);

        let offset = parse_timestamp("2025-01-01T13:30:15+01:00").unwrap();
        assert_eq!(offset, secs);

        let date = parse_timestamp("2025-03-04").unwrap();
        assert_eq!((date.month(), date.day(), date.hour()), (3, 4, 0));

        let epoch = parse_timestamp("1735689600").unwrap();
        assert_eq!(epoch.year(), 2025);
        let epoch_ms = parse_timestamp("1735689600000").unwrap();
        assert_eq!(epoch, epoch_ms);
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("NaN").is_none());
        assert!(parse_timestamp("not a date").is_none());
        assert!(parse_timestamp("2025-13-45 00:00").is_none());
        assert!(parse_timestamp("12.5").is_none());
    }

    #[test]
    fn test_parse_value_missing_markers() {
        assert_eq!(parse_value("1.5"), Some(1.5));
        assert_eq!(parse_value(" -3 "), Some(-3.0));
        for cell in ["", "NaN", "null", "-", "N/A", "abc", "inf"] {
            assert_eq!(parse_value(cell), None, "cell {cell:?}");
        }
    }

    #[test]
    fn test_reshape_counts_rows_times_sensors() {
        let t = table(
            "Timestamp,Sensor_1,Sensor_2,Sensor_3\n\
             2025-01-01 00:00,50.0,30.0,90.0\n\
             2025-01-01 00:01,55.0,35.0,65.0\n",
        );
        let out = Reshaper::default().reshape(&t).unwrap();
        assert_eq!(out.readings.len(), 6);
        assert_eq!(out.report.dropped_rows, 0);
        assert_eq!(out.report.sensor_ids, vec!["Sensor_1", "Sensor_2", "Sensor_3"]);
        assert_eq!(out.readings[0].sensor_id, "Sensor_1");
        assert_eq!(out.readings[2].value, Some(90.0));
        assert_eq!(out.readings[3].sensor_id, "Sensor_1");
        assert_eq!(out.readings[3].value, Some(55.0));
    }

    #[test]
    fn test_reshape_drops_and_counts_bad_timestamps() {
        let t = table(
            "Timestamp,A,B\n\
             2025-01-01 00:00,1,2\n\
             garbage,3,4\n\
             2025-01-01 00:02,5,6\n\
             ,7,8\n",
        );
        let out = Reshaper::default().reshape(&t).unwrap();
        assert_eq!(out.report.input_rows, 4);
        assert_eq!(out.report.dropped_rows, 2);
        assert_eq!(out.readings.len(), 4);
        assert_eq!(
            out.report.dropped_rows + out.readings.len() / out.report.sensor_ids.len(),
            out.report.input_rows
        );
    }

    #[test]
    fn test_reshape_all_bad_timestamps_is_empty_input() {
        let t = table("Timestamp,A\nnope,1\nstill nope,2\n");
        let err = Reshaper::default().reshape(&t).unwrap_err();
        assert!(matches!(err, DetectorError::EmptyInput(_)));
    }

    #[test]
    fn test_reshape_missing_values_kept_as_none() {
        let t = table("Timestamp,A,B\n2025-01-01,,oops\n");
        let out = Reshaper::default().reshape(&t).unwrap();
        assert_eq!(out.readings.len(), 2);
        assert!(out.readings.iter().all(|r| r.value.is_none()));
        assert_eq!(out.report.missing_values, 2);
        assert_eq!(out.report.invalid_cells, 1);
    }

    #[test]
    fn test_reshape_missing_timestamp_column() {
        let t = table("Time,A\n2025-01-01,1\n");
        let err = Reshaper::default().reshape(&t).unwrap_err();
        assert!(matches!(err, DetectorError::MissingColumn { ref column } if column == "Timestamp"));
    }

    #[test]
    fn test_reshape_custom_timestamp_column() {
        let t = table("Time,A\n2025-01-01,1\n");
        let schema = SchemaConfig {
            timestamp_column: "time".to_string(),
            ..Default::default()
        };
        let out = Reshaper::new(schema).reshape(&t).unwrap();
        assert_eq!(out.readings.len(), 1);
    }

    #[test]
    fn test_reshape_zero_sensor_columns() {
        let t = table("Timestamp,Fault\n2025-01-01,0\n");
        let err = Reshaper::default().reshape(&t).unwrap_err();
        assert!(matches!(err, DetectorError::EmptyInput(_)));
    }

    #[test]
    fn test_reshape_zero_rows() {
        let t = table("Timestamp,A\n");
        let err = Reshaper::default().reshape(&t).unwrap_err();
        assert!(matches!(err, DetectorError::EmptyInput(_)));
    }

    #[test]
    fn test_reshape_skips_ignored_label_column() {
        let t = table("Timestamp,Sensor_1,Fault\n2025-01-01,50,1\n");
        let out = Reshaper::default().reshape(&t).unwrap();
        assert_eq!(out.report.sensor_ids, vec!["Sensor_1"]);
    }

    #[test]
    fn test_declared_schema_missing_sensor() {
        let t = table("Timestamp,Sensor_1\n2025-01-01,50\n");
        let err = Reshaper::new(schema_with(&["Sensor_1", "Sensor_2"]))
            .reshape(&t)
            .unwrap_err();
        assert!(matches!(err, DetectorError::MissingColumn { ref column } if column == "Sensor_2"));
    }

    #[test]
    fn test_declared_schema_rejects_unexpected_columns() {
        let t = table("Timestamp,Sensor_1,Rogue\n2025-01-01,50,1\n");
        let err = Reshaper::new(schema_with(&["Sensor_1"])).reshape(&t).unwrap_err();
        match err {
            DetectorError::SchemaMismatch { unexpected } => assert_eq!(unexpected, vec!["Rogue"]),
            other => panic!("expected schema mismatch, got {other}"),
        }
    }

    #[test]
    fn test_declared_schema_matches_case_insensitively() {
        let t = table("timestamp,SENSOR_1,Fault\n2025-01-01,50,0\n");
        let out = Reshaper::new(schema_with(&["Sensor_1"])).reshape(&t).unwrap();
        assert_eq!(out.report.sensor_ids, vec!["SENSOR_1"]);
    }
}
