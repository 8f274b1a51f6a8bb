//! Wide CSV Ingest
//!
//! Reads a header row plus data rows into a [`WideTable`] without
//! interpreting any cell. Quote-aware: commas inside double quotes are kept
//! and `""` inside a quoted field is an escaped quote.
//!
//! # Usage
//!
//! ```ignore
//! use sensor_faults::ingest::load_wide_csv;
//!
//! let table = load_wide_csv("readings.csv")?;
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::error::{DetectorError, Result};
use crate::types::WideTable;

// ============================================================================
// CSV Quote-Aware Parsing
// ============================================================================

/// Split a CSV line respecting quoted fields (handles commas inside quotes).
/// Returns owned strings because quoted fields need unquoting.
pub(crate) fn csv_split(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes {
                    // Check for escaped quote ("")
                    if chars.peek() == Some(&'"') {
                        current.push('"');
                        chars.next();
                    } else {
                        in_quotes = false;
                    }
                } else {
                    in_quotes = true;
                }
            }
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }
    fields.push(current);
    fields
}

// ============================================================================
// Loading
// ============================================================================

/// Load a wide CSV file from disk
pub fn load_wide_csv(path: impl AsRef<Path>) -> Result<WideTable> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| DetectorError::io(path, e))?;
    let table = read_wide_csv(file).map_err(|e| match e {
        DetectorError::Io { source, .. } => DetectorError::io(path, source),
        other => other,
    })?;

    tracing::info!(
        file = %path.display(),
        columns = table.header.len(),
        rows = table.row_count(),
        "Wide CSV loaded"
    );
    Ok(table)
}

/// Read a wide CSV from any reader.
///
/// Blank lines are skipped. Short rows are padded with empty (missing)
/// cells and long rows are truncated to the header width.
pub fn read_wide_csv<R: Read>(reader: R) -> Result<WideTable> {
    let reader = BufReader::new(reader);
    let mut lines = reader.lines();

    // Header: first non-blank line
    let mut line_num = 0usize;
    let header_line = loop {
        match lines.next() {
            Some(line) => {
                line_num += 1;
                let line = line.map_err(|e| DetectorError::io("<input>", e))?;
                if !line.trim().is_empty() {
                    break line;
                }
            }
            None => return Err(DetectorError::EmptyInput("no header row".to_string())),
        }
    };

    let header: Vec<String> = csv_split(strip_bom(&header_line))
        .into_iter()
        .map(|h| h.trim().to_string())
        .collect();
    let width = header.len();
    let mut table = WideTable::new(header);
    let mut ragged = 0usize;

    for line_result in lines {
        line_num += 1;
        let line = line_result.map_err(|e| DetectorError::io("<input>", e))?;
        if line.trim().is_empty() {
            continue;
        }

        let cells = csv_split(&line);
        if cells.len() > width {
            if ragged < 10 {
                tracing::warn!(
                    line = line_num,
                    cells = cells.len(),
                    expected = width,
                    "Row has more cells than header, extra cells ignored"
                );
            }
            ragged += 1;
        }
        table.push_row(line_num, cells);
    }

    if ragged > 0 {
        tracing::warn!(rows = ragged, "Rows truncated to header width");
    }

    Ok(table)
}

fn strip_bom(line: &str) -> &str {
    line.strip_prefix('\u{feff}').unwrap_or(line)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_split_quotes() {
        assert_eq!(csv_split("a,b,c"), vec!["a", "b", "c"]);
        assert_eq!(csv_split("\"x,y\",2"), vec!["x,y", "2"]);
        assert_eq!(csv_split("\"say \"\"hi\"\"\",1"), vec!["say \"hi\"", "1"]);
        assert_eq!(csv_split("a,,"), vec!["a", "", ""]);
    }

    #[test]
    fn test_read_wide_csv_basic() {
        let csv = "Timestamp,Sensor_1,Sensor_2\n2025-01-01 00:00,50.0,30.0\n\n2025-01-01 00:01,55.0\n";
        let table = read_wide_csv(csv.as_bytes()).unwrap();
        assert_eq!(table.header, vec!["Timestamp", "Sensor_1", "Sensor_2"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows[0].line, 2);
        assert_eq!(table.rows[1].line, 4);
        assert_eq!(table.rows[1].cells, vec!["2025-01-01 00:01", "55.0", ""]);
    }

    #[test]
    fn test_read_wide_csv_strips_bom_and_trims_header() {
        let csv = "\u{feff}Timestamp , Sensor_1\n2025-01-01,1\n";
        let table = read_wide_csv(csv.as_bytes()).unwrap();
        assert_eq!(table.header, vec!["Timestamp", "Sensor_1"]);
    }

    #[test]
    fn test_read_wide_csv_empty_input() {
        let err = read_wide_csv("".as_bytes()).unwrap_err();
        assert!(matches!(err, DetectorError::EmptyInput(_)));
        let err = read_wide_csv("\n\n".as_bytes()).unwrap_err();
        assert!(matches!(err, DetectorError::EmptyInput(_)));
    }

    #[test]
    fn test_header_only_has_no_rows() {
        let table = read_wide_csv("Timestamp,A\n".as_bytes()).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_wide_csv("/nonexistent/readings.csv").unwrap_err();
        assert!(matches!(err, DetectorError::Io { .. }));
    }
}
