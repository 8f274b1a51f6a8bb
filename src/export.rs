//! CSV export of the classified long table
//!
//! Columns: `Timestamp,SensorID,SensorValue,FaultType,Severity`.
//! Missing values are written as empty cells. Timestamps keep sub-second
//! precision so an export can be ingested again without loss.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{DetectorError, Result};
use crate::types::ClassifiedReading;

pub const EXPORT_HEADER: [&str; 5] = ["Timestamp", "SensorID", "SensorValue", "FaultType", "Severity"];

/// Fractional seconds are written only when present (`.250`, `.000001`)
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Quote a field when it contains a delimiter, quote or line break
fn csv_escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Write the table as CSV, returning the number of data rows written
pub fn write_csv<W: Write>(mut writer: W, table: &[ClassifiedReading]) -> std::io::Result<usize> {
    writeln!(writer, "{}", EXPORT_HEADER.join(","))?;
    for r in table {
        let value = r.value().map(|v| v.to_string()).unwrap_or_default();
        writeln!(
            writer,
            "{},{},{},{},{}",
            r.timestamp().format(TIMESTAMP_FORMAT),
            csv_escape(r.sensor_id()),
            value,
            r.fault_type,
            r.severity
        )?;
    }
    writer.flush()?;
    Ok(table.len())
}

/// Write the table to a CSV file at `path`
pub fn export_csv(path: impl AsRef<Path>, table: &[ClassifiedReading]) -> Result<usize> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| DetectorError::io(path, e))?;
    let rows = write_csv(BufWriter::new(file), table).map_err(|e| DetectorError::io(path, e))?;
    tracing::info!(path = %path.display(), rows, "Classified readings exported");
    Ok(rows)
}
