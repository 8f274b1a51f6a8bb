//! Reading Store
//!
//! Embedded persistence for classified readings. The store is an explicit
//! handle: open it before use, `close()` it (or drop it) when done. Nothing
//! in the pipeline holds a process-wide connection.

use chrono::{DateTime, Utc};
use std::path::Path;

use crate::types::ClassifiedReading;

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<sled::Error> for StorageError {
    fn from(err: sled::Error) -> Self {
        StorageError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Sortable 8-byte prefix: milliseconds since epoch with the sign bit
/// flipped so pre-1970 timestamps still order correctly.
fn time_prefix(ms: i64) -> [u8; 8] {
    ((ms as u64) ^ (1 << 63)).to_be_bytes()
}

fn decode_time_prefix(key: &[u8]) -> Option<DateTime<Utc>> {
    let bytes: [u8; 8] = key.get(..8)?.try_into().ok()?;
    let ms = (u64::from_be_bytes(bytes) ^ (1 << 63)) as i64;
    DateTime::from_timestamp_millis(ms)
}

/// Key: time prefix, sensor id, NUL, then a store-wide sequence number.
///
/// The sequence keeps repeated (timestamp, sensor) pairs as separate entries.
fn reading_key(reading: &ClassifiedReading, seq: u64) -> Vec<u8> {
    let sensor = reading.sensor_id().as_bytes();
    let mut key = Vec::with_capacity(8 + sensor.len() + 1 + 8);
    key.extend_from_slice(&time_prefix(reading.timestamp().timestamp_millis()));
    key.extend_from_slice(sensor);
    key.push(0);
    key.extend_from_slice(&seq.to_be_bytes());
    key
}

/// Persistent table of classified readings
#[derive(Clone)]
pub struct ReadingStore {
    db: sled::Db,
}

impl ReadingStore {
    /// Open or create the store at the specified path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path.as_ref())?;
        tracing::debug!(path = %path.as_ref().display(), entries = db.len(), "Reading store opened");
        Ok(Self { db })
    }

    /// Start from an empty table, discarding anything stored previously
    pub fn init(&self) -> Result<(), StorageError> {
        self.clear()
    }

    /// Append classified readings. Every reading is kept, including
    /// repeats of a (timestamp, sensor) pair. Returns the number written.
    pub fn insert(&self, readings: &[ClassifiedReading]) -> Result<usize, StorageError> {
        let mut batch = sled::Batch::default();
        for r in readings {
            let seq = self.db.generate_id()?;
            batch.insert(reading_key(r, seq), serde_json::to_vec(r)?);
        }
        self.db.apply_batch(batch)?;
        self.db.flush()?;
        tracing::info!(readings = readings.len(), "Readings stored");
        Ok(readings.len())
    }

    /// Every stored reading in chronological order
    pub fn fetch_all(&self) -> Result<Vec<ClassifiedReading>, StorageError> {
        self.db
            .iter()
            .map(|item| {
                let (_key, value) = item?;
                Ok(serde_json::from_slice(&value)?)
            })
            .collect()
    }

    /// Readings with `start <= timestamp <= end`, chronological
    pub fn fetch_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ClassifiedReading>, StorageError> {
        if start > end {
            return Ok(Vec::new());
        }
        let start_key = time_prefix(start.timestamp_millis());
        let end_key = time_prefix(end.timestamp_millis().saturating_add(1));

        self.db
            .range(start_key..end_key)
            .map(|item| {
                let (_key, value) = item?;
                Ok(serde_json::from_slice(&value)?)
            })
            .collect()
    }

    /// Get total number of stored readings
    pub fn count(&self) -> usize {
        self.db.len()
    }

    /// Get database size in bytes
    pub fn size_bytes(&self) -> u64 {
        self.db.size_on_disk().unwrap_or(0)
    }

    /// Clear all readings
    pub fn clear(&self) -> Result<(), StorageError> {
        self.db.clear()?;
        self.db.flush()?;
        Ok(())
    }

    /// Get storage statistics
    pub fn stats(&self) -> Result<StorageStats, StorageError> {
        let oldest = self
            .db
            .first()?
            .and_then(|(k, _)| decode_time_prefix(&k));
        let newest = self
            .db
            .last()?
            .and_then(|(k, _)| decode_time_prefix(&k));

        Ok(StorageStats {
            reading_count: self.count(),
            size_bytes: self.size_bytes(),
            oldest_timestamp: oldest,
            newest_timestamp: newest,
        })
    }

    /// Flush and release the handle
    pub fn close(self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }
}

/// Storage statistics
#[derive(Debug, Clone)]
pub struct StorageStats {
    pub reading_count: usize,
    pub size_bytes: u64,
    pub oldest_timestamp: Option<DateTime<Utc>>,
    pub newest_timestamp: Option<DateTime<Utc>>,
}

impl StorageStats {
    /// Get size in megabytes
    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / (1024.0 * 1024.0)
    }
}
