//! Shared data structures for the fault detection pipeline
//!
//! - `WideTable`: raw CSV rows, one column per sensor
//! - `Reading`: one long-form (timestamp, sensor, value) record
//! - `ClassifiedReading`: a reading with its `FaultType` and `Severity`
//! - `Thresholds` / `BandEdges`: classification cut points

mod reading;
mod table;
pub mod thresholds;

pub use reading::*;
pub use table::*;
pub use thresholds::*;
