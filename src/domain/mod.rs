//! Domain types used throughout the scan.
//!
//! This module defines:
//!
//! - numerical thresholds and rate-table resolution (`ScanThresholds`)
//! - limit curve points (`LimitPoint`)
//! - the resolved run configuration (`ScanConfig`)
//! - natural unit conversion factors (`units`)

pub mod types;
pub mod units;

pub use types::*;
