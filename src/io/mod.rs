//! Input/output helpers.
//!
//! - YAML run configuration (`config`)
//! - tab-separated numeric tables with unit factors (`table`)
//! - the result files of a run folder (`export`)

pub mod config;
pub mod export;
pub mod table;

pub use config::*;
pub use export::*;
pub use table::*;
