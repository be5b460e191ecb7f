//! `dm-scan` library crate.
//!
//! Computes dark matter exclusion limits in the (mass, coupling) plane from
//! a p-value scan or a per-mass root search. The binary (`dmscan`) is a thin
//! wrapper around this library so that:
//!
//! - the scan and limit algorithms are testable without spawning processes
//! - the physics collaborators stay swappable behind the `model` traits

pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod io;
pub mod logging;
pub mod math;
pub mod model;
pub mod plot;
pub mod report;
pub mod scan;
