//! Parameter scan and limit extraction.
//!
//! Responsibilities:
//!
//! - hold the (coupling, mass) p-value grid (`grid`)
//! - fill it cell by cell with pruning (`engine`)
//! - reduce a filled grid to a limit curve (`limits`)
//! - solve for limits directly at fixed mass (`direct`)

pub mod direct;
pub mod engine;
pub mod grid;
pub mod limits;

pub use direct::*;
pub use engine::*;
pub use grid::*;
pub use limits::*;
