//! Terminal rendering helpers.

pub mod ascii;

pub use ascii::*;
