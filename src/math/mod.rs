//! Numerical utilities: axis spacing, linear interpolation and root finding.

pub mod interp;
pub mod roots;
pub mod spacing;

pub use interp::*;
pub use roots::*;
pub use spacing::*;
