//! User-facing progress reporting.
//!
//! Only one process of a distributed run talks to the console. Instead of
//! rank checks inside the algorithms, the scan and limit code receive a
//! `Reporter`: `ConsoleReporter` for the primary process and
//! `SilentReporter` for all others.

use crate::domain::LimitPoint;
use crate::domain::units::{CM2, GEV, in_units};
use crate::plot::render_scan_progress;
use crate::scan::ParameterGrid;

pub mod format;

pub use format::*;

pub trait Reporter {
    /// Whether this process owns console output and result files.
    fn is_primary(&self) -> bool {
        false
    }

    fn message(&mut self, _text: &str) {}

    /// A grid cell is about to be evaluated. `row` counts coupling rows from
    /// the strongest coupling, `step` counts masses from the heaviest.
    fn cell_started(&mut self, _counter: usize, _grid: &ParameterGrid, _row: usize, _step: usize) {}

    fn p_value(&mut self, _p: f64) {}

    /// The scan is over and `grid` holds its final state.
    fn scan_finished(&mut self, _grid: &ParameterGrid) {}

    fn limit(&mut self, _point: LimitPoint) {}
}

/// Reporter for non-primary processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentReporter;

impl Reporter for SilentReporter {}

/// Prints progress to stdout.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleReporter {
    exclusion_p_value: f64,
    show_grid: bool,
}

impl ConsoleReporter {
    pub fn new(exclusion_p_value: f64, show_grid: bool) -> Self {
        Self {
            exclusion_p_value,
            show_grid,
        }
    }

    /// Final grid picture, when the grid display is on.
    pub fn final_grid(&self, grid: &ParameterGrid) -> Option<String> {
        self.show_grid
            .then(|| render_scan_progress(grid, None, self.exclusion_p_value))
    }
}

impl Reporter for ConsoleReporter {
    fn is_primary(&self) -> bool {
        true
    }

    fn message(&mut self, text: &str) {
        println!("{text}");
    }

    fn cell_started(&mut self, counter: usize, grid: &ParameterGrid, row: usize, step: usize) {
        println!("\n{counter})");
        if self.show_grid {
            print!(
                "{}",
                render_scan_progress(grid, Some((row, step)), self.exclusion_p_value)
            );
        }
    }

    fn p_value(&mut self, p: f64) {
        println!("p-value = {}", round_sig(p, 3));
    }

    fn scan_finished(&mut self, grid: &ParameterGrid) {
        if let Some(picture) = self.final_grid(grid) {
            println!("\nFinal grid:");
            print!("{picture}");
        }
    }

    fn limit(&mut self, point: LimitPoint) {
        println!(
            "{}\t{:e}",
            in_units(point.mass, GEV),
            in_units(point.coupling, CM2)
        );
    }
}

/// Round to `digits` significant digits for display.
pub fn round_sig(value: f64, digits: i32) -> f64 {
    if value == 0.0 || !value.is_finite() {
        return value;
    }
    let magnitude = value.abs().log10().floor() as i32;
    let scale = 10f64.powi(digits - 1 - magnitude);
    (value * scale).round() / scale
}
