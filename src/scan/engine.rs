//! Grid scan with monotonicity pruning.
//!
//! Cells are visited from the strongest coupling down and, inside a row,
//! from the heaviest mass down. Both directions are assumed to get harder to
//! exclude, which allows two shortcuts:
//!
//! - Row break: once a row has produced an exclusion, its first
//!   non-excluded cell ends the row. A row without any exclusion yet ends as
//!   soon as it runs more than one step past the last excluded step.
//! - Scan stop: a row without a single exclusion ends the whole scan.
//!
//! The "last excluded step" is a loop position counted from the heavy end
//! and it carries over from one row to the next. It is only reset when a new
//! scan starts.

use tracing::{debug, info};

use crate::domain::ScanThresholds;
use crate::error::AppError;
use crate::model::{ParameterGuard, Pipeline};
use crate::report::Reporter;
use crate::scan::ParameterGrid;

/// How a scan terminated. Both variants are successful terminations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStop {
    /// Every row was visited.
    Completed,
    /// A row without any exclusion stopped the scan.
    Pruned { coupling_index: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOutcome {
    pub evaluations: usize,
    pub rows_scanned: usize,
    pub stop: ScanStop,
}

/// Fill `grid` by evaluating the pipeline cell by cell.
///
/// The particle's mass and coupling are restored on return, including when
/// a collaborator error aborts the scan.
pub fn perform_scan(
    grid: &mut ParameterGrid,
    pipeline: &mut Pipeline<'_>,
    thresholds: &ScanThresholds,
    reporter: &mut dyn Reporter,
) -> Result<ScanOutcome, AppError> {
    let mut guard = ParameterGuard::new(pipeline);
    let n_couplings = grid.n_couplings();
    let n_masses = grid.n_masses();

    let mut evaluations = 0usize;
    // Off the end: no exclusion seen yet in this scan.
    let mut last_excluded_step = n_masses;

    for row in 0..n_couplings {
        let coupling_index = n_couplings - 1 - row;
        let coupling = grid.coupling(coupling_index);
        let mut row_exclusion = false;

        for step in 0..n_masses {
            let mass_index = n_masses - 1 - step;
            let mass = grid.mass(mass_index);
            guard.set_parameters(mass, coupling);

            evaluations += 1;
            reporter.cell_started(evaluations, grid, row, step);

            let p = guard.p_value(grid.sample_size(), thresholds.rate_resolution)?;
            grid.set_p_value(coupling_index, mass_index, thresholds.clamp(p));
            reporter.p_value(p);
            debug!(mass, coupling, p, row, step, "evaluated grid cell");

            if thresholds.is_excluded(p) {
                row_exclusion = true;
                last_excluded_step = step;
            } else if row_exclusion || step > last_excluded_step + 1 {
                debug!(row, step, last_excluded_step, "row break");
                break;
            }
        }

        if !row_exclusion {
            info!(coupling, coupling_index, evaluations, "no exclusion in row, stopping scan");
            return Ok(ScanOutcome {
                evaluations,
                rows_scanned: row + 1,
                stop: ScanStop::Pruned { coupling_index },
            });
        }
        info!(coupling, coupling_index, last_excluded_step, "row finished");
    }

    Ok(ScanOutcome {
        evaluations,
        rows_scanned: n_couplings,
        stop: ScanStop::Completed,
    })
}
