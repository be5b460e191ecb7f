//! Unicode rendering of scan progress.
//!
//! Deterministic, fixed-layout output (one character per cell) so it is easy
//! to eyeball during long scans and to pin in tests.
//!
//! Cells:
//! - `█`: excluded (p-value below the exclusion threshold)
//! - `░`: not excluded, or not evaluated yet without a progress marker
//! - `·`: still pending in the current scan
//! - `¤`: the cell being evaluated
//!
//! The strongest coupling is printed on top and masses ascend to the right.

use crate::scan::ParameterGrid;

/// Render the grid. `progress` is `(row, step)` in scan order: `row` counts
/// coupling rows from the strongest, `step` counts masses from the heaviest.
pub fn render_scan_progress(grid: &ParameterGrid, progress: Option<(usize, usize)>, exclusion_p_value: f64) -> String {
    let n_couplings = grid.n_couplings();
    let n_masses = grid.n_masses();
    let mut out = String::new();

    for row in 0..n_couplings {
        out.push('\t');
        for col in 0..n_masses {
            // Scan step at which this column is visited.
            let col_step = n_masses - 1 - col;
            let ch = match progress {
                Some((current_row, current_step)) if row == current_row && col_step == current_step => '¤',
                Some((current_row, current_step))
                    if row > current_row || (row == current_row && current_step < col_step) =>
                {
                    '·'
                }
                _ => {
                    let p = grid.p_value(n_couplings - 1 - row, col);
                    if p < exclusion_p_value { '█' } else { '░' }
                }
            };
            out.push(ch);
        }
        out.push('\n');
    }

    out
}
