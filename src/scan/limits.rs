//! Limit curve extraction from a filled grid.

use tracing::debug;

use crate::domain::{LimitPoint, ScanThresholds};
use crate::error::AppError;
use crate::math::{Interpolation, find_root};
use crate::scan::ParameterGrid;

/// Coupling at which the p-value crosses `1 - certainty_level`, per mass.
///
/// Precondition: within each mass column the p-value falls with coupling.
/// A column only enters the curve when its strongest-coupling cell is
/// below the threshold; the rest of the column is not checked for a sign
/// change. Non-monotonic columns may therefore be dropped or get a wrong
/// crossing.
///
/// The crossing is the root of the linearly interpolated column minus the
/// threshold over the whole coupling axis. A column without a bracketed root
/// is an error that aborts the whole curve.
pub fn limit_curve(
    grid: &ParameterGrid,
    certainty_level: f64,
    thresholds: &ScanThresholds,
) -> Result<Vec<LimitPoint>, AppError> {
    let mut curve = Vec::new();
    let n_couplings = grid.n_couplings();
    if n_couplings == 0 {
        return Ok(curve);
    }

    let threshold = 1.0 - certainty_level;
    let couplings = grid.couplings();
    let strongest = n_couplings - 1;
    let tolerance = thresholds.grid_relative_tolerance * couplings[0];

    for mass_index in 0..grid.n_masses() {
        if grid.p_value(strongest, mass_index) >= threshold {
            continue;
        }
        let shifted: Vec<f64> = grid.column(mass_index).iter().map(|p| p - threshold).collect();
        let interpolation = Interpolation::new(couplings, &shifted)?;
        let coupling = find_root(
            |c| Ok(interpolation.eval(c)),
            couplings[0],
            couplings[strongest],
            tolerance,
        )?;
        let mass = grid.mass(mass_index);
        debug!(mass, coupling, certainty_level, "grid limit");
        curve.push(LimitPoint { mass, coupling });
    }

    Ok(curve)
}

/// Limit curve at one certainty level.
#[derive(Debug, Clone, PartialEq)]
pub struct LimitCurve {
    pub certainty_level: f64,
    pub points: Vec<LimitPoint>,
}

/// One `limit_curve` per certainty level, in the given order.
pub fn limit_curves(
    grid: &ParameterGrid,
    certainty_levels: &[f64],
    thresholds: &ScanThresholds,
) -> Result<Vec<LimitCurve>, AppError> {
    certainty_levels
        .iter()
        .map(|&certainty_level| {
            Ok(LimitCurve {
                certainty_level,
                points: limit_curve(grid, certainty_level, thresholds)?,
            })
        })
        .collect()
}
