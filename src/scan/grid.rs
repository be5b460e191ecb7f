//! P-value grid over (coupling, mass).

use nalgebra::DMatrix;

use crate::domain::ScanConfig;
use crate::error::AppError;

/// Scan session state: both axes, the p-value table and the sample size.
///
/// Rows of `p_values` follow the coupling axis and columns the mass axis,
/// both ascending. Unevaluated cells hold 1.0 (nothing excluded).
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterGrid {
    masses: Vec<f64>,
    couplings: Vec<f64>,
    p_values: DMatrix<f64>,
    sample_size: usize,
}

impl ParameterGrid {
    /// Axes are sorted ascending; duplicates are kept.
    pub fn new(mut masses: Vec<f64>, mut couplings: Vec<f64>, sample_size: usize) -> Self {
        masses.sort_by(f64::total_cmp);
        couplings.sort_by(f64::total_cmp);
        let p_values = DMatrix::from_element(couplings.len(), masses.len(), 1.0);
        Self {
            masses,
            couplings,
            p_values,
            sample_size,
        }
    }

    /// Log-spaced axes from the configured ranges.
    pub fn from_config(config: &ScanConfig) -> Result<Self, AppError> {
        Ok(Self::new(config.mass_axis()?, config.coupling_axis()?, config.sample_size))
    }

    pub fn masses(&self) -> &[f64] {
        &self.masses
    }

    pub fn couplings(&self) -> &[f64] {
        &self.couplings
    }

    pub fn n_masses(&self) -> usize {
        self.masses.len()
    }

    pub fn n_couplings(&self) -> usize {
        self.couplings.len()
    }

    pub fn mass(&self, index: usize) -> f64 {
        self.masses[index]
    }

    pub fn coupling(&self, index: usize) -> f64 {
        self.couplings[index]
    }

    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    pub fn p_value(&self, coupling_index: usize, mass_index: usize) -> f64 {
        self.p_values[(coupling_index, mass_index)]
    }

    pub fn set_p_value(&mut self, coupling_index: usize, mass_index: usize, p: f64) {
        self.p_values[(coupling_index, mass_index)] = p;
    }

    /// Whole table, rows = couplings.
    pub fn p_values(&self) -> &DMatrix<f64> {
        &self.p_values
    }

    /// P-values of one mass column, ordered by ascending coupling.
    pub fn column(&self, mass_index: usize) -> Vec<f64> {
        self.p_values.column(mass_index).iter().copied().collect()
    }

    /// Replace axes and table wholesale (bulk load).
    pub fn replace(&mut self, masses: Vec<f64>, couplings: Vec<f64>, p_values: DMatrix<f64>) -> Result<(), AppError> {
        if p_values.nrows() != couplings.len() || p_values.ncols() != masses.len() {
            return Err(AppError::input(format!(
                "P-value table is {}x{}, expected {}x{} (couplings x masses).",
                p_values.nrows(),
                p_values.ncols(),
                couplings.len(),
                masses.len()
            )));
        }
        if !is_ascending(&masses) || !is_ascending(&couplings) {
            return Err(AppError::input("Imported axes must be ascending."));
        }
        self.masses = masses;
        self.couplings = couplings;
        self.p_values = p_values;
        Ok(())
    }
}

fn is_ascending(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] <= w[1])
}
