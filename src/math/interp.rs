//! Piecewise-linear interpolation over tabulated values.

use crate::error::AppError;

/// Linear interpolation through `(nodes[i], values[i])`.
///
/// Nodes must be ascending. Queries outside the node range extrapolate along
/// the nearest end segment.
#[derive(Debug, Clone)]
pub struct Interpolation {
    nodes: Vec<f64>,
    values: Vec<f64>,
}

impl Interpolation {
    pub fn new(nodes: &[f64], values: &[f64]) -> Result<Self, AppError> {
        if nodes.len() != values.len() {
            return Err(AppError::numeric(format!(
                "Interpolation needs matching lengths (nodes={}, values={}).",
                nodes.len(),
                values.len()
            )));
        }
        if nodes.len() < 2 {
            return Err(AppError::numeric("Interpolation needs at least two nodes."));
        }
        if nodes.iter().chain(values.iter()).any(|v| !v.is_finite()) {
            return Err(AppError::numeric("Interpolation nodes and values must be finite."));
        }
        if nodes.windows(2).any(|w| w[1] < w[0]) {
            return Err(AppError::numeric("Interpolation nodes must be ascending."));
        }
        Ok(Self {
            nodes: nodes.to_vec(),
            values: values.to_vec(),
        })
    }

    pub fn eval(&self, x: f64) -> f64 {
        let n = self.nodes.len();
        // Index of the segment [k, k+1] containing x, clamped to the ends.
        let k = match self.nodes.partition_point(|&node| node <= x) {
            0 => 0,
            i if i >= n => n - 2,
            i => i - 1,
        };
        let (x0, x1) = (self.nodes[k], self.nodes[k + 1]);
        let (y0, y1) = (self.values[k], self.values[k + 1]);
        if x1 - x0 == 0.0 {
            return y0;
        }
        y0 + (x - x0) * (y1 - y0) / (x1 - x0)
    }
}
