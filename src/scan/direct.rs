//! Direct limits: solve for the crossing coupling at fixed mass.
//!
//! Instead of filling a grid, each mass gets its own bracketed root search
//! over ln(coupling). Every objective evaluation runs the full pipeline, so
//! this pays off when only a handful of masses are needed.

use tracing::{debug, info};

use crate::domain::{LimitPoint, ScanConfig, ScanThresholds};
use crate::error::AppError;
use crate::math::{find_root, log_space};
use crate::model::{ParameterGuard, Pipeline};
use crate::report::Reporter;

/// Receives each limit as soon as it is computed.
pub trait LimitSink {
    fn record(&mut self, point: LimitPoint) -> Result<(), AppError>;
}

/// Direct-limit session: a mass list, a coupling bracket and the limits
/// found so far.
#[derive(Debug, Clone)]
pub struct DirectLimit {
    masses: Vec<f64>,
    coupling_min: f64,
    coupling_max: f64,
    sample_size: usize,
    certainty_level: f64,
    limits: Vec<f64>,
}

impl DirectLimit {
    pub fn new(
        masses: Vec<f64>,
        coupling_min: f64,
        coupling_max: f64,
        sample_size: usize,
        certainty_level: f64,
    ) -> Result<Self, AppError> {
        if !(coupling_min > 0.0 && coupling_max > coupling_min && coupling_max.is_finite()) {
            return Err(AppError::input(format!(
                "Invalid coupling bracket [{coupling_min:e}, {coupling_max:e}]."
            )));
        }
        Ok(Self {
            masses,
            coupling_min,
            coupling_max,
            sample_size,
            certainty_level,
            limits: Vec::new(),
        })
    }

    /// Log-spaced masses between `mass_min` and `mass_max`.
    pub fn log_spaced(
        sample_size: usize,
        mass_min: f64,
        mass_max: f64,
        n_masses: usize,
        coupling_min: f64,
        coupling_max: f64,
        certainty_level: f64,
    ) -> Result<Self, AppError> {
        let masses = log_space(mass_min, mass_max, n_masses)?;
        Self::new(masses, coupling_min, coupling_max, sample_size, certainty_level)
    }

    pub fn from_config(config: &ScanConfig) -> Result<Self, AppError> {
        Self::log_spaced(
            config.sample_size,
            config.mass_min,
            config.mass_max,
            config.masses,
            config.cross_section_min,
            config.cross_section_max,
            config.certainty_level,
        )
    }

    pub fn masses(&self) -> &[f64] {
        &self.masses
    }

    pub fn limits(&self) -> &[f64] {
        &self.limits
    }

    pub fn certainty_level(&self) -> f64 {
        self.certainty_level
    }

    /// Masses paired with their limits, in computation order.
    pub fn curve(&self) -> Vec<LimitPoint> {
        self.masses
            .iter()
            .zip(self.limits.iter())
            .map(|(&mass, &coupling)| LimitPoint { mass, coupling })
            .collect()
    }

    /// Coupling at which the p-value equals `1 - certainty_level` for `mass`.
    ///
    /// The particle's mass and coupling are restored on return.
    pub fn upper_limit(
        &self,
        mass: f64,
        pipeline: &mut Pipeline<'_>,
        thresholds: &ScanThresholds,
        reporter: &mut dyn Reporter,
    ) -> Result<f64, AppError> {
        let mut guard = ParameterGuard::new(pipeline);
        let threshold = 1.0 - self.certainty_level;
        let sample_size = self.sample_size;

        let log_limit = find_root(
            |log_coupling| {
                let coupling = log_coupling.exp();
                guard.set_parameters(mass, coupling);
                let p = guard.p_value(sample_size, thresholds.rate_resolution)?;
                reporter.p_value(p);
                debug!(mass, coupling, p, "direct limit evaluation");
                Ok(p - threshold)
            },
            self.coupling_min.ln(),
            self.coupling_max.ln(),
            thresholds.direct_log_tolerance,
        )?;

        Ok(log_limit.exp())
    }

    /// Compute a limit for every mass, appending to `limits` and handing
    /// each point to `sink` as soon as it is known.
    pub fn compute_limit_curve(
        &mut self,
        pipeline: &mut Pipeline<'_>,
        thresholds: &ScanThresholds,
        reporter: &mut dyn Reporter,
        mut sink: Option<&mut dyn LimitSink>,
    ) -> Result<(), AppError> {
        for i in 0..self.masses.len() {
            let mass = self.masses[i];
            let coupling = self.upper_limit(mass, pipeline, thresholds, reporter)?;
            self.limits.push(coupling);

            let point = LimitPoint { mass, coupling };
            reporter.limit(point);
            info!(mass, coupling, "direct limit");
            if let Some(sink) = sink.as_mut() {
                sink.record(point)?;
            }
        }
        Ok(())
    }
}
