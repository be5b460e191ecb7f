//! Collaborator interfaces consumed by the scan and limit algorithms.
//!
//! The scan never looks inside the physics. It only needs:
//!
//! - a particle model whose mass and coupling it can set (and later restore)
//! - a rate model that is refreshed for every new (mass, coupling) pair
//! - a dataset generator, a spectrum builder and a detector that turn the
//!   refreshed state into one p-value
//!
//! `Pipeline` bundles these borrowed collaborators and runs the per-cell
//! sequence. `ParameterGuard` snapshots the particle parameters and restores
//! them on drop, so every exit path (including `?`) leaves the caller's model
//! unchanged.

use std::ops::{Deref, DerefMut};

use crate::domain::{RateResolution, Target};
use crate::error::AppError;

pub mod synthetic;

#[cfg(test)]
pub(crate) mod scripted;

/// Dark matter particle with a mass and per-target couplings.
pub trait ParticleModel {
    fn mass(&self) -> f64;
    fn set_mass(&mut self, mass: f64);
    fn coupling(&self, target: Target) -> f64;
    fn set_coupling(&mut self, coupling: f64, target: Target);
}

/// Velocity distribution of the galactic halo.
pub trait HaloModel {
    /// Mass density.
    fn density(&self) -> f64;
    /// One-dimensional velocity dispersion.
    fn dispersion(&self) -> f64;
    fn escape_speed(&self) -> f64;
    /// Speed of the observer through the halo.
    fn observer_speed(&self) -> f64;
}

/// Tabulated scattering rates that depend on the particle parameters.
pub trait RateModel {
    /// Rebuild the rate table for the particle's current mass and coupling.
    fn refresh(&mut self, particle: &dyn ParticleModel, resolution: RateResolution) -> Result<(), AppError>;

    /// Probability that a particle arriving with `speed` scatters, from the
    /// last refreshed table.
    fn scattering_probability(&self, speed: f64) -> f64;
}

/// Detector response and likelihood.
pub trait Detector {
    /// Target particles; selects which coupling of the particle model is varied.
    fn target(&self) -> Target;

    /// Smallest incoming speed that can produce a recoil above threshold.
    fn minimum_speed(&self, particle: &dyn ParticleModel) -> Result<f64, AppError>;

    /// P-value of the spectrum under the detector's observed data.
    fn p_value(&self, particle: &dyn ParticleModel, spectrum: &Spectrum) -> Result<f64, AppError>;
}

/// Monte Carlo source of simulated particles. This is the stochastic step.
pub trait DatasetGenerator {
    fn generate(
        &mut self,
        sample_size: usize,
        min_speed: f64,
        particle: &dyn ParticleModel,
        rates: &dyn RateModel,
        halo: &dyn HaloModel,
    ) -> Result<Dataset, AppError>;
}

/// Reduces a dataset to a differential flux spectrum.
pub trait SpectrumBuilder {
    fn build(
        &self,
        dataset: &Dataset,
        rates: &dyn RateModel,
        halo: &dyn HaloModel,
        mass: f64,
    ) -> Result<Spectrum, AppError>;
}

/// Simulated particles that reached the detector above `min_speed`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub min_speed: f64,
    pub speeds: Vec<f64>,
    pub weights: Vec<f64>,
    /// Number of simulated trajectories needed to collect `speeds`.
    pub trials: u64,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.speeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.speeds.is_empty()
    }

    /// Fraction of simulated trajectories that were kept.
    pub fn acceptance(&self) -> f64 {
        if self.trials == 0 {
            return 0.0;
        }
        self.weights.iter().sum::<f64>() / self.trials as f64
    }
}

/// Binned particle flux at the detector.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Spectrum {
    /// Bin edges in speed, `flux.len() + 1` entries.
    pub speed_edges: Vec<f64>,
    pub flux: Vec<f64>,
}

impl Spectrum {
    pub fn total_flux(&self) -> f64 {
        self.flux.iter().sum()
    }
}

/// Borrowed collaborators for one scan or limit computation.
pub struct Pipeline<'a> {
    pub particle: &'a mut dyn ParticleModel,
    pub rates: &'a mut dyn RateModel,
    pub detector: &'a dyn Detector,
    pub generator: &'a mut dyn DatasetGenerator,
    pub spectra: &'a dyn SpectrumBuilder,
    pub halo: &'a dyn HaloModel,
}

impl Pipeline<'_> {
    pub fn target(&self) -> Target {
        self.detector.target()
    }

    /// Run rate refresh, dataset generation, spectrum build and p-value at
    /// the particle's current mass and coupling.
    pub fn p_value(&mut self, sample_size: usize, resolution: RateResolution) -> Result<f64, AppError> {
        self.rates.refresh(&*self.particle, resolution)?;
        let min_speed = self.detector.minimum_speed(&*self.particle)?;
        let dataset = self
            .generator
            .generate(sample_size, min_speed, &*self.particle, &*self.rates, self.halo)?;
        let spectrum = self
            .spectra
            .build(&dataset, &*self.rates, self.halo, self.particle.mass())?;
        let p = self.detector.p_value(&*self.particle, &spectrum)?;
        if p.is_nan() {
            return Err(AppError::collaborator(format!(
                "Detector returned NaN p-value (mass={:e}, coupling={:e}).",
                self.particle.mass(),
                self.particle.coupling(self.target())
            )));
        }
        Ok(p)
    }
}

/// Restores the particle's mass and coupling when dropped.
pub struct ParameterGuard<'p, 'a> {
    pipeline: &'p mut Pipeline<'a>,
    target: Target,
    mass: f64,
    coupling: f64,
}

impl<'p, 'a> ParameterGuard<'p, 'a> {
    pub fn new(pipeline: &'p mut Pipeline<'a>) -> Self {
        let target = pipeline.target();
        let mass = pipeline.particle.mass();
        let coupling = pipeline.particle.coupling(target);
        Self {
            pipeline,
            target,
            mass,
            coupling,
        }
    }

    /// Set mass and coupling for the next evaluation.
    pub fn set_parameters(&mut self, mass: f64, coupling: f64) {
        let target = self.target;
        self.pipeline.particle.set_mass(mass);
        self.pipeline.particle.set_coupling(coupling, target);
    }
}

impl<'a> Deref for ParameterGuard<'_, 'a> {
    type Target = Pipeline<'a>;

    fn deref(&self) -> &Self::Target {
        self.pipeline
    }
}

impl<'a> DerefMut for ParameterGuard<'_, 'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.pipeline
    }
}

impl Drop for ParameterGuard<'_, '_> {
    fn drop(&mut self) {
        self.pipeline.particle.set_mass(self.mass);
        self.pipeline.particle.set_coupling(self.coupling, self.target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::scripted::ScriptedSetup;

    #[test]
    fn guard_restores_parameters_on_drop() {
        let mut setup = ScriptedSetup::new(|_, _| Ok(0.5));
        setup.particle.set_mass(7.0);
        setup.particle.set_coupling(3.0, Target::Nuclei);
        {
            let mut pipeline = setup.pipeline();
            let mut guard = ParameterGuard::new(&mut pipeline);
            guard.set_parameters(100.0, 1.0e-30);
            assert_eq!(guard.particle.mass(), 100.0);
        }
        assert_eq!(setup.particle.mass(), 7.0);
        assert_eq!(setup.particle.coupling(Target::Nuclei), 3.0);
    }

    #[test]
    fn nan_p_value_is_a_collaborator_error() {
        let mut setup = ScriptedSetup::new(|_, _| Ok(f64::NAN));
        let mut pipeline = setup.pipeline();
        let err = pipeline.p_value(10, RateResolution::default()).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn acceptance_uses_weights_over_trials() {
        let data = Dataset {
            min_speed: 0.0,
            speeds: vec![1.0, 2.0],
            weights: vec![1.0, 0.5],
            trials: 6,
        };
        assert!((data.acceptance() - 0.25).abs() < 1e-15);
        assert_eq!(Dataset::default().acceptance(), 0.0);
    }
}
