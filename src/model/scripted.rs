//! Scripted collaborators for unit tests: the p-value is a closure of
//! `(mass, coupling)` and every evaluation is recorded.

use crate::domain::{RateResolution, Target};
use crate::error::AppError;
use crate::model::synthetic::Particle;
use crate::model::{
    Dataset, DatasetGenerator, Detector, HaloModel, ParticleModel, Pipeline, RateModel, Spectrum, SpectrumBuilder,
};

type Script = Box<dyn Fn(f64, f64) -> Result<f64, AppError>>;

pub(crate) struct NoRates;

impl RateModel for NoRates {
    fn refresh(&mut self, _particle: &dyn ParticleModel, _resolution: RateResolution) -> Result<(), AppError> {
        Ok(())
    }

    fn scattering_probability(&self, _speed: f64) -> f64 {
        0.0
    }
}

pub(crate) struct StillHalo;

impl HaloModel for StillHalo {
    fn density(&self) -> f64 {
        1.0
    }

    fn dispersion(&self) -> f64 {
        1.0
    }

    fn escape_speed(&self) -> f64 {
        1.0
    }

    fn observer_speed(&self) -> f64 {
        0.0
    }
}

/// Records each `(mass, coupling)` the pipeline generates a dataset for.
#[derive(Default)]
pub(crate) struct RecordingGenerator {
    pub calls: Vec<(f64, f64)>,
}

impl DatasetGenerator for RecordingGenerator {
    fn generate(
        &mut self,
        _sample_size: usize,
        min_speed: f64,
        particle: &dyn ParticleModel,
        _rates: &dyn RateModel,
        _halo: &dyn HaloModel,
    ) -> Result<Dataset, AppError> {
        self.calls.push((particle.mass(), particle.coupling(Target::Nuclei)));
        Ok(Dataset {
            min_speed,
            ..Dataset::default()
        })
    }
}

pub(crate) struct EmptySpectra;

impl SpectrumBuilder for EmptySpectra {
    fn build(
        &self,
        _dataset: &Dataset,
        _rates: &dyn RateModel,
        _halo: &dyn HaloModel,
        _mass: f64,
    ) -> Result<Spectrum, AppError> {
        Ok(Spectrum::default())
    }
}

pub(crate) struct ScriptedDetector {
    script: Script,
}

impl Detector for ScriptedDetector {
    fn target(&self) -> Target {
        Target::Nuclei
    }

    fn minimum_speed(&self, _particle: &dyn ParticleModel) -> Result<f64, AppError> {
        Ok(0.0)
    }

    fn p_value(&self, particle: &dyn ParticleModel, _spectrum: &Spectrum) -> Result<f64, AppError> {
        (self.script)(particle.mass(), particle.coupling(Target::Nuclei))
    }
}

pub(crate) struct ScriptedSetup {
    pub particle: Particle,
    pub rates: NoRates,
    pub detector: ScriptedDetector,
    pub generator: RecordingGenerator,
    pub spectra: EmptySpectra,
    pub halo: StillHalo,
}

impl ScriptedSetup {
    pub fn new(script: impl Fn(f64, f64) -> Result<f64, AppError> + 'static) -> Self {
        Self {
            particle: Particle::new(1.0, 1.0, Target::Nuclei),
            rates: NoRates,
            detector: ScriptedDetector {
                script: Box::new(script),
            },
            generator: RecordingGenerator::default(),
            spectra: EmptySpectra,
            halo: StillHalo,
        }
    }

    pub fn pipeline(&mut self) -> Pipeline<'_> {
        Pipeline {
            particle: &mut self.particle,
            rates: &mut self.rates,
            detector: &self.detector,
            generator: &mut self.generator,
            spectra: &self.spectra,
            halo: &self.halo,
        }
    }

    pub fn evaluations(&self) -> &[(f64, f64)] {
        &self.generator.calls
    }
}
