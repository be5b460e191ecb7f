#![allow(dead_code)]

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use dm_scan::domain::{RateResolution, ScanConfig, Target};
use dm_scan::error::AppError;
use dm_scan::io::parse_config;
use dm_scan::model::synthetic::Particle;
use dm_scan::model::{
    Dataset, DatasetGenerator, Detector, HaloModel, ParticleModel, Pipeline, RateModel, Spectrum, SpectrumBuilder,
};
use dm_scan::report::Reporter;

/// P-value as a function of `(mass, coupling)`.
pub type Script = fn(f64, f64) -> f64;

struct FlatRates;

impl RateModel for FlatRates {
    fn refresh(&mut self, _particle: &dyn ParticleModel, _resolution: RateResolution) -> Result<(), AppError> {
        Ok(())
    }

    fn scattering_probability(&self, _speed: f64) -> f64 {
        1.0
    }
}

struct FlatHalo;

impl HaloModel for FlatHalo {
    fn density(&self) -> f64 {
        1.0
    }

    fn dispersion(&self) -> f64 {
        1.0
    }

    fn escape_speed(&self) -> f64 {
        2.0
    }

    fn observer_speed(&self) -> f64 {
        0.0
    }
}

struct NoData;

impl DatasetGenerator for NoData {
    fn generate(
        &mut self,
        _sample_size: usize,
        min_speed: f64,
        _particle: &dyn ParticleModel,
        _rates: &dyn RateModel,
        _halo: &dyn HaloModel,
    ) -> Result<Dataset, AppError> {
        Ok(Dataset {
            min_speed,
            ..Dataset::default()
        })
    }
}

struct NoSpectrum;

impl SpectrumBuilder for NoSpectrum {
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

struct ScriptedDetector {
    script: Script,
    calls: Rc<RefCell<Vec<(f64, f64)>>>,
}

impl Detector for ScriptedDetector {
    fn target(&self) -> Target {
        Target::Nuclei
    }

    fn minimum_speed(&self, _particle: &dyn ParticleModel) -> Result<f64, AppError> {
        Ok(0.0)
    }

    fn p_value(&self, particle: &dyn ParticleModel, _spectrum: &Spectrum) -> Result<f64, AppError> {
        let (mass, coupling) = (particle.mass(), particle.coupling(Target::Nuclei));
        self.calls.borrow_mut().push((mass, coupling));
        Ok((self.script)(mass, coupling))
    }
}

/// Stub collaborators whose detector answers from a script.
pub struct Scripted {
    pub particle: Particle,
    rates: FlatRates,
    detector: ScriptedDetector,
    generator: NoData,
    spectra: NoSpectrum,
    halo: FlatHalo,
    calls: Rc<RefCell<Vec<(f64, f64)>>>,
}

impl Scripted {
    pub fn new(script: Script) -> Self {
        let calls = Rc::new(RefCell::new(Vec::new()));
        Self {
            particle: Particle::new(1.0, 1.0, Target::Nuclei),
            rates: FlatRates,
            detector: ScriptedDetector {
                script,
                calls: Rc::clone(&calls),
            },
            generator: NoData,
            spectra: NoSpectrum,
            halo: FlatHalo,
            calls,
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

    /// Every `(mass, coupling)` the detector was asked about, in order.
    pub fn calls(&self) -> Vec<(f64, f64)> {
        self.calls.borrow().clone()
    }
}

/// Primary-process reporter that keeps its messages instead of printing.
#[derive(Default)]
pub struct CapturingReporter {
    pub messages: Vec<String>,
    pub p_values: usize,
}

impl Reporter for CapturingReporter {
    fn is_primary(&self) -> bool {
        true
    }

    fn message(&mut self, text: &str) {
        self.messages.push(text.to_string());
    }

    fn p_value(&mut self, _p: f64) {
        self.p_values += 1;
    }
}

/// Small synthetic run writing below `results_dir`.
pub fn synthetic_config(results_dir: &Path) -> ScanConfig {
    let text = format!(
        "
id: e2e
results_dir: '{}'
sample_size: 20
cross_section_min: 1.0e-44
cross_section_max: 1.0e-36
cross_sections: 5
mass_min: 0.5
mass_max: 50.0
masses: 3
seed: 7
thresholds:
  rate_resolution:
    radii: 200
    speeds: 20
",
        results_dir.display()
    );
    parse_config(&text, "test config").expect("valid test config")
}
