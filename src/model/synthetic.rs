//! Self-contained counting-experiment collaborators.
//!
//! These give the `dmscan` binary a complete pipeline without the external
//! physics libraries: particles are drawn from a truncated, boosted Maxwellian
//! halo, scatter with a probability set by a tabulated optical depth, lose a
//! random fraction of their speed, and are counted by a Poisson detector.
//!
//! The p-value falls with coupling and with mass. The generator is
//! stochastic but reproducible from a seed.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::units::{CM, CM2, GEV, KEV, KM_PER_SEC, SECOND};
use crate::domain::{DetectorSettings, HaloSettings, RateResolution, Target};
use crate::error::AppError;
use crate::model::{
    Dataset, DatasetGenerator, Detector, HaloModel, ParticleModel, RateModel, Spectrum, SpectrumBuilder,
};

/// Cap on simulated trajectories per requested sample particle.
const MAX_TRIALS_PER_SAMPLE: u64 = 1_000;
/// Rejected halo draws tolerated before one speed inside the escape speed.
const MAX_HALO_DRAWS: usize = 10_000;

/// Particle with independent couplings to nuclei and electrons.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub mass: f64,
    pub coupling_nuclei: f64,
    pub coupling_electrons: f64,
}

impl Particle {
    pub fn new(mass: f64, coupling: f64, target: Target) -> Self {
        let mut p = Self {
            mass,
            coupling_nuclei: 0.0,
            coupling_electrons: 0.0,
        };
        p.set_coupling(coupling, target);
        p
    }
}

impl ParticleModel for Particle {
    fn mass(&self) -> f64 {
        self.mass
    }

    fn set_mass(&mut self, mass: f64) {
        self.mass = mass;
    }

    fn coupling(&self, target: Target) -> f64 {
        match target {
            Target::Nuclei => self.coupling_nuclei,
            Target::Electrons => self.coupling_electrons,
        }
    }

    fn set_coupling(&mut self, coupling: f64, target: Target) {
        match target {
            Target::Nuclei => self.coupling_nuclei = coupling,
            Target::Electrons => self.coupling_electrons = coupling,
        }
    }
}

/// Truncated Maxwellian halo seen by a moving observer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StandardHalo {
    density: f64,
    dispersion: f64,
    escape_speed: f64,
    observer_speed: f64,
}

impl StandardHalo {
    pub fn from_settings(settings: &HaloSettings) -> Self {
        Self {
            density: settings.density_gev_cm3 * GEV / (CM * CM * CM),
            dispersion: settings.dispersion_km_s * KM_PER_SEC,
            escape_speed: settings.escape_speed_km_s * KM_PER_SEC,
            observer_speed: settings.observer_speed_km_s * KM_PER_SEC,
        }
    }
}

impl HaloModel for StandardHalo {
    fn density(&self) -> f64 {
        self.density
    }

    fn dispersion(&self) -> f64 {
        self.dispersion
    }

    fn escape_speed(&self) -> f64 {
        self.escape_speed
    }

    fn observer_speed(&self) -> f64 {
        self.observer_speed
    }
}

/// Scattering probability table `P(v) = 1 - exp(-tau(v))`.
///
/// The optical depth integrates an exponential density profile along a
/// straight chord (`radii` points) and falls as `1/v` with speed, tabulated
/// on `speeds` points up to `max_speed`.
#[derive(Debug, Clone)]
pub struct OpticalDepthRates {
    /// Cross section at which the column depth equals one.
    unit_cross_section: f64,
    max_speed: f64,
    speed_grid: Vec<f64>,
    probability: Vec<f64>,
    refreshes: usize,
}

impl OpticalDepthRates {
    pub fn new(unit_cross_section: f64, max_speed: f64) -> Self {
        Self {
            unit_cross_section,
            max_speed,
            speed_grid: Vec::new(),
            probability: Vec::new(),
            refreshes: 0,
        }
    }

    pub fn from_settings(detector: &DetectorSettings, halo: &HaloSettings) -> Self {
        let max_speed = (halo.escape_speed_km_s + halo.observer_speed_km_s) * KM_PER_SEC;
        // The scattering medium is calibrated so the column depth is one a
        // hundred times below the detector's reference cross section.
        Self::new(1.0e-2 * detector.reference_cross_section_cm2 * CM2, max_speed)
    }

    /// Number of `refresh` calls so far.
    pub fn refreshes(&self) -> usize {
        self.refreshes
    }
}

impl RateModel for OpticalDepthRates {
    fn refresh(&mut self, particle: &dyn ParticleModel, resolution: RateResolution) -> Result<(), AppError> {
        if resolution.radii < 2 || resolution.speeds < 2 {
            return Err(AppError::collaborator(format!(
                "Rate table needs at least 2 radii and 2 speeds (got {} x {}).",
                resolution.radii, resolution.speeds
            )));
        }
        let coupling = particle.coupling(Target::Nuclei).max(particle.coupling(Target::Electrons));

        // Column depth of rho(r) = exp(-r / 0.1) along r in [0, 1], trapezoid rule.
        let h = 1.0 / (resolution.radii as f64 - 1.0);
        let mut column = 0.0;
        for k in 0..resolution.radii {
            let w = if k == 0 || k + 1 == resolution.radii { 0.5 } else { 1.0 };
            column += w * (-(k as f64 * h) / 0.1).exp();
        }
        column *= h / 0.1;

        let tau_ref = coupling / self.unit_cross_section * column;
        let v_ref = 0.5 * self.max_speed;
        let dv = self.max_speed / (resolution.speeds as f64 - 1.0);

        self.speed_grid.clear();
        self.probability.clear();
        for k in 0..resolution.speeds {
            let v = k as f64 * dv;
            let tau = tau_ref * v_ref / v.max(1.0e-3 * v_ref);
            self.speed_grid.push(v);
            self.probability.push(1.0 - (-tau).exp());
        }
        self.refreshes += 1;
        Ok(())
    }

    fn scattering_probability(&self, speed: f64) -> f64 {
        let n = self.speed_grid.len();
        if n < 2 {
            return 0.0;
        }
        let dv = self.speed_grid[1] - self.speed_grid[0];
        let x = (speed / dv).clamp(0.0, (n - 1) as f64);
        let k = (x.floor() as usize).min(n - 2);
        let u = x - k as f64;
        self.probability[k] + u * (self.probability[k + 1] - self.probability[k])
    }
}

/// Seeded Monte Carlo generator of reflected particles.
#[derive(Debug, Clone)]
pub struct MonteCarloGenerator {
    rng: StdRng,
}

impl MonteCarloGenerator {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn halo_speed(&mut self, normal: &Normal<f64>, halo: &dyn HaloModel) -> Result<f64, AppError> {
        for _ in 0..MAX_HALO_DRAWS {
            let vx = normal.sample(&mut self.rng);
            let vy = normal.sample(&mut self.rng);
            let vz = normal.sample(&mut self.rng);
            if (vx * vx + vy * vy + vz * vz).sqrt() > halo.escape_speed() {
                continue;
            }
            let vz_obs = vz - halo.observer_speed();
            return Ok((vx * vx + vy * vy + vz_obs * vz_obs).sqrt());
        }
        Err(AppError::collaborator(format!(
            "No halo velocity below the escape speed {:e} after {MAX_HALO_DRAWS} draws.",
            halo.escape_speed()
        )))
    }
}

impl DatasetGenerator for MonteCarloGenerator {
    fn generate(
        &mut self,
        sample_size: usize,
        min_speed: f64,
        _particle: &dyn ParticleModel,
        rates: &dyn RateModel,
        halo: &dyn HaloModel,
    ) -> Result<Dataset, AppError> {
        if !(halo.escape_speed() > 0.0) {
            return Err(AppError::collaborator(format!(
                "Halo escape speed {:e} must be positive.",
                halo.escape_speed()
            )));
        }
        let normal = Normal::new(0.0, halo.dispersion())
            .map_err(|e| AppError::collaborator(format!("Halo velocity distribution error: {e}")))?;

        let max_trials = (sample_size as u64).saturating_mul(MAX_TRIALS_PER_SAMPLE).max(1);
        let mut data = Dataset {
            min_speed,
            speeds: Vec::with_capacity(sample_size),
            weights: Vec::with_capacity(sample_size),
            trials: 0,
        };

        while data.speeds.len() < sample_size && data.trials < max_trials {
            data.trials += 1;
            let v_in = self.halo_speed(&normal, halo)?;
            let roll: f64 = self.rng.r#gen();
            if roll >= rates.scattering_probability(v_in) {
                continue;
            }
            let v_out = v_in * self.rng.gen_range(0.5..=1.0);
            if v_out >= min_speed {
                data.speeds.push(v_out);
                data.weights.push(1.0);
            }
        }
        Ok(data)
    }
}

/// Histogram of reflected speeds, normalized to a particle flux.
#[derive(Debug, Clone, Copy)]
pub struct ReflectionSpectrumBuilder {
    pub bins: usize,
}

impl Default for ReflectionSpectrumBuilder {
    fn default() -> Self {
        Self { bins: 25 }
    }
}

impl SpectrumBuilder for ReflectionSpectrumBuilder {
    fn build(
        &self,
        dataset: &Dataset,
        _rates: &dyn RateModel,
        halo: &dyn HaloModel,
        mass: f64,
    ) -> Result<Spectrum, AppError> {
        if !(mass.is_finite() && mass > 0.0) {
            return Err(AppError::collaborator(format!("Invalid particle mass {mass:e}.")));
        }
        let bins = self.bins.max(1);
        let v_max = halo.escape_speed() + halo.observer_speed();
        let width = v_max / bins as f64;
        let speed_edges: Vec<f64> = (0..=bins).map(|k| k as f64 * width).collect();
        let mut flux = vec![0.0; bins];
        if dataset.is_empty() {
            return Ok(Spectrum { speed_edges, flux });
        }

        // Number density times the mean kept speed, scaled by the acceptance.
        let number_density = halo.density() / mass;
        let norm = number_density * dataset.acceptance() / dataset.weights.iter().sum::<f64>();
        for (&v, &w) in dataset.speeds.iter().zip(dataset.weights.iter()) {
            let k = ((v / width) as usize).min(bins - 1);
            flux[k] += norm * w * v;
        }
        Ok(Spectrum { speed_edges, flux })
    }
}

/// Poisson counting detector with a recoil-energy threshold.
#[derive(Debug, Clone, Copy)]
pub struct PoissonDetector {
    settings: DetectorSettings,
}

impl PoissonDetector {
    pub fn new(settings: DetectorSettings) -> Self {
        Self { settings }
    }

    /// Expected signal events for a spectrum at the particle's coupling.
    pub fn signal_events(&self, particle: &dyn ParticleModel, spectrum: &Spectrum) -> f64 {
        let flux_cm2_s = spectrum.total_flux() * CM2 * SECOND;
        let coupling_ratio = particle.coupling(self.settings.target) / (self.settings.reference_cross_section_cm2 * CM2);
        flux_cm2_s * coupling_ratio * self.settings.exposure_kg_year
    }
}

impl Detector for PoissonDetector {
    fn target(&self) -> Target {
        self.settings.target
    }

    fn minimum_speed(&self, particle: &dyn ParticleModel) -> Result<f64, AppError> {
        let m_dm = particle.mass();
        let m_t = self.settings.target_mass_gev * GEV;
        if !(m_dm > 0.0 && m_t > 0.0) {
            return Err(AppError::collaborator(format!(
                "Minimum speed needs positive masses (dm={m_dm:e}, target={m_t:e})."
            )));
        }
        // E_max = 2 mu^2 v^2 / m_T  =>  v_min = sqrt(m_T E_thr / (2 mu^2)).
        let mu = m_dm * m_t / (m_dm + m_t);
        let e_thr = self.settings.threshold_kev * KEV;
        Ok((m_t * e_thr / (2.0 * mu * mu)).sqrt())
    }

    fn p_value(&self, particle: &dyn ParticleModel, spectrum: &Spectrum) -> Result<f64, AppError> {
        let mean = self.signal_events(particle, spectrum) + self.settings.background_events;
        poisson_cdf(self.settings.observed_events, mean)
    }
}

/// `P(N <= n)` for a Poisson distribution with the given mean.
pub fn poisson_cdf(n: u64, mean: f64) -> Result<f64, AppError> {
    if !(mean.is_finite() && mean >= 0.0) {
        return Err(AppError::collaborator(format!("Invalid Poisson mean {mean:e}.")));
    }
    if mean == 0.0 {
        return Ok(1.0);
    }
    let ln_mean = mean.ln();
    let mut ln_factorial = 0.0;
    let mut sum = 0.0;
    for k in 0..=n {
        if k > 0 {
            ln_factorial += (k as f64).ln();
        }
        sum += (k as f64 * ln_mean - mean - ln_factorial).exp();
    }
    Ok(sum.min(1.0))
}
