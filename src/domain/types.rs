//! Shared domain types.
//!
//! Everything numeric here is in natural units (see `domain::units`) unless a
//! field name says otherwise. The `*Settings` structs are deserialized
//! straight from the configuration file and therefore keep conventional units
//! in their field names.

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::AppError;
use crate::math::log_space;

/// Which target particles a detector scatters on.
///
/// The coupling of a particle model is tracked per target, so the detector
/// decides which coupling a scan varies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    Nuclei,
    Electrons,
}

impl Target {
    pub fn display_name(self) -> &'static str {
        match self {
            Target::Nuclei => "nuclei",
            Target::Electrons => "electrons",
        }
    }
}

/// Resolution of the interpolated scattering-rate table rebuilt per cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RateResolution {
    /// Radial sampling points.
    pub radii: usize,
    /// Speed sampling points.
    pub speeds: usize,
}

impl Default for RateResolution {
    fn default() -> Self {
        Self {
            radii: 1000,
            speeds: 50,
        }
    }
}

/// Numerical knobs of the scan and limit algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScanThresholds {
    /// A cell counts as excluded when its p-value is strictly below this.
    pub exclusion_p_value: f64,
    /// P-values strictly below this floor are stored as exactly 0.
    pub p_value_floor: f64,
    pub rate_resolution: RateResolution,
    /// Absolute tolerance on ln(coupling) for the direct root finder.
    pub direct_log_tolerance: f64,
    /// Root tolerance for grid limits, as a fraction of the smallest coupling.
    pub grid_relative_tolerance: f64,
}

impl Default for ScanThresholds {
    fn default() -> Self {
        Self {
            exclusion_p_value: 0.1,
            p_value_floor: 1.0e-100,
            rate_resolution: RateResolution::default(),
            direct_log_tolerance: 1.0e-2,
            grid_relative_tolerance: 0.01,
        }
    }
}

impl ScanThresholds {
    /// Value stored in the grid for a computed p-value.
    pub fn clamp(&self, p: f64) -> f64 {
        if p < self.p_value_floor { 0.0 } else { p }
    }

    pub fn is_excluded(&self, p: f64) -> bool {
        p < self.exclusion_p_value
    }
}

/// One point of a limit curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimitPoint {
    pub mass: f64,
    pub coupling: f64,
}

/// Integer percentage used in limit file names (`0.9` -> `90`).
pub fn certainty_label(certainty_level: f64) -> u32 {
    (100.0 * certainty_level).round() as u32
}

/// Parameters of the synthetic counting detector.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct DetectorSettings {
    pub target: Target,
    /// Mass of one target particle [GeV].
    pub target_mass_gev: f64,
    /// Recoil energy threshold [keV].
    pub threshold_kev: f64,
    /// Exposure [kg year].
    pub exposure_kg_year: f64,
    /// Expected background events over the full exposure.
    pub background_events: f64,
    /// Observed events over the full exposure.
    pub observed_events: u64,
    /// Cross section at which one reflected particle flux unit yields one event [cm^2].
    pub reference_cross_section_cm2: f64,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            target: Target::Nuclei,
            target_mass_gev: 0.938,
            threshold_kev: 0.1,
            exposure_kg_year: 1.0,
            background_events: 0.5,
            observed_events: 1,
            reference_cross_section_cm2: 1.0e-36,
        }
    }
}

/// Parameters of the synthetic halo.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct HaloSettings {
    /// Local dark matter density [GeV / cm^3].
    pub density_gev_cm3: f64,
    /// One-dimensional velocity dispersion [km/s].
    pub dispersion_km_s: f64,
    /// Galactic escape speed [km/s].
    pub escape_speed_km_s: f64,
    /// Speed of the observer relative to the halo [km/s].
    pub observer_speed_km_s: f64,
}

impl Default for HaloSettings {
    fn default() -> Self {
        Self {
            density_gev_cm3: 0.4,
            dispersion_km_s: 156.0,
            escape_speed_km_s: 544.0,
            observer_speed_km_s: 232.0,
        }
    }
}

/// Fully resolved run configuration (natural units).
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub id: String,
    pub results_dir: PathBuf,
    pub sample_size: usize,
    pub cross_section_min: f64,
    pub cross_section_max: f64,
    pub cross_sections: usize,
    pub mass_min: f64,
    pub mass_max: f64,
    pub masses: usize,
    pub certainty_level: f64,
    pub export_certainty_levels: Vec<f64>,
    pub seed: u64,
    pub thresholds: ScanThresholds,
    pub detector: DetectorSettings,
    pub halo: HaloSettings,
}

impl ScanConfig {
    /// Folder holding all result tables of this run.
    pub fn run_dir(&self) -> PathBuf {
        self.results_dir.join(&self.id)
    }

    pub fn mass_axis(&self) -> Result<Vec<f64>, AppError> {
        log_space(self.mass_min, self.mass_max, self.masses)
    }

    pub fn coupling_axis(&self) -> Result<Vec<f64>, AppError> {
        log_space(self.cross_section_min, self.cross_section_max, self.cross_sections)
    }
}
