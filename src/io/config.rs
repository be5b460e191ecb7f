//! YAML run configuration.
//!
//! Cross sections are given in cm^2 and masses in GeV; both are converted to
//! natural units on load. Optional sections fall back to their defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::domain::units::{CM2, GEV};
use crate::domain::{DetectorSettings, HaloSettings, ScanConfig, ScanThresholds};
use crate::error::AppError;

/// File layout as written by users. Required keys are `Option` so a missing
/// key can be reported by name.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    id: Option<String>,
    results_dir: Option<PathBuf>,
    sample_size: Option<usize>,
    cross_section_min: Option<f64>,
    cross_section_max: Option<f64>,
    cross_sections: Option<usize>,
    mass_min: Option<f64>,
    mass_max: Option<f64>,
    masses: Option<usize>,
    certainty_level: Option<f64>,
    export_certainty_levels: Option<Vec<f64>>,
    seed: Option<u64>,
    #[serde(default)]
    thresholds: ScanThresholds,
    #[serde(default)]
    detector: DetectorSettings,
    #[serde(default)]
    halo: HaloSettings,
}

fn required<T>(value: Option<T>, key: &str, origin: &str) -> Result<T, AppError> {
    value.ok_or_else(|| AppError::input(format!("Missing required key '{key}' in {origin}.")))
}

pub fn load_config(path: &Path) -> Result<ScanConfig, AppError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| AppError::input(format!("Failed to read config '{}': {e}", path.display())))?;
    let config = parse_config(&text, &path.display().to_string())?;
    debug!(path = %path.display(), id = %config.id, "loaded configuration");
    Ok(config)
}

/// Parse and validate a configuration document. `origin` only labels errors.
pub fn parse_config(text: &str, origin: &str) -> Result<ScanConfig, AppError> {
    let raw: RawConfig = serde_yaml::from_str(text)
        .map_err(|e| AppError::input(format!("Invalid configuration in {origin}: {e}")))?;

    let config = ScanConfig {
        id: required(raw.id, "id", origin)?,
        results_dir: raw.results_dir.unwrap_or_else(|| PathBuf::from("results")),
        sample_size: required(raw.sample_size, "sample_size", origin)?,
        cross_section_min: required(raw.cross_section_min, "cross_section_min", origin)? * CM2,
        cross_section_max: required(raw.cross_section_max, "cross_section_max", origin)? * CM2,
        cross_sections: required(raw.cross_sections, "cross_sections", origin)?,
        mass_min: required(raw.mass_min, "mass_min", origin)? * GEV,
        mass_max: required(raw.mass_max, "mass_max", origin)? * GEV,
        masses: required(raw.masses, "masses", origin)?,
        certainty_level: raw.certainty_level.unwrap_or(0.9),
        export_certainty_levels: raw.export_certainty_levels.unwrap_or_else(|| vec![0.9, 0.95]),
        seed: raw.seed.unwrap_or(42),
        thresholds: raw.thresholds,
        detector: raw.detector,
        halo: raw.halo,
    };
    validate(&config, origin)?;
    Ok(config)
}

fn validate(config: &ScanConfig, origin: &str) -> Result<(), AppError> {
    let fail = |key: &str, rule: &str| Err(AppError::input(format!("Invalid '{key}' in {origin}: {rule}.")));

    if config.id.trim().is_empty() {
        return fail("id", "must not be empty");
    }
    if config.sample_size == 0 {
        return fail("sample_size", "must be positive");
    }
    if !(config.cross_section_min > 0.0 && config.cross_section_min < config.cross_section_max) {
        return fail("cross_section_min", "need 0 < cross_section_min < cross_section_max");
    }
    if !config.cross_section_max.is_finite() {
        return fail("cross_section_max", "must be finite");
    }
    if config.cross_sections < 2 {
        return fail("cross_sections", "need at least 2 steps");
    }
    if !(config.mass_min > 0.0 && config.mass_min < config.mass_max) {
        return fail("mass_min", "need 0 < mass_min < mass_max");
    }
    if !config.mass_max.is_finite() {
        return fail("mass_max", "must be finite");
    }
    if config.masses < 2 {
        return fail("masses", "need at least 2 steps");
    }
    let in_unit_interval = |cl: f64| cl > 0.0 && cl < 1.0;
    if !in_unit_interval(config.certainty_level) {
        return fail("certainty_level", "must lie strictly between 0 and 1");
    }
    if !config.export_certainty_levels.iter().all(|&cl| in_unit_interval(cl)) {
        return fail("export_certainty_levels", "every level must lie strictly between 0 and 1");
    }
    let t = &config.thresholds;
    if !(t.exclusion_p_value > 0.0 && t.exclusion_p_value <= 1.0) {
        return fail("thresholds.exclusion_p_value", "must lie in (0, 1]");
    }
    if !(t.direct_log_tolerance > 0.0 && t.grid_relative_tolerance > 0.0) {
        return fail("thresholds", "root tolerances must be positive");
    }

    let positive = |x: f64| x.is_finite() && x > 0.0;
    let non_negative = |x: f64| x.is_finite() && x >= 0.0;
    let d = &config.detector;
    if !positive(d.target_mass_gev) {
        return fail("detector.target_mass_gev", "must be positive");
    }
    if !non_negative(d.threshold_kev) {
        return fail("detector.threshold_kev", "must not be negative");
    }
    if !positive(d.exposure_kg_year) {
        return fail("detector.exposure_kg_year", "must be positive");
    }
    if !non_negative(d.background_events) {
        return fail("detector.background_events", "must not be negative");
    }
    if !positive(d.reference_cross_section_cm2) {
        return fail("detector.reference_cross_section_cm2", "must be positive");
    }
    let h = &config.halo;
    if !positive(h.density_gev_cm3) {
        return fail("halo.density_gev_cm3", "must be positive");
    }
    if !positive(h.dispersion_km_s) {
        return fail("halo.dispersion_km_s", "must be positive");
    }
    if !positive(h.escape_speed_km_s) {
        return fail("halo.escape_speed_km_s", "must be positive");
    }
    if !non_negative(h.observer_speed_km_s) {
        return fail("halo.observer_speed_km_s", "must not be negative");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Target;

    const MINIMAL: &str = "
id: test_run
sample_size: 500
cross_section_min: 1.0e-44
cross_section_max: 1.0e-36
cross_sections: 9
mass_min: 0.1
mass_max: 10.0
masses: 5
";

    #[test]
    fn minimal_config_gets_defaults() {
        let config = parse_config(MINIMAL, "test").unwrap();
        assert_eq!(config.id, "test_run");
        assert_eq!(config.results_dir, PathBuf::from("results"));
        assert_eq!(config.run_dir(), PathBuf::from("results/test_run"));
        assert_eq!(config.certainty_level, 0.9);
        assert_eq!(config.export_certainty_levels, vec![0.9, 0.95]);
        assert_eq!(config.seed, 42);
        assert_eq!(config.thresholds, ScanThresholds::default());
        assert_eq!(config.detector.target, Target::Nuclei);
    }

    #[test]
    fn cross_sections_are_converted_to_natural_units() {
        let config = parse_config(MINIMAL, "test").unwrap();
        assert!((config.cross_section_min / CM2 - 1.0e-44).abs() < 1.0e-56);
        let axis = config.coupling_axis().unwrap();
        assert_eq!(axis.len(), 9);
        assert_eq!(config.mass_axis().unwrap().len(), 5);
    }

    #[test]
    fn nested_sections_override_defaults() {
        let text = format!(
            "{MINIMAL}
thresholds:
  exclusion_p_value: 0.05
  rate_resolution:
    speeds: 20
detector:
  target: electrons
  observed_events: 3
"
        );
        let config = parse_config(&text, "test").unwrap();
        assert_eq!(config.thresholds.exclusion_p_value, 0.05);
        assert_eq!(config.thresholds.rate_resolution.speeds, 20);
        assert_eq!(config.thresholds.rate_resolution.radii, 1000);
        assert_eq!(config.detector.target, Target::Electrons);
        assert_eq!(config.detector.observed_events, 3);
        assert_eq!(config.detector.background_events, 0.5);
    }

    #[test]
    fn missing_key_is_named() {
        let text = MINIMAL.replace("masses: 5\n", "");
        let err = parse_config(&text, "test").unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.message().contains("'masses'"), "{}", err.message());
    }

    #[test]
    fn inverted_ranges_are_rejected() {
        let text = MINIMAL.replace("mass_min: 0.1", "mass_min: 20.0");
        let err = parse_config(&text, "test").unwrap_err();
        assert!(err.message().contains("mass_min"));

        let text = MINIMAL.replace("cross_sections: 9", "cross_sections: 1");
        assert!(parse_config(&text, "test").is_err());
    }

    #[test]
    fn physical_settings_are_checked_by_key() {
        let cases = [
            ("halo", "escape_speed_km_s", "-1.0"),
            ("halo", "escape_speed_km_s", "0.0"),
            ("halo", "dispersion_km_s", "0.0"),
            ("halo", "density_gev_cm3", "-0.4"),
            ("halo", "observer_speed_km_s", ".nan"),
            ("detector", "target_mass_gev", "0.0"),
            ("detector", "threshold_kev", "-1.0"),
            ("detector", "exposure_kg_year", "0.0"),
            ("detector", "background_events", "-0.5"),
            ("detector", "reference_cross_section_cm2", "0.0"),
        ];
        for (section, key, value) in cases {
            let text = format!("{MINIMAL}{section}:\n  {key}: {value}\n");
            let err = parse_config(&text, "test").unwrap_err();
            assert_eq!(err.exit_code(), 2, "{section}.{key} = {value}");
            assert!(
                err.message().contains(&format!("'{section}.{key}'")),
                "{}",
                err.message()
            );
        }
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let text = format!("{MINIMAL}sample_sise: 3\n");
        assert_eq!(parse_config(&text, "test").unwrap_err().exit_code(), 2);
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.yaml");
        std::fs::write(&path, MINIMAL).unwrap();
        assert_eq!(load_config(&path).unwrap().sample_size, 500);
        assert!(load_config(&dir.path().join("missing.yaml")).is_err());
    }
}
