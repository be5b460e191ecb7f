//! Workflows shared by the CLI commands.
//!
//! Each workflow builds the synthetic collaborators from the configuration,
//! runs one algorithm and, on the primary process only, writes the run
//! folder:
//!
//! scan -> `p_values.txt`, `p_grid.txt` -> `Limit_<CL>.txt`
//! limits: `p_values.txt` -> `Limit_<CL>.txt`
//! direct -> `Reflection_Limit_<CL>.txt`
//!
//! Non-primary processes do the same numerical work and write nothing.

use std::path::PathBuf;

use tracing::info;

use crate::domain::ScanConfig;
use crate::error::AppError;
use crate::io::{
    LimitFileWriter, export_direct_curve, export_limits, export_p_values, import_p_values,
    reflection_limit_file_name,
};
use crate::model::Pipeline;
use crate::model::synthetic::{
    MonteCarloGenerator, OpticalDepthRates, Particle, PoissonDetector, ReflectionSpectrumBuilder, StandardHalo,
};
use crate::report::{Reporter, format_limit_curve, format_scan_outcome};
use crate::scan::{DirectLimit, LimitCurve, LimitSink, ParameterGrid, ScanOutcome, limit_curves, perform_scan};

/// Owned synthetic collaborators for one run.
pub struct Collaborators {
    pub particle: Particle,
    pub rates: OpticalDepthRates,
    pub detector: PoissonDetector,
    pub generator: MonteCarloGenerator,
    pub spectra: ReflectionSpectrumBuilder,
    pub halo: StandardHalo,
}

impl Collaborators {
    /// The particle starts at the lightest mass and weakest coupling.
    pub fn from_config(config: &ScanConfig) -> Self {
        Self {
            particle: Particle::new(config.mass_min, config.cross_section_min, config.detector.target),
            rates: OpticalDepthRates::from_settings(&config.detector, &config.halo),
            detector: PoissonDetector::new(config.detector),
            generator: MonteCarloGenerator::seeded(config.seed),
            spectra: ReflectionSpectrumBuilder::default(),
            halo: StandardHalo::from_settings(&config.halo),
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
}

/// Outputs of `dmscan scan`.
#[derive(Debug, Clone)]
pub struct ScanRun {
    pub grid: ParameterGrid,
    pub outcome: ScanOutcome,
    pub limits: Vec<LimitCurve>,
    pub written: Vec<PathBuf>,
}

/// Fill the grid, write it out, then derive the configured limit curves.
///
/// The grid files are written before any limit is extracted, so a failing
/// limit extraction still leaves the finished scan on disk.
pub fn run_scan(config: &ScanConfig, reporter: &mut dyn Reporter) -> Result<ScanRun, AppError> {
    let mut grid = ParameterGrid::from_config(config)?;
    let mut collaborators = Collaborators::from_config(config);

    let outcome = {
        let mut pipeline = collaborators.pipeline();
        perform_scan(&mut grid, &mut pipeline, &config.thresholds, reporter)?
    };
    reporter.scan_finished(&grid);
    reporter.message(&format_scan_outcome(&outcome));

    let dir = config.run_dir();
    let mut written = Vec::new();
    if reporter.is_primary() {
        export_p_values(&grid, &dir)?;
        written.push(dir.join(crate::io::P_VALUES_FILE));
        written.push(dir.join(crate::io::P_GRID_FILE));
    }

    let limits = limit_curves(&grid, &config.export_certainty_levels, &config.thresholds)?;
    for curve in &limits {
        reporter.message(&format_limit_curve(curve.certainty_level, &curve.points));
    }
    if reporter.is_primary() {
        written.extend(export_limits(&dir, &limits)?);
    }

    info!(evaluations = outcome.evaluations, files = written.len(), "scan run finished");
    Ok(ScanRun {
        grid,
        outcome,
        limits,
        written,
    })
}

/// Re-derive limit curves from the run folder's `p_values.txt`.
///
/// An empty `certainty_levels` falls back to the configured export levels.
pub fn run_limits(
    config: &ScanConfig,
    certainty_levels: &[f64],
    reporter: &mut dyn Reporter,
) -> Result<Vec<LimitCurve>, AppError> {
    let levels = if certainty_levels.is_empty() {
        config.export_certainty_levels.as_slice()
    } else {
        certainty_levels
    };
    if let Some(&bad) = levels.iter().find(|&&cl| !(cl > 0.0 && cl < 1.0)) {
        return Err(AppError::input(format!(
            "Certainty level {bad} must lie strictly between 0 and 1."
        )));
    }

    let dir = config.run_dir();
    let mut grid = ParameterGrid::from_config(config)?;
    import_p_values(&mut grid, &dir)?;

    let limits = limit_curves(&grid, levels, &config.thresholds)?;
    for curve in &limits {
        reporter.message(&format_limit_curve(curve.certainty_level, &curve.points));
    }
    if reporter.is_primary() {
        export_limits(&dir, &limits)?;
    }
    Ok(limits)
}

/// Solve for the limit at every configured mass.
///
/// The primary process appends each limit to `Reflection_Limit_<CL>.txt` as
/// soon as it is found and rewrites the complete table at the end.
pub fn run_direct(config: &ScanConfig, reporter: &mut dyn Reporter) -> Result<DirectLimit, AppError> {
    let mut direct = DirectLimit::from_config(config)?;
    let mut collaborators = Collaborators::from_config(config);
    let dir = config.run_dir();

    let mut writer = if reporter.is_primary() {
        Some(LimitFileWriter::create(
            &dir.join(reflection_limit_file_name(direct.certainty_level())),
        )?)
    } else {
        None
    };

    {
        let mut pipeline = collaborators.pipeline();
        let sink = writer.as_mut().map(|w| w as &mut dyn LimitSink);
        direct.compute_limit_curve(&mut pipeline, &config.thresholds, reporter, sink)?;
    }
    drop(writer);

    reporter.message(&format_limit_curve(direct.certainty_level(), &direct.curve()));
    if reporter.is_primary() {
        let path = export_direct_curve(&direct, &dir)?;
        info!(path = %path.display(), "exported direct limits");
    }
    Ok(direct)
}
