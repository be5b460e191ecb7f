use dm_scan::app::pipeline::{Collaborators, run_direct, run_limits, run_scan};
use dm_scan::domain::Target;
use dm_scan::domain::units::CM2;
use dm_scan::io::{P_GRID_FILE, P_VALUES_FILE, read_table};
use dm_scan::model::ParticleModel;
use dm_scan::report::SilentReporter;
use dm_scan::scan::{ParameterGrid, ScanStop, perform_scan};

mod common;

use common::{CapturingReporter, synthetic_config};

#[test]
fn scan_writes_run_folder_and_limits_bracket_the_axis() {
    let root = tempfile::tempdir().unwrap();
    let config = synthetic_config(root.path());
    let mut reporter = CapturingReporter::default();

    let run = run_scan(&config, &mut reporter).unwrap();

    // The strongest row excludes every mass, the weakest one nothing.
    assert!(matches!(run.outcome.stop, ScanStop::Pruned { .. }));
    let strongest = run.grid.n_couplings() - 1;
    for mass_index in 0..run.grid.n_masses() {
        assert!(run.grid.p_value(strongest, mass_index) < 0.1);
    }
    assert_eq!(reporter.p_values, run.outcome.evaluations);

    let dir = config.run_dir();
    assert!(dir.join(P_VALUES_FILE).exists());
    assert!(dir.join(P_GRID_FILE).exists());
    assert!(dir.join("Limit_90.txt").exists());
    assert!(dir.join("Limit_95.txt").exists());
    assert_eq!(run.written.len(), 4);

    let rows = read_table(&dir.join(P_VALUES_FILE), &[]).unwrap();
    assert_eq!(rows.len(), 15);

    let (cl90, cl95) = (&run.limits[0], &run.limits[1]);
    assert_eq!(cl90.points.len(), 3);
    assert_eq!(cl95.points.len(), 3);
    for (a, b) in cl90.points.iter().zip(cl95.points.iter()) {
        let sigma = a.coupling / CM2;
        assert!(sigma > 1.0e-44 && sigma < 1.0e-36, "limit {sigma:e} outside axis");
        assert!(b.coupling >= a.coupling);
    }
}

#[test]
fn failing_limit_extraction_keeps_the_scanned_grid() {
    // Every cell excluded: no column brackets the threshold.
    let root = tempfile::tempdir().unwrap();
    let mut config = synthetic_config(root.path());
    config.cross_section_min = 1.0e-30 * CM2;
    config.cross_section_max = 1.0e-28 * CM2;

    let err = run_scan(&config, &mut CapturingReporter::default()).unwrap_err();
    assert_eq!(err.exit_code(), 4);

    let dir = config.run_dir();
    let rows = read_table(&dir.join(P_VALUES_FILE), &[]).unwrap();
    assert_eq!(rows.len(), 15);
    assert!(rows.iter().all(|row| row[2] < 0.1));
    assert!(dir.join(P_GRID_FILE).exists());
    assert!(!dir.join("Limit_90.txt").exists());
}

#[test]
fn limits_command_reproduces_scan_limits() {
    let root = tempfile::tempdir().unwrap();
    let config = synthetic_config(root.path());
    let scan = run_scan(&config, &mut CapturingReporter::default()).unwrap();

    let mut reporter = CapturingReporter::default();
    let limits = run_limits(&config, &[0.9], &mut reporter).unwrap();
    assert_eq!(limits.len(), 1);
    assert_eq!(limits[0].points.len(), scan.limits[0].points.len());
    for (a, b) in limits[0].points.iter().zip(scan.limits[0].points.iter()) {
        assert_eq!(a.mass, b.mass);
        assert!(((a.coupling - b.coupling) / b.coupling).abs() < 1.0e-3);
    }
    assert!(reporter.messages.iter().any(|m| m.starts_with("Limit (90% CL)")));
}

#[test]
fn limits_command_needs_an_exported_grid() {
    let root = tempfile::tempdir().unwrap();
    let config = synthetic_config(root.path());
    let err = run_limits(&config, &[], &mut CapturingReporter::default()).unwrap_err();
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn secondary_process_computes_but_writes_nothing() {
    let root = tempfile::tempdir().unwrap();
    let config = synthetic_config(root.path());

    let primary = run_scan(&config, &mut CapturingReporter::default()).unwrap();
    std::fs::remove_dir_all(config.run_dir()).unwrap();
    let secondary = run_scan(&config, &mut SilentReporter).unwrap();

    assert!(secondary.written.is_empty());
    assert!(!config.run_dir().exists());
    // Same seed, same grid.
    assert_eq!(secondary.grid, primary.grid);
}

#[test]
fn scan_restores_synthetic_particle() {
    let root = tempfile::tempdir().unwrap();
    let config = synthetic_config(root.path());
    let mut collaborators = Collaborators::from_config(&config);
    let before = collaborators.particle;

    let mut grid = ParameterGrid::from_config(&config).unwrap();
    {
        let mut pipeline = collaborators.pipeline();
        perform_scan(&mut grid, &mut pipeline, &config.thresholds, &mut SilentReporter).unwrap();
    }
    assert_eq!(collaborators.particle, before);
    assert_eq!(collaborators.particle.coupling(Target::Nuclei), config.cross_section_min);
    assert!(collaborators.rates.refreshes() > 0);
}

#[test]
fn direct_run_writes_reflection_limits() {
    let root = tempfile::tempdir().unwrap();
    let mut config = synthetic_config(root.path());
    config.masses = 2;
    config.mass_min = 1.0;
    config.mass_max = 10.0;

    let direct = run_direct(&config, &mut CapturingReporter::default()).unwrap();
    assert_eq!(direct.limits().len(), 2);

    let rows = read_table(&config.run_dir().join("Reflection_Limit_90.txt"), &[]).unwrap();
    assert_eq!(rows.len(), 2);
    for (row, &limit) in rows.iter().zip(direct.limits()) {
        assert!(((row[1] * CM2 - limit) / limit).abs() < 1.0e-12);
        assert!(row[1] > 1.0e-44 && row[1] < 1.0e-36);
    }
}
