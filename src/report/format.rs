//! Formatted terminal output.
//!
//! Formatting lives here so the scan and limit code stay free of
//! presentation details.

use chrono::Local;

use crate::domain::units::{CM2, GEV, in_units};
use crate::domain::{LimitPoint, ScanConfig, certainty_label};
use crate::report::round_sig;
use crate::scan::{ScanOutcome, ScanStop};

const SEPARATOR: &str = "----------------------------------------";

/// Format the run configuration printed before any computation.
pub fn format_config_summary(config: &ScanConfig) -> String {
    let mut out = String::new();

    out.push_str(SEPARATOR);
    out.push('\n');
    out.push_str("dmscan parameters\n");
    out.push_str(&format!("\tID:\t\t\t\t{}\n", config.id));
    out.push_str(&format!("\tStarted:\t\t\t{}\n", Local::now().format("%Y-%m-%d %H:%M:%S")));
    out.push_str(&format!("\tResults:\t\t\t{}\n", config.run_dir().display()));
    out.push_str(&format!("\tSample size:\t\t\t{}\n", config.sample_size));
    out.push_str(&format!(
        "\tCross section (min) [cm^2]:\t{}\n",
        round_sig(in_units(config.cross_section_min, CM2), 3)
    ));
    out.push_str(&format!(
        "\tCross section (max) [cm^2]:\t{}\n",
        round_sig(in_units(config.cross_section_max, CM2), 3)
    ));
    out.push_str(&format!("\tCross section steps:\t\t{}\n", config.cross_sections));
    out.push_str(&format!(
        "\tMass range [GeV]:\t\t[{}, {}] ({} steps)\n",
        round_sig(in_units(config.mass_min, GEV), 3),
        round_sig(in_units(config.mass_max, GEV), 3),
        config.masses
    ));
    out.push_str(&format!(
        "\tCertainty level:\t\t{}%\n",
        certainty_label(config.certainty_level)
    ));
    out.push_str(&format!(
        "\tTarget:\t\t\t\t{}\n",
        config.detector.target.display_name()
    ));
    out.push_str(SEPARATOR);
    out.push('\n');

    out
}

/// One-line description of how a scan ended.
pub fn format_scan_outcome(outcome: &ScanOutcome) -> String {
    match outcome.stop {
        ScanStop::Completed => format!(
            "Scan completed: {} cells evaluated over {} coupling rows.",
            outcome.evaluations, outcome.rows_scanned
        ),
        ScanStop::Pruned { coupling_index } => format!(
            "Scan stopped after {} cells: no exclusion in coupling row {coupling_index} ({} rows scanned).",
            outcome.evaluations, outcome.rows_scanned
        ),
    }
}

/// Tabulate a limit curve in GeV and cm^2.
pub fn format_limit_curve(certainty_level: f64, curve: &[LimitPoint]) -> String {
    let mut out = String::new();
    out.push_str(&format!("Limit ({}% CL):\n", certainty_label(certainty_level)));
    if curve.is_empty() {
        out.push_str("  (no mass excluded)\n");
        return out;
    }
    out.push_str(&format!("  {:>12}  {:>12}\n", "mass [GeV]", "sigma [cm^2]"));
    for point in curve {
        out.push_str(&format!(
            "  {:>12.4e}  {:>12.4e}\n",
            in_units(point.mass, GEV),
            in_units(point.coupling, CM2)
        ));
    }
    out
}
