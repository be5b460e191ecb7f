//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - installs logging
//! - loads and validates the run configuration
//! - picks the reporter for this process rank
//! - dispatches to the scan, limit or direct workflow

use clap::Parser;

use crate::cli::{Cli, Command};
use crate::error::AppError;
use crate::report::{ConsoleReporter, Reporter, SilentReporter, format_config_summary};

pub mod pipeline;

/// Entry point for the `dmscan` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let common = cli.command.common();
    crate::logging::init_logging(&common.log_level);
    let config = crate::io::load_config(&common.config)?;
    let primary = common.rank == 0;
    tracing::debug!(rank = common.rank, id = %config.id, "starting");

    let show_grid = match &cli.command {
        Command::Scan(args) | Command::Direct(args) => !args.no_grid,
        Command::Limits(_) | Command::Summary(_) => false,
    };
    let mut console = ConsoleReporter::new(config.thresholds.exclusion_p_value, show_grid);
    let mut silent = SilentReporter;
    let reporter: &mut dyn Reporter = if primary { &mut console } else { &mut silent };

    if reporter.is_primary() {
        print!("{}", format_config_summary(&config));
    }

    match &cli.command {
        Command::Scan(_) => {
            let run = pipeline::run_scan(&config, reporter)?;
            for path in &run.written {
                reporter.message(&format!("Wrote {}", path.display()));
            }
        }
        Command::Limits(args) => {
            pipeline::run_limits(&config, &args.certainty_levels, reporter)?;
        }
        Command::Direct(_) => {
            pipeline::run_direct(&config, reporter)?;
        }
        Command::Summary(_) => {}
    }

    Ok(())
}
