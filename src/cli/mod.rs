//! Command-line parsing for the exclusion-limit scanner.
//!
//! Parsing lives here; dispatch lives in `app`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "dmscan", version, about = "Dark matter exclusion limits from a parameter scan")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fill the p-value grid, export it and derive limit curves.
    Scan(RunArgs),
    /// Re-derive limit curves from a previously exported `p_values.txt`.
    Limits(LimitsArgs),
    /// Solve for the limit at each mass with a root finder.
    Direct(RunArgs),
    /// Print the configuration summary and exit.
    Summary(CommonArgs),
}

/// Options shared by every command.
#[derive(Debug, Args, Clone)]
pub struct CommonArgs {
    /// YAML run configuration.
    #[arg(short, long, value_name = "YAML")]
    pub config: PathBuf,

    /// Process rank. Only rank 0 prints progress and writes files.
    #[arg(long, env = "DMSCAN_RANK", default_value_t = 0)]
    pub rank: usize,

    /// Log level for this crate when `RUST_LOG` is unset.
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// Options for the commands that evaluate the pipeline.
#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Do not redraw the progress grid after every cell.
    #[arg(long)]
    pub no_grid: bool,
}

/// Options for re-deriving limits.
#[derive(Debug, Args, Clone)]
pub struct LimitsArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Certainty level to export (repeatable). Defaults to the configured list.
    #[arg(long = "cl", value_name = "LEVEL")]
    pub certainty_levels: Vec<f64>,
}

impl Command {
    pub fn common(&self) -> &CommonArgs {
        match self {
            Command::Scan(args) | Command::Direct(args) => &args.common,
            Command::Limits(args) => &args.common,
            Command::Summary(args) => args,
        }
    }
}
