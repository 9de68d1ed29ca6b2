//! CLI argument definitions for REDCap Insights.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "redcap-insights",
    version,
    about = "REDCap Insights - Consolidate longitudinal survey exports into analytical tables",
    long_about = "Consolidate a long-format REDCap export (one row per participant-visit)\n\
                  into a one-row-per-participant analytical table with derived scale\n\
                  scores, severity classifications, and outcome summaries.\n\n\
                  Rescheduled (_r) visit events consolidate onto their standard\n\
                  timepoints; the dosing_rescheduled flag is kept at participant level."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow participant-level values (PHI) in trace logs.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Consolidate a long-format export and write the analytical outputs.
    Integrate(IntegrateArgs),

    /// List every instrument in the scoring catalog.
    Instruments,

    /// Generate a synthetic long-format export for development and testing.
    Generate(GenerateArgs),
}

#[derive(Parser)]
pub struct IntegrateArgs {
    /// Path to the long-format CSV export.
    #[arg(value_name = "EXPORT_CSV")]
    pub input: PathBuf,

    /// Output directory (default: the export's directory).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Outputs to write.
    #[arg(long = "format", value_enum, default_value = "both")]
    pub format: OutputFormatArg,

    /// Run the full pipeline and report without writing output files.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

#[derive(Parser)]
pub struct GenerateArgs {
    /// Path of the CSV file to write.
    #[arg(value_name = "OUTPUT_CSV")]
    pub output: PathBuf,

    /// Number of participants to generate.
    #[arg(long, default_value_t = 120)]
    pub participants: usize,

    /// Random seed (fixed seed -> identical output).
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Fraction of participants with a rescheduled dosing session.
    #[arg(long = "rescheduled-rate", default_value_t = 0.15)]
    pub rescheduled_rate: f64,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormatArg {
    /// Flat CSV of the wide table only.
    Csv,
    /// Per-sheet workbook directory only.
    Workbook,
    /// Both outputs.
    Both,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
