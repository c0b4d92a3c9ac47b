//! Command-line parsing for `mlab`.
//!
//! Parsing only: every flag maps onto one setter of
//! [`ModelConfiguration`](crate::params::ModelConfiguration), and the setters do
//! the validating. Dispatch lives in [`crate::app`].

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::domain::{Geometry, GrainDistribution};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "mlab", version, about = "MAPPINGS V input-script compiler and runner")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the compiled input script without writing anything.
    Preview(ScriptArgs),
    /// Compile the model and write its input script.
    Write(WriteArgs),
    /// Write the input script and run MAPPINGS on it.
    Run(RunArgs),
    /// Print every model parameter.
    Summary(SummaryArgs),
    /// Re-check that every referenced file still exists.
    Validate(ModelArgs),
}

/// Parameters of one model. Anything not given keeps its default, or the
/// value from `--params` when a parameter file is used.
#[derive(Debug, Args, Clone, Default)]
pub struct ModelArgs {
    /// Model name. May be omitted when the parameter file names the model.
    pub name: Option<String>,

    /// JSON parameter file applied before any other flag.
    #[arg(long, value_name = "JSON")]
    pub params: Option<PathBuf>,

    /// Abundance file.
    #[arg(long = "abund", value_name = "FILE")]
    pub abundance_file: Option<PathBuf>,

    /// Depletion file.
    #[arg(long = "depl", value_name = "FILE")]
    pub depletion_file: Option<PathBuf>,

    /// Ionizing spectrum file (the built-in default spectrum otherwise).
    #[arg(long = "spec", value_name = "FILE")]
    pub spectrum_file: Option<PathBuf>,

    /// Age index; the region's age is (n-1)*0.5 Myr.
    #[arg(long = "age", allow_negative_numbers = true)]
    pub age_index: Option<i64>,

    #[arg(long, value_enum)]
    pub geometry: Option<Geometry>,

    /// log10 of P/k.
    #[arg(long = "pressure", allow_negative_numbers = true)]
    pub log_pressure: Option<f64>,

    /// log10 of the initial temperature guess.
    #[arg(long = "temperature", allow_negative_numbers = true)]
    pub log_temperature: Option<f64>,

    /// Volume filling factor; two values give a pair.
    #[arg(long = "filling-factor", num_args = 1..=2, allow_negative_numbers = true)]
    pub filling_factor: Option<Vec<f64>>,

    /// log10 of the ionization parameter Q.
    #[arg(long = "logq", allow_negative_numbers = true)]
    pub log_ionization: Option<f64>,

    /// Integration step size.
    #[arg(long = "step", allow_negative_numbers = true)]
    pub step_size: Option<f64>,

    /// log10 of the source luminosity.
    #[arg(long = "luminosity", allow_negative_numbers = true)]
    pub log_luminosity: Option<f64>,

    /// Preferred destination of the input script.
    #[arg(long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// Run the model without dust.
    #[arg(long, conflicts_with = "dust_depletion_file")]
    pub no_dust: bool,

    /// Dust depletion file (required while dust is included).
    #[arg(long = "dust-depl", value_name = "FILE")]
    pub dust_depletion_file: Option<PathBuf>,

    /// Fraction of carbon dust depletion held in PAHs, in [0, 1].
    #[arg(long, allow_negative_numbers = true)]
    pub pah_fraction: Option<f64>,

    /// PAH switch-on value: PAHs are included where QHDH is below it.
    #[arg(long, allow_negative_numbers = true)]
    pub pah_switch: Option<String>,

    /// Evaluate dust temperatures and IR flux. A bare flag means `true`.
    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true", action = ArgAction::Set)]
    pub eval_dust_temp: Option<bool>,

    /// Make graphite grains cospatial with PAHs. A bare flag means `true`.
    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true", action = ArgAction::Set)]
    pub graphite_cospatial: Option<bool>,

    /// Allow grain destruction. A bare flag means `true`.
    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true", action = ArgAction::Set)]
    pub grain_destruction: Option<bool>,

    #[arg(long, value_enum)]
    pub grain_distribution: Option<GrainDistribution>,
}

/// Options for commands that compile a script.
#[derive(Debug, Args, Clone, Default)]
pub struct ScriptArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Use this model identifier instead of the derived one.
    #[arg(long)]
    pub id: Option<String>,
}

#[derive(Debug, Args, Clone, Default)]
pub struct WriteArgs {
    #[command(flatten)]
    pub script: ScriptArgs,

    /// Write here, overriding the configured output path and the lab default.
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Args, Clone, Default)]
pub struct RunArgs {
    #[command(flatten)]
    pub write: WriteArgs,

    /// Kill MAPPINGS if it runs longer than this many seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<f64>,
}

#[derive(Debug, Args, Clone, Default)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Print the settings as JSON.
    #[arg(long)]
    pub json: bool,
}
