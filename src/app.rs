//! Top-level application orchestration.
//!
//! `src/main.rs` stays tiny; this module is the real main. It parses the CLI,
//! builds the model configuration, and prints whatever the subcommand asks for.

use clap::Parser;

use crate::cli::{Command, ModelArgs, RunArgs, ScriptArgs, SummaryArgs, WriteArgs};
use crate::error::AppError;
use crate::runner::Lab;

pub mod pipeline;

/// Entry point for the `mlab` binary.
pub fn run() -> Result<(), AppError> {
    crate::logging::init();
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Preview(args) => handle_preview(args),
        Command::Write(args) => handle_write(args),
        Command::Run(args) => handle_run(args),
        Command::Summary(args) => handle_summary(args),
        Command::Validate(args) => handle_validate(args),
    }
}

fn handle_preview(args: ScriptArgs) -> Result<(), AppError> {
    let config = pipeline::configuration_from_args(&args.model)?;
    let script = pipeline::compile(&config, args.id.as_deref())?;
    println!("{}", crate::report::format_preview(&script.text()));
    Ok(())
}

fn handle_write(args: WriteArgs) -> Result<(), AppError> {
    let config = pipeline::configuration_from_args(&args.script.model)?;
    let lab = Lab::from_env()?;
    let destination = pipeline::script_destination(args.out.as_deref(), &config, &lab);
    let (_, path) = pipeline::write_model(&config, args.script.id.as_deref(), &destination)?;
    println!("Input file written to: {}", path.display());
    Ok(())
}

fn handle_run(args: RunArgs) -> Result<(), AppError> {
    let deadline = pipeline::deadline_from_secs(args.timeout)?;
    let config = pipeline::configuration_from_args(&args.write.script.model)?;
    let lab = Lab::from_env()?;

    let run = pipeline::run_model(
        &lab,
        &config,
        args.write.script.id.as_deref(),
        args.write.out.as_deref(),
        deadline,
    )?;

    println!("Input file written to: {}", run.script_path.display());
    print!("{}", crate::report::format_run_report(&run.report));
    if run.outputs.is_empty() {
        println!("No output files found for '{}'.", run.outputs.id);
    } else {
        println!("Output files:");
        for artifact in &run.outputs.artifacts {
            println!("  {}", artifact.display());
        }
    }

    if !run.report.success() {
        return Err(AppError::new(5, format!("MAPPINGS failed on model '{}'.", config.name())));
    }
    Ok(())
}

fn handle_summary(args: SummaryArgs) -> Result<(), AppError> {
    let config = pipeline::configuration_from_args(&args.model)?;
    if args.json {
        println!("{}", crate::io::settings_json(&config)?);
    } else {
        print!("{}", crate::report::format_summary(&config));
    }
    Ok(())
}

fn handle_validate(args: ModelArgs) -> Result<(), AppError> {
    let config = pipeline::configuration_from_args(&args)?;
    config.validate_all()?;
    println!("{config}: all parameters valid.");
    Ok(())
}
