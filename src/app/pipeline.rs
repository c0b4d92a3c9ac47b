//! Shared model pipeline used by every subcommand.
//!
//! configuration (params file, then flags) -> compile -> emit -> run -> locate outputs

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::ModelArgs;
use crate::error::{AppError, ValidationError};
use crate::params::{DustUpdate, ModelConfiguration};
use crate::results::{ModelOutputs, OutputLocator, ResultReader};
use crate::runner::{Lab, RunReport, run_mappings};
use crate::script::{Script, ScriptCompiler};

/// Everything produced by one `mlab run`.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub script_path: PathBuf,
    pub report: RunReport,
    pub outputs: ModelOutputs,
}

/// Build the configuration described by `args`.
///
/// The parameter file (if any) is applied first; flags override it.
pub fn configuration_from_args(args: &ModelArgs) -> Result<ModelConfiguration, AppError> {
    let mut config = match &args.params {
        Some(path) => crate::io::read_params_file(path)?.build(args.name.as_deref())?,
        None => {
            let name = args
                .name
                .clone()
                .ok_or(ValidationError::MissingRequiredField { field: "name" })?;
            ModelConfiguration::new(name)?
        }
    };
    apply_overrides(args, &mut config)?;
    tracing::debug!(model = config.name(), "configuration assembled");
    Ok(config)
}

/// Apply every flag present in `args` through the store's setters.
pub fn apply_overrides(args: &ModelArgs, config: &mut ModelConfiguration) -> Result<(), ValidationError> {
    if let Some(p) = &args.abundance_file {
        config.set_abundance_file(p)?;
    }
    if let Some(p) = &args.depletion_file {
        config.set_depletion_file(p)?;
    }
    if let Some(p) = &args.spectrum_file {
        config.set_spectrum_file(p)?;
    }
    if let Some(age) = args.age_index {
        config.set_age_index(age)?;
    }
    if let Some(geometry) = args.geometry {
        config.set_geometry(geometry);
    }
    if let Some(v) = args.log_pressure {
        config.set_log_pressure(v)?;
    }
    if let Some(v) = args.log_temperature {
        config.set_log_temperature(v)?;
    }
    match args.filling_factor.as_deref() {
        Some([single]) => {
            config.set_filling_factor(*single)?;
        }
        Some([first, second]) => {
            config.set_filling_factor_pair(*first, *second)?;
        }
        _ => {}
    }
    if let Some(v) = args.log_ionization {
        config.set_log_ionization(v)?;
    }
    if let Some(v) = args.step_size {
        config.set_step_size(v)?;
    }
    if let Some(v) = args.log_luminosity {
        config.set_log_luminosity(v)?;
    }
    if let Some(p) = &args.output_path {
        config.set_output_path(p)?;
    }

    let dust = dust_update(args);
    let touches_dust = dust.enabled.is_some()
        || dust.depletion_file.is_some()
        || dust.pah_fraction.is_some()
        || dust.pah_switch_value.is_some()
        || dust.eval_temperature.is_some()
        || dust.graphite_cospatial.is_some()
        || dust.allow_grain_destruction.is_some()
        || dust.grain_distribution.is_some();
    if touches_dust {
        config.set_dust(dust)?;
    }
    Ok(())
}

fn dust_update(args: &ModelArgs) -> DustUpdate {
    DustUpdate {
        enabled: if args.no_dust {
            Some(false)
        } else {
            args.dust_depletion_file.as_ref().map(|_| true)
        },
        depletion_file: args.dust_depletion_file.clone(),
        pah_fraction: args.pah_fraction,
        pah_switch_value: args.pah_switch.clone(),
        eval_temperature: args.eval_dust_temp,
        graphite_cospatial: args.graphite_cospatial,
        allow_grain_destruction: args.grain_destruction,
        grain_distribution: args.grain_distribution,
    }
}

/// Compile `config`, using `id` instead of the derived identifier when given.
pub fn compile(config: &ModelConfiguration, id: Option<&str>) -> Result<Script, AppError> {
    let compiler = match id {
        Some(id) => ScriptCompiler::new(config).with_id(id),
        None => ScriptCompiler::new(config),
    };
    Ok(compiler.compile()?)
}

/// Where the script goes: `--out`, else the configured output path, else the lab.
pub fn script_destination(out: Option<&Path>, config: &ModelConfiguration, lab: &Lab) -> PathBuf {
    out.or(config.output_path())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| lab.script_path(config.name()))
}

/// Compile and write the script, returning where it landed.
pub fn write_model(
    config: &ModelConfiguration,
    id: Option<&str>,
    destination: &Path,
) -> Result<(Script, PathBuf), AppError> {
    let script = compile(config, id)?;
    let path = script.emit(destination)?;
    Ok((script, path))
}

/// Write the script, run MAPPINGS on it, and collect the run's artifacts.
pub fn run_model(
    lab: &Lab,
    config: &ModelConfiguration,
    id: Option<&str>,
    out: Option<&Path>,
    deadline: Option<Duration>,
) -> Result<RunOutput, AppError> {
    let destination = script_destination(out, config, lab);
    let (script, script_path) = write_model(config, id, &destination)?;
    let report = run_mappings(lab, config.name(), &script_path, deadline)?;
    let outputs = OutputLocator::new(&lab.dir).load(script.id())?;
    tracing::info!(model = config.name(), artifacts = outputs.artifacts.len(), "outputs located");

    Ok(RunOutput {
        script_path,
        report,
        outputs,
    })
}

/// Seconds from the command line as a run deadline.
pub fn deadline_from_secs(secs: Option<f64>) -> Result<Option<Duration>, AppError> {
    secs.map(|s| {
        Duration::try_from_secs_f64(s)
            .ok()
            .filter(|d| !d.is_zero())
            .ok_or_else(|| AppError::new(2, format!("Invalid timeout: {s} (must be a positive number of seconds)")))
    })
    .transpose()
}
