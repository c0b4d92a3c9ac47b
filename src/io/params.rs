//! JSON parameter files.
//!
//! A parameter file is a partial description of a model: every field is
//! optional and is applied through the same validating setters the library
//! exposes, so a file can never produce a state the setters would reject.
//! Relative paths are resolved against the file's own directory.
//!
//! ```json
//! {
//!   "name": "n159",
//!   "geometry": "S",
//!   "log_pressure": 6.5,
//!   "filling_factor": [0.5, 0.2],
//!   "dust": { "enabled": true, "depletion_file": "depl/lmc.dpl", "grain_distribution": "M" }
//! }
//! ```

use std::fs::File;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::domain::{Geometry, GrainDistribution, parse_number};
use crate::error::{AppError, ValidationError};
use crate::params::{DustUpdate, ModelConfiguration};

/// A number given either as a JSON number or as a numeric string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NumberField {
    Num(f64),
    Text(String),
}

impl NumberField {
    fn to_f64(&self, field: &'static str) -> Result<f64, ValidationError> {
        match self {
            NumberField::Num(v) => Ok(*v),
            NumberField::Text(s) => parse_number(field, s),
        }
    }

    fn to_text(&self) -> String {
        match self {
            NumberField::Num(v) => v.to_string(),
            NumberField::Text(s) => s.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FillingFactorField {
    Single(NumberField),
    Pair([NumberField; 2]),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DustParams {
    pub enabled: Option<bool>,
    pub depletion_file: Option<PathBuf>,
    pub pah_fraction: Option<NumberField>,
    pub pah_switch_value: Option<NumberField>,
    pub eval_temperature: Option<bool>,
    pub graphite_cospatial: Option<bool>,
    pub allow_grain_destruction: Option<bool>,
    pub grain_distribution: Option<String>,
}

/// Parsed contents of a parameter file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParamsFile {
    pub name: Option<String>,
    pub abundance_file: Option<PathBuf>,
    pub depletion_file: Option<PathBuf>,
    pub spectrum_file: Option<PathBuf>,
    pub age_index: Option<NumberField>,
    pub geometry: Option<String>,
    pub log_pressure: Option<NumberField>,
    pub log_temperature: Option<NumberField>,
    pub filling_factor: Option<FillingFactorField>,
    pub log_ionization: Option<NumberField>,
    pub step_size: Option<NumberField>,
    pub log_luminosity: Option<NumberField>,
    pub output_path: Option<PathBuf>,
    pub dust: Option<DustParams>,

    #[serde(skip)]
    base_dir: PathBuf,
}

/// Read a parameter file.
pub fn read_params_file(path: &Path) -> Result<ParamsFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open parameter file '{}': {e}", path.display())))?;
    let mut params: ParamsFile = serde_json::from_reader(file)
        .map_err(|e| AppError::new(2, format!("Invalid parameter file '{}': {e}", path.display())))?;
    params.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    Ok(params)
}

impl ParamsFile {
    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Create a configuration named `name` (or the file's own name) from this file.
    pub fn build(&self, name: Option<&str>) -> Result<ModelConfiguration, ValidationError> {
        let name = name
            .map(str::to_string)
            .or_else(|| self.name.clone())
            .ok_or(ValidationError::MissingRequiredField { field: "name" })?;
        let mut config = ModelConfiguration::new(name)?;
        self.apply(&mut config)?;
        Ok(config)
    }

    /// Apply every field present in the file to `config`.
    pub fn apply(&self, config: &mut ModelConfiguration) -> Result<(), ValidationError> {
        if let Some(p) = &self.abundance_file {
            config.set_abundance_file(self.resolve(p))?;
        }
        if let Some(p) = &self.depletion_file {
            config.set_depletion_file(self.resolve(p))?;
        }
        if let Some(p) = &self.spectrum_file {
            config.set_spectrum_file(self.resolve(p))?;
        }
        if let Some(age) = &self.age_index {
            let value = age.to_f64("age_index")?;
            if value.fract() != 0.0 || !value.is_finite() {
                return Err(ValidationError::TypeMismatch {
                    field: "age_index",
                    expected: "an integer",
                    found: age.to_text(),
                });
            }
            config.set_age_index(value as i64)?;
        }
        if let Some(g) = &self.geometry {
            config.set_geometry(g.parse::<Geometry>()?);
        }
        if let Some(v) = &self.log_pressure {
            config.set_log_pressure(v.to_f64("log_pressure")?)?;
        }
        if let Some(v) = &self.log_temperature {
            config.set_log_temperature(v.to_f64("log_temperature")?)?;
        }
        match &self.filling_factor {
            Some(FillingFactorField::Single(v)) => {
                config.set_filling_factor(v.to_f64("filling_factor")?)?;
            }
            Some(FillingFactorField::Pair([a, b])) => {
                config.set_filling_factor_pair(a.to_f64("filling_factor")?, b.to_f64("filling_factor")?)?;
            }
            None => {}
        }
        if let Some(v) = &self.log_ionization {
            config.set_log_ionization(v.to_f64("log_ionization")?)?;
        }
        if let Some(v) = &self.step_size {
            config.set_step_size(v.to_f64("step_size")?)?;
        }
        if let Some(v) = &self.log_luminosity {
            config.set_log_luminosity(v.to_f64("log_luminosity")?)?;
        }
        if let Some(p) = &self.output_path {
            config.set_output_path(self.resolve(p))?;
        }
        if let Some(dust) = &self.dust {
            config.set_dust(self.dust_update(dust)?)?;
        }
        Ok(())
    }

    fn dust_update(&self, dust: &DustParams) -> Result<DustUpdate, ValidationError> {
        Ok(DustUpdate {
            enabled: dust.enabled,
            depletion_file: dust.depletion_file.as_deref().map(|p| self.resolve(p)),
            pah_fraction: dust
                .pah_fraction
                .as_ref()
                .map(|v| v.to_f64("dust.pah_fraction"))
                .transpose()?,
            pah_switch_value: dust.pah_switch_value.as_ref().map(NumberField::to_text),
            eval_temperature: dust.eval_temperature,
            graphite_cospatial: dust.graphite_cospatial,
            allow_grain_destruction: dust.allow_grain_destruction,
            grain_distribution: dust
                .grain_distribution
                .as_deref()
                .map(str::parse::<GrainDistribution>)
                .transpose()?,
        })
    }
}

/// Pretty JSON snapshot of a configuration.
pub fn settings_json(config: &ModelConfiguration) -> Result<String, AppError> {
    serde_json::to_string_pretty(config)
        .map_err(|e| AppError::new(4, format!("Failed to serialize settings: {e}")))
}
