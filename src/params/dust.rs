//! Dust sub-configuration.
//!
//! Updates are applied to a copy and only committed once every field has been
//! accepted, so a rejected update leaves the previous settings untouched.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::domain::{Fixed, GrainDistribution, parse_number};
use crate::error::ValidationError;

pub const DEFAULT_PAH_FRACTION: f64 = 0.3;
pub const DEFAULT_PAH_SWITCH_VALUE: &str = "4e2";

/// Current dust settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DustSettings {
    pub enabled: bool,
    pub depletion_file: Option<PathBuf>,
    /// Fraction of carbon dust depletion held in PAHs.
    pub pah_fraction: Fixed,
    /// PAH switch-on threshold, kept in the form it was given (e.g. `4e2`).
    pub pah_switch_value: String,
    /// Evaluate dust temperatures and IR flux.
    pub eval_temperature: bool,
    /// Graphite grains cospatial with PAHs.
    pub graphite_cospatial: bool,
    pub allow_grain_destruction: bool,
    pub grain_distribution: GrainDistribution,
}

impl Default for DustSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            depletion_file: None,
            pah_fraction: Fixed::preset("0.3", DEFAULT_PAH_FRACTION),
            pah_switch_value: DEFAULT_PAH_SWITCH_VALUE.to_string(),
            eval_temperature: false,
            graphite_cospatial: false,
            allow_grain_destruction: false,
            grain_distribution: GrainDistribution::Mrn,
        }
    }
}

/// A partial dust update. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct DustUpdate {
    pub enabled: Option<bool>,
    pub depletion_file: Option<PathBuf>,
    pub pah_fraction: Option<f64>,
    pub pah_switch_value: Option<String>,
    pub eval_temperature: Option<bool>,
    pub graphite_cospatial: Option<bool>,
    pub allow_grain_destruction: Option<bool>,
    pub grain_distribution: Option<GrainDistribution>,
}

impl DustUpdate {
    /// Turn dust on with the given depletion file and default PAH settings.
    pub fn enable(depletion_file: impl Into<PathBuf>) -> Self {
        Self {
            enabled: Some(true),
            depletion_file: Some(depletion_file.into()),
            pah_fraction: Some(DEFAULT_PAH_FRACTION),
            pah_switch_value: Some(DEFAULT_PAH_SWITCH_VALUE.to_string()),
            eval_temperature: Some(false),
            graphite_cospatial: Some(false),
            allow_grain_destruction: Some(false),
            grain_distribution: Some(GrainDistribution::Mrn),
        }
    }

    pub fn disable() -> Self {
        Self {
            enabled: Some(false),
            ..Self::default()
        }
    }
}

impl DustSettings {
    /// Validate `update` against the current settings and return the result.
    pub fn updated(&self, update: DustUpdate) -> Result<DustSettings, ValidationError> {
        let mut next = self.clone();

        if let Some(enabled) = update.enabled {
            next.enabled = enabled;
        }
        if let Some(path) = update.depletion_file {
            next.depletion_file = Some(existing_file("dust.depletion_file", &path)?);
        }
        if next.enabled && next.depletion_file.is_none() {
            return Err(ValidationError::MissingRequiredField {
                field: "dust.depletion_file",
            });
        }
        if let Some(fraction) = update.pah_fraction {
            next.pah_fraction = pah_fraction(fraction)?;
        }
        if let Some(raw) = update.pah_switch_value {
            next.pah_switch_value = pah_switch_value(&raw)?;
        }
        if let Some(v) = update.eval_temperature {
            next.eval_temperature = v;
        }
        if let Some(v) = update.graphite_cospatial {
            next.graphite_cospatial = v;
        }
        if let Some(v) = update.allow_grain_destruction {
            next.allow_grain_destruction = v;
        }
        if let Some(v) = update.grain_distribution {
            next.grain_distribution = v;
        }

        Ok(next)
    }
}

fn pah_fraction(value: f64) -> Result<Fixed, ValidationError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ValidationError::OutOfRange {
            field: "dust.pah_fraction",
            value: value.to_string(),
            constraint: "must be between 0 and 1",
        });
    }
    Fixed::shortest("dust.pah_fraction", value)
}

fn pah_switch_value(raw: &str) -> Result<String, ValidationError> {
    let value = parse_number("dust.pah_switch_value", raw)?;
    if !value.is_finite() {
        return Err(ValidationError::OutOfRange {
            field: "dust.pah_switch_value",
            value: raw.trim().to_string(),
            constraint: "must be a finite number",
        });
    }
    Ok(raw.trim().to_string())
}

/// Accept `path` only if it exists on disk right now and can be written as
/// one line of a control script.
pub(crate) fn existing_file(field: &'static str, path: &Path) -> Result<PathBuf, ValidationError> {
    let Some(text) = path.to_str() else {
        return Err(ValidationError::TypeMismatch {
            field,
            expected: "a UTF-8 path",
            found: path.display().to_string(),
        });
    };
    if text.contains(&['\n', '\r'][..]) {
        return Err(ValidationError::OutOfRange {
            field,
            value: text.escape_debug().to_string(),
            constraint: "path must fit on a single line",
        });
    }
    if path.exists() {
        Ok(path.to_path_buf())
    } else {
        Err(ValidationError::FileNotFound {
            field,
            path: path.to_path_buf(),
        })
    }
}
