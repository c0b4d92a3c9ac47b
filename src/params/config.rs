//! The model configuration store.
//!
//! All mutation goes through setters that validate first and commit second.
//! Numbers are canonicalized to their fixed-precision text as they are set, so
//! the compiler only ever concatenates strings that are already final.

use std::fmt;
use std::fs::create_dir_all;
use std::path::{Path, PathBuf};

use serde::{Serialize, Serializer};

use crate::domain::{Fixed, Geometry, GrainDistribution};
use crate::error::ValidationError;
use crate::params::dust::{DustSettings, DustUpdate, existing_file};

pub const DEFAULT_AGE_INDEX: u32 = 9;

/// Filling factor: a single value, or a pair for two-phase models.
#[derive(Debug, Clone, PartialEq)]
pub enum FillingFactor {
    Single(Fixed),
    Pair(Fixed, Fixed),
}

impl FillingFactor {
    pub fn values(&self) -> Vec<f64> {
        match self {
            FillingFactor::Single(f) => vec![f.value()],
            FillingFactor::Pair(a, b) => vec![a.value(), b.value()],
        }
    }

    /// Protocol text (`1.0`, `0.50`, `0.50 0.20`).
    pub fn as_text(&self) -> String {
        match self {
            FillingFactor::Single(f) => f.as_str().to_string(),
            FillingFactor::Pair(a, b) => format!("{a} {b}"),
        }
    }
}

impl Default for FillingFactor {
    fn default() -> Self {
        FillingFactor::Single(Fixed::preset("1.0", 1.0))
    }
}

impl fmt::Display for FillingFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl Serialize for FillingFactor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_text())
    }
}

/// Validated parameters of one MAPPINGS model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelConfiguration {
    name: String,
    abundance_file: Option<PathBuf>,
    depletion_file: Option<PathBuf>,
    spectrum_file: Option<PathBuf>,
    age_index: u32,
    geometry: Geometry,
    log_pressure: Fixed,
    log_temperature: Fixed,
    filling_factor: FillingFactor,
    log_ionization: Fixed,
    step_size: Fixed,
    log_luminosity: Fixed,
    output_path: Option<PathBuf>,
    dust: DustSettings,
}

impl ModelConfiguration {
    /// Create a configuration with default parameters.
    ///
    /// `name` names the input and output files of the run and must not be blank.
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::MissingRequiredField { field: "name" });
        }
        Ok(Self {
            name,
            abundance_file: None,
            depletion_file: None,
            spectrum_file: None,
            age_index: DEFAULT_AGE_INDEX,
            geometry: Geometry::Spherical,
            log_pressure: Fixed::preset("6.00", 6.0),
            log_temperature: Fixed::preset("4.00", 4.0),
            filling_factor: FillingFactor::default(),
            log_ionization: Fixed::preset("8.00", 8.0),
            step_size: Fixed::preset("0.0200", 0.02),
            log_luminosity: Fixed::preset("40.00", 40.0),
            output_path: None,
            dust: DustSettings::default(),
        })
    }

    // --- files -------------------------------------------------------------

    pub fn set_abundance_file(&mut self, path: impl AsRef<Path>) -> Result<&mut Self, ValidationError> {
        self.abundance_file = Some(existing_file("abundance", path.as_ref())?);
        Ok(self)
    }

    /// Fall back to the tool's default abundances.
    pub fn clear_abundance_file(&mut self) -> &mut Self {
        self.abundance_file = None;
        self
    }

    pub fn set_depletion_file(&mut self, path: impl AsRef<Path>) -> Result<&mut Self, ValidationError> {
        self.depletion_file = Some(existing_file("depletion", path.as_ref())?);
        Ok(self)
    }

    pub fn clear_depletion_file(&mut self) -> &mut Self {
        self.depletion_file = None;
        self
    }

    pub fn set_spectrum_file(&mut self, path: impl AsRef<Path>) -> Result<&mut Self, ValidationError> {
        self.spectrum_file = Some(existing_file("spectrum", path.as_ref())?);
        Ok(self)
    }

    pub fn clear_spectrum_file(&mut self) -> &mut Self {
        self.spectrum_file = None;
        self
    }

    /// Set where the compiled script goes by default. The parent directory is
    /// created immediately.
    pub fn set_output_path(&mut self, path: impl AsRef<Path>) -> Result<&mut Self, ValidationError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            create_dir_all(parent).map_err(|e| ValidationError::DirectoryNotCreatable {
                field: "output_path",
                path: parent.to_path_buf(),
                reason: e.to_string(),
            })?;
        }
        self.output_path = Some(path.to_path_buf());
        Ok(self)
    }

    // --- source and geometry -----------------------------------------------

    /// Stellar population age index; age is `(index - 1) * 0.5` Myr.
    pub fn set_age_index(&mut self, index: i64) -> Result<&mut Self, ValidationError> {
        let index = u32::try_from(index).map_err(|_| ValidationError::OutOfRange {
            field: "age_index",
            value: index.to_string(),
            constraint: "must be a non-negative integer",
        })?;
        self.age_index = index;
        Ok(self)
    }

    pub fn set_geometry(&mut self, geometry: Geometry) -> &mut Self {
        self.geometry = geometry;
        self
    }

    // --- physical conditions -----------------------------------------------

    /// Log pressure, `log(p/k)`.
    pub fn set_log_pressure(&mut self, value: f64) -> Result<&mut Self, ValidationError> {
        self.log_pressure = Fixed::new("log_pressure", value, 2)?;
        Ok(self)
    }

    /// Log of the initial electron temperature guess (K).
    pub fn set_log_temperature(&mut self, value: f64) -> Result<&mut Self, ValidationError> {
        self.log_temperature = Fixed::new("log_temperature", value, 2)?;
        Ok(self)
    }

    /// Filling factor. `0 < f <= 1` is expected but not enforced.
    pub fn set_filling_factor(&mut self, value: f64) -> Result<&mut Self, ValidationError> {
        self.filling_factor = FillingFactor::Single(Fixed::new("filling_factor", value, 2)?);
        Ok(self)
    }

    pub fn set_filling_factor_pair(&mut self, first: f64, second: f64) -> Result<&mut Self, ValidationError> {
        let first = Fixed::new("filling_factor", first, 2)?;
        let second = Fixed::new("filling_factor", second, 2)?;
        self.filling_factor = FillingFactor::Pair(first, second);
        Ok(self)
    }

    /// Log ionization parameter at the inner radius.
    pub fn set_log_ionization(&mut self, value: f64) -> Result<&mut Self, ValidationError> {
        self.log_ionization = Fixed::new("log_ionization", value, 2)?;
        Ok(self)
    }

    /// Step in photon absorption fraction.
    pub fn set_step_size(&mut self, value: f64) -> Result<&mut Self, ValidationError> {
        let step = Fixed::new("step_size", value, 4)?;
        if step.value() <= 0.0 {
            return Err(ValidationError::OutOfRange {
                field: "step_size",
                value: value.to_string(),
                constraint: "must be positive at 4 decimal places",
            });
        }
        self.step_size = step;
        Ok(self)
    }

    /// Log bolometric source luminosity (erg/s).
    pub fn set_log_luminosity(&mut self, value: f64) -> Result<&mut Self, ValidationError> {
        self.log_luminosity = Fixed::new("log_luminosity", value, 2)?;
        Ok(self)
    }

    // --- dust ----------------------------------------------------------------

    /// Apply a partial dust update atomically.
    pub fn set_dust(&mut self, update: DustUpdate) -> Result<&mut Self, ValidationError> {
        self.dust = self.dust.updated(update)?;
        Ok(self)
    }

    pub fn enable_dust(&mut self, depletion_file: impl Into<PathBuf>) -> Result<&mut Self, ValidationError> {
        self.set_dust(DustUpdate::enable(depletion_file))
    }

    /// Exclude dust. The stored dust depletion file is kept.
    pub fn disable_dust(&mut self) -> &mut Self {
        self.dust.enabled = false;
        self
    }

    pub fn set_grain_destruction(&mut self, allow: bool) -> &mut Self {
        self.dust.allow_grain_destruction = allow;
        self
    }

    pub fn set_grain_distribution(&mut self, distribution: GrainDistribution) -> &mut Self {
        self.dust.grain_distribution = distribution;
        self
    }

    // --- getters -------------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn abundance_file(&self) -> Option<&Path> {
        self.abundance_file.as_deref()
    }

    pub fn depletion_file(&self) -> Option<&Path> {
        self.depletion_file.as_deref()
    }

    pub fn spectrum_file(&self) -> Option<&Path> {
        self.spectrum_file.as_deref()
    }

    pub fn output_path(&self) -> Option<&Path> {
        self.output_path.as_deref()
    }

    pub fn age_index(&self) -> u32 {
        self.age_index
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn log_pressure(&self) -> &Fixed {
        &self.log_pressure
    }

    pub fn log_temperature(&self) -> &Fixed {
        &self.log_temperature
    }

    pub fn filling_factor(&self) -> &FillingFactor {
        &self.filling_factor
    }

    pub fn log_ionization(&self) -> &Fixed {
        &self.log_ionization
    }

    pub fn step_size(&self) -> &Fixed {
        &self.step_size
    }

    pub fn log_luminosity(&self) -> &Fixed {
        &self.log_luminosity
    }

    pub fn dust(&self) -> &DustSettings {
        &self.dust
    }

    /// Re-check every referenced file and the dust requirement, reporting all
    /// problems at once.
    pub fn validate_all(&self) -> Result<(), ValidationError> {
        let files = [
            ("abundance", self.abundance_file.as_deref()),
            ("depletion", self.depletion_file.as_deref()),
            ("spectrum", self.spectrum_file.as_deref()),
            ("dust.depletion_file", self.dust.depletion_file.as_deref()),
        ];

        let mut errors: Vec<ValidationError> = files
            .into_iter()
            .filter_map(|(field, path)| path.and_then(|p| existing_file(field, p).err()))
            .collect();

        if self.dust.enabled && self.dust.depletion_file.is_none() {
            errors.push(ValidationError::MissingRequiredField {
                field: "dust.depletion_file",
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::Aggregate(errors))
        }
    }
}

impl fmt::Display for ModelConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MAPPINGS InputModel: {}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_names_are_rejected() {
        assert_eq!(
            ModelConfiguration::new("   ").unwrap_err(),
            ValidationError::MissingRequiredField { field: "name" }
        );
        assert!(ModelConfiguration::new("n159").is_ok());
    }

    #[test]
    fn defaults_match_the_tool_defaults() {
        let m = ModelConfiguration::new("n159").unwrap();
        assert_eq!(m.age_index(), 9);
        assert_eq!(m.geometry(), Geometry::Spherical);
        assert_eq!(m.log_pressure().as_str(), "6.00");
        assert_eq!(m.log_temperature().as_str(), "4.00");
        assert_eq!(m.filling_factor().as_text(), "1.0");
        assert_eq!(m.log_ionization().as_str(), "8.00");
        assert_eq!(m.step_size().as_str(), "0.0200");
        assert_eq!(m.log_luminosity().as_str(), "40.00");
        assert!(m.dust().enabled);
        assert_eq!(m.dust().pah_fraction.as_str(), "0.3");
        assert_eq!(m.dust().pah_switch_value, "4e2");
        assert_eq!(m.dust().grain_distribution, GrainDistribution::Mrn);
    }

    #[test]
    fn numeric_setters_canonicalize() {
        let mut m = ModelConfiguration::new("n159").unwrap();
        m.set_log_pressure(6.0)
            .unwrap()
            .set_log_temperature(3.999)
            .unwrap()
            .set_step_size(0.05)
            .unwrap()
            .set_filling_factor(0.5)
            .unwrap();

        assert_eq!(m.log_pressure().as_str(), "6.00");
        assert_eq!(m.log_pressure().value(), 6.0);
        assert_eq!(m.log_temperature().as_str(), "4.00");
        assert_eq!(m.step_size().as_str(), "0.0500");
        assert_eq!(m.filling_factor().as_text(), "0.50");

        m.set_filling_factor_pair(0.5, 0.25).unwrap();
        assert_eq!(m.filling_factor().as_text(), "0.50 0.25");
        assert_eq!(m.filling_factor().values(), vec![0.5, 0.25]);
    }

    #[test]
    fn step_size_must_be_positive() {
        let mut m = ModelConfiguration::new("n159").unwrap();
        for bad in [0.0, -0.01, 0.00001] {
            let err = m.set_step_size(bad).unwrap_err();
            assert!(matches!(err, ValidationError::OutOfRange { field: "step_size", .. }));
        }
        assert_eq!(m.step_size().as_str(), "0.0200");
    }

    #[test]
    fn negative_age_is_rejected_and_state_kept() {
        let mut m = ModelConfiguration::new("n159").unwrap();
        m.set_age_index(3).unwrap();
        let err = m.set_age_index(-1).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { field: "age_index", .. }));
        assert_eq!(m.age_index(), 3);
    }

    #[test]
    fn missing_abundance_file_keeps_previous_value() {
        let existing = tempfile::NamedTempFile::new().unwrap();
        let mut m = ModelConfiguration::new("n159").unwrap();

        let err = m.set_abundance_file("/no/such/file.abn").unwrap_err();
        assert!(matches!(err, ValidationError::FileNotFound { field: "abundance", .. }));
        assert_eq!(m.abundance_file(), None);

        m.set_abundance_file(existing.path()).unwrap();
        m.set_abundance_file("/no/such/file.abn").unwrap_err();
        assert_eq!(m.abundance_file(), Some(existing.path()));

        m.clear_abundance_file();
        assert_eq!(m.abundance_file(), None);
    }

    #[test]
    fn output_path_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("runs").join("deep").join("n159.mv");
        let mut m = ModelConfiguration::new("n159").unwrap();
        m.set_output_path(&target).unwrap();
        assert!(target.parent().unwrap().is_dir());
        assert_eq!(m.output_path(), Some(target.as_path()));
    }

    #[test]
    fn disabling_dust_keeps_depletion_file() {
        let dpl = tempfile::NamedTempFile::new().unwrap();
        let mut m = ModelConfiguration::new("n159").unwrap();
        m.enable_dust(dpl.path()).unwrap();
        m.disable_dust();
        assert!(!m.dust().enabled);
        assert_eq!(m.dust().depletion_file.as_deref(), Some(dpl.path()));
    }

    #[test]
    fn rejected_dust_update_leaves_settings_untouched() {
        let mut m = ModelConfiguration::new("n159").unwrap();
        m.disable_dust();
        let before = m.dust().clone();
        let err = m
            .set_dust(DustUpdate {
                enabled: Some(true),
                pah_fraction: Some(0.5),
                ..DustUpdate::default()
            })
            .unwrap_err();
        assert!(matches!(err, ValidationError::MissingRequiredField { .. }));
        assert_eq!(m.dust(), &before);
    }

    #[test]
    fn validate_all_aggregates_stale_files() {
        let abn = tempfile::NamedTempFile::new().unwrap();
        let spec = tempfile::NamedTempFile::new().unwrap();
        let mut m = ModelConfiguration::new("n159").unwrap();
        m.set_abundance_file(abn.path())
            .unwrap()
            .set_spectrum_file(spec.path())
            .unwrap();
        m.disable_dust();
        assert!(m.validate_all().is_ok());

        let abn_path = abn.path().to_path_buf();
        abn.close().unwrap();
        spec.close().unwrap();

        let err = m.validate_all().unwrap_err();
        let failures = err.failures();
        assert_eq!(failures.len(), 2);
        assert!(failures.iter().any(|e| matches!(
            e,
            ValidationError::FileNotFound { field: "abundance", path } if *path == abn_path
        )));
        assert!(failures
            .iter()
            .any(|e| matches!(e, ValidationError::FileNotFound { field: "spectrum", .. })));
    }

    #[test]
    fn validate_all_flags_dust_without_depletion() {
        let m = ModelConfiguration::new("n159").unwrap();
        let err = m.validate_all().unwrap_err();
        assert_eq!(
            err.failures(),
            vec![&ValidationError::MissingRequiredField {
                field: "dust.depletion_file"
            }]
        );
    }

    #[test]
    fn display_names_the_model() {
        let m = ModelConfiguration::new("n159").unwrap();
        assert_eq!(m.to_string(), "MAPPINGS InputModel: n159");
    }
}
