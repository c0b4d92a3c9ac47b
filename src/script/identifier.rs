//! Model identifiers.
//!
//! The identifier ends up in the names of the tool's own output files, so the
//! derived form depends only on the parameters that distinguish runs of the
//! same named model.

use crate::error::{CompileError, ValidationError};
use crate::params::ModelConfiguration;

/// `<SPH|PP>_<name>_Q<logq digits>_Pk<pressure>_t<age>`, e.g. `SPH_n159_Q800_Pk6.00_t9`.
pub fn derive_identifier(config: &ModelConfiguration) -> String {
    format!(
        "{}_{}_Q{}_Pk{}_t{}",
        config.geometry().id_prefix(),
        config.name(),
        config.log_ionization().as_str().replace('.', ""),
        config.log_pressure(),
        config.age_index()
    )
}

/// Check a caller-supplied identifier fits on one protocol line.
pub fn check_identifier(id: &str) -> Result<(), CompileError> {
    if id.trim().is_empty() {
        return Err(ValidationError::MissingRequiredField { field: "id_string" }.into());
    }
    if id.contains(&['\n', '\r'][..]) {
        return Err(ValidationError::OutOfRange {
            field: "id_string",
            value: id.escape_debug().to_string(),
            constraint: "must be a single line",
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Geometry;

    fn base() -> ModelConfiguration {
        ModelConfiguration::new("n159").unwrap()
    }

    #[test]
    fn default_identifier() {
        assert_eq!(derive_identifier(&base()), "SPH_n159_Q800_Pk6.00_t9");
    }

    #[test]
    fn identifier_is_stable() {
        let a = base();
        let b = base();
        assert_eq!(derive_identifier(&a), derive_identifier(&b));
        assert_eq!(derive_identifier(&a), derive_identifier(&a));
    }

    #[test]
    fn each_distinguishing_parameter_changes_the_identifier() {
        let reference = derive_identifier(&base());

        let mut m = base();
        m.set_geometry(Geometry::PlaneParallel);
        assert_ne!(derive_identifier(&m), reference);

        let mut m = base();
        m.set_log_ionization(7.5).unwrap();
        assert_eq!(derive_identifier(&m), "SPH_n159_Q750_Pk6.00_t9");

        let mut m = base();
        m.set_log_pressure(6.5).unwrap();
        assert_eq!(derive_identifier(&m), "SPH_n159_Q800_Pk6.50_t9");

        let mut m = base();
        m.set_age_index(3).unwrap();
        assert_eq!(derive_identifier(&m), "SPH_n159_Q800_Pk6.00_t3");
    }

    #[test]
    fn multi_line_identifiers_are_rejected() {
        assert!(check_identifier("run_01").is_ok());
        assert!(matches!(
            check_identifier("  "),
            Err(CompileError::Validation(ValidationError::MissingRequiredField { .. }))
        ));
        assert!(matches!(
            check_identifier("a\nb"),
            Err(CompileError::Validation(ValidationError::OutOfRange { .. }))
        ));
    }
}
