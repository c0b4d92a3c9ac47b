//! Shared domain types.
//!
//! Selector enums carry the one-letter codes the interactive tool expects, so
//! the compiler never has to deal with free-form strings.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::ValidationError;

/// Model geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Geometry {
    #[default]
    Spherical,
    PlaneParallel,
}

impl Geometry {
    pub const ALLOWED: &'static str = "S (spherical), P (plane-parallel)";

    /// One-letter protocol code.
    pub fn code(self) -> &'static str {
        match self {
            Geometry::Spherical => "S",
            Geometry::PlaneParallel => "P",
        }
    }

    /// Prefix used in auto-generated model identifiers.
    pub fn id_prefix(self) -> &'static str {
        match self {
            Geometry::Spherical => "SPH",
            Geometry::PlaneParallel => "PP",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Geometry::Spherical => "Spherical Geometry",
            Geometry::PlaneParallel => "Plane parallel geometry",
        }
    }
}

impl FromStr for Geometry {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "s" | "spherical" => Ok(Geometry::Spherical),
            "p" | "plane-parallel" | "planeparallel" | "plane_parallel" => Ok(Geometry::PlaneParallel),
            _ => Err(ValidationError::InvalidEnumValue {
                field: "geometry",
                value: s.to_string(),
                allowed: Geometry::ALLOWED,
            }),
        }
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Grain size distribution used when dust is included.
///
/// Only MRN has a known rendering in the control protocol; the other two codes
/// are accepted by the store but rejected by the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum GrainDistribution {
    /// Mathis, Rumpl & Nordsieck.
    #[default]
    Mrn,
    /// Power law `N(a) = k a^alpha`.
    PowerLaw,
    /// Grain shattering profile.
    ShatteringProfile,
}

impl GrainDistribution {
    pub const ALLOWED: &'static str = "M (MRN), P (power law), S (grain shattering profile)";

    pub fn code(self) -> &'static str {
        match self {
            GrainDistribution::Mrn => "M",
            GrainDistribution::PowerLaw => "P",
            GrainDistribution::ShatteringProfile => "S",
        }
    }

    /// Protocol line selecting this distribution, if one is defined.
    pub fn protocol_line(self) -> Option<&'static str> {
        match self {
            GrainDistribution::Mrn => Some("M     : MRN distribution"),
            GrainDistribution::PowerLaw | GrainDistribution::ShatteringProfile => None,
        }
    }
}

impl FromStr for GrainDistribution {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "m" | "mrn" => Ok(GrainDistribution::Mrn),
            "p" | "power-law" | "powerlaw" | "power_law" => Ok(GrainDistribution::PowerLaw),
            "s" | "shattering-profile" | "shatteringprofile" | "shattering_profile" => {
                Ok(GrainDistribution::ShatteringProfile)
            }
            _ => Err(ValidationError::InvalidEnumValue {
                field: "grain_distribution",
                value: s.to_string(),
                allowed: GrainDistribution::ALLOWED,
            }),
        }
    }
}

impl fmt::Display for GrainDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A number held in its canonical fixed-precision text form.
///
/// The text is produced once, when the value is accepted, and `value()` is read
/// back from that text. Re-canonicalizing a `Fixed` therefore yields the same
/// string.
#[derive(Debug, Clone, PartialEq)]
pub struct Fixed {
    value: f64,
    text: String,
}

impl Fixed {
    pub fn new(field: &'static str, value: f64, places: usize) -> Result<Self, ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::OutOfRange {
                field,
                value: value.to_string(),
                constraint: "must be a finite number",
            });
        }
        let text = format!("{value:.places$}");
        let value = text.parse::<f64>().map_err(|_| ValidationError::TypeMismatch {
            field,
            expected: "a number",
            found: text.clone(),
        })?;
        Ok(Self { value, text })
    }

    /// Shortest round-trip text, always with a decimal point (`0.3`, `1.0`).
    pub fn shortest(field: &'static str, value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::OutOfRange {
                field,
                value: value.to_string(),
                constraint: "must be a finite number",
            });
        }
        let mut text = value.to_string();
        if !text.contains('.') {
            text.push_str(".0");
        }
        Ok(Self { value, text })
    }

    /// Build from a default whose text is already canonical.
    pub(crate) fn preset(text: &str, value: f64) -> Self {
        Self {
            value,
            text: text.to_string(),
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl Serialize for Fixed {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

/// Parse a user-supplied numeric string.
pub fn parse_number(field: &'static str, raw: &str) -> Result<f64, ValidationError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| ValidationError::TypeMismatch {
            field,
            expected: "a number",
            found: raw.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_rounds_to_requested_places() {
        let p = Fixed::new("pressure", 6.0, 2).unwrap();
        assert_eq!(p.as_str(), "6.00");
        assert_eq!(p.value(), 6.0);

        let s = Fixed::new("step_size", 0.02, 4).unwrap();
        assert_eq!(s.as_str(), "0.0200");

        let q = Fixed::new("ionization_parameter", 7.4567, 2).unwrap();
        assert_eq!(q.as_str(), "7.46");
        assert!((q.value() - 7.46).abs() < 1e-12);
    }

    #[test]
    fn fixed_is_idempotent() {
        let once = Fixed::new("luminosity", 40.126, 2).unwrap();
        let twice = Fixed::new("luminosity", once.value(), 2).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn shortest_keeps_a_decimal_point() {
        assert_eq!(Fixed::shortest("pah_fraction", 0.3).unwrap().as_str(), "0.3");
        assert_eq!(Fixed::shortest("pah_fraction", 1.0).unwrap().as_str(), "1.0");
        assert_eq!(Fixed::shortest("pah_fraction", 0.0).unwrap().as_str(), "0.0");
    }

    #[test]
    fn fixed_rejects_non_finite() {
        let err = Fixed::new("pressure", f64::NAN, 2).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { field: "pressure", .. }));
    }

    #[test]
    fn enum_codes_parse_case_insensitively() {
        assert_eq!("p".parse::<Geometry>().unwrap(), Geometry::PlaneParallel);
        assert_eq!("S".parse::<Geometry>().unwrap(), Geometry::Spherical);
        assert_eq!("m".parse::<GrainDistribution>().unwrap(), GrainDistribution::Mrn);
        assert_eq!(
            "shattering-profile".parse::<GrainDistribution>().unwrap(),
            GrainDistribution::ShatteringProfile
        );
    }

    #[test]
    fn unknown_enum_codes_are_rejected() {
        let err = "X".parse::<Geometry>().unwrap_err();
        assert!(matches!(err, ValidationError::InvalidEnumValue { field: "geometry", .. }));

        let err = "KMH".parse::<GrainDistribution>().unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidEnumValue { field: "grain_distribution", .. }
        ));
    }

    #[test]
    fn only_mrn_has_a_protocol_line() {
        assert!(GrainDistribution::Mrn.protocol_line().is_some());
        assert!(GrainDistribution::PowerLaw.protocol_line().is_none());
        assert!(GrainDistribution::ShatteringProfile.protocol_line().is_none());
    }

    #[test]
    fn parse_number_reports_type_mismatch() {
        assert_eq!(parse_number("pressure", " 6.5 ").unwrap(), 6.5);
        let err = parse_number("pressure", "high").unwrap_err();
        assert!(matches!(err, ValidationError::TypeMismatch { field: "pressure", .. }));
    }
}
