//! Access to what a MAPPINGS run produced.
//!
//! Parsing the tool's output formats is not implemented; this module only
//! finds the artifacts that belong to a run. MAPPINGS embeds the model
//! identifier in the names of the files it writes, which is what the locator
//! keys on.

use std::fs;
use std::path::PathBuf;

use crate::error::AppError;

/// Artifacts belonging to one model identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelOutputs {
    pub id: String,
    pub artifacts: Vec<PathBuf>,
}

impl ModelOutputs {
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

/// Something that can turn a model identifier into that model's outputs.
pub trait ResultReader {
    fn load(&self, id: &str) -> Result<ModelOutputs, AppError>;
}

/// Finds files in a directory whose names carry the model identifier as a
/// whole token.
#[derive(Debug, Clone)]
pub struct OutputLocator {
    dir: PathBuf,
}

impl OutputLocator {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ResultReader for OutputLocator {
    fn load(&self, id: &str) -> Result<ModelOutputs, AppError> {
        let entries = fs::read_dir(&self.dir).map_err(|e| {
            AppError::new(4, format!("Failed to read output directory '{}': {e}", self.dir.display()))
        })?;

        let mut artifacts = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| AppError::new(4, format!("Failed to list outputs: {e}")))?;
            let path = entry.path();
            let matches = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| names_model(n, id));
            if matches && path.is_file() {
                artifacts.push(path);
            }
        }
        artifacts.sort();

        Ok(ModelOutputs {
            id: id.to_string(),
            artifacts,
        })
    }
}

fn is_separator(c: char) -> bool {
    matches!(c, '.' | '_' | '-')
}

/// `id` appears in `file_name` as a whole token: bounded by the ends of the
/// name or by `.`, `_` or `-`. `..._t9` must not claim `..._t90`.
fn names_model(file_name: &str, id: &str) -> bool {
    if id.is_empty() {
        return false;
    }
    file_name.match_indices(id).any(|(start, _)| {
        let before = file_name[..start].chars().next_back();
        let after = file_name[start + id.len()..].chars().next();
        before.is_none_or(is_separator) && after.is_none_or(is_separator)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_only_files_carrying_the_identifier() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "spec_SPH_n159_Q800_Pk6.00_t9.csv",
            "lines_SPH_n159_Q800_Pk6.00_t9.txt",
            "lines_SPH_n159_Q750_Pk6.00_t9.txt",
            "n159.mv",
        ] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        fs::create_dir(dir.path().join("SPH_n159_Q800_Pk6.00_t9_dir")).unwrap();

        let outputs = OutputLocator::new(dir.path()).load("SPH_n159_Q800_Pk6.00_t9").unwrap();
        let names: Vec<String> = outputs
            .artifacts
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec!["lines_SPH_n159_Q800_Pk6.00_t9.txt", "spec_SPH_n159_Q800_Pk6.00_t9.csv"]
        );
    }

    #[test]
    fn identifier_must_match_a_whole_token() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "spec_SPH_n159_Q800_Pk6.00_t9.csv",
            "spec_SPH_n159_Q800_Pk6.00_t90.csv",
            "lines_SPH_n159_Q800_Pk6.00_t95_run.txt",
            "SPH_n159_Q800_Pk6.00_t9",
        ] {
            fs::write(dir.path().join(name), "").unwrap();
        }

        let outputs = OutputLocator::new(dir.path()).load("SPH_n159_Q800_Pk6.00_t9").unwrap();
        let names: Vec<String> = outputs
            .artifacts
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["SPH_n159_Q800_Pk6.00_t9", "spec_SPH_n159_Q800_Pk6.00_t9.csv"]);
    }

    #[test]
    fn token_boundaries() {
        assert!(names_model("a_run1.csv", "run1"));
        assert!(names_model("run1", "run1"));
        assert!(!names_model("xrun1.csv", "run1"));
        assert!(!names_model("run10.csv", "run1"));
        assert!(!names_model("anything", ""));
    }

    #[test]
    fn missing_directory_is_an_error() {
        let err = OutputLocator::new("/no/such/lab").load("x").unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn no_matches_is_empty_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let outputs = OutputLocator::new(dir.path()).load("SPH_x").unwrap();
        assert!(outputs.is_empty());
    }
}
