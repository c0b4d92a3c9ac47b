//! Error taxonomy.
//!
//! Typed errors are raised where they happen (setters, compiler, emitter,
//! runner). The binary only ever sees `AppError`, which carries the process
//! exit code alongside the message.

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::GrainDistribution;

/// A rejected mutation of the parameter store.
///
/// Setters return this before touching any state, so the previous value is
/// still in place when the caller sees it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{field} is required")]
    MissingRequiredField { field: &'static str },
    #[error("{field} must be {expected}, got '{found}'")]
    TypeMismatch {
        field: &'static str,
        expected: &'static str,
        found: String,
    },
    #[error("{field} is out of range: {value} ({constraint})")]
    OutOfRange {
        field: &'static str,
        value: String,
        constraint: &'static str,
    },
    #[error("{field} must be one of {allowed}, got '{value}'")]
    InvalidEnumValue {
        field: &'static str,
        value: String,
        allowed: &'static str,
    },
    #[error("{field} file not found: {}", .path.display())]
    FileNotFound { field: &'static str, path: PathBuf },
    #[error("cannot create directory for {field} '{}': {reason}", .path.display())]
    DirectoryNotCreatable {
        field: &'static str,
        path: PathBuf,
        reason: String,
    },
    #[error("parameter validation failed:\n{}", join_lines(.0))]
    Aggregate(Vec<ValidationError>),
}

impl ValidationError {
    /// Flatten into the individual failures (an aggregate yields its members).
    pub fn failures(&self) -> Vec<&ValidationError> {
        match self {
            ValidationError::Aggregate(all) => all.iter().flat_map(|e| e.failures()).collect(),
            other => vec![other],
        }
    }
}

fn join_lines(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Failure to render a control script.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("cannot compile script: {0}")]
    Validation(#[from] ValidationError),
    #[error("grain distribution {0:?} has no defined protocol rendering (only MRN is supported)")]
    UnrenderableGrainDistribution(GrainDistribution),
}

/// Failure to compile or persist a control script.
#[derive(Error, Debug)]
pub enum ScriptError {
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error("failed to write input file '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure of the external-process collaborator.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("MAPPINGS executable not found: {}", .0.display())]
    ExecutableNotFound(PathBuf),
    #[error("input file not found: {}", .0.display())]
    InputNotFound(PathBuf),
    #[error("error running MAPPINGS: {0}")]
    Io(#[from] std::io::Error),
    #[error("MAPPINGS did not finish within {0:?}; the process was killed")]
    Timeout(std::time::Duration),
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::new(2, err.to_string())
    }
}

impl From<CompileError> for AppError {
    fn from(err: CompileError) -> Self {
        AppError::new(3, err.to_string())
    }
}

impl From<ScriptError> for AppError {
    fn from(err: ScriptError) -> Self {
        match err {
            ScriptError::Compile(e) => e.into(),
            ScriptError::Io { .. } => AppError::new(4, err.to_string()),
        }
    }
}

impl From<RunError> for AppError {
    fn from(err: RunError) -> Self {
        AppError::new(5, err.to_string())
    }
}
