//! Control-script compiler.
//!
//! Renders a `ModelConfiguration` into the exact sequence of lines the
//! interactive MAPPINGS executable expects on stdin. The line order is the
//! protocol (see `stages::STAGES`); numeric formatting has already happened in
//! the parameter store, so this module only selects branches and concatenates.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{CompileError, ScriptError};
use crate::params::ModelConfiguration;

pub mod identifier;
pub mod stages;

pub use identifier::{check_identifier, derive_identifier};
pub use stages::{DEFAULT_SPECTRUM, Line, RenderContext};

/// A compiled control script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    id: String,
    lines: Vec<Line>,
}

impl Script {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Newline-terminated script text.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(line.text());
            out.push('\n');
        }
        out
    }

    /// Write the script to `path` (all-or-nothing), creating parent directories.
    pub fn emit(&self, path: &Path) -> Result<PathBuf, ScriptError> {
        crate::io::write_script(path, &self.text())
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

/// Compiles one configuration, optionally with a caller-supplied identifier.
pub struct ScriptCompiler<'a> {
    config: &'a ModelConfiguration,
    id: Option<String>,
}

impl<'a> ScriptCompiler<'a> {
    pub fn new(config: &'a ModelConfiguration) -> Self {
        Self { config, id: None }
    }

    /// Use `id` instead of the derived identifier.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn identifier(&self) -> String {
        self.id
            .clone()
            .unwrap_or_else(|| derive_identifier(self.config))
    }

    /// Render the script. Pure: no filesystem access, same output for the same state.
    pub fn compile(&self) -> Result<Script, CompileError> {
        let id = self.identifier();
        check_identifier(&id)?;

        let ctx = RenderContext {
            config: self.config,
            id: &id,
        };
        let mut lines = Vec::new();
        for (name, stage) in stages::STAGES {
            let produced = stage(&ctx)?;
            tracing::trace!(stage = *name, lines = produced.len(), "rendered stage");
            lines.extend(produced);
        }

        Ok(Script { id, lines })
    }

    /// Compile and return the script text.
    pub fn render(&self) -> Result<String, CompileError> {
        Ok(self.compile()?.text())
    }

    /// Compile and write to `path`. Nothing is written if compilation fails.
    pub fn emit(&self, path: &Path) -> Result<PathBuf, ScriptError> {
        let script = self.compile()?;
        script.emit(path)
    }
}
