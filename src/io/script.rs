//! Control-script files.
//!
//! Scripts are written to a temporary file in the destination directory and
//! renamed over the target, so readers see either the old file or the complete
//! new one.

use std::fs::create_dir_all;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::ScriptError;

/// Write `text` to `path`, creating parent directories as needed.
pub fn write_script(path: &Path, text: &str) -> Result<PathBuf, ScriptError> {
    let io_err = |source: std::io::Error| ScriptError::Io {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    create_dir_all(parent).map_err(io_err)?;

    let mut staged = NamedTempFile::new_in(parent).map_err(io_err)?;
    staged.write_all(text.as_bytes()).map_err(io_err)?;
    staged.flush().map_err(io_err)?;
    staged.persist(path).map_err(|e| io_err(e.error))?;

    tracing::info!(path = %path.display(), "input file written");
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("a").join("b").join("m.mv");
        write_script(&target, "X   : end model\n").unwrap();
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "X   : end model\n");
    }

    #[test]
    fn replaces_existing_file_whole() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("m.mv");
        std::fs::write(&target, "old contents that are much longer than the new ones\n").unwrap();
        write_script(&target, "new\n").unwrap();
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "new\n");
    }

    #[test]
    fn unwritable_destination_reports_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        std::fs::write(&blocker, "").unwrap();
        let target = blocker.join("m.mv");

        let err = write_script(&target, "x\n").unwrap_err();
        match err {
            ScriptError::Io { path, .. } => assert_eq!(path, target),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn no_staging_files_are_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("m.mv");
        write_script(&target, "x\n").unwrap();
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}
