//! Atomic, incremental artifact writes.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};
use crate::util::fs::write_atomic;

/// Outcome of writing an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    /// The destination was created or replaced.
    Written,
    /// The destination already held identical content and was not touched.
    Unchanged,
}

/// The artifact could not be written.
#[derive(Debug, Error)]
#[error("failed to write `{}`", path.display())]
pub struct WriteError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

impl WriteError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(format!("failed to write {}", self.path.display()))
            .with_code("autolink::write")
            .with_context(self.source.to_string())
            .with_suggestion(suggestions::CHECK_OUTPUT)
    }
}

/// Write `contents` to `path` unless it already holds exactly those bytes.
///
/// The replacement is atomic: the destination is either the previous file or
/// the complete new one.
pub fn write_artifact(path: &Path, contents: &str) -> Result<WriteStatus, WriteError> {
    match fs::read(path) {
        Ok(existing) if existing == contents.as_bytes() => {
            tracing::debug!("{} is up to date", path.display());
            return Ok(WriteStatus::Unchanged);
        }
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => {
            // Unreadable destination; try to replace it anyway.
            tracing::debug!("cannot read existing {}: {}", path.display(), e);
        }
    }

    write_atomic(path, contents.as_bytes()).map_err(|source| WriteError {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!("wrote {} ({} bytes)", path.display(), contents.len());
    Ok(WriteStatus::Written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_then_unchanged() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("generated/autolink-modules.json");

        assert_eq!(write_artifact(&path, "{}\n").unwrap(), WriteStatus::Written);
        let modified = fs::metadata(&path).unwrap().modified().unwrap();

        assert_eq!(write_artifact(&path, "{}\n").unwrap(), WriteStatus::Unchanged);
        assert_eq!(fs::metadata(&path).unwrap().modified().unwrap(), modified);

        assert_eq!(write_artifact(&path, "[]\n").unwrap(), WriteStatus::Written);
        assert_eq!(fs::read_to_string(&path).unwrap(), "[]\n");
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out.kt");
        write_artifact(&path, "object A\n").unwrap();
        write_artifact(&path, "object B\n").unwrap();

        let names: Vec<_> = fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["out.kt".to_string()]);
    }

    #[test]
    fn test_write_failure_is_reported() {
        let tmp = TempDir::new().unwrap();
        // A regular file where a directory is needed.
        std::fs::write(tmp.path().join("blocked"), "").unwrap();
        let path = tmp.path().join("blocked/out.json");

        let err = write_artifact(&path, "{}").unwrap_err();
        assert_eq!(err.path, path);
        let output = err.to_diagnostic().format(false);
        assert!(output.contains("failed to write"));
        assert!(output.contains("writable"));
    }
}
