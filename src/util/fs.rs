//! Filesystem utilities.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use glob::Pattern;
use tempfile::NamedTempFile;

/// Write bytes to `path` atomically.
///
/// The content goes to a temporary file in the destination directory which
/// is renamed over `path` once fully written and synced. Readers see either
/// the old file or the new one, never a partial write.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;

    // Temp files are created owner-only.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(fs::Permissions::from_mode(0o644))?;
    }

    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Get the relative path from `base` to `path`.
pub fn relative_path(base: &Path, path: &Path) -> PathBuf {
    pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf())
}

/// Relative path from `base` to `path` with `/` separators on every host.
pub fn portable_relative(base: &Path, path: &Path) -> String {
    let rel = relative_path(base, path);
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

/// Compile glob patterns, skipping (and logging) invalid ones.
pub fn compile_patterns(patterns: &[String]) -> Vec<Pattern> {
    patterns
        .iter()
        .filter_map(|p| match Pattern::new(p) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                tracing::warn!("ignoring invalid exclude pattern `{}`: {}", p, e);
                None
            }
        })
        .collect()
}

/// Check whether a root-relative path matches any pattern.
pub fn matches_any(relative: &Path, patterns: &[Pattern]) -> bool {
    patterns.iter().any(|p| p.matches_path(relative))
}

/// Create a symlink (platform-aware).
#[cfg(unix)]
pub fn symlink(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

#[cfg(windows)]
pub fn symlink(src: &Path, dst: &Path) -> io::Result<()> {
    if src.is_dir() {
        std::os::windows::fs::symlink_dir(src, dst)
    } else {
        std::os::windows::fs::symlink_file(src, dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_atomic_replaces_content() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out").join("modules.json");

        write_atomic(&path, b"first").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "first");

        write_atomic(&path, b"second").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");

        // No temporary files are left next to the artifact.
        let entries: Vec<_> = fs::read_dir(path.parent().unwrap()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_portable_relative() {
        let base = Path::new("/repo");
        assert_eq!(
            portable_relative(base, Path::new("/repo/packages/camera")),
            "packages/camera"
        );
        assert_eq!(portable_relative(base, Path::new("/repo")), ".");
    }

    #[test]
    fn test_matches_any() {
        let patterns = compile_patterns(&["vendor/**".to_string(), "[".to_string()]);
        assert_eq!(patterns.len(), 1);
        assert!(matches_any(Path::new("vendor/camera"), &patterns));
        assert!(!matches_any(Path::new("packages/camera"), &patterns));
    }
}
