//! Global context for autolink operations.
//!
//! Provides centralized access to the search root and the merged
//! configuration for one invocation. Nothing here is process-wide; every
//! operation receives the context explicitly.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::util::config::{self, Config};

/// Context for a single autolink invocation.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Search root (canonical)
    root: PathBuf,

    /// Merged configuration
    config: Config,
}

impl GlobalContext {
    /// Create a context for `root` (or the current directory), loading the
    /// global and project configuration and applying environment overrides.
    pub fn new(root: Option<&Path>) -> Result<Self> {
        let root = match root {
            Some(root) => root.to_path_buf(),
            None => std::env::current_dir().context("failed to get current directory")?,
        };

        if !root.is_dir() {
            bail!("search root `{}` is not a directory", root.display());
        }
        let root = root
            .canonicalize()
            .with_context(|| format!("failed to resolve search root: {}", root.display()))?;

        let global = config::global_config_path();
        let mut config = config::load_config(global.as_deref(), &config::project_config_path(&root));
        config.apply_env();

        Ok(GlobalContext { root, config })
    }

    /// Create a context with an explicit configuration (no files or env read).
    pub fn with_config(root: impl Into<PathBuf>, config: Config) -> Self {
        GlobalContext {
            root: root.into(),
            config,
        }
    }

    /// Get the search root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the merged configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Resolve an artifact path against the search root.
    pub fn output_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_context_reads_project_config() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join(".autolink")).unwrap();
        std::fs::write(
            tmp.path().join(".autolink/config.toml"),
            "[scan]\nmax-depth = 2\n",
        )
        .unwrap();

        let ctx = GlobalContext::new(Some(tmp.path())).unwrap();
        assert_eq!(ctx.config().scan.max_depth(), 2);
        assert_eq!(ctx.root(), tmp.path().canonicalize().unwrap());
    }

    #[test]
    fn test_context_rejects_missing_root() {
        let tmp = TempDir::new().unwrap();
        let err = GlobalContext::new(Some(&tmp.path().join("missing"))).unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }

    #[test]
    fn test_output_path() {
        let ctx = GlobalContext::with_config("/repo", Config::default());
        assert_eq!(
            ctx.output_path(Path::new("gen/modules.json")),
            PathBuf::from("/repo/gen/modules.json")
        );
        assert_eq!(
            ctx.output_path(Path::new("/abs/modules.json")),
            PathBuf::from("/abs/modules.json")
        );
    }
}
