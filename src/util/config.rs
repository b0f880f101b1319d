//! Configuration file support.
//!
//! Two configuration file locations are read:
//! - Global: `~/.autolink/config.toml` - User-wide defaults
//! - Project: `<root>/.autolink/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config. Environment
//! variables and command-line flags are applied on top by the caller.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::Platform;
use crate::generator::OutputFormat;

/// Enables precompiled framework detection when set to `1`.
pub const ENV_USE_PRECOMPILED: &str = "AUTOLINK_USE_PRECOMPILED";

/// Overrides the precompiled build flavor.
pub const ENV_PRECOMPILED_FLAVOR: &str = "AUTOLINK_PRECOMPILED_FLAVOR";

/// Default directory depth searched below the root.
pub const DEFAULT_MAX_DEPTH: usize = 6;

/// Default per-package load timeout.
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

/// Default precompiled build flavor.
pub const DEFAULT_FLAVOR: &str = "debug";

/// Autolink configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Scanner settings
    pub scan: ScanConfig,

    /// Resolver settings
    pub resolve: ResolveConfig,

    /// Generator settings
    pub generate: GenerateConfig,

    /// Precompiled framework settings
    pub precompiled: PrecompiledConfig,
}

/// Scanner configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ScanConfig {
    /// Maximum directory depth below the search root
    pub max_depth: Option<usize>,

    /// Per-package load timeout in milliseconds
    pub timeout_ms: Option<u64>,

    /// Glob patterns (relative to the root) that are not descended into
    pub exclude: Vec<String>,

    /// Number of parallel scan workers
    pub jobs: Option<usize>,
}

impl ScanConfig {
    pub fn max_depth(&self) -> usize {
        self.max_depth.unwrap_or(DEFAULT_MAX_DEPTH)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS))
    }
}

/// Resolver configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveConfig {
    /// Logical module names each platform requires, keyed by platform name
    pub required: BTreeMap<String, Vec<String>>,
}

impl ResolveConfig {
    /// Required module names for a platform.
    pub fn required_for(&self, platform: Platform) -> Vec<String> {
        self.required
            .iter()
            .filter(|(key, _)| key.parse::<Platform>().ok() == Some(platform))
            .flat_map(|(_, names)| names.iter().cloned())
            .collect()
    }
}

/// Generator configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct GenerateConfig {
    /// Artifact format
    pub format: Option<OutputFormat>,

    /// Artifact path, relative to the search root
    pub output: Option<PathBuf>,

    /// Package declaration for the generated Kotlin source
    pub kotlin_package: Option<String>,
}

/// Precompiled framework configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PrecompiledConfig {
    /// Detect prebuilt iOS frameworks
    pub enabled: Option<bool>,

    /// Build flavor directory under `.xcframeworks/` (debug, release)
    pub flavor: Option<String>,
}

impl PrecompiledConfig {
    pub fn enabled(&self) -> bool {
        self.enabled.unwrap_or(false)
    }

    pub fn flavor(&self) -> &str {
        self.flavor.as_deref().unwrap_or(DEFAULT_FLAVOR)
    }
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if the file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        // Scan settings
        if other.scan.max_depth.is_some() {
            self.scan.max_depth = other.scan.max_depth;
        }
        if other.scan.timeout_ms.is_some() {
            self.scan.timeout_ms = other.scan.timeout_ms;
        }
        if other.scan.jobs.is_some() {
            self.scan.jobs = other.scan.jobs;
        }
        self.scan.exclude.extend(other.scan.exclude);

        // Required modules accumulate per platform
        for (platform, names) in other.resolve.required {
            let entry = self.resolve.required.entry(platform).or_default();
            for name in names {
                if !entry.contains(&name) {
                    entry.push(name);
                }
            }
        }

        // Generate settings
        if other.generate.format.is_some() {
            self.generate.format = other.generate.format;
        }
        if other.generate.output.is_some() {
            self.generate.output = other.generate.output;
        }
        if other.generate.kotlin_package.is_some() {
            self.generate.kotlin_package = other.generate.kotlin_package;
        }

        // Precompiled settings
        if other.precompiled.enabled.is_some() {
            self.precompiled.enabled = other.precompiled.enabled;
        }
        if other.precompiled.flavor.is_some() {
            self.precompiled.flavor = other.precompiled.flavor;
        }
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(value) = lookup(ENV_USE_PRECOMPILED) {
            self.precompiled.enabled = Some(value == "1");
        }
        if let Some(flavor) = lookup(ENV_PRECOMPILED_FLAVOR) {
            if !flavor.is_empty() {
                self.precompiled.flavor = Some(flavor);
            }
        }
    }
}

/// Get the global config directory (~/.autolink).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".autolink"))
}

/// Get the global config path (~/.autolink/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (<root>/.autolink/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".autolink").join("config.toml")
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.autolink/config.toml)
/// 2. Global config (~/.autolink/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        if global_path.exists() {
            config.merge(Config::load_or_default(global_path));
        }
    }

    if project_path.exists() {
        config.merge(Config::load_or_default(project_path));
    }

    config
}
