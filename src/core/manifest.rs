//! Module manifest parsing and schema.
//!
//! Every linkable package carries a module manifest next to its
//! `package.json`. Supports both `autolink.json` (canonical) and
//! `autolink.toml` (alias). The schema is closed: `name`, `platforms`,
//! `modules` and `abiSuffix` are the only keys.

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use semver::Version;
use serde::Deserialize;
use thiserror::Error;

use crate::core::{AbiVersion, Platform};

/// Canonical manifest file name.
pub const MANIFEST_NAME: &str = "autolink.json";

/// Alternative manifest file name.
pub const MANIFEST_ALIAS: &str = "autolink.toml";

static PACKAGE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(@[a-z0-9][a-z0-9._-]*/)?[A-Za-z0-9][A-Za-z0-9._-]*$")
        .expect("valid package name regex")
});

static CLASS_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*(\.[A-Za-z_$][A-Za-z0-9_$]*)*$")
        .expect("valid class name regex")
});

/// Errors while locating, reading or validating a module manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("both autolink.json and autolink.toml exist in `{}`", dir.display())]
    Ambiguous { dir: PathBuf },

    #[error("invalid JSON in `{}`: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid TOML in `{}`: {source}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid manifest `{}`: {message}", path.display())]
    Invalid { path: PathBuf, message: String },
}

impl ManifestError {
    /// Whether the error came from the filesystem rather than the content.
    pub fn is_io(&self) -> bool {
        matches!(self, ManifestError::Io { .. })
    }

    fn invalid(path: &Path, message: impl Into<String>) -> Self {
        ManifestError::Invalid {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }
}

/// Find the manifest file in a package directory.
///
/// Returns an error if both manifest files exist (ambiguous) and `None` if
/// the directory holds neither.
pub fn find_manifest(dir: &Path) -> Result<Option<PathBuf>, ManifestError> {
    let canonical = dir.join(MANIFEST_NAME);
    let alias = dir.join(MANIFEST_ALIAS);

    let present = |p: &Path| p.exists() && !p.is_dir();
    match (present(&canonical), present(&alias)) {
        (true, true) => Err(ManifestError::Ambiguous {
            dir: dir.to_path_buf(),
        }),
        (true, false) => Ok(Some(canonical)),
        (false, true) => Ok(Some(alias)),
        (false, false) => Ok(None),
    }
}

/// Raw manifest as deserialized from JSON or TOML.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct RawManifest {
    name: String,

    platforms: Vec<Platform>,

    #[serde(default)]
    modules: BTreeMap<String, Vec<String>>,

    #[serde(default)]
    abi_suffix: Option<String>,
}

/// A validated module manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleManifest {
    /// Package name as declared (may carry an ABI tag)
    pub name: String,

    /// Platforms the package supports, in canonical order
    pub platforms: Vec<Platform>,

    /// Exported module classes per platform, in declaration order
    pub modules: BTreeMap<Platform, Vec<String>>,

    /// Explicit ABI suffix
    pub abi_suffix: Option<AbiVersion>,

    /// Path of the manifest file
    pub path: PathBuf,
}

impl ModuleManifest {
    /// Load a manifest from a file path.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&content, path)
    }

    /// Parse manifest content. The format is chosen by the file extension.
    pub fn parse(content: &str, path: &Path) -> Result<Self, ManifestError> {
        let is_toml = path.extension().is_some_and(|ext| ext == "toml");

        let raw: RawManifest = if is_toml {
            toml::from_str(content).map_err(|source| ManifestError::Toml {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            serde_json::from_str(content).map_err(|source| ManifestError::Json {
                path: path.to_path_buf(),
                source,
            })?
        };

        Self::validate(raw, path)
    }

    fn validate(raw: RawManifest, path: &Path) -> Result<Self, ManifestError> {
        let name = raw.name.trim().to_string();
        if name.is_empty() {
            return Err(ManifestError::invalid(path, "`name` must not be empty"));
        }
        if !PACKAGE_NAME.is_match(&name) {
            return Err(ManifestError::invalid(
                path,
                format!("`{}` is not a valid package name", name),
            ));
        }

        if raw.platforms.is_empty() {
            return Err(ManifestError::invalid(
                path,
                "`platforms` must list at least one platform",
            ));
        }
        let mut seen = BTreeSet::new();
        for platform in &raw.platforms {
            if !seen.insert(*platform) {
                return Err(ManifestError::invalid(
                    path,
                    format!("platform `{}` is listed more than once", platform),
                ));
            }
        }
        let platforms: Vec<Platform> = seen.into_iter().collect();

        let mut modules = BTreeMap::new();
        for (key, classes) in raw.modules {
            let platform: Platform = key
                .parse()
                .map_err(|e: String| ManifestError::invalid(path, e))?;
            if !platforms.contains(&platform) {
                return Err(ManifestError::invalid(
                    path,
                    format!(
                        "`modules` has entries for `{}` which is not in `platforms`",
                        platform
                    ),
                ));
            }

            if modules.contains_key(&platform) {
                return Err(ManifestError::invalid(
                    path,
                    format!("`modules` lists `{}` more than once", platform),
                ));
            }

            let mut unique = BTreeSet::new();
            for class in &classes {
                if !CLASS_NAME.is_match(class) {
                    return Err(ManifestError::invalid(
                        path,
                        format!("`{}` is not a valid class name", class),
                    ));
                }
                if !unique.insert(class.as_str()) {
                    return Err(ManifestError::invalid(
                        path,
                        format!("class `{}` is exported twice for `{}`", class, platform),
                    ));
                }
            }
            modules.insert(platform, classes);
        }

        let abi_suffix = match raw.abi_suffix {
            Some(s) => Some(
                s.parse::<AbiVersion>()
                    .map_err(|e| ManifestError::invalid(path, e))?,
            ),
            None => None,
        };

        Ok(ModuleManifest {
            name,
            platforms,
            modules,
            abi_suffix,
            path: path.to_path_buf(),
        })
    }

    /// Exported classes for a platform, empty if none are declared.
    pub fn classes(&self, platform: Platform) -> &[String] {
        self.modules
            .get(&platform)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Read the package version from the sibling `package.json`.
///
/// A missing file or a missing `version` field yields `0.0.0`.
pub fn read_package_version(dir: &Path) -> Result<Version, ManifestError> {
    let path = dir.join("package.json");
    if !path.is_file() {
        return Ok(Version::new(0, 0, 0));
    }

    let content = std::fs::read_to_string(&path).map_err(|source| ManifestError::Io {
        path: path.clone(),
        source,
    })?;
    let value: serde_json::Value =
        serde_json::from_str(&content).map_err(|source| ManifestError::Json {
            path: path.clone(),
            source,
        })?;

    match value.get("version").and_then(|v| v.as_str()) {
        Some(version) => version.parse().map_err(|e| {
            ManifestError::invalid(&path, format!("invalid version `{}`: {}", version, e))
        }),
        None => Ok(Version::new(0, 0, 0)),
    }
}
