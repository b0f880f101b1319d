//! Test fixtures for common test scenarios.
//!
//! This module provides builders that lay out module packages on a real
//! filesystem, for scanner and end-to-end pipeline tests.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::core::{Platform, MANIFEST_ALIAS, MANIFEST_NAME};

/// Fixture for a single module package directory.
#[derive(Debug, Clone)]
pub struct PackageFixture {
    /// Package name as written to the manifest.
    pub name: String,
    /// Declared platforms.
    pub platforms: Vec<Platform>,
    /// Exported classes per platform.
    pub modules: BTreeMap<Platform, Vec<String>>,
    /// Explicit ABI suffix.
    pub abi_suffix: Option<String>,
    /// Version written to `package.json`, if any.
    pub version: Option<String>,
    /// Write `autolink.toml` instead of `autolink.json`.
    pub toml: bool,
    /// Verbatim manifest content, bypassing the builder fields.
    pub raw: Option<String>,
}

impl PackageFixture {
    /// A package supporting both platforms with no exports.
    pub fn new(name: impl Into<String>) -> Self {
        PackageFixture {
            name: name.into(),
            platforms: Platform::ALL.to_vec(),
            modules: BTreeMap::new(),
            abi_suffix: None,
            version: None,
            toml: false,
            raw: None,
        }
    }

    /// A package whose manifest is exactly `content`.
    pub fn raw(content: impl Into<String>) -> Self {
        let mut fixture = Self::new("raw");
        fixture.raw = Some(content.into());
        fixture
    }

    pub fn platforms(mut self, platforms: impl IntoIterator<Item = Platform>) -> Self {
        self.platforms = platforms.into_iter().collect();
        self
    }

    pub fn android(self, classes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.classes(Platform::Android, classes)
    }

    pub fn ios(self, classes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.classes(Platform::Ios, classes)
    }

    /// Set the exported classes for a platform, declaring it if needed.
    pub fn classes(
        mut self,
        platform: Platform,
        classes: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        if !self.platforms.contains(&platform) {
            self.platforms.push(platform);
        }
        self.modules
            .insert(platform, classes.into_iter().map(Into::into).collect());
        self
    }

    pub fn abi_suffix(mut self, abi: impl Into<String>) -> Self {
        self.abi_suffix = Some(abi.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Write the manifest as TOML.
    pub fn toml(mut self) -> Self {
        self.toml = true;
        self
    }

    /// Manifest file name this fixture writes.
    pub fn manifest_name(&self) -> &'static str {
        if self.toml {
            MANIFEST_ALIAS
        } else {
            MANIFEST_NAME
        }
    }

    /// Render the manifest content.
    pub fn manifest(&self) -> String {
        if let Some(raw) = &self.raw {
            return raw.clone();
        }
        if self.toml {
            self.manifest_toml()
        } else {
            self.manifest_json()
        }
    }

    fn manifest_json(&self) -> String {
        let modules: BTreeMap<&str, &Vec<String>> = self
            .modules
            .iter()
            .map(|(platform, classes)| (platform.as_str(), classes))
            .collect();
        let mut value = serde_json::json!({
            "name": self.name,
            "platforms": self.platforms,
            "modules": modules,
        });
        if let Some(abi) = &self.abi_suffix {
            value["abiSuffix"] = serde_json::Value::String(abi.clone());
        }
        serde_json::to_string_pretty(&value).expect("fixture manifest serializes")
    }

    fn manifest_toml(&self) -> String {
        let quoted = |items: &[String]| {
            items
                .iter()
                .map(|s| format!("{:?}", s))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let platforms: Vec<String> = self.platforms.iter().map(|p| p.to_string()).collect();

        let mut out = format!("name = {:?}\nplatforms = [{}]\n", self.name, quoted(&platforms));
        if let Some(abi) = &self.abi_suffix {
            out.push_str(&format!("abiSuffix = {:?}\n", abi));
        }
        if !self.modules.is_empty() {
            out.push_str("\n[modules]\n");
            for (platform, classes) in &self.modules {
                out.push_str(&format!("{} = [{}]\n", platform, quoted(classes)));
            }
        }
        out
    }

    /// Write this fixture into `dir`, creating it. Panics on I/O errors.
    pub fn write_to(&self, dir: &Path) -> PathBuf {
        std::fs::create_dir_all(dir).expect("create fixture dir");
        std::fs::write(dir.join(self.manifest_name()), self.manifest())
            .expect("write fixture manifest");

        if let Some(version) = &self.version {
            let package_json = serde_json::json!({
                "name": self.name,
                "version": version,
            });
            std::fs::write(dir.join("package.json"), package_json.to_string())
                .expect("write fixture package.json");
        }

        dir.to_path_buf()
    }
}

/// A multi-package project on disk.
///
/// Mirrors a typical app layout: regular packages under `node_modules/`
/// and versioned copies under `versioned/<abi>/`.
pub struct ProjectFixture {
    root: tempfile::TempDir,
}

impl ProjectFixture {
    pub fn new() -> Self {
        ProjectFixture {
            root: tempfile::TempDir::new().expect("create fixture root"),
        }
    }

    /// Canonical project root.
    pub fn root(&self) -> PathBuf {
        self.root.path().canonicalize().expect("canonical fixture root")
    }

    /// Add a package under `node_modules/<dir>`.
    pub fn package(&self, dir: &str, fixture: PackageFixture) -> PathBuf {
        fixture.write_to(&self.root().join("node_modules").join(dir))
    }

    /// Add a versioned package copy under `versioned/<abi>/<dir>`.
    pub fn versioned(&self, abi: &str, dir: &str, fixture: PackageFixture) -> PathBuf {
        fixture.write_to(&self.root().join("versioned").join(abi).join(dir))
    }
}

impl Default for ProjectFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ModuleManifest;
    use tempfile::TempDir;

    #[test]
    fn test_fixture_json_and_toml_agree() {
        let fixture = PackageFixture::new("camera")
            .android(["expo.modules.camera.CameraModule"])
            .abi_suffix("abi46_0_0");

        let tmp = TempDir::new().unwrap();
        let json_dir = fixture.clone().write_to(&tmp.path().join("json"));
        let toml_dir = fixture.toml().write_to(&tmp.path().join("toml"));

        let json = ModuleManifest::load(&json_dir.join(MANIFEST_NAME)).unwrap();
        let toml = ModuleManifest::load(&toml_dir.join(MANIFEST_ALIAS)).unwrap();
        assert_eq!(json.name, toml.name);
        assert_eq!(json.platforms, toml.platforms);
        assert_eq!(json.modules, toml.modules);
        assert_eq!(json.abi_suffix, toml.abi_suffix);
    }
}
