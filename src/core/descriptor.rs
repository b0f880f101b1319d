//! ModuleDescriptor - one package's exports for one platform.
//!
//! Descriptors are produced by the scanner and never mutated afterwards.
//! Versioned copies of a package are the same descriptor type with an ABI
//! suffix set; the class names stay in their unversioned form and are
//! qualified on demand.

use std::fmt;
use std::path::{Path, PathBuf};

use semver::Version;

use crate::core::{AbiVersion, Platform};

/// Native module exports of a single package on a single platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDescriptor {
    package_name: String,
    name: String,
    version: Version,
    platform: Platform,
    exported_classes: Vec<String>,
    abi_suffix: Option<AbiVersion>,
    path: PathBuf,
    prebuilt: bool,
}

impl ModuleDescriptor {
    /// Create a descriptor for an unversioned package with no exports.
    pub fn new(
        package_name: impl Into<String>,
        name: impl Into<String>,
        platform: Platform,
        path: impl Into<PathBuf>,
    ) -> Self {
        ModuleDescriptor {
            package_name: package_name.into(),
            name: name.into(),
            version: Version::new(0, 0, 0),
            platform,
            exported_classes: Vec::new(),
            abi_suffix: None,
            path: path.into(),
            prebuilt: false,
        }
    }

    pub fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    pub fn with_classes(mut self, classes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.exported_classes = classes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_abi(mut self, abi: Option<AbiVersion>) -> Self {
        self.abi_suffix = abi;
        self
    }

    pub fn with_prebuilt(mut self, prebuilt: bool) -> Self {
        self.prebuilt = prebuilt;
        self
    }

    /// Package name as declared in the manifest.
    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    /// Logical (version-independent) module name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Exported classes in declaration order, unqualified.
    pub fn exported_classes(&self) -> &[String] {
        &self.exported_classes
    }

    pub fn abi_suffix(&self) -> Option<AbiVersion> {
        self.abi_suffix
    }

    pub fn is_versioned(&self) -> bool {
        self.abi_suffix.is_some()
    }

    /// Real path of the package directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a precompiled framework replaces building from source.
    pub fn is_prebuilt(&self) -> bool {
        self.prebuilt
    }

    /// Exported classes as the host runtime sees them.
    ///
    /// Versioned descriptors get their ABI namespace applied.
    pub fn qualified_classes(&self) -> Vec<String> {
        match self.abi_suffix {
            Some(abi) => self
                .exported_classes
                .iter()
                .map(|class| abi.qualify_class(self.platform, class))
                .collect(),
            None => self.exported_classes.clone(),
        }
    }

    /// Key giving descriptors a total, reproducible order.
    pub fn sort_key(&self) -> (&str, Platform, Option<AbiVersion>, &Path) {
        (&self.name, self.platform, self.abi_suffix, &self.path)
    }
}

impl fmt::Display for ModuleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} v{} ({}", self.name, self.version, self.platform)?;
        if let Some(abi) = self.abi_suffix {
            write!(f, ", {}", abi)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualified_classes() {
        let unversioned = ModuleDescriptor::new("camera", "camera", Platform::Android, "/p/camera")
            .with_classes(["expo.modules.camera.CameraModule"]);
        assert_eq!(
            unversioned.qualified_classes(),
            vec!["expo.modules.camera.CameraModule".to_string()]
        );

        let versioned = unversioned
            .clone()
            .with_abi(Some(AbiVersion::new(46, 0, 0)));
        assert_eq!(
            versioned.qualified_classes(),
            vec!["abi46_0_0.expo.modules.camera.CameraModule".to_string()]
        );
        assert_eq!(
            versioned.exported_classes(),
            unversioned.exported_classes()
        );
    }

    #[test]
    fn test_display() {
        let d = ModuleDescriptor::new("abi46_0_0.camera", "camera", Platform::Ios, "/p")
            .with_version(Version::new(1, 2, 3))
            .with_abi(Some(AbiVersion::new(46, 0, 0)));
        assert_eq!(d.to_string(), "camera v1.2.3 (ios, abi46_0_0)");
    }

    #[test]
    fn test_sort_key_orders_unversioned_first() {
        let a = ModuleDescriptor::new("camera", "camera", Platform::Android, "/b");
        let b = ModuleDescriptor::new("camera", "camera", Platform::Android, "/a")
            .with_abi(Some(AbiVersion::new(46, 0, 0)));
        assert!(a.sort_key() < b.sort_key());
    }
}
