//! Glue generation.
//!
//! Turns a [`ResolvedModuleSet`] into a [`GlueManifest`]: the ordered list
//! of module registrations the host bootstrap consumes. The manifest is
//! rendered to text by [`render`] and written by [`write`].
//!
//! Output is a pure function of the resolved set and the search root.
//! Nothing time- or host-dependent is recorded, so an unchanged package set
//! always renders to the same bytes.

pub mod render;
pub mod write;

pub use render::RenderOptions;
pub use write::{write_artifact, WriteError, WriteStatus};

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::{ModuleDescriptor, Platform};
use crate::resolver::ResolvedModuleSet;
use crate::util::fs::portable_relative;
use crate::util::hash::Fingerprint;

/// Version of the generated JSON layout.
pub const FORMAT_VERSION: u32 = 1;

/// Artifact format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Machine-readable module list
    Json,
    /// `ExpoModulesPackageList` Kotlin source (Android)
    Kotlin,
    /// `ExpoModulesProvider` Swift source (iOS)
    Swift,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Kotlin => "kotlin",
            OutputFormat::Swift => "swift",
        }
    }

    /// Platform whose entries a source format lists, `None` for all.
    pub fn platform(&self) -> Option<Platform> {
        match self {
            OutputFormat::Json => None,
            OutputFormat::Kotlin => Some(Platform::Android),
            OutputFormat::Swift => Some(Platform::Ios),
        }
    }

    /// Default artifact path, relative to the search root.
    pub fn default_output(&self) -> PathBuf {
        let file = match self {
            OutputFormat::Json => "autolink-modules.json",
            OutputFormat::Kotlin => "ExpoModulesPackageList.kt",
            OutputFormat::Swift => "ExpoModulesProvider.swift",
        };
        Path::new("generated").join(file)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "kotlin" | "kt" => Ok(OutputFormat::Kotlin),
            "swift" => Ok(OutputFormat::Swift),
            _ => Err(format!(
                "unknown format `{}` (expected json, kotlin or swift)",
                s
            )),
        }
    }
}

/// One module registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlueEntry {
    /// Logical module name
    pub name: String,

    /// Package name as declared
    pub package_name: String,

    pub version: String,

    pub platform: Platform,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub abi_suffix: Option<String>,

    /// Package directory relative to the search root, `/`-separated
    pub path: String,

    /// Module classes with their ABI namespace applied
    pub classes: Vec<String>,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub prebuilt: bool,
}

impl GlueEntry {
    fn from_descriptor(descriptor: &ModuleDescriptor, root: &Path) -> Self {
        GlueEntry {
            name: descriptor.name().to_string(),
            package_name: descriptor.package_name().to_string(),
            version: descriptor.version().to_string(),
            platform: descriptor.platform(),
            abi_suffix: descriptor.abi_suffix().map(|abi| abi.to_string()),
            path: portable_relative(root, descriptor.path()),
            classes: descriptor.qualified_classes(),
            prebuilt: descriptor.is_prebuilt(),
        }
    }
}

/// The ordered registration list for one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlueManifest {
    target: String,
    entries: Vec<GlueEntry>,
    fingerprint: String,
}

impl GlueManifest {
    /// Build the manifest for a resolved set.
    ///
    /// `root` is the search root; entry paths are recorded relative to it.
    pub fn from_resolved(resolved: &ResolvedModuleSet, root: &Path) -> Self {
        let mut entries: Vec<GlueEntry> = resolved
            .iter()
            .map(|descriptor| GlueEntry::from_descriptor(descriptor, root))
            .collect();

        entries.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then(a.platform.cmp(&b.platform))
                .then_with(|| a.path.cmp(&b.path))
        });

        let target = resolved.target().to_string();
        let fingerprint = fingerprint(&target, &entries);

        GlueManifest {
            target,
            entries,
            fingerprint,
        }
    }

    /// ABI target the manifest was resolved for.
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn entries(&self) -> &[GlueEntry] {
        &self.entries
    }

    /// Entries for one platform, in registration order.
    pub fn for_platform(&self, platform: Platform) -> impl Iterator<Item = &GlueEntry> {
        self.entries.iter().filter(move |e| e.platform == platform)
    }

    /// SHA-256 over the target and every entry.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn fingerprint(target: &str, entries: &[GlueEntry]) -> String {
    let mut fp = Fingerprint::new();
    fp.update_str(&FORMAT_VERSION.to_string()).update_str(target);
    for entry in entries {
        fp.update_str(&entry.name)
            .update_str(&entry.package_name)
            .update_str(&entry.version)
            .update_str(entry.platform.as_str())
            .update_opt(entry.abi_suffix.as_deref())
            .update_str(&entry.path)
            .update_strs(entry.classes.iter().map(String::as_str))
            .update_bool(entry.prebuilt);
    }
    fp.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::AbiTarget;
    use crate::resolver::AbiResolver;
    use crate::test_support::{descriptor, versioned_descriptor};

    fn manifest(descriptors: &[ModuleDescriptor], target: AbiTarget) -> GlueManifest {
        let resolved = AbiResolver::new(descriptors, target).resolve().unwrap();
        GlueManifest::from_resolved(&resolved, Path::new("/repo"))
    }

    #[test]
    fn test_entries_sorted_and_relative() {
        let descriptors = vec![
            descriptor("sensors", Platform::Ios, "/repo/node_modules/sensors")
                .with_classes(["SensorsModule"]),
            descriptor("camera", Platform::Ios, "/repo/node_modules/camera")
                .with_classes(["CameraModule"]),
            descriptor("camera", Platform::Android, "/repo/node_modules/camera")
                .with_classes(["expo.modules.camera.CameraModule"]),
        ];
        let manifest = manifest(&descriptors, AbiTarget::Unversioned);

        let order: Vec<_> = manifest
            .entries()
            .iter()
            .map(|e| (e.name.as_str(), e.platform, e.path.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("camera", Platform::Android, "node_modules/camera"),
                ("camera", Platform::Ios, "node_modules/camera"),
                ("sensors", Platform::Ios, "node_modules/sensors"),
            ]
        );
        assert_eq!(manifest.target(), "unversioned");
        assert_eq!(manifest.for_platform(Platform::Ios).count(), 2);
    }

    #[test]
    fn test_versioned_classes_are_qualified() {
        let descriptors = vec![versioned_descriptor(
            "camera",
            Platform::Android,
            (46, 0, 0),
            "/repo/versioned/abi46_0_0/camera",
        )
        .with_classes(["expo.modules.camera.CameraModule"])];
        let target = AbiTarget::Versioned("abi46_0_0".parse().unwrap());
        let manifest = manifest(&descriptors, target);

        let entry = &manifest.entries()[0];
        assert_eq!(entry.abi_suffix.as_deref(), Some("abi46_0_0"));
        assert_eq!(entry.package_name, "abi46_0_0.camera");
        assert_eq!(
            entry.classes,
            vec!["abi46_0_0.expo.modules.camera.CameraModule".to_string()]
        );
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let a = vec![descriptor("camera", Platform::Ios, "/repo/camera").with_classes(["A"])];
        let b = vec![descriptor("camera", Platform::Ios, "/repo/camera").with_classes(["B"])];

        let first = manifest(&a, AbiTarget::Unversioned);
        let again = manifest(&a, AbiTarget::Unversioned);
        let other = manifest(&b, AbiTarget::Unversioned);

        assert_eq!(first.fingerprint(), again.fingerprint());
        assert_ne!(first.fingerprint(), other.fingerprint());
        assert_eq!(first.fingerprint().len(), 64);
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("Kotlin".parse::<OutputFormat>().unwrap(), OutputFormat::Kotlin);
        assert_eq!("swift".parse::<OutputFormat>().unwrap(), OutputFormat::Swift);
        assert!("xml".parse::<OutputFormat>().is_err());
        assert_eq!(
            OutputFormat::Kotlin.default_output(),
            Path::new("generated/ExpoModulesPackageList.kt")
        );
    }
}
