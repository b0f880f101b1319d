//! ABI version tags.
//!
//! A versioned (sandboxed) copy of a module is tagged with an ABI suffix
//! such as `abi46_0_0`. The tag can come from the manifest, the package
//! name, or a directory on the path to the package. The same tag is used
//! to derive the sandboxed class names the host runtime registers.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::Platform;

static ABI_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^abi(\d+)_(\d+)_(\d+)$").expect("valid ABI tag regex"));

static NAME_PREFIX_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(abi\d+_\d+_\d+)\.(.+)$").expect("valid ABI name prefix regex")
});

static NAME_SUFFIX_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+)-(abi\d+_\d+_\d+)$").expect("valid ABI name suffix regex")
});

/// A parsed ABI suffix (`abi<major>_<minor>_<patch>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AbiVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl AbiVersion {
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        AbiVersion {
            major,
            minor,
            patch,
        }
    }

    /// Parse an ABI tag. Returns `None` for anything that is not exactly a tag.
    pub fn parse(s: &str) -> Option<Self> {
        let caps = ABI_TAG.captures(s)?;
        Some(AbiVersion {
            major: caps[1].parse().ok()?,
            minor: caps[2].parse().ok()?,
            patch: caps[3].parse().ok()?,
        })
    }

    /// The symbol prefix used for sandboxed iOS classes (`ABI46_0_0`).
    pub fn symbol_prefix(&self) -> String {
        format!("ABI{}_{}_{}", self.major, self.minor, self.patch)
    }

    /// Derive the sandboxed name of a module class for this ABI.
    ///
    /// Android classes live under a package prefix
    /// (`abi46_0_0.expo.modules.camera.CameraModule`), iOS classes carry a
    /// symbol prefix (`ABI46_0_0CameraModule`). Names that already carry the
    /// qualifier are returned unchanged.
    pub fn qualify_class(&self, platform: Platform, class: &str) -> String {
        match platform {
            Platform::Android => {
                let prefix = format!("{}.", self);
                if class.starts_with(&prefix) {
                    class.to_string()
                } else {
                    format!("{}{}", prefix, class)
                }
            }
            Platform::Ios => {
                let prefix = self.symbol_prefix();
                if class.starts_with(&prefix) {
                    class.to_string()
                } else {
                    format!("{}{}", prefix, class)
                }
            }
        }
    }
}

impl fmt::Display for AbiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "abi{}_{}_{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for AbiVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AbiVersion::parse(s).ok_or_else(|| {
            format!(
                "invalid ABI suffix '{}'; expected the form 'abi<major>_<minor>_<patch>'",
                s
            )
        })
    }
}

impl TryFrom<String> for AbiVersion {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<AbiVersion> for String {
    fn from(v: AbiVersion) -> Self {
        v.to_string()
    }
}

/// The ABI a build links against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AbiTarget {
    /// The current, unsuffixed implementations only.
    #[default]
    Unversioned,
    /// A specific sandboxed ABI, falling back to unversioned modules.
    Versioned(AbiVersion),
}

impl AbiTarget {
    /// The ABI version, if this target is versioned.
    pub fn version(&self) -> Option<AbiVersion> {
        match self {
            AbiTarget::Unversioned => None,
            AbiTarget::Versioned(v) => Some(*v),
        }
    }
}

impl fmt::Display for AbiTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbiTarget::Unversioned => f.write_str("unversioned"),
            AbiTarget::Versioned(v) => write!(f, "{}", v),
        }
    }
}

impl FromStr for AbiTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unversioned" | "current" => Ok(AbiTarget::Unversioned),
            _ => s.parse().map(AbiTarget::Versioned),
        }
    }
}

/// Split an ABI tag off a package name.
///
/// Recognizes `abi46_0_0.camera` and `camera-abi46_0_0`. Returns the logical
/// name and the tag, or the name unchanged when it carries no tag.
pub fn split_name_tag(name: &str) -> (String, Option<AbiVersion>) {
    if let Some(caps) = NAME_PREFIX_TAG.captures(name) {
        if let Some(abi) = AbiVersion::parse(&caps[1]) {
            return (caps[2].to_string(), Some(abi));
        }
    }
    if let Some(caps) = NAME_SUFFIX_TAG.captures(name) {
        if let Some(abi) = AbiVersion::parse(&caps[2]) {
            return (caps[1].to_string(), Some(abi));
        }
    }
    (name.to_string(), None)
}

/// Find an ABI tag among the directories between `root` and `package_dir`.
///
/// The package directory's own name is not considered. When several
/// directories are tags, the innermost one wins.
pub fn tag_from_path(root: &Path, package_dir: &Path) -> Option<AbiVersion> {
    let relative = package_dir.strip_prefix(root).ok()?;
    let parent = relative.parent()?;
    parent
        .components()
        .filter_map(|c| c.as_os_str().to_str())
        .filter_map(AbiVersion::parse)
        .last()
}
