//! Test utilities for autolink unit tests.
//!
//! Fixtures write real package trees into temporary directories; the
//! scanner is always exercised against the actual filesystem.
//!
//! # Example
//!
//! ```rust,ignore
//! use autolink::test_support::{PackageFixture, ProjectFixture};
//!
//! #[test]
//! fn test_example() {
//!     let project = ProjectFixture::new();
//!     project.package("camera", PackageFixture::new("camera").ios(["CameraModule"]));
//!
//!     // Scan project.root()...
//! }
//! ```

pub mod fixtures;

pub use fixtures::*;

use crate::core::{AbiVersion, ModuleDescriptor, Platform};

/// Build a descriptor without touching the filesystem.
pub fn descriptor(name: &str, platform: Platform, path: &str) -> ModuleDescriptor {
    ModuleDescriptor::new(name, name, platform, path)
}

/// Build a versioned descriptor without touching the filesystem.
pub fn versioned_descriptor(
    name: &str,
    platform: Platform,
    abi: (u32, u32, u32),
    path: &str,
) -> ModuleDescriptor {
    let abi = AbiVersion::new(abi.0, abi.1, abi.2);
    ModuleDescriptor::new(format!("{}.{}", abi, name), name, platform, path).with_abi(Some(abi))
}
