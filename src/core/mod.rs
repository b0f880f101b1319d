//! Core data structures for autolinking.
//!
//! This module contains the foundational types used throughout the crate:
//! - Platforms and ABI version tags
//! - Module manifests as found on disk
//! - Module descriptors produced by the scanner

pub mod abi;
pub mod descriptor;
pub mod manifest;
pub mod platform;

pub use abi::{AbiTarget, AbiVersion};
pub use descriptor::ModuleDescriptor;
pub use manifest::{find_manifest, ManifestError, ModuleManifest, MANIFEST_ALIAS, MANIFEST_NAME};
pub use platform::Platform;
