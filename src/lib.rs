//! Autolink - native module discovery and ABI resolution for mobile builds
//!
//! This crate provides the library behind the `autolink` binary: scanning
//! installed packages for module manifests, selecting one implementation
//! per logical module for a target ABI, and generating the registration
//! artifact the host app bootstraps from.

pub mod core;
pub mod generator;
pub mod ops;
pub mod resolver;
pub mod sources;
pub mod util;

/// Test utilities for autolink unit tests.
///
/// This module is only available when compiling with `--cfg test`. It
/// provides builders that write package trees to temporary directories.
#[cfg(test)]
pub mod test_support;

pub use core::{AbiTarget, AbiVersion, ModuleDescriptor, ModuleManifest, Platform};
pub use generator::{write_artifact, GlueManifest, OutputFormat, WriteStatus};
pub use ops::autolink;
pub use resolver::{AbiResolver, ResolveError, ResolveFailure, ResolvedModuleSet};
pub use sources::{ManifestScanner, ScanOptions, ScanReport, ScanWarning};
pub use util::context::GlobalContext;
