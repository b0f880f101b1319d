//! Package sources - discovering and loading module manifests on disk.
//!
//! Scanning is a partial-failure pipeline: a package that cannot be read
//! or parsed becomes a [`ScanWarning`] and the remaining packages are
//! still returned.

pub mod path;
pub mod scanner;

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::util::Diagnostic;

pub use path::{discover_packages, Discovery, PackageCandidate};
pub use scanner::{ManifestScanner, ScanOptions, ScanReport};

/// Why a package was excluded from the scan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanWarningKind {
    #[error("malformed manifest: {0}")]
    MalformedManifest(String),

    #[error("unreadable: {0}")]
    Unreadable(String),

    #[error("timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
}

/// A recovered scan failure for one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanWarning {
    pub path: PathBuf,
    pub kind: ScanWarningKind,
}

impl ScanWarning {
    pub fn new(path: impl Into<PathBuf>, kind: ScanWarningKind) -> Self {
        ScanWarning {
            path: path.into(),
            kind,
        }
    }

    pub fn malformed(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        Self::new(path, ScanWarningKind::MalformedManifest(reason.to_string()))
    }

    pub fn unreadable(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        Self::new(path, ScanWarningKind::Unreadable(reason.to_string()))
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self.kind, ScanWarningKind::MalformedManifest(_))
    }

    /// Convert to a user-facing warning.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let message = match &self.kind {
            ScanWarningKind::MalformedManifest(_) => "skipped package with a malformed manifest",
            ScanWarningKind::Unreadable(_) => "skipped unreadable path",
            ScanWarningKind::Timeout(_) => "skipped path that took too long to read",
        };
        Diagnostic::warning(message)
            .with_location(&self.path)
            .with_context(self.kind.to_string())
    }
}

impl fmt::Display for ScanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.kind)
    }
}
