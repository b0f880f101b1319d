//! Pipeline event types.
//!
//! Operations report progress through an [`EventSink`] instead of writing
//! to the terminal. The CLI renders events as status lines, or as one JSON
//! object per line with `--message-format=json`.
//!
//! # Event Types
//!
//! - `scan-started`: Package discovery finished, loading begins
//! - `package-loaded`: One package directory was processed
//! - `scan-warning`: A package was skipped
//! - `scan-finished`: All packages were loaded
//! - `resolved`: Modules were selected for the target ABI
//! - `artifact`: The generated artifact was written (or left as is)
//! - `rendered`: A dry run produced the artifact text without writing it
//!
//! # Stability
//!
//! New fields may be added, but existing fields should not be removed or
//! renamed.

use std::path::PathBuf;

use serde::Serialize;

use crate::sources::ScanWarning;

/// An event emitted while autolinking.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "reason", rename_all = "kebab-case")]
pub enum AutolinkEvent {
    ScanStarted {
        root: PathBuf,
        /// Package directories found by the walk
        candidates: usize,
    },

    PackageLoaded {
        path: PathBuf,
    },

    ScanWarning {
        path: PathBuf,
        /// `malformed-manifest`, `unreadable` or `timeout`
        kind: &'static str,
        message: String,
        #[serde(skip)]
        warning: ScanWarning,
    },

    ScanFinished {
        packages: usize,
        descriptors: usize,
        warnings: usize,
    },

    Resolved {
        target: String,
        modules: usize,
    },

    Artifact {
        path: PathBuf,
        format: String,
        fingerprint: String,
        /// `false` when the existing file already had this content
        fresh: bool,
    },

    Rendered {
        format: String,
        fingerprint: String,
        contents: String,
    },
}

impl AutolinkEvent {
    pub fn warning(warning: &ScanWarning) -> Self {
        use crate::sources::ScanWarningKind;

        let kind = match warning.kind {
            ScanWarningKind::MalformedManifest(_) => "malformed-manifest",
            ScanWarningKind::Unreadable(_) => "unreadable",
            ScanWarningKind::Timeout(_) => "timeout",
        };
        AutolinkEvent::ScanWarning {
            path: warning.path.clone(),
            kind,
            message: warning.kind.to_string(),
            warning: warning.clone(),
        }
    }

    /// Serialize as a single JSON line.
    pub fn to_json_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Receives pipeline events. Called from scan worker threads.
pub type EventSink<'a> = &'a (dyn Fn(&AutolinkEvent) + Sync);

/// A sink that drops every event.
pub fn ignore_events(_: &AutolinkEvent) {}
