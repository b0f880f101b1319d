//! Resolution error types and diagnostics.

use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::core::{AbiTarget, Platform};
use crate::util::diagnostic::{suggestions, Diagnostic};

/// A single resolution problem.
#[derive(Debug, Clone, PartialEq, Eq, Error, MietteDiagnostic)]
pub enum ResolveError {
    #[error(
        "ambiguous resolution for `{name}` on {platform} ({target}): {}",
        join_paths(.candidates)
    )]
    #[diagnostic(
        code(autolink::resolve::ambiguous),
        help("keep a single installed copy of the module for this ABI")
    )]
    AmbiguousResolution {
        name: String,
        platform: Platform,
        target: AbiTarget,
        candidates: Vec<PathBuf>,
    },

    #[error("required module `{name}` is not available for {platform} ({target})")]
    #[diagnostic(
        code(autolink::resolve::missing_module),
        help("install the module or remove it from the required modules")
    )]
    MissingRequiredModule {
        name: String,
        platform: Platform,
        target: AbiTarget,
        /// ABIs the module was found under that do not apply to the target
        available: Vec<String>,
    },
}

impl ResolveError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ResolveError::AmbiguousResolution {
                name,
                platform,
                target,
                candidates,
            } => {
                let mut diag = Diagnostic::error(format!(
                    "ambiguous resolution for `{}` on {} ({})",
                    name, platform, target
                ))
                .with_code("autolink::resolve::ambiguous");

                for candidate in candidates {
                    diag = diag.with_context(format!("candidate: {}", candidate.display()));
                }

                diag.with_suggestion(suggestions::REMOVE_DUPLICATE)
            }

            ResolveError::MissingRequiredModule {
                name,
                platform,
                target,
                available,
            } => {
                let mut diag = Diagnostic::error(format!(
                    "required module `{}` is not available for {} ({})",
                    name, platform, target
                ))
                .with_code("autolink::resolve::missing_module");

                if !available.is_empty() {
                    diag = diag.with_context(format!("found only for: {}", available.join(", ")));
                }

                diag.with_suggestion(suggestions::INSTALL_MODULE)
                    .with_suggestion(suggestions::CHECK_ROOT)
            }
        }
    }
}

/// Every problem found while resolving, in deterministic order.
#[derive(Debug, Clone, PartialEq, Eq, Error, MietteDiagnostic)]
#[error("failed to resolve modules ({} problem(s))", .issues.len())]
#[diagnostic(code(autolink::resolve))]
pub struct ResolveFailure {
    #[related]
    pub issues: Vec<ResolveError>,
}

impl ResolveFailure {
    pub fn ambiguities(&self) -> impl Iterator<Item = &ResolveError> {
        self.issues
            .iter()
            .filter(|e| matches!(e, ResolveError::AmbiguousResolution { .. }))
    }

    pub fn missing(&self) -> impl Iterator<Item = &ResolveError> {
        self.issues
            .iter()
            .filter(|e| matches!(e, ResolveError::MissingRequiredModule { .. }))
    }

    /// One diagnostic per problem.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.issues.iter().map(ResolveError::to_diagnostic).collect()
    }
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
