//! ABI resolution.
//!
//! Picks exactly one implementation per logical module and platform for a
//! target ABI. An exact ABI match wins over the unversioned copy; two
//! candidates of equal specificity are a conflict and never resolved by
//! guessing. The resolver is pure and deterministic: all I/O happens in the
//! scanner, and descriptors are passed in explicitly.

pub mod errors;
pub mod resolve;

pub use errors::{ResolveError, ResolveFailure};
pub use resolve::ResolvedModuleSet;

use std::collections::{BTreeMap, BTreeSet};

use crate::core::{AbiTarget, ModuleDescriptor, Platform};

/// Resolver over one scan's descriptors.
#[derive(Debug, Clone)]
pub struct AbiResolver<'a> {
    descriptors: &'a [ModuleDescriptor],
    target: AbiTarget,
    required: BTreeMap<Platform, BTreeSet<String>>,
}

impl<'a> AbiResolver<'a> {
    pub fn new(descriptors: &'a [ModuleDescriptor], target: AbiTarget) -> Self {
        AbiResolver {
            descriptors,
            target,
            required: BTreeMap::new(),
        }
    }

    /// Require logical modules to be present on a platform.
    pub fn with_required<I, S>(mut self, platform: Platform, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required
            .entry(platform)
            .or_default()
            .extend(names.into_iter().map(Into::into));
        self
    }

    pub fn target(&self) -> AbiTarget {
        self.target
    }

    /// Resolve the descriptors into a set, or report every problem found.
    pub fn resolve(&self) -> Result<ResolvedModuleSet, ResolveFailure> {
        tracing::info!(
            "Resolving {} descriptors for {}",
            self.descriptors.len(),
            self.target
        );

        let mut groups: BTreeMap<(&str, Platform), Vec<&ModuleDescriptor>> = BTreeMap::new();
        for descriptor in self.descriptors {
            groups
                .entry((descriptor.name(), descriptor.platform()))
                .or_default()
                .push(descriptor);
        }

        let mut resolved = ResolvedModuleSet::new(self.target);
        let mut issues = Vec::new();

        for ((name, platform), candidates) in &groups {
            match self.select(name, *platform, candidates) {
                Ok(Some(selected)) => {
                    tracing::debug!("{} -> {}", selected, selected.path().display());
                    resolved.insert(selected.clone());
                }
                Ok(None) => {
                    tracing::debug!(
                        "`{}` has no implementation for {} on {}",
                        name,
                        self.target,
                        platform
                    );
                }
                Err(e) => issues.push(e),
            }
        }

        for (platform, names) in &self.required {
            for name in names {
                if resolved.contains(name, *platform) {
                    continue;
                }
                let available = groups
                    .get(&(name.as_str(), *platform))
                    .map(|candidates| abi_labels(candidates))
                    .unwrap_or_default();
                issues.push(ResolveError::MissingRequiredModule {
                    name: name.clone(),
                    platform: *platform,
                    target: self.target,
                    available,
                });
            }
        }

        if issues.is_empty() {
            tracing::info!("Resolved {} modules", resolved.len());
            Ok(resolved)
        } else {
            Err(ResolveFailure { issues })
        }
    }

    /// Apply the exact-match-then-unversioned rule to one group.
    fn select<'d>(
        &self,
        name: &str,
        platform: Platform,
        candidates: &[&'d ModuleDescriptor],
    ) -> Result<Option<&'d ModuleDescriptor>, ResolveError> {
        if let Some(version) = self.target.version() {
            let exact: Vec<_> = candidates
                .iter()
                .copied()
                .filter(|d| d.abi_suffix() == Some(version))
                .collect();
            if !exact.is_empty() {
                return self.single(name, platform, AbiTarget::Versioned(version), exact);
            }
        }

        let unversioned: Vec<_> = candidates
            .iter()
            .copied()
            .filter(|d| !d.is_versioned())
            .collect();
        if unversioned.is_empty() {
            return Ok(None);
        }
        self.single(name, platform, AbiTarget::Unversioned, unversioned)
    }

    fn single<'d>(
        &self,
        name: &str,
        platform: Platform,
        specificity: AbiTarget,
        matches: Vec<&'d ModuleDescriptor>,
    ) -> Result<Option<&'d ModuleDescriptor>, ResolveError> {
        match matches.as_slice() {
            [only] => Ok(Some(*only)),
            _ => {
                let mut candidates: Vec<_> =
                    matches.iter().map(|d| d.path().to_path_buf()).collect();
                candidates.sort();
                Err(ResolveError::AmbiguousResolution {
                    name: name.to_string(),
                    platform,
                    target: specificity,
                    candidates,
                })
            }
        }
    }
}

/// Distinct ABI labels among candidates, in ABI order.
fn abi_labels(candidates: &[&ModuleDescriptor]) -> Vec<String> {
    let abis: BTreeSet<_> = candidates.iter().map(|d| d.abi_suffix()).collect();
    abis.into_iter()
        .map(|abi| match abi {
            Some(abi) => abi.to_string(),
            None => AbiTarget::Unversioned.to_string(),
        })
        .collect()
}
