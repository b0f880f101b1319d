//! ResolvedModuleSet - the modules selected for one build.
//!
//! Once created, a set is read-only. It is derived fresh on every run and
//! never persisted.

use std::collections::BTreeMap;

use crate::core::{AbiTarget, ModuleDescriptor, Platform};

/// Exactly one descriptor per logical module and platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModuleSet {
    target: AbiTarget,
    modules: BTreeMap<(String, Platform), ModuleDescriptor>,
}

impl ResolvedModuleSet {
    /// Create an empty set for a target.
    pub fn new(target: AbiTarget) -> Self {
        ResolvedModuleSet {
            target,
            modules: BTreeMap::new(),
        }
    }

    /// Select a descriptor for its (name, platform) slot.
    ///
    /// Returns the descriptor already in the slot, if any; the resolver only
    /// inserts into empty slots.
    pub(crate) fn insert(&mut self, descriptor: ModuleDescriptor) -> Option<ModuleDescriptor> {
        let key = (descriptor.name().to_string(), descriptor.platform());
        self.modules.insert(key, descriptor)
    }

    /// The ABI this set was resolved for.
    pub fn target(&self) -> AbiTarget {
        self.target
    }

    pub fn get(&self, name: &str, platform: Platform) -> Option<&ModuleDescriptor> {
        self.modules.get(&(name.to_string(), platform))
    }

    pub fn contains(&self, name: &str, platform: Platform) -> bool {
        self.get(name, platform).is_some()
    }

    /// Iterate in (name, platform) order.
    pub fn iter(&self) -> impl Iterator<Item = &ModuleDescriptor> {
        self.modules.values()
    }

    /// Descriptors selected for one platform, in name order.
    pub fn for_platform(&self, platform: Platform) -> impl Iterator<Item = &ModuleDescriptor> {
        self.iter().filter(move |d| d.platform() == platform)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl<'a> IntoIterator for &'a ResolvedModuleSet {
    type Item = &'a ModuleDescriptor;
    type IntoIter = std::collections::btree_map::Values<'a, (String, Platform), ModuleDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.modules.values()
    }
}
