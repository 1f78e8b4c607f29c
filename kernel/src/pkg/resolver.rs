//! Dependency Resolution

use super::{Dependency, PackageId, Version};
use alloc::vec::Vec;
use alloc::collections::BTreeMap;

/// Dependency resolver
pub struct DependencyResolver {
    /// Available packages
    available: BTreeMap<PackageId, Vec<Version>>,
}

impl DependencyResolver {
    pub fn new() -> Self {
        Self {
            available: BTreeMap::new(),
        }
    }

    /// Resolve dependencies for a package
    pub fn resolve(&self, dependencies: &[Dependency]) -> Vec<(PackageId, Version)> {
        // TODO: Implement SAT-based dependency resolution
        Vec::new()
    }
}
