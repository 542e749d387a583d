//! Named virtual resources of one frame.
//!
//! The registry is a struct of arrays indexed by [`ResourceHandle`], plus a
//! name index. Names are unique; re-declaring a name with an identical
//! descriptor returns the existing handle.

use std::collections::HashMap;

use crate::error::{FrameGraphError, Result};
use crate::types::{Residency, ResourceDesc, ResourceTraits};

/// Handle to a resource in a [`ResourceRegistry`].
///
/// Handles are dense indices in declaration order and are only valid within
/// the registry that created them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceHandle(u32);

impl ResourceHandle {
    pub(crate) fn new(index: u32) -> Self {
        Self(index)
    }

    /// Position of the resource in declaration order.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Registry of the resources declared for a frame.
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    names: Vec<String>,
    descs: Vec<ResourceDesc>,
    traits: Vec<ResourceTraits>,
    index: HashMap<String, ResourceHandle>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a managed resource.
    ///
    /// Declaring an existing name again is a no-op if the descriptors are
    /// equal, and an [`FrameGraphError::IncompatibleDescriptor`] otherwise.
    pub fn declare(&mut self, name: &str, desc: ResourceDesc) -> Result<ResourceHandle> {
        if let Some(&handle) = self.index.get(name) {
            return if self.descs[handle.index()] == desc {
                Ok(handle)
            } else {
                Err(FrameGraphError::IncompatibleDescriptor {
                    name: name.to_string(),
                })
            };
        }

        let handle = ResourceHandle::new(self.names.len() as u32);
        log::trace!(
            "declare resource `{}` ({}, {} bytes)",
            name,
            desc.dimension.name(),
            desc.byte_size()
        );
        self.names.push(name.to_string());
        self.descs.push(desc);
        self.traits.push(ResourceTraits::default());
        self.index.insert(name.to_string(), handle);
        Ok(handle)
    }

    /// Declare a resource with an explicit residency.
    ///
    /// Re-declaring an existing name must repeat its residency; use
    /// [`Self::set_residency`] to change it.
    pub fn declare_with_residency(
        &mut self,
        name: &str,
        desc: ResourceDesc,
        residency: Residency,
    ) -> Result<ResourceHandle> {
        if let Some(&existing) = self.index.get(name) {
            let declared = self.traits[existing.index()].residency;
            if declared != residency {
                log::warn!(
                    "resource `{}` re-declared as {} but is {}",
                    name,
                    residency.name(),
                    declared.name()
                );
                return Err(FrameGraphError::IncompatibleDescriptor {
                    name: name.to_string(),
                });
            }
        }
        let handle = self.declare(name, desc)?;
        self.traits[handle.index()].residency = residency;
        Ok(handle)
    }

    /// Change the residency of a declared resource.
    pub fn set_residency(&mut self, name: &str, residency: Residency) -> Result<()> {
        let handle = self.lookup(name)?;
        self.traits[handle.index()].residency = residency;
        Ok(())
    }

    /// Resolve a name, failing with [`FrameGraphError::UnknownResource`].
    pub fn lookup(&self, name: &str) -> Result<ResourceHandle> {
        self.get(name).ok_or_else(|| FrameGraphError::UnknownResource {
            name: name.to_string(),
        })
    }

    /// Resolve a name if it is declared.
    pub fn get(&self, name: &str) -> Option<ResourceHandle> {
        self.index.get(name).copied()
    }

    pub fn contains(&self, handle: ResourceHandle) -> bool {
        handle.index() < self.names.len()
    }

    pub fn name(&self, handle: ResourceHandle) -> &str {
        &self.names[handle.index()]
    }

    pub fn desc(&self, handle: ResourceHandle) -> &ResourceDesc {
        &self.descs[handle.index()]
    }

    pub fn traits(&self, handle: ResourceHandle) -> &ResourceTraits {
        &self.traits[handle.index()]
    }

    pub fn residency(&self, handle: ResourceHandle) -> Residency {
        self.traits[handle.index()].residency
    }

    /// Number of declared resources.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// All handles in declaration order.
    pub fn handles(&self) -> impl Iterator<Item = ResourceHandle> + '_ {
        (0..self.names.len() as u32).map(ResourceHandle::new)
    }

    /// Remove every resource, keeping allocations for reuse.
    pub fn clear(&mut self) {
        self.names.clear();
        self.descs.clear();
        self.traits.clear();
        self.index.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Format, ResourceFlags};

    fn color(width: u32) -> ResourceDesc {
        ResourceDesc::texture_2d(
            width,
            1080,
            Format::Rgba8Unorm,
            ResourceFlags::ALLOW_RENDER_TARGET,
        )
    }

    #[test]
    fn test_declare_assigns_dense_handles() {
        let mut registry = ResourceRegistry::new();
        let a = registry.declare("a", color(1920)).unwrap();
        let b = registry.declare("b", color(1920)).unwrap();
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.name(b), "b");
        assert_eq!(registry.residency(a), Residency::Managed);
    }

    #[test]
    fn test_redeclare_same_descriptor_is_idempotent() {
        let mut registry = ResourceRegistry::new();
        let first = registry.declare("color", color(1920)).unwrap();
        let second = registry.declare("color", color(1920)).unwrap();
        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_redeclare_different_descriptor_fails() {
        let mut registry = ResourceRegistry::new();
        registry.declare("color", color(1920)).unwrap();
        let err = registry.declare("color", color(1280)).unwrap_err();
        assert_eq!(
            err,
            FrameGraphError::IncompatibleDescriptor {
                name: "color".to_string()
            }
        );
        assert_eq!(registry.desc(registry.lookup("color").unwrap()).width, 1920);
    }

    #[test]
    fn test_redeclare_different_residency_fails() {
        let mut registry = ResourceRegistry::new();
        let handle = registry.declare("color", color(1920)).unwrap();
        let err = registry
            .declare_with_residency("color", color(1920), Residency::External)
            .unwrap_err();
        assert_eq!(
            err,
            FrameGraphError::IncompatibleDescriptor {
                name: "color".to_string()
            }
        );
        assert_eq!(registry.residency(handle), Residency::Managed);
        assert_eq!(
            registry.declare_with_residency("color", color(1920), Residency::Managed),
            Ok(handle)
        );
    }

    #[test]
    fn test_lookup_unknown() {
        let registry = ResourceRegistry::new();
        assert!(matches!(
            registry.lookup("missing"),
            Err(FrameGraphError::UnknownResource { .. })
        ));
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_set_residency() {
        let mut registry = ResourceRegistry::new();
        let handle = registry.declare("history", color(1920)).unwrap();
        registry.set_residency("history", Residency::Persistent).unwrap();
        assert!(registry.traits(handle).has_side_effects());
        assert!(registry.set_residency("nope", Residency::External).is_err());
    }

    #[test]
    fn test_clear() {
        let mut registry = ResourceRegistry::new();
        registry.declare("a", color(64)).unwrap();
        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.get("a").is_none());
    }
}
