//! Subpasses of a raster pass.

use std::collections::BTreeMap;

use crate::types::{AccessType, RasterView};

use super::pass::ComputeViews;

/// One subpass: its own attachments and shader bindings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RasterSubpass {
    pub raster_views: BTreeMap<String, RasterView>,
    pub compute_views: ComputeViews,
}

impl RasterSubpass {
    /// Every (resource, access) pair of the subpass, attachments first.
    pub fn accesses(&self) -> impl Iterator<Item = (&str, AccessType)> + '_ {
        let raster = self
            .raster_views
            .iter()
            .map(|(name, view)| (name.as_str(), view.access));
        let compute = self
            .compute_views
            .iter()
            .flat_map(|(name, views)| views.iter().map(move |view| (name.as_str(), view.access)));
        raster.chain(compute)
    }

    /// Returns true if the subpass reads `resource` through any view.
    pub fn reads(&self, resource: &str) -> bool {
        self.accesses()
            .any(|(name, access)| name == resource && access.is_read())
    }

    /// Returns true if the subpass samples or loads `resource` as a shader input.
    pub fn reads_in_shader(&self, resource: &str) -> bool {
        self.compute_views
            .get(resource)
            .is_some_and(|views| views.iter().any(|view| view.access.is_read()))
    }

    /// Returns true if the subpass writes `resource` as a storage binding.
    pub fn writes_in_shader(&self, resource: &str) -> bool {
        self.compute_views
            .get(resource)
            .is_some_and(|views| views.iter().any(|view| view.access.is_write()))
    }
}

/// Ordered subpasses of a raster pass.
///
/// Subpasses run in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubpassGraph {
    names: Vec<String>,
    subpasses: Vec<RasterSubpass>,
}

impl SubpassGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a subpass and return its index.
    pub fn add_subpass(&mut self, name: impl Into<String>) -> u32 {
        let index = self.subpasses.len() as u32;
        self.names.push(name.into());
        self.subpasses.push(RasterSubpass::default());
        index
    }

    pub fn len(&self) -> usize {
        self.subpasses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subpasses.is_empty()
    }

    pub fn name(&self, index: u32) -> Option<&str> {
        self.names.get(index as usize).map(String::as_str)
    }

    pub fn subpass(&self, index: u32) -> Option<&RasterSubpass> {
        self.subpasses.get(index as usize)
    }

    pub fn subpass_mut(&mut self, index: u32) -> Option<&mut RasterSubpass> {
        self.subpasses.get_mut(index as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &str, &RasterSubpass)> + '_ {
        self.names
            .iter()
            .zip(&self.subpasses)
            .enumerate()
            .map(|(index, (name, subpass))| (index as u32, name.as_str(), subpass))
    }
}
