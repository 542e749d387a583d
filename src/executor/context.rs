//! What a pass callback sees while it runs.

use crate::allocator::Allocation;
use crate::device::DeviceHandle;
use crate::graph::{PassHandle, PassKind, PassRef, RenderData};
use crate::resource::{ResourceHandle, ResourceRegistry};

/// Device objects backing one virtual resource during a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedResource {
    pub resource: DeviceHandle,
    /// Full view created alongside the resource. `None` for bound handles.
    pub view: Option<DeviceHandle>,
    /// Placement in pooled memory for aliased resources.
    pub allocation: Option<Allocation>,
}

/// Callback invoked for a pass when the executor reaches it.
pub type PassCallback = Box<dyn Fn(&PassContext<'_>) + Send + Sync>;

/// Pass being executed, with the resources of its step resolved.
pub struct PassContext<'a> {
    pub(crate) pass: PassHandle,
    pub(crate) name: &'a str,
    pub(crate) payload: PassRef<'a>,
    pub(crate) render_data: &'a RenderData,
    pub(crate) step: usize,
    pub(crate) registry: &'a ResourceRegistry,
    pub(crate) resources: &'a [(ResourceHandle, ResolvedResource)],
}

impl<'a> PassContext<'a> {
    pub fn pass(&self) -> PassHandle {
        self.pass
    }

    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn kind(&self) -> PassKind {
        self.payload.kind()
    }

    /// Payload of the pass, for kind-specific execution.
    pub fn payload(&self) -> PassRef<'a> {
        self.payload
    }

    pub fn render_data(&self) -> &'a RenderData {
        self.render_data
    }

    /// Index of the plan step running this pass.
    pub fn step(&self) -> usize {
        self.step
    }

    /// Resolve a resource of this step by name.
    pub fn resource(&self, name: &str) -> Option<&'a ResolvedResource> {
        let handle = self.registry.get(name)?;
        self.resources
            .iter()
            .find(|(h, _)| *h == handle)
            .map(|(_, resolved)| resolved)
    }

    /// Every resolved resource of this step, with its name.
    pub fn resources(&self) -> impl Iterator<Item = (&'a str, &'a ResolvedResource)> + '_ {
        self.resources
            .iter()
            .map(|(handle, resolved)| (self.registry.name(*handle), resolved))
    }
}

impl std::fmt::Debug for PassContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PassContext")
            .field("pass", &self.pass)
            .field("name", &self.name)
            .field("step", &self.step)
            .field("resources", &self.resources.len())
            .finish()
    }
}
