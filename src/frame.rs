//! Builder API for one frame.
//!
//! [`FrameGraph`] owns the resource registry, the pass graph, the pass
//! callbacks and the device handles bound by the host, and resolves
//! resource names so callers never juggle two kinds of handles.

use std::collections::BTreeMap;

use crate::allocator::Allocator;
use crate::compiler::{Compiler, Plan};
use crate::config::FrameGraphConfig;
use crate::device::{Device, DeviceHandle};
use crate::error::{FrameGraphError, Result};
use crate::executor::{ExecutionReport, Executor, PassCallback, PassContext};
use crate::graph::{PassHandle, PassPayload, RenderData, RenderGraph, SubpassHandle};
use crate::resource::{ResourceHandle, ResourceRegistry};
use crate::types::{PassView, Residency, ResourceDesc};

/// Declarative description of one frame.
///
/// # Example
///
/// ```
/// use redlilium_framegraph::*;
///
/// let mut frame = FrameGraph::new();
/// let flags = ResourceFlags::ALLOW_RENDER_TARGET;
/// let desc = ResourceDesc::texture_2d(64, 64, Format::Rgba8Unorm, flags);
/// frame.declare_resource("color", desc).unwrap();
///
/// let opaque = frame.add_pass("opaque", RasterPassData::default()).unwrap();
/// frame.add_view(opaque, "color", RasterView::new("color0")).unwrap();
/// frame.add_pass("resolve", CopyPassData::default()).unwrap();
///
/// let plan = frame.compile().unwrap();
/// assert_eq!(plan.pass_names(), vec!["opaque", "resolve"]);
/// ```
#[derive(Default)]
pub struct FrameGraph {
    config: FrameGraphConfig,
    registry: ResourceRegistry,
    graph: RenderGraph,
    callbacks: Vec<Option<PassCallback>>,
    bindings: BTreeMap<ResourceHandle, DeviceHandle>,
}

impl FrameGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: FrameGraphConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &FrameGraphConfig {
        &self.config
    }

    // ------------------------------------------------------------------------
    // Resources
    // ------------------------------------------------------------------------

    /// Declare a managed resource.
    pub fn declare_resource(&mut self, name: &str, desc: ResourceDesc) -> Result<ResourceHandle> {
        self.registry.declare(name, desc)
    }

    pub fn declare_resource_with_residency(
        &mut self,
        name: &str,
        desc: ResourceDesc,
        residency: Residency,
    ) -> Result<ResourceHandle> {
        self.registry.declare_with_residency(name, desc, residency)
    }

    pub fn set_residency(&mut self, name: &str, residency: Residency) -> Result<()> {
        self.registry.set_residency(name, residency)
    }

    /// Declare a resource that lives outside the frame and bind its handle.
    pub fn import_resource(
        &mut self,
        name: &str,
        desc: ResourceDesc,
        residency: Residency,
        handle: DeviceHandle,
    ) -> Result<ResourceHandle> {
        let resource = self.registry.declare_with_residency(name, desc, residency)?;
        self.bindings.insert(resource, handle);
        Ok(resource)
    }

    /// Bind a device handle to a persistent, backbuffer or external resource.
    pub fn bind_resource(&mut self, name: &str, handle: DeviceHandle) -> Result<()> {
        let resource = self.registry.lookup(name)?;
        log::trace!("bind `{}` to {:?}", name, handle);
        self.bindings.insert(resource, handle);
        Ok(())
    }

    pub fn resource(&self, name: &str) -> Result<ResourceHandle> {
        self.registry.lookup(name)
    }

    // ------------------------------------------------------------------------
    // Passes
    // ------------------------------------------------------------------------

    /// Add a pass. Copy, move and present payloads record their implicit
    /// accesses, so every resource they name must already be declared.
    pub fn add_pass(
        &mut self,
        name: impl Into<String>,
        payload: impl Into<PassPayload>,
    ) -> Result<PassHandle> {
        let payload = payload.into();
        let implicit = payload
            .implicit_accesses()
            .into_iter()
            .map(|(resource, access)| Ok((self.registry.lookup(resource)?, access)))
            .collect::<Result<Vec<_>>>()?;

        let pass = self.graph.add_pass(name, payload)?;
        for (resource, access) in implicit {
            self.graph.record_access(pass, resource, access);
        }
        self.callbacks.push(None);
        Ok(pass)
    }

    pub fn add_view(
        &mut self,
        pass: PassHandle,
        resource_name: &str,
        view: impl Into<PassView>,
    ) -> Result<()> {
        let resource = self.registry.lookup(resource_name)?;
        self.graph.add_view(pass, resource, resource_name, view.into())
    }

    pub fn add_subpass(
        &mut self,
        pass: PassHandle,
        name: impl Into<String>,
    ) -> Result<SubpassHandle> {
        self.graph.add_subpass(pass, name)
    }

    pub fn add_subpass_view(
        &mut self,
        subpass: SubpassHandle,
        resource_name: &str,
        view: impl Into<PassView>,
    ) -> Result<()> {
        let resource = self.registry.lookup(resource_name)?;
        self.graph.add_subpass_view(subpass, resource, resource_name, view.into())
    }

    pub fn add_ownership(&mut self, parent: PassHandle, child: PassHandle) -> Result<()> {
        self.graph.add_ownership(parent, child)
    }

    pub fn add_ordering_hint(&mut self, before: PassHandle, after: PassHandle) -> Result<()> {
        self.graph.add_ordering_hint(before, after)
    }

    /// Register the function run when the executor reaches `pass`.
    pub fn set_pass_callback<F>(&mut self, pass: PassHandle, callback: F) -> Result<()>
    where
        F: Fn(&PassContext<'_>) + Send + Sync + 'static,
    {
        self.graph.check(pass)?;
        let slot = self
            .callbacks
            .get_mut(pass.index())
            .ok_or_else(|| FrameGraphError::UnknownPass {
                name: self.graph.name(pass).to_string(),
            })?;
        *slot = Some(Box::new(callback));
        Ok(())
    }

    pub fn render_data_mut(&mut self, pass: PassHandle) -> Result<&mut RenderData> {
        self.graph.render_data_mut(pass)
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    pub fn graph(&self) -> &RenderGraph {
        &self.graph
    }

    pub(crate) fn callback(&self, pass: PassHandle) -> Option<&PassCallback> {
        self.callbacks.get(pass.index())?.as_ref()
    }

    /// Bound device handles, ascending by resource.
    pub fn bindings(&self) -> impl Iterator<Item = (ResourceHandle, DeviceHandle)> + '_ {
        self.bindings.iter().map(|(&resource, &handle)| (resource, handle))
    }

    pub fn binding(&self, resource: ResourceHandle) -> Option<DeviceHandle> {
        self.bindings.get(&resource).copied()
    }

    // ------------------------------------------------------------------------
    // Compile and execute
    // ------------------------------------------------------------------------

    /// Resolve dependencies and produce the execution plan.
    pub fn compile(&mut self) -> Result<Plan> {
        Compiler::new(&self.config).compile(&self.registry, &mut self.graph)
    }

    /// Run a plan compiled from this frame.
    ///
    /// Uses [`FrameGraphConfig::worker_threads`] workers.
    pub fn execute(
        &self,
        plan: &Plan,
        device: &dyn Device,
        allocator: &mut dyn Allocator,
    ) -> Result<ExecutionReport> {
        Executor::new(device, allocator)
            .with_worker_threads(self.config.effective_worker_threads())
            .run(plan, self)
    }

    /// Drop passes, resources, callbacks and bindings, keeping allocations.
    pub fn clear(&mut self) {
        self.registry.clear();
        self.graph.clear();
        self.callbacks.clear();
        self.bindings.clear();
    }
}

impl std::fmt::Debug for FrameGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameGraph")
            .field("config", &self.config)
            .field("resources", &self.registry.len())
            .field("passes", &self.graph.pass_count())
            .field("bindings", &self.bindings)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ComputePassData, CopyPassData, PresentPassData, RasterPassData};
    use crate::types::{AccessType, ComputeView, CopyPair, Format, RasterView, ResourceFlags};

    fn target() -> ResourceDesc {
        ResourceDesc::texture_2d(32, 32, Format::Rgba8Unorm, ResourceFlags::ALLOW_RENDER_TARGET)
    }

    #[test]
    fn test_unknown_resource_is_rejected() {
        let mut frame = FrameGraph::new();
        let pass = frame.add_pass("p", ComputePassData::default()).unwrap();
        assert_eq!(
            frame.add_view(pass, "shadowMap", ComputeView::read("shadowMap")),
            Err(FrameGraphError::UnknownResource {
                name: "shadowMap".to_string()
            })
        );
    }

    #[test]
    fn test_copy_pass_records_implicit_accesses() {
        let mut frame = FrameGraph::new();
        let src = frame.declare_resource("src", target()).unwrap();
        let dst = frame.declare_resource("dst", target()).unwrap();
        let copy = frame
            .add_pass("copy", CopyPassData::new(vec![CopyPair::new("src", "dst")]))
            .unwrap();

        let accesses: Vec<_> = frame
            .graph()
            .accesses()
            .iter()
            .map(|record| (record.pass, record.resource, record.access))
            .collect();
        assert_eq!(
            accesses,
            vec![(copy, src, AccessType::Read), (copy, dst, AccessType::Write)]
        );
    }

    #[test]
    fn test_present_depends_on_the_writer_of_its_resource() {
        let mut frame = FrameGraph::new();
        frame.declare_resource("color", target()).unwrap();
        let draw = frame.add_pass("draw", RasterPassData::default()).unwrap();
        frame.add_view(draw, "color", RasterView::new("c0")).unwrap();
        let present = frame
            .add_pass("present", PresentPassData::new("color"))
            .unwrap();

        let plan = frame.compile().unwrap();
        assert_eq!(plan.dependency_edge_count(), 1);
        let edge = frame.graph().edges()[0];
        assert_eq!((edge.source, edge.target), (draw, present));
        assert_eq!(plan.steps()[1].wait_for, vec![0]);
    }

    #[test]
    fn test_import_cannot_change_residency() {
        let mut frame = FrameGraph::new();
        let color = frame.declare_resource("color", target()).unwrap();
        let err = frame
            .import_resource("color", target(), Residency::External, DeviceHandle(3))
            .unwrap_err();
        assert!(matches!(err, FrameGraphError::IncompatibleDescriptor { .. }));
        assert_eq!(frame.registry().residency(color), Residency::Managed);
        assert_eq!(frame.binding(color), None);
    }

    #[test]
    fn test_implicit_access_to_unknown_resource_adds_nothing() {
        let mut frame = FrameGraph::new();
        let err = frame
            .add_pass("present", PresentPassData::new("swapchain"))
            .unwrap_err();
        assert_eq!(
            err,
            FrameGraphError::UnknownResource {
                name: "swapchain".to_string()
            }
        );
        assert!(frame.graph().is_empty());
    }

    #[test]
    fn test_bindings_and_clear() {
        let mut frame = FrameGraph::new();
        let swapchain = frame
            .import_resource("swapchain", target(), Residency::Backbuffer, DeviceHandle(7))
            .unwrap();
        assert_eq!(frame.binding(swapchain), Some(DeviceHandle(7)));
        assert_eq!(frame.registry().residency(swapchain), Residency::Backbuffer);

        let pass = frame.add_pass("opaque", RasterPassData::default()).unwrap();
        frame.add_view(pass, "swapchain", RasterView::new("c0")).unwrap();
        frame.set_pass_callback(pass, |_| {}).unwrap();
        assert!(frame.callback(pass).is_some());

        frame.clear();
        assert!(frame.graph().is_empty());
        assert!(frame.registry().is_empty());
        assert_eq!(frame.bindings().count(), 0);
    }

    #[test]
    fn test_callback_for_unknown_pass() {
        let mut other = FrameGraph::new();
        let pass = other.add_pass("p", ComputePassData::default()).unwrap();
        let mut frame = FrameGraph::new();
        assert!(matches!(
            frame.set_pass_callback(pass, |_| {}),
            Err(FrameGraphError::UnknownPass { .. })
        ));
    }
}
