//! Render graph storage.
//!
//! A [`RenderGraph`] is an arena of pass vertices addressed by [`PassHandle`].
//! Each vertex has a kind tag and an offset into the contiguous storage for
//! that kind's payload, so iterating all raster passes touches one `Vec`.
//!
//! Two independent edge systems hang off the vertices:
//!
//! - **dependency edges** (`out_edges`/`in_edges`) say one pass must run
//!   before another; they are derived by the compiler from the access log
//!   and the ordering hints, and parallel edges are allowed
//! - **ownership edges** (`children`/`parent`) group passes into a forest;
//!   only roots are scheduled, descendants run inside their root's step
//!
//! Passes are added through [`FrameGraph::add_pass`](crate::FrameGraph::add_pass),
//! which resolves the resources named by copy, move and present payloads
//! before the vertex exists.
//!
//! # Example
//!
//! ```ignore
//! let mut graph = RenderGraph::new();
//! let forward = graph.add_pass("forward", RasterPassData::default())?;
//! let queue = graph.add_pass("forward/opaque", RenderQueueData::default())?;
//! graph.add_ownership(forward, queue)?;
//! graph.add_view(forward, color, "color", RasterView::new("color0").into())?;
//! ```

mod pass;
mod subpass;
mod traversal;
mod visitor;

use std::collections::HashMap;

pub use pass::{
    Blit, CameraHandle, ComputePassData, ComputeViews, CopyPassData, Dispatch, MovePassData,
    PassKind, PassPayload, PassRef, PresentPassData, QueueHint, RasterPassData, RaytracePassData,
    RenderData, RenderQueueData, SceneData,
};
pub use subpass::{RasterSubpass, SubpassGraph};
pub use traversal::{is_reachable, DirectedGraph};
pub use visitor::PassVisitor;

use crate::error::{FrameGraphError, Result};
use crate::resource::ResourceHandle;
use crate::types::{AccessType, PassView};

/// Handle to a pass vertex in a [`RenderGraph`].
///
/// `PassHandle` is `Copy` and cheap to pass around. It is only valid within
/// the graph that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PassHandle(u32);

impl PassHandle {
    pub(crate) fn new(index: u32) -> Self {
        Self(index)
    }

    /// Position of the pass in insertion order.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Handle to a subpass of a raster pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubpassHandle {
    pass: PassHandle,
    index: u32,
}

impl SubpassHandle {
    pub fn pass(self) -> PassHandle {
        self.pass
    }

    pub fn index(self) -> u32 {
        self.index
    }
}

/// A dependency: `source` must finish before `target` starts.
///
/// `resource` is the resource that caused the edge, or `None` for an
/// explicit ordering hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DependencyEdge {
    pub source: PassHandle,
    pub target: PassHandle,
    pub resource: Option<ResourceHandle>,
}

/// One entry of the access log, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessRecord {
    pub pass: PassHandle,
    pub resource: ResourceHandle,
    pub access: AccessType,
}

/// Kind tag plus offset into the per-kind payload storage.
#[derive(Debug, Clone, Copy)]
enum Slot {
    Raster(u32),
    Compute(u32),
    Copy(u32),
    Move(u32),
    Present(u32),
    Raytrace(u32),
    Queue(u32),
    Scene(u32),
    Blit(u32),
    Dispatch(u32),
}

#[derive(Debug)]
struct Vertex {
    slot: Slot,
    out_edges: Vec<u32>,
    in_edges: Vec<u32>,
}

#[derive(Debug, Default)]
struct Object {
    children: Vec<PassHandle>,
    parent: Option<PassHandle>,
}

/// Pass vertices of one frame, their payloads, edges and access log.
#[derive(Debug, Default)]
pub struct RenderGraph {
    vertices: Vec<Vertex>,
    objects: Vec<Object>,
    names: Vec<String>,
    render_data: Vec<RenderData>,
    index: HashMap<String, PassHandle>,

    rasters: Vec<RasterPassData>,
    computes: Vec<ComputePassData>,
    copies: Vec<CopyPassData>,
    moves: Vec<MovePassData>,
    presents: Vec<PresentPassData>,
    raytraces: Vec<RaytracePassData>,
    queues: Vec<RenderQueueData>,
    scenes: Vec<SceneData>,
    blits: Vec<Blit>,
    dispatches: Vec<Dispatch>,

    edges: Vec<DependencyEdge>,
    accesses: Vec<AccessRecord>,
    hints: Vec<(PassHandle, PassHandle)>,
}

fn push<T>(storage: &mut Vec<T>, value: T) -> u32 {
    storage.push(value);
    (storage.len() - 1) as u32
}

impl RenderGraph {
    /// Create a new empty render graph.
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------------

    /// Add a pass vertex. Names are unique within the graph.
    ///
    /// Implicit payload accesses are not recorded here; the caller records
    /// them with [`Self::record_access`].
    pub(crate) fn add_pass(
        &mut self,
        name: impl Into<String>,
        payload: impl Into<PassPayload>,
    ) -> Result<PassHandle> {
        let name = name.into();
        if self.index.contains_key(&name) {
            return Err(FrameGraphError::DuplicateName { name });
        }

        let payload = payload.into();
        let kind = payload.kind();
        let slot = match payload {
            PassPayload::Raster(data) => Slot::Raster(push(&mut self.rasters, data)),
            PassPayload::Compute(data) => Slot::Compute(push(&mut self.computes, data)),
            PassPayload::Copy(data) => Slot::Copy(push(&mut self.copies, data)),
            PassPayload::Move(data) => Slot::Move(push(&mut self.moves, data)),
            PassPayload::Present(data) => Slot::Present(push(&mut self.presents, data)),
            PassPayload::Raytrace(data) => Slot::Raytrace(push(&mut self.raytraces, data)),
            PassPayload::Queue(data) => Slot::Queue(push(&mut self.queues, data)),
            PassPayload::Scene(data) => Slot::Scene(push(&mut self.scenes, data)),
            PassPayload::Blit(data) => Slot::Blit(push(&mut self.blits, data)),
            PassPayload::Dispatch(data) => Slot::Dispatch(push(&mut self.dispatches, data)),
        };

        let handle = PassHandle::new(self.vertices.len() as u32);
        log::trace!("add {} pass `{}` as {:?}", kind, name, handle);

        self.vertices.push(Vertex {
            slot,
            out_edges: Vec::new(),
            in_edges: Vec::new(),
        });
        self.objects.push(Object::default());
        self.render_data.push(RenderData::default());
        self.names.push(name.clone());
        self.index.insert(name, handle);
        Ok(handle)
    }

    /// Attach a view of `resource` to `pass` and append it to the access log.
    ///
    /// Raster views go to raster passes only, one per resource. Compute
    /// views go to raster, compute, raytrace, blit and dispatch vertices.
    pub fn add_view(
        &mut self,
        pass: PassHandle,
        resource: ResourceHandle,
        resource_name: &str,
        view: PassView,
    ) -> Result<()> {
        self.check(pass)?;
        let access = view.access();
        let slot = self.vertices[pass.index()].slot;

        match view {
            PassView::Raster(view) => {
                let Slot::Raster(offset) = slot else {
                    return Err(self.incompatible_view(pass, resource_name, "raster"));
                };
                let views = &mut self.rasters[offset as usize].raster_views;
                if views.contains_key(resource_name) {
                    return Err(FrameGraphError::DuplicateView {
                        pass: self.names[pass.index()].clone(),
                        resource: resource_name.to_string(),
                    });
                }
                views.insert(resource_name.to_string(), view);
            }
            PassView::Compute(view) => {
                let views = match slot {
                    Slot::Raster(i) => &mut self.rasters[i as usize].compute_views,
                    Slot::Compute(i) => &mut self.computes[i as usize].compute_views,
                    Slot::Raytrace(i) => &mut self.raytraces[i as usize].compute_views,
                    Slot::Blit(i) => &mut self.blits[i as usize].compute_views,
                    Slot::Dispatch(i) => &mut self.dispatches[i as usize].compute_views,
                    _ => return Err(self.incompatible_view(pass, resource_name, "compute")),
                };
                views
                    .entry(resource_name.to_string())
                    .or_default()
                    .push(view);
            }
        }

        self.record_access(pass, resource, access);
        Ok(())
    }

    /// Append a subpass to a raster pass.
    pub fn add_subpass(
        &mut self,
        pass: PassHandle,
        name: impl Into<String>,
    ) -> Result<SubpassHandle> {
        self.check(pass)?;
        let Slot::Raster(offset) = self.vertices[pass.index()].slot else {
            return Err(self.incompatible_view(pass, "", "subpass"));
        };
        let index = self.rasters[offset as usize].subpass_graph.add_subpass(name);
        Ok(SubpassHandle { pass, index })
    }

    /// Attach a view to a subpass.
    ///
    /// The access is recorded against the owning raster pass, and raster
    /// views also become attachments of the pass unless it already has one
    /// for the resource.
    pub fn add_subpass_view(
        &mut self,
        subpass: SubpassHandle,
        resource: ResourceHandle,
        resource_name: &str,
        view: PassView,
    ) -> Result<()> {
        let pass = subpass.pass;
        self.check(pass)?;
        let Slot::Raster(offset) = self.vertices[pass.index()].slot else {
            return Err(self.incompatible_view(pass, resource_name, "subpass"));
        };
        let access = view.access();
        let data = &mut self.rasters[offset as usize];
        let subpass_name = data
            .subpass_graph
            .name(subpass.index)
            .map(str::to_string)
            .ok_or_else(|| FrameGraphError::UnknownSubpass {
                pass: self.names[pass.index()].clone(),
                index: subpass.index,
            })?;
        let Some(target) = data.subpass_graph.subpass_mut(subpass.index) else {
            return Err(FrameGraphError::UnknownSubpass {
                pass: self.names[pass.index()].clone(),
                index: subpass.index,
            });
        };

        match view {
            PassView::Raster(view) => {
                if target.raster_views.contains_key(resource_name) {
                    return Err(FrameGraphError::DuplicateView {
                        pass: format!("{}/{}", self.names[pass.index()], subpass_name),
                        resource: resource_name.to_string(),
                    });
                }
                target
                    .raster_views
                    .insert(resource_name.to_string(), view.clone());
                data.raster_views
                    .entry(resource_name.to_string())
                    .or_insert(view);
            }
            PassView::Compute(view) => {
                target
                    .compute_views
                    .entry(resource_name.to_string())
                    .or_default()
                    .push(view);
            }
        }

        self.record_access(pass, resource, access);
        Ok(())
    }

    /// Make `child` part of `parent`'s scheduling unit.
    ///
    /// Ownership must stay a forest: a vertex has at most one parent and can
    /// never own one of its ancestors.
    pub fn add_ownership(&mut self, parent: PassHandle, child: PassHandle) -> Result<()> {
        self.check(parent)?;
        self.check(child)?;

        let creates_cycle = parent == child
            || self.objects[child.index()].parent.is_some()
            || self.ancestors(parent).any(|ancestor| ancestor == child);
        if creates_cycle {
            return Err(FrameGraphError::CyclicOwnership {
                parent: self.names[parent.index()].clone(),
                child: self.names[child.index()].clone(),
            });
        }

        self.objects[parent.index()].children.push(child);
        self.objects[child.index()].parent = Some(parent);
        Ok(())
    }

    /// Require `before` to run before `after` without a shared resource.
    pub fn add_ordering_hint(&mut self, before: PassHandle, after: PassHandle) -> Result<()> {
        self.check(before)?;
        self.check(after)?;
        self.hints.push((before, after));
        Ok(())
    }

    /// Append an access that is not backed by a stored view.
    pub(crate) fn record_access(
        &mut self,
        pass: PassHandle,
        resource: ResourceHandle,
        access: AccessType,
    ) {
        self.accesses.push(AccessRecord {
            pass,
            resource,
            access,
        });
    }

    /// Mutable scratch data of a pass.
    pub fn render_data_mut(&mut self, pass: PassHandle) -> Result<&mut RenderData> {
        self.check(pass)?;
        Ok(&mut self.render_data[pass.index()])
    }

    /// Remove all passes, edges and accesses, keeping allocations.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.objects.clear();
        self.names.clear();
        self.render_data.clear();
        self.index.clear();
        self.rasters.clear();
        self.computes.clear();
        self.copies.clear();
        self.moves.clear();
        self.presents.clear();
        self.raytraces.clear();
        self.queues.clear();
        self.scenes.clear();
        self.blits.clear();
        self.dispatches.clear();
        self.edges.clear();
        self.accesses.clear();
        self.hints.clear();
    }

    // ------------------------------------------------------------------------
    // Derived dependency edges
    // ------------------------------------------------------------------------

    pub(crate) fn clear_edges(&mut self) {
        self.edges.clear();
        for vertex in &mut self.vertices {
            vertex.out_edges.clear();
            vertex.in_edges.clear();
        }
    }

    pub(crate) fn add_edge(&mut self, edge: DependencyEdge) {
        let id = self.edges.len() as u32;
        self.vertices[edge.source.index()].out_edges.push(id);
        self.vertices[edge.target.index()].in_edges.push(id);
        self.edges.push(edge);
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// Number of pass vertices.
    pub fn pass_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn contains(&self, pass: PassHandle) -> bool {
        pass.index() < self.vertices.len()
    }

    /// All pass handles in insertion order.
    pub fn passes(&self) -> impl Iterator<Item = PassHandle> + '_ {
        (0..self.vertices.len() as u32).map(PassHandle::new)
    }

    /// Look up a pass by name.
    pub fn find(&self, name: &str) -> Option<PassHandle> {
        self.index.get(name).copied()
    }

    pub fn name(&self, pass: PassHandle) -> &str {
        &self.names[pass.index()]
    }

    pub fn kind(&self, pass: PassHandle) -> PassKind {
        match self.vertices[pass.index()].slot {
            Slot::Raster(_) => PassKind::Raster,
            Slot::Compute(_) => PassKind::Compute,
            Slot::Copy(_) => PassKind::Copy,
            Slot::Move(_) => PassKind::Move,
            Slot::Present(_) => PassKind::Present,
            Slot::Raytrace(_) => PassKind::Raytrace,
            Slot::Queue(_) => PassKind::Queue,
            Slot::Scene(_) => PassKind::Scene,
            Slot::Blit(_) => PassKind::Blit,
            Slot::Dispatch(_) => PassKind::Dispatch,
        }
    }

    /// Borrow the payload of a pass.
    pub fn pass(&self, pass: PassHandle) -> PassRef<'_> {
        match self.vertices[pass.index()].slot {
            Slot::Raster(i) => PassRef::Raster(&self.rasters[i as usize]),
            Slot::Compute(i) => PassRef::Compute(&self.computes[i as usize]),
            Slot::Copy(i) => PassRef::Copy(&self.copies[i as usize]),
            Slot::Move(i) => PassRef::Move(&self.moves[i as usize]),
            Slot::Present(i) => PassRef::Present(&self.presents[i as usize]),
            Slot::Raytrace(i) => PassRef::Raytrace(&self.raytraces[i as usize]),
            Slot::Queue(i) => PassRef::Queue(&self.queues[i as usize]),
            Slot::Scene(i) => PassRef::Scene(&self.scenes[i as usize]),
            Slot::Blit(i) => PassRef::Blit(&self.blits[i as usize]),
            Slot::Dispatch(i) => PassRef::Dispatch(&self.dispatches[i as usize]),
        }
    }

    /// Call the visitor method matching the pass kind.
    pub fn visit<V: PassVisitor>(&self, pass: PassHandle, visitor: &mut V) -> V::Output {
        match self.vertices[pass.index()].slot {
            Slot::Raster(i) => visitor.visit_raster(pass, &self.rasters[i as usize]),
            Slot::Compute(i) => visitor.visit_compute(pass, &self.computes[i as usize]),
            Slot::Copy(i) => visitor.visit_copy(pass, &self.copies[i as usize]),
            Slot::Move(i) => visitor.visit_move(pass, &self.moves[i as usize]),
            Slot::Present(i) => visitor.visit_present(pass, &self.presents[i as usize]),
            Slot::Raytrace(i) => visitor.visit_raytrace(pass, &self.raytraces[i as usize]),
            Slot::Queue(i) => visitor.visit_queue(pass, &self.queues[i as usize]),
            Slot::Scene(i) => visitor.visit_scene(pass, &self.scenes[i as usize]),
            Slot::Blit(i) => visitor.visit_blit(pass, &self.blits[i as usize]),
            Slot::Dispatch(i) => visitor.visit_dispatch(pass, &self.dispatches[i as usize]),
        }
    }

    /// Contiguous storage of every raster pass payload.
    pub fn raster_passes(&self) -> &[RasterPassData] {
        &self.rasters
    }

    /// Compute views of a pass, if its kind holds any.
    pub fn compute_views(&self, pass: PassHandle) -> Option<&ComputeViews> {
        match self.vertices[pass.index()].slot {
            Slot::Raster(i) => Some(&self.rasters[i as usize].compute_views),
            Slot::Compute(i) => Some(&self.computes[i as usize].compute_views),
            Slot::Raytrace(i) => Some(&self.raytraces[i as usize].compute_views),
            Slot::Blit(i) => Some(&self.blits[i as usize].compute_views),
            Slot::Dispatch(i) => Some(&self.dispatches[i as usize].compute_views),
            _ => None,
        }
    }

    pub fn render_data(&self, pass: PassHandle) -> &RenderData {
        &self.render_data[pass.index()]
    }

    /// The access log in declaration order.
    pub fn accesses(&self) -> &[AccessRecord] {
        &self.accesses
    }

    /// Explicit ordering hints in declaration order.
    pub fn ordering_hints(&self) -> &[(PassHandle, PassHandle)] {
        &self.hints
    }

    /// Dependency edges derived by the last compile.
    pub fn edges(&self) -> &[DependencyEdge] {
        &self.edges
    }

    pub fn out_edges(&self, pass: PassHandle) -> impl Iterator<Item = &DependencyEdge> + '_ {
        self.vertices[pass.index()]
            .out_edges
            .iter()
            .map(|&id| &self.edges[id as usize])
    }

    pub fn in_edges(&self, pass: PassHandle) -> impl Iterator<Item = &DependencyEdge> + '_ {
        self.vertices[pass.index()]
            .in_edges
            .iter()
            .map(|&id| &self.edges[id as usize])
    }

    pub fn children(&self, pass: PassHandle) -> &[PassHandle] {
        &self.objects[pass.index()].children
    }

    pub fn parent(&self, pass: PassHandle) -> Option<PassHandle> {
        self.objects[pass.index()].parent
    }

    /// Walks from the parent of `pass` up to its root.
    pub fn ancestors(&self, pass: PassHandle) -> impl Iterator<Item = PassHandle> + '_ {
        std::iter::successors(self.parent(pass), |&p| self.parent(p))
    }

    pub fn is_root(&self, pass: PassHandle) -> bool {
        self.objects[pass.index()].parent.is_none()
    }

    /// The ownership root whose step runs `pass`.
    pub fn root_of(&self, pass: PassHandle) -> PassHandle {
        self.ancestors(pass).last().unwrap_or(pass)
    }

    /// Descendants of `pass` in pre-order, excluding `pass` itself.
    pub fn descendants(&self, pass: PassHandle) -> Vec<PassHandle> {
        let mut result = Vec::new();
        let mut stack: Vec<PassHandle> = self.children(pass).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            result.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        result
    }

    /// Dependency graph restricted to ownership roots.
    pub fn roots(&self) -> RootGraph<'_> {
        RootGraph { graph: self }
    }

    pub(crate) fn check(&self, pass: PassHandle) -> Result<()> {
        if self.contains(pass) {
            Ok(())
        } else {
            Err(FrameGraphError::UnknownPass {
                name: format!("#{}", pass.index()),
            })
        }
    }

    fn incompatible_view(
        &self,
        pass: PassHandle,
        resource: &str,
        view: &'static str,
    ) -> FrameGraphError {
        FrameGraphError::IncompatibleView {
            pass: self.names[pass.index()].clone(),
            kind: self.kind(pass),
            resource: resource.to_string(),
            view,
        }
    }
}

impl DirectedGraph for RenderGraph {
    fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    fn vertices(&self) -> impl Iterator<Item = u32> + '_ {
        0..self.vertices.len() as u32
    }

    fn successors(&self, vertex: u32) -> impl Iterator<Item = u32> + '_ {
        self.out_edges(PassHandle::new(vertex))
            .map(|edge| edge.target.0)
    }

    fn in_degree(&self, vertex: u32) -> usize {
        self.vertices[vertex as usize].in_edges.len()
    }
}

/// The scheduling units of a graph: its ownership roots and the edges
/// between them.
#[derive(Debug, Clone, Copy)]
pub struct RootGraph<'a> {
    graph: &'a RenderGraph,
}

impl DirectedGraph for RootGraph<'_> {
    fn vertex_count(&self) -> usize {
        self.graph.vertices.len()
    }

    fn vertices(&self) -> impl Iterator<Item = u32> + '_ {
        self.graph
            .passes()
            .filter(|&pass| self.graph.is_root(pass))
            .map(|pass| pass.0)
    }

    fn successors(&self, vertex: u32) -> impl Iterator<Item = u32> + '_ {
        self.graph.successors(vertex)
    }

    fn in_degree(&self, vertex: u32) -> usize {
        self.graph.in_degree(vertex)
    }
}
