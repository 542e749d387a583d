//! Typed dispatch over pass vertices.

use super::pass::{
    Blit, ComputePassData, CopyPassData, Dispatch, MovePassData, PresentPassData, RasterPassData,
    RaytracePassData, RenderQueueData, SceneData,
};
use super::PassHandle;

/// Visitor with one method per pass kind.
///
/// [`RenderGraph::visit`](super::RenderGraph::visit) calls exactly the method
/// matching the vertex kind. Adding a kind breaks every visitor at compile time.
pub trait PassVisitor {
    type Output;

    fn visit_raster(&mut self, pass: PassHandle, data: &RasterPassData) -> Self::Output;
    fn visit_compute(&mut self, pass: PassHandle, data: &ComputePassData) -> Self::Output;
    fn visit_copy(&mut self, pass: PassHandle, data: &CopyPassData) -> Self::Output;
    fn visit_move(&mut self, pass: PassHandle, data: &MovePassData) -> Self::Output;
    fn visit_present(&mut self, pass: PassHandle, data: &PresentPassData) -> Self::Output;
    fn visit_raytrace(&mut self, pass: PassHandle, data: &RaytracePassData) -> Self::Output;
    fn visit_queue(&mut self, pass: PassHandle, data: &RenderQueueData) -> Self::Output;
    fn visit_scene(&mut self, pass: PassHandle, data: &SceneData) -> Self::Output;
    fn visit_blit(&mut self, pass: PassHandle, data: &Blit) -> Self::Output;
    fn visit_dispatch(&mut self, pass: PassHandle, data: &Dispatch) -> Self::Output;
}
