//! Subpass merge detection.
//!
//! Consecutive subpasses of a raster pass can share one render pass when
//! their shared attachments agree on attachment type and load/store ops and
//! nothing written by one is read back through a shader binding by the other.

use crate::graph::{
    Blit, ComputePassData, CopyPassData, Dispatch, MovePassData, PassHandle, PassVisitor,
    PresentPassData, RasterPassData, RasterSubpass, RaytracePassData, RenderQueueData, SceneData,
    SubpassGraph,
};

/// Returns true if `later` can run in the same render pass as `earlier`.
pub fn can_merge(earlier: &RasterSubpass, later: &RasterSubpass) -> bool {
    for (name, view) in &earlier.raster_views {
        if let Some(other) = later.raster_views.get(name) {
            if !view.is_compatible_with(other) {
                return false;
            }
        }
    }

    for (name, access) in earlier.accesses() {
        if !access.is_write() {
            continue;
        }
        // A written attachment can be read back only as a tile-local attachment.
        if later.reads_in_shader(name) {
            return false;
        }
        if earlier.writes_in_shader(name) && later.reads(name) {
            return false;
        }
    }
    true
}

/// Greedy grouping of consecutive subpasses.
///
/// A subpass joins the current group if it can merge with every member;
/// otherwise it starts a new group. Disabled merging yields one group per
/// subpass.
pub fn merge_groups(subpasses: &SubpassGraph, enabled: bool) -> Vec<Vec<u32>> {
    let mut groups: Vec<Vec<u32>> = Vec::new();
    for (index, _, subpass) in subpasses.iter() {
        let joins = enabled
            && groups.last().is_some_and(|group| {
                group.iter().all(|&member| {
                    subpasses
                        .subpass(member)
                        .is_some_and(|earlier| can_merge(earlier, subpass))
                })
            });
        if joins {
            if let Some(group) = groups.last_mut() {
                group.push(index);
                continue;
            }
        }
        groups.push(vec![index]);
    }
    groups
}

/// Collects merge groups for raster passes; other kinds have none.
pub(crate) struct MergeVisitor {
    pub enabled: bool,
}

impl PassVisitor for MergeVisitor {
    type Output = Vec<Vec<u32>>;

    fn visit_raster(&mut self, _: PassHandle, data: &RasterPassData) -> Self::Output {
        merge_groups(&data.subpass_graph, self.enabled)
    }

    fn visit_compute(&mut self, _: PassHandle, _: &ComputePassData) -> Self::Output {
        Vec::new()
    }

    fn visit_copy(&mut self, _: PassHandle, _: &CopyPassData) -> Self::Output {
        Vec::new()
    }

    fn visit_move(&mut self, _: PassHandle, _: &MovePassData) -> Self::Output {
        Vec::new()
    }

    fn visit_present(&mut self, _: PassHandle, _: &PresentPassData) -> Self::Output {
        Vec::new()
    }

    fn visit_raytrace(&mut self, _: PassHandle, _: &RaytracePassData) -> Self::Output {
        Vec::new()
    }

    fn visit_queue(&mut self, _: PassHandle, _: &RenderQueueData) -> Self::Output {
        Vec::new()
    }

    fn visit_scene(&mut self, _: PassHandle, _: &SceneData) -> Self::Output {
        Vec::new()
    }

    fn visit_blit(&mut self, _: PassHandle, _: &Blit) -> Self::Output {
        Vec::new()
    }

    fn visit_dispatch(&mut self, _: PassHandle, _: &Dispatch) -> Self::Output {
        Vec::new()
    }
}
