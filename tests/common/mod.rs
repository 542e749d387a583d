//! Shared helpers for frame graph integration tests.

#![allow(dead_code)]

use redlilium_framegraph::{
    AccessType, ComputePassData, ComputeView, Format, FrameGraph, FrameGraphConfig, PassHandle,
    PresentPassData, RasterPassData, RasterView, ResourceDesc, ResourceFlags,
};

/// Route `log` output through the test harness.
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn color_target() -> ResourceDesc {
    ResourceDesc::texture_2d(1920, 1080, Format::Rgba8Unorm, ResourceFlags::ALLOW_RENDER_TARGET)
}

pub fn depth_target() -> ResourceDesc {
    ResourceDesc::texture_2d(1920, 1080, Format::Depth32Float, ResourceFlags::ALLOW_DEPTH_STENCIL)
}

pub fn storage_texture(width: u32) -> ResourceDesc {
    ResourceDesc::texture_2d(
        width,
        width,
        Format::Rgba16Float,
        ResourceFlags::ALLOW_UNORDERED_ACCESS,
    )
}

/// Passes of the forward frame built by [`forward_frame`].
pub struct ForwardPasses {
    pub opaque: PassHandle,
    pub ui: PassHandle,
    pub present: PassHandle,
    pub post: PassHandle,
}

/// Opaque writes color and depth, ui draws over color, present reads
/// color, and a post pass declared last writes its own depth buffer.
pub fn forward_frame(config: FrameGraphConfig) -> (FrameGraph, ForwardPasses) {
    let mut frame = FrameGraph::with_config(config);
    frame.declare_resource("colorTarget", color_target()).unwrap();
    frame.declare_resource("depth", depth_target()).unwrap();

    let opaque = frame.add_pass("opaque", RasterPassData::default()).unwrap();
    frame
        .add_view(opaque, "colorTarget", RasterView::new("color0"))
        .unwrap();
    frame
        .add_view(opaque, "depth", RasterView::depth_stencil("depth"))
        .unwrap();

    let ui = frame.add_pass("ui", RasterPassData::default()).unwrap();
    frame
        .add_view(ui, "colorTarget", RasterView::new("color0"))
        .unwrap();

    let present = frame
        .add_pass("present", PresentPassData::new("colorTarget"))
        .unwrap();

    frame.declare_resource("postDepth", depth_target()).unwrap();
    let post = frame.add_pass("post", RasterPassData::default()).unwrap();
    frame
        .add_view(post, "colorTarget", ComputeView::read("colorTarget"))
        .unwrap();
    frame
        .add_view(post, "postDepth", RasterView::depth_stencil("depth"))
        .unwrap();

    (
        frame,
        ForwardPasses {
            opaque,
            ui,
            present,
            post,
        },
    )
}

/// Add a compute pass with one compute view per `(resource, access)`.
pub fn compute_pass(
    frame: &mut FrameGraph,
    name: &str,
    views: &[(&str, AccessType)],
) -> PassHandle {
    let pass = frame.add_pass(name, ComputePassData::default()).unwrap();
    for &(resource, access) in views {
        frame
            .add_view(pass, resource, ComputeView::new(resource, access))
            .unwrap();
    }
    pass
}

/// A chain of `len` compute passes, each reading the previous pass's
/// output and writing its own.
pub fn chain_frame(len: usize, config: FrameGraphConfig) -> FrameGraph {
    let mut frame = FrameGraph::with_config(config);
    for i in 0..len {
        frame
            .declare_resource(&format!("tex{i}"), storage_texture(256))
            .unwrap();
    }
    for i in 0..len {
        let input = i.checked_sub(1).map(|prev| format!("tex{prev}"));
        let output = format!("tex{i}");
        let mut views = Vec::new();
        if let Some(input) = &input {
            views.push((input.as_str(), AccessType::Read));
        }
        views.push((output.as_str(), AccessType::Write));
        compute_pass(&mut frame, &format!("pass{i}"), &views);
    }
    frame
}

/// Independent branches that join in a final pass.
pub fn fan_in_frame(branches: usize, config: FrameGraphConfig) -> FrameGraph {
    let mut frame = FrameGraph::with_config(config);
    for i in 0..branches {
        frame
            .declare_resource(&format!("branch{i}"), storage_texture(128))
            .unwrap();
    }
    frame.declare_resource("result", storage_texture(128)).unwrap();

    for i in 0..branches {
        let name = format!("branch{i}");
        compute_pass(&mut frame, &format!("produce{i}"), &[(name.as_str(), AccessType::Write)]);
    }
    let names: Vec<String> = (0..branches).map(|i| format!("branch{i}")).collect();
    let mut views: Vec<(&str, AccessType)> = names
        .iter()
        .map(|name| (name.as_str(), AccessType::Read))
        .collect();
    views.push(("result", AccessType::Write));
    compute_pass(&mut frame, "combine", &views);
    frame
}
