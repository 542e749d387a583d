//! # RedLilium Frame Graph
//!
//! Declarative description of one rendered frame, compiled into an
//! executable plan.
//!
//! Callers declare named virtual resources, add passes of ten kinds, attach
//! views that say how each pass reads or writes each resource, and group
//! passes with ownership edges. Compiling the frame produces a [`Plan`]:
//!
//! - pass dependencies resolved from the order views were declared
//!   (read-after-write, write-after-write, write-after-read)
//! - a deterministic topological order of the scheduling units
//! - first/last use of every transient resource
//! - pool blocks shared by transient resources whose lifetimes do not overlap
//! - subpasses of raster passes grouped into merged render passes
//!
//! The [`Executor`] walks a plan against a [`Device`], creating resources
//! right before their first use and destroying them right after their last,
//! either sequentially or on a pool of worker threads.
//!
//! # Module Contents
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`types`] | Descriptors, formats, views, copy/move pairs |
//! | [`resource`] | [`ResourceRegistry`] of named virtual resources |
//! | [`graph`] | [`RenderGraph`]: pass vertices, payloads, edges, ownership |
//! | [`compiler`] | [`Compiler`] and the [`Plan`] it produces |
//! | [`allocator`] | Block sub-allocation of device memory |
//! | [`device`] | [`Device`] abstraction and the recording [`DummyDevice`] |
//! | [`executor`] | Sequential and parallel plan execution |
//!
//! # Example
//!
//! ```ignore
//! let mut frame = FrameGraph::new();
//! frame.declare_resource("color", ResourceDesc::texture_2d(1920, 1080, Format::Rgba8Unorm,
//!     ResourceFlags::ALLOW_RENDER_TARGET))?;
//! frame.declare_resource_with_residency("swapchain", desc, Residency::Backbuffer)?;
//!
//! let opaque = frame.add_pass("opaque", RasterPassData::default())?;
//! frame.add_view(opaque, "color", RasterView::new("color0"))?;
//! frame.add_pass("present", PresentPassData::new("color"))?;
//!
//! let plan = frame.compile()?;
//! let report = frame.execute(&plan, &device, &mut allocator)?;
//! ```

pub mod allocator;
pub mod compiler;
pub mod config;
pub mod device;
pub mod error;
pub mod executor;
pub mod frame;
pub mod graph;
pub mod resource;
pub mod types;

pub use allocator::{Allocation, AllocationHandle, Allocator, BlockAllocator};
pub use compiler::{
    BlockHandle, CompileState, Compiler, Lifetime, Plan, PlanStep, PoolBlock, ResourcePlan,
};
pub use config::FrameGraphConfig;
pub use device::{Device, DeviceError, DeviceHandle, ResourceCreateInfo, ViewDescriptor};
#[cfg(feature = "dummy")]
pub use device::{DeviceEvent, DummyDevice};
pub use error::{FrameGraphError, Result};
pub use executor::{ExecutionReport, Executor, PassCallback, PassContext, ResolvedResource};
pub use frame::FrameGraph;
pub use graph::{
    Blit, CameraHandle, ComputePassData, CopyPassData, DependencyEdge, Dispatch, MovePassData,
    PassHandle, PassKind, PassPayload, PassRef, PassVisitor, PresentPassData, QueueHint,
    RasterPassData, RasterSubpass, RaytracePassData, RenderData, RenderGraph, RenderQueueData,
    SceneData, SubpassGraph, SubpassHandle,
};
pub use resource::{ResourceHandle, ResourceRegistry};
pub use types::{
    AccessType, AttachmentType, ClearColor, ClearFlags, ClearValueType, ComputeView, CopyPair,
    Format, LoadOp, MovePair, PassView, RasterView, Residency, ResourceDesc, ResourceDimension,
    ResourceFlags, ResourceTraits, StoreOp, TextureLayout,
};

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Announces the frame graph in the log.
///
/// Hosts call this once after installing their logger.
pub fn init() {
    log::info!("RedLilium frame graph v{}", VERSION);
}
