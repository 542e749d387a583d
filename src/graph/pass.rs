//! Pass kinds and their payloads.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::device::DeviceHandle;
use crate::types::{ComputeView, CopyPair, MovePair, RasterView};

use super::subpass::SubpassGraph;

/// The ten kinds of pass vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PassKind {
    Raster,
    Compute,
    Copy,
    Move,
    Present,
    Raytrace,
    Queue,
    Scene,
    Blit,
    Dispatch,
}

impl PassKind {
    pub const ALL: [PassKind; 10] = [
        Self::Raster,
        Self::Compute,
        Self::Copy,
        Self::Move,
        Self::Present,
        Self::Raytrace,
        Self::Queue,
        Self::Scene,
        Self::Blit,
        Self::Dispatch,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Raster => "raster",
            Self::Compute => "compute",
            Self::Copy => "copy",
            Self::Move => "move",
            Self::Present => "present",
            Self::Raytrace => "raytrace",
            Self::Queue => "queue",
            Self::Scene => "scene",
            Self::Blit => "blit",
            Self::Dispatch => "dispatch",
        }
    }

    /// Only raster passes bind attachments.
    pub fn accepts_raster_views(self) -> bool {
        self == Self::Raster
    }

    /// Kinds that bind shader resources.
    ///
    /// Blit and dispatch vertices usually hang under a raster or compute
    /// pass; their views are attributed to that ancestor when scheduling.
    pub fn accepts_compute_views(self) -> bool {
        matches!(
            self,
            Self::Raster | Self::Compute | Self::Raytrace | Self::Blit | Self::Dispatch
        )
    }
}

impl fmt::Display for PassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Compute views of one pass, keyed by resource name.
///
/// A resource may be bound more than once (e.g. sampled and written as storage).
pub type ComputeViews = BTreeMap<String, Vec<ComputeView>>;

// ============================================================================
// Payloads
// ============================================================================

/// Attachments, shader bindings and subpasses of a raster pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RasterPassData {
    /// Attachments keyed by resource name.
    pub raster_views: BTreeMap<String, RasterView>,
    pub compute_views: ComputeViews,
    pub subpass_graph: SubpassGraph,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComputePassData {
    pub compute_views: ComputeViews,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RaytracePassData {
    pub compute_views: ComputeViews,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyPassData {
    pub copy_pairs: Vec<CopyPair>,
}

impl CopyPassData {
    pub fn new(copy_pairs: Vec<CopyPair>) -> Self {
        Self { copy_pairs }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovePassData {
    pub move_pairs: Vec<MovePair>,
}

impl MovePassData {
    pub fn new(move_pairs: Vec<MovePair>) -> Self {
        Self { move_pairs }
    }
}

/// Presents a resource to the display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresentPassData {
    pub resource_name: String,
    pub sync_interval: u32,
    pub flags: u32,
}

impl PresentPassData {
    pub fn new(resource_name: impl Into<String>) -> Self {
        Self {
            resource_name: resource_name.into(),
            sync_interval: 0,
            flags: 0,
        }
    }
}

/// Which part of the render queue a queue vertex draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QueueHint {
    None,
    #[default]
    Opaque,
    Mask,
    Blend,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderQueueData {
    pub hint: QueueHint,
}

/// Opaque reference to a camera owned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CameraHandle(pub u64);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SceneData {
    pub name: String,
    pub camera: Option<CameraHandle>,
    pub scenes: Vec<String>,
}

/// Full-screen shader draw.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blit {
    pub shader: String,
    pub compute_views: ComputeViews,
}

impl Blit {
    pub fn new(shader: impl Into<String>) -> Self {
        Self {
            shader: shader.into(),
            compute_views: ComputeViews::new(),
        }
    }
}

/// Compute dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub shader: String,
    pub thread_group_count_x: u32,
    pub thread_group_count_y: u32,
    pub thread_group_count_z: u32,
    pub compute_views: ComputeViews,
}

impl Dispatch {
    pub fn new(shader: impl Into<String>, x: u32, y: u32, z: u32) -> Self {
        Self {
            shader: shader.into(),
            thread_group_count_x: x,
            thread_group_count_y: y,
            thread_group_count_z: z,
            compute_views: ComputeViews::new(),
        }
    }
}

impl Default for Dispatch {
    fn default() -> Self {
        Self::new(String::new(), 1, 1, 1)
    }
}

/// Payload of a new pass, as accepted by `add_pass`.
#[derive(Debug, Clone, PartialEq)]
pub enum PassPayload {
    Raster(RasterPassData),
    Compute(ComputePassData),
    Copy(CopyPassData),
    Move(MovePassData),
    Present(PresentPassData),
    Raytrace(RaytracePassData),
    Queue(RenderQueueData),
    Scene(SceneData),
    Blit(Blit),
    Dispatch(Dispatch),
}

impl PassPayload {
    pub fn kind(&self) -> PassKind {
        match self {
            Self::Raster(_) => PassKind::Raster,
            Self::Compute(_) => PassKind::Compute,
            Self::Copy(_) => PassKind::Copy,
            Self::Move(_) => PassKind::Move,
            Self::Present(_) => PassKind::Present,
            Self::Raytrace(_) => PassKind::Raytrace,
            Self::Queue(_) => PassKind::Queue,
            Self::Scene(_) => PassKind::Scene,
            Self::Blit(_) => PassKind::Blit,
            Self::Dispatch(_) => PassKind::Dispatch,
        }
    }

    /// Resource names the payload itself touches, with their access.
    ///
    /// Copy and move pairs read the source and write the target; a present
    /// pass reads the presented resource.
    pub fn implicit_accesses(&self) -> Vec<(&str, crate::types::AccessType)> {
        use crate::types::AccessType;

        match self {
            Self::Copy(data) => data
                .copy_pairs
                .iter()
                .flat_map(|pair| {
                    [
                        (pair.source.as_str(), AccessType::Read),
                        (pair.target.as_str(), AccessType::Write),
                    ]
                })
                .collect(),
            Self::Move(data) => data
                .move_pairs
                .iter()
                .flat_map(|pair| {
                    [
                        (pair.source.as_str(), AccessType::Read),
                        (pair.target.as_str(), AccessType::Write),
                    ]
                })
                .collect(),
            Self::Present(data) => vec![(data.resource_name.as_str(), AccessType::Read)],
            _ => Vec::new(),
        }
    }
}

macro_rules! impl_payload_from {
    ($($data:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$data> for PassPayload {
                fn from(data: $data) -> Self {
                    Self::$variant(data)
                }
            }
        )*
    };
}

impl_payload_from! {
    RasterPassData => Raster,
    ComputePassData => Compute,
    CopyPassData => Copy,
    MovePassData => Move,
    PresentPassData => Present,
    RaytracePassData => Raytrace,
    RenderQueueData => Queue,
    SceneData => Scene,
    Blit => Blit,
    Dispatch => Dispatch,
}

/// Borrowed view of a pass payload.
#[derive(Debug, Clone, Copy)]
pub enum PassRef<'a> {
    Raster(&'a RasterPassData),
    Compute(&'a ComputePassData),
    Copy(&'a CopyPassData),
    Move(&'a MovePassData),
    Present(&'a PresentPassData),
    Raytrace(&'a RaytracePassData),
    Queue(&'a RenderQueueData),
    Scene(&'a SceneData),
    Blit(&'a Blit),
    Dispatch(&'a Dispatch),
}

impl PassRef<'_> {
    pub fn kind(&self) -> PassKind {
        match self {
            Self::Raster(_) => PassKind::Raster,
            Self::Compute(_) => PassKind::Compute,
            Self::Copy(_) => PassKind::Copy,
            Self::Move(_) => PassKind::Move,
            Self::Present(_) => PassKind::Present,
            Self::Raytrace(_) => PassKind::Raytrace,
            Self::Queue(_) => PassKind::Queue,
            Self::Scene(_) => PassKind::Scene,
            Self::Blit(_) => PassKind::Blit,
            Self::Dispatch(_) => PassKind::Dispatch,
        }
    }
}

/// Per-pass scratch data handed to pass callbacks.
///
/// Keys are shader binding ids chosen by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderData {
    pub constants: HashMap<u32, Vec<u8>>,
    pub buffers: HashMap<u32, DeviceHandle>,
    pub textures: HashMap<u32, DeviceHandle>,
    pub samplers: HashMap<u32, DeviceHandle>,
}

impl RenderData {
    pub fn is_empty(&self) -> bool {
        self.constants.is_empty()
            && self.buffers.is_empty()
            && self.textures.is_empty()
            && self.samplers.is_empty()
    }
}
