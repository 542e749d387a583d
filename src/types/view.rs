//! Views: how a pass touches a resource.

use bitflags::bitflags;

/// Read/write intent of a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessType {
    Read,
    ReadWrite,
    Write,
}

impl AccessType {
    /// Returns true if this access reads the resource.
    pub fn is_read(self) -> bool {
        matches!(self, Self::Read | Self::ReadWrite)
    }

    /// Returns true if this access writes the resource.
    pub fn is_write(self) -> bool {
        matches!(self, Self::Write | Self::ReadWrite)
    }
}

/// Attachment slot kind of a raster view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AttachmentType {
    #[default]
    RenderTarget,
    DepthStencil,
}

/// What happens to attachment contents when a render pass begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LoadOp {
    #[default]
    Load,
    Clear,
    Discard,
}

/// What happens to attachment contents when a render pass ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StoreOp {
    #[default]
    Store,
    Discard,
}

bitflags! {
    /// Aspects cleared by a view.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearFlags: u32 {
        const COLOR = 0x1;
        const DEPTH = 0x2;
        const STENCIL = 0x4;
        const DEPTH_STENCIL = Self::DEPTH.bits() | Self::STENCIL.bits();
    }
}

impl Default for ClearFlags {
    fn default() -> Self {
        Self::empty()
    }
}

/// Clear value, interpreted as RGBA or depth/stencil depending on the attachment.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClearColor {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl ClearColor {
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }
}

// NaN clear values are not supported.
impl Eq for ClearColor {}

/// How a compute clear value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ClearValueType {
    #[default]
    Float,
    Int,
}

// ============================================================================
// Raster View
// ============================================================================

/// An attachment binding of a raster pass or subpass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterView {
    /// Shader-visible slot the attachment binds to.
    pub slot_name: String,
    pub access: AccessType,
    pub attachment: AttachmentType,
    pub load_op: LoadOp,
    pub store_op: StoreOp,
    pub clear_flags: ClearFlags,
    pub clear_color: ClearColor,
}

impl RasterView {
    /// A written render target that loads and stores its contents.
    pub fn new(slot_name: impl Into<String>) -> Self {
        Self {
            slot_name: slot_name.into(),
            access: AccessType::Write,
            attachment: AttachmentType::RenderTarget,
            load_op: LoadOp::Load,
            store_op: StoreOp::Store,
            clear_flags: ClearFlags::all(),
            clear_color: ClearColor::default(),
        }
    }

    /// A written depth-stencil attachment.
    pub fn depth_stencil(slot_name: impl Into<String>) -> Self {
        Self {
            attachment: AttachmentType::DepthStencil,
            ..Self::new(slot_name)
        }
    }

    pub fn with_access(mut self, access: AccessType) -> Self {
        self.access = access;
        self
    }

    pub fn with_load_op(mut self, load_op: LoadOp) -> Self {
        self.load_op = load_op;
        self
    }

    pub fn with_store_op(mut self, store_op: StoreOp) -> Self {
        self.store_op = store_op;
        self
    }

    /// Clear to `color` when the render pass begins.
    pub fn with_clear(mut self, color: ClearColor) -> Self {
        self.load_op = LoadOp::Clear;
        self.clear_color = color;
        self
    }

    /// Whether two views of one resource can live in the same render pass.
    pub fn is_compatible_with(&self, other: &RasterView) -> bool {
        self.attachment == other.attachment
            && self.load_op == other.load_op
            && self.store_op == other.store_op
    }
}

// ============================================================================
// Compute View
// ============================================================================

/// A shader binding of a resource (sampled, storage or uniform).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputeView {
    /// Shader-visible binding name.
    pub name: String,
    pub access: AccessType,
    pub clear_flags: ClearFlags,
    pub clear_color: ClearColor,
    pub clear_value_type: ClearValueType,
}

impl ComputeView {
    pub fn new(name: impl Into<String>, access: AccessType) -> Self {
        Self {
            name: name.into(),
            access,
            clear_flags: ClearFlags::empty(),
            clear_color: ClearColor::default(),
            clear_value_type: ClearValueType::Float,
        }
    }

    pub fn read(name: impl Into<String>) -> Self {
        Self::new(name, AccessType::Read)
    }

    pub fn write(name: impl Into<String>) -> Self {
        Self::new(name, AccessType::Write)
    }

    pub fn read_write(name: impl Into<String>) -> Self {
        Self::new(name, AccessType::ReadWrite)
    }

    /// Clear the bound range before the pass runs.
    pub fn with_clear(
        mut self,
        flags: ClearFlags,
        color: ClearColor,
        value_type: ClearValueType,
    ) -> Self {
        self.clear_flags = flags;
        self.clear_color = color;
        self.clear_value_type = value_type;
        self
    }

    /// Returns true if the view clears anything.
    pub fn is_clear_view(&self) -> bool {
        !self.clear_flags.is_empty()
    }
}

/// Either kind of view, as accepted by `add_view`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassView {
    Raster(RasterView),
    Compute(ComputeView),
}

impl PassView {
    pub fn access(&self) -> AccessType {
        match self {
            Self::Raster(view) => view.access,
            Self::Compute(view) => view.access,
        }
    }

    /// Short name of the view type, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Raster(_) => "raster",
            Self::Compute(_) => "compute",
        }
    }
}

impl From<RasterView> for PassView {
    fn from(view: RasterView) -> Self {
        Self::Raster(view)
    }
}

impl From<ComputeView> for PassView {
    fn from(view: ComputeView) -> Self {
        Self::Compute(view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_type_read_write() {
        assert!(AccessType::Read.is_read());
        assert!(!AccessType::Read.is_write());
        assert!(AccessType::Write.is_write());
        assert!(!AccessType::Write.is_read());
        assert!(AccessType::ReadWrite.is_read());
        assert!(AccessType::ReadWrite.is_write());
    }

    #[test]
    fn test_raster_view_defaults() {
        let view = RasterView::new("color0");
        assert_eq!(view.access, AccessType::Write);
        assert_eq!(view.attachment, AttachmentType::RenderTarget);
        assert_eq!(view.load_op, LoadOp::Load);
        assert_eq!(view.store_op, StoreOp::Store);
        assert_eq!(view.clear_flags, ClearFlags::all());
    }

    #[test]
    fn test_compute_view_defaults() {
        let view = ComputeView::read("albedo");
        assert_eq!(view.access, AccessType::Read);
        assert!(!view.is_clear_view());
        assert_eq!(view.clear_value_type, ClearValueType::Float);
    }

    #[test]
    fn test_compatibility_compares_ops() {
        let a = RasterView::new("a");
        let b = RasterView::new("b").with_access(AccessType::ReadWrite);
        assert!(a.is_compatible_with(&b));
        assert!(!a.is_compatible_with(&b.clone().with_clear(ClearColor::BLACK)));
        assert!(!a.is_compatible_with(&RasterView::depth_stencil("d")));
    }

    #[test]
    fn test_depth_stencil_flags() {
        assert_eq!(
            ClearFlags::DEPTH_STENCIL,
            ClearFlags::DEPTH | ClearFlags::STENCIL
        );
    }
}
