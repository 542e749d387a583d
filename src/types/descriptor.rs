//! Resource descriptors and residency.

use bitflags::bitflags;

use super::Format;

/// Shape of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResourceDimension {
    #[default]
    Buffer,
    Texture1d,
    Texture2d,
    Texture3d,
}

impl ResourceDimension {
    /// Upper-case name used in logs and dumps.
    pub fn name(self) -> &'static str {
        match self {
            Self::Buffer => "BUFFER",
            Self::Texture1d => "TEXTURE1D",
            Self::Texture2d => "TEXTURE2D",
            Self::Texture3d => "TEXTURE3D",
        }
    }
}

bitflags! {
    /// Capabilities requested for a resource.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ResourceFlags: u32 {
        const ALLOW_RENDER_TARGET = 0x1;
        const ALLOW_DEPTH_STENCIL = 0x2;
        const ALLOW_UNORDERED_ACCESS = 0x4;
        const DENY_SHADER_RESOURCE = 0x8;
        const ALLOW_CROSS_ADAPTER = 0x10;
        const ALLOW_SIMULTANEOUS_ACCESS = 0x20;
        const VIDEO_DECODE_REFERENCE_ONLY = 0x40;
    }
}

impl Default for ResourceFlags {
    fn default() -> Self {
        Self::empty()
    }
}

/// Memory layout of texture texels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureLayout {
    #[default]
    Unknown,
    RowMajor,
    UndefinedSwizzle,
    StandardSwizzle,
}

/// Shape, size and capabilities of a virtual resource.
///
/// Two declarations of the same name are compatible only if their
/// descriptors compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceDesc {
    pub dimension: ResourceDimension,
    /// Required placement alignment in bytes. `0` picks the configured default.
    pub alignment: u32,
    /// Texel width, or byte size for buffers.
    pub width: u32,
    pub height: u32,
    pub depth_or_array_size: u16,
    pub mip_levels: u16,
    pub format: Format,
    pub sample_count: u32,
    pub layout: TextureLayout,
    pub flags: ResourceFlags,
}

impl ResourceDesc {
    /// A linear buffer of `size` bytes.
    pub fn buffer(size: u32, flags: ResourceFlags) -> Self {
        Self {
            width: size,
            flags,
            ..Default::default()
        }
    }

    /// A one-dimensional texture.
    pub fn texture_1d(width: u32, format: Format, flags: ResourceFlags) -> Self {
        Self {
            dimension: ResourceDimension::Texture1d,
            width,
            format,
            flags,
            ..Default::default()
        }
    }

    /// A two-dimensional texture.
    pub fn texture_2d(width: u32, height: u32, format: Format, flags: ResourceFlags) -> Self {
        Self {
            dimension: ResourceDimension::Texture2d,
            width,
            height,
            format,
            flags,
            ..Default::default()
        }
    }

    /// A volume texture.
    pub fn texture_3d(
        width: u32,
        height: u32,
        depth: u16,
        format: Format,
        flags: ResourceFlags,
    ) -> Self {
        Self {
            dimension: ResourceDimension::Texture3d,
            width,
            height,
            depth_or_array_size: depth,
            format,
            flags,
            ..Default::default()
        }
    }

    /// Set the mip level count.
    pub fn with_mip_levels(mut self, count: u16) -> Self {
        self.mip_levels = count;
        self
    }

    /// Set the array layer count (ignored for volume textures).
    pub fn with_array_size(mut self, layers: u16) -> Self {
        self.depth_or_array_size = layers;
        self
    }

    /// Set the sample count for multisampling.
    pub fn with_sample_count(mut self, count: u32) -> Self {
        self.sample_count = count;
        self
    }

    /// Set the placement alignment.
    pub fn with_alignment(mut self, alignment: u32) -> Self {
        self.alignment = alignment;
        self
    }

    /// Set the texel layout.
    pub fn with_layout(mut self, layout: TextureLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Bytes of device memory needed by the resource, before alignment.
    ///
    /// Saturates at `u64::MAX` for descriptors too large to address.
    pub fn byte_size(&self) -> u64 {
        if self.dimension == ResourceDimension::Buffer {
            return u64::from(self.width);
        }

        let texel = u64::from(self.format.block_size());
        let samples = u64::from(self.sample_count.max(1));
        let layers = match self.dimension {
            ResourceDimension::Texture3d => 1,
            _ => u64::from(self.depth_or_array_size.max(1)),
        };

        let mut texels = 0u64;
        for mip in 0..u32::from(self.mip_levels.max(1)) {
            let extent = |value: u32| u64::from(value.checked_shr(mip).unwrap_or(0).max(1));
            let w = extent(self.width);
            let h = match self.dimension {
                ResourceDimension::Texture1d => 1,
                _ => extent(self.height),
            };
            let d = match self.dimension {
                ResourceDimension::Texture3d => extent(u32::from(self.depth_or_array_size)),
                _ => 1,
            };
            texels = texels.saturating_add(w.saturating_mul(h).saturating_mul(d));
        }

        texels
            .saturating_mul(layers)
            .saturating_mul(texel)
            .saturating_mul(samples)
    }
}

impl Default for ResourceDesc {
    fn default() -> Self {
        Self {
            dimension: ResourceDimension::Buffer,
            alignment: 0,
            width: 0,
            height: 1,
            depth_or_array_size: 1,
            mip_levels: 1,
            format: Format::Unknown,
            sample_count: 1,
            layout: TextureLayout::Unknown,
            flags: ResourceFlags::empty(),
        }
    }
}

/// Who owns a resource's storage and how long it lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Residency {
    /// Transient, created and destroyed by the graph; may be aliased.
    #[default]
    Managed,
    /// Tile-local storage that never reaches main memory.
    Memoryless,
    /// Survives the frame; owned by the caller once created.
    Persistent,
    /// The presentation surface.
    Backbuffer,
    /// Imported from outside the graph.
    External,
}

impl Residency {
    /// Upper-case name used in logs and dumps.
    pub fn name(self) -> &'static str {
        match self {
            Self::Managed => "MANAGED",
            Self::Memoryless => "MEMORYLESS",
            Self::Persistent => "PERSISTENT",
            Self::Backbuffer => "BACKBUFFER",
            Self::External => "EXTERNAL",
        }
    }

    /// Whether storage comes from the frame graph's aliasing pool.
    pub fn is_transient(self) -> bool {
        self == Self::Managed
    }

    /// Whether the executor must receive a device handle from the caller.
    pub fn requires_binding(self) -> bool {
        matches!(self, Self::Backbuffer | Self::External)
    }
}

/// Per-resource traits kept alongside the descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ResourceTraits {
    pub residency: Residency,
}

impl ResourceTraits {
    pub fn new(residency: Residency) -> Self {
        Self { residency }
    }

    /// Persistent and backbuffer resources outlive the frame, so writes to
    /// them are observable and their writers are never culled.
    pub fn has_side_effects(&self) -> bool {
        matches!(self.residency, Residency::Persistent | Residency::Backbuffer)
    }
}

impl From<Residency> for ResourceTraits {
    fn from(residency: Residency) -> Self {
        Self::new(residency)
    }
}
