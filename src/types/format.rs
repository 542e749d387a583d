//! Pixel formats of frame graph textures.

/// Pixel format of a texture resource.
///
/// Buffers use [`Format::Unknown`]; their size is the descriptor width in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum Format {
    /// No pixel format (buffers).
    #[default]
    Unknown,

    // 8-bit
    R8Unorm,
    R8Uint,

    // 16-bit
    R16Float,
    Rg8Unorm,

    // 32-bit
    R32Float,
    R32Uint,
    Rg16Float,
    Rgba8Unorm,
    Rgba8UnormSrgb,
    Bgra8Unorm,
    Bgra8UnormSrgb,
    Rgb10a2Unorm,
    Rg11b10Float,

    // 64-bit
    Rgba16Float,
    Rg32Float,

    // 128-bit
    Rgba32Float,

    // Depth/stencil
    Depth16Unorm,
    Depth24PlusStencil8,
    Depth32Float,
    Depth32FloatStencil8,
}

impl Format {
    /// Returns true if this is a depth or stencil format.
    pub fn is_depth_stencil(&self) -> bool {
        matches!(
            self,
            Self::Depth16Unorm
                | Self::Depth24PlusStencil8
                | Self::Depth32Float
                | Self::Depth32FloatStencil8
        )
    }

    /// Returns true if this format has a stencil aspect.
    pub fn has_stencil(&self) -> bool {
        matches!(self, Self::Depth24PlusStencil8 | Self::Depth32FloatStencil8)
    }

    /// Bytes per texel. `Unknown` counts as one byte so buffer sizes pass through.
    pub fn block_size(&self) -> u32 {
        match self {
            Self::Unknown | Self::R8Unorm | Self::R8Uint => 1,
            Self::R16Float | Self::Rg8Unorm | Self::Depth16Unorm => 2,
            Self::R32Float
            | Self::R32Uint
            | Self::Rg16Float
            | Self::Rgba8Unorm
            | Self::Rgba8UnormSrgb
            | Self::Bgra8Unorm
            | Self::Bgra8UnormSrgb
            | Self::Rgb10a2Unorm
            | Self::Rg11b10Float
            | Self::Depth24PlusStencil8
            | Self::Depth32Float => 4,
            Self::Rgba16Float | Self::Rg32Float | Self::Depth32FloatStencil8 => 8,
            Self::Rgba32Float => 16,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_sizes() {
        assert_eq!(Format::Unknown.block_size(), 1);
        assert_eq!(Format::Rgba8Unorm.block_size(), 4);
        assert_eq!(Format::Rgba16Float.block_size(), 8);
        assert_eq!(Format::Rgba32Float.block_size(), 16);
    }

    #[test]
    fn test_depth_stencil() {
        assert!(Format::Depth32Float.is_depth_stencil());
        assert!(!Format::Depth32Float.has_stencil());
        assert!(Format::Depth24PlusStencil8.has_stencil());
        assert!(!Format::Bgra8UnormSrgb.is_depth_stencil());
    }
}
