//! Device abstraction used by the executor.
//!
//! The frame graph never talks to a graphics API directly. Backends implement
//! [`Device`]; the executor calls it to create resources right before their
//! first use and to destroy them right after their last.

#[cfg(feature = "dummy")]
mod dummy;

#[cfg(feature = "dummy")]
pub use dummy::{DeviceEvent, DummyDevice};

use thiserror::Error;

use crate::allocator::Allocation;
use crate::types::{Format, Residency, ResourceDesc, ResourceDimension};

/// Opaque handle to a device object (resource or view).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceHandle(pub u64);

/// Errors reported by a [`Device`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("out of device memory")]
    OutOfMemory,
    #[error("unsupported resource: {0}")]
    Unsupported(String),
    #[error("invalid device handle {0:?}")]
    InvalidHandle(DeviceHandle),
    #[error("device lost")]
    DeviceLost,
    #[error("device error: {0}")]
    Internal(String),
}

/// Everything a device needs to create one frame graph resource.
#[derive(Debug, Clone, Copy)]
pub struct ResourceCreateInfo<'a> {
    pub name: &'a str,
    pub desc: &'a ResourceDesc,
    pub residency: Residency,
    /// Placement in pooled memory for aliased resources, `None` for
    /// dedicated allocations.
    pub allocation: Option<Allocation>,
}

/// Subresource range of a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewDescriptor {
    pub dimension: ResourceDimension,
    pub format: Format,
    pub base_mip: u32,
    pub mip_count: u32,
    pub base_layer: u32,
    pub layer_count: u32,
}

impl ViewDescriptor {
    /// A view covering every mip and layer of `desc`.
    pub fn full(desc: &ResourceDesc) -> Self {
        let layer_count = match desc.dimension {
            ResourceDimension::Texture3d => 1,
            _ => u32::from(desc.depth_or_array_size.max(1)),
        };
        Self {
            dimension: desc.dimension,
            format: desc.format,
            base_mip: 0,
            mip_count: u32::from(desc.mip_levels.max(1)),
            base_layer: 0,
            layer_count,
        }
    }
}

/// Graphics device collaborator.
///
/// Methods take `&self`; implementations synchronize internally so a device
/// can be shared with worker threads.
pub trait Device: Send + Sync {
    fn create_resource(&self, info: &ResourceCreateInfo<'_>) -> Result<DeviceHandle, DeviceError>;

    /// Destroy a resource or view.
    fn destroy_resource(&self, handle: DeviceHandle) -> Result<(), DeviceError>;

    fn create_view(
        &self,
        resource: DeviceHandle,
        desc: &ViewDescriptor,
    ) -> Result<DeviceHandle, DeviceError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResourceFlags;

    #[test]
    fn test_full_view_of_array_texture() {
        let desc = ResourceDesc::texture_2d(64, 64, Format::Rgba16Float, ResourceFlags::empty())
            .with_mip_levels(4)
            .with_array_size(6);
        let view = ViewDescriptor::full(&desc);
        assert_eq!(view.mip_count, 4);
        assert_eq!(view.layer_count, 6);
        assert_eq!(view.format, Format::Rgba16Float);
    }

    #[test]
    fn test_full_view_of_volume() {
        let desc = ResourceDesc::texture_3d(32, 32, 32, Format::R8Unorm, ResourceFlags::empty());
        assert_eq!(ViewDescriptor::full(&desc).layer_count, 1);
    }

    #[test]
    fn test_device_error_display() {
        assert_eq!(DeviceError::OutOfMemory.to_string(), "out of device memory");
        assert_eq!(
            DeviceError::Internal("boom".into()).to_string(),
            "device error: boom"
        );
    }
}
