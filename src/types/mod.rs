//! Plain data types shared by the registry, the graph and the executor.
//!
//! - [`ResourceDesc`], [`ResourceFlags`], [`Residency`] describe resources
//! - [`RasterView`] and [`ComputeView`] describe how a pass touches one
//! - [`CopyPair`] and [`MovePair`] are the payload of transfer passes

mod descriptor;
mod format;
mod transfer;
mod view;

pub use descriptor::{
    Residency, ResourceDesc, ResourceDimension, ResourceFlags, ResourceTraits, TextureLayout,
};
pub use format::Format;
pub use transfer::{CopyPair, MovePair, ALL_SUBRESOURCES};
pub use view::{
    AccessType, AttachmentType, ClearColor, ClearFlags, ClearValueType, ComputeView, LoadOp,
    PassView, RasterView, StoreOp,
};
