//! Frame graph error types.

use thiserror::Error;

use crate::graph::PassKind;

/// Errors raised while building, compiling or executing a frame graph.
///
/// Construction errors are reported eagerly by the call that caused them and
/// leave the graph unchanged. Compile and execution errors abort the frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameGraphError {
    /// A pass name is already used in this frame.
    #[error("name `{name}` is already declared in this frame")]
    DuplicateName { name: String },

    /// A view, payload or binding refers to an undeclared resource.
    #[error("unknown resource `{name}`")]
    UnknownResource { name: String },

    /// A handle or name does not refer to a pass of this graph.
    #[error("unknown pass `{name}`")]
    UnknownPass { name: String },

    /// A subpass index is out of range for its raster pass.
    #[error("pass `{pass}` has no subpass {index}")]
    UnknownSubpass { pass: String, index: u32 },

    /// The ownership edge would give a vertex two parents or close a loop.
    #[error("`{parent}` cannot own `{child}`: ownership must form a forest")]
    CyclicOwnership { parent: String, child: String },

    /// The dependency graph has no topological order.
    #[error("cyclic dependency between passes {passes:?}")]
    CyclicDependency { passes: Vec<String> },

    /// The device (or the block allocator behind it) failed to create a resource.
    #[error("failed to create resource `{name}`: {reason}")]
    ResourceCreation { name: String, reason: String },

    /// A resource name was re-declared with a different descriptor or residency.
    #[error("resource `{name}` re-declared with an incompatible descriptor or residency")]
    IncompatibleDescriptor { name: String },

    /// The view type is not accepted by this kind of pass.
    #[error("{kind} pass `{pass}` does not accept {view} views (resource `{resource}`)")]
    IncompatibleView {
        pass: String,
        kind: PassKind,
        resource: String,
        view: &'static str,
    },

    /// A raster attachment is bound twice on the same pass or subpass.
    #[error("`{pass}` already has a raster view on `{resource}`")]
    DuplicateView { pass: String, resource: String },
}

/// Result alias used across the crate.
pub type Result<T, E = FrameGraphError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FrameGraphError::UnknownResource {
            name: "shadowMap".to_string(),
        };
        assert_eq!(err.to_string(), "unknown resource `shadowMap`");

        let err = FrameGraphError::CyclicDependency {
            passes: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "cyclic dependency between passes [\"a\", \"b\"]"
        );
    }

    #[test]
    fn test_incompatible_view_mentions_kind() {
        let err = FrameGraphError::IncompatibleView {
            pass: "upload".to_string(),
            kind: PassKind::Copy,
            resource: "albedo".to_string(),
            view: "raster",
        };
        assert_eq!(
            err.to_string(),
            "copy pass `upload` does not accept raster views (resource `albedo`)"
        );
    }
}
