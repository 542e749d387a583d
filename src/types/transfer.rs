//! Copy and move pairs carried by transfer passes.

/// Sentinel for "every remaining mip level / array slice".
pub const ALL_SUBRESOURCES: u32 = u32::MAX;

/// A copy from one named resource to another.
///
/// The source is read and the target is written. Subresource ranges default
/// to the whole resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CopyPair {
    pub source: String,
    pub target: String,
    pub mip_levels: u32,
    pub num_slices: u32,
    pub source_most_detailed_mip: u32,
    pub source_first_slice: u32,
    pub source_plane_slice: u32,
    pub target_most_detailed_mip: u32,
    pub target_first_slice: u32,
    pub target_plane_slice: u32,
}

impl CopyPair {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            mip_levels: ALL_SUBRESOURCES,
            num_slices: ALL_SUBRESOURCES,
            source_most_detailed_mip: 0,
            source_first_slice: 0,
            source_plane_slice: 0,
            target_most_detailed_mip: 0,
            target_first_slice: 0,
            target_plane_slice: 0,
        }
    }

    /// Restrict the copy to `count` mips and `slices` array slices.
    pub fn with_range(mut self, count: u32, slices: u32) -> Self {
        self.mip_levels = count;
        self.num_slices = slices;
        self
    }

    pub fn with_source_subresource(mut self, mip: u32, slice: u32, plane: u32) -> Self {
        self.source_most_detailed_mip = mip;
        self.source_first_slice = slice;
        self.source_plane_slice = plane;
        self
    }

    pub fn with_target_subresource(mut self, mip: u32, slice: u32, plane: u32) -> Self {
        self.target_most_detailed_mip = mip;
        self.target_first_slice = slice;
        self.target_plane_slice = plane;
        self
    }

    /// Returns true if the whole resource is copied.
    pub fn is_full_copy(&self) -> bool {
        self.mip_levels == ALL_SUBRESOURCES && self.num_slices == ALL_SUBRESOURCES
    }
}

/// Moves the contents of `source` into a subresource of `target`.
///
/// After the move the source contents are undefined.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MovePair {
    pub source: String,
    pub target: String,
    pub mip_levels: u32,
    pub num_slices: u32,
    pub target_most_detailed_mip: u32,
    pub target_first_slice: u32,
    pub target_plane_slice: u32,
}

impl MovePair {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            mip_levels: ALL_SUBRESOURCES,
            num_slices: ALL_SUBRESOURCES,
            target_most_detailed_mip: 0,
            target_first_slice: 0,
            target_plane_slice: 0,
        }
    }

    pub fn with_target_subresource(mut self, mip: u32, slice: u32, plane: u32) -> Self {
        self.target_most_detailed_mip = mip;
        self.target_first_slice = slice;
        self.target_plane_slice = plane;
        self
    }
}
