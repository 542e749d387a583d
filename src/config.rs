//! Frame graph configuration.

/// Configuration for compiling and executing a frame graph.
///
/// All fields are public; start from [`Default`] and override what you need.
///
/// ```
/// use redlilium_framegraph::FrameGraphConfig;
///
/// let config = FrameGraphConfig {
///     worker_threads: 4,
///     ..Default::default()
/// };
/// assert!(config.enable_aliasing);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameGraphConfig {
    /// Let managed resources with disjoint lifetimes share pool blocks.
    pub enable_aliasing: bool,
    /// Group compatible subpasses of a raster pass into merged render passes.
    pub enable_subpass_merge: bool,
    /// Worker threads used by the executor. `1` runs sequentially,
    /// `0` uses the available parallelism of the machine.
    pub worker_threads: usize,
    /// Alignment applied to resources whose descriptor has `alignment == 0`.
    pub default_alignment: u64,
    /// Size of the device memory blocks handed out by [`BlockAllocator`](crate::BlockAllocator).
    pub allocator_block_size: u64,
}

impl FrameGraphConfig {
    pub fn with_aliasing(mut self, enabled: bool) -> Self {
        self.enable_aliasing = enabled;
        self
    }

    pub fn with_subpass_merge(mut self, enabled: bool) -> Self {
        self.enable_subpass_merge = enabled;
        self
    }

    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads;
        self
    }

    pub fn with_default_alignment(mut self, alignment: u64) -> Self {
        self.default_alignment = alignment;
        self
    }

    pub fn with_allocator_block_size(mut self, size: u64) -> Self {
        self.allocator_block_size = size;
        self
    }

    /// Number of worker threads the executor will actually use.
    pub fn effective_worker_threads(&self) -> usize {
        match self.worker_threads {
            0 => std::thread::available_parallelism().map_or(1, |n| n.get()),
            n => n,
        }
    }

    /// Alignment for a resource, falling back to [`Self::default_alignment`].
    pub fn alignment_for(&self, requested: u32) -> u64 {
        if requested == 0 {
            self.default_alignment.max(1)
        } else {
            u64::from(requested)
        }
    }
}

impl Default for FrameGraphConfig {
    fn default() -> Self {
        Self {
            enable_aliasing: true,
            enable_subpass_merge: true,
            worker_threads: 1,
            default_alignment: 256,
            allocator_block_size: 64 * 1024 * 1024,
        }
    }
}
