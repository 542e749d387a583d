//! Block sub-allocation of device memory.
//!
//! The executor asks an [`Allocator`] for one allocation per pool block of a
//! [`Plan`](crate::Plan). [`BlockAllocator`] carves those out of fixed-size
//! memory blocks, giving oversized requests a dedicated block, and recycles
//! a block once everything placed in it has been freed.

/// Handle to an allocation made by an [`Allocator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AllocationHandle(u32);

impl AllocationHandle {
    /// Returned when an allocation cannot be satisfied.
    pub const INVALID: Self = Self(u32::MAX);

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Placement of an allocation inside a device memory block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Allocation {
    pub block_index: u32,
    pub offset: u64,
    pub size: u64,
}

/// Device memory allocator used by the executor.
pub trait Allocator {
    /// Allocate `size` bytes aligned to `alignment`.
    ///
    /// Returns [`AllocationHandle::INVALID`] when the request cannot be met.
    fn allocate(&mut self, size: u64, alignment: u64) -> AllocationHandle;

    /// Release an allocation. Freeing `INVALID` or an already freed handle is a no-op.
    fn free(&mut self, handle: AllocationHandle);

    /// Look up a live allocation.
    fn allocation(&self, handle: AllocationHandle) -> Option<&Allocation>;
}

#[derive(Debug)]
struct Block {
    capacity: u64,
    used: u64,
    live: u32,
}

/// Bump allocator over fixed-size blocks.
///
/// Allocations are placed at the end of the first block with room for them.
/// A block's space is reclaimed as a whole when its last allocation is freed.
#[derive(Debug)]
pub struct BlockAllocator {
    block_size: u64,
    max_blocks: Option<usize>,
    blocks: Vec<Block>,
    allocations: Vec<Option<Allocation>>,
    free_handles: Vec<u32>,
}

fn align_up(value: u64, alignment: u64) -> u64 {
    let alignment = alignment.max(1);
    value.div_ceil(alignment) * alignment
}

impl BlockAllocator {
    /// Create an allocator handing out blocks of `block_size` bytes.
    pub fn new(block_size: u64) -> Self {
        Self {
            block_size: block_size.max(1),
            max_blocks: None,
            blocks: Vec::new(),
            allocations: Vec::new(),
            free_handles: Vec::new(),
        }
    }

    /// Limit the number of blocks; further requests fail with `INVALID`.
    pub fn with_max_blocks(mut self, max_blocks: usize) -> Self {
        self.max_blocks = Some(max_blocks);
        self
    }

    pub fn block_size(&self) -> u64 {
        self.block_size
    }

    /// Number of device memory blocks created so far.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Number of allocations currently live.
    pub fn live_allocations(&self) -> usize {
        self.allocations.iter().filter(|a| a.is_some()).count()
    }

    fn place(&mut self, size: u64, alignment: u64) -> Option<Allocation> {
        for (index, block) in self.blocks.iter_mut().enumerate() {
            let offset = align_up(block.used, alignment);
            if offset + size <= block.capacity {
                block.used = offset + size;
                block.live += 1;
                return Some(Allocation {
                    block_index: index as u32,
                    offset,
                    size,
                });
            }
        }

        if self.max_blocks.is_some_and(|max| self.blocks.len() >= max) {
            return None;
        }

        let capacity = self.block_size.max(size);
        log::debug!("allocating device memory block of {} bytes", capacity);
        self.blocks.push(Block {
            capacity,
            used: size,
            live: 1,
        });
        Some(Allocation {
            block_index: (self.blocks.len() - 1) as u32,
            offset: 0,
            size,
        })
    }
}

impl Default for BlockAllocator {
    fn default() -> Self {
        Self::new(crate::FrameGraphConfig::default().allocator_block_size)
    }
}

impl Allocator for BlockAllocator {
    fn allocate(&mut self, size: u64, alignment: u64) -> AllocationHandle {
        let Some(allocation) = self.place(size, alignment) else {
            log::warn!("block allocator exhausted ({} bytes requested)", size);
            return AllocationHandle::INVALID;
        };

        match self.free_handles.pop() {
            Some(index) => {
                self.allocations[index as usize] = Some(allocation);
                AllocationHandle(index)
            }
            None => {
                self.allocations.push(Some(allocation));
                AllocationHandle((self.allocations.len() - 1) as u32)
            }
        }
    }

    fn free(&mut self, handle: AllocationHandle) {
        if !handle.is_valid() {
            return;
        }
        let Some(allocation) = self.allocations.get_mut(handle.index()).and_then(Option::take)
        else {
            return;
        };

        let block = &mut self.blocks[allocation.block_index as usize];
        block.live -= 1;
        if block.live == 0 {
            block.used = 0;
        }
        self.free_handles.push(handle.0);
    }

    fn allocation(&self, handle: AllocationHandle) -> Option<&Allocation> {
        self.allocations.get(handle.index())?.as_ref()
    }
}
