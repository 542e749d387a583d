//! Memory aliasing of transient resources.
//!
//! Interval coloring over lifetimes: resources are visited by first use,
//! blocks whose occupant has retired go back to a free list sorted by size,
//! and each resource takes the smallest free block that is big enough,
//! aligned enough and created with a superset of its flags. Otherwise it
//! gets a new block.
//!
//! A retired block is only reused when every pass that used its last
//! occupant has a dependency path to the new resource's first user. Reuse
//! never orders passes the dependency graph leaves unordered.

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap};

use crate::config::FrameGraphConfig;
use crate::graph::{is_reachable, DirectedGraph};
use crate::resource::{ResourceHandle, ResourceRegistry};
use crate::types::ResourceFlags;

use super::lifetime::Lifetime;

/// Handle to a pool block of a [`Plan`](super::Plan).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockHandle(u32);

impl BlockHandle {
    pub(crate) fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A virtual memory block shared by resources with disjoint lifetimes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolBlock {
    pub size: u64,
    pub alignment: u64,
    pub flags: ResourceFlags,
    /// Resources placed in the block, in order of first use.
    pub occupants: Vec<ResourceHandle>,
}

impl PoolBlock {
    fn fits(&self, size: u64, alignment: u64, flags: ResourceFlags) -> bool {
        self.size >= size && self.alignment % alignment == 0 && self.flags.contains(flags)
    }
}

#[derive(Debug, Default)]
pub(crate) struct Aliasing {
    pub blocks: Vec<PoolBlock>,
    /// Block of each resource, by resource index.
    pub assignment: Vec<Option<BlockHandle>>,
    /// Occupant of the same block right before each resource.
    pub previous: Vec<Option<ResourceHandle>>,
}

fn align_up(value: u64, alignment: u64) -> u64 {
    value.div_ceil(alignment).saturating_mul(alignment)
}

/// Steps of a plan and the dependency graph between their passes.
pub(crate) struct StepOrder<'a, G> {
    pub graph: &'a G,
    /// Vertex of `graph` run at each step.
    pub order: &'a [u32],
    /// Steps using each resource, by resource index.
    pub users: &'a [Vec<usize>],
}

impl<G: DirectedGraph> StepOrder<'_, G> {
    /// Returns true if every step using `previous` reaches `step` through
    /// dependency edges.
    fn precedes(&self, previous: ResourceHandle, step: usize) -> bool {
        let target = self.order[step];
        self.users[previous.index()]
            .iter()
            .all(|&user| is_reachable(self.graph, self.order[user], target))
    }
}

/// Assign a pool block to every resource with a lifetime.
pub(crate) fn assign_blocks<G: DirectedGraph>(
    registry: &ResourceRegistry,
    lifetimes: &[Option<Lifetime>],
    steps: &StepOrder<'_, G>,
    config: &FrameGraphConfig,
) -> Aliasing {
    let mut result = Aliasing {
        blocks: Vec::new(),
        assignment: vec![None; registry.len()],
        previous: vec![None; registry.len()],
    };

    let mut candidates: Vec<(Lifetime, ResourceHandle)> = registry
        .handles()
        .filter_map(|handle| lifetimes[handle.index()].map(|lifetime| (lifetime, handle)))
        .collect();
    candidates.sort_by_key(|(lifetime, handle)| (lifetime.first_use, *handle));

    // (last_use, resource, block) of blocks still occupied
    let mut active: BinaryHeap<Reverse<(usize, ResourceHandle, u32)>> = BinaryHeap::new();
    // (size, block) of retired blocks
    let mut free: BTreeSet<(u64, u32)> = BTreeSet::new();

    for (lifetime, handle) in candidates {
        while let Some(&Reverse((last_use, _, block))) = active.peek() {
            if last_use >= lifetime.first_use {
                break;
            }
            active.pop();
            free.insert((result.blocks[block as usize].size, block));
        }

        let desc = registry.desc(handle);
        let alignment = config.alignment_for(desc.alignment);
        let size = align_up(desc.byte_size().max(1), alignment);

        let reused = if config.enable_aliasing {
            free.range((size, 0)..).copied().find(|&(_, block)| {
                let block = &result.blocks[block as usize];
                block.fits(size, alignment, desc.flags)
                    && block
                        .occupants
                        .last()
                        .is_some_and(|&previous| steps.precedes(previous, lifetime.first_use))
            })
        } else {
            None
        };

        let block = match reused {
            Some(entry) => {
                free.remove(&entry);
                let block = &mut result.blocks[entry.1 as usize];
                result.previous[handle.index()] = block.occupants.last().copied();
                block.occupants.push(handle);
                log::trace!(
                    "alias `{}` into block {} ({} bytes)",
                    registry.name(handle),
                    entry.1,
                    block.size
                );
                entry.1
            }
            None => {
                result.blocks.push(PoolBlock {
                    size,
                    alignment,
                    flags: desc.flags,
                    occupants: vec![handle],
                });
                (result.blocks.len() - 1) as u32
            }
        };

        result.assignment[handle.index()] = Some(BlockHandle::new(block));
        active.push(Reverse((lifetime.last_use, handle, block)));
    }

    log::debug!(
        "aliasing placed {} resources into {} blocks",
        result.assignment.iter().flatten().count(),
        result.blocks.len()
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Format, ResourceDesc};

    fn target(width: u32, flags: ResourceFlags) -> ResourceDesc {
        ResourceDesc::texture_2d(width, 64, Format::Rgba8Unorm, flags)
    }

    fn lifetime(first_use: usize, last_use: usize) -> Option<Lifetime> {
        Some(Lifetime {
            first_use,
            last_use,
        })
    }

    fn block_of(result: &Aliasing, index: usize) -> usize {
        result.assignment[index].map(BlockHandle::index).unwrap()
    }

    /// Steps as graph vertices; `chained` links each step to the next.
    struct Steps {
        count: usize,
        chained: bool,
    }

    impl DirectedGraph for Steps {
        fn vertex_count(&self) -> usize {
            self.count
        }

        fn vertices(&self) -> impl Iterator<Item = u32> + '_ {
            0..self.count as u32
        }

        fn successors(&self, vertex: u32) -> impl Iterator<Item = u32> + '_ {
            let next = vertex + 1;
            (self.chained && (next as usize) < self.count).then_some(next).into_iter()
        }

        fn in_degree(&self, vertex: u32) -> usize {
            usize::from(self.chained && vertex > 0)
        }
    }

    fn assign(
        registry: &ResourceRegistry,
        lifetimes: &[Option<Lifetime>],
        chained: bool,
        config: &FrameGraphConfig,
    ) -> Aliasing {
        let count = lifetimes
            .iter()
            .flatten()
            .map(|lifetime| lifetime.last_use + 1)
            .max()
            .unwrap_or(0);
        let graph = Steps { count, chained };
        let order: Vec<u32> = (0..count as u32).collect();
        let users: Vec<Vec<usize>> = lifetimes
            .iter()
            .map(|lifetime| match lifetime {
                Some(l) if l.first_use == l.last_use => vec![l.first_use],
                Some(l) => vec![l.first_use, l.last_use],
                None => Vec::new(),
            })
            .collect();
        let steps = StepOrder {
            graph: &graph,
            order: &order,
            users: &users,
        };
        assign_blocks(registry, lifetimes, &steps, config)
    }

    fn assign_chained(registry: &ResourceRegistry, lifetimes: &[Option<Lifetime>]) -> Aliasing {
        assign(registry, lifetimes, true, &FrameGraphConfig::default())
    }

    #[test]
    fn test_disjoint_lifetimes_share_a_block() {
        let mut registry = ResourceRegistry::new();
        registry.declare("a", target(64, ResourceFlags::ALLOW_RENDER_TARGET)).unwrap();
        registry.declare("b", target(64, ResourceFlags::ALLOW_RENDER_TARGET)).unwrap();

        let result = assign_chained(&registry, &[lifetime(0, 1), lifetime(2, 3)]);
        assert_eq!(result.blocks.len(), 1);
        assert_eq!(block_of(&result, 0), block_of(&result, 1));
        assert_eq!(result.previous[1], Some(ResourceHandle::new(0)));
    }

    #[test]
    fn test_touching_lifetimes_do_not_share() {
        let mut registry = ResourceRegistry::new();
        registry.declare("a", target(64, ResourceFlags::empty())).unwrap();
        registry.declare("b", target(64, ResourceFlags::empty())).unwrap();

        let result = assign_chained(&registry, &[lifetime(0, 1), lifetime(1, 2)]);
        assert_eq!(result.blocks.len(), 2);
    }

    #[test]
    fn test_flags_must_be_a_superset() {
        let mut registry = ResourceRegistry::new();
        registry.declare("rt", target(64, ResourceFlags::ALLOW_RENDER_TARGET)).unwrap();
        registry
            .declare(
                "uav",
                target(
                    64,
                    ResourceFlags::ALLOW_RENDER_TARGET | ResourceFlags::ALLOW_UNORDERED_ACCESS,
                ),
            )
            .unwrap();

        let result = assign_chained(&registry, &[lifetime(0, 0), lifetime(1, 1)]);
        assert_eq!(result.blocks.len(), 2);
    }

    #[test]
    fn test_best_fit_prefers_smallest_block() {
        let mut registry = ResourceRegistry::new();
        registry.declare("big", target(256, ResourceFlags::empty())).unwrap();
        registry.declare("small", target(64, ResourceFlags::empty())).unwrap();
        registry.declare("next", target(64, ResourceFlags::empty())).unwrap();

        let result = assign_chained(&registry, &[lifetime(0, 0), lifetime(0, 0), lifetime(1, 1)]);
        assert_eq!(result.blocks.len(), 2);
        assert_eq!(block_of(&result, 2), block_of(&result, 1));
    }

    #[test]
    fn test_larger_resource_does_not_fit_smaller_block() {
        let mut registry = ResourceRegistry::new();
        registry.declare("small", target(64, ResourceFlags::empty())).unwrap();
        registry.declare("big", target(256, ResourceFlags::empty())).unwrap();

        let result = assign_chained(&registry, &[lifetime(0, 0), lifetime(1, 1)]);
        assert_eq!(result.blocks.len(), 2);
    }

    #[test]
    fn test_aliasing_disabled() {
        let mut registry = ResourceRegistry::new();
        registry.declare("a", target(64, ResourceFlags::empty())).unwrap();
        registry.declare("b", target(64, ResourceFlags::empty())).unwrap();
        let config = FrameGraphConfig {
            enable_aliasing: false,
            ..Default::default()
        };

        let result = assign(&registry, &[lifetime(0, 0), lifetime(1, 1)], true, &config);
        assert_eq!(result.blocks.len(), 2);
        assert_eq!(result.previous[1], None);
    }

    #[test]
    fn test_sizes_are_rounded_to_alignment() {
        let mut registry = ResourceRegistry::new();
        registry
            .declare("buffer", ResourceDesc::buffer(100, ResourceFlags::empty()))
            .unwrap();
        let result = assign_chained(&registry, &[lifetime(0, 0)]);
        assert_eq!(result.blocks[0].size, 256);
        assert_eq!(result.blocks[0].alignment, 256);
    }

    #[test]
    fn test_unordered_steps_do_not_share() {
        let mut registry = ResourceRegistry::new();
        registry.declare("a", target(64, ResourceFlags::empty())).unwrap();
        registry.declare("b", target(64, ResourceFlags::empty())).unwrap();

        let result = assign(
            &registry,
            &[lifetime(0, 0), lifetime(1, 1)],
            false,
            &FrameGraphConfig::default(),
        );
        assert_eq!(result.blocks.len(), 2);
        assert_eq!(result.previous[1], None);
    }

    #[test]
    fn test_unordered_block_is_skipped_for_an_ordered_one() {
        let mut registry = ResourceRegistry::new();
        registry.declare("a", target(64, ResourceFlags::empty())).unwrap();
        registry.declare("b", target(64, ResourceFlags::empty())).unwrap();
        registry.declare("c", target(64, ResourceFlags::empty())).unwrap();

        // 1 -> 2 only: `b` precedes `c`, `a` does not.
        struct Edges;
        impl DirectedGraph for Edges {
            fn vertex_count(&self) -> usize {
                3
            }
            fn vertices(&self) -> impl Iterator<Item = u32> + '_ {
                0..3
            }
            fn successors(&self, vertex: u32) -> impl Iterator<Item = u32> + '_ {
                (vertex == 1).then_some(2).into_iter()
            }
            fn in_degree(&self, vertex: u32) -> usize {
                usize::from(vertex == 2)
            }
        }

        let lifetimes = [lifetime(0, 0), lifetime(1, 1), lifetime(2, 2)];
        let users = vec![vec![0], vec![1], vec![2]];
        let steps = StepOrder {
            graph: &Edges,
            order: &[0, 1, 2],
            users: &users,
        };
        let result = assign_blocks(&registry, &lifetimes, &steps, &FrameGraphConfig::default());
        assert_eq!(result.blocks.len(), 2);
        assert_ne!(block_of(&result, 0), block_of(&result, 1));
        assert_eq!(block_of(&result, 2), block_of(&result, 1));
        assert_eq!(result.previous[2], Some(ResourceHandle::new(1)));
    }

    #[test]
    fn test_align_up_saturates() {
        assert_eq!(align_up(100, 256), 256);
        assert_eq!(align_up(u64::MAX - 1, 256), u64::MAX);
    }
}
