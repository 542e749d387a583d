//! Resource lifetimes over the topological order.

use crate::graph::RenderGraph;
use crate::resource::ResourceRegistry;

/// First and last step (inclusive) at which a resource is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Lifetime {
    pub first_use: usize,
    pub last_use: usize,
}

impl Lifetime {
    pub fn contains(self, step: usize) -> bool {
        self.first_use <= step && step <= self.last_use
    }

    /// Returns true if both resources are alive at some common step.
    pub fn overlaps(self, other: Lifetime) -> bool {
        self.first_use <= other.last_use && other.first_use <= self.last_use
    }
}

/// Steps using each resource, sorted and deduplicated.
///
/// `positions[pass]` is the step of the pass's ownership root.
pub(crate) fn collect_users(
    graph: &RenderGraph,
    positions: &[usize],
    resource_count: usize,
) -> Vec<Vec<usize>> {
    let mut users = vec![Vec::new(); resource_count];
    for record in graph.accesses() {
        let step = positions[graph.root_of(record.pass).index()];
        users[record.resource.index()].push(step);
    }
    for steps in &mut users {
        steps.sort_unstable();
        steps.dedup();
    }
    users
}

/// Lifetimes of transient (managed) resources that are used at least once.
pub(crate) fn assign_lifetimes(
    registry: &ResourceRegistry,
    users: &[Vec<usize>],
) -> Vec<Option<Lifetime>> {
    registry
        .handles()
        .map(|handle| {
            let steps = &users[handle.index()];
            let (&first_use, &last_use) = (steps.first()?, steps.last()?);
            if !registry.residency(handle).is_transient() {
                return None;
            }
            log::trace!(
                "resource `{}` lives over steps {}..={}",
                registry.name(handle),
                first_use,
                last_use
            );
            Some(Lifetime {
                first_use,
                last_use,
            })
        })
        .collect()
}
