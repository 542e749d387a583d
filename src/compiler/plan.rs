//! The compiled execution plan.

use crate::graph::{is_reachable, DirectedGraph, PassHandle, PassKind};
use crate::resource::ResourceHandle;
use crate::types::Residency;

use super::aliasing::{BlockHandle, PoolBlock};
use super::lifetime::Lifetime;

/// One scheduling unit: an ownership root and its descendants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanStep {
    pub pass: PassHandle,
    pub name: String,
    pub kind: PassKind,
    /// Descendants of the root in pre-order; they run after the root.
    pub children: Vec<PassHandle>,
    /// Resources accessed by the root or its descendants, ascending.
    pub resources: Vec<ResourceHandle>,
    /// Resources to create before the step runs.
    pub create: Vec<ResourceHandle>,
    /// Resources to destroy after the step completes.
    pub destroy: Vec<ResourceHandle>,
    /// Earlier steps that must complete before this one starts, ascending.
    pub wait_for: Vec<usize>,
    /// Subpass indices grouped into merged render passes.
    pub subpass_groups: Vec<Vec<u32>>,
}

/// Scheduling facts about one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePlan {
    pub handle: ResourceHandle,
    pub name: String,
    pub residency: Residency,
    /// Set for managed resources that are used at least once.
    pub lifetime: Option<Lifetime>,
    pub block: Option<BlockHandle>,
    /// Steps using the resource, ascending.
    pub users: Vec<usize>,
}

/// Output of [`Compiler::compile`](super::Compiler::compile).
///
/// Two compiles of identical input produce equal plans.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    pub(crate) steps: Vec<PlanStep>,
    pub(crate) resources: Vec<ResourcePlan>,
    pub(crate) blocks: Vec<PoolBlock>,
    pub(crate) retained: Vec<ResourceHandle>,
    pub(crate) positions: Vec<usize>,
    pub(crate) dependency_edges: usize,
}

impl Plan {
    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    pub fn step(&self, index: usize) -> Option<&PlanStep> {
        self.steps.get(index)
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Root passes in execution order.
    pub fn pass_order(&self) -> Vec<PassHandle> {
        self.steps.iter().map(|step| step.pass).collect()
    }

    /// Names of the root passes in execution order.
    pub fn pass_names(&self) -> Vec<&str> {
        self.steps.iter().map(|step| step.name.as_str()).collect()
    }

    /// Step that runs `pass` (its own step, or its root's).
    pub fn position_of(&self, pass: PassHandle) -> Option<usize> {
        self.positions.get(pass.index()).copied()
    }

    pub fn resources(&self) -> &[ResourcePlan] {
        &self.resources
    }

    pub fn resource(&self, handle: ResourceHandle) -> Option<&ResourcePlan> {
        self.resources.get(handle.index())
    }

    pub fn lifetime_of(&self, handle: ResourceHandle) -> Option<Lifetime> {
        self.resource(handle)?.lifetime
    }

    pub fn block_of(&self, handle: ResourceHandle) -> Option<BlockHandle> {
        self.resource(handle)?.block
    }

    pub fn blocks(&self) -> &[PoolBlock] {
        &self.blocks
    }

    pub fn block(&self, handle: BlockHandle) -> Option<&PoolBlock> {
        self.blocks.get(handle.index())
    }

    /// Resources with side effects that outlive the frame.
    pub fn retained(&self) -> &[ResourceHandle] {
        &self.retained
    }

    /// Number of dependency edges resolved for this plan.
    pub fn dependency_edge_count(&self) -> usize {
        self.dependency_edges
    }

    /// Returns true if neither step has to wait for the other, directly or
    /// transitively, so they may run at the same time.
    pub fn is_independent(&self, a: usize, b: usize) -> bool {
        if a == b || a >= self.steps.len() || b >= self.steps.len() {
            return false;
        }
        let waits = WaitGraph::new(self);
        !is_reachable(&waits, a as u32, b as u32) && !is_reachable(&waits, b as u32, a as u32)
    }
}

/// Steps linked from each awaited step to the steps waiting on it.
pub(crate) struct WaitGraph {
    dependents: Vec<Vec<u32>>,
    in_degree: Vec<usize>,
}

impl WaitGraph {
    pub(crate) fn new(plan: &Plan) -> Self {
        let mut dependents = vec![Vec::new(); plan.steps.len()];
        let mut in_degree = vec![0; plan.steps.len()];
        for (index, step) in plan.steps.iter().enumerate() {
            for &awaited in &step.wait_for {
                dependents[awaited].push(index as u32);
            }
            in_degree[index] = step.wait_for.len();
        }
        Self {
            dependents,
            in_degree,
        }
    }

    pub(crate) fn dependents(&self, step: usize) -> &[u32] {
        &self.dependents[step]
    }
}

impl DirectedGraph for WaitGraph {
    fn vertex_count(&self) -> usize {
        self.dependents.len()
    }

    fn vertices(&self) -> impl Iterator<Item = u32> + '_ {
        0..self.dependents.len() as u32
    }

    fn successors(&self, vertex: u32) -> impl Iterator<Item = u32> + '_ {
        self.dependents[vertex as usize].iter().copied()
    }

    fn in_degree(&self, vertex: u32) -> usize {
        self.in_degree[vertex as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(index: u32, wait_for: Vec<usize>) -> PlanStep {
        PlanStep {
            pass: PassHandle::new(index),
            name: format!("pass{index}"),
            kind: PassKind::Compute,
            children: Vec::new(),
            resources: Vec::new(),
            create: Vec::new(),
            destroy: Vec::new(),
            wait_for,
            subpass_groups: Vec::new(),
        }
    }

    fn plan(steps: Vec<PlanStep>) -> Plan {
        Plan {
            positions: (0..steps.len()).collect(),
            steps,
            ..Default::default()
        }
    }

    #[test]
    fn test_independence_is_transitive() {
        let plan = plan(vec![
            step(0, vec![]),
            step(1, vec![0]),
            step(2, vec![1]),
            step(3, vec![]),
        ]);
        assert!(!plan.is_independent(0, 2));
        assert!(!plan.is_independent(2, 0));
        assert!(plan.is_independent(0, 3));
        assert!(plan.is_independent(3, 2));
        assert!(!plan.is_independent(1, 1));
        assert!(!plan.is_independent(0, 9));
    }

    #[test]
    fn test_wait_graph() {
        let plan = plan(vec![step(0, vec![]), step(1, vec![0]), step(2, vec![0, 1])]);
        let waits = WaitGraph::new(&plan);
        assert_eq!(waits.dependents(0), &[1, 2]);
        assert_eq!(waits.in_degree(2), 2);
    }

    #[test]
    fn test_accessors() {
        let plan = plan(vec![step(4, vec![]), step(2, vec![0])]);
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.pass_names(), vec!["pass4", "pass2"]);
        assert_eq!(plan.pass_order(), vec![PassHandle::new(4), PassHandle::new(2)]);
        assert!(plan.step(2).is_none());
        assert_eq!(plan.lifetime_of(ResourceHandle::new(0)), None);
    }
}
