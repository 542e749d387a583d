//! Frame graph compilation.
//!
//! Turns a [`RenderGraph`] plus its [`ResourceRegistry`] into a [`Plan`].
//! The compiler walks a fixed sequence of states, and a failure in any
//! stage aborts the frame instead of producing a partial plan:
//!
//! 1. **Collecting** - the graph as built by the caller
//! 2. **DependencyResolved** - edges derived from the access log
//! 3. **TopoSorted** - ownership roots in dependency order
//! 4. **LifetimesAssigned** - first/last step of each transient resource
//! 5. **Aliased** - pool blocks shared by disjoint lifetimes
//! 6. **Finalized** - create/destroy lists, waits and subpass groups
//!
//! # Example
//!
//! ```ignore
//! let config = FrameGraphConfig::default();
//! let plan = Compiler::new(&config).compile(&registry, &mut graph)?;
//! for step in plan.steps() {
//!     println!("{} creates {:?}", step.name, step.create);
//! }
//! ```

mod aliasing;
mod dependency;
mod lifetime;
mod merge;
mod plan;
mod topo;

use std::collections::BTreeSet;

pub use aliasing::{BlockHandle, PoolBlock};
pub use lifetime::Lifetime;
pub use merge::{can_merge, merge_groups};
pub use plan::{Plan, PlanStep, ResourcePlan};
pub use topo::topological_sort;

pub(crate) use plan::WaitGraph;

use crate::config::FrameGraphConfig;
use crate::error::{FrameGraphError, Result};
use crate::graph::{PassHandle, RenderGraph};
use crate::resource::ResourceRegistry;
use crate::types::Residency;

use merge::MergeVisitor;

/// Compilation stage reached by a [`Compiler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CompileState {
    Collecting,
    DependencyResolved,
    TopoSorted,
    LifetimesAssigned,
    Aliased,
    Finalized,
}

/// Compiles frame graphs with a given configuration.
#[derive(Debug)]
pub struct Compiler<'a> {
    config: &'a FrameGraphConfig,
    state: CompileState,
}

impl<'a> Compiler<'a> {
    pub fn new(config: &'a FrameGraphConfig) -> Self {
        Self {
            config,
            state: CompileState::Collecting,
        }
    }

    /// Stage reached by the last call to [`Self::compile`].
    pub fn state(&self) -> CompileState {
        self.state
    }

    fn advance(&mut self, next: CompileState) {
        debug_assert!(next > self.state, "compile stages only move forward");
        log::trace!("compile: {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Compile the graph into a plan.
    ///
    /// Replaces the graph's dependency edges. Fails with
    /// [`FrameGraphError::CyclicDependency`] if the roots cannot be ordered.
    pub fn compile(
        &mut self,
        registry: &ResourceRegistry,
        graph: &mut RenderGraph,
    ) -> Result<Plan> {
        self.state = CompileState::Collecting;

        let dependency_edges = dependency::resolve_dependencies(graph, registry.len());
        self.advance(CompileState::DependencyResolved);

        let order = topological_sort(&graph.roots()).map_err(|cycle| {
            let passes: Vec<String> = cycle
                .iter()
                .map(|&vertex| graph.name(PassHandle::new(vertex)).to_string())
                .collect();
            log::debug!("cyclic dependency between {:?}", passes);
            FrameGraphError::CyclicDependency { passes }
        })?;
        self.advance(CompileState::TopoSorted);

        let mut positions = vec![0usize; graph.pass_count()];
        for (step, &root) in order.iter().enumerate() {
            positions[root as usize] = step;
        }
        for pass in graph.passes() {
            positions[pass.index()] = positions[graph.root_of(pass).index()];
        }

        let users = lifetime::collect_users(graph, &positions, registry.len());
        let lifetimes = lifetime::assign_lifetimes(registry, &users);
        self.advance(CompileState::LifetimesAssigned);

        let roots = graph.roots();
        let step_order = aliasing::StepOrder {
            graph: &roots,
            order: &order,
            users: &users,
        };
        let aliasing = aliasing::assign_blocks(registry, &lifetimes, &step_order, self.config);
        self.advance(CompileState::Aliased);

        let mut merge = MergeVisitor {
            enabled: self.config.enable_subpass_merge,
        };
        let mut steps: Vec<PlanStep> = order
            .iter()
            .map(|&root| {
                let pass = PassHandle::new(root);
                PlanStep {
                    pass,
                    name: graph.name(pass).to_string(),
                    kind: graph.kind(pass),
                    children: graph.descendants(pass),
                    resources: Vec::new(),
                    create: Vec::new(),
                    destroy: Vec::new(),
                    wait_for: Vec::new(),
                    subpass_groups: graph.visit(pass, &mut merge),
                }
            })
            .collect();

        let mut creator = vec![None; registry.len()];
        for handle in registry.handles() {
            let using = &users[handle.index()];
            for &step in using {
                steps[step].resources.push(handle);
            }
            let (Some(&first), Some(&last)) = (using.first(), using.last()) else {
                continue;
            };
            match registry.residency(handle) {
                Residency::Managed => {
                    steps[first].create.push(handle);
                    steps[last].destroy.push(handle);
                    creator[handle.index()] = Some(first);
                }
                Residency::Memoryless => {
                    let last_step = steps.len() - 1;
                    steps[0].create.push(handle);
                    steps[last_step].destroy.push(handle);
                    creator[handle.index()] = Some(0);
                }
                Residency::Persistent => {
                    steps[first].create.push(handle);
                    creator[handle.index()] = Some(first);
                }
                Residency::Backbuffer | Residency::External => {}
            }
        }

        for index in 0..steps.len() {
            let step = &steps[index];
            let mut waits = BTreeSet::new();
            for edge in graph.in_edges(step.pass) {
                waits.insert(positions[edge.source.index()]);
            }
            for resource in &step.resources {
                waits.extend(creator[resource.index()]);
            }
            for resource in &step.destroy {
                waits.extend(users[resource.index()].iter().copied());
            }
            for resource in &step.create {
                if let Some(previous) = aliasing.previous[resource.index()] {
                    waits.extend(users[previous.index()].iter().copied());
                }
            }
            waits.remove(&index);
            steps[index].wait_for = waits.into_iter().collect();
        }

        let resources = registry
            .handles()
            .map(|handle| ResourcePlan {
                handle,
                name: registry.name(handle).to_string(),
                residency: registry.residency(handle),
                lifetime: lifetimes[handle.index()],
                block: aliasing.assignment[handle.index()],
                users: users[handle.index()].clone(),
            })
            .collect();
        let retained = registry
            .handles()
            .filter(|&handle| registry.traits(handle).has_side_effects())
            .collect();

        let plan = Plan {
            steps,
            resources,
            blocks: aliasing.blocks,
            retained,
            positions,
            dependency_edges,
        };
        self.advance(CompileState::Finalized);
        log::debug!(
            "compiled frame graph: {} steps, {} edges, {} pool blocks",
            plan.len(),
            plan.dependency_edge_count(),
            plan.blocks().len()
        );
        Ok(plan)
    }
}

/// Compile a graph with the given configuration.
pub fn compile(
    registry: &ResourceRegistry,
    graph: &mut RenderGraph,
    config: &FrameGraphConfig,
) -> Result<Plan> {
    Compiler::new(config).compile(registry, graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ComputePassData, RasterPassData, RenderQueueData};
    use crate::types::{AccessType, ComputeView, Format, RasterView, ResourceDesc, ResourceFlags};

    fn target() -> ResourceDesc {
        ResourceDesc::texture_2d(256, 256, Format::Rgba8Unorm, ResourceFlags::ALLOW_RENDER_TARGET)
    }

    fn compute_pass(
        graph: &mut RenderGraph,
        registry: &ResourceRegistry,
        name: &str,
        views: &[(&str, AccessType)],
    ) -> PassHandle {
        let pass = graph.add_pass(name, ComputePassData::default()).unwrap();
        for &(resource, access) in views {
            let handle = registry.lookup(resource).unwrap();
            graph
                .add_view(pass, handle, resource, ComputeView::new(resource, access).into())
                .unwrap();
        }
        pass
    }

    #[test]
    fn test_empty_graph_compiles_to_empty_plan() {
        let registry = ResourceRegistry::new();
        let mut graph = RenderGraph::new();
        let config = FrameGraphConfig::default();
        let mut compiler = Compiler::new(&config);

        let plan = compiler.compile(&registry, &mut graph).unwrap();
        assert!(plan.is_empty());
        assert_eq!(compiler.state(), CompileState::Finalized);
    }

    #[test]
    fn test_chain_order_lifetimes_and_lists() {
        let mut registry = ResourceRegistry::new();
        registry.declare("a", target()).unwrap();
        registry.declare("b", target()).unwrap();
        let mut graph = RenderGraph::new();
        compute_pass(&mut graph, &registry, "p0", &[("a", AccessType::Write)]);
        compute_pass(
            &mut graph,
            &registry,
            "p1",
            &[("a", AccessType::Read), ("b", AccessType::Write)],
        );
        compute_pass(&mut graph, &registry, "p2", &[("b", AccessType::Read)]);

        let plan = compile(&registry, &mut graph, &FrameGraphConfig::default()).unwrap();
        assert_eq!(plan.pass_names(), vec!["p0", "p1", "p2"]);

        let a = registry.lookup("a").unwrap();
        let b = registry.lookup("b").unwrap();
        assert_eq!(
            plan.lifetime_of(a),
            Some(Lifetime {
                first_use: 0,
                last_use: 1
            })
        );
        assert_eq!(plan.steps()[0].create, vec![a]);
        assert_eq!(plan.steps()[1].create, vec![b]);
        assert_eq!(plan.steps()[1].destroy, vec![a]);
        assert_eq!(plan.steps()[2].destroy, vec![b]);
        assert_eq!(plan.steps()[1].wait_for, vec![0]);
        assert_eq!(plan.steps()[2].wait_for, vec![1]);
        // a and b overlap at step 1
        assert_ne!(plan.block_of(a), plan.block_of(b));
    }

    #[test]
    fn test_cycle_is_reported() {
        let mut registry = ResourceRegistry::new();
        registry.declare("r", target()).unwrap();
        let r = registry.lookup("r").unwrap();
        let mut graph = RenderGraph::new();
        let a = graph.add_pass("a", ComputePassData::default()).unwrap();
        let b = graph.add_pass("b", ComputePassData::default()).unwrap();
        graph.add_view(a, r, "r", ComputeView::write("r").into()).unwrap();
        graph.add_view(b, r, "r", ComputeView::read("r").into()).unwrap();
        graph.add_view(b, r, "r", ComputeView::write("r").into()).unwrap();
        graph.add_view(a, r, "r", ComputeView::read("r").into()).unwrap();

        let config = FrameGraphConfig::default();
        let mut compiler = Compiler::new(&config);
        let err = compiler.compile(&registry, &mut graph).unwrap_err();
        assert_eq!(
            err,
            FrameGraphError::CyclicDependency {
                passes: vec!["a".to_string(), "b".to_string()]
            }
        );
        assert_eq!(compiler.state(), CompileState::DependencyResolved);
    }

    #[test]
    fn test_children_share_their_root_step() {
        let mut registry = ResourceRegistry::new();
        let color = registry.declare("color", target()).unwrap();
        let mut graph = RenderGraph::new();
        let forward = graph.add_pass("forward", RasterPassData::default()).unwrap();
        let opaque = graph.add_pass("opaque", RenderQueueData::default()).unwrap();
        graph.add_ownership(forward, opaque).unwrap();
        graph
            .add_view(forward, color, "color", RasterView::new("c0").into())
            .unwrap();

        let plan = compile(&registry, &mut graph, &FrameGraphConfig::default()).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.steps()[0].children, vec![opaque]);
        assert_eq!(plan.position_of(opaque), Some(0));
    }

    #[test]
    fn test_memoryless_spans_whole_frame() {
        let mut registry = ResourceRegistry::new();
        registry.declare("x", target()).unwrap();
        let tile = registry
            .declare_with_residency("tile", target(), Residency::Memoryless)
            .unwrap();
        let mut graph = RenderGraph::new();
        compute_pass(&mut graph, &registry, "p0", &[("x", AccessType::Write)]);
        compute_pass(&mut graph, &registry, "p1", &[("tile", AccessType::Write)]);
        compute_pass(&mut graph, &registry, "p2", &[("x", AccessType::Read)]);

        let plan = compile(&registry, &mut graph, &FrameGraphConfig::default()).unwrap();
        assert!(plan.steps()[0].create.contains(&tile));
        assert!(plan.steps()[2].destroy.contains(&tile));
        assert_eq!(plan.lifetime_of(tile), None);
        assert_eq!(plan.block_of(tile), None);
    }

    #[test]
    fn test_persistent_is_created_but_never_destroyed() {
        let mut registry = ResourceRegistry::new();
        let history = registry
            .declare_with_residency("history", target(), Residency::Persistent)
            .unwrap();
        let mut graph = RenderGraph::new();
        compute_pass(&mut graph, &registry, "taa", &[("history", AccessType::ReadWrite)]);

        let plan = compile(&registry, &mut graph, &FrameGraphConfig::default()).unwrap();
        assert_eq!(plan.steps()[0].create, vec![history]);
        assert!(plan.steps()[0].destroy.is_empty());
        assert_eq!(plan.retained(), &[history]);
    }

    #[test]
    fn test_unordered_passes_keep_separate_blocks() {
        let mut registry = ResourceRegistry::new();
        let a = registry.declare("a", target()).unwrap();
        let b = registry.declare("b", target()).unwrap();
        let mut graph = RenderGraph::new();
        compute_pass(&mut graph, &registry, "left", &[("a", AccessType::Write)]);
        compute_pass(&mut graph, &registry, "right", &[("b", AccessType::Write)]);

        let plan = compile(&registry, &mut graph, &FrameGraphConfig::default()).unwrap();
        assert_eq!(plan.dependency_edge_count(), 0);
        assert_ne!(plan.block_of(a), plan.block_of(b));
        assert!(plan.steps()[1].wait_for.is_empty());
        assert!(plan.is_independent(0, 1));
    }

    #[test]
    fn test_ordered_passes_reuse_blocks() {
        let mut registry = ResourceRegistry::new();
        let a = registry.declare("a", target()).unwrap();
        let b = registry.declare("b", target()).unwrap();
        let mut graph = RenderGraph::new();
        let first = compute_pass(&mut graph, &registry, "first", &[("a", AccessType::Write)]);
        let second = compute_pass(&mut graph, &registry, "second", &[("b", AccessType::Write)]);
        graph.add_ordering_hint(first, second).unwrap();

        let plan = compile(&registry, &mut graph, &FrameGraphConfig::default()).unwrap();
        assert_eq!(plan.block_of(a), plan.block_of(b));
        assert_eq!(plan.steps()[1].wait_for, vec![0]);
    }
}
