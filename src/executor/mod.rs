//! Plan execution.
//!
//! The [`Executor`] walks a [`Plan`] step by step. Before a step runs it
//! creates the resources in the step's create list, then it runs the pass
//! callbacks of the step's root and descendants, then it destroys the
//! resources in the destroy list.
//!
//! With more than one worker thread, steps whose waits are satisfied run
//! concurrently on scoped worker threads. Resource creation, destruction and
//! memory allocation always happen on the calling thread, which coordinates
//! workers through a completion channel.
//!
//! A creation failure aborts the frame. Resources created so far are not
//! rolled back; the caller is expected to discard the frame.

mod context;
mod thread_pool;

use std::collections::BTreeSet;
use std::sync::mpsc;

use parking_lot::Mutex;

pub use context::{PassCallback, PassContext, ResolvedResource};
pub use thread_pool::{Scope, ThreadPool};

use crate::allocator::{Allocation, AllocationHandle, Allocator};
use crate::compiler::{BlockHandle, Plan, PlanStep, WaitGraph};
use crate::device::{Device, DeviceError, DeviceHandle, ResourceCreateInfo, ViewDescriptor};
use crate::error::{FrameGraphError, Result};
use crate::frame::FrameGraph;
use crate::graph::{DirectedGraph, PassHandle};
use crate::resource::ResourceHandle;
use crate::types::Residency;

/// What happened while running a plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    /// Passes in the order their callbacks started. Only deterministic for
    /// sequential runs.
    pub executed: Vec<PassHandle>,
    /// Device resources created by the executor.
    pub created: usize,
    /// Device resources destroyed by the executor.
    pub destroyed: usize,
    /// Resources whose destroy hook failed.
    pub destroy_failures: Vec<ResourceHandle>,
    /// Persistent resources created this frame; the caller keeps them alive.
    pub persistent: Vec<(ResourceHandle, DeviceHandle)>,
}

/// Runs compiled plans against a device.
pub struct Executor<'a> {
    device: &'a dyn Device,
    allocator: &'a mut dyn Allocator,
    pool: ThreadPool,
}

impl<'a> Executor<'a> {
    /// Create a sequential executor.
    pub fn new(device: &'a dyn Device, allocator: &'a mut dyn Allocator) -> Self {
        Self {
            device,
            allocator,
            pool: ThreadPool::new(1),
        }
    }

    /// Use up to `threads` workers; `0` uses the available parallelism.
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.pool = match threads {
            0 => ThreadPool::default_threads(),
            n => ThreadPool::new(n),
        };
        self
    }

    pub fn worker_threads(&self) -> usize {
        self.pool.num_threads()
    }

    /// Execute every step of `plan` for the frame it was compiled from.
    pub fn run(&mut self, plan: &Plan, frame: &FrameGraph) -> Result<ExecutionReport> {
        log::debug!(
            "executing {} steps on {} worker(s)",
            plan.len(),
            self.pool.num_threads()
        );

        let mut state = FrameState::new(plan, frame)?;
        let result = if self.pool.num_threads() > 1 && plan.len() > 1 {
            self.run_parallel(plan, frame, &mut state)
        } else {
            self.run_sequential(plan, frame, &mut state)
        };
        state.release_blocks(&mut *self.allocator);

        if let Err(err) = &result {
            log::warn!("frame aborted: {}", err);
        }
        result.map(|()| state.report)
    }

    fn run_sequential(
        &mut self,
        plan: &Plan,
        frame: &FrameGraph,
        state: &mut FrameState,
    ) -> Result<()> {
        let executed = Mutex::new(Vec::new());
        for (index, step) in plan.steps().iter().enumerate() {
            self.create_step(plan, frame, state, index)?;
            let resources = state.step_resources(step);
            run_passes(frame, step, index, &resources, &executed);
            self.destroy_step(frame, state, step);
        }
        state.report.executed = executed.into_inner();
        Ok(())
    }

    fn run_parallel(
        &mut self,
        plan: &Plan,
        frame: &FrameGraph,
        state: &mut FrameState,
    ) -> Result<()> {
        let waits = WaitGraph::new(plan);
        let mut remaining: Vec<usize> = waits
            .vertices()
            .map(|step| waits.in_degree(step))
            .collect();
        let mut ready: BTreeSet<usize> = (0..plan.len())
            .filter(|&step| remaining[step] == 0)
            .collect();

        let executed = Mutex::new(Vec::new());
        let (completion_tx, completion_rx) = mpsc::channel::<usize>();
        let pool = self.pool;

        let result = pool.scope(|scope| {
            let mut active = 0usize;
            let mut completed = 0usize;
            let mut failure = None;

            while completed < plan.len() {
                while failure.is_none() && active < pool.num_threads() {
                    let Some(index) = ready.pop_first() else {
                        break;
                    };
                    if let Err(err) = self.create_step(plan, frame, state, index) {
                        failure = Some(err);
                        break;
                    }

                    let step = &plan.steps()[index];
                    let resources = state.step_resources(step);
                    let done = Completion {
                        tx: completion_tx.clone(),
                        index,
                    };
                    let executed = &executed;
                    scope.spawn(move || {
                        let _done = done;
                        run_passes(frame, step, index, &resources, executed);
                    });
                    active += 1;
                }

                // Aborted with nothing in flight, or no step can become ready.
                if active == 0 {
                    break;
                }
                let Ok(index) = completion_rx.recv() else {
                    break;
                };
                active -= 1;
                completed += 1;

                self.destroy_step(frame, state, &plan.steps()[index]);
                for &dependent in waits.dependents(index) {
                    let dependent = dependent as usize;
                    remaining[dependent] -= 1;
                    if remaining[dependent] == 0 {
                        ready.insert(dependent);
                    }
                }
            }
            failure.map_or(Ok(()), Err)
        });

        state.report.executed = executed.into_inner();
        result
    }

    fn create_step(
        &mut self,
        plan: &Plan,
        frame: &FrameGraph,
        state: &mut FrameState,
        index: usize,
    ) -> Result<()> {
        let registry = frame.registry();
        for &handle in &plan.steps()[index].create {
            // Bound persistent resources are reused as-is.
            if state.resolved[handle.index()].is_some() {
                continue;
            }

            let name = registry.name(handle);
            let desc = registry.desc(handle);
            let residency = registry.residency(handle);
            let allocation = match plan.block_of(handle) {
                Some(block) => Some(self.block_allocation(plan, state, block, name)?),
                None => None,
            };

            let info = ResourceCreateInfo {
                name,
                desc,
                residency,
                allocation,
            };
            let resource = self
                .device
                .create_resource(&info)
                .map_err(|err| creation_error(name, err))?;
            let view = self
                .device
                .create_view(resource, &ViewDescriptor::full(desc))
                .map_err(|err| creation_error(name, err))?;
            log::trace!("step {}: created `{}` as {:?}", index, name, resource);

            state.resolved[handle.index()] = Some(ResolvedResource {
                resource,
                view: Some(view),
                allocation,
            });
            state.report.created += 1;
            if residency == Residency::Persistent {
                state.report.persistent.push((handle, resource));
            }
        }
        Ok(())
    }

    /// Allocation of a pool block, made on first use.
    fn block_allocation(
        &mut self,
        plan: &Plan,
        state: &mut FrameState,
        block: BlockHandle,
        name: &str,
    ) -> Result<Allocation> {
        let out_of_memory = || FrameGraphError::ResourceCreation {
            name: name.to_string(),
            reason: format!("no memory for pool block {}", block.index()),
        };

        let mut handle = state.blocks[block.index()];
        if !handle.is_valid() {
            let pool_block = plan.block(block).ok_or_else(out_of_memory)?;
            handle = self.allocator.allocate(pool_block.size, pool_block.alignment);
            state.blocks[block.index()] = handle;
        }
        self.allocator
            .allocation(handle)
            .copied()
            .ok_or_else(out_of_memory)
    }

    fn destroy_step(&self, frame: &FrameGraph, state: &mut FrameState, step: &PlanStep) {
        for &handle in &step.destroy {
            let Some(resolved) = state.resolved[handle.index()].take() else {
                continue;
            };
            let name = frame.registry().name(handle);

            if let Some(view) = resolved.view {
                if let Err(err) = self.device.destroy_resource(view) {
                    log::warn!("failed to destroy view of `{}`: {}", name, err);
                }
            }
            match self.device.destroy_resource(resolved.resource) {
                Ok(()) => {
                    log::trace!("step `{}`: destroyed `{}`", step.name, name);
                    state.report.destroyed += 1;
                }
                Err(err) => {
                    log::warn!("failed to destroy `{}`: {}", name, err);
                    state.report.destroy_failures.push(handle);
                }
            }
        }
    }
}

fn creation_error(name: &str, err: DeviceError) -> FrameGraphError {
    FrameGraphError::ResourceCreation {
        name: name.to_string(),
        reason: err.to_string(),
    }
}

/// Run the root of a step, then its descendants.
fn run_passes(
    frame: &FrameGraph,
    step: &PlanStep,
    index: usize,
    resources: &[(ResourceHandle, ResolvedResource)],
    executed: &Mutex<Vec<PassHandle>>,
) {
    let graph = frame.graph();
    for pass in std::iter::once(step.pass).chain(step.children.iter().copied()) {
        let context = PassContext {
            pass,
            name: graph.name(pass),
            payload: graph.pass(pass),
            render_data: graph.render_data(pass),
            step: index,
            registry: frame.registry(),
            resources,
        };
        executed.lock().push(pass);
        if let Some(callback) = frame.callback(pass) {
            log::trace!("step {}: running {} pass `{}`", index, context.kind(), context.name());
            callback(&context);
        }
    }
}

/// Reports a finished step to the coordinator, even if a callback panicked.
struct Completion {
    tx: mpsc::Sender<usize>,
    index: usize,
}

impl Drop for Completion {
    fn drop(&mut self) {
        let _ = self.tx.send(self.index);
    }
}

/// Per-run bookkeeping owned by the coordinating thread.
struct FrameState {
    resolved: Vec<Option<ResolvedResource>>,
    blocks: Vec<AllocationHandle>,
    report: ExecutionReport,
}

impl FrameState {
    fn new(plan: &Plan, frame: &FrameGraph) -> Result<Self> {
        let registry = frame.registry();
        let mut resolved = vec![None; plan.resources().len()];

        for (handle, device_handle) in frame.bindings() {
            let Some(slot) = resolved.get_mut(handle.index()) else {
                continue;
            };
            match registry.residency(handle) {
                Residency::Persistent | Residency::Backbuffer | Residency::External => {
                    *slot = Some(ResolvedResource {
                        resource: device_handle,
                        view: None,
                        allocation: None,
                    });
                }
                residency => log::warn!(
                    "ignoring bound handle of {} resource `{}`",
                    residency.name(),
                    registry.name(handle)
                ),
            }
        }

        for resource in plan.resources() {
            let unbound = resolved[resource.handle.index()].is_none();
            if resource.residency.requires_binding() && !resource.users.is_empty() && unbound {
                return Err(FrameGraphError::ResourceCreation {
                    name: resource.name.clone(),
                    reason: format!(
                        "{} resource has no bound device handle",
                        resource.residency.name()
                    ),
                });
            }
        }

        Ok(Self {
            resolved,
            blocks: vec![AllocationHandle::INVALID; plan.blocks().len()],
            report: ExecutionReport::default(),
        })
    }

    fn step_resources(&self, step: &PlanStep) -> Vec<(ResourceHandle, ResolvedResource)> {
        step.resources
            .iter()
            .filter_map(|&handle| Some((handle, self.resolved[handle.index()]?)))
            .collect()
    }

    fn release_blocks(&mut self, allocator: &mut dyn Allocator) {
        for handle in self.blocks.drain(..) {
            allocator.free(handle);
        }
    }
}
