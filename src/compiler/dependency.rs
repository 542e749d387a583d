//! Dependency resolution from the access log.
//!
//! The log is scanned once in declaration order while tracking, per
//! resource, the last writer and the readers since that write:
//!
//! - a read depends on the last writer (read-after-write)
//! - a write depends on every reader since the last write (write-after-read),
//!   or on the last writer when nobody read in between (write-after-write)
//!
//! Accesses of owned vertices count for their ownership root, so every
//! derived edge joins two roots. Edges from a root to itself are dropped.

use std::collections::HashSet;

use crate::graph::{DependencyEdge, PassHandle, RenderGraph};

#[derive(Debug, Clone, Default)]
struct ResourceState {
    last_writer: Option<PassHandle>,
    readers: Vec<PassHandle>,
}

/// Replace the graph's dependency edges with those implied by its access
/// log and ordering hints. Returns the number of edges.
pub(crate) fn resolve_dependencies(graph: &mut RenderGraph, resource_count: usize) -> usize {
    let mut states = vec![ResourceState::default(); resource_count];
    let mut edges = Vec::new();
    let mut seen = HashSet::new();
    let mut emit = |source: PassHandle, target: PassHandle, resource| {
        let edge = DependencyEdge {
            source,
            target,
            resource,
        };
        if source != target && seen.insert(edge) {
            edges.push(edge);
        }
    };

    for record in graph.accesses() {
        let pass = graph.root_of(record.pass);
        let state = &mut states[record.resource.index()];
        let resource = Some(record.resource);

        if record.access.is_read() {
            if let Some(writer) = state.last_writer {
                emit(writer, pass, resource);
            }
        }

        if record.access.is_write() {
            let mut after_reader = false;
            for &reader in &state.readers {
                if reader != pass {
                    emit(reader, pass, resource);
                    after_reader = true;
                }
            }
            if !after_reader && !record.access.is_read() {
                if let Some(writer) = state.last_writer {
                    emit(writer, pass, resource);
                }
            }
            state.last_writer = Some(pass);
            state.readers.clear();
        } else if !state.readers.contains(&pass) {
            state.readers.push(pass);
        }
    }

    for &(before, after) in graph.ordering_hints() {
        emit(graph.root_of(before), graph.root_of(after), None);
    }

    graph.clear_edges();
    let count = edges.len();
    for edge in edges {
        graph.add_edge(edge);
    }
    log::trace!("resolved {} dependency edges", count);
    count
}
