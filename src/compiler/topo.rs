//! Deterministic topological sort.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::graph::DirectedGraph;

/// Kahn's algorithm with a min-heap of ready vertices.
///
/// Among vertices that are ready at the same time the lowest id (insertion
/// order) goes first, so identical graphs always sort identically.
///
/// On a cycle, returns the vertices that could not be ordered, ascending.
pub fn topological_sort<G: DirectedGraph>(graph: &G) -> Result<Vec<u32>, Vec<u32>> {
    let mut in_degree = vec![0usize; graph.vertex_count()];
    let mut ready = BinaryHeap::new();
    let mut total = 0;

    for vertex in graph.vertices() {
        total += 1;
        in_degree[vertex as usize] = graph.in_degree(vertex);
        if in_degree[vertex as usize] == 0 {
            ready.push(Reverse(vertex));
        }
    }

    let mut order = Vec::with_capacity(total);
    while let Some(Reverse(vertex)) = ready.pop() {
        order.push(vertex);
        for next in graph.successors(vertex) {
            in_degree[next as usize] -= 1;
            if in_degree[next as usize] == 0 {
                ready.push(Reverse(next));
            }
        }
    }

    if order.len() == total {
        Ok(order)
    } else {
        let mut remaining: Vec<u32> = graph
            .vertices()
            .filter(|&vertex| in_degree[vertex as usize] > 0)
            .collect();
        remaining.sort_unstable();
        Err(remaining)
    }
}
