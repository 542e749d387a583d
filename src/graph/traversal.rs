//! Graph traversal shared by the compiler and the plan.

use std::collections::VecDeque;

/// Read-only directed graph over dense `u32` vertex ids.
///
/// Parallel edges are allowed; `successors` yields one entry per edge and
/// `in_degree` counts every incoming edge.
pub trait DirectedGraph {
    /// Size of the id space. Vertices not yielded by `vertices` are ignored.
    fn vertex_count(&self) -> usize;

    fn vertices(&self) -> impl Iterator<Item = u32> + '_;

    fn successors(&self, vertex: u32) -> impl Iterator<Item = u32> + '_;

    fn in_degree(&self, vertex: u32) -> usize;
}

/// Returns true if `to` can be reached from `from` by following edges.
pub fn is_reachable<G: DirectedGraph>(graph: &G, from: u32, to: u32) -> bool {
    if from == to {
        return true;
    }

    let mut visited = vec![false; graph.vertex_count()];
    let mut queue = VecDeque::from([from]);
    visited[from as usize] = true;

    while let Some(vertex) = queue.pop_front() {
        for next in graph.successors(vertex) {
            if next == to {
                return true;
            }
            if !visited[next as usize] {
                visited[next as usize] = true;
                queue.push_back(next);
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AdjacencyList(Vec<Vec<u32>>);

    impl DirectedGraph for AdjacencyList {
        fn vertex_count(&self) -> usize {
            self.0.len()
        }

        fn vertices(&self) -> impl Iterator<Item = u32> + '_ {
            0..self.0.len() as u32
        }

        fn successors(&self, vertex: u32) -> impl Iterator<Item = u32> + '_ {
            self.0[vertex as usize].iter().copied()
        }

        fn in_degree(&self, vertex: u32) -> usize {
            self.0.iter().flatten().filter(|&&v| v == vertex).count()
        }
    }

    #[test]
    fn test_reachability() {
        let graph = AdjacencyList(vec![vec![1], vec![2], vec![], vec![2]]);
        assert!(is_reachable(&graph, 0, 2));
        assert!(is_reachable(&graph, 3, 2));
        assert!(!is_reachable(&graph, 2, 0));
        assert!(!is_reachable(&graph, 0, 3));
        assert!(is_reachable(&graph, 1, 1));
    }

    #[test]
    fn test_in_degree_counts_parallel_edges() {
        let graph = AdjacencyList(vec![vec![1, 1], vec![]]);
        assert_eq!(graph.in_degree(1), 2);
        assert_eq!(graph.successors(0).count(), 2);
    }
}
