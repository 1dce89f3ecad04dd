//! Single-query breadth-first traversal.

use std::collections::{HashSet, VecDeque};

use crate::graph::{Graph, NodeId};

/// Visit order of a breadth-first search from `start`.
///
/// The frontier is strictly FIFO and neighbors are enqueued in adjacency
/// order, so the result is fully determined by `(graph, start)`. A start node
/// missing from the graph yields `[start]`. Self-loops and neighbors that have
/// no adjacency entry of their own are fine.
pub fn traverse<N: NodeId>(graph: &Graph<N>, start: &N) -> Vec<N> {
    let mut order = Vec::new();
    let mut processed: HashSet<N> = HashSet::new();
    let mut frontier: VecDeque<N> = VecDeque::new();
    frontier.push_back(start.clone());

    while let Some(node) = frontier.pop_front() {
        // A node can be queued more than once before it is expanded.
        if !processed.insert(node.clone()) {
            continue;
        }

        for next in graph.neighbors(&node) {
            if !processed.contains(next) {
                frontier.push_back(next.clone());
            }
        }
        order.push(node);
    }

    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashMap;

    fn sample_graph() -> Graph<u32> {
        [
            (0, vec![1, 2]),
            (1, vec![2, 3]),
            (2, vec![3]),
            (3, vec![4]),
            (4, vec![]),
        ]
        .into_iter()
        .collect()
    }

    /// Textbook BFS that marks nodes on discovery rather than on expansion.
    fn reference_bfs(adjacency: &HashMap<u32, Vec<u32>>, start: u32) -> Vec<u32> {
        let mut seen = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);
        let mut order = Vec::new();
        while let Some(node) = queue.pop_front() {
            order.push(node);
            for &next in adjacency.get(&node).into_iter().flatten() {
                if seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        order
    }

    #[test]
    fn visits_in_layer_order() {
        let graph = sample_graph();
        assert_eq!(traverse(&graph, &0), vec![0, 1, 2, 3, 4]);
        assert_eq!(traverse(&graph, &1), vec![1, 2, 3, 4]);
        assert_eq!(traverse(&graph, &2), vec![2, 3, 4]);
        assert_eq!(traverse(&graph, &4), vec![4]);
    }

    #[test]
    fn absent_start_node_yields_itself() {
        let graph = sample_graph();
        assert_eq!(traverse(&graph, &99), vec![99]);
        assert_eq!(traverse(&Graph::<u32>::default(), &7), vec![7]);
    }

    #[test]
    fn handles_cycles_and_self_loops() {
        let graph: Graph<u32> = [(0, vec![0, 1]), (1, vec![2, 0]), (2, vec![1, 2])]
            .into_iter()
            .collect();
        assert_eq!(traverse(&graph, &0), vec![0, 1, 2]);
        assert_eq!(traverse(&graph, &2), vec![2, 1, 0]);
    }

    #[test]
    fn dangling_neighbor_is_visited_once() {
        let graph: Graph<u32> = [(0, vec![5, 5, 6])].into_iter().collect();
        assert_eq!(traverse(&graph, &0), vec![0, 5, 6]);
    }

    #[test]
    fn follows_adjacency_order() {
        let graph: Graph<&'static str> = [("root", vec!["b", "a"]), ("a", vec!["c"])]
            .into_iter()
            .collect();
        assert_eq!(traverse(&graph, &"root"), vec!["root", "b", "a", "c"]);
    }

    fn arb_adjacency() -> impl Strategy<Value = HashMap<u32, Vec<u32>>> {
        prop::collection::hash_map(0u32..40, prop::collection::vec(0u32..40, 0..6), 0..40)
    }

    proptest! {
        #[test]
        fn matches_reference_bfs(adjacency in arb_adjacency(), start in 0u32..40) {
            let expected = reference_bfs(&adjacency, start);
            let graph = Graph::new(adjacency);
            prop_assert_eq!(traverse(&graph, &start), expected);
        }

        #[test]
        fn each_node_appears_once(adjacency in arb_adjacency(), start in 0u32..40) {
            let graph = Graph::new(adjacency);
            let order = traverse(&graph, &start);
            let unique: HashSet<_> = order.iter().collect();
            prop_assert_eq!(unique.len(), order.len());
            prop_assert_eq!(order.first(), Some(&start));
        }
    }
}
