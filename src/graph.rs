//! Immutable adjacency-list graph shared by every traversal.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

/// Node identifier bound: anything hashable that can cross thread boundaries.
///
/// Blanket-implemented, so `u32`, `i64`, `String` and similar all qualify.
pub trait NodeId: Eq + Hash + Clone + Debug + Send + Sync + 'static {}

impl<T> NodeId for T where T: Eq + Hash + Clone + Debug + Send + Sync + 'static {}

/// Directed graph as a mapping from node to its ordered outgoing neighbors.
///
/// Never mutated once built; dispatch shares it as `Arc<Graph<N>>` and every
/// worker reads it without locking. Neighbor order is significant: BFS
/// follows edges in exactly this order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
#[serde(bound(
    serialize = "N: Serialize + Eq + Hash",
    deserialize = "N: Deserialize<'de> + Eq + Hash"
))]
pub struct Graph<N> {
    adjacency: HashMap<N, Vec<N>>,
}

impl<N: NodeId> Default for Graph<N> {
    fn default() -> Self {
        Self {
            adjacency: HashMap::new(),
        }
    }
}

impl<N: NodeId> Graph<N> {
    /// Wrap a pre-built adjacency mapping.
    pub fn new(adjacency: HashMap<N, Vec<N>>) -> Self {
        Self { adjacency }
    }

    /// Build from `(from, to)` pairs. Edge order per source is preserved and
    /// targets are registered as nodes with no outgoing edges.
    pub fn from_edges<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = (N, N)>,
    {
        let mut adjacency: HashMap<N, Vec<N>> = HashMap::new();
        for (from, to) in edges {
            adjacency.entry(to.clone()).or_default();
            adjacency.entry(from).or_default().push(to);
        }
        Self { adjacency }
    }

    /// Outgoing neighbors of `node`, in adjacency order.
    ///
    /// Unknown nodes have no neighbors.
    pub fn neighbors(&self, node: &N) -> &[N] {
        self.adjacency.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, node: &N) -> bool {
        self.adjacency.contains_key(node)
    }

    /// Number of nodes that have an adjacency entry.
    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// BFS visitation order from `start`. See [`crate::traverse`].
    pub fn bfs(&self, start: &N) -> Vec<N> {
        crate::traversal::traverse(self, start)
    }
}

impl<N: NodeId> From<HashMap<N, Vec<N>>> for Graph<N> {
    fn from(adjacency: HashMap<N, Vec<N>>) -> Self {
        Self::new(adjacency)
    }
}

impl<N: NodeId> FromIterator<(N, Vec<N>)> for Graph<N> {
    fn from_iter<I: IntoIterator<Item = (N, Vec<N>)>>(iter: I) -> Self {
        Self {
            adjacency: iter.into_iter().collect(),
        }
    }
}
