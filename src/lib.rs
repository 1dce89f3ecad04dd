//! Bounded-concurrency BFS query dispatcher.
//!
//! Answers many independent breadth-first-search queries against one shared,
//! read-only directed graph while never running more than a fixed number of
//! traversals at once.
//!
//! # Architecture
//!
//! ```text
//! queries ──► QueryDispatcher ──► admission (worker pool | semaphore)
//!                   │                        │
//!                   │                        ├── traverse(graph, q)  (blocking pool)
//!                   │                        └── publish (q, order) ──► mpsc
//!                   │                                                    │
//!                   └──────────── collector (sole owner of ResultMap) ◄──┘
//! ```
//!
//! # Key Concepts
//!
//! - **Graph**: immutable adjacency lists shared as `Arc<Graph<N>>`
//! - **traverse**: deterministic queue-based BFS for a single start node
//! - **QueryDispatcher**: admission control + fan-out/fan-in of traversals
//! - **DispatchStats**: tasks launched, traversals run, peak concurrency
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use bfs_dispatch::{dispatch, Graph};
//!
//! # async fn run() -> Result<(), bfs_dispatch::DispatchError> {
//! let graph = Arc::new(Graph::from_edges([(0, 1), (0, 2), (1, 2), (2, 3)]));
//! let results = dispatch(graph, &[0, 1, 2], 2).await?;
//! assert_eq!(results[&0], vec![0, 1, 2, 3]);
//! # Ok(())
//! # }
//! ```

mod config;
mod dispatcher;
mod error;
mod graph;
mod stats;
mod traversal;

pub use config::{AdmissionStrategy, DispatchConfig, DuplicatePolicy};
pub use dispatcher::{dispatch, dispatch_blocking, DispatchReport, QueryDispatcher, ResultMap};
pub use error::DispatchError;
pub use graph::{Graph, NodeId};
pub use stats::{ConcurrencyGauge, DispatchStats};
pub use traversal::traverse;

/// Default number of simultaneous traversals when nothing is configured.
pub const DEFAULT_MAX_CONCURRENCY: i64 = 4;

/// Default buffer size of the result channel between workers and collector.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;
