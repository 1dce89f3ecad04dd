//! QueryDispatcher — fans BFS queries out to a bounded pool and fans the
//! results back into one mapping.
//!
//! Admission is capped at `max_concurrency` simultaneous traversals, either
//! by a fixed set of long-lived workers draining a shared FIFO queue or by a
//! semaphore permit taken before each per-query task is spawned. Workers
//! publish `(query, order)` pairs over a bounded channel; the dispatch call
//! itself is the collector and the only writer of the result map.

use std::collections::{HashMap, HashSet, VecDeque};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, Mutex, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, trace, warn};

use crate::config::{AdmissionStrategy, DispatchConfig, DuplicatePolicy};
use crate::error::DispatchError;
use crate::graph::{Graph, NodeId};
use crate::stats::{ConcurrencyGauge, DispatchStats};
use crate::traversal::traverse;

/// Query start node → BFS visitation order.
pub type ResultMap<N> = HashMap<N, Vec<N>>;

/// Result mapping plus instrumentation for one dispatch call.
#[derive(Debug, Clone)]
pub struct DispatchReport<N> {
    pub results: ResultMap<N>,
    pub stats: DispatchStats,
}

type Published<N> = (N, Vec<N>);
type WorkerSet = JoinSet<Result<(), DispatchError>>;

/// Bounded-concurrency dispatcher. Holds only configuration, so one instance
/// can serve any number of calls over different graphs.
#[derive(Debug, Clone, Default)]
pub struct QueryDispatcher {
    config: DispatchConfig,
    gauge: Option<Arc<ConcurrencyGauge>>,
}

impl QueryDispatcher {
    pub fn new(config: DispatchConfig) -> Self {
        Self {
            config,
            gauge: None,
        }
    }

    /// Attach an external gauge. It is shared by every subsequent call, so the
    /// counters it carries (and the stats derived from it) are cumulative.
    pub fn with_gauge(mut self, gauge: Arc<ConcurrencyGauge>) -> Self {
        self.gauge = Some(gauge);
        self
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Run one traversal per query and return the complete result mapping.
    pub async fn dispatch<N: NodeId>(
        &self,
        graph: Arc<Graph<N>>,
        queries: &[N],
    ) -> Result<ResultMap<N>, DispatchError> {
        Ok(self.dispatch_with_report(graph, queries).await?.results)
    }

    /// Same as [`Self::dispatch`], also returning [`DispatchStats`].
    ///
    /// Returns only after every spawned task has been joined and the result
    /// channel is closed and drained. An invalid concurrency bound is
    /// rejected before any task, channel or semaphore exists.
    #[instrument(
        skip_all,
        fields(
            max_concurrency = self.config.max_concurrency,
            strategy = ?self.config.strategy,
            queries = queries.len()
        )
    )]
    pub async fn dispatch_with_report<N: NodeId>(
        &self,
        graph: Arc<Graph<N>>,
        queries: &[N],
    ) -> Result<DispatchReport<N>, DispatchError> {
        let slots = self.config.slots().inspect_err(|e| {
            warn!(error = %e, "rejecting dispatch");
        })?;

        let started = Instant::now();
        let admitted = admit_queries(queries, self.config.duplicates);
        let admitted_count = admitted.len();
        let gauge = self.gauge.clone().unwrap_or_else(ConcurrencyGauge::new);
        let (result_tx, result_rx) = mpsc::channel(self.config.channel_capacity.max(1));

        let strategy = self.config.strategy;
        let producer_gauge = Arc::clone(&gauge);
        let mut workers = WorkerSet::new();
        let spawn_into = &mut workers;
        let producer = async move {
            match strategy {
                AdmissionStrategy::WorkerPool => {
                    spawn_worker_pool(spawn_into, graph, admitted, slots, producer_gauge, result_tx);
                    Ok(())
                }
                AdmissionStrategy::PerQuery => {
                    submit_per_query(spawn_into, graph, admitted, slots, producer_gauge, result_tx)
                        .await
                }
            }
        };

        // The collector has to run alongside the producer: per-query
        // submission blocks on permits that are only released once results
        // have been sent into the bounded channel.
        let (submitted, results) = tokio::join!(producer, collect(result_rx));

        // Drain every task, even after a failure, so no traversal outlives
        // this call. The first error wins.
        let mut first_error = submitted.err();
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined.map_err(DispatchError::from).and_then(|outcome| outcome) {
                first_error.get_or_insert(e);
            }
        }
        if let Some(err) = first_error {
            warn!(error = %err, "dispatch failed");
            return Err(err);
        }

        let stats =
            DispatchStats::from_gauge(&gauge, queries.len(), admitted_count, started.elapsed());
        info!(
            results = results.len(),
            tasks_launched = stats.tasks_launched,
            peak_active = stats.peak_active,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            "dispatch complete"
        );
        Ok(DispatchReport { results, stats })
    }
}

/// Dispatch `queries` over `graph` with at most `max_concurrency` traversals
/// in flight, using the default worker-pool strategy.
pub async fn dispatch<N: NodeId>(
    graph: Arc<Graph<N>>,
    queries: &[N],
    max_concurrency: i64,
) -> Result<ResultMap<N>, DispatchError> {
    QueryDispatcher::new(DispatchConfig::new(max_concurrency))
        .dispatch(graph, queries)
        .await
}

/// Blocking variant of [`dispatch`] for callers outside an async context.
///
/// Builds a private multi-thread runtime. Panics if called from within a
/// tokio runtime, like any `block_on`.
pub fn dispatch_blocking<N: NodeId>(
    graph: Arc<Graph<N>>,
    queries: &[N],
    max_concurrency: i64,
) -> Result<ResultMap<N>, DispatchError> {
    let config = DispatchConfig::new(max_concurrency);
    config.slots()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(QueryDispatcher::new(config).dispatch(graph, queries))
}

fn admit_queries<N: NodeId>(queries: &[N], policy: DuplicatePolicy) -> Vec<N> {
    match policy {
        DuplicatePolicy::RunEach => queries.to_vec(),
        DuplicatePolicy::Collapse => {
            let mut seen = HashSet::with_capacity(queries.len());
            queries
                .iter()
                .filter(|query| seen.insert(*query))
                .cloned()
                .collect()
        }
    }
}

/// Sole owner of the result map. Ends once every sender has been dropped.
async fn collect<N: NodeId>(mut result_rx: mpsc::Receiver<Published<N>>) -> ResultMap<N> {
    let mut results = HashMap::new();
    while let Some((query, order)) = result_rx.recv().await {
        if results.insert(query, order).is_some() {
            trace!("duplicate query result replaced");
        }
    }
    results
}

/// Run one BFS on the blocking pool, counted by the gauge while it executes.
async fn run_traversal<N: NodeId>(
    graph: &Arc<Graph<N>>,
    query: N,
    gauge: &Arc<ConcurrencyGauge>,
) -> Result<Vec<N>, DispatchError> {
    let graph = Arc::clone(graph);
    let gauge = Arc::clone(gauge);
    let order = tokio::task::spawn_blocking(move || {
        let _active = gauge.enter();
        traverse(&graph, &query)
    })
    .await?;
    Ok(order)
}

// ---------------------------------------------------------------------------
// Worker pool
// ---------------------------------------------------------------------------

fn spawn_worker_pool<N: NodeId>(
    workers: &mut WorkerSet,
    graph: Arc<Graph<N>>,
    admitted: Vec<N>,
    slots: NonZeroUsize,
    gauge: Arc<ConcurrencyGauge>,
    result_tx: mpsc::Sender<Published<N>>,
) {
    let worker_count = slots.get().min(admitted.len());
    let queue = Arc::new(Mutex::new(VecDeque::from(admitted)));

    for worker_id in 0..worker_count {
        gauge.task_launched();
        workers.spawn(run_worker(
            worker_id,
            Arc::clone(&graph),
            Arc::clone(&queue),
            Arc::clone(&gauge),
            result_tx.clone(),
        ));
    }
    debug!(worker_count, "worker pool started");
}

/// Pull queries in input order until the queue is empty.
async fn run_worker<N: NodeId>(
    worker_id: usize,
    graph: Arc<Graph<N>>,
    queue: Arc<Mutex<VecDeque<N>>>,
    gauge: Arc<ConcurrencyGauge>,
    result_tx: mpsc::Sender<Published<N>>,
) -> Result<(), DispatchError> {
    let mut handled = 0usize;
    loop {
        let next = queue.lock().await.pop_front();
        let Some(query) = next else {
            break;
        };

        trace!(worker_id, query = ?query, "traversal started");
        let order = run_traversal(&graph, query.clone(), &gauge).await?;
        result_tx
            .send((query, order))
            .await
            .map_err(|_| DispatchError::CollectorClosed)?;
        handled += 1;
    }
    debug!(worker_id, handled, "worker drained queue, exiting");
    Ok(())
}

// ---------------------------------------------------------------------------
// Per-query tasks behind a semaphore
// ---------------------------------------------------------------------------

async fn submit_per_query<N: NodeId>(
    tasks: &mut WorkerSet,
    graph: Arc<Graph<N>>,
    admitted: Vec<N>,
    slots: NonZeroUsize,
    gauge: Arc<ConcurrencyGauge>,
    result_tx: mpsc::Sender<Published<N>>,
) -> Result<(), DispatchError> {
    let semaphore = Arc::new(Semaphore::new(slots.get()));
    let mut submitted = 0usize;

    for query in admitted {
        // Submitter blocks here while every slot is taken.
        let permit = Arc::clone(&semaphore)
            .acquire_owned()
            .await
            .map_err(|e| DispatchError::WorkerPanicked(e.to_string()))?;

        // Reap finished tasks so the set stays bounded by the slot count.
        // A failed task stops further submission.
        while let Some(joined) = tasks.try_join_next() {
            joined??;
        }

        gauge.task_launched();
        let graph = Arc::clone(&graph);
        let gauge = Arc::clone(&gauge);
        let result_tx = result_tx.clone();
        tasks.spawn(async move {
            trace!(query = ?query, "traversal started");
            let order = run_traversal(&graph, query.clone(), &gauge).await?;
            result_tx
                .send((query, order))
                .await
                .map_err(|_| DispatchError::CollectorClosed)?;
            drop(permit);
            Ok(())
        });
        submitted += 1;
    }
    debug!(submitted, in_flight = tasks.len(), "all queries submitted");
    Ok(())
}
