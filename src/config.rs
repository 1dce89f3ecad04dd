//! Dispatcher configuration.

use std::num::NonZeroUsize;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DispatchError;
use crate::{DEFAULT_CHANNEL_CAPACITY, DEFAULT_MAX_CONCURRENCY};

/// Configuration for a [`crate::QueryDispatcher`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Maximum number of traversals running at once. Signed so that callers
    /// can hand through unvalidated input; anything `<= 0` is rejected.
    pub max_concurrency: i64,
    /// How traversals are admitted into the bounded pool.
    pub strategy: AdmissionStrategy,
    /// What to do with repeated start nodes in one query list.
    pub duplicates: DuplicatePolicy,
    /// Buffer size of the worker → collector channel.
    pub channel_capacity: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            strategy: AdmissionStrategy::default(),
            duplicates: DuplicatePolicy::default(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// Admission strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdmissionStrategy {
    /// Fixed set of long-lived workers pulling queries from a shared queue.
    #[default]
    WorkerPool,
    /// One task per query, spawned only after a semaphore permit is acquired.
    PerQuery,
}

/// Handling of start nodes that appear more than once in a query list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// Run each distinct start node once, at its first position.
    #[default]
    Collapse,
    /// Run every occurrence; the collector keeps whichever result arrives last.
    RunEach,
}

impl FromStr for AdmissionStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "worker-pool" | "worker_pool" | "pool" => Ok(Self::WorkerPool),
            "per-query" | "per_query" | "semaphore" => Ok(Self::PerQuery),
            other => Err(format!("unknown admission strategy: {other}")),
        }
    }
}

impl FromStr for DuplicatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "collapse" | "dedupe" => Ok(Self::Collapse),
            "run-each" | "run_each" => Ok(Self::RunEach),
            other => Err(format!("unknown duplicate policy: {other}")),
        }
    }
}

impl DispatchConfig {
    pub fn new(max_concurrency: i64) -> Self {
        Self {
            max_concurrency,
            ..Default::default()
        }
    }

    pub fn with_strategy(mut self, strategy: AdmissionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_duplicates(mut self, duplicates: DuplicatePolicy) -> Self {
        self.duplicates = duplicates;
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Read config from environment variables:
    ///   BFS_DISPATCH_MAX_CONCURRENCY  — slot count (default: 4)
    ///   BFS_DISPATCH_STRATEGY         — worker-pool | per-query
    ///   BFS_DISPATCH_DUPLICATES       — collapse | run-each
    ///   BFS_DISPATCH_CHANNEL_CAPACITY — collector buffer (default: 64)
    ///
    /// Absent or unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            max_concurrency: lookup("BFS_DISPATCH_MAX_CONCURRENCY")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.max_concurrency),
            strategy: lookup("BFS_DISPATCH_STRATEGY")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.strategy),
            duplicates: lookup("BFS_DISPATCH_DUPLICATES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.duplicates),
            channel_capacity: lookup("BFS_DISPATCH_CHANNEL_CAPACITY")
                .and_then(|v| v.trim().parse().ok())
                .filter(|&c: &usize| c > 0)
                .unwrap_or(defaults.channel_capacity),
        }
    }

    /// Validate the concurrency bound.
    pub fn slots(&self) -> Result<NonZeroUsize, DispatchError> {
        usize::try_from(self.max_concurrency)
            .ok()
            .and_then(NonZeroUsize::new)
            .ok_or(DispatchError::InvalidConcurrency(self.max_concurrency))
    }
}
