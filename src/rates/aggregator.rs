//! Rate Aggregator - Fans out to every registered source concurrently
//!
//! Each source runs as its own task under a shared concurrency limit, with a
//! per-source timeout and a ceiling for the whole cycle. Successful outputs
//! are concatenated in registration order. A source that errors, times out,
//! panics or returns nothing is reported in `failed_sources`; it never
//! affects the others.

use async_trait::async_trait;
use chrono::Utc;
use futures_util::FutureExt;
use std::any::Any;
use std::collections::BTreeSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::rates::sources::SourceAdapter;
use crate::types::AggregationResult;

/// Fan-out limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregatorSettings {
    /// Maximum number of sources fetched at the same time
    pub max_concurrency: usize,
    /// Time allowed for one source once it has started
    pub source_timeout: Duration,
    /// Time allowed for the whole cycle, queueing included
    pub global_timeout: Duration,
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self {
            max_concurrency: 3,
            source_timeout: Duration::from_secs(10),
            global_timeout: Duration::from_secs(30),
        }
    }
}

/// Anything that can produce a fresh [`AggregationResult`]
#[async_trait]
pub trait Aggregate: Send + Sync {
    type Record: Send + Sync + 'static;

    async fn aggregate(&self) -> AggregationResult<Self::Record>;
}

/// How one source fared in a cycle
enum SourceOutcome<R> {
    Records(Vec<R>),
    Empty,
    Failed(anyhow::Error),
    TimedOut,
    Panicked(String),
}

/// Concurrent multi-source aggregator
pub struct Aggregator<R> {
    sources: Vec<Arc<dyn SourceAdapter<Record = R>>>,
    settings: AggregatorSettings,
}

impl<R: Send + 'static> Aggregator<R> {
    pub fn new(sources: Vec<Arc<dyn SourceAdapter<Record = R>>>, settings: AggregatorSettings) -> Self {
        Self { sources, settings }
    }

    /// Registered source names, in registration order
    pub fn source_names(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.name().to_string()).collect()
    }

    /// Run one aggregation cycle. Never fails: with every source down the
    /// result is empty and lists every source as failed.
    pub async fn run(&self) -> AggregationResult<R> {
        let started = Instant::now();
        let deadline = tokio::time::Instant::now() + self.settings.global_timeout;
        let permits = Arc::new(Semaphore::new(self.settings.max_concurrency.max(1)));

        let mut tasks = JoinSet::new();
        for (index, source) in self.sources.iter().enumerate() {
            let source = Arc::clone(source);
            let permits = Arc::clone(&permits);
            let timeout = self.settings.source_timeout;

            tasks.spawn(async move {
                // The semaphore is never closed, so acquire only fails if it is dropped
                let _permit = permits.acquire().await.ok();
                let fetch = AssertUnwindSafe(tokio::time::timeout(timeout, source.fetch()));
                let outcome = match fetch.catch_unwind().await {
                    Ok(Ok(Ok(records))) if records.is_empty() => SourceOutcome::Empty,
                    Ok(Ok(Ok(records))) => SourceOutcome::Records(records),
                    Ok(Ok(Err(e))) => SourceOutcome::Failed(e),
                    Ok(Err(_)) => SourceOutcome::TimedOut,
                    Err(payload) => SourceOutcome::Panicked(panic_message(&*payload)),
                };
                (index, outcome)
            });
        }

        // Anything still here when the loop ends (cancelled, global timeout) failed
        let mut pending: BTreeSet<usize> = (0..self.sources.len()).collect();
        let mut failed: BTreeSet<usize> = BTreeSet::new();
        let mut outputs: Vec<Vec<R>> = (0..self.sources.len()).map(|_| Vec::new()).collect();

        loop {
            match tokio::time::timeout_at(deadline, tasks.join_next()).await {
                Ok(Some(Ok((index, outcome)))) => {
                    pending.remove(&index);
                    let name = self.sources[index].name();
                    match outcome {
                        SourceOutcome::Records(batch) => {
                            tracing::info!(source = %name, count = batch.len(), "Fetched records");
                            outputs[index] = batch;
                        }
                        SourceOutcome::Empty => {
                            tracing::warn!(source = %name, "Source returned no records");
                            failed.insert(index);
                        }
                        SourceOutcome::Failed(e) => {
                            tracing::warn!(source = %name, error = %format!("{:#}", e), "Source fetch failed");
                            failed.insert(index);
                        }
                        SourceOutcome::TimedOut => {
                            tracing::warn!(
                                source = %name,
                                timeout_ms = self.settings.source_timeout.as_millis() as u64,
                                "Source fetch timed out"
                            );
                            failed.insert(index);
                        }
                        SourceOutcome::Panicked(detail) => {
                            tracing::error!(source = %name, panic = %detail, "Source fetch panicked");
                            failed.insert(index);
                        }
                    }
                }
                Ok(Some(Err(e))) => {
                    // Only reachable through cancellation; panics are caught in the task
                    tracing::error!(error = %e, "Source task aborted");
                }
                Ok(None) => break,
                Err(_) => {
                    tracing::warn!(
                        pending = pending.len(),
                        timeout_ms = self.settings.global_timeout.as_millis() as u64,
                        "Aggregation deadline reached, abandoning pending sources"
                    );
                    tasks.abort_all();
                    break;
                }
            }
        }

        failed.extend(pending);
        // Registration order, so ties in later comparisons are reproducible
        let records: Vec<R> = outputs.into_iter().flatten().collect();
        let failed_sources: Vec<String> = failed
            .into_iter()
            .map(|index| self.sources[index].name().to_string())
            .collect();

        if !failed_sources.is_empty() {
            tracing::warn!(failed = ?failed_sources, "Some sources failed");
        }
        tracing::info!(
            records = records.len(),
            ok_sources = self.sources.len() - failed_sources.len(),
            total_sources = self.sources.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Aggregation cycle complete"
        );

        AggregationResult::new(records, failed_sources, Utc::now())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[async_trait]
impl<R: Send + Sync + 'static> Aggregate for Aggregator<R> {
    type Record = R;

    async fn aggregate(&self) -> AggregationResult<R> {
        self.run().await
    }
}
