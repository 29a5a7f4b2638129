//! TTL cache in front of an aggregator
//!
//! Readers get an `Arc` snapshot of the last aggregation. A fresh entry is
//! served from a std `RwLock` read, so the hit path never suspends. When the
//! entry is missing or expired, one caller refreshes behind an async mutex
//! and everyone queued behind it re-checks freshness before fanning out again.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::Mutex;

use crate::rates::aggregator::Aggregate;
use crate::types::AggregationResult;

/// What to do when a refresh comes back with no records at all
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StalePolicy {
    /// Keep serving the previous records for another TTL window
    #[default]
    ServeStale,
    /// Store the empty result like any other
    ReplaceWithEmpty,
}

/// The stored snapshot
#[derive(Debug)]
struct CacheEntry<R> {
    result: Arc<AggregationResult<R>>,
    stored_at: DateTime<Utc>,
    /// Previous records re-served after a fully failed refresh
    degraded: bool,
}

impl<R> Clone for CacheEntry<R> {
    fn clone(&self) -> Self {
        Self {
            result: Arc::clone(&self.result),
            stored_at: self.stored_at,
            degraded: self.degraded,
        }
    }
}

/// Cache health for status endpoints
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CacheStatus {
    pub cached: bool,
    pub age_secs: Option<u64>,
    pub ttl_secs: u64,
    pub records: usize,
    pub failed_sources: Vec<String>,
    pub degraded: bool,
}

pub struct RateCache<A: Aggregate> {
    aggregator: A,
    ttl: Duration,
    policy: StalePolicy,
    entry: RwLock<Option<CacheEntry<A::Record>>>,
    refresh_lock: Mutex<()>,
}

impl<A: Aggregate> RateCache<A>
where
    A::Record: Clone,
{
    pub fn new(aggregator: A, ttl: Duration, policy: StalePolicy) -> Self {
        Self {
            aggregator,
            ttl,
            policy,
            entry: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn aggregator(&self) -> &A {
        &self.aggregator
    }

    /// Current snapshot, refreshing it first if it has expired
    pub async fn get(&self) -> Arc<AggregationResult<A::Record>> {
        self.get_or_refresh(Utc::now()).await
    }

    pub async fn get_or_refresh(&self, now: DateTime<Utc>) -> Arc<AggregationResult<A::Record>> {
        if let Some(result) = self.fresh(now) {
            tracing::debug!("Cache hit");
            return result;
        }

        let _guard = self.refresh_lock.lock().await;

        // Someone else may have refreshed while we waited for the lock
        if let Some(result) = self.fresh(now) {
            tracing::debug!("Cache refreshed by a concurrent caller");
            return result;
        }

        tracing::info!("Cache miss, refreshing");
        let fresh = Arc::new(self.aggregator.aggregate().await);
        self.store(fresh, now)
    }

    /// True when an entry exists and is within its TTL
    pub fn is_cached(&self, now: DateTime<Utc>) -> bool {
        self.cache_age(now).is_some_and(|age| age < self.ttl)
    }

    /// Age of the current entry, `None` when nothing is stored
    pub fn cache_age(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.entry().map(|entry| age_of(&entry, now))
    }

    pub fn status(&self, now: DateTime<Utc>) -> CacheStatus {
        let entry = self.entry();
        let age = entry.as_ref().map(|e| age_of(e, now));
        CacheStatus {
            cached: age.is_some_and(|age| age < self.ttl),
            age_secs: age.map(|age| age.as_secs()),
            ttl_secs: self.ttl.as_secs(),
            records: entry.as_ref().map_or(0, |e| e.result.records.len()),
            failed_sources: entry
                .as_ref()
                .map(|e| e.result.failed_sources.clone())
                .unwrap_or_default(),
            degraded: entry.as_ref().is_some_and(|e| e.degraded),
        }
    }

    fn fresh(&self, now: DateTime<Utc>) -> Option<Arc<AggregationResult<A::Record>>> {
        let entry = self.entry()?;
        (age_of(&entry, now) < self.ttl).then_some(entry.result)
    }

    /// Current entry, fresh or not
    fn entry(&self) -> Option<CacheEntry<A::Record>> {
        self.entry
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn store(
        &self,
        fresh: Arc<AggregationResult<A::Record>>,
        now: DateTime<Utc>,
    ) -> Arc<AggregationResult<A::Record>> {
        let mut slot = self.entry.write().unwrap_or_else(|e| e.into_inner());

        if fresh.records.is_empty() && self.policy == StalePolicy::ServeStale {
            let previous = slot
                .as_ref()
                .filter(|e| !e.result.records.is_empty())
                .map(|e| Arc::clone(&e.result));
            if let Some(previous) = previous {
                tracing::warn!(
                    failed = ?fresh.failed_sources,
                    previous_records = previous.records.len(),
                    "Refresh returned no records, serving previous snapshot"
                );
                // Old records and fetch time, current failures
                let result = Arc::new(AggregationResult::new(
                    previous.records.clone(),
                    fresh.failed_sources.clone(),
                    previous.fetched_at,
                ));
                *slot = Some(CacheEntry {
                    result: Arc::clone(&result),
                    stored_at: now,
                    degraded: true,
                });
                return result;
            }
        }

        *slot = Some(CacheEntry {
            result: Arc::clone(&fresh),
            stored_at: now,
            degraded: false,
        });
        fresh
    }
}

/// Entries stamped after `now` count as brand new
fn age_of<R>(entry: &CacheEntry<R>, now: DateTime<Utc>) -> Duration {
    (now - entry.stored_at).to_std().unwrap_or(Duration::ZERO)
}
