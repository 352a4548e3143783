// src/cache.rs
//
// Process-wide cache of the last aggregation. Owned explicitly and handed to
// the HTTP layer through AppState instead of living in a module-level global,
// so tests can build one per scenario with their own TTL.

use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use metrics::counter;
use tracing::debug;

use crate::ingest::types::AggregationResult;
use crate::ingest::Aggregator;

struct Slot {
    result: Arc<AggregationResult>,
    stored_at: Instant,
}

pub struct NewsCache {
    ttl: Duration,
    slot: RwLock<Option<Slot>>,
    // Serializes refreshes so concurrent misses share one aggregation
    // instead of each fanning out to the upstreams.
    refresh: tokio::sync::Mutex<()>,
}

impl NewsCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: RwLock::new(None),
            refresh: tokio::sync::Mutex::new(()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn fresh(&self) -> Option<Arc<AggregationResult>> {
        let guard = self.slot.read().expect("cache lock poisoned");
        guard
            .as_ref()
            .filter(|slot| slot.stored_at.elapsed() < self.ttl)
            .map(|slot| Arc::clone(&slot.result))
    }

    /// Serve the stored result while it is inside the TTL window, otherwise
    /// run one aggregation and replace the slot wholesale. The result is
    /// shared read-only; it is never mutated in place.
    pub async fn get_or_refresh(&self, aggregator: &Aggregator) -> Arc<AggregationResult> {
        if let Some(result) = self.fresh() {
            counter!("news_cache_hits_total").increment(1);
            return result;
        }

        let _guard = self.refresh.lock().await;
        // Another caller may have refreshed while we waited for the guard.
        if let Some(result) = self.fresh() {
            counter!("news_cache_hits_total").increment(1);
            return result;
        }

        counter!("news_cache_misses_total").increment(1);
        debug!("news cache miss, aggregating");
        let result = Arc::new(aggregator.aggregate().await);
        let mut guard = self.slot.write().expect("cache lock poisoned");
        *guard = Some(Slot {
            result: Arc::clone(&result),
            stored_at: Instant::now(),
        });
        result
    }
}
