// tests/cache_ttl.rs
//
// TTL and refresh-coalescing behavior of the news cache, with upstream call
// counts asserted through mock sources.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use aniverse_news::cache::NewsCache;
use aniverse_news::ingest::types::{parse_published, NewsSource, NormalizedArticle, SourceName};
use aniverse_news::ingest::{Aggregator, AggregatorCfg};

struct CountingSource {
    calls: Arc<AtomicUsize>,
    delay: Duration,
}

#[async_trait]
impl NewsSource for CountingSource {
    async fn fetch_latest(&self) -> Result<Vec<NormalizedArticle>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(vec![NormalizedArticle {
            id: "m1".to_string(),
            title: "Counting article".to_string(),
            link: "https://example.com/m1".to_string(),
            published_at: parse_published("2026-08-06 10:00:00"),
            thumbnail: String::new(),
            description: String::new(),
            author: None,
            source: SourceName::MyAnimeList,
        }])
    }
    fn name(&self) -> &'static str {
        "counting"
    }
}

struct EmptySource;

#[async_trait]
impl NewsSource for EmptySource {
    async fn fetch_latest(&self) -> Result<Vec<NormalizedArticle>> {
        Ok(vec![])
    }
    fn name(&self) -> &'static str {
        "empty"
    }
}

/// Aggregator whose MAL slot counts upstream fetches; the other slots stay
/// quiet and the threshold is zero so the fallback never fires.
fn counting_aggregator(delay: Duration) -> (Aggregator, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let agg = Aggregator::new(
        Box::new(CountingSource {
            calls: Arc::clone(&calls),
            delay,
        }),
        Box::new(EmptySource),
        Box::new(EmptySource),
        Box::new(EmptySource),
        AggregatorCfg {
            per_source_timeout: Duration::from_secs(5),
            fallback_threshold: 0,
        },
    );
    (agg, calls)
}

#[tokio::test]
async fn two_calls_within_ttl_share_one_aggregation() {
    let (agg, calls) = counting_aggregator(Duration::ZERO);
    let cache = NewsCache::new(Duration::from_secs(10));

    let first = cache.get_or_refresh(&agg).await;
    let second = cache.get_or_refresh(&agg).await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    // the very same result object is shared, not a copy
    assert!(Arc::ptr_eq(&first, &second));
}

#[tokio::test]
async fn expired_entry_triggers_a_second_aggregation() {
    const TTL: Duration = Duration::from_millis(80);
    let (agg, calls) = counting_aggregator(Duration::ZERO);
    let cache = NewsCache::new(TTL);

    let first = cache.get_or_refresh(&agg).await;
    // well past the TTL to avoid boundary flakes on slow CI
    tokio::time::sleep(TTL * 5).await;
    let second = cache.get_or_refresh(&agg).await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(!Arc::ptr_eq(&first, &second));
    assert!(second.updated_at >= first.updated_at);
}

#[tokio::test]
async fn concurrent_misses_coalesce_into_one_refresh() {
    let (agg, calls) = counting_aggregator(Duration::from_millis(100));
    let agg = Arc::new(agg);
    let cache = Arc::new(NewsCache::new(Duration::from_secs(10)));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let agg = Arc::clone(&agg);
        let cache = Arc::clone(&cache);
        handles.push(tokio::spawn(async move {
            cache.get_or_refresh(&agg).await
        }));
    }

    for handle in handles {
        let result = handle.await.expect("task join");
        assert_eq!(result.total, 1);
    }

    // eight simultaneous cold readers, exactly one upstream fan-out
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
