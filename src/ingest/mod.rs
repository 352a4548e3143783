// src/ingest/mod.rs
pub mod image;
pub mod providers;
pub mod types;

use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;
use tracing::{info, warn};

use crate::ingest::types::{AggregationResult, NewsSource, NormalizedArticle, SourceCounts};

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "news_articles_total",
            "Articles mapped per source across all aggregations."
        );
        describe_counter!(
            "news_provider_errors_total",
            "Upstream fetch/parse errors and timeouts."
        );
        describe_counter!(
            "news_fallback_invocations_total",
            "Times the airing fallback was invoked."
        );
        describe_counter!("news_cache_hits_total", "News cache hits.");
        describe_counter!("news_cache_misses_total", "News cache misses.");
        describe_histogram!("news_aggregate_ms", "Full aggregation time in milliseconds.");
        describe_gauge!("news_last_refresh_ts", "Unix ts of the last aggregation.");
    });
}

#[derive(Clone, Copy, Debug)]
pub struct AggregatorCfg {
    pub per_source_timeout: Duration,
    pub fallback_threshold: usize,
}

impl Default for AggregatorCfg {
    fn default() -> Self {
        Self {
            per_source_timeout: Duration::from_secs(12),
            fallback_threshold: 5,
        }
    }
}

/// Fans out to the primary sources, applies the fallback policy, and merges
/// everything into one sorted `AggregationResult`. Sources are trait objects
/// so tests can inject mocks.
pub struct Aggregator {
    mal: Box<dyn NewsSource>,
    ann: Box<dyn NewsSource>,
    crunchyroll: Box<dyn NewsSource>,
    fallback: Box<dyn NewsSource>,
    cfg: AggregatorCfg,
}

impl Aggregator {
    pub fn new(
        mal: Box<dyn NewsSource>,
        ann: Box<dyn NewsSource>,
        crunchyroll: Box<dyn NewsSource>,
        fallback: Box<dyn NewsSource>,
        cfg: AggregatorCfg,
    ) -> Self {
        Self {
            mal,
            ann,
            crunchyroll,
            fallback,
            cfg,
        }
    }

    /// A failing or hanging upstream contributes an empty list, never an
    /// error. This is the failure-isolation boundary for the whole service.
    async fn fetch_one(&self, source: &dyn NewsSource) -> Vec<NormalizedArticle> {
        match tokio::time::timeout(self.cfg.per_source_timeout, source.fetch_latest()).await {
            Ok(Ok(articles)) => articles,
            Ok(Err(e)) => {
                warn!(error = ?e, source = source.name(), "provider error");
                counter!("news_provider_errors_total").increment(1);
                Vec::new()
            }
            Err(_) => {
                warn!(
                    source = source.name(),
                    timeout_ms = self.cfg.per_source_timeout.as_millis() as u64,
                    "provider timed out"
                );
                counter!("news_provider_errors_total").increment(1);
                Vec::new()
            }
        }
    }

    /// Never fails; the worst case is a valid result with zero articles.
    pub async fn aggregate(&self) -> AggregationResult {
        ensure_metrics_described();
        let t0 = std::time::Instant::now();

        let (mal, ann, crunchyroll) = tokio::join!(
            self.fetch_one(self.mal.as_ref()),
            self.fetch_one(self.ann.as_ref()),
            self.fetch_one(self.crunchyroll.as_ref()),
        );

        let source_counts = SourceCounts {
            mal: mal.len(),
            ann: ann.len(),
            crunchyroll: crunchyroll.len(),
        };

        let mut articles: Vec<NormalizedArticle> =
            Vec::with_capacity(mal.len() + ann.len() + crunchyroll.len());
        articles.extend(mal);
        articles.extend(ann);
        articles.extend(crunchyroll);

        // Partial real news beats wholesale replacement: the fallback only
        // appends, and only when the primaries collectively under-deliver.
        if articles.len() < self.cfg.fallback_threshold {
            info!(
                primary = articles.len(),
                "primaries under-delivered, invoking airing fallback"
            );
            counter!("news_fallback_invocations_total").increment(1);
            let extra = self.fetch_one(self.fallback.as_ref()).await;
            articles.extend(extra);
        }

        // Newest first; articles without a parseable date sort last.
        articles.sort_by(|a, b| b.published_at.cmp(&a.published_at));

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("news_aggregate_ms").record(ms);
        gauge!("news_last_refresh_ts").set(chrono::Utc::now().timestamp() as f64);

        let total = articles.len();
        AggregationResult {
            articles,
            updated_at: chrono::Utc::now(),
            source_counts,
            total,
        }
    }
}
