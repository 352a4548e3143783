// tests/metrics_endpoint.rs
//
// One test per process: the Prometheus recorder is a process-global and can
// only be installed once.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use tower::ServiceExt as _;

use aniverse_news::api::{create_router, AppState};
use aniverse_news::cache::NewsCache;
use aniverse_news::ingest::providers::jikan_news::JikanNewsSource;
use aniverse_news::ingest::providers::jikan_top::JikanTopAiringSource;
use aniverse_news::ingest::providers::rss_proxy::RssProxySource;
use aniverse_news::ingest::{Aggregator, AggregatorCfg};
use aniverse_news::metrics::Metrics;

const JIKAN_NEWS: &str = include_str!("fixtures/jikan_news.json");
const JIKAN_TOP: &str = include_str!("fixtures/jikan_top.json");
const ANN: &str = include_str!("fixtures/rss2json_ann.json");
const CRUNCHYROLL: &str = include_str!("fixtures/rss2json_crunchyroll.json");

const PLACEHOLDER: &str = "https://cdn.myanimelist.net/images/anime/4/19644.jpg";

#[tokio::test]
async fn metrics_are_exposed_after_an_aggregation() {
    let metrics = Metrics::init(600);

    let aggregator = Aggregator::new(
        Box::new(JikanNewsSource::from_fixture(JIKAN_NEWS, 10)),
        Box::new(RssProxySource::ann_from_fixture(ANN, 20, PLACEHOLDER)),
        Box::new(RssProxySource::crunchyroll_from_fixture(
            CRUNCHYROLL,
            15,
            PLACEHOLDER,
        )),
        Box::new(JikanTopAiringSource::from_fixture(JIKAN_TOP)),
        AggregatorCfg {
            per_source_timeout: Duration::from_secs(1),
            fallback_threshold: 5,
        },
    );
    let state = AppState {
        aggregator: Arc::new(aggregator),
        cache: Arc::new(NewsCache::new(Duration::from_secs(600))),
    };
    let app = create_router(state).merge(metrics.router());

    // drive one real aggregation so the series carry values
    let req = Request::builder()
        .uri("/api/news")
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let req = Request::builder()
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let exposition = String::from_utf8(bytes.to_vec()).unwrap();

    assert!(exposition.contains("news_cache_ttl_secs"));
    assert!(exposition.contains("news_cache_misses_total"));
    assert!(exposition.contains("news_articles_total"));
    assert!(exposition.contains("news_aggregate_ms"));
}
