//! Aniverse news service — binary entrypoint.
//! Boots the Axum HTTP server, wiring config, upstream sources, the cache
//! and the metrics exporter.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use aniverse_news::api::{self, AppState};
use aniverse_news::cache::NewsCache;
use aniverse_news::config::NewsConfig;
use aniverse_news::ingest::providers::jikan_news::JikanNewsSource;
use aniverse_news::ingest::providers::jikan_top::JikanTopAiringSource;
use aniverse_news::ingest::providers::rss_proxy::RssProxySource;
use aniverse_news::ingest::{Aggregator, AggregatorCfg};
use aniverse_news::metrics::Metrics;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("aniverse_news=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = NewsConfig::load()?;
    let metrics = Metrics::init(cfg.cache_ttl_secs);

    // One shared client; the per-request timeout lives here so every
    // upstream call is bounded even before the aggregator's own deadline.
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(cfg.request_timeout_secs))
        .user_agent(concat!("aniverse-news/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("building http client")?;

    let aggregator = Aggregator::new(
        Box::new(JikanNewsSource::new(
            client.clone(),
            &cfg.jikan_base_url,
            cfg.mal_limit,
        )),
        Box::new(RssProxySource::ann(
            client.clone(),
            &cfg.rss2json_base_url,
            &cfg.ann_feed_url,
            cfg.ann_limit,
            &cfg.ann_placeholder_thumbnail,
        )),
        Box::new(RssProxySource::crunchyroll(
            client.clone(),
            &cfg.rss2json_base_url,
            &cfg.crunchyroll_feed_url,
            cfg.crunchyroll_limit,
            &cfg.crunchyroll_placeholder_thumbnail,
        )),
        Box::new(JikanTopAiringSource::new(
            client,
            &cfg.jikan_base_url,
            cfg.airing_limit,
        )),
        AggregatorCfg {
            per_source_timeout: Duration::from_secs(cfg.request_timeout_secs),
            fallback_threshold: cfg.fallback_threshold,
        },
    );

    let state = AppState {
        aggregator: Arc::new(aggregator),
        cache: Arc::new(NewsCache::new(Duration::from_secs(cfg.cache_ttl_secs))),
    };

    let router = api::create_router(state).merge(metrics.router());

    let addr = format!("{}:{}", cfg.bind_addr, cfg.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, "aniverse-news listening");
    axum::serve(listener, router).await.context("serving")?;
    Ok(())
}
