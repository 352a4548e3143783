// src/ingest/types.rs
use anyhow::Result;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc2822;
use time::OffsetDateTime;

/// Provenance label for an aggregated article. Closed set; the serialized
/// strings are part of the public JSON contract consumed by the frontend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceName {
    #[serde(rename = "MyAnimeList News")]
    MyAnimeList,
    #[serde(rename = "Anime News Network")]
    AnimeNewsNetwork,
    #[serde(rename = "Crunchyroll")]
    Crunchyroll,
    #[serde(rename = "Currently Airing")]
    CurrentlyAiring,
}

/// One article after normalization, regardless of which upstream produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedArticle {
    /// Provider-native id where the upstream has one (MAL), otherwise a
    /// hash of the article link so the id survives re-aggregation.
    pub id: String,
    pub title: String,
    pub link: String,
    /// `None` when the provider sent nothing parseable. Sorts last.
    pub published_at: Option<DateTime<Utc>>,
    /// URL or empty string, never null.
    pub thumbnail: String,
    /// May carry raw HTML; empty string when unavailable.
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub source: SourceName,
}

/// Per-primary-source contribution counts. The airing fallback is
/// intentionally absent here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCounts {
    pub mal: usize,
    pub ann: usize,
    pub crunchyroll: usize,
}

/// The unit stored in the cache and served to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationResult {
    pub articles: Vec<NormalizedArticle>,
    #[serde(rename = "updated")]
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "sources")]
    pub source_counts: SourceCounts,
    pub total: usize,
}

/// One upstream news provider. Implementations keep failure information as
/// real errors; the aggregator is the only place they collapse to an empty
/// list.
#[async_trait::async_trait]
pub trait NewsSource: Send + Sync {
    async fn fetch_latest(&self) -> Result<Vec<NormalizedArticle>>;
    fn name(&self) -> &'static str;
}

/// Parse the publish-date shapes seen across upstreams: RFC 3339 (Jikan),
/// RFC 2822 (raw RSS pubDate), and the rss2json proxy's
/// `YYYY-MM-DD HH:MM:SS` (UTC).
pub fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = OffsetDateTime::parse(s, &Rfc2822) {
        return DateTime::<Utc>::from_timestamp(dt.unix_timestamp(), 0);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

/// Stable id for sources without native identifiers: prefix plus the first
/// six bytes of a SHA-256 over the article link. The same article keeps the
/// same id across aggregation runs.
pub fn stable_id(prefix: &str, link: &str) -> String {
    use sha2::{Digest, Sha256};
    use std::fmt::Write as _;

    let digest = Sha256::digest(link.as_bytes());
    let mut hex = String::with_capacity(12);
    for byte in &digest[..6] {
        let _ = write!(hex, "{byte:02x}");
    }
    format!("{prefix}-{hex}")
}
