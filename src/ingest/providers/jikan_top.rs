// src/ingest/providers/jikan_top.rs
//
// Last-resort source: repurposes Jikan's "top airing" listing as pseudo-news
// so the endpoint stays presentable during a full news outage.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::counter;
use serde::Deserialize;

use crate::ingest::types::{NewsSource, NormalizedArticle, SourceName};

const SYNOPSIS_MAX_CHARS: usize = 200;

#[derive(Debug, Deserialize)]
struct TopResponse {
    #[serde(default)]
    data: Vec<TopAnime>,
}

#[derive(Debug, Deserialize)]
struct TopAnime {
    mal_id: u64,
    title: Option<String>,
    url: Option<String>,
    images: Option<Images>,
    synopsis: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Images {
    jpg: Option<Jpg>,
}

#[derive(Debug, Deserialize)]
struct Jpg {
    large_image_url: Option<String>,
    image_url: Option<String>,
}

pub struct JikanTopAiringSource {
    mode: Mode,
}

enum Mode {
    Http {
        client: reqwest::Client,
        endpoint: String,
    },
    Fixture(String),
}

impl JikanTopAiringSource {
    pub fn new(client: reqwest::Client, jikan_base: &str, limit: usize) -> Self {
        Self {
            mode: Mode::Http {
                client,
                endpoint: format!(
                    "{}/top/anime?filter=airing&limit={}",
                    jikan_base.trim_end_matches('/'),
                    limit
                ),
            },
        }
    }

    pub fn from_fixture(json: &str) -> Self {
        Self {
            mode: Mode::Fixture(json.to_string()),
        }
    }

    fn map_items(resp: TopResponse, now: DateTime<Utc>) -> Vec<NormalizedArticle> {
        resp.data
            .into_iter()
            .filter_map(|anime| {
                let title = anime.title?;
                let link = anime.url?;
                let jpg = anime.images.and_then(|i| i.jpg);
                Some(NormalizedArticle {
                    id: format!("airing-{}", anime.mal_id),
                    title: format!("{title} - Currently Airing"),
                    link,
                    published_at: Some(now),
                    thumbnail: jpg
                        .map(|j| j.large_image_url.or(j.image_url).unwrap_or_default())
                        .unwrap_or_default(),
                    description: anime
                        .synopsis
                        .map(|s| truncate_chars(&s, SYNOPSIS_MAX_CHARS))
                        .unwrap_or_else(|| "Popular anime currently airing.".to_string()),
                    author: None,
                    source: SourceName::CurrentlyAiring,
                })
            })
            .collect()
    }
}

// Char-boundary-safe truncation; byte slicing would panic mid-codepoint on
// synopses with Japanese titles in them.
fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max).collect();
        out.push_str("...");
        out
    }
}

#[async_trait]
impl NewsSource for JikanTopAiringSource {
    async fn fetch_latest(&self) -> Result<Vec<NormalizedArticle>> {
        let resp: TopResponse = match &self.mode {
            Mode::Http { client, endpoint } => client
                .get(endpoint)
                .send()
                .await
                .context("jikan top get()")?
                .error_for_status()
                .context("jikan top status")?
                .json()
                .await
                .context("jikan top body")?,
            Mode::Fixture(json) => serde_json::from_str(json).context("parsing jikan top fixture")?,
        };
        let out = Self::map_items(resp, Utc::now());
        counter!("news_articles_total", "source" => "airing").increment(out.len() as u64);
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "Currently Airing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_synopses_intact() {
        assert_eq!(truncate_chars("short", 200), "short");
    }

    #[test]
    fn truncate_cuts_on_char_boundary() {
        let s = "進撃の巨人".repeat(100);
        let out = truncate_chars(&s, 200);
        assert_eq!(out.chars().count(), 203);
        assert!(out.ends_with("..."));
    }
}
