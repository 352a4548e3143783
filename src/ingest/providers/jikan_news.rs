// src/ingest/providers/jikan_news.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::counter;
use serde::Deserialize;

use crate::ingest::types::{parse_published, NewsSource, NormalizedArticle, SourceName};

#[derive(Debug, Deserialize)]
struct NewsResponse {
    #[serde(default)]
    data: Vec<NewsItem>,
}

#[derive(Debug, Deserialize)]
struct NewsItem {
    mal_id: u64,
    title: Option<String>,
    url: Option<String>,
    date: Option<String>,
    images: Option<Images>,
    excerpt: Option<String>,
    author_username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Images {
    jpg: Option<Jpg>,
}

#[derive(Debug, Deserialize)]
struct Jpg {
    image_url: Option<String>,
}

/// MyAnimeList news via the Jikan REST API. The only source with
/// provider-native article ids.
pub struct JikanNewsSource {
    mode: Mode,
    limit: usize,
}

enum Mode {
    Http {
        client: reqwest::Client,
        endpoint: String,
    },
    // Raw JSON payload, for offline runs and tests.
    Fixture(String),
}

impl JikanNewsSource {
    pub fn new(client: reqwest::Client, jikan_base: &str, limit: usize) -> Self {
        Self {
            mode: Mode::Http {
                client,
                endpoint: format!("{}/anime/1/news", jikan_base.trim_end_matches('/')),
            },
            limit,
        }
    }

    pub fn from_fixture(json: &str, limit: usize) -> Self {
        Self {
            mode: Mode::Fixture(json.to_string()),
            limit,
        }
    }

    fn map_items(resp: NewsResponse, limit: usize) -> Vec<NormalizedArticle> {
        resp.data
            .into_iter()
            .take(limit)
            .filter_map(|item| {
                let title = item.title?;
                let link = item.url?;
                Some(NormalizedArticle {
                    id: item.mal_id.to_string(),
                    title,
                    link,
                    published_at: item.date.as_deref().and_then(parse_published),
                    thumbnail: item
                        .images
                        .and_then(|i| i.jpg)
                        .and_then(|j| j.image_url)
                        .unwrap_or_default(),
                    description: item.excerpt.unwrap_or_default(),
                    author: item.author_username,
                    source: SourceName::MyAnimeList,
                })
            })
            .collect()
    }
}

#[async_trait]
impl NewsSource for JikanNewsSource {
    async fn fetch_latest(&self) -> Result<Vec<NormalizedArticle>> {
        let resp: NewsResponse = match &self.mode {
            Mode::Http { client, endpoint } => client
                .get(endpoint)
                .send()
                .await
                .context("jikan news get()")?
                .error_for_status()
                .context("jikan news status")?
                .json()
                .await
                .context("jikan news body")?,
            Mode::Fixture(json) => {
                serde_json::from_str(json).context("parsing jikan news fixture")?
            }
        };
        let out = Self::map_items(resp, self.limit);
        counter!("news_articles_total", "source" => "mal").increment(out.len() as u64);
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "MyAnimeList News"
    }
}
