// src/ingest/providers/rss_proxy.rs
//
// Feed adapter for sources that only publish RSS. The feed is converted by
// an external RSS-to-JSON proxy, so this service never parses XML itself.
// One implementation covers both ANN and Crunchyroll; the per-source knobs
// live in the constructors.

use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::counter;
use serde::Deserialize;

use crate::ingest::image::extract_image_from_html;
use crate::ingest::types::{parse_published, stable_id, NewsSource, NormalizedArticle, SourceName};

#[derive(Debug, Deserialize)]
struct ProxyResponse {
    #[serde(default)]
    items: Vec<ProxyItem>,
}

#[derive(Debug, Deserialize)]
struct ProxyItem {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    thumbnail: Option<String>,
    enclosure: Option<Enclosure>,
    description: Option<String>,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Enclosure {
    link: Option<String>,
}

pub struct RssProxySource {
    mode: Mode,
    source: SourceName,
    display_name: &'static str,
    metrics_key: &'static str,
    id_prefix: &'static str,
    limit: usize,
    placeholder_thumbnail: String,
}

enum Mode {
    Http {
        client: reqwest::Client,
        proxy_base: String,
        feed_url: String,
    },
    Fixture(String),
}

// (display_name, metrics_key, id_prefix) per source
const ANN_SPEC: (SourceName, &str, &str, &str) =
    (SourceName::AnimeNewsNetwork, "Anime News Network", "ann", "ann");
const CR_SPEC: (SourceName, &str, &str, &str) =
    (SourceName::Crunchyroll, "Crunchyroll", "crunchyroll", "cr");

impl RssProxySource {
    fn with_mode(
        mode: Mode,
        spec: (SourceName, &'static str, &'static str, &'static str),
        limit: usize,
        placeholder_thumbnail: &str,
    ) -> Self {
        let (source, display_name, metrics_key, id_prefix) = spec;
        Self {
            mode,
            source,
            display_name,
            metrics_key,
            id_prefix,
            limit,
            placeholder_thumbnail: placeholder_thumbnail.to_string(),
        }
    }

    fn http_mode(client: reqwest::Client, proxy_base: &str, feed_url: &str) -> Mode {
        Mode::Http {
            client,
            proxy_base: proxy_base.to_string(),
            feed_url: feed_url.to_string(),
        }
    }

    pub fn ann(
        client: reqwest::Client,
        proxy_base: &str,
        feed_url: &str,
        limit: usize,
        placeholder_thumbnail: &str,
    ) -> Self {
        Self::with_mode(
            Self::http_mode(client, proxy_base, feed_url),
            ANN_SPEC,
            limit,
            placeholder_thumbnail,
        )
    }

    pub fn crunchyroll(
        client: reqwest::Client,
        proxy_base: &str,
        feed_url: &str,
        limit: usize,
        placeholder_thumbnail: &str,
    ) -> Self {
        Self::with_mode(
            Self::http_mode(client, proxy_base, feed_url),
            CR_SPEC,
            limit,
            placeholder_thumbnail,
        )
    }

    pub fn ann_from_fixture(json: &str, limit: usize, placeholder_thumbnail: &str) -> Self {
        Self::with_mode(
            Mode::Fixture(json.to_string()),
            ANN_SPEC,
            limit,
            placeholder_thumbnail,
        )
    }

    pub fn crunchyroll_from_fixture(json: &str, limit: usize, placeholder_thumbnail: &str) -> Self {
        Self::with_mode(
            Mode::Fixture(json.to_string()),
            CR_SPEC,
            limit,
            placeholder_thumbnail,
        )
    }

    fn map_items(&self, resp: ProxyResponse) -> Vec<NormalizedArticle> {
        resp.items
            .into_iter()
            .take(self.limit)
            .filter_map(|item| {
                let title = item.title?;
                let link = item.link?;

                let description_html = item.description.unwrap_or_default();
                let content_html = item.content.unwrap_or_default();

                // Thumbnail resolution chain: structured field, enclosure,
                // image scraped from description, then content, then the
                // per-source placeholder.
                let mut thumbnail = item
                    .thumbnail
                    .filter(|t| !t.is_empty())
                    .or_else(|| {
                        item.enclosure
                            .and_then(|e| e.link)
                            .filter(|l| !l.is_empty())
                    })
                    .unwrap_or_default();
                if thumbnail.is_empty() {
                    thumbnail = extract_image_from_html(&description_html);
                }
                if thumbnail.is_empty() {
                    thumbnail = extract_image_from_html(&content_html);
                }
                if thumbnail.is_empty() {
                    thumbnail = self.placeholder_thumbnail.clone();
                }

                let description = if description_html.is_empty() {
                    content_html
                } else {
                    description_html
                };

                Some(NormalizedArticle {
                    id: stable_id(self.id_prefix, &link),
                    title: html_escape::decode_html_entities(&title).into_owned(),
                    link,
                    published_at: item.pub_date.as_deref().and_then(parse_published),
                    thumbnail,
                    description,
                    author: None,
                    source: self.source,
                })
            })
            .collect()
    }
}

#[async_trait]
impl NewsSource for RssProxySource {
    async fn fetch_latest(&self) -> Result<Vec<NormalizedArticle>> {
        let resp: ProxyResponse = match &self.mode {
            Mode::Http {
                client,
                proxy_base,
                feed_url,
            } => client
                .get(proxy_base)
                .query(&[("rss_url", feed_url.as_str())])
                .send()
                .await
                .with_context(|| format!("{} proxy get()", self.display_name))?
                .error_for_status()
                .with_context(|| format!("{} proxy status", self.display_name))?
                .json()
                .await
                .with_context(|| format!("{} proxy body", self.display_name))?,
            Mode::Fixture(json) => serde_json::from_str(json)
                .with_context(|| format!("parsing {} fixture", self.display_name))?,
        };
        let out = self.map_items(resp);
        counter!("news_articles_total", "source" => self.metrics_key).increment(out.len() as u64);
        Ok(out)
    }

    fn name(&self) -> &'static str {
        self.display_name
    }
}
