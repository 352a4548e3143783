// src/config.rs
use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

const ENV_PATH: &str = "ANIVERSE_NEWS_CONFIG";
const DEFAULT_PATH: &str = "config/news.toml";

/// Service configuration. Loaded TOML-first with env layering:
/// 1) $ANIVERSE_NEWS_CONFIG (error if it points nowhere)
/// 2) config/news.toml
/// 3) built-in defaults
/// `PORT` overrides the configured port in all three cases; that is the
/// deployment contract the hosting platform relies on.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NewsConfig {
    pub bind_addr: String,
    pub port: u16,
    pub cache_ttl_secs: u64,
    pub request_timeout_secs: u64,
    pub fallback_threshold: usize,
    pub jikan_base_url: String,
    pub rss2json_base_url: String,
    pub ann_feed_url: String,
    pub crunchyroll_feed_url: String,
    pub mal_limit: usize,
    pub ann_limit: usize,
    pub crunchyroll_limit: usize,
    pub airing_limit: usize,
    pub ann_placeholder_thumbnail: String,
    pub crunchyroll_placeholder_thumbnail: String,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            port: 5000,
            cache_ttl_secs: 600,
            request_timeout_secs: 12,
            fallback_threshold: 5,
            jikan_base_url: "https://api.jikan.moe/v4".to_string(),
            rss2json_base_url: "https://api.rss2json.com/v1/api.json".to_string(),
            ann_feed_url: "https://www.animenewsnetwork.com/all/rss.xml".to_string(),
            crunchyroll_feed_url: "https://www.crunchyroll.com/newsrss".to_string(),
            mal_limit: 10,
            ann_limit: 20,
            crunchyroll_limit: 15,
            airing_limit: 15,
            ann_placeholder_thumbnail: "https://cdn.myanimelist.net/images/anime/4/19644.jpg"
                .to_string(),
            crunchyroll_placeholder_thumbnail:
                "https://cdn.myanimelist.net/images/anime/10/47347.jpg".to_string(),
        }
    }
}

impl NewsConfig {
    pub fn load() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_PATH) {
            let path = Path::new(&p);
            if !path.exists() {
                return Err(anyhow!("{ENV_PATH} points to non-existent path"));
            }
            Self::from_path(path)?
        } else {
            let default = Path::new(DEFAULT_PATH);
            if default.exists() {
                Self::from_path(default)?
            } else {
                Self::default()
            }
        };
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading news config from {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parsing news config toml")
    }

    fn apply_env_overrides(&mut self) {
        if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.parse().ok()) {
            self.port = port;
        }
    }
}
