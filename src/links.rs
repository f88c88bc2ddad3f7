//! Sources of detail-page URLs
//!
//! A run starts from a list of detail-page URLs. They come either from the
//! cache file written by an earlier run ([`CachedLinks`]) or straight from the
//! catalog page ([`PageLinkExtractor`]). Both hand back a deduplicated
//! `Vec<String>`: the cache keeps its file order, extraction sorts.

use crate::config::{Config, RetryConfig};
use crate::error::{Error, Result};
use crate::retry::download_with_retry;
use crate::utils;
use async_trait::async_trait;
use regex::Regex;
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use url::Url;

/// Matches the value of every `href` attribute, single or double quoted
const HREF_PATTERN: &str = r#"(?i)\bhref\s*=\s*(?:"([^"]*)"|'([^']*)')"#;

/// Something that can produce the detail-page URLs of a catalog
#[async_trait]
pub trait LinkSource: Send + Sync {
    /// Every detail-page URL, without duplicates
    async fn links(&self) -> Result<Vec<String>>;
}

/// Plain-text cache: one URL per line
#[derive(Debug, Clone)]
pub struct CachedLinks {
    path: PathBuf,
}

impl CachedLinks {
    /// Cache backed by `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the cache file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the cache with `links`, one per line
    pub async fn save(&self, links: &[String]) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut contents = links.join("\n");
        contents.push('\n');
        tokio::fs::write(&self.path, contents).await?;
        info!(path = ?self.path, count = links.len(), "link cache written");
        Ok(())
    }
}

#[async_trait]
impl LinkSource for CachedLinks {
    async fn links(&self) -> Result<Vec<String>> {
        let text = tokio::fs::read_to_string(&self.path).await?;
        let links = parse_links(&text);
        debug!(path = ?self.path, count = links.len(), "read link cache");
        Ok(links)
    }
}

/// Split cache-file text into URLs: trimmed, blank lines dropped
///
/// Lines keep their file order; a repeated URL is kept at its first position.
pub fn parse_links(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && seen.insert(*line))
        .map(str::to_owned)
        .collect()
}

/// Collects detail-page links from the static HTML of a catalog page
pub struct PageLinkExtractor {
    client: reqwest::Client,
    page_url: Url,
    href: Regex,
    pattern: Regex,
    retry: RetryConfig,
}

impl PageLinkExtractor {
    /// Build an extractor for `catalog.target_url`
    ///
    /// Fails with [`Error::Config`] when no target URL is configured.
    pub fn new(config: &Config) -> Result<Self> {
        let target = config.catalog.target_url.as_deref().ok_or_else(|| {
            Error::config("a catalog page URL is needed to extract links", "target_url")
        })?;
        let client = reqwest::Client::builder()
            .user_agent(concat!("icon-dl/", env!("CARGO_PKG_VERSION")))
            .timeout(config.download.request_timeout)
            .build()?;
        Ok(Self {
            client,
            page_url: Url::parse(target)?,
            href: Regex::new(HREF_PATTERN)?,
            pattern: Regex::new(&config.catalog.link_pattern)?,
            retry: config.retry.clone(),
        })
    }

    /// Page the links are collected from
    pub fn page_url(&self) -> &Url {
        &self.page_url
    }

    /// Pull matching links out of an HTML document
    ///
    /// Relative hrefs are resolved against the page URL; hrefs that cannot be
    /// resolved are dropped. The result is sorted.
    pub fn extract(&self, html: &str) -> Vec<String> {
        let mut found = BTreeSet::new();
        for caps in self.href.captures_iter(html) {
            let Some(value) = caps.get(1).or_else(|| caps.get(2)) else {
                continue;
            };
            let value = value.as_str().trim();
            if !self.pattern.is_match(value) {
                continue;
            }
            match self.page_url.join(value) {
                Ok(resolved) => {
                    found.insert(resolved.to_string());
                }
                Err(e) => debug!(href = value, error = %e, "dropping unresolvable link"),
            }
        }
        found.into_iter().collect()
    }

    async fn fetch_page(&self) -> Result<String> {
        download_with_retry(&self.retry, || async {
            let response = self.client.get(self.page_url.clone()).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(Error::HttpStatus {
                    url: self.page_url.to_string(),
                    status: status.as_u16(),
                });
            }
            Ok(response.text().await?)
        })
        .await
    }
}

#[async_trait]
impl LinkSource for PageLinkExtractor {
    async fn links(&self) -> Result<Vec<String>> {
        let html = self.fetch_page().await?;
        let links = self.extract(&html);
        info!(page = %self.page_url, count = links.len(), "extracted links");
        Ok(links)
    }
}

/// Links for a run: the cache when it exists, otherwise a fresh extraction
/// that is written back to the cache
pub async fn load_or_extract(config: &Config) -> Result<Vec<String>> {
    let cache = CachedLinks::new(&config.catalog.links_file);
    if utils::exists(cache.path()).await {
        return cache.links().await;
    }
    info!(path = ?cache.path(), "no link cache, extracting from catalog page");
    refresh_cache(config).await
}

/// Extract links from the catalog page and overwrite the cache
pub async fn refresh_cache(config: &Config) -> Result<Vec<String>> {
    let links = PageLinkExtractor::new(config)?.links().await?;
    CachedLinks::new(&config.catalog.links_file)
        .save(&links)
        .await?;
    Ok(links)
}
