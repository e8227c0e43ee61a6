//! HTML collaborators: the ranking page and per-article metadata.
//!
//! # Ranking page
//!
//! The ranking block is located by a heading (default `h2.conHeadline`)
//! whose trimmed text equals the configured label (default `Top 10`). Every
//! `<a>` under the heading's parent element is one entry, in document order,
//! as `(href.trim(), text.trim())`. The link is kept verbatim; it is the
//! article's identity key.
//!
//! # Article metadata
//!
//! Read from `og:description` and `og:image` meta tags. A missing tag yields
//! an empty string.
//!
//! Parsing is synchronous and never held across an `.await`, since
//! [`scraper::Html`] is not `Send`.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument};
use url::Url;

use topten_core::models::{Article, ArticleDetails, ListEntry};
use topten_core::source::{DetailSource, RankingSource};

use crate::config::SourceConfig;

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("invalid CSS selector '{}': {}", css, e))
}

/// Extract the ranking list from a page.
pub fn parse_ranking(html: &str, headline_selector: &str, headline_text: &str) -> Result<Vec<ListEntry>> {
    let document = Html::parse_document(html);
    let heading_sel = selector(headline_selector)?;
    let link_sel = selector("a")?;

    let heading = document
        .select(&heading_sel)
        .find(|h| h.text().collect::<String>().trim() == headline_text)
        .ok_or_else(|| anyhow!("ranking heading '{}' not found", headline_text))?;

    let block = heading
        .parent()
        .and_then(ElementRef::wrap)
        .ok_or_else(|| anyhow!("ranking heading '{}' has no parent element", headline_text))?;

    let entries = block
        .select(&link_sel)
        .map(|a| {
            let href = a.value().attr("href").unwrap_or_default().trim();
            let title = a.text().collect::<String>();
            ListEntry::new(href, title.trim())
        })
        .collect();

    Ok(entries)
}

/// Extract `og:description` / `og:image` from an article page.
pub fn parse_details(html: &str) -> Result<ArticleDetails> {
    let document = Html::parse_document(html);
    let meta = |property: &str| -> Result<String> {
        let sel = selector(&format!(r#"meta[property="{}"]"#, property))?;
        Ok(document
            .select(&sel)
            .next()
            .and_then(|m| m.value().attr("content"))
            .map(|c| c.trim().to_string())
            .unwrap_or_default())
    };

    Ok(ArticleDetails {
        description: meta("og:description")?,
        image_url: meta("og:image")?,
    })
}

/// Canonical web address of an article: the origin joined with its stored link.
///
/// Absolute links are returned unchanged.
pub fn web_link(origin: &Url, link: &str) -> Result<Url> {
    origin
        .join(link)
        .with_context(|| format!("cannot build web link for '{}'", link))
}

fn http_client(config: &SourceConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(config.user_agent.clone())
        .build()
        .context("failed to build HTTP client")
}

async fn fetch_text(client: &reqwest::Client, url: &Url) -> Result<String> {
    let resp = client
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("GET {} failed", url))?;
    let status = resp.status();
    if !status.is_success() {
        bail!("GET {} returned {}", url, status);
    }
    resp.text()
        .await
        .with_context(|| format!("reading response from {} failed", url))
}

/// Live ranking page over HTTP.
pub struct WebRankingSource {
    client: reqwest::Client,
    page_url: Url,
    headline_selector: String,
    headline_text: String,
}

impl WebRankingSource {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(config)?,
            page_url: config.page_url()?,
            headline_selector: config.headline_selector.clone(),
            headline_text: config.headline_text.clone(),
        })
    }
}

#[async_trait]
impl RankingSource for WebRankingSource {
    #[instrument(level = "info", skip_all, fields(url = %self.page_url))]
    async fn fetch_ranking(&self) -> Result<Vec<ListEntry>> {
        let body = fetch_text(&self.client, &self.page_url).await?;
        let entries = parse_ranking(&body, &self.headline_selector, &self.headline_text)?;
        info!(count = entries.len(), "parsed ranking page");
        Ok(entries)
    }
}

/// A saved copy of the ranking page on disk.
pub struct HtmlFileSource {
    path: PathBuf,
    headline_selector: String,
    headline_text: String,
}

impl HtmlFileSource {
    pub fn new(path: PathBuf, config: &SourceConfig) -> Self {
        Self {
            path,
            headline_selector: config.headline_selector.clone(),
            headline_text: config.headline_text.clone(),
        }
    }
}

#[async_trait]
impl RankingSource for HtmlFileSource {
    async fn fetch_ranking(&self) -> Result<Vec<ListEntry>> {
        let body = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        let entries = parse_ranking(&body, &self.headline_selector, &self.headline_text)?;
        debug!(path = %self.path.display(), count = entries.len(), "parsed ranking snapshot");
        Ok(entries)
    }
}

/// Article metadata over HTTP.
pub struct WebDetailSource {
    client: reqwest::Client,
    origin: Url,
}

impl WebDetailSource {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(config)?,
            origin: config.origin_url()?,
        })
    }
}

#[async_trait]
impl DetailSource for WebDetailSource {
    #[instrument(level = "debug", skip_all, fields(id = %article.id, link = %article.link))]
    async fn fetch_details(&self, article: &Article) -> Result<ArticleDetails> {
        let url = web_link(&self.origin, &article.link)?;
        let body = fetch_text(&self.client, &url).await?;
        let details = parse_details(&body)?;
        debug!(
            description_len = details.description.len(),
            has_image = !details.image_url.is_empty(),
            "parsed article metadata"
        );
        Ok(details)
    }
}
