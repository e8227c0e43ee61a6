//! TOML configuration.
//!
//! Every component receives the validated [`Config`] explicitly; nothing is
//! read from the process environment.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub enrich: EnrichConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    /// Site origin. An article's web link is this origin joined with its stored link.
    #[serde(default = "default_origin")]
    pub origin: String,
    /// Path of the page carrying the ranking, relative to `origin`.
    #[serde(default = "default_page_path")]
    pub page_path: String,
    #[serde(default = "default_headline_selector")]
    pub headline_selector: String,
    #[serde(default = "default_headline_text")]
    pub headline_text: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            page_path: default_page_path(),
            headline_selector: default_headline_selector(),
            headline_text: default_headline_text(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_origin() -> String {
    "https://www.tagesschau.de".to_string()
}
fn default_page_path() -> String {
    "/".to_string()
}
fn default_headline_selector() -> String {
    "h2.conHeadline".to_string()
}
fn default_headline_text() -> String {
    "Top 10".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_user_agent() -> String {
    format!("topten-archive/{}", env!("CARGO_PKG_VERSION"))
}

impl SourceConfig {
    pub fn origin_url(&self) -> Result<Url> {
        Url::parse(&self.origin).with_context(|| format!("invalid source.origin: {}", self.origin))
    }

    pub fn page_url(&self) -> Result<Url> {
        self.origin_url()?
            .join(&self.page_path)
            .with_context(|| format!("invalid source.page_path: {}", self.page_path))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    /// Required list length; 0 disables the check.
    #[serde(default = "default_expected_len")]
    pub expected_len: usize,
    /// Store capture timestamps at 00:00:00 UTC of the capture day.
    #[serde(default = "default_true")]
    pub truncate_to_day: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            expected_len: default_expected_len(),
            truncate_to_day: true,
        }
    }
}

impl IngestConfig {
    pub fn expected_len(&self) -> Option<usize> {
        (self.expected_len > 0).then_some(self.expected_len)
    }
}

fn default_expected_len() -> usize {
    10
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct EnrichConfig {
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_batch_limit")]
    pub batch_limit: usize,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            batch_limit: default_batch_limit(),
        }
    }
}

fn default_concurrency() -> usize {
    4
}
fn default_batch_limit() -> usize {
    200
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Headers that mark a request as coming from the scheduler (value `true`).
    #[serde(default = "default_trigger_headers")]
    pub trigger_headers: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            trigger_headers: default_trigger_headers(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}
fn default_trigger_headers() -> Vec<String> {
    vec!["X-Appengine-Cron".to_string(), "X-Cron".to_string()]
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    config.source.page_url()?;

    if scraper::Selector::parse(&config.source.headline_selector).is_err() {
        bail!(
            "source.headline_selector is not a valid CSS selector: '{}'",
            config.source.headline_selector
        );
    }

    if config.source.headline_text.trim().is_empty() {
        bail!("source.headline_text must not be empty");
    }

    if config.enrich.concurrency == 0 {
        bail!("enrich.concurrency must be >= 1");
    }

    if config.server.trigger_headers.is_empty() {
        bail!("server.trigger_headers must name at least one header");
    }

    Ok(())
}
