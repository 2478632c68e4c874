use std::path::Path;
use std::time::Duration;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://www.dgsi.pt/home.nsf";

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_11_5) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/50.0.2661.102 Safari/537.36";

const DEFAULT_DATABASES: [&str; 10] = [
    "jtrg", "jtrl", "jsta", "jtrc", "jtrp", "jtre", "jtca", "jtcn", "jcon", "jstj",
];

/// What the orchestrator does when a document yields no record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum FailurePolicy {
    /// Stop the whole run at the first failing document.
    #[default]
    Halt,
    /// Log the failing document and move on to the next link.
    Skip,
}

/// Crawl settings. Built once at startup and shared by reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CrawlConfig {
    /// Prefix for relative hrefs found on index pages.
    pub base_url: String,
    pub index_pages: Vec<String>,
    /// Anchor labels that are never followed (exact match).
    pub blocklist: Vec<String>,
    pub user_agent: String,
    /// Path segment removed from every collected link.
    pub strip_segment: String,
    /// Links without this marker are navigation, not documents.
    pub document_marker: String,
    /// Appended to a document URL to request the expanded rendering.
    pub expand_modifier: String,
    pub request_timeout_secs: Option<u64>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            index_pages: DEFAULT_DATABASES
                .iter()
                .map(|db| format!("http://www.dgsi.pt/{db}.nsf"))
                .collect(),
            blocklist: vec!["Help Desk".to_owned()],
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            strip_segment: "home.nsf/".to_owned(),
            document_marker: "OpenDocument".to_owned(),
            expand_modifier: "&ExpandSection=1".to_owned(),
            request_timeout_secs: Some(60),
        }
    }
}

impl CrawlConfig {
    /// Reads a YAML override file. Keys it omits keep their defaults.
    pub fn from_yaml_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("read crawl config: {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&contents)
            .with_context(|| format!("parse crawl config: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults, or the YAML file when one is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::from_yaml_file(path),
            None => {
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        require_http_url(&self.base_url).context("base_url")?;
        if self.index_pages.is_empty() {
            anyhow::bail!("index_pages must not be empty");
        }
        for page in &self.index_pages {
            require_http_url(page).with_context(|| format!("index page {page}"))?;
        }
        if self.document_marker.is_empty() {
            anyhow::bail!("document_marker must not be empty");
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Restricts the crawl to a single index page (used by `links --index`).
    pub fn with_index_pages(mut self, pages: Vec<String>) -> anyhow::Result<Self> {
        self.index_pages = pages;
        self.validate()?;
        Ok(self)
    }
}

fn require_http_url(raw: &str) -> anyhow::Result<()> {
    let url = Url::parse(raw).with_context(|| format!("parse url: {raw}"))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        anyhow::bail!("url must be http/https: {url}");
    }
    Ok(())
}
