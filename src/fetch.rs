use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use reqwest::header::{ACCEPT, USER_AGENT};

use crate::cli::FetchArgs;
use crate::config::CrawlConfig;

/// Raw outcome of one GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub status: u16,
    pub body: Vec<u8>,
}

impl FetchedPage {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A non-success response. Its body is never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpStatusError {
    pub url: String,
    pub status: u16,
}

impl std::fmt::Display for HttpStatusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GET {}: HTTP {}", self.url, self.status)
    }
}

impl std::error::Error for HttpStatusError {}

/// Blocking network capability behind the cache.
pub trait Transport {
    fn get(&self, url: &str, user_agent: &str) -> anyhow::Result<FetchedPage>;
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(timeout: Option<Duration>) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .context("build http client")?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str, user_agent: &str) -> anyhow::Result<FetchedPage> {
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, user_agent)
            .header(ACCEPT, "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8")
            .send()
            .with_context(|| format!("GET {url}"))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .with_context(|| format!("read body: {url}"))?
            .to_vec();

        Ok(FetchedPage { status, body })
    }
}

/// Serves GETs from the on-disk cache, falling back to the transport.
///
/// Entries never expire. They are only replaced when a caller asks for a
/// refresh.
pub struct CachedFetcher<T> {
    transport: T,
    cache_dir: PathBuf,
    user_agent: String,
    refresh_all: bool,
    network_requests: Cell<usize>,
}

impl<T: Transport> CachedFetcher<T> {
    pub fn new(
        transport: T,
        cache_dir: impl Into<PathBuf>,
        user_agent: impl Into<String>,
    ) -> anyhow::Result<Self> {
        let cache_dir = cache_dir.into();
        crate::raw_store::ensure_cache_dir(&cache_dir)?;
        Ok(Self {
            transport,
            cache_dir,
            user_agent: user_agent.into(),
            refresh_all: false,
            network_requests: Cell::new(0),
        })
    }

    /// Bypass (and overwrite) the cache for every `get_html` call.
    pub fn with_refresh(mut self, refresh: bool) -> Self {
        self.refresh_all = refresh;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Number of requests that actually went to the transport.
    pub fn network_requests(&self) -> usize {
        self.network_requests.get()
    }

    pub fn request(&self, url: &str, suffix: &str, refresh: bool) -> anyhow::Result<Vec<u8>> {
        let path = crate::raw_store::cache_path(&self.cache_dir, url, suffix);
        if !refresh {
            if let Some(body) = crate::raw_store::read_cached(&path)? {
                tracing::debug!(url, path = %path.display(), "cache hit");
                return Ok(body);
            }
        }

        tracing::debug!(url, refresh, "cache miss; fetching");
        self.network_requests.set(self.network_requests.get() + 1);
        let page = self.transport.get(url, &self.user_agent)?;
        if !page.is_success() {
            return Err(HttpStatusError {
                url: url.to_owned(),
                status: page.status,
            }
            .into());
        }

        crate::raw_store::write_cached(&path, &page.body)?;
        Ok(page.body)
    }

    pub fn get_html(&self, url: &str) -> anyhow::Result<Vec<u8>> {
        self.request(url, "html", self.refresh_all)
    }
}

/// Production fetcher for a crawl configuration.
pub fn http_fetcher(
    config: &CrawlConfig,
    cache_dir: &Path,
    refresh: bool,
) -> anyhow::Result<CachedFetcher<HttpTransport>> {
    let transport = HttpTransport::new(config.request_timeout()).context("init transport")?;
    Ok(CachedFetcher::new(transport, cache_dir, config.user_agent.clone())?.with_refresh(refresh))
}

/// Loads the crawl configuration and builds its fetcher from CLI flags.
pub fn open(args: &FetchArgs) -> anyhow::Result<(CrawlConfig, CachedFetcher<HttpTransport>)> {
    let config = CrawlConfig::load(args.config.as_deref().map(Path::new))
        .context("load crawl config")?;
    let fetcher = http_fetcher(&config, Path::new(&args.cache_dir), args.refresh)?;
    Ok((config, fetcher))
}
