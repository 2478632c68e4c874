use std::io::Write as _;

use anyhow::Context as _;
use scraper::Html;

use crate::cli::LinksArgs;
use crate::config::CrawlConfig;
use crate::fetch::{CachedFetcher, Transport};

pub fn run(args: LinksArgs) -> anyhow::Result<()> {
    let (mut config, fetcher) = crate::fetch::open(&args.fetch)?;
    if let Some(index) = args.index {
        config = config.with_index_pages(vec![index]).context("--index")?;
    }

    let links = get_html_urls(&fetcher, &config)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for link in &links {
        writeln!(out, "{link}").context("write link")?;
    }
    out.flush().context("flush stdout")?;

    tracing::info!(
        links = links.len(),
        network_requests = fetcher.network_requests(),
        "links collected"
    );
    Ok(())
}

/// Document links from every configured index page, in page order.
///
/// Links are not deduplicated across pages.
pub fn get_html_urls<T: Transport>(
    fetcher: &CachedFetcher<T>,
    config: &CrawlConfig,
) -> anyhow::Result<Vec<String>> {
    let mut links = Vec::new();
    for index_url in &config.index_pages {
        let found = fetch_links(fetcher, config, index_url)
            .with_context(|| format!("collect links: {index_url}"))?;
        tracing::debug!(index = %index_url, links = found.len(), "index page scanned");
        links.extend(found);
    }
    Ok(links)
}

pub fn fetch_links<T: Transport>(
    fetcher: &CachedFetcher<T>,
    config: &CrawlConfig,
    index_url: &str,
) -> anyhow::Result<Vec<String>> {
    let body = fetcher.get_html(index_url)?;
    let html = crate::html::decode_html(&body);
    collect_links(&html, config)
}

/// Anchors on an index page that point at documents, in encounter order.
pub fn collect_links(html: &str, config: &CrawlConfig) -> anyhow::Result<Vec<String>> {
    let document = Html::parse_document(html);
    let anchors = crate::html::selector("a")?;

    let mut links = Vec::new();
    for anchor in document.select(&anchors) {
        let label = crate::html::element_text(anchor);
        if config.blocklist.iter().any(|blocked| *blocked == label) || label.chars().count() <= 1 {
            continue;
        }
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if let Some(link) = normalize_link(href, config) {
            links.push(link);
        }
    }
    Ok(links)
}

/// Absolutizes `href` against the base URL, strips the redundant path
/// segment, and keeps it only if it opens a document.
pub fn normalize_link(href: &str, config: &CrawlConfig) -> Option<String> {
    let absolute = if href.starts_with("http://") || href.starts_with("https://") {
        href.to_owned()
    } else {
        format!("{}{href}", config.base_url)
    };

    let link = if config.strip_segment.is_empty() {
        absolute
    } else {
        absolute.replace(&config.strip_segment, "")
    };

    link.contains(&config.document_marker).then_some(link)
}
