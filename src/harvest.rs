use anyhow::Context as _;
use indicatif::{ProgressBar, ProgressStyle};

use crate::cli::RunArgs;
use crate::config::{CrawlConfig, FailurePolicy};
use crate::extract::Extraction;
use crate::fetch::{CachedFetcher, Transport};
use crate::store::DocumentStore;

#[derive(Debug, Clone, Copy, Default)]
pub struct HarvestOptions {
    pub policy: FailurePolicy,
    pub show_progress: bool,
}

/// What a harvest did. `failed` is set only when the run halted early.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestReport {
    pub links: usize,
    pub extracted: usize,
    pub saves: usize,
    pub skipped: Vec<String>,
    pub failed: Option<String>,
}

impl HarvestReport {
    pub fn halted(&self) -> bool {
        self.failed.is_some()
    }
}

/// Collects every document link, extracts each one in order, and rewrites
/// the store after every successful extraction.
pub fn harvest<T: Transport>(
    fetcher: &CachedFetcher<T>,
    config: &CrawlConfig,
    store: &mut DocumentStore,
    options: HarvestOptions,
) -> anyhow::Result<HarvestReport> {
    let links = crate::crawl::get_html_urls(fetcher, config).context("collect links")?;
    tracing::info!(links = links.len(), known = store.len(), "links collected");

    let mut report = HarvestReport {
        links: links.len(),
        ..HarvestReport::default()
    };

    let progress = progress_bar(links.len(), options.show_progress)?;
    for url in &links {
        let outcome = crate::extract::extract_table(fetcher, config, url)
            .with_context(|| format!("extract: {url}"))?;

        let record = match outcome {
            Extraction::Extracted(record) => Some(record),
            Extraction::NotFound => {
                tracing::warn!(url = %url, "no text found");
                None
            }
            Extraction::Malformed(row) => {
                tracing::warn!(url = %row.url, label = row.label, "label row has no value cell");
                None
            }
            Extraction::HttpStatus { url: failed_url, status } => {
                tracing::warn!(url = %failed_url, status, "document request failed");
                None
            }
        };
        let Some(record) = record else {
            if on_failure(options.policy, url, &mut report) {
                break;
            }
            progress.inc(1);
            continue;
        };

        let process = store.insert(record);
        store
            .save()
            .with_context(|| format!("save store: {}", store.path().display()))?;
        report.extracted += 1;
        report.saves += 1;
        tracing::debug!(process = %process, url = %url, "stored");
        progress.inc(1);
    }
    progress.finish_and_clear();

    tracing::info!(
        links = report.links,
        extracted = report.extracted,
        skipped = report.skipped.len(),
        halted = report.halted(),
        documents = store.len(),
        "harvest finished"
    );
    Ok(report)
}

/// Records the failure. Returns true when the run must stop.
fn on_failure(policy: FailurePolicy, url: &str, report: &mut HarvestReport) -> bool {
    match policy {
        FailurePolicy::Halt => {
            report.failed = Some(url.to_owned());
            true
        }
        FailurePolicy::Skip => {
            report.skipped.push(url.to_owned());
            false
        }
    }
}

fn progress_bar(len: usize, visible: bool) -> anyhow::Result<ProgressBar> {
    if !visible {
        return Ok(ProgressBar::hidden());
    }
    let progress = ProgressBar::new(len as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );
    Ok(progress)
}

pub fn run(args: RunArgs) -> anyhow::Result<HarvestReport> {
    let (config, fetcher) = crate::fetch::open(&args.fetch)?;
    let mut store = DocumentStore::open(&args.store).context("open store")?;

    let options = HarvestOptions {
        policy: args.on_failure,
        show_progress: !args.no_progress,
    };
    harvest(&fetcher, &config, &mut store, options)
}
