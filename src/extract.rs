use std::io::Write as _;

use anyhow::Context as _;
use scraper::Html;

use crate::cli::ExtractArgs;
use crate::config::CrawlConfig;
use crate::fetch::{CachedFetcher, HttpStatusError, Transport};
use crate::formats::DocumentRecord;

/// How many times a page without text is re-requested with the
/// expand-section modifier.
pub const MAX_EXPAND_RETRIES: usize = 1;

/// Outcome of extracting one document page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Extracted(DocumentRecord),
    /// No text column was populated, even in the expanded rendering.
    NotFound,
    /// A label row had no value cell next to it.
    Malformed(MalformedRow),
    /// The document answered with a non-success status.
    HttpStatus { url: String, status: u16 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedRow {
    pub url: String,
    pub label: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Summary,
    Process,
    Descriptor,
    FullText,
    ProsecutorOpinion,
    PartialDecision,
}

// Checked in this order; the first label contained in the cell wins.
const LABELS: [(&str, Field); 6] = [
    ("Sumário", Field::Summary),
    ("Processo", Field::Process),
    ("Descritores", Field::Descriptor),
    ("Texto Integral", Field::FullText),
    ("Parecer Ministério Publico", Field::ProsecutorOpinion),
    ("Decisão Texto Parcial", Field::PartialDecision),
];

/// Raw cell values picked out of a document page's tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageFields {
    pub process: String,
    pub summary: String,
    pub descriptor: String,
    pub full_text: String,
    pub prosecutor_opinion: String,
    pub partial_decision: String,
}

impl PageFields {
    /// First non-blank text column, by priority.
    pub fn resolved_text(&self) -> Option<&str> {
        [
            &self.full_text,
            &self.prosecutor_opinion,
            &self.partial_decision,
        ]
        .into_iter()
        .find(|candidate| !candidate.trim().is_empty())
        .map(String::as_str)
    }

    fn set(&mut self, field: Field, value: String) {
        let slot = match field {
            Field::Summary => &mut self.summary,
            Field::Process => &mut self.process,
            Field::Descriptor => &mut self.descriptor,
            Field::FullText => &mut self.full_text,
            Field::ProsecutorOpinion => &mut self.prosecutor_opinion,
            Field::PartialDecision => &mut self.partial_decision,
        };
        *slot = value;
    }

    fn into_record(self) -> Option<DocumentRecord> {
        let text = self.resolved_text()?.to_owned();
        Some(DocumentRecord {
            process: self.process,
            summary: self.summary,
            descriptor: self.descriptor,
            text,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageScan {
    Fields(PageFields),
    MissingValue { label: &'static str },
}

/// Walks every row of every table and reads the cell next to a known label.
pub fn scan_document(html: &str) -> anyhow::Result<PageScan> {
    let document = Html::parse_document(html);
    let tables = crate::html::selector("table")?;
    let rows = crate::html::selector("tr")?;
    let cells = crate::html::selector("td")?;

    let mut fields = PageFields::default();
    for table in document.select(&tables) {
        for row in table.select(&rows) {
            let mut row_cells = row.select(&cells);
            let Some(first) = row_cells.next() else {
                continue;
            };
            let heading = crate::html::element_text(first);
            let Some(&(label, field)) = LABELS.iter().find(|(label, _)| heading.contains(label))
            else {
                continue;
            };
            let Some(value) = row_cells.next() else {
                return Ok(PageScan::MissingValue { label });
            };
            fields.set(field, crate::html::element_text(value));
        }
    }

    Ok(PageScan::Fields(fields))
}

/// Fetches and parses one document page, retrying with the expanded
/// rendering when no text column is populated.
pub fn extract_table<T: Transport>(
    fetcher: &CachedFetcher<T>,
    config: &CrawlConfig,
    url: &str,
) -> anyhow::Result<Extraction> {
    let mut attempt_url = url.to_owned();
    for attempt in 0..=MAX_EXPAND_RETRIES {
        if attempt > 0 {
            attempt_url.push_str(&config.expand_modifier);
            tracing::debug!(
                url = %attempt_url,
                attempt,
                "no text column; requesting expanded section"
            );
        }

        let body = match fetcher.get_html(&attempt_url) {
            Ok(body) => body,
            Err(err) => match err.downcast_ref::<HttpStatusError>() {
                Some(http) => {
                    return Ok(Extraction::HttpStatus {
                        url: http.url.clone(),
                        status: http.status,
                    });
                }
                None => return Err(err),
            },
        };
        let html = crate::html::decode_html(&body);
        match scan_document(&html).with_context(|| format!("scan document: {attempt_url}"))? {
            PageScan::MissingValue { label } => {
                return Ok(Extraction::Malformed(MalformedRow {
                    url: attempt_url,
                    label,
                }));
            }
            PageScan::Fields(fields) => {
                if let Some(record) = fields.into_record() {
                    tracing::debug!(
                        url = %attempt_url,
                        process = %record.process.trim(),
                        "extracted"
                    );
                    return Ok(Extraction::Extracted(record));
                }
            }
        }
    }

    Ok(Extraction::NotFound)
}

pub fn run(args: ExtractArgs) -> anyhow::Result<()> {
    let (config, fetcher) = crate::fetch::open(&args.fetch)?;

    match extract_table(&fetcher, &config, &args.url)? {
        Extraction::Extracted(record) => {
            let (process, doc) = record.into_entry();
            let mut entry = serde_json::Map::new();
            entry.insert(
                process,
                serde_json::to_value(&doc).context("serialize record")?,
            );
            let json = crate::store::to_pretty_json(&entry)?;

            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            out.write_all(&json).context("write record")?;
            out.flush().context("flush stdout")?;
            Ok(())
        }
        Extraction::NotFound => anyhow::bail!("no text found: {}", args.url),
        Extraction::Malformed(row) => {
            anyhow::bail!("row {:?} has no value cell: {}", row.label, row.url)
        }
        Extraction::HttpStatus { url, status } => anyhow::bail!("GET {url}: HTTP {status}"),
    }
}
