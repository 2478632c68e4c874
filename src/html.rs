use anyhow::Context as _;
use scraper::{ElementRef, Selector};

/// Decodes a page body. The portal serves ISO-8859-1, so bytes that are not
/// valid UTF-8 are read as Latin-1 (each byte is its own code point).
pub fn decode_html(body: &[u8]) -> String {
    match std::str::from_utf8(body) {
        Ok(text) => text.to_owned(),
        Err(_) => body.iter().map(|&b| char::from(b)).collect(),
    }
}

pub fn selector(css: &str) -> anyhow::Result<Selector> {
    Selector::parse(css)
        .map_err(|err| anyhow::anyhow!("{err:?}"))
        .with_context(|| format!("parse css selector: {css}"))
}

/// Concatenated text of every descendant text node, untrimmed.
pub fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect()
}
