//! Outbound link harvesting over extracted article content
//!
//! Anchors are collected from the extracted HTML fragment (not the raw
//! page, so navigation and chrome links are already gone), in document
//! order, with the query string stripped. Duplicates are kept: dedup is
//! entirely the next hop's ledger check. Only strict absolute URLs
//! survive; empty-hostname URLs and the literal `localhost` host are
//! rejected.

use scraper::{Html, Selector};
use url::Url;

use crate::models::Article;

/// Harvest every anchor href from the article's content fragment
///
/// Relative hrefs fail the strict absolute-URL check and are dropped;
/// everything else is returned in document order with its query string
/// removed (path and fragment retained).
#[must_use]
pub fn harvest_links(article: &Article) -> Vec<String> {
    let fragment = Html::parse_fragment(&article.content);
    let anchors = Selector::parse("a").unwrap();

    fragment
        .select(&anchors)
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| is_strict_url(href))
        .filter_map(strip_query)
        .collect()
}

/// Whether a raw href is a syntactically valid absolute URL with a real,
/// non-local hostname
#[must_use]
pub fn is_strict_url(raw: &str) -> bool {
    match Url::parse(raw) {
        Ok(url) => match url.host_str() {
            Some(host) => !host.is_empty() && host != "localhost",
            None => false,
        },
        Err(_) => false,
    }
}

/// Remove the query-string component, keeping path and fragment
fn strip_query(raw: &str) -> Option<String> {
    let mut url = Url::parse(raw).ok()?;
    url.set_query(None);
    Some(url.to_string())
}
