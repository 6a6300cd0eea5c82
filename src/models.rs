//! Core data structures for the crawl pipeline
//!
//! Wire shapes are fixed: inbound edges and outbound events are JSON, and
//! the article payload uses camelCase field names (`textContent`,
//! `siteName`) to stay compatible with existing downstream consumers.

use serde::{Deserialize, Serialize};

/// One directed hop in the crawl graph: parent page → linked page.
///
/// This is the unit of work. It arrives as the inbound message payload and
/// is owned by exactly one invocation once decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlEdge {
    /// URL of the page the link was found on
    pub from: String,

    /// URL to (maybe) crawl
    pub to: String,
}

/// Raw fetch result, discarded after extraction
#[derive(Debug, Clone)]
pub struct RawPage {
    /// Response body
    pub html: String,

    /// Content-Type header value
    pub content_type: String,
}

/// Reader-mode extraction result
///
/// `content` is always the extractor's cleaned HTML fragment, never the
/// raw page HTML. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    /// Article title
    pub title: String,

    /// Short excerpt (meta description or leading text)
    pub excerpt: String,

    /// Cleaned main-content HTML fragment
    pub content: String,

    /// Plain-text rendering of the content
    pub text_content: String,

    /// Author byline, when present
    pub byline: Option<String>,

    /// Site name (e.g. from og:site_name), when present
    pub site_name: Option<String>,

    /// Character count of `text_content`
    pub length: usize,
}

/// Ledger entry recording that a URL has been processed
///
/// Keyed by URL in the store; write-once by convention. Presence of an
/// entry is the sole "do not fetch again" signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlRecord {
    /// Epoch milliseconds at which the crawl completed
    #[serde(rename = "crawledAt")]
    pub crawled_at: i64,
}

/// Outbound event: a harvested link becomes a future [`CrawlEdge`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEvent {
    /// The harvested link
    pub to: String,

    /// The page it was harvested from
    pub from: String,
}

/// Outbound event: one successfully extracted article
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleEvent {
    /// The crawled URL
    pub url: String,

    /// The extracted article
    pub article: Article,

    /// All harvested links, in document order
    pub links: Vec<String>,
}
