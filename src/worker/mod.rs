//! Per-invocation crawl orchestration
//!
//! One inbound edge drives one pass through the pipeline:
//! policy gate → ledger check → fetch → readability gate → extract →
//! harvest → fan-out. Every gate that fails ends the invocation early with
//! a negative [`CrawlOutcome`]; nothing in here is an error to the caller.
//! The transport is never asked to redeliver: by the time the fan-out
//! runs, downstream effects may already be partially applied, and
//! at-least-once consumers handle the repeats.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::extractor::ArticleExtractor;
use crate::fetcher::PageFetcher;
use crate::harvest::harvest_links;
use crate::ledger::CrawlLedger;
use crate::models::CrawlEdge;
use crate::policy::PolicyFilter;
use crate::publisher::EventPublisher;

/// Terminal result of one invocation
///
/// Every variant is a successful completion from the transport's point of
/// view; the distinction exists for logs and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlOutcome {
    /// The parent URL matched no allow pattern
    ParentNotAllowed,

    /// The child URL matched a deny pattern
    Blocked,

    /// The child URL already has a ledger entry
    AlreadyCrawled,

    /// Transport error, non-success status, or non-HTML content type
    NotFetchable,

    /// The page failed the readability pre-check
    NotReaderable,

    /// The reader-mode extraction pass failed
    ExtractionFailed,

    /// Full pipeline ran; fan-out was attempted
    Crawled {
        /// Number of harvested links
        links: usize,
    },
}

/// Composes the pipeline components for one invocation at a time
///
/// Stateless across invocations; the only shared state is the cloned
/// client handles inside the injected collaborators.
pub struct CrawlWorker {
    policy: PolicyFilter,
    fetcher: PageFetcher,
    extractor: ArticleExtractor,
    ledger: Arc<dyn CrawlLedger>,
    publisher: Arc<dyn EventPublisher>,
}

impl CrawlWorker {
    /// Build a worker from its collaborators
    #[must_use]
    pub fn new(
        policy: PolicyFilter,
        fetcher: PageFetcher,
        extractor: ArticleExtractor,
        ledger: Arc<dyn CrawlLedger>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            policy,
            fetcher,
            extractor,
            ledger,
            publisher,
        }
    }

    /// Decode an inbound payload and process it
    ///
    /// Undecodable payloads are logged and dropped; the canonical shape is
    /// the `{"from": ..., "to": ...}` JSON object only.
    pub async fn handle_raw(&self, payload: &[u8]) -> Option<CrawlOutcome> {
        match serde_json::from_slice::<CrawlEdge>(payload) {
            Ok(edge) => Some(self.handle(edge).await),
            Err(e) => {
                error!(error = %e, "Undecodable edge payload, dropping message");
                None
            }
        }
    }

    /// Process one crawl edge end to end
    ///
    /// Infallible: every internal failure becomes a [`CrawlOutcome`] and
    /// the invocation completes successfully.
    pub async fn handle(&self, edge: CrawlEdge) -> CrawlOutcome {
        if !self.policy.is_allowed(&edge.from) {
            debug!(from = %edge.from, "Parent URL not allow-listed, dropping edge");
            return CrawlOutcome::ParentNotAllowed;
        }

        if self.policy.is_blocked(&edge.to) {
            debug!(to = %edge.to, "Child URL deny-listed, dropping edge");
            return CrawlOutcome::Blocked;
        }

        if self.ledger.exists(&edge.to).await {
            debug!(url = %edge.to, "Already crawled, dropping edge");
            return CrawlOutcome::AlreadyCrawled;
        }

        let Some(page) = self.fetcher.fetch(&edge.to).await else {
            info!(url = %edge.to, "Page not fetchable, dropping edge");
            return CrawlOutcome::NotFetchable;
        };

        if !self.extractor.is_probably_readerable(&page.html) {
            info!(url = %edge.to, "Page not readerable, dropping edge");
            return CrawlOutcome::NotReaderable;
        }

        let Some(article) = self.extractor.extract(&edge.to, &page.html) else {
            info!(url = %edge.to, "Extraction failed, dropping edge");
            return CrawlOutcome::ExtractionFailed;
        };

        let links = harvest_links(&article);

        // Two independent branches, joined before completion. A failure in
        // either is logged and never cancels the other or reaches the
        // transport as a redelivery signal.
        let fan_out = async {
            self.publisher.publish_links(&links, &edge.to).await
        };

        let persist = async {
            if let Err(e) = self.ledger.record(&edge.to, Utc::now().timestamp_millis()).await {
                error!(url = %edge.to, error = %e, "Ledger write failed");
            }
            self.publisher
                .publish_article(&edge.to, &article, &links)
                .await
        };

        let (links_result, article_result) = tokio::join!(fan_out, persist);

        if let Err(e) = links_result {
            error!(url = %edge.to, error = %e, "Link fan-out failed");
        }
        if let Err(e) = article_result {
            error!(url = %edge.to, error = %e, "Article publish failed");
        }

        info!(url = %edge.to, links = links.len(), title = %article.title, "Crawled");
        CrawlOutcome::Crawled { links: links.len() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PolicyConfig;
    use crate::ledger::MemoryLedger;
    use crate::publisher::MemoryPublisher;
    use std::time::Duration;

    fn worker_with(
        ledger: Arc<MemoryLedger>,
        publisher: Arc<MemoryPublisher>,
    ) -> CrawlWorker {
        let policy = PolicyFilter::new(&PolicyConfig {
            allow: vec![String::from(r"^https://allowed\.example/")],
            deny: vec![String::from(r"^https://spam\.example/")],
        })
        .unwrap();
        // Unroutable base URL: these tests never reach the fetch stage.
        let fetcher =
            PageFetcher::with_base_url("http://127.0.0.1:1", Duration::from_secs(1)).unwrap();

        CrawlWorker::new(
            policy,
            fetcher,
            ArticleExtractor::new(),
            ledger,
            publisher,
        )
    }

    #[tokio::test]
    async fn test_parent_not_allowed_is_a_no_op() {
        let ledger = Arc::new(MemoryLedger::new());
        let publisher = Arc::new(MemoryPublisher::new());
        let worker = worker_with(ledger.clone(), publisher.clone());

        let outcome = worker
            .handle(CrawlEdge {
                from: String::from("https://elsewhere.example/post"),
                to: String::from("https://allowed.example/article"),
            })
            .await;

        assert_eq!(outcome, CrawlOutcome::ParentNotAllowed);
        assert!(ledger.records().is_empty());
        assert!(publisher.link_events().is_empty());
        assert!(publisher.article_events().is_empty());
    }

    #[tokio::test]
    async fn test_blocked_child_is_a_no_op_even_from_allowed_parent() {
        let ledger = Arc::new(MemoryLedger::new());
        let publisher = Arc::new(MemoryPublisher::new());
        let worker = worker_with(ledger.clone(), publisher.clone());

        let outcome = worker
            .handle(CrawlEdge {
                from: String::from("https://allowed.example/post"),
                to: String::from("https://spam.example/article"),
            })
            .await;

        assert_eq!(outcome, CrawlOutcome::Blocked);
        assert!(ledger.records().is_empty());
        assert!(publisher.link_events().is_empty());
    }

    #[tokio::test]
    async fn test_already_crawled_is_a_no_op() {
        let ledger = Arc::new(MemoryLedger::new());
        ledger.insert("https://allowed.example/article", 1);
        let publisher = Arc::new(MemoryPublisher::new());
        let worker = worker_with(ledger.clone(), publisher.clone());

        let outcome = worker
            .handle(CrawlEdge {
                from: String::from("https://allowed.example/post"),
                to: String::from("https://allowed.example/article"),
            })
            .await;

        assert_eq!(outcome, CrawlOutcome::AlreadyCrawled);
        // No duplicate write.
        assert_eq!(ledger.records()["https://allowed.example/article"].crawled_at, 1);
        assert!(publisher.article_events().is_empty());
    }

    #[tokio::test]
    async fn test_undecodable_payload_is_dropped() {
        let worker = worker_with(
            Arc::new(MemoryLedger::new()),
            Arc::new(MemoryPublisher::new()),
        );
        assert!(worker.handle_raw(b"not json").await.is_none());
        assert!(worker
            .handle_raw(br#"{"to":"https://bare.example/"}"#)
            .await
            .is_none());
    }
}
