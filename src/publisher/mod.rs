//! Outbound event fan-out over the messaging transport
//!
//! Two logical channels: link events (one per harvested link, batched) and
//! article events (one per crawl, flushed immediately). The trait exists so
//! tests can swap in [`MemoryPublisher`]; production uses
//! [`NatsEventPublisher`]. Delivery is at-least-once end to end: the
//! publisher never dedups and downstream consumers must tolerate repeats.
//! Failures propagate to the caller as `Err`; they are never swallowed
//! inside this component.

use async_trait::async_trait;
use bytes::Bytes;
use std::time::{Duration, Instant};
use tracing::trace;

use crate::error::PublishError;
use crate::models::{Article, ArticleEvent, LinkEvent};

/// Fan-out of new-edge events and the completed-article event
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Emit one [`LinkEvent`] per harvested link, with the crawled page as
    /// the parent. Order of delivery is unspecified.
    async fn publish_links(&self, links: &[String], parent_url: &str) -> Result<(), PublishError>;

    /// Emit the single [`ArticleEvent`] for a completed crawl
    async fn publish_article(
        &self,
        url: &str,
        article: &Article,
        links: &[String],
    ) -> Result<(), PublishError>;
}

/// NATS-backed publisher with count/latency batched link flushing
#[derive(Clone)]
pub struct NatsEventPublisher {
    client: async_nats::Client,
    link_subject: String,
    article_subject: String,

    /// Flush after this many buffered link messages
    batch_max_messages: usize,

    /// Flush when a batch has been open this long
    batch_max_latency: Duration,
}

impl NatsEventPublisher {
    /// Create a publisher over an established NATS connection
    #[must_use]
    pub fn new(
        client: async_nats::Client,
        link_subject: String,
        article_subject: String,
        batch_max_messages: usize,
        batch_max_latency: Duration,
    ) -> Self {
        Self {
            client,
            link_subject,
            article_subject,
            batch_max_messages,
            batch_max_latency,
        }
    }

    async fn flush(&self) -> Result<(), PublishError> {
        self.client
            .flush()
            .await
            .map_err(|e| PublishError::Transport(e.to_string()))
    }
}

#[async_trait]
impl EventPublisher for NatsEventPublisher {
    async fn publish_links(&self, links: &[String], parent_url: &str) -> Result<(), PublishError> {
        let mut batched = 0_usize;
        let mut batch_started = Instant::now();

        for link in links {
            let event = LinkEvent {
                to: link.clone(),
                from: parent_url.to_string(),
            };
            let payload = Bytes::from(serde_json::to_vec(&event)?);
            self.client
                .publish(self.link_subject.clone(), payload)
                .await?;
            batched += 1;

            // Amortize the flush: only force the buffer out when the batch
            // is full or has been open past the latency window.
            if batched >= self.batch_max_messages || batch_started.elapsed() >= self.batch_max_latency
            {
                self.flush().await?;
                trace!(count = batched, "Flushed link event batch");
                batched = 0;
                batch_started = Instant::now();
            }
        }

        if batched > 0 {
            self.flush().await?;
            trace!(count = batched, "Flushed final link event batch");
        }

        Ok(())
    }

    async fn publish_article(
        &self,
        url: &str,
        article: &Article,
        links: &[String],
    ) -> Result<(), PublishError> {
        let event = ArticleEvent {
            url: url.to_string(),
            article: article.clone(),
            links: links.to_vec(),
        };
        let payload = Bytes::from(serde_json::to_vec(&event)?);
        self.client
            .publish(self.article_subject.clone(), payload)
            .await?;
        self.flush().await
    }
}

/// In-memory publisher for tests
///
/// Records every event and can simulate failure on either channel.
#[derive(Default)]
pub struct MemoryPublisher {
    link_events: std::sync::RwLock<Vec<LinkEvent>>,
    article_events: std::sync::RwLock<Vec<ArticleEvent>>,
    fail_links: std::sync::atomic::AtomicBool,
    fail_articles: std::sync::atomic::AtomicBool,
}

impl MemoryPublisher {
    /// Create an empty publisher
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent link publishes fail
    pub fn fail_links(&self) {
        self.fail_links
            .store(true, std::sync::atomic::Ordering::SeqCst);
    }

    /// Make subsequent article publishes fail
    pub fn fail_articles(&self) {
        self.fail_articles
            .store(true, std::sync::atomic::Ordering::SeqCst);
    }

    /// Snapshot of published link events
    pub fn link_events(&self) -> Vec<LinkEvent> {
        self.link_events.read().unwrap().clone()
    }

    /// Snapshot of published article events
    pub fn article_events(&self) -> Vec<ArticleEvent> {
        self.article_events.read().unwrap().clone()
    }
}

#[async_trait]
impl EventPublisher for MemoryPublisher {
    async fn publish_links(&self, links: &[String], parent_url: &str) -> Result<(), PublishError> {
        if self.fail_links.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(PublishError::Transport(
                "simulated link publish failure".to_string(),
            ));
        }
        let mut events = self.link_events.write().unwrap();
        for link in links {
            events.push(LinkEvent {
                to: link.clone(),
                from: parent_url.to_string(),
            });
        }
        Ok(())
    }

    async fn publish_article(
        &self,
        url: &str,
        article: &Article,
        links: &[String],
    ) -> Result<(), PublishError> {
        if self.fail_articles.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(PublishError::Transport(
                "simulated article publish failure".to_string(),
            ));
        }
        self.article_events.write().unwrap().push(ArticleEvent {
            url: url.to_string(),
            article: article.clone(),
            links: links.to_vec(),
        });
        Ok(())
    }
}
