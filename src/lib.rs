//! onehop - Single-hop web-crawl worker
//!
//! Given one directed edge (parent URL → child URL) in a crawl graph, the
//! worker decides whether to visit the child, extracts reader-mode article
//! content if present, harvests outbound links, and fans the result out as
//! new edges plus a persisted crawl record.
//!
//! # Architecture
//!
//! - [`config`] - Configuration management and settings
//! - [`policy`] - Static allow/deny pattern matching over URLs
//! - [`ledger`] - Durable crawl ledger for URL deduplication
//! - [`fetcher`] - Single-shot HTTP page fetching
//! - [`extractor`] - Reader-mode article extraction
//! - [`harvest`] - Outbound link harvesting and validation
//! - [`publisher`] - Outbound event fan-out
//! - [`worker`] - Per-invocation orchestration
//! - [`models`] - Core data structures and wire shapes
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use onehop::config::Config;
//! use onehop::extractor::ArticleExtractor;
//! use onehop::fetcher::PageFetcher;
//! use onehop::ledger::MemoryLedger;
//! use onehop::policy::PolicyFilter;
//! use onehop::publisher::MemoryPublisher;
//! use onehop::worker::CrawlWorker;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! let worker = CrawlWorker::new(
//!     PolicyFilter::new(&config.policy)?,
//!     PageFetcher::new(config.request_timeout(), config.fetcher.user_agent.clone())?,
//!     ArticleExtractor::new(),
//!     Arc::new(MemoryLedger::new()),
//!     Arc::new(MemoryPublisher::new()),
//! );
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod harvest;
pub mod ledger;
pub mod models;
pub mod policy;
pub mod publisher;
pub mod worker;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::extractor::ArticleExtractor;
    pub use crate::fetcher::PageFetcher;
    pub use crate::harvest::{harvest_links, is_strict_url};
    pub use crate::ledger::{CrawlLedger, RedisLedger};
    pub use crate::models::{Article, ArticleEvent, CrawlEdge, CrawlRecord, LinkEvent, RawPage};
    pub use crate::policy::PolicyFilter;
    pub use crate::publisher::{EventPublisher, NatsEventPublisher};
    pub use crate::worker::{CrawlOutcome, CrawlWorker};
}

// Direct re-exports for convenience
pub use models::{Article, CrawlEdge};
pub use worker::{CrawlOutcome, CrawlWorker};
