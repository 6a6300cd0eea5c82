//! Durable crawl ledger for URL deduplication
//!
//! The ledger is a keyed store mapping URL → [`CrawlRecord`]. Presence of a
//! key is the only "already crawled" signal. Lookups are fail-open: if the
//! store is unreachable the URL is treated as not yet crawled, trading
//! possible re-processing for crawl availability. Writes are unconditional
//! upserts; no compare-and-set is attempted, so concurrent invocations for
//! the same URL can both pass the check and both write. That race is
//! accepted; every downstream effect is safe to repeat.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::warn;

use crate::error::LedgerError;
use crate::models::CrawlRecord;

/// Point lookup + write against the crawl ledger
#[async_trait]
pub trait CrawlLedger: Send + Sync {
    /// Whether the URL already has a ledger entry. Fail-open: storage
    /// errors log and return false.
    async fn exists(&self, url: &str) -> bool;

    /// Record that the URL was crawled at the given epoch-millisecond
    /// timestamp. Unconditional upsert.
    async fn record(&self, url: &str, crawled_at: i64) -> Result<(), LedgerError>;
}

/// Redis-backed ledger, namespaced by key prefix
#[derive(Clone)]
pub struct RedisLedger {
    conn: ConnectionManager,
    namespace: String,
}

impl RedisLedger {
    /// Connect to Redis and return a ledger over the given namespace
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Store` if the connection cannot be established
    pub async fn connect(redis_url: &str, namespace: &str) -> Result<Self, LedgerError> {
        let client = redis::Client::open(redis_url).map_err(LedgerError::Store)?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(LedgerError::Store)?;

        Ok(Self {
            conn,
            namespace: namespace.to_string(),
        })
    }

    fn key(&self, url: &str) -> String {
        format!("{}:{}", self.namespace, url)
    }
}

#[async_trait]
impl CrawlLedger for RedisLedger {
    async fn exists(&self, url: &str) -> bool {
        let mut conn = self.conn.clone();
        match conn.exists::<_, bool>(self.key(url)).await {
            Ok(present) => present,
            Err(e) => {
                warn!(url = %url, error = %e, "Ledger lookup failed, treating as not crawled");
                false
            }
        }
    }

    async fn record(&self, url: &str, crawled_at: i64) -> Result<(), LedgerError> {
        let entry = serde_json::to_string(&CrawlRecord { crawled_at })?;
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(self.key(url), entry)
            .await
            .map_err(LedgerError::Store)?;
        Ok(())
    }
}

/// In-memory ledger for tests
///
/// Can be switched into failing mode to exercise the fail-open lookup path
/// and the logged-but-not-fatal write path.
#[derive(Default)]
pub struct MemoryLedger {
    entries: std::sync::RwLock<std::collections::HashMap<String, CrawlRecord>>,
    fail_lookups: std::sync::atomic::AtomicBool,
    fail_writes: std::sync::atomic::AtomicBool,
}

impl MemoryLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate an entry, as if the URL was crawled earlier
    pub fn insert(&self, url: &str, crawled_at: i64) {
        self.entries
            .write()
            .unwrap()
            .insert(url.to_string(), CrawlRecord { crawled_at });
    }

    /// Make subsequent lookups fail
    pub fn fail_lookups(&self) {
        self.fail_lookups
            .store(true, std::sync::atomic::Ordering::SeqCst);
    }

    /// Make subsequent writes fail
    pub fn fail_writes(&self) {
        self.fail_writes
            .store(true, std::sync::atomic::Ordering::SeqCst);
    }

    /// Snapshot of recorded entries
    pub fn records(&self) -> std::collections::HashMap<String, CrawlRecord> {
        self.entries.read().unwrap().clone()
    }
}

#[async_trait]
impl CrawlLedger for MemoryLedger {
    async fn exists(&self, url: &str) -> bool {
        if self.fail_lookups.load(std::sync::atomic::Ordering::SeqCst) {
            warn!(url = %url, "Ledger lookup failed, treating as not crawled");
            return false;
        }
        self.entries.read().unwrap().contains_key(url)
    }

    async fn record(&self, url: &str, crawled_at: i64) -> Result<(), LedgerError> {
        if self.fail_writes.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(LedgerError::Serialization(
                <serde_json::Error as serde::de::Error>::custom("simulated write failure"),
            ));
        }
        self.insert(url, crawled_at);
        Ok(())
    }
}
