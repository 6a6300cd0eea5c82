//! Static allow/deny policy over crawl URLs
//!
//! The allow set bounds the crawl to approved parent sources; the deny set
//! excludes known-bad destinations regardless of where the link was found.
//! Both sets are compiled once at construction from configuration.

use regex::Regex;

use crate::config::PolicyConfig;
use crate::error::{Error, Result};

/// Compiled allow/deny pattern sets
pub struct PolicyFilter {
    allow: Vec<Regex>,
    deny: Vec<Regex>,
}

impl PolicyFilter {
    /// Compile the configured pattern lists
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if any pattern fails to compile. This should
    /// already have been caught by `Config::validate`, but construction is
    /// where the compiled set actually lives.
    pub fn new(config: &PolicyConfig) -> Result<Self> {
        let compile = |patterns: &[String]| -> Result<Vec<Regex>> {
            patterns
                .iter()
                .map(|p| {
                    Regex::new(p).map_err(|e| Error::config(format!("bad policy pattern {p}: {e}")))
                })
                .collect()
        };

        Ok(Self {
            allow: compile(&config.allow)?,
            deny: compile(&config.deny)?,
        })
    }

    /// True iff the URL matches at least one allow pattern
    #[must_use]
    pub fn is_allowed(&self, url: &str) -> bool {
        self.allow.iter().any(|r| r.is_match(url))
    }

    /// True iff the URL matches at least one deny pattern
    ///
    /// A blocked child is refused no matter which parent linked to it.
    /// The child's own allow-list status is irrelevant until it becomes a
    /// parent on the next hop.
    #[must_use]
    pub fn is_blocked(&self, url: &str) -> bool {
        self.deny.iter().any(|r| r.is_match(url))
    }
}
