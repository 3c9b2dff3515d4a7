//! Token record sources
//!
//! A source hands the pipeline the most recently collected token snapshots.
//! The production source reads the collected-tokens table; the in-memory
//! source backs tests and demos.

use async_trait::async_trait;

use crate::db::Database;
use crate::error::Result;
use crate::types::TokenRecord;

/// Supplier of token snapshots, newest first.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Fetch up to `limit` records. An empty list means nothing has been
    /// collected yet; it is not an error.
    async fn fetch_latest(&self, limit: usize) -> Result<Vec<TokenRecord>>;
}

/// Source backed by the collected-tokens table.
pub struct DbTokenSource {
    db: Database,
}

impl DbTokenSource {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TokenSource for DbTokenSource {
    async fn fetch_latest(&self, limit: usize) -> Result<Vec<TokenRecord>> {
        self.db.latest_tokens(limit).await
    }
}

/// Fixed in-memory source. Records are returned in the order given, which
/// is taken to be newest first.
pub struct MemoryTokenSource {
    tokens: Vec<TokenRecord>,
}

impl MemoryTokenSource {
    pub fn new(tokens: Vec<TokenRecord>) -> Self {
        Self { tokens }
    }

    pub fn empty() -> Self {
        Self { tokens: Vec::new() }
    }
}

#[async_trait]
impl TokenSource for MemoryTokenSource {
    async fn fetch_latest(&self, limit: usize) -> Result<Vec<TokenRecord>> {
        Ok(self.tokens.iter().take(limit).cloned().collect())
    }
}
