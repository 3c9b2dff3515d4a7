//! Database operations for Tokencast
//!
//! Sqlite persistence for collected token snapshots, generated messages,
//! and per-platform delivery records. The dispatcher never touches this
//! layer; only the pipeline reads and writes it.

use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use std::path::Path;

use crate::error::{DbError, Result};
use crate::types::{
    ErrorKind, MessageSource, MetricValue, PostRecord, Sentiment, StoredMessage, TokenRecord,
};

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database connection
    pub async fn new(db_path: &str) -> Result<Self> {
        // Expand path and create parent directories
        let expanded_path = shellexpand::tilde(db_path).to_string();
        let path = Path::new(&expanded_path);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(DbError::IoError)?;
        }

        // Forward slashes work for SQLite URLs on both Windows and Unix;
        // mode=rwc creates the file if it does not exist
        let db_url = format!("sqlite://{}?mode=rwc", expanded_path.replace('\\', "/"));

        let pool = SqlitePool::connect(&db_url)
            .await
            .map_err(DbError::SqlxError)?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(DbError::MigrationError)?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Store a collected token snapshot.
    pub async fn insert_token(&self, token: &TokenRecord, collected_at: i64) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO tokens (symbol, name, price, volume_24h, market_cap, sentiment, events, narrative, collected_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&token.symbol)
        .bind(&token.name)
        .bind(metric_to_json(&token.price)?)
        .bind(metric_to_json(&token.volume_24h)?)
        .bind(metric_to_json(&token.market_cap)?)
        .bind(token.sentiment.as_str())
        .bind(serde_json::to_string(&token.events).map_err(DbError::Serialization)?)
        .bind(&token.narrative)
        .bind(collected_at)
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(())
    }

    /// Fetch the most recently collected token snapshots, newest first.
    pub async fn latest_tokens(&self, limit: usize) -> Result<Vec<TokenRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT symbol, name, price, volume_24h, market_cap, sentiment, events, narrative
            FROM tokens
            ORDER BY collected_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        let mut tokens = Vec::with_capacity(rows.len());
        for row in rows {
            let sentiment: String = row.get("sentiment");
            let events: String = row.get("events");
            tokens.push(TokenRecord {
                symbol: row.get("symbol"),
                name: row.get("name"),
                price: metric_from_json(row.get("price"))?,
                volume_24h: metric_from_json(row.get("volume_24h"))?,
                market_cap: metric_from_json(row.get("market_cap"))?,
                sentiment: Sentiment::from(sentiment.as_str()),
                events: serde_json::from_str(&events).map_err(DbError::Serialization)?,
                narrative: row.get("narrative"),
            });
        }
        Ok(tokens)
    }

    /// Store a generated message.
    pub async fn create_message(&self, message: &StoredMessage) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO messages (id, token_symbol, text, source, created_at, posted)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&message.id)
        .bind(&message.token_symbol)
        .bind(&message.text)
        .bind(message.source.as_str())
        .bind(message.created_at)
        .bind(message.posted)
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(())
    }

    /// Mark a message as posted (at least one platform accepted it).
    pub async fn mark_message_posted(&self, message_id: &str) -> Result<()> {
        sqlx::query("UPDATE messages SET posted = 1 WHERE id = ?")
            .bind(message_id)
            .execute(&self.pool)
            .await
            .map_err(DbError::SqlxError)?;

        Ok(())
    }

    /// Get a message by ID.
    pub async fn get_message(&self, message_id: &str) -> Result<Option<StoredMessage>> {
        let row = sqlx::query(
            r#"
            SELECT id, token_symbol, text, source, created_at, posted
            FROM messages
            WHERE id = ?
            "#,
        )
        .bind(message_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(row.map(|row| {
            let source: String = row.get("source");
            StoredMessage {
                id: row.get("id"),
                token_symbol: row.get("token_symbol"),
                text: row.get("text"),
                source: if source == "model" {
                    MessageSource::Model
                } else {
                    MessageSource::Fallback
                },
                created_at: row.get("created_at"),
                posted: row.get("posted"),
            }
        }))
    }

    /// Record the outcome of one platform delivery attempt.
    pub async fn create_post_record(&self, record: &PostRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO post_records (message_id, platform, platform_post_id, posted_at, success, error_kind)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.message_id)
        .bind(&record.platform)
        .bind(&record.platform_post_id)
        .bind(record.posted_at)
        .bind(record.success)
        .bind(record.error_kind.map(|k| k.as_str()))
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(())
    }

    /// All delivery records for a message.
    pub async fn records_for_message(&self, message_id: &str) -> Result<Vec<PostRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, message_id, platform, platform_post_id, posted_at, success, error_kind
            FROM post_records
            WHERE message_id = ?
            ORDER BY id
            "#,
        )
        .bind(message_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let error_kind: Option<String> = row.get("error_kind");
                PostRecord {
                    id: row.get("id"),
                    message_id: row.get("message_id"),
                    platform: row.get("platform"),
                    platform_post_id: row.get("platform_post_id"),
                    posted_at: row.get("posted_at"),
                    success: row.get("success"),
                    error_kind: error_kind.as_deref().and_then(ErrorKind::parse),
                }
            })
            .collect())
    }
}

fn metric_to_json(value: &Option<MetricValue>) -> Result<Option<String>> {
    value
        .as_ref()
        .map(|v| serde_json::to_string(v).map_err(|e| DbError::Serialization(e).into()))
        .transpose()
}

fn metric_from_json(value: Option<String>) -> Result<Option<MetricValue>> {
    value
        .map(|s| serde_json::from_str(&s).map_err(|e| DbError::Serialization(e).into()))
        .transpose()
}
