//! End-to-end promo pipeline
//!
//! Orchestrates one pass: fetch the latest token snapshots, generate
//! candidate messages, dispatch them across the requested platforms, and
//! record what happened. Per-token problems are contained; one bad record
//! never stops the rest of the batch.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::db::Database;
use crate::dispatcher::Dispatcher;
use crate::error::{Result, TokencastError};
use crate::generator::ContentGenerator;
use crate::source::TokenSource;
use crate::types::{GeneratedMessage, PostOutcome, PostRecord, StoredMessage};

pub struct PromoPipeline {
    source: Arc<dyn TokenSource>,
    generator: ContentGenerator,
    dispatcher: Dispatcher,
    db: Database,
}

/// What happened for one token in a pipeline pass.
#[derive(Debug, Clone, Serialize)]
pub struct TokenReport {
    pub symbol: String,
    pub messages: Vec<GeneratedMessage>,
    pub outcomes: Vec<PostOutcome>,
}

/// Summary of one pipeline pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub processed: Vec<TokenReport>,
    /// Records dropped for failing the required-fields check
    pub skipped: usize,
}

impl PromoPipeline {
    pub fn new(
        source: Arc<dyn TokenSource>,
        generator: ContentGenerator,
        dispatcher: Dispatcher,
        db: Database,
    ) -> Self {
        Self {
            source,
            generator,
            dispatcher,
            db,
        }
    }

    /// Run one pass over up to `limit` tokens.
    ///
    /// With `dry_run` set, messages are generated and stored but nothing is
    /// dispatched.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure failures (source or
    /// database). Invalid token records are skipped and counted; delivery
    /// failures land in the per-platform outcomes.
    pub async fn run_once(
        &self,
        limit: usize,
        platforms: &[String],
        dry_run: bool,
    ) -> Result<RunReport> {
        let tokens = self.source.fetch_latest(limit).await?;
        if tokens.is_empty() {
            info!("no tokens to process");
            return Ok(RunReport::default());
        }

        let mut report = RunReport::default();

        for token in tokens {
            let messages = match self.generator.generate(&token).await {
                Ok(messages) => messages,
                Err(TokencastError::Validation(reason)) => {
                    warn!(symbol = %token.symbol, "skipping invalid record: {}", reason);
                    report.skipped += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            let mut token_report = TokenReport {
                symbol: token.symbol.clone(),
                messages: messages.clone(),
                outcomes: Vec::new(),
            };

            for message in &messages {
                let stored = StoredMessage::from_message(&token.symbol, message);
                self.db.create_message(&stored).await?;

                if dry_run {
                    info!(symbol = %token.symbol, "dry run, not dispatching: {}", message.text);
                    continue;
                }

                let outcomes = self.dispatcher.dispatch_all(message, platforms, &[]).await;

                let now = chrono::Utc::now().timestamp();
                for outcome in &outcomes {
                    self.db
                        .create_post_record(&PostRecord::from_outcome(&stored.id, outcome, now))
                        .await?;
                }

                // Partial success still counts as posted
                if outcomes.iter().any(|o| o.success) {
                    self.db.mark_message_posted(&stored.id).await?;
                }

                token_report.outcomes.extend(outcomes);
            }

            report.processed.push(token_report);
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::mock::MockModel;
    use crate::platforms::mock::MockPlatform;
    use crate::registry::PlatformRegistry;
    use crate::source::MemoryTokenSource;
    use crate::types::TokenRecord;
    use tempfile::TempDir;

    async fn test_db() -> (TempDir, Database) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("pipeline.db");
        let db = Database::new(&db_path.to_string_lossy()).await.unwrap();
        (temp_dir, db)
    }

    fn pipeline_with(
        tokens: Vec<TokenRecord>,
        platform: Arc<MockPlatform>,
        db: Database,
    ) -> PromoPipeline {
        let source = Arc::new(MemoryTokenSource::new(tokens));
        let generator = ContentGenerator::new(Arc::new(MockModel::replying(
            "$ABC: steady climb, listing soon. stack?",
        )));
        let dispatcher = Dispatcher::new(Arc::new(PlatformRegistry::builtin()), vec![platform]);
        PromoPipeline::new(source, generator, dispatcher, db)
    }

    #[tokio::test]
    async fn test_empty_source_is_not_an_error() {
        let (_temp, db) = test_db().await;
        let platform = Arc::new(MockPlatform::success("telegram"));
        let pipeline = pipeline_with(vec![], platform, db);

        let report = pipeline
            .run_once(5, &["telegram".to_string()], false)
            .await
            .unwrap();
        assert!(report.processed.is_empty());
        assert_eq!(report.skipped, 0);
    }

    #[tokio::test]
    async fn test_run_once_dispatches_and_records() {
        let (_temp, db) = test_db().await;
        let platform = Arc::new(MockPlatform::success("telegram"));
        let pipeline = pipeline_with(
            vec![TokenRecord::new("ABC", "Abc Token")],
            platform.clone(),
            db.clone(),
        );

        let report = pipeline
            .run_once(5, &["telegram".to_string()], false)
            .await
            .unwrap();

        assert_eq!(report.processed.len(), 1);
        assert_eq!(report.processed[0].symbol, "ABC");
        assert_eq!(report.processed[0].outcomes.len(), 1);
        assert!(report.processed[0].outcomes[0].success);
        assert_eq!(platform.post_call_count(), 1);
    }

    #[tokio::test]
    async fn test_dry_run_skips_dispatch_but_stores_messages() {
        let (_temp, db) = test_db().await;
        let platform = Arc::new(MockPlatform::success("telegram"));
        let pipeline = pipeline_with(
            vec![TokenRecord::new("ABC", "Abc Token")],
            platform.clone(),
            db,
        );

        let report = pipeline
            .run_once(5, &["telegram".to_string()], true)
            .await
            .unwrap();

        assert_eq!(report.processed.len(), 1);
        assert!(report.processed[0].outcomes.is_empty());
        assert_eq!(platform.post_call_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_record_is_skipped_not_fatal() {
        let (_temp, db) = test_db().await;
        let platform = Arc::new(MockPlatform::success("telegram"));
        let pipeline = pipeline_with(
            vec![
                TokenRecord::new("", "Nameless"),
                TokenRecord::new("OK", "Ok Token"),
            ],
            platform.clone(),
            db,
        );

        let report = pipeline
            .run_once(5, &["telegram".to_string()], false)
            .await
            .unwrap();

        assert_eq!(report.skipped, 1);
        assert_eq!(report.processed.len(), 1);
        assert_eq!(report.processed[0].symbol, "OK");
    }
}
