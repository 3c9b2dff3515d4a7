//! Token promo content generation
//!
//! Builds a structured prompt from a token snapshot, asks the language model
//! for a short promotional post, and synthesizes a deterministic fallback
//! when the call fails. Model failures never escape this module; the only
//! error callers see is a precondition failure on the input record.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{Result, TokencastError};
use crate::model::{CompletionRequest, LanguageModel};
use crate::types::{GeneratedMessage, TokenRecord};

/// Fixed system role for every generation call.
const SYSTEM_PROMPT: &str = "You are a crypto analyst who writes concise, informative posts \
     about tokens. Keep the tone cool and professional.";

/// Closing calls-to-action the prompt asks the model to rotate through.
const CALL_TO_ACTIONS: [&str; 4] = ["ape?", "fomo?", "stack?", "worth watching?"];

const TEMPERATURE: f32 = 0.7;
const MODEL_TIMEOUT: Duration = Duration::from_secs(30);
const WORD_BUDGET: usize = 15;

pub struct ContentGenerator {
    model: Arc<dyn LanguageModel>,
}

impl ContentGenerator {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// Generate candidate messages for a token.
    ///
    /// Always returns at least one message. Model-call failures (timeout,
    /// auth, provider rate limit, malformed or empty response) degrade to
    /// the fallback template; the failure class is logged.
    ///
    /// # Errors
    ///
    /// Returns `TokencastError::Validation` when the record is missing its
    /// symbol or name. This is the only error path.
    pub async fn generate(&self, token: &TokenRecord) -> Result<Vec<GeneratedMessage>> {
        validate_record(token)?;

        let request = CompletionRequest {
            system_prompt: SYSTEM_PROMPT.to_string(),
            user_prompt: build_prompt(token),
            temperature: TEMPERATURE,
            timeout: MODEL_TIMEOUT,
        };

        debug!(symbol = %token.symbol, model = %self.model.name(), "requesting completion");

        match self.model.complete(&request).await {
            Ok(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    warn!(symbol = %token.symbol, class = "empty", "unusable completion, using fallback");
                    Ok(vec![fallback_message(token)])
                } else {
                    Ok(vec![GeneratedMessage::model(trimmed)])
                }
            }
            Err(e) => {
                warn!(symbol = %token.symbol, class = e.class(), "generation failed ({}), using fallback", e);
                Ok(vec![fallback_message(token)])
            }
        }
    }
}

fn validate_record(token: &TokenRecord) -> Result<()> {
    if token.symbol.trim().is_empty() {
        return Err(TokencastError::Validation(
            "token symbol is required".to_string(),
        ));
    }
    if token.name.trim().is_empty() {
        return Err(TokencastError::Validation(
            "token name is required".to_string(),
        ));
    }
    Ok(())
}

/// Build the user prompt embedding the snapshot fields.
///
/// Market metrics are compacted with K/M/B suffixes so the model is not fed
/// raw 12-digit numbers; missing metrics render as "N/A".
fn build_prompt(token: &TokenRecord) -> String {
    let metric = |value: &Option<crate::types::MetricValue>| {
        value
            .as_ref()
            .map(|v| v.compact())
            .unwrap_or_else(|| "N/A".to_string())
    };

    let events = if token.events.is_empty() {
        "none".to_string()
    } else {
        token.events.join(", ")
    };

    let narrative = token.narrative.as_deref().unwrap_or("");

    format!(
        "Analyze this token data and provide a post under {budget} words in the format:\n\
         ${symbol}: analysis + action?\n\
         \n\
         Token Symbol: {symbol}\n\
         Token Name: {name}\n\
         Narrative: {narrative}\n\
         Market Cap: {market_cap}\n\
         Price: {price}\n\
         Volume 24h: {volume}\n\
         Sentiment: {sentiment}\n\
         Events: {events}\n\
         \n\
         Keep it cool, no caps for emotion, mix up the final actions like {ctas}",
        budget = WORD_BUDGET,
        symbol = token.symbol,
        name = token.name,
        narrative = narrative,
        market_cap = metric(&token.market_cap),
        price = metric(&token.price),
        volume = metric(&token.volume_24h),
        sentiment = token.sentiment,
        events = events,
        ctas = CALL_TO_ACTIONS
            .iter()
            .map(|c| format!("'{}'", c))
            .collect::<Vec<_>>()
            .join(", "),
    )
}

/// Deterministic template used when the model call fails. Built only from
/// locally available fields; must never fail.
fn fallback_message(token: &TokenRecord) -> GeneratedMessage {
    let activity = if token.volume_24h.is_some() {
        "active"
    } else {
        "developing"
    };

    GeneratedMessage::fallback(format!(
        "${}: {} sentiment with {} volume. worth watching?",
        token.symbol, token.sentiment, activity
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use crate::model::mock::MockModel;
    use crate::types::{MessageSource, MetricValue, Sentiment};

    fn token() -> TokenRecord {
        TokenRecord {
            symbol: "ABC".to_string(),
            name: "Abc Token".to_string(),
            price: Some(MetricValue::Number(0.042)),
            volume_24h: Some(MetricValue::Text("$4,500,000".to_string())),
            market_cap: Some(MetricValue::Number(12_000_000.0)),
            sentiment: Sentiment::Positive,
            events: vec!["dex listing".to_string(), "audit passed".to_string()],
            narrative: Some("AI agents".to_string()),
        }
    }

    #[tokio::test]
    async fn test_generate_returns_model_message() {
        let generator = ContentGenerator::new(Arc::new(MockModel::replying(
            "  $ABC: volume picking up, listing live. ape?  ",
        )));

        let messages = generator.generate(&token()).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].source, MessageSource::Model);
        assert_eq!(messages[0].text, "$ABC: volume picking up, listing live. ape?");
    }

    #[tokio::test]
    async fn test_timeout_falls_back() {
        let generator = ContentGenerator::new(Arc::new(MockModel::timing_out()));

        let messages = generator.generate(&token()).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].source, MessageSource::Fallback);
        assert!(messages[0].text.contains("$ABC"));
    }

    #[tokio::test]
    async fn test_every_failure_class_falls_back() {
        for error in [
            ModelError::Auth("401".to_string()),
            ModelError::RateLimited("429".to_string()),
            ModelError::Malformed("no choices".to_string()),
            ModelError::Network("refused".to_string()),
            ModelError::Empty,
        ] {
            let generator = ContentGenerator::new(Arc::new(MockModel::failing(error)));
            let messages = generator.generate(&token()).await.unwrap();
            assert_eq!(messages[0].source, MessageSource::Fallback);
        }
    }

    #[tokio::test]
    async fn test_whitespace_completion_falls_back() {
        let generator = ContentGenerator::new(Arc::new(MockModel::replying("   \n  ")));

        let messages = generator.generate(&token()).await.unwrap();
        assert_eq!(messages[0].source, MessageSource::Fallback);
    }

    #[tokio::test]
    async fn test_missing_symbol_is_validation_error() {
        let generator = ContentGenerator::new(Arc::new(MockModel::replying("ok")));
        let mut record = token();
        record.symbol = "".to_string();

        let err = generator.generate(&record).await.unwrap_err();
        assert!(matches!(err, TokencastError::Validation(_)));
    }

    #[tokio::test]
    async fn test_missing_name_is_validation_error() {
        let generator = ContentGenerator::new(Arc::new(MockModel::replying("ok")));
        let mut record = token();
        record.name = "   ".to_string();

        let err = generator.generate(&record).await.unwrap_err();
        assert!(matches!(err, TokencastError::Validation(_)));
    }

    #[tokio::test]
    async fn test_validation_failure_skips_model_call() {
        let model = Arc::new(MockModel::replying("ok"));
        let generator = ContentGenerator::new(model.clone());
        let mut record = token();
        record.symbol = "".to_string();

        let _ = generator.generate(&record).await;
        assert_eq!(model.call_count(), 0);
    }

    #[test]
    fn test_fallback_with_volume() {
        let message = fallback_message(&token());
        assert_eq!(
            message.text,
            "$ABC: positive sentiment with active volume. worth watching?"
        );
        assert!(message.text.len() < 100);
    }

    #[test]
    fn test_fallback_without_volume() {
        let mut record = TokenRecord::new("XYZ", "Xyz Token");
        record.sentiment = Sentiment::Neutral;
        let message = fallback_message(&record);
        assert_eq!(
            message.text,
            "$XYZ: neutral sentiment with developing volume. worth watching?"
        );
    }

    #[test]
    fn test_prompt_embeds_fields() {
        let prompt = build_prompt(&token());
        assert!(prompt.contains("Token Symbol: ABC"));
        assert!(prompt.contains("Token Name: Abc Token"));
        assert!(prompt.contains("Market Cap: 12.0M"));
        assert!(prompt.contains("Volume 24h: 4.5M"));
        assert!(prompt.contains("Sentiment: positive"));
        assert!(prompt.contains("Events: dex listing, audit passed"));
        assert!(prompt.contains("'ape?'"));
    }

    #[test]
    fn test_prompt_empty_events_render_as_none() {
        let record = TokenRecord::new("ABC", "Abc Token");
        let prompt = build_prompt(&record);
        assert!(prompt.contains("Events: none"));
        assert!(prompt.contains("Price: N/A"));
    }

    #[tokio::test]
    async fn test_model_receives_fixed_sampling_parameters() {
        let model = Arc::new(MockModel::replying("ok"));
        let generator = ContentGenerator::new(model.clone());

        generator.generate(&token()).await.unwrap();

        let requests = model.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].temperature, 0.7);
        assert_eq!(requests[0].timeout, Duration::from_secs(30));
        assert!(requests[0].system_prompt.contains("crypto analyst"));
    }
}
