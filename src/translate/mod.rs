// Translation service abstraction
//
// The translator is an unreliable network dependency. Per-segment
// translation is best-effort: a failure degrades that one segment to its
// untranslated text and is never allowed to abort the file or the batch.

pub mod http;

use async_trait::async_trait;
use tracing::warn;

use crate::config::TranslateConfig;
use crate::error::Result;

/// Main trait for translation operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranslationService: Send + Sync {
    /// Translate a piece of text between two language codes.
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String>;
}

/// Result of one best-effort segment translation. The fallback case is an
/// explicit marker rather than silent exception swallowing, so the
/// degraded path stays visible in tests.
#[derive(Debug, Clone, PartialEq)]
pub enum TranslationOutcome {
    Translated(String),
    /// Translation failed; the original text stands in
    Fallback(String),
}

impl TranslationOutcome {
    pub fn into_text(self) -> String {
        match self {
            TranslationOutcome::Translated(text) | TranslationOutcome::Fallback(text) => text,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, TranslationOutcome::Fallback(_))
    }
}

/// Translate one segment's text, keeping the original on any failure.
pub async fn translate_best_effort(
    service: &dyn TranslationService,
    text: &str,
    source: &str,
    target: &str,
) -> TranslationOutcome {
    match service.translate(text, source, target).await {
        Ok(translation) if !translation.trim().is_empty() => {
            TranslationOutcome::Translated(translation)
        }
        Ok(_) => {
            warn!("Empty translation received, keeping original text");
            TranslationOutcome::Fallback(text.to_string())
        }
        Err(e) => {
            warn!("Translation failed, keeping original text: {}", e);
            TranslationOutcome::Fallback(text.to_string())
        }
    }
}

/// Factory for creating translation service instances
pub struct TranslatorFactory;

impl TranslatorFactory {
    pub fn create_translator(config: TranslateConfig) -> Box<dyn TranslationService> {
        Box::new(http::HttpTranslator::new(config))
    }
}
