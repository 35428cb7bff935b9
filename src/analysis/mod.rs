//! Document understanding: classification, field extraction and summaries.
//!
//! Two backends implement [`DocumentAnalyzer`]. [`HeuristicAnalyzer`] runs
//! locally from keyword tables and regexes. [`anthropic::AnthropicAnalyzer`]
//! asks the Anthropic messages API and falls back to the heuristics when the
//! reply cannot be parsed.

pub mod anthropic;
pub mod classifier;
pub mod fields;
pub mod suggestions;

use async_trait::async_trait;
use thiserror::Error;

pub use classifier::Classification;

use crate::models::{DocumentType, ExtractedFields, Locale};

const SUMMARY_MAX_CHARS: usize = 280;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("AI provider request failed: {0}")]
    Request(String),

    #[error("AI provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("AI provider returned an empty reply")]
    EmptyReply,
}

#[async_trait]
pub trait DocumentAnalyzer: Send + Sync {
    async fn classify(&self, text: &str) -> Result<Classification, AnalysisError>;

    async fn extract_fields(
        &self,
        text: &str,
        document_type: DocumentType,
    ) -> Result<ExtractedFields, AnalysisError>;

    async fn summarize(&self, text: &str, locale: Locale) -> Result<String, AnalysisError>;

    /// True when every call consumes a metered AI request.
    fn is_remote(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Default)]
pub struct HeuristicAnalyzer;

#[async_trait]
impl DocumentAnalyzer for HeuristicAnalyzer {
    async fn classify(&self, text: &str) -> Result<Classification, AnalysisError> {
        Ok(classifier::classify(text))
    }

    async fn extract_fields(
        &self,
        text: &str,
        _document_type: DocumentType,
    ) -> Result<ExtractedFields, AnalysisError> {
        Ok(fields::extract(text))
    }

    async fn summarize(&self, text: &str, _locale: Locale) -> Result<String, AnalysisError> {
        Ok(summarize_text(text, SUMMARY_MAX_CHARS))
    }

    fn name(&self) -> &'static str {
        "heuristic"
    }
}

/// First sentences of `text`, whitespace collapsed, cut at `max_chars`.
pub fn summarize_text(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }

    let cut: String = collapsed.chars().take(max_chars).collect();
    match cut.rfind(['.', '!', '?']) {
        Some(end) if end > max_chars / 3 => cut[..=end].to_string(),
        _ => match cut.rfind(' ') {
            Some(space) => format!("{}…", &cut[..space]),
            None => format!("{}…", cut),
        },
    }
}

/// Cut `text` to at most `max_chars` characters.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}
