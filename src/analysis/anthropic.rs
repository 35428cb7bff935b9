//! Analyzer backed by the Anthropic messages API.

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, warn};

use super::{
    classifier, fields, truncate_chars, AnalysisError, Classification, DocumentAnalyzer,
    HeuristicAnalyzer,
};
use crate::config::Config;
use crate::models::{DocumentType, ExtractedFields, Locale};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_PROMPT_CHARS: usize = 12_000;
const MAX_TOKENS: u32 = 1024;

// Greedy on purpose: spans nested objects from the first `{` to the last `}`.
static RE_JSON_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("json object regex"));

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct ClassificationReply {
    document_type: String,
    #[serde(default)]
    confidence: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct SummaryReply {
    summary: String,
}

pub struct AnthropicAnalyzer {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    fallback: HeuristicAnalyzer,
}

impl AnthropicAnalyzer {
    pub fn new(api_key: &str, model: &str, base_url: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            fallback: HeuristicAnalyzer,
        }
    }

    /// `None` when no API key is configured.
    pub fn from_config(config: &Config) -> Option<Self> {
        config
            .anthropic_api_key
            .as_deref()
            .map(|key| Self::new(key, &config.anthropic_model, &config.anthropic_base_url))
    }

    /// Send one user message and return the concatenated text blocks of the reply.
    async fn send_prompt(&self, prompt: &str) -> Result<String, AnalysisError> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            messages: vec![Message { role: "user", content: prompt }],
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| AnalysisError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AnalysisError::Status { status: status.as_u16(), body });
        }

        let reply: MessagesResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::Request(format!("invalid response body: {}", e)))?;

        let text = reply
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .map(|block| block.text)
            .collect::<Vec<_>>()
            .join("\n");

        if text.trim().is_empty() {
            return Err(AnalysisError::EmptyReply);
        }
        debug!("Anthropic reply: {} chars", text.len());
        Ok(text)
    }
}

/// Deserialize the first JSON object embedded in a model reply.
pub(crate) fn parse_json_reply<T: for<'de> Deserialize<'de>>(reply: &str) -> Option<T> {
    let candidate = RE_JSON_OBJECT.find(reply)?;
    serde_json::from_str(candidate.as_str()).ok()
}

/// Models answer `null` for missing values; drop those keys so field defaults apply.
fn parse_fields_reply(reply: &str) -> Option<ExtractedFields> {
    let mut value = parse_json_reply::<serde_json::Value>(reply)?;
    value.as_object_mut()?.retain(|_, v| !v.is_null());
    serde_json::from_value(value).ok()
}

fn classification_prompt(text: &str) -> String {
    let types: Vec<String> = DocumentType::ALL.iter().map(|t| t.to_string()).collect();
    format!(
        "You classify business documents written in English or French for Canadian small businesses.\n\
         Answer with a JSON object only: {{\"document_type\": one of [{}], \"confidence\": number between 0 and 1}}.\n\n\
         Document:\n{}",
        types.join(", "),
        truncate_chars(text, MAX_PROMPT_CHARS)
    )
}

fn extraction_prompt(text: &str, document_type: DocumentType) -> String {
    format!(
        "Extract structured data from this {} (English or French). Answer with a JSON object only, using these keys:\n\
         invoice_number, vendor, customer, invoice_date (YYYY-MM-DD), due_date (YYYY-MM-DD), dates (array of YYYY-MM-DD),\n\
         amounts (array of numbers), subtotal, taxes (array of {{\"kind\": \"GST\"|\"HST\"|\"PST\"|\"QST\", \"amount\": number}}),\n\
         total, currency (ISO code, default CAD), line_items (array of {{\"description\", \"quantity\", \"unit_price\", \"amount\"}}),\n\
         confidence (0 to 1). Use null for anything missing. Amounts are plain numbers with a dot decimal separator.\n\n\
         Document:\n{}",
        document_type,
        truncate_chars(text, MAX_PROMPT_CHARS)
    )
}

fn summary_prompt(text: &str, locale: Locale) -> String {
    let language = locale.pick("English", "French");
    format!(
        "Summarize this business document in two sentences, in {}. \
         Answer with a JSON object only: {{\"summary\": string}}.\n\nDocument:\n{}",
        language,
        truncate_chars(text, MAX_PROMPT_CHARS)
    )
}

#[async_trait]
impl DocumentAnalyzer for AnthropicAnalyzer {
    async fn classify(&self, text: &str) -> Result<Classification, AnalysisError> {
        let reply = self.send_prompt(&classification_prompt(text)).await?;

        if let Some(parsed) = parse_json_reply::<ClassificationReply>(&reply) {
            if let Ok(document_type) = DocumentType::try_from(parsed.document_type) {
                return Ok(Classification {
                    document_type,
                    confidence: parsed.confidence.unwrap_or(0.5).clamp(0.0, 1.0),
                    matched_keywords: Vec::new(),
                });
            }
        }

        // A bare type name is still a usable answer
        if let Ok(document_type) = DocumentType::try_from(reply.trim().to_string()) {
            return Ok(Classification {
                document_type,
                confidence: 0.5,
                matched_keywords: Vec::new(),
            });
        }

        warn!("Could not parse AI classification, using keyword classifier");
        Ok(classifier::classify(text))
    }

    async fn extract_fields(
        &self,
        text: &str,
        document_type: DocumentType,
    ) -> Result<ExtractedFields, AnalysisError> {
        let reply = self.send_prompt(&extraction_prompt(text, document_type)).await?;

        match parse_fields_reply(&reply) {
            Some(mut parsed) => {
                if parsed.currency.trim().is_empty() {
                    parsed.currency = "CAD".to_string();
                }
                parsed.confidence = if parsed.confidence > 0.0 {
                    parsed.confidence.clamp(0.0, 1.0)
                } else {
                    fields::score_confidence(&parsed)
                };
                Ok(parsed)
            }
            None => {
                warn!("Could not parse AI field extraction, using regex extractor");
                self.fallback.extract_fields(text, document_type).await
            }
        }
    }

    async fn summarize(&self, text: &str, locale: Locale) -> Result<String, AnalysisError> {
        let reply = self.send_prompt(&summary_prompt(text, locale)).await?;

        match parse_json_reply::<SummaryReply>(&reply) {
            Some(parsed) if !parsed.summary.trim().is_empty() => Ok(parsed.summary.trim().to_string()),
            _ => {
                debug!("Summary reply was not JSON, using it verbatim");
                Ok(reply.trim().to_string())
            }
        }
    }

    fn is_remote(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "anthropic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn reply(text: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "content": [{"type": "text", "text": text}],
            "stop_reason": "end_turn"
        }))
    }

    async fn analyzer_answering(text: &str) -> (AnthropicAnalyzer, MockServer) {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "sk-ant-test"))
            .and(header("anthropic-version", ANTHROPIC_VERSION))
            .respond_with(reply(text))
            .mount(&server)
            .await;
        let analyzer = AnthropicAnalyzer::new("sk-ant-test", "claude-test", &server.uri());
        (analyzer, server)
    }

    #[test]
    fn test_parse_json_reply_finds_embedded_object() {
        let parsed: ClassificationReply =
            parse_json_reply("Sure! Here it is:\n{\"document_type\": \"receipt\", \"confidence\": 0.9}\nThanks").unwrap();
        assert_eq!(parsed.document_type, "receipt");
        assert_eq!(parsed.confidence, Some(0.9));

        assert!(parse_json_reply::<ClassificationReply>("no json here").is_none());
    }

    #[tokio::test]
    async fn test_classify_parses_json() {
        let (analyzer, _server) =
            analyzer_answering("```json\n{\"document_type\": \"bank_statement\", \"confidence\": 0.91}\n```").await;

        let result = analyzer.classify("Relevé de compte").await.unwrap();

        assert_eq!(result.document_type, DocumentType::BankStatement);
        assert_eq!(result.confidence, 0.91);
        assert!(analyzer.is_remote());
    }

    #[tokio::test]
    async fn test_classify_accepts_bare_type_name() {
        let (analyzer, _server) = analyzer_answering("Invoice").await;
        let result = analyzer.classify("whatever").await.unwrap();
        assert_eq!(result.document_type, DocumentType::Invoice);
    }

    #[tokio::test]
    async fn test_classify_falls_back_to_keywords_on_garbage() {
        let (analyzer, _server) = analyzer_answering("I am not sure what this is.").await;
        let result = analyzer.classify("Reçu - merci de votre achat").await.unwrap();
        assert_eq!(result.document_type, DocumentType::Receipt);
    }

    #[tokio::test]
    async fn test_extract_fields_from_json_reply() {
        let (analyzer, _server) = analyzer_answering(
            r#"{"invoice_number": "A-1", "vendor": "Acme", "total": 114.98, "currency": null,
                "taxes": [{"kind": "GST", "amount": 5.0}], "invoice_date": "2024-02-01"}"#,
        )
        .await;

        let fields = analyzer.extract_fields("...", DocumentType::Invoice).await.unwrap();

        assert_eq!(fields.invoice_number.as_deref(), Some("A-1"));
        assert_eq!(fields.total, Some(114.98));
        assert_eq!(fields.currency, "CAD");
        assert_eq!(fields.confidence, 1.0);
    }

    #[tokio::test]
    async fn test_extract_fields_falls_back_to_regex() {
        let (analyzer, _server) = analyzer_answering("Sorry, I cannot help with that.").await;
        let fields = analyzer
            .extract_fields("Facture n° Q-77\nTotal : 57,49 $", DocumentType::Invoice)
            .await
            .unwrap();
        assert_eq!(fields.invoice_number.as_deref(), Some("Q-77"));
        assert_eq!(fields.total, Some(57.49));
    }

    #[tokio::test]
    async fn test_summary_uses_raw_text_when_not_json() {
        let (analyzer, _server) = analyzer_answering("  Facture de Acme pour 50 $.  ").await;
        let summary = analyzer.summarize("...", Locale::Fr).await.unwrap();
        assert_eq!(summary, "Facture de Acme pour 50 $.");
    }

    #[tokio::test]
    async fn test_http_errors_are_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(529).set_body_string("overloaded"))
            .mount(&server)
            .await;
        let analyzer = AnthropicAnalyzer::new("sk-ant-test", "claude-test", &server.uri());

        let err = analyzer.classify("text").await.unwrap_err();

        assert!(matches!(err, AnalysisError::Status { status: 529, .. }));
    }
}
