use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TaxLine {
    /// GST, HST, PST or QST (TPS, TVH, TVQ are folded into the English names)
    pub kind: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LineItem {
    pub description: String,
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub unit_price: Option<f64>,
    pub amount: f64,
}

/// Structured data pulled out of a document's text.
///
/// Stored as the document's `extracted_fields` JSON blob, and also the shape
/// the AI provider is asked to answer with, so every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct ExtractedFields {
    pub invoice_number: Option<String>,
    pub vendor: Option<String>,
    pub customer: Option<String>,
    pub invoice_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub dates: Vec<NaiveDate>,
    pub amounts: Vec<f64>,
    pub subtotal: Option<f64>,
    pub taxes: Vec<TaxLine>,
    pub total: Option<f64>,
    pub currency: String,
    pub line_items: Vec<LineItem>,
    pub confidence: f64,
}

impl Default for ExtractedFields {
    fn default() -> Self {
        Self {
            invoice_number: None,
            vendor: None,
            customer: None,
            invoice_date: None,
            due_date: None,
            dates: Vec::new(),
            amounts: Vec::new(),
            subtotal: None,
            taxes: Vec::new(),
            total: None,
            currency: "CAD".to_string(),
            line_items: Vec::new(),
            confidence: 0.0,
        }
    }
}

impl ExtractedFields {
    pub fn tax_total(&self) -> Option<f64> {
        if self.taxes.is_empty() {
            None
        } else {
            Some(round_cents(self.taxes.iter().map(|t| t.amount).sum()))
        }
    }

    pub fn is_empty(&self) -> bool {
        self.invoice_number.is_none()
            && self.vendor.is_none()
            && self.customer.is_none()
            && self.dates.is_empty()
            && self.amounts.is_empty()
            && self.total.is_none()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
pub enum SuggestionPriority {
    #[serde(rename = "low")]
    Low,
    #[serde(rename = "normal")]
    Normal,
    #[serde(rename = "high")]
    High,
}

/// A follow-up action proposed to the user after a document is processed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Suggestion {
    /// Stable machine-readable key, e.g. `schedule_payment`
    pub kind: String,
    pub message: String,
    pub priority: SuggestionPriority,
}
