use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;
use utoipa::ToSchema;

use super::{Document, ExtractedFields, LineItem};

/// Extractions scoring below this are flagged for a human to look at.
pub const REVIEW_CONFIDENCE_THRESHOLD: f64 = 0.85;

pub fn needs_review(confidence_score: f64) -> bool {
    confidence_score < REVIEW_CONFIDENCE_THRESHOLD
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ExtractedInvoice {
    pub id: Uuid,
    pub document_id: Uuid,
    pub user_id: Uuid,
    pub vendor_name: Option<String>,
    pub customer_name: Option<String>,
    pub invoice_number: Option<String>,
    pub invoice_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub subtotal: Option<f64>,
    pub tax_amount: Option<f64>,
    pub total_amount: Option<f64>,
    pub currency: String,
    #[schema(value_type = Vec<LineItem>)]
    pub line_items: Json<Vec<LineItem>>,
    pub confidence_score: f64,
    pub needs_review: bool,
    pub created_at: DateTime<Utc>,
}

impl ExtractedInvoice {
    pub fn from_fields(document: &Document, fields: &ExtractedFields) -> Self {
        let confidence_score = fields.confidence.clamp(0.0, 1.0);
        Self {
            id: Uuid::new_v4(),
            document_id: document.id,
            user_id: document.user_id,
            vendor_name: fields.vendor.clone(),
            customer_name: fields.customer.clone(),
            invoice_number: fields.invoice_number.clone(),
            invoice_date: fields.invoice_date,
            due_date: fields.due_date,
            subtotal: fields.subtotal,
            tax_amount: fields.tax_total(),
            total_amount: fields.total,
            currency: fields.currency.clone(),
            line_items: Json(fields.line_items.clone()),
            confidence_score,
            needs_review: needs_review(confidence_score),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DocumentType, Locale, TaxLine};

    fn document() -> Document {
        Document {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            organization_id: None,
            project_id: None,
            client_id: None,
            job_id: None,
            filename: "stored.pdf".to_string(),
            original_filename: "invoice.pdf".to_string(),
            file_path: "/tmp/stored.pdf".to_string(),
            file_size: 10,
            mime_type: "application/pdf".to_string(),
            file_hash: None,
            extracted_text: None,
            document_type: DocumentType::Invoice,
            confidence: 0.9,
            summary: None,
            extracted_fields: serde_json::json!({}),
            suggestions: serde_json::json!([]),
            language: Locale::En,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_needs_review_threshold() {
        assert!(needs_review(0.0));
        assert!(needs_review(0.8499));
        assert!(!needs_review(0.85));
        assert!(!needs_review(1.0));
    }

    #[test]
    fn test_from_fields_sums_taxes_and_flags_review() {
        let fields = ExtractedFields {
            invoice_number: Some("INV-1001".to_string()),
            vendor: Some("Plomberie Tremblay".to_string()),
            subtotal: Some(100.0),
            taxes: vec![
                TaxLine { kind: "GST".to_string(), amount: 5.0 },
                TaxLine { kind: "QST".to_string(), amount: 9.98 },
            ],
            total: Some(114.98),
            confidence: 0.5,
            ..Default::default()
        };
        let doc = document();
        let invoice = ExtractedInvoice::from_fields(&doc, &fields);

        assert_eq!(invoice.document_id, doc.id);
        assert_eq!(invoice.tax_amount, Some(14.98));
        assert_eq!(invoice.currency, "CAD");
        assert!(invoice.needs_review);
    }

    #[test]
    fn test_confident_invoice_is_not_flagged() {
        let fields = ExtractedFields { confidence: 1.0, ..Default::default() };
        let invoice = ExtractedInvoice::from_fields(&document(), &fields);
        assert!(!invoice.needs_review);
        assert_eq!(invoice.tax_amount, None);
    }
}
