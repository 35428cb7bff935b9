use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use utoipa::ToSchema;
use serde_json;

use super::Locale;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
pub enum DocumentType {
    #[serde(rename = "invoice")]
    Invoice,
    #[serde(rename = "receipt")]
    Receipt,
    #[serde(rename = "contract")]
    Contract,
    #[serde(rename = "quote")]
    Quote,
    #[serde(rename = "bank_statement")]
    BankStatement,
    #[serde(rename = "tax_form")]
    TaxForm,
    #[serde(rename = "purchase_order")]
    PurchaseOrder,
    #[serde(rename = "other")]
    Other,
}

impl DocumentType {
    pub const ALL: [DocumentType; 8] = [
        DocumentType::Invoice,
        DocumentType::Receipt,
        DocumentType::Contract,
        DocumentType::Quote,
        DocumentType::BankStatement,
        DocumentType::TaxForm,
        DocumentType::PurchaseOrder,
        DocumentType::Other,
    ];

    /// Documents that carry billing data worth an `ExtractedInvoice` row.
    pub fn is_billing(&self) -> bool {
        matches!(self, DocumentType::Invoice | DocumentType::Receipt)
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentType::Invoice => write!(f, "invoice"),
            DocumentType::Receipt => write!(f, "receipt"),
            DocumentType::Contract => write!(f, "contract"),
            DocumentType::Quote => write!(f, "quote"),
            DocumentType::BankStatement => write!(f, "bank_statement"),
            DocumentType::TaxForm => write!(f, "tax_form"),
            DocumentType::PurchaseOrder => write!(f, "purchase_order"),
            DocumentType::Other => write!(f, "other"),
        }
    }
}

impl TryFrom<String> for DocumentType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "invoice" => Ok(DocumentType::Invoice),
            "receipt" => Ok(DocumentType::Receipt),
            "contract" => Ok(DocumentType::Contract),
            "quote" => Ok(DocumentType::Quote),
            "bank_statement" => Ok(DocumentType::BankStatement),
            "tax_form" => Ok(DocumentType::TaxForm),
            "purchase_order" => Ok(DocumentType::PurchaseOrder),
            "other" => Ok(DocumentType::Other),
            _ => Err(format!("Invalid document type: {}", value)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Document {
    pub id: Uuid,
    pub user_id: Uuid,
    pub organization_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    pub job_id: Option<Uuid>,
    pub filename: String,
    pub original_filename: String,
    /// Location of the stored file under the upload directory
    pub file_path: String,
    pub file_size: i64,
    pub mime_type: String,
    pub file_hash: Option<String>,
    pub extracted_text: Option<String>,
    #[sqlx(try_from = "String")]
    pub document_type: DocumentType,
    /// Classification confidence between 0 and 1
    pub confidence: f64,
    pub summary: Option<String>,
    /// Structured fields pulled from the text (amounts, dates, parties, ...)
    pub extracted_fields: serde_json::Value,
    pub suggestions: serde_json::Value,
    #[sqlx(try_from = "String")]
    pub language: Locale,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_type_accepts_loose_spellings() {
        assert_eq!(DocumentType::try_from("Bank Statement".to_string()).unwrap(), DocumentType::BankStatement);
        assert_eq!(DocumentType::try_from("purchase-order".to_string()).unwrap(), DocumentType::PurchaseOrder);
        assert_eq!(DocumentType::try_from(" INVOICE ".to_string()).unwrap(), DocumentType::Invoice);
        assert!(DocumentType::try_from("memo".to_string()).is_err());
    }

    #[test]
    fn test_display_matches_serde_names() {
        for doc_type in DocumentType::ALL {
            let json = serde_json::to_string(&doc_type).unwrap();
            assert_eq!(json, format!("\"{}\"", doc_type));
        }
    }
}
