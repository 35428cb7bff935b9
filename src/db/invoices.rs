use anyhow::Result;
use uuid::Uuid;

use crate::models::ExtractedInvoice;
use super::Database;

const INVOICE_FIELDS: &str = "id, document_id, user_id, vendor_name, customer_name, invoice_number, invoice_date, \
     due_date, subtotal, tax_amount, total_amount, currency, line_items, confidence_score, needs_review, created_at";

impl Database {
    pub async fn create_extracted_invoice(&self, invoice: &ExtractedInvoice) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO extracted_invoices (id, document_id, user_id, vendor_name, customer_name, invoice_number,
                                            invoice_date, due_date, subtotal, tax_amount, total_amount, currency,
                                            line_items, confidence_score, needs_review, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(invoice.id)
        .bind(invoice.document_id)
        .bind(invoice.user_id)
        .bind(&invoice.vendor_name)
        .bind(&invoice.customer_name)
        .bind(&invoice.invoice_number)
        .bind(invoice.invoice_date)
        .bind(invoice.due_date)
        .bind(invoice.subtotal)
        .bind(invoice.tax_amount)
        .bind(invoice.total_amount)
        .bind(&invoice.currency)
        .bind(&invoice.line_items)
        .bind(invoice.confidence_score)
        .bind(invoice.needs_review)
        .bind(invoice.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_invoice_by_document_id(&self, document_id: Uuid, user_id: Uuid) -> Result<Option<ExtractedInvoice>> {
        let invoice = sqlx::query_as::<_, ExtractedInvoice>(&format!(
            "SELECT {} FROM extracted_invoices WHERE document_id = $1 AND user_id = $2",
            INVOICE_FIELDS
        ))
        .bind(document_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(invoice)
    }
}
