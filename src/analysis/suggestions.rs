//! Follow-up actions proposed after a document is processed.

use crate::models::{DocumentType, ExtractedFields, Locale, Suggestion, SuggestionPriority};

pub fn generate(
    document_type: DocumentType,
    fields: &ExtractedFields,
    needs_review: bool,
    locale: Locale,
) -> Vec<Suggestion> {
    let mut suggestions = Vec::new();
    let mut push = |kind: &str, priority: SuggestionPriority, en: String, fr: String| {
        suggestions.push(Suggestion {
            kind: kind.to_string(),
            message: locale.pick(&en, &fr).to_string(),
            priority,
        });
    };

    if needs_review && document_type.is_billing() {
        push(
            "review_extraction",
            SuggestionPriority::High,
            "Some extracted values have low confidence. Review them before filing.".to_string(),
            "Certaines valeurs extraites sont incertaines. Vérifiez-les avant de classer le document.".to_string(),
        );
    }

    match document_type {
        DocumentType::Invoice => {
            if let Some(due) = fields.due_date {
                let amount = fields
                    .total
                    .map(|t| format_amount(t, &fields.currency, locale))
                    .unwrap_or_default();
                push(
                    "schedule_payment",
                    SuggestionPriority::High,
                    format!("Schedule payment {} before {}.", amount, due).replace("  ", " "),
                    format!("Planifiez le paiement {} avant le {}.", amount, due).replace("  ", " "),
                );
            }
            if fields.invoice_number.is_none() {
                push(
                    "request_invoice_number",
                    SuggestionPriority::Normal,
                    "No invoice number found. Ask the vendor for one to keep your records complete.".to_string(),
                    "Aucun numéro de facture trouvé. Demandez-le au fournisseur pour compléter vos dossiers.".to_string(),
                );
            }
            if fields.total.is_none() {
                push(
                    "confirm_total",
                    SuggestionPriority::Normal,
                    "The invoice total could not be read. Enter it manually.".to_string(),
                    "Le total de la facture n'a pas pu être lu. Saisissez-le manuellement.".to_string(),
                );
            }
            record_sales_tax(fields, locale, &mut push);
        }
        DocumentType::Receipt => {
            push(
                "categorize_expense",
                SuggestionPriority::Normal,
                "Categorize this expense for your bookkeeping.".to_string(),
                "Catégorisez cette dépense dans votre comptabilité.".to_string(),
            );
            record_sales_tax(fields, locale, &mut push);
        }
        DocumentType::Contract => {
            push(
                "file_contract",
                SuggestionPriority::Normal,
                "File the signed contract with the client or project it belongs to.".to_string(),
                "Classez le contrat signé avec le client ou le projet concerné.".to_string(),
            );
            if let Some(last) = fields.dates.iter().max() {
                push(
                    "note_renewal",
                    SuggestionPriority::Normal,
                    format!("Add a reminder for the renewal or end date ({}).", last),
                    format!("Ajoutez un rappel pour la date de renouvellement ou de fin ({}).", last),
                );
            }
        }
        DocumentType::Quote => push(
            "compare_quote",
            SuggestionPriority::Normal,
            "Compare this quote with other suppliers before accepting it.".to_string(),
            "Comparez cette soumission avec d'autres fournisseurs avant de l'accepter.".to_string(),
        ),
        DocumentType::BankStatement => push(
            "reconcile_statement",
            SuggestionPriority::Normal,
            "Reconcile this statement with your recorded transactions.".to_string(),
            "Faites le rapprochement de ce relevé avec vos transactions.".to_string(),
        ),
        DocumentType::TaxForm => push(
            "share_with_accountant",
            SuggestionPriority::High,
            "Share this tax document with your accountant.".to_string(),
            "Transmettez ce document fiscal à votre comptable.".to_string(),
        ),
        DocumentType::PurchaseOrder => push(
            "match_purchase_order",
            SuggestionPriority::Normal,
            "Match this purchase order with the invoice when it arrives.".to_string(),
            "Associez ce bon de commande à la facture lorsqu'elle arrivera.".to_string(),
        ),
        DocumentType::Other => push(
            "classify_manually",
            SuggestionPriority::Low,
            "We could not recognise this document. Choose its type manually.".to_string(),
            "Nous n'avons pas reconnu ce document. Choisissez son type manuellement.".to_string(),
        ),
    }

    suggestions.sort_by(|a, b| b.priority.cmp(&a.priority));
    suggestions
}

fn record_sales_tax<F>(fields: &ExtractedFields, locale: Locale, push: &mut F)
where
    F: FnMut(&str, SuggestionPriority, String, String),
{
    let Some(tax) = fields.tax_total() else { return };
    let kinds: Vec<&str> = fields.taxes.iter().map(|t| t.kind.as_str()).collect();
    let amount = format_amount(tax, &fields.currency, locale);
    push(
        "record_sales_tax",
        SuggestionPriority::Normal,
        format!("Record {} in sales tax ({}) to claim input tax credits.", amount, kinds.join(", ")),
        format!(
            "Inscrivez {} de taxes ({}) pour réclamer les crédits de taxe sur les intrants.",
            amount,
            kinds.join(", ")
        ),
    );
}

/// `$1,234.56` in English, `1 234,56 $` in French.
pub fn format_amount(value: f64, currency: &str, locale: Locale) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let separator = match locale {
        Locale::En => ',',
        Locale::Fr => ' ',
    };

    let mut grouped = String::new();
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(digit);
    }
    let sign = if value < 0.0 { "-" } else { "" };
    let symbol = match currency {
        "EUR" => "€",
        "USD" => "US$",
        _ => "$",
    };

    match locale {
        Locale::En => format!("{}{}{}.{:02}", sign, symbol, grouped, cents % 100),
        Locale::Fr => format!("{}{},{:02} {}", sign, grouped, cents % 100, symbol),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaxLine;
    use chrono::NaiveDate;

    fn invoice_fields() -> ExtractedFields {
        ExtractedFields {
            invoice_number: Some("F-1042".to_string()),
            total: Some(1419.44),
            due_date: NaiveDate::from_ymd_opt(2024, 4, 14),
            taxes: vec![
                TaxLine { kind: "GST".to_string(), amount: 61.73 },
                TaxLine { kind: "QST".to_string(), amount: 123.15 },
            ],
            ..Default::default()
        }
    }

    fn kinds(suggestions: &[Suggestion]) -> Vec<&str> {
        suggestions.iter().map(|s| s.kind.as_str()).collect()
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(1234.56, "CAD", Locale::En), "$1,234.56");
        assert_eq!(format_amount(1234.56, "CAD", Locale::Fr), "1 234,56 $");
        assert_eq!(format_amount(5.0, "CAD", Locale::En), "$5.00");
        assert_eq!(format_amount(1_000_000.0, "EUR", Locale::Fr), "1 000 000,00 €");
    }

    #[test]
    fn test_invoice_suggestions_in_french() {
        let suggestions = generate(DocumentType::Invoice, &invoice_fields(), false, Locale::Fr);

        assert_eq!(kinds(&suggestions), vec!["schedule_payment", "record_sales_tax"]);
        assert_eq!(
            suggestions[0].message,
            "Planifiez le paiement 1 419,44 $ avant le 2024-04-14."
        );
        assert!(suggestions[1].message.contains("184,88 $"));
        assert!(suggestions[1].message.contains("GST, QST"));
    }

    #[test]
    fn test_review_comes_first_for_low_confidence_invoices() {
        let fields = ExtractedFields::default();
        let suggestions = generate(DocumentType::Invoice, &fields, true, Locale::En);

        assert_eq!(
            kinds(&suggestions),
            vec!["review_extraction", "request_invoice_number", "confirm_total"]
        );
    }

    #[test]
    fn test_review_not_suggested_for_contracts() {
        let suggestions = generate(DocumentType::Contract, &ExtractedFields::default(), true, Locale::En);
        assert_eq!(kinds(&suggestions), vec!["file_contract"]);
    }

    #[test]
    fn test_other_documents() {
        let suggestions = generate(DocumentType::Other, &ExtractedFields::default(), false, Locale::En);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].priority, SuggestionPriority::Low);
    }
}
