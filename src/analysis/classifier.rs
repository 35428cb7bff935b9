//! Keyword-based document classification over English and French vocabularies.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::DocumentType;

/// Confidence assigned when no keyword matches at all.
pub const UNMATCHED_CONFIDENCE: f64 = 0.2;
const MAX_CONFIDENCE: f64 = 0.95;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Classification {
    pub document_type: DocumentType,
    pub confidence: f64,
    #[serde(default)]
    pub matched_keywords: Vec<String>,
}

impl Classification {
    /// Used when classification could not run; never triggers billing rows.
    pub fn unknown() -> Self {
        Self {
            document_type: DocumentType::Other,
            confidence: 0.0,
            matched_keywords: Vec::new(),
        }
    }
}

struct KeywordSet {
    document_type: DocumentType,
    keywords: &'static [&'static str],
}

// Order matters: on equal hit counts the earlier set wins.
const KEYWORD_SETS: &[KeywordSet] = &[
    KeywordSet {
        document_type: DocumentType::Invoice,
        keywords: &[
            "invoice",
            "facture",
            "invoice number",
            "numéro de facture",
            "bill to",
            "facturé à",
            "facturer à",
            "amount due",
            "montant dû",
            "due date",
            "date d'échéance",
        ],
    },
    KeywordSet {
        document_type: DocumentType::Receipt,
        keywords: &[
            "receipt",
            "reçu",
            "paid",
            "payé",
            "thank you for your purchase",
            "merci de votre achat",
            "merci pour votre achat",
            "cash",
            "comptant",
            "change due",
        ],
    },
    KeywordSet {
        document_type: DocumentType::Contract,
        keywords: &[
            "contract",
            "contrat",
            "agreement",
            "entente",
            "terms and conditions",
            "termes et conditions",
            "the parties agree",
            "les parties conviennent",
            "hereby",
            "par la présente",
        ],
    },
    KeywordSet {
        document_type: DocumentType::Quote,
        keywords: &[
            "quote",
            "quotation",
            "soumission",
            "devis",
            "estimate",
            "estimation",
            "valid until",
            "valide jusqu'au",
        ],
    },
    KeywordSet {
        document_type: DocumentType::BankStatement,
        keywords: &[
            "bank statement",
            "relevé bancaire",
            "relevé de compte",
            "account statement",
            "opening balance",
            "solde d'ouverture",
            "closing balance",
            "solde de fermeture",
            "deposits",
            "dépôts",
            "withdrawals",
            "retraits",
        ],
    },
    KeywordSet {
        document_type: DocumentType::TaxForm,
        keywords: &[
            "t4",
            "t4a",
            "t2",
            "t5",
            "tp-1",
            "relevé 1",
            "notice of assessment",
            "avis de cotisation",
            "canada revenue agency",
            "agence du revenu du canada",
            "revenu québec",
            "tax return",
            "déclaration de revenus",
        ],
    },
    KeywordSet {
        document_type: DocumentType::PurchaseOrder,
        keywords: &[
            "purchase order",
            "bon de commande",
            "po number",
            "p.o. number",
            "numéro de commande",
            "ship to",
            "expédier à",
        ],
    },
];

/// Classify `text` by counting distinct keyword hits per document type.
///
/// The type with the most hits wins with confidence `min(0.95, 0.5 + 0.15 * hits)`.
/// Text without any hit is `other` at [`UNMATCHED_CONFIDENCE`].
pub fn classify(text: &str) -> Classification {
    let haystack = text.to_lowercase();

    let mut best: Option<(DocumentType, Vec<String>)> = None;
    for set in KEYWORD_SETS {
        let hits: Vec<String> = set
            .keywords
            .iter()
            .filter(|keyword| contains_term(&haystack, keyword))
            .map(|keyword| keyword.to_string())
            .collect();

        let better = match &best {
            Some((_, best_hits)) => hits.len() > best_hits.len(),
            None => !hits.is_empty(),
        };
        if better {
            best = Some((set.document_type, hits));
        }
    }

    match best {
        Some((document_type, matched_keywords)) => Classification {
            document_type,
            confidence: confidence_for_hits(matched_keywords.len()),
            matched_keywords,
        },
        None => Classification {
            document_type: DocumentType::Other,
            confidence: UNMATCHED_CONFIDENCE,
            matched_keywords: Vec::new(),
        },
    }
}

pub fn confidence_for_hits(hits: usize) -> f64 {
    (0.5 + 0.15 * hits as f64).min(MAX_CONFIDENCE)
}

/// Whole-term match: `term` must not be glued to letters or digits on either side.
pub(crate) fn contains_term(haystack: &str, term: &str) -> bool {
    haystack.match_indices(term).any(|(start, matched)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + matched.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_invoice() {
        let result = classify("ACME Corp\nINVOICE\nInvoice Number: 1042\nBill To: Jane\nAmount due: $120.00");
        assert_eq!(result.document_type, DocumentType::Invoice);
        assert!(result.matched_keywords.contains(&"invoice number".to_string()));
        assert_eq!(result.confidence, 0.95);
    }

    #[test]
    fn test_french_invoice() {
        let result = classify("FACTURE\nFacturé à : Boulangerie Tremblay\nMontant dû : 1 234,56 $");
        assert_eq!(result.document_type, DocumentType::Invoice);
        assert_eq!(result.matched_keywords.len(), 3);
        assert!((result.confidence - 0.95).abs() < 1e-9);
    }

    #[test]
    fn test_french_receipt() {
        let result = classify("Dépanneur du Coin\nReçu\nMerci de votre achat!");
        assert_eq!(result.document_type, DocumentType::Receipt);
        assert!((result.confidence - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_quote_in_french() {
        let result = classify("Soumission no 88 - valide jusqu'au 30 juin 2024");
        assert_eq!(result.document_type, DocumentType::Quote);
    }

    #[test]
    fn test_tax_form_codes_need_word_boundaries() {
        assert_eq!(classify("Feuillet T4 - État de la rémunération").document_type, DocumentType::TaxForm);
        assert_eq!(classify("Part number T45 ordered").document_type, DocumentType::Other);
    }

    #[test]
    fn test_no_keywords_is_other() {
        let result = classify("Lorem ipsum dolor sit amet");
        assert_eq!(result.document_type, DocumentType::Other);
        assert_eq!(result.confidence, UNMATCHED_CONFIDENCE);
        assert!(result.matched_keywords.is_empty());
    }

    #[test]
    fn test_confidence_caps() {
        assert!((confidence_for_hits(1) - 0.65).abs() < 1e-9);
        assert_eq!(confidence_for_hits(10), 0.95);
    }
}
