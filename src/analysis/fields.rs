//! Regex extraction of invoice-style fields from English and French text.

use chrono::{Duration, NaiveDate};
use regex::Regex;
use std::sync::LazyLock;

use super::classifier::contains_term;
use crate::models::{round_cents, ExtractedFields, LineItem, TaxLine};

// Two decimals are required so dates, quantities and tax numbers are not read as money.
static RE_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d{1,3}(?:[ \u{a0}\u{202f},.]\d{3})*[.,]\d{2}\b|\b\d+[.,]\d{2}\b").expect("amount regex")
});
static RE_ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b").expect("iso date regex"));
static RE_NUMERIC_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2})[/.](\d{1,2})[/.](\d{4})\b").expect("numeric date regex"));
static RE_MONTH_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b([a-zéû]{3,9})\.?\s+(\d{1,2})(?:st|nd|rd|th)?,?\s+(\d{4})\b").expect("month-first regex")
});
static RE_DAY_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})(?:er|st|nd|rd|th)?\s+([a-zéû]{3,9})\.?,?\s+(\d{4})\b").expect("day-first regex")
});
static RE_INVOICE_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:invoice|facture|inv)\s*(?:number|no\.?|num[ée]ro|n°|#|:)\s*[:#]?\s*([A-Za-z0-9][A-Za-z0-9\-/]*\d[A-Za-z0-9\-/]*)",
    )
    .expect("invoice number regex")
});
static RE_NET_TERMS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bnet\s+(\d{1,3})\b").expect("net terms regex"));
static RE_LEADING_QTY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+(?:[.,]\d+)?)\s*(?:x|×)?\s+(.+)$").expect("leading quantity regex"));
static RE_TRAILING_QTY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?)\s+(\d+(?:[.,]\d+)?)\s*(?:x|×|@)\s*$").expect("trailing quantity regex"));

const SUBTOTAL_LABELS: &[&str] = &["subtotal", "sub-total", "sub total", "sous-total", "sous total"];
const TOTAL_LABELS: &[&str] = &[
    "total",
    "amount due",
    "balance due",
    "montant dû",
    "solde dû",
    "total à payer",
    "montant total",
];
// (label, canonical kind); French names are folded into the federal/provincial English names.
const TAX_LABELS: &[(&str, &str)] = &[
    ("gst", "GST"),
    ("tps", "GST"),
    ("hst", "HST"),
    ("tvh", "HST"),
    ("pst", "PST"),
    ("qst", "QST"),
    ("tvq", "QST"),
];
const INVOICE_DATE_LABELS: &[&str] = &[
    "invoice date",
    "date of issue",
    "date de facture",
    "date de facturation",
    "date d'émission",
    "date:",
    "date :",
];
const DUE_DATE_LABELS: &[&str] = &[
    "due date",
    "payment due",
    "due by",
    "date d'échéance",
    "échéance",
    "payable avant",
    "payable au plus tard",
];
const VENDOR_LABELS: &[&str] = &["from", "vendor", "supplier", "sold by", "de", "fournisseur", "vendeur"];
const CUSTOMER_LABELS: &[&str] = &[
    "bill to",
    "billed to",
    "customer",
    "sold to",
    "facturé à",
    "facturer à",
    "client",
    "vendu à",
];

/// Pull structured fields out of raw document text.
pub fn extract(text: &str) -> ExtractedFields {
    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    let mut fields = ExtractedFields {
        currency: detect_currency(text),
        amounts: find_amounts(text),
        dates: find_dates(text),
        invoice_number: RE_INVOICE_NUMBER
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim_end_matches(['-', '/']).to_string()),
        vendor: labelled_value(&lines, VENDOR_LABELS).or_else(|| letterhead(&lines)),
        customer: labelled_value(&lines, CUSTOMER_LABELS),
        ..Default::default()
    };

    for line in &lines {
        let lower = line.to_lowercase();
        let amounts = find_amounts(line);
        let Some(&last) = amounts.last() else { continue };

        if has_label(&lower, SUBTOTAL_LABELS) {
            fields.subtotal.get_or_insert(last);
        } else if let Some(kind) = tax_kind(&lower) {
            if !fields.taxes.iter().any(|t| t.kind == kind) {
                fields.taxes.push(TaxLine { kind: kind.to_string(), amount: last });
            }
        } else if has_label(&lower, TOTAL_LABELS) {
            // Later total lines win: "Total" usually follows intermediate totals
            fields.total = Some(last);
        } else if let Some(item) = line_item(line, &amounts) {
            fields.line_items.push(item);
        }
    }

    if fields.total.is_none() {
        fields.total = fields.amounts.iter().copied().reduce(f64::max);
    }
    if fields.subtotal.is_none() && !fields.taxes.is_empty() {
        if let (Some(total), Some(tax)) = (fields.total, fields.tax_total()) {
            fields.subtotal = Some(round_cents(total - tax));
        }
    }

    fields.invoice_date = first_date_on_labelled_line(&lines, INVOICE_DATE_LABELS, DUE_DATE_LABELS).or_else(|| fields.dates.first().copied());
    fields.due_date = first_date_on_labelled_line(&lines, DUE_DATE_LABELS, &[]).or_else(|| {
        let days: i64 = RE_NET_TERMS.captures(text)?.get(1)?.as_str().parse().ok()?;
        fields.invoice_date.map(|d| d + Duration::days(days))
    });

    fields.confidence = score_confidence(&fields);
    fields
}

/// Share of the core invoice fields (number, date, total, vendor) that were found.
pub fn score_confidence(fields: &ExtractedFields) -> f64 {
    let found = [
        fields.invoice_number.is_some(),
        fields.invoice_date.is_some(),
        fields.total.is_some(),
        fields.vendor.is_some(),
    ]
    .iter()
    .filter(|found| **found)
    .count();
    found as f64 / 4.0
}

/// Parse `1,234.56`, `1 234,56`, `1.234,56` or `12.50` into a number.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let digits: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let decimal_pos = digits.rfind(['.', ','])?;
    if digits.len() - decimal_pos != 3 {
        return None;
    }
    let (whole, cents) = digits.split_at(decimal_pos);
    let whole: String = whole.chars().filter(char::is_ascii_digit).collect();
    format!("{}.{}", whole, &cents[1..]).parse().ok()
}

pub fn find_amounts(text: &str) -> Vec<f64> {
    RE_AMOUNT
        .find_iter(text)
        .filter_map(|m| parse_amount(m.as_str()))
        .collect()
}

pub fn find_dates(text: &str) -> Vec<NaiveDate> {
    let mut found: Vec<(usize, NaiveDate)> = Vec::new();

    for caps in RE_ISO_DATE.captures_iter(text) {
        if let Some(date) = ymd(&caps[1], &caps[2], &caps[3]) {
            found.push((caps.get(0).map_or(0, |m| m.start()), date));
        }
    }
    for caps in RE_NUMERIC_DATE.captures_iter(text) {
        let (first, second): (u32, u32) = match (caps[1].parse(), caps[2].parse()) {
            (Ok(a), Ok(b)) => (a, b),
            _ => continue,
        };
        // Day first unless that is impossible
        let (day, month) = if second > 12 && first <= 12 { (second, first) } else { (first, second) };
        if let Some(date) = caps[3].parse().ok().and_then(|y| NaiveDate::from_ymd_opt(y, month, day)) {
            found.push((caps.get(0).map_or(0, |m| m.start()), date));
        }
    }
    for caps in RE_MONTH_FIRST.captures_iter(text) {
        if let Some(date) = month_from_name(&caps[1]).and_then(|m| ymd(&caps[3], &m.to_string(), &caps[2])) {
            found.push((caps.get(0).map_or(0, |m| m.start()), date));
        }
    }
    for caps in RE_DAY_FIRST.captures_iter(text) {
        if let Some(date) = month_from_name(&caps[2]).and_then(|m| ymd(&caps[3], &m.to_string(), &caps[1])) {
            found.push((caps.get(0).map_or(0, |m| m.start()), date));
        }
    }

    found.sort_by_key(|(pos, _)| *pos);
    let mut dates = Vec::new();
    for (_, date) in found {
        if !dates.contains(&date) {
            dates.push(date);
        }
    }
    dates
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

fn month_from_name(name: &str) -> Option<u32> {
    let name = name.to_lowercase();
    let month = match name.as_str() {
        "january" | "jan" | "janvier" | "janv" => 1,
        "february" | "feb" | "février" | "fevrier" | "févr" | "fév" => 2,
        "march" | "mar" | "mars" => 3,
        "april" | "apr" | "avril" | "avr" => 4,
        "may" | "mai" => 5,
        "june" | "jun" | "juin" => 6,
        "july" | "jul" | "juillet" | "juil" => 7,
        "august" | "aug" | "août" | "aout" => 8,
        "september" | "sep" | "sept" | "septembre" => 9,
        "october" | "oct" | "octobre" => 10,
        "november" | "nov" | "novembre" => 11,
        "december" | "dec" | "décembre" | "decembre" | "déc" => 12,
        _ => return None,
    };
    Some(month)
}

fn detect_currency(text: &str) -> String {
    let lower = text.to_lowercase();
    if contains_term(&lower, "usd") || lower.contains("us$") {
        "USD".to_string()
    } else if contains_term(&lower, "eur") || text.contains('€') {
        "EUR".to_string()
    } else {
        "CAD".to_string()
    }
}

fn has_label(lower_line: &str, labels: &[&str]) -> bool {
    labels.iter().any(|label| contains_term(lower_line, label))
}

fn tax_kind(lower_line: &str) -> Option<&'static str> {
    TAX_LABELS
        .iter()
        .find(|(label, _)| contains_term(lower_line, label))
        .map(|(_, kind)| *kind)
}

/// First date on a line carrying one of `labels` and none of `exclude`.
/// "Due Date:" contains "date:", so invoice dates exclude the due labels.
fn first_date_on_labelled_line(lines: &[&str], labels: &[&str], exclude: &[&str]) -> Option<NaiveDate> {
    lines
        .iter()
        .filter(|line| {
            let lower = line.to_lowercase();
            labels.iter().any(|label| lower.contains(label)) && !exclude.iter().any(|label| lower.contains(label))
        })
        .find_map(|line| find_dates(line).into_iter().next())
}

/// Value of a `Label: value` line, or the next non-empty line when the label stands alone.
fn labelled_value(lines: &[&str], labels: &[&str]) -> Option<String> {
    for (index, line) in lines.iter().enumerate() {
        for label in labels {
            let Some(rest) = strip_label(line, label) else { continue };
            // "De" and "Client" are common words; demand the colon
            let Some(value) = rest.trim_start().strip_prefix(':').map(str::trim) else { continue };
            if !value.is_empty() {
                return Some(value.to_string());
            }
            return lines[index + 1..]
                .iter()
                .find(|next| !next.is_empty())
                .map(|next| next.to_string());
        }
    }
    None
}

/// Rest of `line` after a case-insensitive `label` prefix. Compares char by
/// char so offsets stay in `line`, whose lowercase form may differ in length.
fn strip_label<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let mut expected = label.chars().peekable();
    for (index, ch) in line.char_indices() {
        if expected.peek().is_none() {
            return Some(&line[index..]);
        }
        for lowered in ch.to_lowercase() {
            if expected.next() != Some(lowered) {
                return None;
            }
        }
    }
    expected.next().is_none().then_some("")
}

/// First line that reads like a company name rather than a document title.
fn letterhead(lines: &[&str]) -> Option<String> {
    const TITLES: &[&str] = &["invoice", "facture", "receipt", "reçu", "quote", "soumission", "devis", "statement", "relevé"];
    lines
        .iter()
        .filter(|line| !line.is_empty())
        .take(3)
        .find(|line| {
            let lower = line.to_lowercase();
            line.chars().filter(|c| c.is_alphabetic()).count() >= 3
                && !line.chars().any(|c| c.is_ascii_digit())
                && !TITLES.iter().any(|title| contains_term(&lower, title))
                && !lower.contains(':')
        })
        .map(|line| line.to_string())
}

fn line_item(line: &str, amounts: &[f64]) -> Option<LineItem> {
    let first_amount = RE_AMOUNT.find(line)?;
    let description = line[..first_amount.start()].trim().trim_end_matches('$').trim();
    if description.chars().filter(|c| c.is_alphabetic()).count() < 3 {
        return None;
    }
    let amount = *amounts.last()?;
    let unit_price = if amounts.len() >= 2 { amounts.get(amounts.len() - 2).copied() } else { None };

    let (description, quantity) = if let Some(caps) = RE_TRAILING_QTY.captures(description) {
        (caps[1].to_string(), caps[2].replace(',', ".").parse().ok())
    } else if let Some(caps) = RE_LEADING_QTY.captures(description) {
        (caps[2].to_string(), caps[1].replace(',', ".").parse().ok())
    } else {
        (description.to_string(), None)
    };

    Some(LineItem {
        description: description.trim().to_string(),
        quantity,
        unit_price,
        amount,
    })
}
