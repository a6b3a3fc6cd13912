/// Contact list cleaning
///
/// Walks a table once and sorts rows into four buckets:
/// - invalid: an email is present but has no `@`
/// - incomplete: first or last name is missing (kept, never deduplicated)
/// - duplicates: same formatted name, email and phone as an earlier row (dropped)
/// - similar: same formatted name as an earlier row but another phone or email (kept)
///
/// Cleaned rows keep their original field values; formatting only feeds the
/// comparisons.
use crate::analysis::is_missing;
use crate::models::{Record, Table, EMAIL, FIRST_NAME, LAST_NAME, MOBILE_PHONE};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Placeholder used for unfilled identity fields.
pub const NOT_AVAILABLE: &str = "N/A";

/// Short column names accepted when the canonical column is missing.
const FIRST_NAME_ALIAS: &str = "fn";
const LAST_NAME_ALIAS: &str = "ln";
const EMAIL_ALIAS: &str = "email";
const PHONE_ALIAS: &str = "phone";

// ============ Models ============

/// Why a contact was flagged as similar to an earlier one with the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimilarityReason {
    #[serde(rename = "Different phone and email")]
    DifferentPhoneAndEmail,
    #[serde(rename = "Different phone")]
    DifferentPhone,
    #[serde(rename = "Different email")]
    DifferentEmail,
}

/// A contact row with the flags raised while cleaning it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlaggedContact {
    #[serde(flatten)]
    pub record: Record,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_invalid: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_incomplete: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_duplicate: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_similar: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity_reason: Option<SimilarityReason>,
}

impl FlaggedContact {
    fn new(record: Record) -> Self {
        Self {
            record,
            is_invalid: false,
            is_incomplete: false,
            is_duplicate: false,
            is_similar: false,
            similarity_reason: None,
        }
    }
}

/// Outcome of one cleaning pass. Buckets may overlap (a row can be both
/// invalid and incomplete).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CleanReport {
    /// Every row except duplicates, in input order.
    pub cleaned: Vec<FlaggedContact>,
    pub duplicates: Vec<FlaggedContact>,
    pub invalid: Vec<FlaggedContact>,
    pub incomplete: Vec<FlaggedContact>,
    pub similar: Vec<FlaggedContact>,
}

/// Bucket sizes of a `CleanReport`, for logs and the HTTP summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanCounts {
    pub cleaned: usize,
    pub duplicates: usize,
    pub invalid: usize,
    pub incomplete: usize,
    pub similar: usize,
}

impl CleanReport {
    pub fn counts(&self) -> CleanCounts {
        CleanCounts {
            cleaned: self.cleaned.len(),
            duplicates: self.duplicates.len(),
            invalid: self.invalid.len(),
            incomplete: self.incomplete.len(),
            similar: self.similar.len(),
        }
    }
}

// ============ Formatting ============

/// Capitalizes the first character and lowercases the rest.
pub fn format_name(name: &str) -> String {
    if name == NOT_AVAILABLE {
        return name.to_string();
    }
    let mut chars = name.trim().chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    let mut formatted: String = first.to_uppercase().collect();
    formatted.push_str(&chars.as_str().to_lowercase());
    formatted
}

pub fn format_email(email: &str) -> String {
    if email == NOT_AVAILABLE {
        return email.to_string();
    }
    email.trim().to_lowercase()
}

/// Formats ten-digit numbers as `(xxx) xxx-xxxx`; anything else is returned trimmed.
pub fn format_phone(phone: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() == 10 {
        format!("({}) {}-{}", &digits[..3], &digits[3..6], &digits[6..])
    } else {
        phone.trim().to_string()
    }
}

/// First usable value among the canonical column and its alias, or "N/A".
fn field_or_placeholder(row: &Record, canonical: &str, alias: &str) -> String {
    [canonical, alias]
        .iter()
        .map(|name| row.get(name))
        .find(|value| !is_missing(value))
        .and_then(|value| value.as_text())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Formatted identity fields of one row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Identity {
    first_name: String,
    last_name: String,
    email: String,
    phone: String,
}

impl Identity {
    fn of(row: &Record) -> Self {
        Self {
            first_name: format_name(&field_or_placeholder(row, FIRST_NAME, FIRST_NAME_ALIAS)),
            last_name: format_name(&field_or_placeholder(row, LAST_NAME, LAST_NAME_ALIAS)),
            email: format_email(&field_or_placeholder(row, EMAIL, EMAIL_ALIAS)),
            phone: format_phone(&field_or_placeholder(row, MOBILE_PHONE, PHONE_ALIAS)),
        }
    }

    fn email_is_malformed(&self) -> bool {
        self.email != NOT_AVAILABLE && !self.email.contains('@')
    }

    fn name_is_incomplete(&self) -> bool {
        self.first_name == NOT_AVAILABLE || self.last_name == NOT_AVAILABLE
    }

    fn name_key(&self) -> (String, String) {
        (self.first_name.clone(), self.last_name.clone())
    }

    fn similarity_to(&self, earlier: &Identity) -> Option<SimilarityReason> {
        match (self.phone != earlier.phone, self.email != earlier.email) {
            (true, true) => Some(SimilarityReason::DifferentPhoneAndEmail),
            (true, false) => Some(SimilarityReason::DifferentPhone),
            (false, true) => Some(SimilarityReason::DifferentEmail),
            (false, false) => None,
        }
    }
}

// ============ Cleaning ============

/// Flags every row of `table` and collects the buckets.
pub fn clean_contacts(table: &Table) -> CleanReport {
    let mut seen: HashSet<Identity> = HashSet::with_capacity(table.len());
    let mut first_by_name: HashMap<(String, String), Identity> = HashMap::new();
    let mut report = CleanReport::default();

    for row in &table.records {
        let identity = Identity::of(row);
        let mut contact = FlaggedContact::new(row.clone());
        contact.is_invalid = identity.email_is_malformed();

        if identity.name_is_incomplete() {
            contact.is_incomplete = true;
        } else if seen.contains(&identity) {
            contact.is_duplicate = true;
        } else {
            match first_by_name.get(&identity.name_key()) {
                Some(earlier) => {
                    contact.similarity_reason = identity.similarity_to(earlier);
                    contact.is_similar = contact.similarity_reason.is_some();
                }
                None => {
                    first_by_name.insert(identity.name_key(), identity.clone());
                }
            }
            seen.insert(identity);
        }

        if contact.is_invalid {
            report.invalid.push(contact.clone());
        }
        if contact.is_incomplete {
            report.incomplete.push(contact.clone());
        }
        if contact.is_similar {
            report.similar.push(contact.clone());
        }
        if contact.is_duplicate {
            report.duplicates.push(contact);
        } else {
            report.cleaned.push(contact);
        }
    }

    let counts = report.counts();
    tracing::debug!(
        "Cleaned {} contact(s): kept={} duplicates={} invalid={} incomplete={} similar={}",
        table.len(),
        counts.cleaned,
        counts.duplicates,
        counts.invalid,
        counts.incomplete,
        counts.similar
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(first: &str, last: &str, email: &str, phone: &str) -> Record {
        Record::new()
            .with(FIRST_NAME, first)
            .with(LAST_NAME, last)
            .with(EMAIL, email)
            .with(MOBILE_PHONE, phone)
    }

    #[test]
    fn test_format_name() {
        assert_eq!(format_name("aNNA"), "Anna");
        assert_eq!(format_name(" bob "), "Bob");
        assert_eq!(format_name("N/A"), "N/A");
        assert_eq!(format_name(""), "");
    }

    #[test]
    fn test_format_phone() {
        assert_eq!(format_phone("555-123-4567"), "(555) 123-4567");
        assert_eq!(format_phone("5551234567"), "(555) 123-4567");
        assert_eq!(format_phone("+1 555 123 4567"), "+1 555 123 4567");
        assert_eq!(format_phone("N/A"), "N/A");
    }

    #[test]
    fn test_format_email() {
        assert_eq!(format_email("  Ann@Acme.COM "), "ann@acme.com");
        assert_eq!(format_email("N/A"), "N/A");
    }

    #[test]
    fn test_duplicate_after_formatting_is_dropped() {
        let table = Table::new(vec![
            contact("ann", "lee", "Ann@Acme.com", "555-123-4567"),
            contact("ANN", "LEE", "ann@acme.com ", "(555) 123 4567"),
        ]);
        let report = clean_contacts(&table);

        assert_eq!(report.cleaned.len(), 1);
        assert_eq!(report.duplicates.len(), 1);
        assert!(report.duplicates[0].is_duplicate);
        assert!(report.similar.is_empty());
    }

    #[test]
    fn test_aliases_fill_missing_columns() {
        let row = Record::new()
            .with("fn", "ann")
            .with("ln", "lee")
            .with("email", "ann@x.com")
            .with("phone", "1");
        let report = clean_contacts(&Table::new(vec![row.clone(), row]));
        assert_eq!(report.duplicates.len(), 1);
        assert!(report.incomplete.is_empty());
    }

    #[test]
    fn test_first_contact_with_name_is_the_reference() {
        let table = Table::new(vec![
            contact("Ann", "Lee", "a@x.com", "1"),
            contact("Ann", "Lee", "b@x.com", "1"),
            contact("Ann", "Lee", "a@x.com", "2"),
        ]);
        let report = clean_contacts(&table);

        assert_eq!(report.similar.len(), 2);
        assert_eq!(
            report.similar[0].similarity_reason,
            Some(SimilarityReason::DifferentEmail)
        );
        assert_eq!(
            report.similar[1].similarity_reason,
            Some(SimilarityReason::DifferentPhone)
        );
        assert_eq!(report.cleaned.len(), 3);
    }

    #[test]
    fn test_incomplete_rows_skip_duplicate_check() {
        let row = contact("", "Lee", "a@x.com", "1");
        let report = clean_contacts(&Table::new(vec![row.clone(), row]));

        assert_eq!(report.incomplete.len(), 2);
        assert!(report.duplicates.is_empty());
        assert_eq!(report.cleaned.len(), 2);
    }

    #[test]
    fn test_invalid_duplicate_lands_in_both_buckets() {
        let row = contact("Ann", "Lee", "not-an-email", "1");
        let report = clean_contacts(&Table::new(vec![row.clone(), row]));

        assert_eq!(report.invalid.len(), 2);
        assert_eq!(report.duplicates.len(), 1);
        assert!(report.invalid[1].is_duplicate);
        assert_eq!(report.cleaned.len(), 1);
    }

    #[test]
    fn test_flags_serialize_next_to_original_fields() {
        let table = Table::new(vec![
            contact("Ann", "Lee", "a@x.com", "1"),
            contact("Ann", "Lee", "a@x.com", "2"),
        ]);
        let report = clean_contacts(&table);
        let json = serde_json::to_value(&report.similar[0]).unwrap();

        assert_eq!(json["First Name"], "Ann");
        assert_eq!(json["Mobile Phone"], "2");
        assert_eq!(json["isSimilar"], true);
        assert_eq!(json["similarityReason"], "Different phone");
        assert!(json.get("isDuplicate").is_none());
    }
}
