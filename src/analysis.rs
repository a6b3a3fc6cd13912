/// Data-quality analysis of a contact table
///
/// Every metric here is built from the same two primitives:
/// 1. `Record::get` (absent keys resolve to the missing sentinel)
/// 2. `is_missing` (the single definition of an unfilled field)
///
/// and then reduced over the whole table by `analyze`.
use crate::models::{
    CompanyCount, EmailCategory, EmailCategoryBreakdown, FieldValue, Record, Summary, Table,
    COMPANY, EMAIL, FIRST_NAME, LAST_NAME, MOBILE_PHONE,
};
use std::collections::{HashMap, HashSet};

/// Placeholder strings (after trim + uppercase) that count as an empty field.
const MISSING_MARKERS: [&str; 3] = ["", "N/A", "NONE"];

/// Domains of free webmail providers.
const FREE_EMAIL_DOMAINS: [&str; 4] = ["gmail.com", "yahoo.com", "hotmail.com", "outlook.com"];

/// Number of companies reported in the summary.
pub const TOP_COMPANIES_LIMIT: usize = 5;

/// A row is severely incomplete when at least this many elementary checks fail.
pub const SEVERITY_THRESHOLD: usize = 3;

/// Returns true when the value is absent, blank, or a placeholder such as "N/A".
pub fn is_missing(value: &FieldValue) -> bool {
    match value.as_text() {
        None => true,
        Some(text) => {
            let normalized = text.trim().to_uppercase();
            MISSING_MARKERS.contains(&normalized.as_str())
        }
    }
}

/// Names of the phone-like columns of a table (any name containing "phone").
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhoneFields(Vec<String>);

impl PhoneFields {
    pub fn detect(table: &Table) -> Self {
        Self(
            table
                .columns()
                .into_iter()
                .filter(|name| name.to_lowercase().contains("phone"))
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ============ Row Classifiers ============

pub fn name_missing(row: &Record) -> bool {
    is_missing(row.get(FIRST_NAME)) || is_missing(row.get(LAST_NAME))
}

pub fn email_missing(row: &Record) -> bool {
    is_missing(row.get(EMAIL))
}

/// True only when every phone field of the row is missing.
///
/// With no phone columns at all, every row counts as phone-missing.
pub fn phone_missing(row: &Record, phones: &PhoneFields) -> bool {
    phones.names().iter().all(|name| is_missing(row.get(name)))
}

/// Counts the four elementary checks: first name, last name, email, all phones.
pub fn missing_fields_count(row: &Record, phones: &PhoneFields) -> usize {
    [
        is_missing(row.get(FIRST_NAME)),
        is_missing(row.get(LAST_NAME)),
        is_missing(row.get(EMAIL)),
        phone_missing(row, phones),
    ]
    .into_iter()
    .filter(|&failed| failed)
    .count()
}

pub fn severely_incomplete(row: &Record, phones: &PhoneFields) -> bool {
    missing_fields_count(row, phones) >= SEVERITY_THRESHOLD
}

// ============ Email Classification ============

/// Classifies an email value by its domain.
pub fn classify_email(value: &FieldValue) -> EmailCategory {
    let FieldValue::Text(raw) = value else {
        return EmailCategory::Unknown;
    };

    let Some((_, domain)) = raw.trim().split_once('@') else {
        return EmailCategory::Unknown;
    };

    let domain = domain.to_lowercase();
    if FREE_EMAIL_DOMAINS.contains(&domain.as_str()) {
        EmailCategory::Free
    } else if domain.contains('.') {
        EmailCategory::Business
    } else {
        EmailCategory::Unknown
    }
}

// ============ Deduplication ============

fn key_segment(value: &FieldValue) -> String {
    value
        .as_text()
        .map(|text| text.trim().to_uppercase())
        .unwrap_or_default()
}

/// Normalized identity of a contact: first name, last name, email and mobile phone.
///
/// Segments are kept apart, so separator characters inside a field never
/// make two different contacts collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey([String; 4]);

impl DedupKey {
    pub fn segments(&self) -> &[String; 4] {
        &self.0
    }
}

pub fn dedup_key(row: &Record) -> DedupKey {
    DedupKey([FIRST_NAME, LAST_NAME, EMAIL, MOBILE_PHONE].map(|field| key_segment(row.get(field))))
}

/// Number of rows whose key was already seen earlier in the table.
pub fn count_duplicates(table: &Table) -> usize {
    let mut seen = HashSet::with_capacity(table.len());
    table
        .records
        .iter()
        .filter(|row| !seen.insert(dedup_key(row)))
        .count()
}

// ============ Aggregates ============

/// Most frequent `Company` values, ties in first-seen order.
pub fn top_companies(table: &Table, limit: usize) -> Vec<CompanyCount> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<CompanyCount> = Vec::new();

    for row in &table.records {
        let value = row.get(COMPANY);
        if is_missing(value) {
            continue;
        }
        let name = company_name(value);
        match index.get(&name) {
            Some(&pos) => counts[pos].count += 1,
            None => {
                index.insert(name.clone(), counts.len());
                counts.push(CompanyCount { name, count: 1 });
            }
        }
    }

    // sort_by is stable, so equal counts keep first-seen order
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(limit);
    counts
}

fn company_name(value: &FieldValue) -> String {
    value
        .as_text()
        .map(|text| text.trim().to_string())
        .unwrap_or_default()
}

pub fn email_breakdown(table: &Table) -> EmailCategoryBreakdown {
    let mut breakdown = EmailCategoryBreakdown::default();
    for row in &table.records {
        breakdown.record(classify_email(row.get(EMAIL)));
    }
    breakdown
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn count_rows(table: &Table, predicate: impl Fn(&Record) -> bool) -> usize {
    table.records.iter().filter(|row| predicate(row)).count()
}

/// Computes the full quality summary of a table.
pub fn analyze(table: &Table) -> Summary {
    let phones = PhoneFields::detect(table);
    tracing::debug!(
        "Analyzing {} contact(s); phone fields: {:?}",
        table.len(),
        phones.names()
    );
    if phones.is_empty() && !table.is_empty() {
        tracing::warn!("No phone-like columns found; every contact counts as missing a phone");
    }

    let total_contacts = table.len();
    let missing_total: usize = table
        .records
        .iter()
        .map(|row| missing_fields_count(row, &phones))
        .sum();
    let avg_missing_fields = if total_contacts == 0 {
        0.0
    } else {
        round2(missing_total as f64 / total_contacts as f64)
    };

    Summary {
        total_contacts,
        missing_names: count_rows(table, name_missing),
        missing_emails: count_rows(table, email_missing),
        missing_phones: count_rows(table, |row| phone_missing(row, &phones)),
        duplicates: count_duplicates(table),
        top_companies: top_companies(table, TOP_COMPANIES_LIMIT),
        severely_incomplete_count: count_rows(table, |row| severely_incomplete(row, &phones)),
        email_category_breakdown: email_breakdown(table),
        avg_missing_fields,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> FieldValue {
        FieldValue::Text(s.to_string())
    }

    #[test]
    fn test_is_missing_markers() {
        assert!(is_missing(&FieldValue::Missing));
        assert!(is_missing(&text("")));
        assert!(is_missing(&text("   ")));
        assert!(is_missing(&text("n/a")));
        assert!(is_missing(&text(" None ")));
        assert!(!is_missing(&text("Alice")));
        assert!(!is_missing(&text("0")));
        assert!(!is_missing(&FieldValue::Number(0.into())));
    }

    #[test]
    fn test_phone_fields_case_insensitive() {
        let table = Table::new(vec![
            Record::new().with("Mobile Phone", "1").with("Name", "x"),
            Record::new().with("HOME PHONE", "2").with("Telephone", "3"),
        ]);
        let phones = PhoneFields::detect(&table);
        assert_eq!(phones.names(), &["Mobile Phone", "HOME PHONE", "Telephone"]);
    }

    #[test]
    fn test_phone_missing_requires_all_phones_missing() {
        let phones = PhoneFields::from_names(["Mobile Phone", "Home Phone"]);
        let one_phone = Record::new().with("Mobile Phone", "").with("Home Phone", "555");
        let none = Record::new().with("Mobile Phone", "N/A");
        assert!(!phone_missing(&one_phone, &phones));
        assert!(phone_missing(&none, &phones));
    }

    #[test]
    fn test_phone_missing_vacuous_without_phone_fields() {
        let phones = PhoneFields::default();
        let row = Record::new().with("First Name", "A");
        assert!(phone_missing(&row, &phones));
    }

    #[test]
    fn test_missing_fields_count_counts_names_separately() {
        let phones = PhoneFields::from_names(["Mobile Phone"]);
        let row = Record::new().with("E-mail Address", "a@b.com");
        assert_eq!(missing_fields_count(&row, &phones), 3);
        assert!(severely_incomplete(&row, &phones));

        let only_email = Record::new()
            .with("First Name", "A")
            .with("Last Name", "B")
            .with("Mobile Phone", "1");
        assert_eq!(missing_fields_count(&only_email, &phones), 1);
        assert!(!severely_incomplete(&only_email, &phones));
    }

    #[test]
    fn test_classify_email() {
        assert_eq!(classify_email(&text("a@gmail.com")), EmailCategory::Free);
        assert_eq!(classify_email(&text("a@Outlook.COM")), EmailCategory::Free);
        assert_eq!(classify_email(&text("a@acme.io")), EmailCategory::Business);
        assert_eq!(classify_email(&text("a@localhost")), EmailCategory::Unknown);
        assert_eq!(classify_email(&text("no-at-sign")), EmailCategory::Unknown);
        assert_eq!(classify_email(&FieldValue::Missing), EmailCategory::Unknown);
        assert_eq!(
            classify_email(&FieldValue::Number(42.into())),
            EmailCategory::Unknown
        );
    }

    #[test]
    fn test_dedup_key_absent_and_blank_phone_collide() {
        let absent = Record::new().with("First Name", " ann ").with("Last Name", "Lee");
        let blank = Record::new()
            .with("First Name", "ANN")
            .with("Last Name", "lee ")
            .with("Mobile Phone", "  ");
        assert_eq!(dedup_key(&absent), dedup_key(&blank));
    }

    #[test]
    fn test_top_companies_ties_keep_first_seen_order() {
        let table = Table::new(
            ["Beta", "Acme", "Beta", "Acme", "Zed", "N/A", "Solo"]
                .iter()
                .map(|c| Record::new().with("Company", *c))
                .collect(),
        );
        let top = top_companies(&table, 5);
        let names: Vec<_> = top.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Beta", "Acme", "Zed", "Solo"]);
        assert_eq!(top[0].count, 2);
    }

    #[test]
    fn test_analyze_empty_table() {
        let summary = analyze(&Table::default());
        assert_eq!(summary.total_contacts, 0);
        assert_eq!(summary.avg_missing_fields, 0.0);
        assert!(summary.top_companies.is_empty());
    }
}
