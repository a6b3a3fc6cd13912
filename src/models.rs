use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

// ============ Contact Table Models ============

/// Logical field names used by the quality analysis.
pub const FIRST_NAME: &str = "First Name";
pub const LAST_NAME: &str = "Last Name";
pub const EMAIL: &str = "E-mail Address";
pub const MOBILE_PHONE: &str = "Mobile Phone";
pub const COMPANY: &str = "Company";

/// A single cell of a contact row.
///
/// `Missing` covers both a key that is absent from the row and an explicit JSON `null`.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(serde_json::Number),
    Missing,
}

impl FieldValue {
    /// Returns true for the missing sentinel only (not for blank strings).
    pub fn is_absent(&self) -> bool {
        matches!(self, FieldValue::Missing)
    }

    /// String form of a present value, `None` for the sentinel.
    pub fn as_text(&self) -> Option<String> {
        match self {
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::Number(n) => Some(n.to_string()),
            FieldValue::Missing => None,
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => FieldValue::Missing,
            Value::String(s) => FieldValue::Text(s),
            Value::Number(n) => FieldValue::Number(n),
            Value::Bool(b) => FieldValue::Text(b.to_string()),
            other => FieldValue::Text(other.to_string()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Missing => Ok(()),
        }
    }
}

/// One contact: ordered field-name → value pairs with a free-form schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, FieldValue)>,
}

static MISSING: FieldValue = FieldValue::Missing;

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, replacing an existing value for the same key.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Looks up a field, returning the missing sentinel when the key is absent.
    pub fn get(&self, name: &str) -> &FieldValue {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
            .unwrap_or(&MISSING)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Text(s) => serializer.serialize_str(s),
            FieldValue::Number(n) => n.serialize(serializer),
            FieldValue::Missing => serializer.serialize_unit(),
        }
    }
}

/// Serializes as a JSON object, keeping field order.
impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<serde_json::Map<String, Value>> for Record {
    fn from(map: serde_json::Map<String, Value>) -> Self {
        Self {
            fields: map.into_iter().map(|(k, v)| (k, v.into())).collect(),
        }
    }
}

/// An ordered batch of records analyzed together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub records: Vec<Record>,
}

/// Raised when a request body does not have the row-array shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableShapeError(pub String);

impl fmt::Display for TableShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for TableShapeError {}

impl Table {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// Builds a table from a JSON array of row objects.
    pub fn from_json(value: Value) -> Result<Self, TableShapeError> {
        let Value::Array(rows) = value else {
            return Err(TableShapeError(format!(
                "expected a JSON array of row objects, got {}",
                json_kind(&value)
            )));
        };

        let records = rows
            .into_iter()
            .enumerate()
            .map(|(idx, row)| match row {
                Value::Object(map) => Ok(Record::from(map)),
                other => Err(TableShapeError(format!(
                    "row {} must be an object, got {}",
                    idx,
                    json_kind(&other)
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Union of field names across all records, in first-seen order.
    pub fn columns(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for record in &self.records {
            for name in record.field_names() {
                if !seen.contains(&name) {
                    seen.push(name);
                }
            }
        }
        seen
    }
}

impl Serialize for Table {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.records.len()))?;
        for record in &self.records {
            seq.serialize_element(record)?;
        }
        seq.end()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ============ Summary Models ============

/// Email domain category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailCategory {
    Free,
    Business,
    Unknown,
}

/// Count of contacts per email category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailCategoryBreakdown {
    /// Emails at a free webmail provider.
    pub free: usize,
    /// Emails at any other dotted domain.
    pub business: usize,
    /// Missing, non-text or malformed emails.
    pub unknown: usize,
}

impl EmailCategoryBreakdown {
    pub fn record(&mut self, category: EmailCategory) {
        match category {
            EmailCategory::Free => self.free += 1,
            EmailCategory::Business => self.business += 1,
            EmailCategory::Unknown => self.unknown += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.free + self.business + self.unknown
    }
}

/// A company name and how many contacts list it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyCount {
    /// Trimmed company name, case preserved.
    pub name: String,
    /// Number of contacts listing this company.
    pub count: usize,
}

/// Data-quality summary of one analyzed table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Number of rows in the table.
    pub total_contacts: usize,
    /// Rows whose first name or last name is missing.
    pub missing_names: usize,
    /// Rows whose email is missing.
    pub missing_emails: usize,
    /// Rows where every phone-like column is missing.
    pub missing_phones: usize,
    /// Rows whose dedup key already appeared earlier in the table.
    pub duplicates: usize,
    /// Most frequent companies, at most five, highest count first.
    pub top_companies: Vec<CompanyCount>,
    /// Rows failing at least three of the four elementary checks.
    pub severely_incomplete_count: usize,
    /// Email category counts; they sum to `total_contacts`.
    pub email_category_breakdown: EmailCategoryBreakdown,
    /// Mean failed elementary checks per row, rounded to two decimals.
    pub avg_missing_fields: f64,
}

// ============ API Response Models ============

/// Body returned by `POST /analyze` on success.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub status: String,
    pub summary: Summary,
}

impl AnalyzeResponse {
    pub fn success(summary: Summary) -> Self {
        Self {
            status: "success".to_string(),
            summary,
        }
    }
}
