use crate::errors::AppError;
use crate::models::{FieldValue, Record, Table, EMAIL, FIRST_NAME, LAST_NAME, MOBILE_PHONE};
use std::fmt;
use std::io::Read;
use std::str::FromStr;

// ============ CSV Import ============

/// Parses a CSV document with a header row into a table.
///
/// Blank lines are skipped. Short rows leave their trailing columns absent;
/// cells beyond the header are dropped.
pub fn table_from_csv<R: Read>(reader: R) -> Result<Table, csv::Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let mut records = Vec::new();

    for (idx, row) in rdr.records().enumerate() {
        let row = row?;
        if row.len() > headers.len() {
            tracing::debug!(
                "CSV row {} has {} cells for {} columns, extra cells dropped",
                idx + 1,
                row.len(),
                headers.len()
            );
        }
        let record = headers
            .iter()
            .zip(row.iter())
            .fold(Record::new(), |record, (name, cell)| record.with(name, cell));
        records.push(record);
    }

    Ok(Table::new(records))
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::BadRequest(format!("invalid CSV: {}", err))
    }
}

// ============ Export Formats ============

/// Target format of `POST /export/{format}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
    Vcard,
}

impl ExportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Json => "application/json",
            ExportFormat::Vcard => "text/vcard; charset=utf-8",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Vcard => "vcf",
        }
    }

    /// Serializes `table` in this format.
    pub fn render(&self, table: &Table) -> Result<String, AppError> {
        match self {
            ExportFormat::Csv => table_to_csv(table),
            ExportFormat::Json => serde_json::to_string_pretty(table)
                .map_err(|e| AppError::InternalError(format!("JSON export failed: {}", e))),
            ExportFormat::Vcard => Ok(table_to_vcards(table)),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "vcard" | "vcf" => Ok(ExportFormat::Vcard),
            other => Err(AppError::BadRequest(format!(
                "unsupported export format '{}', expected csv, json or vcard",
                other
            ))),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

// ============ CSV Export ============

/// Writes the table with the union of its columns as header. Absent cells are empty.
pub fn table_to_csv(table: &Table) -> Result<String, AppError> {
    let columns = table.columns();
    if columns.is_empty() {
        return Ok(String::new());
    }

    let write_err = |e: csv::Error| AppError::InternalError(format!("CSV export failed: {}", e));
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(&columns).map_err(write_err)?;
    for record in &table.records {
        wtr.write_record(columns.iter().map(|name| record.get(name).to_string()))
            .map_err(write_err)?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| AppError::InternalError(format!("CSV export failed: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| AppError::InternalError(format!("CSV export is not UTF-8: {}", e)))
}

// ============ vCard Export ============

const VCARD_NAME_FIELDS: [&str; 2] = ["Name", "FullName"];
const VCARD_PHONE_FIELDS: [&str; 3] = [MOBILE_PHONE, "Phone", "Phone Number"];
const VCARD_EMAIL_FIELDS: [&str; 3] = [EMAIL, "Email", "Email Address"];

fn first_present<'a>(record: &'a Record, names: &[&str]) -> Option<&'a FieldValue> {
    names
        .iter()
        .map(|name| record.get(name))
        .find(|value| !crate::analysis::is_missing(value))
}

fn display_name(record: &Record) -> String {
    if let Some(name) = first_present(record, &VCARD_NAME_FIELDS) {
        return name.to_string().trim().to_string();
    }
    [FIRST_NAME, LAST_NAME]
        .iter()
        .map(|name| record.get(name))
        .filter(|value| !crate::analysis::is_missing(value))
        .map(|value| value.to_string().trim().to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Escapes text for a vCard 3.0 property value.
fn escape_vcard(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ',' => out.push_str("\\,"),
            ';' => out.push_str("\\;"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            other => out.push(other),
        }
    }
    out
}

/// One vCard 3.0 entry. Phone and email lines are left out when missing.
pub fn record_to_vcard(record: &Record) -> String {
    let mut lines = vec![
        "BEGIN:VCARD".to_string(),
        "VERSION:3.0".to_string(),
        format!("FN:{}", escape_vcard(&display_name(record))),
    ];
    if let Some(phone) = first_present(record, &VCARD_PHONE_FIELDS) {
        lines.push(format!("TEL;TYPE=CELL:{}", escape_vcard(phone.to_string().trim())));
    }
    if let Some(email) = first_present(record, &VCARD_EMAIL_FIELDS) {
        lines.push(format!("EMAIL:{}", escape_vcard(email.to_string().trim())));
    }
    lines.push("END:VCARD".to_string());
    lines.join("\r\n")
}

pub fn table_to_vcards(table: &Table) -> String {
    let mut out = table
        .records
        .iter()
        .map(record_to_vcard)
        .collect::<Vec<_>>()
        .join("\r\n");
    if !out.is_empty() {
        out.push_str("\r\n");
    }
    out
}
