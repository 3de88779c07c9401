use std::fs;
use std::path::Path;

use csv::{QuoteStyle, Terminator, WriterBuilder};
use log::info;
use serde_json::{Map, Value};

use crate::error::{Result, ScrapeError};
use crate::extractor::DetailRecord;
use crate::input_loader::ListingEntry;

/// A listing entry merged with its structured data.
pub type CompanyRecord = Map<String, Value>;

pub const CSV_COLUMNS: [&str; 21] = [
    "companyId",
    "companyName",
    "companyUrl",
    "@context",
    "@type",
    "name",
    "image",
    "telephone",
    "address.@type",
    "address.streetAddress",
    "address.addressLocality",
    "address.addressRegion",
    "address.postalCode",
    "address.addressCountry",
    "geo.@type",
    "geo.latitude",
    "geo.longitude",
    "description",
    "logo",
    "sameAs",
    "url",
];

/// Entry fields first, then detail fields. A detail key that collides with
/// an entry field replaces its value and keeps its position.
pub fn merge_record(entry: &ListingEntry, detail: Option<&DetailRecord>) -> CompanyRecord {
    let mut record = Map::new();
    record.insert("companyId".to_string(), Value::String(entry.id.clone()));
    record.insert("companyName".to_string(), Value::String(entry.name.clone()));
    record.insert("companyUrl".to_string(), Value::String(entry.url.clone()));
    if let Some(detail) = detail {
        for (key, value) in detail {
            record.insert(key.clone(), value.clone());
        }
    }
    record
}

pub fn to_json_string(records: &[CompanyRecord]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

pub fn to_csv_string(records: &[CompanyRecord]) -> Result<String> {
    let mut wtr = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::CRLF)
        .from_writer(Vec::new());

    wtr.write_record(CSV_COLUMNS)?;
    for record in records {
        wtr.write_record(CSV_COLUMNS.iter().map(|column| csv_cell(record, column)))?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| ScrapeError::Csv(e.into_error().into()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub fn write_json(path: &Path, records: &[CompanyRecord]) -> Result<()> {
    write_output(path, &to_json_string(records)?)?;
    info!("Wrote {} records to {:?}", records.len(), path);
    Ok(())
}

pub fn write_csv(path: &Path, records: &[CompanyRecord]) -> Result<()> {
    write_output(path, &to_csv_string(records)?)?;
    info!("Wrote {} rows to {:?}", records.len(), path);
    Ok(())
}

fn write_output(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| ScrapeError::io(parent, e))?;
        }
    }
    fs::write(path, contents).map_err(|e| ScrapeError::io(path, e))
}

/// Walks a dotted column path into nested objects.
fn lookup<'a>(record: &'a CompanyRecord, column: &str) -> Option<&'a Value> {
    if let Some(value) = record.get(column) {
        return Some(value);
    }
    let mut parts = column.split('.');
    let mut current = record.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

fn csv_cell(record: &CompanyRecord, column: &str) -> String {
    lookup(record, column).map(render_value).unwrap_or_default()
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(_) | Value::Number(_) => value.to_string(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Object(_) | Value::Array(_) => item.to_string(),
                scalar => render_value(scalar),
            })
            .collect::<Vec<_>>()
            .join("; "),
        Value::Object(_) => value.to_string(),
    }
}
