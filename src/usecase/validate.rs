use crate::domain::model::HistoryDocument;
use crate::domain::url_parser;
use crate::infrastructure::schema_validator::{validate_all_records, validate_history_document};
use anyhow::{anyhow, Result};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Findings that do not make a document invalid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub records: usize,
    /// URLs stored more than once. Allowed, but `add` would never create them.
    pub repeated_urls: Vec<String>,
    /// URLs that no longer parse as absolute URLs.
    pub unparsable_urls: Vec<String>,
}

/// Check a current-layout history document: schema first, then the id
/// invariant.
pub fn validate_history(value: &Value) -> Result<ValidationReport> {
    validate_history_document(value)?;
    validate_all_records(value)?;

    let doc: HistoryDocument = serde_json::from_value(value.clone())?;

    let mut id_owner: BTreeMap<&str, usize> = BTreeMap::new();
    for (idx, record) in doc.urls.iter().enumerate() {
        if let Some(first) = id_owner.insert(record.id.as_str(), idx) {
            return Err(anyhow!(
                "record id must be unique: {} (saw at urls[{first}] and urls[{idx}])",
                record.id
            ));
        }
    }

    let mut report = ValidationReport {
        records: doc.urls.len(),
        ..ValidationReport::default()
    };
    let mut seen_urls: BTreeSet<&str> = BTreeSet::new();
    let mut repeated: BTreeSet<&str> = BTreeSet::new();
    for record in &doc.urls {
        if !seen_urls.insert(record.url.as_str()) {
            repeated.insert(record.url.as_str());
        }
        if url_parser::validate(&record.url).is_err() {
            report.unparsable_urls.push(record.url.clone());
        }
    }
    report.repeated_urls = repeated.into_iter().map(String::from).collect();

    Ok(report)
}
