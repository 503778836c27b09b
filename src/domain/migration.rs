//! Decoding of stored history blobs, current and legacy.
//!
//! Three layouts exist in the wild:
//! - `{"urls": [record, ...]}` (current)
//! - `["https://a.com", ...]` (first release, bare strings)
//! - `[{"url": "...", "label": "..."}, ...]` (labels, still no ids or tags)
//!
//! The two legacy arrays may also be mixed. Every element is decoded on its
//! own; anything without an id receives a fresh one, so decoding an already
//! migrated document changes nothing.

use crate::domain::model::{HistoryDocument, UrlRecord};
use crate::domain::traits::IdGenerator;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShapeError {
    #[error("stored history is not valid JSON: {0}")]
    NotJson(#[from] serde_json::Error),
    #[error("stored history has an unrecognised layout: {0}")]
    Unrecognized(&'static str),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Migration {
    pub document: HistoryDocument,
    /// Records that were given a fresh id.
    pub migrated: usize,
    /// Elements that could not be read as a record and were dropped.
    pub skipped: usize,
    /// The blob was a bare top-level array.
    pub legacy_layout: bool,
}

impl Migration {
    /// Whether the decoded document differs from what is stored.
    pub fn needs_write(&self) -> bool {
        self.migrated > 0 || self.legacy_layout
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredEntry {
    Bare(String),
    Object(LooseRecord),
}

#[derive(Deserialize)]
struct LooseRecord {
    #[serde(default)]
    id: Option<String>,
    url: String,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
}

/// Decode a single stored element. `None` when the element is neither a
/// string nor an object with a string `url`.
pub fn decode_entry(entry: &Value, ids: &dyn IdGenerator) -> Option<(UrlRecord, bool)> {
    let decoded = StoredEntry::deserialize(entry).ok()?;
    let (id, url, label, tags) = match decoded {
        StoredEntry::Bare(url) => (None, url, None, None),
        StoredEntry::Object(r) => (r.id, r.url, r.label, r.tags),
    };

    let (id, fresh) = match id.filter(|id| !id.is_empty()) {
        Some(id) => (id, false),
        None => (ids.new_id(), true),
    };

    Some((
        UrlRecord {
            id,
            url,
            label: label.unwrap_or_default(),
            tags: tags.unwrap_or_default(),
        },
        fresh,
    ))
}

pub fn migrate(raw: &Value, ids: &dyn IdGenerator) -> Result<Migration, ShapeError> {
    let (entries, legacy_layout) = match raw {
        Value::Null => return Ok(Migration::default()),
        Value::Array(items) => (items, true),
        Value::Object(obj) => match obj.get("urls") {
            Some(Value::Array(items)) => (items, false),
            Some(_) => return Err(ShapeError::Unrecognized("`urls` is not an array")),
            None => return Err(ShapeError::Unrecognized("object without `urls`")),
        },
        _ => return Err(ShapeError::Unrecognized("neither an array nor an object")),
    };

    let mut out = Migration {
        legacy_layout,
        ..Migration::default()
    };
    for entry in entries {
        match decode_entry(entry, ids) {
            Some((record, fresh)) => {
                if fresh {
                    out.migrated += 1;
                }
                out.document.urls.push(record);
            }
            None => out.skipped += 1,
        }
    }
    Ok(out)
}

pub fn migrate_str(raw: &str, ids: &dyn IdGenerator) -> Result<Migration, ShapeError> {
    let value: Value = serde_json::from_str(raw)?;
    migrate(&value, ids)
}
