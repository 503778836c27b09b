//! Async file IO for export and import files.

use crate::domain::model::HistoryDocument;
use anyhow::Result;
use serde_json::Value;
use tokio::fs;

pub const EXPORT_FILE_NAME: &str = "url-editor-data.json";

/// Read a user-supplied file as untyped JSON. Shape checks are the store's
/// job, so a file that parses is returned as-is.
pub async fn read_json_file(path: &str) -> Result<Value> {
    let raw = fs::read_to_string(path).await?;
    let value: Value = serde_json::from_str(&raw)?;
    Ok(value)
}

pub async fn read_import_file(path: &str) -> Result<String> {
    Ok(fs::read_to_string(path).await?)
}

pub async fn write_history_file(path: &str, doc: &HistoryDocument) -> Result<()> {
    let pretty = serde_json::to_string_pretty(doc)?;
    fs::write(path, pretty).await?;
    Ok(())
}
