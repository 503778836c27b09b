use anyhow::{anyhow, Result};
use jsonschema::{Draft, JSONSchema};
use once_cell::sync::Lazy;
use serde_json::Value;

static HISTORY_SCHEMA: Lazy<JSONSchema> = Lazy::new(|| {
    let schema_content = include_str!("../schemas/history_schema.json");
    let schema: Value = serde_json::from_str(schema_content).expect("Invalid history schema");
    JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(&schema)
        .expect("Failed to compile history schema")
});

static RECORD_SCHEMA: Lazy<JSONSchema> = Lazy::new(|| {
    let schema_content = include_str!("../schemas/record_schema.json");
    let schema: Value = serde_json::from_str(schema_content).expect("Invalid record schema");
    JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(&schema)
        .expect("Failed to compile record schema")
});

static IMPORT_SCHEMA: Lazy<JSONSchema> = Lazy::new(|| {
    let schema_content = include_str!("../schemas/import_schema.json");
    let schema: Value = serde_json::from_str(schema_content).expect("Invalid import schema");
    JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(&schema)
        .expect("Failed to compile import schema")
});

fn check(schema: &JSONSchema, value: &Value, what: &str) -> Result<()> {
    match schema.validate(value) {
        Ok(()) => Ok(()),
        Err(errors) => {
            let error_list: Vec<String> = errors.map(|e| e.to_string()).collect();
            Err(anyhow!("{what} validation failed:\n{}", error_list.join("\n")))
        }
    }
}

/// Validate the top level of a history document (`{"urls": [...]}`).
pub fn validate_history_document(doc: &Value) -> Result<()> {
    check(&HISTORY_SCHEMA, doc, "History document")
}

/// Validate one record in the current layout.
pub fn validate_record_item(record: &Value) -> Result<()> {
    check(&RECORD_SCHEMA, record, "Record")
}

/// Validate the outer shape of a user-supplied import file: an object with a
/// `urls` array. Items are decoded one by one by the store.
pub fn validate_import_document(doc: &Value) -> Result<()> {
    check(&IMPORT_SCHEMA, doc, "Import file")
}

/// Validate every record of a current-layout document.
pub fn validate_all_records(doc: &Value) -> Result<()> {
    if let Some(urls) = doc.get("urls").and_then(Value::as_array) {
        for (idx, record) in urls.iter().enumerate() {
            validate_record_item(record).map_err(|e| anyhow!("urls[{idx}]: {e}"))?;
        }
    }
    Ok(())
}
