//! The persisted URL history.
//!
//! The store owns an in-memory [`HistoryDocument`] and writes the whole
//! document back to its [`KeyValueStore`] after every mutation. A failed write
//! rolls the in-memory document back, so memory and storage never diverge
//! because of an error.

use crate::domain::error::{ImportError, PersistenceError};
use crate::domain::migration::{decode_entry, migrate_str, Migration};
use crate::domain::model::{HistoryDocument, ListFilter, RecordField, UrlRecord};
use crate::domain::traits::{IdGenerator, KeyValueStore};
use crate::infrastructure::schema_validator::validate_import_document;
use crate::usecase::event::HistoryEvent;
use crate::usecase::stats::HistoryStats;
use serde_json::Value;
use std::collections::HashSet;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub const DEFAULT_STORAGE_KEY: &str = "urlHistory";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportMode {
    /// The imported document replaces the whole history.
    #[default]
    Replace,
    /// Imported records are appended unless their URL is already stored.
    Merge,
}

impl ImportMode {
    fn as_str(self) -> &'static str {
        match self {
            ImportMode::Replace => "replace",
            ImportMode::Merge => "merge",
        }
    }
}

/// Outcome of an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    /// Records taken from the input (after merge filtering).
    pub imported: usize,
    /// Elements of `urls` that were not URL records.
    pub skipped: usize,
}

pub struct HistoryStore<S: KeyValueStore> {
    storage: S,
    ids: Box<dyn IdGenerator>,
    key: String,
    doc: HistoryDocument,
    sink: Option<mpsc::UnboundedSender<HistoryEvent>>,
}

impl<S: KeyValueStore> HistoryStore<S> {
    pub fn load(storage: S, ids: Box<dyn IdGenerator>) -> Self {
        Self::load_with(storage, ids, DEFAULT_STORAGE_KEY, None)
    }

    /// Read, decode and migrate the stored document. Never fails: a missing,
    /// unreadable or unrecognised blob yields an empty history.
    pub fn load_with(
        storage: S,
        ids: Box<dyn IdGenerator>,
        key: &str,
        sink: Option<mpsc::UnboundedSender<HistoryEvent>>,
    ) -> Self {
        let raw = storage.get(key).unwrap_or_else(|e| {
            warn!(error = %e, key, "reading stored history failed, starting empty");
            None
        });

        let migration = match raw {
            None => Migration::default(),
            Some(raw) => migrate_str(&raw, ids.as_ref()).unwrap_or_else(|e| {
                warn!(error = %e, key, "stored history unreadable, starting empty");
                Migration::default()
            }),
        };

        let mut store = Self {
            storage,
            ids,
            key: key.to_string(),
            doc: HistoryDocument::default(),
            sink,
        };
        store.finish_load(migration);
        store
    }

    fn finish_load(&mut self, migration: Migration) {
        let needs_write = migration.needs_write();
        if migration.skipped > 0 {
            warn!(
                skipped = migration.skipped,
                "dropped stored entries that are not URL records"
            );
        }
        self.doc = migration.document;

        if needs_write {
            info!(
                migrated = migration.migrated,
                records = self.doc.urls.len(),
                "migrated legacy history"
            );
            self.emit(HistoryEvent::Migrated {
                migrated: migration.migrated,
                skipped: migration.skipped,
            });
            // Kept in memory either way; the next mutation writes it again.
            if let Err(e) = self.persist() {
                warn!(error = %e, "writing migrated history failed");
            }
        }

        self.emit(HistoryEvent::Loaded {
            records: self.doc.urls.len(),
        });
    }

    pub fn document(&self) -> &HistoryDocument {
        &self.doc
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn len(&self) -> usize {
        self.doc.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc.urls.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&UrlRecord> {
        self.doc.find(id)
    }

    pub fn stats(&self) -> HistoryStats {
        HistoryStats::of(&self.doc)
    }

    /// Append `url` unless a record with exactly this URL exists.
    pub fn add(&mut self, url: &str) -> Result<Option<UrlRecord>, PersistenceError> {
        if self.doc.contains_url(url) {
            debug!(url, "url already in history");
            self.emit(HistoryEvent::DuplicateRejected {
                url: url.to_string(),
            });
            return Ok(None);
        }

        let record = UrlRecord::new(self.ids.new_id(), url.to_string());
        let added = record.clone();
        self.mutate(move |doc| doc.urls.push(record))?;

        self.emit(HistoryEvent::RecordAdded {
            id: added.id.clone(),
            url: added.url.clone(),
        });
        Ok(Some(added))
    }

    /// Returns `false`, without writing, when no record has this id.
    pub fn update_field(&mut self, id: &str, field: RecordField) -> Result<bool, PersistenceError> {
        let Some(idx) = self.doc.urls.iter().position(|r| r.id == id) else {
            debug!(id, "update for unknown record ignored");
            return Ok(false);
        };

        let name = field.name();
        self.mutate(move |doc| field.apply(&mut doc.urls[idx]))?;

        self.emit(HistoryEvent::RecordUpdated {
            id: id.to_string(),
            field: name.to_string(),
        });
        Ok(true)
    }

    /// Remove the record with this id. Persists whether or not it existed.
    pub fn delete(&mut self, id: &str) -> Result<bool, PersistenceError> {
        let found = self.mutate(|doc| {
            let before = doc.urls.len();
            doc.urls.retain(|r| r.id != id);
            doc.urls.len() != before
        })?;

        self.emit(HistoryEvent::RecordDeleted {
            id: id.to_string(),
            found,
        });
        Ok(found)
    }

    /// Tag filter first, then the case-insensitive search; relative order kept.
    pub fn list(&self, filter: &ListFilter) -> Vec<&UrlRecord> {
        self.doc.urls.iter().filter(|r| filter.matches(r)).collect()
    }

    /// Every distinct tag, in first-seen order.
    pub fn tags(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.doc
            .urls
            .iter()
            .flat_map(|r| r.tags.iter())
            .map(String::as_str)
            .filter(|t| seen.insert(*t))
            .collect()
    }

    pub fn export_all(&self) -> HistoryDocument {
        self.emit(HistoryEvent::Exported {
            stats: self.stats(),
        });
        self.doc.clone()
    }

    pub fn import_str(&mut self, raw: &str, mode: ImportMode) -> Result<ImportSummary, ImportError> {
        let value: Value = serde_json::from_str(raw).map_err(ImportError::InvalidJson)?;
        self.import_all(&value, mode)
    }

    /// Import a whole document. The input must be an object with a `urls`
    /// array; anything else leaves the store untouched. Elements of `urls`
    /// that are not URL records are dropped and counted, as on load.
    pub fn import_all(
        &mut self,
        value: &Value,
        mode: ImportMode,
    ) -> Result<ImportSummary, ImportError> {
        validate_import_document(value).map_err(|e| ImportError::BadShape(e.to_string()))?;

        let entries = value
            .get("urls")
            .and_then(Value::as_array)
            .ok_or_else(|| ImportError::BadShape("`urls` must be an array".to_string()))?;

        let mut incoming = Vec::with_capacity(entries.len());
        let mut skipped = 0;
        for entry in entries {
            match decode_entry(entry, self.ids.as_ref()) {
                Some((record, _)) => incoming.push(record),
                None => {
                    debug!(%entry, "import element is not a URL record");
                    skipped += 1;
                }
            }
        }
        if skipped > 0 {
            warn!(skipped, "dropped import elements that are not URL records");
        }

        let imported = match mode {
            ImportMode::Replace => {
                let mut taken = HashSet::new();
                let records = self.with_unique_ids(incoming, &mut taken);
                let n = records.len();
                self.mutate(move |doc| doc.urls = records)?;
                n
            }
            ImportMode::Merge => {
                let mut urls: HashSet<String> =
                    self.doc.urls.iter().map(|r| r.url.clone()).collect();
                let fresh: Vec<UrlRecord> = incoming
                    .into_iter()
                    .filter(|r| urls.insert(r.url.clone()))
                    .collect();
                let mut taken: HashSet<String> =
                    self.doc.urls.iter().map(|r| r.id.clone()).collect();
                let records = self.with_unique_ids(fresh, &mut taken);
                let n = records.len();
                self.mutate(move |doc| doc.urls.extend(records))?;
                n
            }
        };

        info!(
            mode = mode.as_str(),
            imported,
            skipped,
            total = self.len(),
            "history imported"
        );
        self.emit(HistoryEvent::Imported {
            mode: mode.as_str().to_string(),
            imported,
            skipped,
            total: self.len(),
        });
        Ok(ImportSummary { imported, skipped })
    }

    /// Re-key records whose id is already in `taken`.
    fn with_unique_ids(&self, records: Vec<UrlRecord>, taken: &mut HashSet<String>) -> Vec<UrlRecord> {
        records
            .into_iter()
            .map(|mut r| {
                while !taken.insert(r.id.clone()) {
                    warn!(id = %r.id, url = %r.url, "duplicate record id re-keyed");
                    r.id = self.ids.new_id();
                }
                r
            })
            .collect()
    }

    fn mutate<T>(&mut self, f: impl FnOnce(&mut HistoryDocument) -> T) -> Result<T, PersistenceError> {
        let before = self.doc.clone();
        let out = f(&mut self.doc);
        if let Err(e) = self.persist() {
            self.doc = before;
            return Err(e);
        }
        Ok(out)
    }

    fn persist(&mut self) -> Result<(), PersistenceError> {
        let blob = serde_json::to_string(&self.doc)?;
        self.storage.set(&self.key, &blob)
    }

    fn emit(&self, ev: HistoryEvent) {
        if let Some(tx) = &self.sink {
            let _ = tx.send(ev);
        }
    }
}
