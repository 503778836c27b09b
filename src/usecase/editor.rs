//! Command handlers for the URL editor.
//!
//! The session holds the editable fields and the last good rebuilt URL. A UI
//! (the CLI here) calls the `on_*` handlers and renders the accessors; the
//! session never sees a presentation element.

use crate::domain::error::{PersistenceError, ValidationError};
use crate::domain::model::{ParamRow, UrlRecord};
use crate::domain::traits::KeyValueStore;
use crate::domain::url_parser::{parse, validate};
use crate::domain::url_rebuilder::{rebuild, Rebuilt};
use crate::usecase::history::HistoryStore;
use tracing::warn;

#[derive(Debug, Clone, Default)]
pub struct EditorSession {
    domain: String,
    path: String,
    rows: Vec<ParamRow>,
    rebuilt: Option<Rebuilt>,
    error: Option<ValidationError>,
}

impl EditorSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `raw` into the fields. On failure the fields are left alone and
    /// the error is kept for inline display.
    pub fn on_parse(&mut self, raw: &str) -> Result<(), ValidationError> {
        let handle = match validate(raw) {
            Ok(handle) => handle,
            Err(e) => {
                self.error = Some(e.clone());
                return Err(e);
            }
        };

        let parsed = parse(&handle);
        self.error = None;
        self.domain = parsed.editor_domain();
        self.path = parsed.path.clone();
        self.rows = parsed.rows();
        self.refresh();
        Ok(())
    }

    /// Put a stored URL back into the editor.
    pub fn load_url(&mut self, url: &str) -> Result<(), ValidationError> {
        self.on_parse(url)
    }

    pub fn on_field_edit(&mut self, domain: &str, path: &str) {
        self.domain = domain.to_string();
        self.path = path.to_string();
        self.refresh();
    }

    /// Returns `false` when there is no row at `index`.
    pub fn on_param_edit(&mut self, index: usize, key: &str, value: &str) -> bool {
        let Some(row) = self.rows.get_mut(index) else {
            return false;
        };
        row.key = key.to_string();
        row.value = value.to_string();
        self.refresh();
        true
    }

    pub fn add_param_row(&mut self) -> usize {
        self.rows.push(ParamRow::default());
        self.refresh();
        self.rows.len() - 1
    }

    pub fn remove_param_row(&mut self, index: usize) -> bool {
        if index >= self.rows.len() {
            return false;
        }
        self.rows.remove(index);
        self.refresh();
        true
    }

    /// Save the currently rebuilt URL. Nothing to save yields `Ok(None)`, as
    /// does a URL that is already stored.
    pub fn on_save<S: KeyValueStore>(
        &self,
        store: &mut HistoryStore<S>,
    ) -> Result<Option<UrlRecord>, PersistenceError> {
        match self.rebuilt_url().map(str::trim).filter(|u| !u.is_empty()) {
            Some(url) => store.add(url),
            None => Ok(None),
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn rows(&self) -> &[ParamRow] {
        &self.rows
    }

    pub fn error(&self) -> Option<&ValidationError> {
        self.error.as_ref()
    }

    pub fn rebuilt_url(&self) -> Option<&str> {
        self.rebuilt.as_ref().map(|r| r.url.as_str())
    }

    pub fn duplicate_warning(&self) -> Option<String> {
        self.rebuilt
            .as_ref()
            .filter(|r| r.has_duplicates())
            .map(|r| r.duplicate_keys.join(", "))
    }

    fn refresh(&mut self) {
        match rebuild(&self.domain, &self.path, &self.rows) {
            Ok(rebuilt) => self.rebuilt = Some(rebuilt),
            Err(e) => warn!(error = %e, "keeping previous URL"),
        }
    }
}
