//! Editor fields back to a canonical URL string.

use crate::domain::error::RebuildError;
use crate::domain::model::ParamRow;
use std::collections::{HashMap, HashSet};
use url::form_urlencoded;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rebuilt {
    pub url: String,
    /// Keys that appeared on more than one non-blank row, in the order they
    /// were first repeated.
    pub duplicate_keys: Vec<String>,
}

impl Rebuilt {
    pub fn has_duplicates(&self) -> bool {
        !self.duplicate_keys.is_empty()
    }
}

/// Collapsed query parameters: one entry per key, ordered by first
/// occurrence, holding the value of the last occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollapsedParams {
    pub pairs: Vec<(String, String)>,
    pub duplicate_keys: Vec<String>,
}

pub fn collapse_params(rows: &[ParamRow]) -> CollapsedParams {
    let mut out = CollapsedParams::default();
    let mut position: HashMap<String, usize> = HashMap::new();
    let mut reported: HashSet<String> = HashSet::new();

    for row in rows {
        let key = row.key.trim();
        if key.is_empty() {
            continue;
        }
        let value = row.value.trim().to_string();

        match position.get(key).copied() {
            Some(idx) => {
                if reported.insert(key.to_string()) {
                    out.duplicate_keys.push(key.to_string());
                }
                out.pairs[idx].1 = value;
            }
            None => {
                position.insert(key.to_string(), out.pairs.len());
                out.pairs.push((key.to_string(), value));
            }
        }
    }

    out
}

/// Normalize `domain`/`path`, replace the query with the collapsed rows and
/// serialize. Pure; the caller decides what to do with a failure.
pub fn rebuild(domain: &str, path: &str, rows: &[ParamRow]) -> Result<Rebuilt, RebuildError> {
    let mut domain = domain.trim().to_string();
    let mut path = path.trim().to_string();

    if !path.is_empty() && !path.starts_with('/') {
        path.insert(0, '/');
    }
    if !domain.starts_with("http://") && !domain.starts_with("https://") {
        domain.insert_str(0, "https://");
    }

    let base = format!("{domain}{path}");
    let mut url = Url::parse(&base).map_err(|e| RebuildError::InvalidBase {
        base: base.clone(),
        reason: e.to_string(),
    })?;

    let collapsed = collapse_params(rows);
    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(collapsed.pairs.iter())
        .finish();

    if query.is_empty() {
        url.set_query(None);
    } else {
        url.set_query(Some(&query));
    }

    let mut final_url = String::from(url);
    if path == "/" && query.is_empty() && final_url.ends_with('/') {
        final_url.pop();
    }

    Ok(Rebuilt {
        url: final_url,
        duplicate_keys: collapsed.duplicate_keys,
    })
}
