//! Raw text to structured URL.
//!
//! Parsing follows the WHATWG URL standard through the `url` crate; no scheme
//! is inferred here, so `example.com` is rejected.

use crate::domain::error::ValidationError;
use crate::domain::model::ParsedUrl;
use url::Url;

/// A URL that passed [`validate`]. Only obtainable through validation, so
/// [`parse`] never fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedUrl(Url);

impl ValidatedUrl {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

pub fn validate(input: &str) -> Result<ValidatedUrl, ValidationError> {
    let trimmed = input.trim();
    Url::parse(trimmed)
        .map(ValidatedUrl)
        .map_err(|e| ValidationError::Malformed {
            input: trimmed.to_string(),
            reason: e.to_string(),
        })
}

pub fn parse(handle: &ValidatedUrl) -> ParsedUrl {
    let url = &handle.0;
    let path = url.path();
    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };

    ParsedUrl {
        scheme: url.scheme().to_string(),
        domain: url.host_str().unwrap_or_default().to_string(),
        port: url.port(),
        path,
        params: url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect(),
    }
}
