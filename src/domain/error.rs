use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("not an absolute URL: {input:?} ({reason})")]
    Malformed { input: String, reason: String },
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RebuildError {
    #[error("cannot build a URL from {base:?}: {reason}")]
    InvalidBase { base: String, reason: String },
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("storage io error for key {key:?}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode history document: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("import file is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("import file has the wrong shape: {0}")]
    BadShape(String),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}
