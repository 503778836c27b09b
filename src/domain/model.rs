use serde::{Deserialize, Serialize};

/// One persisted history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlRecord {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl UrlRecord {
    pub fn new(id: String, url: String) -> Self {
        Self {
            id,
            url,
            label: String::new(),
            tags: Vec::new(),
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Text the free-form search runs against: every field value, tags joined by `,`.
    pub fn search_haystack(&self) -> String {
        format!(
            "{} {} {} {}",
            self.id,
            self.url,
            self.label,
            self.tags.join(",")
        )
    }
}

/// The persisted unit, current shape only. Legacy shapes are handled by
/// [`crate::domain::migration`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryDocument {
    pub urls: Vec<UrlRecord>,
}

impl HistoryDocument {
    pub fn find(&self, id: &str) -> Option<&UrlRecord> {
        self.urls.iter().find(|r| r.id == id)
    }

    pub fn contains_url(&self, url: &str) -> bool {
        self.urls.iter().any(|r| r.url == url)
    }
}

/// Structured view of a validated URL, as shown in the editor fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedUrl {
    pub scheme: String,
    pub domain: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    pub path: String,
    pub params: Vec<(String, String)>,
}

impl ParsedUrl {
    /// What the domain field should hold so that rebuilding reproduces the
    /// source URL. `https` on its default port is shown as the bare host.
    ///
    /// The rebuilder only understands `http://` and `https://` prefixes, so
    /// any other scheme is dropped and the URL comes back as `https`.
    pub fn editor_domain(&self) -> String {
        let host = match self.port {
            Some(port) => format!("{}:{port}", self.domain),
            None => self.domain.clone(),
        };
        match self.scheme.as_str() {
            "https" if self.port.is_none() => host,
            "http" | "https" => format!("{}://{host}", self.scheme),
            _ => host,
        }
    }

    pub fn rows(&self) -> Vec<ParamRow> {
        self.params
            .iter()
            .map(|(k, v)| ParamRow::new(k.clone(), v.clone()))
            .collect()
    }
}

/// One query-parameter row in the editor. Blank rows are allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamRow {
    pub key: String,
    pub value: String,
}

impl ParamRow {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// The only record fields a user may change after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordField {
    Label(String),
    Tags(Vec<String>),
}

impl RecordField {
    pub fn name(&self) -> &'static str {
        match self {
            RecordField::Label(_) => "label",
            RecordField::Tags(_) => "tags",
        }
    }

    pub fn apply(self, record: &mut UrlRecord) {
        match self {
            RecordField::Label(label) => record.label = label,
            RecordField::Tags(tags) => record.tags = tags,
        }
    }
}

/// Split a comma separated tag field, dropping blanks.
pub fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub tag: Option<String>,
    pub search_term: Option<String>,
}

impl ListFilter {
    pub fn tag(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            ..Self::default()
        }
    }

    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search_term: Some(term.into()),
            ..Self::default()
        }
    }

    pub fn matches(&self, record: &UrlRecord) -> bool {
        if let Some(tag) = self.tag.as_deref().filter(|t| !t.is_empty()) {
            if !record.has_tag(tag) {
                return false;
            }
        }
        if let Some(term) = self.search_term.as_deref().filter(|t| !t.is_empty()) {
            let needle = term.to_lowercase();
            if !record.search_haystack().to_lowercase().contains(&needle) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, url: &str, label: &str, tags: &[&str]) -> UrlRecord {
        UrlRecord {
            id: id.to_string(),
            url: url.to_string(),
            label: label.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn parse_tags_trims_and_drops_blanks() {
        assert_eq!(parse_tags(" ai, tool ,, "), vec!["ai", "tool"]);
        assert!(parse_tags("").is_empty());
    }

    #[test]
    fn search_haystack_joins_tags_with_commas() {
        let r = record("1", "https://a.com", "A", &["x", "y"]);
        assert_eq!(r.search_haystack(), "1 https://a.com A x,y");
    }

    #[test]
    fn filter_search_is_case_insensitive_across_fields() {
        let r = record("abc", "https://Example.com", "Docs", &["Rust"]);
        assert!(ListFilter::search("example").matches(&r));
        assert!(ListFilter::search("DOCS").matches(&r));
        assert!(ListFilter::search("rust").matches(&r));
        assert!(!ListFilter::search("python").matches(&r));
    }

    #[test]
    fn empty_filter_values_match_everything() {
        let r = record("1", "https://a.com", "", &[]);
        let f = ListFilter {
            tag: Some(String::new()),
            search_term: Some(String::new()),
        };
        assert!(f.matches(&r));
    }

    #[test]
    fn editor_domain_keeps_non_default_scheme_and_port() {
        let mut p = ParsedUrl {
            scheme: "https".to_string(),
            domain: "example.com".to_string(),
            port: None,
            path: "/".to_string(),
            params: vec![],
        };
        assert_eq!(p.editor_domain(), "example.com");

        p.port = Some(8080);
        assert_eq!(p.editor_domain(), "https://example.com:8080");

        p.scheme = "http".to_string();
        p.port = None;
        assert_eq!(p.editor_domain(), "http://example.com");
    }

    #[test]
    fn editor_domain_drops_schemes_the_rebuilder_cannot_express() {
        let mut p = ParsedUrl {
            scheme: "ftp".to_string(),
            domain: "files.example.com".to_string(),
            port: None,
            path: "/pub".to_string(),
            params: vec![],
        };
        assert_eq!(p.editor_domain(), "files.example.com");

        p.port = Some(2121);
        assert_eq!(p.editor_domain(), "files.example.com:2121");

        p.scheme = "mailto".to_string();
        p.domain = String::new();
        p.port = None;
        assert_eq!(p.editor_domain(), "");
    }

    #[test]
    fn record_field_apply_sets_only_target() {
        let mut r = record("1", "https://a.com", "old", &["a"]);
        RecordField::Label("new".to_string()).apply(&mut r);
        assert_eq!(r.label, "new");
        assert_eq!(r.tags, vec!["a"]);

        RecordField::Tags(vec!["b".to_string()]).apply(&mut r);
        assert_eq!(r.tags, vec!["b"]);
        assert_eq!(r.label, "new");
    }
}
