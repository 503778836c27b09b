use crate::domain::model::HistoryDocument;
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HistoryStats {
    pub records: usize,
    pub labeled: usize,
    pub tagged: usize,
    pub distinct_tags: usize,
}

impl HistoryStats {
    pub fn of(doc: &HistoryDocument) -> Self {
        let mut tags: HashSet<&str> = HashSet::new();
        let mut stats = HistoryStats {
            records: doc.urls.len(),
            ..HistoryStats::default()
        };
        for record in &doc.urls {
            if !record.label.is_empty() {
                stats.labeled += 1;
            }
            if !record.tags.is_empty() {
                stats.tagged += 1;
            }
            tags.extend(record.tags.iter().map(String::as_str));
        }
        stats.distinct_tags = tags.len();
        stats
    }
}
