use crate::usecase::stats::HistoryStats;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HistoryEvent {
    Loaded {
        records: usize,
    },

    Migrated {
        migrated: usize,
        skipped: usize,
    },

    RecordAdded {
        id: String,
        url: String,
    },

    DuplicateRejected {
        url: String,
    },

    RecordUpdated {
        id: String,
        field: String,
    },

    RecordDeleted {
        id: String,
        found: bool,
    },

    Imported {
        mode: String,
        imported: usize,
        skipped: usize,
        total: usize,
    },

    Exported {
        stats: HistoryStats,
    },
}
