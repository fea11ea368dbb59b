use devtrack_core::{FileChangeKind, Timeframe};

/// Expectations checked by the runner against the workspace.
#[derive(Debug, Clone)]
pub enum Assertion {
    /// The project holds exactly this many records.
    RecordCount { project: String, count: usize },
    /// The previous capture step persisted a record.
    CaptureProducedRecord,
    /// The previous capture step found nothing to persist.
    CaptureWasEmpty,
    /// The newest record's summary counts match.
    LastRecordSummary {
        project: String,
        files: usize,
        insertions: usize,
        deletions: usize,
    },
    /// The newest record contains a file change with this path and kind.
    LastRecordFile {
        project: String,
        path: String,
        kind: FileChangeKind,
    },
    /// Summarized metrics over a timeframe match.
    Summary {
        project: String,
        timeframe: Timeframe,
        lines_added: usize,
        lines_removed: usize,
        files_modified: usize,
    },
    /// The project is unknown to the summarizer.
    SummaryMissing { project: String },
    /// The project does or does not exist in the registry.
    ProjectExists { name: String, exists: bool },
}
