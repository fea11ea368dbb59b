//! Core data types for the change-capture pipeline.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How a file changed between two snapshot revisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileChangeKind {
    /// File is new in the later revision.
    Added,
    /// File existed only in the earlier revision.
    Deleted,
    /// File content changed in place.
    Changed,
    /// File moved; carries both the old and the new path.
    Renamed,
}

/// Classification of a single line within a diff hunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineChangeKind {
    /// Line present only on the new side.
    Added,
    /// Line present only on the old side.
    Deleted,
    /// Context line present on both sides.
    Unchanged,
    /// Diff metadata such as "no newline at end of file".
    /// Never counts toward any file metric.
    Message,
}

/// One classified line from a diff hunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineChange {
    /// Classification of the line.
    pub kind: LineChangeKind,
    /// Line content without the diff prefix character.
    pub content: String,
    /// New-side line number for added/unchanged lines, old-side for
    /// deleted lines, absent for message lines.
    pub line_number: Option<u32>,
}

/// Before- or after-side line range of one diff hunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRange {
    /// 1-based starting line.
    pub start: u32,
    /// Number of lines covered.
    pub line_count: u32,
}

/// Fully classified change to a single file between two revisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileChange {
    /// Path of the file (after the change for renames).
    pub file_path: String,
    /// Path before the change; present exactly when `kind` is `Renamed`.
    pub old_file_path: Option<String>,
    /// How the file changed.
    pub kind: FileChangeKind,
    /// Every classified line from the file's hunks.
    pub line_changes: Vec<LineChange>,
    /// Lines added on the new side.
    pub added_lines_count: usize,
    /// Lines removed from the old side.
    pub deleted_lines_count: usize,
    /// Context lines present on both sides.
    pub unchanged_lines_count: usize,
    /// Lines on the new side: added + unchanged.
    pub total_lines_count: usize,
    /// Lines on the old side: deleted + unchanged.
    pub original_lines_count: usize,
    /// (added + deleted) / max(total, original), 0 when both sides are empty.
    pub change_ratio: f64,
    /// True when the diff marked the file as binary.
    pub is_binary: bool,
    /// Before/after range pairs for every hunk, in order.
    pub chunk_ranges: Vec<ChunkRange>,
}

impl FileChange {
    /// Builds a FileChange from raw per-line classification results,
    /// deriving the aggregate metrics.
    pub fn from_parts(
        file_path: String,
        old_file_path: Option<String>,
        kind: FileChangeKind,
        line_changes: Vec<LineChange>,
        chunk_ranges: Vec<ChunkRange>,
        is_binary: bool,
    ) -> Self {
        let mut added = 0usize;
        let mut deleted = 0usize;
        let mut unchanged = 0usize;
        for line in &line_changes {
            match line.kind {
                LineChangeKind::Added => added += 1,
                LineChangeKind::Deleted => deleted += 1,
                LineChangeKind::Unchanged => unchanged += 1,
                LineChangeKind::Message => {}
            }
        }

        let total = added + unchanged;
        let original = deleted + unchanged;
        let denominator = total.max(original);
        let change_ratio = if denominator > 0 {
            (added + deleted) as f64 / denominator as f64
        } else {
            0.0
        };

        Self {
            file_path,
            old_file_path,
            kind,
            line_changes,
            added_lines_count: added,
            deleted_lines_count: deleted,
            unchanged_lines_count: unchanged,
            total_lines_count: total,
            original_lines_count: original,
            change_ratio,
            is_binary,
            chunk_ranges,
        }
    }
}

/// Numeric roll-up of a whole diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DiffSummary {
    /// Number of files touched.
    pub files_changed: usize,
    /// Total lines inserted.
    pub insertions: usize,
    /// Total lines deleted.
    pub deletions: usize,
}

/// Structured result of classifying one diff between two snapshot revisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeSet {
    /// Numeric summary of the diff.
    pub summary: DiffSummary,
    /// Human-readable one-liner ("Changed N files with ...").
    pub message: String,
    /// Unix millis when the captured interval began.
    pub start_time: i64,
    /// Unix millis when the capture completed.
    pub end_time: i64,
    /// Per-file classifications.
    pub changes: Vec<FileChange>,
}

impl ChangeSet {
    /// True when the diff touched no files.
    pub fn is_empty(&self) -> bool {
        self.summary.files_changed == 0
    }
}

/// A persisted, immutable capture result owned by a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Store-independent unique identifier, assigned at save time.
    pub id: String,
    /// Name of the owning project.
    pub project_name: String,
    /// Unix millis when the record was saved.
    pub timestamp: i64,
    /// The captured change set.
    pub change_set: ChangeSet,
}

/// A tracked project's identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Unique identifier, assigned at creation.
    pub id: String,
    /// Unique display name; foreign key for change records.
    pub name: String,
    /// Unique absolute path of the tracked folder.
    pub folder_path: String,
    /// Whether a scheduler is currently tracking this project.
    pub is_tracking: bool,
    /// Unix millis of the last successful non-empty capture
    /// (creation time until then).
    pub last_saved_time: i64,
}

/// Named date window for metric summarization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Timeframe {
    /// Local midnight through 23:59:59.999 today.
    Today,
    /// Monday 00:00 of the current week through now.
    Week,
    /// First of the current month 00:00 through now.
    Month,
    /// Epoch through now.
    All,
}

impl Timeframe {
    /// Display label matching the timeframe.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Today => "Today",
            Self::Week => "This Week",
            Self::Month => "This Month",
            Self::All => "All Time",
        }
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "today" => Ok(Self::Today),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "all" => Ok(Self::All),
            other => Err(format!(
                "unknown timeframe '{other}' (expected today, week, month or all)"
            )),
        }
    }
}

/// Aggregated metrics for a project over a timeframe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivitySummary {
    /// Name of the summarized project.
    pub project_name: String,
    /// Sum of insertions over records in range.
    pub lines_added: usize,
    /// Sum of deletions over records in range.
    pub lines_removed: usize,
    /// Sum of files-changed counts over records in range.
    pub files_modified: usize,
    /// Label of the summarized window.
    pub date_range: String,
}

/// Options for loading change records.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordQuery {
    /// Inclusive lower timestamp bound (unix millis).
    pub start: Option<i64>,
    /// Inclusive upper timestamp bound (unix millis).
    pub end: Option<i64>,
    /// Keep at most this many records, counted from the start of the range.
    pub limit: Option<usize>,
}

/// Current Unix timestamp in milliseconds.
pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
