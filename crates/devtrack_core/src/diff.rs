//! Pure classifier from raw git diff text to the structured change model.
//!
//! Parsing is strict: an unrecognized header or a hunk that does not match
//! its declared line counts fails the whole classification. Best-effort
//! skipping would silently corrupt the aggregate metrics downstream.

use crate::error::{Result, TrackerError};
use crate::types::{ChunkRange, FileChange, FileChangeKind, LineChange, LineChangeKind};
use std::iter::Peekable;
use std::str::Lines;

/// Classifies the textual diff between two revisions into per-file changes.
///
/// Empty input yields an empty list, not an error.
pub fn classify(diff_text: &str) -> Result<Vec<FileChange>> {
    let mut lines = diff_text.lines().peekable();
    let mut changes = Vec::new();

    while let Some(&line) = lines.peek() {
        if line.is_empty() {
            lines.next();
            continue;
        }
        if !line.starts_with("diff --git ") {
            return Err(TrackerError::DiffParseFailed(format!(
                "expected file header, found: {line}"
            )));
        }
        changes.push(parse_file_segment(&mut lines)?);
    }

    Ok(changes)
}

/// Per-file parse state accumulated from the extended headers.
#[derive(Default)]
struct SegmentHeader {
    header_old: Option<String>,
    header_new: Option<String>,
    rename_from: Option<String>,
    rename_to: Option<String>,
    kind: Option<FileChangeKind>,
    is_binary: bool,
}

fn parse_file_segment(lines: &mut Peekable<Lines<'_>>) -> Result<FileChange> {
    let header_line = lines
        .next()
        .ok_or_else(|| TrackerError::DiffParseFailed("missing file header".into()))?;
    let (old_path, new_path) = parse_git_header_paths(header_line)?;

    let mut seg = SegmentHeader {
        header_old: Some(old_path),
        header_new: Some(new_path),
        ..SegmentHeader::default()
    };

    parse_extended_headers(lines, &mut seg)?;

    let mut line_changes = Vec::new();
    let mut chunk_ranges = Vec::new();

    while lines.peek().is_some_and(|l| l.starts_with("@@")) {
        if seg.is_binary {
            return Err(TrackerError::DiffParseFailed(
                "hunk found in binary file segment".into(),
            ));
        }
        parse_hunk(lines, &mut line_changes, &mut chunk_ranges)?;
    }

    let kind = seg.kind.unwrap_or(FileChangeKind::Changed);
    let (file_path, old_file_path) = resolve_paths(kind, &seg)?;

    Ok(FileChange::from_parts(
        file_path,
        old_file_path,
        kind,
        line_changes,
        chunk_ranges,
        seg.is_binary,
    ))
}

/// Consumes extended header lines up to the first hunk or the next segment.
fn parse_extended_headers(lines: &mut Peekable<Lines<'_>>, seg: &mut SegmentHeader) -> Result<()> {
    while let Some(&line) = lines.peek() {
        if line.starts_with("@@") || line.starts_with("diff --git ") {
            break;
        }
        lines.next();

        if let Some(rest) = line.strip_prefix("rename from ") {
            seg.rename_from = Some(rest.to_string());
            seg.kind = Some(FileChangeKind::Renamed);
        } else if let Some(rest) = line.strip_prefix("rename to ") {
            seg.rename_to = Some(rest.to_string());
            seg.kind = Some(FileChangeKind::Renamed);
        } else if let Some(rest) = line.strip_prefix("copy to ") {
            // Copies surface as an Added file at the destination path.
            seg.header_new = Some(rest.to_string());
            seg.kind = Some(FileChangeKind::Added);
        } else if line.starts_with("new file") {
            seg.kind = Some(FileChangeKind::Added);
        } else if line.starts_with("deleted file") {
            seg.kind = Some(FileChangeKind::Deleted);
        } else if line.starts_with("Binary files ") || line == "GIT binary patch" {
            seg.is_binary = true;
            if line == "GIT binary patch" {
                skip_binary_patch(lines);
            }
        } else if line.starts_with("old mode ")
            || line.starts_with("new mode ")
            || line.starts_with("index ")
            || line.starts_with("similarity index ")
            || line.starts_with("dissimilarity index ")
            || line.starts_with("copy from ")
            || line.starts_with("--- ")
            || line.starts_with("+++ ")
        {
            // Informational; paths are taken from the diff --git line.
        } else {
            return Err(TrackerError::DiffParseFailed(format!(
                "unrecognized diff header: {line}"
            )));
        }
    }
    Ok(())
}

/// Consumes the base85 payload of a `GIT binary patch` block.
fn skip_binary_patch(lines: &mut Peekable<Lines<'_>>) {
    while let Some(&line) = lines.peek() {
        if line.is_empty() || line.starts_with("diff --git ") {
            break;
        }
        lines.next();
    }
}

fn parse_hunk(
    lines: &mut Peekable<Lines<'_>>,
    line_changes: &mut Vec<LineChange>,
    chunk_ranges: &mut Vec<ChunkRange>,
) -> Result<()> {
    let header = lines
        .next()
        .ok_or_else(|| TrackerError::DiffParseFailed("missing hunk header".into()))?;
    let (old_range, new_range) = parse_hunk_header(header)?;
    chunk_ranges.push(old_range);
    chunk_ranges.push(new_range);

    let mut old_remaining = old_range.line_count;
    let mut new_remaining = new_range.line_count;
    let mut old_line = old_range.start;
    let mut new_line = new_range.start;

    while old_remaining > 0 || new_remaining > 0 {
        let line = lines.next().ok_or_else(|| {
            TrackerError::DiffParseFailed("unexpected end of input inside hunk".into())
        })?;

        if let Some(content) = line.strip_prefix('+') {
            if new_remaining == 0 {
                return Err(hunk_overflow(line));
            }
            line_changes.push(LineChange {
                kind: LineChangeKind::Added,
                content: content.to_string(),
                line_number: Some(new_line),
            });
            new_line += 1;
            new_remaining -= 1;
        } else if let Some(content) = line.strip_prefix('-') {
            if old_remaining == 0 {
                return Err(hunk_overflow(line));
            }
            line_changes.push(LineChange {
                kind: LineChangeKind::Deleted,
                content: content.to_string(),
                line_number: Some(old_line),
            });
            old_line += 1;
            old_remaining -= 1;
        } else if line.starts_with(' ') || line.is_empty() {
            // Some tools strip trailing whitespace from blank context lines.
            if old_remaining == 0 || new_remaining == 0 {
                return Err(hunk_overflow(line));
            }
            line_changes.push(LineChange {
                kind: LineChangeKind::Unchanged,
                content: line.get(1..).unwrap_or("").to_string(),
                line_number: Some(new_line),
            });
            old_line += 1;
            new_line += 1;
            old_remaining -= 1;
            new_remaining -= 1;
        } else if let Some(content) = line.strip_prefix('\\') {
            line_changes.push(LineChange {
                kind: LineChangeKind::Message,
                content: content.trim_start().to_string(),
                line_number: None,
            });
        } else {
            return Err(TrackerError::DiffParseFailed(format!(
                "unrecognized hunk line: {line}"
            )));
        }
    }

    // A no-newline marker can trail the final line of the hunk.
    while lines.peek().is_some_and(|l| l.starts_with('\\')) {
        let line = lines.next().unwrap_or_default();
        line_changes.push(LineChange {
            kind: LineChangeKind::Message,
            content: line.trim_start_matches('\\').trim_start().to_string(),
            line_number: None,
        });
    }

    Ok(())
}

fn hunk_overflow(line: &str) -> TrackerError {
    TrackerError::DiffParseFailed(format!("hunk line exceeds declared range: {line}"))
}

/// Parses `@@ -start[,count] +start[,count] @@ ...` into the two ranges.
fn parse_hunk_header(header: &str) -> Result<(ChunkRange, ChunkRange)> {
    let malformed = || TrackerError::DiffParseFailed(format!("malformed hunk header: {header}"));

    let body = header.strip_prefix("@@ -").ok_or_else(malformed)?;
    let (old_part, rest) = body.split_once(" +").ok_or_else(malformed)?;
    let (new_part, _) = rest.split_once(" @@").ok_or_else(malformed)?;

    let old_range = parse_range(old_part).ok_or_else(malformed)?;
    let new_range = parse_range(new_part).ok_or_else(malformed)?;
    Ok((old_range, new_range))
}

fn parse_range(part: &str) -> Option<ChunkRange> {
    let (start, count) = match part.split_once(',') {
        Some((s, c)) => (s.parse().ok()?, c.parse().ok()?),
        None => (part.parse().ok()?, 1),
    };
    Some(ChunkRange {
        start,
        line_count: count,
    })
}

/// Extracts old/new paths from a `diff --git a/OLD b/NEW` line.
fn parse_git_header_paths(line: &str) -> Result<(String, String)> {
    let malformed = || TrackerError::DiffParseFailed(format!("malformed file header: {line}"));

    let rest = line.strip_prefix("diff --git ").ok_or_else(malformed)?;
    let (old_raw, new_raw) = rest.split_once(" b/").ok_or_else(malformed)?;
    let old_path = old_raw
        .trim_matches('"')
        .strip_prefix("a/")
        .ok_or_else(malformed)?;
    Ok((
        old_path.to_string(),
        new_raw.trim_matches('"').to_string(),
    ))
}

fn resolve_paths(kind: FileChangeKind, seg: &SegmentHeader) -> Result<(String, Option<String>)> {
    let missing = || TrackerError::DiffParseFailed("file segment missing path".into());

    match kind {
        FileChangeKind::Renamed => {
            let new = seg
                .rename_to
                .clone()
                .or_else(|| seg.header_new.clone())
                .ok_or_else(missing)?;
            let old = seg
                .rename_from
                .clone()
                .or_else(|| seg.header_old.clone())
                .ok_or_else(missing)?;
            Ok((new, Some(old)))
        }
        FileChangeKind::Deleted => Ok((seg.header_old.clone().ok_or_else(missing)?, None)),
        FileChangeKind::Added | FileChangeKind::Changed => {
            Ok((seg.header_new.clone().ok_or_else(missing)?, None))
        }
    }
}
