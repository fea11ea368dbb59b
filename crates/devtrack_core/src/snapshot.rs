//! Shadow git mirror of a tracked folder.
//!
//! Each tracked project owns one hidden, linear git history that mirrors its
//! source folder. A capture cycle copies the live folder over the mirror,
//! commits the result, and classifies the diff against the last-diffed
//! revision (the baseline).

use crate::diff;
use crate::error::{Result, SnapshotPhase, TrackerError};
use crate::types::{now_millis, ChangeSet, DiffSummary};
use git2::{Commit, DiffFindOptions, DiffFormat, DiffOptions, ErrorCode, Oid, Repository};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

const COMMIT_AUTHOR: &str = "devtrack";
const COMMIT_EMAIL: &str = "devtrack@localhost";

/// Maintains one private git mirror per tracked project.
///
/// Callers must serialize `initialize_repository` and `capture_changes`;
/// at most one snapshot cycle may run at a time for a project.
pub struct SnapshotRepository {
    source: PathBuf,
    mirror: PathBuf,
    baseline: Option<Oid>,
}

impl SnapshotRepository {
    /// Creates a handle for the given source folder and mirror location.
    /// No filesystem work happens until `initialize_repository`.
    pub fn new(source: impl Into<PathBuf>, mirror: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            mirror: mirror.into(),
            baseline: None,
        }
    }

    /// The tracked source folder.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// The last-diffed revision, if any.
    pub fn baseline(&self) -> Option<Oid> {
        self.baseline
    }

    /// Validates the source folder and ensures the mirror history exists.
    ///
    /// If the mirror has no commits yet, performs the initial full copy and
    /// commit; fails with `EmptySource` when the source contains no files.
    /// Idempotent once history exists: re-reads HEAD as the baseline.
    pub fn initialize_repository(&mut self) -> Result<()> {
        if !self.source.exists() {
            return Err(TrackerError::SourceNotFound(self.source.clone()));
        }
        if !self.source.is_dir() {
            return Err(TrackerError::SourceNotDirectory(self.source.clone()));
        }

        fs::create_dir_all(&self.mirror)?;
        let repo = self.open_or_init()?;

        if let Some(head) = head_commit(&repo)? {
            self.baseline = Some(head.id());
            return Ok(());
        }

        let copied = self.sync_source_to_mirror()?;
        if copied == 0 {
            return Err(TrackerError::EmptySource(self.source.clone()));
        }

        let oid = self
            .commit_snapshot(&repo, "Initial snapshot")?
            .ok_or_else(|| TrackerError::Snapshot {
                phase: SnapshotPhase::Commit,
                message: "initial snapshot produced no commit".into(),
            })?;
        self.baseline = Some(oid);
        Ok(())
    }

    /// Runs one snapshot cycle and returns the classified changes.
    ///
    /// Returns `Ok(None)` when nothing changed since the last commit, or when
    /// the baseline was unset or already at the new revision (in both cases
    /// the baseline is advanced).
    pub fn capture_changes(&mut self) -> Result<Option<ChangeSet>> {
        let repo = self.open_or_init()?;

        self.sync_source_to_mirror()?;

        let message = format!("Snapshot at {}", now_millis());
        let new_oid = match self.commit_snapshot(&repo, &message)? {
            Some(oid) => oid,
            None => {
                debug!(mirror = %self.mirror.display(), "nothing to commit");
                return Ok(None);
            }
        };

        let baseline = match self.baseline {
            Some(oid) if oid != new_oid => oid,
            _ => {
                self.baseline = Some(new_oid);
                return Ok(None);
            }
        };

        let change_set = self.diff_between(&repo, baseline, new_oid)?;
        self.baseline = Some(new_oid);
        Ok(Some(change_set))
    }

    fn open_or_init(&self) -> Result<Repository> {
        let init_err = |e: git2::Error| TrackerError::snapshot(SnapshotPhase::Init, e);

        if self.mirror.join(".git").exists() {
            Repository::open(&self.mirror).map_err(init_err)
        } else {
            Repository::init(&self.mirror).map_err(init_err)
        }
    }

    /// Copies the current source state over the mirror, excluding any `.git`
    /// directory on either side, and removes mirror files that no longer
    /// exist in the source. Returns the number of files present.
    fn sync_source_to_mirror(&self) -> Result<usize> {
        let copy_err = |msg: String| TrackerError::Snapshot {
            phase: SnapshotPhase::Copy,
            message: msg,
        };

        let mut present: HashSet<PathBuf> = HashSet::new();

        for entry in WalkDir::new(&self.source)
            .into_iter()
            .filter_entry(|e| e.file_name() != ".git")
        {
            let entry = entry.map_err(|e| copy_err(e.to_string()))?;
            let rel = entry
                .path()
                .strip_prefix(&self.source)
                .map_err(|e| copy_err(e.to_string()))?;
            if rel.as_os_str().is_empty() {
                continue;
            }

            let dest = self.mirror.join(rel);
            if entry.file_type().is_dir() {
                fs::create_dir_all(&dest).map_err(|e| copy_err(e.to_string()))?;
            } else if entry.file_type().is_file() {
                if let Some(parent) = dest.parent() {
                    fs::create_dir_all(parent).map_err(|e| copy_err(e.to_string()))?;
                }
                fs::copy(entry.path(), &dest).map_err(|e| copy_err(e.to_string()))?;
                present.insert(rel.to_path_buf());
            }
        }

        let mut stale = Vec::new();
        for entry in WalkDir::new(&self.mirror)
            .into_iter()
            .filter_entry(|e| e.file_name() != ".git")
        {
            let entry = entry.map_err(|e| copy_err(e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(&self.mirror)
                .map_err(|e| copy_err(e.to_string()))?;
            if !present.contains(rel) {
                stale.push(entry.path().to_path_buf());
            }
        }
        for path in stale {
            fs::remove_file(&path).map_err(|e| copy_err(e.to_string()))?;
        }

        Ok(present.len())
    }

    /// Stages everything and commits if the tree differs from HEAD.
    /// Returns `None` when there is nothing to commit.
    fn commit_snapshot(&self, repo: &Repository, message: &str) -> Result<Option<Oid>> {
        let commit_err = |e: git2::Error| TrackerError::snapshot(SnapshotPhase::Commit, e);

        let mut index = repo.index().map_err(commit_err)?;
        index
            .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
            .map_err(commit_err)?;
        index.update_all(["*"].iter(), None).map_err(commit_err)?;
        index.write().map_err(commit_err)?;
        let tree_id = index.write_tree().map_err(commit_err)?;

        let head = head_commit(repo)?;
        if let Some(parent) = &head {
            if parent.tree_id() == tree_id {
                return Ok(None);
            }
        }

        let sig = git2::Signature::now(COMMIT_AUTHOR, COMMIT_EMAIL).map_err(commit_err)?;
        let tree = repo.find_tree(tree_id).map_err(commit_err)?;
        let parents: Vec<&Commit<'_>> = head.iter().collect();
        let oid = repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .map_err(commit_err)?;
        Ok(Some(oid))
    }

    /// Diffs two revisions and classifies the result.
    fn diff_between(&self, repo: &Repository, old: Oid, new: Oid) -> Result<ChangeSet> {
        let diff_err = |e: git2::Error| TrackerError::snapshot(SnapshotPhase::Diff, e);

        let old_tree = repo
            .find_commit(old)
            .and_then(|c| c.tree())
            .map_err(diff_err)?;
        let new_tree = repo
            .find_commit(new)
            .and_then(|c| c.tree())
            .map_err(diff_err)?;

        let mut opts = DiffOptions::new();
        opts.ignore_filemode(true);
        let mut git_diff = repo
            .diff_tree_to_tree(Some(&old_tree), Some(&new_tree), Some(&mut opts))
            .map_err(diff_err)?;

        let mut find = DiffFindOptions::new();
        find.renames(true);
        git_diff.find_similar(Some(&mut find)).map_err(diff_err)?;

        let stats = git_diff.stats().map_err(diff_err)?;
        let summary = DiffSummary {
            files_changed: stats.files_changed(),
            insertions: stats.insertions(),
            deletions: stats.deletions(),
        };

        let mut patch_text = String::new();
        git_diff
            .print(DiffFormat::Patch, |_delta, _hunk, line| {
                match line.origin() {
                    '+' | '-' | ' ' => patch_text.push(line.origin()),
                    _ => {}
                }
                patch_text.push_str(&String::from_utf8_lossy(line.content()));
                true
            })
            .map_err(diff_err)?;

        let changes = diff::classify(&patch_text)?;

        let now = now_millis();
        Ok(ChangeSet {
            summary,
            message: format!(
                "Changed {} files with {} insertions and {} deletions",
                summary.files_changed, summary.insertions, summary.deletions
            ),
            start_time: now,
            end_time: now,
            changes,
        })
    }
}

/// Resolves HEAD to a commit, treating an unborn branch as "no history yet".
fn head_commit(repo: &Repository) -> Result<Option<Commit<'_>>> {
    match repo.head() {
        Ok(reference) => {
            let commit = reference
                .peel_to_commit()
                .map_err(|e| TrackerError::snapshot(SnapshotPhase::Init, e))?;
            Ok(Some(commit))
        }
        Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
            Ok(None)
        }
        Err(e) => Err(TrackerError::snapshot(SnapshotPhase::Init, e)),
    }
}
