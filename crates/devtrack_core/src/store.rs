//! Persistence and summarization of capture results.
//!
//! Records are immutable once saved. The store owns the cascade law: the
//! whole capture result lives inside the record row, so removing the row
//! and its index entry removes everything the record owns.

use crate::db::{
    self, deserialize_project, deserialize_record, encode_record_key, record_key_lower,
    record_key_upper, serialize, TrackerDb, PROJECTS_TABLE, RECORDS_TABLE, RECORD_INDEX_TABLE,
};
use crate::error::{Result, TrackerError};
use crate::types::{
    now_millis, ActivitySummary, ChangeRecord, ChangeSet, RecordQuery, Timeframe,
};
use chrono::{Datelike, Local, NaiveTime, TimeZone};
use redb::ReadableTable;
use std::sync::Arc;
use tracing::debug;

/// Append-only store of change records, keyed by project.
pub struct ChangeRecordStore {
    db: Arc<TrackerDb>,
}

impl ChangeRecordStore {
    /// Creates a store over the shared database handle.
    pub fn new(db: Arc<TrackerDb>) -> Self {
        Self { db }
    }

    /// Persists a capture result for a project and returns the saved record.
    ///
    /// Assigns a fresh record id and save timestamp. The project's
    /// last-saved time advances in the same transaction, but only when the
    /// change set is non-empty.
    pub fn save(&self, project_name: &str, change_set: ChangeSet) -> Result<ChangeRecord> {
        self.save_with_timestamp(project_name, change_set, now_millis())
    }

    fn save_with_timestamp(
        &self,
        project_name: &str,
        change_set: ChangeSet,
        timestamp: i64,
    ) -> Result<ChangeRecord> {
        let record = ChangeRecord {
            id: uuid::Uuid::new_v4().to_string(),
            project_name: project_name.to_string(),
            timestamp,
            change_set,
        };

        let txn = self.db.database().begin_write()?;
        {
            let mut projects = txn.open_table(PROJECTS_TABLE)?;
            let mut records = txn.open_table(RECORDS_TABLE)?;
            let mut index = txn.open_table(RECORD_INDEX_TABLE)?;

            let mut project = match projects.get(project_name)? {
                Some(bytes) => deserialize_project(bytes.value())?,
                None => return Err(TrackerError::ProjectNotFound(project_name.to_string())),
            };

            records.insert(record.id.as_str(), serialize(&record)?.as_slice())?;
            let key = encode_record_key(project_name, record.timestamp, &record.id);
            index.insert(key.as_slice(), record.id.as_str())?;

            if !record.change_set.is_empty() {
                project.last_saved_time = record.timestamp;
                projects.insert(project_name, serialize(&project)?.as_slice())?;
            }
        }
        txn.commit()?;

        debug!(
            project = project_name,
            record = %record.id,
            files = record.change_set.summary.files_changed,
            "saved change record"
        );
        Ok(record)
    }

    /// Loads a project's records in ascending timestamp order.
    ///
    /// An unknown project yields an empty list, not an error.
    pub fn load(&self, project_name: &str, query: RecordQuery) -> Result<Vec<ChangeRecord>> {
        let lower = record_key_lower(project_name, query.start.unwrap_or(i64::MIN));
        let upper = record_key_upper(project_name, query.end.unwrap_or(i64::MAX));

        let txn = self.db.database().begin_read()?;
        let records = txn.open_table(RECORDS_TABLE)?;
        let index = txn.open_table(RECORD_INDEX_TABLE)?;

        let mut result = Vec::new();
        for entry in index.range::<&[u8]>(lower.as_slice()..=upper.as_slice())? {
            if query.limit.is_some_and(|limit| result.len() >= limit) {
                break;
            }
            let (_, record_id) = entry?;
            match records.get(record_id.value())? {
                Some(bytes) => result.push(deserialize_record(bytes.value())?),
                None => {
                    return Err(TrackerError::Storage(format!(
                        "index entry without record: {}",
                        record_id.value()
                    )))
                }
            }
        }
        Ok(result)
    }

    /// Sums a project's metrics over a timeframe window.
    ///
    /// Returns `None` for an unknown project. A known project with no
    /// records in the window yields a zeroed summary.
    pub fn summarize(
        &self,
        project_name: &str,
        timeframe: Timeframe,
    ) -> Result<Option<ActivitySummary>> {
        {
            let txn = self.db.database().begin_read()?;
            let projects = txn.open_table(PROJECTS_TABLE)?;
            if projects.get(project_name)?.is_none() {
                return Ok(None);
            }
        }

        let records = self.load(
            project_name,
            RecordQuery {
                start: Some(window_start(timeframe)),
                end: Some(now_millis()),
                limit: None,
            },
        )?;

        let mut summary = ActivitySummary {
            project_name: project_name.to_string(),
            lines_added: 0,
            lines_removed: 0,
            files_modified: 0,
            date_range: timeframe.label().to_string(),
        };
        for record in &records {
            summary.lines_added += record.change_set.summary.insertions;
            summary.lines_removed += record.change_set.summary.deletions;
            summary.files_modified += record.change_set.summary.files_changed;
        }
        Ok(Some(summary))
    }

    /// Deletes every record of a project; the project itself survives.
    pub fn clear(&self, project_name: &str) -> Result<usize> {
        let txn = self.db.database().begin_write()?;
        let deleted;
        {
            let projects = txn.open_table(PROJECTS_TABLE)?;
            let mut records = txn.open_table(RECORDS_TABLE)?;
            let mut index = txn.open_table(RECORD_INDEX_TABLE)?;

            if projects.get(project_name)?.is_none() {
                return Err(TrackerError::ProjectNotFound(project_name.to_string()));
            }

            let keys = db::project_record_keys(&index, project_name)?;
            for (key, record_id) in &keys {
                records.remove(record_id.as_str())?;
                index.remove(key.as_slice())?;
            }
            deleted = keys.len();
        }
        txn.commit()?;

        debug!(project = project_name, deleted, "cleared change records");
        Ok(deleted)
    }

    /// Deletes a single record and everything nested inside it.
    ///
    /// Returns whether a record with that id existed.
    pub fn delete_record(&self, record_id: &str) -> Result<bool> {
        let txn = self.db.database().begin_write()?;
        let existed;
        {
            let mut records = txn.open_table(RECORDS_TABLE)?;
            let mut index = txn.open_table(RECORD_INDEX_TABLE)?;

            let record = match records.get(record_id)? {
                Some(bytes) => Some(deserialize_record(bytes.value())?),
                None => None,
            };
            existed = match record {
                Some(record) => {
                    // Row first, then the index entry pointing at it.
                    records.remove(record_id)?;
                    let key =
                        encode_record_key(&record.project_name, record.timestamp, &record.id);
                    index.remove(key.as_slice())?;
                    true
                }
                None => false,
            };
        }
        txn.commit()?;
        Ok(existed)
    }
}

/// Inclusive lower bound (unix millis) of a timeframe in local time.
fn window_start(timeframe: Timeframe) -> i64 {
    let now = Local::now();
    let today = now.date_naive();

    let date = match timeframe {
        Timeframe::All => return 0,
        Timeframe::Today => today,
        Timeframe::Week => {
            let back = today.weekday().num_days_from_monday();
            today - chrono::Duration::days(i64::from(back))
        }
        Timeframe::Month => today.with_day(1).unwrap_or(today),
    };

    // DST gaps around midnight are resolved to the earliest valid instant.
    match Local.from_local_datetime(&date.and_time(NaiveTime::MIN)).earliest() {
        Some(start) => start.timestamp_millis(),
        None => 0,
    }
}
