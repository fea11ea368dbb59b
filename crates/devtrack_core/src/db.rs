//! redb schema shared by the project registry and the change-record store.
//!
//! Layout: a project identity table keyed by unique name (with a folder-path
//! uniqueness index), a record table keyed by record id, and a composite
//! index ordering record ids by (project name, timestamp, id) for range
//! scans. Record ids are assigned at save time and never derived from
//! storage-internal row identity.

use crate::error::{Result, TrackerError};
use crate::types::{ChangeRecord, Project};
use redb::{Database, ReadableTable, TableDefinition};
use std::path::{Path, PathBuf};

/// Schema version for migration support.
pub const SCHEMA_VERSION: u32 = 1;

pub(crate) const METADATA_TABLE: TableDefinition<&str, u32> = TableDefinition::new("metadata");
/// Project name -> serialized Project.
pub(crate) const PROJECTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("projects");
/// Folder path -> owning project name (uniqueness index).
pub(crate) const FOLDERS_TABLE: TableDefinition<&str, &str> =
    TableDefinition::new("project_folders");
/// Record id -> serialized ChangeRecord (the ChangeSet and everything it
/// owns is nested inside, so deleting the row is the innermost cascade).
pub(crate) const RECORDS_TABLE: TableDefinition<&str, &[u8]> =
    TableDefinition::new("change_records");
/// Composite key (project, timestamp, id) -> record id.
pub(crate) const RECORD_INDEX_TABLE: TableDefinition<&[u8], &str> =
    TableDefinition::new("record_index");

/// Shared handle over the devtrack database file.
#[derive(Debug)]
pub struct TrackerDb {
    db: Database,
    path: PathBuf,
}

impl TrackerDb {
    /// Opens (or creates) the database and ensures all tables exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::create(&path)?;

        let write_txn = db.begin_write()?;
        {
            let mut metadata = write_txn.open_table(METADATA_TABLE)?;
            let version = metadata.get("version")?.map(|v| v.value());
            match version {
                Some(version) if version != SCHEMA_VERSION => {
                    return Err(TrackerError::Storage(format!(
                        "schema version mismatch: found {version}, expected {SCHEMA_VERSION}"
                    )));
                }
                Some(_) => {}
                None => {
                    metadata.insert("version", SCHEMA_VERSION)?;
                }
            }
            write_txn.open_table(PROJECTS_TABLE)?;
            write_txn.open_table(FOLDERS_TABLE)?;
            write_txn.open_table(RECORDS_TABLE)?;
            write_txn.open_table(RECORD_INDEX_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db, path })
    }

    /// Path of the backing database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn database(&self) -> &Database {
        &self.db
    }
}

/// Encodes the composite record-index key: name bytes, a NUL separator,
/// big-endian timestamp, then the record id for a stable tie-break.
pub(crate) fn encode_record_key(project_name: &str, timestamp: i64, record_id: &str) -> Vec<u8> {
    let name = project_name.as_bytes();
    let id = record_id.as_bytes();
    let mut key = Vec::with_capacity(name.len() + 1 + 8 + id.len());
    key.extend_from_slice(name);
    key.push(0);
    key.extend_from_slice(&encode_timestamp(timestamp));
    key.extend_from_slice(id);
    key
}

/// Lower bound of a project's index range at the given timestamp.
pub(crate) fn record_key_lower(project_name: &str, timestamp: i64) -> Vec<u8> {
    let name = project_name.as_bytes();
    let mut key = Vec::with_capacity(name.len() + 1 + 8);
    key.extend_from_slice(name);
    key.push(0);
    key.extend_from_slice(&encode_timestamp(timestamp));
    key
}

/// Upper bound of a project's index range at the given timestamp
/// (inclusive of every record id at that timestamp).
pub(crate) fn record_key_upper(project_name: &str, timestamp: i64) -> Vec<u8> {
    let mut key = record_key_lower(project_name, timestamp);
    key.extend_from_slice(&[0xff; 8]);
    key
}

/// Maps i64 millis onto an order-preserving big-endian byte string.
fn encode_timestamp(timestamp: i64) -> [u8; 8] {
    ((timestamp as u64) ^ (1 << 63)).to_be_bytes()
}

pub(crate) fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| TrackerError::Storage(e.to_string()))
}

pub(crate) fn deserialize_project(bytes: &[u8]) -> Result<Project> {
    serde_json::from_slice(bytes).map_err(|e| TrackerError::CorruptedRecord(e.to_string()))
}

pub(crate) fn deserialize_record(bytes: &[u8]) -> Result<ChangeRecord> {
    serde_json::from_slice(bytes).map_err(|e| TrackerError::CorruptedRecord(e.to_string()))
}

/// Collects (index key, record id) pairs for every record of a project,
/// in timestamp order.
pub(crate) fn project_record_keys(
    index: &impl ReadableTable<&'static [u8], &'static str>,
    project_name: &str,
) -> Result<Vec<(Vec<u8>, String)>> {
    let lower = record_key_lower(project_name, i64::MIN);
    let upper = record_key_upper(project_name, i64::MAX);

    let mut keys = Vec::new();
    for entry in index.range::<&[u8]>(lower.as_slice()..=upper.as_slice())? {
        let (key, value) = entry?;
        keys.push((key.value().to_vec(), value.value().to_string()));
    }
    Ok(keys)
}
