//! CRUD over project identity.
//!
//! Enforces the two uniqueness invariants (name, folder path) consumed by
//! every other component, and keeps change records consistent across rename
//! and delete. Every mutation is a single write transaction: it fully
//! succeeds or leaves nothing visible.

use crate::db::{
    self, deserialize_project, encode_record_key, serialize, TrackerDb, FOLDERS_TABLE,
    PROJECTS_TABLE, RECORDS_TABLE, RECORD_INDEX_TABLE,
};
use crate::error::{Result, TrackerError};
use crate::types::{now_millis, Project};
use redb::ReadableTable;
use std::sync::Arc;
use tracing::info;

/// Registry of tracked projects backed by the shared database.
pub struct ProjectRegistry {
    db: Arc<TrackerDb>,
}

impl ProjectRegistry {
    /// Creates a registry over the shared database handle.
    pub fn new(db: Arc<TrackerDb>) -> Self {
        Self { db }
    }

    /// Creates a new project with a fresh id and tracking disabled.
    ///
    /// Rejects empty names and duplicates of either the name or the folder.
    pub fn create_project(&self, name: &str, folder_path: &str) -> Result<Project> {
        validate_name(name)?;

        let project = Project {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            folder_path: folder_path.to_string(),
            is_tracking: false,
            last_saved_time: now_millis(),
        };

        let txn = self.db.database().begin_write()?;
        {
            let mut projects = txn.open_table(PROJECTS_TABLE)?;
            let mut folders = txn.open_table(FOLDERS_TABLE)?;

            if projects.get(name)?.is_some() {
                return Err(TrackerError::ProjectExists(name.to_string()));
            }
            if let Some(owner) = folders.get(folder_path)? {
                return Err(TrackerError::FolderInUse {
                    path: folder_path.into(),
                    project: owner.value().to_string(),
                });
            }

            projects.insert(name, serialize(&project)?.as_slice())?;
            folders.insert(folder_path, name)?;
        }
        txn.commit()?;

        info!(project = name, folder = folder_path, "created project");
        Ok(project)
    }

    /// Looks up a project by name.
    pub fn get_project(&self, name: &str) -> Result<Option<Project>> {
        let txn = self.db.database().begin_read()?;
        let projects = txn.open_table(PROJECTS_TABLE)?;
        match projects.get(name)? {
            Some(bytes) => Ok(Some(deserialize_project(bytes.value())?)),
            None => Ok(None),
        }
    }

    /// Returns every live project, ordered by name.
    pub fn all_projects(&self) -> Result<Vec<Project>> {
        let txn = self.db.database().begin_read()?;
        let projects = txn.open_table(PROJECTS_TABLE)?;

        let mut result = Vec::new();
        for entry in projects.iter()? {
            let (_, bytes) = entry?;
            result.push(deserialize_project(bytes.value())?);
        }
        Ok(result)
    }

    /// Sets the tracking flag; fails if the project is unknown.
    pub fn set_tracking(&self, name: &str, is_tracking: bool) -> Result<()> {
        self.update_project(name, |p| p.is_tracking = is_tracking)
    }

    /// Advances the last-saved timestamp; fails if the project is unknown.
    pub fn touch_last_saved(&self, name: &str, timestamp: i64) -> Result<()> {
        self.update_project(name, |p| p.last_saved_time = timestamp)
    }

    /// Renames a project, re-keying its identity and every owned record.
    pub fn rename_project(&self, old_name: &str, new_name: &str) -> Result<()> {
        validate_name(new_name)?;

        let txn = self.db.database().begin_write()?;
        {
            let mut projects = txn.open_table(PROJECTS_TABLE)?;
            let mut folders = txn.open_table(FOLDERS_TABLE)?;
            let mut records = txn.open_table(RECORDS_TABLE)?;
            let mut index = txn.open_table(RECORD_INDEX_TABLE)?;

            if projects.get(new_name)?.is_some() {
                return Err(TrackerError::ProjectExists(new_name.to_string()));
            }
            let mut project = match projects.get(old_name)? {
                Some(bytes) => deserialize_project(bytes.value())?,
                None => return Err(TrackerError::ProjectNotFound(old_name.to_string())),
            };

            project.name = new_name.to_string();
            projects.remove(old_name)?;
            projects.insert(new_name, serialize(&project)?.as_slice())?;
            folders.insert(project.folder_path.as_str(), new_name)?;

            for (old_key, record_id) in db::project_record_keys(&index, old_name)? {
                let mut record = match records.get(record_id.as_str())? {
                    Some(bytes) => db::deserialize_record(bytes.value())?,
                    None => {
                        return Err(TrackerError::Storage(format!(
                            "index entry without record: {record_id}"
                        )))
                    }
                };
                record.project_name = new_name.to_string();
                records.insert(record_id.as_str(), serialize(&record)?.as_slice())?;

                index.remove(old_key.as_slice())?;
                let new_key = encode_record_key(new_name, record.timestamp, &record.id);
                index.insert(new_key.as_slice(), record_id.as_str())?;
            }
        }
        txn.commit()?;

        info!(from = old_name, to = new_name, "renamed project");
        Ok(())
    }

    /// Moves a project to a new folder; fails if another project owns it.
    pub fn change_project_folder(&self, name: &str, new_folder: &str) -> Result<()> {
        let txn = self.db.database().begin_write()?;
        {
            let mut projects = txn.open_table(PROJECTS_TABLE)?;
            let mut folders = txn.open_table(FOLDERS_TABLE)?;

            if let Some(owner) = folders.get(new_folder)? {
                if owner.value() != name {
                    return Err(TrackerError::FolderInUse {
                        path: new_folder.into(),
                        project: owner.value().to_string(),
                    });
                }
            }
            let mut project = match projects.get(name)? {
                Some(bytes) => deserialize_project(bytes.value())?,
                None => return Err(TrackerError::ProjectNotFound(name.to_string())),
            };

            folders.remove(project.folder_path.as_str())?;
            project.folder_path = new_folder.to_string();
            folders.insert(new_folder, name)?;
            projects.insert(name, serialize(&project)?.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Deletes a project and cascade-deletes everything it owns.
    pub fn delete_project(&self, name: &str) -> Result<()> {
        let txn = self.db.database().begin_write()?;
        {
            let mut projects = txn.open_table(PROJECTS_TABLE)?;
            let mut folders = txn.open_table(FOLDERS_TABLE)?;
            let mut records = txn.open_table(RECORDS_TABLE)?;
            let mut index = txn.open_table(RECORD_INDEX_TABLE)?;

            let project = match projects.get(name)? {
                Some(bytes) => deserialize_project(bytes.value())?,
                None => return Err(TrackerError::ProjectNotFound(name.to_string())),
            };

            // Records first, identity last.
            for (key, record_id) in db::project_record_keys(&index, name)? {
                records.remove(record_id.as_str())?;
                index.remove(key.as_slice())?;
            }
            folders.remove(project.folder_path.as_str())?;
            projects.remove(name)?;
        }
        txn.commit()?;

        info!(project = name, "deleted project");
        Ok(())
    }

    fn update_project(&self, name: &str, mutate: impl FnOnce(&mut Project)) -> Result<()> {
        let txn = self.db.database().begin_write()?;
        {
            let mut projects = txn.open_table(PROJECTS_TABLE)?;
            let mut project = match projects.get(name)? {
                Some(bytes) => deserialize_project(bytes.value())?,
                None => return Err(TrackerError::ProjectNotFound(name.to_string())),
            };
            mutate(&mut project);
            projects.insert(name, serialize(&project)?.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(TrackerError::InvalidProjectName(
            "name must not be empty".into(),
        ));
    }
    if name.contains('\0') {
        return Err(TrackerError::InvalidProjectName(
            "name must not contain NUL".into(),
        ));
    }
    Ok(())
}
