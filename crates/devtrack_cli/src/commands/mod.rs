//! CLI commands.

use anyhow::{Context, Result};
use devtrack_core::{
    database_path, ChangeRecordStore, Project, ProjectRegistry, TrackerDb,
};
use std::path::Path;
use std::sync::Arc;

pub mod metrics;
pub mod project;
pub mod track;

/// Opens the shared database under the data directory.
pub fn open_db(data_dir: &Path) -> Result<Arc<TrackerDb>> {
    let db = TrackerDb::open(database_path(data_dir))
        .with_context(|| format!("Failed to open database under {}", data_dir.display()))?;
    Ok(Arc::new(db))
}

/// Opens the registry and store over one shared database handle.
pub fn open_stores(data_dir: &Path) -> Result<(Arc<ProjectRegistry>, Arc<ChangeRecordStore>)> {
    let db = open_db(data_dir)?;
    let registry = Arc::new(ProjectRegistry::new(Arc::clone(&db)));
    let store = Arc::new(ChangeRecordStore::new(db));
    Ok((registry, store))
}

/// Looks up a project, turning "unknown" into a user-facing error.
pub fn require_project(registry: &ProjectRegistry, name: &str) -> Result<Project> {
    registry
        .get_project(name)?
        .with_context(|| format!("No project named '{name}'. Run 'devtrack project list'."))
}

/// Asks for y/N confirmation on stdin.
pub fn confirm(prompt: &str) -> Result<bool> {
    use std::io::{self, Write};
    print!("{prompt} [y/N]: ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}
