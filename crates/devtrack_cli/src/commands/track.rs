//! Tracking commands: run the scheduler or capture once.

use anyhow::Result;
use console::style;
use devtrack_core::{
    mirror_dir, ActivityScheduler, SnapshotRepository, TrackerConfig,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use super::{open_stores, require_project};

/// Start the capture scheduler in the foreground.
///
/// Runs until the project's tracking flag is cleared, typically by
/// 'devtrack track stop' from another shell.
pub fn start(data_dir: &Path, name: &str) -> Result<()> {
    let (registry, store) = open_stores(data_dir)?;
    let project = require_project(&registry, name)?;

    let config = TrackerConfig::load(data_dir);
    let repository = SnapshotRepository::new(
        Path::new(&project.folder_path),
        mirror_dir(data_dir, &project.id),
    );
    let mut scheduler = ActivityScheduler::new(
        name,
        repository,
        Arc::clone(&registry),
        store,
        config.scheduler.clone(),
    );
    scheduler.start()?;

    println!(
        "{} Tracking {} every {}s (poll {}s). Stop with 'devtrack track stop {}'.",
        style("●").green(),
        style(name).cyan().bold(),
        config.scheduler.analysis_interval_secs,
        config.scheduler.poll_interval_secs,
        name
    );

    // Watch the live flag so a stop issued elsewhere ends this process too.
    loop {
        std::thread::sleep(Duration::from_secs(1));
        match registry.get_project(name)? {
            Some(project) if project.is_tracking => continue,
            _ => break,
        }
    }

    scheduler.stop()?;
    println!("{} Stopped tracking {}", style("✓").green(), style(name).cyan());
    Ok(())
}

/// Clear the tracking flag; a running scheduler notices on its next poll.
pub fn stop(data_dir: &Path, name: &str) -> Result<()> {
    let (registry, _) = open_stores(data_dir)?;
    require_project(&registry, name)?;
    registry.set_tracking(name, false)?;

    println!(
        "{} Tracking disabled for {}",
        style("✓").green(),
        style(name).cyan()
    );
    Ok(())
}

/// Run a single capture right now, outside any scheduler.
pub fn once(data_dir: &Path, name: &str) -> Result<()> {
    let (registry, store) = open_stores(data_dir)?;
    let project = require_project(&registry, name)?;

    let mut repository = SnapshotRepository::new(
        Path::new(&project.folder_path),
        mirror_dir(data_dir, &project.id),
    );
    repository.initialize_repository()?;

    match repository.capture_changes()? {
        Some(change_set) if !change_set.is_empty() => {
            let record = store.save(name, change_set)?;
            println!(
                "{} {}",
                style("✓").green(),
                record.change_set.message
            );
        }
        _ => {
            println!("{} No changes since the last snapshot.", style("○").dim());
        }
    }
    Ok(())
}
