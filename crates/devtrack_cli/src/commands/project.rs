//! Project management commands.

use anyhow::{Context, Result};
use console::style;
use std::path::Path;

use super::{confirm, open_stores, require_project};

/// Register a new project for tracking.
pub fn create(data_dir: &Path, name: &str, folder: &Path) -> Result<()> {
    let folder = folder
        .canonicalize()
        .with_context(|| format!("Folder does not exist: {}", folder.display()))?;
    let folder = folder
        .to_str()
        .context("Folder path is not valid UTF-8")?
        .to_string();

    let (registry, _) = open_stores(data_dir)?;
    let project = registry.create_project(name, &folder)?;

    println!(
        "{} Created project {} tracking {}",
        style("✓").green(),
        style(&project.name).cyan(),
        style(&project.folder_path).cyan()
    );
    println!("  Run 'devtrack track start {}' to begin capturing.", name);
    Ok(())
}

/// List every registered project.
pub fn list(data_dir: &Path) -> Result<()> {
    let (registry, _) = open_stores(data_dir)?;
    let projects = registry.all_projects()?;

    if projects.is_empty() {
        println!("No projects yet. Run 'devtrack project create <name> <folder>'.");
        return Ok(());
    }

    for project in projects {
        let marker = if project.is_tracking {
            style("●").green()
        } else {
            style("○").dim()
        };
        println!(
            "{} {}  {}",
            marker,
            style(&project.name).cyan().bold(),
            style(&project.folder_path).dim()
        );
    }
    Ok(())
}

/// Rename a project, carrying its history to the new name.
pub fn rename(data_dir: &Path, old_name: &str, new_name: &str) -> Result<()> {
    let (registry, _) = open_stores(data_dir)?;
    require_project(&registry, old_name)?;
    registry.rename_project(old_name, new_name)?;

    println!(
        "{} Renamed {} to {}",
        style("✓").green(),
        style(old_name).dim(),
        style(new_name).cyan()
    );
    Ok(())
}

/// Move a project to a different source folder.
pub fn set_folder(data_dir: &Path, name: &str, folder: &Path) -> Result<()> {
    let folder = folder
        .canonicalize()
        .with_context(|| format!("Folder does not exist: {}", folder.display()))?;
    let folder = folder
        .to_str()
        .context("Folder path is not valid UTF-8")?
        .to_string();

    let (registry, _) = open_stores(data_dir)?;
    require_project(&registry, name)?;
    registry.change_project_folder(name, &folder)?;

    println!(
        "{} {} now tracks {}",
        style("✓").green(),
        style(name).cyan(),
        style(&folder).cyan()
    );
    Ok(())
}

/// Delete a project and all of its change records.
pub fn delete(data_dir: &Path, name: &str, yes: bool) -> Result<()> {
    let (registry, _) = open_stores(data_dir)?;
    require_project(&registry, name)?;

    if !yes {
        println!(
            "{} Deleting '{}' permanently removes the project and every captured record.",
            style("⚠").yellow().bold(),
            name
        );
        if !confirm("Continue?")? {
            println!("{} Cancelled.", style("✓").green());
            return Ok(());
        }
    }

    registry.delete_project(name)?;
    println!("{} Deleted project {}", style("✓").green(), style(name).dim());
    Ok(())
}
