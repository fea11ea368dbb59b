//! Metrics inspection commands.

use anyhow::{Context, Result};
use chrono::{Local, TimeZone};
use console::style;
use devtrack_core::{FileChangeKind, RecordQuery, Timeframe};
use std::path::Path;

use super::{confirm, open_stores, require_project};

/// Print aggregated metrics for one or all timeframes.
pub fn summary(data_dir: &Path, name: &str, timeframe: Option<Timeframe>) -> Result<()> {
    let (registry, store) = open_stores(data_dir)?;
    require_project(&registry, name)?;

    let timeframes = match timeframe {
        Some(tf) => vec![tf],
        None => vec![
            Timeframe::Today,
            Timeframe::Week,
            Timeframe::Month,
            Timeframe::All,
        ],
    };

    println!("{}", style(format!("Activity for {name}:")).bold());
    for tf in timeframes {
        let summary = store
            .summarize(name, tf)?
            .with_context(|| format!("No project named '{name}'"))?;
        println!(
            "  {:<11} {} added, {} removed, {} files",
            summary.date_range,
            style(summary.lines_added).green(),
            style(summary.lines_removed).red(),
            style(summary.files_modified).cyan()
        );
    }
    Ok(())
}

/// Print captured records newest-first with per-file detail.
pub fn show(data_dir: &Path, name: &str, limit: Option<usize>) -> Result<()> {
    let (registry, store) = open_stores(data_dir)?;
    require_project(&registry, name)?;

    let mut records = store.load(name, RecordQuery::default())?;
    records.reverse();
    if let Some(limit) = limit {
        records.truncate(limit);
    }

    if records.is_empty() {
        println!("No captured records for '{name}' yet.");
        return Ok(());
    }

    for record in records {
        println!(
            "{}  {}",
            style(format_millis(record.timestamp)).cyan(),
            record.change_set.message
        );
        for change in &record.change_set.changes {
            let kind = match change.kind {
                FileChangeKind::Added => style("A").green(),
                FileChangeKind::Deleted => style("D").red(),
                FileChangeKind::Changed => style("M").yellow(),
                FileChangeKind::Renamed => style("R").cyan(),
            };
            let path = match &change.old_file_path {
                Some(old) => format!("{} -> {}", old, change.file_path),
                None => change.file_path.clone(),
            };
            if change.is_binary {
                println!("    {} {}  (binary)", kind, path);
            } else {
                println!(
                    "    {} {}  +{} -{}",
                    kind, path, change.added_lines_count, change.deleted_lines_count
                );
            }
        }
    }
    Ok(())
}

/// Delete every captured record of a project.
pub fn clear(data_dir: &Path, name: &str, yes: bool) -> Result<()> {
    let (registry, store) = open_stores(data_dir)?;
    require_project(&registry, name)?;

    if !yes {
        println!(
            "{} This permanently deletes every captured record of '{}'.",
            style("⚠").yellow().bold(),
            name
        );
        if !confirm("Continue?")? {
            println!("{} Cancelled.", style("✓").green());
            return Ok(());
        }
    }

    let deleted = store.clear(name)?;
    println!(
        "{} Deleted {} record(s) for {}",
        style("✓").green(),
        deleted,
        style(name).cyan()
    );
    Ok(())
}

fn format_millis(millis: i64) -> String {
    match Local.timestamp_millis_opt(millis).earliest() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => millis.to_string(),
    }
}
