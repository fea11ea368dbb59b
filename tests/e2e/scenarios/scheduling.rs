//! Scheduler scenarios, driven directly against the workspace because the
//! scheduler owns its own background thread.

use crate::harness::TestWorkspace;
use devtrack_core::{ActivityScheduler, SchedulerConfig, SchedulerState};
use std::time::{Duration, Instant};

fn scheduler(
    workspace: &TestWorkspace,
    project: &str,
    config: SchedulerConfig,
) -> ActivityScheduler {
    let repository = workspace
        .snapshot_repository(project)
        .expect("repository for project");
    ActivityScheduler::new(
        project,
        repository,
        workspace.registry_handle(),
        workspace.store_handle(),
        config,
    )
}

#[test]
fn test_scheduler_captures_edits_made_while_running() {
    let mut workspace = TestWorkspace::new().unwrap();
    workspace.create_project("app").unwrap();
    workspace
        .write_file("app", "src/main.rs", b"fn main() {}\n")
        .unwrap();

    let config = SchedulerConfig {
        analysis_interval_secs: 0,
        poll_interval_secs: 0,
    };
    let mut scheduler = scheduler(&workspace, "app", config);
    scheduler.start().unwrap();
    assert_eq!(scheduler.state(), SchedulerState::Running);

    workspace
        .write_file("app", "src/main.rs", b"fn main() {}\nfn helper() {}\n")
        .unwrap();

    let deadline = Instant::now() + Duration::from_secs(10);
    while workspace.records("app").unwrap().is_empty() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(20));
    }
    assert!(!workspace.records("app").unwrap().is_empty());

    scheduler.stop().unwrap();
    assert_eq!(scheduler.state(), SchedulerState::Stopped);
}

#[test]
fn test_stop_captures_pending_edits() {
    let mut workspace = TestWorkspace::new().unwrap();
    workspace.create_project("app").unwrap();
    workspace
        .write_file("app", "src/main.rs", b"fn main() {}\n")
        .unwrap();

    // Interval far in the future, so only the stop capture can fire.
    let config = SchedulerConfig {
        analysis_interval_secs: 3600,
        poll_interval_secs: 3600,
    };
    let mut scheduler = scheduler(&workspace, "app", config);
    scheduler.start().unwrap();

    workspace
        .write_file("app", "src/lib.rs", b"pub fn lib() {}\n")
        .unwrap();
    scheduler.stop().unwrap();

    let records = workspace.records("app").unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].change_set.summary.files_changed, 1);
}

#[test]
fn test_tracking_flag_follows_scheduler_lifecycle() {
    let mut workspace = TestWorkspace::new().unwrap();
    workspace.create_project("app").unwrap();
    workspace
        .write_file("app", "src/main.rs", b"fn main() {}\n")
        .unwrap();

    let config = SchedulerConfig {
        analysis_interval_secs: 3600,
        poll_interval_secs: 3600,
    };
    let mut scheduler = scheduler(&workspace, "app", config);

    assert!(!workspace
        .registry()
        .get_project("app")
        .unwrap()
        .unwrap()
        .is_tracking);

    scheduler.start().unwrap();
    assert!(workspace
        .registry()
        .get_project("app")
        .unwrap()
        .unwrap()
        .is_tracking);

    scheduler.stop().unwrap();
    assert!(!workspace
        .registry()
        .get_project("app")
        .unwrap()
        .unwrap()
        .is_tracking);
}

#[test]
fn test_forced_capture_is_immediate() {
    let mut workspace = TestWorkspace::new().unwrap();
    workspace.create_project("app").unwrap();
    workspace
        .write_file("app", "src/main.rs", b"fn main() {}\n")
        .unwrap();

    let config = SchedulerConfig {
        analysis_interval_secs: 3600,
        poll_interval_secs: 3600,
    };
    let mut scheduler = scheduler(&workspace, "app", config);
    scheduler.start().unwrap();

    workspace
        .write_file("app", "src/main.rs", b"fn main() {}\nfn more() {}\n")
        .unwrap();
    let record = scheduler.capture_now().unwrap().expect("record");
    assert_eq!(record.change_set.summary.insertions, 1);

    // Nothing new accumulated since the forced capture.
    assert!(scheduler.capture_now().unwrap().is_none());

    scheduler.stop().unwrap();
}
