//! Periodic capture scheduling.
//!
//! Two intervals drive the loop: a short poll interval at which the
//! background thread wakes up, and the longer analysis interval that must
//! elapse before a capture runs. Capture timing therefore drifts by at most
//! one poll. All captures, scheduled or forced, go through the same
//! repository mutex, so no two captures of a project ever interleave.

use crate::config::SchedulerConfig;
use crate::error::Result;
use crate::registry::ProjectRegistry;
use crate::snapshot::SnapshotRepository;
use crate::store::ChangeRecordStore;
use crate::types::{now_millis, ChangeRecord};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Lifecycle state of a scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// No background thread; the project is not being tracked.
    Stopped,
    /// `start` is initializing the snapshot repository.
    Starting,
    /// The poll thread is live.
    Running,
}

struct Inner {
    state: SchedulerState,
    config: SchedulerConfig,
    /// Monotonic start of the current analysis window.
    session_start: Instant,
    /// Wall-clock start of the current analysis window, carried onto
    /// captured change sets.
    session_start_millis: i64,
    cancelled: bool,
}

struct Shared {
    inner: Mutex<Inner>,
    wakeup: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Drives periodic captures of one tracked project.
pub struct ActivityScheduler {
    project_name: String,
    repository: Arc<Mutex<SnapshotRepository>>,
    registry: Arc<ProjectRegistry>,
    store: Arc<ChangeRecordStore>,
    shared: Arc<Shared>,
    handle: Option<JoinHandle<()>>,
}

impl ActivityScheduler {
    /// Creates a stopped scheduler for one project.
    pub fn new(
        project_name: impl Into<String>,
        repository: SnapshotRepository,
        registry: Arc<ProjectRegistry>,
        store: Arc<ChangeRecordStore>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            project_name: project_name.into(),
            repository: Arc::new(Mutex::new(repository)),
            registry,
            store,
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    state: SchedulerState::Stopped,
                    config,
                    session_start: Instant::now(),
                    session_start_millis: now_millis(),
                    cancelled: false,
                }),
                wakeup: Condvar::new(),
            }),
            handle: None,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SchedulerState {
        self.shared.lock().state
    }

    /// Initializes the snapshot repository, marks the project as tracking
    /// and spawns the poll thread.
    ///
    /// On initialization failure the scheduler stays stopped and the
    /// project's tracking flag is left untouched. Starting a running
    /// scheduler is a no-op.
    pub fn start(&mut self) -> Result<()> {
        {
            let mut inner = self.shared.lock();
            if inner.state != SchedulerState::Stopped {
                debug!(project = %self.project_name, "scheduler already running");
                return Ok(());
            }
            inner.state = SchedulerState::Starting;
        }

        let init = lock_repository(&self.repository).initialize_repository();
        if let Err(e) = init {
            self.shared.lock().state = SchedulerState::Stopped;
            return Err(e);
        }

        // Any failure before the thread spawns must land back in Stopped,
        // or no later start() could ever get past the state guard.
        if let Err(e) = self.registry.set_tracking(&self.project_name, true) {
            self.shared.lock().state = SchedulerState::Stopped;
            return Err(e);
        }

        {
            let mut inner = self.shared.lock();
            inner.state = SchedulerState::Running;
            inner.cancelled = false;
            inner.session_start = Instant::now();
            inner.session_start_millis = now_millis();
        }

        let shared = Arc::clone(&self.shared);
        let repository = Arc::clone(&self.repository);
        let registry = Arc::clone(&self.registry);
        let store = Arc::clone(&self.store);
        let project_name = self.project_name.clone();
        self.handle = Some(std::thread::spawn(move || {
            poll_loop(&shared, &repository, &registry, &store, &project_name);
        }));

        info!(project = %self.project_name, "scheduler started");
        Ok(())
    }

    /// Stops the poll thread, runs one final forced capture and clears the
    /// tracking flag. Stopping a stopped scheduler is a no-op.
    pub fn stop(&mut self) -> Result<()> {
        {
            let mut inner = self.shared.lock();
            if inner.state == SchedulerState::Stopped {
                return Ok(());
            }
            inner.cancelled = true;
            self.shared.wakeup.notify_all();
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!(project = %self.project_name, "poll thread panicked");
            }
        }

        // Capture whatever accumulated since the last tick before letting go.
        if let Err(e) = self.capture_now() {
            warn!(project = %self.project_name, error = %e, "final capture failed");
        }

        self.registry.set_tracking(&self.project_name, false)?;

        let mut inner = self.shared.lock();
        inner.state = SchedulerState::Stopped;
        inner.cancelled = false;

        info!(project = %self.project_name, "scheduler stopped");
        Ok(())
    }

    /// Restarts the analysis window without re-initializing the repository.
    pub fn restart(&self) {
        let mut inner = self.shared.lock();
        inner.session_start = Instant::now();
        inner.session_start_millis = now_millis();
    }

    /// Swaps the intervals and restarts the analysis window. Takes effect
    /// on the next poll wake-up.
    pub fn reconfigure(&self, config: SchedulerConfig) {
        let mut inner = self.shared.lock();
        inner.config = config;
        inner.session_start = Instant::now();
        inner.session_start_millis = now_millis();
        self.shared.wakeup.notify_all();
    }

    /// Captures immediately, regardless of elapsed time, and persists the
    /// result if anything changed. Serialized with scheduled ticks.
    pub fn capture_now(&self) -> Result<Option<ChangeRecord>> {
        let window_start = {
            let mut inner = self.shared.lock();
            let start = inner.session_start_millis;
            inner.session_start = Instant::now();
            inner.session_start_millis = now_millis();
            start
        };
        capture_and_save(
            &self.repository,
            &self.store,
            &self.project_name,
            window_start,
        )
    }
}

impl Drop for ActivityScheduler {
    fn drop(&mut self) {
        self.shared.lock().cancelled = true;
        self.shared.wakeup.notify_all();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn lock_repository(
    repository: &Mutex<SnapshotRepository>,
) -> MutexGuard<'_, SnapshotRepository> {
    repository.lock().unwrap_or_else(PoisonError::into_inner)
}

fn poll_loop(
    shared: &Shared,
    repository: &Mutex<SnapshotRepository>,
    registry: &ProjectRegistry,
    store: &ChangeRecordStore,
    project_name: &str,
) {
    let mut inner = shared.lock();
    loop {
        if inner.cancelled {
            return;
        }
        let poll = inner.config.poll_interval();
        let (guard, _) = shared
            .wakeup
            .wait_timeout(inner, poll)
            .unwrap_or_else(PoisonError::into_inner);
        inner = guard;
        if inner.cancelled {
            return;
        }
        if inner.session_start.elapsed() < inner.config.analysis_interval() {
            continue;
        }
        drop(inner);

        tick(shared, repository, registry, store, project_name);

        inner = shared.lock();
    }
}

/// One scheduled capture attempt. Failures are logged and never stop the
/// loop.
fn tick(
    shared: &Shared,
    repository: &Mutex<SnapshotRepository>,
    registry: &ProjectRegistry,
    store: &ChangeRecordStore,
    project_name: &str,
) {
    // The flag is re-read live so an external disable takes effect at the
    // next tick without touching the scheduler. A skipped tick is a pure
    // no-op: the analysis window only resets once a capture actually runs.
    match registry.get_project(project_name) {
        Ok(Some(project)) if project.is_tracking => {}
        Ok(_) => {
            debug!(project = project_name, "tracking disabled, skipping tick");
            return;
        }
        Err(e) => {
            warn!(project = project_name, error = %e, "failed to read tracking state");
            return;
        }
    }

    let window_start = {
        let mut inner = shared.lock();
        let start = inner.session_start_millis;
        inner.session_start = Instant::now();
        inner.session_start_millis = now_millis();
        start
    };

    match capture_and_save(repository, store, project_name, window_start) {
        Ok(Some(record)) => {
            info!(
                project = project_name,
                record = %record.id,
                files = record.change_set.summary.files_changed,
                "captured scheduled snapshot"
            );
        }
        Ok(None) => {
            debug!(project = project_name, "no changes since last snapshot");
        }
        Err(e) => {
            warn!(project = project_name, error = %e, "scheduled capture failed");
        }
    }
}

fn capture_and_save(
    repository: &Mutex<SnapshotRepository>,
    store: &ChangeRecordStore,
    project_name: &str,
    window_start: i64,
) -> Result<Option<ChangeRecord>> {
    let captured = lock_repository(repository).capture_changes()?;
    let Some(mut change_set) = captured else {
        return Ok(None);
    };
    if change_set.is_empty() {
        return Ok(None);
    }
    change_set.start_time = window_start;
    change_set.end_time = now_millis();
    store.save(project_name, change_set).map(Some)
}
