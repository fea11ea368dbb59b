//! Devtrack Core Library
//!
//! A change-capture pipeline for tracked project folders, providing:
//! - Private git snapshot mirrors of source folders
//! - Classification of unified diffs into per-line change records
//! - Durable storage and timeframe summarization of capture results
//! - A dual-interval scheduler that captures on a fixed cadence
//!
//! # Quick Start
//!
//! ```no_run
//! use devtrack_core::{ProjectRegistry, ChangeRecordStore, TrackerDb};
//! use std::sync::Arc;
//!
//! let db = Arc::new(TrackerDb::open("/tmp/devtrack.redb").unwrap());
//! let registry = ProjectRegistry::new(Arc::clone(&db));
//! let store = ChangeRecordStore::new(db);
//!
//! let project = registry.create_project("demo", "/home/me/demo").unwrap();
//! assert!(!project.is_tracking);
//! ```

mod config;
mod db;
mod diff;
mod error;
mod registry;
mod scheduler;
mod snapshot;
mod store;
mod types;

pub use config::{database_path, mirror_dir, SchedulerConfig, TrackerConfig};
pub use db::{TrackerDb, SCHEMA_VERSION};
pub use diff::classify;
pub use error::{Result, SnapshotPhase, TrackerError};
pub use registry::ProjectRegistry;
pub use scheduler::{ActivityScheduler, SchedulerState};
pub use snapshot::SnapshotRepository;
pub use store::ChangeRecordStore;
pub use types::*;
