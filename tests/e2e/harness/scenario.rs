use super::assertions::Assertion;
use super::runner::ScenarioRunner;
use super::steps::ScenarioStep;
use devtrack_core::{FileChangeKind, Timeframe};

/// Fluent DSL for building capture scenarios
pub struct Scenario {
    name: String,
    steps: Vec<ScenarioStep>,
}

impl Scenario {
    /// Create a new scenario with the given name
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            steps: Vec::new(),
        }
    }

    // ===== Project setup =====

    /// Register a project with a fresh source folder
    pub fn project(mut self, name: &str) -> Self {
        self.steps.push(ScenarioStep::CreateProject {
            name: name.to_string(),
        });
        self
    }

    // ===== Source edits =====

    /// Write a file into a project's source folder
    pub fn writes(mut self, project: &str, path: &str, content: &[u8]) -> Self {
        self.steps.push(ScenarioStep::WriteFile {
            project: project.to_string(),
            path: path.to_string(),
            content: content.to_vec(),
        });
        self
    }

    /// Remove a file from a project's source folder
    pub fn removes(mut self, project: &str, path: &str) -> Self {
        self.steps.push(ScenarioStep::RemoveFile {
            project: project.to_string(),
            path: path.to_string(),
        });
        self
    }

    /// Rename a file inside a project's source folder
    pub fn renames_file(mut self, project: &str, from: &str, to: &str) -> Self {
        self.steps.push(ScenarioStep::RenameFile {
            project: project.to_string(),
            from: from.to_string(),
            to: to.to_string(),
        });
        self
    }

    // ===== Pipeline actions =====

    /// Capture a snapshot, persisting the result if non-empty
    pub fn captures(mut self, project: &str) -> Self {
        self.steps.push(ScenarioStep::Capture {
            project: project.to_string(),
        });
        self
    }

    /// Rename a project, carrying its records
    pub fn renames_project(mut self, from: &str, to: &str) -> Self {
        self.steps.push(ScenarioStep::RenameProject {
            from: from.to_string(),
            to: to.to_string(),
        });
        self
    }

    /// Delete a project and everything it owns
    pub fn deletes_project(mut self, name: &str) -> Self {
        self.steps.push(ScenarioStep::DeleteProject {
            name: name.to_string(),
        });
        self
    }

    /// Delete every record of a project
    pub fn clears_records(mut self, name: &str) -> Self {
        self.steps.push(ScenarioStep::ClearRecords {
            name: name.to_string(),
        });
        self
    }

    // ===== Assertions =====

    /// Add a general assertion
    pub fn assert(mut self, assertion: Assertion) -> Self {
        self.steps.push(ScenarioStep::Assert { assertion });
        self
    }

    /// Assert the project holds exactly this many records
    pub fn assert_record_count(self, project: &str, count: usize) -> Self {
        self.assert(Assertion::RecordCount {
            project: project.to_string(),
            count,
        })
    }

    /// Assert the previous capture persisted a record
    pub fn assert_captured(self) -> Self {
        self.assert(Assertion::CaptureProducedRecord)
    }

    /// Assert the previous capture found nothing to persist
    pub fn assert_capture_empty(self) -> Self {
        self.assert(Assertion::CaptureWasEmpty)
    }

    /// Assert the newest record's summary counts
    pub fn assert_last_summary(
        self,
        project: &str,
        files: usize,
        insertions: usize,
        deletions: usize,
    ) -> Self {
        self.assert(Assertion::LastRecordSummary {
            project: project.to_string(),
            files,
            insertions,
            deletions,
        })
    }

    /// Assert the newest record classified a file with this kind
    pub fn assert_last_file(self, project: &str, path: &str, kind: FileChangeKind) -> Self {
        self.assert(Assertion::LastRecordFile {
            project: project.to_string(),
            path: path.to_string(),
            kind,
        })
    }

    /// Assert summarized metrics over a timeframe
    pub fn assert_summary(
        self,
        project: &str,
        timeframe: Timeframe,
        lines_added: usize,
        lines_removed: usize,
        files_modified: usize,
    ) -> Self {
        self.assert(Assertion::Summary {
            project: project.to_string(),
            timeframe,
            lines_added,
            lines_removed,
            files_modified,
        })
    }

    /// Assert the summarizer does not know the project
    pub fn assert_summary_missing(self, project: &str) -> Self {
        self.assert(Assertion::SummaryMissing {
            project: project.to_string(),
        })
    }

    /// Assert the project exists (or not) in the registry
    pub fn assert_project_exists(self, name: &str, exists: bool) -> Self {
        self.assert(Assertion::ProjectExists {
            name: name.to_string(),
            exists,
        })
    }

    // ===== Execution =====

    /// Execute the scenario and return results
    pub fn run(self) -> ScenarioResult {
        let mut runner = match ScenarioRunner::new() {
            Ok(r) => r,
            Err(e) => {
                return ScenarioResult {
                    name: self.name.clone(),
                    success: false,
                    failure_step: Some(0),
                    error: Some(format!("Failed to create runner: {}", e)),
                }
            }
        };

        match runner.execute(&self.steps) {
            Ok(()) => ScenarioResult {
                name: self.name,
                success: true,
                failure_step: None,
                error: None,
            },
            Err(e) => {
                let failure_step = runner.current_step();
                ScenarioResult {
                    name: self.name,
                    success: false,
                    failure_step: Some(failure_step),
                    error: Some(format!("{:?}", e)),
                }
            }
        }
    }
}

/// Result of running a scenario
#[derive(Debug)]
pub struct ScenarioResult {
    pub name: String,
    pub success: bool,
    pub failure_step: Option<usize>,
    pub error: Option<String>,
}

impl ScenarioResult {
    /// Unwrap the result, panicking if it failed
    pub fn unwrap(self) {
        if !self.success {
            panic!(
                "Scenario '{}' failed at step {}: {}",
                self.name,
                self.failure_step.unwrap_or(0),
                self.error.unwrap_or_else(|| "unknown error".to_string())
            );
        }
    }

    /// Expect the result to be successful
    pub fn expect(self, msg: &str) {
        if !self.success {
            panic!(
                "{}: Scenario '{}' failed at step {}: {}",
                msg,
                self.name,
                self.failure_step.unwrap_or(0),
                self.error.unwrap_or_else(|| "unknown error".to_string())
            );
        }
    }
}
