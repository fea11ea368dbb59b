use super::assertions::Assertion;
use super::steps::ScenarioStep;
use super::workspace::TestWorkspace;
use anyhow::{bail, Context, Result};
use devtrack_core::ChangeRecord;

/// Executes scenario steps against a fresh workspace.
pub struct ScenarioRunner {
    workspace: TestWorkspace,
    current_step: usize,
    /// Outcome of the most recent Capture step.
    last_capture: Option<Option<ChangeRecord>>,
}

impl ScenarioRunner {
    pub fn new() -> Result<Self> {
        Ok(Self {
            workspace: TestWorkspace::new()?,
            current_step: 0,
            last_capture: None,
        })
    }

    /// Index of the step being executed, for failure reporting.
    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn execute(&mut self, steps: &[ScenarioStep]) -> Result<()> {
        for (i, step) in steps.iter().enumerate() {
            self.current_step = i;
            self.execute_step(step)
                .with_context(|| format!("step {}: {:?}", i, step))?;
        }
        Ok(())
    }

    fn execute_step(&mut self, step: &ScenarioStep) -> Result<()> {
        match step {
            ScenarioStep::CreateProject { name } => self.workspace.create_project(name),
            ScenarioStep::WriteFile {
                project,
                path,
                content,
            } => self.workspace.write_file(project, path, content),
            ScenarioStep::RemoveFile { project, path } => {
                self.workspace.remove_file(project, path)
            }
            ScenarioStep::RenameFile { project, from, to } => {
                self.workspace.rename_file(project, from, to)
            }
            ScenarioStep::Capture { project } => {
                self.last_capture = Some(self.workspace.capture(project)?);
                Ok(())
            }
            ScenarioStep::RenameProject { from, to } => {
                Ok(self.workspace.registry().rename_project(from, to)?)
            }
            ScenarioStep::DeleteProject { name } => {
                Ok(self.workspace.registry().delete_project(name)?)
            }
            ScenarioStep::ClearRecords { name } => {
                self.workspace.store_handle().clear(name)?;
                Ok(())
            }
            ScenarioStep::Assert { assertion } => self.check(assertion),
        }
    }

    fn check(&self, assertion: &Assertion) -> Result<()> {
        match assertion {
            Assertion::RecordCount { project, count } => {
                let actual = self.workspace.records(project)?.len();
                if actual != *count {
                    bail!("expected {count} records for '{project}', found {actual}");
                }
            }
            Assertion::CaptureProducedRecord => match &self.last_capture {
                Some(Some(_)) => {}
                Some(None) => bail!("capture found nothing to persist"),
                None => bail!("no capture step ran before this assertion"),
            },
            Assertion::CaptureWasEmpty => match &self.last_capture {
                Some(None) => {}
                Some(Some(record)) => {
                    bail!("capture unexpectedly persisted record {}", record.id)
                }
                None => bail!("no capture step ran before this assertion"),
            },
            Assertion::LastRecordSummary {
                project,
                files,
                insertions,
                deletions,
            } => {
                let record = self.last_record(project)?;
                let summary = record.change_set.summary;
                if summary.files_changed != *files
                    || summary.insertions != *insertions
                    || summary.deletions != *deletions
                {
                    bail!(
                        "expected {files} files +{insertions} -{deletions}, \
                         found {} files +{} -{}",
                        summary.files_changed,
                        summary.insertions,
                        summary.deletions
                    );
                }
            }
            Assertion::LastRecordFile {
                project,
                path,
                kind,
            } => {
                let record = self.last_record(project)?;
                let found = record
                    .change_set
                    .changes
                    .iter()
                    .find(|c| c.file_path == *path)
                    .with_context(|| format!("no change for '{path}' in the last record"))?;
                if found.kind != *kind {
                    bail!("expected '{path}' to be {kind:?}, found {:?}", found.kind);
                }
            }
            Assertion::Summary {
                project,
                timeframe,
                lines_added,
                lines_removed,
                files_modified,
            } => {
                let summary = self
                    .workspace
                    .summarize(project, *timeframe)?
                    .with_context(|| format!("summarizer does not know '{project}'"))?;
                if summary.lines_added != *lines_added
                    || summary.lines_removed != *lines_removed
                    || summary.files_modified != *files_modified
                {
                    bail!(
                        "expected +{lines_added} -{lines_removed} over {files_modified} files, \
                         found +{} -{} over {}",
                        summary.lines_added,
                        summary.lines_removed,
                        summary.files_modified
                    );
                }
            }
            Assertion::SummaryMissing { project } => {
                if self
                    .workspace
                    .summarize(project, devtrack_core::Timeframe::All)?
                    .is_some()
                {
                    bail!("summarizer unexpectedly knows '{project}'");
                }
            }
            Assertion::ProjectExists { name, exists } => {
                let actual = self.workspace.registry().get_project(name)?.is_some();
                if actual != *exists {
                    bail!("expected project '{name}' exists={exists}, found {actual}");
                }
            }
        }
        Ok(())
    }

    fn last_record(&self, project: &str) -> Result<ChangeRecord> {
        self.workspace
            .records(project)?
            .pop()
            .with_context(|| format!("no records for '{project}'"))
    }
}
