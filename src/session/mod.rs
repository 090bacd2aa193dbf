//! The feedback loop controller: generate, write, run, and retry until the
//! program works or the attempt budget runs out. One session owns one
//! working directory and processes one request at a time to a terminal
//! state; the UI watches progress over an event channel and can cancel at
//! either suspension point (the LLM call or the subprocess wait).

use crate::app_error::AppError;
use crate::file_writer::{self, WriteReport};
use crate::language;
use crate::llm::TextGenerator;
use crate::logger::Logger;
use crate::monitor::UsageMonitor;
use crate::prompt_builder;
use crate::response_parser::{self, GeneratedFile};
use crate::runner::{Executor, RunResult};
use serde_json::json;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Generating,
    Writing,
    Running,
    Success,
    Retrying,
    Exhausted,
}

/// One user turn: the task, an optional target language, and optional
/// free-text feedback on the previous round.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub task: String,
    pub language_hint: Option<String>,
    pub feedback: Option<String>,
}

/// Progress notifications for the UI. The channel is one-directional; the UI
/// never replies through it.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    StateChanged(SessionState),
    AttemptStarted { attempt: u32, max_attempts: u32 },
    FilesWritten { written: Vec<PathBuf>, skipped: Vec<String> },
    RunFinished { attempt: u32, result: RunResult },
    Finished(SessionOutcome),
}

#[derive(Debug, Clone)]
pub enum SessionOutcome {
    Success {
        attempts: u32,
        entry: PathBuf,
        result: RunResult,
    },
    Exhausted {
        attempts: u32,
        last: RunResult,
    },
    Cancelled,
}

#[derive(Debug)]
pub struct AttemptRecord {
    pub index: u32,
    pub result: RunResult,
    /// The follow-up prompt, present only when this attempt triggered a retry.
    pub feedback_prompt: Option<String>,
}

/// Files the session has materialized so far. Keys are sanitized relative
/// paths; a later generation overwrites an earlier entry for the same path.
#[derive(Debug, Default)]
pub struct ProjectState {
    pub workdir: PathBuf,
    pub files: BTreeMap<PathBuf, GeneratedFile>,
    pub entry: Option<PathBuf>,
}

impl ProjectState {
    fn merge_written(&mut self, files: &[GeneratedFile]) {
        for file in files {
            if let Ok(cleaned) = file_writer::sanitize_path(&file.path) {
                self.files.insert(cleaned, file.clone());
            }
        }
        self.entry = language::detect_entry_file(self.files.keys().map(|p| p.as_path()))
            .map(|p| p.to_path_buf());
    }
}

pub struct Session {
    generator: Arc<dyn TextGenerator>,
    executor: Arc<dyn Executor>,
    logger: Arc<Logger>,
    monitor: Arc<dyn UsageMonitor>,
    max_attempts: u32,
    pub project: ProjectState,
    pub attempts: Vec<AttemptRecord>,
}

impl Session {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        executor: Arc<dyn Executor>,
        logger: Arc<Logger>,
        monitor: Arc<dyn UsageMonitor>,
        max_attempts: u32,
        workdir: PathBuf,
    ) -> Self {
        Self {
            generator,
            executor,
            logger,
            monitor,
            max_attempts,
            project: ProjectState {
                workdir,
                ..ProjectState::default()
            },
            attempts: Vec::new(),
        }
    }

    /// Drive one request to a terminal state. A cancelled attempt appends no
    /// record; everything else appends exactly one record per cycle.
    pub async fn process(
        &mut self,
        request: &GenerationRequest,
        events: &mpsc::Sender<SessionEvent>,
        cancel: &mut watch::Receiver<bool>,
    ) -> Result<SessionOutcome, AppError> {
        let hint = request.language_hint.as_deref();
        let mut next_prompt = match &request.feedback {
            Some(feedback) => {
                prompt_builder::build_feedback_prompt(&request.task, hint, feedback)
            }
            None => prompt_builder::build_initial_prompt(&request.task, hint),
        };

        for cycle in 1..=self.max_attempts {
            if *cancel.borrow() {
                return self.finish_cancelled(events).await;
            }

            let attempt_index = self.attempts.len() as u32 + 1;
            let prefix = format!("attempt-{attempt_index}");
            let attempt_start = Instant::now();

            emit(events, SessionEvent::StateChanged(SessionState::Generating)).await;
            emit(
                events,
                SessionEvent::AttemptStarted {
                    attempt: cycle,
                    max_attempts: self.max_attempts,
                },
            )
            .await;

            let reply = tokio::select! {
                _ = wait_cancelled(cancel) => {
                    return self.finish_cancelled(events).await;
                }
                result = self.generator.generate(&next_prompt, &prefix) => result?,
            };

            let files = response_parser::parse_reply(&reply);

            emit(events, SessionEvent::StateChanged(SessionState::Writing)).await;
            let report = file_writer::write_files(&self.project.workdir, &files)?;
            self.log_write_report(&prefix, &report)?;
            self.project.merge_written(&files);
            emit(
                events,
                SessionEvent::FilesWritten {
                    written: report.written.clone(),
                    skipped: report.skipped_descriptions(),
                },
            )
            .await;

            emit(events, SessionEvent::StateChanged(SessionState::Running)).await;
            let result = self.run_attempt(&files, cancel).await?;
            let result = match result {
                Some(result) => result,
                None => return self.finish_cancelled(events).await,
            };

            self.logger.log_json(
                &format!("{prefix}-run.json"),
                &json!({
                    "exit_code": result.exit_code,
                    "timed_out": result.timed_out,
                    "duration_ms": result.duration.as_millis() as u64,
                    "stdout": result.stdout,
                    "stderr": result.stderr,
                }),
            )?;
            emit(
                events,
                SessionEvent::RunFinished {
                    attempt: cycle,
                    result: result.clone(),
                },
            )
            .await;
            self.monitor
                .record_attempt(attempt_index, result.success(), attempt_start.elapsed());

            if result.success() {
                self.attempts.push(AttemptRecord {
                    index: attempt_index,
                    result: result.clone(),
                    feedback_prompt: None,
                });
                emit(events, SessionEvent::StateChanged(SessionState::Success)).await;
                let outcome = SessionOutcome::Success {
                    attempts: cycle,
                    entry: self.project.entry.clone().unwrap_or_default(),
                    result,
                };
                emit(events, SessionEvent::Finished(outcome.clone())).await;
                return Ok(outcome);
            }

            if cycle == self.max_attempts {
                self.attempts.push(AttemptRecord {
                    index: attempt_index,
                    result: result.clone(),
                    feedback_prompt: None,
                });
                emit(events, SessionEvent::StateChanged(SessionState::Exhausted)).await;
                let outcome = SessionOutcome::Exhausted {
                    attempts: cycle,
                    last: result,
                };
                emit(events, SessionEvent::Finished(outcome.clone())).await;
                return Ok(outcome);
            }

            let failure_report = prompt_builder::render_run_output(&result);
            next_prompt = prompt_builder::build_retry_prompt(&request.task, hint, &failure_report);
            self.attempts.push(AttemptRecord {
                index: attempt_index,
                result,
                feedback_prompt: Some(next_prompt.clone()),
            });
            emit(events, SessionEvent::StateChanged(SessionState::Retrying)).await;
        }

        // max_attempts >= 1, so the loop always reaches a terminal state.
        unreachable!("the attempt loop terminates via Success or Exhausted")
    }

    // Run the current entry file, or synthesize a failing result when there
    // is nothing runnable. `Ok(None)` means the run was cancelled.
    async fn run_attempt(
        &self,
        new_files: &[GeneratedFile],
        cancel: &mut watch::Receiver<bool>,
    ) -> Result<Option<RunResult>, AppError> {
        if new_files.is_empty() && self.project.files.is_empty() {
            return Ok(Some(synthesized_failure(
                "The reply contained no source files. Return the complete program as fenced code blocks labeled with filenames.",
            )));
        }

        let Some(entry) = self.project.entry.clone() else {
            let listing = self
                .project
                .files
                .keys()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            return Ok(Some(synthesized_failure(&format!(
                "No executable entry file was found among the generated files: {listing}. Include a conventional entry point such as main.py."
            ))));
        };

        let result = tokio::select! {
            _ = wait_cancelled(cancel) => return Ok(None),
            result = self.executor.execute(&self.project.workdir, &entry) => result?,
        };
        Ok(Some(result))
    }

    async fn finish_cancelled(
        &self,
        events: &mpsc::Sender<SessionEvent>,
    ) -> Result<SessionOutcome, AppError> {
        emit(events, SessionEvent::Finished(SessionOutcome::Cancelled)).await;
        Ok(SessionOutcome::Cancelled)
    }

    fn log_write_report(&self, prefix: &str, report: &WriteReport) -> Result<(), AppError> {
        self.logger.log_json(
            &format!("{prefix}-write.json"),
            &json!({
                "written": report.written.iter().map(|p| p.display().to_string()).collect::<Vec<_>>(),
                "skipped": report.skipped_descriptions(),
            }),
        )
    }
}

fn synthesized_failure(message: &str) -> RunResult {
    RunResult {
        exit_code: 1,
        stdout: String::new(),
        stderr: message.to_string(),
        duration: Duration::ZERO,
        timed_out: false,
    }
}

async fn emit(events: &mpsc::Sender<SessionEvent>, event: SessionEvent) {
    // A dropped receiver means the UI is gone; the session finishes on its own.
    let _ = events.send(event).await;
}

// Resolves only once the cancel flag flips to true.
async fn wait_cancelled(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow() {
            return;
        }
        if cancel.changed().await.is_err() {
            // Sender dropped without cancelling; block forever.
            std::future::pending::<()>().await;
        }
    }
}
