//! Line-oriented interactive front end. Reads tasks and feedback from
//! stdin, spawns the session on its own task, and renders session events
//! as they arrive so `cancel` works while an attempt is in flight.

use crate::app_error::AppError;
use crate::config::Config;
use crate::llm::TextGenerator;
use crate::logger::Logger;
use crate::monitor::UsageMonitor;
use crate::prompt_builder;
use crate::runner::Executor;
use crate::session::{
    GenerationRequest, Session, SessionEvent, SessionOutcome, SessionState,
};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::sync::{mpsc, watch};

const MAX_SLUG_LEN: usize = 32;

pub struct Terminal {
    config: Config,
    logger: Arc<Logger>,
    monitor: Arc<dyn UsageMonitor>,
    generator: Arc<dyn TextGenerator>,
    executor: Arc<dyn Executor>,
}

impl Terminal {
    pub fn new(
        config: Config,
        logger: Arc<Logger>,
        monitor: Arc<dyn UsageMonitor>,
        generator: Arc<dyn TextGenerator>,
        executor: Arc<dyn Executor>,
    ) -> Self {
        Self {
            config,
            logger,
            monitor,
            generator,
            executor,
        }
    }

    /// The interactive loop. Returns when the user quits or stdin closes.
    pub async fn run(&self, initial_task: Option<String>) -> Result<(), AppError> {
        println!(
            "tinker - model {}, up to {} attempts per task, {}s run timeout",
            self.config.model,
            self.config.max_attempts,
            self.config.run_timeout.as_secs()
        );
        println!("Session logs: {}", self.logger.log_dir().display());
        println!("Commands: `cancel` stops the current attempt, `new <task>` starts a fresh project, `quit` exits.");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        // The active project, kept so later input becomes feedback on it.
        let mut current: Option<(Session, String)> = None;
        let mut pending = initial_task;

        loop {
            let input = match pending.take() {
                Some(task) => task,
                None => {
                    if current.is_some() {
                        println!("\nDescribe a change, or `new <task>` / `quit`:");
                    } else {
                        println!("\nWhat should I build?");
                    }
                    match lines.next_line().await? {
                        Some(line) => line,
                        None => return Ok(()),
                    }
                }
            };
            let input = input.trim().to_string();
            if input.is_empty() {
                continue;
            }
            if input == "quit" || input == "exit" {
                println!("Goodbye.");
                return Ok(());
            }
            if input == "cancel" {
                // Nothing is running between rounds.
                println!("No attempt is in progress.");
                continue;
            }

            let (session, request) = self.next_round(&mut current, input);
            let (session, outcome) = self.drive(session, request.clone(), &mut lines).await?;
            match outcome {
                Ok(outcome) => self.render_outcome(&outcome, &session),
                // A failed attempt never takes the session down; the project
                // and its files survive for the next round.
                Err(e) => {
                    println!("\nThe attempt failed: {e}");
                    println!(
                        "The project in {} is kept; try again or rephrase the task.",
                        session.project.workdir.display()
                    );
                    let _ = self.logger.log_text("last-error.txt", &e.to_string());
                }
            }
            current = Some((session, request.task));
        }
    }

    // Decide whether the input is feedback on the active project or a new
    // task, and build the matching session and request.
    fn next_round(
        &self,
        current: &mut Option<(Session, String)>,
        input: String,
    ) -> (Session, GenerationRequest) {
        if let Some(rest) = input.strip_prefix("new ") {
            let task = rest.trim().to_string();
            *current = None;
            let session = self.new_session(&task);
            return (
                session,
                GenerationRequest {
                    task,
                    language_hint: None,
                    feedback: None,
                },
            );
        }

        match current.take() {
            Some((session, task)) => (
                session,
                GenerationRequest {
                    task,
                    language_hint: None,
                    feedback: Some(input),
                },
            ),
            None => {
                let session = self.new_session(&input);
                (
                    session,
                    GenerationRequest {
                        task: input,
                        language_hint: None,
                        feedback: None,
                    },
                )
            }
        }
    }

    fn new_session(&self, task: &str) -> Session {
        let workdir = self.config.projects_dir.join(project_slug(task));
        println!("Project directory: {}", workdir.display());
        Session::new(
            self.generator.clone(),
            self.executor.clone(),
            self.logger.clone(),
            self.monitor.clone(),
            self.config.max_attempts,
            workdir,
        )
    }

    // Run one request to a terminal state while watching the input stream,
    // so `cancel` takes effect mid-attempt. The outer error covers only the
    // front end itself (input I/O, a panicked task); a failing attempt comes
    // back in the inner result with the session intact.
    async fn drive<R>(
        &self,
        mut session: Session,
        request: GenerationRequest,
        lines: &mut Lines<R>,
    ) -> Result<(Session, Result<SessionOutcome, AppError>), AppError>
    where
        R: AsyncBufRead + Unpin,
    {
        let (events_tx, mut events_rx) = mpsc::channel(64);
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let mut handle = tokio::spawn(async move {
            let mut cancel_rx = cancel_rx;
            let outcome = session.process(&request, &events_tx, &mut cancel_rx).await;
            (session, outcome)
        });

        let mut input_open = true;
        let joined = loop {
            tokio::select! {
                joined = &mut handle => break joined,
                event = events_rx.recv() => {
                    if let Some(event) = event {
                        self.render_event(&event);
                    }
                }
                line = lines.next_line(), if input_open => {
                    match line?.as_deref().map(str::trim) {
                        Some("cancel") | Some("quit") | Some("exit") => {
                            println!("Cancelling...");
                            let _ = cancel_tx.send(true);
                        }
                        Some("") => {}
                        Some(other) => {
                            println!("An attempt is running; `{other}` ignored. Type `cancel` to stop it.");
                        }
                        // Closed input; let the attempt run to completion.
                        None => input_open = false,
                    }
                }
            }
        };

        // The channel sender lives in the finished task; drain what is left.
        while let Ok(event) = events_rx.try_recv() {
            self.render_event(&event);
        }

        let (session, outcome) = joined
            .map_err(|e| AppError::Io(std::io::Error::other(format!("session task failed: {e}"))))?;
        Ok((session, outcome))
    }

    fn render_event(&self, event: &SessionEvent) {
        match event {
            SessionEvent::AttemptStarted { attempt, max_attempts } => {
                println!("\n--- Attempt {attempt}/{max_attempts} ---");
            }
            SessionEvent::StateChanged(state) => match state {
                SessionState::Generating => println!("Calling {}...", self.config.model),
                SessionState::Writing => println!("Writing files..."),
                SessionState::Running => println!("Running the program..."),
                SessionState::Retrying => println!("Run failed. Asking the model for a fix..."),
                _ => {}
            },
            SessionEvent::FilesWritten { written, skipped } => {
                for path in written {
                    println!("  wrote {}", path.display());
                }
                for reason in skipped {
                    println!("  skipped {reason}");
                }
            }
            SessionEvent::RunFinished { result, .. } => {
                if self.config.debug && !result.success() {
                    println!("{}", prompt_builder::render_run_output(result));
                }
            }
            SessionEvent::Finished(_) => {}
        }
    }

    fn render_outcome(&self, outcome: &SessionOutcome, session: &Session) {
        match outcome {
            SessionOutcome::Success { attempts, entry, result } => {
                println!(
                    "\nSuccess on attempt {attempts}. `{}` ran cleanly in {:.1}s.",
                    entry.display(),
                    result.duration.as_secs_f64()
                );
                if !result.stdout.is_empty() {
                    println!("\nOutput:\n{}", result.stdout.trim_end());
                }
                println!("\nFiles are in {}.", session.project.workdir.display());
            }
            SessionOutcome::Exhausted { attempts, last } => {
                println!("\nGiving up after {attempts} attempts. Last run:");
                println!("{}", prompt_builder::render_run_output(last));
                println!(
                    "The files are in {}; you can edit them by hand or describe a fix here.",
                    session.project.workdir.display()
                );
            }
            SessionOutcome::Cancelled => {
                println!("\nAttempt cancelled. The project keeps any files already written.");
            }
        }
    }
}

/// Derive a filesystem-safe project directory name from the task text.
pub fn project_slug(task: &str) -> String {
    let mut slug = String::new();
    let mut last_dash = true;
    for c in task.chars() {
        if slug.len() >= MAX_SLUG_LEN {
            break;
        }
        if c.is_ascii_alphanumeric() {
            slug.extend(c.to_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    let slug = slug.trim_matches('-').to_string();
    if slug.is_empty() {
        "project".to_string()
    } else {
        slug
    }
}
