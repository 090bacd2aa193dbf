//! tinker: a terminal coding agent that asks an LLM for a program, writes
//! the files, runs them, and feeds failures back until the run succeeds or
//! the attempt budget is spent.

pub mod app_error;
pub mod cli;
pub mod config;
pub mod file_writer;
pub mod language;
pub mod llm;
pub mod logger;
pub mod monitor;
pub mod prompt_builder;
pub mod prompts;
pub mod response_parser;
pub mod runner;
pub mod session;
pub mod terminal;

#[cfg(test)]
mod cli_test;
#[cfg(test)]
mod runner_test;

use crate::app_error::AppError;
use crate::llm::LlmGenerator;
use crate::logger::Logger;
use crate::monitor::JsonlMonitor;
use crate::runner::Runner;
use crate::terminal::Terminal;
use std::sync::Arc;

pub async fn run() -> Result<(), AppError> {
    let args = cli::parse_cli_args()?;
    let config = config::Config::load(&args)?;

    let logger = Arc::new(Logger::new(&config.projects_dir, "session")?);
    let monitor = Arc::new(JsonlMonitor::new(logger.log_dir().join("usage.jsonl")));
    let generator = Arc::new(LlmGenerator::new(
        &config,
        logger.clone(),
        monitor.clone() as Arc<dyn monitor::UsageMonitor>,
    ));
    let executor = Arc::new(Runner::new(config.run_timeout));

    let initial_task = args.task.clone();
    let terminal = Terminal::new(config, logger.clone(), monitor, generator, executor);

    let result = terminal.run(initial_task).await;
    if let Err(e) = &result {
        let _ = logger.log_text("final-error.txt", &e.to_string());
    }
    result
}
