//! Assembles the text sent to the LLM. Pure functions of their inputs; the
//! session decides when to call which.

use crate::prompts::{REPAIR_INSTRUCTION, SYSTEM_INSTRUCTION};
use crate::runner::RunResult;

/// Upper bound on how many characters of captured output are embedded in a
/// retry prompt, so repeated failures cannot blow out the model's context.
pub const FEEDBACK_CHAR_BUDGET: usize = 6_000;

pub fn build_initial_prompt(task: &str, language_hint: Option<&str>) -> String {
    let mut prompt = String::new();
    prompt.push_str(SYSTEM_INSTRUCTION);
    prompt.push_str("\n\nTask:\n");
    prompt.push_str(task);
    if let Some(language) = language_hint {
        prompt.push_str(&format!("\n\nImplement the program in {language}."));
    }
    prompt
}

/// Build the follow-up prompt after a failed attempt. `failure_report` is the
/// rendered output of the failed run (or a description of why no run
/// happened), truncated to the feedback budget.
pub fn build_retry_prompt(
    task: &str,
    language_hint: Option<&str>,
    failure_report: &str,
) -> String {
    let mut prompt = build_initial_prompt(task, language_hint);
    prompt.push_str("\n\n");
    prompt.push_str(REPAIR_INSTRUCTION);
    prompt.push_str("\n\n");
    prompt.push_str(&truncate_to_budget(failure_report, FEEDBACK_CHAR_BUDGET));
    prompt
}

/// Build the prompt for a round driven by the user's own feedback rather
/// than a failed run.
pub fn build_feedback_prompt(task: &str, language_hint: Option<&str>, feedback: &str) -> String {
    let mut prompt = build_initial_prompt(task, language_hint);
    prompt.push_str("\n\nThe user reviewed the previous version and gave this feedback:\n");
    prompt.push_str(&truncate_to_budget(feedback, FEEDBACK_CHAR_BUDGET));
    prompt.push_str(
        "\n\nRevise the program accordingly and return the complete set of files again, every file as a full fenced code block labeled with its filename.",
    );
    prompt
}

/// Render a run result the way it is shown to the model and the user.
pub fn render_run_output(result: &RunResult) -> String {
    let mut report = format!(
        "exit code: {}\n\nSTDOUT:\n{}\n\nSTDERR:\n{}",
        result.exit_code, result.stdout, result.stderr
    );
    if result.timed_out {
        report.push_str("\n\nExecution exceeded the time limit and was killed.");
    }
    report
}

// Keeps the tail of the text: compilers and runtimes put the decisive error
// last, so the most recent lines are the ones worth preserving.
fn truncate_to_budget(text: &str, budget: usize) -> String {
    if text.chars().count() <= budget {
        return text.to_string();
    }
    let tail: String = text
        .chars()
        .rev()
        .take(budget)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("[earlier output truncated]\n{tail}")
}
