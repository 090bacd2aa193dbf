use crate::cli::*;
use std::path::PathBuf;

fn parse(args: &[&str]) -> Result<CliArgs, crate::app_error::AppError> {
    parse_args(args.iter().map(|s| s.to_string()))
}

#[test]
fn no_arguments_gives_defaults() {
    let args = parse(&[]).unwrap();
    assert_eq!(args, CliArgs::default());
}

#[test]
fn free_words_become_the_initial_task() {
    let args = parse(&["write", "a", "fizzbuzz", "program"]).unwrap();
    assert_eq!(args.task.as_deref(), Some("write a fizzbuzz program"));
}

#[test]
fn flags_and_task_mix() {
    let args = parse(&[
        "--model",
        "gpt-4o-mini",
        "--max-attempts",
        "5",
        "--timeout",
        "10",
        "--projects-dir",
        "/tmp/projects",
        "snake",
        "game",
    ])
    .unwrap();

    assert_eq!(args.model.as_deref(), Some("gpt-4o-mini"));
    assert_eq!(args.max_attempts, Some(5));
    assert_eq!(args.timeout_secs, Some(10));
    assert_eq!(args.projects_dir, Some(PathBuf::from("/tmp/projects")));
    assert_eq!(args.task.as_deref(), Some("snake game"));
}

#[test]
fn unknown_flag_is_an_error() {
    let err = parse(&["--frobnicate"]).unwrap_err();
    assert!(err.to_string().contains("Unknown argument: --frobnicate"));
}

#[test]
fn missing_flag_value_is_an_error() {
    let err = parse(&["--model"]).unwrap_err();
    assert!(err.to_string().contains("Missing value for --model"));
}

#[test]
fn non_numeric_max_attempts_is_an_error() {
    let err = parse(&["--max-attempts", "lots"]).unwrap_err();
    assert!(err.to_string().contains("positive integer"));
}

#[test]
fn zero_max_attempts_is_rejected() {
    let err = parse(&["--max-attempts", "0"]).unwrap_err();
    assert!(err.to_string().contains("at least 1"));
}
