use crate::app_error::AppError;
use std::path::PathBuf;

#[derive(Debug, Default, PartialEq)]
pub struct CliArgs {
    pub model: Option<String>,
    pub max_attempts: Option<u32>,
    pub timeout_secs: Option<u64>,
    pub projects_dir: Option<PathBuf>,
    /// Free arguments join into an initial task description; when absent the
    /// interactive session prompts for one.
    pub task: Option<String>,
}

pub fn parse_cli_args() -> Result<CliArgs, AppError> {
    parse_args(std::env::args().skip(1))
}

pub fn parse_args<I>(args: I) -> Result<CliArgs, AppError>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut parsed = CliArgs::default();
    let mut task_words: Vec<String> = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--model" => {
                parsed.model = Some(required_value(&mut args, "--model")?);
            }
            "--max-attempts" => {
                let value = required_value(&mut args, "--max-attempts")?;
                let n: u32 = value.parse().map_err(|_| {
                    AppError::Config(format!("--max-attempts expects a positive integer, got '{value}'"))
                })?;
                if n == 0 {
                    return Err(AppError::Config(
                        "--max-attempts must be at least 1".to_string(),
                    ));
                }
                parsed.max_attempts = Some(n);
            }
            "--timeout" => {
                let value = required_value(&mut args, "--timeout")?;
                let secs: u64 = value.parse().map_err(|_| {
                    AppError::Config(format!("--timeout expects seconds, got '{value}'"))
                })?;
                parsed.timeout_secs = Some(secs);
            }
            "--projects-dir" => {
                parsed.projects_dir = Some(PathBuf::from(required_value(&mut args, "--projects-dir")?));
            }
            other if other.starts_with("--") => {
                return Err(AppError::Config(format!("Unknown argument: {other}")));
            }
            word => {
                task_words.push(word.to_string());
            }
        }
    }

    if !task_words.is_empty() {
        parsed.task = Some(task_words.join(" "));
    }
    Ok(parsed)
}

fn required_value<I>(args: &mut I, flag: &str) -> Result<String, AppError>
where
    I: Iterator<Item = String>,
{
    args.next()
        .ok_or_else(|| AppError::Config(format!("Missing value for {flag} argument")))
}
