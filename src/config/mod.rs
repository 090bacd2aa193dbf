use crate::app_error::AppError;
use crate::cli::CliArgs;
use std::path::PathBuf;
use std::time::Duration;


pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
pub const DEFAULT_TEMPERATURE: f32 = 0.0;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_PROJECTS_DIR: &str = "ai-projects";

// Checked in order; the first non-blank value wins.
const API_KEY_VARS: &[&str] = &[
    "OPENAI_API_KEY",
    "ANTHROPIC_API_KEY",
    "API_KEY",
    "LLM_API_KEY",
];

#[derive(Debug, Clone)]
pub struct Config {
    pub model: String,
    pub api_url: String,
    pub api_key: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub max_attempts: u32,
    pub run_timeout: Duration,
    pub projects_dir: PathBuf,
    pub debug: bool,
}

impl Config {
    /// Build the runtime configuration from defaults, the environment, and
    /// CLI overrides. A missing credential is fatal here, at startup, so the
    /// interactive session never discovers it mid-attempt.
    pub fn load(args: &CliArgs) -> Result<Self, AppError> {
        // A local .env is honored but optional.
        dotenvy::dotenv().ok();
        Self::from_env(args, |name| std::env::var(name).ok())
    }

    pub(crate) fn from_env(
        args: &CliArgs,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AppError> {
        let api_key = resolve_api_key(&env).ok_or_else(|| {
            AppError::Config(format!(
                "No API key found. Set one of {} in the environment or a .env file.",
                API_KEY_VARS.join(", ")
            ))
        })?;

        let api_url = env("LLM_API_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let debug = env("TINKER_DEBUG")
            .map(|v| !v.trim().is_empty() && v.trim() != "0")
            .unwrap_or(false);

        Ok(Self {
            model: args.model.clone().unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_url,
            api_key,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            max_attempts: args.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS),
            run_timeout: args
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_RUN_TIMEOUT),
            projects_dir: args
                .projects_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PROJECTS_DIR)),
            debug,
        })
    }
}

fn resolve_api_key(env: impl Fn(&str) -> Option<String>) -> Option<String> {
    for var in API_KEY_VARS {
        if let Some(value) = env(var) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
    }
    None
}
