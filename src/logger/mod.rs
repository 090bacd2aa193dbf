use crate::app_error::AppError;
use chrono::Utc;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};


/// Session-scoped file logger. Every session gets its own timestamped
/// directory under `<projects dir>/logs`, holding the prompts, raw replies,
/// write reports, and run results for each attempt.
pub struct Logger {
    log_dir: PathBuf,
}

impl Logger {
    pub fn new(base_dir: &Path, slug: &str) -> Result<Self, AppError> {
        let timestamp = Utc::now().format("%Y-%m-%d-%H-%M-%S").to_string();
        let dir_name = if slug.is_empty() {
            timestamp
        } else {
            format!("{timestamp}-{slug}")
        };
        let log_dir = base_dir.join("logs").join(dir_name);
        fs::create_dir_all(&log_dir)?;
        Ok(Self { log_dir })
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    fn path_for(&self, file_name: &str) -> PathBuf {
        self.log_dir.join(file_name)
    }

    pub fn log_text(&self, file_name: &str, content: &str) -> Result<(), AppError> {
        let path = self.path_for(file_name);
        fs::write(path, content)?;
        Ok(())
    }

    pub fn log_json(&self, file_name: &str, content: &Value) -> Result<(), AppError> {
        let path = self.path_for(file_name);
        let pretty_json = serde_json::to_string_pretty(content)?;
        fs::write(path, pretty_json)?;
        Ok(())
    }

    /// Append one JSON object as a line to a `.jsonl` file in the log dir.
    pub fn append_jsonl(&self, file_name: &str, content: &Value) -> Result<(), AppError> {
        use std::io::Write;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path_for(file_name))?;
        writeln!(file, "{content}")?;
        Ok(())
    }
}
