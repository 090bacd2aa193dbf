//! Persists a batch of generated files under a working directory.

use crate::app_error::AppError;
use crate::response_parser::GeneratedFile;
use path_clean::PathClean;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Outcome of one batch write. An unsafe path skips that file only; the rest
/// of the batch is still written.
#[derive(Debug, Default)]
pub struct WriteReport {
    pub written: Vec<PathBuf>,
    pub skipped: Vec<(PathBuf, AppError)>,
}

impl WriteReport {
    /// One human-readable line per skipped file.
    pub fn skipped_descriptions(&self) -> Vec<String> {
        self.skipped
            .iter()
            .map(|(path, err)| format!("{}: {}", path.display(), err))
            .collect()
    }

    pub fn describe_skipped(&self) -> String {
        self.skipped_descriptions().join("\n")
    }
}

/// Write every file in the batch to `workdir/<relative path>`, creating
/// directories as needed and overwriting unconditionally.
pub fn write_files(workdir: &Path, files: &[GeneratedFile]) -> Result<WriteReport, AppError> {
    fs::create_dir_all(workdir)?;

    let mut report = WriteReport::default();
    for file in files {
        let relative = match sanitize_path(&file.path) {
            Ok(p) => p,
            Err(err) => {
                report.skipped.push((file.path.clone(), err));
                continue;
            }
        };

        let target = workdir.join(&relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, &file.content)?;
        report.written.push(relative);
    }
    Ok(report)
}

/// Reject absolute paths, parent-directory traversal, and `.git` components.
/// Returns the cleaned relative path on success.
pub fn sanitize_path(path: &Path) -> Result<PathBuf, AppError> {
    // Clean after the component check, not before: cleaning first would
    // silently swallow leading '..' segments.
    for component in path.components() {
        match component {
            Component::RootDir | Component::Prefix(_) => {
                return Err(AppError::UnsafePath(path.to_path_buf()));
            }
            Component::ParentDir => {
                return Err(AppError::UnsafePath(path.to_path_buf()));
            }
            Component::Normal(part) => {
                if part.to_str() == Some(".git") {
                    return Err(AppError::UnsafePath(path.to_path_buf()));
                }
            }
            Component::CurDir => {}
        }
    }

    let cleaned = path.clean();
    if cleaned.as_os_str().is_empty() || cleaned == Path::new(".") {
        return Err(AppError::UnsafePath(path.to_path_buf()));
    }
    Ok(cleaned)
}
