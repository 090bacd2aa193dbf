//! Executes a generated program: resolves the language from the entry file's
//! extension, builds if the language needs it, runs under a timeout, and
//! captures bounded output. Build and runtime failures come back as the same
//! `RunResult` shape so the session never has to tell them apart.

use crate::app_error::AppError;
use crate::language;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::AsyncReadExt;
use tokio::process::Command;

pub const DEFAULT_MAX_CAPTURE_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
    pub timed_out: bool,
}

impl RunResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0 && !self.timed_out
    }
}

/// Execution seam for the session; `Runner` is the real implementation and
/// tests substitute scripted ones.
pub trait Executor: Send + Sync {
    fn execute<'a>(
        &'a self,
        workdir: &'a Path,
        entry: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<RunResult, AppError>> + Send + 'a>>;
}

pub struct Runner {
    timeout: Duration,
    max_capture_bytes: usize,
}

impl Runner {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            max_capture_bytes: DEFAULT_MAX_CAPTURE_BYTES,
        }
    }

    #[cfg(test)]
    pub fn with_capture_limit(timeout: Duration, max_capture_bytes: usize) -> Self {
        Self {
            timeout,
            max_capture_bytes,
        }
    }

    pub async fn run(&self, workdir: &Path, entry: &Path) -> Result<RunResult, AppError> {
        if !workdir.join(entry).is_file() {
            return Err(AppError::MissingEntryFile(entry.to_path_buf()));
        }

        let spec = language::spec_for_path(entry).ok_or_else(|| {
            let ext = entry
                .extension()
                .map(|e| format!(".{}", e.to_string_lossy()))
                .unwrap_or_else(|| "(none)".to_string());
            AppError::UnsupportedLanguage(ext)
        })?;

        if !spec.executable {
            return Ok(RunResult {
                exit_code: 0,
                stdout: format!(
                    "{} is a {} file; nothing to execute.",
                    entry.display(),
                    spec.name
                ),
                stderr: String::new(),
                duration: Duration::ZERO,
                timed_out: false,
            });
        }

        let start = Instant::now();

        if let Some(build_template) = spec.build {
            if let Some(argv) = language::expand_template(build_template, entry) {
                let mut build = self.spawn_bounded(workdir, &argv).await;
                if !build.success() {
                    build.duration = start.elapsed();
                    return Ok(build);
                }
            }
        }

        let argv = language::expand_template(spec.run, entry).ok_or_else(|| {
            AppError::Config(format!("{} has an empty run command", spec.name))
        })?;
        let mut result = self.spawn_bounded(workdir, &argv).await;
        result.duration = start.elapsed();
        Ok(result)
    }

    // Spawn one command and wait for it under the timeout. Failure to spawn
    // (missing toolchain, for instance) is reported as a failing result, not
    // an error, so it flows back to the model like any other failure.
    async fn spawn_bounded(&self, workdir: &Path, argv: &[String]) -> RunResult {
        let Some((program, args)) = argv.split_first() else {
            return RunResult {
                exit_code: 127,
                stdout: String::new(),
                stderr: "Empty command template.".to_string(),
                duration: Duration::ZERO,
                timed_out: false,
            };
        };

        let spawned = Command::new(program)
            .args(args)
            .current_dir(workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                return RunResult {
                    exit_code: 127,
                    stdout: String::new(),
                    stderr: format!(
                        "Failed to execute '{program}'. The toolchain may not be installed.\n\nError: {e}"
                    ),
                    duration: Duration::ZERO,
                    timed_out: false,
                }
            }
        };

        // The pipes are drained concurrently with the wait: bytes past the
        // cap are read and discarded so the child never blocks on a full
        // pipe, and nothing past the cap is ever retained.
        let cap = self.max_capture_bytes;
        let stdout_task = tokio::spawn(read_capped(child.stdout.take(), cap));
        let stderr_task = tokio::spawn(read_capped(child.stderr.take(), cap));

        let start = Instant::now();
        match tokio::time::timeout(self.timeout, child.wait()).await {
            Ok(Ok(status)) => {
                let (stdout, out_truncated) = stdout_task.await.unwrap_or_default();
                let (stderr, err_truncated) = stderr_task.await.unwrap_or_default();
                RunResult {
                    exit_code: status.code().unwrap_or(-1),
                    stdout: finish_capture(stdout, out_truncated),
                    stderr: finish_capture(stderr, err_truncated),
                    duration: start.elapsed(),
                    timed_out: false,
                }
            }
            Ok(Err(e)) => RunResult {
                exit_code: -1,
                stdout: String::new(),
                stderr: format!("Failed to collect process output: {e}"),
                duration: start.elapsed(),
                timed_out: false,
            },
            Err(_) => {
                // Kill and reap, then keep whatever the readers saw so the
                // model gets the output leading up to the hang.
                let _ = child.start_kill();
                let _ = child.wait().await;
                let (stdout, out_truncated) = stdout_task.await.unwrap_or_default();
                let (stderr, err_truncated) = stderr_task.await.unwrap_or_default();
                let mut stderr = finish_capture(stderr, err_truncated);
                if !stderr.is_empty() {
                    stderr.push('\n');
                }
                stderr.push_str(&format!(
                    "Execution timed out after {} seconds.",
                    self.timeout.as_secs_f64()
                ));
                RunResult {
                    exit_code: -1,
                    stdout: finish_capture(stdout, out_truncated),
                    stderr,
                    duration: start.elapsed(),
                    timed_out: true,
                }
            }
        }
    }
}

// Read a pipe to EOF, retaining at most `cap` bytes. Returns the captured
// prefix and whether anything beyond it was discarded.
async fn read_capped<R>(reader: Option<R>, cap: usize) -> (Vec<u8>, bool)
where
    R: tokio::io::AsyncRead + Unpin,
{
    let Some(mut reader) = reader else {
        return (Vec::new(), false);
    };
    let mut chunk = vec![0u8; 8 * 1024];
    let mut captured = Vec::new();
    let mut truncated = false;
    loop {
        match reader.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                let room = cap.saturating_sub(captured.len());
                let take = n.min(room);
                captured.extend_from_slice(&chunk[..take]);
                if take < n {
                    truncated = true;
                }
            }
        }
    }
    (captured, truncated)
}

impl Executor for Runner {
    fn execute<'a>(
        &'a self,
        workdir: &'a Path,
        entry: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<RunResult, AppError>> + Send + 'a>> {
        Box::pin(self.run(workdir, entry))
    }
}

fn finish_capture(mut bytes: Vec<u8>, truncated: bool) -> String {
    if truncated {
        // The cap may have cut a multi-byte character; drop the partial tail.
        while matches!(bytes.last(), Some(b) if b & 0b1100_0000 == 0b1000_0000) {
            bytes.pop();
        }
        if matches!(bytes.last(), Some(b) if *b >= 0xC0) {
            bytes.pop();
        }
    }
    let text = String::from_utf8_lossy(&bytes);
    if truncated {
        format!("{text}\n... [output truncated]")
    } else {
        text.into_owned()
    }
}
