use crate::app_error::AppError;
use crate::runner::*;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::tempdir;

fn write(workdir: &Path, name: &str, content: &str) {
    fs::write(workdir.join(name), content).unwrap();
}

#[tokio::test]
async fn runs_a_python_hello_world() {
    let dir = tempdir().unwrap();
    write(dir.path(), "main.py", "print(\"hello\")\n");

    let runner = Runner::new(Duration::from_secs(10));
    let result = runner.run(dir.path(), Path::new("main.py")).await.unwrap();

    assert_eq!(result.exit_code, 0);
    assert!(result.success());
    assert!(result.stdout.contains("hello"));
    assert!(!result.timed_out);
}

#[tokio::test]
async fn nonzero_exit_code_is_captured() {
    let dir = tempdir().unwrap();
    write(dir.path(), "main.py", "import sys\nsys.exit(3)\n");

    let runner = Runner::new(Duration::from_secs(10));
    let result = runner.run(dir.path(), Path::new("main.py")).await.unwrap();

    assert_eq!(result.exit_code, 3);
    assert!(!result.success());
}

#[tokio::test]
async fn stderr_is_captured_on_failure() {
    let dir = tempdir().unwrap();
    write(dir.path(), "main.py", "raise RuntimeError(\"boom\")\n");

    let runner = Runner::new(Duration::from_secs(10));
    let result = runner.run(dir.path(), Path::new("main.py")).await.unwrap();

    assert!(!result.success());
    assert!(result.stderr.contains("boom"));
}

#[tokio::test]
async fn unsupported_extension_errors_without_spawning() {
    let dir = tempdir().unwrap();
    write(dir.path(), "program.xyz", "whatever");

    let runner = Runner::new(Duration::from_secs(10));
    let err = runner
        .run(dir.path(), Path::new("program.xyz"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::UnsupportedLanguage(ref ext) if ext == ".xyz"));
}

#[tokio::test]
async fn missing_entry_file_fails_fast() {
    let dir = tempdir().unwrap();

    let runner = Runner::new(Duration::from_secs(10));
    let err = runner
        .run(dir.path(), Path::new("main.py"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::MissingEntryFile(_)));
}

#[tokio::test]
async fn markup_entry_short_circuits_to_success() {
    let dir = tempdir().unwrap();
    write(dir.path(), "index.html", "<html></html>");

    let runner = Runner::new(Duration::from_secs(10));
    let result = runner
        .run(dir.path(), Path::new("index.html"))
        .await
        .unwrap();

    assert!(result.success());
    assert!(result.stdout.contains("nothing to execute"));
}

#[tokio::test]
async fn runaway_process_is_killed_at_the_timeout() {
    let dir = tempdir().unwrap();
    write(dir.path(), "main.py", "while True:\n    pass\n");

    let runner = Runner::new(Duration::from_millis(500));
    let result = runner.run(dir.path(), Path::new("main.py")).await.unwrap();

    assert!(result.timed_out);
    assert!(!result.success());
    assert_eq!(result.exit_code, -1);
    assert!(result.stderr.contains("timed out"));
}

#[tokio::test]
async fn oversized_output_is_truncated_not_an_error() {
    let dir = tempdir().unwrap();
    write(dir.path(), "main.py", "print(\"x\" * 100000)\n");

    let runner = Runner::with_capture_limit(Duration::from_secs(10), 1024);
    let result = runner.run(dir.path(), Path::new("main.py")).await.unwrap();

    assert!(result.success());
    assert!(result.stdout.len() <= 1024 + "\n... [output truncated]".len());
    assert!(result.stdout.ends_with("... [output truncated]"));
}

#[tokio::test]
async fn output_far_past_the_cap_is_drained_not_retained() {
    let dir = tempdir().unwrap();
    // Several MB of output against a 1 KiB cap; the child must run to
    // completion without blocking on a full pipe.
    write(
        dir.path(),
        "main.py",
        "for _ in range(500):\n    print(\"y\" * 10000)\n",
    );

    let runner = Runner::with_capture_limit(Duration::from_secs(30), 1024);
    let result = runner.run(dir.path(), Path::new("main.py")).await.unwrap();

    assert!(result.success());
    assert!(result.stdout.len() <= 1024 + "\n... [output truncated]".len());
    assert!(result.stdout.ends_with("... [output truncated]"));
}

#[tokio::test]
async fn timeout_keeps_the_output_captured_so_far() {
    let dir = tempdir().unwrap();
    write(
        dir.path(),
        "main.py",
        "import sys\nprint(\"before the hang\")\nsys.stdout.flush()\nwhile True:\n    pass\n",
    );

    let runner = Runner::new(Duration::from_millis(500));
    let result = runner.run(dir.path(), Path::new("main.py")).await.unwrap();

    assert!(result.timed_out);
    assert!(result.stdout.contains("before the hang"));
    assert!(result.stderr.contains("timed out"));
}

#[tokio::test]
async fn missing_toolchain_reports_a_failing_result() {
    let dir = tempdir().unwrap();
    // C# via csc/mono is the table entry least likely to be installed; if it
    // is, the empty program still fails to build, so either way the result
    // is a failure rather than an error.
    write(dir.path(), "main.cs", "nonsense");

    let runner = Runner::new(Duration::from_secs(10));
    let result = runner.run(dir.path(), Path::new("main.cs")).await.unwrap();

    assert!(!result.success());
    assert!(!result.stderr.is_empty() || !result.stdout.is_empty());
}
