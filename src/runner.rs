use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::time::timeout;

use crate::error::DojoError;

const TIMEOUT_MARKER: &str = "Execution timed out.";

/// What one harness run produced, before classification.
#[derive(Debug)]
pub struct RawOutcome {
  /// Exit code, absent on timeout or signal kill
  pub exit_code: Option<i32>,
  pub timed_out: bool,
  pub stdout: String,
  pub stderr: String,
  pub duration: Duration,
}

/// Run the test command inside the workspace under a wall-clock deadline.
///
/// stdout and stderr are buffered in full. If the deadline expires the child
/// is killed and reaped, partial output captured so far is retained and a
/// timeout marker is appended to stderr. Exactly one child process is
/// created per call and none survives the return, on any path.
pub async fn run(
  workdir: &Path,
  command: &[String],
  limit: Duration,
) -> Result<RawOutcome, DojoError> {
  let (program, arguments) = command
    .split_first()
    .ok_or_else(|| DojoError::spawn("Empty test command"))?;

  debug!("Spawn `{}` in {}", command.join(" "), workdir.display());
  let start = Instant::now();

  let mut child = Command::new(program)
    .args(arguments)
    .current_dir(workdir)
    .stdin(Stdio::null())
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .kill_on_drop(true)
    .spawn()
    .map_err(|err| DojoError::spawn(format!("Spawn {} fails: {}", program, err)))?;

  let stdout = child.stdout.take();
  let stderr = child.stderr.take();
  let capture = tokio::spawn(capture_output(stdout, stderr));

  let (exit_code, timed_out) = match timeout(limit, child.wait()).await {
    Ok(Ok(status)) => {
      debug!("Child process exited with status {:?}", status.code());
      (status.code(), false)
    }
    Ok(Err(err)) => {
      kill(&mut child).await;
      return Err(DojoError::spawn(format!("Wait for child fails: {}", err)));
    }
    Err(_) => {
      info!("Child process hit the {}s deadline, killing it", limit.as_secs());
      kill(&mut child).await;
      (None, true)
    }
  };

  let duration = start.elapsed();

  // The pipes close once the child is gone, so the readers finish promptly.
  // A killed harness may leave grandchildren holding the pipe open, so the
  // post-kill read gets a short grace period instead of an unbounded wait.
  let (stdout, mut stderr) = if timed_out {
    match timeout(Duration::from_secs(2), capture).await {
      Ok(Ok(captured)) => captured,
      _ => {
        warn!("Partial output lost: pipe still held after kill");
        (String::new(), String::new())
      }
    }
  } else {
    capture
      .await
      .map_err(|err| DojoError::spawn(format!("Capture output fails: {}", err)))?
  };

  if timed_out {
    if !stderr.is_empty() && !stderr.ends_with('\n') {
      stderr.push('\n');
    }
    stderr.push_str(TIMEOUT_MARKER);
  }

  Ok(RawOutcome {
    exit_code,
    timed_out,
    stdout,
    stderr,
    duration,
  })
}

async fn capture_output(
  stdout: Option<ChildStdout>,
  stderr: Option<ChildStderr>,
) -> (String, String) {
  let mut out = Vec::new();
  let mut err = Vec::new();
  if let Some(mut stdout) = stdout {
    let _ = stdout.read_to_end(&mut out).await;
  }
  if let Some(mut stderr) = stderr {
    let _ = stderr.read_to_end(&mut err).await;
  }
  (
    String::from_utf8_lossy(&out).to_string(),
    String::from_utf8_lossy(&err).to_string(),
  )
}

async fn kill(child: &mut Child) {
  if let Err(err) = child.start_kill() {
    warn!("Kill child process fails: {}", err);
  }
  if let Err(err) = child.wait().await {
    warn!("Reap child process fails: {}", err);
  }
}

#[cfg(test)]
mod tests {
  use tempfile::tempdir;

  use super::*;

  fn sh(script: &str) -> Vec<String> {
    vec!["sh".to_string(), "-c".to_string(), script.to_string()]
  }

  #[tokio::test]
  async fn captures_both_streams_and_exit_code() {
    let dir = tempdir().unwrap();
    let outcome = run(
      dir.path(),
      &sh("echo out; echo err >&2; exit 3"),
      Duration::from_secs(5),
    )
    .await
    .unwrap();

    assert_eq!(outcome.exit_code, Some(3));
    assert!(!outcome.timed_out);
    assert_eq!(outcome.stdout, "out\n");
    assert_eq!(outcome.stderr, "err\n");
  }

  #[tokio::test]
  async fn runs_in_the_given_working_directory() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("marker.txt"), "here\n").unwrap();
    let outcome = run(dir.path(), &sh("cat marker.txt"), Duration::from_secs(5))
      .await
      .unwrap();

    assert_eq!(outcome.exit_code, Some(0));
    assert_eq!(outcome.stdout, "here\n");
  }

  #[tokio::test]
  async fn deadline_expiry_kills_the_child_and_keeps_partial_output() {
    let dir = tempdir().unwrap();
    let start = Instant::now();
    let outcome = run(
      dir.path(),
      &sh("echo before; exec sleep 30"),
      Duration::from_secs(1),
    )
    .await
    .unwrap();

    assert!(outcome.timed_out);
    assert_eq!(outcome.exit_code, None);
    assert_eq!(outcome.stdout, "before\n");
    assert!(outcome.stderr.contains(TIMEOUT_MARKER));
    // The sleep must not run to completion
    assert!(start.elapsed() < Duration::from_secs(10));
  }

  #[tokio::test]
  async fn missing_program_is_a_spawn_error() {
    let dir = tempdir().unwrap();
    let command = vec!["dojo-no-such-interpreter".to_string()];
    let result = run(dir.path(), &command, Duration::from_secs(1)).await;
    assert!(matches!(result, Err(DojoError::Spawn(_))));
  }

  #[tokio::test]
  async fn empty_command_is_rejected() {
    let dir = tempdir().unwrap();
    let result = run(dir.path(), &[], Duration::from_secs(1)).await;
    assert!(matches!(result, Err(DojoError::Spawn(_))));
  }
}
