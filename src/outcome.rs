use std::fmt::{Display, Formatter};

use serde::Serialize;

/// Exit code reported when the harness produced no meaningful one
/// (timeout, signal kill, spawn failure).
pub const SENTINEL_EXIT_CODE: i32 = -1;

/// Terminal classification of one execution attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
  Passed,
  Failed,
  Timeout,
  Error,
}

impl Display for ExecutionStatus {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      ExecutionStatus::Passed => f.write_str("passed"),
      ExecutionStatus::Failed => f.write_str("failed"),
      ExecutionStatus::Timeout => f.write_str("timeout"),
      ExecutionStatus::Error => f.write_str("error"),
    }
  }
}

/// Map the harness exit status and the timeout flag to an outcome.
///
/// The timeout flag wins over whatever partial exit status exists. A missing
/// exit code with no timeout means the harness was killed by a signal: it ran
/// and did not pass, so that is a failure, not an error. Spawn failures never
/// reach this function.
pub fn classify(exit_code: Option<i32>, timed_out: bool) -> ExecutionStatus {
  if timed_out {
    ExecutionStatus::Timeout
  } else {
    match exit_code {
      Some(0) => ExecutionStatus::Passed,
      _ => ExecutionStatus::Failed,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn zero_exit_passes() {
    assert_eq!(classify(Some(0), false), ExecutionStatus::Passed);
  }

  #[test]
  fn nonzero_exit_fails() {
    for code in [1, 2, 101, 139, -1] {
      assert_eq!(classify(Some(code), false), ExecutionStatus::Failed);
    }
  }

  #[test]
  fn timeout_wins_over_exit_code() {
    assert_eq!(classify(Some(0), true), ExecutionStatus::Timeout);
    assert_eq!(classify(Some(1), true), ExecutionStatus::Timeout);
    assert_eq!(classify(None, true), ExecutionStatus::Timeout);
  }

  #[test]
  fn signal_kill_is_a_failure() {
    assert_eq!(classify(None, false), ExecutionStatus::Failed);
  }

  #[test]
  fn status_serializes_lowercase() {
    let json = serde_json::to_string(&ExecutionStatus::Timeout).unwrap();
    assert_eq!(json, "\"timeout\"");
  }
}
