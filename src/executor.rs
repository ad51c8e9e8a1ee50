use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use serde::Serialize;

use crate::challenge::ChallengeLoader;
use crate::error::DojoError;
use crate::outcome::{classify, ExecutionStatus, SENTINEL_EXIT_CODE};
use crate::preset::preset_for;
use crate::runner;
use crate::workspace::Workspace;

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 15;

/// One submission to be judged against a challenge's hidden suite.
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
  pub language: String,
  pub unit: String,
  pub code: String,
  pub timeout: Duration,
}

/// Structured data about one test execution run.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
  pub language: String,
  pub unit: String,
  pub status: ExecutionStatus,
  pub exit_code: i32,
  pub stdout: String,
  pub stderr: String,
  /// Wall-clock seconds from spawn to exit or kill
  pub duration: f64,
}

/// Dispatches execution requests to language-specific staging and runners.
pub struct CodeExecutor {
  loader: Arc<ChallengeLoader>,
}

impl ExecutionRequest {
  pub fn new<LS: Into<String>, US: Into<String>, CS: Into<String>>(
    language: LS,
    unit: US,
    code: CS,
  ) -> Self {
    ExecutionRequest {
      language: language.into(),
      unit: unit.into(),
      code: code.into(),
      timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
    }
  }

  pub fn timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }
}

impl CodeExecutor {
  pub fn new(loader: Arc<ChallengeLoader>) -> Self {
    CodeExecutor { loader }
  }

  /// Stage, run, classify and release for one request.
  ///
  /// Unknown challenges and unsupported languages short-circuit before any
  /// workspace exists. Everything after that point comes back as a
  /// well-formed result: staging and spawn failures are reported with
  /// status `error` and the failure text on stderr, never as a raw
  /// filesystem or process error.
  pub async fn execute(&self, request: &ExecutionRequest) -> Result<ExecutionResult, DojoError> {
    let preset = preset_for(&request.language)
      .ok_or_else(|| DojoError::UnsupportedLanguage(request.language.clone()))?;
    let metadata = self.loader.get(&request.language, &request.unit)?;

    info!(
      "Execute {}/{} ({} bytes, limit {}s)",
      metadata.language,
      metadata.unit,
      request.code.len(),
      request.timeout.as_secs()
    );

    let workspace = match Workspace::stage(&metadata, preset, &request.code) {
      Ok(workspace) => workspace,
      Err(err) => {
        warn!("Staging {}/{} fails: {}", metadata.language, metadata.unit, err);
        return Ok(Self::error_result(request, &err));
      }
    };

    let test_filename = metadata
      .test_path
      .file_name()
      .map(|name| name.to_string_lossy().to_string())
      .unwrap_or_default();
    let command = preset.test_command(&test_filename);

    let outcome = match runner::run(workspace.path(), &command, request.timeout).await {
      Ok(outcome) => outcome,
      Err(err) => {
        warn!("Running {}/{} fails: {}", metadata.language, metadata.unit, err);
        if let Err(err) = workspace.close() {
          warn!("{}", err);
        }
        return Ok(Self::error_result(request, &err));
      }
    };

    if let Err(err) = workspace.close() {
      warn!("{}", err);
    }

    let status = classify(outcome.exit_code, outcome.timed_out);
    info!(
      "Execute {}/{} finished: {} in {:.3}s",
      metadata.language,
      metadata.unit,
      status,
      outcome.duration.as_secs_f64()
    );

    Ok(ExecutionResult {
      language: metadata.language.clone(),
      unit: metadata.unit.clone(),
      status,
      exit_code: outcome.exit_code.unwrap_or(SENTINEL_EXIT_CODE),
      stdout: outcome.stdout,
      stderr: outcome.stderr,
      duration: outcome.duration.as_secs_f64(),
    })
  }

  fn error_result(request: &ExecutionRequest, err: &DojoError) -> ExecutionResult {
    ExecutionResult {
      language: request.language.clone(),
      unit: request.unit.clone(),
      status: ExecutionStatus::Error,
      exit_code: SENTINEL_EXIT_CODE,
      stdout: String::new(),
      stderr: err.to_string(),
      duration: 0.0,
    }
  }
}
