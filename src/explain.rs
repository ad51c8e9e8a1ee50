use std::env;
use std::time::Duration;

use log::{debug, info};
use serde_json::{json, Value};

use crate::error::DojoError;
use crate::executor::ExecutionResult;

const TRUNCATE_LIMIT: usize = 4000;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for the Ollama chat API, read from the environment.
#[derive(Debug, Clone)]
pub struct OllamaSettings {
  pub api_url: String,
  pub model: String,
  pub fail_prompt: String,
  pub api_key: Option<String>,
}

/// Information describing a failed test run, sent to the model.
#[derive(Debug, Clone)]
pub struct FailureContext {
  pub language: String,
  pub unit: String,
  pub challenge_title: String,
  pub challenge_readme: String,
  pub code: String,
  pub stdout: String,
  pub stderr: String,
  pub status: Option<String>,
  pub exit_code: Option<i32>,
}

impl OllamaSettings {
  /// Load the connection settings, failing when the model or the failure
  /// prompt is unset. The URL falls back to the local Ollama default.
  pub fn from_env() -> Result<OllamaSettings, DojoError> {
    let api_url = env::var("OLLAMA_API_URL")
      .ok()
      .map(|value| value.trim().to_string())
      .filter(|value| !value.is_empty())
      .unwrap_or_else(|| "http://localhost:11434".to_string());
    let model = env::var("OLLAMA_API_MODEL")
      .ok()
      .map(|value| value.trim().to_string())
      .filter(|value| !value.is_empty())
      .ok_or_else(|| {
        DojoError::integration(
          "OLLAMA_API_MODEL is not configured. Set the environment variable to the desired model name",
        )
      })?;
    let fail_prompt = env::var("OLLAMA_API_FAIL_PROMPT")
      .ok()
      .map(|value| value.trim().to_string())
      .filter(|value| !value.is_empty())
      .ok_or_else(|| {
        DojoError::integration(
          "OLLAMA_API_FAIL_PROMPT is not configured. Provide prompt instructions so the AI knows how to explain failures",
        )
      })?;
    let api_key = env::var("OLLAMA_API_KEY")
      .ok()
      .map(|value| value.trim().to_string())
      .filter(|value| !value.is_empty());

    Ok(OllamaSettings {
      api_url,
      model,
      fail_prompt,
      api_key,
    })
  }

  fn chat_url(&self) -> String {
    format!("{}/api/chat", self.api_url.trim_end_matches('/'))
  }
}

impl FailureContext {
  pub fn from_result(
    result: &ExecutionResult,
    challenge_title: &str,
    challenge_readme: &str,
    code: &str,
  ) -> Self {
    FailureContext {
      language: result.language.clone(),
      unit: result.unit.clone(),
      challenge_title: challenge_title.to_string(),
      challenge_readme: challenge_readme.to_string(),
      code: code.to_string(),
      stdout: result.stdout.clone(),
      stderr: result.stderr.clone(),
      status: Some(result.status.to_string()),
      exit_code: Some(result.exit_code),
    }
  }
}

/// Ask the configured model to explain a failed test execution.
///
/// Best-effort by contract: callers must have produced their primary result
/// before invoking this, and must surface integration failures separately.
pub async fn explain_failure(context: &FailureContext) -> Result<String, DojoError> {
  let settings = OllamaSettings::from_env()?;
  info!(
    "Requesting failure explanation from {} ({})",
    settings.chat_url(),
    settings.model
  );

  let payload = json!({
    "model": settings.model,
    "messages": [
      { "role": "system", "content": settings.fail_prompt },
      { "role": "user", "content": build_user_message(context) },
    ],
    "stream": false,
  });

  let client = reqwest::Client::builder()
    .timeout(REQUEST_TIMEOUT)
    .build()?;
  let mut request = client.post(settings.chat_url()).json(&payload);
  if let Some(api_key) = &settings.api_key {
    request = request.bearer_auth(api_key);
  }

  let response = request
    .send()
    .await
    .map_err(|_| DojoError::integration("Unable to contact Ollama API"))?;
  if !response.status().is_success() {
    return Err(DojoError::integration(format!(
      "Ollama API returned an error: {}",
      response.status().as_u16()
    )));
  }

  let data: Value = response.json().await?;
  debug!("Ollama response received");
  let content = data
    .pointer("/message/content")
    .and_then(|value| value.as_str())
    .map(|text| text.trim().to_string())
    .filter(|text| !text.is_empty())
    .ok_or_else(|| DojoError::integration("Ollama API did not return any content"))?;
  Ok(content)
}

/// Avoid sending unbounded payloads to the AI provider.
fn truncate(text: &str, limit: usize) -> String {
  if text.len() <= limit {
    return text.to_string();
  }
  let ellipsis = "\n\n[truncated]";
  let cut = limit.saturating_sub(ellipsis.len());
  let mut end = cut;
  while end > 0 && !text.is_char_boundary(end) {
    end -= 1;
  }
  format!("{}{}", text[..end].trim_end(), ellipsis)
}

fn build_user_message(context: &FailureContext) -> String {
  let or_default = |text: &str, fallback: &str| {
    if text.is_empty() {
      fallback.to_string()
    } else {
      truncate(text, TRUNCATE_LIMIT)
    }
  };

  let sections = [
    format!("Challenge: {}", context.challenge_title),
    format!("Language: {}", context.language),
    format!("Unit: {}", context.unit),
    format!(
      "Challenge Instructions:\n{}",
      or_default(&context.challenge_readme, "No instructions provided.")
    ),
    format!("Submitted Code:\n{}", truncate(&context.code, TRUNCATE_LIMIT)),
    format!(
      "Test Run Details:\nStatus: {}\nExit Code: {}\nstdout:\n{}\nstderr:\n{}",
      context.status.as_deref().unwrap_or("unknown"),
      context
        .exit_code
        .map(|code| code.to_string())
        .unwrap_or_else(|| "n/a".to_string()),
      or_default(&context.stdout, "No stdout captured."),
      or_default(&context.stderr, "No stderr captured.")
    ),
  ];
  sections.join("\n\n")
}
