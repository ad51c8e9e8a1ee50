use std::io::{stdout, IsTerminal};
use std::process::{ExitCode, Termination};

use flexi_logger::FlexiLoggerError;
use thiserror::Error;

/// Errors surfaced at the dispatcher boundary. Everything below it
/// (filesystem, process, network) is converted into one of these or into a
/// well-formed execution result.
#[derive(Debug, Error)]
pub enum DojoError {
  #[error("Not Found: {0}")]
  NotFound(String),

  #[error("Unsupported Language: {0}")]
  UnsupportedLanguage(String),

  #[error("Workspace Error: {0}")]
  Workspace(String),

  #[error("Spawn Error: {0}")]
  Spawn(String),

  #[error("AI Integration Error: {0}")]
  Integration(String),

  #[error("CLI Error: {0}")]
  Cli(String),

  #[error("Logger Error: {0}")]
  Logger(#[from] FlexiLoggerError),
}

#[allow(unused)]
pub enum DojoExit {
  Ok,
  Err(DojoError),
}

impl DojoError {
  pub fn not_found<MS: Into<String>>(msg: MS) -> DojoError {
    DojoError::NotFound(msg.into())
  }

  pub fn workspace<MS: Into<String>>(msg: MS) -> DojoError {
    DojoError::Workspace(msg.into())
  }

  pub fn spawn<MS: Into<String>>(msg: MS) -> DojoError {
    DojoError::Spawn(msg.into())
  }

  pub fn integration<MS: Into<String>>(msg: MS) -> DojoError {
    DojoError::Integration(msg.into())
  }

  pub fn cli<MS: Into<String>>(msg: MS) -> DojoError {
    DojoError::Cli(msg.into())
  }
}

impl From<std::io::Error> for DojoError {
  fn from(err: std::io::Error) -> Self {
    DojoError::Workspace(err.to_string())
  }
}

impl From<reqwest::Error> for DojoError {
  fn from(err: reqwest::Error) -> Self {
    DojoError::Integration(err.to_string())
  }
}

impl Termination for DojoExit {
  fn report(self) -> ExitCode {
    match self {
      DojoExit::Ok => ExitCode::SUCCESS.report(),
      DojoExit::Err(err) => {
        let text = format!("{}", err);
        let text = match text.split_once(": ") {
          Some((prefix, message)) => {
            if stdout().is_terminal() {
              format!("\x1b[1m\x1b[91m{}\x1b[39m\x1b[22m  {}", prefix, message)
            } else {
              format!(
                "{{\n  \"ok\": false,\n  \"type\": \"{}\",\n  \"message\": \"{}\"\n}}",
                prefix,
                message.replace('"', "\\\"")
              )
            }
          }
          None => text,
        };
        eprintln!("{}", text);
        ExitCode::FAILURE.report()
      }
    }
  }
}
