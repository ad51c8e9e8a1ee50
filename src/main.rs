use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use flexi_logger::{DeferredNow, Duplicate, FileSpec, Logger};
use log::{info, warn, Record};

use dojo::report;
use dojo::{
  explain_failure, ChallengeLoader, CodeExecutor, DojoError, DojoExit, ExecutionRequest,
  ExecutionStatus, FailureContext, DEFAULT_TIMEOUT_SECONDS,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
  #[arg(long, default_value = "./challenges", help = "Challenge asset tree")]
  challenges: PathBuf,

  #[arg(long, default_value_t = false)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
  #[command(about = "List all challenges")]
  List,

  #[command(about = "Show one challenge with instructions and starter code")]
  Show {
    #[arg(help = "Language")]
    language: String,

    #[arg(help = "Unit")]
    unit: String,
  },

  #[command(about = "Run a submission against a challenge's hidden tests")]
  Run {
    #[arg(help = "Language")]
    language: String,

    #[arg(help = "Unit")]
    unit: String,

    #[arg(help = "Submission file")]
    file: PathBuf,

    #[arg(short, long, default_value_t = DEFAULT_TIMEOUT_SECONDS, help = "Wall clock limit in seconds")]
    timeout: u64,

    #[arg(long, default_value_t = false, help = "Ask the AI service to explain a failure")]
    explain: bool,
  },
}

/// A logline-formatter that produces log lines like <br>
/// ```[datetime: INFO] Staged workspace /tmp/dojo-python-x1y2z3```
pub fn default_format(
  w: &mut dyn std::io::Write,
  now: &mut DeferredNow,
  record: &Record,
) -> Result<(), std::io::Error> {
  write!(
    w,
    "[{}: {:5}] {}",
    now.format("%Y-%m-%d %H:%M:%S"),
    record.level(),
    record.args()
  )
}

fn setup_logger(verbose: bool) -> Result<(), DojoError> {
  let spec = if verbose { "dojo=debug" } else { "dojo=info" };
  Logger::try_with_str(spec)?
    .log_to_file(
      FileSpec::default()
        .directory(env::var("LOG_DIR").unwrap_or("./logs/".into()))
        .basename("dojo")
        .discriminant(format!("{}", chrono::offset::Local::now().format("%Y-%m-%d")))
        .suppress_timestamp(),
    )
    .append()
    .duplicate_to_stderr(Duplicate::Warn)
    .format_for_files(default_format)
    .start()?;
  Ok(())
}

async fn run(cli: Cli) -> Result<(), DojoError> {
  let loader = Arc::new(ChallengeLoader::new(&cli.challenges)?);

  match cli.command {
    Commands::List => {
      let languages = loader.list()?;
      report::report_challenges(&languages);
    }
    Commands::Show { language, unit } => {
      let metadata = loader.get(&language, &unit)?;
      report::report_detail(&metadata.detail()?);
    }
    Commands::Run {
      language,
      unit,
      file,
      timeout,
      explain,
    } => {
      let code = fs::read_to_string(&file)
        .map_err(|err| DojoError::cli(format!("Read submission {} fails: {}", file.display(), err)))?;

      let executor = CodeExecutor::new(loader.clone());
      let request =
        ExecutionRequest::new(language, unit, code).timeout(Duration::from_secs(timeout));
      let result = executor.execute(&request).await?;
      report::report_result(&result);

      if explain && result.status != ExecutionStatus::Passed {
        let metadata = loader.get(&request.language, &request.unit)?;
        let context =
          FailureContext::from_result(&result, &metadata.title, &metadata.readme, &request.code);
        // Best-effort: the result above stands whatever happens here.
        match explain_failure(&context).await {
          Ok(explanation) => {
            println!("\x1b[1mExplanation\x1b[22m");
            println!("{}", explanation);
          }
          Err(err) => warn!("{}", err),
        }
      }
    }
  }

  Ok(())
}

#[tokio::main]
async fn main() -> DojoExit {
  let cli = Cli::parse();

  if let Err(err) = setup_logger(cli.verbose) {
    return DojoExit::Err(err);
  }

  info!("Start running dojo");

  let exit = match run(cli).await {
    Ok(()) => DojoExit::Ok,
    Err(err) => DojoExit::Err(err),
  };

  info!("Running dojo finished");

  exit
}
