pub use challenge::{ChallengeDetail, ChallengeLoader, ChallengeMetadata, LanguageChallenges, UnitSummary};
pub use error::{DojoError, DojoExit};
pub use executor::{CodeExecutor, ExecutionRequest, ExecutionResult, DEFAULT_TIMEOUT_SECONDS};
pub use explain::{explain_failure, FailureContext, OllamaSettings};
pub use outcome::{classify, ExecutionStatus, SENTINEL_EXIT_CODE};

mod challenge;
mod error;
mod executor;
mod explain;
mod outcome;
mod preset;
pub mod report;
mod runner;
mod workspace;
