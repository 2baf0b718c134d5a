// main-branch library - default branch migration for GitHub repositories
// This exposes the core components for the CLI and for testing

pub mod auth;
pub mod cli;
pub mod config;
pub mod github;
pub mod migration;
pub mod telemetry;

// Re-export key types for easy access
pub use auth::{ChainedTokenProvider, TokenProvider};
pub use config::MainBranchConfig;
pub use github::{GitHubError, OctocrabGateway, PullRequestRef, RepositoryGateway};
pub use migration::{
    Branch, LogRecord, LogSink, MalformedIdentity, Migration, Operation, Outcome, Repository,
    RepositoryIdentity, Severity, TracingSink,
};
pub use telemetry::{create_run_span, generate_correlation_id, init_telemetry};
