use clap::{Args, Parser, Subcommand};

use crate::config::MainBranchConfig;
use crate::migration::{Operation, RepositoryIdentity};

pub mod commands;

#[derive(Parser, Debug)]
#[command(name = "main-branch")]
#[command(version)]
#[command(about = "Migrate a GitHub repository's default branch")]
#[command(long_about = "main-branch moves a GitHub repository from one default branch to another \
                       (by default `master` to `main`): it creates the new branch, makes it the default, \
                       re-targets open pull requests and deletes the old branch. Start with \
                       'main-branch info owner/repo' to see what would change.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Milliseconds to wait before verifying a change
    #[arg(long, global = true, help = "Wait before reading back a change (default from config: 1000)")]
    pub settle_delay_ms: Option<u64>,

    /// Diagnostic log filter, e.g. `info` or `main_branch=debug`
    #[arg(long, global = true, help = "Diagnostic log level on stderr (RUST_LOG overrides)")]
    pub log_level: Option<String>,

    /// Emit diagnostics as JSON
    #[arg(long, global = true, help = "Write diagnostic logs as JSON lines")]
    pub json_logs: bool,

    /// Never prompt for a GitHub token
    #[arg(long, global = true, help = "Fail instead of prompting when no token is configured")]
    pub no_prompt: bool,
}

#[derive(Args, Debug, Clone)]
pub struct BranchArgs {
    /// Repository as `owner/repo` or https://github.com/owner/repo
    #[arg(value_parser = parse_repository)]
    pub repo: RepositoryIdentity,

    /// Branch to migrate away from
    #[arg(long, help = "Branch to migrate away from (default from config: master)")]
    pub pre: Option<String>,

    /// Branch to migrate to
    #[arg(long, help = "Branch to migrate to (default from config: main)")]
    pub post: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the default branch, both branches, their protection, Pages and pull request status
    Info(BranchArgs),
    /// Create the post-branch at the pre-branch's commit
    Create(BranchArgs),
    /// Make the post-branch the repository default
    Set(BranchArgs),
    /// Move open pull requests from the pre-branch to the post-branch
    UpdatePulls(BranchArgs),
    /// Delete the pre-branch once nothing depends on it
    Delete(BranchArgs),
    /// Run create, set, update-pulls and delete in order
    Replace(BranchArgs),
}

impl Commands {
    pub fn operation(&self) -> Operation {
        match self {
            Commands::Info(_) => Operation::Info,
            Commands::Create(_) => Operation::Create,
            Commands::Set(_) => Operation::Set,
            Commands::UpdatePulls(_) => Operation::UpdatePulls,
            Commands::Delete(_) => Operation::Delete,
            Commands::Replace(_) => Operation::Replace,
        }
    }

    pub fn branch_args(&self) -> &BranchArgs {
        match self {
            Commands::Info(args)
            | Commands::Create(args)
            | Commands::Set(args)
            | Commands::UpdatePulls(args)
            | Commands::Delete(args)
            | Commands::Replace(args) => args,
        }
    }
}

impl Cli {
    /// Command-line flags take precedence over the loaded configuration.
    pub fn apply_overrides(&self, config: &mut MainBranchConfig) {
        let args = self.command.branch_args();
        if let Some(pre) = &args.pre {
            config.migration.pre_branch = pre.clone();
        }
        if let Some(post) = &args.post {
            config.migration.post_branch = post.clone();
        }
        if let Some(settle_delay_ms) = self.settle_delay_ms {
            config.migration.settle_delay_ms = settle_delay_ms;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if self.json_logs {
            config.logging.json = true;
        }
    }
}

fn parse_repository(input: &str) -> Result<RepositoryIdentity, String> {
    RepositoryIdentity::parse(input).map_err(|e| e.to_string())
}
