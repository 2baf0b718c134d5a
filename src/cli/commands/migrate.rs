use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use super::console::ConsoleSink;
use crate::auth::{ChainedTokenProvider, TokenProvider};
use crate::config::MainBranchConfig;
use crate::github::{OctocrabGateway, RepositoryGateway};
use crate::migration::{LogSink, Migration, Operation, Outcome, Repository, RepositoryIdentity};

/// Runs one migration operation against one repository.
pub struct MigrateCommand {
    operation: Operation,
    repo: RepositoryIdentity,
    config: MainBranchConfig,
    allow_prompt: bool,
}

impl MigrateCommand {
    pub fn new(operation: Operation, repo: RepositoryIdentity, config: MainBranchConfig) -> Self {
        Self {
            operation,
            repo,
            config,
            allow_prompt: true,
        }
    }

    pub fn with_prompt(mut self, allow_prompt: bool) -> Self {
        self.allow_prompt = allow_prompt;
        self
    }

    pub async fn execute(&self) -> Result<Outcome> {
        let token = ChainedTokenProvider::from_config(&self.config, self.allow_prompt).token()?;
        let gateway =
            OctocrabGateway::from_token(token, self.config.github.api_base_url.as_deref())?;
        self.execute_with(Arc::new(gateway), Arc::new(ConsoleSink::new()))
            .await
    }

    pub async fn execute_with(
        &self,
        gateway: Arc<dyn RepositoryGateway>,
        sink: Arc<dyn LogSink>,
    ) -> Result<Outcome> {
        let repository = Repository::new(self.repo.clone(), gateway, sink);
        let migration = Migration::new(
            repository,
            self.config.migration.pre_branch.as_str(),
            self.config.migration.post_branch.as_str(),
        )
        .with_settle_delay(self.config.settle_delay());

        let outcome = migration.run(self.operation).await?;
        info!(operation = %self.operation, repository = %self.repo, %outcome, "Migration command finished");
        Ok(outcome)
    }
}
