use std::sync::{Arc, Mutex, PoisonError};

use super::branch::Branch;
use super::identity::RepositoryIdentity;
use super::log::{LogRecord, LogSink, Severity};
use crate::github::{GitHubError, RepositoryGateway};

const NO_OPERATION: &str = "main-branch";

/// One repository on the remote service, plus the log context of the
/// operation currently running against it.
pub struct Repository {
    identity: RepositoryIdentity,
    gateway: Arc<dyn RepositoryGateway>,
    sink: Arc<dyn LogSink>,
    operations: Mutex<Vec<&'static str>>,
}

/// Keeps an operation name on the log context until dropped.
#[must_use = "the operation context is popped as soon as the scope is dropped"]
pub struct OperationScope<'a> {
    repo: &'a Repository,
}

impl Drop for OperationScope<'_> {
    fn drop(&mut self) {
        self.repo
            .operations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop();
    }
}

impl Repository {
    pub fn new(
        identity: RepositoryIdentity,
        gateway: Arc<dyn RepositoryGateway>,
        sink: Arc<dyn LogSink>,
    ) -> Self {
        Self {
            identity,
            gateway,
            sink,
            operations: Mutex::new(Vec::new()),
        }
    }

    pub fn identity(&self) -> &RepositoryIdentity {
        &self.identity
    }

    /// `owner/name`
    pub fn name(&self) -> String {
        self.identity.to_string()
    }

    pub(crate) fn gateway(&self) -> &dyn RepositoryGateway {
        self.gateway.as_ref()
    }

    pub fn branch(&self, name: impl Into<String>) -> Branch<'_> {
        Branch::new(self, name)
    }

    pub async fn default_branch_name(&self) -> Result<String, GitHubError> {
        self.gateway.default_branch(&self.identity).await
    }

    pub async fn default_branch(&self) -> Result<Branch<'_>, GitHubError> {
        let name = self.default_branch_name().await?;
        Ok(self.branch(name))
    }

    pub async fn set_default_branch(&self, branch: &Branch<'_>) -> Result<(), GitHubError> {
        self.gateway
            .set_default_branch(&self.identity, branch.name())
            .await
    }

    /// Pushes `operation` as the log context until the returned scope is dropped.
    pub fn enter(&self, operation: &'static str) -> OperationScope<'_> {
        self.operations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(operation);
        OperationScope { repo: self }
    }

    pub fn current_operation(&self) -> &'static str {
        self.operations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .copied()
            .unwrap_or(NO_OPERATION)
    }

    pub fn log(&self, severity: Severity, message: impl Into<String>) {
        self.sink.record(&LogRecord {
            repository: self.name(),
            operation: self.current_operation().to_string(),
            severity,
            message: message.into(),
        });
    }

    pub fn separator(&self) {
        self.log(Severity::Separator, "");
    }
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("identity", &self.identity)
            .field("operations", &self.operations)
            .finish_non_exhaustive()
    }
}
