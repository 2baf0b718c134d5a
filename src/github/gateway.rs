//! The remote operations the migration core needs from a hosting service.
//!
//! Every method targets one repository. "Not found" answers are part of the
//! return type (`None`, `false`) rather than errors; everything else that goes
//! wrong is a [`GitHubError`] that the core propagates without retrying.

use async_trait::async_trait;

use super::errors::GitHubError;
use crate::migration::identity::RepositoryIdentity;

/// An open pull request as far as the migration cares about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRef {
    pub number: u64,
    pub base: String,
    pub link: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RepositoryGateway: Send + Sync {
    /// SHA the branch points at, or `None` if the branch does not exist.
    async fn branch_sha(
        &self,
        repo: &RepositoryIdentity,
        branch: &str,
    ) -> Result<Option<String>, GitHubError>;

    async fn create_branch(
        &self,
        repo: &RepositoryIdentity,
        branch: &str,
        sha: &str,
    ) -> Result<(), GitHubError>;

    async fn delete_branch(&self, repo: &RepositoryIdentity, branch: &str)
        -> Result<(), GitHubError>;

    async fn default_branch(&self, repo: &RepositoryIdentity) -> Result<String, GitHubError>;

    async fn set_default_branch(
        &self,
        repo: &RepositoryIdentity,
        branch: &str,
    ) -> Result<(), GitHubError>;

    /// Whether branch protection is enabled. A missing branch is not protected.
    async fn branch_protected(
        &self,
        repo: &RepositoryIdentity,
        branch: &str,
    ) -> Result<bool, GitHubError>;

    /// Branch that publishes the repository's Pages site, if there is one.
    async fn pages_branch(&self, repo: &RepositoryIdentity) -> Result<Option<String>, GitHubError>;

    /// First page only of open pull requests based on `base`.
    async fn open_pulls_first_page(
        &self,
        repo: &RepositoryIdentity,
        base: &str,
    ) -> Result<Vec<PullRequestRef>, GitHubError>;

    /// Every open pull request based on `base`, in the service's listing order.
    async fn open_pulls(
        &self,
        repo: &RepositoryIdentity,
        base: &str,
    ) -> Result<Vec<PullRequestRef>, GitHubError>;

    async fn update_pull_base(
        &self,
        repo: &RepositoryIdentity,
        number: u64,
        base: &str,
    ) -> Result<(), GitHubError>;
}
