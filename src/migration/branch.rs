use std::fmt;

use tracing::debug;

use super::repository::Repository;
use crate::github::GitHubError;

/// A named branch of a [`Repository`].
///
/// Nothing is cached: every query goes to the gateway, so the answers reflect
/// the remote state at the time of the call.
pub struct Branch<'a> {
    repo: &'a Repository,
    name: String,
}

impl<'a> Branch<'a> {
    pub fn new(repo: &'a Repository, name: impl Into<String>) -> Self {
        Self {
            repo,
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn sha(&self) -> Result<Option<String>, GitHubError> {
        self.repo
            .gateway()
            .branch_sha(self.repo.identity(), &self.name)
            .await
    }

    pub async fn exists(&self) -> Result<bool, GitHubError> {
        Ok(self.sha().await?.is_some())
    }

    pub async fn create(&self, from_sha: &str) -> Result<(), GitHubError> {
        self.repo
            .gateway()
            .create_branch(self.repo.identity(), &self.name, from_sha)
            .await
    }

    pub async fn delete(&self) -> Result<(), GitHubError> {
        self.repo
            .gateway()
            .delete_branch(self.repo.identity(), &self.name)
            .await
    }

    pub async fn is_default(&self) -> Result<bool, GitHubError> {
        Ok(self.repo.default_branch().await?.name == self.name)
    }

    pub async fn is_protected(&self) -> Result<bool, GitHubError> {
        self.repo
            .gateway()
            .branch_protected(self.repo.identity(), &self.name)
            .await
    }

    pub async fn is_pages_branch(&self) -> Result<bool, GitHubError> {
        let pages_branch = self.repo.gateway().pages_branch(self.repo.identity()).await?;
        Ok(pages_branch.as_deref() == Some(self.name.as_str()))
    }

    /// Link to some open pull request based on this branch.
    ///
    /// Only the first page is requested: the listing is filtered by base on
    /// the server, so an empty first page means there are none at all.
    pub async fn first_open_pull_request_link(&self) -> Result<Option<String>, GitHubError> {
        let pulls = self
            .repo
            .gateway()
            .open_pulls_first_page(self.repo.identity(), &self.name)
            .await?;
        Ok(pulls.into_iter().next().map(|pull| pull.link))
    }

    pub async fn all_open_pull_request_links(&self) -> Result<Vec<String>, GitHubError> {
        let pulls = self
            .repo
            .gateway()
            .open_pulls(self.repo.identity(), &self.name)
            .await?;
        Ok(pulls.into_iter().map(|pull| pull.link).collect())
    }

    /// Re-bases every open pull request based on `from` onto this branch.
    ///
    /// `on_each` sees each pull request's link before its base is changed.
    /// The full listing is taken up front because re-basing removes a pull
    /// request from the base-filtered listing being paged through.
    pub async fn adopt_pull_requests<F>(
        &self,
        from: &Branch<'_>,
        mut on_each: F,
    ) -> Result<(), GitHubError>
    where
        F: FnMut(&str) + Send,
    {
        let pulls = self
            .repo
            .gateway()
            .open_pulls(self.repo.identity(), &from.name)
            .await?;

        for pull in pulls {
            on_each(&pull.link);
            self.repo
                .gateway()
                .update_pull_base(self.repo.identity(), pull.number, &self.name)
                .await?;
            debug!(pull = pull.number, from = %from.name, to = %self.name, "Changed pull request base");
        }
        Ok(())
    }
}

impl fmt::Display for Branch<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}`", self.name)
    }
}

impl fmt::Debug for Branch<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Branch")
            .field("repository", self.repo.identity())
            .field("name", &self.name)
            .finish()
    }
}
