//! Named precondition checks for migration operations.
//!
//! A check either passes (sometimes logging a confirmation) or logs why it
//! failed and returns [`ValidationFailure`]. Operations catch exactly that
//! error and turn it into [`Outcome::Failure`](super::Outcome::Failure);
//! gateway errors pass through untouched.

use thiserror::Error;

use super::branch::Branch;
use super::log::Severity;
use super::repository::Repository;
use crate::github::GitHubError;

/// A precondition was not met. The reason has already been logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("validation failed: {check}")]
pub struct ValidationFailure {
    pub check: &'static str,
}

impl ValidationFailure {
    pub fn new(check: &'static str) -> Self {
        Self { check }
    }
}

/// Why an operation step stopped early.
#[derive(Debug, Error)]
pub enum StepError {
    #[error(transparent)]
    Validation(#[from] ValidationFailure),
    #[error(transparent)]
    GitHub(#[from] GitHubError),
}

pub struct Validator<'a> {
    repo: &'a Repository,
    pre: &'a Branch<'a>,
    post: &'a Branch<'a>,
}

impl<'a> Validator<'a> {
    pub fn new(repo: &'a Repository, pre: &'a Branch<'a>, post: &'a Branch<'a>) -> Self {
        Self { repo, pre, post }
    }

    fn fail(&self, check: &'static str) -> StepError {
        StepError::Validation(ValidationFailure::new(check))
    }

    /// Runs before any remote call.
    pub fn distinct_names(&self) -> Result<(), ValidationFailure> {
        if self.pre.name() == self.post.name() {
            self.repo.log(
                Severity::Error,
                format!(
                    "Pre-branch and post-branch must have different names (both are {}).",
                    self.pre
                ),
            );
            return Err(ValidationFailure::new("distinct names"));
        }
        Ok(())
    }

    /// Passing also proves the pre-branch exists.
    pub async fn pre_is_default(&self) -> Result<(), StepError> {
        if !self.pre.is_default().await? {
            self.repo
                .log(Severity::Error, format!("Pre-branch {} is not the default branch.", self.pre));
            return Err(self.fail("pre is default"));
        }
        self.repo
            .log(Severity::Success, format!("Pre-branch {} is the default branch.", self.pre));
        Ok(())
    }

    /// Passing also proves the post-branch exists.
    pub async fn post_is_default(&self) -> Result<(), StepError> {
        if !self.post.is_default().await? {
            self.repo
                .log(Severity::Error, format!("Post-branch {} is not the default branch.", self.post));
            return Err(self.fail("post is default"));
        }
        self.repo
            .log(Severity::Success, format!("Post-branch {} is the default branch.", self.post));
        Ok(())
    }

    pub async fn either_is_default(&self) -> Result<(), StepError> {
        let default = self.repo.default_branch_name().await?;
        if default != self.pre.name() && default != self.post.name() {
            self.repo.log(
                Severity::Error,
                format!(
                    "Default branch `{default}` is neither the pre-branch {} nor the post-branch {}.",
                    self.pre, self.post
                ),
            );
            return Err(self.fail("either is default"));
        }
        Ok(())
    }

    pub async fn pre_exists(&self) -> Result<(), StepError> {
        if !self.pre.exists().await? {
            self.repo
                .log(Severity::Error, format!("Pre-branch does not exist: {}", self.pre));
            return Err(self.fail("pre exists"));
        }
        self.repo.log(Severity::Success, format!("Pre-branch exists: {}", self.pre));
        Ok(())
    }

    pub async fn post_exists(&self) -> Result<(), StepError> {
        if !self.post.exists().await? {
            self.repo
                .log(Severity::Error, format!("Post-branch does not exist: {}", self.post));
            return Err(self.fail("post exists"));
        }
        self.repo.log(Severity::Success, format!("Post-branch exists: {}", self.post));
        Ok(())
    }

    pub async fn pre_and_post_sha_match(&self) -> Result<(), StepError> {
        let pre_sha = self.pre.sha().await?;
        let post_sha = self.post.sha().await?;
        match (&pre_sha, &post_sha) {
            (Some(pre), Some(post)) if pre == post => {
                self.repo
                    .log(Severity::Success, format!("Pre-branch and post-branch SHAs match: {pre}"));
                Ok(())
            }
            _ => {
                self.repo
                    .log(Severity::Error, "Pre-branch and post-branch SHAs do not match.");
                self.repo
                    .log(Severity::Error, format!("Pre-branch SHA: {}", describe_sha(&pre_sha)));
                self.repo
                    .log(Severity::Error, format!("Post-branch SHA: {}", describe_sha(&post_sha)));
                Err(self.fail("pre/post SHA match"))
            }
        }
    }

    pub async fn post_has_sha(&self, expected: &str) -> Result<(), StepError> {
        let actual = self.post.sha().await?;
        if actual.as_deref() != Some(expected) {
            self.repo
                .log(Severity::Error, format!("Post-branch {} has an unexpected SHA.", self.post));
            self.repo.log(Severity::Error, format!("Expected: {expected}"));
            self.repo
                .log(Severity::Error, format!("Actual: {}", describe_sha(&actual)));
            return Err(self.fail("post has expected SHA"));
        }
        Ok(())
    }

    pub async fn pre_not_protected(&self) -> Result<(), StepError> {
        if self.pre.is_protected().await? {
            self.repo
                .log(Severity::Error, format!("Pre-branch is protected: {}", self.pre));
            return Err(self.fail("pre not protected"));
        }
        self.repo
            .log(Severity::Success, format!("Pre-branch is not protected: {}", self.pre));
        Ok(())
    }

    pub async fn pre_not_pages_branch(&self) -> Result<(), StepError> {
        if self.pre.is_pages_branch().await? {
            self.repo.log(
                Severity::Error,
                format!("Pre-branch {} publishes the GitHub Pages site.", self.pre),
            );
            return Err(self.fail("pre not pages branch"));
        }
        self.repo.log(
            Severity::Success,
            format!("Pre-branch {} is not the GitHub Pages branch.", self.pre),
        );
        Ok(())
    }
}

fn describe_sha(sha: &Option<String>) -> &str {
    sha.as_deref().unwrap_or("(branch does not exist)")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::migration::identity::RepositoryIdentity;
    use crate::migration::mocks::{InMemoryGateway, RecordingSink};

    fn setup(gateway: InMemoryGateway) -> (Repository, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let repo = Repository::new(
            RepositoryIdentity::new("acme", "widgets"),
            Arc::new(gateway),
            sink.clone(),
        );
        (repo, sink)
    }

    fn assert_check_failed(result: Result<(), StepError>, check: &str) {
        match result {
            Err(StepError::Validation(failure)) => assert_eq!(failure.check, check),
            other => panic!("expected validation failure `{check}`, got {other:?}"),
        }
    }

    #[test]
    fn test_distinct_names_rejects_same_branch() {
        let (repo, sink) = setup(InMemoryGateway::new("master"));
        let pre = repo.branch("main");
        let post = repo.branch("main");
        let validator = Validator::new(&repo, &pre, &post);

        assert_eq!(
            validator.distinct_names(),
            Err(ValidationFailure::new("distinct names"))
        );
        assert!(sink.contains(Severity::Error, "must have different names"));
    }

    #[tokio::test]
    async fn test_default_checks() {
        let (repo, sink) = setup(
            InMemoryGateway::new("master")
                .with_branch("master", "abc")
                .with_branch("main", "abc"),
        );
        let pre = repo.branch("master");
        let post = repo.branch("main");
        let validator = Validator::new(&repo, &pre, &post);

        validator.pre_is_default().await.unwrap();
        assert!(sink.contains(Severity::Success, "Pre-branch `master` is the default branch."));
        validator.either_is_default().await.unwrap();
        assert_check_failed(validator.post_is_default().await, "post is default");
        assert!(sink.contains(Severity::Error, "Post-branch `main` is not the default branch."));
    }

    #[tokio::test]
    async fn test_either_is_default_fails_for_unrelated_default() {
        let (repo, sink) = setup(InMemoryGateway::new("develop"));
        let pre = repo.branch("master");
        let post = repo.branch("main");
        let validator = Validator::new(&repo, &pre, &post);

        assert_check_failed(validator.either_is_default().await, "either is default");
        assert!(sink.contains(Severity::Error, "`develop`"));
    }

    #[tokio::test]
    async fn test_existence_checks() {
        let (repo, _sink) = setup(InMemoryGateway::new("master").with_branch("master", "abc"));
        let pre = repo.branch("master");
        let post = repo.branch("main");
        let validator = Validator::new(&repo, &pre, &post);

        validator.pre_exists().await.unwrap();
        assert_check_failed(validator.post_exists().await, "post exists");
    }

    #[tokio::test]
    async fn test_sha_checks_log_both_values() {
        let (repo, sink) = setup(
            InMemoryGateway::new("master")
                .with_branch("master", "aaa111")
                .with_branch("main", "bbb222"),
        );
        let pre = repo.branch("master");
        let post = repo.branch("main");
        let validator = Validator::new(&repo, &pre, &post);

        assert_check_failed(validator.pre_and_post_sha_match().await, "pre/post SHA match");
        assert!(sink.contains(Severity::Error, "Pre-branch SHA: aaa111"));
        assert!(sink.contains(Severity::Error, "Post-branch SHA: bbb222"));

        validator.post_has_sha("bbb222").await.unwrap();
        assert_check_failed(validator.post_has_sha("aaa111").await, "post has expected SHA");
        assert!(sink.contains(Severity::Error, "Expected: aaa111"));
        assert!(sink.contains(Severity::Error, "Actual: bbb222"));
    }

    #[tokio::test]
    async fn test_sha_match_fails_when_post_is_missing() {
        let (repo, sink) = setup(InMemoryGateway::new("master").with_branch("master", "aaa111"));
        let pre = repo.branch("master");
        let post = repo.branch("main");
        let validator = Validator::new(&repo, &pre, &post);

        assert_check_failed(validator.pre_and_post_sha_match().await, "pre/post SHA match");
        assert!(sink.contains(Severity::Error, "Post-branch SHA: (branch does not exist)"));
    }

    #[tokio::test]
    async fn test_protection_and_pages_checks() {
        let (repo, _sink) = setup(
            InMemoryGateway::new("main")
                .with_branch("master", "abc")
                .with_branch("main", "abc")
                .with_protected("master")
                .with_pages_branch("master"),
        );
        let pre = repo.branch("master");
        let post = repo.branch("main");
        let validator = Validator::new(&repo, &pre, &post);

        assert_check_failed(validator.pre_not_protected().await, "pre not protected");
        assert_check_failed(validator.pre_not_pages_branch().await, "pre not pages branch");
    }

    #[tokio::test]
    async fn test_gateway_errors_are_not_validation_failures() {
        let (repo, _sink) = setup(InMemoryGateway::new("master").failing_default_branch_reads());
        let pre = repo.branch("master");
        let post = repo.branch("main");
        let validator = Validator::new(&repo, &pre, &post);

        match validator.pre_is_default().await {
            Err(StepError::GitHub(err)) => assert_eq!(err.status_code(), Some(500)),
            other => panic!("expected gateway error, got {other:?}"),
        }
    }
}
