//! The migration operations and the compound `replace`.
//!
//! Each operation enters its log context, checks that the pre- and
//! post-branch differ, runs its steps, and converts a [`ValidationFailure`]
//! into [`Outcome::Failure`]. Gateway errors are returned to the caller.
//! Nothing is rolled back: a failure part-way leaves the earlier steps done.

use std::fmt;
use std::time::Duration;

use tracing::{debug, instrument};

use super::branch::Branch;
use super::log::Severity;
use super::outcome::Outcome;
use super::repository::Repository;
use super::validator::{StepError, ValidationFailure, Validator};
use crate::github::GitHubError;

pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Info,
    Create,
    Set,
    UpdatePulls,
    Delete,
    Replace,
}

impl Operation {
    #[cfg(test)]
    pub(crate) const ALL: [Operation; 6] = [
        Operation::Info,
        Operation::Create,
        Operation::Set,
        Operation::UpdatePulls,
        Operation::Delete,
        Operation::Replace,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Operation::Info => "info",
            Operation::Create => "create",
            Operation::Set => "set",
            Operation::UpdatePulls => "update-pulls",
            Operation::Delete => "delete",
            Operation::Replace => "replace",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Moves a repository from one default branch (`pre`) to another (`post`).
#[derive(Debug)]
pub struct Migration {
    repo: Repository,
    pre: String,
    post: String,
    settle_delay: Duration,
}

impl Migration {
    pub fn new(repo: Repository, pre: impl Into<String>, post: impl Into<String>) -> Self {
        Self {
            repo,
            pre: pre.into(),
            post: post.into(),
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }

    /// Wait before reading back the result of a write.
    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    pub async fn run(&self, operation: Operation) -> Result<Outcome, GitHubError> {
        match operation {
            Operation::Info => self.info().await,
            Operation::Create => self.create().await,
            Operation::Set => self.set().await,
            Operation::UpdatePulls => self.update_pulls().await,
            Operation::Delete => self.delete().await,
            Operation::Replace => self.replace().await,
        }
    }

    #[instrument(skip_all, fields(repository = %self.repo.identity(), pre = %self.pre, post = %self.post))]
    pub async fn info(&self) -> Result<Outcome, GitHubError> {
        let _scope = self.repo.enter(Operation::Info.name());
        self.conclude(self.info_steps().await)
    }

    #[instrument(skip_all, fields(repository = %self.repo.identity(), pre = %self.pre, post = %self.post))]
    pub async fn create(&self) -> Result<Outcome, GitHubError> {
        let _scope = self.repo.enter(Operation::Create.name());
        self.conclude(self.create_steps().await)
    }

    #[instrument(skip_all, fields(repository = %self.repo.identity(), pre = %self.pre, post = %self.post))]
    pub async fn set(&self) -> Result<Outcome, GitHubError> {
        let _scope = self.repo.enter(Operation::Set.name());
        self.conclude(self.set_steps().await)
    }

    #[instrument(skip_all, fields(repository = %self.repo.identity(), pre = %self.pre, post = %self.post))]
    pub async fn update_pulls(&self) -> Result<Outcome, GitHubError> {
        let _scope = self.repo.enter(Operation::UpdatePulls.name());
        self.conclude(self.update_pulls_steps().await)
    }

    #[instrument(skip_all, fields(repository = %self.repo.identity(), pre = %self.pre, post = %self.post))]
    pub async fn delete(&self) -> Result<Outcome, GitHubError> {
        let _scope = self.repo.enter(Operation::Delete.name());
        self.conclude(self.delete_steps().await)
    }

    #[instrument(skip_all, fields(repository = %self.repo.identity(), pre = %self.pre, post = %self.post))]
    pub async fn replace(&self) -> Result<Outcome, GitHubError> {
        let _scope = self.repo.enter(Operation::Replace.name());
        self.conclude(self.replace_steps().await)
    }

    fn branches(&self) -> (Branch<'_>, Branch<'_>) {
        (self.repo.branch(&self.pre), self.repo.branch(&self.post))
    }

    fn conclude(&self, result: Result<Outcome, StepError>) -> Result<Outcome, GitHubError> {
        match result {
            Ok(outcome) => {
                debug!(%outcome, "Operation finished");
                Ok(outcome)
            }
            Err(StepError::Validation(failure)) => {
                debug!(check = failure.check, "Operation stopped by a failed check");
                Ok(Outcome::Failure)
            }
            Err(StepError::GitHub(err)) => Err(err),
        }
    }

    async fn settle(&self) {
        self.repo.log(
            Severity::Plan,
            format!("Waiting {}ms before verifying.", self.settle_delay.as_millis()),
        );
        tokio::time::sleep(self.settle_delay).await;
    }

    async fn info_steps(&self) -> Result<Outcome, StepError> {
        let (pre, post) = self.branches();
        Validator::new(&self.repo, &pre, &post).distinct_names()?;

        self.repo.log(
            Severity::Plan,
            format!("Getting info about the pre-branch {pre} and the post-branch {post}."),
        );
        let default = self.repo.default_branch().await?;
        self.repo
            .log(Severity::Info, format!("Default branch: {default}"));
        let pages_branch = self
            .repo
            .gateway()
            .pages_branch(self.repo.identity())
            .await?;

        self.report_branch("Pre-branch", &pre, pages_branch.as_deref()).await?;
        self.report_branch("Post-branch", &post, pages_branch.as_deref()).await?;
        if default.name() != pre.name() && default.name() != post.name() {
            self.report_branch("Default branch", &default, pages_branch.as_deref())
                .await?;
        }
        Ok(Outcome::NoOp)
    }

    async fn report_branch(
        &self,
        role: &str,
        branch: &Branch<'_>,
        pages_branch: Option<&str>,
    ) -> Result<(), GitHubError> {
        self.repo.separator();
        let Some(sha) = branch.sha().await? else {
            self.repo
                .log(Severity::Info, format!("{role} {branch} does not exist."));
            return Ok(());
        };
        self.repo
            .log(Severity::Info, format!("{role} {branch} exists. SHA: {sha}"));

        let protected = branch.is_protected().await?;
        self.repo.log(
            Severity::Info,
            format!("{branch} {} protected.", if protected { "IS" } else { "IS NOT" }),
        );
        let publishes_pages = pages_branch == Some(branch.name());
        self.repo.log(
            Severity::Info,
            format!(
                "{branch} {} the GitHub Pages branch.",
                if publishes_pages { "IS" } else { "IS NOT" }
            ),
        );

        match branch.first_open_pull_request_link().await? {
            Some(link) => {
                self.repo.log(
                    Severity::Info,
                    format!("There are open pull requests with {branch} as a base."),
                );
                self.repo
                    .log(Severity::Info, format!("Example: {link}"));
            }
            None => self.repo.log(
                Severity::Info,
                format!("There are no open pull requests with {branch} as a base."),
            ),
        }
        Ok(())
    }

    async fn create_steps(&self) -> Result<Outcome, StepError> {
        let (pre, post) = self.branches();
        let validator = Validator::new(&self.repo, &pre, &post);
        validator.distinct_names()?;

        self.repo.log(
            Severity::Plan,
            format!("Planning to create {post} from the current default branch {pre}."),
        );

        if post.exists().await? {
            self.repo
                .log(Severity::Ok, format!("Post-branch {post} already exists."));
            if !pre.exists().await? {
                self.repo.log(
                    Severity::Ok,
                    format!("Pre-branch {pre} no longer exists. The branch was already migrated."),
                );
                self.repo.log(Severity::Info, "Nothing new to do.");
                return Ok(Outcome::NoOp);
            }
            validator.pre_and_post_sha_match().await?;
            self.repo.log(Severity::Info, "Nothing new to do.");
            return Ok(Outcome::NoOp);
        }

        validator.pre_is_default().await?;
        let Some(source_sha) = pre.sha().await? else {
            self.repo.log(
                Severity::Error,
                format!("Pre-branch {pre} disappeared before its SHA could be read."),
            );
            return Err(ValidationFailure::new("pre exists").into());
        };

        self.repo.separator();
        self.repo.log(
            Severity::Plan,
            format!("Creating branch {post} with SHA {source_sha}."),
        );
        post.create(&source_sha).await?;
        self.repo
            .log(Severity::Success, format!("Created branch {post} from {pre}."));

        self.repo.separator();
        self.repo
            .log(Severity::Plan, format!("Verifying that {post} has been created."));
        self.settle().await;
        if !post.exists().await? {
            self.repo.log(
                Severity::Error,
                format!("Branch creation failed: {post} does not exist on GitHub."),
            );
            return Ok(Outcome::Failure);
        }
        validator.post_has_sha(&source_sha).await?;
        self.repo.log(
            Severity::Success,
            format!("Verified that {post} exists on GitHub with SHA {source_sha}."),
        );
        Ok(Outcome::Success)
    }

    async fn set_steps(&self) -> Result<Outcome, StepError> {
        let (pre, post) = self.branches();
        let validator = Validator::new(&self.repo, &pre, &post);
        validator.distinct_names()?;

        self.repo.log(
            Severity::Plan,
            format!("Planning to set the default branch to {post}."),
        );
        validator.post_exists().await?;

        if post.is_default().await? {
            self.repo
                .log(Severity::Ok, format!("{post} is already the default branch."));
            self.repo.log(Severity::Info, "Nothing new to do.");
            return Ok(Outcome::NoOp);
        }
        validator.pre_is_default().await?;

        self.repo.separator();
        self.repo.log(
            Severity::Plan,
            format!("Setting {post} as the default branch on GitHub."),
        );
        self.repo.set_default_branch(&post).await?;
        self.repo
            .log(Severity::Success, "Default branch change requested.");

        self.repo.separator();
        self.repo.log(
            Severity::Plan,
            format!("Verifying that {post} is the new default branch."),
        );
        let actual = self.repo.default_branch_name().await?;
        if actual != post.name() {
            self.repo
                .log(Severity::Error, "Default branch on GitHub was not set successfully.");
            self.repo
                .log(Severity::Error, format!("Expected: {}", post.name()));
            self.repo.log(Severity::Error, format!("Actual: {actual}"));
            return Ok(Outcome::Failure);
        }
        self.repo
            .log(Severity::Success, "Verified the new default branch.");
        Ok(Outcome::Success)
    }

    async fn update_pulls_steps(&self) -> Result<Outcome, StepError> {
        let (pre, post) = self.branches();
        let validator = Validator::new(&self.repo, &pre, &post);
        validator.distinct_names()?;

        self.repo.log(
            Severity::Plan,
            format!("Planning to move open pull requests from {pre} to {post}."),
        );
        validator.pre_exists().await?;
        validator.post_exists().await?;
        validator.either_is_default().await?;

        self.repo.separator();
        let mut moved = 0usize;
        let repo = &self.repo;
        post.adopt_pull_requests(&pre, |link| {
            moved += 1;
            repo.log(Severity::Plan, format!("Changing base to {post}: {link}"));
        })
        .await?;

        if moved == 0 {
            self.repo
                .log(Severity::Ok, format!("No pull requests to move from {pre}."));
        } else {
            self.repo.log(
                Severity::Success,
                format!("Requested a base change for {moved} pull request(s)."),
            );
        }

        self.repo.separator();
        self.repo.log(
            Severity::Plan,
            format!("Verifying that no open pull requests use {pre} as their base."),
        );
        if let Some(link) = pre.first_open_pull_request_link().await? {
            self.repo.log(
                Severity::Error,
                format!("Some pull requests still use {pre} as their base."),
            );
            self.repo.log(Severity::Error, format!("Example: {link}"));
            return Ok(Outcome::Failure);
        }
        self.repo.log(
            Severity::Success,
            format!("Verified that no open pull requests use {pre} as their base."),
        );
        Ok(Outcome::Success)
    }

    async fn delete_steps(&self) -> Result<Outcome, StepError> {
        let (pre, post) = self.branches();
        let validator = Validator::new(&self.repo, &pre, &post);
        validator.distinct_names()?;

        self.repo.log(
            Severity::Plan,
            format!("Planning to delete {pre} from GitHub."),
        );
        validator.post_is_default().await?;

        if !pre.exists().await? {
            self.repo.log(
                Severity::Ok,
                format!("Branch {pre} (already) does not exist on GitHub."),
            );
            self.repo.log(Severity::Info, "Nothing new to do.");
            return Ok(Outcome::NoOp);
        }
        self.repo
            .log(Severity::Success, format!("Branch {pre} currently exists on GitHub."));

        if let Some(link) = pre.first_open_pull_request_link().await? {
            self.repo.log(
                Severity::Error,
                format!("There are open pull requests with {pre} as a base."),
            );
            self.repo.log(Severity::Error, format!("Example: {link}"));
            self.repo.log(
                Severity::Error,
                format!(
                    "Move them first: main-branch update-pulls {} --pre {} --post {}",
                    self.repo.name(),
                    pre.name(),
                    post.name()
                ),
            );
            return Ok(Outcome::Failure);
        }
        self.repo.log(
            Severity::Success,
            format!("No open pull requests use {pre} as their base."),
        );
        validator.pre_not_protected().await?;
        validator.pre_not_pages_branch().await?;

        self.repo.separator();
        self.repo.log(Severity::Plan, format!("Deleting branch {pre}."));
        pre.delete().await?;
        self.repo.log(Severity::Success, "Branch deletion requested.");

        self.repo.separator();
        self.repo
            .log(Severity::Plan, format!("Verifying that {pre} is deleted."));
        self.settle().await;
        if pre.exists().await? {
            self.repo.log(
                Severity::Error,
                format!("Branch deletion failed: {pre} still exists on GitHub."),
            );
            return Ok(Outcome::Failure);
        }
        self.repo
            .log(Severity::Success, "Branch deletion verified.");
        Ok(Outcome::Success)
    }

    async fn replace_steps(&self) -> Result<Outcome, StepError> {
        let (pre, post) = self.branches();
        let validator = Validator::new(&self.repo, &pre, &post);
        validator.distinct_names()?;

        self.repo.log(
            Severity::Plan,
            format!("Planning to replace the default branch {pre} with {post}."),
        );

        if post.is_default().await? {
            self.repo
                .log(Severity::Ok, format!("The default branch is already {post}."));
            if pre.exists().await? {
                self.repo
                    .log(Severity::Info, format!("The branch {pre} also exists."));
                self.repo.log(
                    Severity::Info,
                    format!(
                        "To delete it, run: main-branch delete {} --pre {} --post {}",
                        self.repo.name(),
                        pre.name(),
                        post.name()
                    ),
                );
            }
            return Ok(Outcome::NoOp);
        }

        if let Err(err) = validator.pre_is_default().await {
            if matches!(err, StepError::Validation(_)) {
                let current = self.repo.default_branch_name().await?;
                self.repo.log(
                    Severity::Error,
                    format!(
                        "To run `replace` for this repository, set {pre} as the default branch first: \
                         main-branch set {} --pre {current} --post {}",
                        self.repo.name(),
                        pre.name()
                    ),
                );
                self.repo.log(
                    Severity::Error,
                    format!("Note that this will leave the `{current}` branch intact."),
                );
            }
            return Err(err);
        }

        let steps = [
            Operation::Create,
            Operation::Set,
            Operation::UpdatePulls,
            Operation::Delete,
        ];
        for step in steps {
            self.repo.separator();
            let outcome = Box::pin(self.run(step)).await?;
            if outcome.is_error() {
                self.repo.log(
                    Severity::Error,
                    format!("The `{step}` step failed. Stopping before the remaining steps."),
                );
                return Ok(Outcome::Failure);
            }
        }

        self.repo.separator();
        self.repo.log(
            Severity::Success,
            format!("Replaced the default branch {pre} with {post}."),
        );
        Ok(Outcome::Success)
    }
}
