// In-memory remote for tests - records every call, no network

use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::identity::RepositoryIdentity;
use super::log::{LogRecord, LogSink, Severity};
use crate::github::{GitHubError, PullRequestRef, RepositoryGateway};

/// Gateway calls as seen by [`InMemoryGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    BranchSha { branch: String },
    CreateBranch { branch: String, sha: String },
    DeleteBranch { branch: String },
    DefaultBranch,
    SetDefaultBranch { branch: String },
    BranchProtected { branch: String },
    PagesBranch,
    OpenPullsFirstPage { base: String },
    OpenPulls { base: String },
    UpdatePullBase { number: u64, base: String },
}

impl GatewayCall {
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            GatewayCall::CreateBranch { .. }
                | GatewayCall::DeleteBranch { .. }
                | GatewayCall::SetDefaultBranch { .. }
                | GatewayCall::UpdatePullBase { .. }
        )
    }
}

#[derive(Debug)]
struct RemoteState {
    branches: BTreeMap<String, String>,
    default_branch: String,
    protected: HashSet<String>,
    pages_branch: Option<String>,
    pulls: Vec<PullRequestRef>,
    page_size: usize,
    pages_served: usize,
    calls: Vec<GatewayCall>,
    // Writes the remote accepts but never applies.
    ignored_pull_updates: HashSet<u64>,
    ignore_creates: bool,
    ignore_deletes: bool,
    ignore_default_branch_updates: bool,
    created_sha_override: Option<String>,
    fail_default_branch_reads: bool,
    fail_creates: bool,
}

/// A single repository kept in memory.
#[derive(Debug)]
pub struct InMemoryGateway {
    state: Mutex<RemoteState>,
}

impl InMemoryGateway {
    pub fn new(default_branch: &str) -> Self {
        Self {
            state: Mutex::new(RemoteState {
                branches: BTreeMap::new(),
                default_branch: default_branch.to_string(),
                protected: HashSet::new(),
                pages_branch: None,
                pulls: Vec::new(),
                page_size: 100,
                pages_served: 0,
                calls: Vec::new(),
                ignored_pull_updates: HashSet::new(),
                ignore_creates: false,
                ignore_deletes: false,
                ignore_default_branch_updates: false,
                created_sha_override: None,
                fail_default_branch_reads: false,
                fail_creates: false,
            }),
        }
    }

    pub fn pull_link(number: u64) -> String {
        format!("https://github.com/acme/widgets/pull/{number}")
    }

    fn state(&self) -> MutexGuard<'_, RemoteState> {
        self.state.lock().unwrap()
    }

    fn configure(self, f: impl FnOnce(&mut RemoteState)) -> Self {
        f(&mut self.state());
        self
    }

    pub fn with_branch(self, name: &str, sha: &str) -> Self {
        self.configure(|s| {
            s.branches.insert(name.to_string(), sha.to_string());
        })
    }

    pub fn with_protected(self, name: &str) -> Self {
        self.configure(|s| {
            s.protected.insert(name.to_string());
        })
    }

    pub fn with_pages_branch(self, name: &str) -> Self {
        self.configure(|s| s.pages_branch = Some(name.to_string()))
    }

    pub fn with_pull(self, number: u64, base: &str) -> Self {
        self.configure(|s| {
            s.pulls.push(PullRequestRef {
                number,
                base: base.to_string(),
                link: Self::pull_link(number),
            })
        })
    }

    /// Caps the first-page listing. The full listing still returns every
    /// match and counts the pages it would have taken in `pages_served`.
    pub fn with_page_size(self, page_size: usize) -> Self {
        self.configure(|s| s.page_size = page_size)
    }

    pub fn ignoring_pull_update(self, number: u64) -> Self {
        self.configure(|s| {
            s.ignored_pull_updates.insert(number);
        })
    }

    pub fn ignoring_creates(self) -> Self {
        self.configure(|s| s.ignore_creates = true)
    }

    pub fn ignoring_deletes(self) -> Self {
        self.configure(|s| s.ignore_deletes = true)
    }

    pub fn ignoring_default_branch_updates(self) -> Self {
        self.configure(|s| s.ignore_default_branch_updates = true)
    }

    pub fn creating_branches_at(self, sha: &str) -> Self {
        self.configure(|s| s.created_sha_override = Some(sha.to_string()))
    }

    pub fn failing_default_branch_reads(self) -> Self {
        self.configure(|s| s.fail_default_branch_reads = true)
    }

    pub fn failing_creates(self) -> Self {
        self.configure(|s| s.fail_creates = true)
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.state().calls.clone()
    }

    pub fn mutations(&self) -> Vec<GatewayCall> {
        self.calls().into_iter().filter(GatewayCall::is_mutation).collect()
    }

    /// Listing pages a paging client would have requested so far.
    pub fn pages_served(&self) -> usize {
        self.state().pages_served
    }

    pub fn branch_sha_now(&self, name: &str) -> Option<String> {
        self.state().branches.get(name).cloned()
    }

    pub fn default_branch_now(&self) -> String {
        self.state().default_branch.clone()
    }

    pub fn pull_base(&self, number: u64) -> Option<String> {
        self.state()
            .pulls
            .iter()
            .find(|pull| pull.number == number)
            .map(|pull| pull.base.clone())
    }

    fn record(&self, call: GatewayCall) -> MutexGuard<'_, RemoteState> {
        let mut state = self.state();
        state.calls.push(call);
        state
    }
}

fn server_error(message: &str) -> GitHubError {
    GitHubError::Status {
        status: 500,
        message: message.to_string(),
    }
}

#[async_trait]
impl RepositoryGateway for InMemoryGateway {
    async fn branch_sha(
        &self,
        _repo: &RepositoryIdentity,
        branch: &str,
    ) -> Result<Option<String>, GitHubError> {
        let state = self.record(GatewayCall::BranchSha {
            branch: branch.to_string(),
        });
        Ok(state.branches.get(branch).cloned())
    }

    async fn create_branch(
        &self,
        _repo: &RepositoryIdentity,
        branch: &str,
        sha: &str,
    ) -> Result<(), GitHubError> {
        let mut state = self.record(GatewayCall::CreateBranch {
            branch: branch.to_string(),
            sha: sha.to_string(),
        });
        if state.fail_creates {
            return Err(server_error("could not create reference"));
        }
        if state.branches.contains_key(branch) {
            return Err(GitHubError::Status {
                status: 422,
                message: "Reference already exists".to_string(),
            });
        }
        if state.ignore_creates {
            return Ok(());
        }
        let sha = state.created_sha_override.clone().unwrap_or_else(|| sha.to_string());
        state.branches.insert(branch.to_string(), sha);
        Ok(())
    }

    async fn delete_branch(
        &self,
        _repo: &RepositoryIdentity,
        branch: &str,
    ) -> Result<(), GitHubError> {
        let mut state = self.record(GatewayCall::DeleteBranch {
            branch: branch.to_string(),
        });
        if state.branches.get(branch).is_none() {
            return Err(GitHubError::Status {
                status: 422,
                message: "Reference does not exist".to_string(),
            });
        }
        if !state.ignore_deletes {
            state.branches.remove(branch);
        }
        Ok(())
    }

    async fn default_branch(&self, _repo: &RepositoryIdentity) -> Result<String, GitHubError> {
        let state = self.record(GatewayCall::DefaultBranch);
        if state.fail_default_branch_reads {
            return Err(server_error("repository lookup failed"));
        }
        Ok(state.default_branch.clone())
    }

    async fn set_default_branch(
        &self,
        _repo: &RepositoryIdentity,
        branch: &str,
    ) -> Result<(), GitHubError> {
        let mut state = self.record(GatewayCall::SetDefaultBranch {
            branch: branch.to_string(),
        });
        if !state.ignore_default_branch_updates {
            state.default_branch = branch.to_string();
        }
        Ok(())
    }

    async fn branch_protected(
        &self,
        _repo: &RepositoryIdentity,
        branch: &str,
    ) -> Result<bool, GitHubError> {
        let state = self.record(GatewayCall::BranchProtected {
            branch: branch.to_string(),
        });
        Ok(state.protected.contains(branch))
    }

    async fn pages_branch(&self, _repo: &RepositoryIdentity) -> Result<Option<String>, GitHubError> {
        let state = self.record(GatewayCall::PagesBranch);
        Ok(state.pages_branch.clone())
    }

    async fn open_pulls_first_page(
        &self,
        _repo: &RepositoryIdentity,
        base: &str,
    ) -> Result<Vec<PullRequestRef>, GitHubError> {
        let state = self.record(GatewayCall::OpenPullsFirstPage {
            base: base.to_string(),
        });
        Ok(state
            .pulls
            .iter()
            .filter(|pull| pull.base == base)
            .take(state.page_size)
            .cloned()
            .collect())
    }

    async fn open_pulls(
        &self,
        _repo: &RepositoryIdentity,
        base: &str,
    ) -> Result<Vec<PullRequestRef>, GitHubError> {
        let mut state = self.record(GatewayCall::OpenPulls {
            base: base.to_string(),
        });
        let matching: Vec<PullRequestRef> =
            state.pulls.iter().filter(|pull| pull.base == base).cloned().collect();
        // One page per `page_size` entries, plus the short (possibly empty) last page.
        state.pages_served += matching.len() / state.page_size + 1;
        Ok(matching)
    }

    async fn update_pull_base(
        &self,
        _repo: &RepositoryIdentity,
        number: u64,
        base: &str,
    ) -> Result<(), GitHubError> {
        let mut state = self.record(GatewayCall::UpdatePullBase {
            number,
            base: base.to_string(),
        });
        if state.ignored_pull_updates.contains(&number) {
            return Ok(());
        }
        match state.pulls.iter_mut().find(|pull| pull.number == number) {
            Some(pull) => {
                pull.base = base.to_string();
                Ok(())
            }
            None => Err(GitHubError::Status {
                status: 404,
                message: format!("pull request #{number} not found"),
            }),
        }
    }
}

/// Collects every record for later assertions.
#[derive(Debug, Default)]
pub struct RecordingSink {
    records: Mutex<Vec<LogRecord>>,
}

impl RecordingSink {
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn contains(&self, severity: Severity, text: &str) -> bool {
        self.records
            .lock()
            .unwrap()
            .iter()
            .any(|r| r.severity == severity && r.message.contains(text))
    }

    pub fn operations(&self) -> Vec<String> {
        let mut operations: Vec<String> = Vec::new();
        for record in self.records.lock().unwrap().iter() {
            if operations.last() != Some(&record.operation) {
                operations.push(record.operation.clone());
            }
        }
        operations
    }
}

impl LogSink for RecordingSink {
    fn record(&self, record: &LogRecord) {
        self.records.lock().unwrap().push(record.clone());
    }
}
