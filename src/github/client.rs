use async_trait::async_trait;
use octocrab::Octocrab;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::errors::{is_not_found, GitHubError};
use super::gateway::{PullRequestRef, RepositoryGateway};
use crate::migration::identity::RepositoryIdentity;

const PULLS_PER_PAGE: u8 = 100;

/// Characters that cannot appear raw in a URL path. `/` stays unescaped so
/// branch names like `feature/x` keep their segments.
const PATH: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Same as [`PATH`] but also escapes `/`, for single segments.
const SEGMENT: &AsciiSet = &PATH.add(b'/');

fn repo_route(repo: &RepositoryIdentity) -> String {
    format!(
        "/repos/{}/{}",
        utf8_percent_encode(&repo.owner, SEGMENT),
        utf8_percent_encode(&repo.name, SEGMENT)
    )
}

fn branch_path(branch: &str) -> String {
    utf8_percent_encode(branch, PATH).to_string()
}

#[derive(Debug, Deserialize)]
struct RefResponse {
    object: RefObject,
}

#[derive(Debug, Deserialize)]
struct RefObject {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct RepositoryResponse {
    default_branch: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BranchResponse {
    #[serde(default)]
    protected: bool,
}

#[derive(Debug, Deserialize)]
struct PagesResponse {
    source: Option<PagesSource>,
}

#[derive(Debug, Deserialize)]
struct PagesSource {
    branch: String,
}

#[derive(Debug, Deserialize)]
struct PullResponse {
    number: u64,
    html_url: String,
    base: PullBase,
}

#[derive(Debug, Deserialize)]
struct PullBase {
    #[serde(rename = "ref")]
    ref_field: String,
}

#[derive(Serialize)]
struct ListPullsParams<'a> {
    state: &'static str,
    base: &'a str,
    per_page: u8,
    page: u32,
}

#[derive(Serialize)]
struct CreateRefRequest<'a> {
    #[serde(rename = "ref")]
    ref_field: String,
    sha: &'a str,
}

#[derive(Serialize)]
struct DefaultBranchRequest<'a> {
    default_branch: &'a str,
}

#[derive(Serialize)]
struct PullBaseRequest<'a> {
    base: &'a str,
}

impl From<PullResponse> for PullRequestRef {
    fn from(pull: PullResponse) -> Self {
        PullRequestRef {
            number: pull.number,
            base: pull.base.ref_field,
            link: pull.html_url,
        }
    }
}

/// [`RepositoryGateway`] backed by the GitHub REST API.
#[derive(Clone)]
pub struct OctocrabGateway {
    octocrab: Octocrab,
}

impl OctocrabGateway {
    pub fn new(octocrab: Octocrab) -> Self {
        Self { octocrab }
    }

    /// Builds a client authenticated with a personal access token.
    ///
    /// `api_base_url` points the client at GitHub Enterprise or a test server;
    /// `None` uses api.github.com.
    pub fn from_token(token: String, api_base_url: Option<&str>) -> Result<Self, GitHubError> {
        let mut builder = Octocrab::builder().personal_token(token);
        if let Some(url) = api_base_url {
            builder = builder.base_uri(url)?;
        }
        Ok(Self::new(builder.build()?))
    }

    async fn list_pulls_page(
        &self,
        repo: &RepositoryIdentity,
        base: &str,
        page: u32,
    ) -> Result<Vec<PullRequestRef>, GitHubError> {
        let route = format!("{}/pulls", repo_route(repo));
        let params = ListPullsParams {
            state: "open",
            base,
            per_page: PULLS_PER_PAGE,
            page,
        };
        let pulls: Vec<PullResponse> = self.octocrab.get(route, Some(&params)).await?;
        debug!(repository = %repo, base, page, count = pulls.len(), "Listed open pull requests");
        Ok(pulls.into_iter().map(PullRequestRef::from).collect())
    }
}

impl std::fmt::Debug for OctocrabGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OctocrabGateway").finish_non_exhaustive()
    }
}

#[async_trait]
impl RepositoryGateway for OctocrabGateway {
    async fn branch_sha(
        &self,
        repo: &RepositoryIdentity,
        branch: &str,
    ) -> Result<Option<String>, GitHubError> {
        let route = format!("{}/git/ref/heads/{}", repo_route(repo), branch_path(branch));
        let result: Result<RefResponse, _> = self.octocrab.get(route, None::<&()>).await;
        match result {
            Ok(reference) => Ok(Some(reference.object.sha)),
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(GitHubError::ApiError(e)),
        }
    }

    async fn create_branch(
        &self,
        repo: &RepositoryIdentity,
        branch: &str,
        sha: &str,
    ) -> Result<(), GitHubError> {
        let route = format!("{}/git/refs", repo_route(repo));
        let body = CreateRefRequest {
            ref_field: format!("refs/heads/{branch}"),
            sha,
        };
        let _: serde_json::Value = self.octocrab.post(route, Some(&body)).await?;
        Ok(())
    }

    async fn delete_branch(
        &self,
        repo: &RepositoryIdentity,
        branch: &str,
    ) -> Result<(), GitHubError> {
        let route = format!("{}/git/refs/heads/{}", repo_route(repo), branch_path(branch));
        let uri = http::Uri::builder()
            .path_and_query(route)
            .build()
            .map_err(|e| GitHubError::UnexpectedResponse(format!("invalid branch route: {e}")))?;
        let response = self.octocrab._delete(uri, None::<&()>).await?;
        octocrab::map_github_error(response).await?;
        Ok(())
    }

    async fn default_branch(&self, repo: &RepositoryIdentity) -> Result<String, GitHubError> {
        let route = repo_route(repo);
        let response: RepositoryResponse = self.octocrab.get(route, None::<&()>).await?;
        response.default_branch.ok_or_else(|| {
            GitHubError::UnexpectedResponse(format!("{repo} has no default branch"))
        })
    }

    async fn set_default_branch(
        &self,
        repo: &RepositoryIdentity,
        branch: &str,
    ) -> Result<(), GitHubError> {
        let route = repo_route(repo);
        let body = DefaultBranchRequest {
            default_branch: branch,
        };
        let _: serde_json::Value = self.octocrab.patch(route, Some(&body)).await?;
        Ok(())
    }

    async fn branch_protected(
        &self,
        repo: &RepositoryIdentity,
        branch: &str,
    ) -> Result<bool, GitHubError> {
        let route = format!("{}/branches/{}", repo_route(repo), branch_path(branch));
        let result: Result<BranchResponse, _> = self.octocrab.get(route, None::<&()>).await;
        match result {
            Ok(response) => Ok(response.protected),
            Err(e) if is_not_found(&e) => Ok(false),
            Err(e) => Err(GitHubError::ApiError(e)),
        }
    }

    async fn pages_branch(&self, repo: &RepositoryIdentity) -> Result<Option<String>, GitHubError> {
        let route = format!("{}/pages", repo_route(repo));
        let result: Result<PagesResponse, _> = self.octocrab.get(route, None::<&()>).await;
        match result {
            Ok(response) => Ok(response.source.map(|source| source.branch)),
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(GitHubError::ApiError(e)),
        }
    }

    async fn open_pulls_first_page(
        &self,
        repo: &RepositoryIdentity,
        base: &str,
    ) -> Result<Vec<PullRequestRef>, GitHubError> {
        self.list_pulls_page(repo, base, 1).await
    }

    async fn open_pulls(
        &self,
        repo: &RepositoryIdentity,
        base: &str,
    ) -> Result<Vec<PullRequestRef>, GitHubError> {
        let mut page = 1u32;
        let mut all_pulls = Vec::new();

        loop {
            let pulls = self.list_pulls_page(repo, base, page).await?;
            let is_last_page = pulls.len() < usize::from(PULLS_PER_PAGE);
            all_pulls.extend(pulls);

            if is_last_page {
                break;
            }
            page += 1;
        }

        Ok(all_pulls)
    }

    async fn update_pull_base(
        &self,
        repo: &RepositoryIdentity,
        number: u64,
        base: &str,
    ) -> Result<(), GitHubError> {
        let route = format!("{}/pulls/{}", repo_route(repo), number);
        let _: serde_json::Value = self
            .octocrab
            .patch(route, Some(&PullBaseRequest { base }))
            .await?;
        Ok(())
    }
}
