//! GitHub personal access token lookup.
//!
//! The token is resolved once per process and handed to the gateway; nothing
//! here is cached globally.

use std::fs;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::MainBranchConfig;
use crate::github::GitHubError;

const PLACEHOLDER_TOKEN: &str = "YOUR_GITHUB_TOKEN_HERE";

/// Source of the bearer token used for every GitHub request.
pub trait TokenProvider {
    fn token(&self) -> Result<String, GitHubError>;
}

/// Tries the configured token, then the token file, then asks the user.
#[derive(Debug, Clone)]
pub struct ChainedTokenProvider {
    configured: Option<String>,
    token_file: Option<PathBuf>,
    allow_prompt: bool,
}

impl ChainedTokenProvider {
    pub fn new(configured: Option<String>, token_file: Option<PathBuf>, allow_prompt: bool) -> Self {
        Self {
            configured,
            token_file,
            allow_prompt,
        }
    }

    pub fn from_config(config: &MainBranchConfig, allow_prompt: bool) -> Self {
        Self::new(config.github.token.clone(), config.token_file(), allow_prompt)
    }

    fn read_token_file(path: &Path) -> Result<Option<String>, GitHubError> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(path)?;
        Ok(contents.lines().next().and_then(usable))
    }

    fn prompt(&self) -> Result<String, GitHubError> {
        let mut stderr = io::stderr();
        writeln!(stderr, "main-branch needs a GitHub personal access token with the `repo` scope")?;
        writeln!(stderr, "to read branches and change the default branch of your repositories.")?;
        writeln!(stderr, "Create one at: https://github.com/settings/tokens/new?scopes=repo")?;
        if let Some(path) = &self.token_file {
            writeln!(stderr, "It will be saved to {}", path.display())?;
        }
        write!(stderr, "Token: ")?;
        stderr.flush()?;

        let mut input = String::new();
        io::stdin().lock().read_line(&mut input)?;
        let token = usable(&input).ok_or_else(|| {
            GitHubError::TokenNotFound("No token was entered at the prompt.".to_string())
        })?;

        if let Some(path) = &self.token_file {
            save_token(path, &token)?;
            info!(path = %path.display(), "Saved GitHub token");
        }
        Ok(token)
    }
}

impl TokenProvider for ChainedTokenProvider {
    fn token(&self) -> Result<String, GitHubError> {
        if let Some(token) = self.configured.as_deref().and_then(usable) {
            debug!("Using GitHub token from configuration");
            return Ok(token);
        }

        if let Some(path) = &self.token_file {
            if let Some(token) = Self::read_token_file(path)? {
                debug!(path = %path.display(), "Using GitHub token from file");
                return Ok(token);
            }
        }

        if self.allow_prompt && io::stdin().is_terminal() {
            return self.prompt();
        }

        let location = self
            .token_file
            .as_ref()
            .map(|path| format!(" or save it to {}", path.display()))
            .unwrap_or_default();
        Err(GitHubError::TokenNotFound(format!(
            "GitHub token not found. Set GITHUB_TOKEN or MAIN_BRANCH_GITHUB__TOKEN{location}."
        )))
    }
}

fn usable(raw: &str) -> Option<String> {
    let token = raw.trim();
    (!token.is_empty() && token != PLACEHOLDER_TOKEN).then(|| token.to_string())
}

fn save_token(path: &Path, token: &str) -> Result<(), GitHubError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, format!("{token}\n"))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}
