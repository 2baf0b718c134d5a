use std::fmt;
use std::str::FromStr;

use thiserror::Error;

const GITHUB_URL_PREFIXES: [&str; 2] = ["https://github.com/", "http://github.com/"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid repository `{input}` (expected `owner/repo` or https://github.com/owner/repo)")]
pub struct MalformedIdentity {
    pub input: String,
}

/// The `(owner, name)` pair a migration targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryIdentity {
    pub owner: String,
    pub name: String,
}

impl RepositoryIdentity {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parses either `owner/name` or a GitHub web URL whose path is `owner/name`.
    pub fn parse(input: &str) -> Result<Self, MalformedIdentity> {
        let malformed = || MalformedIdentity {
            input: input.to_string(),
        };

        let path = GITHUB_URL_PREFIXES
            .iter()
            .find_map(|prefix| input.strip_prefix(prefix))
            .unwrap_or(input);

        let mut parts = path.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty() => {
                Ok(Self::new(owner, name))
            }
            _ => Err(malformed()),
        }
    }
}

impl FromStr for RepositoryIdentity {
    type Err = MalformedIdentity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for RepositoryIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}
