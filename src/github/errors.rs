use octocrab::Error as OctocrabError;

/// Any failure talking to GitHub other than "not found".
///
/// Not-found responses are the defined representation of a missing branch or
/// Pages site and never surface as this type.
#[derive(Debug)]
pub enum GitHubError {
    TokenNotFound(String),
    ApiError(OctocrabError),
    IoError(std::io::Error),
    /// A non-404 HTTP status reported outside of octocrab (mainly by test doubles).
    Status {
        status: u16,
        message: String,
    },
    UnexpectedResponse(String),
}

impl GitHubError {
    /// HTTP status code of the failed request, when one is known.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            GitHubError::ApiError(octocrab::Error::GitHub { source, .. }) => {
                Some(source.status_code.as_u16())
            }
            GitHubError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// True when an octocrab error is GitHub's 404 response.
pub fn is_not_found(err: &OctocrabError) -> bool {
    matches!(err, octocrab::Error::GitHub { source, .. } if source.status_code.as_u16() == 404)
}

impl From<OctocrabError> for GitHubError {
    fn from(err: OctocrabError) -> Self {
        GitHubError::ApiError(err)
    }
}

impl From<std::io::Error> for GitHubError {
    fn from(err: std::io::Error) -> Self {
        GitHubError::IoError(err)
    }
}

fn write_status_hints(f: &mut std::fmt::Formatter<'_>, status: u16) -> std::fmt::Result {
    match status {
        401 => {
            writeln!(f, "🔧 AUTHENTICATION FAILED:")?;
            writeln!(f, "   → Token is invalid or expired")?;
            write!(f, "   → Create a new token at: https://github.com/settings/tokens")
        }
        403 => {
            writeln!(f, "🔧 PERMISSION DENIED:")?;
            writeln!(f, "   → Token lacks required permissions")?;
            writeln!(f, "   → Changing the default branch needs admin access to the repository")?;
            write!(f, "   → May need 'repo' scope: https://github.com/settings/tokens")
        }
        404 => {
            writeln!(f, "🔧 RESOURCE NOT FOUND:")?;
            writeln!(f, "   → Repository may not exist or be private")?;
            write!(f, "   → Check the owner/repo argument")
        }
        422 => {
            writeln!(f, "🔧 VALIDATION ERROR:")?;
            writeln!(f, "   → GitHub rejected the request data")?;
            write!(f, "   → The branch may already exist, or the SHA may be unknown")
        }
        _ => {
            writeln!(f, "🔧 TROUBLESHOOTING:")?;
            writeln!(f, "   → Test connection: curl -I https://api.github.com")?;
            write!(f, "   → Check rate limits: gh api rate_limit")
        }
    }
}

impl std::fmt::Display for GitHubError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GitHubError::TokenNotFound(msg) => {
                writeln!(f, "GitHub Authentication Error")?;
                writeln!(f, "──────────────────────────")?;
                write!(f, "🔑 {msg}\n\n")?;
                writeln!(f, "🔧 QUICK FIXES:")?;
                writeln!(
                    f,
                    "   → Set token directly: export MAIN_BRANCH_GITHUB__TOKEN=your_token"
                )?;
                writeln!(
                    f,
                    "   → Create token at: https://github.com/settings/tokens"
                )?;
                write!(
                    f,
                    "     (needs 'repo' scope for private repos, 'public_repo' for public)"
                )
            }
            GitHubError::ApiError(octocrab_err) => {
                writeln!(f, "GitHub API Error")?;
                writeln!(f, "────────────────")?;

                match octocrab_err {
                    octocrab::Error::GitHub { source, .. } => {
                        writeln!(f, "🌐 HTTP {}: {}", source.status_code, source.message)?;
                        writeln!(f)?;
                        write_status_hints(f, source.status_code.as_u16())
                    }
                    octocrab::Error::Http { .. } => {
                        writeln!(f, "🌐 Network connection failed to GitHub API")?;
                        writeln!(f)?;
                        writeln!(f, "🔧 LOCAL NETWORK TROUBLESHOOTING:")?;
                        writeln!(f, "   → Test DNS resolution: nslookup api.github.com")?;
                        writeln!(f, "   → Test HTTPS: curl -I https://api.github.com")?;
                        write!(f, "📊 GitHub status: https://status.github.com")
                    }
                    _ => {
                        write!(f, "🌐 {octocrab_err}\n\n")?;
                        write_status_hints(f, 0)
                    }
                }
            }
            GitHubError::IoError(io_err) => {
                writeln!(f, "I/O Error")?;
                writeln!(f, "─────────")?;
                write!(f, "📁 {io_err}")
            }
            GitHubError::Status { status, message } => {
                writeln!(f, "GitHub API Error")?;
                writeln!(f, "────────────────")?;
                writeln!(f, "🌐 HTTP {status}: {message}")?;
                writeln!(f)?;
                write_status_hints(f, *status)
            }
            GitHubError::UnexpectedResponse(msg) => {
                writeln!(f, "Unexpected GitHub Response")?;
                writeln!(f, "──────────────────────────")?;
                write!(f, "🌐 {msg}")
            }
        }
    }
}

impl std::error::Error for GitHubError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GitHubError::ApiError(err) => Some(err),
            GitHubError::IoError(err) => Some(err),
            _ => None,
        }
    }
}
