use anyhow::Result;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE: &str = "main-branch.toml";
const RC_FILE: &str = ".main-branch-rc";
const ENV_PREFIX: &str = "MAIN_BRANCH";
const TOKEN_FILE_NAME: &str = "github-personal-access-token";

/// Main configuration structure for main-branch
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct MainBranchConfig {
    /// GitHub access
    pub github: GitHubConfig,
    /// Branch names and verification timing
    pub migration: MigrationConfig,
    /// Diagnostic logging
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// GitHub API token (can be set via env var)
    pub token: Option<String>,
    /// API root, for GitHub Enterprise
    pub api_base_url: Option<String>,
    /// Where a prompted token is stored
    pub token_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MigrationConfig {
    pub pre_branch: String,
    pub post_branch: String,
    /// Wait before verification reads, in milliseconds
    pub settle_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when RUST_LOG is unset
    pub level: String,
    pub json: bool,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            pre_branch: "master".to_string(),
            post_branch: "main".to_string(),
            settle_delay_ms: 1000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json: false,
        }
    }
}

impl MainBranchConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration files (main-branch.toml, .main-branch-rc)
    /// 3. Environment variables (prefixed with MAIN_BRANCH_, `__` between sections)
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("."), None)
    }

    /// Same as [`load`](Self::load) but reads files from `dir`, and reads
    /// environment variables from `env` instead of the process when given.
    pub fn load_from(dir: &Path, env: Option<HashMap<String, String>>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = dir.join(CONFIG_FILE);
        if config_file.exists() {
            builder = builder.add_source(File::from(config_file));
        }

        let rc_file = dir.join(RC_FILE);
        if rc_file.exists() {
            builder = builder.add_source(File::from(rc_file).format(FileFormat::Toml));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env.clone()),
        );

        let mut main_branch_config: MainBranchConfig = builder.build()?.try_deserialize()?;

        // Special handling for GitHub token - the conventional variable also works
        if main_branch_config.github.token.is_none() {
            let github_token = match &env {
                Some(vars) => vars.get("GITHUB_TOKEN").cloned(),
                None => std::env::var("GITHUB_TOKEN").ok(),
            };
            main_branch_config.github.token = github_token.filter(|token| !token.is_empty());
        }

        Ok(main_branch_config)
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::debug!("Loaded environment variables from .env file");
        }
        Ok(())
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.migration.settle_delay_ms)
    }

    /// Configured token file, else the per-user config directory.
    pub fn token_file(&self) -> Option<PathBuf> {
        self.github.token_file.clone().or_else(|| {
            dirs::config_dir().map(|dir| dir.join("main-branch").join(TOKEN_FILE_NAME))
        })
    }
}
